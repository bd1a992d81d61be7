use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use roster_core::config::ImportConfig;
use roster_core::export::sql::{EmitMode, ScriptOptions};
use roster_core::export::{self, json, sql, ExportFormat};
use roster_core::pipeline::{self, inspect_headers};
use roster_core::report::{RunReport, SourceOutcome};
use roster_core::PooledRun;

#[derive(Parser, Debug)]
#[command(
    name = "roster-import",
    version,
    about = "Generate SQL insert scripts from chapter roster workbooks"
)]
struct Cli {
    /// Path to config file (default: ~/.config/roster-import/import.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level (ignored when RUST_LOG is set)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Write the run report as JSON
    #[arg(long, global = true)]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read every source and write the insert script (default)
    Generate {
        /// Script path (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// append | replace (overrides config)
        #[arg(short, long)]
        mode: Option<EmitMode>,

        /// Last order already in the database; append mode only (overrides config)
        #[arg(long)]
        start_after: Option<u32>,
    },
    /// Show how each source's header row resolves to fields
    Columns {
        /// Print the header audits as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the plate audit (.csv or .xlsx) without generating SQL
    Plates {
        /// Audit file path
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_file.as_deref())?;
    info!("roster-import starting");

    let mut config = load_config(cli.config.as_deref())?;
    if config.sources.is_empty() {
        warn!("No sources configured");
    }

    let command = cli.command.unwrap_or(Command::Generate {
        output: None,
        mode: None,
        start_after: None,
    });

    match command {
        Command::Generate {
            output,
            mode,
            start_after,
        } => {
            if let Some(output) = output {
                config.output.path = output;
            }
            if let Some(mode) = mode {
                config.output.mode = mode;
            }
            if let Some(start_after) = start_after {
                config.output.start_after = start_after;
            }
            config.validate().context("Invalid command-line override")?;

            let run = pipeline::run(&config)?;
            print_summary(&run.report);

            let options = ScriptOptions::from_config(&config);
            let path = &config.output.path;
            let statements = sql::export(&run.members, &run.vehicles, path, &options)
                .with_context(|| format!("Failed to write script {}", path.display()))?;
            println!(
                "Wrote {} insert statements to {} ({} mode)",
                statements,
                path.display(),
                options.mode
            );

            write_report(cli.report.as_deref(), &run)?;
        }
        Command::Columns { json: as_json } => print_columns(&config, as_json)?,
        Command::Plates { out } => {
            match ExportFormat::from_path(&out) {
                Some(ExportFormat::Csv | ExportFormat::Xlsx) => {}
                _ => bail!("Plate audit must be a .csv or .xlsx file: {}", out.display()),
            }

            let run = pipeline::run(&config)?;
            print_summary(&run.report);

            let rows = export::export_run(&run, &out, &ScriptOptions::from_config(&config))
                .with_context(|| format!("Failed to write plate audit {}", out.display()))?;
            println!("Wrote {} plates to {}", rows, out.display());

            write_report(cli.report.as_deref(), &run)?;
        }
    }

    info!("roster-import exiting");
    Ok(())
}

fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("roster_core={level},roster_import={level}"))?,
    };

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ImportConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => ImportConfig::default_path()
            .context("No config directory on this platform; pass --config")?,
    };
    let config = ImportConfig::load(&path)
        .with_context(|| format!("Failed to load config {}", path.display()))?;
    info!(
        "Loaded {} sources from {}",
        config.sources.len(),
        path.display()
    );
    Ok(config)
}

fn print_summary(report: &RunReport) {
    for source in &report.sources {
        match &source.outcome {
            SourceOutcome::Loaded {
                rows_scanned,
                members,
                dropped_without_name,
                blank_rows,
                rows_not_read,
                vehicles,
            } => {
                println!(
                    "  [{}] {}: {} members, {} vehicles ({} rows read, {} without name, {} blank)",
                    source.chapter_id,
                    source.name,
                    members,
                    vehicles,
                    rows_scanned,
                    dropped_without_name,
                    blank_rows
                );
                if *rows_not_read > 0 {
                    println!("      {} rows beyond max_rows not read", rows_not_read);
                }
            }
            SourceOutcome::Failed { error } => {
                println!("  [{}] {}: FAILED {}", source.chapter_id, source.name, error)
            }
        }
    }

    let totals = &report.totals;
    match (totals.first_order, totals.last_order) {
        (Some(first), Some(last)) => println!(
            "Total: {} members (orders {}..={}), {} vehicles",
            totals.members, first, last, totals.vehicles
        ),
        _ => println!("Total: no members"),
    }
    if totals.duplicate_plates + totals.synthesized_plates > 0 {
        println!(
            "Plates: {} disambiguated, {} synthesized",
            totals.duplicate_plates, totals.synthesized_plates
        );
    }
    if totals.unparsable_years > 0 {
        println!(
            "Years: {} unparsable, defaulted",
            totals.unparsable_years
        );
    }
    if totals.unrecognized_statuses > 0 {
        println!(
            "Statuses: {} unrecognized, defaulted",
            totals.unrecognized_statuses
        );
    }
    if totals.failed_sources > 0 {
        eprintln!(
            "{} of {} sources failed and were skipped",
            totals.failed_sources,
            report.sources.len()
        );
    }
}

fn print_columns(config: &ImportConfig, as_json: bool) -> Result<()> {
    let mut audits = Vec::new();

    for source in &config.sources {
        let audit = match inspect_headers(source) {
            Ok(audit) => audit,
            Err(e) => {
                eprintln!("[{}] {}: {}", source.chapter_id, source.name, e);
                continue;
            }
        };

        if as_json {
            audits.push(serde_json::json!({
                "chapter_id": source.chapter_id,
                "name": source.name,
                "audit": audit,
            }));
            continue;
        }

        println!(
            "[{}] {} ({}, sheet {})",
            source.chapter_id,
            source.name,
            source.path.display(),
            source.sheet
        );
        for (index, label) in audit.labels.iter().enumerate() {
            if label.is_empty() {
                continue;
            }
            let field = audit
                .fields
                .field_at(index)
                .map(|f| f.to_string())
                .unwrap_or_else(|| "-".to_string());
            let padded = if label.trim() != label.as_str() {
                "  (padded)"
            } else {
                ""
            };
            println!("  {:>3}  {:<32} {}{}", index, format!("{:?}", label), field, padded);
        }
        if !audit.unresolved.is_empty() {
            let names: Vec<String> = audit.unresolved.iter().map(|f| f.to_string()).collect();
            println!("  unresolved: {}", names.join(", "));
        }
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&audits)?);
    }
    Ok(())
}

fn write_report(path: Option<&Path>, run: &PooledRun) -> Result<()> {
    if let Some(path) = path {
        json::export(&run.report, path)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        info!("Report written to {}", path.display());
    }
    Ok(())
}
