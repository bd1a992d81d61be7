pub mod csv;
pub mod json;
pub mod sql;
pub mod xlsx;

use std::path::Path;

use crate::error::EtlError;
use crate::model::PlateResolution;
use crate::pipeline::PooledRun;

use self::sql::ScriptOptions;

/// Output artifacts of a run, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExportFormat {
    /// Insert script.
    Sql,
    /// Plate audit.
    Csv,
    /// Plate audit as a workbook.
    Xlsx,
    /// Run report.
    Json,
}

impl ExportFormat {
    /// Infer format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "sql" => Some(Self::Sql),
            "csv" => Some(Self::Csv),
            "xlsx" => Some(Self::Xlsx),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Export a pooled run to a file, auto-detecting format from extension.
pub fn export_run(run: &PooledRun, path: &Path, options: &ScriptOptions) -> Result<usize, EtlError> {
    let format = ExportFormat::from_path(path)
        .ok_or_else(|| EtlError::ExportError("Unknown file extension".to_string()))?;

    match format {
        ExportFormat::Sql => sql::export(&run.members, &run.vehicles, path, options),
        ExportFormat::Csv => csv::export(run, path),
        ExportFormat::Xlsx => xlsx::export(run, path),
        ExportFormat::Json => json::export(&run.report, path),
    }
}

pub const AUDIT_HEADER: [&str; 6] = [
    "order",
    "chapter_id",
    "member",
    "raw_plate",
    "plate",
    "resolution",
];

/// One row per vehicle: the plate as read next to the plate as stored.
/// Synthesized plates have an empty raw plate.
pub fn audit_rows(run: &PooledRun) -> Vec<[String; 6]> {
    run.vehicles
        .iter()
        .map(|vehicle| {
            let member = run.member(vehicle.order);
            let raw_plate = match &vehicle.resolution {
                PlateResolution::Kept => vehicle.plate.clone(),
                PlateResolution::Disambiguated { original } => original.clone(),
                PlateResolution::Synthesized => String::new(),
            };
            [
                vehicle.order.to_string(),
                member.map(|m| m.chapter_id.to_string()).unwrap_or_default(),
                member.map(|m| m.full_name.clone()).unwrap_or_default(),
                raw_plate,
                vehicle.plate.clone(),
                vehicle.resolution.label().to_string(),
            ]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ExportFormat::from_path(Path::new("migration_reimport_clean_status.sql")),
            Some(ExportFormat::Sql)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("plates.CSV")),
            Some(ExportFormat::Csv)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("plates.xlsx")),
            Some(ExportFormat::Xlsx)
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("report.json")),
            Some(ExportFormat::Json)
        );
        assert_eq!(ExportFormat::from_path(Path::new("out.txt")), None);
        assert_eq!(ExportFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_export_run_rejects_unknown_extension() {
        let run = PooledRun {
            members: Vec::new(),
            vehicles: Vec::new(),
            report: Default::default(),
        };
        let err = export_run(&run, Path::new("out.txt"), &ScriptOptions::default()).unwrap_err();
        assert!(matches!(err, EtlError::ExportError(_)));
    }
}
