use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EtlError;
use crate::export::sql::EmitMode;
use crate::status::{canonical, DEFAULT_STATUS};

/// One chapter workbook to import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub chapter_id: u32,
    pub name: String,
    pub path: PathBuf,
    #[serde(default = "default_sheet")]
    pub sheet: String,
    /// Zero-based index of the row holding the column labels.
    #[serde(default = "default_header_row")]
    pub header_row: u32,
}

fn default_sheet() -> String {
    "ODOMETER".to_string()
}
fn default_header_row() -> u32 {
    7
}

/// Fallback values applied by the row normalizer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_enrollment_year")]
    pub enrollment_year: i32,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_affirmative")]
    pub affirmative: String,
    #[serde(default = "default_negative")]
    pub negative: String,
    /// Data rows read per sheet after the header. Absent reads to the end.
    #[serde(default)]
    pub max_rows: Option<usize>,
}

fn default_country() -> String {
    "COLOMBIA".to_string()
}
fn default_enrollment_year() -> i32 {
    2025
}
fn default_status() -> String {
    DEFAULT_STATUS.to_string()
}
fn default_affirmative() -> String {
    "SI".to_string()
}
fn default_negative() -> String {
    "NO".to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            country: default_country(),
            enrollment_year: default_enrollment_year(),
            status: default_status(),
            affirmative: default_affirmative(),
            negative: default_negative(),
            max_rows: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
    #[serde(default)]
    pub mode: EmitMode,
    /// Last order already present in the database (append mode only).
    #[serde(default)]
    pub start_after: u32,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("migration_complete_all_data.sql")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            mode: EmitMode::default(),
            start_after: 0,
        }
    }
}

/// Top-level import configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl ImportConfig {
    /// Default config location: `<config_dir>/roster-import/import.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("roster-import").join("import.toml"))
    }

    /// Load and validate a config file. Relative source paths are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self, EtlError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EtlError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml(&content)?;

        if let Some(base) = path.parent() {
            for source in &mut config.sources {
                if source.path.is_relative() {
                    source.path = base.join(&source.path);
                }
            }
        }
        Ok(config)
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, EtlError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| EtlError::Config(format!("Invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EtlError> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.chapter_id == 0 {
                return Err(EtlError::Config(format!(
                    "chapter '{}' has chapter_id 0; ids start at 1",
                    source.name
                )));
            }
            if !seen.insert(source.chapter_id) {
                return Err(EtlError::Config(format!(
                    "duplicate chapter_id {}",
                    source.chapter_id
                )));
            }
        }
        if self.output.start_after == u32::MAX {
            return Err(EtlError::Config(format!(
                "start_after {} leaves no orders for new members",
                self.output.start_after
            )));
        }
        if canonical(&self.defaults.status).is_none() {
            return Err(EtlError::Config(format!(
                "default status '{}' is not a known status",
                self.defaults.status
            )));
        }
        if self.defaults.affirmative.trim().is_empty() {
            return Err(EtlError::Config(
                "affirmative token must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}
