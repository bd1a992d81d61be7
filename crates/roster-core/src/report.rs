use std::path::PathBuf;

use serde::Serialize;

use crate::columns::{FieldMap, LogicalField};
use crate::config::SourceConfig;
use crate::error::EtlError;

/// Summary of one import run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    pub warnings: Vec<Warning>,
    pub totals: Totals,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub chapter_id: u32,
    pub name: String,
    pub path: PathBuf,
    pub outcome: SourceOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldMap>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceOutcome {
    Loaded {
        rows_scanned: usize,
        members: usize,
        /// Rows with data but no name.
        dropped_without_name: usize,
        blank_rows: usize,
        /// Rows left unread below the `max_rows` cap.
        rows_not_read: usize,
        vehicles: usize,
    },
    Failed {
        error: String,
    },
}

/// A recovered row-level issue.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub chapter_id: u32,
    pub sheet_row: usize,
    pub order: u32,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub members: usize,
    pub vehicles: usize,
    pub first_order: Option<u32>,
    pub last_order: Option<u32>,
    pub failed_sources: usize,
    pub dropped_without_name: usize,
    pub unrecognized_statuses: usize,
    pub duplicate_plates: usize,
    pub synthesized_plates: usize,
    pub defaulted_years: usize,
    /// Defaulted years whose cell held text that could not be read.
    pub unparsable_years: usize,
    /// Rows left unread below the `max_rows` cap, across sources.
    pub rows_not_read: usize,
}

impl RunReport {
    pub fn record_failure(&mut self, source: &SourceConfig, error: &EtlError) {
        self.totals.failed_sources += 1;
        self.sources.push(SourceReport {
            chapter_id: source.chapter_id,
            name: source.name.clone(),
            path: source.path.clone(),
            outcome: SourceOutcome::Failed {
                error: error.to_string(),
            },
            fields: None,
        });
    }

    pub fn record_warning(&mut self, chapter_id: u32, sheet_row: usize, order: u32, error: &EtlError) {
        debug_assert!(error.is_recoverable(), "not a row-level error: {}", error);
        match error {
            EtlError::UnrecognizedStatusValue(_) => self.totals.unrecognized_statuses += 1,
            EtlError::DuplicateNaturalKey { .. } => self.totals.duplicate_plates += 1,
            EtlError::MissingNaturalKey { .. } => self.totals.synthesized_plates += 1,
            EtlError::UnparsableYear { .. } => self.totals.unparsable_years += 1,
            _ => {}
        }
        self.warnings.push(Warning {
            chapter_id,
            sheet_row,
            order,
            message: error.to_string(),
        });
    }

    pub fn failed(&self) -> impl Iterator<Item = (&SourceReport, &str)> {
        self.sources.iter().filter_map(|s| match &s.outcome {
            SourceOutcome::Failed { error } => Some((s, error.as_str())),
            SourceOutcome::Loaded { .. } => None,
        })
    }
}

/// Header row of one source and how its labels resolve.
#[derive(Debug, Clone, Serialize)]
pub struct HeaderAudit {
    pub labels: Vec<String>,
    pub fields: FieldMap,
    pub unresolved: Vec<LogicalField>,
}

impl HeaderAudit {
    /// Labels carrying leading or trailing whitespace.
    pub fn padded_labels(&self) -> impl Iterator<Item = (usize, &str)> {
        self.labels
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.is_empty() && l.trim() != l.as_str())
            .map(|(i, l)| (i, l.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{resolve, ROSTER_RULES};

    #[test]
    fn test_failure_is_counted() {
        let source = SourceConfig {
            chapter_id: 4,
            name: "CUCUTA".to_string(),
            path: PathBuf::from("cucuta.xlsx"),
            sheet: "ODOMETER".to_string(),
            header_row: 7,
        };
        let mut report = RunReport::default();
        report.record_failure(&source, &EtlError::SourceNotFound(source.path.clone()));

        assert_eq!(report.totals.failed_sources, 1);
        let (failed, error) = report.failed().next().unwrap();
        assert_eq!(failed.name, "CUCUTA");
        assert!(error.contains("cucuta.xlsx"));
    }

    #[test]
    fn test_warnings_by_kind() {
        let mut report = RunReport::default();
        report.record_warning(1, 9, 1, &EtlError::UnrecognizedStatusValue("X".to_string()));
        report.record_warning(
            1,
            10,
            2,
            &EtlError::DuplicateNaturalKey {
                key: "ABC".to_string(),
                order: 2,
                resolved: "ABC_ORD2".to_string(),
            },
        );
        report.record_warning(
            1,
            11,
            3,
            &EtlError::MissingNaturalKey {
                order: 3,
                synthesized: "AUTO_ORD_3".to_string(),
            },
        );
        report.record_warning(
            1,
            12,
            4,
            &EtlError::UnparsableYear {
                raw: "Enero 2012".to_string(),
                default: 2025,
            },
        );
        assert_eq!(report.totals.unrecognized_statuses, 1);
        assert_eq!(report.totals.duplicate_plates, 1);
        assert_eq!(report.totals.synthesized_plates, 1);
        assert_eq!(report.totals.unparsable_years, 1);
        assert_eq!(report.warnings.len(), 4);
    }

    #[test]
    fn test_padded_labels() {
        let labels: Vec<String> = ["Order", " Complete Names", "Trike ", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let audit = HeaderAudit {
            fields: resolve(&labels, ROSTER_RULES),
            labels,
            unresolved: Vec::new(),
        };
        let padded: Vec<usize> = audit.padded_labels().map(|(i, _)| i).collect();
        assert_eq!(padded, vec![1, 2]);
    }

    #[test]
    fn test_report_serializes() {
        let mut report = RunReport::default();
        report.sources.push(SourceReport {
            chapter_id: 1,
            name: "PEREIRA".to_string(),
            path: PathBuf::from("p.xlsx"),
            outcome: SourceOutcome::Loaded {
                rows_scanned: 10,
                members: 8,
                dropped_without_name: 1,
                blank_rows: 1,
                rows_not_read: 0,
                vehicles: 7,
            },
            fields: Some(resolve(&[" Complete Names".to_string()], ROSTER_RULES)),
        });
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["sources"][0]["outcome"]["status"], "loaded");
        assert_eq!(
            json["sources"][0]["fields"]["bindings"]["complete_names"]["label"],
            " Complete Names"
        );
    }
}
