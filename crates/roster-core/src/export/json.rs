use std::path::Path;

use crate::error::EtlError;
use crate::report::RunReport;

/// Export the run report as pretty-printed JSON.
pub fn export(report: &RunReport, path: &Path) -> Result<usize, EtlError> {
    let json = to_string(report)?;
    std::fs::write(path, json)
        .map_err(|e| EtlError::ExportError(format!("Failed to write file: {}", e)))?;
    Ok(report.sources.len())
}

pub fn to_string(report: &RunReport) -> Result<String, EtlError> {
    serde_json::to_string_pretty(report)
        .map_err(|e| EtlError::ExportError(format!("JSON serialization failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let json = to_string(&RunReport::default()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totals"]["members"], 0);
        assert!(value["totals"]["first_order"].is_null());
        assert!(value["warnings"].as_array().unwrap().is_empty());
    }
}
