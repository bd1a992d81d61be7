pub mod xlsx;

use std::path::Path;

use crate::config::SourceConfig;
use crate::error::EtlError;

pub use xlsx::SheetRows;

/// Workbook container formats recognized by extension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorkbookFormat {
    Xlsx,
    /// Legacy binary workbook; must be converted to .xlsx outside this tool.
    LegacyXls,
}

impl WorkbookFormat {
    /// Infer format from file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()?.to_lowercase().as_str() {
            "xlsx" | "xlsm" => Some(Self::Xlsx),
            "xls" => Some(Self::LegacyXls),
            _ => None,
        }
    }
}

/// Open the configured sheet of a source workbook for row iteration.
pub fn open_source(source: &SourceConfig, max_rows: Option<usize>) -> Result<SheetRows, EtlError> {
    let path = source.path.as_path();
    if !path.exists() {
        return Err(EtlError::SourceNotFound(path.to_path_buf()));
    }

    match WorkbookFormat::from_path(path) {
        Some(WorkbookFormat::Xlsx) => {
            xlsx::open_sheet(path, &source.sheet, source.header_row, max_rows)
        }
        Some(WorkbookFormat::LegacyXls) => Err(EtlError::FormatUnsupported {
            path: path.to_path_buf(),
            reason: "legacy .xls workbook; convert it to .xlsx first".to_string(),
        }),
        None => Err(EtlError::FormatUnsupported {
            path: path.to_path_buf(),
            reason: "unknown file extension".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn source(path: PathBuf) -> SourceConfig {
        SourceConfig {
            chapter_id: 1,
            name: "TEST".to_string(),
            path,
            sheet: "ODOMETER".to_string(),
            header_row: 7,
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            WorkbookFormat::from_path(Path::new("(COL) PEREIRA CORTE NACIONAL.xlsx")),
            Some(WorkbookFormat::Xlsx)
        );
        assert_eq!(
            WorkbookFormat::from_path(Path::new("report.XLSM")),
            Some(WorkbookFormat::Xlsx)
        );
        assert_eq!(
            WorkbookFormat::from_path(Path::new("sabana.xls")),
            Some(WorkbookFormat::LegacyXls)
        );
        assert_eq!(WorkbookFormat::from_path(Path::new("roster.csv")), None);
        assert_eq!(WorkbookFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_missing_source() {
        let err = open_source(&source(PathBuf::from("/nonexistent/roster.xlsx")), None).unwrap_err();
        assert!(matches!(err, EtlError::SourceNotFound(_)));
    }

    #[test]
    fn test_legacy_xls_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sabana.xls");
        std::fs::write(&path, b"\xD0\xCF\x11\xE0").unwrap();

        let err = open_source(&source(path), None).unwrap_err();
        assert!(matches!(err, EtlError::FormatUnsupported { .. }));
        assert!(err.to_string().contains("convert"));
    }

    #[test]
    fn test_corrupt_xlsx_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"not a zip container").unwrap();

        let err = open_source(&source(path), None).unwrap_err();
        assert!(matches!(err, EtlError::FormatUnsupported { .. }));
    }
}
