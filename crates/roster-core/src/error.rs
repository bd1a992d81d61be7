use std::path::PathBuf;

use thiserror::Error;

use crate::columns::LogicalField;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error(
        "sheet '{sheet}' not found in {} (available: {})",
        path.display(),
        available.join(", ")
    )]
    SheetNotFound {
        path: PathBuf,
        sheet: String,
        available: Vec<String>,
    },

    #[error("unsupported workbook format for {}: {reason}", path.display())]
    FormatUnsupported { path: PathBuf, reason: String },

    #[error("required column '{field}' not found in sheet '{sheet}'")]
    RequiredColumnUnresolved { sheet: String, field: LogicalField },

    #[error("unrecognized status value '{0}'")]
    UnrecognizedStatusValue(String),

    #[error("duplicate natural key '{key}' at order {order}, stored as '{resolved}'")]
    DuplicateNaturalKey {
        key: String,
        order: u32,
        resolved: String,
    },

    #[error("missing natural key at order {order}, stored as '{synthesized}'")]
    MissingNaturalKey { order: u32, synthesized: String },

    #[error("unparsable year '{raw}', using {default}")]
    UnparsableYear { raw: String, default: i32 },

    #[error("order sequence exhausted at {}", u32::MAX)]
    SequenceExhausted,

    #[error("config error: {0}")]
    Config(String),

    #[error("export error: {0}")]
    ExportError(String),

    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}

impl EtlError {
    /// Whether the error is recovered locally (defaulted or disambiguated)
    /// instead of failing a source or the run.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedStatusValue(_)
                | Self::DuplicateNaturalKey { .. }
                | Self::MissingNaturalKey { .. }
                | Self::UnparsableYear { .. }
        )
    }
}
