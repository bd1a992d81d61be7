use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use super::{audit_rows, AUDIT_HEADER};
use crate::error::EtlError;
use crate::pipeline::PooledRun;

/// Export the plate audit to an Excel (.xlsx) workbook.
pub fn export(run: &PooledRun, path: &Path) -> Result<usize, EtlError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    worksheet
        .set_name("Plates")
        .map_err(|e| EtlError::ExportError(format!("Excel error: {}", e)))?;

    let header_format = Format::new().set_bold();
    for (col, label) in AUDIT_HEADER.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *label, &header_format)
            .map_err(|e| EtlError::ExportError(format!("Excel write error: {}", e)))?;
    }

    let rows = audit_rows(run);
    for (row_idx, cells) in rows.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col, value) in cells.iter().enumerate() {
            if !value.is_empty() {
                worksheet
                    .write_string(row, col as u16, value)
                    .map_err(|e| EtlError::ExportError(format!("Excel write error: {}", e)))?;
            }
        }
    }

    worksheet
        .set_column_width(2, 40)
        .map_err(|e| EtlError::ExportError(format!("Excel error: {}", e)))?;

    workbook
        .save(path)
        .map_err(|e| EtlError::ExportError(format!("Excel save failed: {}", e)))?;

    Ok(rows.len())
}
