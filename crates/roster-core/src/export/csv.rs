use std::path::Path;

use super::{audit_rows, AUDIT_HEADER};
use crate::error::EtlError;
use crate::pipeline::PooledRun;

/// Export the plate audit to a CSV file.
pub fn export(run: &PooledRun, path: &Path) -> Result<usize, EtlError> {
    let file = std::fs::File::create(path)
        .map_err(|e| EtlError::ExportError(format!("Failed to create file: {}", e)))?;
    let writer = std::io::BufWriter::new(file);

    write_plate_audit(writer, run)
}

/// Write the plate audit as CSV, one row per vehicle.
pub fn write_plate_audit<W: std::io::Write>(writer: W, run: &PooledRun) -> Result<usize, EtlError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer
        .write_record(AUDIT_HEADER)
        .map_err(|e| EtlError::ExportError(format!("CSV write failed: {}", e)))?;

    let rows = audit_rows(run);
    for row in &rows {
        csv_writer
            .write_record(row)
            .map_err(|e| EtlError::ExportError(format!("CSV write failed: {}", e)))?;
    }

    csv_writer
        .flush()
        .map_err(|e| EtlError::ExportError(format!("CSV flush failed: {}", e)))?;

    Ok(rows.len())
}
