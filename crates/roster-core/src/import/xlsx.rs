use std::path::Path;
use std::sync::Arc;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::NaiveDate;

use crate::error::EtlError;
use crate::row::{CellValue, SourceRow};

/// Open one sheet of an Excel (.xlsx) workbook. Labels are read from
/// `header_row` (zero-based, absolute within the sheet); data rows follow it.
pub fn open_sheet(
    path: &Path,
    sheet: &str,
    header_row: u32,
    max_rows: Option<usize>,
) -> Result<SheetRows, EtlError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| EtlError::FormatUnsupported {
        path: path.to_path_buf(),
        reason: format!("Failed to open Excel file: {}", e),
    })?;

    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet) {
        return Err(EtlError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet.to_string(),
            available,
        });
    }

    let range = workbook
        .worksheet_range(sheet)
        .map_err(|e| EtlError::FormatUnsupported {
            path: path.to_path_buf(),
            reason: format!("Failed to read sheet: {}", e),
        })?;

    Ok(SheetRows::from_range(range, header_row, max_rows))
}

/// Rows below the header of one sheet, yielded in sheet order. Reading the
/// sheet again requires reopening the workbook.
#[derive(Debug)]
pub struct SheetRows {
    labels: Arc<[String]>,
    range: Range<Data>,
    next_row: u32,
    end_row: u32,
    remaining: Option<usize>,
}

impl SheetRows {
    pub fn from_range(range: Range<Data>, header_row: u32, max_rows: Option<usize>) -> Self {
        let (end_row, width) = range
            .end()
            .map(|(row, col)| (row + 1, col + 1))
            .unwrap_or((0, 0));

        let labels: Arc<[String]> = (0..width)
            .map(|col| {
                range
                    .get_value((header_row, col))
                    .map(|cell| cell.to_string())
                    .unwrap_or_default()
            })
            .collect();

        Self {
            labels,
            range,
            next_row: header_row.saturating_add(1),
            end_row,
            remaining: max_rows,
        }
    }

    /// Raw header labels, whitespace preserved.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Rows below the header not yet yielded. Non-zero after iteration ends
    /// only when the row cap cut the sheet short.
    pub fn unread(&self) -> usize {
        self.end_row.saturating_sub(self.next_row) as usize
    }
}

impl Iterator for SheetRows {
    type Item = SourceRow;

    fn next(&mut self) -> Option<SourceRow> {
        if self.next_row >= self.end_row || self.remaining == Some(0) {
            return None;
        }
        let row = self.next_row;
        self.next_row += 1;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }

        let cells = (0..self.labels.len() as u32)
            .map(|col| {
                self.range
                    .get_value((row, col))
                    .map(cell_value)
                    .unwrap_or(CellValue::Empty)
            })
            .collect();

        Some(SourceRow::new(row as usize, self.labels.clone(), cells))
    }
}

fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Float(f) => CellValue::Number(*f),
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| CellValue::Date(d.date()))
            .unwrap_or(CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|head| NaiveDate::parse_from_str(head, "%Y-%m-%d").ok())
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}
