use std::sync::Arc;

use chrono::NaiveDate;

/// A raw cell value as read from a sheet, before any field policy is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    Bool(bool),
}

impl CellValue {
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell as trimmed text, or `None` when it is blank.
    ///
    /// Whole numbers render without a fractional part so numeric plates
    /// and ids read the way they appear in the sheet.
    pub fn as_text(&self) -> Option<String> {
        let text = match self {
            Self::Empty => return None,
            Self::Text(s) => s.trim().to_string(),
            Self::Number(n) => format_number(*n),
            Self::Date(d) => d.format("%Y-%m-%d").to_string(),
            Self::Bool(b) => b.to_string(),
        };
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

pub(crate) fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// One physical row of a sheet, keyed by the raw column labels of its header row.
#[derive(Debug, Clone)]
pub struct SourceRow {
    /// Zero-based row index within the sheet.
    pub sheet_row: usize,
    labels: Arc<[String]>,
    cells: Vec<CellValue>,
}

impl SourceRow {
    pub fn new(sheet_row: usize, labels: Arc<[String]>, mut cells: Vec<CellValue>) -> Self {
        cells.resize(labels.len(), CellValue::Empty);
        Self {
            sheet_row,
            labels,
            cells,
        }
    }

    /// Cell at a column position. Out-of-range positions read as empty.
    pub fn cell(&self, index: usize) -> &CellValue {
        self.cells.get(index).unwrap_or(&CellValue::Empty)
    }

    /// First cell whose raw label equals `label` exactly, whitespace included.
    pub fn get(&self, label: &str) -> Option<&CellValue> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|idx| self.cell(idx))
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.labels
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter())
    }
}
