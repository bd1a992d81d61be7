use chrono::Datelike;

use crate::columns::{FieldMap, LogicalField};
use crate::config::Defaults;
use crate::row::{CellValue, SourceRow};
use crate::status::{NormalizedStatus, StatusNormalizer};

/// Field policies for one run: configured defaults plus the status table.
#[derive(Debug, Clone)]
pub struct RowPolicy {
    pub defaults: Defaults,
    pub status: StatusNormalizer,
}

impl RowPolicy {
    pub fn new(defaults: Defaults, status: StatusNormalizer) -> Self {
        Self { defaults, status }
    }
}

impl Default for RowPolicy {
    fn default() -> Self {
        Self::new(Defaults::default(), StatusNormalizer::default())
    }
}

/// A row after field cleaning, before it is given an order.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub sheet_row: usize,
    pub full_name: String,
    pub dama: bool,
    pub country: String,
    pub enrollment_year: i32,
    /// True when the year came from the configured default.
    pub year_defaulted: bool,
    /// Year cell text that was present but could not be read as a year.
    pub unparsed_year: Option<String>,
    pub status: NormalizedStatus,
    /// Trimmed status text as found in the sheet.
    pub raw_status: Option<String>,
    pub vehicle: Option<VehicleDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleDraft {
    pub motorcycle: Option<String>,
    /// Plate text as found in the sheet, not yet disambiguated.
    pub plate: Option<String>,
    pub trike: bool,
    pub photography: bool,
    /// Zero and negative readings are kept here; the emitter writes them as NULL.
    pub starting_odometer: Option<f64>,
    pub final_odometer: Option<f64>,
}

/// Normalize one sheet row. Returns `None` when the row has no name.
pub fn normalize_row(
    row: &SourceRow,
    fields: &FieldMap,
    policy: &RowPolicy,
) -> Option<NormalizedRow> {
    let cell = |field| field_cell(row, fields, field);
    let defaults = &policy.defaults;

    let full_name = required_text(cell(LogicalField::CompleteNames))?;

    let year_cell = cell(LogicalField::InLamaSince);
    let year = extract_year(year_cell);
    let status_cell = cell(LogicalField::Status);

    let motorcycle = cell(LogicalField::MotorcycleData).as_text();
    let plate = cell(LogicalField::LicPlate).as_text();
    let vehicle = if motorcycle.is_some() || plate.is_some() {
        Some(VehicleDraft {
            motorcycle,
            plate,
            trike: flag(cell(LogicalField::Trike), &defaults.affirmative),
            photography: flag(cell(LogicalField::Photography), &defaults.affirmative),
            starting_odometer: reading(cell(LogicalField::StartingOdometer)),
            final_odometer: reading(cell(LogicalField::FinalOdometer)),
        })
    } else {
        None
    };

    Some(NormalizedRow {
        sheet_row: row.sheet_row,
        full_name,
        dama: flag(cell(LogicalField::Dama), &defaults.affirmative),
        country: text_or_default(cell(LogicalField::CountryBirth), &defaults.country),
        enrollment_year: year.unwrap_or(defaults.enrollment_year),
        year_defaulted: year.is_none(),
        unparsed_year: year.is_none().then(|| year_cell.as_text()).flatten(),
        status: policy.status.normalize_cell(status_cell),
        raw_status: status_cell.as_text(),
        vehicle,
    })
}

fn field_cell<'a>(row: &'a SourceRow, fields: &FieldMap, field: LogicalField) -> &'a CellValue {
    fields
        .get(field)
        .map(|binding| row.cell(binding.index))
        .unwrap_or(&CellValue::Empty)
}

/// Trimmed, non-empty text or `None`. Rows without it are dropped.
pub fn required_text(cell: &CellValue) -> Option<String> {
    cell.as_text()
}

pub fn text_or_default(cell: &CellValue, default: &str) -> String {
    cell.as_text().unwrap_or_else(|| default.to_string())
}

/// Year from a date, a number (truncated) or the first four characters of
/// text, in that order. `None` when nothing parses or a number does not fit.
pub fn extract_year(cell: &CellValue) -> Option<i32> {
    match cell {
        CellValue::Date(date) => Some(date.year()),
        CellValue::Number(n) => {
            let year = n.trunc();
            (year >= i32::MIN as f64 && year <= i32::MAX as f64).then(|| year as i32)
        }
        CellValue::Text(s) => {
            let head: String = s.chars().take(4).collect();
            head.trim().parse().ok()
        }
        _ => None,
    }
}

/// True iff the trimmed, upper-cased text equals the affirmative token.
pub fn flag(cell: &CellValue, affirmative: &str) -> bool {
    cell.as_text()
        .map(|text| text.to_uppercase() == affirmative.trim().to_uppercase())
        .unwrap_or(false)
}

pub fn reading(cell: &CellValue) -> Option<f64> {
    let value = match cell {
        CellValue::Number(n) => *n,
        CellValue::Text(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}
