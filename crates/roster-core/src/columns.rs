use std::collections::BTreeMap;

use serde::Serialize;
use strum::{Display, EnumIter};
use tracing::debug;

use crate::error::EtlError;

/// Canonical fields a roster sheet can provide.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum LogicalField {
    CompleteNames,
    Order,
    Dama,
    CountryBirth,
    InLamaSince,
    Status,
    MotorcycleData,
    Trike,
    LicPlate,
    Photography,
    StartingOdometer,
    FinalOdometer,
}

/// A header predicate. Labels are trimmed before matching; `fold_case`
/// upper-cases the label and compares against upper-case markers.
#[derive(Debug, Clone, Copy)]
pub struct Pattern {
    pub all_of: &'static [&'static str],
    pub any_of: &'static [&'static str],
    pub none_of: &'static [&'static str],
    pub fold_case: bool,
}

impl Pattern {
    pub fn matches(&self, label: &str) -> bool {
        let trimmed = label.trim();
        let subject = if self.fold_case {
            trimmed.to_uppercase()
        } else {
            trimmed.to_string()
        };
        self.all_of.iter().all(|m| subject.contains(m))
            && (self.any_of.is_empty() || self.any_of.iter().any(|m| subject.contains(m)))
            && !self.none_of.iter().any(|m| subject.contains(m))
    }
}

/// Ordered matching tiers for one logical field. Earlier tiers win over
/// later ones regardless of column position.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: LogicalField,
    pub tiers: &'static [Pattern],
}

const fn upper(all_of: &'static [&'static str]) -> Pattern {
    Pattern {
        all_of,
        any_of: &[],
        none_of: &[],
        fold_case: true,
    }
}

/// Header rules for the chapter odometer sheets. Fields are bound in table
/// order and a column bound to one field is not offered to later fields.
pub const ROSTER_RULES: &[FieldRule] = &[
    FieldRule {
        field: LogicalField::CompleteNames,
        tiers: &[
            Pattern {
                all_of: &["Complete"],
                any_of: &[],
                none_of: &[],
                fold_case: false,
            },
            Pattern {
                all_of: &["NAMES"],
                any_of: &[],
                none_of: &["UNNAMED"],
                fold_case: true,
            },
        ],
    },
    FieldRule {
        field: LogicalField::Order,
        tiers: &[upper(&["ORDER"])],
    },
    FieldRule {
        field: LogicalField::Dama,
        tiers: &[upper(&["DAMA"])],
    },
    FieldRule {
        field: LogicalField::CountryBirth,
        tiers: &[upper(&["COUNTRY", "BIRTH"])],
    },
    FieldRule {
        field: LogicalField::InLamaSince,
        tiers: &[upper(&["LAMA", "SINCE"])],
    },
    FieldRule {
        field: LogicalField::Status,
        tiers: &[upper(&["STATUS"])],
    },
    FieldRule {
        field: LogicalField::MotorcycleData,
        tiers: &[upper(&["MOTORCYCLE", "DATA"])],
    },
    FieldRule {
        field: LogicalField::Trike,
        tiers: &[upper(&["TRIKE"])],
    },
    FieldRule {
        field: LogicalField::LicPlate,
        tiers: &[Pattern {
            all_of: &[],
            any_of: &["LIC", "PLATE"],
            none_of: &[],
            fold_case: true,
        }],
    },
    FieldRule {
        field: LogicalField::Photography,
        tiers: &[upper(&["PHOTO"])],
    },
    FieldRule {
        field: LogicalField::StartingOdometer,
        tiers: &[upper(&["STARTING", "ODOMETER"])],
    },
    FieldRule {
        field: LogicalField::FinalOdometer,
        tiers: &[upper(&["FINAL", "ODOMETER"])],
    },
];

/// A column bound to a logical field. `label` is the raw header text,
/// whitespace preserved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnBinding {
    pub index: usize,
    pub label: String,
}

/// Logical field to column bindings for one sheet.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FieldMap {
    bindings: BTreeMap<LogicalField, ColumnBinding>,
}

impl FieldMap {
    pub fn get(&self, field: LogicalField) -> Option<&ColumnBinding> {
        self.bindings.get(&field)
    }

    pub fn require(&self, field: LogicalField, sheet: &str) -> Result<&ColumnBinding, EtlError> {
        self.get(field)
            .ok_or_else(|| EtlError::RequiredColumnUnresolved {
                sheet: sheet.to_string(),
                field,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (LogicalField, &ColumnBinding)> {
        self.bindings.iter().map(|(f, b)| (*f, b))
    }

    /// Logical field bound to a column position, if any.
    pub fn field_at(&self, index: usize) -> Option<LogicalField> {
        self.bindings
            .iter()
            .find(|(_, b)| b.index == index)
            .map(|(f, _)| *f)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Bind header labels to logical fields using the given rule table.
pub fn resolve(labels: &[String], rules: &[FieldRule]) -> FieldMap {
    let mut bindings = BTreeMap::new();
    let mut claimed = vec![false; labels.len()];

    for rule in rules {
        if bindings.contains_key(&rule.field) {
            continue;
        }
        let hit = rule.tiers.iter().find_map(|pattern| {
            labels
                .iter()
                .enumerate()
                .find(|(idx, label)| !claimed[*idx] && pattern.matches(label))
        });
        if let Some((index, label)) = hit {
            debug!("Bound {} to column {} '{}'", rule.field, index, label);
            claimed[index] = true;
            bindings.insert(
                rule.field,
                ColumnBinding {
                    index,
                    label: label.clone(),
                },
            );
        }
    }

    FieldMap { bindings }
}
