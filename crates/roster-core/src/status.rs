//! Membership status canonicalization.
//!
//! Free-text status labels from the rosters are mapped onto a closed
//! vocabulary. `FUL COLOR MEMBER` is spelled the way the destination table
//! already stores it.

use std::collections::HashMap;

use serde::Serialize;
use strum::Display;

use crate::row::CellValue;

pub const DEFAULT_STATUS: &str = "PROSPECT";

/// The closed set of valid status strings.
pub const VOCABULARY: &[&str] = &[
    "PROSPECT",
    "ROCKET PROSPECT",
    "FUL COLOR MEMBER",
    "CHAPTER PRESIDENT",
    "CHAPTER VICEPRESIDENT",
    "CHAPTER TREASURER",
    "CHAPTER BUSSINESS MANAGER",
    "CHAPTER SECRETARY",
    "CHAPTER MTO",
    "REGIONAL PRESIDENT",
    "REGIONAL VICEPRESIDENT",
    "REGIONAL TREASURER",
    "REGIONAL BUSSINESS MANAGER",
    "REGIONAL SECRETARY",
    "REGIONAL MTO",
    "NATIONAL PRESIDENT",
    "NATIONAL VICEPRESIDENT",
    "NATIONAL TREASURER",
    "NATIONAL BUSSINESS MANAGER",
    "NATIONAL SECRETARY",
    "NATIONAL MTO",
    "CONTINENTAL PRESIDENT",
    "CONTINENTAL VICEPRESIDENT",
    "CONTINENTAL TREASURER",
    "CONTINENTAL BUSSINESS MANAGER",
    "CONTINENTAL SECRETARY",
    "CONTINENTAL MTO",
    "INTERNATIONAL PRESIDENT",
    "INTERNATIONAL VICEPRESIDENT",
    "INTERNATIONAL TREASURER",
    "INTERNATIONAL BUSSINESS MANAGER",
    "INTERNATIONAL SECRETARY",
    "INTERNATIONAL MTO",
];

/// Known historical spellings, matched exactly after trimming.
pub const ALIASES: &[(&str, &str)] = &[
    ("FULL COLOR MEMBER", "FUL COLOR MEMBER"),
    ("Full Color Member", "FUL COLOR MEMBER"),
    ("full color member", "FUL COLOR MEMBER"),
    ("Chapter Mto", "CHAPTER MTO"),
    ("chapter mto", "CHAPTER MTO"),
    ("Chapter Secretary", "CHAPTER SECRETARY"),
    ("chapter secretary", "CHAPTER SECRETARY"),
    ("Chapter Vicepresident", "CHAPTER VICEPRESIDENT"),
    ("Chapter Vice-President", "CHAPTER VICEPRESIDENT"),
    ("CHAPTER VICE-PRESIDEN", "CHAPTER VICEPRESIDENT"),
    ("CHAPTER VICE-PRESIDENT", "CHAPTER VICEPRESIDENT"),
    ("Regional Vice-President", "REGIONAL VICEPRESIDENT"),
    ("National Vice-President", "NATIONAL VICEPRESIDENT"),
    ("Continental Vice-President", "CONTINENTAL VICEPRESIDENT"),
    ("International Vice-President", "INTERNATIONAL VICEPRESIDENT"),
];

/// Which lookup tier produced a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTier {
    /// Blank, missing or non-text input.
    Default,
    Alias,
    Exact,
    CaseFolded,
    /// Non-blank text outside the vocabulary; the default was used.
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedStatus {
    pub value: &'static str,
    pub tier: StatusTier,
}

#[derive(Debug, Clone)]
pub struct StatusNormalizer {
    default: &'static str,
    aliases: HashMap<&'static str, &'static str>,
}

impl Default for StatusNormalizer {
    fn default() -> Self {
        Self {
            default: DEFAULT_STATUS,
            aliases: ALIASES.iter().copied().collect(),
        }
    }
}

impl StatusNormalizer {
    /// Build a normalizer whose fallback is `default`. Returns `None` if the
    /// default is not a vocabulary entry.
    pub fn new(default: &str) -> Option<Self> {
        let default = canonical(default)?;
        Some(Self {
            default,
            aliases: ALIASES.iter().copied().collect(),
        })
    }

    pub fn default_status(&self) -> &'static str {
        self.default
    }

    pub fn normalize_cell(&self, cell: &CellValue) -> NormalizedStatus {
        match cell {
            CellValue::Text(s) => self.normalize(s),
            _ => self.fallback(StatusTier::Default),
        }
    }

    pub fn normalize(&self, raw: &str) -> NormalizedStatus {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return self.fallback(StatusTier::Default);
        }
        if let Some(&target) = self.aliases.get(trimmed) {
            return NormalizedStatus {
                value: target,
                tier: StatusTier::Alias,
            };
        }
        if let Some(value) = canonical(trimmed) {
            return NormalizedStatus {
                value,
                tier: StatusTier::Exact,
            };
        }
        if let Some(value) = VOCABULARY
            .iter()
            .copied()
            .find(|v| v.eq_ignore_ascii_case(trimmed))
        {
            return NormalizedStatus {
                value,
                tier: StatusTier::CaseFolded,
            };
        }
        self.fallback(StatusTier::Unrecognized)
    }

    fn fallback(&self, tier: StatusTier) -> NormalizedStatus {
        NormalizedStatus {
            value: self.default,
            tier,
        }
    }
}

/// The vocabulary entry equal to `value`, if any.
pub fn canonical(value: &str) -> Option<&'static str> {
    VOCABULARY.iter().copied().find(|v| *v == value)
}
