use serde::Serialize;

/// A member row ready for insertion into `[dbo].[Members]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberRecord {
    pub chapter_id: u32,
    /// Run-wide sequence number; also the join key for the member's vehicle.
    pub order: u32,
    pub full_name: String,
    pub dama: bool,
    pub country: String,
    pub enrollment_year: i32,
    pub status: &'static str,
    pub is_eligible: bool,
}

/// A vehicle row for `[dbo].[Vehicles]`, linked to its member by `order`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRecord {
    pub order: u32,
    pub motorcycle: Option<String>,
    /// Globally unique after identity resolution.
    pub plate: String,
    pub resolution: PlateResolution,
    pub trike: bool,
    pub photography: bool,
    pub starting_odometer: Option<f64>,
    pub final_odometer: Option<f64>,
}

/// How a vehicle's stored plate relates to the plate in the sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlateResolution {
    Kept,
    Disambiguated { original: String },
    Synthesized,
}

impl PlateResolution {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Kept => "kept",
            Self::Disambiguated { .. } => "disambiguated",
            Self::Synthesized => "synthesized",
        }
    }
}
