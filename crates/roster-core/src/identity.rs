use std::collections::HashSet;

use tracing::warn;

use crate::error::EtlError;
use crate::model::{MemberRecord, PlateResolution, VehicleRecord};
use crate::normalize::NormalizedRow;

/// Run-wide identity state: the next sequence order and every plate
/// handed out so far. Threaded through sources in chapter order.
#[derive(Debug, Clone)]
pub struct Accumulator {
    /// `None` once `u32::MAX` has been handed out.
    next_order: Option<u32>,
    /// Upper-cased, since the destination compares plates case-insensitively.
    seen_plates: HashSet<String>,
    members: Vec<MemberRecord>,
    vehicles: Vec<VehicleRecord>,
}

/// What happened to one admitted row.
#[derive(Debug)]
pub struct Admission {
    pub order: u32,
    /// Set when the row's plate collided with an earlier one or had to be
    /// synthesized.
    pub plate_warning: Option<EtlError>,
}

impl Accumulator {
    /// Start numbering at `start_after + 1`.
    pub fn new(start_after: u32) -> Self {
        Self {
            next_order: start_after.checked_add(1),
            seen_plates: HashSet::new(),
            members: Vec::new(),
            vehicles: Vec::new(),
        }
    }

    /// Assign the next order to a row and resolve its vehicle plate.
    pub fn admit(&mut self, chapter_id: u32, row: NormalizedRow) -> Result<Admission, EtlError> {
        let order = self.next_order.ok_or(EtlError::SequenceExhausted)?;
        self.next_order = order.checked_add(1);

        let mut plate_warning = None;
        if let Some(draft) = row.vehicle {
            let (plate, resolution) = self.claim_plate(draft.plate.as_deref(), order);
            match &resolution {
                PlateResolution::Disambiguated { original } => {
                    warn!(
                        "Duplicate plate '{}' at order {}, stored as '{}'",
                        original, order, plate
                    );
                    plate_warning = Some(EtlError::DuplicateNaturalKey {
                        key: original.clone(),
                        order,
                        resolved: plate.clone(),
                    });
                }
                PlateResolution::Synthesized => {
                    warn!("No plate at order {}, stored as '{}'", order, plate);
                    plate_warning = Some(EtlError::MissingNaturalKey {
                        order,
                        synthesized: plate.clone(),
                    });
                }
                PlateResolution::Kept => {}
            }
            self.vehicles.push(VehicleRecord {
                order,
                motorcycle: draft.motorcycle,
                plate,
                resolution,
                trike: draft.trike,
                photography: draft.photography,
                starting_odometer: draft.starting_odometer,
                final_odometer: draft.final_odometer,
            });
        }

        self.members.push(MemberRecord {
            chapter_id,
            order,
            full_name: row.full_name,
            dama: row.dama,
            country: row.country,
            enrollment_year: row.enrollment_year,
            status: row.status.value,
            is_eligible: true,
        });

        Ok(Admission {
            order,
            plate_warning,
        })
    }

    fn claim_plate(&mut self, raw: Option<&str>, order: u32) -> (String, PlateResolution) {
        let (plate, resolution) = match raw {
            Some(plate) if !self.is_taken(plate) => (plate.to_string(), PlateResolution::Kept),
            Some(plate) => (
                self.unique(format!("{}_ORD{}", plate, order)),
                PlateResolution::Disambiguated {
                    original: plate.to_string(),
                },
            ),
            None => (
                self.unique(format!("AUTO_ORD_{}", order)),
                PlateResolution::Synthesized,
            ),
        };
        self.seen_plates.insert(plate.to_uppercase());
        (plate, resolution)
    }

    fn is_taken(&self, plate: &str) -> bool {
        self.seen_plates.contains(&plate.to_uppercase())
    }

    fn unique(&self, base: String) -> String {
        if !self.is_taken(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.is_taken(candidate))
            .unwrap_or(base)
    }

    pub fn members(&self) -> &[MemberRecord] {
        &self.members
    }

    pub fn vehicles(&self) -> &[VehicleRecord] {
        &self.vehicles
    }

    /// Range of orders assigned so far, if any.
    pub fn order_range(&self) -> Option<(u32, u32)> {
        let first = self.members.first()?;
        let last = self.members.last()?;
        Some((first.order, last.order))
    }

    pub fn into_records(self) -> (Vec<MemberRecord>, Vec<VehicleRecord>) {
        (self.members, self.vehicles)
    }
}
