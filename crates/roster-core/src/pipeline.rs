use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::columns::{self, FieldMap, LogicalField, ROSTER_RULES};
use crate::config::{ImportConfig, SourceConfig};
use crate::error::EtlError;
use crate::export::sql::EmitMode;
use crate::identity::Accumulator;
use crate::import;
use crate::model::{MemberRecord, VehicleRecord};
use crate::normalize::{normalize_row, NormalizedRow, RowPolicy};
use crate::report::{HeaderAudit, RunReport, SourceOutcome, SourceReport};
use crate::status::{StatusNormalizer, StatusTier};

/// The normalized rows of one source, before orders are assigned.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub fields: FieldMap,
    pub rows: Vec<NormalizedRow>,
    pub rows_scanned: usize,
    pub dropped_without_name: usize,
    pub blank_rows: usize,
    /// Rows below the `max_rows` cap that were never read.
    pub rows_not_read: usize,
}

/// Every retained record of a run, ordered by chapter then sheet row.
#[derive(Debug, Clone)]
pub struct PooledRun {
    pub members: Vec<MemberRecord>,
    pub vehicles: Vec<VehicleRecord>,
    pub report: RunReport,
}

impl PooledRun {
    /// Member holding `order`. Members are stored in ascending order.
    pub fn member(&self, order: u32) -> Option<&MemberRecord> {
        self.members
            .binary_search_by_key(&order, |m| m.order)
            .ok()
            .map(|idx| &self.members[idx])
    }
}

/// Read and normalize one source. Touches no run-wide state.
pub fn load_source(source: &SourceConfig, policy: &RowPolicy) -> Result<SourceBatch, EtlError> {
    let mut sheet = import::open_source(source, policy.defaults.max_rows)?;
    let fields = columns::resolve(sheet.labels(), ROSTER_RULES);
    let name = fields.require(LogicalField::CompleteNames, &source.sheet)?;
    debug!(
        "{}: names in column {} '{}'",
        source.name, name.index, name.label
    );

    let mut batch = SourceBatch {
        fields: FieldMap::default(),
        rows: Vec::new(),
        rows_scanned: 0,
        dropped_without_name: 0,
        blank_rows: 0,
        rows_not_read: 0,
    };
    for row in sheet.by_ref() {
        batch.rows_scanned += 1;
        match normalize_row(&row, &fields, policy) {
            Some(normalized) => batch.rows.push(normalized),
            None if row.iter().all(|(_, cell)| cell.is_blank()) => batch.blank_rows += 1,
            None => batch.dropped_without_name += 1,
        }
    }
    batch.rows_not_read = sheet.unread();
    if batch.rows_not_read > 0 {
        warn!(
            "{}: stopped after {} rows, {} rows below were not read (max_rows)",
            source.name, batch.rows_scanned, batch.rows_not_read
        );
    }
    batch.fields = fields;
    Ok(batch)
}

/// Run every configured source and pool the results.
pub fn run(config: &ImportConfig) -> Result<PooledRun, EtlError> {
    let status = StatusNormalizer::new(&config.defaults.status).ok_or_else(|| {
        EtlError::Config(format!(
            "default status '{}' is not a known status",
            config.defaults.status
        ))
    })?;
    let policy = RowPolicy::new(config.defaults.clone(), status);
    let start_after = match config.output.mode {
        EmitMode::Append => config.output.start_after,
        EmitMode::Replace => 0,
    };
    run_sources(&config.sources, &policy, start_after)
}

/// Process sources in the given order, numbering members from
/// `start_after + 1`. A failing source is reported and skipped; running out
/// of orders fails the run.
pub fn run_sources(
    sources: &[SourceConfig],
    policy: &RowPolicy,
    start_after: u32,
) -> Result<PooledRun, EtlError> {
    let mut acc = Accumulator::new(start_after);
    let mut report = RunReport::default();

    for source in sources {
        match load_source(source, policy) {
            Ok(batch) => absorb(&mut acc, &mut report, source, policy, batch)?,
            Err(e) => {
                warn!("Skipping chapter {} ({}): {}", source.chapter_id, source.name, e);
                report.record_failure(source, &e);
            }
        }
    }

    let (first_order, last_order) = acc.order_range().unzip();
    let (members, vehicles) = acc.into_records();
    report.totals.members = members.len();
    report.totals.vehicles = vehicles.len();
    report.totals.first_order = first_order;
    report.totals.last_order = last_order;

    info!(
        "Pooled {} members and {} vehicles from {} sources ({} failed)",
        members.len(),
        vehicles.len(),
        sources.len(),
        report.totals.failed_sources
    );

    Ok(PooledRun {
        members,
        vehicles,
        report,
    })
}

fn absorb(
    acc: &mut Accumulator,
    report: &mut RunReport,
    source: &SourceConfig,
    policy: &RowPolicy,
    batch: SourceBatch,
) -> Result<(), EtlError> {
    let members_before = acc.members().len();
    let vehicles_before = acc.vehicles().len();

    for row in batch.rows {
        let sheet_row = row.sheet_row;
        let unrecognized = (row.status.tier == StatusTier::Unrecognized)
            .then(|| row.raw_status.clone().unwrap_or_default());
        let unparsed_year = row.unparsed_year.clone();
        if row.year_defaulted {
            report.totals.defaulted_years += 1;
        }

        let admission = acc.admit(source.chapter_id, row)?;

        if let Some(raw) = unrecognized {
            warn!(
                "{} row {}: unrecognized status '{}', using default",
                source.name,
                sheet_row + 1,
                raw
            );
            report.record_warning(
                source.chapter_id,
                sheet_row,
                admission.order,
                &EtlError::UnrecognizedStatusValue(raw),
            );
        }
        if let Some(raw) = unparsed_year {
            let default = policy.defaults.enrollment_year;
            warn!(
                "{} row {}: unparsable year '{}', using {}",
                source.name,
                sheet_row + 1,
                raw,
                default
            );
            report.record_warning(
                source.chapter_id,
                sheet_row,
                admission.order,
                &EtlError::UnparsableYear { raw, default },
            );
        }
        if let Some(plate_warning) = admission.plate_warning {
            report.record_warning(source.chapter_id, sheet_row, admission.order, &plate_warning);
        }
    }

    let vehicles = acc.vehicles().len() - vehicles_before;
    report.totals.dropped_without_name += batch.dropped_without_name;
    report.totals.rows_not_read += batch.rows_not_read;

    let members = acc.members().len() - members_before;
    info!(
        "{}: {} members, {} vehicles from {} rows",
        source.name, members, vehicles, batch.rows_scanned
    );

    report.sources.push(SourceReport {
        chapter_id: source.chapter_id,
        name: source.name.clone(),
        path: source.path.clone(),
        outcome: SourceOutcome::Loaded {
            rows_scanned: batch.rows_scanned,
            members,
            dropped_without_name: batch.dropped_without_name,
            blank_rows: batch.blank_rows,
            rows_not_read: batch.rows_not_read,
            vehicles,
        },
        fields: Some(batch.fields),
    });
    Ok(())
}

/// Read only the header row of a source and resolve it.
pub fn inspect_headers(source: &SourceConfig) -> Result<HeaderAudit, EtlError> {
    let sheet = import::open_source(source, Some(0))?;
    let labels = sheet.labels().to_vec();
    let fields = columns::resolve(&labels, ROSTER_RULES);
    let unresolved = LogicalField::iter()
        .filter(|f| fields.get(*f).is_none())
        .collect();
    Ok(HeaderAudit {
        labels,
        fields,
        unresolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(order: u32) -> MemberRecord {
        MemberRecord {
            chapter_id: 1,
            order,
            full_name: format!("M{}", order),
            dama: false,
            country: "COLOMBIA".to_string(),
            enrollment_year: 2025,
            status: "PROSPECT",
            is_eligible: true,
        }
    }

    #[test]
    fn test_member_lookup_by_order() {
        let run = PooledRun {
            members: (155..=1154).map(member).collect(),
            vehicles: Vec::new(),
            report: RunReport::default(),
        };
        assert_eq!(run.member(155).unwrap().full_name, "M155");
        assert_eq!(run.member(700).unwrap().order, 700);
        assert_eq!(run.member(1154).unwrap().order, 1154);
        assert!(run.member(154).is_none());
        assert!(run.member(1155).is_none());
    }
}
