use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::config::ImportConfig;
use crate::error::EtlError;
use crate::model::{MemberRecord, VehicleRecord};

/// UTF-8 byte-order mark; the target server needs it to read accented literals.
pub const BOM: &[u8] = b"\xEF\xBB\xBF";

pub const MEMBER_COLUMNS: &str = "([ChapterId], [Order], [ Complete Names], [Dama], [Country Birth], [In Lama Since], [STATUS], [is_eligible])";

pub const VEHICLE_COLUMNS: &str = "([MemberId], [ Motorcycle Data], [Lic Plate], [Trike], [Photography], [Starting Odometer], [Final Odometer], [IsActiveForChampionship])";

/// How the script treats rows already in the database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EmitMode {
    /// Insert after the existing rows, numbering from `start_after + 1`.
    #[default]
    Append,
    /// Delete vehicles, then members, then insert the full set.
    Replace,
}

#[derive(Debug, Clone)]
pub struct ScriptOptions {
    pub mode: EmitMode,
    pub start_after: u32,
    pub affirmative: String,
    pub negative: String,
}

impl ScriptOptions {
    pub fn from_config(config: &ImportConfig) -> Self {
        Self {
            mode: config.output.mode,
            start_after: config.output.start_after,
            affirmative: config.defaults.affirmative.clone(),
            negative: config.defaults.negative.clone(),
        }
    }

    fn token(&self, value: bool) -> &str {
        if value {
            self.affirmative.as_str()
        } else {
            self.negative.as_str()
        }
    }
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self::from_config(&ImportConfig::default())
    }
}

/// Write the insert script to a file.
pub fn export(
    members: &[MemberRecord],
    vehicles: &[VehicleRecord],
    path: &Path,
    options: &ScriptOptions,
) -> Result<usize, EtlError> {
    let file = std::fs::File::create(path)?;
    let mut writer = std::io::BufWriter::new(file);
    let count = write_script(&mut writer, members, vehicles, options)?;
    writer.flush()?;
    Ok(count)
}

/// Write a transaction-wrapped insert script to any writer. Returns the
/// number of insert statements written.
pub fn write_script<W: Write>(
    mut w: W,
    members: &[MemberRecord],
    vehicles: &[VehicleRecord],
    options: &ScriptOptions,
) -> Result<usize, EtlError> {
    w.write_all(BOM)?;

    writeln!(w, "-- Chapter roster import: members and vehicles ({} mode)", options.mode)?;
    writeln!(w, "SET NOCOUNT ON;")?;
    writeln!(w, "BEGIN TRANSACTION;")?;
    writeln!(w)?;
    writeln!(w, "BEGIN TRY")?;
    writeln!(w)?;

    match options.mode {
        EmitMode::Append => {
            writeln!(
                w,
                "IF EXISTS (SELECT 1 FROM [dbo].[Members] WHERE [Order] > {})",
                options.start_after
            )?;
            writeln!(w, "BEGIN")?;
            writeln!(
                w,
                "    ;THROW 50001, N'Members already hold orders above {}; regenerate the script.', 1;",
                options.start_after
            )?;
            writeln!(w, "END")?;
        }
        EmitMode::Replace => {
            writeln!(w, "-- Clear previous data")?;
            writeln!(w, "DELETE FROM [dbo].[Vehicles];")?;
            writeln!(w, "DELETE FROM [dbo].[Members];")?;
        }
    }
    writeln!(w)?;

    writeln!(w, "-- ===== MEMBERS ({}) =====", members.len())?;
    for member in members {
        writeln!(w, "INSERT INTO [dbo].[Members]")?;
        writeln!(w, "    {}", MEMBER_COLUMNS)?;
        writeln!(w, "VALUES")?;
        writeln!(
            w,
            "    ({}, {}, {}, {},",
            member.chapter_id,
            member.order,
            quote(&member.full_name),
            quote(options.token(member.dama))
        )?;
        writeln!(
            w,
            "     {}, {}, {}, {});",
            quote(&member.country),
            member.enrollment_year,
            quote(member.status),
            bit(member.is_eligible)
        )?;
    }
    writeln!(w)?;

    writeln!(w, "-- ===== VEHICLES ({}) =====", vehicles.len())?;
    for vehicle in vehicles {
        let var = format!("@MemberId_{}", vehicle.order);
        writeln!(w)?;
        writeln!(w, "DECLARE {} INT;", var)?;
        writeln!(
            w,
            "SELECT {} = [MemberId] FROM [dbo].[Members] WHERE [Order] = {};",
            var, vehicle.order
        )?;
        writeln!(w, "INSERT INTO [dbo].[Vehicles]")?;
        writeln!(w, "    {}", VEHICLE_COLUMNS)?;
        writeln!(w, "VALUES")?;
        writeln!(
            w,
            "    ({}, {}, {},",
            var,
            quote(vehicle.motorcycle.as_deref().unwrap_or_default()),
            quote(&vehicle.plate)
        )?;
        writeln!(
            w,
            "     {}, {}, {}, {}, 1);",
            bit(vehicle.trike),
            quote(options.token(vehicle.photography)),
            reading_literal(vehicle.starting_odometer),
            reading_literal(vehicle.final_odometer)
        )?;
    }
    writeln!(w)?;

    writeln!(w, "COMMIT TRANSACTION;")?;
    writeln!(
        w,
        "PRINT 'Import complete: {} members, {} vehicles.';",
        members.len(),
        vehicles.len()
    )?;
    writeln!(w)?;
    writeln!(w, "END TRY")?;
    writeln!(w, "BEGIN CATCH")?;
    writeln!(w, "    ROLLBACK TRANSACTION;")?;
    writeln!(w, "    THROW;")?;
    writeln!(w, "END CATCH;")?;

    Ok(members.len() + vehicles.len())
}

/// National-character string literal with single quotes doubled.
pub fn quote(text: &str) -> String {
    format!("N'{}'", text.replace('\'', "''"))
}

fn bit(value: bool) -> u8 {
    u8::from(value)
}

/// Odometer literal; missing, zero and negative readings become NULL.
pub fn reading_literal(value: Option<f64>) -> String {
    match value {
        Some(v) if v > 0.0 => v.to_string(),
        _ => "NULL".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PlateResolution;

    fn member(order: u32, name: &str) -> MemberRecord {
        MemberRecord {
            chapter_id: 1,
            order,
            full_name: name.to_string(),
            dama: false,
            country: "COLOMBIA".to_string(),
            enrollment_year: 2019,
            status: "FUL COLOR MEMBER",
            is_eligible: true,
        }
    }

    fn vehicle(order: u32, plate: &str) -> VehicleRecord {
        VehicleRecord {
            order,
            motorcycle: Some("Honda Gold Wing".to_string()),
            plate: plate.to_string(),
            resolution: PlateResolution::Kept,
            trike: true,
            photography: false,
            starting_odometer: Some(0.0),
            final_odometer: Some(15234.5),
        }
    }

    fn render(members: &[MemberRecord], vehicles: &[VehicleRecord], options: &ScriptOptions) -> String {
        let mut buf = Vec::new();
        write_script(&mut buf, members, vehicles, options).unwrap();
        assert!(buf.starts_with(BOM));
        String::from_utf8(buf[BOM.len()..].to_vec()).unwrap()
    }

    #[test]
    fn test_quote_doubles_single_quotes() {
        assert_eq!(quote("O'Connor"), "N'O''Connor'");
        assert_eq!(quote(""), "N''");
        assert_eq!(quote("Medellín"), "N'Medellín'");
    }

    #[test]
    fn test_reading_literal() {
        assert_eq!(reading_literal(None), "NULL");
        assert_eq!(reading_literal(Some(0.0)), "NULL");
        assert_eq!(reading_literal(Some(-3.0)), "NULL");
        assert_eq!(reading_literal(Some(15000.0)), "15000");
        assert_eq!(reading_literal(Some(15234.5)), "15234.5");
    }

    #[test]
    fn test_member_insert() {
        let sql = render(&[member(1, "José O'Neil")], &[], &ScriptOptions::default());
        assert!(sql.contains(
            "INSERT INTO [dbo].[Members]\n    ([ChapterId], [Order], [ Complete Names], [Dama], [Country Birth], [In Lama Since], [STATUS], [is_eligible])\nVALUES\n    (1, 1, N'José O''Neil', N'NO',\n     N'COLOMBIA', 2019, N'FUL COLOR MEMBER', 1);"
        ));
    }

    #[test]
    fn test_vehicle_insert_links_by_order() {
        let sql = render(
            &[member(7, "Ana")],
            &[vehicle(7, "ABC123")],
            &ScriptOptions::default(),
        );
        assert!(sql.contains("DECLARE @MemberId_7 INT;"));
        assert!(sql.contains(
            "SELECT @MemberId_7 = [MemberId] FROM [dbo].[Members] WHERE [Order] = 7;"
        ));
        assert!(sql.contains(VEHICLE_COLUMNS));
        assert!(sql.contains(
            "    (@MemberId_7, N'Honda Gold Wing', N'ABC123',\n     1, N'NO', NULL, 15234.5, 1);"
        ));
        // member inserts precede vehicle inserts
        assert!(sql.find("[dbo].[Members]\n").unwrap() < sql.find("[dbo].[Vehicles]\n").unwrap());
    }

    #[test]
    fn test_transaction_wrapper() {
        let sql = render(&[member(1, "A")], &[], &ScriptOptions::default());
        let begin = sql.find("BEGIN TRANSACTION;").unwrap();
        let try_ = sql.find("BEGIN TRY").unwrap();
        let commit = sql.find("COMMIT TRANSACTION;").unwrap();
        let catch = sql.find("BEGIN CATCH").unwrap();
        assert!(begin < try_ && try_ < commit && commit < catch);
        assert!(sql.contains("    ROLLBACK TRANSACTION;\n    THROW;\nEND CATCH;"));
    }

    #[test]
    fn test_replace_deletes_vehicles_first() {
        let options = ScriptOptions {
            mode: EmitMode::Replace,
            ..ScriptOptions::default()
        };
        let sql = render(&[member(1, "A")], &[vehicle(1, "X1")], &options);
        let vehicles = sql.find("DELETE FROM [dbo].[Vehicles];").unwrap();
        let members = sql.find("DELETE FROM [dbo].[Members];").unwrap();
        assert!(vehicles < members);
        assert!(members < sql.find("INSERT INTO").unwrap());
        assert!(!sql.contains("THROW 50001"));
    }

    #[test]
    fn test_append_guards_start_order() {
        let options = ScriptOptions {
            start_after: 154,
            ..ScriptOptions::default()
        };
        let sql = render(&[member(155, "A")], &[], &options);
        assert!(sql.contains("IF EXISTS (SELECT 1 FROM [dbo].[Members] WHERE [Order] > 154)"));
        assert!(!sql.contains("DELETE FROM"));
    }

    #[test]
    fn test_missing_description_is_empty_literal() {
        let mut v = vehicle(2, "AUTO_ORD_2");
        v.motorcycle = None;
        let sql = render(&[member(2, "B")], &[v], &ScriptOptions::default());
        assert!(sql.contains("(@MemberId_2, N'', N'AUTO_ORD_2',"));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("replace".parse::<EmitMode>().unwrap(), EmitMode::Replace);
        assert_eq!("append".parse::<EmitMode>().unwrap(), EmitMode::Append);
        assert!("merge".parse::<EmitMode>().is_err());
        assert_eq!(EmitMode::Replace.to_string(), "replace");
    }
}
