//! Status command for showing where data lives and how much of it there is.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use sb_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let counts = db.counts()?;

    writeln!(writer, "Slotbook status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer, "Reservations: {}", counts.reservations)?;
    writeln!(writer, "Blocked slots: {}", counts.blocked_slots)?;
    writeln!(writer, "Services: {}", counts.services)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use sb_core::time::parse_date;
    use sb_core::{ClockTime, Service};

    #[test]
    fn status_command_outputs_counts() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("slotbook.db");
        let db = Database::open(&db_path).unwrap();

        db.upsert_service(&Service {
            name: "Facial".to_string(),
            price: 6000,
            duration_minutes: 60,
        })
        .unwrap();
        let date = parse_date("2025-03-10").unwrap();
        db.insert_blocked_slot(date, None, "closed").unwrap();
        db.insert_blocked_slot(date, Some(ClockTime::parse("10:00").unwrap()), "blocked")
            .unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &db_path).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/slotbook.db");
        assert_snapshot!(output, @r"
        Slotbook status
        Database: [TEMP]/slotbook.db
        Reservations: 0
        Blocked slots: 2
        Services: 1
        ");
    }
}
