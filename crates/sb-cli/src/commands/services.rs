//! `sb services`: maintain the service catalog.

use std::io::Write;

use anyhow::{Context, Result};

use sb_core::Service;
use sb_db::Database;

use super::util::{format_minutes, format_price};

pub fn list<W: Write>(writer: &mut W, db: &Database, json: bool) -> Result<()> {
    let services = db.list_services().context("failed to list services")?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&services)?)?;
        return Ok(());
    }

    if services.is_empty() {
        writeln!(writer, "No services defined.")?;
        writeln!(writer)?;
        writeln!(
            writer,
            "Hint: Run 'sb services add --name <NAME> --price <CENTS> --duration <MINUTES>'."
        )?;
        return Ok(());
    }

    writeln!(writer, "{:<24}  {:>8}  {:>9}", "Service", "Duration", "Price")?;
    writeln!(writer, "────────────────────────  ────────  ─────────")?;
    for service in services {
        writeln!(
            writer,
            "{:<24}  {:>8}  {:>9}",
            service.name,
            format_minutes(service.duration_minutes),
            format_price(service.price)
        )?;
    }
    Ok(())
}

pub fn add<W: Write>(writer: &mut W, db: &Database, service: &Service) -> Result<()> {
    db.upsert_service(service)?;
    writeln!(
        writer,
        "Saved service {} ({}, {})",
        service.name,
        format_minutes(service.duration_minutes),
        format_price(service.price)
    )?;
    Ok(())
}

pub fn remove<W: Write>(writer: &mut W, db: &Database, name: &str) -> Result<()> {
    if db.delete_service(name)? {
        writeln!(writer, "Removed service {name}")?;
        Ok(())
    } else {
        anyhow::bail!("no service named {name:?}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;

    fn service(name: &str, price: i64, minutes: i64) -> Service {
        Service {
            name: name.to_string(),
            price,
            duration_minutes: minutes,
        }
    }

    #[test]
    fn services_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();

        list(&mut output, &db, false).unwrap();
        add(&mut output, &db, &service("Massage", 9000, 90)).unwrap();
        add(&mut output, &db, &service("Facial", 6000, 60)).unwrap();
        remove(&mut output, &db, "Massage").unwrap();
        add(&mut output, &db, &service("Manicure", 3550, 45)).unwrap();
        list(&mut output, &db, false).unwrap();

        let output = String::from_utf8(output).unwrap();
        assert_snapshot!(output, @r"
        No services defined.

        Hint: Run 'sb services add --name <NAME> --price <CENTS> --duration <MINUTES>'.
        Saved service Massage (1h 30m, 90.00)
        Saved service Facial (1h, 60.00)
        Removed service Massage
        Saved service Manicure (45m, 35.50)
        Service                   Duration      Price
        ────────────────────────  ────────  ─────────
        Facial                          1h      60.00
        Manicure                       45m      35.50
        ");
    }

    #[test]
    fn removing_unknown_service_fails() {
        let db = Database::open_in_memory().unwrap();
        let mut output = Vec::new();
        let err = remove(&mut output, &db, "Nails").unwrap_err();
        assert_eq!(err.to_string(), "no service named \"Nails\"");
    }

    #[test]
    fn json_lists_catalog() {
        let db = Database::open_in_memory().unwrap();
        db.upsert_service(&service("Facial", 6000, 60)).unwrap();
        let mut output = Vec::new();
        list(&mut output, &db, true).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(value[0]["name"], "Facial");
        assert_eq!(value[0]["duration_minutes"], 60);
    }
}
