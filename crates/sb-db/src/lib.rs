//! Storage layer for the slot scheduler.
//!
//! Provides persistence for reservations, blocked slots and the service
//! catalog using `rusqlite`, and implements [`ScheduleStore`] on top of it.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization.
//!
//! # Schema
//!
//! ## Date and Time Format
//!
//! Dates are stored as TEXT in `YYYY-MM-DD` form and slot times as `HH:MM`.
//! Lexicographic ordering matches chronological ordering for both, so range
//! queries are plain string comparisons. A NULL `time` on a blocked slot
//! marks an all-day block.
//!
//! ## Uniqueness
//!
//! Blocked slots have no unique index on `(date, time)`; the engine checks
//! before inserting.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;
use uuid::Uuid;

use sb_core::time::{MAX_DURATION_MINUTES, format_date, parse_date};
use sb_core::{
    BlockId, BlockedSlot, ClockTime, DateRange, NewReservation, Reservation, ReservationId,
    ReservationStatus, ScheduleStore, Service, ServiceCatalog, StoreError,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored row could not be converted into a domain record.
    #[error("invalid {table} row {id}: {message}")]
    InvalidRow {
        table: &'static str,
        id: String,
        message: String,
    },
    /// A service definition failed validation.
    #[error("invalid service {name:?}: {message}")]
    InvalidService { name: String, message: String },
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        Self::with_source("sqlite store", err)
    }
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableCounts {
    pub reservations: i64,
    pub blocked_slots: i64,
    pub services: i64,
}

struct ReservationRow {
    id: String,
    date: String,
    time: String,
    status: String,
    service_name: String,
    service_duration_minutes: i64,
    client_name: String,
    client_email: String,
    total_price: i64,
}

impl ReservationRow {
    fn into_reservation(self) -> Result<Reservation, DbError> {
        let invalid = |message: String| DbError::InvalidRow {
            table: "reservations",
            id: self.id.clone(),
            message,
        };
        let date = parse_date(&self.date).map_err(|e| invalid(e.to_string()))?;
        let time = ClockTime::parse(&self.time).map_err(|e| invalid(e.to_string()))?;
        let status = self
            .status
            .parse::<ReservationStatus>()
            .map_err(|e| invalid(e.to_string()))?;
        let id = ReservationId::new(self.id.clone()).map_err(|e| invalid(e.to_string()))?;
        Ok(Reservation {
            id,
            date,
            time,
            status,
            service_name: self.service_name,
            service_duration_minutes: self.service_duration_minutes,
            client_name: self.client_name,
            client_email: self.client_email,
            total_price: self.total_price,
        })
    }
}

struct BlockRow {
    id: String,
    date: String,
    time: Option<String>,
    reason: String,
}

impl BlockRow {
    fn into_block(self) -> Result<BlockedSlot, DbError> {
        let invalid = |message: String| DbError::InvalidRow {
            table: "blocked_slots",
            id: self.id.clone(),
            message,
        };
        let date = parse_date(&self.date).map_err(|e| invalid(e.to_string()))?;
        let time = self
            .time
            .as_deref()
            .map(ClockTime::parse)
            .transpose()
            .map_err(|e| invalid(e.to_string()))?;
        let id = BlockId::new(self.id.clone()).map_err(|e| invalid(e.to_string()))?;
        Ok(BlockedSlot {
            id,
            date,
            time,
            reason: self.reason,
        })
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Reservations: one row per booking, any status
            -- date: 'YYYY-MM-DD', time: 'HH:MM'
            CREATE TABLE IF NOT EXISTS reservations (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                time TEXT NOT NULL,
                status TEXT NOT NULL,
                service_name TEXT NOT NULL,
                service_duration_minutes INTEGER NOT NULL,
                client_name TEXT NOT NULL,
                client_email TEXT NOT NULL,
                total_price INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reservations_date ON reservations(date);
            CREATE INDEX IF NOT EXISTS idx_reservations_status ON reservations(status);

            -- Blocked slots: time NULL means the whole day is blocked
            CREATE TABLE IF NOT EXISTS blocked_slots (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                time TEXT,
                reason TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_blocked_slots_date ON blocked_slots(date);

            CREATE TABLE IF NOT EXISTS services (
                name TEXT PRIMARY KEY,
                price INTEGER NOT NULL,
                duration_minutes INTEGER NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Inserts a reservation with a fresh ID, whatever its status.
    pub fn insert_reservation(&self, fields: NewReservation) -> Result<Reservation, DbError> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "
            INSERT INTO reservations
            (id, date, time, status, service_name, service_duration_minutes,
             client_name, client_email, total_price, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                id,
                format_date(fields.date),
                fields.time.to_string(),
                fields.status.as_str(),
                fields.service_name,
                fields.service_duration_minutes,
                fields.client_name,
                fields.client_email,
                fields.total_price,
                now_timestamp(),
            ],
        )?;
        let id = ReservationId::new(id).map_err(|e| DbError::InvalidRow {
            table: "reservations",
            id: String::new(),
            message: e.to_string(),
        })?;
        Ok(fields.with_id(id))
    }

    /// Lists reservations within a date range, ordered by date, time then ID.
    ///
    /// The range is inclusive of `start` and exclusive of `end`.
    pub fn list_reservations_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<Reservation>, DbError> {
        if range.end <= range.start {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "
            SELECT id, date, time, status, service_name, service_duration_minutes,
                   client_name, client_email, total_price
            FROM reservations
            WHERE date >= ? AND date < ?
            ORDER BY date ASC, time ASC, id ASC
            ",
        )?;
        let rows = stmt.query_map(
            [format_date(range.start), format_date(range.end)],
            |row| {
                Ok(ReservationRow {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    time: row.get(2)?,
                    status: row.get(3)?,
                    service_name: row.get(4)?,
                    service_duration_minutes: row.get(5)?,
                    client_name: row.get(6)?,
                    client_email: row.get(7)?,
                    total_price: row.get(8)?,
                })
            },
        )?;
        let mut reservations = Vec::new();
        for row in rows {
            reservations.push(row?.into_reservation()?);
        }
        Ok(reservations)
    }

    /// Lists blocked slots within a date range; all-day blocks sort first.
    pub fn list_blocked_slots_in_range(
        &self,
        range: DateRange,
    ) -> Result<Vec<BlockedSlot>, DbError> {
        if range.end <= range.start {
            return Ok(Vec::new());
        }
        let mut stmt = self.conn.prepare(
            "
            SELECT id, date, time, reason
            FROM blocked_slots
            WHERE date >= ? AND date < ?
            ORDER BY date ASC, time IS NOT NULL, time ASC, created_at ASC
            ",
        )?;
        let rows = stmt.query_map(
            [format_date(range.start), format_date(range.end)],
            |row| {
                Ok(BlockRow {
                    id: row.get(0)?,
                    date: row.get(1)?,
                    time: row.get(2)?,
                    reason: row.get(3)?,
                })
            },
        )?;
        let mut blocks = Vec::new();
        for row in rows {
            blocks.push(row?.into_block()?);
        }
        Ok(blocks)
    }

    /// Inserts a blocked slot without checking for an existing one.
    pub fn insert_blocked_slot(
        &self,
        date: chrono::NaiveDate,
        time: Option<ClockTime>,
        reason: &str,
    ) -> Result<BlockedSlot, DbError> {
        let id = Uuid::new_v4().to_string();
        self.conn.execute(
            "INSERT INTO blocked_slots (id, date, time, reason, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                id,
                format_date(date),
                time.map(|t| t.to_string()),
                reason,
                now_timestamp(),
            ],
        )?;
        BlockRow {
            id,
            date: format_date(date),
            time: time.map(|t| t.to_string()),
            reason: reason.to_string(),
        }
        .into_block()
    }

    /// Deletes a blocked slot by ID. Returns whether a row was removed.
    pub fn delete_blocked_slot(&self, id: &BlockId) -> Result<bool, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM blocked_slots WHERE id = ?", [id.as_str()])?;
        Ok(removed > 0)
    }

    /// Inserts or replaces a catalog entry.
    pub fn upsert_service(&self, service: &Service) -> Result<(), DbError> {
        if service.name.trim().is_empty() {
            return Err(DbError::InvalidService {
                name: service.name.clone(),
                message: "name cannot be empty".to_string(),
            });
        }
        if !(1..=MAX_DURATION_MINUTES).contains(&service.duration_minutes) {
            return Err(DbError::InvalidService {
                name: service.name.clone(),
                message: format!(
                    "duration must be between 1 and {MAX_DURATION_MINUTES}, got {}",
                    service.duration_minutes
                ),
            });
        }
        self.conn.execute(
            "
            INSERT INTO services (name, price, duration_minutes) VALUES (?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                price = excluded.price,
                duration_minutes = excluded.duration_minutes
            ",
            params![service.name, service.price, service.duration_minutes],
        )?;
        Ok(())
    }

    /// Removes a catalog entry. Returns whether it existed.
    pub fn delete_service(&self, name: &str) -> Result<bool, DbError> {
        let removed = self
            .conn
            .execute("DELETE FROM services WHERE name = ?", [name])?;
        Ok(removed > 0)
    }

    /// Looks up one catalog entry.
    pub fn get_service(&self, name: &str) -> Result<Option<Service>, DbError> {
        let service = self
            .conn
            .query_row(
                "SELECT name, price, duration_minutes FROM services WHERE name = ?",
                [name],
                |row| {
                    Ok(Service {
                        name: row.get(0)?,
                        price: row.get(1)?,
                        duration_minutes: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(service)
    }

    /// Lists the catalog ordered by name.
    pub fn list_services(&self) -> Result<Vec<Service>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, price, duration_minutes FROM services ORDER BY name ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(Service {
                name: row.get(0)?,
                price: row.get(1)?,
                duration_minutes: row.get(2)?,
            })
        })?;
        let mut services = Vec::new();
        for row in rows {
            services.push(row?);
        }
        Ok(services)
    }

    /// Row counts for the status command.
    pub fn counts(&self) -> Result<TableCounts, DbError> {
        let count = |table: &str| -> Result<i64, DbError> {
            Ok(self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?)
        };
        Ok(TableCounts {
            reservations: count("reservations")?,
            blocked_slots: count("blocked_slots")?,
            services: count("services")?,
        })
    }
}

impl ScheduleStore for Database {
    fn list_reservations(&self, range: DateRange) -> Result<Vec<Reservation>, StoreError> {
        Ok(self.list_reservations_in_range(range)?)
    }

    fn list_blocked_slots(&self, range: DateRange) -> Result<Vec<BlockedSlot>, StoreError> {
        Ok(self.list_blocked_slots_in_range(range)?)
    }

    fn create_blocked_slot(
        &mut self,
        date: chrono::NaiveDate,
        time: Option<ClockTime>,
        reason: &str,
    ) -> Result<BlockedSlot, StoreError> {
        Ok(self.insert_blocked_slot(date, time, reason)?)
    }

    fn delete_blocked_slot(&mut self, id: &BlockId) -> Result<(), StoreError> {
        Self::delete_blocked_slot(self, id)?;
        Ok(())
    }

    fn create_reservation(&mut self, fields: NewReservation) -> Result<Reservation, StoreError> {
        Ok(self.insert_reservation(fields)?)
    }

    fn service_catalog(&self) -> Result<ServiceCatalog, StoreError> {
        Ok(ServiceCatalog::new(self.list_services()?))
    }
}

fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashSet;

    use sb_core::{Client, ReservationRequest, request_reservation};

    fn date(s: &str) -> chrono::NaiveDate {
        parse_date(s).unwrap()
    }

    fn at(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn new_reservation(day: &str, time: &str, status: ReservationStatus) -> NewReservation {
        NewReservation {
            date: date(day),
            time: at(time),
            status,
            service_name: "Facial".to_string(),
            service_duration_minutes: 60,
            client_name: "Ada".to_string(),
            client_email: "ada@example.com".to_string(),
            total_price: 6000,
        }
    }

    fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA table_info({table})"))
            .expect("prepare table_info");
        stmt.query_map([], |row| row.get::<_, String>(1))
            .expect("query table_info")
            .map(|r| r.expect("column name"))
            .collect()
    }

    fn index_names(conn: &Connection, table: &str) -> HashSet<String> {
        let mut stmt = conn
            .prepare(&format!("PRAGMA index_list({table})"))
            .expect("prepare index_list");
        stmt.query_map([], |row| row.get::<_, String>(1))
            .expect("query index_list")
            .map(|r| r.expect("index name"))
            .collect()
    }

    #[test]
    fn open_in_memory_database() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn schema_matches_data_model() {
        let db = Database::open_in_memory().expect("open in-memory db");
        assert_eq!(
            table_columns(&db.conn, "reservations"),
            [
                "id",
                "date",
                "time",
                "status",
                "service_name",
                "service_duration_minutes",
                "client_name",
                "client_email",
                "total_price",
                "created_at",
            ]
        );
        assert_eq!(
            table_columns(&db.conn, "blocked_slots"),
            ["id", "date", "time", "reason", "created_at"]
        );
        assert_eq!(
            table_columns(&db.conn, "services"),
            ["name", "price", "duration_minutes"]
        );
        let indexes = index_names(&db.conn, "blocked_slots");
        assert!(indexes.contains("idx_blocked_slots_date"));
    }

    #[test]
    fn init_is_idempotent_on_reopen() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("slotbook.db");
        {
            let db = Database::open(&path).expect("open db");
            db.insert_blocked_slot(date("2025-03-10"), None, "closed")
                .expect("insert block");
        }
        let db = Database::open(&path).expect("reopen db");
        assert_eq!(db.counts().expect("counts").blocked_slots, 1);
    }

    #[test]
    fn reservations_are_listed_by_range_and_order() {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.insert_reservation(new_reservation("2025-03-10", "14:00", ReservationStatus::Confirmed))
            .expect("insert");
        db.insert_reservation(new_reservation("2025-03-10", "09:00", ReservationStatus::Pending))
            .expect("insert");
        db.insert_reservation(new_reservation("2025-03-11", "09:00", ReservationStatus::Confirmed))
            .expect("insert");

        let day = db
            .list_reservations_in_range(DateRange::day(date("2025-03-10")))
            .expect("list");
        let times: Vec<_> = day.iter().map(|r| r.time.to_string()).collect();
        assert_eq!(times, ["09:00", "14:00"]);
        assert_eq!(day[0].status, ReservationStatus::Pending);
        assert_eq!(day[1].service_duration_minutes, 60);

        let week = db
            .list_reservations_in_range(DateRange::week(date("2025-03-10")))
            .expect("list");
        assert_eq!(week.len(), 3);
    }

    #[test]
    fn empty_range_returns_nothing() {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.insert_blocked_slot(date("2025-03-10"), None, "closed")
            .expect("insert");
        let range = DateRange::new(date("2025-03-11"), date("2025-03-10"));
        assert!(db.list_blocked_slots_in_range(range).expect("list").is_empty());
    }

    #[test]
    fn blocked_slots_roundtrip_all_day_and_slot() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        let slot = db
            .create_blocked_slot(date("2025-03-10"), Some(at("10:30")), "blocked")
            .expect("create slot block");
        let day = db
            .create_blocked_slot(date("2025-03-10"), None, "closed")
            .expect("create day block");

        let blocks = db
            .list_blocked_slots(DateRange::day(date("2025-03-10")))
            .expect("list");
        assert_eq!(blocks, vec![day.clone(), slot.clone()]);
        assert!(blocks[0].all_day());

        ScheduleStore::delete_blocked_slot(&mut db, &day.id).expect("delete");
        let blocks = db
            .list_blocked_slots(DateRange::day(date("2025-03-10")))
            .expect("list");
        assert_eq!(blocks, vec![slot]);
    }

    #[test]
    fn delete_reports_missing_rows() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let id = BlockId::new("missing").unwrap();
        assert!(!db.delete_blocked_slot(&id).expect("delete"));
    }

    #[test]
    fn service_catalog_upserts_and_deletes() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let mut facial = Service {
            name: "Facial".to_string(),
            price: 6000,
            duration_minutes: 60,
        };
        db.upsert_service(&facial).expect("insert");
        facial.price = 6500;
        db.upsert_service(&facial).expect("update");

        let catalog = db.service_catalog().expect("catalog");
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Facial").unwrap().price, 6500);
        assert_eq!(db.get_service("Facial").expect("get"), Some(facial));

        assert!(db.delete_service("Facial").expect("delete"));
        assert!(!db.delete_service("Facial").expect("delete again"));
        assert!(db.get_service("Facial").expect("get").is_none());
    }

    #[test]
    fn invalid_services_are_rejected() {
        let db = Database::open_in_memory().expect("open in-memory db");
        let err = db
            .upsert_service(&Service {
                name: "Nails".to_string(),
                price: 3000,
                duration_minutes: 0,
            })
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidService { .. }));

        let err = db
            .upsert_service(&Service {
                name: "Retreat".to_string(),
                price: 3000,
                duration_minutes: 1441,
            })
            .unwrap_err();
        assert!(err.to_string().contains("between 1 and 1440"), "{err}");
    }

    #[test]
    fn corrupt_rows_surface_as_invalid_row() {
        let db = Database::open_in_memory().expect("open in-memory db");
        db.conn
            .execute(
                "INSERT INTO blocked_slots (id, date, time, reason, created_at)
                 VALUES ('b1', '2025-03-10', '9am', 'x', '')",
                [],
            )
            .expect("raw insert");
        let err = db
            .list_blocked_slots_in_range(DateRange::day(date("2025-03-10")))
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidRow { table: "blocked_slots", .. }));

        let store_err: StoreError = err.into();
        assert!(store_err.to_string().contains("store unavailable"));
    }

    #[test]
    fn engine_books_through_sqlite_store() {
        let mut db = Database::open_in_memory().expect("open in-memory db");
        db.upsert_service(&Service {
            name: "Facial".to_string(),
            price: 6000,
            duration_minutes: 60,
        })
        .expect("insert service");

        let request = ReservationRequest {
            date: date("2025-03-10"),
            time: at("14:00"),
            service_name: "Facial".to_string(),
            client: Client {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
            requested_minutes: None,
        };
        let reservation = request_reservation(&mut db, &request, |_| true).expect("book");
        assert_eq!(reservation.status, ReservationStatus::Confirmed);

        let blocks = db
            .list_blocked_slots_in_range(DateRange::day(date("2025-03-10")))
            .expect("list");
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].time, Some(at("15:00")));

        let err = request_reservation(&mut db, &request, |_| true).unwrap_err();
        assert!(err.is_business_outcome());
    }
}
