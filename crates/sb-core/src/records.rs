//! Records owned by the external store.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::time::{ClockTime, PREP_BUFFER_MINUTES};
use crate::types::{BlockId, ReservationId, ReservationStatus};

/// A booked appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Reservation {
    pub id: ReservationId,
    pub date: NaiveDate,
    pub time: ClockTime,
    pub status: ReservationStatus,
    pub service_name: String,
    /// Always stored at creation so overlap checks never guess a length.
    pub service_duration_minutes: i64,
    pub client_name: String,
    pub client_email: String,
    /// Price in minor currency units.
    pub total_price: i64,
}

impl Reservation {
    /// Start of the occupied interval, in minutes since midnight.
    pub fn starts_at(&self) -> i64 {
        self.time.minutes()
    }

    /// Exclusive end of the occupied interval, preparation buffer included.
    pub fn occupied_until(&self) -> i64 {
        self.starts_at()
            .saturating_add(self.service_duration_minutes)
            .saturating_add(PREP_BUFFER_MINUTES)
    }

    /// Whether the minute offset falls inside `[start, occupied_until)`.
    pub fn covers(&self, minutes: i64) -> bool {
        self.starts_at() <= minutes && minutes < self.occupied_until()
    }
}

/// Fields for a reservation that the store has not assigned an ID to yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewReservation {
    pub date: NaiveDate,
    pub time: ClockTime,
    pub status: ReservationStatus,
    pub service_name: String,
    pub service_duration_minutes: i64,
    pub client_name: String,
    pub client_email: String,
    pub total_price: i64,
}

impl NewReservation {
    /// Attaches a store-assigned ID.
    pub fn with_id(self, id: ReservationId) -> Reservation {
        Reservation {
            id,
            date: self.date,
            time: self.time,
            status: self.status,
            service_name: self.service_name,
            service_duration_minutes: self.service_duration_minutes,
            client_name: self.client_name,
            client_email: self.client_email,
            total_price: self.total_price,
        }
    }
}

/// An administrative block on a whole day (`time == None`) or one slot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockedSlot {
    pub id: BlockId,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<ClockTime>,
    pub reason: String,
}

impl BlockedSlot {
    pub const fn all_day(&self) -> bool {
        self.time.is_none()
    }

    /// Whether this record blocks exactly the given target.
    pub fn targets(&self, date: NaiveDate, time: Option<ClockTime>) -> bool {
        self.date == date && self.time == time
    }
}

/// A bookable service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Service {
    pub name: String,
    /// Price in minor currency units.
    pub price: i64,
    pub duration_minutes: i64,
}

/// Service catalog keyed by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceCatalog {
    services: BTreeMap<String, Service>,
}

impl ServiceCatalog {
    pub fn new(services: impl IntoIterator<Item = Service>) -> Self {
        Self {
            services: services
                .into_iter()
                .map(|service| (service.name.clone(), service))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    /// Services ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// The person a reservation is for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    pub name: String,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(time: &str, minutes: i64) -> Reservation {
        NewReservation {
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            time: ClockTime::parse(time).unwrap(),
            status: ReservationStatus::Confirmed,
            service_name: "Facial".to_string(),
            service_duration_minutes: minutes,
            client_name: "Ada".to_string(),
            client_email: "ada@example.com".to_string(),
            total_price: 6000,
        }
        .with_id(ReservationId::new("r-1").unwrap())
    }

    #[test]
    fn occupied_interval_includes_buffer() {
        let res = reservation("09:00", 60);
        assert_eq!(res.starts_at(), 540);
        assert_eq!(res.occupied_until(), 615);
        assert!(res.covers(540));
        assert!(res.covers(614));
        assert!(!res.covers(615));
        assert!(!res.covers(539));
    }

    #[test]
    fn oversized_stored_duration_saturates() {
        let res = reservation("09:00", i64::MAX);
        assert_eq!(res.occupied_until(), i64::MAX);
        assert!(res.covers(1379));
    }

    #[test]
    fn all_day_is_derived_from_missing_time() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        let block = BlockedSlot {
            id: BlockId::new("b-1").unwrap(),
            date,
            time: None,
            reason: "closed".to_string(),
        };
        assert!(block.all_day());
        assert!(block.targets(date, None));
        assert!(!block.targets(date, Some(ClockTime::OPENING)));

        let json = serde_json::to_string(&block).unwrap();
        assert!(!json.contains("time"));
    }

    #[test]
    fn catalog_is_ordered_by_name() {
        let catalog = ServiceCatalog::new([
            Service {
                name: "Massage".to_string(),
                price: 8000,
                duration_minutes: 90,
            },
            Service {
                name: "Facial".to_string(),
                price: 6000,
                duration_minutes: 60,
            },
        ]);
        let names: Vec<_> = catalog.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Facial", "Massage"]);
        assert_eq!(catalog.get("Massage").unwrap().duration_minutes, 90);
        assert!(catalog.get("Nails").is_none());
    }
}
