//! Response models for the booking API.
//!
//! # Design
//! Every type mirrors one JSON shape the server produces (or, for
//! `BookingRequest`, consumes). Field names follow the server's snake_case
//! keys so no renaming is needed. Models are immutable snapshots: the
//! client never edits them, a refresh replaces the whole collection.
//!
//! Two shapes the server leaves loosely typed are tightened here:
//! `work_schedule` is a list of `WorkPeriod` rather than free-form maps, and
//! booking `status` is an open `BookingStatus` that keeps unknown values.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

pub type MasterId = i64;
pub type ServiceId = i64;
pub type CityId = i64;
pub type BookingId = i64;

/// A master as shown in list screens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MasterSummary {
    pub id: MasterId,
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub city_name: Option<String>,
    pub services_count: u32,
}

/// A service offered by a master.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: ServiceId,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_mins: u32,
    pub category_name: Option<String>,
    #[serde(default)]
    pub portfolio_photos: Vec<String>,
}

/// One recurring working interval. `weekday` counts from 0 = Monday.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkPeriod {
    #[serde(rename = "weekday")]
    pub weekday_index: u8,
    pub start_time: String,
    pub end_time: String,
}

impl WorkPeriod {
    pub fn weekday(&self) -> Option<Weekday> {
        match self.weekday_index {
            0 => Some(Weekday::Mon),
            1 => Some(Weekday::Tue),
            2 => Some(Weekday::Wed),
            3 => Some(Weekday::Thu),
            4 => Some(Weekday::Fri),
            5 => Some(Weekday::Sat),
            6 => Some(Weekday::Sun),
            _ => None,
        }
    }
}

/// Full master page: profile, services and weekly schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MasterDetail {
    pub id: MasterId,
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub city: Option<String>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub work_schedule: Vec<WorkPeriod>,
}

impl MasterDetail {
    pub fn service(&self, id: ServiceId) -> Option<&Service> {
        self.services.iter().find(|service| service.id == id)
    }

    /// Whether `booking` is the confirmation of `request` made against this
    /// master: the request targets this master and one of its services, and
    /// the confirmation names both.
    pub fn confirms(&self, request: &BookingRequest, booking: &Booking) -> bool {
        if request.master_id != self.id || booking.master_name != self.name {
            return false;
        }
        self.service(request.service_id)
            .is_some_and(|service| service.title == booking.service_title)
    }
}

/// One bookable interval. `time` is `HH:MM` as sent by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeSlot {
    pub date: NaiveDate,
    pub time: String,
    pub available: bool,
}

impl TimeSlot {
    /// Combined start of the slot, or `None` if `time` is malformed.
    pub fn starts_at(&self) -> Option<NaiveDateTime> {
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&self.time, "%H:%M:%S"))
            .ok()?;
        Some(self.date.and_time(time))
    }
}

/// Request payload for creating a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingRequest {
    pub master_id: MasterId,
    pub service_id: ServiceId,
    pub start_datetime: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl BookingRequest {
    pub fn new(master_id: MasterId, service_id: ServiceId, start_datetime: NaiveDateTime) -> Self {
        Self {
            master_id,
            service_id,
            start_datetime,
            comment: None,
        }
    }

    /// Build a request for an available slot. Returns `None` for a slot that
    /// is taken or whose time cannot be parsed.
    pub fn for_slot(master_id: MasterId, service_id: ServiceId, slot: &TimeSlot) -> Option<Self> {
        if !slot.available {
            return None;
        }
        slot.starts_at()
            .map(|start| Self::new(master_id, service_id, start))
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Booking status as reported by the server.
///
/// Only `"confirmed"` has been observed so far; anything else is kept
/// verbatim in `Other` and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BookingStatus {
    Confirmed,
    Other(String),
}

impl BookingStatus {
    pub fn as_str(&self) -> &str {
        match self {
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for BookingStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "confirmed" => BookingStatus::Confirmed,
            _ => BookingStatus::Other(raw),
        }
    }
}

impl From<BookingStatus> for String {
    fn from(status: BookingStatus) -> Self {
        match status {
            BookingStatus::Confirmed => "confirmed".to_string(),
            BookingStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A booking confirmation, as returned by create and list.
///
/// Date-times are kept as the server's ISO strings: the server echoes the
/// client's offset when one was sent, so no single chrono type fits all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    pub id: BookingId,
    pub master_name: String,
    pub service_title: String,
    pub start_datetime: String,
    pub end_datetime: String,
    pub price: f64,
    pub status: BookingStatus,
}

/// Which of a city's localized names to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Ru,
    Local,
    En,
}

/// Static reference data for city filters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct City {
    pub id: CityId,
    pub name_ru: String,
    pub name_local: String,
    pub name_en: String,
}

impl City {
    pub fn name(&self, locale: Locale) -> &str {
        match locale {
            Locale::Ru => &self.name_ru,
            Locale::Local => &self.name_local,
            Locale::En => &self.name_en,
        }
    }
}

/// Generic acknowledgement returned by add/remove master.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
    pub success: bool,
    pub message: String,
}
