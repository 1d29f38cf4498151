//! Stateless HTTP request builder and response parser for the booking API.
//!
//! # Design
//! `LumiClient` holds only a `base_url` and carries no mutable state between
//! calls. Each endpoint is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the HTTP round-trip in between, either through a
//! `Transport` or from a native host.
//!
//! Every endpoint except the city list requires a `CallerId`, sent as a
//! bearer header.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::session::CallerId;
use crate::types::{
    Ack, Booking, BookingRequest, City, CityId, MasterDetail, MasterId, MasterSummary, ServiceId,
    TimeSlot,
};

/// Inclusive range of days for the time-slot query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ApiError> {
        if from > to {
            return Err(ApiError::InvalidRequest(format!(
                "date range starts after it ends ({from} > {to})"
            )));
        }
        Ok(Self { from, to })
    }

    /// A range covering a single day.
    pub fn day(date: NaiveDate) -> Self {
        Self { from: date, to: date }
    }

    pub fn first_day(&self) -> NaiveDate {
        self.from
    }

    pub fn last_day(&self) -> NaiveDate {
        self.to
    }

    fn query(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("date_from", &self.from.format("%Y-%m-%d").to_string())
            .append_pair("date_to", &self.to.format("%Y-%m-%d").to_string())
            .finish()
    }
}

/// Synchronous, stateless client for the booking API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct LumiClient {
    base_url: String,
}

impl LumiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_list_masters(&self, caller: CallerId) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/masters", Some(caller))
    }

    pub fn build_get_master(&self, caller: CallerId, master_id: MasterId) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/api/masters/{master_id}"), Some(caller))
    }

    pub fn build_list_time_slots(
        &self,
        caller: CallerId,
        master_id: MasterId,
        service_id: ServiceId,
        range: &DateRange,
    ) -> HttpRequest {
        let path = format!(
            "/api/masters/{master_id}/services/{service_id}/time-slots?{}",
            range.query()
        );
        self.request(HttpMethod::Get, &path, Some(caller))
    }

    pub fn build_create_booking(
        &self,
        caller: CallerId,
        input: &BookingRequest,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut request = self.request(HttpMethod::Post, "/api/bookings", Some(caller));
        request
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
        request.body = Some(body);
        Ok(request)
    }

    pub fn build_list_bookings(&self, caller: CallerId) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/bookings", Some(caller))
    }

    pub fn build_add_master(&self, caller: CallerId, master_id: MasterId) -> HttpRequest {
        self.request(HttpMethod::Post, &format!("/api/masters/{master_id}/add"), Some(caller))
    }

    pub fn build_remove_master(&self, caller: CallerId, master_id: MasterId) -> HttpRequest {
        self.request(
            HttpMethod::Delete,
            &format!("/api/masters/{master_id}/remove"),
            Some(caller),
        )
    }

    /// The city list is public; no credential is attached.
    pub fn build_list_cities(&self) -> HttpRequest {
        self.request(HttpMethod::Get, "/api/cities", None)
    }

    pub fn build_list_city_masters(&self, caller: CallerId, city_id: CityId) -> HttpRequest {
        self.request(HttpMethod::Get, &format!("/api/cities/{city_id}/masters"), Some(caller))
    }

    pub fn parse_list_masters(&self, response: HttpResponse) -> Result<Vec<MasterSummary>, ApiError> {
        parse_json(response)
    }

    pub fn parse_get_master(&self, response: HttpResponse) -> Result<MasterDetail, ApiError> {
        parse_json(response)
    }

    pub fn parse_list_time_slots(&self, response: HttpResponse) -> Result<Vec<TimeSlot>, ApiError> {
        parse_json(response)
    }

    pub fn parse_create_booking(&self, response: HttpResponse) -> Result<Booking, ApiError> {
        parse_json(response)
    }

    pub fn parse_list_bookings(&self, response: HttpResponse) -> Result<Vec<Booking>, ApiError> {
        parse_json(response)
    }

    pub fn parse_add_master(&self, response: HttpResponse) -> Result<Ack, ApiError> {
        parse_json(response)
    }

    pub fn parse_remove_master(&self, response: HttpResponse) -> Result<Ack, ApiError> {
        parse_json(response)
    }

    pub fn parse_list_cities(&self, response: HttpResponse) -> Result<Vec<City>, ApiError> {
        parse_json(response)
    }

    pub fn parse_list_city_masters(
        &self,
        response: HttpResponse,
    ) -> Result<Vec<MasterSummary>, ApiError> {
        parse_json(response)
    }

    fn request(&self, method: HttpMethod, path: &str, caller: Option<CallerId>) -> HttpRequest {
        HttpRequest {
            method,
            path: format!("{}{path}", self.base_url),
            headers: caller.map(CallerId::authorization).into_iter().collect(),
            body: None,
        }
    }
}

/// Error document the server sends with non-200 responses.
#[derive(Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
}

/// Map non-200 status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    match response.status {
        200 => Ok(()),
        404 => Err(ApiError::NotFound(error_message(&response.body, "resource not found"))),
        status @ (401 | 403) => Err(ApiError::Unauthorized {
            status,
            message: error_message(&response.body, "credential rejected"),
        }),
        status => Err(ApiError::HttpError {
            status,
            message: error_message(&response.body, "unexpected status"),
        }),
    }
}

/// The server's `detail` text if present, else the raw body, else `fallback`.
fn error_message(body: &str, fallback: &str) -> String {
    if let Ok(ErrorBody {
        detail: serde_json::Value::String(detail),
    }) = serde_json::from_str::<ErrorBody>(body)
    {
        if !detail.is_empty() {
            return detail;
        }
    }
    let body = body.trim();
    if body.is_empty() {
        fallback.to_string()
    } else {
        body.to_string()
    }
}
