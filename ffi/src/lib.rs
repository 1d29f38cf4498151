//! C-ABI wrapper around `lumi-core`.
//!
//! # Overview
//! Exposes every booking API operation through `extern "C"` functions so a
//! native host can build requests, perform the HTTP round-trip itself, and
//! hand the response back for parsing.
//!
//! # Design
//! - Every `extern "C"` function wraps its body in `catch_unwind` so panics
//!   never cross the FFI boundary.
//! - `lumi_build_*` / `lumi_parse_*` mirror the core client 1:1. Builders
//!   return null on null or malformed arguments; parsers always return an
//!   `FfiLumiResult` envelope.
//! - Authenticated builders take the caller id as a plain `int64_t`.
//! - The host owns every returned pointer and must release it with the
//!   matching `lumi_free_*` function.

pub mod types;

use std::ffi::CStr;
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{NaiveDate, NaiveDateTime};
use lumi_core::{ApiError, BookingRequest, CallerId, DateRange, HttpRequest, HttpResponse, LumiClient};

use types::*;

/// Borrow a C string as UTF-8. `None` for null or invalid UTF-8.
///
/// # Safety
/// `s` must be null or point to a NUL-terminated string that outlives `'a`.
unsafe fn read_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        return None;
    }
    unsafe { CStr::from_ptr(s) }.to_str().ok()
}

fn read_date(s: *const c_char) -> Option<NaiveDate> {
    let s = unsafe { read_str(s) }?;
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Accepts `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DDTHH:MM`.
fn read_datetime(s: *const c_char) -> Option<NaiveDateTime> {
    let s = unsafe { read_str(s) }?;
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M"))
        .ok()
}

// ---------------------------------------------------------------------------
// Client lifecycle
// ---------------------------------------------------------------------------

/// Create a client bound to `base_url`.
///
/// Returns null if `base_url` is null or not UTF-8. Free the handle with
/// `lumi_client_free`.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_client_new(base_url: *const c_char) -> *mut FfiLumiClient {
    catch_unwind(|| match unsafe { read_str(base_url) } {
        Some(url) => Box::into_raw(Box::new(FfiLumiClient {
            inner: LumiClient::new(url),
        })),
        None => std::ptr::null_mut(),
    })
    .unwrap_or(std::ptr::null_mut())
}

/// Free a client created by `lumi_client_new`. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_client_free(client: *mut FfiLumiClient) {
    if !client.is_null() {
        let _ = catch_unwind(|| {
            drop(unsafe { Box::from_raw(client) });
        });
    }
}

// ---------------------------------------------------------------------------
// Build request functions
// ---------------------------------------------------------------------------

/// Run `build` against the client behind `client`, converting the result
/// for C. Null client, `None` from `build` or a panic all yield null.
fn build_request<F>(client: *const FfiLumiClient, build: F) -> *mut FfiHttpRequest
where
    F: FnOnce(&LumiClient) -> Option<HttpRequest>,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return std::ptr::null_mut();
        }
        let client = unsafe { &*client };
        match build(&client.inner) {
            Some(req) => FfiHttpRequest::from_core(req),
            None => std::ptr::null_mut(),
        }
    }))
    .unwrap_or(std::ptr::null_mut())
}

/// `GET /api/masters` for `caller`.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_build_list_masters(
    client: *const FfiLumiClient,
    caller: i64,
) -> *mut FfiHttpRequest {
    build_request(client, |c| Some(c.build_list_masters(CallerId::new(caller))))
}

#[unsafe(no_mangle)]
pub extern "C" fn lumi_build_get_master(
    client: *const FfiLumiClient,
    caller: i64,
    master_id: i64,
) -> *mut FfiHttpRequest {
    build_request(client, |c| Some(c.build_get_master(CallerId::new(caller), master_id)))
}

/// Time slots between two `YYYY-MM-DD` dates, inclusive.
///
/// Returns null if either date is null or malformed, or if `date_from` is
/// after `date_to`.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_build_list_time_slots(
    client: *const FfiLumiClient,
    caller: i64,
    master_id: i64,
    service_id: i64,
    date_from: *const c_char,
    date_to: *const c_char,
) -> *mut FfiHttpRequest {
    build_request(client, |c| {
        let range = DateRange::new(read_date(date_from)?, read_date(date_to)?).ok()?;
        Some(c.build_list_time_slots(CallerId::new(caller), master_id, service_id, &range))
    })
}

/// `POST /api/bookings`.
///
/// `start_datetime` is a local `YYYY-MM-DDTHH:MM[:SS]` string. `comment`
/// may be null. Returns null if `start_datetime` is null or malformed.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_build_create_booking(
    client: *const FfiLumiClient,
    caller: i64,
    master_id: i64,
    service_id: i64,
    start_datetime: *const c_char,
    comment: *const c_char,
) -> *mut FfiHttpRequest {
    build_request(client, |c| {
        let mut input = BookingRequest::new(master_id, service_id, read_datetime(start_datetime)?);
        if let Some(comment) = unsafe { read_str(comment) } {
            input = input.with_comment(comment);
        }
        c.build_create_booking(CallerId::new(caller), &input).ok()
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lumi_build_list_bookings(
    client: *const FfiLumiClient,
    caller: i64,
) -> *mut FfiHttpRequest {
    build_request(client, |c| Some(c.build_list_bookings(CallerId::new(caller))))
}

#[unsafe(no_mangle)]
pub extern "C" fn lumi_build_add_master(
    client: *const FfiLumiClient,
    caller: i64,
    master_id: i64,
) -> *mut FfiHttpRequest {
    build_request(client, |c| Some(c.build_add_master(CallerId::new(caller), master_id)))
}

#[unsafe(no_mangle)]
pub extern "C" fn lumi_build_remove_master(
    client: *const FfiLumiClient,
    caller: i64,
    master_id: i64,
) -> *mut FfiHttpRequest {
    build_request(client, |c| Some(c.build_remove_master(CallerId::new(caller), master_id)))
}

/// `GET /api/cities`. Public, so no caller id.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_build_list_cities(client: *const FfiLumiClient) -> *mut FfiHttpRequest {
    build_request(client, |c| Some(c.build_list_cities()))
}

#[unsafe(no_mangle)]
pub extern "C" fn lumi_build_list_city_masters(
    client: *const FfiLumiClient,
    caller: i64,
    city_id: i64,
) -> *mut FfiHttpRequest {
    build_request(client, |c| Some(c.build_list_city_masters(CallerId::new(caller), city_id)))
}

// ---------------------------------------------------------------------------
// Parse response functions
// ---------------------------------------------------------------------------

/// A null body reads as empty.
fn ffi_response_to_core(resp: &FfiHttpResponse) -> HttpResponse {
    let body = unsafe { read_str(resp.body) }.unwrap_or_default();
    HttpResponse::new(resp.status, body)
}

/// Shared body of every `lumi_parse_*` function. `function` names the
/// caller in the panic message.
fn parse_response<F>(
    function: &str,
    client: *const FfiLumiClient,
    response: *const FfiHttpResponse,
    parse: F,
) -> *mut FfiLumiResult
where
    F: FnOnce(&LumiClient, HttpResponse) -> Result<*mut FfiLumiResult, ApiError>,
{
    catch_unwind(AssertUnwindSafe(|| {
        if client.is_null() {
            return FfiLumiResult::null_arg("client");
        }
        if response.is_null() {
            return FfiLumiResult::null_arg("response");
        }
        let client = unsafe { &*client };
        let resp = ffi_response_to_core(unsafe { &*response });
        parse(&client.inner, resp).unwrap_or_else(FfiLumiResult::from_error)
    }))
    .unwrap_or_else(|_| FfiLumiResult::panic(function))
}

/// `data_tag = MasterList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_parse_list_masters(
    client: *const FfiLumiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLumiResult {
    parse_response("lumi_parse_list_masters", client, response, |c, r| {
        c.parse_list_masters(r).map(FfiLumiResult::master_list)
    })
}

/// `data_tag = MasterDetail` on success; `NotFound` for an unknown master.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_parse_get_master(
    client: *const FfiLumiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLumiResult {
    parse_response("lumi_parse_get_master", client, response, |c, r| {
        c.parse_get_master(r).map(FfiLumiResult::master_detail)
    })
}

/// `data_tag = TimeSlotList` on success.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_parse_list_time_slots(
    client: *const FfiLumiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLumiResult {
    parse_response("lumi_parse_list_time_slots", client, response, |c, r| {
        c.parse_list_time_slots(r).map(FfiLumiResult::time_slot_list)
    })
}

/// `data_tag = Booking` on success; a taken slot is `Http` with status 400.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_parse_create_booking(
    client: *const FfiLumiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLumiResult {
    parse_response("lumi_parse_create_booking", client, response, |c, r| {
        c.parse_create_booking(r).map(FfiLumiResult::booking)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lumi_parse_list_bookings(
    client: *const FfiLumiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLumiResult {
    parse_response("lumi_parse_list_bookings", client, response, |c, r| {
        c.parse_list_bookings(r).map(FfiLumiResult::booking_list)
    })
}

/// `data_tag = Ack` on success.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_parse_add_master(
    client: *const FfiLumiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLumiResult {
    parse_response("lumi_parse_add_master", client, response, |c, r| {
        c.parse_add_master(r).map(FfiLumiResult::ack)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lumi_parse_remove_master(
    client: *const FfiLumiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLumiResult {
    parse_response("lumi_parse_remove_master", client, response, |c, r| {
        c.parse_remove_master(r).map(FfiLumiResult::ack)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lumi_parse_list_cities(
    client: *const FfiLumiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLumiResult {
    parse_response("lumi_parse_list_cities", client, response, |c, r| {
        c.parse_list_cities(r).map(FfiLumiResult::city_list)
    })
}

#[unsafe(no_mangle)]
pub extern "C" fn lumi_parse_list_city_masters(
    client: *const FfiLumiClient,
    response: *const FfiHttpResponse,
) -> *mut FfiLumiResult {
    parse_response("lumi_parse_list_city_masters", client, response, |c, r| {
        c.parse_list_city_masters(r).map(FfiLumiResult::master_list)
    })
}

// ---------------------------------------------------------------------------
// Free functions
// ---------------------------------------------------------------------------

/// Free a request returned by any `lumi_build_*` function. Safe to call
/// with null.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_free_request(req: *mut FfiHttpRequest) {
    if req.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let req = unsafe { Box::from_raw(req) };
        unsafe { req.release() };
    });
}

/// Free a result returned by any `lumi_parse_*` function, payload
/// included. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_free_result(result: *mut FfiLumiResult) {
    if result.is_null() {
        return;
    }
    let _ = catch_unwind(|| {
        let result = unsafe { Box::from_raw(result) };
        unsafe { result.release() };
    });
}

/// Free a C string allocated by this library. Safe to call with null.
#[unsafe(no_mangle)]
pub extern "C" fn lumi_free_string(s: *mut c_char) {
    if !s.is_null() {
        let _ = catch_unwind(|| unsafe { free_c_string(s) });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
