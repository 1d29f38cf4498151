//! `#[repr(C)]` types for the FFI boundary.
//!
//! # Design
//! Each type mirrors a core model with C-compatible fields: owned strings
//! become `*mut c_char` (null for `None`), collections become a pointer plus
//! a `u32` length, and enums carry explicit discriminants. Collections are
//! allocated as boxed slices so length and capacity always agree when they
//! are released.
//!
//! Everything allocated here is released by the matching `release` method,
//! driven from `lumi_free_*` in `lib.rs`.

use std::ffi::{c_void, CString};
use std::os::raw::c_char;
use std::ptr;

use lumi_core::{
    Ack, ApiError, Booking, City, HttpMethod, HttpRequest, LumiClient, MasterDetail,
    MasterSummary, Service, TimeSlot, WorkPeriod,
};

/// Opaque handle to a `LumiClient`.
pub struct FfiLumiClient {
    pub(crate) inner: LumiClient,
}

// ---------------------------------------------------------------------------
// Allocation helpers
// ---------------------------------------------------------------------------

/// Move `s` to the C heap. Interior NUL bytes yield an empty string.
pub(crate) fn c_string(s: impl Into<Vec<u8>>) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

fn opt_c_string(s: Option<String>) -> *mut c_char {
    s.map_or(ptr::null_mut(), c_string)
}

/// # Safety
/// `s` must be null or come from `c_string`.
pub(crate) unsafe fn free_c_string(s: *mut c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s) });
    }
}

fn into_raw_slice<T>(items: Vec<T>) -> (*mut T, u32) {
    if items.is_empty() {
        return (ptr::null_mut(), 0);
    }
    let len = items.len() as u32;
    (Box::into_raw(items.into_boxed_slice()) as *mut T, len)
}

/// # Safety
/// `items`/`len` must come from `into_raw_slice`.
unsafe fn take_slice<T>(items: *mut T, len: u32) -> Vec<T> {
    if items.is_null() || len == 0 {
        return Vec::new();
    }
    unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(items, len as usize)) }.into_vec()
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[repr(C)]
pub enum FfiHttpMethod {
    Get = 0,
    Post = 1,
    Delete = 2,
}

impl From<HttpMethod> for FfiHttpMethod {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => FfiHttpMethod::Get,
            HttpMethod::Post => FfiHttpMethod::Post,
            HttpMethod::Delete => FfiHttpMethod::Delete,
        }
    }
}

#[repr(C)]
pub struct FfiHeader {
    pub key: *mut c_char,
    pub value: *mut c_char,
}

/// An HTTP request for the host to execute.
///
/// `path` is the absolute URL. `body` is null when there is none.
#[repr(C)]
pub struct FfiHttpRequest {
    pub method: FfiHttpMethod,
    pub path: *mut c_char,
    pub headers: *mut FfiHeader,
    pub headers_len: u32,
    pub body: *mut c_char,
}

impl FfiHttpRequest {
    pub(crate) fn from_core(req: HttpRequest) -> *mut Self {
        let headers: Vec<FfiHeader> = req
            .headers
            .into_iter()
            .map(|(key, value)| FfiHeader {
                key: c_string(key),
                value: c_string(value),
            })
            .collect();
        let (headers, headers_len) = into_raw_slice(headers);
        Box::into_raw(Box::new(FfiHttpRequest {
            method: req.method.into(),
            path: c_string(req.path),
            headers,
            headers_len,
            body: opt_c_string(req.body),
        }))
    }

    /// # Safety
    /// `self` must have been produced by `from_core`.
    pub(crate) unsafe fn release(self) {
        unsafe {
            free_c_string(self.path);
            free_c_string(self.body);
            for header in take_slice(self.headers, self.headers_len) {
                free_c_string(header.key);
                free_c_string(header.value);
            }
        }
    }
}

/// The host's answer to an `FfiHttpRequest`. Owned by the host; the
/// library only reads it.
#[repr(C)]
pub struct FfiHttpResponse {
    pub status: u16,
    pub body: *const c_char,
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[repr(C)]
pub struct FfiMaster {
    pub id: i64,
    pub name: *mut c_char,
    pub description: *mut c_char,
    pub avatar_url: *mut c_char,
    pub city_name: *mut c_char,
    pub services_count: u32,
}

impl From<MasterSummary> for FfiMaster {
    fn from(m: MasterSummary) -> Self {
        FfiMaster {
            id: m.id,
            name: c_string(m.name),
            description: opt_c_string(m.description),
            avatar_url: opt_c_string(m.avatar_url),
            city_name: opt_c_string(m.city_name),
            services_count: m.services_count,
        }
    }
}

impl FfiMaster {
    unsafe fn release(self) {
        unsafe {
            free_c_string(self.name);
            free_c_string(self.description);
            free_c_string(self.avatar_url);
            free_c_string(self.city_name);
        }
    }
}

#[repr(C)]
pub struct FfiMasterList {
    pub items: *mut FfiMaster,
    pub len: u32,
}

impl From<Vec<MasterSummary>> for FfiMasterList {
    fn from(masters: Vec<MasterSummary>) -> Self {
        let (items, len) = into_raw_slice(masters.into_iter().map(FfiMaster::from).collect());
        FfiMasterList { items, len }
    }
}

#[repr(C)]
pub struct FfiService {
    pub id: i64,
    pub title: *mut c_char,
    pub description: *mut c_char,
    pub price: f64,
    pub duration_mins: u32,
    pub category_name: *mut c_char,
    pub portfolio_photos: *mut *mut c_char,
    pub portfolio_photos_len: u32,
}

impl From<Service> for FfiService {
    fn from(s: Service) -> Self {
        let (portfolio_photos, portfolio_photos_len) =
            into_raw_slice(s.portfolio_photos.into_iter().map(c_string).collect());
        FfiService {
            id: s.id,
            title: c_string(s.title),
            description: opt_c_string(s.description),
            price: s.price,
            duration_mins: s.duration_mins,
            category_name: opt_c_string(s.category_name),
            portfolio_photos,
            portfolio_photos_len,
        }
    }
}

impl FfiService {
    unsafe fn release(self) {
        unsafe {
            free_c_string(self.title);
            free_c_string(self.description);
            free_c_string(self.category_name);
            for photo in take_slice(self.portfolio_photos, self.portfolio_photos_len) {
                free_c_string(photo);
            }
        }
    }
}

/// `weekday` counts from 0 = Monday; times are `HH:MM:SS`.
#[repr(C)]
pub struct FfiWorkPeriod {
    pub weekday: u8,
    pub start_time: *mut c_char,
    pub end_time: *mut c_char,
}

impl From<WorkPeriod> for FfiWorkPeriod {
    fn from(p: WorkPeriod) -> Self {
        FfiWorkPeriod {
            weekday: p.weekday_index,
            start_time: c_string(p.start_time),
            end_time: c_string(p.end_time),
        }
    }
}

#[repr(C)]
pub struct FfiMasterDetail {
    pub id: i64,
    pub name: *mut c_char,
    pub description: *mut c_char,
    pub avatar_url: *mut c_char,
    pub city: *mut c_char,
    pub services: *mut FfiService,
    pub services_len: u32,
    pub work_schedule: *mut FfiWorkPeriod,
    pub work_schedule_len: u32,
}

impl From<MasterDetail> for FfiMasterDetail {
    fn from(m: MasterDetail) -> Self {
        let (services, services_len) =
            into_raw_slice(m.services.into_iter().map(FfiService::from).collect());
        let (work_schedule, work_schedule_len) =
            into_raw_slice(m.work_schedule.into_iter().map(FfiWorkPeriod::from).collect());
        FfiMasterDetail {
            id: m.id,
            name: c_string(m.name),
            description: opt_c_string(m.description),
            avatar_url: opt_c_string(m.avatar_url),
            city: opt_c_string(m.city),
            services,
            services_len,
            work_schedule,
            work_schedule_len,
        }
    }
}

impl FfiMasterDetail {
    unsafe fn release(self) {
        unsafe {
            free_c_string(self.name);
            free_c_string(self.description);
            free_c_string(self.avatar_url);
            free_c_string(self.city);
            for service in take_slice(self.services, self.services_len) {
                service.release();
            }
            for period in take_slice(self.work_schedule, self.work_schedule_len) {
                free_c_string(period.start_time);
                free_c_string(period.end_time);
            }
        }
    }
}

/// `date` is `YYYY-MM-DD`, `time` is `HH:MM`.
#[repr(C)]
pub struct FfiTimeSlot {
    pub date: *mut c_char,
    pub time: *mut c_char,
    pub available: bool,
}

#[repr(C)]
pub struct FfiTimeSlotList {
    pub items: *mut FfiTimeSlot,
    pub len: u32,
}

impl From<Vec<TimeSlot>> for FfiTimeSlotList {
    fn from(slots: Vec<TimeSlot>) -> Self {
        let slots: Vec<FfiTimeSlot> = slots
            .into_iter()
            .map(|slot| FfiTimeSlot {
                date: c_string(slot.date.format("%Y-%m-%d").to_string()),
                time: c_string(slot.time),
                available: slot.available,
            })
            .collect();
        let (items, len) = into_raw_slice(slots);
        FfiTimeSlotList { items, len }
    }
}

#[repr(C)]
pub struct FfiBooking {
    pub id: i64,
    pub master_name: *mut c_char,
    pub service_title: *mut c_char,
    pub start_datetime: *mut c_char,
    pub end_datetime: *mut c_char,
    pub price: f64,
    pub status: *mut c_char,
}

impl From<Booking> for FfiBooking {
    fn from(b: Booking) -> Self {
        FfiBooking {
            id: b.id,
            master_name: c_string(b.master_name),
            service_title: c_string(b.service_title),
            start_datetime: c_string(b.start_datetime),
            end_datetime: c_string(b.end_datetime),
            price: b.price,
            status: c_string(String::from(b.status)),
        }
    }
}

impl FfiBooking {
    unsafe fn release(self) {
        unsafe {
            free_c_string(self.master_name);
            free_c_string(self.service_title);
            free_c_string(self.start_datetime);
            free_c_string(self.end_datetime);
            free_c_string(self.status);
        }
    }
}

#[repr(C)]
pub struct FfiBookingList {
    pub items: *mut FfiBooking,
    pub len: u32,
}

impl From<Vec<Booking>> for FfiBookingList {
    fn from(bookings: Vec<Booking>) -> Self {
        let (items, len) = into_raw_slice(bookings.into_iter().map(FfiBooking::from).collect());
        FfiBookingList { items, len }
    }
}

#[repr(C)]
pub struct FfiAck {
    pub success: bool,
    pub message: *mut c_char,
}

impl From<Ack> for FfiAck {
    fn from(ack: Ack) -> Self {
        FfiAck {
            success: ack.success,
            message: c_string(ack.message),
        }
    }
}

#[repr(C)]
pub struct FfiCity {
    pub id: i64,
    pub name_ru: *mut c_char,
    pub name_local: *mut c_char,
    pub name_en: *mut c_char,
}

#[repr(C)]
pub struct FfiCityList {
    pub items: *mut FfiCity,
    pub len: u32,
}

impl From<Vec<City>> for FfiCityList {
    fn from(cities: Vec<City>) -> Self {
        let cities: Vec<FfiCity> = cities
            .into_iter()
            .map(|city| FfiCity {
                id: city.id,
                name_ru: c_string(city.name_ru),
                name_local: c_string(city.name_local),
                name_en: c_string(city.name_en),
            })
            .collect();
        let (items, len) = into_raw_slice(cities);
        FfiCityList { items, len }
    }
}

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

#[repr(C)]
pub enum FfiErrorCode {
    Ok = 0,
    NotFound = 1,
    Unauthorized = 2,
    Http = 3,
    Deserialization = 4,
    Serialization = 5,
    Transport = 6,
    InvalidRequest = 7,
    Panic = 8,
    NullArg = 9,
}

/// Tells `lumi_free_result` (and the host) what `FfiLumiResult::data`
/// points to.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FfiDataTag {
    None = 0,
    MasterList = 1,
    MasterDetail = 2,
    TimeSlotList = 3,
    Booking = 4,
    BookingList = 5,
    Ack = 6,
    CityList = 7,
}

/// Result envelope for every `lumi_parse_*` function.
///
/// On success `error_code` is `Ok`, `error_message` is null and `data`
/// points to the payload named by `data_tag`. On failure `data` is null,
/// `error_message` holds the rendered error and `http_status` the response
/// status when one is known (0 otherwise).
#[repr(C)]
pub struct FfiLumiResult {
    pub error_code: FfiErrorCode,
    pub error_message: *mut c_char,
    pub http_status: u16,
    pub data_tag: FfiDataTag,
    pub data: *mut c_void,
}

impl FfiLumiResult {
    fn ok<T>(data_tag: FfiDataTag, payload: T) -> *mut Self {
        Box::into_raw(Box::new(FfiLumiResult {
            error_code: FfiErrorCode::Ok,
            error_message: ptr::null_mut(),
            http_status: 0,
            data_tag,
            data: Box::into_raw(Box::new(payload)) as *mut c_void,
        }))
    }

    fn failure(error_code: FfiErrorCode, http_status: u16, message: String) -> *mut Self {
        Box::into_raw(Box::new(FfiLumiResult {
            error_code,
            error_message: c_string(message),
            http_status,
            data_tag: FfiDataTag::None,
            data: ptr::null_mut(),
        }))
    }

    pub(crate) fn master_list(masters: Vec<MasterSummary>) -> *mut Self {
        Self::ok(FfiDataTag::MasterList, FfiMasterList::from(masters))
    }

    pub(crate) fn master_detail(master: MasterDetail) -> *mut Self {
        Self::ok(FfiDataTag::MasterDetail, FfiMasterDetail::from(master))
    }

    pub(crate) fn time_slot_list(slots: Vec<TimeSlot>) -> *mut Self {
        Self::ok(FfiDataTag::TimeSlotList, FfiTimeSlotList::from(slots))
    }

    pub(crate) fn booking(booking: Booking) -> *mut Self {
        Self::ok(FfiDataTag::Booking, FfiBooking::from(booking))
    }

    pub(crate) fn booking_list(bookings: Vec<Booking>) -> *mut Self {
        Self::ok(FfiDataTag::BookingList, FfiBookingList::from(bookings))
    }

    pub(crate) fn ack(ack: Ack) -> *mut Self {
        Self::ok(FfiDataTag::Ack, FfiAck::from(ack))
    }

    pub(crate) fn city_list(cities: Vec<City>) -> *mut Self {
        Self::ok(FfiDataTag::CityList, FfiCityList::from(cities))
    }

    pub(crate) fn from_error(err: ApiError) -> *mut Self {
        let code = match &err {
            ApiError::NotFound(_) => FfiErrorCode::NotFound,
            ApiError::Unauthorized { .. } => FfiErrorCode::Unauthorized,
            ApiError::HttpError { .. } => FfiErrorCode::Http,
            ApiError::Transport(_) => FfiErrorCode::Transport,
            ApiError::DeserializationError(_) => FfiErrorCode::Deserialization,
            ApiError::SerializationError(_) => FfiErrorCode::Serialization,
            ApiError::InvalidRequest(_) => FfiErrorCode::InvalidRequest,
        };
        Self::failure(code, err.status().unwrap_or(0), err.to_string())
    }

    pub(crate) fn null_arg(name: &str) -> *mut Self {
        Self::failure(FfiErrorCode::NullArg, 0, format!("null argument: {name}"))
    }

    pub(crate) fn panic(function: &str) -> *mut Self {
        Self::failure(FfiErrorCode::Panic, 0, format!("panic in {function}"))
    }

    /// Free the message and the tagged payload.
    ///
    /// # Safety
    /// `self` must have been produced by one of the constructors above.
    pub(crate) unsafe fn release(self) {
        unsafe {
            free_c_string(self.error_message);
            if self.data.is_null() {
                return;
            }
            match self.data_tag {
                FfiDataTag::None => {}
                FfiDataTag::MasterList => {
                    let list = Box::from_raw(self.data as *mut FfiMasterList);
                    for master in take_slice(list.items, list.len) {
                        master.release();
                    }
                }
                FfiDataTag::MasterDetail => {
                    Box::from_raw(self.data as *mut FfiMasterDetail).release();
                }
                FfiDataTag::TimeSlotList => {
                    let list = Box::from_raw(self.data as *mut FfiTimeSlotList);
                    for slot in take_slice(list.items, list.len) {
                        free_c_string(slot.date);
                        free_c_string(slot.time);
                    }
                }
                FfiDataTag::Booking => {
                    Box::from_raw(self.data as *mut FfiBooking).release();
                }
                FfiDataTag::BookingList => {
                    let list = Box::from_raw(self.data as *mut FfiBookingList);
                    for booking in take_slice(list.items, list.len) {
                        booking.release();
                    }
                }
                FfiDataTag::Ack => {
                    free_c_string(Box::from_raw(self.data as *mut FfiAck).message);
                }
                FfiDataTag::CityList => {
                    let list = Box::from_raw(self.data as *mut FfiCityList);
                    for city in take_slice(list.items, list.len) {
                        free_c_string(city.name_ru);
                        free_c_string(city.name_local);
                        free_c_string(city.name_en);
                    }
                }
            }
        }
    }
}
