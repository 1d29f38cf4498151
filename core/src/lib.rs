//! Client core for the Lumi beauty-services booking API.
//!
//! # Overview
//! Lists masters, shows their services and schedules, fetches free time
//! slots and creates bookings. `LumiClient` builds and parses HTTP messages
//! without touching the network (host-does-IO pattern); `Repository` runs
//! them through a `Transport` on behalf of an injected `CallerId`; screen
//! models expose each screen's `ViewState` through a watch channel.
//!
//! # Design
//! - `LumiClient` is stateless, it holds only `base_url`.
//! - Each endpoint is split into `build_*` (produces request) and `parse_*`
//!   (consumes response), so the I/O boundary is explicit and the FFI crate
//!   can hand the round-trip to a native host.
//! - Models are defined independently from the mock-server crate;
//!   integration tests catch schema drift.
//! - A screen runs at most one fetch at a time; its errors become display
//!   state and are never rethrown.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
#[cfg(feature = "cli")]
pub mod logging;
pub mod repository;
pub mod screens;
pub mod session;
pub mod state;
pub mod transport;
pub mod types;

pub use client::{DateRange, LumiClient};
pub use config::ClientConfig;
pub use error::{ApiError, ConfigError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use repository::Repository;
pub use screens::ScreenModel;
pub use session::CallerId;
pub use state::{Phase, StateHolder, ViewData, ViewState};
pub use transport::{ReqwestTransport, Transport};
pub use types::{
    Ack, Booking, BookingRequest, BookingStatus, City, Locale, MasterDetail, MasterSummary,
    Service, TimeSlot, WorkPeriod,
};
