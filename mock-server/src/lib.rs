//! In-memory imitation of the Lumi booking server.
//!
//! Serves the same endpoints and JSON shapes as the real API over seeded
//! data: two cities, three masters with services and weekly schedules, and
//! no bookings. Callers authenticate with `Authorization: Bearer <user id>`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use tracing::debug;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MasterResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub city_name: Option<String>,
    pub services_count: u32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ServiceResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_mins: u32,
    pub category_name: Option<String>,
    pub portfolio_photos: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkPeriodResponse {
    pub weekday: u8,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MasterDetailResponse {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub city: Option<String>,
    pub services: Vec<ServiceResponse>,
    pub work_schedule: Vec<WorkPeriodResponse>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimeSlotResponse {
    pub date: String,
    pub time: String,
    pub available: bool,
}

#[derive(Deserialize)]
pub struct BookingInput {
    pub master_id: i64,
    pub service_id: i64,
    pub start_datetime: String,
    pub comment: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BookingResponse {
    pub id: i64,
    pub master_name: String,
    pub service_title: String,
    pub start_datetime: String,
    pub end_datetime: String,
    pub price: f64,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CityResponse {
    pub id: i64,
    pub name_ru: String,
    pub name_local: String,
    pub name_en: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AckResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Deserialize)]
pub struct SlotQuery {
    pub date_from: String,
    pub date_to: String,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub struct ServiceRecord {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_mins: u32,
    pub category_name: Option<String>,
    pub portfolio_photos: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct WorkPeriod {
    pub weekday: u8,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

#[derive(Clone, Debug)]
pub struct MasterRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub city_id: Option<i64>,
    pub services: Vec<ServiceRecord>,
    pub schedule: Vec<WorkPeriod>,
}

#[derive(Clone, Debug)]
pub struct BookingRecord {
    pub id: i64,
    pub user_id: i64,
    pub master_id: i64,
    pub service_id: i64,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub price: f64,
    pub comment: Option<String>,
}

#[derive(Debug, Default)]
pub struct Store {
    pub cities: Vec<CityResponse>,
    pub masters: Vec<MasterRecord>,
    /// Masters each user keeps on their list.
    pub links: HashMap<i64, BTreeSet<i64>>,
    pub bookings: Vec<BookingRecord>,
    next_booking_id: i64,
}

impl Store {
    pub fn seeded() -> Self {
        let time = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();

        Store {
            cities: vec![
                CityResponse {
                    id: 1,
                    name_ru: "Рига".to_string(),
                    name_local: "Rīga".to_string(),
                    name_en: "Riga".to_string(),
                },
                CityResponse {
                    id: 2,
                    name_ru: "Таллин".to_string(),
                    name_local: "Tallinn".to_string(),
                    name_en: "Tallinn".to_string(),
                },
            ],
            masters: vec![
                MasterRecord {
                    id: 1,
                    name: "Anna".to_string(),
                    description: Some("Nail artist".to_string()),
                    avatar_url: Some("https://cdn.lumi.test/anna.jpg".to_string()),
                    city_id: Some(1),
                    services: vec![
                        ServiceRecord {
                            id: 1,
                            title: "Manicure".to_string(),
                            description: Some("Classic manicure".to_string()),
                            price: 25.0,
                            duration_mins: 60,
                            category_name: Some("Nails".to_string()),
                            portfolio_photos: vec!["https://cdn.lumi.test/p/1.jpg".to_string()],
                        },
                        ServiceRecord {
                            id: 2,
                            title: "Pedicure".to_string(),
                            description: None,
                            price: 35.0,
                            duration_mins: 90,
                            category_name: Some("Nails".to_string()),
                            portfolio_photos: Vec::new(),
                        },
                    ],
                    schedule: weekly(&[0, 1, 2, 3, 4], time(9, 0), time(18, 0)),
                },
                MasterRecord {
                    id: 2,
                    name: "Marta".to_string(),
                    description: None,
                    avatar_url: None,
                    city_id: Some(1),
                    services: vec![ServiceRecord {
                        id: 3,
                        title: "Haircut".to_string(),
                        description: None,
                        price: 30.0,
                        duration_mins: 45,
                        category_name: Some("Hair".to_string()),
                        portfolio_photos: Vec::new(),
                    }],
                    schedule: weekly(&[1, 3, 5], time(10, 0), time(16, 0)),
                },
                MasterRecord {
                    id: 3,
                    name: "Liis".to_string(),
                    description: None,
                    avatar_url: None,
                    city_id: Some(2),
                    services: vec![ServiceRecord {
                        id: 4,
                        title: "Brows".to_string(),
                        description: None,
                        price: 15.0,
                        duration_mins: 30,
                        category_name: None,
                        portfolio_photos: Vec::new(),
                    }],
                    schedule: weekly(&[0, 1, 2, 3, 4, 5, 6], time(11, 0), time(13, 0)),
                },
            ],
            links: HashMap::new(),
            bookings: Vec::new(),
            next_booking_id: 1,
        }
    }

    fn master(&self, id: i64) -> Result<&MasterRecord, ApiFailure> {
        self.masters
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| ApiFailure::not_found("Master not found"))
    }

    fn city_name(&self, city_id: Option<i64>) -> Option<String> {
        let id = city_id?;
        self.cities
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name_ru.clone())
    }

    fn summary(&self, master: &MasterRecord) -> MasterResponse {
        MasterResponse {
            id: master.id,
            name: master.name.clone(),
            description: master.description.clone(),
            avatar_url: master.avatar_url.clone(),
            city_name: self.city_name(master.city_id),
            services_count: master.services.len() as u32,
        }
    }

    fn is_booked(&self, master_id: i64, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.bookings
            .iter()
            .any(|b| b.master_id == master_id && b.start < end && start < b.end)
    }
}

/// The same working hours on each of `weekdays`.
fn weekly(weekdays: &[u8], start: NaiveTime, end: NaiveTime) -> Vec<WorkPeriod> {
    weekdays
        .iter()
        .map(|&weekday| WorkPeriod { weekday, start, end })
        .collect()
}

pub type Db = Arc<RwLock<Store>>;

// ---------------------------------------------------------------------------
// Errors and auth
// ---------------------------------------------------------------------------

/// Error response in the server's `{"detail": ...}` format.
#[derive(Debug)]
pub struct ApiFailure {
    status: StatusCode,
    detail: String,
}

impl ApiFailure {
    fn new(status: StatusCode, detail: &str) -> Self {
        Self {
            status,
            detail: detail.to_string(),
        }
    }

    fn not_found(detail: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        (self.status, Json(serde_json::json!({ "detail": self.detail }))).into_response()
    }
}

/// Caller id taken from the bearer credential.
pub struct Caller(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiFailure;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiFailure::new(StatusCode::FORBIDDEN, "Not authenticated"))?;
        let token = value
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiFailure::new(StatusCode::FORBIDDEN, "Not authenticated"))?;
        token.trim().parse().map(Caller).map_err(|_| {
            ApiFailure::new(
                StatusCode::UNAUTHORIZED,
                "Invalid authentication credentials",
            )
        })
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn app() -> Router {
    app_with(Store::seeded())
}

pub fn app_with(store: Store) -> Router {
    let db: Db = Arc::new(RwLock::new(store));
    Router::new()
        .route("/", get(root))
        .route("/api/masters", get(list_masters))
        .route("/api/masters/{master_id}", get(get_master))
        .route(
            "/api/masters/{master_id}/services/{service_id}/time-slots",
            get(time_slots),
        )
        .route("/api/masters/{master_id}/add", post(add_master))
        .route("/api/masters/{master_id}/remove", delete(remove_master))
        .route("/api/bookings", get(list_bookings).post(create_booking))
        .route("/api/cities", get(list_cities))
        .route("/api/cities/{city_id}/masters", get(city_masters))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "Lumi Beauty API", "version": "1.0.0" }))
}

async fn list_masters(State(db): State<Db>, Caller(user): Caller) -> Json<Vec<MasterResponse>> {
    let store = db.read().await;
    let linked = store.links.get(&user).cloned().unwrap_or_default();
    Json(
        store
            .masters
            .iter()
            .filter(|m| linked.contains(&m.id))
            .map(|m| store.summary(m))
            .collect(),
    )
}

async fn get_master(
    State(db): State<Db>,
    Path(master_id): Path<i64>,
    Caller(_): Caller,
) -> Result<Json<MasterDetailResponse>, ApiFailure> {
    let store = db.read().await;
    let master = store.master(master_id)?;
    Ok(Json(MasterDetailResponse {
        id: master.id,
        name: master.name.clone(),
        description: master.description.clone(),
        avatar_url: master.avatar_url.clone(),
        city: store.city_name(master.city_id),
        services: master
            .services
            .iter()
            .map(|s| ServiceResponse {
                id: s.id,
                title: s.title.clone(),
                description: s.description.clone(),
                price: s.price,
                duration_mins: s.duration_mins,
                category_name: s.category_name.clone(),
                portfolio_photos: s.portfolio_photos.clone(),
            })
            .collect(),
        work_schedule: master
            .schedule
            .iter()
            .map(|p| WorkPeriodResponse {
                weekday: p.weekday,
                start_time: p.start.format("%H:%M:%S").to_string(),
                end_time: p.end.format("%H:%M:%S").to_string(),
            })
            .collect(),
    }))
}

async fn time_slots(
    State(db): State<Db>,
    Path((master_id, service_id)): Path<(i64, i64)>,
    Query(query): Query<SlotQuery>,
    Caller(_): Caller,
) -> Result<Json<Vec<TimeSlotResponse>>, ApiFailure> {
    let store = db.read().await;
    let master = store.master(master_id)?;
    let service = master
        .services
        .iter()
        .find(|s| s.id == service_id)
        .ok_or_else(|| ApiFailure::not_found("Service not found"))?;

    let parse = |raw: &str| {
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
            ApiFailure::new(StatusCode::UNPROCESSABLE_ENTITY, "Dates must be YYYY-MM-DD")
        })
    };
    let from = parse(&query.date_from)?;
    let to = parse(&query.date_to)?;

    let step = Duration::minutes(i64::from(service.duration_mins));
    let mut slots = Vec::new();
    for date in from.iter_days().take_while(|d| *d <= to) {
        let weekday = date.weekday().num_days_from_monday() as u8;
        for period in master.schedule.iter().filter(|p| p.weekday == weekday) {
            let close = date.and_time(period.end);
            let mut start = date.and_time(period.start);
            while start + step <= close {
                if !store.is_booked(master.id, start, start + step) {
                    slots.push(TimeSlotResponse {
                        date: date.format("%Y-%m-%d").to_string(),
                        time: start.format("%H:%M").to_string(),
                        available: true,
                    });
                }
                start += step;
            }
        }
    }
    debug!(master_id, service_id, count = slots.len(), "time slots");
    Ok(Json(slots))
}

/// Accepts naive ISO date-times and RFC 3339 ones with an offset.
fn parse_start(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}

fn iso(dt: NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

async fn create_booking(
    State(db): State<Db>,
    Caller(user): Caller,
    Json(input): Json<BookingInput>,
) -> Result<Json<BookingResponse>, ApiFailure> {
    let mut store = db.write().await;
    let master = store.master(input.master_id)?.clone();
    let service = master
        .services
        .iter()
        .find(|s| s.id == input.service_id)
        .ok_or_else(|| ApiFailure::not_found("Service not found"))?;

    let start = parse_start(&input.start_datetime).ok_or_else(|| {
        ApiFailure::new(StatusCode::UNPROCESSABLE_ENTITY, "Invalid start_datetime")
    })?;
    let end = start + Duration::minutes(i64::from(service.duration_mins));
    if store.is_booked(master.id, start, end) {
        return Err(ApiFailure::new(
            StatusCode::BAD_REQUEST,
            "Time slot is already booked",
        ));
    }

    let id = store.next_booking_id;
    store.next_booking_id += 1;
    store.bookings.push(BookingRecord {
        id,
        user_id: user,
        master_id: master.id,
        service_id: service.id,
        start,
        end,
        price: service.price,
        comment: input.comment,
    });

    Ok(Json(BookingResponse {
        id,
        master_name: master.name.clone(),
        service_title: service.title.clone(),
        start_datetime: iso(start),
        end_datetime: iso(end),
        price: service.price,
        status: "confirmed".to_string(),
    }))
}

async fn list_bookings(State(db): State<Db>, Caller(user): Caller) -> Json<Vec<BookingResponse>> {
    let store = db.read().await;
    let mut bookings: Vec<&BookingRecord> =
        store.bookings.iter().filter(|b| b.user_id == user).collect();
    bookings.sort_by_key(|b| b.start);
    Json(
        bookings
            .into_iter()
            .filter_map(|b| {
                let master = store.master(b.master_id).ok()?;
                let service = master.services.iter().find(|s| s.id == b.service_id)?;
                Some(BookingResponse {
                    id: b.id,
                    master_name: master.name.clone(),
                    service_title: service.title.clone(),
                    start_datetime: iso(b.start),
                    end_datetime: iso(b.end),
                    price: b.price,
                    status: "confirmed".to_string(),
                })
            })
            .collect(),
    )
}

async fn add_master(
    State(db): State<Db>,
    Path(master_id): Path<i64>,
    Caller(user): Caller,
) -> Result<Json<AckResponse>, ApiFailure> {
    let mut store = db.write().await;
    store.master(master_id)?;
    store.links.entry(user).or_default().insert(master_id);
    Ok(Json(AckResponse {
        success: true,
        message: "Master added".to_string(),
    }))
}

async fn remove_master(
    State(db): State<Db>,
    Path(master_id): Path<i64>,
    Caller(user): Caller,
) -> Result<Json<AckResponse>, ApiFailure> {
    let mut store = db.write().await;
    store.master(master_id)?;
    if let Some(linked) = store.links.get_mut(&user) {
        linked.remove(&master_id);
    }
    Ok(Json(AckResponse {
        success: true,
        message: "Master removed".to_string(),
    }))
}

async fn list_cities(State(db): State<Db>) -> Json<Vec<CityResponse>> {
    Json(db.read().await.cities.clone())
}

/// Masters in a city that are not yet on the caller's list.
async fn city_masters(
    State(db): State<Db>,
    Path(city_id): Path<i64>,
    Caller(user): Caller,
) -> Json<Vec<MasterResponse>> {
    let store = db.read().await;
    let linked = store.links.get(&user).cloned().unwrap_or_default();
    Json(
        store
            .masters
            .iter()
            .filter(|m| m.city_id == Some(city_id) && !linked.contains(&m.id))
            .map(|m| store.summary(m))
            .collect(),
    )
}
