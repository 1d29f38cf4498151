use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{
    app, AckResponse, BookingResponse, CityResponse, MasterDetailResponse, MasterResponse,
    TimeSlotResponse,
};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn detail(response: axum::response::Response) -> String {
    let body: serde_json::Value = body_json(response).await;
    body["detail"].as_str().unwrap_or_default().to_string()
}

fn authed(method: &str, uri: &str, user: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::AUTHORIZATION, format!("Bearer {user}"))
        .body(String::new())
        .unwrap()
}

fn booking_request(user: &str, body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header(http::header::AUTHORIZATION, format!("Bearer {user}"))
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- auth ---

#[tokio::test]
async fn missing_credential_is_forbidden() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/masters").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(detail(resp).await, "Not authenticated");
}

#[tokio::test]
async fn non_numeric_credential_is_unauthorized() {
    let resp = app()
        .oneshot(authed("GET", "/api/masters", "anna"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(detail(resp).await, "Invalid authentication credentials");
}

// --- cities ---

#[tokio::test]
async fn cities_are_public() {
    let resp = app()
        .oneshot(Request::builder().uri("/api/cities").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cities: Vec<CityResponse> = body_json(resp).await;
    assert_eq!(cities.len(), 2);
    assert_eq!(cities[0].name_en, "Riga");
}

#[tokio::test]
async fn city_masters_lists_by_city() {
    let resp = app()
        .oneshot(authed("GET", "/api/cities/1/masters", "7"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let masters: Vec<MasterResponse> = body_json(resp).await;
    let names: Vec<&str> = masters.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Anna", "Marta"]);
}

// --- masters ---

#[tokio::test]
async fn new_caller_has_no_masters() {
    let resp = app()
        .oneshot(authed("GET", "/api/masters", "7"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let masters: Vec<MasterResponse> = body_json(resp).await;
    assert!(masters.is_empty());
}

#[tokio::test]
async fn master_detail_has_services_and_schedule() {
    let resp = app()
        .oneshot(authed("GET", "/api/masters/1", "7"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let master: MasterDetailResponse = body_json(resp).await;
    assert_eq!(master.name, "Anna");
    assert_eq!(master.city.as_deref(), Some("Рига"));
    assert_eq!(master.services.len(), 2);
    assert_eq!(master.work_schedule.len(), 5);
    assert_eq!(master.work_schedule[0].start_time, "09:00:00");
}

#[tokio::test]
async fn unknown_master_is_404() {
    let resp = app()
        .oneshot(authed("GET", "/api/masters/999", "7"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(detail(resp).await, "Master not found");
}

#[tokio::test]
async fn add_unknown_master_is_404() {
    let resp = app()
        .oneshot(authed("POST", "/api/masters/999/add", "7"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- time slots ---

#[tokio::test]
async fn time_slots_follow_schedule_and_duration() {
    // 2030-01-07 is a Monday: Anna works 09:00-18:00, a pedicure takes 90 minutes.
    let resp = app()
        .oneshot(authed(
            "GET",
            "/api/masters/1/services/2/time-slots?date_from=2030-01-07&date_to=2030-01-07",
            "7",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let slots: Vec<TimeSlotResponse> = body_json(resp).await;
    let times: Vec<&str> = slots.iter().map(|s| s.time.as_str()).collect();
    assert_eq!(times, vec!["09:00", "10:30", "12:00", "13:30", "15:00", "16:30"]);
    assert!(slots.iter().all(|s| s.available && s.date == "2030-01-07"));
}

#[tokio::test]
async fn time_slots_skip_days_off() {
    // Marta works Tuesday, Thursday and Saturday only.
    let resp = app()
        .oneshot(authed(
            "GET",
            "/api/masters/2/services/3/time-slots?date_from=2030-01-07&date_to=2030-01-07",
            "7",
        ))
        .await
        .unwrap();
    let slots: Vec<TimeSlotResponse> = body_json(resp).await;
    assert!(slots.is_empty());
}

#[tokio::test]
async fn time_slots_for_foreign_service_is_404() {
    let resp = app()
        .oneshot(authed(
            "GET",
            "/api/masters/1/services/3/time-slots?date_from=2030-01-07&date_to=2030-01-07",
            "7",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(detail(resp).await, "Service not found");
}

#[tokio::test]
async fn time_slots_reject_bad_dates() {
    let resp = app()
        .oneshot(authed(
            "GET",
            "/api/masters/1/services/1/time-slots?date_from=07.01.2030&date_to=2030-01-07",
            "7",
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// --- full booking flow ---

#[tokio::test]
async fn booking_flow() {
    use tower::Service;

    let mut app = app().into_service();

    // add Anna to the caller's list
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("POST", "/api/masters/1/add", "7"))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: AckResponse = body_json(resp).await;
    assert!(ack.success);
    assert_eq!(ack.message, "Master added");

    // the list now has her, the city search no longer does
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", "/api/masters", "7"))
        .await
        .unwrap();
    let masters: Vec<MasterResponse> = body_json(resp).await;
    assert_eq!(masters.len(), 1);
    assert_eq!(masters[0].services_count, 2);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", "/api/cities/1/masters", "7"))
        .await
        .unwrap();
    let masters: Vec<MasterResponse> = body_json(resp).await;
    assert_eq!(masters.len(), 1);
    assert_eq!(masters[0].name, "Marta");

    // book a manicure
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(booking_request(
            "7",
            r#"{"master_id":1,"service_id":1,"start_datetime":"2030-01-07T10:00:00","comment":"first visit"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let booking: BookingResponse = body_json(resp).await;
    assert_eq!(booking.master_name, "Anna");
    assert_eq!(booking.service_title, "Manicure");
    assert_eq!(booking.start_datetime, "2030-01-07T10:00:00");
    assert_eq!(booking.end_datetime, "2030-01-07T11:00:00");
    assert_eq!(booking.status, "confirmed");

    // the same slot cannot be booked twice, even by someone else
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(booking_request(
            "8",
            r#"{"master_id":1,"service_id":2,"start_datetime":"2030-01-07T10:30:00"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(detail(resp).await, "Time slot is already booked");

    // the booked hour disappears from the slot list
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed(
            "GET",
            "/api/masters/1/services/1/time-slots?date_from=2030-01-07&date_to=2030-01-07",
            "7",
        ))
        .await
        .unwrap();
    let slots: Vec<TimeSlotResponse> = body_json(resp).await;
    assert_eq!(slots.len(), 8);
    assert!(slots.iter().all(|s| s.time != "10:00"));

    // bookings are per caller
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", "/api/bookings", "7"))
        .await
        .unwrap();
    let bookings: Vec<BookingResponse> = body_json(resp).await;
    assert_eq!(bookings.len(), 1);
    assert_eq!(bookings[0].id, booking.id);

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", "/api/bookings", "8"))
        .await
        .unwrap();
    let bookings: Vec<BookingResponse> = body_json(resp).await;
    assert!(bookings.is_empty());

    // remove Anna again
    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("DELETE", "/api/masters/1/remove", "7"))
        .await
        .unwrap();
    let ack: AckResponse = body_json(resp).await;
    assert_eq!(ack.message, "Master removed");

    let resp = ServiceExt::ready(&mut app)
        .await
        .unwrap()
        .call(authed("GET", "/api/masters", "7"))
        .await
        .unwrap();
    let masters: Vec<MasterResponse> = body_json(resp).await;
    assert!(masters.is_empty());
}
