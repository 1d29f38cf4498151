//! Booking flow against the live mock server.
//!
//! # Design
//! Starts the mock server on a random port, then exercises every endpoint
//! twice: once through the sans-IO client with ureq as the host executor,
//! and once through `Repository` + `ReqwestTransport` + screen models.

use std::net::SocketAddr;

use chrono::NaiveDate;
use lumi_core::screens;
use lumi_core::{
    ApiError, BookingRequest, BookingStatus, CallerId, DateRange, HttpMethod, HttpResponse,
    LumiClient, Phase, Repository, ReqwestTransport,
};

/// Start the mock server on its own runtime and return its address.
fn spawn_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });
    addr
}

fn with_headers<B>(
    mut builder: ureq::RequestBuilder<B>,
    headers: &[(String, String)],
) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

/// Execute an `HttpRequest` using ureq and return an `HttpResponse`.
///
/// Disables ureq's automatic status-code-as-error behavior so 4xx/5xx
/// responses are returned as data rather than `Err`, letting the core
/// client handle status interpretation.
fn execute(req: lumi_core::HttpRequest) -> HttpResponse {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = match (req.method, req.body) {
        (HttpMethod::Get, _) => with_headers(agent.get(&req.path), &req.headers).call(),
        (HttpMethod::Delete, _) => with_headers(agent.delete(&req.path), &req.headers).call(),
        (HttpMethod::Post, Some(body)) => {
            with_headers(agent.post(&req.path), &req.headers).send(body.as_bytes())
        }
        (HttpMethod::Post, None) => with_headers(agent.post(&req.path), &req.headers).send_empty(),
    }
    .expect("HTTP transport error");

    let status = response.status().as_u16();
    let body = response.body_mut().read_to_string().unwrap_or_default();
    HttpResponse::new(status, body)
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 7).unwrap()
}

#[test]
fn host_executed_booking_flow() {
    let addr = spawn_server();
    let client = LumiClient::new(&format!("http://{addr}"));
    let caller = CallerId::new(501);

    // Step 1: cities are public.
    let cities = client.parse_list_cities(execute(client.build_list_cities())).unwrap();
    assert_eq!(cities.len(), 2);
    let riga = cities.iter().find(|c| c.name_en == "Riga").unwrap();

    // Step 2: a new caller has an empty list; the city has candidates.
    let mine = client
        .parse_list_masters(execute(client.build_list_masters(caller)))
        .unwrap();
    assert!(mine.is_empty());
    let nearby = client
        .parse_list_city_masters(execute(client.build_list_city_masters(caller, riga.id)))
        .unwrap();
    let anna = nearby.iter().find(|m| m.name == "Anna").unwrap();

    // Step 3: add her.
    let ack = client
        .parse_add_master(execute(client.build_add_master(caller, anna.id)))
        .unwrap();
    assert!(ack.success);
    let mine = client
        .parse_list_masters(execute(client.build_list_masters(caller)))
        .unwrap();
    assert_eq!(mine.len(), 1);

    // Step 4: detail and slots.
    let detail = client
        .parse_get_master(execute(client.build_get_master(caller, anna.id)))
        .unwrap();
    let manicure = detail.services.iter().find(|s| s.title == "Manicure").unwrap();
    assert_eq!(detail.work_schedule.len(), 5);

    let range = DateRange::day(monday());
    let slots = client
        .parse_list_time_slots(execute(client.build_list_time_slots(
            caller,
            detail.id,
            manicure.id,
            &range,
        )))
        .unwrap();
    assert_eq!(slots.len(), 9);

    // Step 5: book the first slot.
    let request = BookingRequest::for_slot(detail.id, manicure.id, &slots[0]).unwrap();
    let booking = client
        .parse_create_booking(execute(client.build_create_booking(caller, &request).unwrap()))
        .unwrap();
    assert!(detail.confirms(&request, &booking));
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.start_datetime, "2030-01-07T09:00:00");

    // Step 6: booking the same slot again is a conflict.
    let err = client
        .parse_create_booking(execute(client.build_create_booking(caller, &request).unwrap()))
        .unwrap_err();
    assert!(matches!(err, ApiError::HttpError { status: 400, .. }));

    // Step 7: the booking is listed.
    let bookings = client
        .parse_list_bookings(execute(client.build_list_bookings(caller)))
        .unwrap();
    assert_eq!(bookings, vec![booking]);

    // Step 8: remove, then an unknown master is NotFound.
    let ack = client
        .parse_remove_master(execute(client.build_remove_master(caller, anna.id)))
        .unwrap();
    assert_eq!(ack.message, "Master removed");
    let err = client
        .parse_get_master(execute(client.build_get_master(caller, 9999)))
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test(flavor = "multi_thread")]
async fn repository_and_screens_against_server() {
    let addr = spawn_server();
    let repository = Repository::new(
        LumiClient::new(&format!("http://{addr}")),
        ReqwestTransport::new(),
        CallerId::new(777),
    );

    // Empty list is its own phase, not an error.
    let masters = screens::masters_screen(&repository);
    assert!(masters.start());
    let state = masters.settled().await;
    assert_eq!(state.phase(), Phase::Empty);

    repository.add_master(3).await.unwrap();
    assert!(masters.retry());
    let state = masters.settled().await;
    assert_eq!(state.phase(), Phase::Loaded);
    assert_eq!(state.data.len(), 1);
    assert_eq!(state.data[0].name, "Liis");

    // Detail screen wraps the model in Some.
    let detail = screens::master_detail_screen(&repository, 3);
    detail.start();
    let state = detail.settled().await;
    let liis = state.data.expect("detail loaded");
    assert_eq!(liis.services.len(), 1);

    // Liis works 11:00-13:00 daily; brows take 30 minutes.
    let range = DateRange::new(monday(), monday().succ_opt().unwrap()).unwrap();
    let slots = screens::time_slots_screen(&repository, 3, 4, range);
    slots.start();
    let state = slots.settled().await;
    assert_eq!(state.data.len(), 8);

    let request = BookingRequest::for_slot(3, 4, &state.data[1])
        .unwrap()
        .with_comment("after work");
    let booking = repository.book(&request).await.unwrap();
    assert!(liis.confirms(&request, &booking));

    let bookings = screens::bookings_screen(&repository);
    bookings.start();
    assert_eq!(bookings.settled().await.data, vec![booking]);

    // Another caller sees none of it.
    let stranger = repository.with_caller(CallerId::new(778));
    assert!(stranger.bookings().await.unwrap().is_empty());
    assert!(stranger.masters().await.unwrap().is_empty());

    let cities = screens::cities_screen(&repository);
    cities.start();
    assert_eq!(cities.settled().await.data.len(), 2);
}

#[tokio::test]
async fn unreachable_server_becomes_error_state() {
    // Bind and drop to get a port nobody listens on.
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let repository = Repository::new(
        LumiClient::new(&format!("http://{addr}")),
        ReqwestTransport::new(),
        CallerId::new(1),
    );

    let screen = screens::masters_screen(&repository);
    screen.start();
    let state = screen.settled().await;
    assert_eq!(state.phase(), Phase::Error);
    assert!(state.error.unwrap().starts_with("network error"));
    assert!(state.data.is_empty());
}
