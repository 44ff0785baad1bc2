use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use encore_api::{app, AppState};
use encore_core::{HoldStore, InMemoryTicketRepository, ManualClock, ReservationService};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
    tickets: Arc<InMemoryTicketRepository>,
}

fn test_app() -> TestApp {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let holds = Arc::new(HoldStore::new(Duration::minutes(10), clock.clone()));
    let tickets = Arc::new(InMemoryTicketRepository::new());
    let reservations = ReservationService::new(holds, tickets.clone()).with_max_batch_size(10);

    TestApp {
        router: app(AppState::new(reservations)),
        clock,
        tickets,
    }
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, body)
}

async fn post(router: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    send(router, request).await
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(router, request).await
}

#[tokio::test]
async fn test_reserve_then_conflict_for_second_user() {
    let t = test_app();

    let (status, body) = post(&t.router, "/v1/reservations", json!({
        "tableIds": ["T1", "T2"], "userId": "A", "eventId": "E1"
    })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reserved": ["T1", "T2"], "conflicts": [] }));

    let (status, body) = post(&t.router, "/v1/reservations", json!({
        "tableIds": ["T1", "T3"], "userId": "B", "eventId": "E1"
    })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reserved": ["T3"], "conflicts": ["T1"] }));
}

#[tokio::test]
async fn test_expired_hold_is_reservable_again() {
    let t = test_app();

    post(&t.router, "/v1/reservations", json!({
        "tableIds": ["T1"], "userId": "A", "eventId": "E1"
    })).await;

    t.clock.advance(Duration::minutes(15));

    let (_, body) = post(&t.router, "/v1/reservations", json!({
        "tableIds": ["T1"], "userId": "B", "eventId": "E1"
    })).await;
    assert_eq!(body["reserved"], json!(["T1"]));
}

#[tokio::test]
async fn test_availability_reports_sold_and_held_tables() {
    let t = test_app();
    t.tickets.issue("tk-5", "E1", "T5");

    post(&t.router, "/v1/reservations", json!({
        "tableIds": ["T1"], "userId": "A", "eventId": "E1"
    })).await;

    let (status, body) = post(&t.router, "/v1/availability", json!({
        "tableIds": ["T5"], "eventId": "E1"
    })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "available": [], "unavailable": ["T5"] }));

    // A sees their own hold as claimable, B does not
    let (_, for_a) = post(&t.router, "/v1/availability", json!({
        "tableIds": ["T1", "T2"], "eventId": "E1", "userId": "A"
    })).await;
    assert_eq!(for_a["available"], json!(["T1", "T2"]));

    let (_, for_b) = post(&t.router, "/v1/availability", json!({
        "tableIds": ["T1", "T2"], "eventId": "E1", "userId": "B"
    })).await;
    assert_eq!(for_b, json!({ "available": ["T2"], "unavailable": ["T1"] }));
}

#[tokio::test]
async fn test_lookup_outage_fails_closed() {
    let t = test_app();
    t.tickets.set_failing(true);

    let (status, body) = post(&t.router, "/v1/reservations", json!({
        "tableIds": ["T1"], "userId": "A", "eventId": "E1"
    })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "reserved": [], "conflicts": ["T1"] }));

    let (_, body) = post(&t.router, "/v1/availability", json!({
        "tableIds": ["T1"], "eventId": "E1"
    })).await;
    assert_eq!(body["unavailable"], json!(["T1"]));
}

#[tokio::test]
async fn test_list_reserved_for_event() {
    let t = test_app();
    post(&t.router, "/v1/reservations", json!({ "tableIds": ["T1"], "userId": "A", "eventId": "E1" })).await;
    post(&t.router, "/v1/reservations", json!({ "tableIds": ["T2"], "userId": "B", "eventId": "E1" })).await;
    post(&t.router, "/v1/reservations", json!({ "tableIds": ["T3"], "userId": "B", "eventId": "E2" })).await;

    let (status, body) = get(&t.router, "/v1/events/E1/reservations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(["T1", "T2"]));

    let (_, body) = get(&t.router, "/v1/events/E1/reservations?userId=A").await;
    assert_eq!(body, json!(["T2"]));
}

#[tokio::test]
async fn test_release_frees_own_tables_only() {
    let t = test_app();
    post(&t.router, "/v1/reservations", json!({ "tableIds": ["T1", "T2"], "userId": "A", "eventId": "E1" })).await;

    let (status, body) = post(&t.router, "/v1/reservations/release", json!({
        "tableIds": ["T1"], "userId": "B"
    })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "released": [] }));

    let (_, body) = post(&t.router, "/v1/reservations/release", json!({
        "tableIds": ["T1"], "userId": "A"
    })).await;
    assert_eq!(body, json!({ "released": ["T1"] }));

    let (_, body) = get(&t.router, "/v1/events/E1/reservations").await;
    assert_eq!(body, json!(["T2"]));
}

#[tokio::test]
async fn test_validation_errors_are_bad_requests() {
    let t = test_app();

    let (status, body) = post(&t.router, "/v1/reservations", json!({ "userId": "A", "eventId": "E1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("tableIds"));

    let (status, _) = post(&t.router, "/v1/reservations", json!({ "tableIds": ["T1"], "eventId": "E1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let too_many: Vec<String> = (0..11).map(|i| format!("T{}", i)).collect();
    let (status, _) = post(&t.router, "/v1/reservations", json!({
        "tableIds": too_many, "userId": "A", "eventId": "E1"
    })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, health) = get(&t.router, "/health").await;
    assert_eq!(health["liveHolds"], 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_single_winner() {
    let t = test_app();

    let handles: Vec<_> = (0..25)
        .map(|i| {
            let router = t.router.clone();
            tokio::spawn(async move {
                post(&router, "/v1/reservations", json!({
                    "tableIds": ["LAST"], "userId": format!("user-{}", i), "eventId": "E1"
                })).await
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        let (status, body) = handle.await.unwrap();
        assert_eq!(status, StatusCode::OK);
        if body["reserved"] == json!(["LAST"]) {
            winners += 1;
        }
    }

    assert_eq!(winners, 1);

    let (_, health) = get(&t.router, "/health").await;
    assert_eq!(health, json!({ "status": "ok", "liveHolds": 1 }));
}
