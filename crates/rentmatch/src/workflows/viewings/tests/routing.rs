use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Datelike, Duration, Local, NaiveDate, Weekday};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::auth::Session;
use crate::workflows::testing::{
    bearer, investor, landlord, read_json_body, FixtureSessions, MemoryBookings,
};
use crate::workflows::viewings::viewing_router;

fn router() -> Router {
    let (service, _, _, _) = build_service(MemoryBookings::default());
    viewing_router(Arc::new(service), Arc::new(FixtureSessions))
}

fn upcoming_monday() -> NaiveDate {
    let mut day = Local::now().date_naive() + Duration::days(7);
    while day.weekday() != Weekday::Mon {
        day = day.succ_opt().expect("date in range");
    }
    day
}

fn booking_request(session: Option<&Session>, body: Value) -> Request<Body> {
    let mut builder = Request::post("/api/v1/viewings")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(session) = session {
        builder = builder.header(header::AUTHORIZATION, bearer(session));
    }
    builder
        .body(Body::from(serde_json::to_vec(&body).expect("json body")))
        .expect("request builds")
}

fn slot_body(day: NaiveDate) -> Value {
    json!({
        "property_id": PROPERTY,
        "date": day.format("%Y-%m-%d").to_string(),
        "time": "10:00",
    })
}

#[tokio::test]
async fn requires_a_bearer_token() {
    let response = router()
        .oneshot(booking_request(None, slot_body(upcoming_monday())))
        .await
        .expect("route executes");

    let (status, payload) = read_json_body(response).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(payload["success"], json!(false));
    assert_eq!(payload["error"], json!("missing bearer token"));
}

#[tokio::test]
async fn books_then_fetches_a_viewing() {
    let router = router();
    let response = router
        .clone()
        .oneshot(booking_request(Some(&investor()), slot_body(upcoming_monday())))
        .await
        .expect("route executes");

    let (status, payload) = read_json_body(response).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["data"]["status"], json!("pending"));
    assert_eq!(payload["data"]["time"], json!("10:00"));
    let booking_id = payload["data"]["id"]
        .as_str()
        .expect("booking id")
        .to_string();

    let response = router
        .clone()
        .oneshot(
            Request::get(format!("/api/v1/viewings/{booking_id}"))
                .header(header::AUTHORIZATION, bearer(&landlord()))
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    let (status, payload) = read_json_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"]["id"], json!(booking_id));

    let response = router
        .oneshot(booking_request(Some(&investor()), slot_body(upcoming_monday())))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn investors_cannot_approve_their_own_requests() {
    let router = router();
    let response = router
        .clone()
        .oneshot(booking_request(Some(&investor()), slot_body(upcoming_monday())))
        .await
        .expect("route executes");
    let (_, payload) = read_json_body(response).await;
    let booking_id = payload["data"]["id"].as_str().expect("booking id").to_string();

    let response = router
        .oneshot(
            Request::patch(format!("/api/v1/viewings/{booking_id}/status"))
                .header(header::AUTHORIZATION, bearer(&investor()))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"status":"approved"}"#))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_bodies_use_the_error_envelope() {
    let response = router()
        .oneshot(booking_request(
            Some(&investor()),
            json!({ "property_id": PROPERTY, "date": "next monday", "time": "10:00" }),
        ))
        .await
        .expect("route executes");

    let (status, payload) = read_json_body(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(payload["success"], json!(false));
}

#[tokio::test]
async fn availability_validates_query_dates() {
    let router = router();
    let response = router
        .clone()
        .oneshot(
            Request::get(format!(
                "/api/v1/properties/{PROPERTY}/availability?start=2024-13-01"
            ))
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let monday = upcoming_monday();
    let response = router
        .oneshot(
            Request::get(format!(
                "/api/v1/properties/{PROPERTY}/availability?start={monday}&end={monday}"
            ))
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("route executes");
    let (status, payload) = read_json_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["data"]["days"][0]["available_count"], json!(18));
    assert_eq!(payload["data"]["excluded_weekdays"], json!(["Sunday"]));
}

#[tokio::test]
async fn inverted_range_returns_an_empty_calendar() {
    let monday = upcoming_monday();
    let saturday = monday + Duration::days(5);
    let response = router()
        .oneshot(
            Request::get(format!(
                "/api/v1/properties/{PROPERTY}/availability?start={saturday}&end={monday}"
            ))
            .body(Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("route executes");

    let (status, payload) = read_json_body(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(payload["success"], json!(true));
    assert_eq!(payload["data"]["days"], json!([]));
}
