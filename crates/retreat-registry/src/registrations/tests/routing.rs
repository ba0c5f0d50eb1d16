use super::common::*;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::registrations::router::{installments_handler, EventQuery};

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn pool_members_lists_eligible_ids() {
    let response = router()
        .oneshot(get("/api/v1/pools/sw2025-eligible/members?aid=sw2025"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["pool"], "sw2025-eligible");
    assert_eq!(payload["members"], json!(["p-ada", "p-grace", "p-linus"]));
}

#[tokio::test]
async fn eligibility_reports_single_participant() {
    let response = router()
        .oneshot(get("/api/v1/pools/staff/participants/p-ada?aid=sw2025"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["eligible"], true);
}

#[tokio::test]
async fn eligibility_for_unknown_participant_is_not_found() {
    let response = router()
        .oneshot(get("/api/v1/pools/staff/participants/p-nobody?aid=sw2025"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|message| message.contains("p-nobody")));
}

#[tokio::test]
async fn view_endpoint_renders_rows() {
    let response = router()
        .oneshot(json_request(
            "POST",
            "/api/v1/views/registrations",
            json!({ "aid": AID, "search": "lovelace" }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["view"], "sw2025-registrations");
    assert_eq!(payload["rows"].as_array().map(Vec::len), Some(1));
    assert_eq!(payload["rows"][0]["participantId"], "p-ada");
}

#[tokio::test]
async fn view_endpoint_rejects_missing_view() {
    let response = router()
        .oneshot(json_request(
            "POST",
            "/api/v1/views/finance",
            json!({ "aid": AID }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn installments_handler_returns_summary() {
    let query = EventQuery {
        aid: AID.to_string(),
        sub_event: None,
    };

    let response = installments_handler(
        State(service()),
        Path("p-ada".to_string()),
        Query(query),
    )
    .await
    .expect("ada has a program");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["total"], json!(250.0));
    assert_eq!(payload["received"], json!(100.0));
    assert_eq!(payload["due"], json!(150.0));
    assert_eq!(payload["depositMade"], true);
    assert_eq!(payload["offeringComplete"], false);
    assert_eq!(payload["lastPaymentDate"], "2025-03-01T10:00:00Z");
}

#[tokio::test]
async fn installments_without_program_is_not_found() {
    let response = router()
        .oneshot(get("/api/v1/participants/p-ken/installments?aid=sw2025"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn change_feed_updates_later_views() {
    let service = service();
    let app = crate::registrations::registration_router(service.clone());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/participants/p-grace/changes",
            json!({ "programs": { AID: { "withdrawn": false } } }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/views/registrations",
            json!({ "aid": AID }),
        ))
        .await
        .expect("response");
    let payload = read_json_body(response).await;
    let ids: Vec<&str> = payload["rows"]
        .as_array()
        .map(|rows| {
            rows.iter()
                .filter_map(|row| row["participantId"].as_str())
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(ids, vec!["p-ada", "p-grace", "p-linus"]);
}

#[tokio::test]
async fn null_flag_in_change_reads_as_unset() {
    let service = service();
    let app = crate::registrations::registration_router(service.clone());

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/v1/participants/p-grace/changes",
            json!({ "programs": { AID: { "withdrawn": null } } }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let grace = service
        .participants()
        .get("p-grace")
        .expect("grace cached");
    assert_eq!(grace.program(AID).map(|program| program.withdrawn), Some(false));
}

#[tokio::test]
async fn malformed_change_is_unprocessable() {
    let response = router()
        .oneshot(json_request(
            "POST",
            "/api/v1/participants/p-ada/changes",
            json!({ "programs": { AID: "sometimes" } }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
