//! End-to-end contract runs against a mocked calendar service.

use futures_util::future::join_all;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use covenant_fetch::FetchConfig;

use crate::{assert_matches_schema, assert_request_matches_schema, ContractContext, TestError};

const CALENDAR_API: &str = include_str!("../../../tests/fixtures/calendar-api.json");

fn event(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": "Weekly sync",
        "startDate": "2024-12-01T10:00:00.000Z",
        "endDate": "2024-12-01T11:00:00.000Z",
        "location": "Room 4"
    })
}

/// Echo a created event, or reject it the way the real service does.
fn create_event(request: &Request) -> ResponseTemplate {
    let Ok(body) = serde_json::from_slice::<Value>(&request.body) else {
        return ResponseTemplate::new(400)
            .set_body_json(json!({"error": "Invalid JSON", "details": ["body is not JSON"]}));
    };

    let mut details = Vec::new();
    for field in ["title", "startDate", "endDate"] {
        if body.get(field).and_then(Value::as_str).unwrap_or("").is_empty() {
            details.push(format!("{field} is required"));
        }
    }
    if !details.is_empty() {
        return ResponseTemplate::new(400)
            .set_body_json(json!({"error": "Validation failed", "details": details}));
    }

    let mut created = body;
    created["id"] = json!("evt_1");
    ResponseTemplate::new(201).set_body_json(json!({
        "id": "evt_1",
        "message": "Event created successfully",
        "event": created
    }))
}

async fn calendar_service() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Calendar App API",
            "version": "1.0.0",
            "status": "running"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "timestamp": "2024-12-01T09:00:00.000Z"
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/openapi.json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(CALENDAR_API, "application/json"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [event("evt_0", "Standup")],
            "message": "Events retrieved successfully"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/events"))
        .respond_with(create_event)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/api/events/evt_0"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path_regex(r"^/api/events/[^/]+$"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "Event not found"})))
        .mount(&server)
        .await;

    server
}

async fn connect(server: &MockServer) -> ContractContext {
    ContractContext::connect(FetchConfig::new().with_server_url(server.uri()))
        .await
        .expect("calendar service should be reachable")
}

#[tokio::test]
async fn health_and_info_workflow() {
    let server = calendar_service().await;
    let ctx = connect(&server).await;

    let info = ctx.client().get("/").await.unwrap();
    assert_eq!(info.status, 200);
    assert_eq!(info.body["status"], "running");
    assert_matches_schema!(ctx, info.body, "/", "get", info.status);

    let health = ctx.client().get("/health").await.unwrap();
    assert_eq!(health.body["status"], "healthy");
    assert_matches_schema!(ctx, health.body, "/health", "get", health.status);

    let spec = ctx.client().get("/api/openapi.json").await.unwrap();
    assert_eq!(spec.body["openapi"], "3.0.3");
    assert_matches_schema!(ctx, spec.body, "/api/openapi.json", "get", 200);
}

#[tokio::test]
async fn event_lifecycle_matches_contract() {
    let server = calendar_service().await;
    let ctx = connect(&server).await;

    let listed = ctx.client().get("/api/events").await.unwrap();
    assert_matches_schema!(ctx, listed.body, "/api/events", "get", listed.status);

    let new_event = json!({
        "title": "Integration Test Event",
        "description": "Created during integration testing",
        "startDate": "2024-12-15T14:00:00.000Z",
        "endDate": "2024-12-15T15:00:00.000Z",
        "location": "Test Conference Room"
    });
    assert_request_matches_schema!(ctx, new_event, "/api/events", "post");

    let created = ctx.client().post("/api/events", &new_event).await.unwrap();
    assert_eq!(created.status, 201);
    assert_eq!(created.body["event"]["title"], "Integration Test Event");
    assert_matches_schema!(ctx, created.body, "/api/events", "post", created.status);
    assert!(ctx
        .expected_status_codes("/api/events", "post")
        .contains(&created.status));

    let deleted = ctx.client().delete("/api/events/evt_0").await.unwrap();
    assert_eq!(deleted.status, 204);
    assert!(deleted.body.is_null());
    assert_matches_schema!(ctx, deleted.body, "/api/events/{id}", "delete", deleted.status);
}

#[tokio::test]
async fn rejected_requests_match_error_schemas() {
    let server = calendar_service().await;
    let ctx = connect(&server).await;

    let invalid = [
        json!({"description": "No title provided", "startDate": "2024-12-01T10:00:00.000Z", "endDate": "2024-12-01T11:00:00.000Z"}),
        json!({"title": "No dates provided"}),
        json!({"title": "", "startDate": "2024-12-01T10:00:00.000Z", "endDate": "2024-12-01T11:00:00.000Z"}),
    ];

    for body in &invalid {
        assert!(!ctx.check_request("/api/events", "post", body).pass);

        let resp = ctx.client().post("/api/events", body).await.unwrap();
        assert_eq!(resp.status, 400);
        assert!(resp.error);
        assert_matches_schema!(ctx, resp.body, "/api/events", "post", resp.status);
    }

    let missing = ctx.client().delete("/api/events/nope").await.unwrap();
    assert_eq!(missing.status, 404);
    assert_matches_schema!(ctx, missing.body, "/api/events/{id}", "delete", 404);
}

#[tokio::test]
async fn drifted_payload_is_reported() {
    let server = calendar_service().await;
    let ctx = connect(&server).await;

    // The service stops sending `timestamp`.
    let drifted = json!({"status": "healthy"});
    let outcome = ctx.check_response("/health", "get", 200, &drifted);

    assert!(!outcome.pass);
    assert!(outcome
        .message
        .starts_with("Response validation failed for GET /health (200):"));
}

#[tokio::test]
async fn unknown_endpoint_is_not_documented() {
    let server = calendar_service().await;
    let ctx = connect(&server).await;

    let resp = ctx.client().get("/nonexistent").await.unwrap();
    assert_eq!(resp.status, 404);

    let outcome = ctx.check_response("/nonexistent", "get", resp.status, &resp.body);
    assert!(!outcome.pass);
    assert!(outcome.message.contains("operation not found"));
}

#[tokio::test]
async fn concurrent_exchanges_share_one_context() {
    let server = calendar_service().await;
    let ctx = connect(&server).await;

    let checks = (0..8).map(|i| {
        let ctx = ctx.clone();
        async move {
            let path = if i % 2 == 0 { "/health" } else { "/api/events" };
            let resp = ctx.client().get(path).await?;
            Ok::<_, TestError>(ctx.check_response(path, "get", resp.status, &resp.body))
        }
    });

    for outcome in join_all(checks).await {
        let outcome = outcome.unwrap();
        assert!(outcome.pass, "{}", outcome.message);
    }
    assert_eq!(ctx.validator().cached_schemas(), 2);
}

#[tokio::test]
async fn unhealthy_service_fails_connect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = ContractContext::connect(FetchConfig::new().with_server_url(server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, TestError::Fetch(_)));
    assert!(err.to_string().contains("503"));
}
