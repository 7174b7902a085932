//! Search, bench history, reindex and health endpoint tests.

mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{create_test_app, id_of};

async fn create_employee(server: &axum_test::TestServer, upsa_id: &str, name: &str) -> i64 {
    let response = server
        .post("/api/employees")
        .json(&json!({"upsaId": upsa_id, "fullName": name}))
        .await;
    response.assert_status(StatusCode::CREATED);
    id_of(&response.json())
}

// ============================================================================
// Search
// ============================================================================

#[tokio::test]
async fn test_search_by_field_and_free_text() {
    let app = create_test_app();
    let server = &app.server;

    create_employee(server, "E1", "John Smith").await;
    create_employee(server, "E2", "Jane Smith").await;
    create_employee(server, "E3", "John Doe").await;

    let found: Vec<Value> = server
        .get("/api/_search/employees?query=fullName:%22john%20smith%22")
        .await
        .json();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["upsaId"], "E1");

    let response = server.get("/api/_search/employees?query=smith").await;
    response.assert_status_ok();
    assert_eq!(response.headers().get("x-total-count").unwrap(), "2");

    let found: Vec<Value> = server
        .get("/api/_search/employees?query=upsaId:E3")
        .await
        .json();
    assert_eq!(found[0]["fullName"], "John Doe");
}

#[tokio::test]
async fn test_search_links_carry_query() {
    let app = create_test_app();
    let server = &app.server;

    for n in 0..3 {
        server
            .post("/api/project-categories")
            .json(&json!({"upsaId": format!("PC{n}"), "name": "Internal"}))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = server
        .get("/api/_search/project-categories?query=name:internal&size=2")
        .await;
    response.assert_status_ok();
    let found: Vec<Value> = response.json();
    assert_eq!(found.len(), 2);
    assert_eq!(response.headers().get("x-total-count").unwrap(), "3");

    let link = response.headers().get("link").unwrap().to_str().unwrap();
    assert!(link.starts_with(
        "</api/_search/project-categories?query=name%3Ainternal&page=1&size=2>; rel=\"next\""
    ));
}

#[tokio::test]
async fn test_search_query_errors() {
    let app = create_test_app();
    let server = &app.server;

    let response = server.get("/api/_search/units").await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["message"], "error.badquery");

    let response = server.get("/api/_search/units?query=").await;
    response.assert_status_bad_request();

    let response = server
        .get("/api/_search/units?query=name:%22open%20quote")
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["message"], "error.badquery");
    assert_eq!(
        response.headers().get("x-benchapp-error").unwrap(),
        "error.badquery"
    );
}

#[tokio::test]
async fn test_deeply_nested_query_is_bad_query() {
    let app = create_test_app();

    let depth = bench_persistence::search::MAX_NESTING + 1;
    let query = format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
    let response = app
        .server
        .get("/api/_search/units")
        .add_query_param("query", &query)
        .await;
    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["message"], "error.badquery");
    assert_eq!(
        response.headers().get("x-benchapp-error").unwrap(),
        "error.badquery"
    );

    // Far past the limit the server still answers
    let query = format!("{}a{}", "(".repeat(20_000), ")".repeat(20_000));
    app.server
        .get("/api/_search/units")
        .add_query_param("query", &query)
        .await
        .assert_status_bad_request();
    app.server.get("/_liveness").await.assert_status_ok();
}

#[tokio::test]
async fn test_search_reflects_index_not_store() {
    let app = create_test_app();
    let server = &app.server;

    app.index.set_failing(true);
    let response = server
        .post("/api/units")
        .json(&json!({"upsaId": "U1", "name": "Lost"}))
        .await;
    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["message"], "error.indexsync");
    app.index.set_failing(false);

    // Stored but not searchable
    let units: Vec<Value> = server.get("/api/units").await.json();
    assert_eq!(units.len(), 1);
    let found: Vec<Value> = server
        .get("/api/_search/units?query=upsaId:U1")
        .await
        .json();
    assert!(found.is_empty());

    // Reindexing repairs the divergence
    let response = server.post("/api/_reindex/units").await;
    response.assert_status_ok();
    let report: Value = response.json();
    assert_eq!(report["entityType"], "unit");
    assert_eq!(report["total"], 1);
    assert_eq!(report["indexed"], 1);

    let found: Vec<Value> = server
        .get("/api/_search/units?query=upsaId:U1")
        .await
        .json();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn test_best_effort_policy_hides_index_failure() {
    let config = bench_rest::ServerConfig {
        index_sync_policy: "best-effort".to_string(),
        ..bench_rest::ServerConfig::for_testing()
    };
    let app = common::create_test_app_with(config);

    app.index.set_failing(true);
    let response = app
        .server
        .post("/api/units")
        .json(&json!({"upsaId": "U1", "name": "Quiet"}))
        .await;
    response.assert_status(StatusCode::CREATED);
}

#[tokio::test]
async fn test_reindex_everything() {
    let app = create_test_app();
    let server = &app.server;

    create_employee(server, "E1", "John Smith").await;

    let response = server.post("/api/_reindex").await;
    response.assert_status_ok();
    let reports: Vec<Value> = response.json();
    assert_eq!(reports.len(), 11);

    let employees = reports
        .iter()
        .find(|r| r["entityType"] == "employee")
        .unwrap();
    assert_eq!(employees["indexed"], 1);
    assert!(employees["errors"].as_array().unwrap().is_empty());
}

// ============================================================================
// Bench history of an employee
// ============================================================================

#[tokio::test]
async fn test_employee_bench_histories() {
    let app = create_test_app();
    let server = &app.server;

    let john = create_employee(server, "E1", "John Smith").await;
    let jane = create_employee(server, "E2", "Jane Smith").await;

    for (employee, bench) in [(john, true), (jane, true), (john, false)] {
        server
            .post("/api/bench-histories")
            .json(&json!({
                "employeeId": employee,
                "createdTime": "2017-03-01T10:00:00Z",
                "bench": bench
            }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let response = server
        .get(&format!("/api/employees/{john}/bench-histories"))
        .await;
    response.assert_status_ok();
    let histories: Vec<Value> = response.json();
    assert_eq!(histories.len(), 2);
    assert_eq!(histories[0]["bench"], true);
    assert_eq!(histories[1]["bench"], false);
    assert!(histories.iter().all(|h| h["employeeId"] == john));

    let response = server.get("/api/employees/999/bench-histories").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_employee_without_histories_is_empty() {
    let app = create_test_app();
    let id = create_employee(&app.server, "E1", "John Smith").await;

    let histories: Vec<Value> = app
        .server
        .get(&format!("/api/employees/{id}/bench-histories"))
        .await
        .json();
    assert!(histories.is_empty());
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = create_test_app();
    let server = &app.server;

    server.get("/_liveness").await.assert_status_ok();
    server.get("/_readiness").await.assert_status_ok();

    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"]["backend"], "sqlite");
    assert_eq!(body["index"]["backend"], "flaky");

    app.index.set_failing(true);
    let response = server.get("/health").await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["store"]["status"], "ok");

    // Readiness only depends on the store
    server.get("/_readiness").await.assert_status_ok();
}
