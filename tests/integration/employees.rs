// tests/integration/employees.rs

use axum::http::StatusCode;
use serde_json::json;

use crate::{body_json, get, post_json, send, test_router};

#[tokio::test]
async fn health_needs_no_organization() {
    let router = test_router(60);
    let response = send(&router, get("/health", None)).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn missing_org_header_is_rejected() {
    let router = test_router(60);

    for uri in ["/employees", "/employees/filters", "/employees/export"] {
        let response = send(&router, get(uri, None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(
            body_json(response).await,
            json!({ "error": "X-Org-Id header is required" })
        );
    }

    let blank = send(&router, get("/employees", Some("   "))).await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_is_scoped_and_projected() {
    let router = test_router(60);
    let body = body_json(send(&router, get("/employees", Some("org-1"))).await).await;

    // уволенные скрыты по умолчанию, чужая организация не видна
    assert_eq!(body["total"], 3);
    assert_eq!(body["page"], 1);
    assert_eq!(body["page_size"], 50);
    let names: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["first_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Amelia", "Ana", "Arlani"]);

    let first = body["items"][0].as_object().unwrap();
    let mut keys: Vec<&str> = first.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(
        keys,
        [
            "department",
            "first_name",
            "id",
            "last_name",
            "location",
            "position",
            "status",
            "visible_columns",
        ]
    );
    assert_eq!(first["visible_columns"], json!(["department", "position", "location"]));
}

#[tokio::test]
async fn second_org_sees_its_own_columns() {
    let router = test_router(60);
    let body = body_json(send(&router, get("/employees", Some("org-2"))).await).await;

    assert_eq!(body["total"], 1);
    let item = body["items"][0].as_object().unwrap();
    assert_eq!(item["first_name"], "OtherOrg");
    assert!(item.contains_key("department"));
    assert!(item.contains_key("location"));
    assert!(!item.contains_key("position"));
    assert!(!item.contains_key("company"));
}

#[tokio::test]
async fn unknown_org_gets_identity_fields_only() {
    let router = test_router(60);
    let body = body_json(send(&router, get("/employees", Some("org-404"))).await).await;
    assert_eq!(body["total"], 0);

    let filters = body_json(send(&router, get("/employees/filters", Some("org-404"))).await).await;
    assert_eq!(filters["visible_columns"], json!([]));
}

#[tokio::test]
async fn filters_and_requested_columns() {
    let router = test_router(60);

    let body = body_json(
        send(
            &router,
            get(
                "/employees?include_terminated=true&statuses=Terminated&columns=location,company",
                Some("org-1"),
            ),
        )
        .await,
    )
    .await;
    assert_eq!(body["total"], 1);
    let item = body["items"][0].as_object().unwrap();
    assert_eq!(item["first_name"], "Terminated");
    assert_eq!(item["visible_columns"], json!(["location"]));
    assert!(!item.contains_key("department"));

    let body = body_json(send(&router, get("/employees?search=SINGAP", Some("org-1"))).await).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["first_name"], "Amelia");

    let body = body_json(send(&router, get("/employees?page=abc&page_size=2", Some("org-1"))).await)
        .await;
    assert_eq!(body["page"], 1);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn filter_values_are_org_scoped() {
    let router = test_router(60);
    let body = body_json(send(&router, get("/employees/filters", Some("org-1"))).await).await;

    let locations = body["locations"].as_array().unwrap();
    assert!(locations.contains(&json!("Singapore")));
    assert!(!locations.contains(&json!("Other City")));
}

#[tokio::test]
async fn create_then_find() {
    let router = test_router(60);

    let response = send(
        &router,
        post_json(
            "/employees",
            "org-2",
            json!({
                "first_name": "  Nina ",
                "last_name": "New",
                "location": "Tallinn",
                "company": "Hidden Co",
                "status": "Not started"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["id"], 2);
    assert_eq!(created["first_name"], "Nina");
    assert!(created.get("company").is_none());

    let body = body_json(send(&router, get("/employees?locations=Tallinn", Some("org-2"))).await)
        .await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["status"], "Not started");
}

#[tokio::test]
async fn create_without_name_is_unprocessable() {
    let router = test_router(60);
    let response = send(
        &router,
        post_json("/employees", "org-1", json!({ "first_name": "Solo" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn malformed_json_gets_error_body() {
    let router = test_router(60);
    let response = send(
        &router,
        post_json("/employees", "org-1", json!({ "first_name": 5, "last_name": "Doe" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.headers()[axum::http::header::CONTENT_TYPE],
        "application/json"
    );
    assert!(body_json(response).await["error"].is_string());
}
