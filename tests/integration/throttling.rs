// tests/integration/throttling.rs

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;

use crate::transfer::upload;
use crate::{body_bytes, body_json, get, post_json, send, test_router};

#[tokio::test]
async fn over_limit_requests_get_429_with_retry_after() {
    let router = test_router(2);

    for _ in 0..2 {
        let response = send(&router, get("/employees", Some("org-1"))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = send(&router, get("/employees", Some("org-1"))).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let retry_after: u64 = response.headers()[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!((1..=60).contains(&retry_after));
    assert!(body_json(response).await["error"].is_string());
}

#[tokio::test]
async fn limits_are_per_org_and_endpoint() {
    let router = test_router(1);

    assert_eq!(send(&router, get("/employees", Some("org-1"))).await.status(), StatusCode::OK);
    assert_eq!(
        send(&router, get("/employees", Some("org-1"))).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    // другой эндпоинт и другая организация считаются отдельно
    assert_eq!(
        send(&router, get("/employees/filters", Some("org-1"))).await.status(),
        StatusCode::OK
    );
    assert_eq!(send(&router, get("/employees", Some("org-2"))).await.status(), StatusCode::OK);

    // health не ограничивается
    for _ in 0..3 {
        assert_eq!(send(&router, get("/health", None)).await.status(), StatusCode::OK);
    }
}

async fn export_lines(router: &axum::Router, org: &str) -> Vec<String> {
    let response = send(router, get("/employees/export", Some(org))).await;
    assert_eq!(response.status(), StatusCode::OK);
    String::from_utf8(body_bytes(response).await)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn throttled_create_stores_nothing() {
    let router = test_router(1);

    let first = send(
        &router,
        post_json("/employees", "org-1", json!({ "first_name": "Kept", "last_name": "One" })),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = send(
        &router,
        post_json("/employees", "org-1", json!({ "first_name": "Dropped", "last_name": "Two" })),
    )
    .await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    let lines = export_lines(&router, "org-1").await;
    // заголовок, четыре записи из демо-данных и одна созданная
    assert_eq!(lines.len(), 6);
    assert!(lines.iter().any(|line| line.contains("Kept")));
    assert!(!lines.iter().any(|line| line.contains("Dropped")));
}

#[tokio::test]
async fn throttled_import_stores_nothing() {
    let router = test_router(1);

    let first = send(&router, upload("org-2", "file", "first_name,last_name\nKept,One\n")).await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = send(&router, upload("org-2", "file", "first_name,last_name\nDropped,Two\n")).await;
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

    let lines = export_lines(&router, "org-2").await;
    // заголовок, запись из демо-данных и одна импортированная
    assert_eq!(lines.len(), 3);
    assert!(!lines.iter().any(|line| line.contains("Dropped")));
}

#[tokio::test]
async fn malformed_bodies_count_against_the_limit() {
    let router = test_router(1);

    let bad = send(
        &router,
        post_json("/employees", "org-1", json!({ "first_name": 5, "last_name": "Doe" })),
    )
    .await;
    assert_eq!(bad.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let good = send(
        &router,
        post_json("/employees", "org-1", json!({ "first_name": "Ok", "last_name": "Doe" })),
    )
    .await;
    assert_eq!(good.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn broken_multipart_counts_against_the_limit() {
    let router = test_router(1);
    let request = Request::builder()
        .method("POST")
        .uri("/employees/import")
        .header("X-Org-Id", "org-1")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("not a form"))
        .unwrap();

    let response = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["error"].is_string());

    let retry = send(&router, upload("org-1", "file", "first_name,last_name\nA,B\n")).await;
    assert_eq!(retry.status(), StatusCode::TOO_MANY_REQUESTS);
}
