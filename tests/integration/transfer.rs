// tests/integration/transfer.rs

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};

use crate::{body_bytes, body_json, get, send, test_router};

const BOUNDARY: &str = "X-EMPLOYEE-BOUNDARY";

pub fn upload(org: &str, field: &str, csv: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"people.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/employees/import")
        .header("X-Org-Id", org)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn import_reports_skipped_rows_then_export_contains_imported() {
    let router = test_router(60);
    let csv = "first_name,last_name,location,status,company\n\
               Ivy,Import,Lisbon,Active,Acme\n\
               ,Nameless,Lisbon,,\n\
               Max,Bad,Lisbon,Retired,\n";

    let response = send(&router, upload("org-2", "file", csv)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let summary = body_json(response).await;
    assert_eq!(summary["imported"], 1);
    assert_eq!(summary["skipped"].as_array().unwrap().len(), 2);
    assert_eq!(summary["skipped"][0]["row"], 2);

    let response = send(&router, get("/employees/export", Some("org-2"))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"employees.csv\""
    );

    let text = String::from_utf8(body_bytes(response).await).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "id,first_name,last_name,department,position,location,status,company"
    );
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "2,Ivy,Import,,,Lisbon,Active,Acme");
}

#[tokio::test]
async fn upload_without_file_field_is_bad_request() {
    let router = test_router(60);
    let response = send(&router, upload("org-1", "attachment", "first_name,last_name\nA,B\n")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_without_required_columns_is_unprocessable() {
    let router = test_router(60);
    let response = send(&router, upload("org-1", "file", "name,status\nA,Active\n")).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
