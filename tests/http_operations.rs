#![cfg(feature = "server")]

use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;

use he_aggregate::http::{
    router, AppState, CiphertextResponse, CsvReadResponse, ErrorResponse, PublicKeyResponse,
    ValueResponse,
};
use he_aggregate::{ColumnSummary, CsvOptions, Engines, OperationResponse, OperationOutput};
use reqwest::StatusCode;
use serde_json::json;
use tokio::net::TcpListener;

async fn spawn_server(engines: Engines) -> (String, tokio::task::JoinHandle<()>) {
    let app = router(Arc::new(AppState {
        engines,
        csv: CsvOptions::default(),
    }));

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr: SocketAddr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server should run");
    });

    (format!("http://{}", addr), handle)
}

fn keyed_engines() -> Engines {
    let mut engines = Engines::with_ring_dim(1024).expect("valid parameters");
    engines.generate_keys().expect("keygen should succeed");
    engines
}

#[tokio::test]
async fn test_http_encrypt_add_decrypt() {
    let (base_url, server_handle) = spawn_server(keyed_engines()).await;
    let client = reqwest::Client::new();

    let health = client
        .get(format!("{}/health", base_url))
        .send()
        .await
        .expect("request should succeed");
    assert!(health.status().is_success());

    let mut texts = Vec::new();
    for value in [5, 7] {
        let response: CiphertextResponse = client
            .post(format!("{}/encrypt", base_url))
            .json(&json!({ "value": value, "scheme": "exact" }))
            .send()
            .await
            .expect("request should succeed")
            .json()
            .await
            .expect("parse response");
        texts.push(response.ciphertext);
    }

    let sum: CiphertextResponse = client
        .post(format!("{}/add_encrypted", base_url))
        .json(&json!({ "a": texts[0], "b": texts[1], "scheme": "exact" }))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("parse response");

    let value: ValueResponse = client
        .post(format!("{}/decrypt", base_url))
        .json(&json!({ "ciphertext": sum.ciphertext, "scheme": "exact" }))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("parse response");
    assert_eq!(value.value, 12.0);

    // Exact ciphertext presented as approximate
    let mismatch = client
        .post(format!("{}/decrypt", base_url))
        .json(&json!({ "ciphertext": sum.ciphertext, "scheme": "approximate" }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);
    let body: ErrorResponse = mismatch.json().await.expect("parse error response");
    assert!(body.error.contains("scheme mismatch"));

    server_handle.abort();
}

#[tokio::test]
async fn test_http_operation_contract() {
    let (base_url, server_handle) = spawn_server(keyed_engines()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/operation", base_url))
        .json(&json!({
            "operation": "average",
            "scheme": "approximate",
            "operands": [3.14, 2.71]
        }))
        .send()
        .await
        .expect("request should succeed");
    assert!(response.status().is_success());
    let body: OperationResponse = response.json().await.expect("parse response");
    let Some(OperationOutput::Value(avg)) = body.result else {
        panic!("expected a numeric result, got {:?}", body);
    };
    assert!((avg - 2.925).abs() < 0.01);

    let response = client
        .post(format!("{}/operation", base_url))
        .json(&json!({ "operation": "encrypt", "scheme": "exact", "operands": [200000] }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: OperationResponse = response.json().await.expect("parse response");
    assert!(body.result.is_none());
    assert!(body.error.unwrap().contains("out of range"));

    let key: PublicKeyResponse = client
        .get(format!("{}/public_key?scheme=exact", base_url))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("parse response");
    assert!(!key.public_key.is_empty());

    server_handle.abort();
}

#[tokio::test]
async fn test_http_without_keys_is_internal_error() {
    let engines = Engines::with_ring_dim(1024).expect("valid parameters");
    let (base_url, server_handle) = spawn_server(engines).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/encrypt", base_url))
        .json(&json!({ "value": 1.0 }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    server_handle.abort();
}

#[tokio::test]
async fn test_http_csv_routes() {
    let mut file = tempfile::NamedTempFile::new().expect("create temp file");
    file.write_all(b"10,20,30\n15,25,35\nx,abc,y\n")
        .expect("write csv");
    file.flush().expect("flush csv");

    let (base_url, server_handle) = spawn_server(keyed_engines()).await;
    let client = reqwest::Client::new();

    let read: CsvReadResponse = client
        .post(format!("{}/csv/read", base_url))
        .json(&json!({ "path": file.path(), "column": 1 }))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("parse response");
    assert_eq!(read.values, vec![20.0, 25.0]);
    assert_eq!(read.count, 2);

    let sum: ColumnSummary = client
        .post(format!("{}/csv/sum", base_url))
        .json(&json!({ "path": file.path(), "column": 1, "scheme": "exact" }))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("parse response");
    assert!(sum.encrypted);
    assert_eq!(sum.result, 45.0);

    let average: ColumnSummary = client
        .post(format!("{}/csv/average", base_url))
        .json(&json!({ "path": file.path(), "column": 0 }))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("parse response");
    assert!(!average.encrypted);
    assert_eq!(average.result, 12.5);

    let missing = client
        .post(format!("{}/csv/read", base_url))
        .json(&json!({ "path": "/nonexistent/he-aggregate/missing.csv" }))
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);

    let degraded: ColumnSummary = client
        .post(format!("{}/csv/sum", base_url))
        .json(&json!({ "path": "/nonexistent/he-aggregate/missing.csv", "scheme": "approximate" }))
        .send()
        .await
        .expect("request should succeed")
        .json()
        .await
        .expect("parse response");
    assert_eq!(degraded.values_processed, 0);
    assert_eq!(degraded.result, 0.0);

    server_handle.abort();
}
