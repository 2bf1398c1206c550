//! Integration tests for the certificate registry.
//!
//! Each test binds a real listener on an ephemeral localhost port and talks to
//! it over HTTP, with the store and public directory in a scratch directory.

use std::net::SocketAddr;
use std::path::Path;

use cert_registry::api::{create_router, AppState};
use cert_registry::config::Config;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Build a config rooted in `dir`.
fn test_config(dir: &Path, qr_enabled: bool) -> Config {
    let public_dir = dir.join("public");
    std::fs::create_dir_all(&public_dir).unwrap();
    std::fs::write(public_dir.join("index.html"), "<html>registry</html>").unwrap();

    Config {
        bind_host: "127.0.0.1".to_string(),
        store_path: dir.join("certificates.json"),
        public_dir,
        qr_enabled,
        public_base_url: Some("https://certs.example.org".to_string()),
        ..Config::default()
    }
}

/// Serve `config` on an ephemeral port and return its address.
async fn spawn_server(config: Config) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = create_router(AppState::new(config));

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    addr
}

fn certificate(code: &str, name: &str) -> Value {
    json!({
        "code": code,
        "name": name,
        "year": "2024",
        "degree": "BSc",
        "hons": "First",
        "grade": "A"
    })
}

async fn post_certificate(client: &reqwest::Client, addr: SocketAddr, body: &Value) -> Value {
    client
        .post(format!("http://{}/add-certificate", addr))
        .json(body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn verify(client: &reqwest::Client, addr: SocketAddr, code: &str) -> Value {
    client
        .get(format!("http://{}/verify", addr))
        .query(&[("code", code)])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

/// Issue a certificate, verify it, and fetch its QR image.
#[tokio::test]
async fn test_issue_verify_and_fetch_qr() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_server(test_config(dir.path(), true)).await;
    let client = reqwest::Client::new();

    let response = post_certificate(&client, addr, &certificate("C1", "Alice")).await;
    assert_eq!(response, json!({"success": true, "qr": "/qrcodes/C1.png"}));

    let verified = verify(&client, addr, "C1").await;
    assert_eq!(verified["valid"], true);
    assert_eq!(verified["name"], "Alice");
    assert_eq!(verified["qr"], "/qrcodes/C1.png");

    let image = client
        .get(format!("http://{}/qrcodes/C1.png", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(image.status(), reqwest::StatusCode::OK);
    let bytes = image.bytes().await.unwrap();
    assert_eq!(&bytes[..4], b"\x89PNG");
}

/// Every field is echoed back exactly as issued, and each QR image is served.
#[tokio::test]
async fn test_verify_returns_issued_fields() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_server(test_config(dir.path(), true)).await;
    let client = reqwest::Client::new();

    let cases = [
        certificate("BSC-001", "Alice Smith"),
        json!({"code": "MSC-7", "name": "Bob", "year": 2019, "degree": "MSc", "hons": "Merit", "grade": "B+"}),
        certificate("ünï", "Zoë"),
        certificate("BSC 2024/17", "Space Slash"),
    ];

    for body in &cases {
        let response = post_certificate(&client, addr, body).await;
        assert_eq!(response["success"], true, "{}", body);
    }

    for body in &cases {
        let code = body["code"].as_str().unwrap();
        let verified = verify(&client, addr, code).await;
        assert_eq!(verified["valid"], true);
        for field in ["code", "name", "degree", "hons", "grade"] {
            assert_eq!(verified[field], body[field], "{} of {}", field, code);
        }

        let qr = verified["qr"].as_str().unwrap();
        let image = client
            .get(format!("http://{}{}", addr, qr))
            .send()
            .await
            .unwrap();
        assert_eq!(image.status(), reqwest::StatusCode::OK, "{} at {}", code, qr);
        assert_eq!(&image.bytes().await.unwrap()[..4], b"\x89PNG");
    }

    // Numeric years come back as text.
    assert_eq!(verify(&client, addr, "MSC-7").await["year"], "2019");
}

/// Unknown and missing codes are reported as invalid.
#[tokio::test]
async fn test_unknown_code_is_invalid() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_server(test_config(dir.path(), false)).await;
    let client = reqwest::Client::new();

    assert_eq!(verify(&client, addr, "MISSING").await, json!({"valid": false}));

    let bare: Value = client
        .get(format!("http://{}/verify", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(bare, json!({"valid": false}));
}

/// Concurrent issuance keeps every record.
#[tokio::test]
async fn test_concurrent_issuance_loses_nothing() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_server(test_config(dir.path(), false)).await;
    let client = reqwest::Client::new();

    let mut handles = Vec::new();
    for i in 0..25 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            post_certificate(&client, addr, &certificate(&format!("P{}", i), "Parallel")).await
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap()["success"], true);
    }

    let raw = std::fs::read_to_string(dir.path().join("certificates.json")).unwrap();
    let stored: Vec<Value> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stored.len(), 25);

    for i in 0..25 {
        assert_eq!(verify(&client, addr, &format!("P{}", i)).await["valid"], true);
    }
}

/// Records written by an earlier run are visible after a restart.
#[tokio::test]
async fn test_store_survives_restart() {
    let dir = TempDir::new().unwrap();
    let client = reqwest::Client::new();

    let first = spawn_server(test_config(dir.path(), false)).await;
    post_certificate(&client, first, &certificate("KEEP", "Persisted")).await;

    let second = spawn_server(test_config(dir.path(), false)).await;
    let verified = verify(&client, second, "KEEP").await;
    assert_eq!(verified["valid"], true);
    assert_eq!(verified["name"], "Persisted");
}

/// A hand-edited store with numeric fields and extra keys is still readable.
#[tokio::test]
async fn test_reads_existing_store_file() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), false);
    std::fs::write(
        &config.store_path,
        r#"[
  {"code": "OLD1", "name": "Legacy", "year": 2015, "degree": "BA", "hons": "2:1", "grade": "B", "note": "imported"}
]"#,
    )
    .unwrap();
    let addr = spawn_server(config).await;
    let client = reqwest::Client::new();

    assert_eq!(
        verify(&client, addr, "OLD1").await,
        json!({
            "valid": true,
            "code": "OLD1",
            "name": "Legacy",
            "year": "2015",
            "degree": "BA",
            "hons": "2:1",
            "grade": "B"
        })
    );
}

/// Entries that do not fit the record shape survive an append untouched.
#[tokio::test]
async fn test_append_keeps_unfamiliar_entries() {
    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path(), false);
    let store_path = config.store_path.clone();
    std::fs::write(
        &store_path,
        r#"[
  {"code": "OLD1", "name": "Legacy", "year": 2015, "degree": "BA", "hons": "2:1", "grade": "B"},
  {"code": "OLD2", "name": "No Honours", "year": "2016", "degree": "BA", "grade": "C"},
  "stray"
]"#,
    )
    .unwrap();
    let addr = spawn_server(config).await;
    let client = reqwest::Client::new();

    assert_eq!(verify(&client, addr, "OLD1").await["valid"], true);
    let partial = verify(&client, addr, "OLD2").await;
    assert_eq!(partial["valid"], true);
    assert!(partial.get("hons").is_none());

    let response = post_certificate(&client, addr, &certificate("NEW", "Fresh")).await;
    assert_eq!(response["success"], true);

    let stored: Vec<Value> =
        serde_json::from_str(&std::fs::read_to_string(&store_path).unwrap()).unwrap();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[0]["year"], 2015);
    assert_eq!(stored[1]["code"], "OLD2");
    assert_eq!(stored[2], "stray");
    assert_eq!(stored[3]["code"], "NEW");
    assert_eq!(verify(&client, addr, "OLD1").await["name"], "Legacy");
}

/// The homepage comes from the public directory.
#[tokio::test]
async fn test_homepage() {
    let dir = TempDir::new().unwrap();
    let addr = spawn_server(test_config(dir.path(), false)).await;

    let body = reqwest::get(format!("http://{}/", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "<html>registry</html>");
}
