use std::path::Path;

use axum::{http::StatusCode, routing::post, Router};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tempfile::TempDir;

use antiplag::config::{parse_config, Config};
use antiplag::server::{router, ServeMode};
use antiplag::services::Services;

const PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-image";

fn test_config(root: &Path, extra: &str) -> Config {
    let content = format!(
        r#"[db]
path = "{root}/antiplag.sqlite"

[storage]
upload_dir = "{root}/uploads"
max_upload_bytes = 1024

[analysis]
wordcloud_dir = "{root}/wordclouds"
{extra}
"#,
        root = root.display(),
        extra = extra
    );
    parse_config(&content).unwrap()
}

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn start(config: &Config, mode: ServeMode) -> String {
    let services = Services::build(config).await.unwrap();
    spawn(router(config, &services, mode)).await
}

/// A QuickChart stand-in answering every render with `status` and `body`.
async fn fake_renderer(status: StatusCode, body: &'static [u8]) -> String {
    let app = Router::new().route(
        "/wordcloud",
        post(move || async move { (status, body.to_vec()) }),
    );
    format!("{}/wordcloud", spawn(app).await)
}

async fn upload(base: &str, name: &str, content: &[u8]) -> reqwest::Response {
    let form = Form::new().part(
        "file",
        Part::bytes(content.to_vec()).file_name(name.to_string()),
    );
    reqwest::Client::new()
        .post(format!("{}/files/upload", base))
        .multipart(form)
        .send()
        .await
        .unwrap()
}

async fn error_code(resp: reqwest::Response) -> String {
    let body: Value = resp.json().await.unwrap();
    body["error"]["code"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn test_upload_dedup_status_codes() {
    let tmp = TempDir::new().unwrap();
    let base = start(&test_config(tmp.path(), ""), ServeMode::Storage).await;

    let first = upload(&base, "a.txt", b"hello\nworld\n").await;
    assert_eq!(first.status(), StatusCode::CREATED);
    let first: Value = first.json().await.unwrap();
    assert_eq!(first["id"], 1);

    let second = upload(&base, "b.txt", b"hello\nworld\n").await;
    assert_eq!(second.status(), StatusCode::OK);
    let second: Value = second.json().await.unwrap();
    assert_eq!(second["id"], 1);

    let third = upload(&base, "c.txt", b"something else").await;
    assert_eq!(third.status(), StatusCode::CREATED);
    let third: Value = third.json().await.unwrap();
    assert_eq!(third["id"], 2);
}

#[tokio::test]
async fn test_upload_validation() {
    let tmp = TempDir::new().unwrap();
    let base = start(&test_config(tmp.path(), ""), ServeMode::Storage).await;

    let resp = upload(&base, "notes.md", b"text").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code(resp).await, "bad_request");

    let resp = upload(&base, "empty.txt", b"").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = upload(&base, "big.txt", &[b'x'; 2048]).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(error_code(resp).await, "payload_too_large");

    let form = Form::new().text("other", "value");
    let resp = reqwest::Client::new()
        .post(format!("{}/files/upload", base))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_file_and_duplicate_query() {
    let tmp = TempDir::new().unwrap();
    let base = start(&test_config(tmp.path(), ""), ServeMode::Storage).await;
    upload(&base, "essay.txt", b"Alpha beta\n").await;

    let resp = reqwest::get(format!("{}/files/1", base)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers()["content-disposition"],
        "attachment; filename=\"essay.txt\""
    );
    assert_eq!(resp.bytes().await.unwrap().as_ref(), b"Alpha beta\n");

    let resp = reqwest::get(format!("{}/files/plagiarism/1", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert!(body["plagiarismFileId"].is_null());

    for path in ["/files/9", "/files/plagiarism/9"] {
        let resp = reqwest::get(format!("{}{}", base, path)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", path);
        assert_eq!(error_code(resp).await, "not_found");
    }

    let resp = reqwest::get(format!("{}/files/abc", base)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_combined_mode_analysis_is_cached() {
    let tmp = TempDir::new().unwrap();
    let base = start(&test_config(tmp.path(), ""), ServeMode::All).await;
    upload(&base, "essay.txt", b"Alpha beta\n\nGamma\n\nDelta epsilon zeta\n").await;

    let first: Value = reqwest::get(format!("{}/analysis/1", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["paragraphCount"], 3);
    assert_eq!(first["wordCount"], 6);
    assert_eq!(first["characterCount"], 33);
    assert!(first["plagiarismFileId"].is_null());
    assert!(first["wordCloudPath"].is_null());

    let second: Value = reqwest::get(format!("{}/analysis/1", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first, second);

    let resp = reqwest::get(format!("{}/analysis/5", base)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let health: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "ok");
}

#[tokio::test]
async fn test_analysis_reads_from_remote_storage() {
    let storage_tmp = TempDir::new().unwrap();
    let storage_base = start(&test_config(storage_tmp.path(), ""), ServeMode::Storage).await;
    upload(&storage_base, "a.txt", b"hello\nworld\n").await;

    let analysis_tmp = TempDir::new().unwrap();
    let analysis_config = test_config(
        analysis_tmp.path(),
        &format!("storage_url = \"{}\"", storage_base),
    );
    let analysis_base = start(&analysis_config, ServeMode::Analysis).await;

    let record: Value = reqwest::get(format!("{}/analysis/1", analysis_base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(record["fileId"], 1);
    assert_eq!(record["paragraphCount"], 1);
    assert_eq!(record["wordCount"], 2);
    assert_eq!(record["characterCount"], 10);

    // Unknown on the storage side is unknown here too.
    let resp = reqwest::get(format!("{}/analysis/7", analysis_base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    // The analysis process serves no storage routes.
    let resp = reqwest::get(format!("{}/files/1", analysis_base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unreachable_storage_is_internal_error() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(tmp.path(), "storage_url = \"http://127.0.0.1:9\"");
    let base = start(&config, ServeMode::Analysis).await;

    let resp = reqwest::get(format!("{}/analysis/1", base)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(error_code(resp).await, "internal");
}

#[tokio::test]
async fn test_word_cloud_artifact_is_served() {
    let renderer_url = fake_renderer(StatusCode::OK, PNG).await;
    let tmp = TempDir::new().unwrap();
    let config = test_config(
        tmp.path(),
        &format!("\n[wordcloud]\nprovider = \"quickchart\"\nurl = \"{}\"", renderer_url),
    );
    let base = start(&config, ServeMode::All).await;
    upload(&base, "a.txt", b"some words for a cloud\n").await;

    let record: Value = reqwest::get(format!("{}/analysis/1", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let name = record["wordCloudPath"].as_str().unwrap().to_string();
    assert!(name.ends_with(".png"));
    assert!(tmp.path().join("wordclouds").join(&name).exists());

    let resp = reqwest::get(format!("{}/analysis/wordcloud/{}", base, name))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "image/png");
    assert_eq!(resp.bytes().await.unwrap().as_ref(), PNG);

    let resp = reqwest::get(format!("{}/analysis/wordcloud/missing.png", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = reqwest::get(format!("{}/analysis/wordcloud/..antiplag.sqlite", base))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_renderer_failures_do_not_fail_analysis() {
    for (status, body) in [
        (StatusCode::OK, &b""[..]),
        (StatusCode::INTERNAL_SERVER_ERROR, &b"boom"[..]),
    ] {
        let renderer_url = fake_renderer(status, body).await;
        let tmp = TempDir::new().unwrap();
        let config = test_config(
            tmp.path(),
            &format!("\n[wordcloud]\nprovider = \"quickchart\"\nurl = \"{}\"", renderer_url),
        );
        let base = start(&config, ServeMode::All).await;
        upload(&base, "a.txt", b"hello\nworld\n").await;

        let resp = reqwest::get(format!("{}/analysis/1", base)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK, "renderer status {}", status);
        let record: Value = resp.json().await.unwrap();
        assert_eq!(record["wordCount"], 2);
        assert!(record["wordCloudPath"].is_null());
    }
}
