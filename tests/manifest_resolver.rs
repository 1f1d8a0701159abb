//! Manifest discovery strategies against a mock archive

use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gallica_fetcher::app::client::{Archive, ClientConfig, CookieSnapshot, Session};
use gallica_fetcher::app::manifest::{ManifestConfig, ManifestResolver};
use gallica_fetcher::app::models::{DocumentId, DownloadJob};
use gallica_fetcher::app::worker::{DownloadEngine, WorkerConfig};
use gallica_fetcher::errors::ManifestError;

const ARK: &str = "bpt6k000test";

fn session(server: &MockServer) -> Session {
    ClientConfig {
        archive: Archive::new(&server.uri()).unwrap(),
        ..Default::default()
    }
    .build_session(&CookieSnapshot::default())
    .unwrap()
}

fn fast_config() -> ManifestConfig {
    ManifestConfig {
        warmup_rounds: 3,
        warmup_base_delay: Duration::from_millis(1),
    }
}

fn id() -> DocumentId {
    DocumentId::from_bare(ARK).unwrap()
}

fn manifest_path() -> String {
    format!("/iiif/ark:/12148/{}/manifest.json", ARK)
}

fn first_viewer() -> String {
    format!("/ark:/12148/{}/f1.item", ARK)
}

fn second_viewer() -> String {
    format!("/ark:/12148/{}", ARK)
}

fn two_page_manifest() -> serde_json::Value {
    json!({
        "label": "Found",
        "items": [
            { "id": "c1", "items": [{ "items": [{ "body": { "service": [{ "id": "https://img/f1" }] } }] }] },
            { "id": "c2", "items": [{ "items": [{ "body": { "service": [{ "id": "https://img/f2" }] } }] }] }
        ]
    })
}

async fn count_requests(server: &MockServer, wanted: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == wanted)
        .count()
}

#[tokio::test]
async fn direct_not_found_fails_without_fallbacks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(manifest_path()))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .with_priority(10)
        .expect(0)
        .mount(&server)
        .await;

    let session = session(&server);
    let result = ManifestResolver::new(&session, fast_config())
        .resolve(&id())
        .await;

    match result {
        Err(ManifestError::Status { status, url }) => {
            assert_eq!(status, 404);
            assert!(url.ends_with(&manifest_path()));
        }
        other => panic!("Expected Status, got {:?}", other.map(|m| m.canvases().len())),
    }
}

#[tokio::test]
async fn manifest_recovered_in_second_warmup_round() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(manifest_path()))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(manifest_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_page_manifest()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .with_priority(10)
        .mount(&server)
        .await;

    let session = session(&server);
    let manifest = ManifestResolver::new(&session, fast_config())
        .resolve(&id())
        .await
        .unwrap();

    assert_eq!(manifest.canvases().len(), 2);
    assert_eq!(manifest.label(), Some("Found"));
    assert_eq!(count_requests(&server, &manifest_path()).await, 3);
    // One warm-up per round, no scraping
    assert_eq!(count_requests(&server, &first_viewer()).await, 2);
    assert_eq!(count_requests(&server, &second_viewer()).await, 0);
}

#[tokio::test]
async fn relative_manifest_link_is_scraped() {
    let server = MockServer::start().await;
    let alternative = format!("/iiif/ark:/12148/{}/alt/manifest.json", ARK);
    Mock::given(method("GET"))
        .and(path(manifest_path()))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(first_viewer()))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<html><body><a href="{}">IIIF</a></body></html>"#,
            alternative
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(alternative.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_page_manifest()))
        .expect(1)
        .mount(&server)
        .await;

    let session = session(&server);
    let manifest = ManifestResolver::new(&session, fast_config())
        .resolve(&id())
        .await
        .unwrap();

    assert_eq!(manifest.canvases().len(), 2);
    assert_eq!(count_requests(&server, &manifest_path()).await, 4);
    assert_eq!(count_requests(&server, &second_viewer()).await, 0);
}

#[tokio::test]
async fn failing_first_viewer_falls_through_to_document_page() {
    let server = MockServer::start().await;
    let alternative = format!("/iiif/ark:/12148/{}/v2/manifest.json", ARK);
    Mock::given(method("GET"))
        .and(path(manifest_path()))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(first_viewer()))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(second_viewer()))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<script>var manifest = "{}{}";</script>"#,
            server.uri(),
            alternative
        )))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(alternative))
        .respond_with(ResponseTemplate::new(200).set_body_json(two_page_manifest()))
        .mount(&server)
        .await;

    let session = session(&server);
    let manifest = ManifestResolver::new(&session, fast_config())
        .resolve(&id())
        .await
        .unwrap();

    assert_eq!(manifest.canvases().len(), 2);
    // Three warm-up rounds plus one scrape attempt
    assert_eq!(count_requests(&server, &first_viewer()).await, 4);
}

#[tokio::test]
async fn manifest_cookie_on_narrow_path_reaches_workers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(manifest_path()))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "IIIFTOKEN=t1; Path=/iiif")
                .set_body_json(two_page_manifest()),
        )
        .mount(&server)
        .await;

    let master = session(&server);
    ManifestResolver::new(&master, fast_config())
        .resolve(&id())
        .await
        .unwrap();

    let snapshot = master.cookie_snapshot();
    assert_eq!(snapshot.get("IIIFTOKEN"), Some("t1"));

    let image_path = format!("/iiif/ark:/12148/{}/f1/full/2000,/0/default.jpg", ARK);
    Mock::given(method("GET"))
        .and(path(image_path.clone()))
        .and(header("cookie", "IIIFTOKEN=t1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1u8; 60_000]))
        .expect(1)
        .mount(&server)
        .await;

    let temp_dir = TempDir::new().unwrap();
    let job = DownloadJob::new(
        1,
        format!("{}{}", server.uri(), image_path),
        temp_dir.path().join("page_0001.jpg"),
    );
    let client = ClientConfig {
        archive: Archive::new(&server.uri()).unwrap(),
        ..Default::default()
    };
    let engine = DownloadEngine::new(WorkerConfig::default(), client).unwrap();
    let summary = engine.run(vec![job], &snapshot).await.unwrap();
    assert_eq!(summary.downloaded, 1);
}
