//! Download engine behavior against a mock image server

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gallica_fetcher::app::client::{Archive, ClientConfig, CookieSnapshot};
use gallica_fetcher::app::models::DownloadJob;
use gallica_fetcher::app::worker::{DownloadEngine, RetryPolicy, WorkerConfig};
use gallica_fetcher::app::workspace::partial_path;
use gallica_fetcher::errors::DownloadError;

const PAGE_BYTES: usize = 60_000;

fn client_for(server: &MockServer) -> ClientConfig {
    ClientConfig {
        archive: Archive::new(&server.uri()).unwrap(),
        ..Default::default()
    }
}

fn fast_config(workers: usize) -> WorkerConfig {
    WorkerConfig {
        worker_count: workers,
        retry: RetryPolicy {
            max_attempts: 8,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: Duration::ZERO,
        },
        ..Default::default()
    }
}

fn jobs(server: &MockServer, dir: &Path, count: usize) -> Vec<DownloadJob> {
    (1..=count)
        .map(|ordinal| {
            DownloadJob::new(
                ordinal,
                format!("{}/img/{}.jpg", server.uri(), ordinal),
                dir.join(format!("page_{:04}.jpg", ordinal)),
            )
        })
        .collect()
}

async fn mount_pages(server: &MockServer, count: usize) {
    for ordinal in 1..=count {
        Mock::given(method("GET"))
            .and(path(format!("/img/{}.jpg", ordinal)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![ordinal as u8; PAGE_BYTES]))
            .mount(server)
            .await;
    }
}

async fn request_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| request.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn second_run_issues_no_requests() {
    let server = MockServer::start().await;
    mount_pages(&server, 5).await;
    let temp_dir = TempDir::new().unwrap();

    let engine = DownloadEngine::new(fast_config(3), client_for(&server)).unwrap();
    let first = engine
        .run(jobs(&server, temp_dir.path(), 5), &CookieSnapshot::default())
        .await
        .unwrap();
    assert_eq!(first.downloaded, 5);
    assert_eq!(first.skipped, 0);
    assert_eq!(first.requests, 5);
    assert_eq!(first.bytes, (5 * PAGE_BYTES) as u64);

    let second = engine
        .run(jobs(&server, temp_dir.path(), 5), &CookieSnapshot::default())
        .await
        .unwrap();
    assert_eq!(second.downloaded, 0);
    assert_eq!(second.skipped, 5);
    assert_eq!(second.requests, 0);
    assert_eq!(request_paths(&server).await.len(), 5);

    for job in jobs(&server, temp_dir.path(), 5) {
        assert_eq!(std::fs::metadata(&job.destination).unwrap().len(), PAGE_BYTES as u64);
        assert!(!partial_path(&job.destination).exists());
    }
}

#[tokio::test]
async fn undersized_page_is_fetched_again() {
    let server = MockServer::start().await;
    mount_pages(&server, 1).await;
    let temp_dir = TempDir::new().unwrap();
    let jobs = jobs(&server, temp_dir.path(), 1);
    std::fs::write(&jobs[0].destination, b"truncated").unwrap();

    let engine = DownloadEngine::new(fast_config(1), client_for(&server)).unwrap();
    let summary = engine.run(jobs.clone(), &CookieSnapshot::default()).await.unwrap();
    assert_eq!(summary.downloaded, 1);
    assert_eq!(
        std::fs::metadata(&jobs[0].destination).unwrap().len(),
        PAGE_BYTES as u64
    );
}

#[tokio::test]
async fn throttled_page_stops_after_eight_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .respond_with(ResponseTemplate::new(503))
        .expect(8)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();
    let jobs = jobs(&server, temp_dir.path(), 1);

    let engine = DownloadEngine::new(fast_config(1), client_for(&server)).unwrap();
    let result = engine.run(jobs.clone(), &CookieSnapshot::default()).await;

    match result {
        Err(DownloadError::MaxRetriesExceeded { attempts, url }) => {
            assert_eq!(attempts, 8);
            assert!(url.ends_with("/img/1.jpg"));
        }
        other => panic!("Expected MaxRetriesExceeded, got {:?}", other),
    }
    assert!(!jobs[0].destination.exists());
    assert!(!partial_path(&jobs[0].destination).exists());
}

#[tokio::test]
async fn throttling_then_success_recovers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&server)
        .await;
    mount_pages(&server, 1).await;
    let temp_dir = TempDir::new().unwrap();

    let engine = DownloadEngine::new(fast_config(1), client_for(&server)).unwrap();
    let summary = engine
        .run(jobs(&server, temp_dir.path(), 1), &CookieSnapshot::default())
        .await
        .unwrap();
    assert_eq!(summary.downloaded, 1);
    assert_eq!(summary.requests, 3);
}

#[tokio::test]
async fn non_retryable_status_fails_immediately() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();

    let engine = DownloadEngine::new(fast_config(1), client_for(&server)).unwrap();
    let result = engine
        .run(jobs(&server, temp_dir.path(), 1), &CookieSnapshot::default())
        .await;
    assert!(matches!(
        result,
        Err(DownloadError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn failed_page_does_not_stop_the_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/2.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .with_priority(1)
        .mount(&server)
        .await;
    mount_pages(&server, 4).await;
    let temp_dir = TempDir::new().unwrap();
    let jobs = jobs(&server, temp_dir.path(), 4);

    let engine = DownloadEngine::new(fast_config(2), client_for(&server)).unwrap();
    let result = engine.run(jobs.clone(), &CookieSnapshot::default()).await;
    assert!(matches!(
        result,
        Err(DownloadError::Status { status: 500, .. })
    ));

    let present: Vec<PathBuf> = jobs
        .iter()
        .map(|job| job.destination.clone())
        .filter(|path| path.exists())
        .collect();
    assert_eq!(
        present,
        vec![
            jobs[0].destination.clone(),
            jobs[2].destination.clone(),
            jobs[3].destination.clone()
        ]
    );
}

#[tokio::test]
async fn single_worker_fetches_in_page_order() {
    let server = MockServer::start().await;
    mount_pages(&server, 6).await;
    let temp_dir = TempDir::new().unwrap();

    let engine = DownloadEngine::new(fast_config(1), client_for(&server)).unwrap();
    let summary = engine
        .run(jobs(&server, temp_dir.path(), 6), &CookieSnapshot::default())
        .await
        .unwrap();
    assert_eq!(summary.requests, 6);

    let expected: Vec<String> = (1..=6).map(|n| format!("/img/{}.jpg", n)).collect();
    assert_eq!(request_paths(&server).await, expected);
}

#[tokio::test]
async fn workers_present_the_shared_cookies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("cookie", "JSESSIONID=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; PAGE_BYTES]))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .with_priority(10)
        .mount(&server)
        .await;
    let temp_dir = TempDir::new().unwrap();

    let engine = DownloadEngine::new(fast_config(2), client_for(&server)).unwrap();
    let summary = engine
        .run(
            jobs(&server, temp_dir.path(), 3),
            &CookieSnapshot::from_header("JSESSIONID=abc123"),
        )
        .await
        .unwrap();
    assert_eq!(summary.downloaded, 3);
}
