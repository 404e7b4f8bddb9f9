//! `UreqDownloader` + retry loop against a local HTTP stub.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::time::Duration;

use sealights_inject::application::ports::{DownloadRequest, Sleeper};
use sealights_inject::application::services::fetch::fetch_with_retry;
use sealights_inject::domain::FetchError;
use sealights_inject::infra::http::UreqDownloader;

use crate::http_stub::HttpStub;

struct NoSleep;

impl Sleeper for NoSleep {
    fn sleep(&self, _: Duration) {}
}

#[test]
fn test_server_error_exhausts_all_attempts() {
    let stub = HttpStub::serve(500, b"boom".to_vec());
    let dir = tempfile::tempdir().unwrap();
    let url = stub.url("/agent.tar.gz");
    let dest = dir.path().join("agent.tar.gz");
    let request = DownloadRequest {
        url: &url,
        dest: &dest,
        proxy: None,
    };

    let err = fetch_with_retry(
        &UreqDownloader::default(),
        &NoSleep,
        &request,
        3,
        Duration::ZERO,
    )
    .unwrap_err();

    assert!(matches!(err, FetchError::Status { status: 500, .. }), "got: {err}");
    assert_eq!(stub.hits(), 3);
}

#[test]
fn test_success_writes_body_to_destination() {
    let stub = HttpStub::serve(200, b"archive-bytes".to_vec());
    let dir = tempfile::tempdir().unwrap();
    let url = stub.url("/agent.tar.gz");
    let dest = dir.path().join("nested").join("agent.tar.gz");
    let request = DownloadRequest {
        url: &url,
        dest: &dest,
        proxy: None,
    };

    fetch_with_retry(
        &UreqDownloader::default(),
        &NoSleep,
        &request,
        3,
        Duration::ZERO,
    )
    .unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"archive-bytes");
    assert_eq!(stub.hits(), 1);
}

#[test]
fn test_connection_refused_is_transport_error() {
    // bind then drop to get a port nobody listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let dir = tempfile::tempdir().unwrap();
    let url = format!("http://127.0.0.1:{port}/agent.tar.gz");
    let dest = dir.path().join("agent.tar.gz");
    let request = DownloadRequest {
        url: &url,
        dest: &dest,
        proxy: None,
    };

    let err = fetch_with_retry(
        &UreqDownloader::new(Duration::from_secs(5)),
        &NoSleep,
        &request,
        1,
        Duration::ZERO,
    )
    .unwrap_err();

    assert!(matches!(err, FetchError::Transport { .. }), "got: {err}");
    assert!(!dest.exists());
}
