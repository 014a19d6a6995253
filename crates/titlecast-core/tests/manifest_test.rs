//! Integration tests for required-actions manifest loading from both
//! supported origins: local files and HTTP.

#![allow(clippy::unwrap_used)]

use std::io::Write;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use titlecast_core::RequiredActionSet;
use titlecast_core::error::CoreError;

const MANIFEST: &str = "Titlecast | Fetch Broadcasts\n\
    Titlecast | Update All Broadcasts\n\
    Titlecast | Update Twitch Title\n\
    Titlecast | Update YouTube Title\n";

#[tokio::test]
async fn loads_from_a_local_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(MANIFEST.as_bytes()).unwrap();

    let set = RequiredActionSet::load(file.path().to_str().unwrap())
        .await
        .unwrap();
    assert_eq!(set.len(), 4);
    assert_eq!(set.names()[0], "Titlecast | Fetch Broadcasts");
}

#[tokio::test]
async fn missing_file_reports_its_origin() {
    let err = RequiredActionSet::load("/nonexistent/required_actions.txt")
        .await
        .unwrap_err();
    match err {
        CoreError::ManifestLoad { origin, .. } => {
            assert_eq!(origin, "/nonexistent/required_actions.txt");
        }
        other => panic!("expected ManifestLoad, got {other:?}"),
    }
}

#[tokio::test]
async fn loads_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/required_actions.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(MANIFEST))
        .mount(&server)
        .await;

    let origin = format!("{}/required_actions.txt", server.uri());
    let set = RequiredActionSet::load(&origin).await.unwrap();
    assert_eq!(set.len(), 4);
}

#[tokio::test]
async fn http_error_status_fails_the_load() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/required_actions.txt"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let origin = format!("{}/required_actions.txt", server.uri());
    let err = RequiredActionSet::load(&origin).await.unwrap_err();
    assert!(matches!(err, CoreError::ManifestLoad { .. }));
}
