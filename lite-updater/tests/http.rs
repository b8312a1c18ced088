use httpmock::prelude::*;
use lite_updater::identity::HeaderFields;
use lite_updater::{
    LiteUpdater, MemoryStore, PackageIdentity, PackageKind, ReqwestFetcher, UpdaterConfig,
    UpdaterError,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::Path;

fn updater_for(server_url: &str) -> LiteUpdater<MemoryStore, ReqwestFetcher> {
    let identity = PackageIdentity::from_headers(
        PackageKind::Plugin,
        Path::new("/plugins/my-plugin/my-plugin.php"),
        &HeaderFields::parse(&format!("Version: 1.0.2\nUpdate Server: {}\n", server_url)),
    );

    LiteUpdater::new(
        identity,
        UpdaterConfig::default(),
        MemoryStore::new(),
        ReqwestFetcher::new().unwrap(),
    )
}

#[tokio::test]
async fn fetches_the_manifest_over_http() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/my-plugin.json");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "slug": "my-plugin", "type": "plugin", "version": "1.0.3" }));
        })
        .await;

    let mut updater = updater_for(&server.url("/my-plugin.json"));
    updater.run(&true).await.unwrap();

    mock.assert_async().await;
    assert_eq!(updater.manifest().map(|v| v.version.as_str()), Some("1.0.3"));
}

#[tokio::test]
async fn error_status_body_is_still_decoded() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/my-plugin.json");
            then.status(404)
                .header("content-type", "application/json")
                .json_body(json!({ "error": "Plugin not found" }));
        })
        .await;

    let mut updater = updater_for(&server.url("/my-plugin.json"));
    let err = updater.run(&true).await.unwrap_err();

    mock.assert_async().await;
    assert!(matches!(err, UpdaterError::RepoNoExist));
    assert!(updater.manifest().is_none());
}

#[tokio::test]
async fn html_error_page_is_not_a_manifest() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/my-plugin.json");
            then.status(500).body("<html><body>Internal Server Error</body></html>");
        })
        .await;

    let mut updater = updater_for(&server.url("/my-plugin.json"));
    let err = updater.run(&true).await.unwrap_err();

    assert_eq!(err.code(), "non_json_api_response");
}

#[tokio::test]
async fn refused_connection_is_an_http_client_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let mut updater = updater_for(&format!("http://{}/my-plugin.json", address));
    let err = updater.run(&true).await.unwrap_err();

    assert!(matches!(err, UpdaterError::HttpClientError(_)));
    assert_eq!(err.code(), "http_request_failed");
}
