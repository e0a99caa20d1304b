//! Contract Test: HTTP Remote Fetch
//!
//! Mocks the snapshot service to verify decoding and status mapping without
//! a real server.

use equipzone_core::config::InventorySourceConfig;
use equipzone_core::traits::RemoteFetch;
use equipzone_core::{Error, Inventory};
use equipzone_fetch_http::HttpFetch;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SNAPSHOT: &str = r#"[
    {
        "name": "wgtn-gps.example.com.",
        "ip": "10.1.0.1",
        "reverse": ["10.1.0.1"],
        "mapping": null,
        "aliases": null,
        "place": "Wellington",
        "model": "NetR9",
        "code": "WGTN",
        "latitude": -41.29,
        "longitude": 174.78,
        "height": 21
    },
    {
        "name": "auck-gps.example.com.",
        "ip": "10.2.0.1",
        "reverse": [],
        "mapping": { "logger.example.com.": "10.2.0.9" },
        "aliases": ["logger.example.com."],
        "place": "Auckland",
        "model": "NetR9",
        "code": "AUCK",
        "latitude": -36.85,
        "longitude": 174.76,
        "height": 5
    }
]"#;

async fn serve(status: u16, body: &str) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/devices"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn snapshot_is_decoded_and_sorted() {
    let mock_server = serve(200, SNAPSHOT).await;
    let url = format!("{}/devices", mock_server.uri());

    let inventory = Inventory::load_remote(&HttpFetch::new(), &url)
        .await
        .expect("fetch succeeds");

    assert_eq!(inventory.len(), 2);
    assert_eq!(inventory.devices()[0].name, "auck-gps.example.com.");
    assert!(inventory.devices()[0].has_mapping("logger.example.com.", "10.2.0.9".parse().unwrap()));

    let wgtn = inventory.find("wgtn-gps.example.com.").unwrap();
    assert!(wgtn.aliases.is_empty());
    assert!(wgtn.mapping.is_empty());
    assert_eq!(wgtn.height, 21.0);
}

#[tokio::test]
async fn relative_url_joined_to_server() {
    let mock_server = serve(200, SNAPSHOT).await;
    let address = mock_server.address();

    let source = InventorySourceConfig::Remote {
        url: "/devices".to_string(),
        port: Some(address.port()),
        fetcher: "http".to_string(),
    };
    let url = source.remote_url(&address.ip().to_string()).unwrap();

    let inventory = HttpFetch::new().fetch(&url).await.expect("fetch succeeds");
    assert_eq!(inventory.list_by_code("wgtn").len(), 1);

    // the port may come with the server instead
    let source = InventorySourceConfig::Remote {
        url: "devices".to_string(),
        port: None,
        fetcher: "http".to_string(),
    };
    let url = source.remote_url(&address.to_string()).unwrap();
    assert_eq!(url, format!("{}/devices", mock_server.uri()));

    let inventory = HttpFetch::new().fetch(&url).await.expect("fetch succeeds");
    assert_eq!(inventory.len(), 2);
}

#[tokio::test]
async fn status_codes_are_mapped() {
    let fetch = HttpFetch::new();

    let mock_server = serve(403, "forbidden").await;
    let err = fetch
        .fetch(&format!("{}/devices", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::Fetch(msg) if msg.contains("Authentication")), "{:?}", err);

    let mock_server = serve(503, "maintenance").await;
    let err = fetch
        .fetch(&format!("{}/devices", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(&err, Error::Fetch(msg) if msg.contains("transient")), "{:?}", err);

    let mock_server = serve(200, SNAPSHOT).await;
    let err = fetch
        .fetch(&format!("{}/elsewhere", mock_server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)), "{:?}", err);
}

#[tokio::test]
async fn malformed_body_is_fetch_error() {
    let mock_server = serve(200, r#"{"devices": "nope"}"#).await;

    let err = HttpFetch::new()
        .fetch(&format!("{}/devices", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Fetch(_)), "{:?}", err);
}
