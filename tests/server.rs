//! HTTP API tests against an in-process server on an ephemeral port.

mod common;

use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

use chart_catalog::config::parse_config;
use chart_catalog::server::{router, run_server, AppState, REGION_HEADER};
use chart_catalog::service::CatalogService;
use common::setup_repository;

struct TestServer {
    base: String,
    service: Arc<CatalogService>,
    _tmp: TempDir,
}

async fn start_server() -> TestServer {
    let (tmp, config) = setup_repository();
    let service = Arc::new(CatalogService::from_config(&config));
    for result in service.load_all() {
        result.unwrap();
    }

    let app = router(AppState::new(service.clone(), config.regions.clone()));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        service,
        _tmp: tmp,
    }
}

async fn get(url: String, region: Option<&str>) -> (u16, Value) {
    let client = reqwest::Client::new();
    let mut request = client.get(url);
    if let Some(region) = region {
        request = request.header(REGION_HEADER, region);
    }
    let response = request.send().await.unwrap();
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.unwrap();
    (status, body)
}

fn catalog_ids(body: &Value) -> Vec<&str> {
    body["catalogs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health() {
    let server = start_server().await;
    let (status, body) = get(format!("{}/health", server.base), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_listing_defaults_to_first_region() {
    let server = start_server().await;
    let (status, body) = get(format!("{}/public/catalogs", server.base), None).await;
    assert_eq!(status, 200);
    assert_eq!(catalog_ids(&body), vec!["datascience"]);

    let summary = &body["catalogs"][0];
    assert_eq!(summary["name"], "Datascience");
    assert_eq!(summary["type"], "helm");
    assert_eq!(summary["status"], "PROD");
    assert_eq!(
        summary["excludedCharts"],
        serde_json::json!(["excludeme", "excludemetoo"])
    );
    assert!(summary["lastUpdateTime"].is_string());
    assert!(summary.get("entries").is_none());
}

#[tokio::test]
async fn test_listing_by_region_header() {
    let server = start_server().await;

    let (status, body) = get(format!("{}/public/catalogs", server.base), Some("legacy")).await;
    assert_eq!(status, 200);
    assert!(catalog_ids(&body).is_empty());

    let (status, body) = get(format!("{}/public/catalog", server.base), Some("paris")).await;
    assert_eq!(status, 200);
    assert_eq!(catalog_ids(&body), vec!["datascience"]);

    let (status, body) = get(format!("{}/public/catalogs", server.base), Some("mars")).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_catalog_detail() {
    let server = start_server().await;
    let (status, body) = get(
        format!("{}/public/catalogs/datascience", server.base),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], "datascience");
    assert_eq!(body["entries"]["keepme"].as_array().unwrap().len(), 2);
    assert!(body["entries"].get("excludeme").is_none());
    assert_eq!(body["packages"].as_array().unwrap().len(), 1);

    // Catalog bodies are served as stored, without the onyxia block.
    assert!(body["packages"][0]["config"]["properties"]
        .get("onyxia")
        .is_none());

    // Universe catalogs are hidden from listings but reachable by id.
    let (status, body) = get(format!("{}/public/catalog/universe", server.base), None).await;
    assert_eq!(status, 200);
    assert_eq!(body["packages"][0]["name"], "spark");
}

#[tokio::test]
async fn test_package_is_augmented() {
    let server = start_server().await;
    let (status, body) = get(
        format!("{}/public/catalogs/datascience/KEEPME", server.base),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["version"], "3.0.0");

    let onyxia = &body["config"]["properties"]["onyxia"];
    assert_eq!(onyxia["properties"]["friendlyName"]["default"], "keepme");
    assert_eq!(
        onyxia["properties"]["owner"]["x-onyxia"]["overwriteDefaultWith"],
        "{{user.idep}}"
    );
    assert!(body["config"]["properties"]["service"].is_object());

    // The stored package is left alone.
    let stored = server.service.get_package("datascience", "keepme").unwrap();
    assert!(stored.config().property("onyxia").is_none());
}

#[tokio::test]
async fn test_chart_versions_are_augmented() {
    let server = start_server().await;

    let (status, body) = get(
        format!("{}/public/catalogs/datascience/charts/keepme", server.base),
        None,
    )
    .await;
    assert_eq!(status, 200);
    let versions = body.as_array().unwrap();
    assert_eq!(versions.len(), 2);
    assert!(versions
        .iter()
        .all(|v| v["config"]["properties"]["onyxia"].is_object()));

    let (status, body) = get(
        format!(
            "{}/public/catalog/datascience/charts/keepme/versions/2.0.0",
            server.base
        ),
        None,
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["version"], "2.0.0");
    assert_eq!(
        body["config"]["properties"]["onyxia"]["properties"]["share"]["default"],
        false
    );
}

#[tokio::test]
async fn test_not_found_errors() {
    let server = start_server().await;
    let cases = [
        "/public/catalogs/nope",
        "/public/catalogs/datascience/rstudio",
        "/public/catalogs/datascience/excludeme",
        "/public/catalogs/datascience/charts/rstudio",
        "/public/catalogs/datascience/charts/keepme/versions/1.0.0",
    ];
    for path in cases {
        let (status, body) = get(format!("{}{}", server.base, path), None).await;
        assert_eq!(status, 404, "{}", path);
        assert_eq!(body["error"]["code"], "not_found", "{}", path);
        assert!(body["error"]["message"].is_string());
    }
}

#[tokio::test]
async fn test_run_server_bind_failure_returns_error() {
    // Keep the port busy so the server cannot bind it.
    let blocker = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = blocker.local_addr().unwrap();

    // Nothing listens on port 1: the index fetch fails after the HTTP
    // client has been built and used.
    let config = parse_config(&format!(
        r#"[server]
bind = "{}"
refresh_interval_secs = 60

[fetch]
timeout_secs = 2

[[catalogs]]
id = "remote"
location = "http://127.0.0.1:1/charts"
"#,
        addr
    ))
    .unwrap();

    let result = run_server(&config).await;
    assert!(result.is_err());
}
