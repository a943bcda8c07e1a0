mod common;

use axum::{Router, routing::get};
use axum_test::TestServer;
use common::{MockConnectInfoLayer, TestBackends, wait_until};
use shorty::api::handlers::redirect_handler;
use shorty::state::AppState;

fn server(state: AppState) -> TestServer {
    let app = Router::new()
        .route("/{code}", get(redirect_handler))
        .layer(MockConnectInfoLayer)
        .with_state(state);

    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_redirect_success() {
    let backends = TestBackends::new();
    let state = backends.state();
    let link = state
        .shortener
        .shorten(Some(1), "https://example.com/target")
        .await
        .unwrap();

    let server = server(state);
    let response = server.get(&format!("/{}", link.short_code)).await;

    assert_eq!(response.status_code(), 302);
    let location = response.header("location");
    assert_eq!(location, "https://example.com/target");
}

#[tokio::test]
async fn test_redirect_not_found() {
    let backends = TestBackends::new();
    let server = server(backends.state());

    let response = server.get("/notfound").await;

    response.assert_status_not_found();
    let json = response.json::<serde_json::Value>();
    assert_eq!(json["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_redirect_publishes_click() {
    let backends = TestBackends::new();
    let state = backends.state();
    let link = state
        .shortener
        .shorten(None, "https://example.com")
        .await
        .unwrap();

    let server = server(state);
    server
        .get(&format!("/{}", link.short_code))
        .add_header("User-Agent", "TestBot/1.0")
        .await
        .assert_status(axum::http::StatusCode::FOUND);

    assert!(wait_until(|| backends.broker.published() == 1).await);
}

#[tokio::test]
async fn test_redirect_survives_broker_outage() {
    let backends = TestBackends::new();
    let state = backends.state();
    let link = state
        .shortener
        .shorten(None, "https://example.com/down")
        .await
        .unwrap();
    backends.broker.set_down(true);

    let server = server(state);
    let response = server.get(&format!("/{}", link.short_code)).await;

    assert_eq!(response.status_code(), 302);
    assert!(wait_until(|| backends.broker.publish_attempts() == 1).await);
    assert_eq!(backends.broker.published(), 0);
}

#[tokio::test]
async fn test_redirect_served_from_cache_when_store_down() {
    let backends = TestBackends::new();
    let state = backends.state();
    let link = state
        .shortener
        .shorten(Some(4), "https://example.com/cached")
        .await
        .unwrap();
    backends.links.set_down(true);

    let server = server(state);
    let response = server.get(&format!("/{}", link.short_code)).await;

    assert_eq!(response.status_code(), 302);
}

#[tokio::test]
async fn test_redirect_store_outage_on_cache_miss() {
    let backends = TestBackends::new();
    backends.links.set_down(true);
    let server = server(backends.state());

    let response = server.get("/c4ed1c21").await;

    assert_eq!(response.status_code(), 503);
}
