//! E2E tests for health check, CORS and metrics

mod common;

use common::TestServer;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new(vec![]).await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_cors_allows_configured_origin() {
    let server = TestServer::new(vec![]).await;

    let response = server
        .client
        .get(server.url("/health"))
        .header("Origin", "https://blog.example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response.headers()["access-control-allow-origin"],
        "https://blog.example.com"
    );
    assert_eq!(
        response.headers()["access-control-allow-credentials"],
        "true"
    );
}

#[tokio::test]
async fn test_cors_ignores_unknown_origin() {
    let server = TestServer::new(vec![]).await;

    let response = server
        .client
        .get(server.url("/health"))
        .header("Origin", "https://evil.example.com")
        .send()
        .await
        .unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_404_for_unknown_routes() {
    let server = TestServer::new(vec![]).await;

    let response = server
        .client
        .get(server.url("/unknown/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_metrics_endpoint() {
    retoots::metrics::init_metrics();
    let server = TestServer::new(vec![]).await;

    // Produce at least one labelled sample
    let response = server
        .client
        .get(server.url("/api/v1/descendants"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("retoots_errors_total"));
}
