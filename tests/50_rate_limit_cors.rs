mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};

#[tokio::test]
async fn burst_is_enforced_per_client() -> Result<()> {
    let mut config = common::test_config();
    config.limiter.enabled = true;
    config.limiter.rps = 0.01;
    config.limiter.burst = 3;
    let server = common::spawn_server_with(config).await?;

    for _ in 0..3 {
        let res = server.get("/v1/healthcheck").send().await?;
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = server.get("/v1/healthcheck").send().await?;
    let error = common::error_body(res, StatusCode::TOO_MANY_REQUESTS).await?;
    assert_eq!(error, "rate limit exceeded");
    Ok(())
}

#[tokio::test]
async fn disabled_limiter_always_allows() -> Result<()> {
    let mut config = common::test_config();
    config.limiter.burst = 1;
    let server = common::spawn_server_with(config).await?;

    for _ in 0..10 {
        let res = server.get("/v1/healthcheck").send().await?;
        assert_eq!(res.status(), StatusCode::OK);
    }
    Ok(())
}

#[tokio::test]
async fn trusted_origin_preflight() -> Result<()> {
    let mut config = common::test_config();
    config.cors.trusted_origins = vec!["https://www.example.com".to_string()];
    let server = common::spawn_server_with(config).await?;

    let res = server
        .client
        .request(Method::OPTIONS, server.url("/v1/tokens/authentication"))
        .header("Origin", "https://www.example.com")
        .header("Access-Control-Request-Method", "PUT")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    let headers = res.headers();
    assert_eq!(headers.get("access-control-allow-origin").unwrap(), "https://www.example.com");
    assert_eq!(headers.get("access-control-allow-methods").unwrap(), "OPTIONS, PUT, PATCH, DELETE");
    assert_eq!(headers.get("access-control-allow-headers").unwrap(), "Authorization, Content-Type");
    assert_eq!(headers.get("access-control-max-age").unwrap(), "60");

    let vary: Vec<_> = headers.get_all("vary").iter().map(|v| v.to_str().unwrap_or("")).collect();
    assert!(vary.contains(&"Origin"));
    assert!(vary.contains(&"Access-Control-Request-Method"));
    Ok(())
}

#[tokio::test]
async fn untrusted_origin_gets_no_cors_headers() -> Result<()> {
    let mut config = common::test_config();
    config.cors.trusted_origins = vec!["https://www.example.com".to_string()];
    let server = common::spawn_server_with(config).await?;

    let res = server
        .get("/v1/healthcheck")
        .header("Origin", "https://evil.example.com")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().get("access-control-allow-origin").is_none());

    let res = server
        .get("/v1/healthcheck")
        .header("Origin", "https://www.example.com")
        .send()
        .await?;
    assert_eq!(res.headers().get("access-control-allow-origin").unwrap(), "https://www.example.com");
    assert!(res.headers().get("access-control-allow-methods").is_none());
    Ok(())
}
