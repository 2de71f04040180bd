mod common;

use anyhow::Result;
use reqwest::StatusCode;

#[tokio::test]
async fn healthcheck_reports_environment() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.get("/v1/healthcheck").send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let vary: Vec<_> = res.headers().get_all("vary").iter().collect();
    assert!(vary.iter().any(|v| *v == "Authorization"), "vary: {:?}", vary);

    let body = res.json::<serde_json::Value>().await?;
    assert_eq!(body["status"], "available");
    assert_eq!(body["system_info"]["environment"], "development");
    assert!(body["system_info"]["version"].is_string());
    Ok(())
}

#[tokio::test]
async fn unknown_route_uses_error_envelope() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.get("/v1/nothing-here").send().await?;
    let error = common::error_body(res, StatusCode::NOT_FOUND).await?;
    assert_eq!(error, "the requested resource could not be found");
    Ok(())
}

#[tokio::test]
async fn healthcheck_is_open_to_anonymous_but_not_to_bad_tokens() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server
        .get("/v1/healthcheck")
        .header("Authorization", "Bearer not-a-real-token")
        .send()
        .await?;

    assert_eq!(res.headers().get("www-authenticate").unwrap(), "Bearer");
    let error = common::error_body(res, StatusCode::UNAUTHORIZED).await?;
    assert_eq!(error, "invalid authentication token");
    Ok(())
}

#[tokio::test]
async fn empty_authorization_header_is_anonymous() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.get("/v1/healthcheck").header("Authorization", "").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn unsupported_method_uses_error_envelope() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.put("/v1/healthcheck").send().await?;
    assert!(res.headers().get("allow").is_some());
    let error = common::error_body(res, StatusCode::METHOD_NOT_ALLOWED).await?;
    assert_eq!(error, "the PUT method is not supported for this resource");
    Ok(())
}

#[tokio::test]
async fn metrics_count_every_response() -> Result<()> {
    let server = common::spawn_server().await?;

    server.get("/v1/healthcheck").send().await?;
    server.get("/v1/nothing-here").send().await?;

    let res = server.get("/v1/metrics").send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await?;
    assert!(body.contains("greenlight_responses_sent_total 2"), "{}", body);
    assert!(body.contains("greenlight_responses_sent_by_status_total{status=\"404\"} 1"), "{}", body);
    assert!(body.contains("greenlight_processing_time_microseconds_total"), "{}", body);
    Ok(())
}
