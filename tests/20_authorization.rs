mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::bearer;

#[tokio::test]
async fn anonymous_caller_must_authenticate() -> Result<()> {
    let server = common::spawn_server().await?;

    let res = server.get("/v1/movies").send().await?;
    let error = common::error_body(res, StatusCode::UNAUTHORIZED).await?;
    assert_eq!(error, "you must be authenticated to access this resource");
    Ok(())
}

#[tokio::test]
async fn inactive_account_is_forbidden() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server
        .seed_user("inactive@example.com", false, &["movies:read"])
        .await?;

    let res = server.get("/v1/movies").header("Authorization", bearer(&token)).send().await?;
    let error = common::error_body(res, StatusCode::FORBIDDEN).await?;
    assert_eq!(error, "your user account must be activated to access this resource");
    Ok(())
}

#[tokio::test]
async fn read_permission_does_not_allow_writes() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.seed_user("reader@example.com", true, &["movies:read"]).await?;

    let res = server.get("/v1/movies").header("Authorization", bearer(&token)).send().await?;
    assert_eq!(res.status(), StatusCode::OK);

    let res = server
        .post("/v1/movies")
        .header("Authorization", bearer(&token))
        .json(&json!({ "title": "Moana", "year": 2016, "runtime": "107 mins", "genres": ["animation"] }))
        .send()
        .await?;
    let error = common::error_body(res, StatusCode::FORBIDDEN).await?;
    assert_eq!(
        error,
        "your user account doesn't have the necessary permissions to access this resource"
    );
    Ok(())
}

#[tokio::test]
async fn rejection_stops_before_the_handler() -> Result<()> {
    let server = common::spawn_server().await?;
    let (_, token) = server.seed_user("reader2@example.com", true, &["movies:read"]).await?;
    let movie = server.seed_movie("Heat", 1995, &["crime"]).await?;

    let res = server
        .delete(&format!("/v1/movies/{}", movie.id))
        .header("Authorization", bearer(&token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .get(&format!("/v1/movies/{}", movie.id))
        .header("Authorization", bearer(&token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn password_reset_routes_require_activation() -> Result<()> {
    let server = common::spawn_server().await?;
    let (user, token) = server.seed_user("pending@example.com", false, &[]).await?;

    let res = server
        .post("/v1/tokens/password-reset")
        .header("Authorization", bearer(&token))
        .json(&json!({ "email": user.email }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .post("/v1/tokens/password-reset")
        .json(&json!({ "email": user.email }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
