mod common;

use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::json;

use common::{data, TestServer, PASSWORD};
use recipe_api::auth::{generate_jwt, Claims};
use recipe_api::config::AppConfig;

#[tokio::test]
async fn health_endpoint_responds() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (status, body) = server.get("/health", None).await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn create_user_returns_name_and_email_only() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (status, body) = server
        .post(
            "/api/users/create",
            None,
            json!({"email": "cook@example.com", "password": PASSWORD, "name": "Test Cook"}),
        )
        .await?;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(data(&body), &json!({"name": "Test Cook", "email": "cook@example.com"}));
    assert!(!body.to_string().contains(PASSWORD));
    assert!(!body.to_string().contains("password"));

    // the stored hash verifies against the original password
    let account = server.store_account("cook@example.com").await?;
    assert!(bcrypt::verify(PASSWORD, &account.password_hash)?);
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register("cook@example.com", PASSWORD).await?;

    let (status, body) = server.register("cook@example.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["email"][0], "user with this email already exists.");
    assert_eq!(server.count_accounts().await?, 1);
    Ok(())
}

#[tokio::test]
async fn short_password_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (status, body) = server.register("cook@example.com", "pw").await?;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["password"][0], "Ensure this field has at least 5 characters.");
    assert_eq!(server.count_accounts().await?, 0);
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_rejected() -> Result<()> {
    let server = TestServer::spawn().await?;
    let res = reqwest::Client::new()
        .post(format!("{}/api/users/create", server.base_url))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["code"], "INVALID_JSON");
    Ok(())
}

#[tokio::test]
async fn token_issued_for_valid_credentials() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register("cook@example.com", PASSWORD).await?;

    let (status, body) = server.token("cook@example.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);
    assert!(data(&body)["token"].is_string());
    Ok(())
}

#[tokio::test]
async fn token_refused_without_leaking_which_field() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register("cook@example.com", PASSWORD).await?;

    let (wrong_password, wrong_body) = server.token("cook@example.com", "wrong-password").await?;
    let (no_user, no_user_body) = server.token("nobody@example.com", PASSWORD).await?;

    for (status, body) in [(wrong_password, &wrong_body), (no_user, &no_user_body)] {
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("data").is_none());
        assert_eq!(
            body["field_errors"]["non_field_errors"][0],
            "Unable to authenticate with provided credentials"
        );
    }
    Ok(())
}

#[tokio::test]
async fn token_refused_for_missing_password() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.register("cook@example.com", PASSWORD).await?;

    let (status, body) = server.post("/api/users/token", None, json!({"email": "cook@example.com", "password": ""})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("data").is_none());
    Ok(())
}

#[tokio::test]
async fn email_domain_is_normalized() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (status, body) = server.register("Cook@EXAMPLE.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(data(&body)["email"], "Cook@example.com");

    let (status, _) = server.token("Cook@Example.COM", PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn me_requires_authentication() -> Result<()> {
    let server = TestServer::spawn().await?;

    let (status, body) = server.get("/api/users/me", None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = server.get("/api/users/me", Some("not-a-token")).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn me_returns_profile() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;

    let (status, body) = server.get("/api/users/me", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body), &json!({"name": "Test Cook", "email": "cook@example.com"}));
    Ok(())
}

#[tokio::test]
async fn token_scheme_is_accepted() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;

    let res = reqwest::Client::new()
        .get(format!("{}/api/users/me", server.base_url))
        .header("Authorization", format!("Token {}", token))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn post_me_not_allowed() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;

    let (status, _) = server.request(Method::POST, "/api/users/me", Some(&token), Some(json!({}))).await?;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    Ok(())
}

#[tokio::test]
async fn patch_password_changes_authentication() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;

    let (status, body) = server
        .patch("/api/users/me", Some(&token), json!({"password": "newpassword123"}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body), &json!({"name": "Test Cook", "email": "cook@example.com"}));

    let (status, _) = server.token("cook@example.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = server.token("cook@example.com", "newpassword123").await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn patch_name_keeps_password() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;

    let (status, body) = server.patch("/api/users/me", Some(&token), json!({"name": "Head Chef"})).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["name"], "Head Chef");

    let (status, _) = server.token("cook@example.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn me_update_without_valid_token_changes_nothing() -> Result<()> {
    let server = TestServer::spawn().await?;
    server.login("cook@example.com").await?;
    let account = server.store_account("cook@example.com").await?;

    let secret = AppConfig::in_memory().security.jwt_secret;
    let forged = generate_jwt(&Claims::new(account.id, account.email.as_str(), 1)?, "some-other-secret")?;
    let mut expired_claims = Claims::new(account.id, account.email.as_str(), 1)?;
    expired_claims.exp = chrono::Utc::now().timestamp() - 3600;
    let expired = generate_jwt(&expired_claims, &secret)?;

    let change = json!({"name": "Intruder", "password": "stolen-password"});
    for token in [None, Some(forged.as_str()), Some(expired.as_str())] {
        let (status, _) = server.patch("/api/users/me", token, change.clone()).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = server.put("/api/users/me", token, change.clone()).await?;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let stored = server.store_account("cook@example.com").await?;
    assert_eq!(stored.name, "Test Cook");
    let (status, _) = server.token("cook@example.com", PASSWORD).await?;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = server.token("cook@example.com", "stolen-password").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn put_me_requires_every_field() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;

    let (status, body) = server.put("/api/users/me", Some(&token), json!({"name": "Head Chef"})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["password"][0], "This field is required.");

    let (status, body) = server
        .put("/api/users/me", Some(&token), json!({"name": "Head Chef", "password": "another-pass"}))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body)["name"], "Head Chef");
    Ok(())
}

#[tokio::test]
async fn unknown_route_is_json_404() -> Result<()> {
    let server = TestServer::spawn().await?;
    let (status, body) = server.get("/api/nope", None).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
    Ok(())
}
