mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::json;

use common::{data, names, TestServer};
use recipe_api::filter::EntityKind;

const TAGS: &str = "/api/tags";

#[tokio::test]
async fn tags_require_authentication() -> Result<()> {
    let server = TestServer::spawn().await?;

    let (status, _) = server.get(TAGS, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = server.post(TAGS, None, json!({"name": "Vegan"})).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(server.count(EntityKind::Tag).await?, 0);
    Ok(())
}

#[tokio::test]
async fn tags_listed_by_name_descending() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;
    server.create_attribute(TAGS, &token, "Dessert").await?;
    server.create_attribute(TAGS, &token, "Vegan").await?;
    server.create_attribute(TAGS, &token, "Breakfast").await?;

    let (status, body) = server.get(TAGS, Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(data(&body)), vec!["Vegan", "Dessert", "Breakfast"]);
    Ok(())
}

#[tokio::test]
async fn mixed_case_tags_ordered_by_code_point() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;
    for name in ["Banana", "apple", "Cherry"] {
        server.create_attribute(TAGS, &token, name).await?;
    }

    let (status, body) = server.get(TAGS, Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(data(&body)), vec!["apple", "Cherry", "Banana"]);
    Ok(())
}

#[tokio::test]
async fn tags_limited_to_caller() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice = server.login("alice@example.com").await?;
    let bob = server.login("bob@example.com").await?;
    server.create_attribute(TAGS, &bob, "Fruity").await?;
    let id = server.create_attribute(TAGS, &alice, "Comfort Food").await?;

    let (status, body) = server.get(TAGS, Some(&alice)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body), &json!([{"id": id, "name": "Comfort Food"}]));
    Ok(())
}

#[tokio::test]
async fn create_tag_ignores_supplied_owner() -> Result<()> {
    let server = TestServer::spawn().await?;
    let alice = server.login("alice@example.com").await?;
    let bob = server.login("bob@example.com").await?;
    let bob_id = server.store_account("bob@example.com").await?.id;

    let (status, body) = server
        .post(TAGS, Some(&alice), json!({"name": "Test tag", "user_id": bob_id, "user": bob_id}))
        .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(data(&body)["name"], "Test tag");

    let (_, body) = server.get(TAGS, Some(&bob)).await?;
    assert_eq!(data(&body), &json!([]));
    let (_, body) = server.get(TAGS, Some(&alice)).await?;
    assert_eq!(names(data(&body)), vec!["Test tag"]);
    Ok(())
}

#[tokio::test]
async fn create_tag_with_blank_name_fails() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;

    let (status, body) = server.post(TAGS, Some(&token), json!({"name": ""})).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field_errors"]["name"][0], "This field may not be blank.");
    assert_eq!(server.count(EntityKind::Tag).await?, 0);
    Ok(())
}

#[tokio::test]
async fn assigned_only_returns_linked_tags() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;
    let breakfast = server.create_attribute(TAGS, &token, "Breakfast").await?;
    server.create_attribute(TAGS, &token, "Lunch").await?;

    let (status, _) = server
        .post(
            "/api/recipes",
            Some(&token),
            json!({"title": "Coriander eggs on toast", "time_minutes": 10, "price": "5.00", "tags": [breakfast]}),
        )
        .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = server.get("/api/tags?assigned_only=1", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(data(&body)), vec!["Breakfast"]);
    Ok(())
}

#[tokio::test]
async fn assigned_only_lists_shared_tag_once() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;
    let breakfast = server.create_attribute(TAGS, &token, "Breakfast").await?;
    server.create_attribute(TAGS, &token, "Lunch").await?;

    for title in ["Pancakes", "Porridge"] {
        let (status, _) = server
            .post(
                "/api/recipes",
                Some(&token),
                json!({"title": title, "time_minutes": 5, "price": "3.00", "tags": [breakfast]}),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = server.get("/api/tags?assigned_only=1", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data(&body).as_array().map(Vec::len), Some(1));
    Ok(())
}

#[tokio::test]
async fn assigned_only_zero_lists_everything() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;
    server.create_attribute(TAGS, &token, "Lunch").await?;

    let (status, body) = server.get("/api/tags?assigned_only=0", Some(&token)).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(data(&body)), vec!["Lunch"]);
    Ok(())
}

#[tokio::test]
async fn assigned_only_must_be_integer() -> Result<()> {
    let server = TestServer::spawn().await?;
    let token = server.login("cook@example.com").await?;

    let (status, body) = server.get("/api/tags?assigned_only=yes", Some(&token)).await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["assigned_only"].is_array());
    Ok(())
}
