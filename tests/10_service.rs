mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn health_and_root_respond() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let client = reqwest::Client::new();

    let res = client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["database"], "ok");

    let body: Value = client.get(server.url("/")).send().await?.json().await?;
    assert_eq!(body["name"], "Foodgram API");
    Ok(())
}

#[tokio::test]
async fn tags_are_listed_unpaginated() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let pool = common::db().await?;
    let tag = common::seed_tag(&pool).await?;
    let client = reqwest::Client::new();

    let body: Value = client.get(server.url("/api/tags/")).send().await?.json().await?;
    let tags = body.as_array().expect("tag list is a plain array");
    assert!(tags.iter().any(|t| t["slug"] == tag.slug.as_str()));

    let res = client.get(server.url(&format!("/api/tags/{}/", tag.id))).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await?;
    assert_eq!(body["id"], tag.id);
    assert!(body["color"].as_str().unwrap().starts_with('#'));

    let res = client.get(server.url("/api/tags/0/")).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn ingredients_search_by_prefix() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let pool = common::db().await?;
    let ingredient = common::seed_ingredient(&pool, "g").await?;
    let client = reqwest::Client::new();

    // Upper-cased prefix still matches
    let prefix = ingredient.name[..ingredient.name.len() - 2].to_uppercase();
    let body: Value = client
        .get(server.url("/api/ingredients/"))
        .query(&[("name", prefix.as_str())])
        .send()
        .await?
        .json()
        .await?;
    let found = body.as_array().expect("ingredient list is a plain array");
    assert!(found.iter().any(|i| i["id"] == ingredient.id));
    assert!(found.iter().all(|i| i["name"].as_str().unwrap().to_uppercase().starts_with(&prefix)));

    // LIKE wildcards are matched literally
    let body: Value = client
        .get(server.url("/api/ingredients/"))
        .query(&[("name", "%")])
        .send()
        .await?
        .json()
        .await?;
    assert!(body.as_array().unwrap().iter().all(|i| i["name"].as_str().unwrap().starts_with('%')));

    let res = client.get(server.url(&format!("/api/ingredients/{}/", ingredient.id))).send().await?;
    let body: Value = res.json().await?;
    assert_eq!(body["measurement_unit"], "g");
    Ok(())
}

#[tokio::test]
async fn ingredients_search_non_ascii_names() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let pool = common::db().await?;
    let flour = common::seed_named_ingredient(&pool, &common::unique("Мука пшеничная "), "г").await?;

    let body: Value = reqwest::Client::new()
        .get(server.url("/api/ingredients/"))
        .query(&[("name", "Мука пшеничная")])
        .send()
        .await?
        .json()
        .await?;
    let found = body.as_array().expect("ingredient list is a plain array");
    let hit = found.iter().find(|i| i["id"] == flour.id).expect("cyrillic prefix matches");
    assert_eq!(hit["name"], flour.name.as_str());
    assert_eq!(hit["measurement_unit"], "г");
    Ok(())
}
