mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};
use serde_json::Value;

use common::{authed, recipe_body};

#[tokio::test]
async fn favorites_round_trip() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let pool = common::db().await?;
    let tag = common::seed_tag(&pool).await?;
    let sugar = common::seed_ingredient(&pool, "g").await?;
    let author = common::register_user(&server).await?;
    let fan = common::register_user(&server).await?;
    let client = reqwest::Client::new();

    let recipe = common::create_recipe(&server, &author, &recipe_body("Cake", &[tag.id], &[(sugar.id, 150)])).await?;
    let id = recipe["id"].as_i64().unwrap();
    let url = server.url(&format!("/api/recipes/{}/favorite/", id));

    let res = authed(client.post(&url), &fan.token).send().await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let short: Value = res.json().await?;
    assert_eq!(short["id"], id);
    assert_eq!(short["name"], "Cake");
    assert!(short.get("text").is_none());

    let res = authed(client.post(&url), &fan.token).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = authed(client.get(server.url(&format!("/api/recipes/{}/", id))), &fan.token)
        .send()
        .await?;
    let full: Value = res.json().await?;
    assert_eq!(full["is_favorited"], true);

    let body: Value = authed(client.get(server.url("/api/recipes/?is_favorited=1")), &fan.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["id"], id);

    let res = authed(client.delete(&url), &fan.token).send().await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let res = authed(client.delete(&url), &fan.token).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn missing_recipes_are_reported() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let user = common::register_user(&server).await?;
    let client = reqwest::Client::new();
    let url = server.url("/api/recipes/0/shopping_cart/");

    let res = authed(client.post(&url), &user.token).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let res = authed(client.delete(&url), &user.token).send().await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn shopping_list_sums_ingredients() -> Result<()> {
    let Some(server) = common::ensure_server().await? else {
        return Ok(());
    };
    let pool = common::db().await?;
    let tag = common::seed_tag(&pool).await?;
    let flour = common::seed_ingredient(&pool, "g").await?;
    let milk = common::seed_ingredient(&pool, "ml").await?;
    let author = common::register_user(&server).await?;
    let shopper = common::register_user(&server).await?;
    let client = reqwest::Client::new();
    let download = server.url("/api/recipes/download_shopping_cart/");

    let res = authed(client.get(&download), &shopper.token).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let bread = common::create_recipe(&server, &author, &recipe_body("Bread", &[tag.id], &[(flour.id, 500)])).await?;
    let crepes = common::create_recipe(
        &server,
        &author,
        &recipe_body("Crepes", &[tag.id], &[(flour.id, 250), (milk.id, 300)]),
    )
    .await?;
    for recipe in [&bread, &crepes] {
        let res = authed(
            client.post(server.url(&format!("/api/recipes/{}/shopping_cart/", recipe["id"]))),
            &shopper.token,
        )
        .send()
        .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let body: Value = authed(client.get(server.url("/api/recipes/?is_in_shopping_cart=1")), &shopper.token)
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["count"], 2);

    let res = authed(client.get(&download), &shopper.token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{}_shopping_list.txt\"", shopper.username).as_str()
    );
    let text = res.text().await?;
    assert!(text.starts_with("Shopping list for: Test Cook\n\nDate: "));
    assert!(text.contains(&format!("- {} (g) - 750\n", flour.name)));
    assert!(text.contains(&format!("- {} (ml) - 300\n", milk.name)));
    assert!(text.contains("Counted by Foodgram - "));
    Ok(())
}
