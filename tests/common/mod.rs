#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

// Shared while any test holds it; the last holder stops the process
static SERVER: Mutex<Option<Weak<TestServer>>> = Mutex::new(None);
static COUNTER: AtomicU32 = AtomicU32::new(0);

// 1x1 transparent PNG
pub const PNG_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub media_root: PathBuf,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let media_root = std::env::temp_dir().join(format!("foodgram-media-{}-{}", std::process::id(), port));

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_foodgram-api"));
        cmd.env("FOODGRAM_API_PORT", port.to_string())
            .env("MEDIA_ROOT", &media_root)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server sees DATABASE_URL (or loads it from .env itself)
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self {
            port,
            base_url,
            media_root,
            child,
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// File on disk behind an absolute media URL returned by the API
    pub fn media_file(&self, image_url: &str) -> Result<PathBuf> {
        let relative = image_url
            .strip_prefix(&self.url("/media/"))
            .with_context(|| format!("{} is not a media URL", image_url))?;
        Ok(self.media_root.join(relative))
    }

    /// Stored recipe images, across every recipe this server has seen
    pub fn recipe_images(&self) -> Result<Vec<PathBuf>> {
        let dir = self.media_root.join("recipes").join("images");
        if !dir.exists() {
            return Ok(vec![]);
        }
        let mut files = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            files.push(entry?.path());
        }
        Ok(files)
    }
}

fn database_url() -> Option<String> {
    let _ = dotenvy::dotenv();
    std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty())
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        let _ = std::fs::remove_dir_all(&self.media_root);
    }
}

/// Server shared by the tests running in this binary, or `None` when no database is configured
pub async fn ensure_server() -> Result<Option<Arc<TestServer>>> {
    if database_url().is_none() {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return Ok(None);
    }
    let server = {
        let mut shared = SERVER.lock().unwrap_or_else(|e| e.into_inner());
        match shared.as_ref().and_then(Weak::upgrade) {
            Some(server) => server,
            None => {
                let server = Arc::new(TestServer::spawn()?);
                *shared = Some(Arc::downgrade(&server));
                server
            }
        }
    };
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(Some(server))
}

/// Direct pool for seeding catalog rows that have no HTTP endpoint
pub async fn db() -> Result<PgPool> {
    let url = database_url().context("DATABASE_URL not set")?;
    Ok(PgPoolOptions::new().max_connections(2).connect(&url).await?)
}

/// Short identifier unique across processes and calls
pub fn unique(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{}{}x{}x{}", prefix, std::process::id(), nanos, n)
}

pub fn authed(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header("Authorization", format!("Token {}", token))
}

pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password: String,
    pub token: String,
}

pub async fn register_user(server: &TestServer) -> Result<TestUser> {
    let client = reqwest::Client::new();
    let username = unique("cook");
    let email = format!("{}@example.com", username);
    let password = "S3cret-pass!".to_string();

    let res = client
        .post(server.url("/api/users/"))
        .json(&json!({
            "email": email,
            "username": username,
            "first_name": "Test",
            "last_name": "Cook",
            "password": password,
        }))
        .send()
        .await?;
    let status = res.status();
    let body: Value = res.json().await?;
    anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);
    let id = body["id"].as_i64().context("id missing")?;

    let token = login(server, &email, &password).await?;
    Ok(TestUser {
        id,
        email,
        username,
        password,
        token,
    })
}

pub async fn login(server: &TestServer, email: &str, password: &str) -> Result<String> {
    let res = reqwest::Client::new()
        .post(server.url("/api/auth/token/login/"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await?;
    let status = res.status();
    let body: Value = res.json().await?;
    anyhow::ensure!(status == StatusCode::OK, "login failed: {} {}", status, body);
    Ok(body["auth_token"].as_str().context("auth_token missing")?.to_string())
}

pub struct SeededTag {
    pub id: i64,
    pub slug: String,
}

pub async fn seed_tag(pool: &PgPool) -> Result<SeededTag> {
    let slug = unique("tag");
    // Colors are unique too; probe until a free one is found
    let mut seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    for _ in 0..32 {
        let color = format!("#{:06X}", seed % 0x1000000);
        let id: Option<i64> = sqlx::query_scalar(
            "INSERT INTO tags (name, color, slug) VALUES ($1, $2, $1) ON CONFLICT DO NOTHING RETURNING id",
        )
        .bind(&slug)
        .bind(&color)
        .fetch_optional(pool)
        .await?;
        if let Some(id) = id {
            return Ok(SeededTag { id, slug });
        }
        seed = seed.wrapping_mul(2_654_435_761).wrapping_add(1);
    }
    anyhow::bail!("could not find a free tag color")
}

pub struct SeededIngredient {
    pub id: i64,
    pub name: String,
}

pub async fn seed_ingredient(pool: &PgPool, unit: &str) -> Result<SeededIngredient> {
    seed_named_ingredient(pool, &unique("ingredient"), unit).await
}

pub async fn seed_named_ingredient(pool: &PgPool, name: &str, unit: &str) -> Result<SeededIngredient> {
    let name = name.to_string();
    let id: i64 = sqlx::query_scalar("INSERT INTO ingredients (name, measurement_unit) VALUES ($1, $2) RETURNING id")
        .bind(&name)
        .bind(unit)
        .fetch_one(pool)
        .await?;
    Ok(SeededIngredient { id, name })
}

pub fn png_data_uri() -> String {
    format!("data:image/png;base64,{}", PNG_B64)
}

pub fn recipe_body(name: &str, tags: &[i64], ingredients: &[(i64, i32)]) -> Value {
    json!({
        "name": name,
        "text": "Mix everything and bake.",
        "cooking_time": 25,
        "image": png_data_uri(),
        "tags": tags,
        "ingredients": ingredients
            .iter()
            .map(|(id, amount)| json!({ "id": id, "amount": amount }))
            .collect::<Vec<_>>(),
    })
}

/// Creates a recipe as `user` and returns its JSON representation
pub async fn create_recipe(server: &TestServer, user: &TestUser, body: &Value) -> Result<Value> {
    let res = authed(reqwest::Client::new().post(server.url("/api/recipes/")), &user.token)
        .json(body)
        .send()
        .await?;
    let status = res.status();
    let body: Value = res.json().await?;
    anyhow::ensure!(status == StatusCode::CREATED, "create recipe failed: {} {}", status, body);
    Ok(body)
}
