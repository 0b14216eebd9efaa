#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use uuid::Uuid;

use recipe_api::config::AppConfig;
use recipe_api::database::models::Account;
use recipe_api::database::{DatabaseManager, MemoryStore, PgStore, Store};
use recipe_api::filter::{EntityKind, FilterData};
use recipe_api::AppState;

pub const PASSWORD: &str = "password123";

/// Postgres used by the suite when set; each server gets its own schema in it
pub const TEST_DATABASE_URL: &str = "TEST_DATABASE_URL";

/// A router bound to a free port, backed by a fresh store.
/// Each test gets its own server; it stops with the test's runtime.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<dyn Store>,
    client: reqwest::Client,
}

impl TestServer {
    /// Postgres when `TEST_DATABASE_URL` is set, otherwise the in-memory store
    pub async fn spawn() -> Result<Self> {
        match std::env::var(TEST_DATABASE_URL) {
            Ok(url) => Self::start(postgres_store(&url).await?).await,
            Err(_) => Self::start(Arc::new(MemoryStore::new())).await,
        }
    }

    /// Postgres-backed server, or `None` when no test database is configured
    pub async fn spawn_postgres() -> Result<Option<Self>> {
        match std::env::var(TEST_DATABASE_URL) {
            Ok(url) => Ok(Some(Self::start(postgres_store(&url).await?).await?)),
            Err(_) => {
                eprintln!("{} not set; skipping Postgres test", TEST_DATABASE_URL);
                Ok(None)
            }
        }
    }

    async fn start(store: Arc<dyn Store>) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::new(store.clone(), AppConfig::in_memory());
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;

        tokio::spawn(async move {
            let _ = axum::serve(listener, recipe_api::app(state)).await;
        });

        let server = Self { base_url, store, client: reqwest::Client::new() };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(format!("{}/health", self.base_url)).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// Send a request and return the status with the parsed body (`Null` when empty)
    pub async fn request(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            req = req.header("Authorization", format!("Bearer {}", token));
        }
        if let Some(body) = body {
            req = req.json(&body);
        }

        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        let value = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };
        Ok((status, value))
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, path, token, Some(body)).await
    }

    pub async fn patch(&self, path: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PATCH, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, path, token, None).await
    }

    pub async fn register(&self, email: &str, password: &str) -> Result<(StatusCode, Value)> {
        self.post("/api/users/create", None, json!({"email": email, "password": password, "name": "Test Cook"}))
            .await
    }

    pub async fn token(&self, email: &str, password: &str) -> Result<(StatusCode, Value)> {
        self.post("/api/users/token", None, json!({"email": email, "password": password})).await
    }

    /// Register an account and return a token for it
    pub async fn login(&self, email: &str) -> Result<String> {
        let (status, _) = self.register(email, PASSWORD).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {}", status);
        let (status, body) = self.token(email, PASSWORD).await?;
        anyhow::ensure!(status == StatusCode::OK, "token failed: {}", status);
        body["data"]["token"].as_str().map(str::to_string).context("no token in response")
    }

    /// Create a tag or ingredient and return its id
    pub async fn create_attribute(&self, path: &str, token: &str, name: &str) -> Result<String> {
        let (status, body) = self.post(path, Some(token), json!({"name": name})).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create {} failed: {} {}", path, status, body);
        body["data"]["id"].as_str().map(str::to_string).context("no id in response")
    }

    /// Total rows of `kind` across every account
    pub async fn count(&self, kind: EntityKind) -> Result<i64> {
        Ok(self.store.count(kind, FilterData::default()).await?)
    }

    pub async fn store_account(&self, email: &str) -> Result<Account> {
        self.store.find_account_by_email(email).await?.context("account not stored")
    }

    pub async fn count_accounts(&self) -> Result<i64> {
        Ok(self.store.count_accounts().await?)
    }
}

/// Fresh schema in the test database, migrated, with the pool's search_path pinned to it
async fn postgres_store(url: &str) -> Result<Arc<dyn Store>> {
    let schema = format!("test_{}", Uuid::new_v4().simple());
    let options = PgConnectOptions::from_str(url).context("invalid TEST_DATABASE_URL")?;

    let admin = PgPoolOptions::new().max_connections(1).connect_with(options.clone()).await?;
    sqlx::query(&format!("CREATE SCHEMA \"{}\"", schema)).execute(&admin).await?;
    admin.close().await;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options.options([("search_path", schema.as_str())]))
        .await?;
    DatabaseManager::migrate(&pool).await?;
    Ok(Arc::new(PgStore::new(pool)))
}

/// `data` of a success envelope
pub fn data(body: &Value) -> &Value {
    &body["data"]
}

/// Names from a list of `{id, name}` objects, in response order
pub fn names(list: &Value) -> Vec<String> {
    list.as_array()
        .map(|items| items.iter().filter_map(|i| i["name"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}
