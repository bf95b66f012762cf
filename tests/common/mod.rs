#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::{Method, Response, StatusCode};
use serde_json::{json, Value};

use kitten_api::app::{app, AppState};
use kitten_api::config::AppConfig;
use kitten_api::database::Store;

/// A server on its own port and its own in-memory database.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let store = Store::in_memory().await?;
        store.migrate().await?;
        let state = AppState::new(AppConfig::development(), store);

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Unauthenticated request with an optional JSON body.
    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Response> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        Ok(request.send().await?)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<Response> {
        self.send(
            Method::POST,
            "/api/register",
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<Response> {
        self.send(
            Method::POST,
            "/api/login",
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    /// Register and log in, returning a client for that user.
    pub async fn user(&self, username: &str) -> Result<Session<'_>> {
        let password = "testpassword";
        let res = self.register(username, password).await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "register failed: {}", res.status());

        let res = self.login(username, password).await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());
        let body: Value = res.json().await?;

        Ok(Session {
            server: self,
            access: data_str(&body, "access")?,
            refresh: data_str(&body, "refresh")?,
        })
    }
}

/// Requests carrying one user's bearer token.
pub struct Session<'a> {
    server: &'a TestServer,
    pub access: String,
    pub refresh: String,
}

impl Session<'_> {
    pub async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Response> {
        let mut request = self
            .server
            .client
            .request(method, self.server.url(path))
            .bearer_auth(&self.access);
        if let Some(body) = body {
            request = request.json(&body);
        }
        Ok(request.send().await?)
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<Response> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<Response> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch(&self, path: &str, body: Value) -> Result<Response> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.send(Method::DELETE, path, None).await
    }

    /// Create a kitten and return its id.
    pub async fn create_kitten(&self, name: &str, breed: &str, color: &str, age: i64) -> Result<i64> {
        let res = self
            .post(
                "/api/kittens",
                json!({
                    "name": name,
                    "breed": breed,
                    "color": color,
                    "age_months": age,
                    "description": format!("{} is a lovely kitten", name),
                }),
            )
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());
        let body: Value = res.json().await?;
        body["data"]["id"].as_i64().context("kitten id missing")
    }
}

pub fn data_str(body: &Value, field: &str) -> Result<String> {
    body["data"][field]
        .as_str()
        .map(str::to_string)
        .with_context(|| format!("missing data.{} in {}", field, body))
}
