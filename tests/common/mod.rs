#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use upms::auth::{JwtKeys, TokenKind};
use upms::config::SecurityConfig;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const JWT_ISSUER: &str = "upms-test";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_upms"));
        cmd.arg("serve")
            .env("APP_ENV", "development")
            .env("STORE", "memory")
            .env("SERVER_HOST", "127.0.0.1")
            .env("UPMS_PORT", port.to_string())
            .env("JWT_SECRET", JWT_SECRET)
            .env("JWT_ISSUER", JWT_ISSUER)
            .env("SECURITY_BCRYPT_COST", "4")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
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
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(15)).await?;
    Ok(server)
}

fn keys() -> JwtKeys {
    JwtKeys::from_config(&SecurityConfig {
        cors_origins: vec![],
        jwt_secret: JWT_SECRET.to_string(),
        jwt_issuer: JWT_ISSUER.to_string(),
        access_token_minutes: 15,
        refresh_token_hours: 24,
        bcrypt_cost: 4,
    })
    .expect("test keys")
}

/// Access token for an administrator that exists only in the token.
pub fn admin_token() -> String {
    keys()
        .issue("root", Uuid::new_v4(), &["admin".to_string()], TokenKind::Access)
        .expect("token")
}

pub fn refresh_token() -> String {
    keys()
        .issue("root", Uuid::new_v4(), &["admin".to_string()], TokenKind::Refresh)
        .expect("token")
}

pub fn encode(plain: &str) -> String {
    STANDARD.encode(plain)
}

/// Short random suffix for names that must be unique across tests.
pub fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..8])
}

pub struct Api {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

pub async fn api() -> Result<Api> {
    let server = ensure_server().await?;
    Ok(Api { client: reqwest::Client::new(), base_url: server.base_url.clone(), token: Some(admin_token()) })
}

impl Api {
    pub fn anonymous(mut self) -> Self {
        self.token = None;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    async fn send(&self, method: reqwest::Method, path: &str, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut req = self.client.request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(&body);
        }
        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;
        let body = if text.is_empty() { Value::Null } else { serde_json::from_str(&text).unwrap_or(Value::String(text)) };
        Ok((status, body))
    }

    pub async fn get(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(reqwest::Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(reqwest::Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(reqwest::Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<(StatusCode, Value)> {
        self.send(reqwest::Method::DELETE, path, None).await
    }

    pub async fn delete_with(&self, path: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.send(reqwest::Method::DELETE, path, Some(body)).await
    }

    /// POST and return `data.id`, failing on anything but 201.
    pub async fn create(&self, path: &str, body: Value) -> Result<Value> {
        let (status, body) = self.post(path, body).await?;
        anyhow::ensure!(status == StatusCode::CREATED, "POST {} returned {}: {}", path, status, body);
        Ok(body["data"].clone())
    }

    pub async fn organization(&self, name: &str, parent_id: Option<&str>) -> Result<Value> {
        self.create("/api/v1/users/organizations", json!({ "name": name, "parentId": parent_id })).await
    }

    /// Organization plus position to place accounts in.
    pub async fn placement(&self) -> Result<(String, String)> {
        let org = self.organization(&unique("org"), None).await?;
        let org_id = org["id"].as_str().context("org id")?.to_string();
        let position = self
            .create("/api/v1/users/positions", json!({ "name": "Engineer", "organizationId": org_id }))
            .await?;
        let position_id = position["id"].as_str().context("position id")?.to_string();
        Ok((org_id, position_id))
    }

    /// Returns the created account payload including `initialPassword`.
    pub async fn account(&self, login: &str) -> Result<Value> {
        let (org_id, position_id) = self.placement().await?;
        let n: u32 = rand::random::<u32>() % 100_000_000;
        self.create(
            "/api/v1/users/accounts",
            json!({
                "userName": login,
                "account": login,
                "mobile": format!("139{:08}", n),
                "email": format!("{}@example.com", login),
                "workNumber": format!("W{:08}", n),
                "hireDate": "2024-01-15",
                "positionId": position_id,
                "organizationId": org_id,
            }),
        )
        .await
    }
}
