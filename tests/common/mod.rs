#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use uuid::Uuid;

use waghl_api::auth::{sha256_hex, Role, TokenKeys};
use waghl_api::clock::FixedClock;
use waghl_api::config::AppConfig;
use waghl_api::database::models::{Customer, Subaccount};
use waghl_api::database::MemoryCustomerStore;
use waghl_api::server;
use waghl_api::state::AppState;

pub const ADMIN_EMAIL: &str = "ops@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
pub const APP_BASE_URL: &str = "https://app.example.com";

/// 2024-06-01T00:00:00Z, the instant every test server evaluates at.
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

pub fn days(n: i64) -> Duration {
    Duration::days(n)
}

/// In-process server over a fresh memory store and a frozen clock.
///
/// Each test gets its own instance, so seeded customers never leak between
/// tests.
pub struct TestServer {
    pub base_url: String,
    pub store: Arc<MemoryCustomerStore>,
    tokens: TokenKeys,
    client: reqwest::Client,
}

impl TestServer {
    pub async fn start() -> Result<Self> {
        let mut config = AppConfig::development();
        config.security.jwt_secret = "integration-test-secret".to_string();
        config.security.admin_email = Some(ADMIN_EMAIL.to_string());
        config.security.admin_password_sha256 = Some(sha256_hex(ADMIN_PASSWORD));
        config.billing.app_base_url = APP_BASE_URL.to_string();
        config.billing.support_email = "support@example.com".to_string();
        config.api.enable_request_logging = false;

        let clock = Arc::new(FixedClock(now()));
        let store = Arc::new(MemoryCustomerStore::with_clock(clock.clone()));
        let state = AppState::new(config, store.clone(), clock)?;
        let tokens = state.tokens.clone();

        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            let _ = server::serve(listener, state).await;
        });

        Ok(Self {
            base_url: format!("http://127.0.0.1:{}", port),
            store,
            tokens,
            client: reqwest::Client::new(),
        })
    }

    /// Insert a customer on `plan` with one free subaccount slot. Adjust the
    /// returned row's fields through `edit` before it is stored.
    pub async fn seed(&self, plan: &str, edit: impl FnOnce(&mut Customer)) -> Customer {
        let mut customer = Customer {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            name: Some("Test Agency".to_string()),
            plan: plan.to_string(),
            status: if plan == "trial" { "trial" } else { "active" }.to_string(),
            trial_ends_at: None,
            subscription_ends_at: None,
            max_subaccounts: 3,
            total_subaccounts: 0,
            created_at: now() - days(10),
            updated_at: now() - days(10),
        };
        edit(&mut customer);
        self.store.insert_customer(customer.clone()).await;
        customer
    }

    pub async fn seed_subaccount(&self, customer: &Customer, connected: bool) -> Subaccount {
        let subaccount = Subaccount {
            id: Uuid::new_v4(),
            customer_id: customer.id,
            location_id: format!("loc_{}", Uuid::new_v4().simple()),
            name: None,
            connected,
            created_at: now() - days(1),
        };
        self.store.insert_subaccount(subaccount.clone()).await;
        subaccount
    }

    pub fn customer_token(&self, customer: &Customer) -> String {
        self.tokens
            .issue(&customer.id.to_string(), &customer.email, Role::Customer)
            .expect("issue customer token")
    }

    pub fn admin_token(&self) -> String {
        self.tokens.issue(ADMIN_EMAIL, ADMIN_EMAIL, Role::Admin).expect("issue admin token")
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.send(Method::GET, path, token, None).await
    }

    pub async fn send(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut request = self.client.request(method, self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;
        let status = response.status();
        let body = response.json::<Value>().await.unwrap_or(Value::Null);
        Ok((status, body))
    }
}
