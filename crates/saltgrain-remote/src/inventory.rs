//! Fleet-inventory client
//!
//! POST {base}/auth/login  {"login", "password"}  -> session cookie
//! GET  {base}/saltkey/acceptedList               -> {"success", "result": [hosts]}

use reqwest::Client;
use saltgrain_core::{Error, Host, InventoryCredentials, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Answers whether a host's key has been accepted for management.
#[async_trait::async_trait]
pub trait Inventory: Send + Sync {
    async fn is_accepted(&self, host: &Host) -> Result<bool>;
}

pub struct InventoryClient {
    creds: InventoryCredentials,
    accept_invalid_certs: bool,
}

impl InventoryClient {
    pub fn new(creds: InventoryCredentials) -> Self {
        Self {
            creds,
            accept_invalid_certs: true,
        }
    }

    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.creds.base_url.trim_end_matches('/'), path)
    }

    /// Log in with a fresh cookie session and fetch the accepted-key list.
    pub async fn accepted_hosts(&self) -> Result<Vec<String>> {
        let client = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| Error::Inventory(format!("failed to build HTTP client: {}", e)))?;

        let login = LoginRequest {
            login: &self.creds.login,
            password: self.creds.password(),
        };
        let response = client
            .post(self.url("auth/login"))
            .json(&login)
            .send()
            .await
            .map_err(|e| Error::Inventory(format!("login request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inventory(format!("login failed ({}): {}", status, body)));
        }

        let response = client
            .get(self.url("saltkey/acceptedList"))
            .header("content-type", "application/json")
            .send()
            .await
            .map_err(|e| Error::Inventory(format!("acceptedList request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inventory(format!(
                "failed to fetch acceptedList ({}): {}",
                status, body
            )));
        }

        let list: AcceptedList = response.json().await.map_err(|e| {
            Error::Inventory(format!("failed to parse acceptedList response: {}", e))
        })?;

        let hosts = list.result.unwrap_or_default();
        debug!("acceptedList success={} entries={}", list.success, hosts.len());
        Ok(hosts)
    }
}

#[async_trait::async_trait]
impl Inventory for InventoryClient {
    async fn is_accepted(&self, host: &Host) -> Result<bool> {
        let accepted = self.accepted_hosts().await?;
        Ok(accepted.iter().any(|h| h == host.as_str()))
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AcceptedList {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    result: Option<Vec<String>>,
}
