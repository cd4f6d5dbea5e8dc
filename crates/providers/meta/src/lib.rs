use chrono::{Duration, Utc};
use core_lib::token::{Credential, Validation};
use core_lib::{AppIdentity, AuthError, TokenEndpoints};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};

mod lifecycle;

pub use lifecycle::TokenLifecycle;

const GRAPH_API_URL: &str = "https://graph.facebook.com/v19.0";

/// A record as it arrives from a Graph API `data` list.
pub type Record = Map<String, Value>;

#[derive(Deserialize, Debug)]
struct ExchangeResponse {
    access_token: Option<String>,
    expires_in: Option<i64>,
}

/// Graph API client: token introspection, token exchange, identity probe
/// and the one-shot ad read calls.
///
/// Holds its own HTTP client; construct once and pass it wherever a
/// session is needed. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct MetaProvider {
    base_url: String,
    client: Client,
}

impl Default for MetaProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaProvider {
    pub fn new() -> Self {
        Self::with_base_url(GRAPH_API_URL)
    }

    /// Points the provider at a different Graph API root, for sandbox
    /// tiers or a local stand-in server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        MetaProvider {
            base_url: base_url.into(),
            client: Client::new(),
        }
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, AuthError> {
        let res = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .query(query)
            .send()
            .await
            .map_err(|err| {
                log::warn!("graph call {path} failed: {err}");
                AuthError::RemoteCallFailed(err.to_string())
            })?;

        res.json().await.map_err(|err| {
            log::warn!("graph response for {path} was not JSON: {err}");
            AuthError::RemoteCallFailed(err.to_string())
        })
    }

    /// One-shot read of a `data` list endpoint. A response without a
    /// `data` list degrades to an empty one.
    async fn read_records(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<Record>, AuthError> {
        let body = self.get_json(path, query).await?;

        match body.get("data").and_then(Value::as_array) {
            Some(items) => Ok(items.iter().filter_map(Value::as_object).cloned().collect()),
            None => {
                log::warn!("graph response for {path} carried no data list");
                Ok(Vec::new())
            }
        }
    }

    /// Advertising accounts reachable from the credential's user.
    pub async fn list_ad_accounts(&self, credential: &str) -> Result<Vec<Record>, AuthError> {
        self.read_records(
            "me/adaccounts",
            &[
                ("fields", "account_id,id,name"),
                ("access_token", credential),
            ],
        )
        .await
    }

    /// Campaigns under one advertising account.
    pub async fn list_campaigns(
        &self,
        credential: &str,
        account_id: &str,
    ) -> Result<Vec<Record>, AuthError> {
        self.read_records(
            &format!("act_{account_id}/campaigns"),
            &[
                ("fields", "id,name,status,effective_status,objective"),
                ("access_token", credential),
            ],
        )
        .await
    }

    /// Ads under one campaign.
    pub async fn list_ads(
        &self,
        credential: &str,
        campaign_id: &str,
    ) -> Result<Vec<Record>, AuthError> {
        self.read_records(
            &format!("{campaign_id}/ads"),
            &[("fields", "id,name,status"), ("access_token", credential)],
        )
        .await
    }

    /// Ad-level performance records for a date window. The raw records
    /// keep their nested breakdown lists; flattening is the caller's
    /// concern.
    pub async fn ad_insights(
        &self,
        credential: &str,
        ad_id: &str,
        since: &str,
        until: &str,
    ) -> Result<Vec<Record>, AuthError> {
        let time_range = format!("{{\"since\":\"{since}\",\"until\":\"{until}\"}}");
        self.read_records(
            &format!("{ad_id}/insights"),
            &[
                ("time_range", time_range.as_str()),
                ("access_token", credential),
            ],
        )
        .await
    }
}

#[async_trait::async_trait]
impl TokenEndpoints for MetaProvider {
    async fn validate(&self, credential: &str, identity: &AppIdentity) -> Validation {
        let proof = identity.proof();
        let query = [
            ("input_token", credential),
            ("access_token", proof.as_str()),
        ];

        match self.get_json("debug_token", &query).await {
            Ok(body) => interpret_introspection(&body),
            Err(err) => {
                log::warn!("token introspection unavailable: {err}");
                Validation::invalid()
            }
        }
    }

    async fn refresh(
        &self,
        credential: &str,
        identity: &AppIdentity,
    ) -> Result<Credential, AuthError> {
        let query = [
            ("grant_type", "fb_exchange_token"),
            ("client_id", identity.app_id.as_str()),
            ("client_secret", identity.app_secret.as_str()),
            ("fb_exchange_token", credential),
        ];

        let body = self.get_json("oauth/access_token", &query).await?;
        let exchange: ExchangeResponse = serde_json::from_value(body).map_err(|err| {
            log::warn!("token exchange response did not decode: {err}");
            AuthError::RefreshFailed
        })?;

        let token = exchange.access_token.ok_or(AuthError::RefreshFailed)?;
        let expires_at = exchange
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs));

        Ok(Credential::new(&token, expires_at))
    }

    async fn whoami(&self, credential: &str) -> Result<String, AuthError> {
        let body = self
            .get_json("me", &[("access_token", credential)])
            .await?;

        body.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(AuthError::TokenInvalid)
    }
}

/// Reads an introspection body. Anything short of a `data` object with
/// `is_valid == true` counts as invalid; `expires_at` (unix seconds)
/// becomes a remaining lifetime only when it lies in the future.
pub fn interpret_introspection(body: &Value) -> Validation {
    let data = match body.get("data") {
        Some(Value::Object(data)) => data,
        _ => return Validation::invalid(),
    };

    if data.get("is_valid").and_then(Value::as_bool) != Some(true) {
        return Validation::invalid();
    }

    let expires_in = data
        .get("expires_at")
        .and_then(Value::as_i64)
        .map(|at| at - Utc::now().timestamp())
        .filter(|secs| *secs > 0);

    Validation {
        valid: true,
        expires_in,
    }
}

/// Date of the previous day, formatted the way insight windows expect.
pub fn yesterday() -> String {
    (Utc::now() - Duration::days(1)).format("%Y-%m-%d").to_string()
}
