use token::{Credential, Validation};

pub mod lifetime;
pub mod token;

/// Represents an error that can occur during token lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error("token introspection rejected the credential")]
    TokenInvalid,

    #[error("token exchange returned no replacement token")]
    RefreshFailed,

    #[error("credential store write failed: {0}")]
    PersistFailed(String),

    #[error("remote call failed: {0}")]
    RemoteCallFailed(String),
}

/// The (app id, app secret) pair identifying the calling application to
/// the token service. Read once from configuration, immutable afterwards.
#[derive(Debug, Clone)]
pub struct AppIdentity {
    pub app_id: String,
    pub app_secret: String,
}

impl AppIdentity {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        AppIdentity {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    /// App-level proof in the `{app_id}|{app_secret}` form the
    /// introspection endpoint expects as its `access_token` parameter.
    pub fn proof(&self) -> String {
        format!("{}|{}", self.app_id, self.app_secret)
    }
}

/// Defines the token operations any ads-platform provider must implement.
#[async_trait::async_trait]
pub trait TokenEndpoints {
    /// Introspects a credential against the remote token-debug endpoint.
    ///
    /// Never fails outright: transport errors and malformed or ambiguous
    /// responses all degrade to `valid == false`.
    async fn validate(&self, credential: &str, identity: &AppIdentity) -> Validation;

    /// Exchanges the current (possibly near-expired) credential for a
    /// fresh long-lived one.
    async fn refresh(
        &self,
        credential: &str,
        identity: &AppIdentity,
    ) -> Result<Credential, AuthError>;

    /// Resolves the identity behind a credential. Success means the
    /// remote side answered with an id.
    async fn whoami(&self, credential: &str) -> Result<String, AuthError>;
}
