use chrono::{Duration, Utc};
use core_lib::lifetime::human_lifetime;
use core_lib::token::Credential;
use core_lib::{AppIdentity, AuthError, TokenEndpoints};
use store::CredentialStore;

/// Owns the access credential: decides whether the stored value is still
/// usable, exchanges it when it is not, and writes the replacement back
/// under the same key.
pub struct TokenLifecycle<P, S> {
    provider: P,
    store: S,
    key: String,
    identity: AppIdentity,
}

impl<P, S> TokenLifecycle<P, S>
where
    P: TokenEndpoints + Sync,
    S: CredentialStore + Sync,
{
    pub fn new(provider: P, store: S, key: impl Into<String>, identity: AppIdentity) -> Self {
        TokenLifecycle {
            provider,
            store,
            key: key.into(),
            identity,
        }
    }

    /// Guarantees the returned credential is usable for subsequent calls.
    ///
    /// A stored credential that still passes introspection is returned
    /// unchanged, with its remaining lifetime logged. An invalid one is
    /// exchanged and the replacement persisted; the exchange response is
    /// trusted without a second introspection round-trip. Any `Err` means
    /// the caller holds no credential and must not make authenticated
    /// calls.
    pub async fn ensure_valid_credential(&self) -> Result<Credential, AuthError> {
        let current = self
            .store
            .load(&self.key)
            .await?
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                AuthError::ConfigError(format!("no credential stored under {}", self.key))
            })?;

        let validation = self.provider.validate(&current, &self.identity).await;
        if validation.valid {
            match validation.expires_in {
                Some(secs) => log::info!("credential valid, expires in {}", human_lifetime(secs)),
                None => log::info!("credential valid, no expiry reported"),
            }
            let expires_at = validation
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs));
            return Ok(Credential::new(&current, expires_at));
        }

        log::info!("stored credential rejected, exchanging it");
        let fresh = self.provider.refresh(&current, &self.identity).await?;
        self.store.persist(&self.key, &fresh.value).await?;
        log::info!("replacement credential persisted under {}", self.key);

        Ok(fresh)
    }
}
