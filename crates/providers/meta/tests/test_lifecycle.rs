#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use core_lib::token::{Credential, Validation};
    use core_lib::{AppIdentity, AuthError, TokenEndpoints};
    use meta::TokenLifecycle;
    use store::CredentialStore;

    struct StubEndpoints {
        validation: Validation,
        refresh_to: Option<String>,
        refresh_calls: Arc<AtomicUsize>,
    }

    impl StubEndpoints {
        fn valid() -> (Self, Arc<AtomicUsize>) {
            let refresh_calls = Arc::new(AtomicUsize::new(0));
            let stub = StubEndpoints {
                validation: Validation {
                    valid: true,
                    expires_in: Some(7200),
                },
                refresh_to: None,
                refresh_calls: refresh_calls.clone(),
            };
            (stub, refresh_calls)
        }

        fn invalid(refresh_to: Option<&str>) -> (Self, Arc<AtomicUsize>) {
            let refresh_calls = Arc::new(AtomicUsize::new(0));
            let stub = StubEndpoints {
                validation: Validation::invalid(),
                refresh_to: refresh_to.map(str::to_string),
                refresh_calls: refresh_calls.clone(),
            };
            (stub, refresh_calls)
        }
    }

    #[async_trait::async_trait]
    impl TokenEndpoints for StubEndpoints {
        async fn validate(&self, _credential: &str, _identity: &AppIdentity) -> Validation {
            self.validation.clone()
        }

        async fn refresh(
            &self,
            _credential: &str,
            _identity: &AppIdentity,
        ) -> Result<Credential, AuthError> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            match &self.refresh_to {
                Some(token) => Ok(Credential::new(token, None)),
                None => Err(AuthError::RefreshFailed),
            }
        }

        async fn whoami(&self, _credential: &str) -> Result<String, AuthError> {
            Ok("42".to_string())
        }
    }

    struct MemoryStore {
        values: Arc<Mutex<HashMap<String, String>>>,
        persist_calls: Arc<AtomicUsize>,
    }

    struct StoreProbe {
        values: Arc<Mutex<HashMap<String, String>>>,
        persist_calls: Arc<AtomicUsize>,
    }

    impl StoreProbe {
        fn persists(&self) -> usize {
            self.persist_calls.load(Ordering::SeqCst)
        }

        fn value(&self, key: &str) -> Option<String> {
            self.values.lock().unwrap().get(key).cloned()
        }
    }

    impl MemoryStore {
        fn with_token(key: &str, value: &str) -> (Self, StoreProbe) {
            let mut initial = HashMap::new();
            initial.insert(key.to_string(), value.to_string());
            Self::from_map(initial)
        }

        fn empty() -> (Self, StoreProbe) {
            Self::from_map(HashMap::new())
        }

        fn from_map(initial: HashMap<String, String>) -> (Self, StoreProbe) {
            let values = Arc::new(Mutex::new(initial));
            let persist_calls = Arc::new(AtomicUsize::new(0));
            let probe = StoreProbe {
                values: values.clone(),
                persist_calls: persist_calls.clone(),
            };
            (
                MemoryStore {
                    values,
                    persist_calls,
                },
                probe,
            )
        }
    }

    #[async_trait::async_trait]
    impl CredentialStore for MemoryStore {
        async fn load(&self, key: &str) -> Result<Option<String>, AuthError> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        async fn persist(&self, key: &str, value: &str) -> Result<(), AuthError> {
            self.persist_calls.fetch_add(1, Ordering::SeqCst);
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
    }

    fn identity() -> AppIdentity {
        AppIdentity::new("1", "s3cret")
    }

    #[tokio::test]
    async fn test_valid_credential_returned_unchanged() {
        let (provider, _) = StubEndpoints::valid();
        let (store, _) = MemoryStore::with_token("ACCESS_TOKEN_META", "still-good");
        let lifecycle = TokenLifecycle::new(provider, store, "ACCESS_TOKEN_META", identity());

        let credential = lifecycle.ensure_valid_credential().await.unwrap();
        assert_eq!(credential.value, "still-good");
        assert!(!credential.is_expired());
    }

    #[tokio::test]
    async fn test_repeated_calls_on_valid_credential_have_no_side_effects() {
        let (provider, refresh_calls) = StubEndpoints::valid();
        let (store, probe) = MemoryStore::with_token("ACCESS_TOKEN_META", "still-good");
        let lifecycle = TokenLifecycle::new(provider, store, "ACCESS_TOKEN_META", identity());

        let first = lifecycle.ensure_valid_credential().await.unwrap();
        let second = lifecycle.ensure_valid_credential().await.unwrap();

        assert_eq!(first.value, second.value);
        assert_eq!(refresh_calls.load(Ordering::SeqCst), 0);
        assert_eq!(probe.persists(), 0);
        assert_eq!(probe.value("ACCESS_TOKEN_META").as_deref(), Some("still-good"));
    }

    #[tokio::test]
    async fn test_invalid_credential_is_exchanged_and_persisted() {
        let (provider, refresh_calls) = StubEndpoints::invalid(Some("fresh-token"));
        let (store, probe) = MemoryStore::with_token("ACCESS_TOKEN_META", "stale");
        let lifecycle = TokenLifecycle::new(provider, store, "ACCESS_TOKEN_META", identity());

        let credential = lifecycle.ensure_valid_credential().await.unwrap();

        assert_eq!(credential.value, "fresh-token");
        assert_eq!(refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(probe.persists(), 1);
        assert_eq!(probe.value("ACCESS_TOKEN_META").as_deref(), Some("fresh-token"));
    }

    #[tokio::test]
    async fn test_refresh_failure_yields_no_credential() {
        let (provider, _) = StubEndpoints::invalid(None);
        let (store, probe) = MemoryStore::with_token("ACCESS_TOKEN_META", "stale");
        let lifecycle = TokenLifecycle::new(provider, store, "ACCESS_TOKEN_META", identity());

        let result = lifecycle.ensure_valid_credential().await;

        assert!(matches!(result, Err(AuthError::RefreshFailed)));
        assert_eq!(probe.persists(), 0);
        assert_eq!(probe.value("ACCESS_TOKEN_META").as_deref(), Some("stale"));
    }

    #[tokio::test]
    async fn test_missing_stored_credential_is_config_error() {
        let (provider, refresh_calls) = StubEndpoints::valid();
        let (store, _) = MemoryStore::empty();
        let lifecycle = TokenLifecycle::new(provider, store, "ACCESS_TOKEN_META", identity());

        let result = lifecycle.ensure_valid_credential().await;

        assert!(matches!(result, Err(AuthError::ConfigError(_))));
        assert_eq!(refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_stored_credential_is_config_error() {
        let (provider, _) = StubEndpoints::valid();
        let (store, _) = MemoryStore::with_token("ACCESS_TOKEN_META", "");
        let lifecycle = TokenLifecycle::new(provider, store, "ACCESS_TOKEN_META", identity());

        let result = lifecycle.ensure_valid_credential().await;
        assert!(matches!(result, Err(AuthError::ConfigError(_))));
    }
}
