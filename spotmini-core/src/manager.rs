//! The credential lifecycle manager.
//!
//! [`CredentialManager`] is the single entry point callers use to get a
//! usable bearer token. On every [`authenticate`](CredentialManager::authenticate)
//! call it re-reads the store and classifies what it finds:
//!
//! | Stored credential         | State           | Action                          |
//! |---------------------------|-----------------|---------------------------------|
//! | absent or unreadable      | `Missing`       | login, persist, return          |
//! | `now < expiry`            | `Valid`         | return as-is, no network        |
//! | `now >= expiry`           | `Expired`       | refresh, persist, return        |
//! | refresh grant failed      | `RefreshFailed` | login, persist, return          |
//!
//! [`authenticate_without_login`](CredentialManager::authenticate_without_login)
//! follows the same table but stops with [`AuthError::LoginRequired`] wherever
//! a login would start, for callers that own the terminal.
//!
//! Processes never share memory. The daemon and foreground commands only see
//! each other's refreshes through the store, which is why nothing is cached.

use chrono::{DateTime, Utc};

use crate::config::Settings;
use crate::credential::Credential;
use crate::error::{AuthError, SpotminiError};
use crate::exchange::TokenExchanger;
use crate::login::{AuthorizationCodeSource, LoginFlow};
use crate::provider::ClientCredentials;
use crate::store::{FileTokenStore, StoreError, TokenStore};

/// Classification of the stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    Missing,
    Valid,
    Expired,
    RefreshFailed,
}

impl CredentialState {
    /// Classify `stored` at instant `now`.
    pub fn classify(stored: Option<&Credential>, now: DateTime<Utc>) -> Self {
        match stored {
            None => Self::Missing,
            Some(credential) if credential.is_valid_at(now) => Self::Valid,
            Some(_) => Self::Expired,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::Valid => "valid",
            Self::Expired => "expired",
            Self::RefreshFailed => "refresh-failed",
        }
    }
}

impl std::fmt::Display for CredentialState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Load and classify whatever `store` holds, without touching the network.
///
/// An unreadable credential counts as missing.
pub async fn inspect_store<S: TokenStore + ?Sized>(
    store: &S,
    now: DateTime<Utc>,
) -> (CredentialState, Option<Credential>) {
    let stored = load_stored(store).await;
    (CredentialState::classify(stored.as_ref(), now), stored)
}

async fn load_stored<S: TokenStore + ?Sized>(store: &S) -> Option<Credential> {
    match store.load().await {
        Ok(credential) => Some(credential),
        Err(StoreError::NotFound { .. }) => None,
        Err(e) => {
            tracing::warn!("Ignoring unreadable stored credential: {}", e);
            None
        }
    }
}

/// Credential manager wired to the on-disk store and the browser login.
pub type DefaultCredentialManager = CredentialManager<FileTokenStore, LoginFlow>;

/// Orchestrates the store, the token exchanger and the login flow.
///
/// # Type Parameters
///
/// * `S` - The credential store
/// * `L` - Where authorization codes come from when a full login is needed
pub struct CredentialManager<S, L> {
    store: S,
    exchanger: TokenExchanger,
    login: L,
}

impl DefaultCredentialManager {
    /// Build the production manager from settings and client credentials.
    pub fn from_settings(
        settings: &Settings,
        credentials: ClientCredentials,
    ) -> Result<Self, SpotminiError> {
        let provider = settings.provider();
        let store = FileTokenStore::open(&settings.token_path)?;
        let login = LoginFlow::new(provider.clone(), credentials.client_id.clone())
            .with_browser(settings.open_browser)
            .with_timeout(settings.login_timeout());
        let exchanger = TokenExchanger::new(&provider, credentials)?;

        Ok(Self::new(store, exchanger, login))
    }
}

impl<S: TokenStore, L: AuthorizationCodeSource> CredentialManager<S, L> {
    pub fn new(store: S, exchanger: TokenExchanger, login: L) -> Self {
        Self {
            store,
            exchanger,
            login,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Return a usable credential, refreshing or logging in as needed.
    pub async fn authenticate(&self) -> Result<Credential, AuthError> {
        let (state, stored) = inspect_store(&self.store, Utc::now()).await;

        match (state, stored) {
            (CredentialState::Valid, Some(credential)) => {
                tracing::debug!("Using stored access token");
                Ok(credential)
            }
            (CredentialState::Expired, Some(credential)) => {
                match self.refresh(&credential).await {
                    Ok(refreshed) => Ok(refreshed),
                    Err(e) => {
                        tracing::warn!(
                            "{}: {}, restarting login flow",
                            CredentialState::RefreshFailed,
                            e
                        );
                        self.login_replacing(Some(&credential)).await
                    }
                }
            }
            _ => {
                tracing::info!("No stored credential, starting login flow");
                self.login_replacing(None).await
            }
        }
    }

    /// Like [`authenticate`](Self::authenticate), but never starts a login.
    ///
    /// Returns [`AuthError::LoginRequired`] when nothing is stored or the
    /// refresh grant fails.
    pub async fn authenticate_without_login(&self) -> Result<Credential, AuthError> {
        match inspect_store(&self.store, Utc::now()).await {
            (CredentialState::Valid, Some(credential)) => Ok(credential),
            (CredentialState::Expired, Some(credential)) => {
                self.refresh(&credential).await.map_err(|e| {
                    tracing::warn!("{}: {}", CredentialState::RefreshFailed, e);
                    AuthError::LoginRequired
                })
            }
            _ => Err(AuthError::LoginRequired),
        }
    }

    /// Run the login flow regardless of what is stored.
    pub async fn login(&self) -> Result<Credential, AuthError> {
        let stored = load_stored(&self.store).await;
        self.login_replacing(stored.as_ref()).await
    }

    async fn refresh(&self, stored: &Credential) -> Result<Credential, AuthError> {
        if !stored.can_refresh() {
            return Err(AuthError::MalformedResponse {
                message: "stored credential has no refresh token".to_string(),
            });
        }

        tracing::info!("Access token expired, attempting refresh");
        let refreshed = self.exchanger.exchange_refresh_token(&stored.refresh_token).await?;
        self.persist(&refreshed).await;

        tracing::info!("Successfully refreshed access token");
        Ok(refreshed)
    }

    async fn login_replacing(&self, previous: Option<&Credential>) -> Result<Credential, AuthError> {
        let code = self.login.obtain_code().await?;
        let mut credential = self.exchanger.exchange_authorization_code(&code).await?;
        if let Some(previous) = previous {
            credential = credential.inherit_refresh_token(&previous.refresh_token);
        }
        self.persist(&credential).await;

        tracing::info!("Login complete");
        Ok(credential)
    }

    async fn persist(&self, credential: &Credential) {
        if let Err(e) = self.store.save(credential).await {
            tracing::warn!("Failed to persist credential: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::Secret;
    use crate::provider::ProviderConfig;
    use crate::store::MemoryTokenStore;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct NoLogin;

    #[async_trait]
    impl AuthorizationCodeSource for NoLogin {
        async fn obtain_code(&self) -> Result<String, AuthError> {
            Err(AuthError::Login {
                message: "login disabled in test".to_string(),
            })
        }
    }

    fn credential(expiry: DateTime<Utc>) -> Credential {
        Credential {
            access_token: Secret::new("A1"),
            token_type: "Bearer".to_string(),
            refresh_token: Secret::new("R1"),
            expires_in: 3600,
            expiry,
        }
    }

    fn manager(store: MemoryTokenStore) -> CredentialManager<MemoryTokenStore, NoLogin> {
        let provider = ProviderConfig::spotify().with_token_url("http://127.0.0.1:1/api/token");
        let exchanger = TokenExchanger::new(&provider, ClientCredentials::new("c", "s")).unwrap();
        CredentialManager::new(store, exchanger, NoLogin)
    }

    #[test]
    fn test_classify() {
        let now = Utc::now();
        assert_eq!(CredentialState::classify(None, now), CredentialState::Missing);
        assert_eq!(
            CredentialState::classify(Some(&credential(now + ChronoDuration::seconds(1))), now),
            CredentialState::Valid
        );
        assert_eq!(
            CredentialState::classify(Some(&credential(now)), now),
            CredentialState::Expired
        );
    }

    #[tokio::test]
    async fn test_inspect_store_reports_state() {
        let now = Utc::now();
        let (state, stored) = inspect_store(&MemoryTokenStore::new(), now).await;
        assert_eq!(state, CredentialState::Missing);
        assert!(stored.is_none());

        let store = MemoryTokenStore::with_credential(credential(now + ChronoDuration::hours(1)));
        assert_eq!(inspect_store(&store, now).await.0, CredentialState::Valid);

        let store = MemoryTokenStore::with_credential(credential(now));
        let (state, stored) = inspect_store(&store, now).await;
        assert_eq!(state, CredentialState::Expired);
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_missing_without_login_is_terminal() {
        let manager = manager(MemoryTokenStore::new());

        let result = manager.authenticate().await;
        assert!(matches!(result, Err(AuthError::Login { .. })));
    }

    #[tokio::test]
    async fn test_authenticate_without_login_never_starts_login() {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ProviderConfig::spotify().with_token_url("http://127.0.0.1:1/api/token");
        let exchanger = TokenExchanger::new(&provider, ClientCredentials::new("c", "s")).unwrap();
        let login = CountingLogin {
            calls: Arc::clone(&calls),
        };
        let manager = CredentialManager::new(MemoryTokenStore::new(), exchanger, login);

        let result = manager.authenticate_without_login().await;

        assert!(matches!(result, Err(AuthError::LoginRequired)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_authenticate_without_login_reports_failed_refresh() {
        // The token endpoint is unreachable, so the refresh grant fails.
        let manager = manager_with(credential(Utc::now() - ChronoDuration::minutes(1)));

        let result = manager.authenticate_without_login().await;
        assert!(matches!(result, Err(AuthError::LoginRequired)));
    }

    #[tokio::test]
    async fn test_authenticate_without_login_returns_valid_token() {
        let manager = manager_with(credential(Utc::now() + ChronoDuration::hours(1)));

        let credential = manager.authenticate_without_login().await.unwrap();
        assert_eq!(credential.access_token.expose(), "A1");
    }

    struct CountingLogin {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AuthorizationCodeSource for CountingLogin {
        async fn obtain_code(&self) -> Result<String, AuthError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("C1".to_string())
        }
    }

    fn manager_with(stored: Credential) -> CredentialManager<MemoryTokenStore, NoLogin> {
        manager(MemoryTokenStore::with_credential(stored))
    }
}
