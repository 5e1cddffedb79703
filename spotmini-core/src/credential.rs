//! The credential record issued by the token endpoint.
//!
//! This module provides:
//! - [`Secret`] - A wrapper for token strings that keeps them out of logs
//! - [`TokenResponse`] - The raw JSON body returned by the token endpoint
//! - [`Credential`] - The normalized record persisted between invocations

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Seconds subtracted from the provider-reported lifetime when computing
/// [`Credential::expiry`], so a token is never used right at its edge.
pub const EXPIRY_MARGIN_SECS: i64 = 10;

/// A secret value that prevents accidental exposure in logs.
///
/// The inner value is only accessible via [`expose()`](Secret::expose).
/// Debug and Display implementations show `[REDACTED]` instead of the value.
/// Serialized as a plain string.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Create a new secret from a string value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the secret value.
    ///
    /// Use sparingly and never log the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the secret holds an empty string.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl PartialEq for Secret {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Secret {}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Body of a successful token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,

    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Absent on most refresh responses.
    #[serde(default)]
    pub refresh_token: Option<String>,

    #[serde(default)]
    pub expires_in: i64,
}

/// A bearer token with its refresh token and expiry metadata.
///
/// This is the record written to `token.json`. It is only ever replaced as a
/// whole, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token sent with every playback API call.
    pub access_token: Secret,

    /// Token type (always "Bearer" for this provider).
    pub token_type: String,

    /// Refresh token; empty when the provider never issued one.
    #[serde(default)]
    pub refresh_token: Secret,

    /// Lifetime in seconds as reported at issuance.
    pub expires_in: i64,

    /// Instant after which the access token must be refreshed.
    pub expiry: DateTime<Utc>,
}

impl Credential {
    /// Build a credential from a token endpoint response received at `issued_at`.
    ///
    /// The expiry is `issued_at + expires_in - EXPIRY_MARGIN_SECS`. A lifetime
    /// that cannot be represented as an instant is a malformed response.
    pub fn issue(response: TokenResponse, issued_at: DateTime<Utc>) -> Result<Self, AuthError> {
        let expiry = response
            .expires_in
            .checked_sub(EXPIRY_MARGIN_SECS)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or_else(|| AuthError::MalformedResponse {
                message: format!("expires_in out of range: {}", response.expires_in),
            })?;

        Ok(Self {
            access_token: Secret::new(response.access_token),
            token_type: response.token_type,
            refresh_token: Secret::new(response.refresh_token.unwrap_or_default()),
            expires_in: response.expires_in,
            expiry,
        })
    }

    /// Keep `previous` as the refresh token if this credential came back without one.
    pub fn inherit_refresh_token(mut self, previous: &Secret) -> Self {
        if self.refresh_token.is_empty() {
            self.refresh_token = previous.clone();
        }
        self
    }

    /// Whether the access token can still be used at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }

    /// Whether a refresh grant can be attempted.
    pub fn can_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn response(refresh_token: Option<&str>) -> TokenResponse {
        TokenResponse {
            access_token: "access".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: refresh_token.map(String::from),
            expires_in: 3600,
        }
    }

    #[test]
    fn test_issue_applies_expiry_margin() {
        let issued_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let credential = Credential::issue(response(Some("refresh")), issued_at).unwrap();

        assert_eq!(credential.expiry, issued_at + Duration::seconds(3590));
        assert_eq!(credential.expires_in, 3600);
        assert_eq!(credential.refresh_token.expose(), "refresh");
    }

    #[test]
    fn test_inherit_refresh_token_only_when_missing() {
        let issued_at = Utc::now();
        let previous = Secret::new("R1");

        let inherited = Credential::issue(response(None), issued_at)
            .unwrap()
            .inherit_refresh_token(&previous);
        assert_eq!(inherited.refresh_token.expose(), "R1");

        let rotated = Credential::issue(response(Some("R2")), issued_at)
            .unwrap()
            .inherit_refresh_token(&previous);
        assert_eq!(rotated.refresh_token.expose(), "R2");
    }

    #[test]
    fn test_validity_boundary() {
        let issued_at = Utc::now();
        let credential = Credential::issue(response(None), issued_at).unwrap();

        assert!(credential.is_valid_at(credential.expiry - Duration::seconds(1)));
        assert!(!credential.is_valid_at(credential.expiry));
    }

    #[test]
    fn test_unrepresentable_lifetime_is_malformed() {
        let issued_at = Utc::now();

        for expires_in in [i64::MAX, i64::MIN, i64::MAX / 1000] {
            let response = TokenResponse {
                expires_in,
                ..response(None)
            };
            assert!(matches!(
                Credential::issue(response, issued_at),
                Err(AuthError::MalformedResponse { .. })
            ));
        }
    }

    #[test]
    fn test_token_response_defaults() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"A2","expires_in":3600}"#).unwrap();

        assert_eq!(parsed.token_type, "Bearer");
        assert!(parsed.refresh_token.is_none());
    }

    #[test]
    fn test_secret_redacted() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{:?}", secret), "Secret([REDACTED])");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn test_credential_json_layout() {
        let issued_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let credential = Credential::issue(response(Some("refresh")), issued_at).unwrap();
        let value = serde_json::to_value(&credential).unwrap();

        assert_eq!(value["access_token"], "access");
        assert_eq!(value["token_type"], "Bearer");
        assert_eq!(value["refresh_token"], "refresh");
        assert_eq!(value["expires_in"], 3600);
        assert!(value["expiry"].as_str().unwrap().starts_with("2024-05-01T12:59:50"));
    }
}
