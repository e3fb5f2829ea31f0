use chrono::{DateTime, Duration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::errors::AuthError;

/// Persisted authentication state. The token file is the only source of truth;
/// nothing here is cached between calls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "StoredTokens")]
pub struct TokenRecord {
    #[serde(serialize_with = "serialize_secret_option")]
    pub access_token: Option<SecretString>,
    #[serde(serialize_with = "serialize_secret_option")]
    pub refresh_token: Option<SecretString>,
    pub access_token_expires_at: Option<DateTime<Utc>>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
    pub wallet_name: Option<String>,
    pub api_url: Option<String>,
}

impl TokenRecord {
    /// A record without an access token counts as no record at all
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_ref().map(|t| t.expose_secret().as_str())
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret().as_str())
    }

    /// Builds a full record from a successful authenticate response
    pub fn from_response(
        response: TokenResponse,
        now: DateTime<Utc>,
        wallet_name: &str,
        api_url: &str,
    ) -> Result<Self, AuthError> {
        let mut record = TokenRecord {
            wallet_name: Some(wallet_name.to_string()),
            api_url: Some(api_url.to_string()),
            ..Default::default()
        };
        record.apply_response(response, now)?;
        Ok(record)
    }

    /// Replaces token fields with a refresh response, keeping wallet and API URL.
    ///
    /// The record is left as is when a lifetime cannot be represented.
    pub fn apply_response(
        &mut self,
        response: TokenResponse,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let refresh_expires_in = response.refresh_expires_in.unwrap_or(response.expires_in);
        let access_expires_at = expires_at(now, response.expires_in)?;
        let refresh_expires_at = expires_at(now, refresh_expires_in)?;

        self.access_token = Some(SecretString::new(response.access_token));
        self.refresh_token = Some(SecretString::new(response.refresh_token));
        self.access_token_expires_at = Some(access_expires_at);
        self.refresh_token_expires_at = Some(refresh_expires_at);
        Ok(())
    }
}

fn expires_at(now: DateTime<Utc>, seconds: i64) -> Result<DateTime<Utc>, AuthError> {
    Duration::try_seconds(seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .ok_or(AuthError::InvalidExpiry { seconds })
}

/// On-disk layout, including the key names written by older client versions.
#[derive(Debug, Default, Deserialize)]
struct StoredTokens {
    access_token: Option<String>,
    refresh_token: Option<String>,
    access_token_expires_at: Option<DateTime<Utc>>,
    refresh_token_expires_at: Option<DateTime<Utc>>,
    // legacy keys
    access_expires_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    refresh_expires_at: Option<DateTime<Utc>>,
    #[serde(alias = "wallet")]
    wallet_name: Option<String>,
    api_url: Option<String>,
}

impl From<StoredTokens> for TokenRecord {
    fn from(stored: StoredTokens) -> Self {
        // `expires_at` meant the refresh expiry once `access_expires_at` existed,
        // and the access expiry before that.
        let (legacy_access, legacy_refresh) = if stored.access_expires_at.is_some() {
            (stored.access_expires_at, stored.expires_at)
        } else {
            (stored.expires_at, stored.refresh_expires_at)
        };

        TokenRecord {
            access_token: non_empty(stored.access_token).map(SecretString::new),
            refresh_token: non_empty(stored.refresh_token).map(SecretString::new),
            access_token_expires_at: stored.access_token_expires_at.or(legacy_access),
            refresh_token_expires_at: stored.refresh_token_expires_at.or(legacy_refresh),
            wallet_name: stored.wallet_name,
            api_url: stored.api_url,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

pub fn serialize_secret_option<S>(
    secret: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::ser::Serializer,
{
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

/// `GET /auth/challenge`
#[derive(Debug, Clone, Deserialize)]
pub struct AuthChallenge {
    pub challenge_id: String,
    pub challenge_text: String,
}

/// `POST /auth/authenticate` body
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticateRequest {
    pub challenge_id: String,
    pub signature: String,
    #[serde(rename = "coldkey")]
    pub identity: String,
}

/// `POST /auth/refresh` body
#[derive(Debug, Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// Response of both `/auth/authenticate` and `/auth/refresh`
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// seconds
    pub expires_in: i64,
    #[serde(default)]
    pub refresh_expires_in: Option<i64>,
}

/// `GET /auth/requirements`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthRequirements {
    #[serde(default)]
    pub minimum_alpha_stake: Option<f64>,
    #[serde(default)]
    pub netuid: Option<u16>,
}

/// The part of a paginated response the paginator reads. Everything else is opaque.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub has_next: bool,
}

impl Pagination {
    /// Reads `pagination` out of a page body. A missing or malformed envelope means no further pages.
    pub fn from_page(body: &serde_json::Value) -> Self {
        body.get("pagination")
            .and_then(|p| serde_json::from_value(p.clone()).ok())
            .unwrap_or_default()
    }
}
