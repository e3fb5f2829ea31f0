use super::core::check_status;
use crate::{AuthError, RefreshRequest, TokenRecord, TokenResponse};
use chrono::{DateTime, Duration, Utc};

/// Refresh once the access token has less than this many seconds left
pub const REFRESH_WINDOW_SECS: i64 = 30;

/// Why a refresh is or is not attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshDecision {
    NoRefreshToken,
    /// The refresh token itself is dead; only re-authentication helps
    RefreshTokenExpired,
    UnknownAccessExpiry,
    NotDue,
    Due,
}

/// Fixed 30 second window, no adaptive buffer. The refresh token expiry is checked strictly.
pub fn refresh_decision(record: &TokenRecord, now: DateTime<Utc>) -> RefreshDecision {
    if record.refresh_token.is_none() {
        return RefreshDecision::NoRefreshToken;
    }

    if let Some(refresh_expires_at) = record.refresh_token_expires_at
        && now >= refresh_expires_at
    {
        return RefreshDecision::RefreshTokenExpired;
    }

    let Some(access_expires_at) = record.access_token_expires_at else {
        return RefreshDecision::UnknownAccessExpiry;
    };

    if now < access_expires_at - Duration::seconds(REFRESH_WINDOW_SECS) {
        return RefreshDecision::NotDue;
    }

    RefreshDecision::Due
}

impl super::AuthManager {
    /// Refreshes the stored tokens when the access token is about to expire.
    ///
    /// Returns true only if a refresh was performed and persisted. Stored state
    /// is left untouched on failure.
    pub async fn refresh_if_needed(&self) -> bool {
        let mut record = self.token_storage.load();

        let decision = refresh_decision(&record, Utc::now());
        if decision != RefreshDecision::Due {
            tracing::debug!("Skipping token refresh: {:?}", decision);
            return false;
        }

        let Some(refresh_token) = record.refresh_token().map(str::to_string) else {
            return false;
        };

        let response = match self.refresh_access_token(&refresh_token).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                return false;
            }
        };

        if let Err(e) = record.apply_response(response, Utc::now()) {
            tracing::warn!("Rejecting refresh response: {}", e);
            return false;
        }
        if let Err(e) = self.token_storage.save(&record) {
            tracing::warn!("Failed to persist refreshed tokens: {}", e);
            return false;
        }

        tracing::info!("Access token refreshed");
        true
    }

    /// Exchanges a refresh token for a new token pair
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, AuthError> {
        let response = self
            .http
            .post(format!("{}/auth/refresh", self.api_url))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}
