//! Authentication for the Precog API
//!
//! Challenge/response authentication against a wallet signature, the
//! refresh-token exchange, and the expiry rules that decide between them.
//! All state lives in the token file; [`AuthManager`] reloads it on every call.

mod core;
mod expiry;
mod refresh;
mod signer;
mod token_management;

pub use self::core::AuthOutcome;
pub use expiry::{
    MAX_EXPIRY_BUFFER_SECS, MIN_EXPIRY_BUFFER_SECS, expiry_buffer, is_expired, is_expired_at,
};
pub use refresh::{REFRESH_WINDOW_SECS, RefreshDecision, refresh_decision};
pub use signer::{CommandSigner, SignedChallenge, WalletSigner};

use crate::{AuthError, config::Config, token_storage::TokenStorage};
use std::time::Duration;

pub struct AuthManager {
    pub(in crate::auth) http: reqwest::Client,
    pub(in crate::auth) api_url: String,
    pub(in crate::auth) wallet_name: Option<String>,
    pub(in crate::auth) token_storage: TokenStorage,
}

impl AuthManager {
    /// Creates an AuthManager from the loaded configuration
    pub fn new(config: &Config) -> Result<Self, AuthError> {
        let http = build_http_client(config.api.timeout_sec)?;

        Ok(AuthManager {
            http,
            api_url: config.api_base_url().to_string(),
            wallet_name: config.wallet.name.clone(),
            token_storage: TokenStorage::new(config.token_file()),
        })
    }

    /// Creates an AuthManager around an existing HTTP client and token store
    pub fn with_client(
        http: reqwest::Client,
        api_url: impl Into<String>,
        wallet_name: Option<String>,
        token_storage: TokenStorage,
    ) -> Self {
        AuthManager {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            wallet_name,
            token_storage,
        }
    }
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager")
            .field("api_url", &self.api_url)
            .field("wallet_name", &self.wallet_name)
            .field("token_storage", &self.token_storage)
            .finish()
    }
}

pub(crate) fn build_http_client(timeout_sec: u64) -> Result<reqwest::Client, AuthError> {
    reqwest::Client::builder()
        .user_agent(format!("precog-client/{}", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_sec))
        .build()
        .map_err(|e| AuthError::Generic {
            reason: format!("Failed to create HTTP client: {}", e),
        })
}
