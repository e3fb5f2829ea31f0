use super::expiry::is_expired;
use super::signer::{SignedChallenge, WalletSigner};
use crate::{
    AuthChallenge, AuthError, AuthRequirements, AuthenticateRequest, TokenRecord, TokenResponse,
};
use chrono::Utc;
use std::sync::Arc;

/// How an authentication attempt finished
#[derive(Debug, Clone)]
pub enum AuthOutcome {
    /// A usable access token was already stored; no network call was made
    AlreadyAuthenticated(TokenRecord),
    /// A new token pair was obtained and persisted
    Authenticated(TokenRecord),
}

impl AuthOutcome {
    pub fn record(&self) -> &TokenRecord {
        match self {
            AuthOutcome::AlreadyAuthenticated(record) | AuthOutcome::Authenticated(record) => {
                record
            }
        }
    }
}

impl super::AuthManager {
    /// Runs challenge -> sign -> exchange -> persist, unless a valid access token is already stored.
    ///
    /// Nothing is written unless every step succeeds, and a failure is never retried.
    pub async fn authenticate(
        &self,
        signer: Arc<dyn WalletSigner>,
    ) -> Result<AuthOutcome, AuthError> {
        let wallet_name = self
            .wallet_name
            .as_deref()
            .ok_or(AuthError::WalletNotConfigured)?;

        let existing = self.token_storage.load();
        if !existing.is_empty() && !is_expired(existing.access_token_expires_at) {
            tracing::info!("Valid tokens found in {:?}", self.token_storage.path());
            return Ok(AuthOutcome::AlreadyAuthenticated(existing));
        }
        if !existing.is_empty() {
            tracing::info!("Stored access token has expired, re-authenticating");
        }

        tracing::info!("Authenticating with wallet: {}", wallet_name);

        let challenge = self.request_challenge().await?;
        tracing::debug!("Received challenge {}", challenge.challenge_id);

        let signed = sign_challenge(signer, wallet_name, &challenge.challenge_text).await?;
        tracing::debug!("Challenge signed by {}", signed.identity);

        let response = self.exchange_signature(&challenge, &signed).await?;

        let record =
            TokenRecord::from_response(response, Utc::now(), wallet_name, &self.api_url)?;
        self.token_storage.save(&record)?;

        tracing::info!("Authentication successful, tokens saved");
        Ok(AuthOutcome::Authenticated(record))
    }

    /// Boolean form of [`authenticate`](Self::authenticate); failures are logged
    pub async fn setup_authentication(&self, signer: Arc<dyn WalletSigner>) -> bool {
        match self.authenticate(signer).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Authentication failed: {}", e);
                false
            }
        }
    }

    async fn request_challenge(&self) -> Result<AuthChallenge, AuthError> {
        let response = self
            .http
            .get(format!("{}/auth/challenge", self.api_url))
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn exchange_signature(
        &self,
        challenge: &AuthChallenge,
        signed: &SignedChallenge,
    ) -> Result<TokenResponse, AuthError> {
        let body = AuthenticateRequest {
            challenge_id: challenge.challenge_id.clone(),
            signature: signed.signature_hex(),
            identity: signed.identity.clone(),
        };

        let response = self
            .http
            .post(format!("{}/auth/authenticate", self.api_url))
            .json(&body)
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Fetches the stake requirements for API access. Unauthenticated.
    pub async fn fetch_requirements(&self) -> Result<AuthRequirements, AuthError> {
        let response = self
            .http
            .get(format!("{}/auth/requirements", self.api_url))
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}

/// Runs the signer on the blocking pool. It may wait on a password prompt.
async fn sign_challenge(
    signer: Arc<dyn WalletSigner>,
    wallet_name: &str,
    challenge_text: &str,
) -> Result<SignedChallenge, AuthError> {
    let wallet_name = wallet_name.to_string();
    let challenge_text = challenge_text.to_string();

    tokio::task::spawn_blocking(move || signer.sign(&wallet_name, &challenge_text))
        .await
        .map_err(|e| AuthError::SigningError {
            reason: format!("signing task failed: {}", e),
        })?
}

pub(in crate::auth) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AuthError::HttpStatus {
        status: status.as_u16(),
        body,
    })
}
