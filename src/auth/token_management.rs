use crate::{TokenRecord, token_storage::TokenStorage};

impl super::AuthManager {
    /// Loads the current token record from storage
    pub fn load_tokens(&self) -> TokenRecord {
        self.token_storage.load()
    }

    /// Returns the stored access token, if any. Expiry is not checked here.
    pub fn access_token(&self) -> Option<String> {
        self.token_storage.load().access_token().map(str::to_string)
    }

    pub fn token_storage(&self) -> &TokenStorage {
        &self.token_storage
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn wallet_name(&self) -> Option<&str> {
        self.wallet_name.as_deref()
    }
}
