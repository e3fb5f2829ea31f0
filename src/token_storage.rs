use crate::{AuthError, TokenRecord};

use std::fs;
use std::path::{Path, PathBuf};

/// File-backed token store. Every read goes to disk.
#[derive(Debug, Clone)]
pub struct TokenStorage {
    pub token_file_path: PathBuf,
}

impl TokenStorage {
    pub fn new(token_file_path: impl Into<PathBuf>) -> Self {
        TokenStorage {
            token_file_path: token_file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.token_file_path
    }

    /// Loads the record, or the empty record when the file is missing or unreadable
    pub fn load(&self) -> TokenRecord {
        match self.load_from_file() {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!("No token file at {:?}", self.token_file_path);
                TokenRecord::default()
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable token file: {}", e);
                TokenRecord::default()
            }
        }
    }

    fn load_from_file(&self) -> Result<Option<TokenRecord>, AuthError> {
        if !self.token_file_path.exists() {
            return Ok(None);
        }

        let token_json =
            fs::read_to_string(&self.token_file_path).map_err(|e| AuthError::StorageError {
                reason: format!("Failed to read token file: {}", e),
            })?;

        if token_json.trim().is_empty() {
            return Ok(None);
        }

        let record: TokenRecord =
            serde_json::from_str(&token_json).map_err(|e| AuthError::StorageError {
                reason: format!("Failed to deserialize token file: {}", e),
            })?;

        Ok(Some(record))
    }

    /// Overwrites the token file, creating its parent directory if needed
    pub fn save(&self, record: &TokenRecord) -> Result<(), AuthError> {
        if let Some(parent) = self.token_file_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| AuthError::StorageError {
                reason: format!("Failed to create token directory: {}", e),
            })?;
        }

        let token_json =
            serde_json::to_string_pretty(record).map_err(|e| AuthError::StorageError {
                reason: format!("Failed to serialize tokens: {}", e),
            })?;

        fs::write(&self.token_file_path, token_json).map_err(|e| AuthError::StorageError {
            reason: format!("Failed to write token file: {}", e),
        })?;

        tracing::debug!("Tokens saved to {:?}", self.token_file_path);
        Ok(())
    }
}
