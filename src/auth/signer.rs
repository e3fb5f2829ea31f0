use crate::AuthError;
use crate::config::SignerConfig;
use serde::Deserialize;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// A challenge signature and the public identity that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedChallenge {
    pub signature: Vec<u8>,
    pub identity: String,
}

impl SignedChallenge {
    pub fn signature_hex(&self) -> String {
        hex::encode(&self.signature)
    }
}

/// Signs authentication challenges with a wallet key. May prompt the user.
pub trait WalletSigner: Send + Sync {
    fn sign(&self, wallet_name: &str, challenge_text: &str) -> Result<SignedChallenge, AuthError>;
}

/// Delegates signing to an external command.
///
/// The command receives `PRECOG_CHALLENGE`, `PRECOG_WALLET_NAME` and
/// `PRECOG_WALLET_PATH` in its environment, shares the terminal for password
/// prompts, and prints `{"signature": "<hex>", "identity": "<address>"}`.
#[derive(Debug, Clone)]
pub struct CommandSigner {
    program: Option<String>,
    args: Vec<String>,
    wallet_path: PathBuf,
}

#[derive(Deserialize)]
struct SignerOutput {
    signature: String,
    identity: String,
}

impl CommandSigner {
    pub fn new(program: impl Into<String>, args: Vec<String>, wallet_path: PathBuf) -> Self {
        CommandSigner {
            program: Some(program.into()),
            args,
            wallet_path,
        }
    }

    /// A missing `[signer] command` only fails once a signature is actually needed
    pub fn from_config(config: &SignerConfig, wallet_path: PathBuf) -> Self {
        CommandSigner {
            program: config.command.clone().filter(|c| !c.trim().is_empty()),
            args: config.args.clone(),
            wallet_path,
        }
    }
}

impl WalletSigner for CommandSigner {
    fn sign(&self, wallet_name: &str, challenge_text: &str) -> Result<SignedChallenge, AuthError> {
        let program = self.program.as_deref().ok_or_else(|| AuthError::SigningError {
            reason: "no signer command configured (set [signer] command)".to_string(),
        })?;

        let output = Command::new(program)
            .args(&self.args)
            .env("PRECOG_CHALLENGE", challenge_text)
            .env("PRECOG_WALLET_NAME", wallet_name)
            .env("PRECOG_WALLET_PATH", &self.wallet_path)
            .stdin(Stdio::inherit())
            .stderr(Stdio::inherit())
            .stdout(Stdio::piped())
            .output()
            .map_err(|e| AuthError::SigningError {
                reason: format!("failed to run '{}': {}", program, e),
            })?;

        if !output.status.success() {
            return Err(AuthError::SigningError {
                reason: format!("'{}' exited with {}", program, output.status),
            });
        }

        let parsed: SignerOutput =
            serde_json::from_slice(&output.stdout).map_err(|e| AuthError::SigningError {
                reason: format!("unexpected signer output: {}", e),
            })?;

        let hex_signature = parsed.signature.trim();
        let hex_signature = hex_signature.strip_prefix("0x").unwrap_or(hex_signature);
        let signature = hex::decode(hex_signature).map_err(|e| AuthError::SigningError {
            reason: format!("signature is not valid hex: {}", e),
        })?;

        Ok(SignedChallenge {
            signature,
            identity: parsed.identity,
        })
    }
}
