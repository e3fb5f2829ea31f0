use thiserror::Error;

/// Top-level error for the client and the CLI
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid argument: {0}")]
    Validation(#[from] ValidationError),

    #[error("{message}")]
    Generic { message: String },
}

/// Errors raised while obtaining or refreshing tokens
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Request error: {source}")]
    RequestError {
        #[source]
        source: reqwest::Error,
    },

    #[error("Authentication endpoint returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Token lifetime out of range: {seconds}s")]
    InvalidExpiry { seconds: i64 },

    #[error("Failed to sign challenge: {reason}")]
    SigningError { reason: String },

    #[error("No wallet name configured. Run 'precog authenticate' first.")]
    WalletNotConfigured,

    #[error("Token storage error: {reason}")]
    StorageError { reason: String },

    #[error("{reason}")]
    Generic { reason: String },
}

/// Errors raised by authenticated API requests
#[derive(Error, Debug)]
pub enum ApiError {
    /// Network, DNS, timeout or body decoding failure
    #[error("Request failed: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response other than the handled 401
    #[error("API returned {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error(
        "Authentication tokens have expired. Please run 'precog authenticate' to re-authenticate."
    )]
    AuthExpired,
}

/// Caller-supplied argument outside of its contract. Raised before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Limit must be a positive integer between 1 and 10000 (got {0})")]
    Limit(u32),

    #[error("Miner UID must be an integer between 0 and 255 (got {0})")]
    MinerUid(u32),

    #[error("Miner hotkey must be a 48-character SS58 address (got {0} characters)")]
    Hotkey(usize),

    #[error("start_date must be before end_date")]
    DateRange,

    #[error("Page must be a positive integer")]
    Page,

    #[error("Page size must be between 100 and 10000 (got {0})")]
    PageSize(u32),
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {source}")]
    LoadError {
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {source}")]
    ParseError {
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {source}")]
    SerializeError {
        #[source]
        source: toml::ser::Error,
    },

    #[error("Failed to write config file: {source}")]
    WriteError {
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration validation failed: {reason}")]
    ValidationError { reason: String },
}

impl From<reqwest::Error> for AuthError {
    fn from(error: reqwest::Error) -> Self {
        AuthError::RequestError { source: error }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        ApiError::Transport { source: error }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::Api(ApiError::Transport { source: error })
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::ParseError { source: error }
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(error: toml::ser::Error) -> Self {
        ConfigError::SerializeError { source: error }
    }
}

impl AppError {
    /// True when the user has to run the authentication flow again
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, AppError::Api(ApiError::AuthExpired))
    }
}
