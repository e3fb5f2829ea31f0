//! Client library for the Precog prediction API.
//!
//! Authentication is a wallet-signed challenge exchanged for an access/refresh
//! token pair kept in a local JSON file. [`PrecogClient`] refreshes that pair
//! before it expires, retries once after a 401, and follows pagination for the
//! historical endpoints.

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod logger;
pub mod models;
pub mod pagination;
pub mod token_storage;
pub mod traits;
pub mod utils;
pub mod validation;

pub use auth::AuthManager;
pub use client::{HistoricalQuery, PrecogClient, PredictionScope};
pub use config::Config;
pub use errors::{ApiError, AppError, AuthError, ConfigError, ValidationError};
pub use models::{
    AuthChallenge, AuthRequirements, AuthenticateRequest, Pagination, RefreshRequest,
    TokenRecord, TokenResponse,
};
pub use pagination::Paginator;
pub use token_storage::TokenStorage;
