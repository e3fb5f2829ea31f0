use crate::auth::{AuthManager, build_http_client};
use crate::config::Config;
use crate::errors::{ApiError, AppError};
use crate::pagination::Paginator;
use crate::validation::{
    validate_date_range, validate_hotkey, validate_limit, validate_miner_uid, validate_page,
    validate_page_size,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, header};
use serde_json::Value;

pub const DEFAULT_LIMIT: u32 = 100;
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Which miners a prediction query covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredictionScope {
    All,
    Uid(u32),
    Hotkey(String),
}

impl PredictionScope {
    fn validate(&self) -> Result<(), AppError> {
        match self {
            PredictionScope::All => Ok(()),
            PredictionScope::Uid(uid) => Ok(validate_miner_uid(*uid)?),
            PredictionScope::Hotkey(hotkey) => Ok(validate_hotkey(hotkey)?),
        }
    }

    fn path(&self, base: &str) -> String {
        match self {
            PredictionScope::All => base.to_string(),
            PredictionScope::Uid(uid) => format!("{}/uid/{}", base, uid),
            PredictionScope::Hotkey(hotkey) => format!("{}/hotkey/{}", base, hotkey),
        }
    }
}

/// Time window and paging for the historical endpoints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoricalQuery {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub page: u32,
    pub page_size: u32,
}

impl HistoricalQuery {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        HistoricalQuery {
            start_date,
            end_date,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    fn validate(&self) -> Result<(), AppError> {
        validate_date_range(&self.start_date, &self.end_date)?;
        validate_page(self.page)?;
        validate_page_size(self.page_size)?;
        Ok(())
    }

    fn params(&self, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("start_date", self.start_date.to_rfc3339()),
            ("end_date", self.end_date.to_rfc3339()),
            ("page", page.to_string()),
            ("page_size", self.page_size.to_string()),
        ]
    }
}

/// Client for the prediction endpoints with automatic token refresh
#[derive(Debug)]
pub struct PrecogClient {
    http: Client,
    api_url: String,
    auth: AuthManager,
    paginator: Paginator,
}

impl PrecogClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = build_http_client(config.api.timeout_sec)?;
        let auth = AuthManager::new(config)?;

        Ok(PrecogClient {
            http,
            api_url: config.api_base_url().to_string(),
            auth,
            paginator: Paginator::from_config(&config.pagination),
        })
    }

    /// Builds a client around an existing AuthManager, sharing its API URL
    pub fn with_auth(http: Client, auth: AuthManager, paginator: Paginator) -> Self {
        PrecogClient {
            http,
            api_url: auth.api_url().to_string(),
            auth,
            paginator,
        }
    }

    pub fn auth_manager(&self) -> &AuthManager {
        &self.auth
    }

    fn headers(&self) -> Result<header::HeaderMap, ApiError> {
        let token = self.auth.access_token().ok_or(ApiError::AuthExpired)?;

        let mut headers = header::HeaderMap::new();
        let bearer = header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::AuthExpired)?;
        headers.insert(header::AUTHORIZATION, bearer);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        Ok(headers)
    }

    async fn send(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<reqwest::Response, ApiError> {
        let headers = self.headers()?;
        Ok(self
            .http
            .get(url)
            .headers(headers)
            .query(params)
            .send()
            .await?)
    }

    /// Performs one authenticated GET.
    ///
    /// Refreshes proactively before the call, and on a 401 refreshes once and
    /// retries once. Any other error status is returned as is.
    pub async fn execute(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, ApiError> {
        let url = format!("{}{}", self.api_url, endpoint);

        self.auth.refresh_if_needed().await;

        let mut response = self.send(&url, params).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            tracing::debug!("Got 401 from {}, attempting token refresh", endpoint);
            if !self.auth.refresh_if_needed().await {
                return Err(ApiError::AuthExpired);
            }
            response = self.send(&url, params).await?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Request to {} failed with {}", endpoint, status);
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json().await?)
    }

    async fn recent(&self, scope: PredictionScope, limit: u32) -> Result<Value, AppError> {
        scope.validate()?;
        validate_limit(limit)?;

        let endpoint = scope.path("/predictions/recent");
        Ok(self.execute(&endpoint, &[("limit", limit.to_string())]).await?)
    }

    async fn historical_page(
        &self,
        scope: &PredictionScope,
        query: &HistoricalQuery,
        page: u32,
    ) -> Result<Value, AppError> {
        let endpoint = scope.path("/predictions/historical");
        Ok(self.execute(&endpoint, &query.params(page)).await?)
    }

    /// Recent predictions for all miners
    pub async fn get_recent_predictions(&self, limit: u32) -> Result<Value, AppError> {
        self.recent(PredictionScope::All, limit).await
    }

    pub async fn get_recent_predictions_by_uid(
        &self,
        miner_uid: u32,
        limit: u32,
    ) -> Result<Value, AppError> {
        self.recent(PredictionScope::Uid(miner_uid), limit).await
    }

    pub async fn get_recent_predictions_by_hotkey(
        &self,
        miner_hotkey: &str,
        limit: u32,
    ) -> Result<Value, AppError> {
        self.recent(PredictionScope::Hotkey(miner_hotkey.to_string()), limit)
            .await
    }

    /// One page of historical predictions
    pub async fn get_historical_predictions(
        &self,
        query: &HistoricalQuery,
    ) -> Result<Value, AppError> {
        self.historical(PredictionScope::All, query).await
    }

    pub async fn get_historical_predictions_by_uid(
        &self,
        miner_uid: u32,
        query: &HistoricalQuery,
    ) -> Result<Value, AppError> {
        self.historical(PredictionScope::Uid(miner_uid), query).await
    }

    pub async fn get_historical_predictions_by_hotkey(
        &self,
        miner_hotkey: &str,
        query: &HistoricalQuery,
    ) -> Result<Value, AppError> {
        self.historical(PredictionScope::Hotkey(miner_hotkey.to_string()), query)
            .await
    }

    /// One page of historical predictions for any scope
    pub async fn historical(
        &self,
        scope: PredictionScope,
        query: &HistoricalQuery,
    ) -> Result<Value, AppError> {
        scope.validate()?;
        query.validate()?;

        let scope = &scope;
        self.paginator
            .single_page(query.page, move |page| {
                self.historical_page(scope, query, page)
            })
            .await
    }

    /// Every page of historical predictions from `query.page` onwards, in order
    pub async fn get_all_historical_predictions(
        &self,
        scope: PredictionScope,
        query: &HistoricalQuery,
    ) -> Result<Vec<Value>, AppError> {
        scope.validate()?;
        query.validate()?;

        let scope = &scope;
        self.paginator
            .all_pages(query.page, move |page| self.historical_page(scope, query, page))
            .await
    }
}
