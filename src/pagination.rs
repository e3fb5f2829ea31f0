use crate::config::PaginationConfig;
use crate::models::Pagination;
use std::future::Future;
use std::time::Duration;

/// Pause between consecutive page requests
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(150);

/// Drives a single-page operation `f(page)` across every page the server reports.
#[derive(Debug, Clone)]
pub struct Paginator {
    delay: Duration,
    max_pages: Option<u32>,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_DELAY)
    }
}

impl Paginator {
    pub fn new(delay: Duration) -> Self {
        Paginator {
            delay,
            max_pages: None,
        }
    }

    pub fn from_config(config: &PaginationConfig) -> Self {
        Self::new(Duration::from_millis(config.delay_ms)).with_max_pages(config.max_pages)
    }

    /// Caps the number of pages fetched by [`all_pages`](Self::all_pages)
    pub fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Single-page mode: calls the operation once, without pacing
    pub async fn single_page<F, Fut, T, E>(&self, page: u32, mut fetch: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        fetch(page).await
    }

    /// Collects every page starting at `start_page`, in order.
    ///
    /// After each page with `has_next`, the next request asks for
    /// `current_page + 1` after the pacing delay. The first error is returned
    /// as is and the pages gathered so far are dropped.
    pub async fn all_pages<F, Fut, E>(
        &self,
        start_page: u32,
        mut fetch: F,
    ) -> Result<Vec<serde_json::Value>, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<serde_json::Value, E>>,
    {
        let mut pages = Vec::new();
        let mut page = start_page;

        loop {
            let body = fetch(page).await?;
            let pagination = Pagination::from_page(&body);
            pages.push(body);

            if !pagination.has_next {
                tracing::debug!("Pagination finished after {} pages", pages.len());
                break;
            }

            if let Some(max_pages) = self.max_pages
                && pages.len() >= max_pages as usize
            {
                tracing::warn!(
                    "Stopping pagination at {} pages although the server reports more",
                    max_pages
                );
                break;
            }

            let Some(next_page) = pagination.current_page.unwrap_or(page).checked_add(1) else {
                tracing::warn!("Stopping pagination: no page after {}", page);
                break;
            };
            page = next_page;
            tokio::time::sleep(self.delay).await;
        }

        Ok(pages)
    }
}
