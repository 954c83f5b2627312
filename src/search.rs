use crate::persona;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

mod duckduckgo;
mod profile;

pub use duckduckgo::DuckDuckGo;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("search provider returned no results")]
    Empty,
    #[error("invalid search endpoint: {0}")]
    InvalidUrl(String),
    #[error("search timed out")]
    Timeout,
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &str) -> Result<String, SearchError>;
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Pause before hitting a rate-limit-sensitive provider.
    pub delay: Duration,
    pub timeout: Duration,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(1000),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Ordered fallback chain: network provider, canned profile block, degraded notice.
#[derive(Clone)]
pub struct SearchChain {
    primary: Option<Arc<dyn SearchProvider>>,
    config: SearchConfig,
}

impl SearchChain {
    pub fn new(primary: Option<Arc<dyn SearchProvider>>, config: SearchConfig) -> Self {
        Self { primary, config }
    }

    pub fn offline() -> Self {
        Self::new(None, SearchConfig::default())
    }

    /// Search context for `message`. Never fails and never returns an empty string.
    pub async fn augment(&self, message: &str) -> String {
        let query = format!("{} {}", message, persona::SEARCH_SUFFIX);

        if let Some(primary) = &self.primary {
            match self.try_primary(primary.as_ref(), &query).await {
                Ok(results) => {
                    info!(provider = primary.name(), "web search succeeded");
                    return format!(
                        "**Search Results from {}:**\n\n{}",
                        primary.name(),
                        results
                    );
                }
                Err(err) => warn!(provider = primary.name(), %err, "web search failed"),
            }
        }

        if let Some(results) = profile::contextual_results(&query) {
            info!("using profile search fallback");
            return results.to_string();
        }

        warn!("all search methods failed, providing contextual information");
        persona::degraded_results(&query)
    }

    async fn try_primary(
        &self,
        provider: &dyn SearchProvider,
        query: &str,
    ) -> Result<String, SearchError> {
        info!(provider = provider.name(), query, "attempting web search");
        tokio::time::sleep(self.config.delay).await;

        let results = tokio::time::timeout(self.config.timeout, provider.search(query))
            .await
            .map_err(|_| SearchError::Timeout)??;

        if results.trim().is_empty() {
            return Err(SearchError::Empty);
        }
        Ok(results)
    }
}
