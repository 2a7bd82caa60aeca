//! Storefront source adapters
//!
//! Each adapter is the only place that knows its storefront's wire format.
//! It fetches the remote catalog and normalizes promotions into `Game`
//! records. Malformed entries are skipped inside the adapter; request-level
//! failures come back as `FetchError` and the aggregator turns them into an
//! empty contribution for that cycle.
//!
//! Adding a storefront means adding one `SourceAdapter` implementation and
//! registering it with the aggregator.

pub mod epic;
pub mod steam;

pub use epic::EpicGamesSource;
pub use steam::SteamSource;

use crate::models::Game;
use async_trait::async_trait;
use std::time::Duration;

const USER_AGENT: &str = concat!("freegames/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub enum FetchError {
    Http(reqwest::Error),
    Status(reqwest::StatusCode),
    Json(serde_json::Error),
    Parse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Http(err)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Json(err)
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Http(e) if e.is_timeout() => write!(f, "Request timed out: {}", e),
            FetchError::Http(e) => write!(f, "HTTP error: {}", e),
            FetchError::Status(status) => write!(f, "Unexpected status: {}", status),
            FetchError::Json(e) => write!(f, "Invalid JSON: {}", e),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// A storefront that can report its current free-game promotions
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Stable name used in logs
    fn name(&self) -> &str;

    /// Fetch and normalize the storefront's current giveaways
    async fn fetch_free_games(&self) -> Result<Vec<Game>, FetchError>;
}

/// Shared HTTP client for all adapters
///
/// The timeout bounds every request so a hung storefront cannot stall a
/// poll cycle.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// GET `url` and return the body, treating non-2xx as an error
pub(crate) async fn get_text(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    Ok(response.text().await?)
}
