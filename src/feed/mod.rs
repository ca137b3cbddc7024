pub mod hn;
pub mod session;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use types::RawItem;

/// Reads listing entries and the next-page link out of a loaded page.
pub trait Extractor: Send + Sync {
    /// Entries in presentation order; empty when the page has none.
    fn extract(&self, html: &str) -> Vec<RawItem>;
    /// Raw `href` of the "next page" affordance, possibly relative.
    fn next_page(&self, html: &str) -> Option<String>;
}

/// Long-lived automation session over a live listing. Methods take `&self`
/// so navigation can be re-issued from a retry loop.
#[async_trait]
pub trait Session: Send + Sync {
    /// Load `url` (absolute, or relative to the current page). Exceeding
    /// `timeout` is reported as an ordinary navigation failure.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()>;

    /// Entries on the currently loaded page.
    fn extract_current_page(&self) -> Vec<RawItem>;

    /// Absolute URL of the next page, if the current page offers one.
    fn next_page_url(&self) -> Option<String>;

    /// Release the session. Called exactly once, at shutdown.
    async fn close(&self) -> Result<()>;
}
