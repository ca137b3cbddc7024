//! HTTP-backed automation session.
//!
//! Listing pages are plain server-rendered HTML, so a page "load" is a GET
//! whose body becomes the current page. Relative links are resolved against
//! the URL of the page that produced them.

use super::types::RawItem;
use super::{Extractor, Session};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use std::sync::Mutex;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Default)]
struct LoadedPage {
    url: Option<Url>,
    html: String,
}

pub struct HttpSession {
    client: Client,
    extractor: Box<dyn Extractor>,
    page: Mutex<LoadedPage>,
}

impl HttpSession {
    pub fn new(extractor: Box<dyn Extractor>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            extractor,
            page: Mutex::new(LoadedPage::default()),
        })
    }

    fn resolve(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(abs) => Ok(abs),
            Err(_) => {
                let page = self.lock_page()?;
                let base = page
                    .url
                    .as_ref()
                    .with_context(|| format!("relative URL {:?} with no page loaded", url))?;
                base.join(url)
                    .with_context(|| format!("cannot resolve {:?} against {}", url, base))
            }
        }
    }

    /// Read access for extraction. A poisoned lock still holds the last
    /// loaded page intact, so it is recovered rather than read as empty.
    fn read_page(&self) -> std::sync::MutexGuard<'_, LoadedPage> {
        self.page.lock().unwrap_or_else(|poisoned| {
            tracing::error!("session page state poisoned, recovering last loaded page");
            poisoned.into_inner()
        })
    }

    fn lock_page(&self) -> Result<std::sync::MutexGuard<'_, LoadedPage>> {
        self.page
            .lock()
            .map_err(|_| anyhow::anyhow!("session page state poisoned"))
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<()> {
        let target = self.resolve(url)?;

        let fetch = async {
            let resp = self
                .client
                .get(target.clone())
                .send()
                .await
                .with_context(|| format!("request to {} failed", target))?;
            let status = resp.status();
            if !status.is_success() {
                anyhow::bail!("{} returned HTTP {}", target, status);
            }
            let final_url = resp.url().clone();
            let html = resp
                .text()
                .await
                .with_context(|| format!("reading body of {} failed", target))?;
            Ok::<_, anyhow::Error>((final_url, html))
        };

        let (final_url, html) = tokio::time::timeout(timeout, fetch)
            .await
            .map_err(|_| anyhow::anyhow!("loading {} timed out after {:?}", target, timeout))??;

        tracing::debug!(url = %final_url, bytes = html.len(), "page loaded");
        let mut page = self.lock_page()?;
        page.url = Some(final_url);
        page.html = html;
        Ok(())
    }

    fn extract_current_page(&self) -> Vec<RawItem> {
        let page = self.read_page();
        self.extractor.extract(&page.html)
    }

    fn next_page_url(&self) -> Option<String> {
        let page = self.read_page();
        let href = self.extractor.next_page(&page.html)?;
        let base = page.url.as_ref()?;
        match base.join(&href) {
            Ok(next) => Some(next.to_string()),
            Err(e) => {
                tracing::warn!(href = %href, error = %e, "unresolvable next-page link");
                None
            }
        }
    }

    async fn close(&self) -> Result<()> {
        let mut page = self.lock_page()?;
        page.url = None;
        page.html.clear();
        tracing::debug!("HTTP session closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::hn::HnExtractor;

    fn session_with_page(url: &str, html: &str) -> HttpSession {
        let session = HttpSession::new(Box::new(HnExtractor)).unwrap();
        {
            let mut page = session.page.lock().unwrap();
            page.url = Some(Url::parse(url).unwrap());
            page.html = html.to_string();
        }
        session
    }

    #[test]
    fn test_next_page_resolved_against_current_url() {
        let session = session_with_page(
            "https://news.ycombinator.com/newest",
            r#"<a href="newest?next=123&amp;n=31" class="morelink" rel="next">More</a>"#,
        );
        assert_eq!(
            session.next_page_url().as_deref(),
            Some("https://news.ycombinator.com/newest?next=123&n=31")
        );
    }

    #[test]
    fn test_resolve_relative_without_page_fails() {
        let session = HttpSession::new(Box::new(HnExtractor)).unwrap();
        assert!(session.resolve("newest?next=1").is_err());
        assert!(session.resolve("https://example.com/").is_ok());
    }

    #[tokio::test]
    async fn test_close_clears_page() {
        let session = session_with_page(
            "https://news.ycombinator.com/newest",
            r#"<tr class="athing"><span class="titleline"><a href="x">T</a></span></tr>"#,
        );
        assert_eq!(session.extract_current_page().len(), 1);
        session.close().await.unwrap();
        assert!(session.extract_current_page().is_empty());
        assert_eq!(session.next_page_url(), None);
    }

    #[test]
    fn test_poisoned_page_state_still_extracts() {
        let session = std::sync::Arc::new(session_with_page(
            "https://news.ycombinator.com/newest",
            r#"<tr class="athing"><span class="titleline"><a href="x">T</a></span></tr>
               <a href="newest?next=9" class="morelink">More</a>"#,
        ));
        let poisoner = session.clone();
        let _ = std::thread::spawn(move || {
            let _page = poisoner.page.lock().unwrap();
            panic!("extractor blew up mid-read");
        })
        .join();
        assert!(session.page.is_poisoned());

        assert_eq!(session.extract_current_page().len(), 1);
        assert_eq!(
            session.next_page_url().as_deref(),
            Some("https://news.ycombinator.com/newest?next=9")
        );
    }

    /// Hits the live listing.
    /// Run with: cargo test live_first_page --ignored -- --nocapture
    #[tokio::test]
    #[ignore]
    async fn live_first_page() {
        let session = HttpSession::new(Box::new(HnExtractor)).unwrap();
        match session
            .navigate(crate::config::DEFAULT_SOURCE_URL, Duration::from_secs(15))
            .await
        {
            Ok(()) => {
                let items = session.extract_current_page();
                println!("Got {} items, next = {:?}", items.len(), session.next_page_url());
                for i in items.iter().take(5) {
                    println!("  {:?} | {}", i.timestamp_raw, i.title);
                }
            }
            Err(e) => println!("live fetch error: {:#}", e),
        }
    }
}
