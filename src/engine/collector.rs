use super::retry::{self, RetryPolicy};
use crate::config::Config;
use crate::error::NavigationError;
use crate::feed::types::Item;
use crate::feed::Session;
use serde::Serialize;
use tokio::sync::watch;

/// Why collection stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum StopReason {
    QuotaMet,
    /// Page `page` produced no entries at all.
    EmptyPage { page: u32 },
    /// Page `page` had no "next" link.
    NoNextPage { page: u32 },
}

/// Items gathered by one run, in source presentation order.
#[derive(Debug, Clone)]
pub struct Collection {
    pub items: Vec<Item>,
    pub pages_visited: u32,
    /// Entries discarded for lacking a timestamp.
    pub dropped: usize,
    pub stop: StopReason,
}

impl Collection {
    pub fn reached(&self, target: u32) -> bool {
        self.items.len() >= target as usize
    }
}

/// Live counters published while collecting.
#[derive(Debug, Clone, Default)]
pub struct CollectProgress {
    pub page: u32,
    pub collected: usize,
    pub target: u32,
    pub dropped: usize,
    pub status: String,
}

/// Walk the listing from `config.source_url` until `target_count` dated items
/// are gathered or the listing runs out. Running out is a normal stop; only a
/// navigation that exhausts its retries is an error.
pub async fn collect<S>(
    session: &S,
    config: &Config,
    progress: &watch::Sender<CollectProgress>,
) -> Result<Collection, NavigationError>
where
    S: Session + ?Sized,
{
    let target = config.target_count as usize;
    let policy = RetryPolicy::from_config(config);
    let timeout = config.navigation_timeout();

    progress.send_modify(|p| {
        *p = CollectProgress {
            target: config.target_count,
            status: format!("loading {}", config.source_url),
            ..Default::default()
        };
    });

    let first = config.source_url.as_str();
    retry::advance(first, policy, move || session.navigate(first, timeout)).await?;

    let mut items: Vec<Item> = Vec::with_capacity(target);
    let mut dropped = 0usize;
    let mut page = 1u32;

    let stop = loop {
        if items.len() >= target {
            break StopReason::QuotaMet;
        }

        let raw = session.extract_current_page();
        if raw.is_empty() {
            tracing::warn!(page, "page returned no items, treating as end of listing");
            break StopReason::EmptyPage { page };
        }

        let found = raw.len();
        let dated: Vec<Item> = raw.into_iter().filter_map(|r| r.into_item()).collect();
        let page_dropped = found - dated.len();
        if page_dropped > 0 {
            tracing::warn!(page, dropped = page_dropped, "dropped items without a timestamp");
            dropped += page_dropped;
        }
        items.extend(dated);
        tracing::debug!(page, found, total = items.len(), "page extracted");

        progress.send_modify(|p| {
            p.page = page;
            p.collected = items.len().min(target);
            p.dropped = dropped;
            p.status = format!("page {} extracted ({} items)", page, found);
        });

        if items.len() >= target {
            break StopReason::QuotaMet;
        }

        let Some(next) = session.next_page_url() else {
            tracing::warn!(page, collected = items.len(), target, "no next page link, listing exhausted");
            break StopReason::NoNextPage { page };
        };
        page += 1;

        progress.send_modify(|p| p.status = format!("loading page {}", page));
        let url = next.as_str();
        retry::advance(url, policy, move || session.navigate(url, timeout)).await?;
    };

    items.truncate(target);
    let pages_visited = page;
    tracing::info!(
        pages = pages_visited,
        collected = items.len(),
        target,
        dropped,
        stop = ?stop,
        "collection finished"
    );

    progress.send_modify(|p| {
        p.collected = items.len();
        p.status = "collection finished".to_string();
    });

    Ok(Collection {
        items,
        pages_visited,
        dropped,
        stop,
    })
}
