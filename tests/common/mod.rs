#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate};
use listing_order_check::bridge::{ReportEndpoints, SettingsEndpoints};
use listing_order_check::config::Config;
use listing_order_check::engine::collector::CollectProgress;
use listing_order_check::feed::types::RawItem;
use listing_order_check::feed::Session;
use listing_order_check::frontend::{Frontend, ViewHandle};
use listing_order_check::report::ReportPayload;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

pub const BASE_URL: &str = "https://listing.test/newest";

/// `minutes` before a fixed instant, in the listing's naive ISO format.
pub fn ts(minutes: i64) -> String {
    let base = NaiveDate::from_ymd_opt(2024, 10, 17)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    (base - ChronoDuration::minutes(minutes))
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

pub fn raw(title: &str, timestamp: Option<String>) -> RawItem {
    RawItem {
        title: title.to_string(),
        timestamp_raw: timestamp,
        relative_age: "a moment ago".to_string(),
    }
}

/// Pages of strictly newest-first items with the given sizes.
pub fn ordered_pages(sizes: &[usize]) -> Vec<Vec<RawItem>> {
    let mut minute = 0i64;
    sizes
        .iter()
        .enumerate()
        .map(|(p, &n)| {
            (0..n)
                .map(|i| {
                    minute += 1;
                    raw(&format!("page {} story {}", p + 1, i + 1), Some(ts(minute)))
                })
                .collect()
        })
        .collect()
}

pub fn test_config(target_count: u32) -> Config {
    Config {
        target_count,
        source_url: BASE_URL.to_string(),
        max_retries: 3,
        retry_delay_ms: 10,
        navigation_timeout_ms: 1_000,
        ..Config::default()
    }
}

fn page_url(index: usize) -> String {
    format!("{}?p={}", BASE_URL, index + 1)
}

#[derive(Default)]
struct FakeState {
    current: Option<usize>,
    failures_left: u32,
    always_fail: bool,
    navigations: Vec<String>,
}

/// In-memory listing: page N links to page N+1 until the script runs out.
pub struct FakeSession {
    pages: Vec<Vec<RawItem>>,
    state: Mutex<FakeState>,
    closes: Arc<AtomicU32>,
}

impl FakeSession {
    pub fn new(pages: Vec<Vec<RawItem>>) -> Self {
        Self {
            pages,
            state: Mutex::new(FakeState::default()),
            closes: Arc::new(AtomicU32::new(0)),
        }
    }

    /// The next `n` navigations fail before any succeeds.
    pub fn failing_first(self, n: u32) -> Self {
        self.state.lock().unwrap().failures_left = n;
        self
    }

    pub fn always_failing(self) -> Self {
        self.state.lock().unwrap().always_fail = true;
        self
    }

    pub fn close_counter(&self) -> Arc<AtomicU32> {
        self.closes.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }
}

#[async_trait]
impl Session for FakeSession {
    async fn navigate(&self, url: &str, _timeout: Duration) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        if state.always_fail {
            anyhow::bail!("connection refused");
        }
        if state.failures_left > 0 {
            state.failures_left -= 1;
            anyhow::bail!("connection reset");
        }
        let index = url
            .rsplit_once("?p=")
            .and_then(|(_, n)| n.parse::<usize>().ok())
            .map(|n| n - 1)
            .unwrap_or(0);
        state.current = Some(index);
        Ok(())
    }

    fn extract_current_page(&self) -> Vec<RawItem> {
        let state = self.state.lock().unwrap();
        state
            .current
            .and_then(|i| self.pages.get(i).cloned())
            .unwrap_or_default()
    }

    fn next_page_url(&self) -> Option<String> {
        let current = self.state.lock().unwrap().current?;
        (current + 1 < self.pages.len()).then(|| page_url(current + 1))
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub enum SettingsStep {
    Submit(Value),
    Close,
}

pub enum ReportStep {
    Rerun,
    Close,
}

/// What the scripted front-end saw.
#[derive(Default)]
pub struct FrontendLog {
    pub seeds: Vec<Config>,
    pub notices: Vec<Option<String>>,
    pub final_progress: Vec<CollectProgress>,
    pub reports: Vec<ReportPayload>,
    pub console: String,
}

/// Front-end that answers each view from a script. An exhausted script
/// drops the endpoints, which the host reads as the view closing.
pub struct ScriptedFrontend {
    settings: VecDeque<SettingsStep>,
    reports: VecDeque<ReportStep>,
    log: Arc<Mutex<FrontendLog>>,
}

impl ScriptedFrontend {
    pub fn new(
        settings: Vec<SettingsStep>,
        reports: Vec<ReportStep>,
    ) -> (Self, Arc<Mutex<FrontendLog>>) {
        let log = Arc::new(Mutex::new(FrontendLog::default()));
        let frontend = Self {
            settings: settings.into(),
            reports: reports.into(),
            log: log.clone(),
        };
        (frontend, log)
    }
}

impl Frontend for ScriptedFrontend {
    fn open_settings(
        &mut self,
        seed: &Config,
        notice: Option<String>,
        endpoints: SettingsEndpoints,
    ) -> Result<ViewHandle> {
        {
            let mut log = self.log.lock().unwrap();
            log.seeds.push(seed.clone());
            log.notices.push(notice);
        }
        if let Some(SettingsStep::Submit(payload)) = self.settings.pop_front() {
            endpoints.submit.invoke(payload)?;
        }
        Ok(ViewHandle::detached("settings"))
    }

    fn open_progress(
        &mut self,
        _config: &Config,
        progress: watch::Receiver<CollectProgress>,
    ) -> Result<ViewHandle> {
        let log = self.log.clone();
        Ok(ViewHandle::spawn("progress", move |shutdown| async move {
            let _ = shutdown.await;
            let last = progress.borrow().clone();
            log.lock().unwrap().final_progress.push(last);
            Ok(())
        }))
    }

    fn open_report(
        &mut self,
        report: &ReportPayload,
        endpoints: ReportEndpoints,
    ) -> Result<ViewHandle> {
        self.log.lock().unwrap().reports.push(report.clone());
        match self.reports.pop_front() {
            Some(ReportStep::Rerun) => endpoints.rerun()?,
            Some(ReportStep::Close) => endpoints.close()?,
            None => drop(endpoints),
        }
        Ok(ViewHandle::detached("report"))
    }

    fn console(&mut self, text: &str) {
        self.log.lock().unwrap().console.push_str(text);
    }
}

pub fn submit(config: &Config) -> SettingsStep {
    SettingsStep::Submit(serde_json::to_value(config).unwrap())
}

/// Counts WARN events seen by the subscriber it is layered into.
#[derive(Clone, Default)]
pub struct WarnCounter(Arc<AtomicUsize>);

impl WarnCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if *event.metadata().level() == tracing::Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
