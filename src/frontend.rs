//! The interactive surface the lifecycle talks to.
//!
//! Each phase opens exactly one view and tears it down before the next phase
//! starts. Views talk back only through the bridge endpoints they are given.

use crate::bridge::{ReportEndpoints, SettingsEndpoints};
use crate::config::Config;
use crate::engine::collector::CollectProgress;
use crate::report::ReportPayload;
use anyhow::{Context, Result};
use std::future::Future;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

pub trait Frontend: Send {
    /// Settings form seeded with `seed`. `notice` explains why the form was
    /// re-opened (e.g. a rejected submission).
    fn open_settings(
        &mut self,
        seed: &Config,
        notice: Option<String>,
        endpoints: SettingsEndpoints,
    ) -> Result<ViewHandle>;

    /// Read-only progress display while a run collects.
    fn open_progress(
        &mut self,
        config: &Config,
        progress: watch::Receiver<CollectProgress>,
    ) -> Result<ViewHandle>;

    /// Report view offering "run again" and close.
    fn open_report(
        &mut self,
        report: &ReportPayload,
        endpoints: ReportEndpoints,
    ) -> Result<ViewHandle>;

    /// Emit the console report block.
    fn console(&mut self, text: &str) {
        print!("{}", text);
    }
}

/// Owns one view for the lifetime of one phase.
pub struct ViewHandle {
    name: &'static str,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<Result<()>>>,
}

impl ViewHandle {
    /// Run a view as its own task. The task receives a shutdown signal it
    /// must honour promptly.
    pub fn spawn<F, Fut>(name: &'static str, view: F) -> Self
    where
        F: FnOnce(oneshot::Receiver<()>) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let task = tokio::spawn(view(rx));
        tracing::debug!(view = name, "view opened");
        Self {
            name,
            shutdown: Some(tx),
            task: Some(task),
        }
    }

    /// A view with no backing task.
    pub fn detached(name: &'static str) -> Self {
        Self {
            name,
            shutdown: None,
            task: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Signal the view to stop and wait for it to finish.
    pub async fn teardown(mut self) -> Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            task.await
                .with_context(|| format!("{} view task failed", self.name))??;
        }
        tracing::debug!(view = self.name, "view torn down");
        Ok(())
    }
}

impl Drop for ViewHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Non-interactive front-end: submits its seed once, shows nothing, and
/// closes the report straight away. One run per process.
#[derive(Debug, Default)]
pub struct HeadlessFrontend {
    submitted: bool,
}

impl Frontend for HeadlessFrontend {
    fn open_settings(
        &mut self,
        seed: &Config,
        notice: Option<String>,
        endpoints: SettingsEndpoints,
    ) -> Result<ViewHandle> {
        if let Some(notice) = notice {
            tracing::error!(%notice, "configuration rejected in headless mode");
            return Ok(ViewHandle::detached("settings"));
        }
        if self.submitted {
            return Ok(ViewHandle::detached("settings"));
        }
        let payload = serde_json::to_value(seed).context("Failed to serialize settings")?;
        endpoints.submit.invoke(payload)?;
        self.submitted = true;
        Ok(ViewHandle::detached("settings"))
    }

    fn open_progress(
        &mut self,
        _config: &Config,
        _progress: watch::Receiver<CollectProgress>,
    ) -> Result<ViewHandle> {
        Ok(ViewHandle::detached("progress"))
    }

    fn open_report(
        &mut self,
        _report: &ReportPayload,
        endpoints: ReportEndpoints,
    ) -> Result<ViewHandle> {
        endpoints.close()?;
        Ok(ViewHandle::detached("report"))
    }
}
