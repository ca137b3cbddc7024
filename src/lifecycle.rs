//! The configure → collect → report → repeat-or-exit loop.

use crate::bridge::{self, ReportDecision};
use crate::config::{Config, ConfigStore};
use crate::engine::collector::CollectProgress;
use crate::error::LifecycleFatalError;
use crate::feed::Session;
use crate::frontend::{Frontend, ViewHandle};
use crate::pipeline::{self, RunResult};
use crate::report::{self, ReportPayload};
use std::path::Path;
use tokio::sync::watch;

#[derive(Debug)]
enum Phase {
    Configuring { notice: Option<String> },
    Collecting,
    Reporting(RunResult),
    Terminated(Termination),
}

impl Phase {
    fn label(&self) -> &'static str {
        match self {
            Phase::Configuring { .. } => "CONFIGURING",
            Phase::Collecting => "COLLECTING",
            Phase::Reporting(_) => "REPORTING",
            Phase::Terminated(_) => "TERMINATED",
        }
    }
}

/// How a non-fatal lifecycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Settings view closed without a submission.
    Cancelled,
    /// Report view closed instead of "run again".
    ReportClosed,
}

#[derive(Debug)]
pub struct LifecycleOutcome {
    pub termination: Termination,
    pub runs: u32,
    pub last_run: Option<RunResult>,
    pub final_config: Config,
}

impl LifecycleOutcome {
    /// 0 only when the last run met quota with no violations; 1 for a
    /// failing run; 3 when no run completed. Fatal errors map to 2 upstream.
    pub fn exit_code(&self) -> u8 {
        match &self.last_run {
            Some(run) if run.passed() => 0,
            Some(_) => 1,
            None => 3,
        }
    }
}

pub struct RunLifecycle<S, F> {
    session: S,
    frontend: F,
    store: ConfigStore,
    runs: u32,
    last_run: Option<RunResult>,
}

impl<S, F> RunLifecycle<S, F>
where
    S: Session,
    F: Frontend,
{
    pub fn new(session: S, frontend: F, initial: Config) -> Self {
        Self {
            session,
            frontend,
            store: ConfigStore::new(initial),
            runs: 0,
            last_run: None,
        }
    }

    /// Drive the loop to termination. The session is closed exactly once
    /// after the loop, whichever edge ended it.
    pub async fn run(mut self) -> Result<LifecycleOutcome, LifecycleFatalError> {
        let ended = self.drive().await;
        if let Err(e) = &ended {
            tracing::error!(runs = self.runs, "lifecycle aborted: {}", e);
        }

        if let Err(e) = self.session.close().await {
            tracing::warn!("closing automation session failed: {:#}", e);
        } else {
            tracing::info!("automation session closed");
        }

        let termination = ended?;
        Ok(LifecycleOutcome {
            termination,
            runs: self.runs,
            last_run: self.last_run,
            final_config: self.store.active().clone(),
        })
    }

    async fn drive(&mut self) -> Result<Termination, LifecycleFatalError> {
        let mut phase = Phase::Configuring { notice: None };
        loop {
            tracing::debug!(phase = phase.label(), "entering phase");
            phase = match phase {
                Phase::Configuring { notice } => self.configure(notice).await?,
                Phase::Collecting => self.collect().await?,
                Phase::Reporting(result) => self.report(result).await?,
                Phase::Terminated(termination) => {
                    tracing::info!(?termination, runs = self.runs, "lifecycle terminated");
                    return Ok(termination);
                }
            };
        }
    }

    async fn configure(&mut self, notice: Option<String>) -> Result<Phase, LifecycleFatalError> {
        let (endpoints, pending) = bridge::settings_bridge();
        let view = self
            .frontend
            .open_settings(self.store.active(), notice, endpoints)
            .map_err(LifecycleFatalError::Frontend)?;

        // A view that died drops its endpoint too; teardown tells the two apart.
        let submission = pending.submit.wait().await;
        teardown(view).await?;

        let Some(payload) = submission else {
            tracing::info!("settings closed without submitting");
            return Ok(Phase::Terminated(Termination::Cancelled));
        };

        match Config::from_submission(payload) {
            Ok(config) => {
                tracing::info!(
                    target_count = config.target_count,
                    source_url = %config.source_url,
                    max_retries = config.max_retries,
                    "settings accepted"
                );
                self.store.replace(config);
                Ok(Phase::Collecting)
            }
            Err(e) => {
                tracing::warn!(error = %e, "settings submission rejected");
                Ok(Phase::Configuring {
                    notice: Some(e.to_string()),
                })
            }
        }
    }

    async fn collect(&mut self) -> Result<Phase, LifecycleFatalError> {
        let config = self.store.active().clone();
        let (progress_tx, progress_rx) = watch::channel(CollectProgress {
            target: config.target_count,
            ..Default::default()
        });
        let view = self
            .frontend
            .open_progress(&config, progress_rx)
            .map_err(LifecycleFatalError::Frontend)?;

        let outcome = pipeline::run_validation(&self.session, &config, &progress_tx).await;
        let torn_down = teardown(view).await;

        let result = outcome?;
        torn_down?;
        self.runs += 1;
        Ok(Phase::Reporting(result))
    }

    async fn report(&mut self, result: RunResult) -> Result<Phase, LifecycleFatalError> {
        let config = self.store.active();
        let payload = ReportPayload::assemble(&result, config);
        self.frontend.console(&report::render_console(&result, config));

        let path = Path::new(&config.report_path);
        match report::write_report(path, &payload).await {
            Ok(()) => tracing::info!(path = %path.display(), "report written"),
            Err(e) => tracing::warn!("report not written: {:#}", e),
        }
        self.last_run = Some(result);

        let (endpoints, pending) = bridge::report_bridge();
        let view = self
            .frontend
            .open_report(&payload, endpoints)
            .map_err(LifecycleFatalError::Frontend)?;

        let decision = pending.decide().await;
        teardown(view).await?;

        Ok(match decision {
            ReportDecision::RunAgain => Phase::Configuring { notice: None },
            ReportDecision::Closed => Phase::Terminated(Termination::ReportClosed),
        })
    }
}

/// A view task that ended in error is fatal, whatever it signalled first.
async fn teardown(view: ViewHandle) -> Result<(), LifecycleFatalError> {
    let name = view.name();
    view.teardown().await.map_err(|e| {
        tracing::error!(view = name, "view failed: {:#}", e);
        LifecycleFatalError::Frontend(e)
    })
}
