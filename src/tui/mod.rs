pub mod config_view;
pub mod render;
pub mod state;

use crate::bridge::{ReportEndpoints, SettingsEndpoints};
use crate::config::Config;
use crate::engine::collector::CollectProgress;
use crate::frontend::{Frontend, ViewHandle};
use crate::report::ReportPayload;
use anyhow::{Context, Result};
use config_view::{SettingsAction, SettingsViewState};
use crossterm::{
    event::{Event, EventStream, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use futures_util::StreamExt;
use ratatui::prelude::*;
use state::{ProgressViewState, ReportAction, ReportViewState};
use std::io::{stdout, Stdout};
use std::time::Duration;
use tokio::sync::{oneshot, watch};

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Raw mode plus alternate screen for the lifetime of one view. Restored on
/// drop so a failing or aborted view leaves the shell usable.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<(Self, Term)> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let guard = TerminalGuard;
        stdout()
            .execute(EnterAlternateScreen)
            .context("Failed to enter alternate screen")?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
        Ok((guard, terminal))
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = stdout().execute(LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// Next key press from the terminal. `None` when the event stream ends.
async fn next_key(events: &mut EventStream) -> Result<Option<KeyEvent>> {
    while let Some(event) = events.next().await {
        match event.context("terminal event stream failed")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => return Ok(Some(key)),
            _ => continue,
        }
    }
    Ok(None)
}

/// Interactive front-end: one ratatui screen per phase.
#[derive(Debug, Default)]
pub struct TerminalFrontend;

impl Frontend for TerminalFrontend {
    fn open_settings(
        &mut self,
        seed: &Config,
        notice: Option<String>,
        endpoints: SettingsEndpoints,
    ) -> Result<ViewHandle> {
        let state = SettingsViewState::new(seed, notice);
        Ok(ViewHandle::spawn("settings", move |shutdown| {
            settings_view(state, endpoints, shutdown)
        }))
    }

    fn open_progress(
        &mut self,
        config: &Config,
        progress: watch::Receiver<CollectProgress>,
    ) -> Result<ViewHandle> {
        let state = ProgressViewState::new(&config.source_url);
        Ok(ViewHandle::spawn("progress", move |shutdown| {
            progress_view(state, progress, shutdown)
        }))
    }

    fn open_report(
        &mut self,
        report: &ReportPayload,
        endpoints: ReportEndpoints,
    ) -> Result<ViewHandle> {
        let state = ReportViewState::new(report.clone());
        Ok(ViewHandle::spawn("report", move |shutdown| {
            report_view(state, endpoints, shutdown)
        }))
    }
}

async fn settings_view(
    mut state: SettingsViewState,
    endpoints: SettingsEndpoints,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<()> {
    let (_guard, mut terminal) = TerminalGuard::enter()?;
    let mut events = EventStream::new();

    loop {
        terminal.draw(|f| render::draw_settings(f, &state))?;
        let key = tokio::select! {
            _ = &mut shutdown => return Ok(()),
            key = next_key(&mut events) => key?,
        };
        let Some(key) = key else {
            return Ok(());
        };
        match state.handle_key(key) {
            SettingsAction::None => {}
            SettingsAction::Submit(payload) => {
                endpoints.submit.invoke(payload)?;
                return Ok(());
            }
            // Dropping the endpoints tells the host the form was closed.
            SettingsAction::Close => return Ok(()),
        }
    }
}

async fn progress_view(
    mut state: ProgressViewState,
    mut progress: watch::Receiver<CollectProgress>,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<()> {
    let (_guard, mut terminal) = TerminalGuard::enter()?;
    let mut events = EventStream::new();
    let mut tick = tokio::time::interval(Duration::from_millis(100));
    let mut live = true;

    loop {
        let snapshot = progress.borrow().clone();
        terminal.draw(|f| render::draw_progress(f, &state, &snapshot))?;
        tokio::select! {
            _ = &mut shutdown => return Ok(()),
            _ = tick.tick() => state.spinner_frame = state.spinner_frame.wrapping_add(1),
            changed = progress.changed(), if live => live = changed.is_ok(),
            // Read-only view: keys are drained so they don't leak into the report.
            key = next_key(&mut events) => {
                if key?.is_none() {
                    return Ok(());
                }
            }
        }
    }
}

async fn report_view(
    mut state: ReportViewState,
    endpoints: ReportEndpoints,
    mut shutdown: oneshot::Receiver<()>,
) -> Result<()> {
    let (_guard, mut terminal) = TerminalGuard::enter()?;
    let mut events = EventStream::new();

    loop {
        terminal.draw(|f| render::draw_report(f, &state))?;
        let key = tokio::select! {
            _ = &mut shutdown => return Ok(()),
            key = next_key(&mut events) => key?,
        };
        let Some(key) = key else {
            endpoints.close()?;
            return Ok(());
        };
        match state.handle_key(key) {
            ReportAction::None => {}
            ReportAction::Rerun => {
                endpoints.rerun()?;
                return Ok(());
            }
            ReportAction::Close => {
                endpoints.close()?;
                return Ok(());
            }
        }
    }
}
