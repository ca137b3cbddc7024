//! One-shot request/response endpoints between the host and a view.
//!
//! A phase creates an [`Endpoint`]/[`Pending`] pair per callable, hands the
//! endpoint to its view and awaits the pending side. An endpoint is consumed
//! by its single invocation; dropping it without invoking (the view went
//! away) resolves the pending side to `None`.

use serde_json::Value;
use tokio::sync::oneshot;

pub const SUBMIT_SETTINGS: &str = "submit_settings";
pub const RERUN: &str = "rerun";
pub const VIEW_CLOSED: &str = "view_closed";

#[derive(Debug, thiserror::Error)]
#[error("bridge endpoint {0:?} has no listener")]
pub struct Disconnected(pub &'static str);

/// Front-end side: callable once.
#[derive(Debug)]
pub struct Endpoint<T> {
    name: &'static str,
    tx: oneshot::Sender<T>,
}

impl<T> Endpoint<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn invoke(self, payload: T) -> Result<(), Disconnected> {
        tracing::debug!(endpoint = self.name, "bridge invoked");
        self.tx.send(payload).map_err(|_| Disconnected(self.name))
    }
}

/// Host side: resolves with the payload, or `None` if the endpoint was
/// dropped uninvoked.
#[derive(Debug)]
pub struct Pending<T> {
    name: &'static str,
    rx: oneshot::Receiver<T>,
}

impl<T> Pending<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn wait(self) -> Option<T> {
        match self.rx.await {
            Ok(payload) => Some(payload),
            Err(_) => {
                tracing::debug!(endpoint = self.name, "bridge endpoint dropped");
                None
            }
        }
    }
}

pub fn endpoint<T>(name: &'static str) -> (Endpoint<T>, Pending<T>) {
    let (tx, rx) = oneshot::channel();
    (Endpoint { name, tx }, Pending { name, rx })
}

/// Callables handed to the settings view. The payload is the serialized
/// settings record; the host decodes and validates it.
#[derive(Debug)]
pub struct SettingsEndpoints {
    pub submit: Endpoint<Value>,
}

/// Callables handed to the report view.
#[derive(Debug)]
pub struct ReportEndpoints {
    pub rerun: Endpoint<bool>,
    pub closed: Endpoint<()>,
}

impl ReportEndpoints {
    /// Signal "run again" and drop the close endpoint.
    pub fn rerun(self) -> Result<(), Disconnected> {
        self.rerun.invoke(true)
    }

    /// Signal "view closed" and drop the rerun endpoint.
    pub fn close(self) -> Result<(), Disconnected> {
        self.closed.invoke(())
    }
}

pub struct SettingsPending {
    pub submit: Pending<Value>,
}

pub struct ReportPending {
    pub rerun: Pending<bool>,
    pub closed: Pending<()>,
}

pub fn settings_bridge() -> (SettingsEndpoints, SettingsPending) {
    let (submit, pending) = endpoint(SUBMIT_SETTINGS);
    (SettingsEndpoints { submit }, SettingsPending { submit: pending })
}

pub fn report_bridge() -> (ReportEndpoints, ReportPending) {
    let (rerun, rerun_pending) = endpoint(RERUN);
    let (closed, closed_pending) = endpoint(VIEW_CLOSED);
    (
        ReportEndpoints { rerun, closed },
        ReportPending {
            rerun: rerun_pending,
            closed: closed_pending,
        },
    )
}

/// What the report phase decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDecision {
    RunAgain,
    Closed,
}

impl ReportPending {
    /// Race the two signals; whichever resolves first wins and the other is
    /// discarded. A rerun endpoint dropped uninvoked (or invoked with
    /// `false`) counts as closed. Invoking one endpoint drops its sibling, so
    /// both can be ready on the same poll: rerun is checked first.
    pub async fn decide(self) -> ReportDecision {
        let ReportPending { rerun, closed } = self;
        tokio::select! {
            biased;

            again = rerun.wait() => match again {
                Some(true) => ReportDecision::RunAgain,
                _ => ReportDecision::Closed,
            },
            _ = closed.wait() => ReportDecision::Closed,
        }
    }
}
