//! Telemetry for triage decisions.
//!
//! Events are dispatched fire-and-forget to every configured sink. Delivery
//! failures are logged and never reach the engine. [`Telemetry::flush`] waits
//! for in-flight deliveries so the process does not exit before they finish.
//!
//! - [`TelemetrySink`] trait defines the interface for sinks
//! - [`LogSink`] writes events to the log
//! - [`WebhookSink`] posts events as JSON to an HTTP endpoint

pub mod sinks;

pub use sinks::{LogSink, WebhookSink};

use crate::error::TelemetryError;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error};

/// What a classification was applied as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationTarget {
    Label(String),
    Assignee(String),
}

/// Events emitted by the triage engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name")]
pub enum TelemetryEvent {
    /// A confident verdict was acted on
    #[serde(rename = "classification:performed")]
    ClassificationPerformed {
        issue: u64,
        #[serde(flatten)]
        target: ClassificationTarget,
    },
}

impl TelemetryEvent {
    #[must_use]
    pub fn label_applied(issue: u64, label: impl Into<String>) -> Self {
        Self::ClassificationPerformed {
            issue,
            target: ClassificationTarget::Label(label.into()),
        }
    }

    #[must_use]
    pub fn assignee_applied(issue: u64, assignee: impl Into<String>) -> Self {
        Self::ClassificationPerformed {
            issue,
            target: ClassificationTarget::Assignee(assignee.into()),
        }
    }

    /// Wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ClassificationPerformed { .. } => "classification:performed",
        }
    }

    /// Issue the event refers to.
    #[must_use]
    pub const fn issue(&self) -> u64 {
        match self {
            Self::ClassificationPerformed { issue, .. } => *issue,
        }
    }
}

/// Trait for telemetry sinks.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Name of this sink, for logging.
    fn name(&self) -> &'static str;

    /// Deliver one event.
    async fn record(&self, event: &TelemetryEvent) -> Result<(), TelemetryError>;
}

/// Fire-and-forget dispatcher over a set of sinks.
#[derive(Default)]
pub struct Telemetry {
    sinks: Vec<Arc<dyn TelemetrySink>>,
    in_flight: Mutex<JoinSet<()>>,
}

impl Telemetry {
    #[must_use]
    pub fn new(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self {
            sinks,
            in_flight: Mutex::new(JoinSet::new()),
        }
    }

    /// Dispatcher with no sinks.
    #[must_use]
    pub fn disabled() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Send an event to every sink without waiting for delivery.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn track(&self, event: TelemetryEvent) {
        if self.sinks.is_empty() {
            debug!(event = event.name(), "No telemetry sinks, dropping event");
            return;
        }

        let event = Arc::new(event);
        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        while let Some(result) = in_flight.try_join_next() {
            if let Err(e) = result {
                error!(error = %e, "Telemetry task panicked");
            }
        }

        for sink in &self.sinks {
            let sink = Arc::clone(sink);
            let event = Arc::clone(&event);

            in_flight.spawn(async move {
                if let Err(e) = sink.record(&event).await {
                    error!(
                        sink = sink.name(),
                        event = event.name(),
                        error = %e,
                        "Failed to deliver telemetry event"
                    );
                }
            });
        }
    }

    #[cfg(test)]
    fn in_flight_len(&self) -> usize {
        self.in_flight
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    /// Wait for every event dispatched so far to be delivered (or fail).
    pub async fn flush(&self) {
        let mut pending = {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            std::mem::take(&mut *in_flight)
        };

        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                error!(error = %e, "Telemetry task panicked");
            }
        }
    }
}
