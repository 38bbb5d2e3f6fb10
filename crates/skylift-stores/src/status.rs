//! Submission progress reporting
//!
//! Adapters report short status strings through a [`StatusSink`]. The
//! orchestrator hands each adapter its own sink, which forwards to a shared
//! [`SubmitReporter`] tagged with the store it belongs to.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::types::StoreId;

/// Function-valued sink for one store's status text
#[derive(Clone)]
pub struct StatusSink {
    inner: Arc<dyn Fn(&str) + Send + Sync>,
}

impl StatusSink {
    /// Wrap a closure
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// A sink that drops everything
    pub fn noop() -> Self {
        Self::new(|_| {})
    }

    /// Sink that forwards to `reporter` as [`SubmitEvent::Status`] for `store`
    pub fn for_store(store: StoreId, reporter: Arc<dyn SubmitReporter>) -> Self {
        Self::new(move |text| {
            reporter.report(&SubmitEvent::Status {
                store,
                text: text.to_string(),
            })
        })
    }

    /// Report a status line
    pub fn set(&self, text: impl AsRef<str>) {
        (self.inner)(text.as_ref())
    }
}

impl std::fmt::Debug for StatusSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StatusSink")
    }
}

/// Events emitted while submitting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitEvent {
    /// A store submission is starting
    Started { store: StoreId },
    /// Free-text progress from a store adapter
    Status { store: StoreId, text: String },
    /// A store submission finished successfully
    Succeeded { store: StoreId, duration: Duration },
    /// A store submission failed
    Failed {
        store: StoreId,
        duration: Duration,
        error: String,
    },
    /// Every attempted store has finished
    AllCompleted {
        total: usize,
        failed: usize,
        duration: Duration,
    },
}

/// Receives submission progress
pub trait SubmitReporter: Send + Sync {
    /// Handle an event
    fn report(&self, event: &SubmitEvent);
}

/// Reporter that logs to tracing
#[derive(Debug, Default)]
pub struct TracingReporter;

impl SubmitReporter for TracingReporter {
    fn report(&self, event: &SubmitEvent) {
        match event {
            SubmitEvent::Started { store } => {
                tracing::info!(store = %store, "Submitting to {}", store.display_name());
            }
            SubmitEvent::Status { store, text } => {
                tracing::info!(store = %store, "[{}] {}", store, text);
            }
            SubmitEvent::Succeeded { store, duration } => {
                tracing::info!(
                    store = %store,
                    "{} succeeded in {:.1}s",
                    store.display_name(),
                    duration.as_secs_f64()
                );
            }
            SubmitEvent::Failed {
                store,
                duration,
                error,
            } => {
                tracing::error!(
                    store = %store,
                    "{} failed after {:.1}s: {}",
                    store.display_name(),
                    duration.as_secs_f64(),
                    error
                );
            }
            SubmitEvent::AllCompleted {
                total,
                failed,
                duration,
            } => {
                tracing::info!(
                    "Submissions complete: {}/{} succeeded ({:.1}s)",
                    total - failed,
                    total,
                    duration.as_secs_f64()
                );
            }
        }
    }
}

/// Reporter that collects events for later inspection (useful for testing)
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<SubmitEvent>>,
}

impl CollectingReporter {
    /// Get all collected events
    pub fn events(&self) -> Vec<SubmitEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Status lines reported for one store, in order
    pub fn statuses(&self, store: StoreId) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                SubmitEvent::Status { store: s, text } if s == store => Some(text),
                _ => None,
            })
            .collect()
    }
}

impl SubmitReporter for CollectingReporter {
    fn report(&self, event: &SubmitEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Fans events out to several reporters
pub struct ReporterSet {
    reporters: Vec<Arc<dyn SubmitReporter>>,
}

impl ReporterSet {
    /// Set containing only the tracing reporter
    pub fn new() -> Self {
        Self {
            reporters: vec![Arc::new(TracingReporter)],
        }
    }

    /// Set with no reporters
    #[cfg(test)]
    pub fn empty() -> Self {
        Self {
            reporters: Vec::new(),
        }
    }

    /// Add a reporter
    pub fn register<R: SubmitReporter + 'static>(&mut self, reporter: R) {
        self.reporters.push(Arc::new(reporter));
    }

    /// Add a shared reporter
    #[cfg(test)]
    pub fn register_arc(&mut self, reporter: Arc<dyn SubmitReporter>) {
        self.reporters.push(reporter);
    }
}

impl Default for ReporterSet {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitReporter for ReporterSet {
    fn report(&self, event: &SubmitEvent) {
        for reporter in &self.reporters {
            reporter.report(event);
        }
    }
}
