//! Live per-store progress in the terminal

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use skylift_stores::{StoreId, SubmitEvent, SubmitReporter};

/// One spinner per store, updated from status events
pub struct ProgressReporter {
    multi: MultiProgress,
    bars: Mutex<HashMap<StoreId, ProgressBar>>,
    style: ProgressStyle,
}

impl ProgressReporter {
    /// Create a reporter drawing to stderr
    pub fn new() -> Self {
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            style,
        }
    }

    fn start(&self, store: StoreId) {
        let bar = self.multi.add(ProgressBar::new_spinner());
        bar.set_style(self.style.clone());
        bar.set_prefix(format!("{:<7}", store.as_str()));
        bar.set_message("Starting");
        bar.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut bars) = self.bars.lock() {
            bars.insert(store, bar);
        }
    }

    fn with_bar(&self, store: StoreId, f: impl FnOnce(&ProgressBar)) {
        if let Ok(bars) = self.bars.lock() {
            if let Some(bar) = bars.get(&store) {
                f(bar);
            }
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmitReporter for ProgressReporter {
    fn report(&self, event: &SubmitEvent) {
        match event {
            SubmitEvent::Started { store } => self.start(*store),
            SubmitEvent::Status { store, text } => {
                self.with_bar(*store, |bar| bar.set_message(text.clone()));
            }
            SubmitEvent::Succeeded { store, duration } => self.with_bar(*store, |bar| {
                bar.finish_with_message(format!(
                    "{} done ({:.1}s)",
                    style("✓").green().bold(),
                    duration.as_secs_f64()
                ));
            }),
            SubmitEvent::Failed { store, error, .. } => self.with_bar(*store, |bar| {
                bar.finish_with_message(format!("{} {}", style("✗").red().bold(), error));
            }),
            SubmitEvent::AllCompleted { .. } => {
                if let Ok(mut bars) = self.bars.lock() {
                    bars.clear();
                }
            }
        }
    }
}
