use indicatif::{ProgressBar, ProgressStyle};
use media_monitor_core::{Event, ReconcileReporter};
use std::sync::Mutex;

/// Rescan progress bar; the total is known once the walk has finished.
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ReconcileReporter for CliReporter {
    fn on_rescan_start(&self, total_entries: usize) {
        let pb = ProgressBar::new(total_entries as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} Reconciling [{bar:30.cyan/dim}] {pos}/{len} entries {msg}",
        ) {
            pb.set_style(
                style
                    .progress_chars("━╸─")
                    .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
            );
        }
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.replace(pb) {
                old.finish_and_clear();
            }
        }
    }

    fn on_rescan_progress(&self, processed: usize, event: &Event) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.set_position(processed as u64);
                pb.set_message(format!("{:?}", event.action));
            }
        }
    }

    fn on_rescan_complete(&self, processed: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Rescan complete: {} entries in {:.2}s",
            processed, duration_secs
        );
    }
}
