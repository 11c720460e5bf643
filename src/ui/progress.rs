//! CLI progress rendering: one bar per device, driven by the Executor's
//! progress-callback interface.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;

pub struct ProgressRenderer {
    multi: MultiProgress,
    bars: Mutex<HashMap<String, ProgressBar>>,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
        }
    }

    /// A callback suitable for `Executor::subscribe`, invoked as
    /// `(device_id, progress in [0,1], message)`.
    pub fn callback(self: &std::sync::Arc<Self>) -> crate::executor::ProgressCallback {
        let this = self.clone();
        Box::new(move |device_id: &str, progress: f64, message: &str| {
            this.update(device_id, progress, message);
        })
    }

    fn update(&self, device_id: &str, progress: f64, message: &str) {
        let mut bars = self.bars.lock().expect("progress bar registry poisoned");
        let bar = bars.entry(device_id.to_string()).or_insert_with(|| {
            let bar = self.multi.add(ProgressBar::new(100));
            bar.set_style(
                ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {percent}% {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("=> "),
            );
            bar.set_prefix(device_id.to_string());
            bar
        });
        bar.set_position((progress.clamp(0.0, 1.0) * 100.0) as u64);
        bar.set_message(message.to_string());
        if progress >= 1.0 {
            bar.finish();
        }
    }
}

impl Default for ProgressRenderer {
    fn default() -> Self {
        Self::new()
    }
}
