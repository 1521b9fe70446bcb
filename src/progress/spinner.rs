use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::progress::tracker::ProgressSink;

/// Braille frames, followed by the (cleared) finished frame.
const FRAMES: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "];
const TICK: Duration = Duration::from_millis(100);
const SPINNER_TEMPLATE: &str = "{msg} {spinner} Elapsed: {elapsed_mmss}";

/// Activity indicator for work with no countable units (the single-shot transform).
///
/// Ticks on a background thread until stopped or dropped; clears its line on exit.
#[derive(Debug)]
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn start(label: impl Into<String>, sink: ProgressSink) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_draw_target(sink.into_target());
        bar.set_style(spinner_style());
        bar.set_message(label.into());
        if bar.is_hidden() {
            bar.finish_and_clear();
        } else {
            bar.enable_steady_tick(TICK);
        }
        Self { bar }
    }

    pub fn is_running(&self) -> bool {
        !self.bar.is_finished()
    }

    pub fn stop(self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template(SPINNER_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&FRAMES)
        .with_key(
            "elapsed_mmss",
            |state: &indicatif::ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = w.write_str(&format_mmss(state.elapsed()));
            },
        )
}

/// `MM:SS`, minutes not wrapped at the hour.
pub(crate) fn format_mmss(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
#[path = "../../tests/unit/progress/spinner.rs"]
mod tests;
