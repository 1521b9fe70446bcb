use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Line layout shared by every tracker; `pct` and `eta_hms` are filled by [`bar_style`].
pub const BAR_TEMPLATE: &str = "{msg}: [{bar:30}] {pct}% | {pos}/{len} | ETA: {eta_hms}    ";

/// Redraws per second on a terminal, i.e. at most one line every 500 ms.
pub const REFRESH_HZ: u8 = 2;

/// Where progress output goes.
pub enum ProgressSink {
    Stderr,
    Hidden,
    Target(ProgressDrawTarget),
}

impl ProgressSink {
    pub(crate) fn into_target(self) -> ProgressDrawTarget {
        match self {
            Self::Stderr => ProgressDrawTarget::stderr_with_hz(REFRESH_HZ),
            Self::Hidden => ProgressDrawTarget::hidden(),
            Self::Target(target) => target,
        }
    }

    pub(crate) fn for_display(show: bool) -> Self {
        if show { Self::Stderr } else { Self::Hidden }
    }
}

impl std::fmt::Debug for ProgressSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stderr => f.write_str("Stderr"),
            Self::Hidden => f.write_str("Hidden"),
            Self::Target(_) => f.write_str("Target(..)"),
        }
    }
}

/// Point-in-time view of a tracker's counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressState {
    pub total: u64,
    pub current: u64,
    pub elapsed: Duration,
}

/// Throttled progress meter over a known unit count.
///
/// `update` may be called from any number of threads; the bar counts atomically and redraws
/// at most [`REFRESH_HZ`] times per second.
#[derive(Debug)]
pub struct ProgressTracker {
    label: String,
    bar: ProgressBar,
}

impl ProgressTracker {
    pub fn new(total: u64, label: impl Into<String>, sink: ProgressSink) -> Self {
        let label = label.into();
        let bar = ProgressBar::with_draw_target(Some(total), sink.into_target());
        bar.set_style(bar_style());
        bar.set_message(label.clone());
        Self { label, bar }
    }

    pub fn hidden(total: u64, label: impl Into<String>) -> Self {
        Self::new(total, label, ProgressSink::Hidden)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> ProgressState {
        ProgressState {
            total: self.bar.length().unwrap_or(0),
            current: self.bar.position(),
            elapsed: self.bar.elapsed(),
        }
    }

    /// Record `n` completed units.
    pub fn update(&self, n: u64) {
        self.bar.inc(n);
    }

    /// Overwrite the counter with an absolute position (e.g. percent of a download).
    pub fn set_position(&self, current: u64) {
        self.bar.set_position(current);
    }

    /// Redraw now, ignoring the refresh rate.
    pub fn display(&self) {
        self.bar.tick();
    }

    /// Force the counter to `total`, render the final line and report elapsed time.
    pub fn complete(&self) -> Duration {
        if let Some(total) = self.bar.length() {
            self.bar.set_position(total);
        }
        self.bar.finish();
        let elapsed = self.bar.elapsed();
        self.bar.println(format!("Completed in {}", format_hms(elapsed)));
        tracing::info!(
            label = %self.label,
            total = self.bar.length().unwrap_or(0),
            elapsed_ms = elapsed.as_millis() as u64,
            "progress complete"
        );
        elapsed
    }
}

/// Bar style for [`BAR_TEMPLATE`]: 30 cells of `█`/`░`, one-decimal percent, `H:MM:SS` ETA.
pub fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█░")
        .with_key(
            "pct",
            |state: &indicatif::ProgressState, w: &mut dyn std::fmt::Write| {
                let total = state.len().unwrap_or(0);
                let _ = write!(w, "{:.1}", percent(state.pos(), total));
            },
        )
        .with_key(
            "eta_hms",
            |state: &indicatif::ProgressState, w: &mut dyn std::fmt::Write| {
                let total = state.len().unwrap_or(0);
                let _ = w.write_str(&format_eta(state.pos(), total, state.elapsed()));
            },
        )
}

/// Completed share in percent, clamped to 100. Zero when there is nothing to count.
pub fn percent(current: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (current as f64 * 100.0 / total as f64).min(100.0)
}

/// Remaining time extrapolated from the average rate so far, or `Unknown` before the first unit.
pub fn format_eta(current: u64, total: u64, elapsed: Duration) -> String {
    if current == 0 {
        return "Unknown".to_string();
    }
    let remaining = total.saturating_sub(current) as f64;
    format_hms(Duration::from_secs_f64(
        elapsed.as_secs_f64() * remaining / current as f64,
    ))
}

/// `H:MM:SS`, whole seconds.
pub fn format_hms(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

#[cfg(test)]
#[path = "../../tests/unit/progress/tracker.rs"]
mod tests;
