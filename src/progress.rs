//! Terminal feedback for the load phases.
//!
//! Reading the export and the final optimize run under spinners; the fact
//! pass gets a bar with one tick per record. With `--log-only` both are
//! hidden and the phases print plain `[PHASE] n/total` lines to stderr.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

/// `eprintln!` that only fires in log-only mode (decode failures, phase lines).
#[macro_export]
macro_rules! log_only {
    ($log_only:expr, $($arg:tt)*) => {
        if $log_only {
            eprintln!($($arg)*);
        }
    };
}

/// Seconds below a minute, fractional minutes above.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}

/// Bar over the records of the fact pass. Hidden in log-only mode.
pub fn create_progress_bar(len: u64, msg: &str, log_only: bool) -> ProgressBar {
    let pb = ProgressBar::new(len);
    if log_only {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else if let Ok(style) = ProgressStyle::default_bar().template(
        "{msg} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}, ETA: {eta})",
    ) {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_message(msg.to_string());
    pb
}

/// Print `[phase] current/total (pct%)` every `interval` records and on the last one.
/// Silent unless `log_only`.
pub fn log_progress(phase: &str, current: u64, total: u64, interval: u64, log_only: bool) {
    if log_only && total > 0 && (current % interval == 0 || current == total) {
        let pct = 100.0 * current as f64 / total as f64;
        eprintln!("[{}] {}/{} ({:.1}%)", phase, current, total, pct);
    }
}

/// Spinner for phases without a known length (reading the TSV, optimize).
pub fn create_spinner(msg: &str, log_only: bool) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if log_only {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        let template = "{msg} {spinner} [{elapsed_precise}]";
        if let Ok(style) = ProgressStyle::default_spinner().template(template) {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
    }
    pb.set_message(msg.to_string());
    pb
}
