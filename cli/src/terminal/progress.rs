use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use sweepr_core::sweep::ProgressCallback;

pub fn sweep_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::with_template(
        "{spinner:.blue} {bar:32.green/black} {pos}/{len} probes {msg}",
    )
    .unwrap()
    .tick_strings(&[
        "▁▁▁▁▁",
        "▁▂▂▂▁",
        "▁▄▂▄▁",
        "▂▄▆▄▂",
        "▄▆█▆▄",
        "▂▄▆▄▂",
        "▁▄▂▄▁",
        "▁▂▂▂▁",
    ]);

    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Bridges the engine's `(completed, total, rate)` notifications onto the
/// bar. The engine swallows anything thrown from in here; UI trouble must
/// never touch scan correctness.
pub fn as_callback(bar: ProgressBar) -> ProgressCallback {
    Arc::new(move |completed: usize, total: usize, rate: &str| {
        if bar.length() != Some(total as u64) {
            bar.set_length(total as u64);
        }
        bar.set_position(completed as u64);
        bar.set_message(rate.to_string());
    })
}
