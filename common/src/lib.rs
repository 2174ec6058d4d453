pub mod config;
pub mod error;
pub mod network;
pub mod ports;

/// Success-level log line, rendered with its own symbol by the CLI formatter.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {
        ::tracing::info!(target: "sweepr::success", $($arg)*)
    };
}
