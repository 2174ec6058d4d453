pub mod anomaly;
pub mod discovery;
pub mod enrich;
pub mod probe;
pub mod result;
pub mod sweep;
pub mod throttle;
