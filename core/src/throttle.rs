//! # Adaptive Batch Throttle
//!
//! A congestion-control state machine for probe sweeps. After every batch it
//! is told how many probes were attempted and how many got no answer at all,
//! and it recommends the next batch size.
//!
//! Only silence feeds it. A refused connection proves the network path is
//! healthy, so deterministic negatives are not congestion evidence; sweeps
//! must count timeouts exclusively.

use tracing::debug;

/// Congestion threshold: more than 5% silent probes in a batch halves it.
const CONGESTION_RATE: f64 = 0.05;

/// What the controller decided after seeing a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleEvent {
    /// Zero silent probes: the batch size doubled (clamped).
    Accelerate,
    /// Failure rate within tolerance: batch size unchanged.
    Stable,
    /// Congestion detected: the batch size halved (clamped).
    ThrottleDown,
}

/// Owned by exactly one sweep loop at a time; `update` takes `&mut self`
/// and the instance is threaded through the loop rather than shared, so
/// there is no hidden cross-sweep state.
#[derive(Debug, Clone)]
pub struct SmartThrottle {
    current_batch: usize,
    min_batch: usize,
    max_batch: usize,
}

impl SmartThrottle {
    pub const DEFAULT_MIN_BATCH: usize = 100;
    pub const DEFAULT_MAX_BATCH: usize = 20_000;

    pub fn new(initial_batch: usize, min_batch: usize, max_batch: usize) -> Self {
        let current_batch = initial_batch.clamp(min_batch, max_batch);
        Self {
            current_batch,
            min_batch,
            max_batch,
        }
    }

    pub fn with_defaults(initial_batch: usize) -> Self {
        Self::new(
            initial_batch,
            Self::DEFAULT_MIN_BATCH,
            Self::DEFAULT_MAX_BATCH,
        )
    }

    /// The recommended size of the next batch.
    pub fn current_batch(&self) -> usize {
        self.current_batch
    }

    pub fn min_batch(&self) -> usize {
        self.min_batch
    }

    pub fn max_batch(&self) -> usize {
        self.max_batch
    }

    /// Digests one finished batch and adjusts the recommendation.
    ///
    /// `attempted` is the number of probes issued, `no_response` how many
    /// timed out with no answer. Clamping is applied after the arithmetic
    /// in both directions, so a controller already at a clamp stays there.
    /// `attempted == 0` is a contract violation; it is tolerated as
    /// [`ThrottleEvent::Stable`] so a degenerate final batch cannot poison
    /// a sweep.
    pub fn update(&mut self, attempted: usize, no_response: usize) -> ThrottleEvent {
        if attempted == 0 {
            debug!("throttle updated with an empty batch; holding steady");
            return ThrottleEvent::Stable;
        }

        let failure_rate: f64 = no_response as f64 / attempted as f64;

        let event = if failure_rate == 0.0 {
            self.current_batch = self.current_batch.saturating_add(attempted);
            ThrottleEvent::Accelerate
        } else if failure_rate > CONGESTION_RATE {
            self.current_batch /= 2;
            ThrottleEvent::ThrottleDown
        } else {
            ThrottleEvent::Stable
        };

        self.current_batch = self.current_batch.clamp(self.min_batch, self.max_batch);
        event
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_exposes_clamps() {
        let throttle = SmartThrottle::new(500, 100, 20_000);
        assert_eq!(throttle.current_batch(), 500);
        assert_eq!(throttle.min_batch(), 100);
        assert_eq!(throttle.max_batch(), 20_000);
    }

    #[test]
    fn zero_failures_accelerate() {
        let mut throttle = SmartThrottle::with_defaults(500);
        let event = throttle.update(500, 0);
        assert_eq!(event, ThrottleEvent::Accelerate);
        assert_eq!(throttle.current_batch(), 1_000);
    }

    #[test]
    fn congestion_throttles_down() {
        // 60 of 1000 silent: 6%, past the 5% threshold.
        let mut throttle = SmartThrottle::with_defaults(1_000);
        let event = throttle.update(1_000, 60);
        assert_eq!(event, ThrottleEvent::ThrottleDown);
        assert_eq!(throttle.current_batch(), 500);
    }

    #[test]
    fn tolerable_failure_rate_is_stable() {
        // 20 of 1000 silent: 2%, inside the stable band.
        let mut throttle = SmartThrottle::with_defaults(1_000);
        let event = throttle.update(1_000, 20);
        assert_eq!(event, ThrottleEvent::Stable);
        assert_eq!(throttle.current_batch(), 1_000);
    }

    #[test]
    fn exactly_five_percent_is_stable() {
        let mut throttle = SmartThrottle::with_defaults(1_000);
        assert_eq!(throttle.update(1_000, 50), ThrottleEvent::Stable);
        assert_eq!(throttle.current_batch(), 1_000);
    }

    #[test]
    fn clamped_at_both_ends() {
        let mut throttle = SmartThrottle::new(100, 100, 20_000);
        throttle.update(100, 50);
        assert_eq!(throttle.current_batch(), 100);

        let mut throttle = SmartThrottle::new(20_000, 100, 20_000);
        throttle.update(20_000, 0);
        assert_eq!(throttle.current_batch(), 20_000);
    }

    #[test]
    fn empty_batch_is_tolerated() {
        let mut throttle = SmartThrottle::with_defaults(500);
        assert_eq!(throttle.update(0, 0), ThrottleEvent::Stable);
        assert_eq!(throttle.current_batch(), 500);
    }

    #[test]
    fn batch_stays_clamped_over_any_update_sequence() {
        let mut throttle = SmartThrottle::new(500, 100, 2_000);
        let batches: &[(usize, usize)] = &[
            (500, 0),
            (1_000, 0),
            (2_000, 0),
            (2_000, 500),
            (1_000, 500),
            (500, 500),
            (250, 250),
            (100, 0),
            (100, 0),
        ];

        for &(attempted, silent) in batches {
            throttle.update(attempted, silent);
            let batch = throttle.current_batch();
            assert!((100..=2_000).contains(&batch), "escaped clamp: {batch}");
        }
    }
}
