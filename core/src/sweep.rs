//! # Batched Probe Engine
//!
//! One cooperative scheduler drives every sweep: draw the next batch from
//! the lazy probe sequence, run the whole batch concurrently, wait for all
//! of it (a strict barrier — the throttle needs accurate per-batch failure
//! rates), classify outcomes, consult the throttle, report progress, check
//! the stop flag, repeat until the sequence is dry.
//!
//! Parallelism is the number of in-flight probes in the current batch, not
//! OS threads. Sockets are probe-local; every probe carries its own timeout
//! and can never stall the batch indefinitely.

pub mod tcp;
pub mod udp;

use std::collections::HashMap;
use std::future::Future;
use std::net::IpAddr;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::probe::{Probe, ProbeOutcome};
use crate::throttle::SmartThrottle;
use sweepr_common::config::ScanConfig;

/// Fire-and-forget progress notification: `(completed, total, rate)` where
/// rate is rendered as `"N/s"`. Panics inside the callback are swallowed;
/// progress reporting must never affect scan correctness.
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;

/// Everything a sweep needs besides its targets.
#[derive(Clone)]
pub struct SweepOptions {
    pub probe_timeout: Duration,
    pub initial_batch: usize,
    pub min_batch: usize,
    pub max_batch: usize,
    /// Cooperative stop signal, checked between batches only. In-flight
    /// probes complete or time out naturally.
    pub stop: Option<Arc<AtomicBool>>,
    pub progress: Option<ProgressCallback>,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(500),
            initial_batch: 500,
            min_batch: SmartThrottle::DEFAULT_MIN_BATCH,
            max_batch: SmartThrottle::DEFAULT_MAX_BATCH,
            stop: None,
            progress: None,
        }
    }
}

impl SweepOptions {
    pub fn from_config(cfg: &ScanConfig) -> Self {
        Self {
            probe_timeout: cfg.probe_timeout,
            initial_batch: cfg.initial_batch,
            min_batch: cfg.min_batch,
            max_batch: cfg.max_batch,
            stop: None,
            progress: None,
        }
    }

    pub fn with_stop(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    fn stop_requested(&self) -> bool {
        self.stop
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Runs `probe_fn` over the whole probe sequence under throttle control and
/// returns the probes that came back [`ProbeOutcome::Open`].
pub(crate) async fn run_batched<F, Fut>(
    mut probes: impl Iterator<Item = Probe>,
    total: usize,
    opts: &SweepOptions,
    probe_fn: F,
) -> Vec<Probe>
where
    F: Fn(Probe, Duration) -> Fut,
    Fut: Future<Output = (Probe, ProbeOutcome)> + Send + 'static,
{
    let mut throttle = SmartThrottle::new(opts.initial_batch, opts.min_batch, opts.max_batch);
    let mut open: Vec<Probe> = Vec::new();
    let mut completed: usize = 0;

    loop {
        if opts.stop_requested() {
            debug!("stop requested; ending sweep after {completed}/{total} probes");
            break;
        }

        let batch: Vec<Probe> = (&mut probes).take(throttle.current_batch()).collect();
        if batch.is_empty() {
            break;
        }

        let attempted: usize = batch.len();
        let started: Instant = Instant::now();

        let mut tasks: JoinSet<(Probe, ProbeOutcome)> = JoinSet::new();
        for probe in batch {
            tasks.spawn(probe_fn(probe, opts.probe_timeout));
        }

        let mut no_response: usize = 0;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((probe, ProbeOutcome::Open)) => open.push(probe),
                Ok((_, ProbeOutcome::Closed)) => {}
                Ok((_, ProbeOutcome::NoResponse)) => no_response += 1,
                Err(e) => {
                    // A crashed probe task answers nothing; treat it like
                    // silence so congestion control stays conservative.
                    warn!("probe task failed: {e}");
                    no_response += 1;
                }
            }
        }

        completed += attempted;
        let event = throttle.update(attempted, no_response);
        debug!(
            attempted,
            no_response,
            next_batch = throttle.current_batch(),
            ?event,
            "batch classified"
        );

        notify_progress(opts, completed, total, attempted, started.elapsed());
    }

    open
}

fn notify_progress(
    opts: &SweepOptions,
    completed: usize,
    total: usize,
    attempted: usize,
    elapsed: Duration,
) {
    if let Some(cb) = &opts.progress {
        let rate: String = render_rate(attempted, elapsed);
        let outcome = catch_unwind(AssertUnwindSafe(|| cb(completed, total, &rate)));
        if outcome.is_err() {
            debug!("progress callback panicked; ignoring");
        }
    }
}

/// Renders a batch's throughput as `"N/s"`.
pub(crate) fn render_rate(attempted: usize, elapsed: Duration) -> String {
    let secs: f64 = elapsed.as_secs_f64().max(1e-6);
    format!("{}/s", (attempted as f64 / secs).round() as u64)
}

/// Folds open probes into a host → sorted ports map.
pub(crate) fn collect_by_host(open: Vec<Probe>) -> HashMap<IpAddr, Vec<u16>> {
    let mut by_host: HashMap<IpAddr, Vec<u16>> = HashMap::new();
    for probe in open {
        by_host.entry(probe.addr).or_default().push(probe.port);
    }
    for ports in by_host.values_mut() {
        ports.sort_unstable();
        ports.dedup();
    }
    by_host
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
    use crate::probe::ProbeSet;
    use std::net::Ipv4Addr;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;

    fn test_hosts(n: u8) -> Vec<IpAddr> {
        (1..=n)
            .map(|i| IpAddr::V4(Ipv4Addr::new(192, 168, 1, i)))
            .collect()
    }

    fn options(initial: usize) -> SweepOptions {
        SweepOptions {
            probe_timeout: Duration::from_millis(1),
            initial_batch: initial,
            min_batch: 100,
            max_batch: 20_000,
            stop: None,
            progress: None,
        }
    }

    /// 200 hosts × 10 ports with a clean network for the first 1000 probes
    /// and 10% silence afterwards: the batch size must grow, then shrink,
    /// and the sweep must end below its own peak.
    #[tokio::test]
    async fn adaptive_sweep_accelerates_then_throttles() {
        let hosts = test_hosts(200);
        let ports: Vec<u16> = (80..90).collect();
        let probes = ProbeSet::new(hosts, ports);
        let total = probes.len();
        assert_eq!(total, 2_000);

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_ref = calls.clone();
        let probe_fn = move |probe: Probe, _timeout: Duration| {
            let idx = calls_ref.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                let outcome = if idx > 1_000 && idx % 10 == 0 {
                    ProbeOutcome::NoResponse
                } else {
                    ProbeOutcome::Open
                };
                (probe, outcome)
            }
        };

        let batch_sizes: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let rates: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sizes_ref = batch_sizes.clone();
        let rates_ref = rates.clone();
        let last_completed = AtomicUsize::new(0);
        let progress: ProgressCallback = Arc::new(move |completed: usize, _total: usize, rate: &str| {
            let prev = last_completed.swap(completed, Ordering::SeqCst);
            sizes_ref.lock().unwrap().push(completed - prev);
            rates_ref.lock().unwrap().push(rate.to_string());
        });

        let opts = options(500).with_progress(progress);
        let open = run_batched(probes, total, &opts, probe_fn).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2_000, "every probe issued once");
        assert_eq!(open.len(), 1_900);

        let sizes = batch_sizes.lock().unwrap().clone();
        let peak = *sizes.iter().max().unwrap();
        assert!(peak > 500, "should have accelerated beyond the initial batch");
        assert!(
            *sizes.last().unwrap() < peak,
            "should have throttled below the peak: {sizes:?}"
        );

        for rate in rates.lock().unwrap().iter() {
            assert!(rate.ends_with("/s"), "rate must render as N/s, got {rate}");
        }
    }

    #[tokio::test]
    async fn stop_flag_halts_between_batches() {
        let probes = ProbeSet::new(test_hosts(200), (1..=10).collect());
        let total = probes.len();

        let stop = Arc::new(AtomicBool::new(false));
        let stop_ref = stop.clone();
        let progress: ProgressCallback = Arc::new(move |_c: usize, _t: usize, _r: &str| {
            stop_ref.store(true, Ordering::Relaxed);
        });

        let counted = Arc::new(AtomicUsize::new(0));
        let counted_ref = counted.clone();
        let probe_fn = move |probe: Probe, _t: Duration| {
            counted_ref.fetch_add(1, Ordering::SeqCst);
            async move { (probe, ProbeOutcome::Closed) }
        };

        let opts = options(500).with_stop(stop).with_progress(progress);
        run_batched(probes, total, &opts, probe_fn).await;

        // The first batch ran to completion, then the flag was honoured.
        assert_eq!(counted.load(Ordering::SeqCst), 500);
    }

    #[tokio::test]
    async fn progress_panics_do_not_abort_the_sweep() {
        let probes = ProbeSet::new(test_hosts(2), vec![80]);
        let total = probes.len();

        let progress: ProgressCallback =
            Arc::new(|_c: usize, _t: usize, _r: &str| panic!("ui fell over"));
        let opts = SweepOptions {
            initial_batch: 1,
            min_batch: 1,
            max_batch: 4,
            ..options(1)
        }
        .with_progress(progress);

        let open = run_batched(probes, total, &opts, |probe, _t| async move {
            (probe, ProbeOutcome::Open)
        })
        .await;

        assert_eq!(open.len(), 2);
    }

    #[test]
    fn rate_rendering() {
        assert_eq!(render_rate(500, Duration::from_secs(1)), "500/s");
        assert_eq!(render_rate(1_000, Duration::from_millis(500)), "2000/s");
    }

    #[test]
    fn collect_by_host_sorts_and_dedupes() {
        let addr = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        let open = vec![
            Probe { addr, port: 443 },
            Probe { addr, port: 80 },
            Probe { addr, port: 443 },
        ];
        let map = collect_by_host(open);
        assert_eq!(map[&addr], vec![80, 443]);
    }
}
