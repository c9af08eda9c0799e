#![cfg(feature = "metrics")]

use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

/* ───────────── latencies, aggregated per stage ──────── */

/// Samples kept per stage for the p95; older ones are overwritten.
const WINDOW: usize = 4096;

#[derive(Debug, Default)]
struct Stage {
    count: usize,
    total_us: u128,
    window: Vec<u128>,
    next: usize,
}

impl Stage {
    fn push(&mut self, us: u128) {
        self.count += 1;
        self.total_us += us;
        if self.window.len() < WINDOW {
            self.window.push(us);
        } else {
            self.window[self.next] = us;
        }
        self.next = (self.next + 1) % WINDOW;
    }

    fn stats(self, name: &'static str) -> StageStats {
        let mut v = self.window;
        v.sort_unstable();
        let p95 = v[((v.len() * 95) / 100).saturating_sub(1)];
        StageStats {
            name,
            samples: self.count,
            mean_us: self.total_us / self.count as u128,
            p95_us: p95,
        }
    }
}

#[derive(Debug, Default)]
struct Stages(HashMap<&'static str, Stage>);

impl Stages {
    fn push(&mut self, name: &'static str, us: u128) {
        self.0.entry(name).or_default().push(us);
    }

    fn drain(&mut self) -> Vec<StageStats> {
        let mut stats: Vec<StageStats> =
            self.0.drain().map(|(name, stage)| stage.stats(name)).collect();
        stats.sort_by_key(|s| s.name);
        stats
    }
}

static TIMES: Lazy<Mutex<Stages>> = Lazy::new(|| Mutex::new(Stages::default()));

/// Call around a stage: `record("cpu_step", start)`.
pub fn record(name: &'static str, start: Instant) {
    let dur = start.elapsed().as_micros();
    // a poisoned lock only means another recorder panicked; keep the samples
    let mut times = TIMES.lock().unwrap_or_else(|e| e.into_inner());
    times.push(name, dur);
}

/* ───────────── device allocations ────────────────────── */

/// Live device boards and their total size in bytes.
pub static ALLOCS:      AtomicUsize = AtomicUsize::new(0);
pub static ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);

/* ───────────── summary ───────────────────────────────── */

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageStats {
    pub name: &'static str,
    pub samples: usize,
    pub mean_us: u128,
    pub p95_us: u128,
}

/// Drains the recorded latencies into per-stage statistics, sorted by name.
/// `samples` and `mean_us` cover every recording; `p95_us` covers the most
/// recent `WINDOW` of them.
pub fn summary() -> Vec<StageStats> {
    let stats = TIMES.lock().unwrap_or_else(|e| e.into_inner()).drain();

    for s in &stats {
        tracing::info!(
            stage = s.name,
            samples = s.samples,
            mean_us = %s.mean_us,
            p95_us = %s.p95_us,
            "latency"
        );
    }
    tracing::info!(
        allocations = ALLOCS.load(Ordering::Relaxed),
        bytes = ALLOC_BYTES.load(Ordering::Relaxed),
        "device boards still allocated"
    );

    stats
}

/// Drops all recorded latencies.
pub fn reset() {
    TIMES.lock().unwrap_or_else(|e| e.into_inner()).0.clear();
}
