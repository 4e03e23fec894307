//! Scripted jobs that record how often and how concurrently they ran.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use winjobs_core::{job, Job};

#[derive(Debug, Default)]
struct ProbeState {
    running: usize,
    max_running: usize,
    in_flight: HashSet<usize>,
    duplicates: usize,
    launches: Vec<usize>,
    attempts: HashMap<usize, u32>,
}

/// Observes job bodies from the inside: concurrency, launch order, attempts.
#[derive(Debug, Default)]
pub struct Probe {
    state: Mutex<ProbeState>,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Returns the 1-based attempt number for `index`.
    fn enter(&self, index: usize) -> u32 {
        let mut s = self.state.lock().unwrap();
        if !s.in_flight.insert(index) {
            s.duplicates += 1;
        }
        s.running += 1;
        s.max_running = s.max_running.max(s.running);
        s.launches.push(index);
        let attempt = s.attempts.entry(index).or_insert(0);
        *attempt += 1;
        *attempt
    }

    fn leave(&self, index: usize) {
        let mut s = self.state.lock().unwrap();
        s.in_flight.remove(&index);
        s.running -= 1;
    }

    pub fn max_running(&self) -> usize {
        self.state.lock().unwrap().max_running
    }

    pub fn running(&self) -> usize {
        self.state.lock().unwrap().running
    }

    pub fn duplicates(&self) -> usize {
        self.state.lock().unwrap().duplicates
    }

    pub fn launches(&self) -> Vec<usize> {
        self.state.lock().unwrap().launches.clone()
    }

    pub fn attempts(&self, index: usize) -> u32 {
        self.state
            .lock()
            .unwrap()
            .attempts
            .get(&index)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_attempts(&self) -> u32 {
        self.state.lock().unwrap().attempts.values().sum()
    }
}

/// Job `index` sleeping `delay_ms`, failing its first `failures` attempts and
/// then resolving to `"r{index}"`.
pub fn scripted(probe: &Arc<Probe>, index: usize, delay_ms: u64, failures: u32) -> Job<String, String> {
    let probe = Arc::clone(probe);
    job(move || {
        let probe = Arc::clone(&probe);
        async move {
            let attempt = probe.enter(index);
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            probe.leave(index);
            if attempt <= failures {
                Err(format!("job {} attempt {} failed", index, attempt))
            } else {
                Ok(format!("r{}", index))
            }
        }
    })
}

/// A job that always fails.
pub fn failing(probe: &Arc<Probe>, index: usize, delay_ms: u64) -> Job<String, String> {
    scripted(probe, index, delay_ms, u32::MAX)
}

pub fn expected_results(len: usize) -> Vec<String> {
    (0..len).map(|i| format!("r{}", i)).collect()
}
