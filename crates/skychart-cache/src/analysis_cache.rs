use crate::clock::{Clock, SystemClock};
use parking_lot::Mutex;
use skychart_core::AnalysisResult;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_SWEEP_THRESHOLD: usize = 100;

#[derive(Debug, Clone)]
struct CacheEntry {
    result: AnalysisResult,
    inserted_at: Duration,
}

/// Cache performance statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries dropped because their TTL elapsed
    pub expirations: u64,
    pub sweeps: u64,
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
}

/// Fingerprint-keyed store of finished analyses.
///
/// An entry is served while `now - inserted_at < ttl`. Expired entries are
/// dropped when `get` finds them, and in bulk once a `put` leaves more than
/// `sweep_threshold` entries behind. All state sits behind one mutex that is
/// never held across an await point.
pub struct AnalysisCache {
    state: Mutex<CacheState>,
    ttl: Duration,
    sweep_threshold: usize,
    clock: Arc<dyn Clock>,
}

impl AnalysisCache {
    pub fn new(ttl: Duration, sweep_threshold: usize) -> Self {
        Self::with_clock(ttl, sweep_threshold, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, sweep_threshold: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            ttl,
            sweep_threshold,
            clock,
        }
    }

    pub fn get(&self, fingerprint: &str) -> Option<AnalysisResult> {
        let now = self.clock.now();
        let mut state = self.state.lock();

        let fresh = state
            .entries
            .get(fingerprint)
            .map(|entry| self.is_fresh(entry, now).then(|| entry.result.clone()));

        let hit = match fresh {
            Some(Some(result)) => Some(result),
            Some(None) => {
                state.entries.remove(fingerprint);
                state.stats.expirations += 1;
                debug!(fingerprint, "Cache entry expired");
                None
            }
            None => None,
        };

        if hit.is_some() {
            state.stats.hits += 1;
        } else {
            state.stats.misses += 1;
        }
        hit
    }

    /// Store a result, replacing any previous entry for the fingerprint
    pub fn put(&self, fingerprint: impl Into<String>, result: AnalysisResult) {
        let now = self.clock.now();
        let mut state = self.state.lock();

        state.entries.insert(
            fingerprint.into(),
            CacheEntry {
                result,
                inserted_at: now,
            },
        );

        if state.entries.len() > self.sweep_threshold {
            self.sweep_locked(&mut state, now);
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.state.lock();
        self.sweep_locked(&mut state, now)
    }

    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.state.lock();
        CacheStats {
            entries: state.entries.len(),
            ..state.stats.clone()
        }
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Duration) -> bool {
        now.saturating_sub(entry.inserted_at) < self.ttl
    }

    fn sweep_locked(&self, state: &mut CacheState, now: Duration) -> usize {
        let before = state.entries.len();
        state.entries.retain(|_, entry| self.is_fresh(entry, now));
        let removed = before - state.entries.len();

        state.stats.sweeps += 1;
        state.stats.expirations += removed as u64;
        info!(removed, remaining = state.entries.len(), "Swept analysis cache");
        removed
    }
}

impl Default for AnalysisCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_SWEEP_THRESHOLD)
    }
}
