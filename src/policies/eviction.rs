//! # Eviction policy for capacity decreases.
//!
//! When capacity shrinks below the number of running tasks, the lifecycle
//! manager must force-stop `excess` of them. [`EvictionPolicy`] decides which.
//!
//! ```text
//! running (by start):  T1 ── T2 ── T3        set_capacity(1) → excess = 2
//!
//! OldestFirst   → evict T1, T2; T3 keeps running
//! NewestFirst   → evict T3, T2; T1 keeps running
//! ```
//!
//! Ties on the start instant are broken by task id (lower id = earlier).

use tokio::time::Instant;

use crate::tasks::TaskId;

/// Which running tasks are evicted first when capacity shrinks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Earliest-started tasks are evicted first (default).
    #[default]
    OldestFirst,
    /// Latest-started tasks are evicted first; long-running work survives.
    NewestFirst,
}

impl EvictionPolicy {
    /// Picks `excess` victims out of `(id, started_at)` candidates.
    ///
    /// Returns at most `candidates.len()` ids, in eviction order.
    pub fn select(self, candidates: &[(TaskId, Instant)], excess: usize) -> Vec<TaskId> {
        let mut ordered: Vec<(TaskId, Instant)> = candidates.to_vec();
        ordered.sort_by_key(|(id, at)| (*at, *id));
        if matches!(self, EvictionPolicy::NewestFirst) {
            ordered.reverse();
        }
        ordered.into_iter().take(excess).map(|(id, _)| id).collect()
    }
}
