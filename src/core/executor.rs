//! # TaskExecutor: simulated workload of one admitted task.
//!
//! ```text
//! admitted (InProgress, started_at set)
//!   loop {
//!     select! {
//!       cancel.cancelled()     → break
//!       sleep_until(deadline)  → counter += 1, deadline += tick
//!     }
//!   }
//!   cleanup:
//!     forced_stop == false → gate.release()
//!     leave InProgress group, status = Terminated, publish TaskTerminated
//! ```
//!
//! ## Rules
//! - The tick wait is cancellable; cancellation is observed within one poll
//! - Ticks are deadline-based: the counter tracks elapsed intervals without drift
//! - Cleanup runs on every exit; cancellation is not an error
//! - A forced (evicted) task never releases its permit: the permit is retired

use std::sync::Arc;

use tokio::select;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::events::{Event, EventKind};
use crate::tasks::{TaskId, TaskStatus};

use super::state::Shared;

/// Drives one admitted task until its cancellation token fires.
pub(crate) struct TaskExecutor {
    shared: Arc<Shared>,
    id: TaskId,
    cancel: CancellationToken,
}

impl TaskExecutor {
    pub fn new(shared: Arc<Shared>, id: TaskId, cancel: CancellationToken) -> Self {
        Self { shared, id, cancel }
    }

    /// Runs the tick loop, then cleanup.
    pub async fn run(self) {
        let tick = self.shared.cfg.tick_interval();
        let mut deadline = Instant::now() + tick;

        loop {
            select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = time::sleep_until(deadline) => {
                    deadline += tick;
                    if !self.tick().await {
                        break;
                    }
                }
            }
        }
        self.cleanup().await;
    }

    /// Applies one tick. Returns `false` if the task should stop ticking.
    async fn tick(&self) -> bool {
        let mut state = self.shared.state.write().await;
        let Ok(record) = state.record_mut(self.id) else {
            return false;
        };
        if record.is_cancelled() {
            return false;
        }
        let ticked = record.tick();
        trace!(task = self.id.get(), counter = record.counter(), "tick");
        ticked
    }

    async fn cleanup(&self) {
        let mut state = self.shared.state.write().await;
        let Ok(record) = state.record_mut(self.id) else {
            return;
        };
        let forced = record.is_forced_stop();
        let advanced = record.advance(TaskStatus::Terminated);
        let counter = record.counter();
        state.place(self.id, None);
        if !forced && advanced {
            self.shared.gate.release();
        }
        drop(state);

        debug!(task = self.id.get(), counter, forced, "task terminated");
        self.shared.bus.publish(
            Event::new(EventKind::TaskTerminated)
                .with_task(self.id)
                .with_status(TaskStatus::InProgress)
                .with_counter(counter)
                .with_forced(forced)
                .with_reason(if forced { "evicted" } else { "stopped" }),
        );
    }
}
