//! # TaskLifecycleManager: creation, admission, stop, resize, shutdown.
//!
//! The manager owns every task record and its membership in
//! one of three observable groups. It is a cheap `Clone` handle; all clones share
//! the same state.
//!
//! ## State machine
//! ```text
//! create_task ──► Initialized ──enqueue──► Pending ──gate.acquire──► InProgress
//!                                            │                          │
//!                                  cancel before permit          stop / eviction
//!                                            ▼                          ▼
//!                                        Terminated ◄──── executor cleanup
//! ```
//!
//! ## Resize
//! ```text
//! set_capacity(new)
//!   new > old → gate.increase_capacity(new - old)     (waiting tasks resume)
//!   new < old → debt = gate.decrease_capacity(old - new)   (idle permits retired)
//!               victims = eviction.select(running, min(debt, running))
//!               victim: forced_stop = true, cancel    (permit never released)
//!               gate.owe(debt - victims)              (racing admissions)
//!   new == old → no-op
//!
//! admission with owed > 0 → permit retired, task stays Pending and waits again
//! ```
//!
//! ## Rules
//! - Every mutation happens under the state write guard (single writer)
//! - Resizes are serialized by that guard and apply in arrival order
//! - Victims come from the running group at resize time; an admission racing
//!   with the resize is never evicted, its permit is owed instead and the
//!   admission pays it by going back to the queue

use std::cmp::Ordering;
use std::sync::Arc;

use tokio::sync::{broadcast, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AdmissionError, ControlError, RuntimeError};
use crate::events::{Event, EventKind};
use crate::tasks::{TaskId, TaskStatus, TaskView};

use super::builder::ManagerBuilder;
use super::executor::TaskExecutor;
use super::snapshot::{Resize, Snapshot};
use super::state::{Group, Shared};

/// Orchestrates the task lifecycle over a resizable [`AdmissionGate`](crate::AdmissionGate).
#[derive(Clone)]
pub struct TaskLifecycleManager {
    shared: Arc<Shared>,
    tracker: TaskTracker,
    runtime_token: CancellationToken,
    listener_token: CancellationToken,
    listener: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl TaskLifecycleManager {
    /// Creates a manager with no subscribers. Must be called inside a tokio runtime.
    pub fn new(cfg: Config) -> Self {
        ManagerBuilder::new(cfg).build()
    }

    /// Returns a builder for a manager with subscribers.
    pub fn builder(cfg: Config) -> ManagerBuilder {
        ManagerBuilder::new(cfg)
    }

    pub(crate) fn from_parts(
        shared: Arc<Shared>,
        runtime_token: CancellationToken,
        listener_token: CancellationToken,
        listener: JoinHandle<()>,
    ) -> Self {
        Self {
            shared,
            tracker: TaskTracker::new(),
            runtime_token,
            listener_token,
            listener: Arc::new(Mutex::new(Some(listener))),
        }
    }

    /// Configuration the manager was built with.
    pub fn config(&self) -> &Config {
        &self.shared.cfg
    }

    /// Current configured maximum of running tasks.
    pub fn capacity(&self) -> usize {
        self.shared.gate.capacity()
    }

    /// Receiver for lifecycle events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.bus.subscribe()
    }

    /// Creates a new `Initialized` task.
    pub async fn create_task(&self) -> TaskId {
        let id = {
            let mut state = self.shared.state.write().await;
            state.create(self.runtime_token.child_token())
        };
        debug!(task = id.get(), "task created");
        self.shared
            .bus
            .publish(Event::new(EventKind::TaskCreated).with_task(id));
        id
    }

    /// Queues an `Initialized` task and starts its admission attempt.
    ///
    /// # Errors
    /// - [`ControlError::NotFound`] for an unknown id
    /// - [`ControlError::InvalidState`] unless the task is `Initialized`
    pub async fn enqueue(&self, id: TaskId) -> Result<(), ControlError> {
        let cancel = {
            let mut state = self.shared.state.write().await;
            let record = state.record_mut(id)?;
            if record.status() != TaskStatus::Initialized {
                return Err(ControlError::InvalidState {
                    id,
                    actual: record.status(),
                    expected: "Initialized",
                });
            }
            record.advance(TaskStatus::Pending);
            let cancel = record.cancel_token().clone();
            state.place(id, Some(Group::Pending));
            cancel
        };

        debug!(task = id.get(), "task enqueued");
        self.shared
            .bus
            .publish(Event::new(EventKind::TaskEnqueued).with_task(id));

        let shared = Arc::clone(&self.shared);
        self.tracker.spawn(admit(shared, id, cancel));
        Ok(())
    }

    /// Requests graceful cancellation of a `Pending` or `InProgress` task.
    ///
    /// A running task returns its permit; a pending one gives up waiting.
    /// Re-stopping a task whose cancellation is still in flight is a no-op.
    ///
    /// # Errors
    /// - [`ControlError::NotFound`] for an unknown id
    /// - [`ControlError::InvalidState`] for `Initialized` or `Terminated` tasks
    pub async fn stop(&self, id: TaskId) -> Result<(), ControlError> {
        let status = {
            let state = self.shared.state.write().await;
            let record = state.record(id)?;
            match record.status() {
                status @ (TaskStatus::Pending | TaskStatus::InProgress) => {
                    record.cancel_token().cancel();
                    status
                }
                actual => {
                    return Err(ControlError::InvalidState {
                        id,
                        actual,
                        expected: "Pending or InProgress",
                    });
                }
            }
        };

        debug!(task = id.get(), status = status.as_label(), "stop requested");
        self.shared.bus.publish(
            Event::new(EventKind::StopRequested)
                .with_task(id)
                .with_status(status),
        );
        Ok(())
    }

    /// Changes the maximum number of running tasks.
    ///
    /// Growing admits waiting tasks at once. Shrinking below the running count
    /// force-stops the excess per [`Config::eviction`]; their permits are retired.
    ///
    /// # Errors
    /// [`ControlError::InvalidArgument`] for non-positive or oversized values;
    /// nothing changes in that case.
    pub async fn set_capacity(&self, requested: i64) -> Result<Resize, ControlError> {
        let current = Config::validate_capacity(requested)?;
        let gate = &self.shared.gate;

        let mut state = self.shared.state.write().await;
        let previous = gate.capacity();
        let mut evicted = Vec::new();

        match current.cmp(&previous) {
            Ordering::Equal => {
                return Ok(Resize {
                    previous,
                    current,
                    evicted,
                });
            }
            Ordering::Greater => gate.increase_capacity(current - previous),
            Ordering::Less => {
                let debt = gate.decrease_capacity(previous - current);
                let candidates = state.eviction_candidates();
                let excess = candidates.len().saturating_sub(current);
                if debt != excess {
                    debug!(debt, excess, "admission raced capacity decrease");
                }
                evicted = self.shared.cfg.eviction.select(&candidates, debt);
                gate.owe(debt - evicted.len());
                for id in &evicted {
                    let record = state.record_mut(*id)?;
                    record.mark_forced();
                    record.cancel_token().cancel();
                    self.shared.bus.publish(
                        Event::new(EventKind::TaskEvicted)
                            .with_task(*id)
                            .with_counter(record.counter())
                            .with_reason("capacity_decrease"),
                    );
                }
            }
        }
        drop(state);

        info!(previous, capacity = current, evicted = evicted.len(), "capacity changed");
        self.shared.bus.publish(
            Event::new(EventKind::CapacityChanged).with_capacity(previous, current),
        );
        Ok(Resize {
            previous,
            current,
            evicted,
        })
    }

    /// Like [`set_capacity`](Self::set_capacity), parsing raw operator text.
    ///
    /// # Errors
    /// [`ControlError::InvalidArgument`] for text that is not a positive integer.
    pub async fn set_capacity_str(&self, raw: &str) -> Result<Resize, ControlError> {
        let requested = Config::parse_capacity(raw)?;
        let requested = i64::try_from(requested)
            .map_err(|_| ControlError::invalid_argument(format!("capacity {raw:?} is too large")))?;
        self.set_capacity(requested).await
    }

    /// Ordered views of the three groups plus gate counters.
    pub async fn snapshot(&self) -> Snapshot {
        let state = self.shared.state.read().await;
        Snapshot {
            initialized: state.views(Group::Initialized),
            pending: state.views(Group::Pending),
            in_progress: state.views(Group::InProgress),
            capacity: self.shared.gate.capacity(),
            available_permits: self.shared.gate.available_permits(),
            owed_permits: self.shared.gate.owed_permits(),
        }
    }

    /// Current view of one task, including terminated ones.
    ///
    /// # Errors
    /// [`ControlError::NotFound`] for an unknown id.
    pub async fn task(&self, id: TaskId) -> Result<TaskView, ControlError> {
        let state = self.shared.state.read().await;
        Ok(state.record(id)?.view())
    }

    /// Change notifications for one task's display view.
    ///
    /// # Errors
    /// [`ControlError::NotFound`] for an unknown id.
    pub async fn watch(&self, id: TaskId) -> Result<watch::Receiver<TaskView>, ControlError> {
        let state = self.shared.state.read().await;
        Ok(state.record(id)?.subscribe())
    }

    /// Cancels every queued and running task and waits up to [`Config::grace`].
    ///
    /// Cancellation through shutdown is graceful: running tasks return their permits.
    /// After shutdown the gate is closed and newly queued tasks terminate at once.
    ///
    /// # Errors
    /// [`RuntimeError::GraceExceeded`] with the tasks still live after the grace period.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        info!("shutdown requested");
        self.shared
            .bus
            .publish(Event::new(EventKind::ShutdownRequested));
        self.runtime_token.cancel();
        self.tracker.close();

        let grace = self.shared.cfg.grace;
        let res = match time::timeout(grace, self.tracker.wait()).await {
            Ok(()) => {
                self.shared
                    .bus
                    .publish(Event::new(EventKind::AllStoppedWithin));
                Ok(())
            }
            Err(_elapsed) => {
                let stuck = self.shared.state.read().await.live();
                warn!(?grace, ?stuck, "shutdown grace exceeded");
                self.shared.bus.publish(
                    Event::new(EventKind::GraceExceeded).with_reason(format!("{stuck:?}")),
                );
                Err(RuntimeError::GraceExceeded { grace, stuck })
            }
        };
        self.shared.gate.close();
        self.listener_token.cancel();
        if let Some(listener) = self.listener.lock().await.take() {
            let _ = listener.await;
        }
        res
    }
}

/// Waits for a permit, then promotes the task and runs its executor.
///
/// A permit granted while a capacity decrease still owes permits pays that
/// debt instead; the task stays `Pending` and waits again.
async fn admit(shared: Arc<Shared>, id: TaskId, cancel: CancellationToken) {
    loop {
        if let Err(err) = shared.gate.acquire(&cancel).await {
            abandon(&shared, id, err).await;
            return;
        }

        let mut state = shared.state.write().await;
        if shared.gate.retire_owed() {
            debug!(task = id.get(), "permit retired by capacity decrease, requeued");
            continue;
        }
        let Ok(record) = state.record_mut(id) else {
            shared.gate.release();
            return;
        };
        record.advance(TaskStatus::InProgress);
        record.mark_started(Instant::now());
        state.place(id, Some(Group::InProgress));
        break;
    }

    debug!(task = id.get(), "task admitted");
    shared
        .bus
        .publish(Event::new(EventKind::TaskAdmitted).with_task(id));

    TaskExecutor::new(shared, id, cancel).run().await;
}

/// `Pending → Terminated` without ever holding a permit.
async fn abandon(shared: &Shared, id: TaskId, err: AdmissionError) {
    {
        let mut state = shared.state.write().await;
        if let Ok(record) = state.record_mut(id) {
            record.advance(TaskStatus::Terminated);
        }
        state.place(id, None);
    }

    let reason = match err {
        AdmissionError::Canceled => "cancelled_while_pending",
        AdmissionError::Closed => "gate_closed",
    };
    debug!(task = id.get(), reason, "task left queue");
    shared.bus.publish(
        Event::new(EventKind::TaskTerminated)
            .with_task(id)
            .with_status(TaskStatus::Pending)
            .with_counter(0)
            .with_forced(false)
            .with_reason(reason),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    /// Lets every spawned admission/executor step run to its next suspension point.
    async fn settle() {
        time::sleep(Duration::from_millis(1)).await;
    }

    async fn manager_with(cfg: Config) -> (TaskLifecycleManager, Vec<TaskId>) {
        let mgr = TaskLifecycleManager::new(cfg);
        let mut ids = Vec::new();
        for _ in 0..4 {
            let id = mgr.create_task().await;
            mgr.enqueue(id).await.unwrap();
            ids.push(id);
            // Distinct start instants for the admitted ones.
            settle().await;
        }
        (mgr, ids)
    }

    /// Capacity 3, T1..T4 enqueued in order: T1..T3 running, T4 pending.
    async fn scenario_a(cfg: Config) -> (TaskLifecycleManager, Vec<TaskId>) {
        let (mgr, ids) = manager_with(cfg).await;
        let snap = mgr.snapshot().await;
        assert_eq!(snap.in_progress_ids(), ids[..3].to_vec());
        assert_eq!(snap.pending_ids(), vec![ids[3]]);
        assert!(snap.initialized.is_empty());
        assert_eq!(snap.available_permits, 0);
        (mgr, ids)
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_places_in_initialized_group() {
        let mgr = TaskLifecycleManager::new(Config::default());
        let a = mgr.create_task().await;
        let b = mgr.create_task().await;
        assert_eq!((a, b), (TaskId(1), TaskId(2)));

        let snap = mgr.snapshot().await;
        assert_eq!(snap.initialized_ids(), vec![a, b]);
        assert_eq!(snap.capacity, 3);
        assert_eq!(snap.available_permits, 3);
        assert_eq!(
            snap.initialized[0].to_string(),
            "Task 1 -> Counter: 0 -> Initialized"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_a_fills_capacity_then_queues() {
        let (mgr, _ids) = scenario_a(Config::default()).await;
        assert!(mgr.snapshot().await.is_balanced());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_b_graceful_stop_hands_permit_to_pending() {
        let (mgr, ids) = scenario_a(Config::default()).await;
        time::sleep(Duration::from_millis(2500)).await;

        mgr.stop(ids[1]).await.unwrap();
        settle().await;

        let snap = mgr.snapshot().await;
        assert_eq!(snap.in_progress_ids(), vec![ids[0], ids[2], ids[3]]);
        assert!(snap.pending.is_empty());
        assert!(snap.is_balanced());

        let stopped = mgr.task(ids[1]).await.unwrap();
        assert_eq!(stopped.status, TaskStatus::Terminated);
        assert!(!stopped.forced_stop);

        time::sleep(Duration::from_secs(3)).await;
        assert_eq!(mgr.task(ids[1]).await.unwrap().counter, stopped.counter);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_c_oldest_first_eviction() {
        let (mgr, ids) = scenario_a(Config::default()).await;

        let resize = mgr.set_capacity(1).await.unwrap();
        assert_eq!(resize.previous, 3);
        assert_eq!(resize.current, 1);
        assert_eq!(resize.evicted, vec![ids[0], ids[1]]);
        settle().await;

        let snap = mgr.snapshot().await;
        assert_eq!(snap.in_progress_ids(), vec![ids[2]]);
        assert_eq!(snap.pending_ids(), vec![ids[3]]);
        assert_eq!(snap.capacity, 1);
        assert_eq!(snap.available_permits, 0);
        assert!(snap.is_balanced());

        for victim in &resize.evicted {
            let view = mgr.task(*victim).await.unwrap();
            assert_eq!(view.status, TaskStatus::Terminated);
            assert!(view.forced_stop);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_c_newest_first_keeps_earliest() {
        let cfg = Config {
            eviction: crate::policies::EvictionPolicy::NewestFirst,
            ..Config::default()
        };
        let (mgr, ids) = scenario_a(cfg).await;

        let resize = mgr.set_capacity(1).await.unwrap();
        assert_eq!(resize.evicted, vec![ids[2], ids[1]]);
        settle().await;

        let snap = mgr.snapshot().await;
        assert_eq!(snap.in_progress_ids(), vec![ids[0]]);
        assert_eq!(snap.pending_ids(), vec![ids[3]]);
        assert!(snap.is_balanced());
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_d_growth_admits_pending() {
        let (mgr, ids) = scenario_a(Config::default()).await;

        let resize = mgr.set_capacity(5).await.unwrap();
        assert!(resize.evicted.is_empty());
        settle().await;

        let snap = mgr.snapshot().await;
        assert_eq!(snap.in_progress_ids(), ids.clone());
        assert_eq!(snap.available_permits, 1);
        assert!(snap.is_balanced());

        let extra = mgr.create_task().await;
        mgr.enqueue(extra).await.unwrap();
        settle().await;
        assert_eq!(mgr.task(extra).await.unwrap().status, TaskStatus::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn test_scenario_e_rejects_non_positive_capacity() {
        let (mgr, _ids) = scenario_a(Config::default()).await;
        let before = mgr.snapshot().await;

        for bad in [0, -1] {
            let err = mgr.set_capacity(bad).await.unwrap_err();
            assert_eq!(err.as_label(), "control_invalid_argument");
        }
        for bad in ["", "three", "-4", "1.5"] {
            assert!(mgr.set_capacity_str(bad).await.is_err());
        }
        settle().await;

        let after = mgr.snapshot().await;
        assert_eq!(after.capacity, 3);
        assert_eq!(after.in_progress_ids(), before.in_progress_ids());
        assert_eq!(after.pending_ids(), before.pending_ids());
    }

    #[tokio::test(start_paused = true)]
    async fn test_same_capacity_is_noop() {
        let (mgr, _ids) = scenario_a(Config::default()).await;
        let resize = mgr.set_capacity_str(" 3 ").await.unwrap();
        assert_eq!(resize.previous, resize.current);
        assert!(resize.evicted.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shrink_with_idle_permits_evicts_nothing() {
        let mgr = TaskLifecycleManager::new(Config::default());
        let id = mgr.create_task().await;
        mgr.enqueue(id).await.unwrap();
        settle().await;

        let resize = mgr.set_capacity(1).await.unwrap();
        assert!(resize.evicted.is_empty());
        settle().await;

        let snap = mgr.snapshot().await;
        assert_eq!(snap.in_progress_ids(), vec![id]);
        assert_eq!(snap.available_permits, 0);
        assert!(snap.is_balanced());
    }

    #[tokio::test(start_paused = true)]
    async fn test_back_to_back_resizes_apply_in_order() {
        let (mgr, ids) = scenario_a(Config::default()).await;

        let first = mgr.set_capacity(2).await.unwrap();
        let second = mgr.set_capacity(1).await.unwrap();
        assert_eq!(first.evicted, vec![ids[0]]);
        // The first victim is still cleaning up; it must not be picked again.
        assert_eq!(second.evicted, vec![ids[1]]);
        settle().await;

        let snap = mgr.snapshot().await;
        assert_eq!(snap.in_progress_ids(), vec![ids[2]]);
        assert_eq!(snap.pending_ids(), vec![ids[3]]);
        assert!(snap.is_balanced());

        mgr.set_capacity(2).await.unwrap();
        settle().await;
        let snap = mgr.snapshot().await;
        assert_eq!(snap.in_progress_ids(), vec![ids[2], ids[3]]);
        assert!(snap.is_balanced());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shrink_racing_admissions_settles_within_capacity() {
        let cfg = Config {
            initial_capacity: 1,
            ..Config::default()
        };
        let mgr = TaskLifecycleManager::new(cfg);
        let mut ids = Vec::new();
        for _ in 0..3 {
            let id = mgr.create_task().await;
            mgr.enqueue(id).await.unwrap();
            ids.push(id);
            settle().await;
        }
        assert_eq!(mgr.snapshot().await.in_progress_ids(), vec![ids[0]]);

        // Grow hands permits to T2 and T3; the shrink lands before either is promoted.
        mgr.set_capacity(3).await.unwrap();
        let resize = mgr.set_capacity(1).await.unwrap();
        assert_eq!(resize.evicted, vec![ids[0]]);
        assert_eq!(mgr.snapshot().await.owed_permits, 1);

        time::sleep(Duration::from_secs(30)).await;
        let snap = mgr.snapshot().await;
        assert_eq!(snap.capacity, 1);
        assert_eq!(snap.in_progress.len(), 1);
        assert_eq!(snap.pending.len(), 1);
        assert_eq!(snap.owed_permits, 0);
        assert_eq!(snap.available_permits, 0);
        assert!(snap.is_balanced());

        // The requeued task is admitted once the survivor stops.
        let survivor = snap.in_progress_ids()[0];
        let waiting = snap.pending_ids()[0];
        mgr.stop(survivor).await.unwrap();
        settle().await;
        let snap = mgr.snapshot().await;
        assert_eq!(snap.in_progress_ids(), vec![waiting]);
        assert!(snap.pending.is_empty());
        assert!(snap.is_balanced());
        assert_eq!(mgr.task(waiting).await.unwrap().status, TaskStatus::InProgress);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_pending_task_releases_nothing() {
        let (mgr, ids) = scenario_a(Config::default()).await;

        mgr.stop(ids[3]).await.unwrap();
        settle().await;

        let snap = mgr.snapshot().await;
        assert!(snap.pending.is_empty());
        assert_eq!(snap.in_progress_ids(), ids[..3].to_vec());
        assert_eq!(snap.available_permits, 0);

        let view = mgr.task(ids[3]).await.unwrap();
        assert_eq!(view.status, TaskStatus::Terminated);
        assert_eq!(view.counter, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_state_and_not_found() {
        let mgr = TaskLifecycleManager::new(Config::default());
        let id = mgr.create_task().await;

        assert!(matches!(
            mgr.stop(id).await,
            Err(ControlError::InvalidState { actual: TaskStatus::Initialized, .. })
        ));
        mgr.enqueue(id).await.unwrap();
        assert!(matches!(
            mgr.enqueue(id).await,
            Err(ControlError::InvalidState { expected: "Initialized", .. })
        ));
        assert_eq!(
            mgr.enqueue(TaskId(99)).await,
            Err(ControlError::NotFound { id: TaskId(99) })
        );
        assert_eq!(
            mgr.stop(TaskId(99)).await,
            Err(ControlError::NotFound { id: TaskId(99) })
        );
        assert!(mgr.task(TaskId(99)).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopping_terminated_task_changes_nothing() {
        let mgr = TaskLifecycleManager::new(Config::default());
        let id = mgr.create_task().await;
        mgr.enqueue(id).await.unwrap();
        time::sleep(Duration::from_millis(2500)).await;
        mgr.stop(id).await.unwrap();
        settle().await;

        let before = mgr.task(id).await.unwrap();
        assert_eq!(before.status, TaskStatus::Terminated);
        assert_eq!(before.counter, 2);

        assert!(matches!(
            mgr.stop(id).await,
            Err(ControlError::InvalidState { actual: TaskStatus::Terminated, .. })
        ));
        time::sleep(Duration::from_secs(2)).await;
        assert_eq!(mgr.task(id).await.unwrap(), before);
        assert_eq!(mgr.snapshot().await.available_permits, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_counter_advances_one_per_tick() {
        let mgr = TaskLifecycleManager::new(Config::default());
        let id = mgr.create_task().await;
        mgr.enqueue(id).await.unwrap();
        settle().await;

        time::sleep(Duration::from_millis(3500)).await;
        let t1 = mgr.task(id).await.unwrap().counter;
        time::sleep(Duration::from_secs(2)).await;
        let t2 = mgr.task(id).await.unwrap().counter;
        assert_eq!(t1, 3);
        assert_eq!(t2, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_receives_display_updates() {
        let mgr = TaskLifecycleManager::new(Config::default());
        let id = mgr.create_task().await;
        let mut rx = mgr.watch(id).await.unwrap();
        mgr.enqueue(id).await.unwrap();
        time::sleep(Duration::from_millis(1500)).await;

        rx.changed().await.unwrap();
        assert_eq!(
            rx.borrow_and_update().to_string(),
            "Task 1 -> Counter: 1 -> InProgress"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_follow_lifecycle() {
        let mgr = TaskLifecycleManager::new(Config::default());
        let mut rx = mgr.subscribe();
        let id = mgr.create_task().await;
        mgr.enqueue(id).await.unwrap();
        settle().await;
        mgr.stop(id).await.unwrap();
        settle().await;

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            vec![
                EventKind::TaskCreated,
                EventKind::TaskEnqueued,
                EventKind::TaskAdmitted,
                EventKind::StopRequested,
                EventKind::TaskTerminated,
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_terminates_everything() {
        let (mgr, ids) = scenario_a(Config::default()).await;
        mgr.shutdown().await.unwrap();

        let snap = mgr.snapshot().await;
        assert!(snap.pending.is_empty());
        assert!(snap.in_progress.is_empty());
        assert_eq!(snap.available_permits, 3);
        for id in ids {
            assert_eq!(mgr.task(id).await.unwrap().status, TaskStatus::Terminated);
        }

        let late = mgr.create_task().await;
        mgr.enqueue(late).await.unwrap();
        settle().await;
        assert_eq!(mgr.task(late).await.unwrap().status, TaskStatus::Terminated);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_churn_keeps_accounting_balanced() {
        let cfg = Config {
            tick: Duration::from_millis(5),
            ..Config::default()
        };
        let mgr = TaskLifecycleManager::new(cfg);

        let mut workers = Vec::new();
        for w in 0..4 {
            let mgr = mgr.clone();
            workers.push(tokio::spawn(async move {
                for i in 0..10 {
                    let id = mgr.create_task().await;
                    mgr.enqueue(id).await.unwrap();
                    if (i + w) % 3 == 0 {
                        let _ = mgr.stop(id).await;
                    }
                }
            }));
        }
        let resizer = {
            let mgr = mgr.clone();
            tokio::spawn(async move {
                for cap in [5, 2, 4, 1, 6, 3] {
                    mgr.set_capacity(cap).await.unwrap();
                    time::sleep(Duration::from_millis(3)).await;
                }
            })
        };
        for w in workers {
            w.await.unwrap();
        }
        resizer.await.unwrap();
        time::sleep(Duration::from_millis(50)).await;

        let snap = mgr.snapshot().await;
        assert_eq!(snap.capacity, 3);
        assert_eq!(snap.owed_permits, 0);
        assert!(snap.in_progress.len() <= snap.capacity);
        assert!(snap.is_balanced());

        // Graceful stops return or settle every permit still in play.
        mgr.shutdown().await.unwrap();
        let snap = mgr.snapshot().await;
        assert!(snap.in_progress.is_empty());
        assert_eq!(snap.owed_permits, 0);
        assert_eq!(snap.available_permits, snap.capacity);
    }
}
