//! # Task record: identity, status, counter and cancellation handle.
//!
//! A [`TaskRecord`] is plain data plus a change-notification channel. Every
//! mutation of `status` or `counter` publishes a fresh [`TaskView`] to the
//! record's `watch` channel, so display layers can render
//! `"Task {id} -> Counter: {counter} -> {status}"` without polling.
//!
//! Records carry no lock of their own. All mutation goes through the
//! manager's state lock; the setters here are `pub(crate)` for that reason.

use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::status::{TaskId, TaskStatus};
use super::view::TaskView;

/// One task's identity, lifecycle state and cancellation handle.
pub(crate) struct TaskRecord {
    id: TaskId,
    status: TaskStatus,
    counter: u64,
    started_at: Option<Instant>,
    forced_stop: bool,
    cancel: CancellationToken,
    notify: watch::Sender<TaskView>,
}

impl TaskRecord {
    /// Creates a new `Initialized` record with its own cancellation token.
    pub(crate) fn new(id: TaskId, cancel: CancellationToken) -> Self {
        let view = TaskView {
            id,
            status: TaskStatus::Initialized,
            counter: 0,
            forced_stop: false,
        };
        let (notify, _rx) = watch::channel(view);
        Self {
            id,
            status: TaskStatus::Initialized,
            counter: 0,
            started_at: None,
            forced_stop: false,
            cancel,
            notify,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Instant of the `Pending → InProgress` transition, if it happened.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// `true` if the record was evicted by a capacity decrease.
    pub fn is_forced_stop(&self) -> bool {
        self.forced_stop
    }

    /// `true` once the cancellation token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Current read-only projection.
    pub fn view(&self) -> TaskView {
        TaskView {
            id: self.id,
            status: self.status,
            counter: self.counter,
            forced_stop: self.forced_stop,
        }
    }

    /// Subscribes to view changes. The receiver starts at the current view.
    pub fn subscribe(&self) -> watch::Receiver<TaskView> {
        self.notify.subscribe()
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Moves the record forward. Returns `false` (and changes nothing) for
    /// anything but a legal forward transition.
    pub(crate) fn advance(&mut self, next: TaskStatus) -> bool {
        if !self.status.can_advance_to(next) {
            return false;
        }
        self.status = next;
        self.publish();
        true
    }

    /// Records the admission instant. Only the first call has effect.
    pub(crate) fn mark_started(&mut self, at: Instant) {
        if self.started_at.is_none() {
            self.started_at = Some(at);
        }
    }

    pub(crate) fn mark_forced(&mut self) {
        if !self.forced_stop {
            self.forced_stop = true;
            self.publish();
        }
    }

    /// Increments the counter by one tick. No-op unless `InProgress`.
    pub(crate) fn tick(&mut self) -> bool {
        if self.status != TaskStatus::InProgress {
            return false;
        }
        self.counter += 1;
        self.publish();
        true
    }

    fn publish(&self) {
        self.notify.send_replace(self.view());
    }
}
