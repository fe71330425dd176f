//! # Runtime events emitted by the lifecycle manager and task executors.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Lifecycle events**: task creation, queueing, admission, termination
//! - **Control events**: stop requests, evictions, capacity changes
//! - **Shutdown events**: shutdown requested, grace outcome
//! - **Subscriber events**: overflow and panics inside subscriber workers
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use taskgate::{Event, EventKind, TaskId};
//!
//! let ev = Event::new(EventKind::TaskEvicted)
//!     .with_task(TaskId(3))
//!     .with_counter(12)
//!     .with_reason("capacity_decrease");
//!
//! assert_eq!(ev.kind, EventKind::TaskEvicted);
//! assert_eq!(ev.task, Some(TaskId(3)));
//! assert_eq!(ev.reason.as_deref(), Some("capacity_decrease"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::tasks::{TaskId, TaskStatus};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Task lifecycle events ===
    /// Task record created (`Initialized`).
    ///
    /// Sets:
    /// - `task`: task id
    TaskCreated,

    /// Task queued for admission (`Initialized → Pending`).
    ///
    /// Sets:
    /// - `task`: task id
    TaskEnqueued,

    /// Task received a permit (`Pending → InProgress`).
    ///
    /// Sets:
    /// - `task`: task id
    TaskAdmitted,

    /// Task reached `Terminated`.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `status`: status it left (`Pending` or `InProgress`)
    /// - `counter`: frozen counter value
    /// - `forced`: whether the task was evicted
    /// - `reason`: `"stopped"`, `"evicted"`, `"cancelled_while_pending"` or `"gate_closed"`
    TaskTerminated,

    // === Control events ===
    /// Graceful stop requested by the operator.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `status`: status at the time of the request
    StopRequested,

    /// Running task selected as a victim of a capacity decrease.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `counter`: counter at eviction time
    /// - `reason`: `"capacity_decrease"`
    TaskEvicted,

    /// Capacity changed.
    ///
    /// Sets:
    /// - `capacity`: new capacity
    /// - `previous_capacity`: old capacity
    CapacityChanged,

    // === Shutdown events ===
    /// Shutdown requested.
    ShutdownRequested,

    /// All tasks terminated within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some tasks did not terminate in time.
    ///
    /// Sets:
    /// - `reason`: ids of the stuck tasks
    GraceExceeded,

    // === Subscriber events ===
    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: `"full"` or `"closed"`
    SubscriberOverflow,

    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Task the event refers to, if any.
    pub task: Option<TaskId>,
    /// Task status relevant to the event.
    pub status: Option<TaskStatus>,
    /// Task counter relevant to the event.
    pub counter: Option<u64>,
    /// Whether the task was force-stopped.
    pub forced: Option<bool>,
    /// Capacity after the change.
    pub capacity: Option<usize>,
    /// Capacity before the change.
    pub previous_capacity: Option<usize>,
    /// Subscriber name (subscriber events only).
    pub subscriber: Option<&'static str>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            status: None,
            counter: None,
            forced: None,
            capacity: None,
            previous_capacity: None,
            subscriber: None,
            reason: None,
        }
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, id: TaskId) -> Self {
        self.task = Some(id);
        self
    }

    /// Attaches a task status.
    #[inline]
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches a counter value.
    #[inline]
    pub fn with_counter(mut self, counter: u64) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Attaches the forced-stop flag.
    #[inline]
    pub fn with_forced(mut self, forced: bool) -> Self {
        self.forced = Some(forced);
        self
    }

    /// Attaches a capacity transition.
    #[inline]
    pub fn with_capacity(mut self, previous: usize, current: usize) -> Self {
        self.previous_capacity = Some(previous);
        self.capacity = Some(current);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }

    #[inline]
    pub fn is_subscriber_event(&self) -> bool {
        matches!(
            self.kind,
            EventKind::SubscriberOverflow | EventKind::SubscriberPanicked
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::TaskCreated);
        let b = Event::new(EventKind::TaskCreated);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_capacity_transition_fields() {
        let ev = Event::new(EventKind::CapacityChanged).with_capacity(3, 1);
        assert_eq!(ev.previous_capacity, Some(3));
        assert_eq!(ev.capacity, Some(1));
        assert!(ev.task.is_none());
    }

    #[test]
    fn test_subscriber_event_helpers() {
        let ev = Event::subscriber_overflow("log", "full");
        assert!(ev.is_subscriber_event());
        assert_eq!(ev.subscriber, Some("log"));
        assert!(!Event::new(EventKind::TaskAdmitted).is_subscriber_event());
    }
}
