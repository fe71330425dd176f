//! # LogWriter: event to `tracing` bridge
//!
//! A minimal subscriber that turns incoming [`Event`]s into `tracing` records.
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO taskgate: created task=1
//! INFO taskgate: admitted task=1
//! INFO taskgate: capacity changed previous=3 capacity=1
//! WARN taskgate: evicted task=2 counter=4
//! INFO taskgate: terminated task=2 counter=4 forced=true reason="evicted"
//! ```

use async_trait::async_trait;
use tracing::{info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.map(|t| t.get());
        match e.kind {
            EventKind::TaskCreated => info!(target: "taskgate", task, "created"),
            EventKind::TaskEnqueued => info!(target: "taskgate", task, "enqueued"),
            EventKind::TaskAdmitted => info!(target: "taskgate", task, "admitted"),
            EventKind::StopRequested => info!(
                target: "taskgate",
                task,
                status = e.status.map(|s| s.as_label()),
                "stop requested"
            ),
            EventKind::TaskEvicted => {
                warn!(target: "taskgate", task, counter = e.counter, "evicted")
            }
            EventKind::TaskTerminated => info!(
                target: "taskgate",
                task,
                counter = e.counter,
                forced = e.forced,
                reason = e.reason.as_deref(),
                "terminated"
            ),
            EventKind::CapacityChanged => info!(
                target: "taskgate",
                previous = e.previous_capacity,
                capacity = e.capacity,
                "capacity changed"
            ),
            EventKind::ShutdownRequested => info!(target: "taskgate", "shutdown requested"),
            EventKind::AllStoppedWithin => info!(target: "taskgate", "all stopped within grace"),
            EventKind::GraceExceeded => {
                warn!(target: "taskgate", stuck = e.reason.as_deref(), "grace exceeded")
            }
            EventKind::SubscriberOverflow => warn!(
                target: "taskgate",
                subscriber = e.subscriber,
                reason = e.reason.as_deref(),
                "subscriber overflow"
            ),
            EventKind::SubscriberPanicked => warn!(
                target: "taskgate",
                subscriber = e.subscriber,
                info = e.reason.as_deref(),
                "subscriber panicked"
            ),
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
