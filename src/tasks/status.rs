//! # Task identity and lifecycle status.
//!
//! ```text
//! Initialized ──enqueue──► Pending ──permit──► InProgress ──cancel──► Terminated
//!                             │                                          ▲
//!                             └──────────── cancel before permit ────────┘
//! ```
//!
//! ## Rules
//! - Status only moves **forward** (declaration order is the lifecycle order)
//! - `Terminated` is absorbing

use std::fmt;

/// Unique, monotonically assigned task identifier (starts at 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Returns the raw numeric id.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskStatus {
    /// Created, not yet queued.
    Initialized,
    /// Queued, waiting for an admission permit.
    Pending,
    /// Holding a permit (or forcibly evicted while cleaning up) and ticking.
    InProgress,
    /// Stopped; no further transitions.
    Terminated,
}

impl TaskStatus {
    /// Returns `true` if `next` is a legal forward transition from `self`.
    ///
    /// `Pending → Terminated` is the only transition that skips a state.
    pub fn can_advance_to(self, next: TaskStatus) -> bool {
        matches!(
            (self, next),
            (TaskStatus::Initialized, TaskStatus::Pending)
                | (TaskStatus::Pending, TaskStatus::InProgress)
                | (TaskStatus::Pending, TaskStatus::Terminated)
                | (TaskStatus::InProgress, TaskStatus::Terminated)
        )
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(self) -> &'static str {
        match self {
            TaskStatus::Initialized => "initialized",
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Terminated => "terminated",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Initialized => "Initialized",
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "InProgress",
            TaskStatus::Terminated => "Terminated",
        };
        f.write_str(s)
    }
}
