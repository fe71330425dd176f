use std::fmt;

use super::status::{TaskId, TaskStatus};

/// Read-only projection of a task record for display.
///
/// `Display` renders the status line shown next to each task:
/// `Task {id} -> Counter: {counter} -> {status}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskView {
    pub id: TaskId,
    pub status: TaskStatus,
    pub counter: u64,
    /// Set when a capacity decrease evicted the task.
    pub forced_stop: bool,
}

impl fmt::Display for TaskView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Task {} -> Counter: {} -> {}",
            self.id, self.counter, self.status
        )
    }
}
