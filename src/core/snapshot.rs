use crate::tasks::{TaskId, TaskView};

/// Read-only view of the three observable groups and the gate counters.
///
/// Taken under the state read lock, so group membership is consistent. The
/// gate counters may lead group membership by an in-flight admission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Created, not yet queued (creation order).
    pub initialized: Vec<TaskView>,
    /// Waiting for a permit (queue order).
    pub pending: Vec<TaskView>,
    /// Running (admission order).
    pub in_progress: Vec<TaskView>,
    /// Configured maximum of running tasks.
    pub capacity: usize,
    /// Permits that can be granted right now.
    pub available_permits: usize,
    /// Permits the next graceful releases will retire.
    pub owed_permits: usize,
}

impl Snapshot {
    pub fn initialized_ids(&self) -> Vec<TaskId> {
        ids(&self.initialized)
    }

    pub fn pending_ids(&self) -> Vec<TaskId> {
        ids(&self.pending)
    }

    pub fn in_progress_ids(&self) -> Vec<TaskId> {
        ids(&self.in_progress)
    }

    /// Running tasks that still hold a permit (not evicted).
    pub fn permit_holders(&self) -> usize {
        self.in_progress.iter().filter(|v| !v.forced_stop).count()
    }

    /// `capacity + owed_permits == available_permits + permit_holders`.
    pub fn is_balanced(&self) -> bool {
        self.capacity + self.owed_permits == self.available_permits + self.permit_holders()
    }
}

fn ids(views: &[TaskView]) -> Vec<TaskId> {
    views.iter().map(|v| v.id).collect()
}

/// Outcome of a [`set_capacity`](crate::TaskLifecycleManager::set_capacity) call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resize {
    /// Capacity before the call.
    pub previous: usize,
    /// Capacity after the call.
    pub current: usize,
    /// Running tasks force-stopped by this call, in eviction order.
    pub evicted: Vec<TaskId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::TaskStatus;

    fn view(id: u64, forced_stop: bool) -> TaskView {
        TaskView {
            id: TaskId(id),
            status: TaskStatus::InProgress,
            counter: 0,
            forced_stop,
        }
    }

    #[test]
    fn test_evicted_tasks_do_not_count_as_holders() {
        let snap = Snapshot {
            initialized: Vec::new(),
            pending: Vec::new(),
            in_progress: vec![view(1, true), view(2, false)],
            capacity: 1,
            available_permits: 0,
            owed_permits: 0,
        };
        assert_eq!(snap.permit_holders(), 1);
        assert_eq!(snap.in_progress_ids(), vec![TaskId(1), TaskId(2)]);
        assert!(snap.is_balanced());
    }

    #[test]
    fn test_owed_permits_balance_extra_holders() {
        let snap = Snapshot {
            initialized: Vec::new(),
            pending: Vec::new(),
            in_progress: vec![view(1, false), view(2, false)],
            capacity: 1,
            available_permits: 0,
            owed_permits: 1,
        };
        assert!(snap.is_balanced());
    }
}
