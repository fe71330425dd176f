//! # Shared runtime state: the single coordination context.
//!
//! All task records and their group membership live in [`State`], guarded by one
//! `RwLock` inside [`Shared`]. Every mutation of status, counter, forced flag or
//! group membership, and every capacity adjustment, happens under its write guard.
//!
//! ## Rules
//! - A record is in **at most one** group; [`State::place`] enforces it
//! - Terminated records stay in `records` (reachable by id) but in no group
//! - Groups keep insertion order (FIFO display order)

use std::collections::HashMap;

use tokio::sync::RwLock;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::error::ControlError;
use crate::events::Bus;
use crate::tasks::{TaskId, TaskRecord, TaskView};

use super::gate::AdmissionGate;

/// Observable groups a live record can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Group {
    Initialized,
    Pending,
    InProgress,
}

/// Records plus ordered group membership.
pub(crate) struct State {
    next_id: u64,
    records: HashMap<TaskId, TaskRecord>,
    initialized: Vec<TaskId>,
    pending: Vec<TaskId>,
    in_progress: Vec<TaskId>,
}

impl State {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            records: HashMap::new(),
            initialized: Vec::new(),
            pending: Vec::new(),
            in_progress: Vec::new(),
        }
    }

    /// Creates an `Initialized` record and places it in the Initialized group.
    pub fn create(&mut self, cancel: CancellationToken) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.records.insert(id, TaskRecord::new(id, cancel));
        self.initialized.push(id);
        id
    }

    pub fn record(&self, id: TaskId) -> Result<&TaskRecord, ControlError> {
        self.records.get(&id).ok_or(ControlError::NotFound { id })
    }

    pub fn record_mut(&mut self, id: TaskId) -> Result<&mut TaskRecord, ControlError> {
        self.records.get_mut(&id).ok_or(ControlError::NotFound { id })
    }

    /// Moves `id` into `group`, or out of every group when `None`.
    pub fn place(&mut self, id: TaskId, group: Option<Group>) {
        for g in [&mut self.initialized, &mut self.pending, &mut self.in_progress] {
            g.retain(|x| *x != id);
        }
        match group {
            Some(Group::Initialized) => self.initialized.push(id),
            Some(Group::Pending) => self.pending.push(id),
            Some(Group::InProgress) => self.in_progress.push(id),
            None => {}
        }
    }

    pub fn group(&self, group: Group) -> &[TaskId] {
        match group {
            Group::Initialized => &self.initialized,
            Group::Pending => &self.pending,
            Group::InProgress => &self.in_progress,
        }
    }

    pub fn group_of(&self, id: TaskId) -> Option<Group> {
        [Group::Initialized, Group::Pending, Group::InProgress]
            .into_iter()
            .find(|g| self.group(*g).contains(&id))
    }

    pub fn views(&self, group: Group) -> Vec<TaskView> {
        self.group(group)
            .iter()
            .filter_map(|id| self.records.get(id))
            .map(TaskRecord::view)
            .collect()
    }

    /// Running tasks that still hold their permit (not yet evicted), with start instants.
    pub fn eviction_candidates(&self) -> Vec<(TaskId, Instant)> {
        self.in_progress
            .iter()
            .filter_map(|id| self.records.get(id))
            .filter(|r| !r.is_forced_stop())
            .filter_map(|r| r.started_at().map(|at| (r.id(), at)))
            .collect()
    }

    /// Ids of tasks that have not reached `Terminated` and are queued or running.
    pub fn live(&self) -> Vec<TaskId> {
        self.pending
            .iter()
            .chain(self.in_progress.iter())
            .copied()
            .collect()
    }
}

/// State shared by the manager handle, admission tasks and executors.
pub(crate) struct Shared {
    pub cfg: Config,
    pub state: RwLock<State>,
    pub gate: AdmissionGate,
    pub bus: Bus,
}

impl Shared {
    pub fn new(cfg: Config, bus: Bus) -> Self {
        let gate = AdmissionGate::new(cfg.capacity());
        Self {
            cfg,
            state: RwLock::new(State::new()),
            gate,
            bus,
        }
    }
}
