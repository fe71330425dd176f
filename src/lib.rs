//! # taskgate
//!
//! **Taskgate** is a bounded-concurrency task admission controller.
//!
//! Tasks are created, queued, admitted through a resizable permit gate, run a
//! simulated periodic workload, and terminate either gracefully (operator stop)
//! or forcibly (eviction on capacity decrease). Capacity can change at runtime.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   create_task / enqueue / stop / set_capacity / snapshot / watch / shutdown
//!                                   │
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  TaskLifecycleManager                                             │
//! │  - RwLock<State>  (records + Initialized/Pending/InProgress)      │
//! │  - AdmissionGate  (FIFO semaphore, resizable capacity)            │
//! │  - TaskTracker    (admission + executor tasks)                    │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌──────────┐       ┌──────────┐       ┌──────────┐
//!   │ admit T1 │       │ admit T2 │       │ admit T3 │   gate.acquire(cancel)
//!   └────┬─────┘       └────┬─────┘       └────┬─────┘
//!        ▼                  ▼                  ▼
//!   TaskExecutor       TaskExecutor       TaskExecutor    counter += 1 per tick
//!        │                  │                  │
//!        └──── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                     ┌──────┼──────┐
//!                                                     ▼      ▼      ▼
//!                                                 LogWriter  ...  custom
//! ```
//!
//! ### Lifecycle
//! ```text
//! Initialized ──enqueue──► Pending ──permit──► InProgress ──cancel──► Terminated
//!                             │                                          ▲
//!                             └──────────── cancel (no permit) ──────────┘
//!
//! graceful stop  → permit released, next Pending task admitted
//! forced stop    → permit retired (capacity decreased)
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types                          |
//! |-------------------|----------------------------------------------------------|------------------------------------|
//! | **Lifecycle**     | Create, queue, stop, resize, observe, shut down.         | [`TaskLifecycleManager`]           |
//! | **Admission**     | Resizable FIFO permit gate.                              | [`AdmissionGate`]                  |
//! | **Policies**      | Which running tasks a capacity decrease evicts.          | [`EvictionPolicy`]                 |
//! | **Observation**   | Snapshots, per-task watches, lifecycle events.           | [`Snapshot`], [`TaskView`], [`Event`] |
//! | **Subscriber API**| Hook into lifecycle events.                              | [`Subscribe`]                      |
//! | **Errors**        | Typed errors for control operations and shutdown.        | [`ControlError`], [`RuntimeError`] |
//! | **Configuration** | Initial capacity, tick, grace, eviction order.           | [`Config`]                         |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use taskgate::{Config, TaskLifecycleManager, TaskStatus};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn taskgate::Subscribe>> = vec![Arc::new(taskgate::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn taskgate::Subscribe>> = Vec::new();
//!
//!     let mgr = TaskLifecycleManager::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let id = mgr.create_task().await;
//!     mgr.enqueue(id).await?;
//!     tokio::task::yield_now().await;
//!
//!     mgr.set_capacity(1).await?;
//!     mgr.stop(id).await?;
//!     mgr.shutdown().await?;
//!
//!     assert_eq!(mgr.task(id).await?.status, TaskStatus::Terminated);
//!     Ok(())
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::{Config, DEFAULT_CAPACITY, DEFAULT_TICK};
pub use core::{AdmissionGate, ManagerBuilder, Resize, Snapshot, TaskLifecycleManager};
pub use error::{AdmissionError, ControlError, RuntimeError};
pub use events::{Bus, Event, EventKind};
pub use policies::EvictionPolicy;
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{TaskId, TaskStatus, TaskView};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
