//! Runtime core: admission, execution and lifecycle.
//!
//! The public entry point is [`TaskLifecycleManager`], which owns task records,
//! drives admission through the [`AdmissionGate`] and handles resize and shutdown.
//!
//! Internal modules:
//! - `gate`: resizable counting-permit gate over a FIFO semaphore;
//! - `state`: records, group membership and the shared coordination context;
//! - `executor`: tick loop of one admitted task and its cleanup;
//! - `manager`: create / enqueue / stop / resize / snapshot / shutdown;
//! - `builder`: wires bus, subscribers and shared state;
//! - `snapshot`: read-only reports.

mod builder;
mod executor;
mod gate;
mod manager;
mod snapshot;
mod state;

pub use builder::ManagerBuilder;
pub use gate::AdmissionGate;
pub use manager::TaskLifecycleManager;
pub use snapshot::{Resize, Snapshot};
