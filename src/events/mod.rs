//! Runtime events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `TaskLifecycleManager`, `TaskExecutor`, `SubscriberSet` workers.
//! - **Consumers**: the subscriber listener (fans out to `SubscriberSet`) and any
//!   receiver handed out by `TaskLifecycleManager::subscribe`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
