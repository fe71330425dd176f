//! # Event subscribers for the taskgate runtime.
//!
//! ## Architecture
//! ```text
//! Manager/Executor ── publish(Event) ──► Bus ──► subscriber listener
//!                                                     │
//!                                                     ▼
//!                                               SubscriberSet::emit
//!                                          ┌──────────┼──────────┐
//!                                          ▼          ▼          ▼
//!                                      LogWriter   Metrics     Custom
//! ```
//!
//! ## Contents
//! - [`Subscribe`] extension trait
//! - [`SubscriberSet`] non-blocking fan-out with per-subscriber queues
//! - `LogWriter` built-in `tracing` bridge (feature `logging`)

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
