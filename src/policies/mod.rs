//! Runtime policies.
//!
//! ## Contents
//! - [`EvictionPolicy`] which running tasks a capacity decrease force-stops
//!
//! ## Quick wiring
//! ```text
//! Config { eviction: EvictionPolicy, .. }
//!      └─► TaskLifecycleManager::set_capacity uses:
//!           - eviction.select(running, debt) to pick victims
//! ```
//!
//! ## Defaults
//! - `EvictionPolicy::OldestFirst` (earliest-started tasks are evicted first).

mod eviction;

pub use eviction::EvictionPolicy;
