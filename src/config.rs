//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the lifecycle manager.
//!
//! ## Sentinel values
//! - `initial_capacity = 0` → [`DEFAULT_CAPACITY`] (3)
//! - `bus_capacity = 0` → clamped to 1
//! - `tick = 0s` → [`DEFAULT_TICK`] (1s)
//!
//! ## Capacity input
//! Operators type capacities as text. [`Config::parse_capacity`] validates such
//! input (trimmed, positive integer within the semaphore limit);
//! [`Config::with_capacity_str`] falls back to the default on malformed text.

use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::ControlError;
use crate::policies::EvictionPolicy;

/// Initial capacity used when none is configured.
pub const DEFAULT_CAPACITY: usize = 3;

/// Duration of one simulated unit of work.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Global configuration for the lifecycle manager.
///
/// ## Field semantics
/// - `initial_capacity`: Maximum number of concurrently running tasks at startup (`0` = default of 3)
/// - `tick`: Interval between counter increments of a running task (`0s` = default of 1s)
/// - `grace`: Maximum wait for tasks to terminate on shutdown
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `eviction`: Which running tasks a capacity decrease force-stops
#[derive(Clone, Debug)]
pub struct Config {
    /// Maximum number of tasks running at once, before any resize.
    pub initial_capacity: usize,

    /// Interval of one simulated work tick.
    pub tick: Duration,

    /// Maximum time to wait for tasks to terminate during shutdown.
    ///
    /// If exceeded, [`shutdown`](crate::TaskLifecycleManager::shutdown) returns
    /// `RuntimeError::GraceExceeded` with the tasks that were still running.
    pub grace: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow receivers that lag behind more than `bus_capacity` messages will
    /// receive `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Victim selection on capacity decrease.
    pub eviction: EvictionPolicy,
}

impl Config {
    /// Returns the startup capacity, resolving the `0` sentinel.
    #[inline]
    pub fn capacity(&self) -> usize {
        if self.initial_capacity == 0 {
            DEFAULT_CAPACITY
        } else {
            self.initial_capacity.min(Semaphore::MAX_PERMITS)
        }
    }

    /// Returns the tick interval, resolving the `0s` sentinel.
    #[inline]
    pub fn tick_interval(&self) -> Duration {
        if self.tick == Duration::ZERO {
            DEFAULT_TICK
        } else {
            self.tick
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns a config whose initial capacity is parsed from operator text,
    /// keeping the default when the text is not a valid capacity.
    pub fn with_capacity_str(mut self, raw: &str) -> Self {
        self.initial_capacity = Self::parse_capacity(raw).unwrap_or(DEFAULT_CAPACITY);
        self
    }

    /// Parses operator text into a capacity.
    ///
    /// # Errors
    /// [`ControlError::InvalidArgument`] if the text is not an integer, or the
    /// value is not positive, or it exceeds the semaphore limit.
    ///
    /// # Example
    /// ```
    /// use taskgate::Config;
    ///
    /// assert_eq!(Config::parse_capacity(" 4 "), Ok(4));
    /// assert!(Config::parse_capacity("four").is_err());
    /// assert!(Config::parse_capacity("0").is_err());
    /// ```
    pub fn parse_capacity(raw: &str) -> Result<usize, ControlError> {
        let value: i64 = raw.trim().parse().map_err(|_| {
            ControlError::invalid_argument(format!("capacity {raw:?} is not an integer"))
        })?;
        Self::validate_capacity(value)
    }

    /// Validates a requested capacity.
    ///
    /// # Errors
    /// [`ControlError::InvalidArgument`] for values `<= 0` or above
    /// [`Semaphore::MAX_PERMITS`].
    pub fn validate_capacity(value: i64) -> Result<usize, ControlError> {
        if value <= 0 {
            return Err(ControlError::invalid_argument(format!(
                "capacity must be positive, got {value}"
            )));
        }
        match usize::try_from(value) {
            Ok(n) if n <= Semaphore::MAX_PERMITS => Ok(n),
            _ => Err(ControlError::invalid_argument(format!(
                "capacity {value} exceeds limit {}",
                Semaphore::MAX_PERMITS
            ))),
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `initial_capacity = 3`
    /// - `tick = 1s`
    /// - `grace = 5s`
    /// - `bus_capacity = 1024`
    /// - `eviction = EvictionPolicy::OldestFirst`
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            tick: DEFAULT_TICK,
            grace: Duration::from_secs(5),
            bus_capacity: 1024,
            eviction: EvictionPolicy::default(),
        }
    }
}
