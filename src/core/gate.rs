//! # AdmissionGate: resizable counting-permit gate.
//!
//! Gates concurrent execution to at most `capacity` tasks, where `capacity`
//! changes at runtime. Built on a FIFO-fair [`Semaphore`]; granted permits are
//! detached (`forget`) and accounted by the caller, which returns them with
//! [`release`](AdmissionGate::release).
//!
//! ## Accounting
//! ```text
//! capacity == available_permits + holders        (at rest)
//!
//! increase_capacity(d):  capacity += d; available += d          (wakes ≤ d waiters)
//! decrease_capacity(d):  capacity -= d; retire min(d, available) idle permits
//!                        remaining debt = d - retired           (owed by holders)
//! owe(n):                owed += n        (debt the caller could not pay by eviction)
//! release():             owed > 0 ? owed -= 1 : available += 1
//! retire_owed():         owed > 0 ? owed -= 1 (caller drops its fresh permit)
//! ```
//!
//! Holders are never revoked. The remaining debt is paid by the caller
//! force-stopping that many holders and **not** releasing their permits. Debt
//! that outruns the evictable holders is recorded with [`owe`](AdmissionGate::owe).
//! It is paid by the next admission ([`retire_owed`](AdmissionGate::retire_owed))
//! or graceful release, whichever comes first, so at rest `owed == 0` and
//! `capacity == available_permits + holders`.
//!
//! ## Rules
//! - `acquire` is cancellable; a cancelled wait changes nothing
//! - `release` is called exactly once per gracefully finished holder
//! - capacity adjustments are serialized by the caller (manager state lock)

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::select;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::error::AdmissionError;

/// Counting-permit gate with runtime-adjustable capacity.
#[derive(Debug)]
pub struct AdmissionGate {
    semaphore: Semaphore,
    capacity: AtomicUsize,
    owed: AtomicUsize,
}

impl AdmissionGate {
    /// Creates a gate with `capacity` available permits.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.min(Semaphore::MAX_PERMITS);
        Self {
            semaphore: Semaphore::new(capacity),
            capacity: AtomicUsize::new(capacity),
            owed: AtomicUsize::new(0),
        }
    }

    /// Current configured maximum.
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// Permits that can be granted right now.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Permits that future releases will retire instead of returning.
    pub fn owed_permits(&self) -> usize {
        self.owed.load(Ordering::Acquire)
    }

    /// Settles up to `n` owed permits and returns how many were settled.
    fn settle_owed(&self, n: usize) -> usize {
        let mut settled = 0;
        let _ = self
            .owed
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |owed| {
                settled = owed.min(n);
                (settled > 0).then_some(owed - settled)
            });
        settled
    }

    /// Waits for a permit or for `cancel` to fire, whichever comes first.
    ///
    /// ### Cancellation semantics
    /// - Already-cancelled tokens return immediately without touching the semaphore
    /// - If both are ready at once, cancellation wins and no permit is taken
    /// - Dropping the pending wait leaves no partial state behind
    ///
    /// # Errors
    /// - [`AdmissionError::Canceled`] if `cancel` fired first
    /// - [`AdmissionError::Closed`] if the gate was closed
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), AdmissionError> {
        if cancel.is_cancelled() {
            return Err(AdmissionError::Canceled);
        }
        select! {
            biased;
            _ = cancel.cancelled() => Err(AdmissionError::Canceled),
            res = self.semaphore.acquire() => match res {
                Ok(permit) => {
                    permit.forget();
                    Ok(())
                }
                Err(_closed) => Err(AdmissionError::Closed),
            },
        }
    }

    /// Returns one permit, waking the oldest waiter if any.
    ///
    /// If permits are owed, the returned permit is retired instead.
    pub fn release(&self) {
        if self.settle_owed(1) == 0 {
            self.semaphore.add_permits(1);
        }
    }

    /// Raises capacity by `delta` and makes the new permits available at once.
    ///
    /// Outstanding owed permits are forgiven first.
    pub fn increase_capacity(&self, delta: usize) {
        if delta == 0 {
            return;
        }
        self.capacity.fetch_add(delta, Ordering::AcqRel);
        let forgiven = self.settle_owed(delta);
        if delta > forgiven {
            self.semaphore.add_permits(delta - forgiven);
        }
    }

    /// Lowers capacity by `delta` (saturating at zero).
    ///
    /// Idle permits are retired immediately, up to `delta`. Returns the number of
    /// permits still owed by running holders; the caller pays it by force-stopping
    /// that many holders without releasing.
    pub fn decrease_capacity(&self, delta: usize) -> usize {
        let current = self.capacity();
        let delta = delta.min(current);
        if delta == 0 {
            return 0;
        }
        self.capacity.store(current - delta, Ordering::Release);

        let idle = delta.min(self.semaphore.available_permits());
        let retired = match u32::try_from(idle)
            .ok()
            .and_then(|n| self.semaphore.try_acquire_many(n).ok())
        {
            Some(permit) => {
                permit.forget();
                idle
            }
            None => 0,
        };
        delta - retired
    }

    /// Records `n` permits of unpaid debt, retired by the next `n` releases
    /// or admissions.
    pub fn owe(&self, n: usize) {
        if n > 0 {
            self.owed.fetch_add(n, Ordering::AcqRel);
        }
    }

    /// Pays one owed permit with a permit just granted by [`acquire`](Self::acquire).
    ///
    /// Returns `true` if the granted permit was retired; the caller must then
    /// treat the acquire as not having happened and wait again.
    pub fn retire_owed(&self) -> bool {
        self.settle_owed(1) == 1
    }

    /// Closes the gate: pending and future `acquire` calls return `Closed`.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// `true` once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }
}
