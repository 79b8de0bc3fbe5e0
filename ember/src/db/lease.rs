// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! A lease-lock guarding backends which must have a single writer (eg a shared Postgres): a row
//! holding a random lease id and an expiry, periodically renewed. Only the lease holder may
//! write; a process which finds the lease held by someone else must stop writing rather than
//! diverge from a concurrent instance.

use crate::db::DbError;

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The random identity of one process's lease.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeaseId(pub [u8; 16]);

/// The lease row as stored in the backend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lease {
	/// Who holds the lease.
	pub holder: LeaseId,
	/// Seconds since the epoch at which the lease lapses.
	pub expires_at_secs: u64,
}

/// What to do when a lock check finds the lease is not ours.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LockFailureAction {
	/// Log and carry on. Only safe when a competing writer is known to be impossible, eg during
	/// offline maintenance.
	LogAndContinue,
	/// Log and surface [`DbError::LockLost`] so the caller stops writing. The default.
	LogAndStop,
	/// Terminate the process immediately.
	Exit,
}

/// Consulted on every failed lock check.
pub trait LockFailureHandler {
	/// Decides how to react to the lease being held by `current_holder` (or vacant).
	fn on_lock_failure(&self, current_holder: Option<LeaseId>) -> LockFailureAction;
}

/// The default handler: always stop writing.
pub struct LogAndStopHandler;
impl LockFailureHandler for LogAndStopHandler {
	fn on_lock_failure(&self, _current_holder: Option<LeaseId>) -> LockFailureAction {
		LockFailureAction::LogAndStop
	}
}

/// The shared lease slot. In production this is a table row; the in-memory form models the same
/// compare-and-set contract for tests and embedded use.
pub type LeaseSlot = Arc<Mutex<Option<Lease>>>;

/// One process's handle on the lease: acquire, renew on a timer, check before every write.
pub struct LeaseLock<H: LockFailureHandler> {
	slot: LeaseSlot,
	ours: LeaseId,
	lease_duration: Duration,
	handler: H,
}

fn now_secs() -> u64 {
	SystemTime::now().duration_since(UNIX_EPOCH).expect("system clock before 1970").as_secs()
}

impl<H: LockFailureHandler> LeaseLock<H> {
	/// Creates a handle with the given identity. The id must be unique per process instance;
	/// the host derives it from its entropy source.
	pub fn new(slot: LeaseSlot, ours: LeaseId, lease_duration: Duration, handler: H) -> Self {
		LeaseLock { slot, ours, lease_duration, handler }
	}

	/// Attempts to take the lease: succeeds if it is vacant, expired, or already ours.
	pub fn try_acquire(&self) -> Result<(), DbError> {
		let mut slot = self.slot.lock().expect("lease slot poisoned");
		let now = now_secs();
		match *slot {
			Some(lease) if lease.holder != self.ours && lease.expires_at_secs > now => Err(DbError::LockLost),
			_ => {
				*slot = Some(Lease { holder: self.ours, expires_at_secs: now + self.lease_duration.as_secs() });
				Ok(())
			},
		}
	}

	/// Extends our lease. Called from the host's renewal timer.
	pub fn renew(&self) -> Result<(), DbError> {
		self.try_acquire()
	}

	/// Verifies we still hold the lease; called before every write to the guarded backend. On
	/// failure the [`LockFailureHandler`] decides whether the caller continues, stops, or the
	/// process exits.
	pub fn check(&self) -> Result<(), DbError> {
		let slot = self.slot.lock().expect("lease slot poisoned");
		let now = now_secs();
		let ours = match *slot {
			Some(lease) => lease.holder == self.ours && lease.expires_at_secs > now,
			None => false,
		};
		if ours {
			return Ok(());
		}
		let holder = slot.and_then(|l| if l.expires_at_secs > now { Some(l.holder) } else { None });
		match self.handler.on_lock_failure(holder) {
			LockFailureAction::LogAndContinue => Ok(()),
			LockFailureAction::LogAndStop => Err(DbError::LockLost),
			LockFailureAction::Exit => ::std::process::exit(1),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn slot() -> LeaseSlot {
		Arc::new(Mutex::new(None))
	}

	#[test]
	fn acquire_renew_check() {
		let slot = slot();
		let lock = LeaseLock::new(Arc::clone(&slot), LeaseId([1; 16]), Duration::from_secs(60), LogAndStopHandler);
		lock.try_acquire().unwrap();
		lock.check().unwrap();
		lock.renew().unwrap();
		lock.check().unwrap();
	}

	#[test]
	fn competing_holder_wins_until_expiry() {
		let slot = slot();
		let first = LeaseLock::new(Arc::clone(&slot), LeaseId([1; 16]), Duration::from_secs(60), LogAndStopHandler);
		let second = LeaseLock::new(Arc::clone(&slot), LeaseId([2; 16]), Duration::from_secs(60), LogAndStopHandler);
		first.try_acquire().unwrap();
		assert_eq!(second.try_acquire(), Err(DbError::LockLost));
		assert_eq!(second.check(), Err(DbError::LockLost));

		// Expired leases are up for grabs.
		*slot.lock().unwrap() = Some(Lease { holder: LeaseId([1; 16]), expires_at_secs: 0 });
		second.try_acquire().unwrap();
		second.check().unwrap();
		assert_eq!(first.check(), Err(DbError::LockLost));
	}

	struct ContinueHandler;
	impl LockFailureHandler for ContinueHandler {
		fn on_lock_failure(&self, _holder: Option<LeaseId>) -> LockFailureAction {
			LockFailureAction::LogAndContinue
		}
	}

	#[test]
	fn continue_handler_overrides_loss() {
		let slot = slot();
		let stopper = LeaseLock::new(Arc::clone(&slot), LeaseId([1; 16]), Duration::from_secs(60), LogAndStopHandler);
		let continuer = LeaseLock::new(Arc::clone(&slot), LeaseId([2; 16]), Duration::from_secs(60), ContinueHandler);
		stopper.try_acquire().unwrap();
		assert_eq!(continuer.check(), Ok(()));
	}
}
