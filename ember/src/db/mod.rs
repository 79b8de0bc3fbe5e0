// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The persistence interfaces the channel engine writes through, plus the schema-version
//! machinery every backend shares.
//!
//! The channels store holds one row per channel: a state tag plus the codec-serialized state
//! blob, written on every transition and owned exclusively by that channel's task. The payments
//! and audit stores are append-only and multi-writer. The feerates store is a single row keyed
//! by column. Every store carries a version; on open, a version older than the code's is walked
//! forward through linear migration steps, and a newer one is a fatal error.

pub mod lease;
pub mod mem;

use crate::ln::{ChannelId, PaymentHash, PaymentPreimage};
use crate::ln::msgs::DecodeError;
use crate::util::ser::{Readable, Writeable, Writer};

use std::fmt;
use std::io::Read;

/// Errors surfaced by database backends.
#[derive(Debug, PartialEq)]
pub enum DbError {
	/// The stored schema version is newer than this code understands. Continuing could corrupt
	/// data written by a newer release; opening must fail.
	FutureVersion {
		/// Which store was being opened.
		db: &'static str,
		/// The version found on disk.
		stored: u32,
		/// The newest version this code can handle.
		current: u32,
	},
	/// A stored blob failed to decode.
	Decode(DecodeError),
	/// The exclusive-write lease was lost; the process must stop writing rather than diverge.
	LockLost,
}

impl fmt::Display for DbError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			DbError::FutureVersion { db, stored, current } =>
				write!(f, "db {} has version {} but this build only understands up to {}", db, stored, current),
			DbError::Decode(ref e) => write!(f, "stored blob failed to decode: {}", e),
			DbError::LockLost => write!(f, "exclusive-write lease lost"),
		}
	}
}

impl From<DecodeError> for DbError {
	fn from(e: DecodeError) -> Self {
		DbError::Decode(e)
	}
}

/// The store of per-channel state blobs. Exactly one channel task may write a given row.
pub trait ChannelsDb {
	/// Inserts or overwrites the state blob for a channel.
	fn add_or_update_channel(&mut self, channel_id: &ChannelId, state_blob: &[u8]) -> Result<(), DbError>;
	/// Reads a channel's last persisted state blob.
	fn get_channel(&self, channel_id: &ChannelId) -> Result<Option<Vec<u8>>, DbError>;
	/// Removes a channel which has reached its terminal state at depth.
	fn remove_channel(&mut self, channel_id: &ChannelId) -> Result<(), DbError>;
	/// Lists every stored channel, used at startup to respawn channel tasks.
	fn list_channels(&self) -> Result<Vec<(ChannelId, Vec<u8>)>, DbError>;
}

/// One row in the append-only payments store.
#[derive(Clone, Debug, PartialEq)]
pub enum PaymentEvent {
	/// An outgoing payment was fulfilled and the preimage learned.
	Sent {
		/// The payment hash.
		payment_hash: PaymentHash,
		/// The preimage proving payment.
		payment_preimage: PaymentPreimage,
		/// The amount paid, in millisatoshi.
		amount_msat: u64,
	},
	/// An incoming HTLC we fulfilled.
	Received {
		/// The payment hash.
		payment_hash: PaymentHash,
		/// The amount received, in millisatoshi.
		amount_msat: u64,
	},
	/// An outgoing payment definitively failed.
	Failed {
		/// The payment hash.
		payment_hash: PaymentHash,
	},
}

/// The append-only payments store. Writes are ordered only within a single HTLC's lifecycle.
pub trait PaymentsDb {
	/// Appends a payment event.
	fn add_payment(&mut self, event: PaymentEvent) -> Result<(), DbError>;
	/// All recorded events for a payment hash, in insertion order.
	fn list_payments(&self, payment_hash: &PaymentHash) -> Result<Vec<PaymentEvent>, DbError>;
}

/// One row in the append-only audit store.
#[derive(Clone, Debug, PartialEq)]
pub enum AuditEvent {
	/// A channel moved between states.
	ChannelStateChanged {
		/// The channel.
		channel_id: ChannelId,
		/// The state left behind.
		previous_state: String,
		/// The state entered.
		new_state: String,
	},
	/// An HTLC was settled, either way.
	HtlcSettled {
		/// The channel the HTLC lived on.
		channel_id: ChannelId,
		/// The HTLC's payment hash.
		payment_hash: PaymentHash,
		/// Whether it was fulfilled (true) or failed back (false).
		fulfilled: bool,
	},
	/// The channel feerate changed via update_fee.
	FeeUpdated {
		/// The channel.
		channel_id: ChannelId,
		/// The new feerate in satoshi per kiloweight.
		feerate_per_kw: u32,
	},
}

/// The append-only audit store.
pub trait AuditDb {
	/// Appends an audit event.
	fn add_event(&mut self, event: AuditEvent) -> Result<(), DbError>;
}

/// The single feerates row, one column per confirmation horizon, in satoshi per kiloweight.
#[derive(Clone, Debug, PartialEq)]
pub struct FeeratesRow {
	/// Feerate to confirm in the next block.
	pub blocks_1: u32,
	/// Feerate to confirm within 2 blocks.
	pub blocks_2: u32,
	/// Feerate to confirm within 6 blocks.
	pub blocks_6: u32,
	/// Feerate to confirm within 12 blocks.
	pub blocks_12: u32,
	/// Feerate to confirm within 36 blocks.
	pub blocks_36: u32,
	/// Feerate to confirm within 72 blocks.
	pub blocks_72: u32,
	/// Feerate to confirm within 144 blocks.
	pub blocks_144: u32,
	/// Feerate to confirm within 1008 blocks.
	pub blocks_1008: u32,
}

impl_writeable!(FeeratesRow, {
	blocks_1,
	blocks_2,
	blocks_6,
	blocks_12,
	blocks_36,
	blocks_72,
	blocks_144,
	blocks_1008
});

/// The feerates row as stored by schema version 1, which stopped at the 144-blocks horizon.
#[derive(Clone, Debug, PartialEq)]
pub struct FeeratesRowV1 {
	/// Feerate to confirm in the next block.
	pub blocks_1: u32,
	/// Feerate to confirm within 2 blocks.
	pub blocks_2: u32,
	/// Feerate to confirm within 6 blocks.
	pub blocks_6: u32,
	/// Feerate to confirm within 12 blocks.
	pub blocks_12: u32,
	/// Feerate to confirm within 36 blocks.
	pub blocks_36: u32,
	/// Feerate to confirm within 72 blocks.
	pub blocks_72: u32,
	/// Feerate to confirm within 144 blocks.
	pub blocks_144: u32,
}

impl_writeable!(FeeratesRowV1, {
	blocks_1,
	blocks_2,
	blocks_6,
	blocks_12,
	blocks_36,
	blocks_72,
	blocks_144
});

/// v1 -> v2 widened the row by a 1008-blocks horizon; the slowest horizon we had is the best
/// available estimate for the new column.
pub fn migrate_feerates_v1_to_v2(v1: FeeratesRowV1) -> FeeratesRow {
	FeeratesRow {
		blocks_1: v1.blocks_1,
		blocks_2: v1.blocks_2,
		blocks_6: v1.blocks_6,
		blocks_12: v1.blocks_12,
		blocks_36: v1.blocks_36,
		blocks_72: v1.blocks_72,
		blocks_144: v1.blocks_144,
		blocks_1008: v1.blocks_144,
	}
}

/// The feerates store: a single row, replaced wholesale on every feerate refresh.
pub trait FeeratesDb {
	/// Replaces the feerates row.
	fn set_feerates(&mut self, row: FeeratesRow) -> Result<(), DbError>;
	/// Reads the feerates row, if one was ever written.
	fn get_feerates(&self) -> Result<Option<FeeratesRow>, DbError>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn feerates_migration_duplicates_slowest_horizon() {
		let v1 = FeeratesRowV1 {
			blocks_1: 10000, blocks_2: 9000, blocks_6: 5000, blocks_12: 3000,
			blocks_36: 2000, blocks_72: 1000, blocks_144: 500,
		};
		let v2 = migrate_feerates_v1_to_v2(v1);
		assert_eq!(v2.blocks_1, 10000);
		assert_eq!(v2.blocks_144, 500);
		assert_eq!(v2.blocks_1008, 500);
	}
}
