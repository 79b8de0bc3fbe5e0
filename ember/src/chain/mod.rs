// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Structs and traits which allow other parts of ember to interact with the blockchain, the
//! transaction broadcaster, the fee estimator and the on-chain wallet.

pub mod transaction;
pub mod wallet;

use bitcoin::blockdata::script::Script;
use bitcoin::blockdata::transaction::Transaction;
use bitcoin::hash_types::Txid;

use crate::chain::transaction::OutPoint;

/// An interface to send a transaction to the Bitcoin network.
pub trait BroadcasterInterface {
	/// Sends a transaction out to (hopefully) be mined.
	fn broadcast_transaction(&self, tx: &Transaction);
}

/// An enum that represents the speed at which we want a transaction to confirm used for feerate
/// estimation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfirmationTarget {
	/// We are happy with this transaction confirming slowly when feerate drops some.
	Background,
	/// We'd like this transaction to confirm without major delay, but 12-18 blocks is fine.
	Normal,
	/// We'd like this transaction to confirm in the next few blocks.
	HighPriority,
}

/// A trait which should be implemented to provide feerate information on a number of time
/// horizons.
///
/// Note that all of the functions implemented here *must* be reentrant-safe (obviously - they're
/// called from inside the library in response to chain events, P2P events, or timer events).
pub trait FeeEstimator {
	/// Gets estimated satoshis of fee required per 1000 Weight-Units.
	///
	/// Must return a value no smaller than 253 (ie 1 satoshi-per-byte rounded up to ensure later
	/// round-downs don't put us below 1 satoshi-per-byte).
	fn get_est_sat_per_1000_weight(&self, confirmation_target: ConfirmationTarget) -> u32;
}

/// Minimum relay fee as required by bitcoin network mempool policy.
pub const MIN_RELAY_FEE_SAT_PER_1000_WEIGHT: u64 = 4000;
/// Minimum feerate that takes a sane approach to bitcoind weight-to-vbytes rounding.
/// See <https://github.com/lightning/bolts/blob/master/03-transactions.md#fee-calculation> for
/// more info on the soft limit of 253.
pub const FEERATE_FLOOR_SATS_PER_KW: u32 = 253;

/// A request a channel makes of the host's blockchain watcher. The watcher answers with
/// [`WatchEvent`]s delivered back onto the requesting channel's event queue.
#[derive(Clone, Debug, PartialEq)]
pub enum WatchRequest {
	/// Notify the channel once `txid` has at least `min_depth` confirmations.
	Confirmed {
		/// The transaction to watch.
		txid: Txid,
		/// The confirmation count to wait for.
		min_depth: u32,
		/// A short human-readable label carried through to logs.
		hint: &'static str,
	},
	/// Notify the channel when `outpoint` is spent by any transaction.
	Spent {
		/// The output to watch.
		outpoint: OutPoint,
		/// The scriptPubKey of the watched output, allowing compact-filter based watchers to
		/// match without the full outpoint index.
		script: Script,
	},
}

/// An event the host's blockchain watcher delivers in answer to a [`WatchRequest`].
#[derive(Clone, Debug)]
pub enum WatchEvent {
	/// A watched transaction reached its requested depth.
	Confirmed {
		/// The watched transaction's id.
		txid: Txid,
		/// The height of the block containing the transaction.
		block_height: u32,
		/// The index of the transaction within its block.
		tx_index: u32,
		/// The confirmed transaction.
		tx: Transaction,
	},
	/// A watched output was spent.
	Spent {
		/// The watched output.
		outpoint: OutPoint,
		/// The transaction spending it.
		spending_tx: Transaction,
	},
}
