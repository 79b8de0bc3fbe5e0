// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The interface to the host's on-chain wallet, which funds channels and manages the UTXOs
//! backing not-yet-broadcast funding transactions.

use bitcoin::blockdata::script::Script;
use bitcoin::blockdata::transaction::Transaction;
use bitcoin::hash_types::Txid;

/// Errors the on-chain wallet may return when asked to build a funding transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WalletError {
	/// The wallet does not hold enough confirmed funds for the requested output plus fee.
	InsufficientFunds,
	/// The wallet backend could not be reached or misbehaved.
	Rpc(String),
}

impl ::std::fmt::Display for WalletError {
	fn fmt(&self, f: &mut ::std::fmt::Formatter) -> Result<(), ::std::fmt::Error> {
		match *self {
			WalletError::InsufficientFunds => write!(f, "insufficient funds"),
			WalletError::Rpc(ref e) => write!(f, "wallet rpc: {}", e),
		}
	}
}

/// The on-chain wallet operations a channel needs while opening and abandoning channels.
///
/// `make_funding_tx` reserves the UTXOs it selects; the channel later either `commit`s the
/// transaction (definitively spending them) or `rollback`s it (releasing them). `abandon` tells
/// the wallet a previously committed, still-unconfirmed transaction will never confirm and its
/// inputs may be double-spent.
pub trait FundingWallet {
	/// Builds and signs a transaction paying `amount_sat` to `output_script` at the given
	/// feerate, returning the transaction and the index of the funding output.
	fn make_funding_tx(&self, output_script: &Script, amount_sat: u64, feerate_per_kw: u32) -> Result<(Transaction, u16), WalletError>;
	/// Marks the inputs of a never-to-confirm transaction as spendable again.
	fn abandon(&self, txid: &Txid);
	/// Definitively commits a funding transaction, after which only `abandon` can release it.
	fn commit(&self, tx: &Transaction);
	/// Releases the UTXOs reserved for a not-yet-committed transaction.
	fn rollback(&self, tx: &Transaction);
}
