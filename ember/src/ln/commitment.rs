// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Deterministic construction of commitment and HTLC transactions.
//!
//! Everything here is a pure function of the channel's shared state: given the per-commitment
//! keys and a [`CommitmentSpec`] (the two balances plus the in-flight HTLC set), both peers must
//! arrive at bit-identical transactions, or signature exchange would fail. The
//! [`CommitmentSpec::reduce`] entry point applies a batch of updates (add/fulfill/fail/fee) to a
//! spec, and is the only place balance arithmetic happens.

use bitcoin::blockdata::opcodes;
use bitcoin::blockdata::script::{Builder, Script};
use bitcoin::blockdata::transaction::{EcdsaSighashType, OutPoint as BitcoinOutPoint, Transaction, TxIn, TxOut};
use bitcoin::util::sighash::SighashCache;
use bitcoin::{PackedLockTime, Sequence, Witness};

use bitcoin::hashes::{Hash, HashEngine};
use bitcoin::hashes::ripemd160::Hash as Ripemd160;
use bitcoin::hashes::sha256::Hash as Sha256;
use bitcoin::hash_types::{PubkeyHash, Txid, WPubkeyHash};

use bitcoin::secp256k1::{self, Message, Secp256k1, SecretKey, PublicKey};
use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::secp256k1::Error as SecpError;

use crate::chain::transaction::OutPoint;
use crate::ln::PaymentHash;
use crate::ln::chan_keys::TxCreationKeys;
use crate::ln::msgs::{self, DecodeError};
use crate::util::ser::{Readable, Writeable, Writer};
use crate::util::transaction_utils::sort_outputs;

use std::cmp::Ordering;
use std::io::Read;

/// Weight of a commitment transaction with no HTLC outputs, in weight units.
pub const COMMITMENT_TX_BASE_WEIGHT: u64 = 724;
/// Weight each HTLC output adds to a commitment transaction.
pub const COMMITMENT_TX_WEIGHT_PER_HTLC: u64 = 172;

/// Weight of an HTLC-success transaction.
pub const HTLC_SUCCESS_TX_WEIGHT: u64 = 703;
/// Weight of an HTLC-timeout transaction.
pub const HTLC_TIMEOUT_TX_WEIGHT: u64 = 663;

/// The maximal number of HTLCs one side may have pending at a time, per BOLT 2.
pub const MAX_HTLCS: u16 = 483;

/// The fee a commitment transaction pays at the given feerate with the given number of
/// untrimmed HTLC outputs, in satoshi. The funder pays it out of their balance.
pub fn commit_tx_fee_sat(feerate_per_kw: u32, num_untrimmed_htlcs: usize) -> u64 {
	(COMMITMENT_TX_BASE_WEIGHT + num_untrimmed_htlcs as u64 * COMMITMENT_TX_WEIGHT_PER_HTLC) * feerate_per_kw as u64 / 1000
}

/// The fee an HTLC-timeout transaction pays at the given feerate, in satoshi.
pub fn htlc_timeout_fee_sat(feerate_per_kw: u32) -> u64 {
	feerate_per_kw as u64 * HTLC_TIMEOUT_TX_WEIGHT / 1000
}

/// The fee an HTLC-success transaction pays at the given feerate, in satoshi.
pub fn htlc_success_fee_sat(feerate_per_kw: u32) -> u64 {
	feerate_per_kw as u64 * HTLC_SUCCESS_TX_WEIGHT / 1000
}

/// The value, in satoshi, below which an offered HTLC is trimmed from the broadcaster's
/// commitment transaction (its value would not pay for its own HTLC-timeout spend).
pub fn offered_htlc_trim_threshold_sat(dust_limit_satoshis: u64, feerate_per_kw: u32) -> u64 {
	dust_limit_satoshis + htlc_timeout_fee_sat(feerate_per_kw)
}

/// The value, in satoshi, below which a received HTLC is trimmed from the broadcaster's
/// commitment transaction.
pub fn received_htlc_trim_threshold_sat(dust_limit_satoshis: u64, feerate_per_kw: u32) -> u64 {
	dust_limit_satoshis + htlc_success_fee_sat(feerate_per_kw)
}

/// The direction of an in-flight HTLC, relative to the owner of the [`CommitmentSpec`] holding
/// it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HtlcDirection {
	/// The spec's owner offered this HTLC; it is claimable by the counterparty with the preimage.
	Offered,
	/// The spec's owner received this HTLC and can claim it with the preimage.
	Received,
}

impl_writeable_unit_enum!(HtlcDirection, {
	Offered => 0,
	Received => 1,
});

/// An in-flight HTLC as tracked in a [`CommitmentSpec`]: the original update_add_htlc, tagged
/// with its direction relative to the spec's owner.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectedHtlc {
	/// Whether the spec's owner offered or received this HTLC.
	pub direction: HtlcDirection,
	/// The add message which created it, keeping amount, hash, expiry and onion.
	pub add: msgs::UpdateAddHTLC,
}

impl_writeable!(DirectedHtlc, { direction, add });

impl DirectedHtlc {
	fn opposite(&self) -> DirectedHtlc {
		DirectedHtlc {
			direction: match self.direction {
				HtlcDirection::Offered => HtlcDirection::Received,
				HtlcDirection::Received => HtlcDirection::Offered,
			},
			add: self.add.clone(),
		}
	}
}

/// One update to a commitment, retained between signature rounds so it can be retransmitted
/// after a reconnection.
#[derive(Clone, Debug, PartialEq)]
pub enum CommitmentUpdate {
	/// An update_add_htlc
	Add(msgs::UpdateAddHTLC),
	/// An update_fulfill_htlc
	Fulfill(msgs::UpdateFulfillHTLC),
	/// An update_fail_htlc
	Fail(msgs::UpdateFailHTLC),
	/// An update_fail_malformed_htlc
	FailMalformed(msgs::UpdateFailMalformedHTLC),
	/// An update_fee
	Fee(msgs::UpdateFee),
}

impl CommitmentUpdate {
	/// The wire message carrying this update.
	pub fn to_message(&self) -> msgs::Message {
		match *self {
			CommitmentUpdate::Add(ref m) => msgs::Message::UpdateAddHTLC(m.clone()),
			CommitmentUpdate::Fulfill(ref m) => msgs::Message::UpdateFulfillHTLC(m.clone()),
			CommitmentUpdate::Fail(ref m) => msgs::Message::UpdateFailHTLC(m.clone()),
			CommitmentUpdate::FailMalformed(ref m) => msgs::Message::UpdateFailMalformedHTLC(m.clone()),
			CommitmentUpdate::Fee(ref m) => msgs::Message::UpdateFee(m.clone()),
		}
	}
}

impl Writeable for CommitmentUpdate {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
		match *self {
			CommitmentUpdate::Add(ref m) => { 0u8.write(w)?; m.write(w) },
			CommitmentUpdate::Fulfill(ref m) => { 1u8.write(w)?; m.write(w) },
			CommitmentUpdate::Fail(ref m) => { 2u8.write(w)?; m.write(w) },
			CommitmentUpdate::FailMalformed(ref m) => { 3u8.write(w)?; m.write(w) },
			CommitmentUpdate::Fee(ref m) => { 4u8.write(w)?; m.write(w) },
		}
	}
}

impl Readable for CommitmentUpdate {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		Ok(match <u8 as Readable>::read(r)? {
			0 => CommitmentUpdate::Add(Readable::read(r)?),
			1 => CommitmentUpdate::Fulfill(Readable::read(r)?),
			2 => CommitmentUpdate::Fail(Readable::read(r)?),
			3 => CommitmentUpdate::FailMalformed(Readable::read(r)?),
			4 => CommitmentUpdate::Fee(Readable::read(r)?),
			_ => return Err(DecodeError::InvalidValue),
		})
	}
}

impl Writeable for Vec<CommitmentUpdate> {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
		(self.len() as u16).write(w)?;
		for e in self.iter() {
			e.write(w)?;
		}
		Ok(())
	}
}
impl Readable for Vec<CommitmentUpdate> {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let len: u16 = Readable::read(r)?;
		let mut ret = Vec::with_capacity(::std::cmp::min(len as usize, 483));
		for _ in 0..len {
			ret.push(Readable::read(r)?);
		}
		Ok(ret)
	}
}

impl Writeable for Vec<DirectedHtlc> {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
		(self.len() as u16).write(w)?;
		for e in self.iter() {
			e.write(w)?;
		}
		Ok(())
	}
}
impl Readable for Vec<DirectedHtlc> {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let len: u16 = Readable::read(r)?;
		let mut ret = Vec::with_capacity(::std::cmp::min(len as usize, 2 * MAX_HTLCS as usize));
		for _ in 0..len {
			ret.push(Readable::read(r)?);
		}
		Ok(ret)
	}
}

/// The balance sheet of one commitment transaction: both balances, the committed feerate, and
/// every in-flight HTLC, directed relative to the commitment's broadcaster.
///
/// Balances are before the commitment fee: the fee is subtracted from the funder's side only
/// when the transaction is actually built, so that
/// `to_local_msat + to_remote_msat + sum(htlcs)` always equals the channel capacity.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitmentSpec {
	/// The in-flight HTLCs.
	pub htlcs: Vec<DirectedHtlc>,
	/// The feerate, in satoshi per kiloweight, this commitment pays.
	pub feerate_per_kw: u32,
	/// The broadcaster's balance in millisatoshi, before fees.
	pub to_local_msat: u64,
	/// The counterparty's balance in millisatoshi, before fees.
	pub to_remote_msat: u64,
}

impl_writeable!(CommitmentSpec, { htlcs, feerate_per_kw, to_local_msat, to_remote_msat });

impl CommitmentSpec {
	/// The total value of in-flight HTLCs offered by the spec's owner, in millisatoshi.
	pub fn offered_htlcs_msat(&self) -> u64 {
		self.htlcs.iter().filter(|h| h.direction == HtlcDirection::Offered).map(|h| h.add.amount_msat).sum()
	}

	/// The total value of in-flight HTLCs received by the spec's owner, in millisatoshi.
	pub fn received_htlcs_msat(&self) -> u64 {
		self.htlcs.iter().filter(|h| h.direction == HtlcDirection::Received).map(|h| h.add.amount_msat).sum()
	}

	/// The sum of both balances and all in-flight HTLCs. Invariant: constant over the lifetime
	/// of the channel, equal to the funding amount.
	pub fn total_msat(&self) -> u64 {
		self.to_local_msat + self.to_remote_msat + self.offered_htlcs_msat() + self.received_htlcs_msat()
	}

	fn find_htlc(&self, direction: HtlcDirection, htlc_id: u64) -> Option<usize> {
		self.htlcs.iter().position(|h| h.direction == direction && h.add.htlc_id == htlc_id)
	}

	/// Looks up an in-flight HTLC by direction and id.
	pub fn htlc(&self, direction: HtlcDirection, htlc_id: u64) -> Option<&DirectedHtlc> {
		self.find_htlc(direction, htlc_id).map(|idx| &self.htlcs[idx])
	}

	/// Applies a batch of updates to this spec, producing the next one. `local_changes` are
	/// updates sent by the spec's owner, `remote_changes` updates sent by the counterparty.
	///
	/// Adds are applied before fulfills/fails so a batch may settle an HTLC it also introduced.
	/// Referencing an unknown HTLC is a protocol error surfaced to the caller.
	pub fn reduce(&self, local_changes: &[CommitmentUpdate], remote_changes: &[CommitmentUpdate]) -> Result<CommitmentSpec, &'static str> {
		let mut spec = self.clone();
		for change in local_changes.iter() {
			if let CommitmentUpdate::Add(ref add) = change {
				if spec.to_local_msat < add.amount_msat {
					return Err("htlc amount exceeds local balance");
				}
				spec.to_local_msat -= add.amount_msat;
				spec.htlcs.push(DirectedHtlc { direction: HtlcDirection::Offered, add: add.clone() });
			}
		}
		for change in remote_changes.iter() {
			if let CommitmentUpdate::Add(ref add) = change {
				if spec.to_remote_msat < add.amount_msat {
					return Err("htlc amount exceeds remote balance");
				}
				spec.to_remote_msat -= add.amount_msat;
				spec.htlcs.push(DirectedHtlc { direction: HtlcDirection::Received, add: add.clone() });
			}
		}
		for change in local_changes.iter() {
			match change {
				CommitmentUpdate::Add(_) => {},
				// We settle HTLCs the counterparty offered to us, ie our received set.
				CommitmentUpdate::Fulfill(ref fulfill) => {
					let idx = spec.find_htlc(HtlcDirection::Received, fulfill.htlc_id).ok_or("fulfill of unknown htlc")?;
					let amount = spec.htlcs.remove(idx).add.amount_msat;
					spec.to_local_msat += amount;
				},
				CommitmentUpdate::Fail(ref fail) => {
					let idx = spec.find_htlc(HtlcDirection::Received, fail.htlc_id).ok_or("fail of unknown htlc")?;
					let amount = spec.htlcs.remove(idx).add.amount_msat;
					spec.to_remote_msat += amount;
				},
				CommitmentUpdate::FailMalformed(ref fail) => {
					let idx = spec.find_htlc(HtlcDirection::Received, fail.htlc_id).ok_or("fail of unknown htlc")?;
					let amount = spec.htlcs.remove(idx).add.amount_msat;
					spec.to_remote_msat += amount;
				},
				CommitmentUpdate::Fee(ref fee) => {
					spec.feerate_per_kw = fee.feerate_per_kw;
				},
			}
		}
		for change in remote_changes.iter() {
			match change {
				CommitmentUpdate::Add(_) => {},
				CommitmentUpdate::Fulfill(ref fulfill) => {
					let idx = spec.find_htlc(HtlcDirection::Offered, fulfill.htlc_id).ok_or("fulfill of unknown htlc")?;
					let amount = spec.htlcs.remove(idx).add.amount_msat;
					spec.to_remote_msat += amount;
				},
				CommitmentUpdate::Fail(ref fail) => {
					let idx = spec.find_htlc(HtlcDirection::Offered, fail.htlc_id).ok_or("fail of unknown htlc")?;
					let amount = spec.htlcs.remove(idx).add.amount_msat;
					spec.to_local_msat += amount;
				},
				CommitmentUpdate::FailMalformed(ref fail) => {
					let idx = spec.find_htlc(HtlcDirection::Offered, fail.htlc_id).ok_or("fail of unknown htlc")?;
					let amount = spec.htlcs.remove(idx).add.amount_msat;
					spec.to_local_msat += amount;
				},
				CommitmentUpdate::Fee(ref fee) => {
					spec.feerate_per_kw = fee.feerate_per_kw;
				},
			}
		}
		Ok(spec)
	}

	/// This spec as seen from the counterparty: balances swapped, HTLC directions flipped.
	pub fn mirrored(&self) -> CommitmentSpec {
		CommitmentSpec {
			htlcs: self.htlcs.iter().map(|h| h.opposite()).collect(),
			feerate_per_kw: self.feerate_per_kw,
			to_local_msat: self.to_remote_msat,
			to_remote_msat: self.to_local_msat,
		}
	}
}

/// Information about an HTLC as it appears in a commitment transaction
#[derive(Clone, Debug, PartialEq)]
pub struct HTLCOutputInCommitment {
	/// Whether the HTLC was "offered" (ie outbound in relation to this commitment transaction).
	/// Note that this is not the same as whether it is outbound *from us*. To determine that you
	/// need to compare this value to whether the commitment transaction in question is that of
	/// the counterparty or our own.
	pub offered: bool,
	/// The value, in msat, of the HTLC. The value as it appears in the commitment transaction is
	/// this divided by 1000.
	pub amount_msat: u64,
	/// The CLTV lock-time at which this HTLC expires.
	pub cltv_expiry: u32,
	/// The hash of the preimage which unlocks this HTLC.
	pub payment_hash: PaymentHash,
	/// The id the HTLC's offerer assigned, tying the output back to the update_add_htlc.
	pub htlc_id: u64,
	/// The position within the commitment transaction's outputs. This is None if the value is
	/// below the dust limit (in which case no output appears in the commitment transaction and
	/// the value is spent to additional transaction fees).
	pub transaction_output_index: Option<u32>,
}

impl_writeable!(HTLCOutputInCommitment, {
	offered,
	amount_msat,
	cltv_expiry,
	payment_hash,
	htlc_id,
	transaction_output_index
});

impl Writeable for Vec<HTLCOutputInCommitment> {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
		(self.len() as u16).write(w)?;
		for e in self.iter() {
			e.write(w)?;
		}
		Ok(())
	}
}
impl Readable for Vec<HTLCOutputInCommitment> {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let len: u16 = Readable::read(r)?;
		let mut ret = Vec::with_capacity(::std::cmp::min(len as usize, MAX_HTLCS as usize));
		for _ in 0..len {
			ret.push(Readable::read(r)?);
		}
		Ok(ret)
	}
}

/// A script either spendable by the revocation key or the broadcaster_delayed_payment_key and
/// satisfying the relative-locktime OP_CSV constraint. Encumbers the `to_local` output on a
/// commitment transaction and the output of 2nd-stage HTLC transactions.
pub fn get_revokeable_redeemscript(revocation_key: &PublicKey, contest_delay: u16, broadcaster_delayed_payment_key: &PublicKey) -> Script {
	Builder::new().push_opcode(opcodes::all::OP_IF)
	              .push_slice(&revocation_key.serialize())
	              .push_opcode(opcodes::all::OP_ELSE)
	              .push_int(contest_delay as i64)
	              .push_opcode(opcodes::all::OP_CSV)
	              .push_opcode(opcodes::all::OP_DROP)
	              .push_slice(&broadcaster_delayed_payment_key.serialize())
	              .push_opcode(opcodes::all::OP_ENDIF)
	              .push_opcode(opcodes::all::OP_CHECKSIG)
	              .into_script()
}

#[inline]
pub(crate) fn get_htlc_redeemscript_with_explicit_keys(htlc: &HTLCOutputInCommitment, broadcaster_htlc_key: &PublicKey, countersignatory_htlc_key: &PublicKey, revocation_key: &PublicKey) -> Script {
	let payment_hash160 = Ripemd160::hash(&htlc.payment_hash.0[..]).into_inner();
	if htlc.offered {
		Builder::new().push_opcode(opcodes::all::OP_DUP)
		              .push_opcode(opcodes::all::OP_HASH160)
		              .push_slice(&PubkeyHash::hash(&revocation_key.serialize())[..])
		              .push_opcode(opcodes::all::OP_EQUAL)
		              .push_opcode(opcodes::all::OP_IF)
		              .push_opcode(opcodes::all::OP_CHECKSIG)
		              .push_opcode(opcodes::all::OP_ELSE)
		              .push_slice(&countersignatory_htlc_key.serialize()[..])
		              .push_opcode(opcodes::all::OP_SWAP)
		              .push_opcode(opcodes::all::OP_SIZE)
		              .push_int(32)
		              .push_opcode(opcodes::all::OP_EQUAL)
		              .push_opcode(opcodes::all::OP_NOTIF)
		              .push_opcode(opcodes::all::OP_DROP)
		              .push_int(2)
		              .push_opcode(opcodes::all::OP_SWAP)
		              .push_slice(&broadcaster_htlc_key.serialize()[..])
		              .push_int(2)
		              .push_opcode(opcodes::all::OP_CHECKMULTISIG)
		              .push_opcode(opcodes::all::OP_ELSE)
		              .push_opcode(opcodes::all::OP_HASH160)
		              .push_slice(&payment_hash160)
		              .push_opcode(opcodes::all::OP_EQUALVERIFY)
		              .push_opcode(opcodes::all::OP_CHECKSIG)
		              .push_opcode(opcodes::all::OP_ENDIF)
		              .push_opcode(opcodes::all::OP_ENDIF)
		              .into_script()
	} else {
		Builder::new().push_opcode(opcodes::all::OP_DUP)
		              .push_opcode(opcodes::all::OP_HASH160)
		              .push_slice(&PubkeyHash::hash(&revocation_key.serialize())[..])
		              .push_opcode(opcodes::all::OP_EQUAL)
		              .push_opcode(opcodes::all::OP_IF)
		              .push_opcode(opcodes::all::OP_CHECKSIG)
		              .push_opcode(opcodes::all::OP_ELSE)
		              .push_slice(&countersignatory_htlc_key.serialize()[..])
		              .push_opcode(opcodes::all::OP_SWAP)
		              .push_opcode(opcodes::all::OP_SIZE)
		              .push_int(32)
		              .push_opcode(opcodes::all::OP_EQUAL)
		              .push_opcode(opcodes::all::OP_IF)
		              .push_opcode(opcodes::all::OP_HASH160)
		              .push_slice(&payment_hash160)
		              .push_opcode(opcodes::all::OP_EQUALVERIFY)
		              .push_int(2)
		              .push_opcode(opcodes::all::OP_SWAP)
		              .push_slice(&broadcaster_htlc_key.serialize()[..])
		              .push_int(2)
		              .push_opcode(opcodes::all::OP_CHECKMULTISIG)
		              .push_opcode(opcodes::all::OP_ELSE)
		              .push_opcode(opcodes::all::OP_DROP)
		              .push_int(htlc.cltv_expiry as i64)
		              .push_opcode(opcodes::all::OP_CLTV)
		              .push_opcode(opcodes::all::OP_DROP)
		              .push_opcode(opcodes::all::OP_CHECKSIG)
		              .push_opcode(opcodes::all::OP_ENDIF)
		              .push_opcode(opcodes::all::OP_ENDIF)
		              .into_script()
	}
}

/// Gets the witness redeemscript for an HTLC output in a commitment transaction. Note that htlc
/// does not need to have its transaction_output_index filled.
#[inline]
pub fn get_htlc_redeemscript(htlc: &HTLCOutputInCommitment, keys: &TxCreationKeys) -> Script {
	get_htlc_redeemscript_with_explicit_keys(htlc, &keys.broadcaster_htlc_key, &keys.countersignatory_htlc_key, &keys.revocation_key)
}

/// Gets the redeemscript for a funding output from the two funding public keys.
/// Note that the order of funding public keys does not matter.
pub fn make_funding_redeemscript(broadcaster: &PublicKey, countersignatory: &PublicKey) -> Script {
	let broadcaster_funding_key = broadcaster.serialize();
	let countersignatory_funding_key = countersignatory.serialize();

	let builder = Builder::new().push_opcode(opcodes::all::OP_PUSHNUM_2);
	if broadcaster_funding_key[..] < countersignatory_funding_key[..] {
		builder.push_slice(&broadcaster_funding_key)
			.push_slice(&countersignatory_funding_key)
	} else {
		builder.push_slice(&countersignatory_funding_key)
			.push_slice(&broadcaster_funding_key)
	}.push_opcode(opcodes::all::OP_PUSHNUM_2).push_opcode(opcodes::all::OP_CHECKMULTISIG).into_script()
}

/// The P2WPKH output paying the counterparty's channel balance on the broadcaster's commitment.
pub fn get_to_remote_script(countersignatory_payment_point: &PublicKey) -> Script {
	Script::new_v0_p2wpkh(&WPubkeyHash::hash(&countersignatory_payment_point.serialize()))
}

/// Gets the obscuring factor XORed into a commitment's number before it is spread across the
/// transaction's locktime and sequence: the lower 48 bits of
/// SHA256(funder_payment_basepoint || fundee_payment_basepoint).
pub fn get_commitment_transaction_number_obscure_factor(funder_payment_basepoint: &PublicKey, fundee_payment_basepoint: &PublicKey) -> u64 {
	let mut sha = Sha256::engine();
	sha.input(&funder_payment_basepoint.serialize());
	sha.input(&fundee_payment_basepoint.serialize());
	let res = Sha256::from_engine(sha).into_inner();

	((res[26] as u64) << 5 * 8) |
	((res[27] as u64) << 4 * 8) |
	((res[28] as u64) << 3 * 8) |
	((res[29] as u64) << 2 * 8) |
	((res[30] as u64) << 1 * 8) |
	((res[31] as u64) << 0 * 8)
}

/// The inputs to [`build_commitment_tx`] which do not change over the life of a channel.
#[derive(Clone, Debug)]
pub struct CommitmentTxParams {
	/// The funding outpoint both commitments spend.
	pub funding_outpoint: OutPoint,
	/// Whether the broadcaster of this commitment funded the channel and therefore pays its fee.
	pub broadcaster_is_funder: bool,
	/// The broadcaster's dust limit, deciding which outputs are trimmed.
	pub broadcaster_dust_limit_satoshis: u64,
	/// The delay, selected by the countersignatory, imposed on the broadcaster's main output.
	pub contest_delay: u16,
	/// The countersignatory's static payment point receiving the to_remote output.
	pub countersignatory_payment_point: PublicKey,
	/// The factor obscuring the commitment number on the wire format of the transaction.
	pub commitment_number_obscure_factor: u64,
}

/// A commitment transaction built from a [`CommitmentSpec`], with the HTLC output map needed to
/// sign and claim its outputs.
#[derive(Clone, Debug)]
pub struct BuiltCommitment {
	/// The unsigned commitment transaction.
	pub tx: Transaction,
	/// Every in-flight HTLC, trimmed ones included, with output indices filled for untrimmed
	/// ones. Sorted in output order.
	pub htlcs: Vec<HTLCOutputInCommitment>,
	/// The fee the transaction pays.
	pub fee_sat: u64,
	/// The value of the to_local output, or None if trimmed.
	pub to_local_value_sat: Option<u64>,
	/// The value of the to_remote output, or None if trimmed.
	pub to_remote_value_sat: Option<u64>,
}

impl BuiltCommitment {
	/// The transaction's txid.
	pub fn txid(&self) -> Txid {
		self.tx.txid()
	}

	/// The output index of the to_local output, if present.
	pub fn to_local_output_index(&self, keys: &TxCreationKeys, contest_delay: u16) -> Option<usize> {
		let script = get_revokeable_redeemscript(&keys.revocation_key, contest_delay, &keys.broadcaster_delayed_payment_key).to_v0_p2wsh();
		self.tx.output.iter().position(|out| out.script_pubkey == script)
	}
}

/// Builds the commitment transaction for the given spec, from the broadcaster's point of view.
///
/// Deterministic: both peers must call this with mirrored specs and identical parameters and get
/// bit-identical transactions. Outputs are in BIP 69 order with HTLC expiry as the tiebreak; the
/// commitment number is obscured across locktime and sequence; trimmed HTLCs and a trimmed
/// balance output add to the fee.
pub fn build_commitment_tx(commitment_number: u64, keys: &TxCreationKeys, spec: &CommitmentSpec, params: &CommitmentTxParams) -> BuiltCommitment {
	let obscured_commitment_number = commitment_number ^ params.commitment_number_obscure_factor;
	assert!(commitment_number < (1 << 48));

	let txins = {
		let mut ins: Vec<TxIn> = Vec::new();
		ins.push(TxIn {
			previous_output: BitcoinOutPoint {
				txid: params.funding_outpoint.txid,
				vout: params.funding_outpoint.index as u32,
			},
			script_sig: Script::new(),
			sequence: Sequence(((0x80 as u32) << 8 * 3) | ((obscured_commitment_number >> 3 * 8) as u32)),
			witness: Witness::new(),
		});
		ins
	};

	let mut txouts: Vec<(TxOut, Option<HTLCOutputInCommitment>)> = Vec::with_capacity(spec.htlcs.len() + 2);
	let mut included_htlcs: Vec<HTLCOutputInCommitment> = Vec::with_capacity(spec.htlcs.len());

	let offered_dust_threshold = offered_htlc_trim_threshold_sat(params.broadcaster_dust_limit_satoshis, spec.feerate_per_kw);
	let received_dust_threshold = received_htlc_trim_threshold_sat(params.broadcaster_dust_limit_satoshis, spec.feerate_per_kw);

	let mut num_untrimmed = 0;
	for htlc in spec.htlcs.iter() {
		let offered = htlc.direction == HtlcDirection::Offered;
		let threshold = if offered { offered_dust_threshold } else { received_dust_threshold };
		let out = HTLCOutputInCommitment {
			offered,
			amount_msat: htlc.add.amount_msat,
			cltv_expiry: htlc.add.cltv_expiry,
			payment_hash: htlc.add.payment_hash,
			htlc_id: htlc.add.htlc_id,
			transaction_output_index: None,
		};
		if htlc.add.amount_msat / 1000 >= threshold {
			num_untrimmed += 1;
			txouts.push((TxOut {
				script_pubkey: get_htlc_redeemscript(&out, &keys).to_v0_p2wsh(),
				value: htlc.add.amount_msat / 1000,
			}, Some(out)));
		} else {
			// Trimmed: the value joins the fee but the HTLC stays in balance accounting.
			included_htlcs.push(out);
		}
	}

	let fee_sat = commit_tx_fee_sat(spec.feerate_per_kw, num_untrimmed);

	let (to_local_msat, to_remote_msat) = if params.broadcaster_is_funder {
		(spec.to_local_msat.saturating_sub(fee_sat * 1000), spec.to_remote_msat)
	} else {
		(spec.to_local_msat, spec.to_remote_msat.saturating_sub(fee_sat * 1000))
	};

	let to_local_value_sat = if to_local_msat / 1000 >= params.broadcaster_dust_limit_satoshis {
		let value = to_local_msat / 1000;
		txouts.push((TxOut {
			script_pubkey: get_revokeable_redeemscript(&keys.revocation_key, params.contest_delay, &keys.broadcaster_delayed_payment_key).to_v0_p2wsh(),
			value,
		}, None));
		Some(value)
	} else { None };

	let to_remote_value_sat = if to_remote_msat / 1000 >= params.broadcaster_dust_limit_satoshis {
		let value = to_remote_msat / 1000;
		txouts.push((TxOut {
			script_pubkey: get_to_remote_script(&params.countersignatory_payment_point),
			value,
		}, None));
		Some(value)
	} else { None };

	sort_outputs(&mut txouts, |a, b| {
		if let &Some(ref a_htlc) = a {
			if let &Some(ref b_htlc) = b {
				a_htlc.cltv_expiry.cmp(&b_htlc.cltv_expiry)
					// Note that due to hash collisions, we have to have a fallback comparison
					// here for fuzzing mode (otherwise at runtime we can assert if this fails)
					.then(a_htlc.payment_hash.0[..].cmp(&b_htlc.payment_hash.0[..]))
			} else { Ordering::Equal }
		} else { Ordering::Equal }
	});

	let mut outputs = Vec::with_capacity(txouts.len());
	for (idx, (out, htlc)) in txouts.drain(..).enumerate() {
		if let Some(mut htlc) = htlc {
			htlc.transaction_output_index = Some(idx as u32);
			included_htlcs.push(htlc);
		}
		outputs.push(out);
	}
	included_htlcs.sort_unstable_by(|a, b| {
		a.transaction_output_index.unwrap_or(u32::max_value()).cmp(&b.transaction_output_index.unwrap_or(u32::max_value()))
			.then(a.htlc_id.cmp(&b.htlc_id))
	});

	let tx = Transaction {
		version: 2,
		lock_time: PackedLockTime(((0x20 as u32) << 8 * 3) | ((obscured_commitment_number & 0xffffffu64) as u32)),
		input: txins,
		output: outputs,
	};
	BuiltCommitment { tx, htlcs: included_htlcs, fee_sat, to_local_value_sat, to_remote_value_sat }
}

/// Builds an HTLC-timeout (for an offered HTLC) or HTLC-success (for a received one) transaction
/// spending the given HTLC output of a commitment transaction.
///
/// Panics if the HTLC was trimmed (`transaction_output_index.is_none()`).
pub fn build_htlc_transaction(commitment_txid: &Txid, feerate_per_kw: u32, contest_delay: u16, htlc: &HTLCOutputInCommitment, broadcaster_delayed_payment_key: &PublicKey, revocation_key: &PublicKey) -> Transaction {
	let mut txins: Vec<TxIn> = Vec::new();
	txins.push(TxIn {
		previous_output: BitcoinOutPoint {
			txid: commitment_txid.clone(),
			vout: htlc.transaction_output_index.expect("Can't build an HTLC transaction for a dust output"),
		},
		script_sig: Script::new(),
		sequence: Sequence::ZERO,
		witness: Witness::new(),
	});

	let total_fee = if htlc.offered {
		htlc_timeout_fee_sat(feerate_per_kw)
	} else {
		htlc_success_fee_sat(feerate_per_kw)
	};

	let mut txouts: Vec<TxOut> = Vec::new();
	txouts.push(TxOut {
		script_pubkey: get_revokeable_redeemscript(revocation_key, contest_delay, broadcaster_delayed_payment_key).to_v0_p2wsh(),
		value: htlc.amount_msat / 1000 - total_fee,
	});

	Transaction {
		version: 2,
		lock_time: PackedLockTime(if htlc.offered { htlc.cltv_expiry } else { 0 }),
		input: txins,
		output: txouts,
	}
}

/// Builds the mutual closing transaction: the funding output paid straight back to both sides,
/// outputs in BIP 69 order, fee already subtracted by the caller from the funder's value.
///
/// Values below each side's dust floor yield a transaction without that output.
pub fn build_closing_transaction(to_holder_value_sat: u64, to_counterparty_value_sat: u64, to_holder_script: Script, to_counterparty_script: Script, funding_outpoint: OutPoint) -> Transaction {
	let txins = {
		let mut ins: Vec<TxIn> = Vec::new();
		ins.push(TxIn {
			previous_output: funding_outpoint.into_bitcoin_outpoint(),
			script_sig: Script::new(),
			sequence: Sequence::MAX,
			witness: Witness::new(),
		});
		ins
	};

	let mut txouts: Vec<(TxOut, ())> = Vec::new();
	if to_counterparty_value_sat > 0 {
		txouts.push((TxOut {
			script_pubkey: to_counterparty_script,
			value: to_counterparty_value_sat,
		}, ()));
	}
	if to_holder_value_sat > 0 {
		txouts.push((TxOut {
			script_pubkey: to_holder_script,
			value: to_holder_value_sat,
		}, ()));
	}

	sort_outputs(&mut txouts, |_, _| Ordering::Equal); // Ordering doesnt matter with zero HTLCs

	let mut outputs: Vec<TxOut> = Vec::new();
	for out in txouts.drain(..) {
		outputs.push(out.0);
	}

	Transaction {
		version: 2,
		lock_time: PackedLockTime::ZERO,
		input: txins,
		output: outputs,
	}
}

/// Computes the message to sign for the single input of a segwit transaction spending `value`
/// locked by `redeemscript`.
fn sighash(tx: &Transaction, redeemscript: &Script, value_sat: u64) -> Message {
	let sighash = SighashCache::new(tx)
		.segwit_signature_hash(0, redeemscript, value_sat, EcdsaSighashType::All)
		.expect("input index 0 exists");
	Message::from_slice(&sighash[..]).expect("sighashes are 32 bytes")
}

/// Signs the single input of `tx` (a commitment, HTLC or closing transaction) spending `value`
/// locked by `redeemscript`.
pub fn sign_transaction_input<T: secp256k1::Signing>(secp_ctx: &Secp256k1<T>, tx: &Transaction, redeemscript: &Script, value_sat: u64, key: &SecretKey) -> Signature {
	secp_ctx.sign_ecdsa(&sighash(tx, redeemscript, value_sat), key)
}

/// Verifies a counterparty's signature on the single input of `tx`.
pub fn verify_transaction_sig<T: secp256k1::Verification>(secp_ctx: &Secp256k1<T>, tx: &Transaction, redeemscript: &Script, value_sat: u64, their_key: &PublicKey, sig: &Signature) -> Result<(), SecpError> {
	secp_ctx.verify_ecdsa(&sighash(tx, redeemscript, value_sat), sig, their_key)
}

/// Assembles the witness of a commitment (or mutual closing) transaction from both funding
/// signatures, ordered by funding pubkey as the 2-of-2 redeemscript requires.
pub fn finalize_funding_input(tx: &mut Transaction, funding_redeemscript: &Script, holder_funding_key: &PublicKey, counterparty_funding_key: &PublicKey, holder_sig: &Signature, counterparty_sig: &Signature) {
	// First push the multisig dummy, note that due to BIP147 (NULLDUMMY) it must be a zero-length element.
	tx.input[0].witness.push(Vec::new());
	let holder_sig_first = holder_funding_key.serialize()[..] < counterparty_funding_key.serialize()[..];
	let mut ser_holder_sig = holder_sig.serialize_der().to_vec();
	ser_holder_sig.push(EcdsaSighashType::All as u8);
	let mut ser_cp_sig = counterparty_sig.serialize_der().to_vec();
	ser_cp_sig.push(EcdsaSighashType::All as u8);
	if holder_sig_first {
		tx.input[0].witness.push(ser_holder_sig);
		tx.input[0].witness.push(ser_cp_sig);
	} else {
		tx.input[0].witness.push(ser_cp_sig);
		tx.input[0].witness.push(ser_holder_sig);
	}
	tx.input[0].witness.push(funding_redeemscript.as_bytes().to_vec());
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ln::{ChannelId, PaymentHash};
	use crate::ln::chan_keys::{ChannelKeys, TxCreationKeys};
	use bitcoin::hashes::Hash;
	use bitcoin::secp256k1::Secp256k1;

	fn dummy_add(htlc_id: u64, amount_msat: u64, cltv_expiry: u32) -> msgs::UpdateAddHTLC {
		msgs::UpdateAddHTLC {
			channel_id: ChannelId([5; 32]),
			htlc_id,
			amount_msat,
			payment_hash: PaymentHash(Sha256::hash(&htlc_id.to_be_bytes()).into_inner()),
			cltv_expiry,
			onion_routing_packet: msgs::OnionPacket::empty(),
		}
	}

	fn base_spec() -> CommitmentSpec {
		CommitmentSpec {
			htlcs: Vec::new(),
			feerate_per_kw: 1000,
			to_local_msat: 700_000_000,
			to_remote_msat: 300_000_000,
		}
	}

	#[test]
	fn reduce_conserves_total() {
		let spec = base_spec();
		let total = spec.total_msat();

		let add = CommitmentUpdate::Add(dummy_add(0, 50_000_000, 500));
		let spec = spec.reduce(&[add], &[]).unwrap();
		assert_eq!(spec.to_local_msat, 650_000_000);
		assert_eq!(spec.offered_htlcs_msat(), 50_000_000);
		assert_eq!(spec.total_msat(), total);

		// The remote fulfills: the value moves to their side.
		let fulfill = CommitmentUpdate::Fulfill(msgs::UpdateFulfillHTLC {
			channel_id: ChannelId([5; 32]), htlc_id: 0, payment_preimage: crate::ln::PaymentPreimage([0; 32]),
		});
		let spec = spec.reduce(&[], &[fulfill]).unwrap();
		assert_eq!(spec.to_remote_msat, 350_000_000);
		assert_eq!(spec.htlcs.len(), 0);
		assert_eq!(spec.total_msat(), total);
	}

	#[test]
	fn reduce_fail_returns_value() {
		let spec = base_spec();
		let add = CommitmentUpdate::Add(dummy_add(0, 50_000_000, 500));
		let spec = spec.reduce(&[add], &[]).unwrap();
		let fail = CommitmentUpdate::Fail(msgs::UpdateFailHTLC {
			channel_id: ChannelId([5; 32]), htlc_id: 0, reason: msgs::OnionErrorPacket { data: vec![] },
		});
		let spec = spec.reduce(&[], &[fail]).unwrap();
		assert_eq!(spec.to_local_msat, 700_000_000);
		assert_eq!(spec.htlcs.len(), 0);
	}

	#[test]
	fn reduce_rejects_unknown_htlc() {
		let fulfill = CommitmentUpdate::Fulfill(msgs::UpdateFulfillHTLC {
			channel_id: ChannelId([5; 32]), htlc_id: 42, payment_preimage: crate::ln::PaymentPreimage([0; 32]),
		});
		assert!(base_spec().reduce(&[fulfill], &[]).is_err());
	}

	#[test]
	fn mirrored_swaps_sides() {
		let add = CommitmentUpdate::Add(dummy_add(0, 50_000_000, 500));
		let spec = base_spec().reduce(&[add], &[]).unwrap();
		let mirrored = spec.mirrored();
		assert_eq!(mirrored.to_local_msat, spec.to_remote_msat);
		assert_eq!(mirrored.to_remote_msat, spec.to_local_msat);
		assert_eq!(mirrored.htlcs[0].direction, HtlcDirection::Received);
		assert_eq!(mirrored.mirrored(), spec);
	}

	fn test_keys_and_params() -> (Secp256k1<bitcoin::secp256k1::All>, TxCreationKeys, CommitmentTxParams) {
		let secp_ctx = Secp256k1::new();
		let local = ChannelKeys::derive_from_seed(&[1; 32], 0);
		let remote = ChannelKeys::derive_from_seed(&[2; 32], 0);
		let local_pub = local.pubkeys(&secp_ctx);
		let remote_pub = remote.pubkeys(&secp_ctx);
		let per_commitment_point = local.commitment_point(&secp_ctx, 0);
		let keys = TxCreationKeys::from_channel_static_keys(&per_commitment_point, &local_pub, &remote_pub, &secp_ctx).unwrap();
		let params = CommitmentTxParams {
			funding_outpoint: OutPoint { txid: Txid::from_inner([9; 32]), index: 0 },
			broadcaster_is_funder: true,
			broadcaster_dust_limit_satoshis: 546,
			contest_delay: 144,
			countersignatory_payment_point: remote_pub.payment_point,
			commitment_number_obscure_factor: get_commitment_transaction_number_obscure_factor(&local_pub.payment_point, &remote_pub.payment_point),
		};
		(secp_ctx, keys, params)
	}

	#[test]
	fn commitment_number_obscured_in_locktime_and_sequence() {
		let (_, keys, params) = test_keys_and_params();
		let spec = base_spec();
		let built = build_commitment_tx(42, &keys, &spec, &params);
		let obscured = 42 ^ params.commitment_number_obscure_factor;
		assert_eq!(built.tx.lock_time.0 >> 24, 0x20);
		assert_eq!(built.tx.lock_time.0 & 0xffffff, (obscured & 0xffffff) as u32);
		assert_eq!(built.tx.input[0].sequence.0 >> 24, 0x80);
		assert_eq!(built.tx.input[0].sequence.0 & 0xffffff, ((obscured >> 24) & 0xffffff) as u32);
	}

	#[test]
	fn funder_pays_commitment_fee() {
		let (_, keys, params) = test_keys_and_params();
		let spec = base_spec();
		let built = build_commitment_tx(0, &keys, &spec, &params);
		assert_eq!(built.fee_sat, commit_tx_fee_sat(1000, 0));
		assert_eq!(built.to_local_value_sat, Some(700_000 - built.fee_sat));
		assert_eq!(built.to_remote_value_sat, Some(300_000));
		assert_eq!(built.tx.output.len(), 2);

		let mut fundee_params = params.clone();
		fundee_params.broadcaster_is_funder = false;
		let built = build_commitment_tx(0, &keys, &spec, &fundee_params);
		assert_eq!(built.to_local_value_sat, Some(700_000));
		assert_eq!(built.to_remote_value_sat, Some(300_000 - built.fee_sat));
	}

	#[test]
	fn dust_htlcs_are_trimmed_but_tracked() {
		let (_, keys, params) = test_keys_and_params();
		let mut spec = base_spec();
		spec.htlcs.push(DirectedHtlc { direction: HtlcDirection::Offered, add: dummy_add(0, 5_000_000, 500) });
		spec.htlcs.push(DirectedHtlc { direction: HtlcDirection::Offered, add: dummy_add(1, 100_000, 500) }); // 100 sat: dust
		spec.to_local_msat -= 5_100_000;

		let built = build_commitment_tx(0, &keys, &spec, &params);
		// to_local + to_remote + one HTLC output.
		assert_eq!(built.tx.output.len(), 3);
		assert_eq!(built.htlcs.len(), 2);
		let trimmed: Vec<_> = built.htlcs.iter().filter(|h| h.transaction_output_index.is_none()).collect();
		assert_eq!(trimmed.len(), 1);
		assert_eq!(trimmed[0].htlc_id, 1);
		// Only the untrimmed HTLC pays toward weight fee.
		assert_eq!(built.fee_sat, commit_tx_fee_sat(1000, 1));
	}

	#[test]
	fn htlc_outputs_sorted_by_bip69_with_cltv_tiebreak() {
		let (_, keys, params) = test_keys_and_params();
		let mut spec = base_spec();
		// Two HTLCs with identical amount and hash but different expiry: tiebreak on expiry.
		let mut add_a = dummy_add(0, 10_000_000, 600);
		let mut add_b = dummy_add(1, 10_000_000, 500);
		add_a.payment_hash = PaymentHash([7; 32]);
		add_b.payment_hash = PaymentHash([7; 32]);
		spec.htlcs.push(DirectedHtlc { direction: HtlcDirection::Offered, add: add_a });
		spec.htlcs.push(DirectedHtlc { direction: HtlcDirection::Offered, add: add_b });
		spec.to_local_msat -= 20_000_000;

		let built = build_commitment_tx(0, &keys, &spec, &params);
		let a = built.htlcs.iter().find(|h| h.htlc_id == 0).unwrap();
		let b = built.htlcs.iter().find(|h| h.htlc_id == 1).unwrap();
		assert!(b.transaction_output_index.unwrap() < a.transaction_output_index.unwrap());
	}

	#[test]
	fn commitment_sig_round_trip() {
		let (secp_ctx, keys, params) = test_keys_and_params();
		let local = ChannelKeys::derive_from_seed(&[1; 32], 0);
		let remote = ChannelKeys::derive_from_seed(&[2; 32], 0);
		let local_pub = local.pubkeys(&secp_ctx);
		let remote_pub = remote.pubkeys(&secp_ctx);
		let funding_redeemscript = make_funding_redeemscript(&local_pub.funding_pubkey, &remote_pub.funding_pubkey);

		let built = build_commitment_tx(0, &keys, &base_spec(), &params);
		let channel_value_sat = 1_000_000;
		let sig = sign_transaction_input(&secp_ctx, &built.tx, &funding_redeemscript, channel_value_sat, &local.funding_key);
		verify_transaction_sig(&secp_ctx, &built.tx, &funding_redeemscript, channel_value_sat, &local_pub.funding_pubkey, &sig).unwrap();
		assert!(verify_transaction_sig(&secp_ctx, &built.tx, &funding_redeemscript, channel_value_sat, &remote_pub.funding_pubkey, &sig).is_err());

		let mut tx = built.tx.clone();
		let remote_sig = sign_transaction_input(&secp_ctx, &built.tx, &funding_redeemscript, channel_value_sat, &remote.funding_key);
		finalize_funding_input(&mut tx, &funding_redeemscript, &local_pub.funding_pubkey, &remote_pub.funding_pubkey, &sig, &remote_sig);
		assert_eq!(tx.input[0].witness.len(), 4);
	}

	#[test]
	fn htlc_transaction_locktime_and_fee() {
		let htlc = HTLCOutputInCommitment {
			offered: true,
			amount_msat: 10_000_000,
			cltv_expiry: 500,
			payment_hash: PaymentHash([3; 32]),
			htlc_id: 0,
			transaction_output_index: Some(1),
		};
		let (_, keys, _) = test_keys_and_params();
		let tx = build_htlc_transaction(&Txid::from_inner([8; 32]), 1000, 144, &htlc, &keys.broadcaster_delayed_payment_key, &keys.revocation_key);
		assert_eq!(tx.lock_time.0, 500);
		assert_eq!(tx.output[0].value, 10_000 - htlc_timeout_fee_sat(1000));

		let received = HTLCOutputInCommitment { offered: false, ..htlc };
		let tx = build_htlc_transaction(&Txid::from_inner([8; 32]), 1000, 144, &received, &keys.broadcaster_delayed_payment_key, &keys.revocation_key);
		assert_eq!(tx.lock_time.0, 0);
		assert_eq!(tx.output[0].value, 10_000 - htlc_success_fee_sat(1000));
	}

	#[test]
	fn closing_tx_drops_zero_outputs() {
		let funding = OutPoint { txid: Txid::from_inner([4; 32]), index: 1 };
		let a = Script::from(vec![0, 20, 1, 1]);
		let b = Script::from(vec![0, 20, 2, 2]);
		let tx = build_closing_transaction(500_000, 400_000, a.clone(), b.clone(), funding);
		assert_eq!(tx.output.len(), 2);
		assert_eq!(tx.input[0].sequence, Sequence::MAX);
		let tx = build_closing_transaction(500_000, 0, a, b, funding);
		assert_eq!(tx.output.len(), 1);
		assert_eq!(tx.output[0].value, 500_000);
	}
}
