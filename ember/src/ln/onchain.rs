// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Turning a published commitment transaction into the set of claim transactions which move
//! every output we are entitled to back into our wallet.
//!
//! Three shapes of closure are handled: our own commitment (delayed main output, pre-signed
//! second-stage HTLC transactions), the counterparty's current commitment (immediate main
//! output, direct HTLC spends), and a revoked commitment of theirs (penalty transactions
//! sweeping every output through the revocation path). Claim values are reduced by a
//! weight-estimated fee so the transactions actually propagate.

use bitcoin::blockdata::script::Script;
use bitcoin::blockdata::transaction::{EcdsaSighashType, OutPoint as BitcoinOutPoint, Transaction, TxIn, TxOut};
use bitcoin::{PackedLockTime, Sequence, Witness};
use bitcoin::hash_types::Txid;

use bitcoin::secp256k1::{self, Secp256k1, SecretKey, PublicKey};

use crate::ln::{PaymentHash, PaymentPreimage};
use crate::ln::chan_keys::{self, ChannelKeys, ChannelPublicKeys, TxCreationKeys};
use crate::ln::commitment::{self, HTLCOutputInCommitment};
use crate::ln::msgs::DecodeError;
use crate::util::ser::{Readable, Writeable, Writer};

use std::collections::HashMap;
use std::io::Read;

// Claim input weights, an upper bound used for fee estimation before signing.
// number_of_witness_elements + sig_length + signature + pubkey_length + pubkey + witness_script_length + witness_script
pub(crate) const WEIGHT_REVOKED_OFFERED_HTLC: u64 = 1 + 1 + 73 + 1 + 33 + 1 + 133;
pub(crate) const WEIGHT_REVOKED_RECEIVED_HTLC: u64 = 1 + 1 + 73 + 1 + 33 + 1 + 139;
pub(crate) const WEIGHT_OFFERED_HTLC: u64 = 1 + 1 + 73 + 1 + 32 + 1 + 133;
pub(crate) const WEIGHT_RECEIVED_HTLC: u64 = 1 + 1 + 73 + 1 + 1 + 1 + 139;
pub(crate) const WEIGHT_REVOKED_OUTPUT: u64 = 1 + 1 + 73 + 1 + 1 + 1 + 77;
pub(crate) const WEIGHT_DELAYED_OUTPUT: u64 = WEIGHT_REVOKED_OUTPUT;
pub(crate) const WEIGHT_P2WPKH_OUTPUT: u64 = 1 + 1 + 73 + 1 + 33;
// Base weight of a one-input one-output claim transaction, input witness excluded.
pub(crate) const WEIGHT_CLAIM_TX_BASE: u64 = (4 + 1 + 36 + 4 + 1 + 1 + 8 + 1 + 35 + 4) * 4 + 2;

fn claim_fee_sat(input_weight: u64, feerate_per_kw: u32) -> u64 {
	(WEIGHT_CLAIM_TX_BASE + input_weight) * feerate_per_kw as u64 / 1000
}

/// Builds the skeleton of a claim transaction: one input spending `outpoint`, one output paying
/// `value - fee` to `destination`. Returns None if the fee would eat the whole value.
fn build_claim_tx(outpoint: BitcoinOutPoint, value_sat: u64, input_weight: u64, feerate_per_kw: u32, destination: &Script, sequence: Sequence, lock_time: u32) -> Option<Transaction> {
	let fee = claim_fee_sat(input_weight, feerate_per_kw);
	if value_sat <= fee + destination.dust_value().to_sat() {
		return None;
	}
	Some(Transaction {
		version: 2,
		lock_time: PackedLockTime(lock_time),
		input: vec![TxIn {
			previous_output: outpoint,
			script_sig: Script::new(),
			sequence,
			witness: Witness::new(),
		}],
		output: vec![TxOut {
			script_pubkey: destination.clone(),
			value: value_sat - fee,
		}],
	})
}

fn sign_input<T: secp256k1::Signing>(secp_ctx: &Secp256k1<T>, tx: &Transaction, redeemscript: &Script, value_sat: u64, key: &SecretKey) -> Vec<u8> {
	let sig = commitment::sign_transaction_input(secp_ctx, tx, redeemscript, value_sat, key);
	let mut ser = sig.serialize_der().to_vec();
	ser.push(EcdsaSighashType::All as u8);
	ser
}

/// A payment hash / expiry pair remembered for each signed remote commitment, enough to
/// reconstruct every possible HTLC script of a revoked commitment for the penalty sweep.
#[derive(Clone, Debug, PartialEq)]
pub struct HtlcInfo {
	/// The HTLC's payment hash.
	pub payment_hash: PaymentHash,
	/// The HTLC's CLTV expiry.
	pub cltv_expiry: u32,
}

impl_writeable!(HtlcInfo, { payment_hash, cltv_expiry });

impl Writeable for Vec<HtlcInfo> {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
		(self.len() as u16).write(w)?;
		for e in self.iter() {
			e.write(w)?;
		}
		Ok(())
	}
}
impl Readable for Vec<HtlcInfo> {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let len: u16 = Readable::read(r)?;
		let mut ret = Vec::with_capacity(::std::cmp::min(len as usize, 966));
		for _ in 0..len {
			ret.push(Readable::read(r)?);
		}
		Ok(ret)
	}
}

/// The claim set produced when *our* commitment transaction hits the chain.
///
/// Our main output is locked by the counterparty-selected CSV delay; HTLC outputs are spent by
/// the pre-signed second-stage transactions, whose own outputs are again CSV-delayed and swept
/// by `claim_htlc_delayed_txs`.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalCommitPublished {
	/// The commitment transaction itself, fully signed.
	pub commit_tx: Transaction,
	/// Spend of our main output after the CSV delay, if the output exists and is economical.
	pub claim_main_delayed_tx: Option<Transaction>,
	/// Pre-signed HTLC-timeout transactions, one per offered non-dust HTLC, valid after each
	/// HTLC's CLTV.
	pub htlc_timeout_txs: Vec<Transaction>,
	/// Pre-signed HTLC-success transactions for received HTLCs whose preimage we hold.
	pub htlc_success_txs: Vec<Transaction>,
	/// Sweeps of the CSV-delayed outputs of the transactions above.
	pub claim_htlc_delayed_txs: Vec<Transaction>,
	/// Outpoints of `commit_tx` whose spend has reached the configured depth.
	pub irrevocably_spent: Vec<BitcoinOutPoint>,
}

impl_writeable!(LocalCommitPublished, {
	commit_tx,
	claim_main_delayed_tx,
	htlc_timeout_txs,
	htlc_success_txs,
	claim_htlc_delayed_txs,
	irrevocably_spent
});

impl LocalCommitPublished {
	/// Builds the claim set for our published commitment.
	///
	/// `htlcs_in_tx` and `remote_htlc_sigs` come from the persisted local commitment; only
	/// non-dust HTLCs carry signatures and outputs.
	pub fn build<T: secp256k1::Signing + secp256k1::Verification>(
		secp_ctx: &Secp256k1<T>, keys: &ChannelKeys, commit_tx: Transaction, commitment_number: u64,
		remote_pubkeys: &ChannelPublicKeys, contest_delay: u16,
		htlcs_in_tx: &[HTLCOutputInCommitment], remote_htlc_sigs: &HashMap<u64, bitcoin::secp256k1::ecdsa::Signature>,
		preimages: &HashMap<PaymentHash, PaymentPreimage>, feerate_per_kw: u32, destination: &Script,
	) -> LocalCommitPublished {
		let local_pubkeys = keys.pubkeys(secp_ctx);
		let per_commitment_point = keys.commitment_point(secp_ctx, commitment_number);
		let tx_keys = TxCreationKeys::from_channel_static_keys(&per_commitment_point, &local_pubkeys, remote_pubkeys, secp_ctx)
			.expect("key derivation only fails on invalid basepoints, validated at handshake");
		let delayed_payment_key = chan_keys::derive_private_key(secp_ctx, &per_commitment_point, &keys.delayed_payment_base_key)
			.expect("key derivation only fails on invalid basepoints, validated at handshake");
		let htlc_key = chan_keys::derive_private_key(secp_ctx, &per_commitment_point, &keys.htlc_base_key)
			.expect("key derivation only fails on invalid basepoints, validated at handshake");
		let txid = commit_tx.txid();

		let to_local_script = commitment::get_revokeable_redeemscript(&tx_keys.revocation_key, contest_delay, &tx_keys.broadcaster_delayed_payment_key);
		let to_local_p2wsh = to_local_script.to_v0_p2wsh();

		let mut claim_main_delayed_tx = None;
		for (idx, out) in commit_tx.output.iter().enumerate() {
			if out.script_pubkey == to_local_p2wsh {
				let outpoint = BitcoinOutPoint { txid, vout: idx as u32 };
				if let Some(mut tx) = build_claim_tx(outpoint, out.value, WEIGHT_DELAYED_OUTPUT, feerate_per_kw, destination, Sequence(contest_delay as u32), 0) {
					let sig = sign_input(secp_ctx, &tx, &to_local_script, out.value, &delayed_payment_key);
					tx.input[0].witness.push(sig);
					tx.input[0].witness.push(Vec::new());
					tx.input[0].witness.push(to_local_script.as_bytes().to_vec());
					claim_main_delayed_tx = Some(tx);
				}
			}
		}

		let mut htlc_timeout_txs = Vec::new();
		let mut htlc_success_txs = Vec::new();
		let mut claim_htlc_delayed_txs = Vec::new();
		for htlc in htlcs_in_tx.iter() {
			if htlc.transaction_output_index.is_none() { continue; }
			let remote_sig = match remote_htlc_sigs.get(&htlc.htlc_id) {
				Some(sig) => sig,
				None => continue,
			};
			if !htlc.offered && !preimages.contains_key(&htlc.payment_hash) {
				// A received HTLC we can't fulfill; the peer times it out or reveals the
				// preimage on-chain, both watched by the channel.
				continue;
			}
			let mut htlc_tx = commitment::build_htlc_transaction(&txid, feerate_per_kw, contest_delay, htlc, &tx_keys.broadcaster_delayed_payment_key, &tx_keys.revocation_key);
			let htlc_redeemscript = commitment::get_htlc_redeemscript(htlc, &tx_keys);
			let local_sig = sign_input(secp_ctx, &htlc_tx, &htlc_redeemscript, htlc.amount_msat / 1000, &htlc_key);
			let mut ser_remote_sig = remote_sig.serialize_der().to_vec();
			ser_remote_sig.push(EcdsaSighashType::All as u8);

			// First push the multisig dummy, note that due to BIP147 (NULLDUMMY) it must be a
			// zero-length element.
			htlc_tx.input[0].witness.push(Vec::new());
			htlc_tx.input[0].witness.push(ser_remote_sig);
			htlc_tx.input[0].witness.push(local_sig);
			if htlc.offered {
				// Due to BIP146 (MINIMALIF) this must be a zero-length element to relay.
				htlc_tx.input[0].witness.push(Vec::new());
			} else {
				htlc_tx.input[0].witness.push(preimages.get(&htlc.payment_hash).unwrap().0.to_vec());
			}
			htlc_tx.input[0].witness.push(htlc_redeemscript.as_bytes().to_vec());

			// The HTLC tx output is delayed like the main output; sweep it too.
			let htlc_tx_outpoint = BitcoinOutPoint { txid: htlc_tx.txid(), vout: 0 };
			if let Some(mut sweep) = build_claim_tx(htlc_tx_outpoint, htlc_tx.output[0].value, WEIGHT_DELAYED_OUTPUT, feerate_per_kw, destination, Sequence(contest_delay as u32), 0) {
				let sig = sign_input(secp_ctx, &sweep, &to_local_script, htlc_tx.output[0].value, &delayed_payment_key);
				sweep.input[0].witness.push(sig);
				sweep.input[0].witness.push(Vec::new());
				sweep.input[0].witness.push(to_local_script.as_bytes().to_vec());
				claim_htlc_delayed_txs.push(sweep);
			}

			if htlc.offered {
				htlc_timeout_txs.push(htlc_tx);
			} else {
				htlc_success_txs.push(htlc_tx);
			}
		}

		LocalCommitPublished {
			commit_tx,
			claim_main_delayed_tx,
			htlc_timeout_txs,
			htlc_success_txs,
			claim_htlc_delayed_txs,
			irrevocably_spent: Vec::new(),
		}
	}

	/// All transactions to hand to the broadcaster, commitment first.
	pub fn txs_to_broadcast(&self) -> Vec<&Transaction> {
		let mut txs = vec![&self.commit_tx];
		if let Some(ref tx) = self.claim_main_delayed_tx { txs.push(tx); }
		txs.extend(self.htlc_timeout_txs.iter());
		txs.extend(self.htlc_success_txs.iter());
		txs.extend(self.claim_htlc_delayed_txs.iter());
		txs
	}
}

/// The claim set produced when the counterparty's current commitment hits the chain.
///
/// Our main output is an immediately-spendable P2WPKH; HTLCs are claimed by direct spends of
/// the commitment outputs (with the preimage, or after expiry for HTLCs we offered).
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteCommitPublished {
	/// Their commitment transaction as seen on-chain.
	pub commit_tx: Transaction,
	/// Immediate spend of our P2WPKH main output, if economical.
	pub claim_main_tx: Option<Transaction>,
	/// Direct preimage spends of HTLC outputs they offered us.
	pub claim_htlc_success_txs: Vec<Transaction>,
	/// Direct post-CLTV spends of HTLC outputs we offered them.
	pub claim_htlc_timeout_txs: Vec<Transaction>,
	/// Outpoints of `commit_tx` whose spend has reached the configured depth.
	pub irrevocably_spent: Vec<BitcoinOutPoint>,
}

impl_writeable!(RemoteCommitPublished, {
	commit_tx,
	claim_main_tx,
	claim_htlc_success_txs,
	claim_htlc_timeout_txs,
	irrevocably_spent
});

impl RemoteCommitPublished {
	/// Builds the claim set for the counterparty's published commitment at `commitment_number`,
	/// whose HTLC set is given by `htlcs` (directed from *their* point of view, ie `offered`
	/// means they offered it and we can claim with the preimage).
	pub fn build<T: secp256k1::Signing + secp256k1::Verification>(
		secp_ctx: &Secp256k1<T>, keys: &ChannelKeys, commit_tx: Transaction,
		remote_per_commitment_point: &PublicKey, remote_pubkeys: &ChannelPublicKeys,
		htlcs: &[HTLCOutputInCommitment],
		preimages: &HashMap<PaymentHash, PaymentPreimage>, feerate_per_kw: u32, destination: &Script,
	) -> RemoteCommitPublished {
		let local_pubkeys = keys.pubkeys(secp_ctx);
		// Keys for their commitment: they are the broadcaster.
		let tx_keys = TxCreationKeys::from_channel_static_keys(remote_per_commitment_point, remote_pubkeys, &local_pubkeys, secp_ctx)
			.expect("key derivation only fails on invalid basepoints, validated at handshake");
		let htlc_key = chan_keys::derive_private_key(secp_ctx, remote_per_commitment_point, &keys.htlc_base_key)
			.expect("key derivation only fails on invalid basepoints, validated at handshake");
		let txid = commit_tx.txid();

		// Our main output on their commitment is a plain P2WPKH on our static payment key.
		let our_main_script = commitment::get_to_remote_script(&local_pubkeys.payment_point);
		let mut claim_main_tx = None;
		for (idx, out) in commit_tx.output.iter().enumerate() {
			if out.script_pubkey == our_main_script {
				let outpoint = BitcoinOutPoint { txid, vout: idx as u32 };
				if let Some(mut tx) = build_claim_tx(outpoint, out.value, WEIGHT_P2WPKH_OUTPUT, feerate_per_kw, destination, Sequence::MAX, 0) {
					// P2WPKH sighash uses the implied p2pkh script.
					let script_code = Script::new_p2pkh(&bitcoin::PublicKey::new(local_pubkeys.payment_point).pubkey_hash());
					let sig = sign_input(secp_ctx, &tx, &script_code, out.value, &keys.payment_key);
					tx.input[0].witness.push(sig);
					tx.input[0].witness.push(local_pubkeys.payment_point.serialize().to_vec());
					claim_main_tx = Some(tx);
				}
			}
		}

		let mut claim_htlc_success_txs = Vec::new();
		let mut claim_htlc_timeout_txs = Vec::new();
		for htlc in htlcs.iter() {
			let vout = match htlc.transaction_output_index {
				Some(idx) => idx,
				None => continue,
			};
			let htlc_redeemscript = commitment::get_htlc_redeemscript(htlc, &tx_keys);
			debug_assert_eq!(commit_tx.output[vout as usize].script_pubkey, htlc_redeemscript.to_v0_p2wsh());
			let outpoint = BitcoinOutPoint { txid, vout };
			let value = htlc.amount_msat / 1000;
			if htlc.offered {
				// They offered it; with the preimage it is ours on sight.
				let preimage = match preimages.get(&htlc.payment_hash) {
					Some(preimage) => preimage,
					None => continue,
				};
				if let Some(mut tx) = build_claim_tx(outpoint, value, WEIGHT_OFFERED_HTLC, feerate_per_kw, destination, Sequence::MAX, 0) {
					let sig = sign_input(secp_ctx, &tx, &htlc_redeemscript, value, &htlc_key);
					tx.input[0].witness.push(sig);
					tx.input[0].witness.push(preimage.0.to_vec());
					tx.input[0].witness.push(htlc_redeemscript.as_bytes().to_vec());
					claim_htlc_success_txs.push(tx);
				}
			} else {
				// We offered it; it comes back to us once its CLTV has passed.
				if let Some(mut tx) = build_claim_tx(outpoint, value, WEIGHT_RECEIVED_HTLC, feerate_per_kw, destination, Sequence::ZERO, htlc.cltv_expiry) {
					let sig = sign_input(secp_ctx, &tx, &htlc_redeemscript, value, &htlc_key);
					tx.input[0].witness.push(sig);
					tx.input[0].witness.push(Vec::new());
					tx.input[0].witness.push(htlc_redeemscript.as_bytes().to_vec());
					claim_htlc_timeout_txs.push(tx);
				}
			}
		}

		RemoteCommitPublished {
			commit_tx,
			claim_main_tx,
			claim_htlc_success_txs,
			claim_htlc_timeout_txs,
			irrevocably_spent: Vec::new(),
		}
	}

	/// All claim transactions to hand to the broadcaster.
	pub fn txs_to_broadcast(&self) -> Vec<&Transaction> {
		let mut txs = Vec::new();
		if let Some(ref tx) = self.claim_main_tx { txs.push(tx); }
		txs.extend(self.claim_htlc_success_txs.iter());
		txs.extend(self.claim_htlc_timeout_txs.iter());
		txs
	}
}

/// The claim set produced when the counterparty publishes a commitment they already revoked:
/// every output is swept through the revocation path, balance and HTLCs alike.
#[derive(Clone, Debug, PartialEq)]
pub struct RevokedCommitPublished {
	/// The revoked commitment transaction as seen on-chain.
	pub commit_tx: Transaction,
	/// The commitment number extracted from the obscured locktime/sequence.
	pub commitment_number: u64,
	/// Penalty spends of their main output and every recognizable HTLC output.
	pub penalty_txs: Vec<Transaction>,
	/// Immediate spend of our own P2WPKH output, if present.
	pub claim_main_tx: Option<Transaction>,
	/// Outpoints of `commit_tx` whose spend has reached the configured depth.
	pub irrevocably_spent: Vec<BitcoinOutPoint>,
}

impl_writeable!(RevokedCommitPublished, {
	commit_tx,
	commitment_number,
	penalty_txs,
	claim_main_tx,
	irrevocably_spent
});

/// Recovers the commitment number a commitment transaction commits to in its obscured
/// locktime/sequence form.
pub fn extract_commitment_number(tx: &Transaction, commitment_number_obscure_factor: u64) -> u64 {
	let obscured = ((tx.input[0].sequence.0 as u64 & 0xffffff) << 24) | (tx.lock_time.0 as u64 & 0xffffff);
	obscured ^ commitment_number_obscure_factor
}

impl RevokedCommitPublished {
	/// Builds penalty claims for a revoked commitment, given the per-commitment secret the
	/// counterparty released for it and the HTLC hash/expiry set recorded when we signed it.
	///
	/// This is attempted no matter how many blocks behind discovery is: the penalty path has no
	/// CSV and wins any race the cheater has not already finished.
	pub fn build<T: secp256k1::Signing + secp256k1::Verification>(
		secp_ctx: &Secp256k1<T>, keys: &ChannelKeys, commit_tx: Transaction, commitment_number: u64,
		per_commitment_secret: &[u8; 32], remote_pubkeys: &ChannelPublicKeys, contest_delay_theirs: u16,
		htlc_infos: &[HtlcInfo], feerate_per_kw: u32, destination: &Script,
	) -> Result<RevokedCommitPublished, secp256k1::Error> {
		let local_pubkeys = keys.pubkeys(secp_ctx);
		let per_commitment_key = SecretKey::from_slice(per_commitment_secret)?;
		let per_commitment_point = PublicKey::from_secret_key(secp_ctx, &per_commitment_key);

		let revocation_key = chan_keys::derive_private_revocation_key(secp_ctx, &per_commitment_key, &keys.revocation_base_key)?;
		let revocation_pubkey = chan_keys::derive_public_revocation_key(secp_ctx, &per_commitment_point, &local_pubkeys.revocation_basepoint)?;
		let their_delayed_key = chan_keys::derive_public_key(secp_ctx, &per_commitment_point, &remote_pubkeys.delayed_payment_basepoint)?;
		let their_htlc_key = chan_keys::derive_public_key(secp_ctx, &per_commitment_point, &remote_pubkeys.htlc_basepoint)?;
		let our_htlc_key = chan_keys::derive_public_key(secp_ctx, &per_commitment_point, &local_pubkeys.htlc_basepoint)?;
		let txid = commit_tx.txid();

		// Their main output: revocation branch of the revokeable script.
		let to_local_script = commitment::get_revokeable_redeemscript(&revocation_pubkey, contest_delay_theirs, &their_delayed_key);
		let to_local_p2wsh = to_local_script.to_v0_p2wsh();

		// Every possible HTLC script on their commitment, in both directions, so outputs can be
		// matched without knowing which side each hash belonged to.
		let mut htlc_scripts: Vec<(Script, Script, u64)> = Vec::with_capacity(htlc_infos.len() * 2);
		for info in htlc_infos.iter() {
			for offered in [true, false].iter() {
				let htlc = HTLCOutputInCommitment {
					offered: *offered,
					amount_msat: 0,
					cltv_expiry: info.cltv_expiry,
					payment_hash: info.payment_hash,
					htlc_id: 0,
					transaction_output_index: None,
				};
				let script = commitment::get_htlc_redeemscript_with_explicit_keys(&htlc, &their_htlc_key, &our_htlc_key, &revocation_pubkey);
				let weight = if *offered { WEIGHT_REVOKED_OFFERED_HTLC } else { WEIGHT_REVOKED_RECEIVED_HTLC };
				htlc_scripts.push((script.to_v0_p2wsh(), script, weight));
			}
		}

		let our_main_script = commitment::get_to_remote_script(&local_pubkeys.payment_point);

		let mut penalty_txs = Vec::new();
		let mut claim_main_tx = None;
		for (idx, out) in commit_tx.output.iter().enumerate() {
			let outpoint = BitcoinOutPoint { txid, vout: idx as u32 };
			if out.script_pubkey == to_local_p2wsh {
				if let Some(mut tx) = build_claim_tx(outpoint, out.value, WEIGHT_REVOKED_OUTPUT, feerate_per_kw, destination, Sequence::MAX, 0) {
					let sig = sign_input(secp_ctx, &tx, &to_local_script, out.value, &revocation_key);
					tx.input[0].witness.push(sig);
					tx.input[0].witness.push(vec![1]);
					tx.input[0].witness.push(to_local_script.as_bytes().to_vec());
					penalty_txs.push(tx);
				}
			} else if out.script_pubkey == our_main_script {
				if let Some(mut tx) = build_claim_tx(outpoint, out.value, WEIGHT_P2WPKH_OUTPUT, feerate_per_kw, destination, Sequence::MAX, 0) {
					let script_code = Script::new_p2pkh(&bitcoin::PublicKey::new(local_pubkeys.payment_point).pubkey_hash());
					let sig = sign_input(secp_ctx, &tx, &script_code, out.value, &keys.payment_key);
					tx.input[0].witness.push(sig);
					tx.input[0].witness.push(local_pubkeys.payment_point.serialize().to_vec());
					claim_main_tx = Some(tx);
				}
			} else if let Some(entry) = htlc_scripts.iter().find(|entry| entry.0 == out.script_pubkey) {
				let script = &entry.1;
				let weight = entry.2;
				if let Some(mut tx) = build_claim_tx(outpoint, out.value, weight, feerate_per_kw, destination, Sequence::MAX, 0) {
					let sig = sign_input(secp_ctx, &tx, script, out.value, &revocation_key);
					tx.input[0].witness.push(sig);
					tx.input[0].witness.push(revocation_pubkey.serialize().to_vec());
					tx.input[0].witness.push(script.as_bytes().to_vec());
					penalty_txs.push(tx);
				}
			}
		}

		Ok(RevokedCommitPublished {
			commit_tx,
			commitment_number,
			penalty_txs,
			claim_main_tx,
			irrevocably_spent: Vec::new(),
		})
	}

	/// All penalty and claim transactions to hand to the broadcaster.
	pub fn txs_to_broadcast(&self) -> Vec<&Transaction> {
		let mut txs: Vec<&Transaction> = self.penalty_txs.iter().collect();
		if let Some(ref tx) = self.claim_main_tx { txs.push(tx); }
		txs
	}

	/// Rebuilds the penalty transactions at a higher feerate, used to keep outbidding the
	/// cheater until the sweep confirms.
	pub fn bump_feerate<T: secp256k1::Signing + secp256k1::Verification>(
		&self, secp_ctx: &Secp256k1<T>, keys: &ChannelKeys, per_commitment_secret: &[u8; 32],
		remote_pubkeys: &ChannelPublicKeys, contest_delay_theirs: u16, htlc_infos: &[HtlcInfo],
		new_feerate_per_kw: u32, destination: &Script,
	) -> Result<RevokedCommitPublished, secp256k1::Error> {
		let mut rebuilt = RevokedCommitPublished::build(
			secp_ctx, keys, self.commit_tx.clone(), self.commitment_number, per_commitment_secret,
			remote_pubkeys, contest_delay_theirs, htlc_infos, new_feerate_per_kw, destination,
		)?;
		rebuilt.irrevocably_spent = self.irrevocably_spent.clone();
		// Already-settled outputs don't need a fresh claim.
		let irrevocably_spent = rebuilt.irrevocably_spent.clone();
		rebuilt.penalty_txs.retain(|tx| !irrevocably_spent.contains(&tx.input[0].previous_output));
		Ok(rebuilt)
	}
}

impl Writeable for Vec<Transaction> {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
		(self.len() as u16).write(w)?;
		for tx in self.iter() {
			tx.write(w)?;
		}
		Ok(())
	}
}
impl Readable for Vec<Transaction> {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let len: u16 = Readable::read(r)?;
		let mut ret = Vec::with_capacity(::std::cmp::min(len as usize, 1024));
		for _ in 0..len {
			ret.push(Readable::read(r)?);
		}
		Ok(ret)
	}
}

impl Writeable for Vec<BitcoinOutPoint> {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
		(self.len() as u16).write(w)?;
		for o in self.iter() {
			o.txid.write(w)?;
			o.vout.write(w)?;
		}
		Ok(())
	}
}
impl Readable for Vec<BitcoinOutPoint> {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let len: u16 = Readable::read(r)?;
		let mut ret = Vec::with_capacity(::std::cmp::min(len as usize, 1024));
		for _ in 0..len {
			let txid: Txid = Readable::read(r)?;
			let vout: u32 = Readable::read(r)?;
			ret.push(BitcoinOutPoint { txid, vout });
		}
		Ok(ret)
	}
}
