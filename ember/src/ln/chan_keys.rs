// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Key derivation for channels: the per-commitment secret chain, the per-commitment tweaks
//! applied to every base key, the blinded revocation keys, and the compact storage scheme for
//! the counterparty's released secrets.

use bitcoin::hashes::{Hash, HashEngine};
use bitcoin::hashes::sha256::Hash as Sha256;

use bitcoin::secp256k1::{self, Scalar, Secp256k1, SecretKey, PublicKey};
use bitcoin::secp256k1::Error as SecpError;

use crate::ln::msgs::DecodeError;
use crate::util::byte_utils;
use crate::util::ser::{Readable, Writeable, Writer};

use std::io::Read;

/// The per-commitment secret index used for commitment number 0. Commitment numbers count up;
/// their secret indices count down from here, so that a single released secret compactly commits
/// to all earlier ones per the BOLT 3 storage scheme.
pub const FIRST_COMMITMENT_SECRET_INDEX: u64 = (1 << 48) - 1;

/// The secret-chain index for a given (monotone increasing) commitment number.
#[inline]
pub fn secret_index(commitment_number: u64) -> u64 {
	assert!(commitment_number <= FIRST_COMMITMENT_SECRET_INDEX);
	FIRST_COMMITMENT_SECRET_INDEX - commitment_number
}

/// Build the commitment secret from the seed and the secret-chain index
pub fn build_commitment_secret(commitment_seed: &[u8; 32], idx: u64) -> [u8; 32] {
	let mut res: [u8; 32] = commitment_seed.clone();
	for i in 0..48 {
		let bitpos = 47 - i;
		if idx & (1 << bitpos) == (1 << bitpos) {
			res[bitpos / 8] ^= 1 << (bitpos & 7);
			res = Sha256::hash(&res).into_inner();
		}
	}
	res
}

/// Derives a per-commitment-transaction private key (eg an htlc key or delayed_payment key)
/// from the base secret and the per_commitment_point.
///
/// Note that this is infallible iff we trust that at least one of the two input keys are randomly
/// generated (ie our own).
pub fn derive_private_key<T: secp256k1::Signing>(secp_ctx: &Secp256k1<T>, per_commitment_point: &PublicKey, base_secret: &SecretKey) -> Result<SecretKey, SecpError> {
	let mut sha = Sha256::engine();
	sha.input(&per_commitment_point.serialize());
	sha.input(&PublicKey::from_secret_key(&secp_ctx, &base_secret).serialize());
	let res = Sha256::from_engine(sha).into_inner();

	base_secret.clone().add_tweak(&Scalar::from_be_bytes(res).unwrap())
}

/// Derives a per-commitment-transaction public key (eg an htlc key or a delayed_payment key)
/// from the base point and the per_commitment_point. This is the public equivalent of
/// derive_private_key - using only public keys to derive a public key instead of private keys.
pub fn derive_public_key<T: secp256k1::Signing>(secp_ctx: &Secp256k1<T>, per_commitment_point: &PublicKey, base_point: &PublicKey) -> Result<PublicKey, SecpError> {
	let mut sha = Sha256::engine();
	sha.input(&per_commitment_point.serialize());
	sha.input(&base_point.serialize());
	let res = Sha256::from_engine(sha).into_inner();

	let hashkey = PublicKey::from_secret_key(&secp_ctx, &SecretKey::from_slice(&res)?);
	base_point.combine(&hashkey)
}

/// Derives a per-commitment-transaction revocation secret from the counterparty's revocation
/// basepoint secret and our released per-commitment secret.
///
/// Only the cheating participant owns a valid witness to propagate a revoked commitment
/// transaction, thus per_commitment_secret always comes from the cheater and
/// countersignatory_revocation_base_secret always comes from the punisher, who is the broadcaster
/// of the transaction spending with this key knowledge.
pub fn derive_private_revocation_key<T: secp256k1::Signing>(secp_ctx: &Secp256k1<T>, per_commitment_secret: &SecretKey, countersignatory_revocation_base_secret: &SecretKey) -> Result<SecretKey, SecpError> {
	let countersignatory_revocation_base_point = PublicKey::from_secret_key(&secp_ctx, &countersignatory_revocation_base_secret);
	let per_commitment_point = PublicKey::from_secret_key(&secp_ctx, &per_commitment_secret);

	let rev_append_commit_hash_key = {
		let mut sha = Sha256::engine();
		sha.input(&countersignatory_revocation_base_point.serialize());
		sha.input(&per_commitment_point.serialize());

		Sha256::from_engine(sha).into_inner()
	};
	let commit_append_rev_hash_key = {
		let mut sha = Sha256::engine();
		sha.input(&per_commitment_point.serialize());
		sha.input(&countersignatory_revocation_base_point.serialize());

		Sha256::from_engine(sha).into_inner()
	};

	let countersignatory_contrib = countersignatory_revocation_base_secret.clone()
		.mul_tweak(&Scalar::from_be_bytes(rev_append_commit_hash_key).unwrap())?;
	let broadcaster_contrib = per_commitment_secret.clone()
		.mul_tweak(&Scalar::from_be_bytes(commit_append_rev_hash_key).unwrap())?;
	countersignatory_contrib.add_tweak(&Scalar::from_be_bytes(broadcaster_contrib.secret_bytes()).unwrap())
}

/// Derives a per-commitment-transaction revocation public key from its constituent parts. This is
/// the public equivalent of derive_private_revocation_key - using only public keys to derive a
/// public key instead of private keys.
pub fn derive_public_revocation_key<T: secp256k1::Verification>(secp_ctx: &Secp256k1<T>, per_commitment_point: &PublicKey, countersignatory_revocation_base_point: &PublicKey) -> Result<PublicKey, SecpError> {
	let rev_append_commit_hash_key = {
		let mut sha = Sha256::engine();
		sha.input(&countersignatory_revocation_base_point.serialize());
		sha.input(&per_commitment_point.serialize());

		Sha256::from_engine(sha).into_inner()
	};
	let commit_append_rev_hash_key = {
		let mut sha = Sha256::engine();
		sha.input(&per_commitment_point.serialize());
		sha.input(&countersignatory_revocation_base_point.serialize());

		Sha256::from_engine(sha).into_inner()
	};

	let countersignatory_contrib = countersignatory_revocation_base_point
		.mul_tweak(&secp_ctx, &Scalar::from_be_bytes(rev_append_commit_hash_key).unwrap())?;
	let broadcaster_contrib = per_commitment_point
		.mul_tweak(&secp_ctx, &Scalar::from_be_bytes(commit_append_rev_hash_key).unwrap())?;
	countersignatory_contrib.combine(&broadcaster_contrib)
}

/// One counterparty's public keys which do not change over the life of a channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelPublicKeys {
	/// The public key which is used to sign all commitment transactions, as it appears in the
	/// on-chain channel lock-in 2-of-2 multisig output.
	pub funding_pubkey: PublicKey,
	/// The base point which is used (with derive_public_revocation_key) to derive per-commitment
	/// revocation keys. This is combined with the per-commitment-secret generated by the
	/// counterparty to create a secret which the counterparty can reveal to revoke previous
	/// states.
	pub revocation_basepoint: PublicKey,
	/// The public key on which the non-broadcaster (ie the countersignatory) receives an
	/// immediately spendable primary channel balance on the broadcaster's commitment transaction.
	/// This key is static across every commitment transaction.
	pub payment_point: PublicKey,
	/// The base point which is used (with derive_public_key) to derive a per-commitment payment
	/// public key which receives non-HTLC-encumbered funds which are only available for spending
	/// after some delay (or can be claimed via the revocation path).
	pub delayed_payment_basepoint: PublicKey,
	/// The base point which is used (with derive_public_key) to derive a per-commitment public key
	/// which is used to encumber HTLC-in-flight outputs.
	pub htlc_basepoint: PublicKey,
}

impl_writeable!(ChannelPublicKeys, {
	funding_pubkey,
	revocation_basepoint,
	payment_point,
	delayed_payment_basepoint,
	htlc_basepoint
});

/// The set of public keys which are used in the creation of one commitment transaction.
/// These are derived from the channel base keys and per-commitment data.
///
/// A broadcaster key is provided from potential broadcaster of the computed transaction.
/// A countersignatory key is coming from a protocol participant unable to broadcast the
/// transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct TxCreationKeys {
	/// The broadcaster's per-commitment public key which was used to derive the other keys.
	pub per_commitment_point: PublicKey,
	/// The revocation key which is used to allow the broadcaster of the commitment
	/// transaction to provide their counterparty the ability to punish them if they broadcast
	/// an old state.
	pub revocation_key: PublicKey,
	/// Broadcaster's HTLC Key
	pub broadcaster_htlc_key: PublicKey,
	/// Countersignatory's HTLC Key
	pub countersignatory_htlc_key: PublicKey,
	/// Broadcaster's Payment Key (which isn't allowed to be spent from for some delay)
	pub broadcaster_delayed_payment_key: PublicKey,
}

impl_writeable!(TxCreationKeys, {
	per_commitment_point,
	revocation_key,
	broadcaster_htlc_key,
	countersignatory_htlc_key,
	broadcaster_delayed_payment_key
});

impl TxCreationKeys {
	/// Create per-commitment keys from channel base points and the per-commitment point
	pub fn derive_new<T: secp256k1::Signing + secp256k1::Verification>(secp_ctx: &Secp256k1<T>, per_commitment_point: &PublicKey, broadcaster_delayed_payment_base: &PublicKey, broadcaster_htlc_base: &PublicKey, countersignatory_revocation_base: &PublicKey, countersignatory_htlc_base: &PublicKey) -> Result<TxCreationKeys, SecpError> {
		Ok(TxCreationKeys {
			per_commitment_point: per_commitment_point.clone(),
			revocation_key: derive_public_revocation_key(&secp_ctx, &per_commitment_point, &countersignatory_revocation_base)?,
			broadcaster_htlc_key: derive_public_key(&secp_ctx, &per_commitment_point, &broadcaster_htlc_base)?,
			countersignatory_htlc_key: derive_public_key(&secp_ctx, &per_commitment_point, &countersignatory_htlc_base)?,
			broadcaster_delayed_payment_key: derive_public_key(&secp_ctx, &per_commitment_point, &broadcaster_delayed_payment_base)?,
		})
	}

	/// Generate per-commitment keys for the broadcaster of a commitment from both parties' static
	/// channel keys.
	pub fn from_channel_static_keys<T: secp256k1::Signing + secp256k1::Verification>(per_commitment_point: &PublicKey, broadcaster_keys: &ChannelPublicKeys, countersignatory_keys: &ChannelPublicKeys, secp_ctx: &Secp256k1<T>) -> Result<TxCreationKeys, SecpError> {
		TxCreationKeys::derive_new(
			&secp_ctx,
			&per_commitment_point,
			&broadcaster_keys.delayed_payment_basepoint,
			&broadcaster_keys.htlc_basepoint,
			&countersignatory_keys.revocation_basepoint,
			&countersignatory_keys.htlc_basepoint,
		)
	}
}

/// The secret key material backing one side of a channel, derived deterministically from the
/// node's seed and a per-channel counter.
#[derive(Clone, PartialEq, Debug)]
pub struct ChannelKeys {
	/// Private key of our node secret, used for signing the funding transaction's 2-of-2 input
	pub funding_key: SecretKey,
	/// Local secret key for blinded revocation pubkey
	pub revocation_base_key: SecretKey,
	/// Local secret key used for our balance in counterparty-broadcast commitment transactions
	pub payment_key: SecretKey,
	/// Local secret key used in commitment tx htlc outputs
	pub delayed_payment_base_key: SecretKey,
	/// Local htlc secret key used in commitment tx htlc outputs
	pub htlc_base_key: SecretKey,
	/// Commitment seed from which every per-commitment secret of ours is derived
	pub commitment_seed: [u8; 32],
}

impl ChannelKeys {
	/// Derives a channel's key set from the node seed and a monotone per-channel counter. The
	/// same (seed, counter) pair always yields the same keys, so a restarted node recovers its
	/// channel keys from persisted counters alone.
	pub fn derive_from_seed(node_seed: &[u8; 32], channel_counter: u64) -> ChannelKeys {
		macro_rules! key_step {
			($label: expr) => {{
				let mut sha = Sha256::engine();
				sha.input(node_seed);
				sha.input(&byte_utils::be64_to_array(channel_counter));
				sha.input($label);
				// A SHA256 of distinct inputs is out of range of the curve order with negligible
				// probability, and never for the fixed labels used here.
				SecretKey::from_slice(&Sha256::from_engine(sha).into_inner())
					.expect("SHA256 output out of curve order")
			}}
		}
		let commitment_seed = {
			let mut sha = Sha256::engine();
			sha.input(node_seed);
			sha.input(&byte_utils::be64_to_array(channel_counter));
			sha.input(b"commitment seed");
			Sha256::from_engine(sha).into_inner()
		};
		ChannelKeys {
			funding_key: key_step!(b"funding key"),
			revocation_base_key: key_step!(b"revocation base key"),
			payment_key: key_step!(b"payment key"),
			delayed_payment_base_key: key_step!(b"delayed payment base key"),
			htlc_base_key: key_step!(b"HTLC base key"),
			commitment_seed,
		}
	}

	/// The public counterparts of our base keys, as sent to the peer during the handshake.
	pub fn pubkeys<T: secp256k1::Signing>(&self, secp_ctx: &Secp256k1<T>) -> ChannelPublicKeys {
		ChannelPublicKeys {
			funding_pubkey: PublicKey::from_secret_key(secp_ctx, &self.funding_key),
			revocation_basepoint: PublicKey::from_secret_key(secp_ctx, &self.revocation_base_key),
			payment_point: PublicKey::from_secret_key(secp_ctx, &self.payment_key),
			delayed_payment_basepoint: PublicKey::from_secret_key(secp_ctx, &self.delayed_payment_base_key),
			htlc_basepoint: PublicKey::from_secret_key(secp_ctx, &self.htlc_base_key),
		}
	}

	/// Our per-commitment secret for the given (monotone increasing) commitment number.
	///
	/// Releasing this revokes the commitment; it must never leave the channel before the
	/// replacement commitment is signed by the peer and persisted.
	pub fn commitment_secret(&self, commitment_number: u64) -> [u8; 32] {
		build_commitment_secret(&self.commitment_seed, secret_index(commitment_number))
	}

	/// Our per-commitment point for the given commitment number.
	pub fn commitment_point<T: secp256k1::Signing>(&self, secp_ctx: &Secp256k1<T>, commitment_number: u64) -> PublicKey {
		let secret = SecretKey::from_slice(&self.commitment_secret(commitment_number))
			.expect("commitment secret chain output out of curve order");
		PublicKey::from_secret_key(secp_ctx, &secret)
	}
}

impl_writeable!(ChannelKeys, {
	funding_key,
	revocation_base_key,
	payment_key,
	delayed_payment_base_key,
	htlc_base_key,
	commitment_seed
});

/// Implements the per-commitment secret storage scheme from
/// [BOLT 3](https://github.com/lightning/bolts/blob/master/03-transactions.md#efficient-per-commitment-secret-storage).
///
/// Allows us to keep track of all of the revocation secrets of our counterparty in just 50*32
/// bytes or so.
#[derive(Clone)]
pub struct CounterpartyCommitmentSecrets {
	old_secrets: [([u8; 32], u64); 49],
}

impl PartialEq for CounterpartyCommitmentSecrets {
	fn eq(&self, other: &Self) -> bool {
		for (&(ref secret, ref idx), &(ref o_secret, ref o_idx)) in self.old_secrets.iter().zip(other.old_secrets.iter()) {
			if secret != o_secret || idx != o_idx {
				return false
			}
		}
		true
	}
}

impl CounterpartyCommitmentSecrets {
	/// Creates a new empty `CounterpartyCommitmentSecrets` structure.
	pub fn new() -> Self {
		Self { old_secrets: [([0; 32], 1 << 48); 49] }
	}

	#[inline]
	fn place_secret(idx: u64) -> u8 {
		for i in 0..48 {
			if idx & (1 << i) == (1 << i) {
				return i
			}
		}
		48
	}

	/// Returns the minimum secret-chain index we've received a secret for.
	pub fn get_min_seen_secret(&self) -> u64 {
		let mut min = 1 << 48;
		for &(_, idx) in self.old_secrets.iter() {
			if idx < min {
				min = idx;
			}
		}
		min
	}

	#[inline]
	fn derive_secret(secret: [u8; 32], bits: u8, idx: u64) -> [u8; 32] {
		let mut res: [u8; 32] = secret;
		for i in 0..bits {
			let bitpos = bits - 1 - i;
			if idx & (1 << bitpos) == (1 << bitpos) {
				res[(bitpos / 8) as usize] ^= 1 << (bitpos & 7);
				res = Sha256::hash(&res).into_inner();
			}
		}
		res
	}

	/// Inserts the `secret` at secret-chain index `idx`. Returns `Ok(())` if the secret could be
	/// derived from previously held secrets, `Err` if the peer cheated and the chain is
	/// inconsistent.
	pub fn provide_secret(&mut self, idx: u64, secret: [u8; 32]) -> Result<(), ()> {
		let pos = Self::place_secret(idx);
		for i in 0..pos {
			let (old_secret, old_idx) = self.old_secrets[i as usize];
			if Self::derive_secret(secret, pos, old_idx) != old_secret {
				return Err(());
			}
		}
		if self.get_min_seen_secret() <= idx {
			return Ok(());
		}
		self.old_secrets[pos as usize] = (secret, idx);
		Ok(())
	}

	/// Returns the secret at the given secret-chain index, or `None` if `idx` is below
	/// `get_min_seen_secret` and the secret therefore unknown.
	pub fn get_secret(&self, idx: u64) -> Option<[u8; 32]> {
		for i in 0..self.old_secrets.len() {
			if (idx & (!((1 << i) - 1))) == self.old_secrets[i].1 {
				return Some(Self::derive_secret(self.old_secrets[i].0, i as u8, idx))
			}
		}
		assert!(idx < self.get_min_seen_secret());
		None
	}
}

impl Writeable for CounterpartyCommitmentSecrets {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), ::std::io::Error> {
		for &(ref secret, ref idx) in self.old_secrets.iter() {
			writer.write_all(secret)?;
			writer.write_all(&byte_utils::be64_to_array(*idx))?;
		}
		Ok(())
	}
}
impl Readable for CounterpartyCommitmentSecrets {
	fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
		let mut old_secrets = [([0; 32], 1 << 48); 49];
		for &mut (ref mut secret, ref mut idx) in old_secrets.iter_mut() {
			*secret = Readable::read(reader)?;
			*idx = Readable::read(reader)?;
		}

		Ok(Self { old_secrets })
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use bitcoin::secp256k1::Secp256k1;
	use hex;

	#[test]
	fn per_commitment_storage_vectors() {
		// The "insert_secret correct sequence" test vector from BOLT 3.
		let mut secrets: Vec<[u8; 32]> = Vec::new();
		let mut monitor = CounterpartyCommitmentSecrets::new();

		macro_rules! test_secrets {
			() => {
				let mut idx = 281474976710655;
				for secret in secrets.iter() {
					assert_eq!(monitor.get_secret(idx).unwrap(), *secret);
					idx -= 1;
				}
				assert_eq!(monitor.get_min_seen_secret(), idx + 1);
				assert!(monitor.get_secret(idx).is_none());
			};
		}

		for hex_secret in [
			"7cc854b54e3e0dcdb010d7a3fee464a9687be6e8db3be6854c475621e007a5dc",
			"c7518c8ae4660ed02894df8976fa1a3659c1a8b4b5bec0c4b872abeba4cb8964",
			"2273e227a5b7449b6e70f1fb4652864038b1cbf9cd7c043a7d6456b7fc275ad8",
			"27cddaa5624534cb6cb9d7da077cf2b22ab21e9b506fd4998a51d54502e99116",
			"c65716add7aa98ba7acb236352d665cab17345fe45b55fb879ff80e6bd0c41dd",
			"969660042a28f32d9be17344e09374b379962d03db1574df5a8a5a47e19ce3f2",
			"a5a64476122ca0925fb344bdc1854c1c0a59fc614298e50a33e331980a220f32",
			"05cde6323d949933f7f7b78776bcc1ea6d9b31447732e3802e1f7ac44b650e17",
		].iter() {
			let mut secret = [0; 32];
			secret[0..32].clone_from_slice(&hex::decode(hex_secret).unwrap());
			let idx = 281474976710655 - secrets.len() as u64;
			secrets.push(secret);
			monitor.provide_secret(idx, secret).unwrap();
			test_secrets!();
		}
	}

	#[test]
	fn per_commitment_storage_rejects_inconsistent_secrets() {
		// "insert_secret #1 incorrect" from BOLT 3.
		let mut monitor = CounterpartyCommitmentSecrets::new();

		let mut secret = [0; 32];
		secret[0..32].clone_from_slice(&hex::decode("02a40c85b6f28da08dfdbe0926c53fab2de6d28c10301f8f7c4073d5e42e3148").unwrap());
		monitor.provide_secret(281474976710655, secret).unwrap();

		secret[0..32].clone_from_slice(&hex::decode("c7518c8ae4660ed02894df8976fa1a3659c1a8b4b5bec0c4b872abeba4cb8964").unwrap());
		assert!(monitor.provide_secret(281474976710654, secret).is_err());
	}

	#[test]
	fn derived_keys_are_consistent() {
		// The pubkey of a tweaked private key must equal the tweaked pubkey.
		let secp_ctx = Secp256k1::new();
		let base_secret = SecretKey::from_slice(&[41; 32]).unwrap();
		let per_commitment_secret = SecretKey::from_slice(&[42; 32]).unwrap();
		let base_point = PublicKey::from_secret_key(&secp_ctx, &base_secret);
		let per_commitment_point = PublicKey::from_secret_key(&secp_ctx, &per_commitment_secret);

		let derived_secret = derive_private_key(&secp_ctx, &per_commitment_point, &base_secret).unwrap();
		let derived_point = derive_public_key(&secp_ctx, &per_commitment_point, &base_point).unwrap();
		assert_eq!(PublicKey::from_secret_key(&secp_ctx, &derived_secret), derived_point);

		let rev_secret = derive_private_revocation_key(&secp_ctx, &per_commitment_secret, &base_secret).unwrap();
		let rev_point = derive_public_revocation_key(&secp_ctx, &per_commitment_point, &base_point).unwrap();
		assert_eq!(PublicKey::from_secret_key(&secp_ctx, &rev_secret), rev_point);
	}

	#[test]
	fn channel_keys_are_deterministic() {
		let secp_ctx = Secp256k1::new();
		let keys_a = ChannelKeys::derive_from_seed(&[7; 32], 3);
		let keys_b = ChannelKeys::derive_from_seed(&[7; 32], 3);
		assert_eq!(keys_a, keys_b);
		assert_eq!(keys_a.pubkeys(&secp_ctx), keys_b.pubkeys(&secp_ctx));
		assert_ne!(keys_a, ChannelKeys::derive_from_seed(&[7; 32], 4));

		// The commitment point for a number must match the point of its secret.
		let secret = SecretKey::from_slice(&keys_a.commitment_secret(0)).unwrap();
		assert_eq!(PublicKey::from_secret_key(&secp_ctx, &secret), keys_a.commitment_point(&secp_ctx, 0));
		assert_ne!(keys_a.commitment_point(&secp_ctx, 0), keys_a.commitment_point(&secp_ctx, 1));
	}
}
