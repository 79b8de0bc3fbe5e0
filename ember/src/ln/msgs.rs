// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Wire messages, traits representing wire message handlers, and a few error types live here.
//!
//! For a normal node you probably don't need to use the wire module types directly: the channel
//! state machine consumes and produces them through [`crate::ln::channel::ChannelEvent`] and
//! [`crate::ln::channel::ChannelAction`]. The peer connection manager frames them on and off the
//! socket with [`Message::read`] and [`Message::write`].

use bitcoin::hash_types::{BlockHash, Txid};
use bitcoin::blockdata::script::Script;
use bitcoin::secp256k1::PublicKey;
use bitcoin::secp256k1::ecdsa::Signature;

use crate::ln::{ChannelId, PaymentHash, PaymentPreimage};
use crate::util::ser::{Readable, Writeable, Writer};

use std::fmt;
use std::io::{self, Read};

/// An error in decoding a message or struct.
#[derive(Debug, PartialEq)]
pub enum DecodeError {
	/// A version byte specified something we don't know how to handle.
	/// Includes unknown realm byte in an OnionHopData packet
	UnknownVersion,
	/// Unknown feature mandating we fail to parse message (eg TLV with an even, unknown type)
	UnknownRequiredFeature,
	/// Value was invalid, eg a byte which was supposed to be a bool was something other than a 0
	/// or 1, a public key/private key/signature was invalid, text wasn't UTF-8, etc
	InvalidValue,
	/// Buffer too short
	ShortRead,
	/// A length descriptor in the packet didn't describe the later data correctly
	BadLengthDescriptor,
	/// Error from std::io
	Io(io::ErrorKind),
}

impl fmt::Display for DecodeError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			DecodeError::UnknownVersion => f.write_str("Unknown realm byte in Onion packet"),
			DecodeError::UnknownRequiredFeature => f.write_str("Unknown required feature preventing decode"),
			DecodeError::InvalidValue => f.write_str("Nonsense bytes didn't map to the type they were interpreted as"),
			DecodeError::ShortRead => f.write_str("Packet extended beyond the provided bytes"),
			DecodeError::BadLengthDescriptor => f.write_str("A length descriptor in the packet didn't describe the later data correctly"),
			DecodeError::Io(ref e) => write!(f, "io error: {:?}", e),
		}
	}
}

impl ::std::error::Error for DecodeError {}

impl From<io::Error> for DecodeError {
	fn from(e: io::Error) -> Self {
		if e.kind() == io::ErrorKind::UnexpectedEof {
			DecodeError::ShortRead
		} else {
			DecodeError::Io(e.kind())
		}
	}
}

/// An open_channel message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct OpenChannel {
	/// The genesis hash of the blockchain where the channel is to be opened
	pub chain_hash: BlockHash,
	/// A temporary channel ID, until the funding outpoint is announced
	pub temporary_channel_id: ChannelId,
	/// The channel value
	pub funding_satoshis: u64,
	/// The amount to push to the counterparty as part of the open, in millisatoshi
	pub push_msat: u64,
	/// The threshold below which outputs on transactions broadcast by sender will be omitted
	pub dust_limit_satoshis: u64,
	/// The maximum inbound HTLC value in flight towards sender, in milli-satoshi
	pub max_htlc_value_in_flight_msat: u64,
	/// The minimum value unencumbered by HTLCs for the counterparty to keep in the channel
	pub channel_reserve_satoshis: u64,
	/// The minimum HTLC size incoming to sender, in milli-satoshi
	pub htlc_minimum_msat: u64,
	/// The feerate per 1000-weight of sender generated transactions, until updated by update_fee
	pub feerate_per_kw: u32,
	/// The number of blocks which the counterparty will have to wait to claim on-chain funds if
	/// they broadcast a commitment transaction
	pub to_self_delay: u16,
	/// The maximum number of inbound HTLCs towards sender
	pub max_accepted_htlcs: u16,
	/// The sender's key controlling the funding transaction
	pub funding_pubkey: PublicKey,
	/// Used to derive a revocation key for transactions broadcast by counterparty
	pub revocation_basepoint: PublicKey,
	/// The key to which the non-broadcaster's balance is paid on the broadcaster's commitments
	pub payment_point: PublicKey,
	/// Used to derive a payment key to sender for transactions broadcast by sender
	pub delayed_payment_basepoint: PublicKey,
	/// Used to derive an HTLC payment key to sender
	pub htlc_basepoint: PublicKey,
	/// The first to-be-broadcast-by-sender transaction's per commitment point
	pub first_per_commitment_point: PublicKey,
	/// Channel flags; only the low bit (announce_channel) is defined
	pub channel_flags: u8,
}

/// An accept_channel message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct AcceptChannel {
	/// The same temporary channel ID as given in the open_channel
	pub temporary_channel_id: ChannelId,
	/// The threshold below which outputs on transactions broadcast by sender will be omitted
	pub dust_limit_satoshis: u64,
	/// The maximum inbound HTLC value in flight towards sender, in milli-satoshi
	pub max_htlc_value_in_flight_msat: u64,
	/// The minimum value unencumbered by HTLCs for the counterparty to keep in the channel
	pub channel_reserve_satoshis: u64,
	/// The minimum HTLC size incoming to sender, in milli-satoshi
	pub htlc_minimum_msat: u64,
	/// Minimum depth of the funding transaction before the channel is considered open
	pub minimum_depth: u32,
	/// The number of blocks which the counterparty will have to wait to claim on-chain funds if
	/// they broadcast a commitment transaction
	pub to_self_delay: u16,
	/// The maximum number of inbound HTLCs towards sender
	pub max_accepted_htlcs: u16,
	/// The sender's key controlling the funding transaction
	pub funding_pubkey: PublicKey,
	/// Used to derive a revocation key for transactions broadcast by counterparty
	pub revocation_basepoint: PublicKey,
	/// The key to which the non-broadcaster's balance is paid on the broadcaster's commitments
	pub payment_point: PublicKey,
	/// Used to derive a payment key to sender for transactions broadcast by sender
	pub delayed_payment_basepoint: PublicKey,
	/// Used to derive an HTLC payment key to sender
	pub htlc_basepoint: PublicKey,
	/// The first to-be-broadcast-by-sender transaction's per commitment point
	pub first_per_commitment_point: PublicKey,
}

/// A funding_created message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct FundingCreated {
	/// The same temporary channel ID as given in the open_channel
	pub temporary_channel_id: ChannelId,
	/// The funding transaction ID
	pub funding_txid: Txid,
	/// The specific output index funding this channel
	pub funding_output_index: u16,
	/// The signature of the channel initiator (funder) on the initial commitment transaction of
	/// the channel acceptor (fundee)
	pub signature: Signature,
}

/// A funding_signed message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct FundingSigned {
	/// The channel ID
	pub channel_id: ChannelId,
	/// The signature of the channel acceptor on the initial commitment transaction of the channel
	/// initiator
	pub signature: Signature,
}

/// A funding_locked message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct FundingLocked {
	/// The channel ID
	pub channel_id: ChannelId,
	/// The per-commitment point of the second commitment transaction
	pub next_per_commitment_point: PublicKey,
}

/// A shutdown message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct Shutdown {
	/// The channel ID
	pub channel_id: ChannelId,
	/// The destination of this peer's funds on closing.
	/// Must be in one of the standard script forms.
	pub scriptpubkey: Script,
}

/// A closing_signed message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct ClosingSigned {
	/// The channel ID
	pub channel_id: ChannelId,
	/// The proposed total fee for the closing transaction
	pub fee_satoshis: u64,
	/// A signature on the closing transaction
	pub signature: Signature,
}

/// An update_add_htlc message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateAddHTLC {
	/// The channel ID
	pub channel_id: ChannelId,
	/// The HTLC ID
	pub htlc_id: u64,
	/// The HTLC value in milli-satoshi
	pub amount_msat: u64,
	/// The payment hash, the pre-image of which controls HTLC redemption
	pub payment_hash: PaymentHash,
	/// The expiry height of the HTLC
	pub cltv_expiry: u32,
	/// The onion routing packet with encrypted data for the next hop.
	pub onion_routing_packet: OnionPacket,
}

/// An update_fulfill_htlc message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateFulfillHTLC {
	/// The channel ID
	pub channel_id: ChannelId,
	/// The HTLC ID
	pub htlc_id: u64,
	/// The pre-image of the payment hash, allowing HTLC redemption
	pub payment_preimage: PaymentPreimage,
}

/// An update_fail_htlc message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateFailHTLC {
	/// The channel ID
	pub channel_id: ChannelId,
	/// The HTLC ID
	pub htlc_id: u64,
	/// The reason for the HTLC failure, encrypted back along the route
	pub reason: OnionErrorPacket,
}

/// An update_fail_malformed_htlc message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateFailMalformedHTLC {
	/// The channel ID
	pub channel_id: ChannelId,
	/// The HTLC ID
	pub htlc_id: u64,
	/// The SHA256 of the onion which could not be processed
	pub sha256_of_onion: [u8; 32],
	/// The failure code
	pub failure_code: u16,
}

/// A commitment_signed message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct CommitmentSigned {
	/// The channel ID
	pub channel_id: ChannelId,
	/// A signature on the commitment transaction
	pub signature: Signature,
	/// Signatures on the HTLC transactions
	pub htlc_signatures: Vec<Signature>,
}

/// A revoke_and_ack message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct RevokeAndACK {
	/// The channel ID
	pub channel_id: ChannelId,
	/// The secret corresponding to the per-commitment point of the now-revoked commitment
	pub per_commitment_secret: [u8; 32],
	/// The next sender-broadcast commitment transaction's per-commitment point
	pub next_per_commitment_point: PublicKey,
}

/// An update_fee message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateFee {
	/// The channel ID
	pub channel_id: ChannelId,
	/// Fee rate per 1000-weight of the transaction
	pub feerate_per_kw: u32,
}

/// A channel_reestablish message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelReestablish {
	/// The channel ID
	pub channel_id: ChannelId,
	/// The next commitment number for the sender, ie one more than the number of
	/// commitment_signed messages it has processed
	pub next_commitment_number: u64,
	/// The next commitment number for the recipient which the sender expects to revoke, ie the
	/// number of revoke_and_ack messages the sender has processed
	pub next_revocation_number: u64,
	/// Proof that the sender knows the per-commitment secret of a specific commitment transaction
	/// belonging to the recipient. All-zero before any commitment has been revoked.
	pub your_last_per_commitment_secret: [u8; 32],
	/// The sender's per-commitment point for its current commitment transaction
	pub my_current_per_commitment_point: PublicKey,
}

/// An error message to be sent or received from a peer
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorMessage {
	/// The channel ID involved in the error.
	///
	/// All-0s indicates a general error unrelated to a specific channel, after which no channels
	/// with the sending peer should be usable.
	pub channel_id: ChannelId,
	/// A possibly human-readable error description.
	///
	/// The string should be sanitized before it is used (e.g. emitted to logs or printed to
	/// stdout). Otherwise, a well crafted error message may trigger a security vulnerability in
	/// the terminal emulator or the logging subsystem.
	pub data: String,
}

/// BOLT 4 onion packet including hop data for the next peer.
#[derive(Clone)]
pub struct OnionPacket {
	/// BOLT 4 version number.
	pub version: u8,
	/// The ephemeral public key used to derive the shared secrets along the route. Stored raw:
	/// we relay packets whose key we cannot parse, failing them backwards instead of dropping.
	pub public_key: [u8; 33],
	/// 1300 bytes encrypted payload for the next hop.
	pub hop_data: Vec<u8>,
	/// HMAC to verify the integrity of hop_data.
	pub hmac: [u8; 32],
}

impl OnionPacket {
	/// An all-zeroes packet, for HTLCs whose onion was consumed at this hop.
	pub fn empty() -> OnionPacket {
		OnionPacket {
			version: 0,
			public_key: [0; 33],
			hop_data: vec![0; 1300],
			hmac: [0; 32],
		}
	}
}

impl PartialEq for OnionPacket {
	fn eq(&self, other: &OnionPacket) -> bool {
		self.version == other.version && self.public_key[..] == other.public_key[..]
			&& self.hop_data == other.hop_data && self.hmac == other.hmac
	}
}

impl fmt::Debug for OnionPacket {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_fmt(format_args!("Onion message version {} with hmac {:?}", self.version, &self.hmac[..]))
	}
}

impl Writeable for OnionPacket {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		self.version.write(w)?;
		w.write_all(&self.public_key)?;
		debug_assert_eq!(self.hop_data.len(), 1300);
		w.write_all(&self.hop_data)?;
		self.hmac.write(w)?;
		Ok(())
	}
}

impl Readable for OnionPacket {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let version: u8 = Readable::read(r)?;
		let public_key: [u8; 33] = Readable::read(r)?;
		let mut hop_data = vec![0; 1300];
		r.read_exact(&mut hop_data)?;
		let hmac: [u8; 32] = Readable::read(r)?;
		Ok(OnionPacket { version, public_key, hop_data, hmac })
	}
}

/// BOLT 4 onion error packet, encrypted at each hop on the way back.
#[derive(Clone, Debug, PartialEq)]
pub struct OnionErrorPacket {
	/// The encrypted error data, opaque at every hop but the origin's.
	pub data: Vec<u8>,
}

impl Writeable for OnionErrorPacket {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		self.data.write(w)
	}
}

impl Readable for OnionErrorPacket {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		Ok(OnionErrorPacket { data: Readable::read(r)? })
	}
}

impl_writeable!(OpenChannel, {
	chain_hash,
	temporary_channel_id,
	funding_satoshis,
	push_msat,
	dust_limit_satoshis,
	max_htlc_value_in_flight_msat,
	channel_reserve_satoshis,
	htlc_minimum_msat,
	feerate_per_kw,
	to_self_delay,
	max_accepted_htlcs,
	funding_pubkey,
	revocation_basepoint,
	payment_point,
	delayed_payment_basepoint,
	htlc_basepoint,
	first_per_commitment_point,
	channel_flags
});

impl_writeable!(AcceptChannel, {
	temporary_channel_id,
	dust_limit_satoshis,
	max_htlc_value_in_flight_msat,
	channel_reserve_satoshis,
	htlc_minimum_msat,
	minimum_depth,
	to_self_delay,
	max_accepted_htlcs,
	funding_pubkey,
	revocation_basepoint,
	payment_point,
	delayed_payment_basepoint,
	htlc_basepoint,
	first_per_commitment_point
});

impl_writeable!(FundingCreated, {
	temporary_channel_id,
	funding_txid,
	funding_output_index,
	signature
});

impl_writeable!(FundingSigned, {
	channel_id,
	signature
});

impl_writeable!(FundingLocked, {
	channel_id,
	next_per_commitment_point
});

impl_writeable!(Shutdown, {
	channel_id,
	scriptpubkey
});

impl_writeable!(ClosingSigned, {
	channel_id,
	fee_satoshis,
	signature
});

impl_writeable!(UpdateAddHTLC, {
	channel_id,
	htlc_id,
	amount_msat,
	payment_hash,
	cltv_expiry,
	onion_routing_packet
});

impl_writeable!(UpdateFulfillHTLC, {
	channel_id,
	htlc_id,
	payment_preimage
});

impl_writeable!(UpdateFailHTLC, {
	channel_id,
	htlc_id,
	reason
});

impl_writeable!(UpdateFailMalformedHTLC, {
	channel_id,
	htlc_id,
	sha256_of_onion,
	failure_code
});

impl_writeable!(CommitmentSigned, {
	channel_id,
	signature,
	htlc_signatures
});

impl_writeable!(RevokeAndACK, {
	channel_id,
	per_commitment_secret,
	next_per_commitment_point
});

impl_writeable!(UpdateFee, {
	channel_id,
	feerate_per_kw
});

impl_writeable!(ChannelReestablish, {
	channel_id,
	next_commitment_number,
	next_revocation_number,
	your_last_per_commitment_secret,
	my_current_per_commitment_point
});

impl_writeable!(ErrorMessage, {
	channel_id,
	data
});

/// A channel-level message, tagged by its BOLT 1 type.
#[derive(Clone, Debug, PartialEq)]
pub enum Message {
	/// An error message
	Error(ErrorMessage),
	/// An open_channel message
	OpenChannel(OpenChannel),
	/// An accept_channel message
	AcceptChannel(AcceptChannel),
	/// A funding_created message
	FundingCreated(FundingCreated),
	/// A funding_signed message
	FundingSigned(FundingSigned),
	/// A funding_locked message
	FundingLocked(FundingLocked),
	/// A shutdown message
	Shutdown(Shutdown),
	/// A closing_signed message
	ClosingSigned(ClosingSigned),
	/// An update_add_htlc message
	UpdateAddHTLC(UpdateAddHTLC),
	/// An update_fulfill_htlc message
	UpdateFulfillHTLC(UpdateFulfillHTLC),
	/// An update_fail_htlc message
	UpdateFailHTLC(UpdateFailHTLC),
	/// An update_fail_malformed_htlc message
	UpdateFailMalformedHTLC(UpdateFailMalformedHTLC),
	/// A commitment_signed message
	CommitmentSigned(CommitmentSigned),
	/// A revoke_and_ack message
	RevokeAndACK(RevokeAndACK),
	/// An update_fee message
	UpdateFee(UpdateFee),
	/// A channel_reestablish message
	ChannelReestablish(ChannelReestablish),
	/// A message of a type we do not understand. Odd types are safely ignorable; an even type
	/// here is a protocol violation.
	Unknown(u16),
}

impl Message {
	/// The BOLT 1 type number of this message.
	pub fn type_id(&self) -> u16 {
		match *self {
			Message::Error(_) => 17,
			Message::OpenChannel(_) => 32,
			Message::AcceptChannel(_) => 33,
			Message::FundingCreated(_) => 34,
			Message::FundingSigned(_) => 35,
			Message::FundingLocked(_) => 36,
			Message::Shutdown(_) => 38,
			Message::ClosingSigned(_) => 39,
			Message::UpdateAddHTLC(_) => 128,
			Message::UpdateFulfillHTLC(_) => 130,
			Message::UpdateFailHTLC(_) => 131,
			Message::CommitmentSigned(_) => 132,
			Message::RevokeAndACK(_) => 133,
			Message::UpdateFee(_) => 134,
			Message::UpdateFailMalformedHTLC(_) => 135,
			Message::ChannelReestablish(_) => 136,
			Message::Unknown(t) => t,
		}
	}

	/// The channel this message addresses, if any.
	pub fn channel_id(&self) -> Option<ChannelId> {
		match *self {
			Message::Error(ref m) => Some(m.channel_id),
			Message::OpenChannel(ref m) => Some(m.temporary_channel_id),
			Message::AcceptChannel(ref m) => Some(m.temporary_channel_id),
			Message::FundingCreated(ref m) => Some(m.temporary_channel_id),
			Message::FundingSigned(ref m) => Some(m.channel_id),
			Message::FundingLocked(ref m) => Some(m.channel_id),
			Message::Shutdown(ref m) => Some(m.channel_id),
			Message::ClosingSigned(ref m) => Some(m.channel_id),
			Message::UpdateAddHTLC(ref m) => Some(m.channel_id),
			Message::UpdateFulfillHTLC(ref m) => Some(m.channel_id),
			Message::UpdateFailHTLC(ref m) => Some(m.channel_id),
			Message::UpdateFailMalformedHTLC(ref m) => Some(m.channel_id),
			Message::CommitmentSigned(ref m) => Some(m.channel_id),
			Message::RevokeAndACK(ref m) => Some(m.channel_id),
			Message::UpdateFee(ref m) => Some(m.channel_id),
			Message::ChannelReestablish(ref m) => Some(m.channel_id),
			Message::Unknown(_) => None,
		}
	}

	/// Writes the message out with its two-byte big-endian type prefix, the frame format the
	/// peer connection manager puts on the wire.
	pub fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		self.type_id().write(w)?;
		match *self {
			Message::Error(ref m) => m.write(w),
			Message::OpenChannel(ref m) => m.write(w),
			Message::AcceptChannel(ref m) => m.write(w),
			Message::FundingCreated(ref m) => m.write(w),
			Message::FundingSigned(ref m) => m.write(w),
			Message::FundingLocked(ref m) => m.write(w),
			Message::Shutdown(ref m) => m.write(w),
			Message::ClosingSigned(ref m) => m.write(w),
			Message::UpdateAddHTLC(ref m) => m.write(w),
			Message::UpdateFulfillHTLC(ref m) => m.write(w),
			Message::UpdateFailHTLC(ref m) => m.write(w),
			Message::UpdateFailMalformedHTLC(ref m) => m.write(w),
			Message::CommitmentSigned(ref m) => m.write(w),
			Message::RevokeAndACK(ref m) => m.write(w),
			Message::UpdateFee(ref m) => m.write(w),
			Message::ChannelReestablish(ref m) => m.write(w),
			Message::Unknown(_) => Ok(()),
		}
	}

	/// Reads a message framed with its two-byte type prefix. An unknown type yields
	/// [`Message::Unknown`] with the remainder of the buffer unread.
	pub fn read<R: Read>(r: &mut R) -> Result<Message, DecodeError> {
		let msg_type: u16 = Readable::read(r)?;
		Ok(match msg_type {
			17 => Message::Error(Readable::read(r)?),
			32 => Message::OpenChannel(Readable::read(r)?),
			33 => Message::AcceptChannel(Readable::read(r)?),
			34 => Message::FundingCreated(Readable::read(r)?),
			35 => Message::FundingSigned(Readable::read(r)?),
			36 => Message::FundingLocked(Readable::read(r)?),
			38 => Message::Shutdown(Readable::read(r)?),
			39 => Message::ClosingSigned(Readable::read(r)?),
			128 => Message::UpdateAddHTLC(Readable::read(r)?),
			130 => Message::UpdateFulfillHTLC(Readable::read(r)?),
			131 => Message::UpdateFailHTLC(Readable::read(r)?),
			132 => Message::CommitmentSigned(Readable::read(r)?),
			133 => Message::RevokeAndACK(Readable::read(r)?),
			134 => Message::UpdateFee(Readable::read(r)?),
			135 => Message::UpdateFailMalformedHTLC(Readable::read(r)?),
			136 => Message::ChannelReestablish(Readable::read(r)?),
			t => Message::Unknown(t),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::util::ser::{Readable, VecWriter, Writeable};
	use bitcoin::hashes::Hash;
	use bitcoin::secp256k1::{Secp256k1, SecretKey};
	use std::io::Cursor;

	fn pubkey(byte: u8) -> PublicKey {
		let secp_ctx = Secp256k1::new();
		PublicKey::from_secret_key(&secp_ctx, &SecretKey::from_slice(&[byte; 32]).unwrap())
	}

	#[test]
	fn encoding_channel_reestablish() {
		let msg = ChannelReestablish {
			channel_id: ChannelId([4; 32]),
			next_commitment_number: 3,
			next_revocation_number: 4,
			your_last_per_commitment_secret: [9; 32],
			my_current_per_commitment_point: pubkey(1),
		};
		let encoded = msg.encode();
		assert_eq!(encoded.len(), 32 + 8 + 8 + 32 + 33);
		let decoded: ChannelReestablish = Readable::read(&mut Cursor::new(encoded)).unwrap();
		assert_eq!(decoded, msg);
	}

	#[test]
	fn encoding_update_add_htlc() {
		let msg = UpdateAddHTLC {
			channel_id: ChannelId([2; 32]),
			htlc_id: 2316138423780173,
			amount_msat: 3608586615801332854,
			payment_hash: PaymentHash(bitcoin::hashes::sha256::Hash::hash(&[1; 32]).into_inner()),
			cltv_expiry: 821716,
			onion_routing_packet: OnionPacket::empty(),
		};
		let encoded = msg.encode();
		assert_eq!(encoded.len(), 32 + 8 + 8 + 32 + 4 + 1366);
		let decoded: UpdateAddHTLC = Readable::read(&mut Cursor::new(encoded)).unwrap();
		assert_eq!(decoded, msg);
	}

	#[test]
	fn framed_message_round_trip() {
		let msg = Message::UpdateFee(UpdateFee { channel_id: ChannelId([6; 32]), feerate_per_kw: 1000 });
		let mut w = VecWriter(Vec::new());
		msg.write(&mut w).unwrap();
		assert_eq!(&w.0[..2], &[0, 134]);
		assert_eq!(Message::read(&mut Cursor::new(w.0)).unwrap(), msg);
	}

	#[test]
	fn unknown_message_type() {
		let mut w = VecWriter(Vec::new());
		999u16.write(&mut w).unwrap();
		assert_eq!(Message::read(&mut Cursor::new(w.0)).unwrap(), Message::Unknown(999));
	}
}
