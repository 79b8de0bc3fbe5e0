// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! High level lightning structs and impls live here.
//!
//! You probably want to create a [`channel::Channel`] per peer channel, feed it
//! [`channel::ChannelEvent`]s and execute the [`channel::ChannelAction`]s it returns, persisting
//! the state blob it hands you before releasing any message to the peer.

pub mod chan_keys;
pub mod commitment;
pub mod features;
pub mod msgs;
pub mod onchain;
pub mod origin;

use crate::util::ser::{Readable, Writeable, Writer};
use crate::ln::msgs::DecodeError;

use std::fmt;
use std::io::Read;

/// payment_hash type, use to cross-lock hop
#[derive(Hash, Copy, Clone, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct PaymentHash(pub [u8; 32]);
/// payment_preimage type, use to route payment between hop
#[derive(Hash, Copy, Clone, PartialEq, Eq, Debug)]
pub struct PaymentPreimage(pub [u8; 32]);
/// payment_secret type, use to authenticate sender to the receiver and tie MPP HTLCs together
#[derive(Hash, Copy, Clone, PartialEq, Eq, Debug)]
pub struct PaymentSecret(pub [u8; 32]);

macro_rules! impl_writeable_32_byte_newtype {
	($ty: ident) => {
		impl Writeable for $ty {
			fn write<W: Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
				self.0.write(w)
			}
		}
		impl Readable for $ty {
			fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
				Ok($ty(Readable::read(r)?))
			}
		}
	}
}

impl_writeable_32_byte_newtype!(PaymentHash);
impl_writeable_32_byte_newtype!(PaymentPreimage);
impl_writeable_32_byte_newtype!(PaymentSecret);

/// A unique 32-byte identifier for a channel.
///
/// Set to a temporary random value during the handshake, then replaced by the funding txid XORed
/// with the funding output index once the funding transaction is known.
#[derive(Hash, Copy, Clone, PartialEq, Eq)]
pub struct ChannelId(pub [u8; 32]);

impl ChannelId {
	/// The channel id derived from the funding outpoint: funding txid with the output index XORed
	/// into the two low bytes.
	pub fn from_funding_outpoint(outpoint: &crate::chain::transaction::OutPoint) -> Self {
		use bitcoin::hashes::Hash;
		let mut res = [0; 32];
		res[..].copy_from_slice(&outpoint.txid.into_inner()[..]);
		res[30] ^= ((outpoint.index >> 8) & 0xff) as u8;
		res[31] ^= ((outpoint.index >> 0) & 0xff) as u8;
		ChannelId(res)
	}
}

impl fmt::Debug for ChannelId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		for b in self.0.iter() {
			write!(f, "{:02x}", b)?;
		}
		Ok(())
	}
}

impl fmt::Display for ChannelId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

impl_writeable_32_byte_newtype!(ChannelId);

/// A short channel id, packing the funding transaction's confirmation coordinates (block height,
/// transaction index within the block, output index) into a u64.
#[derive(Hash, Copy, Clone, PartialEq, Eq, Debug, PartialOrd, Ord)]
pub struct ShortChannelId(pub u64);

impl ShortChannelId {
	/// Packs the given coordinates. Height is bounded by 24 bits, transaction index by 24 bits and
	/// output index by 16 bits per BOLT 7.
	pub fn from_parts(block_height: u32, tx_index: u32, output_index: u16) -> Result<Self, &'static str> {
		if block_height > 0x00ff_ffff {
			return Err("block height can't fit in 24 bits");
		}
		if tx_index > 0x00ff_ffff {
			return Err("tx index can't fit in 24 bits");
		}
		Ok(ShortChannelId(((block_height as u64) << 40) | ((tx_index as u64) << 16) | output_index as u64))
	}

	/// The block height at which the funding transaction confirmed.
	pub fn block_height(&self) -> u32 {
		(self.0 >> 40) as u32
	}
	/// The index of the funding transaction within its block.
	pub fn tx_index(&self) -> u32 {
		((self.0 >> 16) & 0xff_ffff) as u32
	}
	/// The funding output index.
	pub fn output_index(&self) -> u16 {
		(self.0 & 0xffff) as u16
	}
}

impl fmt::Display for ShortChannelId {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "{}x{}x{}", self.block_height(), self.tx_index(), self.output_index())
	}
}

impl Writeable for ShortChannelId {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
		self.0.write(w)
	}
}
impl Readable for ShortChannelId {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		Ok(ShortChannelId(Readable::read(r)?))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::chain::transaction::OutPoint;
	use bitcoin::hashes::Hash;
	use bitcoin::hash_types::Txid;

	#[test]
	fn channel_id_xors_funding_index() {
		let txid = Txid::from_inner([0xee; 32]);
		let id = ChannelId::from_funding_outpoint(&OutPoint { txid, index: 1 });
		assert_eq!(id.0[31], 0xee ^ 1);
		assert_eq!(id.0[30], 0xee);
		assert_eq!(&id.0[..30], &[0xee; 30][..]);
	}

	#[test]
	fn short_channel_id_packing() {
		let scid = ShortChannelId::from_parts(539268, 845, 1).unwrap();
		assert_eq!(scid.block_height(), 539268);
		assert_eq!(scid.tx_index(), 845);
		assert_eq!(scid.output_index(), 1);
		assert_eq!(scid.to_string(), "539268x845x1");
		assert!(ShortChannelId::from_parts(1 << 24, 0, 0).is_err());
	}
}
