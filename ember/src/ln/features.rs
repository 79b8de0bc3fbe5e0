// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Feature flag definitions for the lightning protocol according to [BOLT #9].
//!
//! Flags come in mandatory/optional pairs: the even bit of a pair signals that a feature is
//! required, the odd bit that it is merely supported. A node which does not understand a set even
//! bit must fail the interaction; unknown odd bits are ignored.
//!
//! [BOLT #9]: https://github.com/lightning/bolts/blob/master/09-features.md

use crate::ln::msgs::DecodeError;
use crate::util::ser::{Readable, Writeable, Writer};

use std::io::Read;

/// Bit positions of the features which may appear in an invoice, named by their pair's odd bit.
mod bits {
	pub const VARIABLE_LENGTH_ONION: usize = 9;
	pub const PAYMENT_SECRET: usize = 15;
	pub const BASIC_MPP: usize = 17;
	pub const PAYMENT_METADATA: usize = 49;
}

/// The set of feature pairs whose semantics this implementation knows, as odd-bit positions.
const KNOWN_INVOICE_FEATURES: [usize; 4] = [
	bits::VARIABLE_LENGTH_ONION,
	bits::PAYMENT_SECRET,
	bits::BASIC_MPP,
	bits::PAYMENT_METADATA,
];

/// Tracks the set of features which a payee advertises in an invoice.
///
/// Flags are stored least-significant-byte first, so `flags[0]` holds bits 0 through 7.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct InvoiceFeatures {
	flags: Vec<u8>,
}

impl std::fmt::Debug for InvoiceFeatures {
	fn fmt(&self, fmt: &mut std::fmt::Formatter) -> Result<(), std::fmt::Error> {
		write!(fmt, "[")?;
		for b in self.flags.iter().rev() {
			write!(fmt, "{:02x}", b)?;
		}
		write!(fmt, "]")
	}
}

impl InvoiceFeatures {
	/// Creates a features object with no features set.
	pub fn empty() -> InvoiceFeatures {
		InvoiceFeatures { flags: Vec::new() }
	}

	/// Creates a features object from the given least-significant-byte-first flag bytes, keeping
	/// any bits this implementation does not know about.
	pub fn from_le_bytes(flags: Vec<u8>) -> InvoiceFeatures {
		let mut ret = InvoiceFeatures { flags };
		ret.trim();
		ret
	}

	/// The raw feature bytes, least-significant byte first.
	pub fn le_flags(&self) -> &[u8] {
		&self.flags
	}

	fn trim(&mut self) {
		while self.flags.last() == Some(&0) {
			self.flags.pop();
		}
	}

	fn set_bit(&mut self, bit: usize) {
		let byte = bit / 8;
		if self.flags.len() <= byte {
			self.flags.resize(byte + 1, 0);
		}
		self.flags[byte] |= 1 << (bit % 8);
	}

	fn clear_bit(&mut self, bit: usize) {
		let byte = bit / 8;
		if byte < self.flags.len() {
			self.flags[byte] &= !(1 << (bit % 8));
		}
		self.trim();
	}

	fn is_bit_set(&self, bit: usize) -> bool {
		let byte = bit / 8;
		byte < self.flags.len() && self.flags[byte] & (1 << (bit % 8)) != 0
	}

	/// Whether either bit of the pair named by its odd bit is set.
	fn supports_pair(&self, odd_bit: usize) -> bool {
		self.is_bit_set(odd_bit) || self.is_bit_set(odd_bit - 1)
	}

	/// Sets the variable-length onion feature as required.
	pub fn set_variable_length_onion_required(&mut self) {
		self.set_bit(bits::VARIABLE_LENGTH_ONION - 1);
		self.clear_bit(bits::VARIABLE_LENGTH_ONION);
	}

	/// Sets the payment secret feature as required.
	pub fn set_payment_secret_required(&mut self) {
		self.set_bit(bits::PAYMENT_SECRET - 1);
		self.clear_bit(bits::PAYMENT_SECRET);
	}

	/// Sets the basic multi-part-payment feature as optional.
	pub fn set_basic_mpp_optional(&mut self) {
		self.set_bit(bits::BASIC_MPP);
	}

	/// Sets the payment metadata feature as optional.
	pub fn set_payment_metadata_optional(&mut self) {
		self.set_bit(bits::PAYMENT_METADATA);
	}

	/// Whether the payment secret feature is advertised, required or not.
	pub fn supports_payment_secret(&self) -> bool {
		self.supports_pair(bits::PAYMENT_SECRET)
	}

	/// Whether the payment secret feature is required.
	pub fn requires_payment_secret(&self) -> bool {
		self.is_bit_set(bits::PAYMENT_SECRET - 1)
	}

	/// Whether basic multi-part payments are supported.
	pub fn supports_basic_mpp(&self) -> bool {
		self.supports_pair(bits::BASIC_MPP)
	}

	/// Returns true if any even (mandatory) bit which this implementation does not understand is
	/// set. An invoice with such a bit is parseable but cannot be paid by this node.
	pub fn requires_unknown_bits(&self) -> bool {
		for (byte_idx, &byte) in self.flags.iter().enumerate() {
			for bit_in_byte in (0..8).step_by(2) {
				let bit = byte_idx * 8 + bit_in_byte;
				if byte & (1 << bit_in_byte) != 0 && !KNOWN_INVOICE_FEATURES.contains(&(bit + 1)) {
					return true;
				}
			}
		}
		false
	}

	/// The highest bit index which is set, if any.
	pub fn highest_set_bit(&self) -> Option<usize> {
		for (byte_idx, &byte) in self.flags.iter().enumerate().rev() {
			if byte != 0 {
				return Some(byte_idx * 8 + (7 - byte.leading_zeros() as usize));
			}
		}
		None
	}
}

impl Writeable for InvoiceFeatures {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
		(self.flags.len() as u16).write(w)?;
		for f in self.flags.iter().rev() { // Swap back to big-endian
			f.write(w)?;
		}
		Ok(())
	}
}

impl Readable for InvoiceFeatures {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let mut flags: Vec<u8> = Readable::read(r)?;
		flags.reverse(); // Swap to little-endian
		Ok(InvoiceFeatures::from_le_bytes(flags))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn set_and_query_known_features() {
		let mut features = InvoiceFeatures::empty();
		assert!(!features.supports_payment_secret());

		features.set_variable_length_onion_required();
		features.set_payment_secret_required();
		features.set_basic_mpp_optional();

		assert!(features.supports_payment_secret());
		assert!(features.requires_payment_secret());
		assert!(features.supports_basic_mpp());
		assert!(!features.requires_unknown_bits());
		assert_eq!(features.highest_set_bit(), Some(bits::BASIC_MPP));
	}

	#[test]
	fn unknown_even_bits_are_flagged() {
		// Bit 100 is even and unknown to us: mandatory and unfulfillable.
		let mut flags = vec![0u8; 13];
		flags[12] |= 1 << 4;
		let features = InvoiceFeatures::from_le_bytes(flags);
		assert!(features.requires_unknown_bits());

		// Bit 101 is odd: tolerated.
		let mut flags = vec![0u8; 13];
		flags[12] |= 1 << 5;
		let features = InvoiceFeatures::from_le_bytes(flags);
		assert!(!features.requires_unknown_bits());
	}

	#[test]
	fn flags_round_trip_big_endian() {
		use crate::util::ser::Writeable;
		let mut features = InvoiceFeatures::empty();
		features.set_payment_secret_required();
		// Bit 14 set: byte 1 (le) == 0x40, serialized big-endian first.
		assert_eq!(features.encode(), vec![0, 2, 0x40, 0]);
		let read: InvoiceFeatures = crate::util::ser::Readable::read(
			&mut ::std::io::Cursor::new(features.encode())).unwrap();
		assert_eq!(read, features);
	}
}
