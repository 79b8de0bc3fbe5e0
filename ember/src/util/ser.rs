// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! A very simple serialization framework which is used to serialize/deserialize messages as well
//! as the channel state blobs which are persisted to disk on every state transition.

use std::collections::HashMap;
use std::hash::Hash;
use std::io::{self, Read};

use bitcoin::blockdata::script::Script;
use bitcoin::blockdata::transaction::Transaction;
use bitcoin::consensus::encode::{self, Decodable, Encodable};
use bitcoin::hash_types::{BlockHash, Txid};
use bitcoin::hashes::Hash as HashTrait;
use bitcoin::secp256k1::constants::{PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, COMPACT_SIGNATURE_SIZE};
use bitcoin::secp256k1::ecdsa::Signature;
use bitcoin::secp256k1::{PublicKey, SecretKey};

use crate::ln::msgs::DecodeError;
use crate::util::byte_utils::{be16_to_array, be32_to_array, be48_to_array, be64_to_array, slice_to_be16, slice_to_be32, slice_to_be48, slice_to_be64};

/// The maximum number of bytes we'll allocate up-front when reading a length-prefixed collection,
/// to bound the damage a malicious length prefix can do.
pub(crate) const MAX_BUF_SIZE: usize = 64 * 1024;

/// A sink to which serialized data is written.
///
/// An impl is provided for any type implementing [`std::io::Write`].
pub trait Writer {
	/// Writes the given buf out. See std::io::Write::write_all for more
	fn write_all(&mut self, buf: &[u8]) -> Result<(), io::Error>;
}

impl<W: ::std::io::Write> Writer for W {
	#[inline]
	fn write_all(&mut self, buf: &[u8]) -> Result<(), io::Error> {
		<Self as ::std::io::Write>::write_all(self, buf)
	}
}

/// A [`Writer`] backed by a growable byte vector.
#[derive(Default)]
pub struct VecWriter(pub Vec<u8>);
impl Writer for VecWriter {
	#[inline]
	fn write_all(&mut self, buf: &[u8]) -> Result<(), io::Error> {
		self.0.extend_from_slice(buf);
		Ok(())
	}
}

/// Wrap a [`Writer`] so it can be handed to APIs expecting [`std::io::Write`] (notably
/// rust-bitcoin's consensus encoder).
pub(crate) struct WriterWriteAdaptor<'a, W: Writer + 'a>(pub &'a mut W);
impl<'a, W: Writer + 'a> io::Write for WriterWriteAdaptor<'a, W> {
	#[inline]
	fn write(&mut self, buf: &[u8]) -> Result<usize, io::Error> {
		self.0.write_all(buf)?;
		Ok(buf.len())
	}
	#[inline]
	fn write_all(&mut self, buf: &[u8]) -> Result<(), io::Error> {
		self.0.write_all(buf)
	}
	#[inline]
	fn flush(&mut self) -> Result<(), io::Error> {
		Ok(())
	}
}

/// A trait that various ember types implement allowing them to be written out to a [`Writer`].
pub trait Writeable {
	/// Writes self out to the given [`Writer`].
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), io::Error>;

	/// Writes self out to a new `Vec<u8>`.
	fn encode(&self) -> Vec<u8> {
		let mut msg = VecWriter(Vec::new());
		self.write(&mut msg).expect("in-memory writes cannot fail");
		msg.0
	}

	/// Writes self out to a new `Vec<u8>`, prefixed with its big-endian u16 length.
	fn encode_with_len(&self) -> Vec<u8> {
		let mut msg = VecWriter(Vec::new());
		0u16.write(&mut msg).expect("in-memory writes cannot fail");
		self.write(&mut msg).expect("in-memory writes cannot fail");
		let len = msg.0.len();
		msg.0[..2].copy_from_slice(&be16_to_array(len as u16 - 2));
		msg.0
	}
}

impl<'a, T: Writeable> Writeable for &'a T {
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), io::Error> {
		(*self).write(writer)
	}
}

/// A trait that various ember types implement allowing them to be read in from a [`Read`].
pub trait Readable
	where Self: Sized
{
	/// Reads a `Self` in from the given [`Read`].
	fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError>;
}

/// A trait that various higher-level ember types implement allowing them to be read in from a
/// [`Read`] given some additional set of arguments which is required to deserialize.
pub trait ReadableArgs<P>
	where Self: Sized
{
	/// Reads a `Self` in from the given [`Read`].
	fn read<R: Read>(reader: &mut R, params: P) -> Result<Self, DecodeError>;
}

/// A trait that various ember types implement allowing them to (maybe) be read in from a
/// [`Read`], returning `None` if the read value is to be ignored.
pub trait MaybeReadable
	where Self: Sized
{
	/// Reads a `Self` in from the given [`Read`].
	fn read<R: Read>(reader: &mut R) -> Result<Option<Self>, DecodeError>;
}

/// A u64 which can only take on values in `0..2^48`, used for commitment numbers which BOLT 2
/// defines as 48 bits wide.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct U48(pub u64);
impl Writeable for U48 {
	#[inline]
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), io::Error> {
		writer.write_all(&be48_to_array(self.0))
	}
}
impl Readable for U48 {
	#[inline]
	fn read<R: Read>(reader: &mut R) -> Result<U48, DecodeError> {
		let mut buf = [0; 6];
		reader.read_exact(&mut buf)?;
		Ok(U48(slice_to_be48(&buf)))
	}
}

macro_rules! impl_writeable_primitive {
	($val_type:ty, $meth_write:ident, $len: expr, $meth_read:ident) => {
		impl Writeable for $val_type {
			#[inline]
			fn write<W: Writer>(&self, writer: &mut W) -> Result<(), io::Error> {
				writer.write_all(&$meth_write(*self))
			}
		}
		impl Readable for $val_type {
			#[inline]
			fn read<R: Read>(reader: &mut R) -> Result<$val_type, DecodeError> {
				let mut buf = [0; $len];
				reader.read_exact(&mut buf)?;
				Ok($meth_read(&buf))
			}
		}
	}
}

impl_writeable_primitive!(u64, be64_to_array, 8, slice_to_be64);
impl_writeable_primitive!(u32, be32_to_array, 4, slice_to_be32);
impl_writeable_primitive!(u16, be16_to_array, 2, slice_to_be16);

impl Writeable for u8 {
	#[inline]
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), io::Error> {
		writer.write_all(&[*self])
	}
}
impl Readable for u8 {
	#[inline]
	fn read<R: Read>(reader: &mut R) -> Result<u8, DecodeError> {
		let mut buf = [0; 1];
		reader.read_exact(&mut buf)?;
		Ok(buf[0])
	}
}

impl Writeable for bool {
	#[inline]
	fn write<W: Writer>(&self, writer: &mut W) -> Result<(), io::Error> {
		writer.write_all(&[if *self { 1 } else { 0 }])
	}
}
impl Readable for bool {
	#[inline]
	fn read<R: Read>(reader: &mut R) -> Result<bool, DecodeError> {
		let mut buf = [0; 1];
		reader.read_exact(&mut buf)?;
		if buf[0] != 0 && buf[0] != 1 {
			return Err(DecodeError::InvalidValue);
		}
		Ok(buf[0] == 1)
	}
}

macro_rules! impl_array {
	($size:expr) => (
		impl Writeable for [u8; $size] {
			#[inline]
			fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
				w.write_all(self)
			}
		}
		impl Readable for [u8; $size] {
			#[inline]
			fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
				let mut buf = [0u8; $size];
				r.read_exact(&mut buf)?;
				Ok(buf)
			}
		}
	);
}

impl_array!(4); // for IPv4
impl_array!(16); // for origin/lease ids
impl_array!(32); // for channel id & hash255
impl_array!(33); // for PublicKey
impl_array!(64); // for Signature

// HashMap

impl<K, V> Writeable for HashMap<K, V>
	where K: Writeable + Eq + Hash,
	      V: Writeable
{
	#[inline]
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		(self.len() as u16).write(w)?;
		for (key, value) in self.iter() {
			key.write(w)?;
			value.write(w)?;
		}
		Ok(())
	}
}

impl<K, V> Readable for HashMap<K, V>
	where K: Readable + Eq + Hash,
	      V: Readable
{
	#[inline]
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let len: u16 = Readable::read(r)?;
		let mut ret = HashMap::with_capacity(len as usize);
		for _ in 0..len {
			ret.insert(K::read(r)?, V::read(r)?);
		}
		Ok(ret)
	}
}

// Vectors

impl Writeable for Vec<u8> {
	#[inline]
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		(self.len() as u16).write(w)?;
		w.write_all(&self)
	}
}

impl Readable for Vec<u8> {
	#[inline]
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let len: u16 = Readable::read(r)?;
		let mut ret = Vec::with_capacity(len as usize);
		ret.resize(len as usize, 0);
		r.read_exact(&mut ret[..])?;
		Ok(ret)
	}
}

macro_rules! impl_writeable_vec {
	($ty: ty) => {
		impl Writeable for Vec<$ty> {
			#[inline]
			fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
				(self.len() as u16).write(w)?;
				for e in self.iter() {
					e.write(w)?;
				}
				Ok(())
			}
		}
		impl Readable for Vec<$ty> {
			#[inline]
			fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
				let len: u16 = Readable::read(r)?;
				let byte_size = (len as usize).saturating_mul(::std::mem::size_of::<$ty>());
				if byte_size > MAX_BUF_SIZE {
					return Err(DecodeError::BadLengthDescriptor);
				}
				let mut ret = Vec::with_capacity(len as usize);
				for _ in 0..len {
					ret.push(<$ty as Readable>::read(r)?);
				}
				Ok(ret)
			}
		}
	}
}
impl_writeable_vec!(Signature);
impl_writeable_vec!(u64);

impl Writeable for String {
	#[inline]
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		(self.len() as u16).write(w)?;
		w.write_all(self.as_bytes())
	}
}
impl Readable for String {
	#[inline]
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let v: Vec<u8> = Readable::read(r)?;
		let ret = String::from_utf8(v).map_err(|_| DecodeError::InvalidValue)?;
		Ok(ret)
	}
}

// Options

impl<T: Writeable> Writeable for Option<T> {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		match *self {
			None => 0u8.write(w)?,
			Some(ref data) => {
				1u8.write(w)?;
				data.write(w)?;
			},
		}
		Ok(())
	}
}

impl<T: Readable> Readable for Option<T> {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		match <u8 as Readable>::read(r)? {
			0 => Ok(None),
			1 => Ok(Some(Readable::read(r)?)),
			_ => Err(DecodeError::InvalidValue),
		}
	}
}

// Crypto types

impl Writeable for PublicKey {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		self.serialize().write(w)
	}
}

impl Readable for PublicKey {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let buf: [u8; PUBLIC_KEY_SIZE] = Readable::read(r)?;
		match PublicKey::from_slice(&buf) {
			Ok(key) => Ok(key),
			Err(_) => Err(DecodeError::InvalidValue),
		}
	}
}

impl Writeable for SecretKey {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		let mut ser = [0; SECRET_KEY_SIZE];
		ser.copy_from_slice(&self[..]);
		ser.write(w)
	}
}

impl Readable for SecretKey {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let buf: [u8; SECRET_KEY_SIZE] = Readable::read(r)?;
		match SecretKey::from_slice(&buf) {
			Ok(key) => Ok(key),
			Err(_) => Err(DecodeError::InvalidValue),
		}
	}
}

impl Writeable for Signature {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		self.serialize_compact().write(w)
	}
}

impl Readable for Signature {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let buf: [u8; COMPACT_SIGNATURE_SIZE] = Readable::read(r)?;
		match Signature::from_compact(&buf) {
			Ok(sig) => Ok(sig),
			Err(_) => Err(DecodeError::InvalidValue),
		}
	}
}

// Bitcoin types

impl Writeable for Txid {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		w.write_all(&self[..])
	}
}

impl Readable for Txid {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let buf: [u8; 32] = Readable::read(r)?;
		Ok(Txid::from_inner(buf))
	}
}

impl Writeable for BlockHash {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		w.write_all(&self[..])
	}
}

impl Readable for BlockHash {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let buf: [u8; 32] = Readable::read(r)?;
		Ok(BlockHash::from_inner(buf))
	}
}

impl Writeable for Script {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		(self.len() as u16).write(w)?;
		w.write_all(self.as_bytes())
	}
}

impl Readable for Script {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		let len = <u16 as Readable>::read(r)? as usize;
		let mut buf = vec![0; len];
		r.read_exact(&mut buf)?;
		Ok(Script::from(buf))
	}
}

impl Writeable for Transaction {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), io::Error> {
		match self.consensus_encode(&mut WriterWriteAdaptor(w)) {
			Ok(_) => Ok(()),
			Err(e) => Err(e),
		}
	}
}

impl Readable for Transaction {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		match Transaction::consensus_decode(r) {
			Ok(tx) => Ok(tx),
			Err(encode::Error::Io(e)) => Err(DecodeError::Io(e.kind())),
			Err(_) => Err(DecodeError::InvalidValue),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::{Readable, Writeable};
	use crate::ln::msgs::DecodeError;
	use std::io::Cursor;

	#[test]
	fn bool_rejects_garbage() {
		let mut read = Cursor::new(vec![2u8]);
		assert_eq!(<bool as Readable>::read(&mut read).unwrap_err(), DecodeError::InvalidValue);
	}

	#[test]
	fn option_round_trip() {
		let some: Option<u32> = Some(0xdeadbeef);
		let none: Option<u32> = None;
		assert_eq!(Option::<u32>::read(&mut Cursor::new(some.encode())).unwrap(), some);
		assert_eq!(Option::<u32>::read(&mut Cursor::new(none.encode())).unwrap(), none);
	}

	#[test]
	fn u48_round_trip() {
		use super::U48;
		let val = U48((1 << 48) - 1);
		assert_eq!(U48::read(&mut Cursor::new(val.encode())).unwrap(), val);
	}
}
