// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

macro_rules! impl_writeable {
	($st:ident, {$($field:ident),* $(,)*}) => {
		impl crate::util::ser::Writeable for $st {
			fn write<W: crate::util::ser::Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
				$( self.$field.write(w)?; )*
				Ok(())
			}
		}

		impl crate::util::ser::Readable for $st {
			fn read<R: ::std::io::Read>(r: &mut R) -> Result<Self, crate::ln::msgs::DecodeError> {
				Ok(Self {
					$($field: crate::util::ser::Readable::read(r)?),*
				})
			}
		}
	}
}

/// Implements Writeable/Readable for a fieldless enum by assigning each variant a fixed tag byte.
macro_rules! impl_writeable_unit_enum {
	($st:ident, {$($variant:ident => $tag:expr),* $(,)*}) => {
		impl crate::util::ser::Writeable for $st {
			fn write<W: crate::util::ser::Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
				match *self {
					$($st::$variant => ($tag as u8).write(w)?,)*
				}
				Ok(())
			}
		}

		impl crate::util::ser::Readable for $st {
			fn read<R: ::std::io::Read>(r: &mut R) -> Result<Self, crate::ln::msgs::DecodeError> {
				match <u8 as crate::util::ser::Readable>::read(r)? {
					$($tag => Ok($st::$variant),)*
					_ => Err(crate::ln::msgs::DecodeError::InvalidValue),
				}
			}
		}
	}
}
