// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Bookkeeping for why we hold each outgoing HTLC, so that a downstream settlement can be
//! delivered back to whatever caused us to send it.
//!
//! The persisted ("cold") [`Origin`] carries only the fields needed to resolve a downstream
//! result upstream. The in-memory ("hot") reply endpoint cannot cross a persistence boundary;
//! it lives in a sibling [`ReplyRegistry`] keyed by the cold form and is rebuilt from in-flight
//! command context on restart. Serializing channel state therefore always yields cold origins,
//! and a deserialized channel answers commands again as soon as the host re-registers senders.

use crate::ln::ChannelId;
use crate::ln::msgs::DecodeError;
use crate::util::errors::APIError;
use crate::util::ser::{Readable, Writeable, Writer};

use std::collections::HashMap;
use std::io::Read;
use std::sync::mpsc::Sender;

/// Why we offered an HTLC on this channel: the cold, persistable form.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Origin {
	/// A payment initiated by a local command, identified by the id the caller picked.
	Local {
		/// The caller-assigned payment id.
		id: [u8; 16],
	},
	/// An HTLC relayed from a single upstream channel.
	Relayed {
		/// The channel the upstream HTLC arrived on.
		original_channel_id: ChannelId,
		/// The upstream HTLC's id on that channel.
		original_htlc_id: u64,
		/// The upstream HTLC amount; the difference with `amount_out_msat` is our fee.
		amount_in_msat: u64,
		/// The amount we forwarded.
		amount_out_msat: u64,
	},
	/// A trampoline payment aggregated from several upstream HTLCs.
	TrampolineRelayed {
		/// The upstream (channel, htlc id) pairs this payment aggregates.
		incoming: Vec<(ChannelId, u64)>,
	},
}

impl Origin {
	/// The identity of this origin in the hot reply lookup: the serialized cold form, which is
	/// stable across a persist/restore round-trip by construction.
	pub fn key(&self) -> OriginKey {
		OriginKey(self.encode())
	}
}

impl Writeable for Origin {
	fn write<W: Writer>(&self, w: &mut W) -> Result<(), ::std::io::Error> {
		match *self {
			Origin::Local { ref id } => {
				0u8.write(w)?;
				id.write(w)?;
			},
			Origin::Relayed { ref original_channel_id, ref original_htlc_id, ref amount_in_msat, ref amount_out_msat } => {
				1u8.write(w)?;
				original_channel_id.write(w)?;
				original_htlc_id.write(w)?;
				amount_in_msat.write(w)?;
				amount_out_msat.write(w)?;
			},
			Origin::TrampolineRelayed { ref incoming } => {
				2u8.write(w)?;
				(incoming.len() as u16).write(w)?;
				for (chan, htlc) in incoming.iter() {
					chan.write(w)?;
					htlc.write(w)?;
				}
			},
		}
		Ok(())
	}
}

impl Readable for Origin {
	fn read<R: Read>(r: &mut R) -> Result<Self, DecodeError> {
		Ok(match <u8 as Readable>::read(r)? {
			0 => Origin::Local { id: Readable::read(r)? },
			1 => Origin::Relayed {
				original_channel_id: Readable::read(r)?,
				original_htlc_id: Readable::read(r)?,
				amount_in_msat: Readable::read(r)?,
				amount_out_msat: Readable::read(r)?,
			},
			2 => {
				let len: u16 = Readable::read(r)?;
				let mut incoming = Vec::with_capacity(::std::cmp::min(len as usize, 483));
				for _ in 0..len {
					incoming.push((Readable::read(r)?, Readable::read(r)?));
				}
				Origin::TrampolineRelayed { incoming }
			},
			_ => return Err(DecodeError::InvalidValue),
		})
	}
}

/// The lookup key tying a hot reply endpoint to a cold origin.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OriginKey(Vec<u8>);

/// The response delivered to the originator of a channel command.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandResponse {
	/// The command took effect.
	Success,
	/// The command was rejected or the operation it started failed.
	Failure(APIError),
	/// The introspection data a GetInfo command asked for.
	Info {
		/// The current state's name.
		state: String,
		/// Our balance, in millisatoshi, zero before the channel is funded.
		local_balance_msat: u64,
		/// The counterparty's balance, in millisatoshi.
		remote_balance_msat: u64,
	},
}

/// The hot side of origin tracking: reply endpoints for in-flight commands, keyed by cold
/// origin. Never persisted; the host re-registers endpoints after a restart.
#[derive(Default)]
pub struct ReplyRegistry {
	replies: HashMap<OriginKey, Sender<CommandResponse>>,
}

impl ReplyRegistry {
	/// A registry with no endpoints, as constructed on startup.
	pub fn new() -> Self {
		ReplyRegistry { replies: HashMap::new() }
	}

	/// Registers the reply endpoint for an origin, replacing any earlier one.
	pub fn register(&mut self, origin: &Origin, sender: Sender<CommandResponse>) {
		self.replies.insert(origin.key(), sender);
	}

	/// Delivers a response to an origin's endpoint, dropping the registration.
	///
	/// Returns false if no endpoint was registered (eg after a restart with no re-registration),
	/// in which case the response is only observable through the payments database.
	pub fn respond(&mut self, origin: &Origin, response: CommandResponse) -> bool {
		if let Some(sender) = self.replies.remove(&origin.key()) {
			// A dropped receiver means the originator stopped listening, which is their choice.
			sender.send(response).is_ok()
		} else {
			false
		}
	}

	/// Fails every registered endpoint, used on force-close.
	pub fn fail_all(&mut self, err: APIError) {
		for (_, sender) in self.replies.drain() {
			let _ = sender.send(CommandResponse::Failure(err.clone()));
		}
	}

	/// The number of in-flight registrations.
	pub fn len(&self) -> usize {
		self.replies.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;
	use std::sync::mpsc::channel;

	#[test]
	fn cold_origin_round_trip() {
		let origins = vec![
			Origin::Local { id: [3; 16] },
			Origin::Relayed {
				original_channel_id: ChannelId([1; 32]),
				original_htlc_id: 7,
				amount_in_msat: 1_000_100,
				amount_out_msat: 1_000_000,
			},
			Origin::TrampolineRelayed { incoming: vec![(ChannelId([2; 32]), 1), (ChannelId([4; 32]), 9)] },
		];
		for origin in origins {
			let read: Origin = Readable::read(&mut Cursor::new(origin.encode())).unwrap();
			assert_eq!(read, origin);
			assert_eq!(read.key(), origin.key());
		}
	}

	#[test]
	fn replies_are_hot_only() {
		let origin = Origin::Local { id: [9; 16] };
		let mut registry = ReplyRegistry::new();
		let (tx, rx) = channel();
		registry.register(&origin, tx);

		// A "restarted" registry rebuilt from the cold form alone has no endpoint.
		let mut restarted = ReplyRegistry::new();
		let read: Origin = Readable::read(&mut Cursor::new(origin.encode())).unwrap();
		assert!(!restarted.respond(&read, CommandResponse::Success));

		// The original registry delivers, once.
		assert!(registry.respond(&origin, CommandResponse::Success));
		assert_eq!(rx.try_recv().unwrap(), CommandResponse::Success);
		assert!(!registry.respond(&origin, CommandResponse::Success));
	}

	#[test]
	fn fail_all_notifies_every_origin() {
		let mut registry = ReplyRegistry::new();
		let (tx1, rx1) = channel();
		let (tx2, rx2) = channel();
		registry.register(&Origin::Local { id: [1; 16] }, tx1);
		registry.register(&Origin::Local { id: [2; 16] }, tx2);
		registry.fail_all(APIError::ChannelUnavailable { err: "force-closed".to_owned() });
		assert!(matches!(rx1.try_recv().unwrap(), CommandResponse::Failure(_)));
		assert!(matches!(rx2.try_recv().unwrap(), CommandResponse::Failure(_)));
		assert_eq!(registry.len(), 0);
	}
}
