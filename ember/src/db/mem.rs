// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! In-memory database backends. Used by the test suite, and a reasonable template for a real
//! backend: each store demonstrates the open-with-version-check-and-migrate contract the disk
//! backends must follow.

use crate::db::{AuditDb, AuditEvent, ChannelsDb, DbError, FeeratesDb, FeeratesRow, FeeratesRowV1, PaymentEvent, PaymentsDb, migrate_feerates_v1_to_v2};
use crate::ln::{ChannelId, PaymentHash};
use crate::util::ser::{Readable, Writeable};

use std::collections::HashMap;
use std::io::Cursor;

/// In-memory channels store.
#[derive(Default)]
pub struct MemChannelsDb {
	channels: HashMap<ChannelId, Vec<u8>>,
}

impl MemChannelsDb {
	/// An empty store.
	pub fn new() -> Self {
		MemChannelsDb { channels: HashMap::new() }
	}
}

impl ChannelsDb for MemChannelsDb {
	fn add_or_update_channel(&mut self, channel_id: &ChannelId, state_blob: &[u8]) -> Result<(), DbError> {
		self.channels.insert(*channel_id, state_blob.to_vec());
		Ok(())
	}

	fn get_channel(&self, channel_id: &ChannelId) -> Result<Option<Vec<u8>>, DbError> {
		Ok(self.channels.get(channel_id).cloned())
	}

	fn remove_channel(&mut self, channel_id: &ChannelId) -> Result<(), DbError> {
		self.channels.remove(channel_id);
		Ok(())
	}

	fn list_channels(&self) -> Result<Vec<(ChannelId, Vec<u8>)>, DbError> {
		Ok(self.channels.iter().map(|(id, blob)| (*id, blob.clone())).collect())
	}
}

/// In-memory payments store.
#[derive(Default)]
pub struct MemPaymentsDb {
	payments: Vec<PaymentEvent>,
}

impl MemPaymentsDb {
	/// An empty store.
	pub fn new() -> Self {
		MemPaymentsDb { payments: Vec::new() }
	}
}

fn event_hash(event: &PaymentEvent) -> &PaymentHash {
	match event {
		PaymentEvent::Sent { payment_hash, .. } => payment_hash,
		PaymentEvent::Received { payment_hash, .. } => payment_hash,
		PaymentEvent::Failed { payment_hash } => payment_hash,
	}
}

impl PaymentsDb for MemPaymentsDb {
	fn add_payment(&mut self, event: PaymentEvent) -> Result<(), DbError> {
		self.payments.push(event);
		Ok(())
	}

	fn list_payments(&self, payment_hash: &PaymentHash) -> Result<Vec<PaymentEvent>, DbError> {
		Ok(self.payments.iter().filter(|e| event_hash(e) == payment_hash).cloned().collect())
	}
}

/// In-memory audit store.
#[derive(Default)]
pub struct MemAuditDb {
	/// Every recorded event, in insertion order.
	pub events: Vec<AuditEvent>,
}

impl MemAuditDb {
	/// An empty store.
	pub fn new() -> Self {
		MemAuditDb { events: Vec::new() }
	}
}

impl AuditDb for MemAuditDb {
	fn add_event(&mut self, event: AuditEvent) -> Result<(), DbError> {
		self.events.push(event);
		Ok(())
	}
}

/// In-memory feerates store, demonstrating the versioned-open contract: a stored image older
/// than [`MemFeeratesDb::CURRENT_VERSION`] is migrated step by step, a newer one is fatal.
#[derive(Debug)]
pub struct MemFeeratesDb {
	row: Option<FeeratesRow>,
}

impl MemFeeratesDb {
	/// The newest schema version this code reads and writes.
	pub const CURRENT_VERSION: u32 = 2;

	/// An empty store at the current version.
	pub fn new() -> Self {
		MemFeeratesDb { row: None }
	}

	/// Opens a stored image: the version from the `versions` table plus the serialized row, if
	/// any. Older versions are migrated forward; a newer version refuses to open.
	pub fn open(stored_version: u32, stored_row: Option<Vec<u8>>) -> Result<Self, DbError> {
		if stored_version > Self::CURRENT_VERSION {
			return Err(DbError::FutureVersion { db: "feerates", stored: stored_version, current: Self::CURRENT_VERSION });
		}
		let row = match stored_row {
			None => None,
			Some(blob) => {
				let mut version = stored_version;
				let mut row_v1: Option<FeeratesRowV1> = None;
				let mut row_v2: Option<FeeratesRow> = None;
				match version {
					1 => row_v1 = Some(Readable::read(&mut Cursor::new(blob))?),
					2 => row_v2 = Some(Readable::read(&mut Cursor::new(blob))?),
					v => {
						debug_assert!(v == 1 || v == 2);
						return Err(DbError::Decode(crate::ln::msgs::DecodeError::UnknownVersion));
					},
				}
				while version < Self::CURRENT_VERSION {
					match version {
						1 => {
							row_v2 = Some(migrate_feerates_v1_to_v2(row_v1.take().expect("set by the version match above")));
						},
						_ => unreachable!("no migration step registered"),
					}
					version += 1;
				}
				row_v2
			},
		};
		Ok(MemFeeratesDb { row })
	}

	/// The stored image of this db: its version and serialized row, as [`Self::open`] expects.
	pub fn image(&self) -> (u32, Option<Vec<u8>>) {
		(Self::CURRENT_VERSION, self.row.as_ref().map(|r| r.encode()))
	}
}

impl FeeratesDb for MemFeeratesDb {
	fn set_feerates(&mut self, row: FeeratesRow) -> Result<(), DbError> {
		self.row = Some(row);
		Ok(())
	}

	fn get_feerates(&self) -> Result<Option<FeeratesRow>, DbError> {
		Ok(self.row.clone())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn channels_round_trip() {
		let mut db = MemChannelsDb::new();
		let id = ChannelId([7; 32]);
		db.add_or_update_channel(&id, &[1, 2, 3]).unwrap();
		assert_eq!(db.get_channel(&id).unwrap(), Some(vec![1, 2, 3]));
		db.add_or_update_channel(&id, &[4, 5]).unwrap();
		assert_eq!(db.get_channel(&id).unwrap(), Some(vec![4, 5]));
		assert_eq!(db.list_channels().unwrap().len(), 1);
		db.remove_channel(&id).unwrap();
		assert_eq!(db.get_channel(&id).unwrap(), None);
	}

	#[test]
	fn feerates_v1_image_is_migrated_on_open() {
		let v1 = FeeratesRowV1 {
			blocks_1: 10000, blocks_2: 8000, blocks_6: 6000, blocks_12: 4000,
			blocks_36: 2000, blocks_72: 1000, blocks_144: 500,
		};
		let db = MemFeeratesDb::open(1, Some(v1.encode())).unwrap();
		let row = db.get_feerates().unwrap().unwrap();
		assert_eq!(row.blocks_1, 10000);
		assert_eq!(row.blocks_1008, 500);
	}

	#[test]
	fn feerates_future_version_is_fatal() {
		assert_eq!(
			MemFeeratesDb::open(3, None).unwrap_err(),
			DbError::FutureVersion { db: "feerates", stored: 3, current: 2 },
		);
	}

	#[test]
	fn feerates_current_version_round_trips() {
		let mut db = MemFeeratesDb::new();
		let row = FeeratesRow {
			blocks_1: 1, blocks_2: 2, blocks_6: 6, blocks_12: 12,
			blocks_36: 36, blocks_72: 72, blocks_144: 144, blocks_1008: 1008,
		};
		db.set_feerates(row.clone()).unwrap();
		let (version, image) = db.image();
		let reopened = MemFeeratesDb::open(version, image).unwrap();
		assert_eq!(reopened.get_feerates().unwrap(), Some(row));
	}
}
