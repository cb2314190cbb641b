//! Item metadata records.
//!
//! Items live in the same keyfile as the sprites they use, under their own
//! type tag. Each record names up to three image references (held in the
//! right hand, in the left hand, and worn) plus a display name.
//!
//! # Record Layout (big-endian)
//!
//! ```text
//! ┌─────────────────────────────────┐
//! │ Flags (2 bytes)                 │  0x00-0x01
//! ├─────────────────────────────────┤
//! │ Equip Slot (2 bytes)            │  0x02-0x03
//! ├─────────────────────────────────┤
//! │ Right Hand Reference (4 bytes)  │  0x04-0x07
//! │ Left Hand Reference (4 bytes)   │  0x08-0x0B
//! │ Worn Reference (4 bytes)        │  0x0C-0x0F
//! ├─────────────────────────────────┤
//! │ Name Length (1 byte)            │  0x10
//! │ Name (MacRoman, n bytes)        │  0x11..
//! └─────────────────────────────────┘
//! ```
//!
//! The name is optional: a record ending after the worn reference has an
//! empty name, and a name cut short keeps the bytes that are there.

use std::fmt;

use encoding_rs::MACINTOSH;
use serde::Serialize;

use crate::file::{FileType, KeyfileError, cursor::FieldCursor};

/// Item record constants.
pub mod constants {
	/// Size of the fixed part of a record
	pub const FIXED_SIZE: usize = 16;

	/// Longest encodable name
	pub const MAX_NAME_LEN: usize = u8::MAX as usize;
}

/// One item record.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ItemRecord {
	/// Directory id of the record
	pub id: u32,
	/// Item flags
	pub flags: u16,
	/// Equipment slot
	pub slot: u16,
	/// Image reference drawn in the right hand, 0 for none
	pub right_hand_pict_id: u32,
	/// Image reference drawn in the left hand, 0 for none
	pub left_hand_pict_id: u32,
	/// Image reference drawn when worn, 0 for none
	pub worn_pict_id: u32,
	/// Display name
	pub name: String,
}

impl ItemRecord {
	/// Parses an item record.
	///
	/// # Errors
	///
	/// Fails when the fixed 16-byte part is truncated.
	pub fn from_bytes(id: u32, data: &[u8]) -> Result<Self, KeyfileError> {
		let mut cursor = FieldCursor::new(data, FileType::Item);
		let mut record = Self {
			id,
			flags: cursor.read_u16()?,
			slot: cursor.read_u16()?,
			right_hand_pict_id: cursor.read_u32()?,
			left_hand_pict_id: cursor.read_u32()?,
			worn_pict_id: cursor.read_u32()?,
			name: String::new(),
		};

		if let Some(len) = cursor.opt_u8() {
			let len = (len as usize).min(cursor.remaining());
			let raw_name = cursor.take(len)?;
			let (name, _, _) = MACINTOSH.decode(raw_name);
			record.name = name.trim_end_matches('\0').to_string();
		}

		Ok(record)
	}

	/// Serializes the record; names longer than 255 bytes are cut.
	pub fn to_bytes(&self) -> Vec<u8> {
		let (raw_name, _, _) = MACINTOSH.encode(&self.name);
		let raw_name = &raw_name[..raw_name.len().min(constants::MAX_NAME_LEN)];

		let mut out = Vec::with_capacity(constants::FIXED_SIZE + 1 + raw_name.len());
		out.extend_from_slice(&self.flags.to_be_bytes());
		out.extend_from_slice(&self.slot.to_be_bytes());
		out.extend_from_slice(&self.right_hand_pict_id.to_be_bytes());
		out.extend_from_slice(&self.left_hand_pict_id.to_be_bytes());
		out.extend_from_slice(&self.worn_pict_id.to_be_bytes());
		out.push(raw_name.len() as u8);
		out.extend_from_slice(raw_name);
		out
	}

	/// Non-zero image references of this item.
	pub fn pict_ids(&self) -> impl Iterator<Item = u32> {
		[self.right_hand_pict_id, self.left_hand_pict_id, self.worn_pict_id]
			.into_iter()
			.filter(|&id| id != 0)
	}
}

impl fmt::Display for ItemRecord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Item #{} \"{}\": slot {}, flags 0x{:04X}, right #{}, left #{}, worn #{}",
			self.id,
			self.name,
			self.slot,
			self.flags,
			self.right_hand_pict_id,
			self.left_hand_pict_id,
			self.worn_pict_id
		)
	}
}
