//! Keyfile container support.
//!
//! A keyfile is a flat, big-endian container: a 12-byte header followed by a
//! table of fixed 16-byte directory records, each pointing at a payload
//! somewhere in the rest of the file.
//!
//! # File Structure
//!
//! ```text
//! ┌─────────────────────────────────┐
//! │ Magic (2 bytes, 0xFFFF)         │  0x00-0x01
//! │ Entry Count (4 bytes)           │  0x02-0x05
//! │ Reserved (4 + 2 bytes)          │  0x06-0x0B
//! ├─────────────────────────────────┤
//! │ Directory Records               │  0x0C onwards
//! │ (entry_count × 16 bytes)        │
//! │   offset, size, type, id (u32)  │
//! ├─────────────────────────────────┤
//! │ Payload Region                  │
//! └─────────────────────────────────┘
//! ```
//!
//! Records whose byte range runs past the end of the file are reported as
//! invalid but do not fail the load; the container is usable with holes.
//!
//! # Usage Examples
//!
//! ```no_run
//! use pictkey_types::file::keyfile::{File, TypeTag};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let keyfile = File::open("CL_Images")?;
//! println!("{} entries", keyfile.entry_count());
//!
//! if let Some(data) = keyfile.payload(TypeTag::PIXEL_BLOB, 1024) {
//!     println!("pixel blob 1024: {} bytes", data.len());
//! }
//! # Ok(())
//! # }
//! ```

use std::{fmt, io::Read};

use log::warn;
use serde::Serialize;

use crate::file::{FileType, KeyfileError, cursor::FieldCursor};

mod builder;

pub use builder::Builder;

/// Keyfile constants.
pub mod constants {
	/// Magic marker at the start of every keyfile
	pub const MAGIC: u16 = 0xFFFF;

	/// Size of the file header (magic + count + 6 reserved bytes)
	pub const HEADER_SIZE: usize = 12;

	/// Size of one directory record
	pub const ENTRY_SIZE: usize = 16;
}

/// Four-character type tag stored as a big-endian `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeTag(pub u32);

impl TypeTag {
	/// Image reference records
	pub const IMAGE_REFERENCE: Self = Self::from_ascii(*b"PDf5");
	/// Compressed pixel blobs
	pub const PIXEL_BLOB: Self = Self::from_ascii(*b"Bmap");
	/// Per-sprite color tables
	pub const COLOR_TABLE: Self = Self::from_ascii(*b"Clrs");
	/// Lighting blobs
	pub const LIGHTING: Self = Self::from_ascii(*b"Lite");
	/// Item metadata records
	pub const ITEM: Self = Self::from_ascii(*b"ItDf");

	/// Builds a tag from four ASCII characters.
	pub const fn from_ascii(chars: [u8; 4]) -> Self {
		Self(u32::from_be_bytes(chars))
	}

	/// Returns the tag as four bytes.
	pub const fn to_ascii(self) -> [u8; 4] {
		self.0.to_be_bytes()
	}
}

impl fmt::Display for TypeTag {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let chars = self.to_ascii();
		if chars.iter().all(u8::is_ascii_graphic) {
			write!(f, "'{}'", String::from_utf8_lossy(&chars))
		} else {
			write!(f, "{:08X}", self.0)
		}
	}
}

/// Keyfile header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
	/// Magic marker, always [`constants::MAGIC`]
	pub magic: u16,
	/// Number of directory records
	pub entry_count: u32,
	/// Reserved (4 bytes)
	pub reserved_1: u32,
	/// Reserved (2 bytes)
	pub reserved_2: u16,
}

impl Header {
	/// Size of the header in bytes
	pub const SIZE: usize = constants::HEADER_SIZE;

	/// Creates a header for `entry_count` records.
	pub fn new(entry_count: u32) -> Self {
		Self {
			magic: constants::MAGIC,
			entry_count,
			reserved_1: 0,
			reserved_2: 0,
		}
	}

	/// Parses a header from the start of `data`.
	pub fn from_bytes(data: &[u8]) -> Result<Self, KeyfileError> {
		if data.len() < constants::HEADER_SIZE {
			return Err(KeyfileError::insufficient_data(
				FileType::Keyfile,
				constants::HEADER_SIZE,
				data.len(),
			));
		}

		let mut cursor = FieldCursor::new(&data[..constants::HEADER_SIZE], FileType::Keyfile);
		let magic = cursor.read_u16()?;
		if magic != constants::MAGIC {
			return Err(KeyfileError::invalid_magic(
				FileType::Keyfile,
				&constants::MAGIC.to_be_bytes(),
				&magic.to_be_bytes(),
			));
		}

		Ok(Self {
			magic,
			entry_count: cursor.read_u32()?,
			reserved_1: cursor.read_u32()?,
			reserved_2: cursor.read_u16()?,
		})
	}

	/// Serializes the header.
	pub fn to_bytes(&self) -> [u8; constants::HEADER_SIZE] {
		let mut bytes = [0u8; constants::HEADER_SIZE];
		bytes[0..2].copy_from_slice(&self.magic.to_be_bytes());
		bytes[2..6].copy_from_slice(&self.entry_count.to_be_bytes());
		bytes[6..10].copy_from_slice(&self.reserved_1.to_be_bytes());
		bytes[10..12].copy_from_slice(&self.reserved_2.to_be_bytes());
		bytes
	}
}

impl Default for Header {
	fn default() -> Self {
		Self::new(0)
	}
}

/// One directory record.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DirectoryEntry {
	/// Absolute payload offset
	pub offset: u32,
	/// Payload size in bytes
	pub size: u32,
	/// Type tag (see [`TypeTag`])
	pub type_tag: u32,
	/// Numeric id, unique per type
	pub id: u32,
}

impl DirectoryEntry {
	/// Creates a new entry.
	pub fn new(offset: u32, size: u32, type_tag: TypeTag, id: u32) -> Self {
		Self {
			offset,
			size,
			type_tag: type_tag.0,
			id,
		}
	}

	/// Returns the entry type as a [`TypeTag`].
	pub fn tag(&self) -> TypeTag {
		TypeTag(self.type_tag)
	}

	/// Byte range of the payload, `None` if it does not fit in `archive_len`.
	pub fn range(&self, archive_len: usize) -> Option<std::ops::Range<usize>> {
		let start = self.offset as usize;
		let end = start.checked_add(self.size as usize)?;
		(end <= archive_len).then_some(start..end)
	}

	fn from_cursor(cursor: &mut FieldCursor<'_>) -> Result<Self, KeyfileError> {
		Ok(Self {
			offset: cursor.read_u32()?,
			size: cursor.read_u32()?,
			type_tag: cursor.read_u32()?,
			id: cursor.read_u32()?,
		})
	}

	/// Serializes the entry.
	pub fn to_bytes(&self) -> [u8; constants::ENTRY_SIZE] {
		let mut bytes = [0u8; constants::ENTRY_SIZE];
		bytes[0..4].copy_from_slice(&self.offset.to_be_bytes());
		bytes[4..8].copy_from_slice(&self.size.to_be_bytes());
		bytes[8..12].copy_from_slice(&self.type_tag.to_be_bytes());
		bytes[12..16].copy_from_slice(&self.id.to_be_bytes());
		bytes
	}
}

impl fmt::Display for DirectoryEntry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} #{}: offset 0x{:08X}, {} bytes",
			self.tag(),
			self.id,
			self.offset,
			self.size
		)
	}
}

/// Lookup seam between the container and anything decoding its payloads.
pub trait EntryLookup {
	/// Returns the `(offset, size)` of the record with the given type and id.
	fn lookup(&self, type_tag: TypeTag, id: u32) -> Option<(u32, u32)>;
}

/// A parsed keyfile: raw bytes plus the full directory table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
	raw: Vec<u8>,
	header: Header,
	entries: Vec<DirectoryEntry>,
}

impl File {
	/// Opens and parses a keyfile.
	///
	/// # Errors
	///
	/// Returns an error if the file cannot be read, the magic is wrong, or the
	/// directory table is shorter than the header declares.
	pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self, KeyfileError> {
		let data = std::fs::read(path)?;
		Self::from_vec(data)
	}

	/// Parses a keyfile from any reader.
	pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, KeyfileError> {
		let mut data = Vec::new();
		reader.read_to_end(&mut data)?;
		Self::from_vec(data)
	}

	/// Parses a keyfile from a byte slice.
	pub fn from_bytes(data: &[u8]) -> Result<Self, KeyfileError> {
		Self::from_vec(data.to_vec())
	}

	/// Parses a keyfile, taking ownership of the buffer.
	pub fn from_vec(raw: Vec<u8>) -> Result<Self, KeyfileError> {
		let header = Header::from_bytes(&raw)?;

		let table_len = header.entry_count as usize * constants::ENTRY_SIZE;
		let available = raw.len() - constants::HEADER_SIZE;
		if available < table_len {
			return Err(KeyfileError::DirectoryTruncated {
				declared: header.entry_count,
				available: available / constants::ENTRY_SIZE,
			});
		}

		let table = &raw[constants::HEADER_SIZE..constants::HEADER_SIZE + table_len];
		let mut cursor = FieldCursor::new(table, FileType::Keyfile);
		let mut entries = Vec::with_capacity(header.entry_count as usize);
		for _ in 0..header.entry_count {
			entries.push(DirectoryEntry::from_cursor(&mut cursor)?);
		}

		Ok(Self {
			raw,
			header,
			entries,
		})
	}

	/// Returns the header.
	pub fn header(&self) -> &Header {
		&self.header
	}

	/// Number of directory records, valid or not.
	pub fn entry_count(&self) -> usize {
		self.entries.len()
	}

	/// All directory records in file order, including out-of-bounds ones.
	pub fn entries(&self) -> &[DirectoryEntry] {
		&self.entries
	}

	/// Iterates over records whose payload lies inside the file.
	///
	/// Out-of-bounds records are logged and skipped.
	pub fn valid_entries(&self) -> impl Iterator<Item = &DirectoryEntry> {
		self.entries.iter().filter(|entry| {
			if entry.range(self.raw.len()).is_some() {
				return true;
			}
			let err = KeyfileError::EntryOutOfBounds {
				type_tag: entry.type_tag,
				id: entry.id,
				offset: entry.offset,
				size: entry.size,
				archive_len: self.raw.len(),
			};
			warn!("Dropping directory entry: {err}");
			false
		})
	}

	/// Finds the first valid record with the given type and id.
	pub fn find(&self, type_tag: TypeTag, id: u32) -> Option<&DirectoryEntry> {
		self.entries.iter().find(|entry| {
			entry.type_tag == type_tag.0 && entry.id == id && entry.range(self.raw.len()).is_some()
		})
	}

	/// Returns the payload bytes of a record.
	pub fn payload(&self, type_tag: TypeTag, id: u32) -> Option<&[u8]> {
		self.find(type_tag, id).and_then(|entry| self.entry_data(entry))
	}

	/// Returns the payload bytes for a directory record.
	pub fn entry_data(&self, entry: &DirectoryEntry) -> Option<&[u8]> {
		entry.range(self.raw.len()).map(|range| &self.raw[range])
	}

	/// Whole file as bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.raw
	}

	/// Consumes the container, returning the raw buffer and directory.
	pub fn into_parts(self) -> (Vec<u8>, Vec<DirectoryEntry>) {
		(self.raw, self.entries)
	}
}

impl EntryLookup for File {
	fn lookup(&self, type_tag: TypeTag, id: u32) -> Option<(u32, u32)> {
		self.find(type_tag, id).map(|entry| (entry.offset, entry.size))
	}
}

impl TryFrom<&[u8]> for File {
	type Error = KeyfileError;

	fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
		Self::from_bytes(value)
	}
}

impl TryFrom<Vec<u8>> for File {
	type Error = KeyfileError;

	fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
		Self::from_vec(value)
	}
}

impl fmt::Display for File {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Keyfile: {} entries, {} bytes", self.entries.len(), self.raw.len())
	}
}
