//! Error types for keyfile parsing and sprite decoding.

use std::fmt;

use thiserror::Error;

/// Kind of record an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
	/// The container itself (header and directory table)
	Keyfile,
	/// Image reference record
	ImageReference,
	/// Compressed pixel blob
	PixelBlob,
	/// Per-sprite color table
	ColorTable,
	/// Lighting blob
	Lighting,
	/// Item metadata record
	Item,
	/// Master palette
	Palette,
}

impl fmt::Display for FileType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			FileType::Keyfile => "keyfile",
			FileType::ImageReference => "image reference",
			FileType::PixelBlob => "pixel blob",
			FileType::ColorTable => "color table",
			FileType::Lighting => "lighting",
			FileType::Item => "item",
			FileType::Palette => "palette",
		};
		f.write_str(name)
	}
}

/// Unified error for everything under `file`.
#[derive(Debug, Error)]
pub enum KeyfileError {
	/// Not enough data to parse
	#[error("{file_type}: insufficient data, expected {expected} bytes, got {actual} bytes")]
	InsufficientData {
		/// Record kind
		file_type: FileType,
		/// Expected number of bytes
		expected: usize,
		/// Actual number of bytes
		actual: usize,
	},

	/// Invalid magic number
	#[error("{file_type}: invalid magic, expected {expected:02X?}, got {actual:02X?}")]
	InvalidMagic {
		/// Record kind
		file_type: FileType,
		/// Expected magic bytes
		expected: Vec<u8>,
		/// Actual magic bytes
		actual: Vec<u8>,
	},

	/// Directory table shorter than the declared entry count
	#[error("Directory truncated: header declares {declared} entries, only {available} fit")]
	DirectoryTruncated {
		/// Entry count from the header
		declared: u32,
		/// Number of complete records present
		available: usize,
	},

	/// Entry byte range exceeds the archive
	#[error(
		"Entry {id} (type {type_tag:08X}) out of bounds: offset {offset} + size {size} > {archive_len}"
	)]
	EntryOutOfBounds {
		/// Type tag of the entry
		type_tag: u32,
		/// Entry id
		id: u32,
		/// Entry offset
		offset: u32,
		/// Entry size
		size: u32,
		/// Total archive length
		archive_len: usize,
	},

	/// Entry not present
	#[error("{file_type}: entry not found, {message}")]
	EntryNotFound {
		/// Record kind
		file_type: FileType,
		/// Description of the lookup that failed
		message: String,
	},

	/// Bitstream ran out of bytes
	#[error("Unexpected end of bitstream")]
	EndOfStream,

	/// A field width outside `1..=32` bits was requested
	#[error("Invalid bit field width: {0}")]
	InvalidFieldWidth(u32),

	/// Stored checksum does not match the computed one
	#[error("Checksum mismatch for reference {id}: stored {stored:08X}, computed {computed:08X}")]
	ChecksumMismatch {
		/// Reference id
		id: u32,
		/// Checksum stored in the reference record
		stored: u32,
		/// Checksum computed from the referenced data
		computed: u32,
	},

	/// Sprite exceeds the configured pixel bound
	#[error("Pixel blob {id} too large: {pixels} pixels exceeds limit of {limit}")]
	SpriteTooLarge {
		/// Pixel blob id
		id: u32,
		/// Pixel count from the blob header
		pixels: usize,
		/// Configured limit
		limit: usize,
	},

	/// IO error
	#[error(transparent)]
	IoError(#[from] std::io::Error),
}

impl KeyfileError {
	/// Shorthand for [`KeyfileError::InsufficientData`].
	pub fn insufficient_data(file_type: FileType, expected: usize, actual: usize) -> Self {
		Self::InsufficientData {
			file_type,
			expected,
			actual,
		}
	}

	/// Shorthand for [`KeyfileError::InvalidMagic`].
	pub fn invalid_magic(file_type: FileType, expected: &[u8], actual: &[u8]) -> Self {
		Self::InvalidMagic {
			file_type,
			expected: expected.to_vec(),
			actual: actual.to_vec(),
		}
	}

	/// Shorthand for [`KeyfileError::EntryNotFound`].
	pub fn entry_not_found(file_type: FileType, message: impl Into<String>) -> Self {
		Self::EntryNotFound {
			file_type,
			message: message.into(),
		}
	}
}
