//! Big-endian field cursor over a byte slice.
//!
//! Records in a keyfile grew trailing fields over the years. Older archives
//! simply stop early, so the cursor offers two flavours of every read: a
//! strict one for mandatory fields and an `opt_` one that yields `None` and
//! latches the cursor once the remaining bytes are too few. After the first
//! short read every following optional read is `None` as well, which keeps
//! the field order intact.

use crate::file::{FileType, KeyfileError};

/// Reads big-endian fields and tracks how many bytes remain.
#[derive(Debug, Clone)]
pub struct FieldCursor<'a> {
	data: &'a [u8],
	offset: usize,
	stopped: bool,
	file_type: FileType,
}

macro_rules! cursor_reads {
	($($strict:ident, $opt:ident => $ty:ty;)*) => {
		$(
			#[doc = concat!("Reads a mandatory big-endian `", stringify!($ty), "`.")]
			///
			/// # Errors
			///
			/// Returns [`KeyfileError::InsufficientData`] when the record is too short.
			pub fn $strict(&mut self) -> Result<$ty, KeyfileError> {
				let bytes = self.take(size_of::<$ty>())?;
				let mut buf = [0u8; size_of::<$ty>()];
				buf.copy_from_slice(bytes);
				Ok(<$ty>::from_be_bytes(buf))
			}

			#[doc = concat!("Reads an optional big-endian `", stringify!($ty), "`.")]
			pub fn $opt(&mut self) -> Option<$ty> {
				if self.stopped || self.remaining() < size_of::<$ty>() {
					self.stopped = true;
					return None;
				}
				self.$strict().ok()
			}
		)*
	};
}

impl<'a> FieldCursor<'a> {
	/// Creates a cursor; `file_type` labels errors.
	pub fn new(data: &'a [u8], file_type: FileType) -> Self {
		Self {
			data,
			offset: 0,
			stopped: false,
			file_type,
		}
	}

	/// Number of unread bytes.
	#[inline]
	pub fn remaining(&self) -> usize {
		self.data.len() - self.offset
	}

	/// Current read position.
	#[inline]
	pub fn position(&self) -> usize {
		self.offset
	}

	/// Returns `true` once an optional read came up short.
	#[inline]
	pub fn is_stopped(&self) -> bool {
		self.stopped
	}

	/// Takes `len` raw bytes.
	///
	/// # Errors
	///
	/// Returns [`KeyfileError::InsufficientData`] when fewer bytes remain.
	pub fn take(&mut self, len: usize) -> Result<&'a [u8], KeyfileError> {
		if self.remaining() < len {
			return Err(KeyfileError::insufficient_data(
				self.file_type,
				self.offset + len,
				self.data.len(),
			));
		}
		let bytes = &self.data[self.offset..self.offset + len];
		self.offset += len;
		Ok(bytes)
	}

	/// Returns all unread bytes and moves to the end.
	pub fn rest(&mut self) -> &'a [u8] {
		let bytes = &self.data[self.offset..];
		self.offset = self.data.len();
		bytes
	}

	cursor_reads! {
		read_u8, opt_u8 => u8;
		read_u16, opt_u16 => u16;
		read_i16, opt_i16 => i16;
		read_u32, opt_u32 => u32;
		read_i32, opt_i32 => i32;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_strict_reads() {
		let data = [0x12, 0x34, 0xFF, 0xFE, 0x00, 0x00, 0x01, 0x00];
		let mut cursor = FieldCursor::new(&data, FileType::ImageReference);
		assert_eq!(cursor.read_u16().unwrap(), 0x1234);
		assert_eq!(cursor.read_i16().unwrap(), -2);
		assert_eq!(cursor.read_u32().unwrap(), 256);
		assert_eq!(cursor.remaining(), 0);
		assert!(matches!(cursor.read_u8(), Err(KeyfileError::InsufficientData { .. })));
	}

	#[test]
	fn test_optional_reads_latch() {
		let data = [0x00, 0x01, 0x00, 0x02, 0x03];
		let mut cursor = FieldCursor::new(&data, FileType::ImageReference);
		assert_eq!(cursor.opt_u16(), Some(1));
		assert_eq!(cursor.opt_u32(), None);
		assert!(cursor.is_stopped());
		// a u8 would still fit, but the record already ended
		assert_eq!(cursor.opt_u8(), None);
		assert_eq!(cursor.remaining(), 3);
	}
}
