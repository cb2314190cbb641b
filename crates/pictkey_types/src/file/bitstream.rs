//! MSB-first bit reader and writer.
//!
//! Pixel blobs store their run-length data as a stream of variable-width
//! unsigned fields packed high bit first. The reader holds at most one byte
//! of lookahead and pulls the next byte from its source exactly when the
//! 8-bit cursor wraps.

use crate::file::KeyfileError;

/// Reads single bits and `1..=32` bit fields from a byte source.
#[derive(Debug, Clone)]
pub struct BitReader<I> {
	source: I,
	current: u8,
	/// Bit cursor inside `current`, 8 means a fresh byte is needed
	position: u8,
}

impl<'a> BitReader<std::iter::Copied<std::slice::Iter<'a, u8>>> {
	/// Creates a reader over a byte slice.
	pub fn from_slice(data: &'a [u8]) -> Self {
		Self::new(data.iter().copied())
	}
}

impl<I: Iterator<Item = u8>> BitReader<I> {
	/// Creates a reader over any byte iterator.
	pub fn new(source: I) -> Self {
		Self {
			source,
			current: 0,
			position: 8,
		}
	}

	/// Reads one bit.
	///
	/// # Errors
	///
	/// Returns [`KeyfileError::EndOfStream`] once the source is exhausted.
	pub fn read_bit(&mut self) -> Result<bool, KeyfileError> {
		if self.position == 8 {
			self.current = self.source.next().ok_or(KeyfileError::EndOfStream)?;
			self.position = 0;
		}

		let bit = (self.current >> (7 - self.position)) & 1 == 1;
		self.position += 1;
		Ok(bit)
	}

	/// Reads an unsigned field of `bits` width, most significant bit first.
	///
	/// # Errors
	///
	/// Returns [`KeyfileError::InvalidFieldWidth`] when `bits` is not in
	/// `1..=32`, or [`KeyfileError::EndOfStream`] when the source runs dry.
	pub fn read_field(&mut self, bits: u32) -> Result<u32, KeyfileError> {
		if !(1..=32).contains(&bits) {
			return Err(KeyfileError::InvalidFieldWidth(bits));
		}

		let mut value = 0u32;
		for _ in 0..bits {
			value = (value << 1) | u32::from(self.read_bit()?);
		}
		Ok(value)
	}
}

/// Packs bits MSB-first into a byte vector.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
	bytes: Vec<u8>,
	current: u8,
	filled: u8,
}

impl BitWriter {
	/// Creates an empty writer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends one bit.
	pub fn write_bit(&mut self, bit: bool) {
		self.current = (self.current << 1) | u8::from(bit);
		self.filled += 1;
		if self.filled == 8 {
			self.bytes.push(self.current);
			self.current = 0;
			self.filled = 0;
		}
	}

	/// Appends the low `bits` bits of `value`, most significant first.
	///
	/// # Errors
	///
	/// Returns [`KeyfileError::InvalidFieldWidth`] when `bits` is not in `1..=32`.
	pub fn write_field(&mut self, value: u32, bits: u32) -> Result<(), KeyfileError> {
		if !(1..=32).contains(&bits) {
			return Err(KeyfileError::InvalidFieldWidth(bits));
		}

		for shift in (0..bits).rev() {
			self.write_bit((value >> shift) & 1 == 1);
		}
		Ok(())
	}

	/// Flushes the partial byte (zero padded) and returns the buffer.
	pub fn finish(mut self) -> Vec<u8> {
		if self.filled > 0 {
			self.bytes.push(self.current << (8 - self.filled));
		}
		self.bytes
	}
}
