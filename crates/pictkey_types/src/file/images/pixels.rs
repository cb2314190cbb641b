//! Pixel blob decoding.
//!
//! ## Blob Layout (big-endian)
//!
//! | Offset | Size | Field             | Description                         |
//! |--------|------|-------------------|-------------------------------------|
//! | 0x00   | 2    | `height`          | Rows, including any mapping row     |
//! | 0x02   | 2    | `width`           | Columns                             |
//! | 0x04   | 4    | `reserved`        | Unused                              |
//! | 0x08   | 1    | `value_width`     | Bits per palette index              |
//! | 0x09   | 1    | `block_len_width` | Bits per run length                 |
//! | 0x0A   | ...  | bitstream         | Run-length coded indices, MSB first |
//!
//! ## Bitstream
//!
//! The stream is a sequence of runs, each introduced by a one-bit mode and a
//! `block_len_width`-bit count `s` describing `s + 1` pixels:
//!
//! - mode `1` (literal): `s + 1` values of `value_width` bits follow
//! - mode `0` (repeat): one value follows and is repeated `s + 1` times
//!
//! Decoding stops after `width * height` values. A stream that ends early
//! yields the pixels decoded so far.

use std::fmt;

use crate::file::{
	FileType, KeyfileError,
	bitstream::{BitReader, BitWriter},
	cursor::FieldCursor,
};

use super::palette::ColorTable;

/// Pixel blob header.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelHeader {
	/// Rows, including the mapping row when present
	pub height: u16,
	/// Columns
	pub width: u16,
	/// Reserved (4 bytes)
	pub reserved: u32,
	/// Bits per value
	pub value_width: u8,
	/// Bits per run length
	pub block_len_width: u8,
}

impl PixelHeader {
	/// Size of the header in bytes
	pub const SIZE: usize = 10;

	/// Parses the header from the start of a blob.
	pub fn from_bytes(data: &[u8]) -> Result<Self, KeyfileError> {
		let mut cursor = FieldCursor::new(data, FileType::PixelBlob);
		Ok(Self {
			height: cursor.read_u16()?,
			width: cursor.read_u16()?,
			reserved: cursor.read_u32()?,
			value_width: cursor.read_u8()?,
			block_len_width: cursor.read_u8()?,
		})
	}

	/// Serializes the header.
	pub fn to_bytes(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..2].copy_from_slice(&self.height.to_be_bytes());
		bytes[2..4].copy_from_slice(&self.width.to_be_bytes());
		bytes[4..8].copy_from_slice(&self.reserved.to_be_bytes());
		bytes[8] = self.value_width;
		bytes[9] = self.block_len_width;
		bytes
	}

	/// Checks that both field widths lie in `1..=32`.
	pub fn check_widths(&self) -> Result<(), KeyfileError> {
		for width in [self.value_width, self.block_len_width] {
			if !(1..=32).contains(&width) {
				return Err(KeyfileError::InvalidFieldWidth(u32::from(width)));
			}
		}
		Ok(())
	}

	/// Number of values the bitstream describes.
	#[inline]
	pub fn pixel_count(&self) -> usize {
		self.width as usize * self.height as usize
	}
}

impl fmt::Display for PixelHeader {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"PixelHeader: {}x{}, {}-bit values, {}-bit runs",
			self.width, self.height, self.value_width, self.block_len_width
		)
	}
}

/// Decoded palette indices of one sprite.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DecodedPixels {
	/// Width in pixels
	pub width: u16,
	/// Height in pixels, excluding the mapping row
	pub height: u16,
	/// Local color-table slot per pixel, row-major; may be shorter than
	/// `width * height` when the stream ended early
	pub indices: Vec<u8>,
	/// Slots that take customization bytes, in customization order
	pub mapping_row: Option<Vec<u8>>,
}

impl DecodedPixels {
	/// Returns `true` if every pixel was decoded.
	pub fn is_complete(&self) -> bool {
		self.indices.len() >= self.width as usize * self.height as usize
	}

	/// Slot at `(x, y)`, `None` past the decoded data.
	#[inline]
	pub fn index_at(&self, x: usize, y: usize) -> Option<u8> {
		self.indices.get(y * self.width as usize + x).copied()
	}

	/// Master index at `(x, y)`; pixels the stream never reached are 0.
	#[inline]
	pub fn master_index_at(&self, table: &ColorTable, x: usize, y: usize) -> u8 {
		self.index_at(x, y).map_or(0, |slot| table.master_index(slot))
	}
}

/// Decodes the bitstream of a blob into raw values.
///
/// Returns the header and the values in stream order, with no mapping-row
/// handling. Running out of bits is not an error.
///
/// # Errors
///
/// Fails when the header is truncated or declares a field width outside
/// `1..=32`.
pub fn decode_values(data: &[u8]) -> Result<(PixelHeader, Vec<u8>), KeyfileError> {
	let header = PixelHeader::from_bytes(data)?;
	header.check_widths()?;
	let value_width = u32::from(header.value_width);
	let block_len_width = u32::from(header.block_len_width);

	let total = header.pixel_count();
	let mut values = Vec::with_capacity(total);
	let mut reader = BitReader::from_slice(&data[PixelHeader::SIZE..]);

	match read_runs(&mut reader, value_width, block_len_width, total, &mut values) {
		Ok(()) | Err(KeyfileError::EndOfStream) => {}
		Err(e) => return Err(e),
	}

	Ok((header, values))
}

fn read_runs<I: Iterator<Item = u8>>(
	reader: &mut BitReader<I>,
	value_width: u32,
	block_len_width: u32,
	total: usize,
	values: &mut Vec<u8>,
) -> Result<(), KeyfileError> {
	while values.len() < total {
		let literal = reader.read_bit()?;
		let run = reader.read_field(block_len_width)? as usize + 1;
		let run = run.min(total - values.len());

		if literal {
			for _ in 0..run {
				values.push(reader.read_field(value_width)? as u8);
			}
		} else {
			let value = reader.read_field(value_width)? as u8;
			values.resize(values.len() + run, value);
		}
	}
	Ok(())
}

/// Decodes a pixel blob.
///
/// With `custom_colors` set and at least one full row decoded, the first row
/// is split off as the mapping row and the height shrinks by one.
pub fn decode(data: &[u8], custom_colors: bool) -> Result<DecodedPixels, KeyfileError> {
	let (header, mut values) = decode_values(data)?;
	let width = header.width as usize;

	let mut height = header.height;
	let mut mapping_row = None;
	if custom_colors && width > 0 && values.len() >= width {
		let rest = values.split_off(width);
		mapping_row = Some(std::mem::replace(&mut values, rest));
		height = height.saturating_sub(1);
	}

	Ok(DecodedPixels {
		width: header.width,
		height,
		indices: values,
		mapping_row,
	})
}

/// Smallest field width able to hold `value`.
fn bits_for(value: u8) -> u8 {
	(u8::BITS - value.leading_zeros()).max(1) as u8
}

/// Encodes palette indices into a pixel blob.
///
/// Runs of two or more equal values become repeat runs, everything else is
/// grouped into literal runs. `block_len_width` bounds a run at
/// `2^block_len_width` pixels.
///
/// # Errors
///
/// Fails when `values` does not hold exactly `width * height` entries or
/// `block_len_width` is outside `1..=16`.
pub fn encode(
	values: &[u8],
	width: u16,
	height: u16,
	block_len_width: u8,
) -> Result<Vec<u8>, KeyfileError> {
	let total = width as usize * height as usize;
	if values.len() != total {
		return Err(KeyfileError::insufficient_data(FileType::PixelBlob, total, values.len()));
	}
	if !(1..=16).contains(&block_len_width) {
		return Err(KeyfileError::InvalidFieldWidth(u32::from(block_len_width)));
	}

	let value_width = bits_for(values.iter().copied().max().unwrap_or(0));
	let max_run = 1usize << block_len_width;
	let header = PixelHeader {
		height,
		width,
		reserved: 0,
		value_width,
		block_len_width,
	};

	let mut writer = BitWriter::new();
	let mut pos = 0;
	while pos < total {
		let repeat = values[pos..].iter().take(max_run).take_while(|&&v| v == values[pos]).count();
		if repeat >= 2 {
			writer.write_bit(false);
			writer.write_field((repeat - 1) as u32, u32::from(block_len_width))?;
			writer.write_field(u32::from(values[pos]), u32::from(value_width))?;
			pos += repeat;
			continue;
		}

		// extend the literal until a repeat of two starts
		let mut end = pos + 1;
		while end < total && end - pos < max_run && !(end + 1 < total && values[end] == values[end + 1])
		{
			end += 1;
		}

		writer.write_bit(true);
		writer.write_field((end - pos - 1) as u32, u32::from(block_len_width))?;
		for &value in &values[pos..end] {
			writer.write_field(u32::from(value), u32::from(value_width))?;
		}
		pos = end;
	}

	let mut out = header.to_bytes().to_vec();
	out.extend_from_slice(&writer.finish());
	Ok(out)
}
