//! Decoded output: RGBA bitmaps and quarter-resolution opacity masks.

use std::fmt;

use serde::Serialize;

use super::palette::{self, ColorTable, MasterPalette};
use super::pixels::DecodedPixels;

/// Transparent border added on every side of a bitmap
pub const BORDER: usize = 1;

/// Side of the square block covered by one mask cell
pub const MASK_CELL: usize = 4;

/// Axis-aligned rectangle in sprite pixel coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Rect {
	/// Left edge
	pub x: u32,
	/// Top edge
	pub y: u32,
	/// Width
	pub width: u32,
	/// Height
	pub height: u32,
}

impl Rect {
	/// Creates a rectangle.
	pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	/// Returns `true` if the rectangle covers no pixels.
	pub const fn is_empty(&self) -> bool {
		self.width == 0 || self.height == 0
	}

	/// Exclusive right edge.
	pub const fn right(&self) -> u64 {
		self.x as u64 + self.width as u64
	}

	/// Exclusive bottom edge.
	pub const fn bottom(&self) -> u64 {
		self.y as u64 + self.height as u64
	}
}

/// Premultiplied RGBA bitmap with a one-pixel transparent border.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bitmap {
	width: u32,
	height: u32,
	pixels: Vec<u8>,
}

impl Bitmap {
	/// Resolves decoded indices into a bitmap.
	///
	/// Pixels missing from a truncated decode come out transparent.
	pub fn from_indices(
		decoded: &DecodedPixels,
		table: &ColorTable,
		master: &MasterPalette,
		alpha: u8,
	) -> Self {
		let src_width = decoded.width as usize;
		let src_height = decoded.height as usize;
		let width = src_width + 2 * BORDER;
		let height = src_height + 2 * BORDER;

		let mut pixels = vec![0u8; width * height * 4];
		for y in 0..src_height {
			let row = (y + BORDER) * width;
			for x in 0..src_width {
				let master_index = decoded.master_index_at(table, x, y);
				let color = palette::resolve(master, master_index, alpha);
				let at = (row + x + BORDER) * 4;
				pixels[at..at + 4].copy_from_slice(&color.to_array());
			}
		}

		Self {
			width: width as u32,
			height: height as u32,
			pixels,
		}
	}

	/// Width including the border.
	pub fn width(&self) -> u32 {
		self.width
	}

	/// Height including the border.
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Raw RGBA bytes, row-major.
	pub fn pixels(&self) -> &[u8] {
		&self.pixels
	}

	/// Consumes the bitmap, returning the RGBA buffer.
	pub fn into_pixels(self) -> Vec<u8> {
		self.pixels
	}

	/// RGBA value at `(x, y)` in bordered coordinates.
	pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
		if x >= self.width || y >= self.height {
			return None;
		}
		let at = (y as usize * self.width as usize + x as usize) * 4;
		Some([self.pixels[at], self.pixels[at + 1], self.pixels[at + 2], self.pixels[at + 3]])
	}
}

impl fmt::Display for Bitmap {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Bitmap: {}x{} RGBA", self.width, self.height)
	}
}

/// 1-bit opacity mask, one cell per 4×4 block of sprite pixels.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlphaMask {
	width: u32,
	height: u32,
	stride: usize,
	bits: Vec<u8>,
}

impl AlphaMask {
	/// Builds the mask; a cell is set when any covered pixel has a non-zero
	/// master index.
	pub fn from_indices(decoded: &DecodedPixels, table: &ColorTable) -> Self {
		let src_width = decoded.width as usize;
		let src_height = decoded.height as usize;
		let width = src_width.div_ceil(MASK_CELL);
		let height = src_height.div_ceil(MASK_CELL);
		let stride = width.div_ceil(8);

		let mut mask = Self {
			width: width as u32,
			height: height as u32,
			stride,
			bits: vec![0u8; stride * height],
		};

		for y in 0..src_height {
			for x in 0..src_width {
				if decoded.master_index_at(table, x, y) != 0 {
					mask.set(x / MASK_CELL, y / MASK_CELL);
				}
			}
		}

		mask
	}

	fn set(&mut self, cx: usize, cy: usize) {
		self.bits[cy * self.stride + cx / 8] |= 0x80 >> (cx % 8);
	}

	/// Mask width in cells.
	pub fn width(&self) -> u32 {
		self.width
	}

	/// Mask height in cells.
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Packed rows, MSB first, `ceil(width / 8)` bytes per row.
	pub fn bits(&self) -> &[u8] {
		&self.bits
	}

	/// Whether the cell at `(cx, cy)` is opaque.
	pub fn cell(&self, cx: u32, cy: u32) -> bool {
		if cx >= self.width || cy >= self.height {
			return false;
		}
		let cx = cx as usize;
		self.bits[cy as usize * self.stride + cx / 8] & (0x80 >> (cx % 8)) != 0
	}

	/// Hit test in sprite pixel coordinates.
	pub fn hit(&self, x: u32, y: u32) -> bool {
		self.cell(x / MASK_CELL as u32, y / MASK_CELL as u32)
	}

	/// Number of opaque cells.
	pub fn opaque_cells(&self) -> usize {
		self.bits.iter().map(|b| b.count_ones() as usize).sum()
	}
}

impl fmt::Display for AlphaMask {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for cy in 0..self.height {
			for cx in 0..self.width {
				f.write_str(if self.cell(cx, cy) { "#" } else { "." })?;
			}
			writeln!(f)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::file::images::palette::Color;

	fn decoded(width: u16, height: u16, indices: Vec<u8>) -> DecodedPixels {
		DecodedPixels {
			width,
			height,
			indices,
			mapping_row: None,
		}
	}

	#[test]
	fn test_bitmap_border_and_colors() {
		let mut master = MasterPalette::new();
		master.set(5, Color::rgb(200, 100, 50));
		let table = ColorTable::from_bytes(&[0, 5]);

		let bitmap = Bitmap::from_indices(&decoded(2, 1, vec![1, 0]), &table, &master, 0xFF);
		assert_eq!(bitmap.width(), 4);
		assert_eq!(bitmap.height(), 3);
		assert_eq!(bitmap.pixels().len(), 4 * 3 * 4);

		assert_eq!(bitmap.pixel(1, 1), Some([200, 100, 50, 255]));
		assert_eq!(bitmap.pixel(2, 1), Some([0, 0, 0, 0]));
		for x in 0..4 {
			assert_eq!(bitmap.pixel(x, 0), Some([0, 0, 0, 0]));
			assert_eq!(bitmap.pixel(x, 2), Some([0, 0, 0, 0]));
		}
		assert_eq!(bitmap.pixel(0, 1), Some([0, 0, 0, 0]));
		assert_eq!(bitmap.pixel(3, 1), Some([0, 0, 0, 0]));
		assert_eq!(bitmap.pixel(4, 0), None);
	}

	#[test]
	fn test_bitmap_premultiplied() {
		let mut master = MasterPalette::new();
		master.set(1, Color::rgb(255, 255, 255));
		let table = ColorTable::from_bytes(&[0, 1]);

		let bitmap = Bitmap::from_indices(&decoded(1, 1, vec![1]), &table, &master, 0x7F);
		assert_eq!(bitmap.pixel(1, 1), Some([0x7F, 0x7F, 0x7F, 0x7F]));
	}

	#[test]
	fn test_truncated_decode_is_transparent() {
		let master = MasterPalette::grayscale();
		// slot 0 is opaque here, undecoded pixels must still be clear
		let table = ColorTable::from_bytes(&[30, 9]);
		let bitmap = Bitmap::from_indices(&decoded(2, 2, vec![1, 0]), &table, &master, 0xFF);
		assert_eq!(bitmap.pixel(1, 1), Some([9, 9, 9, 255]));
		assert_eq!(bitmap.pixel(2, 1), Some([30, 30, 30, 255]));
		assert_eq!(bitmap.pixel(1, 2), Some([0, 0, 0, 0]));
		assert_eq!(bitmap.pixel(2, 2), Some([0, 0, 0, 0]));
	}

	#[test]
	fn test_truncated_decode_leaves_mask_clear() {
		// 8x8 sprite, only the first row was decoded
		let table = ColorTable::from_bytes(&[30, 10]);
		let mask = AlphaMask::from_indices(&decoded(8, 8, vec![1; 8]), &table);
		assert!(mask.cell(0, 0));
		assert!(mask.cell(1, 0));
		assert!(!mask.cell(0, 1));
		assert!(!mask.cell(1, 1));
	}

	#[test]
	fn test_mask_cells() {
		// 9x5 sprite, one opaque pixel at (8, 4) and one at (1, 1)
		let mut indices = vec![0u8; 9 * 5];
		indices[4 * 9 + 8] = 1;
		indices[9 + 1] = 1;
		let table = ColorTable::from_bytes(&[0, 3]);

		let mask = AlphaMask::from_indices(&decoded(9, 5, indices), &table);
		assert_eq!(mask.width(), 3);
		assert_eq!(mask.height(), 2);
		assert!(mask.cell(0, 0));
		assert!(mask.cell(2, 1));
		assert!(!mask.cell(1, 0));
		assert!(!mask.cell(3, 0));
		assert_eq!(mask.opaque_cells(), 2);

		assert!(mask.hit(3, 3));
		assert!(!mask.hit(4, 3));
		assert_eq!(mask.to_string(), "#..\n..#\n");
	}

	#[test]
	fn test_mask_uses_master_index() {
		// slot 1 maps to master 0, still transparent
		let table = ColorTable::from_bytes(&[7, 0]);
		let mask = AlphaMask::from_indices(&decoded(4, 4, vec![1; 16]), &table);
		assert!(!mask.cell(0, 0));
	}

	#[test]
	fn test_rect_edges() {
		let rect = Rect::new(u32::MAX, 1, 2, 0);
		assert_eq!(rect.right(), u64::from(u32::MAX) + 2);
		assert!(rect.is_empty());
	}
}
