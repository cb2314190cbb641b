//! Color tables, the master palette and alpha resolution.
//!
//! Every sprite carries a color table mapping its local slots to indices in
//! the shared 256-entry master palette. A mapping row in the pixel data plus
//! customization bytes supplied at draw time can override individual slots,
//! which is how one sprite gets recolored per instance.

use std::fmt;
use std::io::Read;
use std::path::Path;

use crate::file::{FileType, KeyfileError};

use super::reference::flags;

/// RGBA color.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
	/// Red component (0-255)
	pub r: u8,
	/// Green component (0-255)
	pub g: u8,
	/// Blue component (0-255)
	pub b: u8,
	/// Alpha component (0-255)
	pub a: u8,
}

impl Color {
	/// Creates a new RGBA color.
	pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
		Self {
			r,
			g,
			b,
			a,
		}
	}

	/// Creates an opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self::new(r, g, b, 255)
	}

	/// Creates an opaque gray.
	pub const fn gray(value: u8) -> Self {
		Self::rgb(value, value, value)
	}

	/// Transparent black.
	pub const fn transparent() -> Self {
		Self::new(0, 0, 0, 0)
	}

	/// Applies `alpha` and scales the color channels by it.
	pub fn premultiplied(self, alpha: u8) -> Self {
		let scale = |channel: u8| (u16::from(channel) * u16::from(alpha) / 255) as u8;
		Self::new(scale(self.r), scale(self.g), scale(self.b), alpha)
	}

	/// Returns the color as `[r, g, b, a]`.
	pub const fn to_array(self) -> [u8; 4] {
		[self.r, self.g, self.b, self.a]
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "RGBA({}, {}, {}, {})", self.r, self.g, self.b, self.a)
	}
}

/// The shared 256-color RGB palette.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterPalette {
	colors: [Color; 256],
}

impl MasterPalette {
	/// Number of palette entries
	pub const PALETTE_SIZE: usize = 256;

	/// Size of a palette file (256 × RGB)
	pub const FILE_SIZE: usize = Self::PALETTE_SIZE * 3;

	/// All-black palette.
	pub fn new() -> Self {
		Self {
			colors: [Color::rgb(0, 0, 0); 256],
		}
	}

	/// Gray ramp, entry `i` is `gray(i)`.
	pub fn grayscale() -> Self {
		let mut palette = Self::new();
		for (i, color) in palette.colors.iter_mut().enumerate() {
			*color = Color::gray(i as u8);
		}
		palette
	}

	/// The classic 8-bit system palette sprites were authored against.
	///
	/// Entries 0..215 walk a 6×6×6 color cube from white down to black
	/// (skipping black), 215..255 hold ten-step red, green, blue and gray
	/// ramps, and 255 is black.
	pub fn macintosh() -> Self {
		const CUBE: [u8; 6] = [0xFF, 0xCC, 0x99, 0x66, 0x33, 0x00];
		const RAMP: [u8; 10] = [0xEE, 0xDD, 0xBB, 0xAA, 0x88, 0x77, 0x55, 0x44, 0x22, 0x11];

		let mut palette = Self::new();
		for i in 0..215 {
			palette.colors[i] = Color::rgb(CUBE[i / 36], CUBE[(i / 6) % 6], CUBE[i % 6]);
		}
		for (step, &level) in RAMP.iter().enumerate() {
			palette.colors[215 + step] = Color::rgb(level, 0, 0);
			palette.colors[225 + step] = Color::rgb(0, level, 0);
			palette.colors[235 + step] = Color::rgb(0, 0, level);
			palette.colors[245 + step] = Color::gray(level);
		}
		palette.colors[255] = Color::rgb(0, 0, 0);
		palette
	}

	/// Loads a palette file (768 bytes of RGB triples).
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, KeyfileError> {
		let data = std::fs::read(path)?;
		Self::from_bytes(&data)
	}

	/// Parses a palette from RGB triples.
	pub fn from_bytes(data: &[u8]) -> Result<Self, KeyfileError> {
		if data.len() < Self::FILE_SIZE {
			return Err(KeyfileError::insufficient_data(
				FileType::Palette,
				Self::FILE_SIZE,
				data.len(),
			));
		}
		Self::from_reader(&mut std::io::Cursor::new(data))
	}

	/// Reads a palette from RGB triples.
	pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, KeyfileError> {
		let mut palette = Self::new();
		for color in palette.colors.iter_mut() {
			let mut rgb = [0u8; 3];
			reader.read_exact(&mut rgb)?;
			*color = Color::rgb(rgb[0], rgb[1], rgb[2]);
		}
		Ok(palette)
	}

	/// Serializes the palette as RGB triples.
	pub fn to_bytes(&self) -> Vec<u8> {
		self.colors.iter().flat_map(|c| [c.r, c.g, c.b]).collect()
	}

	/// Color at `index`.
	#[inline]
	pub fn get(&self, index: u8) -> Color {
		self.colors[index as usize]
	}

	/// Replaces the color at `index`.
	#[inline]
	pub fn set(&mut self, index: u8, color: Color) {
		self.colors[index as usize] = color;
	}

	/// All colors.
	pub fn colors(&self) -> &[Color; 256] {
		&self.colors
	}
}

impl Default for MasterPalette {
	fn default() -> Self {
		Self::macintosh()
	}
}

impl std::ops::Index<u8> for MasterPalette {
	type Output = Color;

	fn index(&self, index: u8) -> &Self::Output {
		&self.colors[index as usize]
	}
}

/// Per-sprite table from local slot to master palette index.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct ColorTable {
	entries: Vec<u16>,
}

impl ColorTable {
	/// Builds a table from raw bytes, one slot per byte.
	pub fn from_bytes(data: &[u8]) -> Self {
		Self {
			entries: data.iter().map(|&b| u16::from(b)).collect(),
		}
	}

	/// Builds a table from explicit entries.
	pub fn from_entries(entries: Vec<u16>) -> Self {
		Self {
			entries,
		}
	}

	/// Number of slots.
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` if the table has no slots.
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Master index of a slot; 0 for slots past the end of the table and
	/// for entries outside the master palette.
	#[inline]
	pub fn master_index(&self, slot: u8) -> u8 {
		self.entries.get(slot as usize).map_or(0, |&index| u8::try_from(index).unwrap_or(0))
	}

	/// All entries.
	pub fn entries(&self) -> &[u16] {
		&self.entries
	}

	/// Applies customization bytes through a mapping row.
	///
	/// For each `i` below the shorter of the two inputs, slot `mapping_row[i]`
	/// takes `custom[i]`. Slots outside the table are skipped.
	pub fn customized(&self, mapping_row: Option<&[u8]>, custom: Option<&[u8]>) -> Self {
		let mut table = self.clone();
		if let (Some(mapping_row), Some(custom)) = (mapping_row, custom) {
			for (&slot, &value) in mapping_row.iter().zip(custom) {
				if let Some(entry) = table.entries.get_mut(slot as usize) {
					*entry = u16::from(value);
				}
			}
		}
		table
	}
}

/// Base alpha for a combination of reference flags.
///
/// Only the two blend bits select the level. The transparent bit never
/// changes it: per-pixel transparency comes from master index 0.
pub fn base_alpha(reference_flags: u32) -> u8 {
	match reference_flags & flags::BLEND_MASK {
		1 => 0xBF,
		2 => 0x7F,
		3 => 0x3F,
		_ => 0xFF,
	}
}

/// Resolves a master index to its final premultiplied color.
#[inline]
pub fn resolve(palette: &MasterPalette, master_index: u8, alpha: u8) -> Color {
	if master_index == 0 {
		return Color::transparent();
	}
	palette.get(master_index).premultiplied(alpha)
}
