//! Benchmark helper utilities for pictkey-rs
//!
//! Generates synthetic sprites and keyfiles so the benchmarks need no binary
//! fixtures. Sprites mix long flat areas (repeat runs) with dithered edges
//! (literal runs), which is how hand-drawn keyfile sprites compress.

use pictkey_types::file::{
	images::{ImageReference, flags, pixels},
	keyfile::{Builder, TypeTag},
};

/// Pixel blob id used by [`generate_keyfile`]
pub const PIXELS_ID: u32 = 1;

/// Color table id used by [`generate_keyfile`]
pub const COLORS_ID: u32 = 2;

/// Image reference id used by [`generate_keyfile`]
pub const REFERENCE_ID: u32 = 128;

/// Generates palette slots for a `width × height` sprite.
pub fn generate_sprite_values(width: u16, height: u16) -> Vec<u8> {
	let (width, height) = (width as usize, height as usize);
	(0..width * height)
		.map(|i| {
			let (x, y) = (i % width, i / width);
			let dx = x.abs_diff(width / 2);
			let dy = y.abs_diff(height / 2);
			let r = dx * dx + dy * dy;
			let edge = (width.min(height) / 2).pow(2);
			if r > edge {
				0
			} else if r + width > edge {
				// dithered rim
				((x ^ y) % 5 + 1) as u8
			} else {
				(y * 8 / height.max(1) + 6) as u8
			}
		})
		.collect()
}

/// Generates an encoded pixel blob.
pub fn generate_pixel_blob(width: u16, height: u16) -> Vec<u8> {
	let values = generate_sprite_values(width, height);
	pixels::encode(&values, width, height, 5).unwrap_or_default()
}

/// Generates a keyfile holding one sprite with a 16-slot color table.
pub fn generate_keyfile(width: u16, height: u16) -> Vec<u8> {
	let reference = ImageReference {
		id: REFERENCE_ID,
		version: 1,
		pixel_blob_id: PIXELS_ID,
		color_table_id: COLORS_ID,
		flags: Some(flags::TRANSPARENT),
		frame_count: Some(1),
		..ImageReference::default()
	};
	let color_table: Vec<u8> = (0..16u8).map(|slot| slot * 13).collect();

	let mut builder = Builder::new();
	builder
		.add(TypeTag::IMAGE_REFERENCE, REFERENCE_ID, reference.to_bytes())
		.add(TypeTag::PIXEL_BLOB, PIXELS_ID, generate_pixel_blob(width, height))
		.add(TypeTag::COLOR_TABLE, COLORS_ID, color_table);
	builder.to_bytes()
}

/// Common benchmark sizes for synthetic sprites
pub mod sizes {
	/// Icon: 32x32 (1,024 pixels)
	pub const ICON: (u16, u16) = (32, 32);
	/// Character sprite: 64x96 (6,144 pixels)
	pub const CHARACTER: (u16, u16) = (64, 96);
	/// Large sprite: 256x256 (65,536 pixels)
	pub const LARGE: (u16, u16) = (256, 256);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_generated_blob_decodes() {
		let (width, height) = sizes::CHARACTER;
		let blob = generate_pixel_blob(width, height);
		let decoded = pixels::decode(&blob, false).unwrap();
		assert_eq!(decoded.indices, generate_sprite_values(width, height));
	}

	#[test]
	fn test_generated_keyfile_parses() {
		let data = generate_keyfile(32, 32);
		let keyfile = pictkey_types::file::keyfile::File::from_bytes(&data).unwrap();
		assert_eq!(keyfile.entry_count(), 3);
	}
}
