//! Integration tests for `pictkey-rs`, built from synthetic keyfiles.

mod decode;
mod directory;

use pictkey_rs::prelude::*;
use pictkey_rs::prelude::file::images::pixels;

/// Pixel blob id shared by the fixtures
pub(crate) const PIXELS_ID: u32 = 1000;
/// Color table id shared by the fixtures
pub(crate) const COLORS_ID: u32 = 2000;

/// Reference with every optional field present.
pub(crate) fn reference(id: u32, reference_flags: u32) -> ImageReference {
	ImageReference {
		id,
		version: 3,
		pixel_blob_id: PIXELS_ID,
		color_table_id: COLORS_ID,
		flags: Some(reference_flags),
		frame_count: Some(1),
		..ImageReference::default()
	}
}

/// Keyfile with one reference, a 16×12 sprite and an 8-slot color table.
pub(crate) fn sprite_keyfile(reference: &ImageReference) -> KeyfileBuilder {
	let (width, height) = (16u16, 12u16);
	let values: Vec<u8> = (0..width as usize * height as usize)
		.map(|i| {
			let (x, y) = (i % width as usize, i / width as usize);
			if x < 2 || y < 2 { 0 } else { ((x / 3 + y) % 7 + 1) as u8 }
		})
		.collect();

	let mut builder = KeyfileBuilder::new();
	builder
		.add(TypeTag::IMAGE_REFERENCE, reference.id, reference.to_bytes())
		.add(TypeTag::PIXEL_BLOB, PIXELS_ID, pixels::encode(&values, width, height, 4).unwrap())
		.add(TypeTag::COLOR_TABLE, COLORS_ID, vec![0u8, 5, 35, 71, 107, 143, 179, 215]);
	builder
}

pub(crate) fn load(builder: &KeyfileBuilder) -> Archive {
	Archive::from_bytes(&builder.to_bytes(), MasterPalette::macintosh(), LoadOptions::default()).unwrap()
}
