//! Decode pipeline properties.

use std::sync::Arc;

use pictkey_rs::prelude::*;
use pictkey_rs::prelude::file::images::pixels;

use crate::{load, reference, sprite_keyfile};

#[test]
fn rle_roundtrip() {
	let shapes = [(1u16, 1u16), (7, 3), (32, 32), (100, 5)];
	for (width, height) in shapes {
		let total = width as usize * height as usize;
		let patterns: [Box<dyn Fn(usize) -> u8>; 4] = [
			Box::new(|_: usize| 0u8),
			Box::new(|i: usize| i as u8),
			Box::new(|i: usize| if (i / 5) % 2 == 0 { 200u8 } else { (i % 3) as u8 }),
			Box::new(|i: usize| ((i * 7919) % 251) as u8),
		];
		for (p, pattern) in patterns.iter().enumerate() {
			let values: Vec<u8> = (0..total).map(pattern).collect();
			for block_len_width in [1u8, 3, 8] {
				let blob = pixels::encode(&values, width, height, block_len_width).unwrap();
				let decoded = pixels::decode(&blob, false).unwrap();
				assert_eq!(
					decoded.indices, values,
					"{width}x{height}, pattern {p}, block_len_width {block_len_width}"
				);
			}
		}
	}
}

#[test]
fn cache_is_idempotent_across_threads() {
	let archive = Arc::new(load(&sprite_keyfile(&reference(1, 0))));
	let custom = [12u8, 34];

	let bitmaps: Vec<Arc<Bitmap>> = (0..4)
		.map(|_| {
			let archive = Arc::clone(&archive);
			std::thread::spawn(move || archive.get_bitmap(1, Some(&custom), false).unwrap())
		})
		.collect::<Vec<_>>()
		.into_iter()
		.map(|handle| handle.join().unwrap())
		.collect();

	for bitmap in &bitmaps {
		assert_eq!(bitmap.pixels(), bitmaps[0].pixels());
		assert_eq!((bitmap.width(), bitmap.height()), (18, 14));
	}
	assert_eq!(archive.cache().bitmap_count(), 1);
}

#[test]
fn slot_zero_is_transparent_everywhere() {
	for reference_flags in [0, 1, 2, 3, flags::TRANSPARENT, flags::TRANSPARENT | 1, flags::TRANSPARENT | 3] {
		let archive = load(&sprite_keyfile(&reference(1, reference_flags)));
		let bitmap = archive.get_bitmap(1, None, reference_flags & 1 == 1).unwrap();

		// the border and the first two rows and columns are slot 0
		for y in 0..3 {
			for x in 0..bitmap.width() {
				assert_eq!(bitmap.pixel(x, y).unwrap()[3], 0);
			}
		}
		let expected_alpha = match reference_flags & flags::BLEND_MASK {
			1 => 0xBF,
			2 => 0x7F,
			3 => 0x3F,
			_ => 0xFF,
		};
		assert_eq!(bitmap.pixel(3, 3).unwrap()[3], expected_alpha);
	}
}

#[test_log::test]
fn missing_lighting_loads_without_light() {
	let dangling = ImageReference {
		lighting_id: Some(4242),
		..reference(1, 0)
	};
	let archive = load(&sprite_keyfile(&dangling));

	assert!(archive.reference(1).is_some());
	assert!(archive.lighting(1).is_none());
	assert!(archive.get_bitmap(1, None, false).is_some());
}

#[test]
fn mask_matches_opaque_pixels() {
	let archive = load(&sprite_keyfile(&reference(1, 0)));
	let mask = archive.alpha_mask(1, false).unwrap();

	assert_eq!((mask.width(), mask.height()), (4, 3));
	// every cell holds at least one pixel outside the transparent margin
	assert_eq!(mask.opaque_cells(), 12);
	assert_eq!(archive.non_transparent_pixel_count(1), Some(14 * 10));
	assert!(archive.has_opaque_rect(1, Rect::new(2, 2, 14, 10)));
	assert!(!archive.has_opaque_rect(1, Rect::new(1, 2, 14, 10)));
}

#[test]
fn checksum_is_deterministic() {
	let archive = load(&sprite_keyfile(&reference(1, 0)));
	let first = archive.compute_checksum(1).unwrap();
	assert_eq!(archive.compute_checksum(1).unwrap(), first);

	let signed = ImageReference {
		checksum: Some(first),
		..reference(1, 0)
	};
	let strict = Archive::from_bytes(
		&sprite_keyfile(&signed).to_bytes(),
		MasterPalette::macintosh(),
		LoadOptions::strict(),
	)
	.unwrap();
	assert_eq!(strict.ids(), vec![1]);
}
