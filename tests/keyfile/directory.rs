//! Directory parsing properties.

use pictkey_rs::prelude::*;

use crate::{load, reference, sprite_keyfile};

/// Small deterministic generator for payload sizes.
fn sizes(seed: u32, count: usize) -> Vec<usize> {
	let mut state = seed;
	(0..count)
		.map(|_| {
			state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
			(state >> 16) as usize % 64
		})
		.collect()
}

#[test]
fn entry_count_matches_directory() {
	for (seed, count) in [(1u32, 0usize), (7, 1), (42, 17), (1234, 200)] {
		let mut builder = KeyfileBuilder::new();
		for (i, size) in sizes(seed, count).into_iter().enumerate() {
			builder.add(TypeTag::PIXEL_BLOB, i as u32, vec![i as u8; size]);
		}
		let keyfile = KeyfileFile::from_bytes(&builder.to_bytes()).unwrap();
		assert_eq!(keyfile.entry_count(), count);
		assert_eq!(keyfile.header().entry_count as usize, count);
		assert_eq!(keyfile.valid_entries().count(), count);

		for entry in keyfile.entries() {
			let data = keyfile.entry_data(entry).unwrap();
			assert!(data.iter().all(|&b| b == entry.id as u8));
		}
	}
}

#[test_log::test]
fn out_of_bounds_entry_leaves_holes() {
	let builder = sprite_keyfile(&reference(1, 0));
	let mut bytes = builder.to_bytes();

	// third record (color table): push its size past the end of the file
	let size_at = 12 + 2 * 16 + 4;
	bytes[size_at..size_at + 4].copy_from_slice(&u32::MAX.to_be_bytes());

	let keyfile = KeyfileFile::from_bytes(&bytes).unwrap();
	assert_eq!(keyfile.entry_count(), 3);
	assert_eq!(keyfile.valid_entries().count(), 2);

	let archive = Archive::from_keyfile(keyfile, MasterPalette::default(), LoadOptions::default());
	assert_eq!(archive.ids(), vec![1]);
	assert!(archive.lookup(TypeTag::COLOR_TABLE, crate::COLORS_ID).is_none());
	assert!(archive.lookup(TypeTag::IMAGE_REFERENCE, 1).is_some());
	assert!(archive.get_bitmap(1, None, false).is_none());
	assert_eq!(archive.size(1), Some((16, 12)));
}

#[test]
fn fatal_container_errors() {
	let bytes = sprite_keyfile(&reference(1, 0)).to_bytes();

	let mut bad_magic = bytes.clone();
	bad_magic[0] = 0x00;
	assert!(matches!(KeyfileFile::from_bytes(&bad_magic), Err(KeyfileError::InvalidMagic { .. })));

	let truncated = &bytes[..12 + 16 + 8];
	assert!(matches!(
		Archive::from_bytes(truncated, MasterPalette::default(), LoadOptions::default()),
		Err(KeyfileError::DirectoryTruncated {
			declared: 3,
			available: 1
		})
	));

	assert!(matches!(
		Archive::open("does/not/exist.keyfile", MasterPalette::default(), LoadOptions::default()),
		Err(KeyfileError::IoError(_))
	));
}

#[test]
fn repacked_keyfile_loads_identically() {
	let original = load(&sprite_keyfile(&reference(9, 0)));

	let keyfile = KeyfileFile::from_bytes(&sprite_keyfile(&reference(9, 0)).to_bytes()).unwrap();
	let mut builder = KeyfileBuilder::new();
	for entry in keyfile.valid_entries() {
		builder.add(entry.tag(), entry.id, keyfile.entry_data(entry).unwrap());
	}
	let repacked = load(&builder);

	assert_eq!(repacked.ids(), original.ids());
	assert_eq!(
		repacked.get_bitmap(9, None, false).unwrap().pixels(),
		original.get_bitmap(9, None, false).unwrap().pixels()
	);
}
