//! Memoized decode results.
//!
//! Two independent maps, one for bitmaps keyed by
//! `(reference id, customization bytes, force-transparent)` and one for
//! opacity masks keyed by `(reference id, force-transparent)`. The lock is
//! held only around map access, never while decoding, so two threads asking
//! for the same missing key may both decode it. Decoding is pure, the second
//! insert simply replaces an equal value.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use super::bitmap::{AlphaMask, Bitmap};

/// Cache key of a decoded bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitmapKey {
	/// Image reference id
	pub id: u32,
	/// Customization bytes, empty for none
	pub custom: Vec<u8>,
	/// Transparency override
	pub force_transparent: bool,
}

impl BitmapKey {
	/// Creates a key.
	pub fn new(id: u32, custom: Option<&[u8]>, force_transparent: bool) -> Self {
		Self {
			id,
			custom: custom.map(<[u8]>::to_vec).unwrap_or_default(),
			force_transparent,
		}
	}
}

/// Cache key of an opacity mask.
pub type MaskKey = (u32, bool);

#[derive(Debug)]
struct Slot<K, V> {
	map: Mutex<HashMap<K, Arc<V>>>,
}

impl<K: Eq + Hash, V> Slot<K, V> {
	fn new() -> Self {
		Self {
			map: Mutex::new(HashMap::new()),
		}
	}

	fn lock(&self) -> MutexGuard<'_, HashMap<K, Arc<V>>> {
		// a poisoned map holds only complete entries
		self.map.lock().unwrap_or_else(PoisonError::into_inner)
	}

	fn get(&self, key: &K) -> Option<Arc<V>> {
		self.lock().get(key).cloned()
	}

	fn get_or_insert_with<F>(&self, key: K, decode: F) -> Option<Arc<V>>
	where
		F: FnOnce() -> Option<V>,
	{
		if let Some(hit) = self.get(&key) {
			return Some(hit);
		}
		let value = Arc::new(decode()?);
		self.lock().insert(key, Arc::clone(&value));
		Some(value)
	}
}

/// Bitmap and mask caches owned by one archive.
#[derive(Debug)]
pub struct DecodeCache {
	bitmaps: Slot<BitmapKey, Bitmap>,
	masks: Slot<MaskKey, AlphaMask>,
}

impl DecodeCache {
	/// Creates an empty cache.
	pub fn new() -> Self {
		Self {
			bitmaps: Slot::new(),
			masks: Slot::new(),
		}
	}

	/// Cached bitmap for `key`, if any.
	pub fn bitmap(&self, key: &BitmapKey) -> Option<Arc<Bitmap>> {
		self.bitmaps.get(key)
	}

	/// Returns the cached bitmap or runs `decode` and stores its result.
	///
	/// A `None` from `decode` is not cached.
	pub fn bitmap_or_insert_with<F>(&self, key: BitmapKey, decode: F) -> Option<Arc<Bitmap>>
	where
		F: FnOnce() -> Option<Bitmap>,
	{
		self.bitmaps.get_or_insert_with(key, || {
			debug!("Bitmap cache miss");
			decode()
		})
	}

	/// Cached mask for `key`, if any.
	pub fn mask(&self, key: &MaskKey) -> Option<Arc<AlphaMask>> {
		self.masks.get(key)
	}

	/// Returns the cached mask or runs `build` and stores its result.
	pub fn mask_or_insert_with<F>(&self, key: MaskKey, build: F) -> Option<Arc<AlphaMask>>
	where
		F: FnOnce() -> Option<AlphaMask>,
	{
		self.masks.get_or_insert_with(key, || {
			debug!("Mask cache miss for reference {}", key.0);
			build()
		})
	}

	/// Number of cached bitmaps.
	pub fn bitmap_count(&self) -> usize {
		self.bitmaps.lock().len()
	}

	/// Number of cached masks.
	pub fn mask_count(&self) -> usize {
		self.masks.lock().len()
	}

	/// Drops every cached bitmap and mask.
	pub fn clear(&self) {
		self.bitmaps.lock().clear();
		self.masks.lock().clear();
	}
}

impl Default for DecodeCache {
	fn default() -> Self {
		Self::new()
	}
}
