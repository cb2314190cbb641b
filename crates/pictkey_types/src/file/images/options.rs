//! Load options for image archives.
//!
//! Controls what happens at load time beyond the mandatory directory parse:
//! whether stored checksums are enforced, whether item records are decoded,
//! and how large a single sprite may be before decoding is refused.

use serde::{Deserialize, Serialize};

/// Options applied when building an [`Archive`](super::Archive).
///
/// # Presets
///
/// - `default()`: no checksum enforcement, items loaded, sprites up to 4096×4096
/// - `strict()`: checksums enforced, sprites up to 1024×1024
/// - `lenient()`: no checksum enforcement, no sprite size bound
///
/// Every field has a serde default, so a partial JSON document such as
/// `{"verify_checksums": true}` deserializes into the default preset with
/// that one change.
///
/// # Examples
///
/// ```
/// use pictkey_types::file::images::LoadOptions;
///
/// let options = LoadOptions::strict();
/// assert!(options.verify_checksums);
///
/// let options = LoadOptions::new(false, false, 64 * 64);
/// assert_eq!(options.max_pixels, 4096);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
	/// Drop references whose stored checksum does not match the computed one
	pub verify_checksums: bool,
	/// Decode item records
	pub load_items: bool,
	/// Largest pixel count (`width * height` of the blob) decoded per sprite
	pub max_pixels: usize,
}

impl Default for LoadOptions {
	fn default() -> Self {
		Self {
			verify_checksums: false,
			load_items: true,
			max_pixels: 4096 * 4096,
		}
	}
}

impl LoadOptions {
	/// Create options with explicit values.
	///
	/// # Arguments
	/// * `verify_checksums` - Enforce stored checksums at load time
	/// * `load_items` - Decode item records
	/// * `max_pixels` - Per-sprite pixel bound
	pub fn new(verify_checksums: bool, load_items: bool, max_pixels: usize) -> Self {
		Self {
			verify_checksums,
			load_items,
			max_pixels,
		}
	}

	/// Create strict options.
	///
	/// - `verify_checksums`: true
	/// - `load_items`: true
	/// - `max_pixels`: 1024 × 1024
	pub fn strict() -> Self {
		Self {
			verify_checksums: true,
			load_items: true,
			max_pixels: 1024 * 1024,
		}
	}

	/// Create lenient options.
	///
	/// - `verify_checksums`: false
	/// - `load_items`: true
	/// - `max_pixels`: unbounded
	pub fn lenient() -> Self {
		Self {
			verify_checksums: false,
			load_items: true,
			max_pixels: usize::MAX,
		}
	}
}
