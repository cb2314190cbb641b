//! Sprite archive on top of a keyfile.
//!
//! An [`Archive`] routes the directory of a [`keyfile::File`] into id-keyed
//! tables and decodes sprites on request:
//!
//! ```text
//! image reference ──► pixel blob ──► indices ─┐
//!        │                                    ├──► RGBA bitmap (+1px border)
//!        └──────────► color table ──► slots ──┘        │
//!                          ▲                           ▼
//!              mapping row + custom bytes         DecodeCache
//! ```
//!
//! | Type tag | Table            | Decoded at load            |
//! |----------|------------------|----------------------------|
//! | `PDf5`   | image references | yes, with lighting         |
//! | `Bmap`   | pixel blobs      | no, on first draw          |
//! | `Clrs`   | color tables     | no, on first draw          |
//! | `Lite`   | lighting blobs   | through their references   |
//! | `ItDf`   | item records     | yes, unless disabled       |
//!
//! Records with other tags are ignored. Later records win over earlier ones
//! with the same tag and id.
//!
//! # Examples
//!
//! ```no_run
//! use pictkey_types::file::images::{Archive, LoadOptions, MasterPalette};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let archive = Archive::open("Images.keyfile", MasterPalette::default(), LoadOptions::default())?;
//!
//! if let Some(bitmap) = archive.get_bitmap(128, None, false) {
//!     println!("{bitmap}");
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use log::{debug, trace, warn};

use crate::file::{
	FileType, KeyfileError,
	item::ItemRecord,
	keyfile::{self, EntryLookup, TypeTag},
};

pub mod bitmap;
pub mod cache;
pub mod checksum;
pub mod options;
pub mod palette;
pub mod pixels;
pub mod reference;

pub use bitmap::{AlphaMask, Bitmap, Rect};
pub use cache::{BitmapKey, DecodeCache};
pub use options::LoadOptions;
pub use palette::{Color, ColorTable, MasterPalette};
pub use pixels::{DecodedPixels, PixelHeader};
pub use reference::{ImageReference, LightInfo, flags};

/// Loaded sprite archive.
///
/// Immutable after construction apart from its [`DecodeCache`], which is
/// internally synchronized, so an `Archive` can be shared across threads.
#[derive(Debug)]
pub struct Archive {
	raw: Vec<u8>,
	references: HashMap<u32, ImageReference>,
	reference_records: HashMap<u32, Range<usize>>,
	item_records: HashMap<u32, Range<usize>>,
	pixel_blobs: HashMap<u32, Range<usize>>,
	color_tables: HashMap<u32, Range<usize>>,
	lighting: HashMap<u32, Range<usize>>,
	items: BTreeMap<u32, ItemRecord>,
	palette: MasterPalette,
	options: LoadOptions,
	cache: DecodeCache,
}

impl Archive {
	/// Opens a keyfile and loads it.
	///
	/// # Errors
	///
	/// Fails on I/O errors, a bad magic or a truncated directory.
	pub fn open(
		path: impl AsRef<std::path::Path>,
		palette: MasterPalette,
		options: LoadOptions,
	) -> Result<Self, KeyfileError> {
		let file = keyfile::File::open(path)?;
		Ok(Self::from_keyfile(file, palette, options))
	}

	/// Parses and loads a keyfile held in memory.
	pub fn from_bytes(
		data: &[u8],
		palette: MasterPalette,
		options: LoadOptions,
	) -> Result<Self, KeyfileError> {
		let file = keyfile::File::from_bytes(data)?;
		Ok(Self::from_keyfile(file, palette, options))
	}

	/// Builds the archive from a parsed keyfile.
	///
	/// Never fails: bad records are logged and left out.
	pub fn from_keyfile(file: keyfile::File, palette: MasterPalette, options: LoadOptions) -> Self {
		let mut archive = Self {
			raw: Vec::new(),
			references: HashMap::new(),
			reference_records: HashMap::new(),
			item_records: HashMap::new(),
			pixel_blobs: HashMap::new(),
			color_tables: HashMap::new(),
			lighting: HashMap::new(),
			items: BTreeMap::new(),
			palette,
			options,
			cache: DecodeCache::new(),
		};

		let mut reference_ranges = Vec::new();
		let mut item_ranges = Vec::new();
		for entry in file.valid_entries() {
			let Some(range) = entry.range(file.as_bytes().len()) else {
				continue;
			};
			let table = match entry.tag() {
				TypeTag::IMAGE_REFERENCE => {
					reference_ranges.push((entry.id, range.clone()));
					archive.reference_records.insert(entry.id, range);
					continue;
				}
				TypeTag::ITEM => {
					item_ranges.push((entry.id, range.clone()));
					archive.item_records.insert(entry.id, range);
					continue;
				}
				TypeTag::PIXEL_BLOB => &mut archive.pixel_blobs,
				TypeTag::COLOR_TABLE => &mut archive.color_tables,
				TypeTag::LIGHTING => &mut archive.lighting,
				other => {
					trace!("Ignoring entry {} with type {other}", entry.id);
					continue;
				}
			};
			trace!("Routing {} #{}", entry.tag(), entry.id);
			if table.insert(entry.id, range).is_some() {
				debug!("Duplicate {} #{}, keeping the later record", entry.tag(), entry.id);
			}
		}

		let (raw, _) = file.into_parts();
		archive.raw = raw;

		for (id, range) in reference_ranges {
			archive.load_reference(id, range);
		}
		archive.check_pixel_blobs();
		if archive.options.load_items {
			for (id, range) in item_ranges {
				archive.load_item(id, range);
			}
		}
		if archive.options.verify_checksums {
			archive.drop_mismatched_references();
		}

		debug!("Loaded {archive}");
		archive
	}

	fn load_reference(&mut self, id: u32, range: Range<usize>) {
		let mut reference = match ImageReference::from_bytes(id, &self.raw[range]) {
			Ok(reference) => reference,
			Err(e) => {
				warn!("Skipping image reference {id}: {e}");
				return;
			}
		};

		if let Some(lighting_id) = reference.lighting_id() {
			match self.lighting_bytes(lighting_id).map(LightInfo::from_bytes) {
				Some(Ok(light)) => reference.light = Some(light),
				Some(Err(e)) => warn!("Image reference {id}: bad lighting blob {lighting_id}: {e}"),
				None => warn!("Image reference {id}: lighting blob {lighting_id} not found"),
			}
		}

		if self.references.insert(id, reference).is_some() {
			debug!("Duplicate image reference #{id}, keeping the later record");
		}
	}

	/// Reports unusable pixel blobs at load time.
	fn check_pixel_blobs(&self) {
		for id in self.ids() {
			if let Some(Err(e)) = self.checked_pixel_bytes(id) {
				warn!("Image reference {id}: {e}");
			}
		}
	}

	/// Pixel blob of a reference, if its header is decodable within limits.
	fn checked_pixel_bytes(&self, id: u32) -> Option<Result<&[u8], KeyfileError>> {
		let reference = self.references.get(&id)?;
		let Some(data) = self.pixel_bytes(reference.pixel_blob_id) else {
			return Some(Err(KeyfileError::entry_not_found(
				FileType::PixelBlob,
				format!("id {}", reference.pixel_blob_id),
			)));
		};
		let result = PixelHeader::from_bytes(data).and_then(|header| {
			header.check_widths()?;
			let count = header.pixel_count();
			if count > self.options.max_pixels {
				return Err(KeyfileError::SpriteTooLarge {
					id: reference.pixel_blob_id,
					pixels: count,
					limit: self.options.max_pixels,
				});
			}
			Ok(data)
		});
		Some(result)
	}

	fn load_item(&mut self, id: u32, range: Range<usize>) {
		match ItemRecord::from_bytes(id, &self.raw[range]) {
			Ok(item) => {
				self.items.insert(id, item);
			}
			Err(e) => warn!("Skipping item {id}: {e}"),
		}
	}

	fn drop_mismatched_references(&mut self) {
		let failed: Vec<u32> = self
			.references
			.keys()
			.copied()
			.filter(|&id| match self.verify_checksum(id) {
				Ok(()) => false,
				Err(e) => {
					warn!("Dropping image reference {id}: {e}");
					true
				}
			})
			.collect();
		for id in failed {
			self.references.remove(&id);
		}
	}

	fn blob(&self, table: &HashMap<u32, Range<usize>>, id: u32) -> Option<&[u8]> {
		table.get(&id).map(|range| &self.raw[range.clone()])
	}

	fn pixel_bytes(&self, id: u32) -> Option<&[u8]> {
		self.blob(&self.pixel_blobs, id)
	}

	fn color_bytes(&self, id: u32) -> Option<&[u8]> {
		self.blob(&self.color_tables, id)
	}

	fn lighting_bytes(&self, id: u32) -> Option<&[u8]> {
		self.blob(&self.lighting, id)
	}

	/// Image reference by id.
	pub fn reference(&self, id: u32) -> Option<&ImageReference> {
		self.references.get(&id)
	}

	/// Ids of all loaded image references, ascending.
	pub fn ids(&self) -> Vec<u32> {
		let mut ids: Vec<u32> = self.references.keys().copied().collect();
		ids.sort_unstable();
		ids
	}

	/// Number of loaded image references.
	pub fn len(&self) -> usize {
		self.references.len()
	}

	/// Returns `true` if no image reference was loaded.
	pub fn is_empty(&self) -> bool {
		self.references.is_empty()
	}

	/// Item record by id.
	pub fn item(&self, id: u32) -> Option<&ItemRecord> {
		self.items.get(&id)
	}

	/// All item records, ordered by id.
	pub fn items(&self) -> impl Iterator<Item = &ItemRecord> {
		self.items.values()
	}

	/// Master palette bitmaps are resolved against.
	pub fn palette(&self) -> &MasterPalette {
		&self.palette
	}

	/// Options the archive was loaded with.
	pub fn options(&self) -> &LoadOptions {
		&self.options
	}

	/// The decode cache.
	pub fn cache(&self) -> &DecodeCache {
		&self.cache
	}

	/// Discards every cached bitmap and mask.
	pub fn clear_cache(&self) {
		self.cache.clear();
	}

	/// Color table of a reference, without customization.
	pub fn color_table(&self, id: u32) -> Option<ColorTable> {
		let reference = self.references.get(&id)?;
		self.color_bytes(reference.color_table_id).map(ColorTable::from_bytes)
	}

	/// Decodes the palette indices of a reference, bypassing the cache.
	///
	/// Returns `None` when the reference or its pixel blob is missing, the
	/// blob is malformed or too large, or no pixel could be decoded.
	pub fn decode_indices(&self, id: u32) -> Option<DecodedPixels> {
		let custom_colors = self.references.get(&id)?.has_custom_colors();
		let result = self
			.checked_pixel_bytes(id)?
			.and_then(|data| pixels::decode(data, custom_colors));

		match result {
			Ok(decoded) if decoded.indices.is_empty() => {
				debug!("Image reference {id}: pixel blob decoded to nothing");
				None
			}
			Ok(decoded) => {
				if !decoded.is_complete() {
					debug!(
						"Image reference {id}: bitstream ended after {} of {} pixels",
						decoded.indices.len(),
						decoded.width as usize * decoded.height as usize
					);
				}
				Some(decoded)
			}
			Err(e) => {
				// already reported by check_pixel_blobs
				debug!("Image reference {id}: {e}");
				None
			}
		}
	}

	/// Decoded RGBA bitmap of a reference, from the cache when possible.
	///
	/// `custom` recolors the slots listed in the sprite's mapping row.
	/// `force_transparent` adds the transparent flag for this draw; it keeps
	/// its own cache entry.
	pub fn get_bitmap(
		&self,
		id: u32,
		custom: Option<&[u8]>,
		force_transparent: bool,
	) -> Option<Arc<Bitmap>> {
		let key = BitmapKey::new(id, custom, force_transparent);
		self.cache.bitmap_or_insert_with(key, || self.decode_bitmap(id, custom, force_transparent))
	}

	fn decode_bitmap(&self, id: u32, custom: Option<&[u8]>, force_transparent: bool) -> Option<Bitmap> {
		let mut reference_flags = self.flags(id)?;
		if force_transparent {
			reference_flags |= flags::TRANSPARENT;
		}
		let decoded = self.decode_indices(id)?;
		let table = self.color_table(id)?.customized(decoded.mapping_row.as_deref(), custom);
		Some(Bitmap::from_indices(&decoded, &table, &self.palette, palette::base_alpha(reference_flags)))
	}

	/// Quarter-resolution opacity mask of a reference, from the cache when
	/// possible. Customization never affects the mask.
	pub fn alpha_mask(&self, id: u32, force_transparent: bool) -> Option<Arc<AlphaMask>> {
		self.cache.mask_or_insert_with((id, force_transparent), || {
			let decoded = self.decode_indices(id)?;
			let table = self.color_table(id)?;
			Some(AlphaMask::from_indices(&decoded, &table))
		})
	}

	/// Sprite dimensions as `(width, height)`, excluding the border and the
	/// mapping row. Read from the blob header, no decoding happens.
	pub fn size(&self, id: u32) -> Option<(u16, u16)> {
		let reference = self.references.get(&id)?;
		let header = PixelHeader::from_bytes(self.pixel_bytes(reference.pixel_blob_id)?).ok()?;
		let mut height = header.height;
		if reference.has_custom_colors() && header.width > 0 {
			height = height.saturating_sub(1);
		}
		Some((header.width, height))
	}

	/// Declared frame count.
	pub fn frame_count(&self, id: u32) -> Option<u16> {
		self.references.get(&id).map(ImageReference::frame_count)
	}

	/// Frame to show for an animation counter.
	pub fn frame_index(&self, id: u32, counter: u32) -> Option<u16> {
		self.references.get(&id).map(|reference| reference.frame_index(counter))
	}

	/// Draw plane.
	pub fn plane(&self, id: u32) -> Option<i16> {
		self.references.get(&id).map(ImageReference::plane)
	}

	/// Rendering flags.
	pub fn flags(&self, id: u32) -> Option<u32> {
		self.references.get(&id).map(ImageReference::flags)
	}

	/// Light source attached to a reference.
	pub fn lighting(&self, id: u32) -> Option<&LightInfo> {
		self.references.get(&id)?.light.as_ref()
	}

	/// Whether the sprite is drawn with a blend level.
	pub fn is_semi_transparent(&self, id: u32) -> bool {
		self.references.get(&id).is_some_and(|reference| reference.blend() != 0)
	}

	/// Number of pixels resolving to a non-zero master index.
	pub fn non_transparent_pixel_count(&self, id: u32) -> Option<usize> {
		let decoded = self.decode_indices(id)?;
		let table = self.color_table(id)?;
		let count = decoded.indices.iter().filter(|&&slot| table.master_index(slot) != 0).count();
		Some(count)
	}

	/// Whether every pixel of `rect` is fully opaque.
	///
	/// False for blended sprites, empty rectangles, rectangles reaching
	/// outside the sprite and missing references.
	pub fn has_opaque_rect(&self, id: u32, rect: Rect) -> bool {
		if rect.is_empty() || self.is_semi_transparent(id) {
			return false;
		}
		let (Some(decoded), Some(table)) = (self.decode_indices(id), self.color_table(id)) else {
			return false;
		};
		if rect.right() > u64::from(decoded.width) || rect.bottom() > u64::from(decoded.height) {
			return false;
		}

		let (x0, y0) = (rect.x as usize, rect.y as usize);
		let (x1, y1) = (x0 + rect.width as usize, y0 + rect.height as usize);
		(y0..y1).all(|y| (x0..x1).all(|x| decoded.master_index_at(&table, x, y) != 0))
	}

	/// Computes the checksum of a reference from the data it points at.
	///
	/// # Errors
	///
	/// Fails when the reference, its pixel blob or its color table is missing.
	pub fn compute_checksum(&self, id: u32) -> Result<u32, KeyfileError> {
		let reference = self.references.get(&id).ok_or_else(|| {
			KeyfileError::entry_not_found(FileType::ImageReference, format!("id {id}"))
		})?;
		let pixel_bytes = self.pixel_bytes(reference.pixel_blob_id).ok_or_else(|| {
			KeyfileError::entry_not_found(
				FileType::PixelBlob,
				format!("id {} for reference {id}", reference.pixel_blob_id),
			)
		})?;
		let color_bytes = self.color_bytes(reference.color_table_id).ok_or_else(|| {
			KeyfileError::entry_not_found(
				FileType::ColorTable,
				format!("id {} for reference {id}", reference.color_table_id),
			)
		})?;
		let light_bytes = reference
			.lighting_id()
			.and_then(|lighting_id| self.lighting_bytes(lighting_id))
			.map(|bytes| &bytes[..bytes.len().min(reference::LIGHT_INFO_SIZE)]);

		Ok(checksum::compute(pixel_bytes, color_bytes, light_bytes, reference))
	}

	/// Checks a reference's stored checksum.
	///
	/// References without a stored checksum, or with a stored zero, pass
	/// without looking at their payloads.
	///
	/// # Errors
	///
	/// Returns [`KeyfileError::ChecksumMismatch`] on mismatch, or the error of
	/// [`Self::compute_checksum`] for signed references.
	pub fn verify_checksum(&self, id: u32) -> Result<(), KeyfileError> {
		let reference = self.references.get(&id).ok_or_else(|| {
			KeyfileError::entry_not_found(FileType::ImageReference, format!("id {id}"))
		})?;
		let Some(stored) = reference.checksum.filter(|&stored| stored != 0) else {
			return Ok(());
		};
		let computed = self.compute_checksum(id)?;
		if stored != computed {
			return Err(KeyfileError::ChecksumMismatch {
				id,
				stored,
				computed,
			});
		}
		Ok(())
	}
}

impl EntryLookup for Archive {
	fn lookup(&self, type_tag: TypeTag, id: u32) -> Option<(u32, u32)> {
		let table = match type_tag {
			TypeTag::IMAGE_REFERENCE => &self.reference_records,
			TypeTag::ITEM => &self.item_records,
			TypeTag::PIXEL_BLOB => &self.pixel_blobs,
			TypeTag::COLOR_TABLE => &self.color_tables,
			TypeTag::LIGHTING => &self.lighting,
			_ => return None,
		};
		table.get(&id).map(|range| (range.start as u32, range.len() as u32))
	}
}

impl fmt::Display for Archive {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"Image archive: {} references, {} pixel blobs, {} color tables, {} lighting blobs, {} items",
			self.references.len(),
			self.pixel_blobs.len(),
			self.color_tables.len(),
			self.lighting.len(),
			self.items.len()
		)
	}
}
