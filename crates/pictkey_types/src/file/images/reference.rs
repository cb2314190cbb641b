//! Image reference records.
//!
//! A reference binds a pixel blob and a color table together with rendering
//! flags, an optional light source and an optional animation table. Only the
//! first three fields are mandatory; everything after them was appended in
//! later archive revisions and is read only while bytes remain:
//!
//! ```text
//! Field            Type       Presence
//! ---------------  ---------  -----------
//! version          u16        always
//! pixel_blob_id    u32        always
//! color_table_id   u32        always
//! checksum         u32        optional
//! flags            u32        optional
//! unused_flags     u32        optional
//! unused_flags_2   u32        optional
//! lighting_id      i32        optional
//! plane            i16        optional
//! frame_count      i16        optional
//! anim_count       i16        optional
//! anim_frames      i16 × n    optional, n = min(anim_count, 16)
//! ```

use std::fmt;

use serde::Serialize;

use crate::file::{FileType, KeyfileError, cursor::FieldCursor};

/// Reference flag bits.
pub mod flags {
	/// Sprite uses index-0 transparency
	pub const TRANSPARENT: u32 = 0x8000;

	/// First decoded row is a custom-color mapping row
	pub const CUSTOM_COLORS: u32 = 0x2000;

	/// Two-bit blend level (0 = opaque, 1..=3 = increasingly translucent)
	pub const BLEND_MASK: u32 = 0x0003;
}

/// Maximum number of animation table entries
pub const MAX_ANIM_FRAMES: usize = 16;

/// Size of a lighting blob record
pub const LIGHT_INFO_SIZE: usize = 8;

/// Light source attached to a sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LightInfo {
	/// Light color (RGBA)
	pub color: [u8; 4],
	/// Radius in pixels
	pub radius: u16,
	/// Draw plane of the light
	pub plane: i16,
}

impl LightInfo {
	/// Parses a lighting blob, extra trailing bytes are ignored.
	pub fn from_bytes(data: &[u8]) -> Result<Self, KeyfileError> {
		let mut cursor = FieldCursor::new(data, FileType::Lighting);
		let color = cursor.take(4)?;
		Ok(Self {
			color: [color[0], color[1], color[2], color[3]],
			radius: cursor.read_u16()?,
			plane: cursor.read_i16()?,
		})
	}

	/// Serializes the lighting blob.
	pub fn to_bytes(&self) -> [u8; LIGHT_INFO_SIZE] {
		let mut bytes = [0u8; LIGHT_INFO_SIZE];
		bytes[0..4].copy_from_slice(&self.color);
		bytes[4..6].copy_from_slice(&self.radius.to_be_bytes());
		bytes[6..8].copy_from_slice(&self.plane.to_be_bytes());
		bytes
	}
}

/// Parsed image reference record.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImageReference {
	/// Directory id of this reference
	pub id: u32,
	/// Record version
	pub version: u16,
	/// Id of the pixel blob
	pub pixel_blob_id: u32,
	/// Id of the color table
	pub color_table_id: u32,
	/// Stored integrity tag
	pub checksum: Option<u32>,
	/// Rendering flags (see [`flags`])
	pub flags: Option<u32>,
	/// Reserved flag word
	pub unused_flags: Option<u32>,
	/// Second reserved flag word
	pub unused_flags_2: Option<u32>,
	/// Id of the lighting blob, 0 for none
	pub lighting_id: Option<i32>,
	/// Draw plane
	pub plane: Option<i16>,
	/// Number of frames stacked vertically in the bitmap
	pub frame_count: Option<i16>,
	/// Number of animation table entries in use
	pub anim_count: Option<i16>,
	/// Animation table, frame number per step
	pub anim_frames: Vec<i16>,
	/// Light resolved from `lighting_id`
	pub light: Option<LightInfo>,
}

impl ImageReference {
	/// Parses a reference record.
	///
	/// # Errors
	///
	/// Fails only when one of the three mandatory fields is truncated.
	pub fn from_bytes(id: u32, data: &[u8]) -> Result<Self, KeyfileError> {
		let mut cursor = FieldCursor::new(data, FileType::ImageReference);

		let mut reference = Self {
			id,
			version: cursor.read_u16()?,
			pixel_blob_id: cursor.read_u32()?,
			color_table_id: cursor.read_u32()?,
			..Self::default()
		};

		reference.checksum = cursor.opt_u32();
		reference.flags = cursor.opt_u32();
		reference.unused_flags = cursor.opt_u32();
		reference.unused_flags_2 = cursor.opt_u32();
		reference.lighting_id = cursor.opt_i32();
		reference.plane = cursor.opt_i16();
		reference.frame_count = cursor.opt_i16();
		reference.anim_count = cursor.opt_i16();

		let wanted = reference.anim_count.unwrap_or(0).clamp(0, MAX_ANIM_FRAMES as i16);
		for _ in 0..wanted {
			let Some(frame) = cursor.opt_i16() else {
				break;
			};
			reference.anim_frames.push(frame);
		}

		Ok(reference)
	}

	/// Serializes the record with every optional field present.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(36 + self.anim_frames.len() * 2);
		out.extend_from_slice(&self.version.to_be_bytes());
		out.extend_from_slice(&self.pixel_blob_id.to_be_bytes());
		out.extend_from_slice(&self.color_table_id.to_be_bytes());
		out.extend_from_slice(&self.checksum.unwrap_or(0).to_be_bytes());
		self.write_trailer(&mut out);
		out
	}

	/// Big-endian metadata folded into the checksum.
	///
	/// Same layout as [`Self::to_bytes`] but with the checksum slot zeroed.
	pub fn checksum_bytes(&self) -> Vec<u8> {
		let mut out = Vec::with_capacity(36 + self.anim_frames.len() * 2);
		out.extend_from_slice(&self.version.to_be_bytes());
		out.extend_from_slice(&self.pixel_blob_id.to_be_bytes());
		out.extend_from_slice(&self.color_table_id.to_be_bytes());
		out.extend_from_slice(&0u32.to_be_bytes());
		self.write_trailer(&mut out);
		out
	}

	fn write_trailer(&self, out: &mut Vec<u8>) {
		out.extend_from_slice(&self.flags().to_be_bytes());
		out.extend_from_slice(&self.unused_flags.unwrap_or(0).to_be_bytes());
		out.extend_from_slice(&self.unused_flags_2.unwrap_or(0).to_be_bytes());
		out.extend_from_slice(&self.lighting_id.unwrap_or(0).to_be_bytes());
		out.extend_from_slice(&self.plane().to_be_bytes());
		out.extend_from_slice(&self.frame_count.unwrap_or(0).to_be_bytes());
		let anim_count = self.anim_count.unwrap_or(self.anim_frames.len() as i16);
		out.extend_from_slice(&anim_count.to_be_bytes());
		for frame in &self.anim_frames {
			out.extend_from_slice(&frame.to_be_bytes());
		}
	}

	/// Rendering flags, 0 when absent.
	#[inline]
	pub fn flags(&self) -> u32 {
		self.flags.unwrap_or(0)
	}

	/// Draw plane, 0 when absent.
	#[inline]
	pub fn plane(&self) -> i16 {
		self.plane.unwrap_or(0)
	}

	/// Declared frame count, 0 when absent or negative.
	#[inline]
	pub fn frame_count(&self) -> u16 {
		self.frame_count.unwrap_or(0).max(0) as u16
	}

	/// Lighting blob id, `None` when absent or zero.
	pub fn lighting_id(&self) -> Option<u32> {
		self.lighting_id.filter(|&id| id != 0).map(|id| id as u32)
	}

	/// Whether the first decoded row is a mapping row.
	#[inline]
	pub fn has_custom_colors(&self) -> bool {
		self.flags() & flags::CUSTOM_COLORS != 0
	}

	/// Two-bit blend level.
	#[inline]
	pub fn blend(&self) -> u32 {
		self.flags() & flags::BLEND_MASK
	}

	/// Frame to show for an animation `counter`.
	///
	/// Walks the animation table when present, otherwise cycles through the
	/// frames. Table entries outside `0..frame_count` fall back to frame 0.
	pub fn frame_index(&self, counter: u32) -> u16 {
		let frames = self.frame_count();
		if !self.anim_frames.is_empty() {
			let step = self.anim_frames[counter as usize % self.anim_frames.len()];
			return match u16::try_from(step) {
				Ok(frame) if frame < frames.max(1) => frame,
				_ => 0,
			};
		}
		if frames > 1 {
			return (counter % u32::from(frames)) as u16;
		}
		0
	}
}

impl fmt::Display for ImageReference {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"ImageReference #{}: v{}, pixels #{}, colors #{}, flags 0x{:04X}, {} frame(s)",
			self.id,
			self.version,
			self.pixel_blob_id,
			self.color_table_id,
			self.flags(),
			self.frame_count()
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn full_reference() -> ImageReference {
		ImageReference {
			id: 12,
			version: 5,
			pixel_blob_id: 100,
			color_table_id: 200,
			checksum: Some(0xDEAD_BEEF),
			flags: Some(flags::TRANSPARENT | 2),
			unused_flags: Some(0),
			unused_flags_2: Some(0),
			lighting_id: Some(3),
			plane: Some(-1),
			frame_count: Some(4),
			anim_count: Some(3),
			anim_frames: vec![0, 2, 1],
			light: None,
		}
	}

	#[test]
	fn test_full_record() {
		let reference = full_reference();
		let parsed = ImageReference::from_bytes(12, &reference.to_bytes()).unwrap();
		assert_eq!(parsed, reference);
		assert_eq!(parsed.blend(), 2);
		assert_eq!(parsed.lighting_id(), Some(3));
	}

	#[test]
	fn test_mandatory_fields_only() {
		let bytes = full_reference().to_bytes();
		let parsed = ImageReference::from_bytes(1, &bytes[..10]).unwrap();
		assert_eq!(parsed.version, 5);
		assert_eq!(parsed.pixel_blob_id, 100);
		assert_eq!(parsed.color_table_id, 200);
		assert_eq!(parsed.checksum, None);
		assert_eq!(parsed.flags, None);
		assert_eq!(parsed.frame_count(), 0);
		assert!(parsed.anim_frames.is_empty());
		assert_eq!(parsed.frame_index(7), 0);
	}

	#[test]
	fn test_truncated_mandatory_fields() {
		let bytes = full_reference().to_bytes();
		let result = ImageReference::from_bytes(1, &bytes[..9]);
		assert!(matches!(result, Err(KeyfileError::InsufficientData { .. })));
	}

	#[test]
	fn test_truncated_in_optional_fields() {
		let bytes = full_reference().to_bytes();
		// version..checksum..flags plus two bytes of unused_flags
		let parsed = ImageReference::from_bytes(1, &bytes[..20]).unwrap();
		assert_eq!(parsed.checksum, Some(0xDEAD_BEEF));
		assert_eq!(parsed.flags, Some(flags::TRANSPARENT | 2));
		assert_eq!(parsed.unused_flags, None);
		assert_eq!(parsed.lighting_id, None);
	}

	#[test]
	fn test_anim_table_bounded_by_count_and_data() {
		let mut reference = full_reference();
		reference.anim_frames = vec![1, 2, 3, 0];
		let mut bytes = reference.to_bytes();
		// declared count 2, table holds 4
		let count_at = 34;
		bytes[count_at..count_at + 2].copy_from_slice(&2i16.to_be_bytes());
		let parsed = ImageReference::from_bytes(1, &bytes).unwrap();
		assert_eq!(parsed.anim_frames, vec![1, 2]);

		// declared count 4, only one entry present
		bytes[count_at..count_at + 2].copy_from_slice(&4i16.to_be_bytes());
		let parsed = ImageReference::from_bytes(1, &bytes[..count_at + 4]).unwrap();
		assert_eq!(parsed.anim_frames, vec![1]);
	}

	#[test]
	fn test_frame_index() {
		let reference = full_reference();
		assert_eq!(reference.frame_index(0), 0);
		assert_eq!(reference.frame_index(1), 2);
		assert_eq!(reference.frame_index(2), 1);
		assert_eq!(reference.frame_index(3), 0);

		let cycling = ImageReference {
			anim_count: None,
			anim_frames: Vec::new(),
			..full_reference()
		};
		assert_eq!(cycling.frame_index(5), 1);

		let out_of_range = ImageReference {
			anim_frames: vec![9, -1],
			..full_reference()
		};
		assert_eq!(out_of_range.frame_index(0), 0);
		assert_eq!(out_of_range.frame_index(1), 0);
	}

	#[test]
	fn test_checksum_bytes_zero_checksum_slot() {
		let bytes = full_reference().checksum_bytes();
		assert_eq!(&bytes[10..14], &[0, 0, 0, 0]);
		assert_eq!(bytes.len(), 36 + 3 * 2);
	}

	#[test]
	fn test_light_info() {
		let light = LightInfo {
			color: [0xFF, 0x80, 0x00, 0xFF],
			radius: 48,
			plane: 2,
		};
		assert_eq!(LightInfo::from_bytes(&light.to_bytes()).unwrap(), light);
		assert!(LightInfo::from_bytes(&[0u8; 7]).is_err());
	}
}
