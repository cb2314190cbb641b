//! Image reference integrity tag.
//!
//! The tag is an Adler-style rolling sum over everything a reference pulls
//! in: pixel blob bytes, color table bytes, lighting bytes when present,
//! the reference metadata (see [`ImageReference::checksum_bytes`]) and
//! finally the big-endian reference id. The packed `(s2 << 16) | s1` result
//! is then masked with a fixed 6-byte repeating XOR key.

use super::reference::ImageReference;

/// Adler modulus
const MODULUS: u32 = 65521;

/// Key of the final XOR mask
pub const XOR_KEY: [u8; 6] = [0x5A, 0xC3, 0x96, 0x3C, 0xA5, 0x0F];

/// Running Adler sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Adler {
	s1: u32,
	s2: u32,
}

impl Adler {
	/// Fresh state (`s1 = 1`, `s2 = 0`).
	pub fn new() -> Self {
		Self {
			s1: 1,
			s2: 0,
		}
	}

	/// Folds `bytes` into the sums.
	pub fn update(&mut self, bytes: &[u8]) {
		for &byte in bytes {
			self.s1 = (self.s1 + u32::from(byte)) % MODULUS;
			self.s2 = (self.s2 + self.s1) % MODULUS;
		}
	}

	/// Packed value, `(s2 << 16) | s1`.
	pub fn value(&self) -> u32 {
		(self.s2 << 16) | (self.s1 & 0xFFFF)
	}
}

impl Default for Adler {
	fn default() -> Self {
		Self::new()
	}
}

/// Repeating XOR over [`XOR_KEY`], the key position carries across calls.
#[derive(Debug, Clone, Default)]
pub struct XorCipher {
	position: usize,
}

impl XorCipher {
	/// Cipher starting at key position 0.
	pub fn new() -> Self {
		Self::default()
	}

	/// Masks `bytes` in place.
	pub fn apply(&mut self, bytes: &mut [u8]) {
		for byte in bytes {
			*byte ^= XOR_KEY[self.position % XOR_KEY.len()];
			self.position += 1;
		}
	}
}

/// Computes the integrity tag of a reference and its payloads.
pub fn compute(
	pixel_bytes: &[u8],
	color_bytes: &[u8],
	light_bytes: Option<&[u8]>,
	reference: &ImageReference,
) -> u32 {
	let mut adler = Adler::new();
	adler.update(pixel_bytes);
	adler.update(color_bytes);
	if let Some(light_bytes) = light_bytes {
		adler.update(light_bytes);
	}
	adler.update(&reference.checksum_bytes());
	adler.update(&reference.id.to_be_bytes());

	let mut bytes = adler.value().to_be_bytes();
	XorCipher::new().apply(&mut bytes);
	u32::from_be_bytes(bytes)
}
