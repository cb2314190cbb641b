//! Keyfile construction.
//!
//! Lays out a header, the directory table, then every payload in insertion
//! order. Ids are not checked for uniqueness; readers resolve duplicates.

use super::{DirectoryEntry, Header, TypeTag, constants};

/// Collects payloads and serializes them into a keyfile.
#[derive(Debug, Clone, Default)]
pub struct Builder {
	records: Vec<(TypeTag, u32, Vec<u8>)>,
}

impl Builder {
	/// Creates an empty builder.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a payload.
	pub fn add(&mut self, type_tag: TypeTag, id: u32, data: impl Into<Vec<u8>>) -> &mut Self {
		self.records.push((type_tag, id, data.into()));
		self
	}

	/// Number of records added so far.
	pub fn len(&self) -> usize {
		self.records.len()
	}

	/// Returns `true` if nothing was added.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	/// Serializes the keyfile.
	pub fn to_bytes(&self) -> Vec<u8> {
		let table_len = self.records.len() * constants::ENTRY_SIZE;
		let payload_len: usize = self.records.iter().map(|(_, _, data)| data.len()).sum();

		let mut out = Vec::with_capacity(constants::HEADER_SIZE + table_len + payload_len);
		out.extend_from_slice(&Header::new(self.records.len() as u32).to_bytes());

		let mut offset = (constants::HEADER_SIZE + table_len) as u32;
		for (type_tag, id, data) in &self.records {
			let entry = DirectoryEntry::new(offset, data.len() as u32, *type_tag, *id);
			out.extend_from_slice(&entry.to_bytes());
			offset += data.len() as u32;
		}

		for (_, _, data) in &self.records {
			out.extend_from_slice(data);
		}

		out
	}

	/// Writes the keyfile to disk.
	pub fn save(&self, path: impl AsRef<std::path::Path>) -> std::io::Result<()> {
		std::fs::write(path, self.to_bytes())
	}
}
