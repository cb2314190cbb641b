//! Prelude module for `pictkey_types`.
//!
//! This module provides a convenient way to import commonly used types, traits, and constants.
//!
//! # Examples
//!
//! ```no_run
//! use pictkey_types::prelude::*;
//!
//! // Now you can use all common types directly
//! let palette = MasterPalette::macintosh();
//! let options = LoadOptions::strict();
//! let mut builder = KeyfileBuilder::new();
//! builder.add(TypeTag::COLOR_TABLE, 1, vec![0u8, 1, 2]);
//! ```

// File module types
#[doc(inline)]
pub use crate::file::{
	AlphaMask,
	// Image types
	Archive,
	Bitmap,
	Color,
	ColorTable,
	DecodeCache,
	// Keyfile types
	DirectoryEntry,
	EntryLookup,
	FileType,
	ImageReference,
	// Item types
	ItemRecord,
	KeyfileBuilder,
	KeyfileError,
	KeyfileFile,
	KeyfileHeader,
	LightInfo,
	LoadOptions,
	MasterPalette,
	Rect,
	TypeTag,
};

// Reference flag bits
#[doc(inline)]
pub use crate::file::images::flags;

// Re-export the file module for advanced usage
#[doc(inline)]
pub use crate::file;
