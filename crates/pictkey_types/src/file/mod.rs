//! File type support for `pictkey-rs` project.

mod error;

pub mod bitstream;
pub mod cursor;
pub mod images;
pub mod item;
pub mod keyfile;

// Re-export unified error type
pub use error::{FileType, KeyfileError};

// Re-export main file types
pub use images::{
	AlphaMask, Archive, Bitmap, Color, ColorTable, DecodeCache, ImageReference, LightInfo,
	LoadOptions, MasterPalette, Rect,
};
pub use item::ItemRecord;
pub use keyfile::{
	Builder as KeyfileBuilder, DirectoryEntry, EntryLookup, File as KeyfileFile,
	Header as KeyfileHeader, TypeTag,
};
