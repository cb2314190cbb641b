//! This crate provides the keyfile container and sprite decoding for the `pictkey-rs` project.
//!
//! # File Formats
//!
//! - **Keyfile**: Big-endian container with a flat directory of typed, numbered records
//! - **Image reference**: Sprite metadata binding a pixel blob, a color table and flags
//! - **Pixel blob**: Two-mode run-length bitstream of palette slots
//! - **Color table**: Per-sprite slot to master palette mapping
//! - **Item**: Equipment metadata naming the sprites an item is drawn with
//!
//! # Examples
//!
//! Using the prelude (recommended):
//!
//! ```no_run
//! use pictkey_types::prelude::*;
//!
//! # fn main() -> Result<(), KeyfileError> {
//! let archive = Archive::open("Images.keyfile", MasterPalette::default(), LoadOptions::default())?;
//!
//! for id in archive.ids() {
//!     if let Some((width, height)) = archive.size(id) {
//!         println!("#{id}: {width}x{height}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Or use explicit paths:
//!
//! ```no_run
//! use pictkey_types::file::keyfile::{File, TypeTag};
//!
//! # fn main() -> Result<(), pictkey_types::file::KeyfileError> {
//! let keyfile = File::open("Images.keyfile")?;
//! let blobs = keyfile.entries().iter().filter(|e| e.tag() == TypeTag::PIXEL_BLOB).count();
//! println!("{blobs} pixel blobs");
//! # Ok(())
//! # }
//! ```

pub mod file;

/// `use pictkey_types::prelude::*;` to import commonly used items.
pub mod prelude;
