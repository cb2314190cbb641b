//! Prelude module for `pictkey_internal`.
//!
//! This module provides a convenient way to import commonly used types and traits.
//!
//! # Examples
//!
//! ```rust
//! use pictkey_internal::prelude::*;
//!
//! // Now you can use all common types directly
//! let mut builder = KeyfileBuilder::new();
//! builder.add(TypeTag::COLOR_TABLE, 7, vec![0u8, 12, 34]);
//!
//! let archive = Archive::from_bytes(&builder.to_bytes(), MasterPalette::grayscale(), LoadOptions::default())
//!     .unwrap();
//! assert!(archive.is_empty());
//! ```

// Re-export everything from pictkey_types::prelude
#[doc(inline)]
pub use pictkey_types::prelude::*;

// Re-export the entire pictkey_types module for advanced usage
#[doc(inline)]
pub use pictkey_types;
