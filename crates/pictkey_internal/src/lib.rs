//! This module is separated into its own crate to enable simple dynamic linking for `pictkey`, and should not be used directly.

/// `use pictkey::prelude::*;` to import commonly used items.
pub mod prelude;

// Re-export pictkey_types for convenience
pub use pictkey_types;

// Re-export commonly used types at crate root
pub use pictkey_types::file::{Archive, KeyfileError, KeyfileFile, LoadOptions, MasterPalette, TypeTag};
