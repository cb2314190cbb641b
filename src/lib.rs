#![allow(clippy::single_component_path_imports)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `pictkey-rs` reads image keyfile archives and decodes their run-length
//! coded sprites into premultiplied RGBA bitmaps.
//!
pub use pictkey_internal::*;

#[cfg(all(feature = "dynamic_linking", not(target_family = "wasm")))]
#[allow(unused_imports)]
use pictkey_dylib;
