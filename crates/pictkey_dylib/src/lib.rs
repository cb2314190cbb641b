//! Forces dynamic linking of `pictkey_internal`, enable with the `dynamic_linking` feature.

#![allow(clippy::single_component_path_imports)]

#[allow(unused_imports)]
use pictkey_internal;
