//! Deep merge of TOML values with restriction enforcement.
//!
//! The merge operates on raw [`toml::Value`] trees rather than deserialized
//! structs, so a key missing from a layer never overrides the layer below.

mod deep;
mod path;
mod restrict;
mod types;

pub use deep::{deep_merge, deep_merge_tracking};
pub use restrict::{RESTRICTIONS, Tighten, enforce_restrictions};
pub use types::{ConfigLayer, FieldSources};

pub(crate) use path::set_nested;

#[cfg(test)]
mod tests;
