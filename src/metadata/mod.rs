//! Reflective metadata the bridge operates on.
//!
//! # Key Components
//!
//! - [`typesystem`] - type records, members and primitive kinds
//! - [`catalog`] - the case-insensitive, append-only index of loaded types
//! - [`customattributes`] - attribute data and the obfuscated-name reader
//! - [`module`] - modules delivered by the load-notification feed

/// Implementation of the type catalog
pub mod catalog;
/// Implementation of custom attribute representation
pub mod customattributes;
/// Implementation of loaded modules
pub mod module;
/// Implementation of the type model
pub mod typesystem;
