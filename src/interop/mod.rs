//! Bridging between the native and the foreign object model.
//!
//! # Key Components
//!
//! - [`deobfuscation`] - obfuscated runtime names to catalog records
//! - [`identity`] - true concrete type of a value in either representation
//! - [`cast`] - conversion between representations with explicit outcomes
//! - [`enumeration`] - lazy iteration over native and foreign collections
//! - [`member`] - member access tolerant of renames across host versions
//! - [`model`] - the per-backend strategy that ties them together
//!
//! # Usage
//!
//! Most hosts use these through [`crate::BridgeContext`], which builds the right
//! [`ObjectModel`] for the configured backend. The components are public so hosts with
//! unusual wiring can assemble them directly.

pub mod cast;
pub mod deobfuscation;
pub mod enumeration;
pub mod identity;
pub mod member;
pub mod model;

pub use cast::{CastEngine, CastOutcome};
pub use deobfuscation::DeobfuscationCache;
pub use enumeration::{
    DictionarySequence, EnumerationBridge, EnumerationSupport, EnumeratorDescriptor,
    ObjectSequence,
};
pub use identity::IdentityResolver;
pub use member::{AmbiguousMemberResolver, MemberAccess};
pub use model::{DualModel, ManagedModel, ObjectModel};
