//! Values and objects of the host object model.
//!
//! - [`Value`] - inline primitives, native strings, enums and object references
//! - [`Object`] / [`ObjectRef`] - managed objects and wrappers around native pointers

mod object;
mod variant;

pub use object::{Object, ObjectContents, ObjectRef, PRIMITIVE_VALUE_SLOT};
pub use variant::Value;
