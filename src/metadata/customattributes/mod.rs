//! Custom attributes and the attribute-metadata reader.
//!
//! The bridge only needs one thing from attribute metadata: the original obfuscated name
//! a type was annotated with when its names were restored. [`AttributeReader`] is the
//! seam through which that is read; [`RecordAttributeReader`] reads the attributes stored
//! on the [`TypeRecord`] itself, which is what module loaders populate.
//!
//! # Examples
//!
//! ```rust
//! use dotbridge::metadata::customattributes::{
//!     AttributeReader, CustomAttribute, CustomAttributeArgument, RecordAttributeReader,
//! };
//! use dotbridge::metadata::typesystem::TypeBuilder;
//!
//! let player = TypeBuilder::class("MyGame", "PlayerController")
//!     .attribute(
//!         CustomAttribute::new("Il2CppInterop.Common.ObfuscatedNameAttribute")
//!             .with_arg(CustomAttributeArgument::String("A.b39f".into())),
//!     )
//!     .build();
//!
//! let reader = RecordAttributeReader::new("ObfuscatedNameAttribute");
//! assert_eq!(reader.obfuscated_name(&player)?.as_deref(), Some("A.b39f"));
//! # Ok::<(), dotbridge::Error>(())
//! ```

mod types;

pub use types::*;

use crate::{metadata::typesystem::TypeRecord, Result};

/// Reads the obfuscated-name annotation of a type.
pub trait AttributeReader: Send + Sync {
    /// Original obfuscated name of `ty`, if it carries one.
    ///
    /// # Errors
    /// Implementations backed by a foreign metadata API may fail; the bridge logs the
    /// failure and treats the type as unannotated.
    fn obfuscated_name(&self, ty: &TypeRecord) -> Result<Option<String>>;
}

/// Reads annotations from the attributes stored on the record.
pub struct RecordAttributeReader {
    attribute_name: String,
}

impl RecordAttributeReader {
    /// Create a reader matching attributes by simple type name
    pub fn new(attribute_name: &str) -> Self {
        RecordAttributeReader {
            attribute_name: attribute_name.to_string(),
        }
    }
}

impl AttributeReader for RecordAttributeReader {
    fn obfuscated_name(&self, ty: &TypeRecord) -> Result<Option<String>> {
        for (_, attribute) in ty.custom_attributes.iter() {
            if attribute.simple_name() != self.attribute_name {
                continue;
            }

            if let Some(name) = attribute.first_string_arg() {
                return Ok(Some(name.to_string()));
            }
            if let Some(CustomAttributeArgument::String(name)) =
                attribute.named_arg("ObfuscatedName")
            {
                return Ok(Some(name.clone()));
            }
        }

        Ok(None)
    }
}
