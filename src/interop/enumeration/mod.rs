//! Uniform lazy iteration over native and foreign collections.
//!
//! Native collections (strings, lists, maps) are iterated directly. Foreign collections
//! expose an enumerator whose shape has to be discovered reflectively; the discovered
//! [`EnumeratorDescriptor`] is cached per enumerator type.
//!
//! Discovery always works on the concrete type of a wrapper as reported by the
//! [`IdentityResolver`], never on its declared type, so a list held through an
//! `Il2CppSystem.Object` wrapper is enumerated like any other list.
//!
//! # Capability Discovery
//!
//! The first time a foreign collection type is enumerated, its enumerator is obtained and
//! advanced once. The outcome is remembered as an [`EnumerationSupport`] for the lifetime
//! of the bridge: a type that failed is never probed again and every later request fails
//! immediately with [`Error::EnumerationUnsupported`]. A successful probe is not wasted;
//! its enumerator and first move result seed the returned sequence.
//!
//! # Dictionaries
//!
//! - the foreign hashtable type is read directly from its `buckets` array, skipping empty
//!   and removed slots
//! - other foreign dictionaries zip their `Keys` and `Values` collections by position,
//!   which assumes both enumerate in the same order. A length mismatch is logged.

mod descriptor;
mod sequence;

use std::sync::Arc;

use dashmap::DashMap;

pub use descriptor::{CurrentAccessor, EnumeratorDescriptor};
pub use sequence::{DictionarySequence, ObjectSequence};

use crate::{
    diagnostics::{DiagnosticCategory, DiagnosticSink},
    interop::{
        identity::IdentityResolver,
        member::{has_member, read_member},
    },
    metadata::{
        catalog::TypeCatalog,
        typesystem::{TypeKey, TypeRecordRc},
    },
    value::{ObjectContents, ObjectRef, Value},
    Error, Result,
};

use descriptor::find_get_enumerator;
use sequence::{BucketCursor, ForeignCursor, ZippedCursor};

/// Cached outcome of the enumeration probe of one collection type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnumerationSupport {
    /// The probe succeeded
    Supported,
    /// The probe failed for the given reason; permanent
    Unsupported(String),
}

/// Lazy sequence over a native collection.
///
/// # Errors
/// Returns [`Error::NotEnumerable`] for values without built-in collection storage.
pub fn native_sequence(value: &Value) -> Result<ObjectSequence> {
    match value {
        Value::String(text) => Ok(ObjectSequence::chars(text.clone())),
        Value::Object(object) => ObjectSequence::native(object)
            .ok_or_else(|| Error::NotEnumerable(object.ty().fullname())),
        other => Err(Error::NotEnumerable(other.kind_name().to_string())),
    }
}

/// Lazy entry sequence over a native map.
///
/// # Errors
/// Returns [`Error::NotEnumerable`] for anything but a native map.
pub fn native_dictionary(value: &Value) -> Result<DictionarySequence> {
    match value {
        Value::Object(object) => DictionarySequence::native(object)
            .ok_or_else(|| Error::NotEnumerable(object.ty().fullname())),
        other => Err(Error::NotEnumerable(other.kind_name().to_string())),
    }
}

/// Whether `value` has built-in collection storage (or is a string)
pub fn is_native_enumerable(value: &Value) -> bool {
    match value {
        Value::String(_) => true,
        Value::Object(object) => !matches!(object.contents(), ObjectContents::None),
        _ => false,
    }
}

/// Whether `value` is a native map
pub fn is_native_dictionary(value: &Value) -> bool {
    matches!(value, Value::Object(object) if matches!(object.contents(), ObjectContents::Dictionary(_)))
}

/// Enumerates collections of both representations.
pub struct EnumerationBridge {
    identity: Arc<IdentityResolver>,
    /// Probe results per concrete collection type; the unsupported entries form the
    /// unsupported-type set
    support: DashMap<TypeKey, EnumerationSupport>,
    /// Descriptors per concrete enumerator type
    descriptors: DashMap<TypeKey, Arc<EnumeratorDescriptor>>,
    diagnostics: DiagnosticSink,
}

impl EnumerationBridge {
    /// Create a bridge resolving foreign strings through `identity`'s runtime
    pub fn new(identity: Arc<IdentityResolver>, diagnostics: DiagnosticSink) -> Self {
        EnumerationBridge {
            identity,
            support: DashMap::new(),
            descriptors: DashMap::new(),
            diagnostics,
        }
    }

    fn catalog(&self) -> &Arc<TypeCatalog> {
        self.identity.catalog()
    }

    /// Lazy sequence over the elements of `collection`.
    ///
    /// # Errors
    /// - [`Error::NotEnumerable`] if the value is not a collection
    /// - [`Error::EnumerationUnsupported`] if the collection type failed its probe, now or
    ///   earlier
    pub fn sequence(&self, collection: &Value) -> Result<ObjectSequence> {
        let object = match collection {
            Value::Object(object) => object,
            other => return native_sequence(other),
        };

        if let Some(sequence) = ObjectSequence::native(object) {
            return Ok(sequence);
        }
        if let Some(text) = self.foreign_string(object) {
            return Ok(ObjectSequence::chars(Arc::from(text)));
        }
        self.foreign_sequence(collection, object)
    }

    /// Lazy sequence over the entries of `dictionary`.
    ///
    /// # Errors
    /// - [`Error::NotEnumerable`] if the value is not a dictionary
    /// - [`Error::MemberNotFound`] if a hashtable has no readable bucket array
    /// - any error of [`sequence`](Self::sequence) raised for the `Keys` or `Values`
    ///   collection
    pub fn dictionary(&self, dictionary: &Value) -> Result<DictionarySequence> {
        let object = match dictionary {
            Value::Object(object) => object,
            other => return native_dictionary(other),
        };

        if let Some(entries) = DictionarySequence::native(object) {
            return Ok(entries);
        }
        if self.is_hashtable(object) {
            return self.hashtable(dictionary);
        }
        if has_member(self.catalog(), dictionary, "Keys")
            && has_member(self.catalog(), dictionary, "Values")
        {
            return self.zipped(dictionary, object);
        }
        Err(Error::NotEnumerable(object.ty().fullname()))
    }

    /// Whether `value` looks enumerable. Types that failed their probe are not.
    pub fn is_enumerable(&self, value: &Value) -> bool {
        if is_native_enumerable(value) {
            return true;
        }
        let Value::Object(object) = value else {
            return false;
        };
        if self.foreign_string_type(object.ty()) {
            return true;
        }
        let ty = self.concrete_type(value, object);
        if let Some(EnumerationSupport::Unsupported(_)) = self.support(&ty) {
            return false;
        }
        find_get_enumerator(self.catalog(), &ty).is_some()
    }

    /// Whether `value` looks like a dictionary
    pub fn is_dictionary(&self, value: &Value) -> bool {
        if is_native_dictionary(value) {
            return true;
        }
        let Value::Object(object) = value else {
            return false;
        };
        self.is_hashtable(object)
            || (has_member(self.catalog(), value, "Keys")
                && has_member(self.catalog(), value, "Values"))
    }

    /// Recorded probe outcome of a collection type
    pub fn support(&self, ty: &TypeRecordRc) -> Option<EnumerationSupport> {
        self.support.get(ty.key()).map(|entry| entry.value().clone())
    }

    /// Collection types that failed their probe
    pub fn unsupported_types(&self) -> Vec<TypeKey> {
        self.support
            .iter()
            .filter(|entry| matches!(entry.value(), EnumerationSupport::Unsupported(_)))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of cached enumerator descriptors
    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    fn foreign_string_type(&self, ty: &TypeRecordRc) -> bool {
        ty.is_foreign()
            && ty.fullname_str() == self.identity.config().shadow_type_name("System.String")
    }

    fn foreign_string(&self, object: &ObjectRef) -> Option<String> {
        if !self.foreign_string_type(object.ty()) {
            return None;
        }
        let pointer = object.pointer()?;
        match self.identity.runtime().read_string(pointer) {
            Ok(text) => Some(text),
            Err(error) => {
                self.diagnostics.type_warning(
                    DiagnosticCategory::Enumeration,
                    object.ty().fullname_str(),
                    format!("string contents unavailable: {error}"),
                );
                None
            }
        }
    }

    /// Runtime type of a foreign wrapper when it is a more precise foreign type than the
    /// declared one; the declared type otherwise.
    fn concrete_type(&self, value: &Value, object: &ObjectRef) -> TypeRecordRc {
        let declared = object.ty();
        if object.pointer().is_none() {
            return declared.clone();
        }
        match self.identity.resolve(value) {
            Some(actual) if actual.is_foreign() => actual,
            _ => declared.clone(),
        }
    }

    /// `value` typed as `ty` for reflective calls: the injected owner of its pointer, a
    /// new wrapper of `ty`, or `value` itself when it already is one.
    fn retyped(&self, value: &Value, object: &ObjectRef, ty: &TypeRecordRc) -> Value {
        if object.ty().fullname_str() == ty.fullname_str() {
            return value.clone();
        }
        let Some(pointer) = object.pointer() else {
            return value.clone();
        };
        self.identity
            .runtime()
            .injected_owner(pointer)
            .or_else(|| ty.construct_wrapper(pointer).ok())
            .map_or_else(|| value.clone(), Value::Object)
    }

    fn foreign_sequence(&self, collection: &Value, object: &ObjectRef) -> Result<ObjectSequence> {
        let concrete = self.concrete_type(collection, object);
        let ty = &concrete;
        let known = self.support(ty);
        if let Some(EnumerationSupport::Unsupported(reason)) = &known {
            return Err(Error::EnumerationUnsupported {
                type_name: ty.key().to_string(),
                reason: reason.clone(),
            });
        }

        let get_enumerator = find_get_enumerator(self.catalog(), ty)
            .ok_or_else(|| Error::NotEnumerable(ty.fullname()))?;

        let receiver = self.retyped(collection, object, ty);
        let enumerator = match get_enumerator.invoke(&receiver, &[]) {
            Ok(Value::Null) => return self.unsupported(ty, "GetEnumerator returned null".to_string()),
            Ok(enumerator) => enumerator,
            Err(error) => return self.unsupported(ty, format!("GetEnumerator failed: {error}")),
        };
        let (descriptor, enumerator) = match self.descriptor_for(&enumerator) {
            Ok(found) => found,
            Err(error) => return self.unsupported(ty, error.to_string()),
        };

        let primed = if known.is_some() {
            None
        } else {
            match descriptor.move_next(&enumerator) {
                Ok(moved) => {
                    self.support
                        .insert(ty.key().clone(), EnumerationSupport::Supported);
                    Some(moved)
                }
                Err(error) => return self.unsupported(ty, format!("MoveNext failed: {error}")),
            }
        };

        Ok(ObjectSequence::foreign(ForeignCursor::new(
            enumerator,
            descriptor,
            primed,
            ty.fullname(),
            self.diagnostics.clone(),
        )))
    }

    /// Descriptor of the enumerator's concrete type, with the enumerator typed as it
    fn descriptor_for(&self, enumerator: &Value) -> Result<(Arc<EnumeratorDescriptor>, Value)> {
        let object = enumerator
            .as_object()
            .ok_or_else(|| Error::NotEnumerable(format!("{} enumerator", enumerator.kind_name())))?;
        let ty = self.concrete_type(enumerator, object);
        let receiver = self.retyped(enumerator, object, &ty);

        if let Some(descriptor) = self.descriptors.get(ty.key()) {
            return Ok((descriptor.value().clone(), receiver));
        }

        let descriptor = Arc::new(EnumeratorDescriptor::discover(self.catalog(), &ty)?);
        self.descriptors
            .insert(ty.key().clone(), descriptor.clone());
        Ok((descriptor, receiver))
    }

    fn unsupported<T>(&self, ty: &TypeRecordRc, reason: String) -> Result<T> {
        self.diagnostics.type_warning(
            DiagnosticCategory::Enumeration,
            ty.fullname_str(),
            format!("enumeration unsupported: {reason}"),
        );
        self.support.insert(
            ty.key().clone(),
            EnumerationSupport::Unsupported(reason.clone()),
        );
        Err(Error::EnumerationUnsupported {
            type_name: ty.key().to_string(),
            reason,
        })
    }

    fn is_hashtable(&self, object: &ObjectRef) -> bool {
        object.ty().definition_fullname() == self.identity.config().hashtable_type
    }

    fn hashtable(&self, dictionary: &Value) -> Result<DictionarySequence> {
        let buckets = read_member(self.catalog(), dictionary, "buckets")?;
        if buckets.is_null() {
            return Ok(DictionarySequence::empty());
        }

        let catalog = self.catalog().clone();
        Ok(DictionarySequence::buckets(BucketCursor::new(
            buckets,
            Box::new(move |bucket: &Value, slot: &str| read_member(&catalog, bucket, slot).ok()),
        )))
    }

    fn zipped(&self, dictionary: &Value, object: &ObjectRef) -> Result<DictionarySequence> {
        let keys = read_member(self.catalog(), dictionary, "Keys")?;
        let values = read_member(self.catalog(), dictionary, "Values")?;
        Ok(DictionarySequence::zipped(ZippedCursor::new(
            self.sequence(&keys)?,
            self.sequence(&values)?,
            object.ty().fullname(),
            self.diagnostics.clone(),
        )))
    }
}
