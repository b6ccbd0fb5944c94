//! Object-model strategies.
//!
//! The backend is chosen once when the bridge is built; afterwards every query goes
//! through one [`ObjectModel`] implementation without checking the backend again.

use std::sync::Arc;

use crate::{
    config::BridgeConfig,
    diagnostics::DiagnosticSink,
    interop::{
        cast::{cast_native, CastEngine, CastOutcome},
        enumeration::{
            is_native_dictionary, is_native_enumerable, native_dictionary, native_sequence,
            DictionarySequence, EnumerationBridge, ObjectSequence,
        },
        identity::IdentityResolver,
    },
    metadata::{catalog::TypeCatalog, typesystem::TypeRecordRc},
    value::Value,
    Result,
};

/// Type resolution, casting and enumeration for one object model.
pub trait ObjectModel: Send + Sync {
    /// True concrete type of `value`, `None` for null
    fn actual_type(&self, value: &Value) -> Option<TypeRecordRc>;

    /// Convert `value` into `target`
    fn try_cast(&self, value: &Value, target: &TypeRecordRc) -> CastOutcome;

    /// Lazy sequence over a collection
    ///
    /// # Errors
    /// Fails if the value is not enumerable in this model.
    fn sequence(&self, collection: &Value) -> Result<ObjectSequence>;

    /// Lazy entry sequence over a dictionary
    ///
    /// # Errors
    /// Fails if the value is not a dictionary in this model.
    fn dictionary(&self, dictionary: &Value) -> Result<DictionarySequence>;

    /// Whether [`sequence`](Self::sequence) can be expected to succeed
    fn is_enumerable(&self, value: &Value) -> bool;

    /// Whether [`dictionary`](Self::dictionary) can be expected to succeed
    fn is_dictionary(&self, value: &Value) -> bool;
}

/// Homogeneous managed runtime: every object is its own declared type.
pub struct ManagedModel {
    catalog: Arc<TypeCatalog>,
}

impl ManagedModel {
    /// Create the managed strategy
    pub fn new(catalog: Arc<TypeCatalog>) -> Self {
        ManagedModel { catalog }
    }
}

impl ObjectModel for ManagedModel {
    fn actual_type(&self, value: &Value) -> Option<TypeRecordRc> {
        value.declared_type(&self.catalog)
    }

    fn try_cast(&self, value: &Value, target: &TypeRecordRc) -> CastOutcome {
        cast_native(&self.catalog, value, target)
    }

    fn sequence(&self, collection: &Value) -> Result<ObjectSequence> {
        native_sequence(collection)
    }

    fn dictionary(&self, dictionary: &Value) -> Result<DictionarySequence> {
        native_dictionary(dictionary)
    }

    fn is_enumerable(&self, value: &Value) -> bool {
        is_native_enumerable(value)
    }

    fn is_dictionary(&self, value: &Value) -> bool {
        is_native_dictionary(value)
    }
}

/// Managed proxies over a foreign object model.
pub struct DualModel {
    identity: Arc<IdentityResolver>,
    cast: CastEngine,
    enumeration: EnumerationBridge,
}

impl DualModel {
    /// Create the dual-model strategy around an identity resolver
    pub fn new(identity: Arc<IdentityResolver>, diagnostics: &DiagnosticSink) -> Self {
        DualModel {
            cast: CastEngine::new(identity.clone(), diagnostics.clone()),
            enumeration: EnumerationBridge::new(identity.clone(), diagnostics.clone()),
            identity,
        }
    }

    /// The identity resolver
    pub fn identity(&self) -> &Arc<IdentityResolver> {
        &self.identity
    }

    /// The enumeration bridge
    pub fn enumeration(&self) -> &EnumerationBridge {
        &self.enumeration
    }

    /// Configuration the resolver was built with
    pub fn config(&self) -> &BridgeConfig {
        self.identity.config()
    }
}

impl ObjectModel for DualModel {
    fn actual_type(&self, value: &Value) -> Option<TypeRecordRc> {
        self.identity.resolve(value)
    }

    fn try_cast(&self, value: &Value, target: &TypeRecordRc) -> CastOutcome {
        self.cast.try_cast(value, target)
    }

    fn sequence(&self, collection: &Value) -> Result<ObjectSequence> {
        self.enumeration.sequence(collection)
    }

    fn dictionary(&self, dictionary: &Value) -> Result<DictionarySequence> {
        self.enumeration.dictionary(dictionary)
    }

    fn is_enumerable(&self, value: &Value) -> bool {
        self.enumeration.is_enumerable(value)
    }

    fn is_dictionary(&self, value: &Value) -> bool {
        self.enumeration.is_dictionary(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::typesystem::TypeBuilder, value::Object};

    #[test]
    fn test_managed_model() {
        let catalog = Arc::new(TypeCatalog::new(
            &BridgeConfig::managed(),
            DiagnosticSink::silent(),
        ));
        let base = TypeBuilder::class("A", "Base").build();
        let derived = TypeBuilder::class("A", "Derived").extends(&base).build();
        let other = TypeBuilder::class("A", "Other").build();
        let model = ManagedModel::new(catalog);

        let value = Value::Object(Arc::new(Object::new(derived.clone())));
        assert_eq!(model.actual_type(&value).unwrap().fullname(), "A.Derived");
        assert!(model.try_cast(&value, &base).is_converted());
        assert!(model.try_cast(&value, &other).is_incompatible());

        assert!(model.is_enumerable(&Value::from("ab")));
        assert!(!model.is_dictionary(&value));
        assert!(model.sequence(&value).is_err());
    }
}
