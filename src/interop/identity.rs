//! Actual-type resolution across both representations.
//!
//! The declared type of a foreign wrapper is often only an approximation: a wrapper
//! declared as `Il2CppSystem.Object` may proxy a native `MyGame.PlayerController` whose
//! runtime class name is obfuscated. [`IdentityResolver::resolve`] asks the foreign
//! runtime for the object's class and maps it back to a catalog record.
//!
//! Resolution never fails. Any unexpected runtime failure is logged and the declared
//! type is returned instead.

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    config::BridgeConfig,
    diagnostics::{DiagnosticCategory, DiagnosticSink},
    interop::deobfuscation::DeobfuscationCache,
    metadata::{
        catalog::TypeCatalog,
        typesystem::{Representation, TypeRecordRc},
    },
    runtime::{ClassHandle, ForeignRuntime},
    value::{Object, Value},
    Result,
};

/// Representation a value lives in.
pub(crate) fn representation_of(value: &Value) -> Representation {
    match value {
        Value::Object(object) if object.is_foreign() || object.ty().is_foreign() => {
            Representation::Foreign
        }
        _ => Representation::Native,
    }
}

/// Resolves the true concrete type of values in a dual-model host.
pub struct IdentityResolver {
    catalog: Arc<TypeCatalog>,
    deobfuscation: Arc<DeobfuscationCache>,
    runtime: Arc<dyn ForeignRuntime>,
    config: BridgeConfig,
    /// Class handles are immutable for the process lifetime
    class_names: DashMap<ClassHandle, String>,
    diagnostics: DiagnosticSink,
}

impl IdentityResolver {
    /// Create a resolver
    pub fn new(
        catalog: Arc<TypeCatalog>,
        deobfuscation: Arc<DeobfuscationCache>,
        runtime: Arc<dyn ForeignRuntime>,
        config: BridgeConfig,
        diagnostics: DiagnosticSink,
    ) -> Self {
        IdentityResolver {
            catalog,
            deobfuscation,
            runtime,
            config,
            class_names: DashMap::new(),
            diagnostics,
        }
    }

    /// True concrete type of `value`, `None` only for null.
    ///
    /// Resolution order:
    /// 1. null resolves to `None`
    /// 2. closed generic wrappers keep their declared type
    /// 3. strings of either representation resolve to `System.String`
    /// 4. foreign primitive structs resolve to their native primitive
    /// 5. foreign objects resolve through their runtime class: injected classes through
    ///    the reverse pointer table, everything else by (deobfuscated) class name
    ///
    /// Known limitation: the runtime class of an injected object is never mapped back to
    /// a record. Injected objects resolve to the type of the owner registered for their
    /// pointer, or to their declared type when none is registered. An instance of an
    /// injected subclass of an injected type therefore resolves to whatever its owner
    /// or wrapper was declared as, never to the subclass itself.
    pub fn resolve(&self, value: &Value) -> Option<TypeRecordRc> {
        match value {
            Value::Null => None,
            Value::Object(object) => match self.resolve_object(object) {
                Ok(resolved) => Some(resolved),
                Err(error) => {
                    self.diagnostics.type_warning(
                        DiagnosticCategory::Identity,
                        object.ty().fullname_str(),
                        format!("falling back to declared type: {error}"),
                    );
                    Some(object.ty().clone())
                }
            },
            other => other.declared_type(&self.catalog),
        }
    }

    fn resolve_object(&self, object: &Object) -> Result<TypeRecordRc> {
        let declared = object.ty();
        if declared.is_closed_generic() {
            return Ok(declared.clone());
        }

        if self.is_foreign_string_type(declared) {
            if let Some(string) = self.catalog.lookup("System.String") {
                return Ok(string);
            }
        }

        if object.is_foreign_primitive() {
            if let Some(native) = declared
                .primitive
                .and_then(|kind| self.catalog.lookup(&kind.native_fullname()))
            {
                return Ok(native);
            }
        }

        let Some(pointer) = object.pointer() else {
            return Ok(declared.clone());
        };

        let class = self.runtime.class_of(pointer)?;
        if self.runtime.is_injected(class) {
            return Ok(self
                .runtime
                .injected_owner(pointer)
                .map_or_else(|| declared.clone(), |owner| owner.ty().clone()));
        }

        let name = self.class_name(class)?;
        Ok(self
            .resolve_class_name(&name)
            .unwrap_or_else(|| declared.clone()))
    }

    /// Catalog record for a name reported by the foreign runtime.
    ///
    /// The name is deobfuscated first; names in the foreign standard namespace that are
    /// not catalogued are retried once with the shadow prefix.
    pub fn resolve_class_name(&self, name: &str) -> Option<TypeRecordRc> {
        if let Some(real) = self.deobfuscation.lookup(name) {
            return Some(real);
        }
        if let Some(found) = self.catalog.lookup(name) {
            return Some(found);
        }
        if self.config.is_foreign_std_name(name) {
            return self.catalog.lookup(&self.config.shadow_type_name(name));
        }
        None
    }

    /// Native class name, cached per class handle
    fn class_name(&self, class: ClassHandle) -> Result<String> {
        if let Some(name) = self.class_names.get(&class) {
            return Ok(name.value().clone());
        }
        let name = self.runtime.class_name(class)?;
        self.class_names.insert(class, name.clone());
        Ok(name)
    }

    fn is_foreign_string_type(&self, ty: &TypeRecordRc) -> bool {
        ty.is_foreign() && ty.fullname_str() == self.config.shadow_type_name("System.String")
    }

    pub(crate) fn runtime(&self) -> &Arc<dyn ForeignRuntime> {
        &self.runtime
    }

    pub(crate) fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    pub(crate) fn config(&self) -> &BridgeConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::typesystem::{PrimitiveKind, TypeBuilder},
        test::DualModelFixture,
    };

    #[test]
    fn test_null_and_native_values() {
        let fixture = DualModelFixture::new();
        let resolver = fixture.identity();

        assert!(resolver.resolve(&Value::Null).is_none());
        assert_eq!(
            resolver.resolve(&Value::I32(1)).unwrap().fullname(),
            "System.Int32"
        );
        assert_eq!(
            resolver.resolve(&Value::from("x")).unwrap().fullname(),
            "System.String"
        );
    }

    #[test]
    fn test_foreign_primitive_and_string() {
        let fixture = DualModelFixture::new();
        let resolver = fixture.identity();

        let foreign_int = fixture.catalog.lookup("Il2CppSystem.Int32").unwrap();
        let value = Value::Object(Arc::new(Object::foreign_primitive(foreign_int, Value::I32(3))));
        assert_eq!(resolver.resolve(&value).unwrap().fullname(), "System.Int32");

        let string = fixture.foreign_string("hi");
        assert_eq!(resolver.resolve(&string).unwrap().fullname(), "System.String");
    }

    #[test]
    fn test_closed_generic_trusts_declared() {
        let fixture = DualModelFixture::new();
        let resolver = fixture.identity();
        let int = fixture.catalog.lookup("System.Int32").unwrap();
        let list = TypeBuilder::class("Il2CppSystem.Collections.Generic", "List`1")
            .foreign()
            .generic_args(vec![int])
            .build();
        // A dangling pointer would fail resolution; closed generics never ask the runtime
        let value = Value::Object(Arc::new(Object::wrapper(
            list,
            crate::runtime::NativePtr::new(0xdead),
        )));

        assert_eq!(
            resolver.resolve(&value).unwrap().fullname(),
            "Il2CppSystem.Collections.Generic.List`1[System.Int32]"
        );
    }

    #[test]
    fn test_shadow_prefix_retry() {
        let fixture = DualModelFixture::new();
        let resolver = fixture.identity();

        assert_eq!(
            resolver
                .resolve_class_name("System.Collections.Hashtable")
                .unwrap()
                .fullname(),
            "Il2CppSystem.Collections.Hashtable"
        );
        assert!(resolver.resolve_class_name("Other.Missing").is_none());
    }

    #[test]
    fn test_failure_falls_back_to_declared() {
        let fixture = DualModelFixture::new();
        let resolver = fixture.identity();
        let object_ty = fixture.catalog.lookup("Il2CppSystem.Object").unwrap();
        let dangling = Value::Object(Arc::new(Object::wrapper(
            object_ty,
            crate::runtime::NativePtr::new(0xdead),
        )));

        assert_eq!(
            resolver.resolve(&dangling).unwrap().fullname(),
            "Il2CppSystem.Object"
        );
        assert_eq!(fixture.diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_primitive_table_covers_all_kinds() {
        let fixture = DualModelFixture::new();
        let resolver = fixture.identity();
        for kind in <PrimitiveKind as strum::IntoEnumIterator>::iter() {
            let foreign = fixture
                .catalog
                .lookup(&format!("Il2CppSystem.{}", kind.name()))
                .unwrap();
            let value = Value::Object(Arc::new(Object::foreign_primitive(
                foreign,
                kind.default_value(),
            )));
            assert_eq!(resolver.resolve(&value).unwrap().fullname(), kind.native_fullname());
        }
    }

    #[test]
    fn test_injected_subclass_resolves_through_owner() {
        let fixture = DualModelFixture::new();
        let resolver = fixture.identity();
        let object_ty = fixture.record("Il2CppSystem.Object");
        let marker = TypeBuilder::class("MyMod", "Marker").foreign().extends(&object_ty).build();
        let sub_marker = TypeBuilder::class("MyMod", "SubMarker").foreign().extends(&marker).build();
        fixture.catalog.insert(marker.clone()).unwrap();
        fixture.catalog.insert(sub_marker).unwrap();

        let marker_class = fixture
            .heap
            .register_injected_class("MyMod.Marker", Some(fixture.heap.object_class()));
        let sub_class = fixture
            .heap
            .register_injected_class("MyMod.SubMarker", Some(marker_class));
        let pointer = fixture.heap.alloc(sub_class).unwrap();

        // No owner yet: the declared type wins
        let as_root = Value::Object(Arc::new(Object::wrapper(object_ty, pointer)));
        assert_eq!(resolver.resolve(&as_root).unwrap().fullname(), "Il2CppSystem.Object");

        // The owner was created as the parent type; the subclass is not recovered
        fixture
            .heap
            .set_owner(pointer, Arc::new(Object::wrapper(marker, pointer)));
        assert_eq!(resolver.resolve(&as_root).unwrap().fullname(), "MyMod.Marker");
    }
}
