//! Cross-representation casting.
//!
//! [`CastEngine::try_cast`] converts a value into a target type, moving it between the
//! native and the foreign representation when needed. The attempts run in a fixed order
//! and primitive handling always precedes the general foreign-object path:
//!
//! 1. identity: the declared type already is the target
//! 2. value to value: foreign primitive structs unwrap into native primitives and back,
//!    other native values are boxed into a foreign object and cast again
//! 3. native strings become foreign strings
//! 4. foreign objects unbox into native value types, with enums (and nullable enums)
//!    handled separately
//! 5. foreign objects become native strings through their display string
//! 6. foreign objects become other foreign types after a native class-assignability check
//!
//! # Outcomes
//!
//! A cast never returns an error. [`CastOutcome::Incompatible`] reports a provable
//! incompatibility (the native class check failed, a value does not fit the target
//! primitive). [`CastOutcome::Passthrough`] reports an unexpected failure after which the
//! original value is handed back unchanged. The two are deliberately kept apart.

use std::sync::Arc;

use crate::{
    diagnostics::{DiagnosticCategory, DiagnosticSink},
    interop::{
        identity::IdentityResolver,
        member::{AmbiguousMemberResolver, MemberAccess},
    },
    metadata::{
        catalog::TypeCatalog,
        typesystem::{PrimitiveKind, TypeRecordRc},
    },
    runtime::NativePtr,
    value::{Object, ObjectRef, Value},
};

/// Result of a cast attempt.
#[derive(Clone, Debug, PartialEq)]
pub enum CastOutcome {
    /// The value was converted (possibly to itself)
    Converted(Value),
    /// The value can provably not be represented as the target
    Incompatible,
    /// An unexpected failure occurred; the original value is returned unchanged
    Passthrough(Value),
}

impl CastOutcome {
    /// Converted or passed-through value; `Incompatible` becomes `Value::Null`
    pub fn into_value(self) -> Value {
        match self {
            CastOutcome::Converted(value) | CastOutcome::Passthrough(value) => value,
            CastOutcome::Incompatible => Value::Null,
        }
    }

    /// Borrowing variant of [`into_value`](Self::into_value), `None` for `Incompatible`
    pub fn value(&self) -> Option<&Value> {
        match self {
            CastOutcome::Converted(value) | CastOutcome::Passthrough(value) => Some(value),
            CastOutcome::Incompatible => None,
        }
    }

    /// Whether the cast failed provably
    pub fn is_incompatible(&self) -> bool {
        matches!(self, CastOutcome::Incompatible)
    }

    /// Whether the cast produced a converted value
    pub fn is_converted(&self) -> bool {
        matches!(self, CastOutcome::Converted(_))
    }

    /// Whether the original value was handed back after an unexpected failure
    pub fn is_passthrough(&self) -> bool {
        matches!(self, CastOutcome::Passthrough(_))
    }
}

/// Enum value of `target` named by `text`, either a constant name or a number.
fn enum_from_name(text: &str, target: &TypeRecordRc) -> Option<Value> {
    let text = text.trim();
    target
        .enum_value(text)
        .or_else(|| text.parse::<i64>().ok())
        .map(|value| Value::Enum {
            ty: target.clone(),
            value,
        })
}

/// Enum value of `target` holding the numeric value (or name) of a native value.
fn enum_from_native(value: &Value, target: &TypeRecordRc) -> Option<Value> {
    match value {
        Value::Enum { value, .. } => Some(Value::Enum {
            ty: target.clone(),
            value: *value,
        }),
        Value::String(text) => enum_from_name(text, target),
        other => match PrimitiveKind::Int64.coerce(other)? {
            Value::I64(value) => Some(Value::Enum {
                ty: target.clone(),
                value,
            }),
            _ => None,
        },
    }
}

fn is_native_scalar(value: &Value) -> bool {
    PrimitiveKind::of_value(value).is_some() || matches!(value, Value::Enum { .. })
}

/// Conversion of a native scalar into a primitive or enum target.
///
/// Returns `None` if neither side is of that shape, so the caller continues with the
/// next attempt.
fn convert_scalar(value: &Value, target: &TypeRecordRc) -> Option<CastOutcome> {
    if target.is_enum() {
        if !is_native_scalar(value) && !matches!(value, Value::String(_)) {
            return None;
        }
        return Some(
            enum_from_native(value, target).map_or(CastOutcome::Incompatible, CastOutcome::Converted),
        );
    }

    let kind = target.primitive?;
    if !is_native_scalar(value) {
        return None;
    }
    let Some(converted) = kind.coerce(value) else {
        return Some(CastOutcome::Incompatible);
    };
    Some(if target.is_foreign() {
        CastOutcome::Converted(Value::Object(Arc::new(Object::foreign_primitive(
            target.clone(),
            converted,
        ))))
    } else {
        CastOutcome::Converted(converted)
    })
}

/// Cast between host-side values without a foreign runtime.
///
/// Primitives and enums convert where the value fits; everything else needs host
/// assignability and is otherwise incompatible.
pub(crate) fn cast_native(catalog: &TypeCatalog, value: &Value, target: &TypeRecordRc) -> CastOutcome {
    if value.is_null() {
        return CastOutcome::Converted(Value::Null);
    }
    if value.is_instance_of_name(target) {
        return CastOutcome::Converted(value.clone());
    }
    if let Some(outcome) = convert_scalar(value, target) {
        return outcome;
    }
    match value.declared_type(catalog) {
        Some(declared) if catalog.is_assignable_from(target, &declared) => {
            CastOutcome::Converted(value.clone())
        }
        _ => CastOutcome::Incompatible,
    }
}

/// Casts values across the native and foreign representations.
pub struct CastEngine {
    identity: Arc<IdentityResolver>,
    diagnostics: DiagnosticSink,
}

impl CastEngine {
    /// Create an engine resolving types through `identity`
    pub fn new(identity: Arc<IdentityResolver>, diagnostics: DiagnosticSink) -> Self {
        CastEngine {
            identity,
            diagnostics,
        }
    }

    /// Convert `value` into `target`.
    ///
    /// `try_cast(v, t)` returns `v` unchanged when `t` is the declared type of `v`, or the
    /// actual type of a foreign wrapper `v`.
    pub fn try_cast(&self, value: &Value, target: &TypeRecordRc) -> CastOutcome {
        if value.is_null() {
            return CastOutcome::Converted(Value::Null);
        }
        if value.is_instance_of_name(target) {
            return CastOutcome::Converted(value.clone());
        }

        match value {
            Value::Object(object) if self.is_actual_type(value, object, target) => {
                CastOutcome::Converted(value.clone())
            }
            Value::Object(object) => self.cast_object(value, object, target),
            Value::String(text) if target.is_foreign() && !target.is_value_type() => {
                self.cast_string(value, text, target)
            }
            native => {
                if let Some(outcome) = convert_scalar(native, target) {
                    return outcome;
                }
                if target.is_foreign() && !target.is_value_type() {
                    return self.box_native(native, native, target);
                }
                self.cast_by_assignability(native, target)
            }
        }
    }

    /// Whether a foreign wrapper's runtime class already is `target`, whatever it was
    /// declared as. Objects of injected classes are left to `cast_foreign`, which hands
    /// back their owner.
    fn is_actual_type(&self, value: &Value, object: &ObjectRef, target: &TypeRecordRc) -> bool {
        if !target.is_foreign() {
            return false;
        }
        let Some(pointer) = object.pointer() else {
            return false;
        };
        let runtime = self.identity.runtime();
        if runtime
            .class_of(pointer)
            .is_ok_and(|class| runtime.is_injected(class))
        {
            return false;
        }
        self.identity
            .resolve(value)
            .is_some_and(|actual| actual.fullname_str() == target.fullname_str())
    }

    fn cast_object(&self, value: &Value, object: &ObjectRef, target: &TypeRecordRc) -> CastOutcome {
        if let Some(inner) = object.primitive_value() {
            if let Some(outcome) = convert_scalar(&inner, target) {
                return outcome;
            }
            if target.is_foreign() && !target.is_value_type() {
                return self.box_native(value, &inner, target);
            }
        }

        if target.is_enum() && self.is_nullable(object) {
            return self.cast_nullable(value, object, target);
        }

        let Some(pointer) = object.pointer() else {
            return self.cast_by_assignability(value, target);
        };

        if target.is_enum() {
            return self.unbox_enum(pointer, target);
        }
        if target.is_value_type() && !target.is_foreign() {
            return self.unbox(pointer, target);
        }
        if !target.is_foreign() && target.fullname_str() == "System.String" {
            return self.display_string(value, pointer);
        }
        if target.is_foreign() {
            return self.cast_foreign(value, pointer, target);
        }
        self.cast_by_assignability(value, target)
    }

    /// Box a native value into a foreign object, then cast that object to `target`
    fn box_native(&self, original: &Value, native: &Value, target: &TypeRecordRc) -> CastOutcome {
        let catalog = self.identity.catalog();
        let config = self.identity.config();
        let runtime = self.identity.runtime();

        let Some(source) = native.declared_type(catalog) else {
            return CastOutcome::Passthrough(original.clone());
        };
        let class = runtime.class_for_type(&source).or_else(|| {
            catalog
                .lookup(&config.shadow_type_name(source.fullname_str()))
                .and_then(|shadow| runtime.class_for_type(&shadow))
        });
        let Some(class) = class else {
            self.diagnostics.warn_once(
                DiagnosticCategory::Cast,
                format!("no-class:{}", source.fullname_str()),
                format!("no native class to box {} into", source.fullname_str()),
            );
            return CastOutcome::Passthrough(original.clone());
        };

        let pointer = match runtime.box_value(class, native) {
            Ok(pointer) => pointer,
            Err(error) => {
                self.diagnostics.type_warning(
                    DiagnosticCategory::Cast,
                    source.fullname_str(),
                    format!("boxing failed: {error}"),
                );
                return CastOutcome::Passthrough(original.clone());
            }
        };

        let Some(object_type) = catalog.lookup(&config.shadow_type_name("System.Object")) else {
            self.diagnostics.warn_once(
                DiagnosticCategory::Cast,
                "no-shadow-object",
                "foreign System.Object proxy is not loaded",
            );
            return CastOutcome::Passthrough(original.clone());
        };

        let boxed = Value::Object(Arc::new(Object::wrapper(object_type, pointer)));
        self.recast(original, &boxed, target)
    }

    fn cast_string(&self, original: &Value, text: &str, target: &TypeRecordRc) -> CastOutcome {
        let catalog = self.identity.catalog();
        let Some(string_type) =
            catalog.lookup(&self.identity.config().shadow_type_name("System.String"))
        else {
            self.diagnostics.warn_once(
                DiagnosticCategory::Cast,
                "no-shadow-string",
                "foreign System.String proxy is not loaded",
            );
            return CastOutcome::Passthrough(original.clone());
        };

        let wrapped = self
            .identity
            .runtime()
            .new_string(text)
            .and_then(|pointer| string_type.construct_wrapper(pointer));
        match wrapped {
            Ok(wrapper) => self.recast(original, &Value::Object(wrapper), target),
            Err(error) => {
                self.diagnostics.type_warning(
                    DiagnosticCategory::Cast,
                    string_type.fullname_str(),
                    format!("string conversion failed: {error}"),
                );
                CastOutcome::Passthrough(original.clone())
            }
        }
    }

    /// Cast an intermediate value; a soft failure hands back the original value
    fn recast(&self, original: &Value, intermediate: &Value, target: &TypeRecordRc) -> CastOutcome {
        match self.try_cast(intermediate, target) {
            CastOutcome::Passthrough(_) => CastOutcome::Passthrough(original.clone()),
            outcome => outcome,
        }
    }

    fn is_nullable(&self, object: &ObjectRef) -> bool {
        object.ty().definition_fullname() == self.identity.config().nullable_type
    }

    /// Unwrap a nullable wrapper. An empty nullable hands back the wrapper itself.
    fn cast_nullable(&self, value: &Value, object: &ObjectRef, target: &TypeRecordRc) -> CastOutcome {
        let catalog = self.identity.catalog();
        let variants = self.identity.config().backing_field_variants;
        let (Some(boolean), Some(any)) = (catalog.lookup("System.Boolean"), catalog.lookup("System.Object"))
        else {
            return CastOutcome::Passthrough(value.clone());
        };

        let has_value = AmbiguousMemberResolver::<bool>::new(
            catalog,
            object.ty(),
            &boolean,
            &["HasValue", "hasValue"],
            MemberAccess::READ,
            variants,
        );
        let inner = AmbiguousMemberResolver::<Value>::new(
            catalog,
            object.ty(),
            &any,
            &["Value", "value"],
            MemberAccess::READ,
            variants,
        );
        let (Ok(has_value), Ok(inner)) = (has_value, inner) else {
            return CastOutcome::Passthrough(value.clone());
        };

        if !has_value.get(value) {
            return CastOutcome::Passthrough(value.clone());
        }
        match inner.read(value) {
            Some(held) => self.recast(value, &held, target),
            None => {
                self.diagnostics.type_warning(
                    DiagnosticCategory::Cast,
                    object.ty().fullname_str(),
                    "nullable reports a value but it can not be read",
                );
                CastOutcome::Passthrough(value.clone())
            }
        }
    }

    fn unbox_enum(&self, pointer: NativePtr, target: &TypeRecordRc) -> CastOutcome {
        let runtime = self.identity.runtime();
        if let Some(converted) = runtime
            .unbox_value(pointer)
            .ok()
            .and_then(|unboxed| enum_from_native(&unboxed, target))
        {
            return CastOutcome::Converted(converted);
        }

        match runtime.to_display_string(pointer) {
            Ok(text) => enum_from_name(&text, target)
                .map_or(CastOutcome::Incompatible, CastOutcome::Converted),
            Err(error) => {
                self.diagnostics.type_warning(
                    DiagnosticCategory::Cast,
                    target.fullname_str(),
                    format!("enum unboxing of {pointer} failed: {error}"),
                );
                CastOutcome::Incompatible
            }
        }
    }

    fn unbox(&self, pointer: NativePtr, target: &TypeRecordRc) -> CastOutcome {
        let unboxed = match self.identity.runtime().unbox_value(pointer) {
            Ok(unboxed) => unboxed,
            Err(error) => {
                self.diagnostics.type_warning(
                    DiagnosticCategory::Cast,
                    target.fullname_str(),
                    format!("unboxing of {pointer} failed: {error}"),
                );
                return CastOutcome::Incompatible;
            }
        };

        match target.primitive {
            Some(kind) => kind
                .coerce(&unboxed)
                .map_or(CastOutcome::Incompatible, CastOutcome::Converted),
            None if unboxed.is_instance_of_name(target) => CastOutcome::Converted(unboxed),
            None => CastOutcome::Incompatible,
        }
    }

    fn display_string(&self, value: &Value, pointer: NativePtr) -> CastOutcome {
        let runtime = self.identity.runtime();
        match runtime
            .read_string(pointer)
            .or_else(|_| runtime.to_display_string(pointer))
        {
            Ok(text) => CastOutcome::Converted(Value::from(text)),
            Err(error) => {
                self.diagnostics.warning(
                    DiagnosticCategory::Cast,
                    format!("string conversion of {pointer} failed: {error}"),
                );
                CastOutcome::Passthrough(value.clone())
            }
        }
    }

    fn cast_foreign(&self, value: &Value, pointer: NativePtr, target: &TypeRecordRc) -> CastOutcome {
        let runtime = self.identity.runtime();

        let source_class = match runtime.class_of(pointer) {
            Ok(class) => class,
            Err(error) => {
                self.diagnostics.warning(
                    DiagnosticCategory::Cast,
                    format!("class of {pointer} is unavailable: {error}"),
                );
                return CastOutcome::Passthrough(value.clone());
            }
        };
        let Some(target_class) = runtime.class_for_type(target) else {
            self.diagnostics.warn_once(
                DiagnosticCategory::Cast,
                format!("no-class:{}", target.fullname_str()),
                format!("{} has no native class", target.fullname_str()),
            );
            return CastOutcome::Passthrough(value.clone());
        };

        if !runtime.is_assignable_from(target_class, source_class) {
            return CastOutcome::Incompatible;
        }

        // Injected targets never get a second wrapper: the owner, or else the source itself
        if runtime.is_injected(target_class) {
            return match runtime.injected_owner(pointer) {
                Some(owner) => CastOutcome::Converted(Value::Object(owner)),
                None => CastOutcome::Passthrough(value.clone()),
            };
        }

        match target.construct_wrapper(pointer) {
            Ok(wrapper) => CastOutcome::Converted(Value::Object(wrapper)),
            Err(error) => {
                self.diagnostics.type_warning(
                    DiagnosticCategory::Cast,
                    target.fullname_str(),
                    format!("wrapper construction failed: {error}"),
                );
                CastOutcome::Passthrough(value.clone())
            }
        }
    }

    fn cast_by_assignability(&self, value: &Value, target: &TypeRecordRc) -> CastOutcome {
        match self.identity.resolve(value) {
            Some(actual) if self.identity.catalog().is_assignable_from(target, &actual) => {
                CastOutcome::Converted(value.clone())
            }
            _ => CastOutcome::Passthrough(value.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::BridgeConfig,
        diagnostics::DiagnosticSink,
        metadata::typesystem::TypeBuilder,
        runtime::ForeignRuntime,
        test::DualModelFixture,
    };

    #[test]
    fn test_identity_law() {
        let fixture = DualModelFixture::new();
        let engine = fixture.cast_engine();
        let player = fixture.foreign_instance("MyGame.PlayerController");

        for value in [
            Value::I32(4),
            Value::from("text"),
            fixture.foreign_string("foreign"),
            player.clone(),
        ] {
            let declared = value.declared_type(&fixture.catalog).unwrap();
            let outcome = engine.try_cast(&value, &declared);
            assert!(outcome.value().unwrap().ptr_eq(&value) || outcome.value() == Some(&value));
        }
    }

    #[test]
    fn test_identity_law_uses_actual_type() {
        let fixture = DualModelFixture::new();
        let engine = fixture.cast_engine();
        let player = fixture.foreign_instance("MyGame.PlayerController");
        let pointer = player.as_object().unwrap().pointer().unwrap();
        let as_root = Value::Object(Arc::new(Object::wrapper(
            fixture.record("Il2CppSystem.Object"),
            pointer,
        )));

        let actual = fixture.identity().resolve(&as_root).unwrap();
        assert_eq!(actual.fullname(), "MyGame.PlayerController");

        let outcome = engine.try_cast(&as_root, &actual);
        assert!(outcome.is_converted());
        assert!(outcome.value().unwrap().ptr_eq(&as_root));
    }

    #[test]
    fn test_injected_target_keeps_wrapper_identity() {
        let fixture = DualModelFixture::new();
        let engine = fixture.cast_engine();
        let object = fixture.record("Il2CppSystem.Object");
        let marker = TypeBuilder::class("MyMod", "Marker")
            .foreign()
            .extends(&object)
            .build();
        fixture.catalog.insert(marker.clone()).unwrap();
        let class = fixture
            .heap
            .register_injected_class("MyMod.Marker", Some(fixture.heap.object_class()));
        fixture.heap.bind_type("MyMod.Marker", class);

        // No owner registered for the pointer
        let pointer = fixture.heap.alloc(class).unwrap();
        let source = Value::Object(Arc::new(Object::wrapper(object, pointer)));
        let first = engine.try_cast(&source, &marker).into_value();
        let second = engine.try_cast(&source, &marker).into_value();
        assert!(first.ptr_eq(&source));
        assert!(second.ptr_eq(&first));

        let owner = Arc::new(Object::wrapper(marker.clone(), pointer));
        fixture.heap.set_owner(pointer, owner.clone());
        let owned = engine.try_cast(&source, &marker).into_value();
        assert!(owned.ptr_eq(&Value::Object(owner.clone())));
        assert!(engine
            .try_cast(&source, &marker)
            .into_value()
            .ptr_eq(&Value::Object(owner)));
    }

    #[test]
    fn test_primitive_round_trip() {
        let fixture = DualModelFixture::new();
        let engine = fixture.cast_engine();

        for kind in <PrimitiveKind as strum::IntoEnumIterator>::iter() {
            let native = kind.coerce(&Value::I32(1)).unwrap();
            let foreign_type = fixture
                .catalog
                .lookup(&format!("Il2CppSystem.{}", kind.name()))
                .unwrap();
            let native_type = fixture.catalog.lookup(&kind.native_fullname()).unwrap();

            let foreign = engine.try_cast(&native, &foreign_type).into_value();
            assert!(matches!(&foreign, Value::Object(object) if object.is_foreign_primitive()));

            let back = engine.try_cast(&foreign, &native_type).into_value();
            assert_eq!(back, native, "{kind}");
        }
    }

    #[test]
    fn test_primitive_overflow_is_incompatible() {
        let fixture = DualModelFixture::new();
        let engine = fixture.cast_engine();
        let byte = fixture.catalog.lookup("System.Byte").unwrap();

        assert!(engine.try_cast(&Value::I32(300), &byte).is_incompatible());
        assert_eq!(
            engine.try_cast(&Value::I32(200), &byte),
            CastOutcome::Converted(Value::U8(200))
        );
    }

    #[test]
    fn test_box_then_unbox() {
        let fixture = DualModelFixture::new();
        let engine = fixture.cast_engine();
        let object = fixture.catalog.lookup("Il2CppSystem.Object").unwrap();
        let int = fixture.catalog.lookup("System.Int32").unwrap();

        let boxed = engine.try_cast(&Value::I32(42), &object).into_value();
        let wrapper = boxed.as_object().unwrap();
        assert!(wrapper.is_foreign());
        assert_eq!(wrapper.ty().fullname(), "Il2CppSystem.Object");

        assert_eq!(
            engine.try_cast(&boxed, &int),
            CastOutcome::Converted(Value::I32(42))
        );
    }

    #[test]
    fn test_string_round_trip() {
        let fixture = DualModelFixture::new();
        let engine = fixture.cast_engine();
        let foreign_string = fixture.catalog.lookup("Il2CppSystem.String").unwrap();
        let string = fixture.catalog.lookup("System.String").unwrap();

        let foreign = engine
            .try_cast(&Value::from("hello"), &foreign_string)
            .into_value();
        let pointer = foreign.as_object().unwrap().pointer().unwrap();
        assert_eq!(fixture.heap.read_string(pointer).unwrap(), "hello");

        assert_eq!(
            engine.try_cast(&foreign, &string),
            CastOutcome::Converted(Value::from("hello"))
        );
    }

    #[test]
    fn test_enum_by_number_and_name() {
        let fixture = DualModelFixture::new();
        let engine = fixture.cast_engine();
        let state = fixture.catalog.lookup("MyGame.State").unwrap();

        let running = engine.try_cast(&fixture.boxed(Value::I32(1)), &state);
        assert_eq!(
            running,
            CastOutcome::Converted(Value::Enum {
                ty: state.clone(),
                value: 1
            })
        );

        let by_name = engine.try_cast(&fixture.foreign_string("Stopped"), &state);
        assert_eq!(
            by_name,
            CastOutcome::Converted(Value::Enum {
                ty: state.clone(),
                value: 2
            })
        );

        let unknown = engine.try_cast(&fixture.foreign_string("Flying"), &state);
        assert!(unknown.is_incompatible());
    }

    #[test]
    fn test_unbox_failure_is_incompatible() {
        let fixture = DualModelFixture::new();
        let engine = fixture.cast_engine();
        let int = fixture.catalog.lookup("System.Int32").unwrap();
        let player = fixture.foreign_instance("MyGame.PlayerController");

        assert!(engine.try_cast(&player, &int).is_incompatible());
        assert_eq!(fixture.diagnostics.warning_count(), 1);
    }

    #[test]
    fn test_native_scalar_helpers() {
        let catalog = TypeCatalog::new(&BridgeConfig::managed(), DiagnosticSink::silent());
        let state = TypeBuilder::enumeration("A", "Mode")
            .constant("On", 1)
            .build();
        let long = catalog.lookup("System.Int64").unwrap();
        let string = catalog.lookup("System.String").unwrap();

        assert_eq!(
            cast_native(&catalog, &Value::I32(7), &long),
            CastOutcome::Converted(Value::I64(7))
        );
        assert_eq!(
            cast_native(&catalog, &Value::from("On"), &state),
            CastOutcome::Converted(Value::Enum {
                ty: state.clone(),
                value: 1
            })
        );
        assert!(cast_native(&catalog, &Value::I32(7), &string).is_incompatible());
        assert_eq!(CastOutcome::Incompatible.into_value(), Value::Null);
    }
}
