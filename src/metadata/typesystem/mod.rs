//! Reflective type model the bridge operates on.
//!
//! A [`TypeRecord`] describes one host-side type: its name, flags, which representation
//! its instances use, and its members. Records are immutable in identity once built
//! (name, flags, generic arguments) and append-only in content (members, interfaces,
//! attributes), the same way loaded runtime types behave.
//!
//! # Key Components
//!
//! - [`TypeRecord`]: a loaded type
//! - [`TypeKey`]: assembly-qualified identity used by every cache
//! - [`TypeFlags`] / [`Representation`]: classification of a record
//! - [`TypeBuilder`]: fluent construction of records
//! - [`PrimitiveKind`]: the 14 primitive kinds shared by both representations
//! - [`FieldInfo`], [`PropertyInfo`], [`MethodInfo`]: members
//!
//! # Examples
//!
//! ```rust
//! use dotbridge::metadata::typesystem::{TypeBuilder, TypeFlags};
//!
//! let foo = TypeBuilder::class("A", "Foo").abstract_type().build();
//! let bar = TypeBuilder::class("A", "Bar").extends(&foo).build();
//!
//! assert_eq!(bar.fullname(), "A.Bar");
//! assert!(foo.flags.contains(TypeFlags::ABSTRACT));
//! assert_eq!(bar.base().unwrap().fullname(), "A.Foo");
//! ```

mod builder;
mod members;
mod primitives;

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, OnceLock, RwLock},
};

use bitflags::bitflags;

pub use builder::TypeBuilder;
pub use members::{
    FieldFlags, FieldInfo, FieldRc, Getter, Invoker, MethodInfo, MethodRc, PropertyInfo,
    PropertyRc, Setter, WrapperCtor,
};
pub use primitives::PrimitiveKind;

use crate::{
    metadata::customattributes::CustomAttribute,
    runtime::NativePtr,
    value::{Object, ObjectRef, Value},
    Error, Result,
};

/// Reference to a `TypeRecord`
pub type TypeRecordRc = Arc<TypeRecord>;

bitflags! {
    /// Classification flags of a [`TypeRecord`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u32 {
        /// Can not be instantiated directly
        const ABSTRACT = 0x0001;
        /// Can not be derived from
        const SEALED = 0x0002;
        /// Interface type (always abstract)
        const INTERFACE = 0x0004;
        /// Instances have value semantics
        const VALUE_TYPE = 0x0008;
        /// Enumeration (always a sealed value type)
        const ENUM = 0x0010;
        /// Has generic parameters or arguments
        const GENERIC = 0x0020;
        /// Open generic definition, e.g. ``List`1``
        const GENERIC_DEFINITION = 0x0040;
        /// One of the 14 primitive kinds, in either representation
        const PRIMITIVE = 0x0080;
    }
}

/// Which object model instances of a type live in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Representation {
    /// Plain managed objects.
    Native,
    /// Managed proxies over natively allocated objects.
    Foreign,
}

/// Assembly-qualified identity of a type (`Namespace.Name, Assembly`).
///
/// Two records loaded from the same module under the same name share a key, which is
/// what lets a hot-reloaded record take over its predecessor's cache entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    /// Create a key from a full name and an assembly name
    #[must_use]
    pub fn new(fullname: &str, assembly: &str) -> Self {
        if assembly.is_empty() {
            TypeKey(Arc::from(fullname))
        } else {
            TypeKey(Arc::from(format!("{fullname}, {assembly}")))
        }
    }

    /// The key as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A loaded type, in either representation.
pub struct TypeRecord {
    /// `TypeNamespace` (can be empty for global types)
    pub namespace: String,
    /// `TypeName`, without generic arguments
    pub name: String,
    /// Name of the module that defined the type
    pub assembly: String,
    /// Classification flags
    pub flags: TypeFlags,
    /// Object model of instances
    pub representation: Representation,
    /// Closed generic arguments (empty for non-generic types and open definitions)
    pub generic_args: Vec<TypeRecordRc>,
    /// Primitive kind, for primitive types and enum underlying storage
    pub primitive: Option<PrimitiveKind>,
    /// Interfaces this type implements directly
    pub interfaces: boxcar::Vec<TypeRecordRc>,
    /// Declared fields
    pub fields: boxcar::Vec<FieldRc>,
    /// Declared properties
    pub properties: boxcar::Vec<PropertyRc>,
    /// Declared methods
    pub methods: boxcar::Vec<MethodRc>,
    /// Custom attributes
    pub custom_attributes: boxcar::Vec<CustomAttribute>,
    /// Named constants of an enum type
    pub enum_constants: boxcar::Vec<(String, i64)>,
    /// Storage for static fields without a custom accessor
    pub(crate) static_values: RwLock<HashMap<String, Value>>,
    base: OnceLock<TypeRecordRc>,
    base_name: Option<String>,
    wrapper_ctor: OnceLock<WrapperCtor>,
    fullname: String,
    key: TypeKey,
}

impl TypeRecord {
    /// Create a new instance of a `TypeRecord`
    ///
    /// Prefer [`TypeBuilder`] for anything beyond a bare record.
    pub fn new(
        namespace: &str,
        name: &str,
        assembly: &str,
        flags: TypeFlags,
        representation: Representation,
        generic_args: Vec<TypeRecordRc>,
    ) -> Self {
        let definition = if namespace.is_empty() {
            name.to_string()
        } else {
            format!("{namespace}.{name}")
        };
        let fullname = if generic_args.is_empty() {
            definition
        } else {
            let args: Vec<String> = generic_args.iter().map(|arg| arg.fullname()).collect();
            format!("{definition}[{}]", args.join(","))
        };
        let key = TypeKey::new(&fullname, assembly);

        TypeRecord {
            namespace: namespace.to_string(),
            name: name.to_string(),
            assembly: assembly.to_string(),
            flags,
            representation,
            generic_args,
            primitive: None,
            interfaces: boxcar::Vec::new(),
            fields: boxcar::Vec::new(),
            properties: boxcar::Vec::new(),
            methods: boxcar::Vec::new(),
            custom_attributes: boxcar::Vec::new(),
            enum_constants: boxcar::Vec::new(),
            static_values: RwLock::new(HashMap::new()),
            base: OnceLock::new(),
            base_name: None,
            wrapper_ctor: OnceLock::new(),
            fullname,
            key,
        }
    }

    /// Returns the full name (`Namespace.Name`, plus `[Args]` for closed generics)
    pub fn fullname(&self) -> String {
        self.fullname.clone()
    }

    /// Borrowing variant of [`fullname`](Self::fullname)
    pub fn fullname_str(&self) -> &str {
        &self.fullname
    }

    /// Full name of the generic definition (`Namespace.Name`, no arguments)
    pub fn definition_fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Assembly-qualified identity
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Base type, if it is set or was already resolved
    ///
    /// Lazily declared bases are resolved through
    /// [`TypeCatalog::base_type`](crate::metadata::catalog::TypeCatalog::base_type).
    pub fn base(&self) -> Option<TypeRecordRc> {
        self.base.get().cloned()
    }

    /// Name of a lazily declared base type
    pub fn base_name(&self) -> Option<&str> {
        self.base_name.as_deref()
    }

    /// Sets the base type. Returns `false` if a base was already set.
    pub fn set_base(&self, base: TypeRecordRc) -> bool {
        self.base.set(base).is_ok()
    }

    /// Whether instances are proxies over native objects
    pub fn is_foreign(&self) -> bool {
        self.representation == Representation::Foreign
    }

    /// Whether this is a value type
    pub fn is_value_type(&self) -> bool {
        self.flags.intersects(TypeFlags::VALUE_TYPE | TypeFlags::ENUM)
    }

    /// Whether this is an enum type
    pub fn is_enum(&self) -> bool {
        self.flags.contains(TypeFlags::ENUM)
    }

    /// Whether this is an abstract type (interfaces included)
    pub fn is_abstract(&self) -> bool {
        self.flags.intersects(TypeFlags::ABSTRACT | TypeFlags::INTERFACE)
    }

    /// Whether this is a static class (abstract and sealed)
    pub fn is_static(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT | TypeFlags::SEALED)
    }

    /// Whether this is generic in any form
    pub fn is_generic(&self) -> bool {
        self.flags
            .intersects(TypeFlags::GENERIC | TypeFlags::GENERIC_DEFINITION)
    }

    /// Whether this is a constructed generic type with all arguments bound
    pub fn is_closed_generic(&self) -> bool {
        self.flags.contains(TypeFlags::GENERIC)
            && !self.flags.contains(TypeFlags::GENERIC_DEFINITION)
            && !self.generic_args.is_empty()
    }

    /// Declared field by exact name
    pub fn field(&self, name: &str) -> Option<FieldRc> {
        self.fields
            .iter()
            .find(|(_, field)| field.name == name)
            .map(|(_, field)| field.clone())
    }

    /// Declared property by exact name
    pub fn property(&self, name: &str) -> Option<PropertyRc> {
        self.properties
            .iter()
            .find(|(_, property)| property.name == name)
            .map(|(_, property)| property.clone())
    }

    /// Declared method by exact name
    pub fn method(&self, name: &str) -> Option<MethodRc> {
        self.methods
            .iter()
            .find(|(_, method)| method.name == name)
            .map(|(_, method)| method.clone())
    }

    /// Value of an enum constant by name
    pub fn enum_value(&self, name: &str) -> Option<i64> {
        self.enum_constants
            .iter()
            .find(|(_, (constant, _))| constant == name)
            .map(|(_, (_, value))| *value)
    }

    /// Name of the enum constant holding `value`
    pub fn enum_name(&self, value: i64) -> Option<String> {
        self.enum_constants
            .iter()
            .find(|(_, (_, constant))| *constant == value)
            .map(|(_, (name, _))| name.clone())
    }

    /// Installs the constructor used to wrap native pointers in this type.
    pub fn set_wrapper_ctor(&self, ctor: WrapperCtor) -> bool {
        self.wrapper_ctor.set(ctor).is_ok()
    }

    /// Builds a host-side wrapper of this type around `pointer`.
    ///
    /// # Errors
    /// Returns [`Error::NotInvocable`] for abstract types and interfaces without a custom
    /// constructor, or whatever the custom constructor returns.
    pub fn construct_wrapper(self: &Arc<Self>, pointer: NativePtr) -> Result<ObjectRef> {
        if let Some(ctor) = self.wrapper_ctor.get() {
            return ctor(self, pointer);
        }

        if self.is_abstract() {
            return Err(Error::NotInvocable(format!(
                "cannot create an instance of abstract type {}",
                self.fullname
            )));
        }

        Ok(Arc::new(Object::wrapper(self.clone(), pointer)))
    }

    pub(crate) fn set_base_name(&mut self, name: String) {
        self.base_name = Some(name);
    }
}

impl fmt::Debug for TypeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRecord")
            .field("key", &self.key)
            .field("flags", &self.flags)
            .field("representation", &self.representation)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for TypeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fullname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fullname_and_key() {
        let int = TypeBuilder::value_type("System", "Int32").build();
        let list = TypeBuilder::class("System.Collections.Generic", "List`1")
            .assembly("mscorlib")
            .generic_args(vec![int.clone()])
            .build();

        assert_eq!(int.fullname(), "System.Int32");
        assert_eq!(list.fullname(), "System.Collections.Generic.List`1[System.Int32]");
        assert_eq!(
            list.definition_fullname(),
            "System.Collections.Generic.List`1"
        );
        assert_eq!(
            list.key().as_str(),
            "System.Collections.Generic.List`1[System.Int32], mscorlib"
        );
        assert!(list.is_closed_generic());
    }

    #[test]
    fn test_global_namespace() {
        let module = TypeBuilder::class("", "<Module>").build();
        assert_eq!(module.fullname(), "<Module>");
        assert_eq!(module.key().as_str(), "<Module>");
    }

    #[test]
    fn test_flag_queries() {
        let util = TypeBuilder::class("A", "Util").static_class().build();
        assert!(util.is_static());
        assert!(util.is_abstract());

        let iface = TypeBuilder::interface("A", "IThing").build();
        assert!(iface.is_abstract());
        assert!(!iface.is_static());

        let open = TypeBuilder::class("A", "Box`1").generic_definition().build();
        assert!(open.is_generic());
        assert!(!open.is_closed_generic());
    }

    #[test]
    fn test_enum_constants() {
        let color = TypeBuilder::enumeration("MyGame", "Color")
            .constant("Red", 0)
            .constant("Blue", 2)
            .build();

        assert!(color.is_enum());
        assert!(color.is_value_type());
        assert_eq!(color.enum_value("Blue"), Some(2));
        assert_eq!(color.enum_name(0).as_deref(), Some("Red"));
        assert_eq!(color.enum_value("Green"), None);
    }

    #[test]
    fn test_construct_wrapper() {
        let concrete = TypeBuilder::class("A", "Concrete").foreign().build();
        let wrapper = concrete.construct_wrapper(NativePtr::new(0x10)).unwrap();
        assert_eq!(wrapper.pointer(), Some(NativePtr::new(0x10)));

        let abstract_type = TypeBuilder::class("A", "Shape").abstract_type().build();
        assert!(matches!(
            abstract_type.construct_wrapper(NativePtr::new(0x10)),
            Err(Error::NotInvocable(_))
        ));
    }

    #[test]
    fn test_base_set_once() {
        let object = TypeBuilder::class("System", "Object").build();
        let other = TypeBuilder::class("System", "Other").build();
        let derived = TypeBuilder::class("A", "Derived").build();

        assert!(derived.set_base(object.clone()));
        assert!(!derived.set_base(other));
        assert_eq!(derived.base().unwrap().fullname(), "System.Object");
    }
}
