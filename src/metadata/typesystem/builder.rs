//! Builder for [`TypeRecord`]s.
//!
//! This module provides the [`TypeBuilder`] struct, a fluent API for constructing classes,
//! value types, interfaces, enums and primitives together with their members. Module
//! loaders and test fixtures use it to produce the records handed to the
//! [`TypeCatalog`](crate::metadata::catalog::TypeCatalog).
//!
//! # Example
//!
//! ```rust
//! use dotbridge::metadata::typesystem::{TypeBuilder, PrimitiveKind};
//!
//! let int = TypeBuilder::primitive(PrimitiveKind::Int32).build();
//! let list = TypeBuilder::class("System.Collections.Generic", "List`1")
//!     .generic_args(vec![int])
//!     .implements_named("System.Collections.IEnumerable")
//!     .build();
//!
//! assert!(list.is_closed_generic());
//! ```

use std::sync::Arc;

use crate::metadata::{
    customattributes::CustomAttribute,
    typesystem::{
        FieldInfo, MethodInfo, PrimitiveKind, PropertyInfo, Representation, TypeFlags,
        TypeRecord, TypeRecordRc, WrapperCtor,
    },
};

/// Provides a fluent API for building type records
pub struct TypeBuilder {
    namespace: String,
    name: String,
    assembly: String,
    flags: TypeFlags,
    representation: Representation,
    primitive: Option<PrimitiveKind>,
    generic_args: Vec<TypeRecordRc>,
    base: Option<TypeRecordRc>,
    base_name: Option<String>,
    interfaces: Vec<TypeRecordRc>,
    interface_names: Vec<String>,
    fields: Vec<FieldInfo>,
    properties: Vec<PropertyInfo>,
    methods: Vec<MethodInfo>,
    attributes: Vec<CustomAttribute>,
    constants: Vec<(String, i64)>,
    wrapper_ctor: Option<WrapperCtor>,
}

impl TypeBuilder {
    fn start(namespace: &str, name: &str, flags: TypeFlags) -> Self {
        TypeBuilder {
            namespace: namespace.to_string(),
            name: name.to_string(),
            assembly: String::new(),
            flags,
            representation: Representation::Native,
            primitive: None,
            generic_args: Vec::new(),
            base: None,
            base_name: None,
            interfaces: Vec::new(),
            interface_names: Vec::new(),
            fields: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            constants: Vec::new(),
            wrapper_ctor: None,
        }
    }

    /// Start building a class with the given name
    pub fn class(namespace: &str, name: &str) -> Self {
        Self::start(namespace, name, TypeFlags::empty())
    }

    /// Start building a value type with the given name
    pub fn value_type(namespace: &str, name: &str) -> Self {
        Self::start(namespace, name, TypeFlags::VALUE_TYPE | TypeFlags::SEALED)
    }

    /// Start building an interface with the given name
    pub fn interface(namespace: &str, name: &str) -> Self {
        Self::start(namespace, name, TypeFlags::INTERFACE | TypeFlags::ABSTRACT)
    }

    /// Start building an enum with the given name, backed by `Int32`
    pub fn enumeration(namespace: &str, name: &str) -> Self {
        let mut builder = Self::start(
            namespace,
            name,
            TypeFlags::ENUM | TypeFlags::VALUE_TYPE | TypeFlags::SEALED,
        );
        builder.primitive = Some(PrimitiveKind::Int32);
        builder.base_name = Some("System.Enum".to_string());
        builder
    }

    /// Start building the native form of a primitive, e.g. `System.Int32`
    pub fn primitive(kind: PrimitiveKind) -> Self {
        let mut builder = Self::start(
            "System",
            kind.name(),
            TypeFlags::VALUE_TYPE | TypeFlags::SEALED | TypeFlags::PRIMITIVE,
        );
        builder.primitive = Some(kind);
        builder.base_name = Some("System.ValueType".to_string());
        builder
    }

    /// Start building the foreign struct form of a primitive, e.g. `Il2CppSystem.Int32`
    pub fn foreign_primitive(kind: PrimitiveKind, shadow_prefix: &str) -> Self {
        let mut builder = Self::start(
            &format!("{shadow_prefix}System"),
            kind.name(),
            TypeFlags::VALUE_TYPE | TypeFlags::SEALED | TypeFlags::PRIMITIVE,
        );
        builder.primitive = Some(kind);
        builder.representation = Representation::Foreign;
        builder
    }

    /// Set the defining module
    #[must_use]
    pub fn assembly(mut self, assembly: &str) -> Self {
        self.assembly = assembly.to_string();
        self
    }

    /// Instances are proxies over native objects
    #[must_use]
    pub fn foreign(mut self) -> Self {
        self.representation = Representation::Foreign;
        self
    }

    /// Mark the type abstract
    #[must_use]
    pub fn abstract_type(mut self) -> Self {
        self.flags |= TypeFlags::ABSTRACT;
        self
    }

    /// Mark the type sealed
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.flags |= TypeFlags::SEALED;
        self
    }

    /// Mark the type a static class (abstract and sealed)
    #[must_use]
    pub fn static_class(mut self) -> Self {
        self.flags |= TypeFlags::ABSTRACT | TypeFlags::SEALED;
        self
    }

    /// Mark the type an open generic definition
    #[must_use]
    pub fn generic_definition(mut self) -> Self {
        self.flags |= TypeFlags::GENERIC | TypeFlags::GENERIC_DEFINITION;
        self
    }

    /// Close the type over the given generic arguments
    #[must_use]
    pub fn generic_args(mut self, args: Vec<TypeRecordRc>) -> Self {
        if !args.is_empty() {
            self.flags |= TypeFlags::GENERIC;
        }
        self.generic_args = args;
        self
    }

    /// Set the underlying storage kind of an enum
    #[must_use]
    pub fn underlying(mut self, kind: PrimitiveKind) -> Self {
        self.primitive = Some(kind);
        self
    }

    /// Set the base type
    #[must_use]
    pub fn extends(mut self, base: &TypeRecordRc) -> Self {
        self.base = Some(base.clone());
        self
    }

    /// Declare the base type by full name, resolved through the catalog on first use
    #[must_use]
    pub fn extends_named(mut self, fullname: &str) -> Self {
        self.base_name = Some(fullname.to_string());
        self
    }

    /// Add an implemented interface
    #[must_use]
    pub fn implements(mut self, interface: &TypeRecordRc) -> Self {
        self.interfaces.push(interface.clone());
        self
    }

    /// Add an implemented interface by full name
    ///
    /// The interface is recorded as a placeholder record carrying only its name, which is
    /// all assignability checks compare.
    #[must_use]
    pub fn implements_named(mut self, fullname: &str) -> Self {
        self.interface_names.push(fullname.to_string());
        self
    }

    /// Add a field
    #[must_use]
    pub fn field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a property
    #[must_use]
    pub fn property(mut self, property: PropertyInfo) -> Self {
        self.properties.push(property);
        self
    }

    /// Add a method
    #[must_use]
    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    /// Add a custom attribute
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Add a named enum constant
    #[must_use]
    pub fn constant(mut self, name: &str, value: i64) -> Self {
        self.constants.push((name.to_string(), value));
        self
    }

    /// Use a custom constructor for wrappers around native pointers
    #[must_use]
    pub fn wrapper(mut self, ctor: WrapperCtor) -> Self {
        self.wrapper_ctor = Some(ctor);
        self
    }

    /// Finish the record
    pub fn build(self) -> TypeRecordRc {
        let mut record = TypeRecord::new(
            &self.namespace,
            &self.name,
            &self.assembly,
            self.flags,
            self.representation,
            self.generic_args,
        );
        record.primitive = self.primitive;
        if self.base.is_none() {
            if let Some(base_name) = self.base_name {
                record.set_base_name(base_name);
            }
        }

        let record = Arc::new(record);
        if let Some(base) = self.base {
            record.set_base(base);
        }
        for interface in self.interfaces {
            record.interfaces.push(interface);
        }
        for name in self.interface_names {
            let (namespace, simple) = match name.rsplit_once('.') {
                Some((namespace, simple)) => (namespace, simple),
                None => ("", name.as_str()),
            };
            record
                .interfaces
                .push(TypeBuilder::interface(namespace, simple).build());
        }
        for field in self.fields {
            record.fields.push(Arc::new(field));
        }
        for property in self.properties {
            record.properties.push(Arc::new(property));
        }
        for method in self.methods {
            record.methods.push(Arc::new(method));
        }
        for attribute in self.attributes {
            record.custom_attributes.push(attribute);
        }
        for constant in self.constants {
            record.enum_constants.push(constant);
        }
        if let Some(ctor) = self.wrapper_ctor {
            record.set_wrapper_ctor(ctor);
        }

        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_forms() {
        let native = TypeBuilder::primitive(PrimitiveKind::Int32).build();
        let foreign = TypeBuilder::foreign_primitive(PrimitiveKind::Int32, "Il2Cpp").build();

        assert_eq!(native.fullname(), "System.Int32");
        assert_eq!(foreign.fullname(), "Il2CppSystem.Int32");
        assert!(!native.is_foreign());
        assert!(foreign.is_foreign());
        assert_eq!(foreign.primitive, Some(PrimitiveKind::Int32));
        assert_eq!(native.base_name(), Some("System.ValueType"));
    }

    #[test]
    fn test_lazy_base_only_without_eager_base() {
        let object = TypeBuilder::class("System", "Object").build();
        let eager = TypeBuilder::class("A", "Eager")
            .extends(&object)
            .extends_named("A.Ignored")
            .build();
        let lazy = TypeBuilder::class("A", "Lazy").extends_named("A.Eager").build();

        assert!(eager.base_name().is_none());
        assert_eq!(eager.base().unwrap().fullname(), "System.Object");
        assert!(lazy.base().is_none());
        assert_eq!(lazy.base_name(), Some("A.Eager"));
    }

    #[test]
    fn test_named_interfaces() {
        let list = TypeBuilder::class("A", "Bag")
            .implements_named("System.Collections.IEnumerable")
            .build();

        let names: Vec<String> = list.interfaces.iter().map(|(_, i)| i.fullname()).collect();
        assert_eq!(names, vec!["System.Collections.IEnumerable".to_string()]);
    }
}
