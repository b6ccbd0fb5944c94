//! Fields, properties and methods of a [`TypeRecord`].
//!
//! Members carry their behaviour as closures, the same way runtime hooks are stored:
//! an accessor or invoker is an `Arc<dyn Fn ...>` that the bridge calls through the
//! member without knowing who supplied it.

use std::sync::Arc;

use bitflags::bitflags;

use crate::{
    metadata::typesystem::{TypeRecord, TypeRecordRc},
    runtime::NativePtr,
    value::{ObjectRef, Value},
    Error, Result,
};

/// Invokes a method: `(receiver, arguments) -> result`. Static methods receive `Value::Null`.
pub type Invoker = Arc<dyn Fn(&Value, &[Value]) -> Result<Value> + Send + Sync>;

/// Reads a member of `instance` (`Value::Null` for statics).
pub type Getter = Arc<dyn Fn(&Value) -> Result<Value> + Send + Sync>;

/// Writes a member of `instance` (`Value::Null` for statics).
pub type Setter = Arc<dyn Fn(&Value, Value) -> Result<()> + Send + Sync>;

/// Builds a host-side wrapper of a type around a native pointer.
pub type WrapperCtor = Arc<dyn Fn(&TypeRecordRc, NativePtr) -> Result<ObjectRef> + Send + Sync>;

/// Reference to a `FieldInfo`
pub type FieldRc = Arc<FieldInfo>;
/// Reference to a `PropertyInfo`
pub type PropertyRc = Arc<PropertyInfo>;
/// Reference to a `MethodInfo`
pub type MethodRc = Arc<MethodInfo>;

bitflags! {
    /// Attributes of a field
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct FieldFlags: u16 {
        /// Belongs to the type, not to instances
        const STATIC = 0x0010;
        /// Only assignable during construction
        const INIT_ONLY = 0x0020;
        /// Compile-time constant
        const LITERAL = 0x0040;
    }
}

/// A field declared on a type.
pub struct FieldInfo {
    /// Field name
    pub name: String,
    /// Declared type of the stored value
    pub value_type: TypeRecordRc,
    /// Field attributes
    pub flags: FieldFlags,
    /// Value of a literal field
    pub constant: Option<Value>,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl FieldInfo {
    /// Create a field stored in object (or static) slots
    pub fn new(name: &str, value_type: TypeRecordRc, flags: FieldFlags) -> Self {
        FieldInfo {
            name: name.to_string(),
            value_type,
            flags,
            constant: None,
            getter: None,
            setter: None,
        }
    }

    /// Create a compile-time constant
    pub fn literal(name: &str, value_type: TypeRecordRc, value: Value) -> Self {
        FieldInfo {
            name: name.to_string(),
            value_type,
            flags: FieldFlags::STATIC | FieldFlags::LITERAL,
            constant: Some(value),
            getter: None,
            setter: None,
        }
    }

    /// Routes reads and writes through custom closures, e.g. into foreign memory
    #[must_use]
    pub fn with_accessor(mut self, getter: Getter, setter: Option<Setter>) -> Self {
        self.getter = Some(getter);
        self.setter = setter;
        self
    }

    /// Whether the field belongs to the type
    pub fn is_static(&self) -> bool {
        self.flags.contains(FieldFlags::STATIC)
    }

    /// Whether the field is a compile-time constant
    pub fn is_literal(&self) -> bool {
        self.flags.contains(FieldFlags::LITERAL)
    }

    /// Whether the field may be written after construction
    pub fn is_writable(&self) -> bool {
        !self
            .flags
            .intersects(FieldFlags::LITERAL | FieldFlags::INIT_ONLY)
    }

    /// Reads the field.
    ///
    /// Unset slots read as the default value of [`value_type`](Self::value_type).
    ///
    /// # Errors
    /// Returns [`Error::NotInvocable`] when an instance field is read without an object
    /// receiver, or whatever a custom getter returns.
    pub fn get(&self, declaring: &TypeRecord, instance: &Value) -> Result<Value> {
        if let Some(constant) = &self.constant {
            return Ok(constant.clone());
        }
        if let Some(getter) = &self.getter {
            return getter(instance);
        }

        if self.is_static() {
            let stored = read_lock!(declaring.static_values).get(&self.name).cloned();
            return Ok(stored.unwrap_or_else(|| Value::default_of(&self.value_type)));
        }

        match instance {
            Value::Object(object) => Ok(object
                .field_value(&self.name)
                .unwrap_or_else(|| Value::default_of(&self.value_type))),
            other => Err(Error::NotInvocable(format!(
                "instance field {}.{} read on {}",
                declaring.fullname_str(),
                self.name,
                other.kind_name()
            ))),
        }
    }

    /// Writes the field.
    ///
    /// # Errors
    /// Returns [`Error::NotInvocable`] for literals, for accessor fields without a setter and
    /// for instance fields written without an object receiver.
    pub fn set(&self, declaring: &TypeRecord, instance: &Value, value: Value) -> Result<()> {
        if self.is_literal() {
            return Err(Error::NotInvocable(format!(
                "literal field {}.{} can not be written",
                declaring.fullname_str(),
                self.name
            )));
        }

        if self.getter.is_some() {
            return match &self.setter {
                Some(setter) => setter(instance, value),
                None => Err(Error::NotInvocable(format!(
                    "field {}.{} has no setter",
                    declaring.fullname_str(),
                    self.name
                ))),
            };
        }

        if self.is_static() {
            write_lock!(declaring.static_values).insert(self.name.clone(), value);
            return Ok(());
        }

        match instance {
            Value::Object(object) => {
                object.set_field_value(&self.name, value);
                Ok(())
            }
            other => Err(Error::NotInvocable(format!(
                "instance field {}.{} written on {}",
                declaring.fullname_str(),
                self.name,
                other.kind_name()
            ))),
        }
    }
}

/// A property declared on a type.
pub struct PropertyInfo {
    /// Property name
    pub name: String,
    /// Declared property type
    pub value_type: TypeRecordRc,
    /// Whether the accessors are static
    pub is_static: bool,
    getter: Option<Getter>,
    setter: Option<Setter>,
}

impl PropertyInfo {
    /// Create a property without accessors
    pub fn new(name: &str, value_type: TypeRecordRc) -> Self {
        PropertyInfo {
            name: name.to_string(),
            value_type,
            is_static: false,
            getter: None,
            setter: None,
        }
    }

    /// Adds a getter
    #[must_use]
    pub fn with_getter(mut self, getter: Getter) -> Self {
        self.getter = Some(getter);
        self
    }

    /// Adds a setter
    #[must_use]
    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    /// Marks the property static
    #[must_use]
    pub fn static_property(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Has a getter
    pub fn can_read(&self) -> bool {
        self.getter.is_some()
    }

    /// Has a setter
    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }

    /// Invokes the getter.
    ///
    /// # Errors
    /// Returns [`Error::NotInvocable`] without a getter, or whatever the getter returns.
    pub fn get(&self, instance: &Value) -> Result<Value> {
        match &self.getter {
            Some(getter) => getter(instance),
            None => Err(Error::NotInvocable(format!(
                "property {} has no getter",
                self.name
            ))),
        }
    }

    /// Invokes the setter.
    ///
    /// # Errors
    /// Returns [`Error::NotInvocable`] without a setter, or whatever the setter returns.
    pub fn set(&self, instance: &Value, value: Value) -> Result<()> {
        match &self.setter {
            Some(setter) => setter(instance, value),
            None => Err(Error::NotInvocable(format!(
                "property {} has no setter",
                self.name
            ))),
        }
    }
}

/// A method declared on a type.
pub struct MethodInfo {
    /// Method name (explicit interface implementations carry the qualified name)
    pub name: String,
    /// Whether the method has no receiver
    pub is_static: bool,
    /// Declared return type, `None` for void
    pub return_type: Option<TypeRecordRc>,
    invoker: Invoker,
}

impl MethodInfo {
    /// Create an instance method
    pub fn new(name: &str, return_type: Option<TypeRecordRc>, invoker: Invoker) -> Self {
        MethodInfo {
            name: name.to_string(),
            is_static: false,
            return_type,
            invoker,
        }
    }

    /// Marks the method static
    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Calls the method.
    ///
    /// # Errors
    /// Returns whatever the invoker returns.
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> Result<Value> {
        if self.is_static {
            (self.invoker)(&Value::Null, args)
        } else {
            (self.invoker)(receiver, args)
        }
    }
}
