//! The value type every bridge operation consumes and produces.

use std::{fmt, sync::Arc};

use crate::{
    metadata::{
        catalog::TypeCatalog,
        typesystem::{PrimitiveKind, Representation, TypeRecord, TypeRecordRc},
    },
    value::ObjectRef,
    Error,
};

/// A value of the host's object model.
///
/// Native primitives and native strings are carried inline. Everything else, including
/// foreign proxies and foreign primitive structs, is an [`Object`](crate::value::Object)
/// reference.
///
/// | Host type | Variant |
/// |-----------|---------|
/// | `null` | [`Value::Null`] |
/// | `System.Boolean` .. `System.UIntPtr` | [`Value::Bool`] .. [`Value::NativeUInt`] |
/// | `System.String` | [`Value::String`] |
/// | any enum | [`Value::Enum`] |
/// | any other object | [`Value::Object`] |
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Null reference
    #[default]
    Null,
    /// `System.Boolean`
    Bool(bool),
    /// `System.Byte`
    U8(u8),
    /// `System.SByte`
    I8(i8),
    /// `System.Char`
    Char(char),
    /// `System.Double`
    F64(f64),
    /// `System.Single`
    F32(f32),
    /// `System.Int32`
    I32(i32),
    /// `System.Int64`
    I64(i64),
    /// `System.UInt32`
    U32(u32),
    /// `System.UInt64`
    U64(u64),
    /// `System.Int16`
    I16(i16),
    /// `System.UInt16`
    U16(u16),
    /// `System.IntPtr`
    NativeInt(isize),
    /// `System.UIntPtr`
    NativeUInt(usize),
    /// Native `System.String`
    String(Arc<str>),
    /// Enum value with its type
    Enum {
        /// Enum type
        ty: TypeRecordRc,
        /// Underlying value
        value: i64,
    },
    /// Reference to an object
    Object(ObjectRef),
}

impl Value {
    /// Returns true for [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, for messages
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::I8(_) => "i8",
            Value::Char(_) => "char",
            Value::F64(_) => "f64",
            Value::F32(_) => "f32",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::I16(_) => "i16",
            Value::U16(_) => "u16",
            Value::NativeInt(_) => "nint",
            Value::NativeUInt(_) => "nuint",
            Value::String(_) => "string",
            Value::Enum { .. } => "enum",
            Value::Object(_) => "object",
        }
    }

    /// The object reference, if this is one
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    /// The native string, if this is one
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Reference identity for objects and strings, value equality for everything else.
    #[must_use]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            (Value::String(a), Value::String(b)) => Arc::ptr_eq(a, b),
            _ => self == other,
        }
    }

    /// Default value of a slot declared as `ty`.
    ///
    /// Native primitives default to zero and enums to their zero value; everything else
    /// (foreign structs included) defaults to null.
    #[must_use]
    pub fn default_of(ty: &TypeRecordRc) -> Value {
        if ty.is_enum() {
            return Value::Enum {
                ty: ty.clone(),
                value: 0,
            };
        }
        match (ty.primitive, ty.representation) {
            (Some(kind), Representation::Native) => kind.default_value(),
            _ => Value::Null,
        }
    }

    /// Declared type of this value as the host sees it.
    ///
    /// Primitives and strings resolve to their native catalog records.
    #[must_use]
    pub fn declared_type(&self, catalog: &TypeCatalog) -> Option<TypeRecordRc> {
        match self {
            Value::Null => None,
            Value::String(_) => catalog.lookup("System.String"),
            Value::Enum { ty, .. } => Some(ty.clone()),
            Value::Object(object) => Some(object.ty().clone()),
            primitive => {
                PrimitiveKind::of_value(primitive).and_then(|kind| catalog.lookup(&kind.native_fullname()))
            }
        }
    }

    /// Whether the value's declared type is `ty` by name, without consulting a catalog.
    #[must_use]
    pub fn is_instance_of_name(&self, ty: &TypeRecord) -> bool {
        match self {
            Value::Null => false,
            Value::String(_) => ty.fullname_str() == "System.String",
            Value::Enum { ty: own, .. } => own.fullname_str() == ty.fullname_str(),
            Value::Object(object) => object.ty().fullname_str() == ty.fullname_str(),
            primitive => PrimitiveKind::of_value(primitive)
                .is_some_and(|kind| kind.native_fullname() == ty.fullname_str()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::U8(a), Value::U8(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a.to_bits() == b.to_bits(),
            (Value::F32(a), Value::F32(b)) => a.to_bits() == b.to_bits(),
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::I16(a), Value::I16(b)) => a == b,
            (Value::U16(a), Value::U16(b)) => a == b,
            (Value::NativeInt(a), Value::NativeInt(b)) => a == b,
            (Value::NativeUInt(a), Value::NativeUInt(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Enum { ty: t1, value: v1 }, Value::Enum { ty: t2, value: v2 }) => {
                t1.key() == t2.key() && v1 == v2
            }
            // Objects compare by reference
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "{v}"),
            Value::I8(v) => write!(f, "{v}"),
            Value::Char(v) => write!(f, "'{v}'"),
            Value::F64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}f"),
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}L"),
            Value::U32(v) => write!(f, "{v}u"),
            Value::U64(v) => write!(f, "{v}UL"),
            Value::I16(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::NativeInt(v) => write!(f, "nint({v})"),
            Value::NativeUInt(v) => write!(f, "nuint({v})"),
            Value::String(v) => write!(f, "\"{v}\""),
            Value::Enum { ty, value } => match ty.enum_name(*value) {
                Some(name) => write!(f, "{}.{name}", ty.name),
                None => write!(f, "{}({value})", ty.name),
            },
            Value::Object(object) => write!(f, "{}", object),
        }
    }
}

macro_rules! impl_primitive_conversions {
    ($($rust:ty => $variant:ident, $kind:ident;)*) => {
        $(
            impl From<$rust> for Value {
                fn from(value: $rust) -> Self {
                    Value::$variant(value)
                }
            }

            impl TryFrom<Value> for $rust {
                type Error = Error;

                fn try_from(value: Value) -> Result<Self, Self::Error> {
                    match PrimitiveKind::$kind.coerce(&value) {
                        Some(Value::$variant(converted)) => Ok(converted),
                        _ => Err(Error::ValueConversion {
                            source_type: value.kind_name(),
                            target_type: stringify!($rust),
                        }),
                    }
                }
            }
        )*
    };
}

impl_primitive_conversions! {
    bool => Bool, Boolean;
    u8 => U8, Byte;
    i8 => I8, SByte;
    char => Char, Char;
    f64 => F64, Double;
    f32 => F32, Single;
    i32 => I32, Int32;
    i64 => I64, Int64;
    u32 => U32, UInt32;
    u64 => U64, UInt64;
    i16 => I16, Int16;
    u16 => U16, UInt16;
    isize => NativeInt, IntPtr;
    usize => NativeUInt, UIntPtr;
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Arc::from(value))
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl TryFrom<Value> for String {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) => Ok(s.to_string()),
            other => Err(Error::ValueConversion {
                source_type: other.kind_name(),
                target_type: "String",
            }),
        }
    }
}

impl TryFrom<Value> for ObjectRef {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(object) => Ok(object),
            other => Err(Error::ValueConversion {
                source_type: other.kind_name(),
                target_type: "ObjectRef",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{metadata::typesystem::TypeBuilder, value::Object};

    #[test]
    fn test_primitive_conversions() {
        assert_eq!(i32::try_from(Value::I32(5)).unwrap(), 5);
        assert_eq!(i64::try_from(Value::I32(5)).unwrap(), 5);
        assert!(u8::try_from(Value::I32(-1)).is_err());
        assert_eq!(Value::from(3u16), Value::U16(3));
        assert!(matches!(
            bool::try_from(Value::from("true")),
            Err(Error::ValueConversion { source_type: "string", target_type: "bool" })
        ));
    }

    #[test]
    fn test_reference_equality() {
        let ty = TypeBuilder::class("A", "Thing").build();
        let a = Value::Object(Arc::new(Object::new(ty.clone())));
        let b = Value::Object(Arc::new(Object::new(ty)));

        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert!(a.ptr_eq(&a.clone()));

        let s1 = Value::from("x");
        let s2 = Value::from("x");
        assert_eq!(s1, s2);
        assert!(!s1.ptr_eq(&s2));
    }

    #[test]
    fn test_default_of() {
        let int = TypeBuilder::primitive(PrimitiveKind::Int32).build();
        let foreign_int = TypeBuilder::foreign_primitive(PrimitiveKind::Int32, "Il2Cpp").build();
        let color = TypeBuilder::enumeration("A", "Color").constant("None", 0).build();

        assert_eq!(Value::default_of(&int), Value::I32(0));
        assert_eq!(Value::default_of(&foreign_int), Value::Null);
        assert_eq!(Value::default_of(&color).to_string(), "Color.None");
    }

    #[test]
    fn test_option_into_value() {
        let none: Option<i32> = None;
        assert!(Value::from(none).is_null());
        assert_eq!(Value::from(Some(4)), Value::I32(4));
    }
}
