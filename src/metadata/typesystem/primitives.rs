use std::convert::TryFrom;

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::value::Value;

/// The primitive kinds that exist on both sides of a dual-model runtime.
///
/// Each kind has a native form (`System.Int32`) and a foreign struct form
/// (`Il2CppSystem.Int32`) whose `m_value` slot holds the native value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
pub enum PrimitiveKind {
    /// `bool`
    Boolean,
    /// `byte`
    Byte,
    /// `sbyte`
    SByte,
    /// `char`
    Char,
    /// `double`
    Double,
    /// `float`
    Single,
    /// `int`
    Int32,
    /// `long`
    Int64,
    /// `uint`
    UInt32,
    /// `ulong`
    UInt64,
    /// `short`
    Int16,
    /// `ushort`
    UInt16,
    /// pointer-sized signed integer
    IntPtr,
    /// pointer-sized unsigned integer
    UIntPtr,
}

enum Numeric {
    Int(i128),
    Float(f64),
}

impl PrimitiveKind {
    /// Simple type name, e.g. `Int32`
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Byte => "Byte",
            PrimitiveKind::SByte => "SByte",
            PrimitiveKind::Char => "Char",
            PrimitiveKind::Double => "Double",
            PrimitiveKind::Single => "Single",
            PrimitiveKind::Int32 => "Int32",
            PrimitiveKind::Int64 => "Int64",
            PrimitiveKind::UInt32 => "UInt32",
            PrimitiveKind::UInt64 => "UInt64",
            PrimitiveKind::Int16 => "Int16",
            PrimitiveKind::UInt16 => "UInt16",
            PrimitiveKind::IntPtr => "IntPtr",
            PrimitiveKind::UIntPtr => "UIntPtr",
        }
    }

    /// Full name of the native form, e.g. `System.Int32`
    #[must_use]
    pub fn native_fullname(&self) -> String {
        format!("System.{}", self.name())
    }

    /// Kind whose simple name is `name`
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        PrimitiveKind::iter().find(|kind| kind.name() == name)
    }

    /// Kind of a native primitive value, `None` for anything else
    #[must_use]
    pub fn of_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(PrimitiveKind::Boolean),
            Value::U8(_) => Some(PrimitiveKind::Byte),
            Value::I8(_) => Some(PrimitiveKind::SByte),
            Value::Char(_) => Some(PrimitiveKind::Char),
            Value::F64(_) => Some(PrimitiveKind::Double),
            Value::F32(_) => Some(PrimitiveKind::Single),
            Value::I32(_) => Some(PrimitiveKind::Int32),
            Value::I64(_) => Some(PrimitiveKind::Int64),
            Value::U32(_) => Some(PrimitiveKind::UInt32),
            Value::U64(_) => Some(PrimitiveKind::UInt64),
            Value::I16(_) => Some(PrimitiveKind::Int16),
            Value::U16(_) => Some(PrimitiveKind::UInt16),
            Value::NativeInt(_) => Some(PrimitiveKind::IntPtr),
            Value::NativeUInt(_) => Some(PrimitiveKind::UIntPtr),
            _ => None,
        }
    }

    /// Zero value of this kind
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            PrimitiveKind::Boolean => Value::Bool(false),
            PrimitiveKind::Byte => Value::U8(0),
            PrimitiveKind::SByte => Value::I8(0),
            PrimitiveKind::Char => Value::Char('\0'),
            PrimitiveKind::Double => Value::F64(0.0),
            PrimitiveKind::Single => Value::F32(0.0),
            PrimitiveKind::Int32 => Value::I32(0),
            PrimitiveKind::Int64 => Value::I64(0),
            PrimitiveKind::UInt32 => Value::U32(0),
            PrimitiveKind::UInt64 => Value::U64(0),
            PrimitiveKind::Int16 => Value::I16(0),
            PrimitiveKind::UInt16 => Value::U16(0),
            PrimitiveKind::IntPtr => Value::NativeInt(0),
            PrimitiveKind::UIntPtr => Value::NativeUInt(0),
        }
    }

    /// Converts a native primitive into this kind.
    ///
    /// Integer conversions are checked; a float only converts to an integer kind when it
    /// has no fractional part and fits. Returns `None` when the value can not be
    /// represented.
    #[must_use]
    pub fn coerce(&self, value: &Value) -> Option<Value> {
        if PrimitiveKind::of_value(value) == Some(*self) {
            return Some(value.clone());
        }

        let numeric = Self::numeric(value)?;
        match self {
            PrimitiveKind::Boolean => match numeric {
                Numeric::Int(int) => Some(Value::Bool(int != 0)),
                Numeric::Float(_) => None,
            },
            PrimitiveKind::Char => {
                let int = Self::integral(numeric)?;
                u32::try_from(int)
                    .ok()
                    .and_then(char::from_u32)
                    .map(Value::Char)
            }
            #[allow(clippy::cast_precision_loss)]
            PrimitiveKind::Double => Some(Value::F64(match numeric {
                Numeric::Int(int) => int as f64,
                Numeric::Float(float) => float,
            })),
            #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
            PrimitiveKind::Single => Some(Value::F32(match numeric {
                Numeric::Int(int) => int as f32,
                Numeric::Float(float) => float as f32,
            })),
            PrimitiveKind::Byte => u8::try_from(Self::integral(numeric)?).ok().map(Value::U8),
            PrimitiveKind::SByte => i8::try_from(Self::integral(numeric)?).ok().map(Value::I8),
            PrimitiveKind::Int16 => i16::try_from(Self::integral(numeric)?).ok().map(Value::I16),
            PrimitiveKind::UInt16 => u16::try_from(Self::integral(numeric)?).ok().map(Value::U16),
            PrimitiveKind::Int32 => i32::try_from(Self::integral(numeric)?).ok().map(Value::I32),
            PrimitiveKind::UInt32 => u32::try_from(Self::integral(numeric)?).ok().map(Value::U32),
            PrimitiveKind::Int64 => i64::try_from(Self::integral(numeric)?).ok().map(Value::I64),
            PrimitiveKind::UInt64 => u64::try_from(Self::integral(numeric)?).ok().map(Value::U64),
            PrimitiveKind::IntPtr => isize::try_from(Self::integral(numeric)?)
                .ok()
                .map(Value::NativeInt),
            PrimitiveKind::UIntPtr => usize::try_from(Self::integral(numeric)?)
                .ok()
                .map(Value::NativeUInt),
        }
    }

    fn numeric(value: &Value) -> Option<Numeric> {
        Some(match value {
            Value::Bool(v) => Numeric::Int(i128::from(*v)),
            Value::U8(v) => Numeric::Int(i128::from(*v)),
            Value::I8(v) => Numeric::Int(i128::from(*v)),
            Value::Char(v) => Numeric::Int(i128::from(u32::from(*v))),
            Value::I16(v) => Numeric::Int(i128::from(*v)),
            Value::U16(v) => Numeric::Int(i128::from(*v)),
            Value::I32(v) => Numeric::Int(i128::from(*v)),
            Value::U32(v) => Numeric::Int(i128::from(*v)),
            Value::I64(v) => Numeric::Int(i128::from(*v)),
            Value::U64(v) => Numeric::Int(i128::from(*v)),
            Value::NativeInt(v) => Numeric::Int(i128::try_from(*v).ok()?),
            Value::NativeUInt(v) => Numeric::Int(i128::try_from(*v).ok()?),
            Value::Enum { value, .. } => Numeric::Int(i128::from(*value)),
            Value::F32(v) => Numeric::Float(f64::from(*v)),
            Value::F64(v) => Numeric::Float(*v),
            _ => return None,
        })
    }

    #[allow(clippy::cast_possible_truncation)]
    fn integral(numeric: Numeric) -> Option<i128> {
        match numeric {
            Numeric::Int(int) => Some(int),
            Numeric::Float(float) => {
                if float.is_finite() && float.fract() == 0.0 && float.abs() < 1e38 {
                    Some(float as i128)
                } else {
                    None
                }
            }
        }
    }
}
