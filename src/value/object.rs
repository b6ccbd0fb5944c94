//! Host-side objects.
//!
//! An [`Object`] is either a plain managed object or a wrapper around a native pointer.
//! Field slots use interior mutability so objects can be shared through [`ObjectRef`]s
//! while members write to them.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, RwLock},
};

use crate::{metadata::typesystem::TypeRecordRc, runtime::NativePtr, value::Value};

/// Shared reference to an [`Object`]
pub type ObjectRef = Arc<Object>;

/// Name of the slot holding a foreign primitive's native value
pub const PRIMITIVE_VALUE_SLOT: &str = "m_value";

/// Built-in storage of native collections.
pub enum ObjectContents {
    /// Plain object
    None,
    /// Native list or array
    Sequence(RwLock<Vec<Value>>),
    /// Native ordered map
    Dictionary(RwLock<Vec<(Value, Value)>>),
}

/// A host-side object.
pub struct Object {
    ty: TypeRecordRc,
    pointer: Option<NativePtr>,
    fields: RwLock<HashMap<String, Value>>,
    contents: ObjectContents,
}

impl Object {
    /// Create a plain object of `ty`
    pub fn new(ty: TypeRecordRc) -> Self {
        Object {
            ty,
            pointer: None,
            fields: RwLock::new(HashMap::new()),
            contents: ObjectContents::None,
        }
    }

    /// Create a wrapper of `ty` around a native object
    pub fn wrapper(ty: TypeRecordRc, pointer: NativePtr) -> Self {
        Object {
            ty,
            pointer: Some(pointer),
            fields: RwLock::new(HashMap::new()),
            contents: ObjectContents::None,
        }
    }

    /// Create a native list of `ty`
    pub fn sequence(ty: TypeRecordRc, items: Vec<Value>) -> Self {
        Object {
            ty,
            pointer: None,
            fields: RwLock::new(HashMap::new()),
            contents: ObjectContents::Sequence(RwLock::new(items)),
        }
    }

    /// Create a native ordered map of `ty`
    pub fn dictionary(ty: TypeRecordRc, entries: Vec<(Value, Value)>) -> Self {
        Object {
            ty,
            pointer: None,
            fields: RwLock::new(HashMap::new()),
            contents: ObjectContents::Dictionary(RwLock::new(entries)),
        }
    }

    /// Create a foreign primitive struct of `ty` holding `value` in its `m_value` slot
    pub fn foreign_primitive(ty: TypeRecordRc, value: Value) -> Self {
        let object = Object::new(ty);
        object.set_field_value(PRIMITIVE_VALUE_SLOT, value);
        object
    }

    /// Declared type of the object
    pub fn ty(&self) -> &TypeRecordRc {
        &self.ty
    }

    /// Native pointer of a wrapper
    pub fn pointer(&self) -> Option<NativePtr> {
        self.pointer
    }

    /// Whether this object proxies a native object
    pub fn is_foreign(&self) -> bool {
        self.pointer.is_some()
    }

    /// Whether this is a foreign primitive struct
    pub fn is_foreign_primitive(&self) -> bool {
        self.ty.is_foreign() && self.ty.primitive.is_some() && !self.ty.is_enum()
    }

    /// Native value of a foreign primitive struct
    pub fn primitive_value(&self) -> Option<Value> {
        if self.is_foreign_primitive() {
            self.field_value(PRIMITIVE_VALUE_SLOT)
        } else {
            None
        }
    }

    /// Current value of a field slot
    pub fn field_value(&self, name: &str) -> Option<Value> {
        read_lock!(self.fields).get(name).cloned()
    }

    /// Overwrite a field slot
    pub fn set_field_value(&self, name: &str, value: Value) {
        write_lock!(self.fields).insert(name.to_string(), value);
    }

    /// Built-in collection storage
    pub fn contents(&self) -> &ObjectContents {
        &self.contents
    }

    /// Snapshot of a native list's items
    pub fn items(&self) -> Option<Vec<Value>> {
        match &self.contents {
            ObjectContents::Sequence(items) => Some(read_lock!(items).clone()),
            _ => None,
        }
    }

    /// Snapshot of a native map's entries
    pub fn entries(&self) -> Option<Vec<(Value, Value)>> {
        match &self.contents {
            ObjectContents::Dictionary(entries) => Some(read_lock!(entries).clone()),
            _ => None,
        }
    }

    /// Append to a native list. Returns `false` if this is not a list.
    pub fn push_item(&self, item: Value) -> bool {
        match &self.contents {
            ObjectContents::Sequence(items) => {
                write_lock!(items).push(item);
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("ty", &self.ty.fullname_str())
            .field("pointer", &self.pointer)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.pointer {
            Some(pointer) => write!(f, "{}@{pointer}", self.ty.fullname_str()),
            None => write!(f, "{}", self.ty.fullname_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::typesystem::{PrimitiveKind, TypeBuilder};

    #[test]
    fn test_foreign_primitive_slot() {
        let ty = TypeBuilder::foreign_primitive(PrimitiveKind::Int64, "Il2Cpp").build();
        let object = Object::foreign_primitive(ty, Value::I64(-9));

        assert!(object.is_foreign_primitive());
        assert!(!object.is_foreign());
        assert_eq!(object.primitive_value(), Some(Value::I64(-9)));
    }

    #[test]
    fn test_native_list() {
        let ty = TypeBuilder::class("System.Collections.Generic", "List`1").build();
        let list = Object::sequence(ty.clone(), vec![Value::I32(1)]);
        assert!(list.push_item(Value::I32(2)));
        assert_eq!(list.items(), Some(vec![Value::I32(1), Value::I32(2)]));

        let plain = Object::new(ty);
        assert!(!plain.push_item(Value::Null));
        assert!(plain.items().is_none());
    }

    #[test]
    fn test_display() {
        let ty = TypeBuilder::class("A", "Thing").foreign().build();
        let object = Object::wrapper(ty, NativePtr::new(0x2A));
        assert_eq!(object.to_string(), "A.Thing@0x2A");
    }
}
