//! In-process foreign runtime.
//!
//! [`NativeHeap`] simulates the native side of a dual-model host. It supports:
//!
//! - **Classes** - a class table with parent links and injected flags
//! - **Objects** - class instances, strings and boxed values
//! - **Type bindings** - which host-side type is backed by which native class
//! - **Reverse pointer table** - host owners of injected-class instances
//!
//! # Object References
//!
//! Objects are referenced via [`NativePtr`]s handed out by an atomic counter. Pointers
//! stay valid for the lifetime of the heap; no collection is simulated.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use crate::{
    metadata::typesystem::TypeRecord,
    runtime::{ClassHandle, ForeignRuntime, NativePtr},
    value::{ObjectRef, Value},
    Error, Result,
};

/// Entry of the native class table.
#[derive(Clone, Debug)]
pub struct NativeClass {
    /// Full name as the runtime reports it
    pub name: String,
    /// Parent class
    pub parent: Option<ClassHandle>,
    /// Registered by the bridge
    pub injected: bool,
}

#[derive(Clone, Debug)]
enum NativeObject {
    Instance(ClassHandle),
    String(ClassHandle, String),
    Boxed(ClassHandle, Value),
}

impl NativeObject {
    fn class(&self) -> ClassHandle {
        match self {
            NativeObject::Instance(class)
            | NativeObject::String(class, _)
            | NativeObject::Boxed(class, _) => *class,
        }
    }
}

/// `ToString` of a boxed value: no literal suffixes, no quotes
fn display_boxed(value: &Value) -> String {
    match value {
        Value::Enum { ty, value } => ty.enum_name(*value).unwrap_or_else(|| value.to_string()),
        Value::String(text) => text.to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Char(c) => c.to_string(),
        Value::F32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::U32(v) => v.to_string(),
        Value::U64(v) => v.to_string(),
        Value::NativeInt(v) => v.to_string(),
        Value::NativeUInt(v) => v.to_string(),
        other => other.to_string(),
    }
}

/// Simulated native object model.
pub struct NativeHeap {
    classes: DashMap<ClassHandle, NativeClass>,
    class_by_type: DashMap<String, ClassHandle>,
    objects: DashMap<NativePtr, NativeObject>,
    owners: DashMap<NativePtr, ObjectRef>,
    next_class: AtomicU64,
    next_pointer: AtomicU64,
    object_class: ClassHandle,
    string_class: ClassHandle,
}

impl Default for NativeHeap {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeHeap {
    /// Create a heap with `System.Object` and `System.String` registered.
    #[must_use]
    pub fn new() -> Self {
        let mut heap = NativeHeap {
            classes: DashMap::new(),
            class_by_type: DashMap::new(),
            objects: DashMap::new(),
            owners: DashMap::new(),
            next_class: AtomicU64::new(1),
            next_pointer: AtomicU64::new(0x1000),
            object_class: ClassHandle(0),
            string_class: ClassHandle(0),
        };
        heap.object_class = heap.register_class("System.Object", None);
        heap.string_class = heap.register_class("System.String", Some(heap.object_class));
        heap
    }

    fn add_class(&self, name: &str, parent: Option<ClassHandle>, injected: bool) -> ClassHandle {
        let handle = ClassHandle(self.next_class.fetch_add(1, Ordering::Relaxed));
        self.classes.insert(
            handle,
            NativeClass {
                name: name.to_string(),
                parent,
                injected,
            },
        );
        handle
    }

    /// Register a native class
    pub fn register_class(&self, name: &str, parent: Option<ClassHandle>) -> ClassHandle {
        self.add_class(name, parent, false)
    }

    /// Register a class injected by the bridge
    pub fn register_injected_class(&self, name: &str, parent: Option<ClassHandle>) -> ClassHandle {
        self.add_class(name, parent, true)
    }

    /// The `System.Object` class
    pub fn object_class(&self) -> ClassHandle {
        self.object_class
    }

    /// The `System.String` class
    pub fn string_class(&self) -> ClassHandle {
        self.string_class
    }

    /// Declare that host type `host_fullname` is backed by `class`
    pub fn bind_type(&self, host_fullname: &str, class: ClassHandle) {
        self.class_by_type.insert(host_fullname.to_string(), class);
    }

    /// Class table entry
    pub fn class(&self, class: ClassHandle) -> Option<NativeClass> {
        self.classes.get(&class).map(|entry| entry.value().clone())
    }

    fn next_pointer(&self) -> NativePtr {
        NativePtr::new(self.next_pointer.fetch_add(0x10, Ordering::Relaxed))
    }

    /// Allocate an instance of `class`
    ///
    /// # Errors
    /// Returns [`Error::ClassNotFound`] for unknown classes.
    pub fn alloc(&self, class: ClassHandle) -> Result<NativePtr> {
        if !self.classes.contains_key(&class) {
            return Err(Error::ClassNotFound(format!("class handle {}", class.0)));
        }
        let pointer = self.next_pointer();
        self.objects.insert(pointer, NativeObject::Instance(class));
        Ok(pointer)
    }

    /// Record the host-side owner of an injected-class instance
    pub fn set_owner(&self, pointer: NativePtr, owner: ObjectRef) {
        self.owners.insert(pointer, owner);
    }

    /// Number of live native objects
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn object(&self, pointer: NativePtr) -> Result<NativeObject> {
        self.objects
            .get(&pointer)
            .map(|entry| entry.value().clone())
            .ok_or(Error::InvalidPointer(pointer.address()))
    }
}

impl ForeignRuntime for NativeHeap {
    fn class_for_type(&self, ty: &TypeRecord) -> Option<ClassHandle> {
        self.class_by_type
            .get(ty.fullname_str())
            .map(|entry| *entry.value())
    }

    fn class_of(&self, pointer: NativePtr) -> Result<ClassHandle> {
        Ok(self.object(pointer)?.class())
    }

    fn class_name(&self, class: ClassHandle) -> Result<String> {
        self.classes
            .get(&class)
            .map(|entry| entry.name.clone())
            .ok_or_else(|| Error::ClassNotFound(format!("class handle {}", class.0)))
    }

    fn is_assignable_from(&self, target: ClassHandle, source: ClassHandle) -> bool {
        let mut current = Some(source);
        while let Some(class) = current {
            if class == target {
                return true;
            }
            current = self.classes.get(&class).and_then(|entry| entry.parent);
        }
        false
    }

    fn is_injected(&self, class: ClassHandle) -> bool {
        self.classes
            .get(&class)
            .is_some_and(|entry| entry.injected)
    }

    fn injected_owner(&self, pointer: NativePtr) -> Option<ObjectRef> {
        self.owners.get(&pointer).map(|entry| entry.value().clone())
    }

    fn new_string(&self, value: &str) -> Result<NativePtr> {
        let pointer = self.next_pointer();
        self.objects.insert(
            pointer,
            NativeObject::String(self.string_class, value.to_string()),
        );
        Ok(pointer)
    }

    fn read_string(&self, pointer: NativePtr) -> Result<String> {
        match self.object(pointer)? {
            NativeObject::String(_, value) => Ok(value),
            _ => Err(Error::ForeignCall(format!("{pointer} is not a string"))),
        }
    }

    fn box_value(&self, class: ClassHandle, value: &Value) -> Result<NativePtr> {
        if !self.classes.contains_key(&class) {
            return Err(Error::ClassNotFound(format!("class handle {}", class.0)));
        }
        if matches!(value, Value::Null | Value::Object(_)) {
            return Err(Error::ForeignCall(format!(
                "cannot box a {} value",
                value.kind_name()
            )));
        }
        let pointer = self.next_pointer();
        self.objects
            .insert(pointer, NativeObject::Boxed(class, value.clone()));
        Ok(pointer)
    }

    fn unbox_value(&self, pointer: NativePtr) -> Result<Value> {
        match self.object(pointer)? {
            NativeObject::Boxed(_, value) => Ok(value),
            _ => Err(Error::ForeignCall(format!("{pointer} is not a boxed value"))),
        }
    }

    fn to_display_string(&self, pointer: NativePtr) -> Result<String> {
        Ok(match self.object(pointer)? {
            NativeObject::String(_, value) => value,
            NativeObject::Boxed(_, value) => display_boxed(&value),
            NativeObject::Instance(class) => self.class_name(class)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_hierarchy() {
        let heap = NativeHeap::new();
        let component = heap.register_class("UnityEngine.Component", Some(heap.object_class()));
        let behaviour = heap.register_class("UnityEngine.Behaviour", Some(component));
        let unrelated = heap.register_class("A.Other", Some(heap.object_class()));

        assert!(heap.is_assignable_from(component, behaviour));
        assert!(heap.is_assignable_from(heap.object_class(), behaviour));
        assert!(!heap.is_assignable_from(behaviour, component));
        assert!(!heap.is_assignable_from(unrelated, behaviour));
    }

    #[test]
    fn test_strings_and_boxes() {
        let heap = NativeHeap::new();
        let text = heap.new_string("hello").unwrap();
        assert_eq!(heap.read_string(text).unwrap(), "hello");
        assert_eq!(heap.class_of(text).unwrap(), heap.string_class());

        let int_class = heap.register_class("System.Int32", None);
        let boxed = heap.box_value(int_class, &Value::I32(9)).unwrap();
        assert_eq!(heap.unbox_value(boxed).unwrap(), Value::I32(9));
        assert_eq!(heap.to_display_string(boxed).unwrap(), "9");
        let long_class = heap.register_class("System.Int64", None);
        let long = heap.box_value(long_class, &Value::I64(-3)).unwrap();
        assert_eq!(heap.to_display_string(long).unwrap(), "-3");
        assert!(heap.unbox_value(text).is_err());
        assert!(heap.box_value(int_class, &Value::Null).is_err());
    }

    #[test]
    fn test_invalid_pointer() {
        let heap = NativeHeap::new();
        assert!(matches!(
            heap.class_of(NativePtr::new(0xdead)),
            Err(Error::InvalidPointer(0xdead))
        ));
    }

    #[test]
    fn test_injected_classes() {
        let heap = NativeHeap::new();
        let injected = heap.register_injected_class("MyMod.Marker", Some(heap.object_class()));
        assert!(heap.is_injected(injected));
        assert!(!heap.is_injected(heap.object_class()));

        let pointer = heap.alloc(injected).unwrap();
        assert!(heap.injected_owner(pointer).is_none());
    }
}
