//! Foreign runtime capability.
//!
//! A dual-model host keeps its own class metadata for natively allocated objects. The
//! bridge reaches it exclusively through [`ForeignRuntime`]: class handles, assignability
//! between classes, the reverse pointer table of injected types and the handful of
//! primitive operations needed to move strings and boxed values across.
//!
//! [`NativeHeap`] is an in-process implementation backing headless hosts and tests.

mod heap;

use std::fmt;

pub use heap::{NativeClass, NativeHeap};

use crate::{
    metadata::typesystem::TypeRecord,
    value::{ObjectRef, Value},
    Result,
};

/// Address of a native object.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativePtr(u64);

impl NativePtr {
    /// Wrap a raw address
    #[must_use]
    pub const fn new(address: u64) -> Self {
        NativePtr(address)
    }

    /// The raw address
    #[must_use]
    pub const fn address(&self) -> u64 {
        self.0
    }

    /// Whether the address is zero
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NativePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:X}", self.0)
    }
}

impl fmt::Debug for NativePtr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativePtr(0x{:X})", self.0)
    }
}

/// Opaque identifier of a class in the foreign runtime's metadata.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassHandle(pub u64);

/// Class-metadata and object capabilities of a foreign runtime.
///
/// Every fallible method may fail for reasons outside the bridge's control; callers
/// contain such failures and fall back to documented defaults.
pub trait ForeignRuntime: Send + Sync {
    /// Native class backing a host-side type, `None` if the type has no native class.
    fn class_for_type(&self, ty: &TypeRecord) -> Option<ClassHandle>;

    /// Class of a native object.
    ///
    /// # Errors
    /// Fails if `pointer` does not reference a live object.
    fn class_of(&self, pointer: NativePtr) -> Result<ClassHandle>;

    /// Full name of a class as the foreign runtime reports it.
    ///
    /// # Errors
    /// Fails for unknown class handles.
    fn class_name(&self, class: ClassHandle) -> Result<String>;

    /// Whether an instance of `source` can be stored in a `target` slot.
    fn is_assignable_from(&self, target: ClassHandle, source: ClassHandle) -> bool;

    /// Whether `class` was injected by the bridge.
    fn is_injected(&self, class: ClassHandle) -> bool;

    /// Host-side owner of a native object of an injected class (reverse pointer table).
    fn injected_owner(&self, pointer: NativePtr) -> Option<ObjectRef>;

    /// Allocate a native string.
    ///
    /// # Errors
    /// Fails if the runtime cannot allocate.
    fn new_string(&self, value: &str) -> Result<NativePtr>;

    /// Contents of a native string.
    ///
    /// # Errors
    /// Fails if `pointer` is not a native string.
    fn read_string(&self, pointer: NativePtr) -> Result<String>;

    /// Box a host value into a native object of `class`.
    ///
    /// # Errors
    /// Fails if the value cannot be represented by `class`.
    fn box_value(&self, class: ClassHandle, value: &Value) -> Result<NativePtr>;

    /// Unbox a native boxed value.
    ///
    /// # Errors
    /// Fails if `pointer` is not a boxed value.
    fn unbox_value(&self, pointer: NativePtr) -> Result<Value>;

    /// Result of the native object's `ToString`.
    ///
    /// # Errors
    /// Fails if the call into the runtime fails.
    fn to_display_string(&self, pointer: NativePtr) -> Result<String>;
}
