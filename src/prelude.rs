//! # dotbridge Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotbridge library. Import this module to get quick access to the essential
//! types for bridging a dual-model host.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotbridge operations
pub use crate::Error;

/// The result type used throughout dotbridge
pub use crate::Result;

/// Bridge configuration and the backend selector
pub use crate::config::{Backend, BridgeConfig};

/// Warning collection for best-effort operations
pub use crate::diagnostics::{
    Diagnostic, DiagnosticCategory, DiagnosticSeverity, DiagnosticSink, Diagnostics,
};

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Session-scoped bridge state
pub use crate::{BridgeContext, BridgeContextBuilder};

/// Owner-thread callback hop
pub use crate::dispatch::MainThreadDispatcher;

// ================================================================================================
// Type System
// ================================================================================================

/// Type records and their construction
pub use crate::metadata::typesystem::{
    PrimitiveKind, Representation, TypeBuilder, TypeFlags, TypeKey, TypeRecord, TypeRecordRc,
};

/// Fields, properties and methods
pub use crate::metadata::typesystem::{
    FieldFlags, FieldInfo, FieldRc, Getter, Invoker, MethodInfo, MethodRc, PropertyInfo,
    PropertyRc, Setter, WrapperCtor,
};

/// Custom attributes and the obfuscated-name reader
pub use crate::metadata::customattributes::{
    AttributeReader, CustomAttribute, CustomAttributeArgument, RecordAttributeReader,
};

// ================================================================================================
// Catalog and Modules
// ================================================================================================

/// The append-only type catalog
pub use crate::metadata::catalog::{CollectionEntryTypes, ImplementationFilter, TypeCatalog};

/// Modules delivered by load notifications
pub use crate::metadata::module::ModuleInfo;

// ================================================================================================
// Values and the Foreign Runtime
// ================================================================================================

/// Host-side values and objects
pub use crate::value::{Object, ObjectRef, Value};

/// Foreign runtime capability and the in-process heap
pub use crate::runtime::{ClassHandle, ForeignRuntime, NativeHeap, NativePtr};

// ================================================================================================
// Interop
// ================================================================================================

/// Casting across representations
pub use crate::interop::{CastEngine, CastOutcome};

/// Enumeration of native and foreign collections
pub use crate::interop::{
    DictionarySequence, EnumerationBridge, EnumerationSupport, EnumeratorDescriptor,
    ObjectSequence,
};

/// Identity resolution and obfuscated names
pub use crate::interop::{DeobfuscationCache, IdentityResolver};

/// Version-tolerant member access
pub use crate::interop::{AmbiguousMemberResolver, MemberAccess};

/// Object-model strategies
pub use crate::interop::{DualModel, ManagedModel, ObjectModel};
