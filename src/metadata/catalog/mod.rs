//! Central, append-only catalog of every loaded type.
//!
//! The `TypeCatalog` indexes all type records delivered by module scans by their full
//! name (case-insensitively) and by namespace. It is the single source of name lookups
//! for the identity resolver, the cast engine and every higher layer.
//!
//! # Key Components
//!
//! - [`TypeCatalog`] - the catalog itself
//! - [`ImplementationFilter`] - constraints of an implementation-set query
//! - [`CollectionEntryTypes`] - element types of a generic collection
//!
//! # Catalog Architecture
//!
//! - **Sorted storage**: `SkipMap` keyed by exact full name, iterated in name order
//! - **Case-insensitive index**: `DashMap` keyed by the lower-cased full name, O(1) lookup
//! - **Namespaces**: `SkipSet`, sorted and deduplicated as new namespaces arrive
//! - **Generation counter**: bumped on every insertion; cached implementation sets are
//!   recomputed once the catalog has grown past the generation they were computed at
//!
//! Records are overwritten (never merged) when a name is registered again, which is how
//! hot-reloaded modules replace their predecessors. Records are never removed.
//!
//! # Thread Safety
//!
//! All storage is lock-free or sharded, so reading while the owner thread appends is
//! safe. Listeners run synchronously on the inserting thread and may insert more records.
//!
//! # Examples
//!
//! ```rust
//! use dotbridge::{
//!     config::BridgeConfig,
//!     diagnostics::DiagnosticSink,
//!     metadata::{catalog::TypeCatalog, typesystem::TypeBuilder},
//! };
//!
//! let catalog = TypeCatalog::new(&BridgeConfig::default(), DiagnosticSink::silent());
//! catalog.insert(TypeBuilder::class("MyGame", "Player").build())?;
//!
//! assert!(catalog.lookup("mygame.player").is_some());
//! assert!(catalog.lookup("system.int32").is_some());
//! assert_eq!(catalog.namespaces(), vec!["MyGame".to_string(), "System".to_string()]);
//! # Ok::<(), dotbridge::Error>(())
//! ```

mod implementations;
mod members;

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock,
    },
};

use crossbeam_skiplist::{SkipMap, SkipSet};
use dashmap::DashMap;
use strum::IntoEnumIterator;

pub use implementations::ImplementationFilter;

use crate::{
    config::BridgeConfig,
    diagnostics::{DiagnosticCategory, DiagnosticSink},
    metadata::{
        module::ModuleInfo,
        typesystem::{PrimitiveKind, TypeBuilder, TypeKey, TypeRecordRc},
    },
    Result,
};

/// Called for every record inserted into the catalog.
pub type CatalogListener = Arc<dyn Fn(&TypeCatalog, &TypeRecordRc) + Send + Sync>;

/// Called with a full name the catalog could not resolve; may insert more records.
pub type MissingTypeHandler = Arc<dyn Fn(&TypeCatalog, &str) + Send + Sync>;

/// Element types of a generic collection type.
#[derive(Clone, Debug)]
pub enum CollectionEntryTypes {
    /// Single-argument collections (`List<T>`, `HashSet<T>`)
    Single(TypeRecordRc),
    /// Two-argument collections (`Dictionary<K, V>`)
    Pair(TypeRecordRc, TypeRecordRc),
}

pub(crate) struct ImplementationCacheEntry {
    generation: u64,
    types: Vec<TypeRecordRc>,
}

/// Case-insensitive, append-only index of all loaded types.
pub struct TypeCatalog {
    /// Primary storage, sorted by exact full name
    types: SkipMap<String, TypeRecordRc>,
    /// Secondary index: lower-cased full name
    by_folded_name: DashMap<String, TypeRecordRc>,
    /// Secondary index: namespace to lower-cased full names
    by_namespace: DashMap<String, Vec<String>>,
    /// Sorted, deduplicated namespaces
    namespaces: SkipSet<String>,
    generation: AtomicU64,
    listeners: boxcar::Vec<CatalogListener>,
    missing_type_handler: RwLock<Option<MissingTypeHandler>>,
    implementations: DashMap<(TypeKey, ImplementationFilter), ImplementationCacheEntry>,
    excluded_name_markers: Vec<String>,
    diagnostics: DiagnosticSink,
}

impl TypeCatalog {
    /// Create a new catalog with the core library types registered.
    ///
    /// `System.Object`, `System.ValueType`, `System.Enum`, `System.String` and the native
    /// forms of all [`PrimitiveKind`]s are available immediately.
    pub fn new(config: &BridgeConfig, diagnostics: DiagnosticSink) -> Self {
        let catalog = TypeCatalog {
            types: SkipMap::new(),
            by_folded_name: DashMap::new(),
            by_namespace: DashMap::new(),
            namespaces: SkipSet::new(),
            generation: AtomicU64::new(0),
            listeners: boxcar::Vec::new(),
            missing_type_handler: RwLock::new(None),
            implementations: DashMap::new(),
            excluded_name_markers: config.excluded_name_markers.clone(),
            diagnostics,
        };

        catalog.initialize_core_types();
        catalog
    }

    fn initialize_core_types(&self) {
        let object = TypeBuilder::class("System", "Object").assembly("mscorlib").build();
        let value_type = TypeBuilder::class("System", "ValueType")
            .assembly("mscorlib")
            .abstract_type()
            .extends(&object)
            .build();
        let enum_type = TypeBuilder::class("System", "Enum")
            .assembly("mscorlib")
            .abstract_type()
            .extends(&value_type)
            .build();
        let string = TypeBuilder::class("System", "String")
            .assembly("mscorlib")
            .sealed()
            .extends(&object)
            .implements_named("System.Collections.IEnumerable")
            .build();

        for record in [object, value_type.clone(), enum_type, string] {
            self.register_internal(record);
        }

        for kind in PrimitiveKind::iter() {
            let record = TypeBuilder::primitive(kind).assembly("mscorlib").build();
            record.set_base(value_type.clone());
            self.register_internal(record);
        }
    }

    /// Scan a batch of modules, the startup snapshot.
    ///
    /// Returns the number of records inserted.
    pub fn initialize(&self, modules: &[ModuleInfo]) -> usize {
        modules.iter().map(|module| self.on_module_loaded(module)).sum()
    }

    /// Incrementally index a freshly loaded module.
    ///
    /// Modules synthesized by the bridge are ignored. Malformed records are logged and
    /// skipped. Returns the number of records inserted.
    pub fn on_module_loaded(&self, module: &ModuleInfo) -> usize {
        if module.is_bridge_generated() {
            return 0;
        }

        let mut inserted = 0;
        for record in &module.types {
            match self.insert(record.clone()) {
                Ok(()) => inserted += 1,
                Err(error) => self.diagnostics.warning(
                    DiagnosticCategory::Catalog,
                    format!("skipping type from module {}: {error}", module.name),
                ),
            }
        }
        inserted
    }

    /// Insert or overwrite a record and notify listeners.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if the record has an empty name.
    pub fn insert(&self, record: TypeRecordRc) -> Result<()> {
        if record.name.is_empty() {
            return Err(malformed_error!(
                "type record in namespace '{}' has an empty name",
                record.namespace
            ));
        }

        self.register_internal(record.clone());
        for (_, listener) in self.listeners.iter() {
            listener(self, &record);
        }
        Ok(())
    }

    fn register_internal(&self, record: TypeRecordRc) {
        let fullname = record.fullname();
        let folded = fullname.to_lowercase();

        if let Some(previous) = self.by_folded_name.insert(folded.clone(), record.clone()) {
            if previous.fullname_str() != fullname {
                self.types.remove(previous.fullname_str());
            }
        }
        self.types.insert(fullname, record.clone());

        if !record.namespace.is_empty() {
            self.namespaces.insert(record.namespace.clone());
            let mut names = self.by_namespace.entry(record.namespace.clone()).or_default();
            if !names.contains(&folded) {
                names.push(folded);
            }
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Case-insensitive lookup by full name.
    pub fn lookup(&self, fullname: &str) -> Option<TypeRecordRc> {
        self.by_folded_name
            .get(&fullname.to_lowercase())
            .map(|entry| entry.value().clone())
    }

    /// Lookup that consults the missing-type handler once before giving up.
    pub fn lookup_or_load(&self, fullname: &str) -> Option<TypeRecordRc> {
        if let Some(found) = self.lookup(fullname) {
            return Some(found);
        }

        let handler = read_lock!(self.missing_type_handler).clone();
        if let Some(handler) = handler {
            handler(self, fullname);
            return self.lookup(fullname);
        }
        None
    }

    /// Subscribe to insertions. Existing records are not replayed.
    pub fn subscribe(&self, listener: CatalogListener) {
        self.listeners.push(listener);
    }

    /// Install the handler consulted for unresolvable type names.
    pub fn set_missing_type_handler(&self, handler: MissingTypeHandler) {
        *write_lock!(self.missing_type_handler) = Some(handler);
    }

    /// Sorted, deduplicated list of known namespaces.
    pub fn namespaces(&self) -> Vec<String> {
        self.namespaces
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// All types of a namespace (exact match).
    pub fn types_in_namespace(&self, namespace: &str) -> Vec<TypeRecordRc> {
        match self.by_namespace.get(namespace) {
            Some(names) => names
                .iter()
                .filter_map(|name| self.by_folded_name.get(name).map(|entry| entry.value().clone()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Snapshot of every record, sorted by full name.
    pub fn all_types(&self) -> Vec<TypeRecordRc> {
        self.types.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if there are no types registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Insertion counter; grows by one on every insertion.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Base type of `ty`, resolving a lazily declared base on first use.
    pub fn base_type(&self, ty: &TypeRecordRc) -> Option<TypeRecordRc> {
        if let Some(base) = ty.base() {
            return Some(base);
        }

        let name = ty.base_name()?;
        match self.lookup_or_load(name) {
            Some(base) => {
                ty.set_base(base);
                ty.base()
            }
            None => {
                self.diagnostics.warn_once(
                    DiagnosticCategory::Catalog,
                    format!("missing-base:{name}"),
                    format!("base type {name} of {} is not loaded", ty.fullname_str()),
                );
                None
            }
        }
    }

    /// Full base chain followed by every implemented interface, nearest first.
    pub fn base_types(&self, ty: &TypeRecordRc) -> Vec<TypeRecordRc> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        seen.insert(ty.fullname());

        let mut current = self.base_type(ty);
        while let Some(base) = current {
            if !seen.insert(base.fullname()) {
                break;
            }
            current = self.base_type(&base);
            chain.push(base);
        }

        let mut pending: Vec<TypeRecordRc> = std::iter::once(ty.clone())
            .chain(chain.iter().cloned())
            .collect();
        let mut interfaces = Vec::new();
        let mut cursor = 0;
        while cursor < pending.len() {
            let owner = pending[cursor].clone();
            cursor += 1;
            for (_, interface) in owner.interfaces.iter() {
                if seen.insert(interface.fullname()) {
                    interfaces.push(interface.clone());
                    pending.push(interface.clone());
                }
            }
        }

        chain.extend(interfaces);
        chain
    }

    /// Host-side assignability: can a `source` instance be stored in a `target` slot.
    pub fn is_assignable_from(&self, target: &TypeRecordRc, source: &TypeRecordRc) -> bool {
        if target.fullname_str() == source.fullname_str() {
            return true;
        }
        if target.fullname_str() == "System.Object" {
            return true;
        }

        self.base_types(source)
            .iter()
            .any(|base| base.fullname_str() == target.fullname_str())
    }

    /// Element types of a generic collection, searched along the base chain.
    pub fn collection_entry_types(&self, ty: &TypeRecordRc) -> Option<CollectionEntryTypes> {
        let mut current = Some(ty.clone());
        while let Some(candidate) = current {
            match candidate.generic_args.as_slice() {
                [element] => return Some(CollectionEntryTypes::Single(element.clone())),
                [key, value] => {
                    return Some(CollectionEntryTypes::Pair(key.clone(), value.clone()))
                }
                _ => current = self.base_type(&candidate),
            }
        }
        None
    }

    pub(crate) fn is_excluded_name(&self, fullname: &str) -> bool {
        self.excluded_name_markers
            .iter()
            .any(|marker| fullname.contains(marker.as_str()))
    }

    pub(crate) fn diagnostics(&self) -> &DiagnosticSink {
        &self.diagnostics
    }
}
