//! Implementation-set queries over the catalog.
//!
//! `get_implementations` answers "which loaded, instantiable types can be assigned to
//! this base type". The scan runs over a snapshot of the catalog. Lazily declared base
//! types are resolved sequentially on the calling thread, so the missing-type handler
//! and catalog listeners never run on a worker; only the assignability check over the
//! resolved chains is parallel. Resolution may load more types, in which case the scan
//! is repeated exactly once against the enlarged catalog.

use rayon::prelude::*;

use crate::{
    diagnostics::DiagnosticCategory,
    metadata::{
        catalog::{ImplementationCacheEntry, TypeCatalog},
        typesystem::TypeRecordRc,
    },
};

/// Which kinds of types an implementation query accepts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImplementationFilter {
    /// Include abstract classes and interfaces
    pub allow_abstract: bool,
    /// Include generic definitions and constructed generics
    pub allow_generic: bool,
    /// Include enums
    pub allow_enum: bool,
    /// Include static classes
    pub allow_static: bool,
}

impl ImplementationFilter {
    /// Create a filter; static classes stay excluded
    #[must_use]
    pub fn new(allow_abstract: bool, allow_generic: bool, allow_enum: bool) -> Self {
        ImplementationFilter {
            allow_abstract,
            allow_generic,
            allow_enum,
            allow_static: false,
        }
    }

    /// Also include static classes
    #[must_use]
    pub fn with_static(mut self) -> Self {
        self.allow_static = true;
        self
    }
}

impl TypeCatalog {
    /// All catalogued types assignable to `base` that pass `filter`, sorted by name.
    ///
    /// `base` itself is never part of the result. Types whose name carries a
    /// compiler-generated marker are always excluded. Results are cached per
    /// `(base, filter)` and recomputed once the catalog has grown.
    pub fn get_implementations(
        &self,
        base: &TypeRecordRc,
        filter: ImplementationFilter,
    ) -> Vec<TypeRecordRc> {
        let key = (base.key().clone(), filter);
        let generation = self.generation();
        if let Some(entry) = self.implementations.get(&key) {
            if entry.generation == generation {
                return entry.types.clone();
            }
        }

        let mut types = self.scan_implementations(base, filter);
        let mut computed_at = generation;
        let grown = self.generation();
        if grown != generation {
            self.diagnostics().info(
                DiagnosticCategory::Catalog,
                format!(
                    "catalog grew from generation {generation} to {grown} while scanning \
                     implementations of {}, rescanning",
                    base.fullname_str()
                ),
            );
            types = self.scan_implementations(base, filter);
            computed_at = grown;
        }

        self.implementations.insert(
            key,
            ImplementationCacheEntry {
                generation: computed_at,
                types: types.clone(),
            },
        );
        types
    }

    fn scan_implementations(
        &self,
        base: &TypeRecordRc,
        filter: ImplementationFilter,
    ) -> Vec<TypeRecordRc> {
        // Base chains are resolved here, on the calling thread: resolution may run the
        // missing-type handler and catalog listeners, which must not see a worker thread
        let candidates: Vec<(TypeRecordRc, Vec<TypeRecordRc>)> = self
            .all_types()
            .into_iter()
            .filter(|candidate| self.passes_filter(base, candidate, filter))
            .map(|candidate| {
                let bases = self.base_types(&candidate);
                (candidate, bases)
            })
            .collect();

        let target = base.fullname_str();
        candidates
            .into_par_iter()
            .filter(|(_, bases)| {
                target == "System.Object" || bases.iter().any(|ty| ty.fullname_str() == target)
            })
            .map(|(candidate, _)| candidate)
            .collect()
    }

    fn passes_filter(
        &self,
        base: &TypeRecordRc,
        candidate: &TypeRecordRc,
        filter: ImplementationFilter,
    ) -> bool {
        if candidate.fullname_str() == base.fullname_str() {
            return false;
        }
        if self.is_excluded_name(candidate.fullname_str()) {
            return false;
        }
        if candidate.is_static() {
            if !filter.allow_static {
                return false;
            }
        } else if candidate.is_abstract() && !filter.allow_abstract {
            return false;
        }
        if candidate.is_generic() && !filter.allow_generic {
            return false;
        }
        !(candidate.is_enum() && !filter.allow_enum)
    }
}
