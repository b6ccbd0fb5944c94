//! Obfuscated-name cache.
//!
//! Foreign runtimes of obfuscated hosts report renamed class names (`A.b39f`). When the
//! host-side proxies were generated with restored names, each proxy carries an attribute
//! recording the name it had at runtime. The [`DeobfuscationCache`] maps those runtime
//! names back to catalog records and keeps the reverse direction for display.
//!
//! The cache is built once from a stable catalog snapshot and then kept current by
//! subscribing to the catalog's insertion feed.

use std::sync::Arc;

use dashmap::DashMap;

use crate::{
    diagnostics::{DiagnosticCategory, DiagnosticSink},
    metadata::{customattributes::AttributeReader, typesystem::TypeRecordRc},
    Error, Result,
};

/// Bidirectional map between obfuscated names and catalog records.
pub struct DeobfuscationCache {
    /// Obfuscated name to real record
    by_obfuscated: DashMap<String, TypeRecordRc>,
    /// Real full name to obfuscated name
    by_real: DashMap<String, String>,
    reader: Arc<dyn AttributeReader>,
    diagnostics: DiagnosticSink,
}

impl DeobfuscationCache {
    /// Create an empty cache reading annotations through `reader`
    pub fn new(reader: Arc<dyn AttributeReader>, diagnostics: DiagnosticSink) -> Self {
        DeobfuscationCache {
            by_obfuscated: DashMap::new(),
            by_real: DashMap::new(),
            reader,
            diagnostics,
        }
    }

    /// Map `obfuscated` onto `record`.
    ///
    /// Registering a name again for a record with the same full name replaces the
    /// previous record, which is what a hot reload does.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] for an empty name and
    /// [`Error::DuplicateRegistration`] if the name already maps to a different type.
    pub fn register(&self, obfuscated: &str, record: TypeRecordRc) -> Result<()> {
        if obfuscated.is_empty() {
            return Err(Error::InvalidArgument(format!(
                "empty obfuscated name for {}",
                record.fullname_str()
            )));
        }

        if let Some(existing) = self.by_obfuscated.get(obfuscated) {
            if existing.fullname_str() != record.fullname_str() {
                return Err(Error::DuplicateRegistration(format!(
                    "obfuscated name {obfuscated} already maps to {}, not {}",
                    existing.fullname_str(),
                    record.fullname_str()
                )));
            }
        }

        self.by_real
            .insert(record.fullname(), obfuscated.to_string());
        self.by_obfuscated.insert(obfuscated.to_string(), record);
        Ok(())
    }

    /// Index one record. Returns `true` if it carried an obfuscated name.
    ///
    /// Reader failures and conflicting annotations are logged; the first mapping wins.
    pub fn on_type_loaded(&self, record: &TypeRecordRc) -> bool {
        let name = match self.reader.obfuscated_name(record) {
            Ok(Some(name)) => name,
            Ok(None) => return false,
            Err(error) => {
                self.diagnostics.type_warning(
                    DiagnosticCategory::Deobfuscation,
                    record.fullname_str(),
                    format!("failed to read obfuscation attribute: {error}"),
                );
                return false;
            }
        };

        match self.register(&name, record.clone()) {
            Ok(()) => true,
            Err(error) => {
                self.diagnostics.type_warning(
                    DiagnosticCategory::Deobfuscation,
                    record.fullname_str(),
                    error.to_string(),
                );
                false
            }
        }
    }

    /// Index a snapshot of records. Returns the number of mappings added.
    pub fn scan(&self, records: &[TypeRecordRc]) -> usize {
        let added = records
            .iter()
            .filter(|record| self.on_type_loaded(record))
            .count();
        if added > 0 {
            self.diagnostics.info(
                DiagnosticCategory::Deobfuscation,
                format!("indexed {added} obfuscated type names"),
            );
        }
        added
    }

    /// Real record behind an obfuscated name
    pub fn lookup(&self, obfuscated: &str) -> Option<TypeRecordRc> {
        self.by_obfuscated
            .get(obfuscated)
            .map(|entry| entry.value().clone())
    }

    /// Obfuscated name of a real full name
    pub fn obfuscated_name_of(&self, real_fullname: &str) -> Option<String> {
        self.by_real
            .get(real_fullname)
            .map(|entry| entry.value().clone())
    }

    /// Number of mappings
    pub fn len(&self) -> usize {
        self.by_obfuscated.len()
    }

    /// Returns true if no mappings exist
    pub fn is_empty(&self) -> bool {
        self.by_obfuscated.is_empty()
    }

    /// Replace every known obfuscated name in `text` with its real full name.
    ///
    /// Longer names are replaced first so `A.b3` never clobbers part of `A.b39f`.
    pub fn deobfuscate_text(&self, text: &str) -> String {
        let mut names: Vec<(String, String)> = self
            .by_obfuscated
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().fullname()))
            .collect();
        names.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));

        let mut result = text.to_string();
        for (obfuscated, real) in names {
            if result.contains(&obfuscated) {
                result = result.replace(&obfuscated, &real);
            }
        }
        result
    }
}
