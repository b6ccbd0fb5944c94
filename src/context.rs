//! The session-scoped bridge context.
//!
//! [`BridgeContext`] owns every cache of the bridge (the type catalog, the deobfuscation
//! cache, the enumeration probe results) and the object-model strategy selected for the
//! configured backend. One context is created at startup and passed to every consumer;
//! there is no global state.
//!
//! # Initialization
//!
//! [`BridgeContext::initialize`] runs in two phases so that the caches never trigger each
//! other recursively:
//!
//! 1. the catalog indexes the startup modules, producing a stable snapshot
//! 2. the deobfuscation cache scans that snapshot once and is then subscribed to the
//!    catalog's insertion feed, which keeps it current for every later module
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use dotbridge::prelude::*;
//!
//! let context = BridgeContext::builder()
//!     .config(BridgeConfig::dual_model())
//!     .runtime(Arc::new(NativeHeap::new()))
//!     .build()?;
//!
//! let player = TypeBuilder::class("MyGame", "PlayerController").foreign().build();
//! context.initialize(&[ModuleInfo::new("Assembly-CSharp", vec![player])]);
//!
//! assert!(context.lookup("mygame.playercontroller").is_some());
//! # Ok::<(), dotbridge::Error>(())
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::{
    config::{Backend, BridgeConfig},
    diagnostics::{DiagnosticSink, Diagnostics},
    dispatch::MainThreadDispatcher,
    interop::{
        AmbiguousMemberResolver, CastOutcome, DeobfuscationCache, DictionarySequence, DualModel,
        IdentityResolver, ManagedModel, MemberAccess, ObjectModel, ObjectSequence,
    },
    metadata::{
        catalog::{ImplementationFilter, TypeCatalog},
        customattributes::{AttributeReader, RecordAttributeReader},
        module::ModuleInfo,
        typesystem::TypeRecordRc,
    },
    runtime::ForeignRuntime,
    value::Value,
    Error, Result,
};

/// Builder for a [`BridgeContext`].
#[derive(Default)]
pub struct BridgeContextBuilder {
    config: Option<BridgeConfig>,
    runtime: Option<Arc<dyn ForeignRuntime>>,
    attribute_reader: Option<Arc<dyn AttributeReader>>,
    diagnostics: Option<Arc<Diagnostics>>,
}

impl BridgeContextBuilder {
    /// Configuration to use; the dual-model preset by default
    #[must_use]
    pub fn config(mut self, config: BridgeConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Foreign runtime, required for the dual-model backend
    #[must_use]
    pub fn runtime(mut self, runtime: Arc<dyn ForeignRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Reader for obfuscated-name annotations.
    ///
    /// Defaults to a [`RecordAttributeReader`] for the configured attribute name.
    #[must_use]
    pub fn attribute_reader(mut self, reader: Arc<dyn AttributeReader>) -> Self {
        self.attribute_reader = Some(reader);
        self
    }

    /// Container that receives warnings. Without one the bridge stays silent.
    #[must_use]
    pub fn diagnostics(mut self, diagnostics: Arc<Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    /// Build the context and select the object model.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if the dual-model backend is configured without
    /// a foreign runtime.
    pub fn build(self) -> Result<BridgeContext> {
        let config = self.config.unwrap_or_default();
        let sink = self
            .diagnostics
            .clone()
            .map(DiagnosticSink::new)
            .unwrap_or_default();

        let catalog = Arc::new(TypeCatalog::new(&config, sink.clone()));
        let reader = self.attribute_reader.unwrap_or_else(|| {
            Arc::new(RecordAttributeReader::new(&config.obfuscated_name_attribute))
        });
        let deobfuscation = Arc::new(DeobfuscationCache::new(reader, sink.clone()));

        let model: Box<dyn ObjectModel> = match config.backend {
            Backend::Managed => Box::new(ManagedModel::new(catalog.clone())),
            Backend::DualModel => {
                let runtime = self.runtime.ok_or_else(|| {
                    Error::InvalidArgument(
                        "the dual-model backend requires a foreign runtime".to_string(),
                    )
                })?;
                let identity = Arc::new(IdentityResolver::new(
                    catalog.clone(),
                    deobfuscation.clone(),
                    runtime,
                    config.clone(),
                    sink.clone(),
                ));
                Box::new(DualModel::new(identity, &sink))
            }
        };

        Ok(BridgeContext {
            dispatcher: Arc::new(MainThreadDispatcher::new(sink)),
            config,
            catalog,
            deobfuscation,
            model,
            diagnostics: self.diagnostics,
            subscribed: AtomicBool::new(false),
        })
    }
}

/// Process-wide bridge state with session lifetime.
pub struct BridgeContext {
    config: BridgeConfig,
    catalog: Arc<TypeCatalog>,
    deobfuscation: Arc<DeobfuscationCache>,
    model: Box<dyn ObjectModel>,
    dispatcher: Arc<MainThreadDispatcher>,
    diagnostics: Option<Arc<Diagnostics>>,
    /// Set once the deobfuscation cache follows the catalog feed
    subscribed: AtomicBool,
}

impl BridgeContext {
    /// Start building a context
    pub fn builder() -> BridgeContextBuilder {
        BridgeContextBuilder::default()
    }

    /// Index the startup modules and bring the deobfuscation cache up to date.
    ///
    /// Calling this again later only adds the new modules. Returns the number of records
    /// inserted into the catalog.
    pub fn initialize(&self, modules: &[ModuleInfo]) -> usize {
        let inserted = self.catalog.initialize(modules);

        if !self.subscribed.swap(true, Ordering::SeqCst) {
            self.deobfuscation.scan(&self.catalog.all_types());
            let deobfuscation = self.deobfuscation.clone();
            self.catalog.subscribe(Arc::new(move |_: &TypeCatalog, record: &TypeRecordRc| {
                deobfuscation.on_type_loaded(record);
            }));
        }
        inserted
    }

    /// Feed one freshly loaded module, as delivered by the host's load notifications.
    pub fn on_module_loaded(&self, module: &ModuleInfo) -> usize {
        self.catalog.on_module_loaded(module)
    }

    /// Case-insensitive lookup by full name
    pub fn lookup(&self, fullname: &str) -> Option<TypeRecordRc> {
        self.catalog.lookup(fullname)
    }

    /// True concrete type of `value`
    pub fn actual_type(&self, value: &Value) -> Option<TypeRecordRc> {
        self.model.actual_type(value)
    }

    /// Convert `value` into `target`
    pub fn try_cast(&self, value: &Value, target: &TypeRecordRc) -> CastOutcome {
        self.model.try_cast(value, target)
    }

    /// Concrete types assignable to `base`
    pub fn implementations(
        &self,
        base: &TypeRecordRc,
        filter: ImplementationFilter,
    ) -> Vec<TypeRecordRc> {
        self.catalog.get_implementations(base, filter)
    }

    /// Lazy sequence over a collection
    ///
    /// # Errors
    /// Returns [`Error::NotEnumerable`] or [`Error::EnumerationUnsupported`].
    pub fn sequence(&self, collection: &Value) -> Result<ObjectSequence> {
        self.model.sequence(collection)
    }

    /// Lazy entry sequence over a dictionary
    ///
    /// # Errors
    /// Returns [`Error::NotEnumerable`], [`Error::EnumerationUnsupported`] or
    /// [`Error::MemberNotFound`] for a hashtable without a bucket array.
    pub fn dictionary(&self, dictionary: &Value) -> Result<DictionarySequence> {
        self.model.dictionary(dictionary)
    }

    /// Whether `value` can be enumerated
    pub fn is_enumerable(&self, value: &Value) -> bool {
        self.model.is_enumerable(value)
    }

    /// Whether `value` can be enumerated as a dictionary
    pub fn is_dictionary(&self, value: &Value) -> bool {
        self.model.is_dictionary(value)
    }

    /// Resolver for a member known under several names.
    ///
    /// Backing-field variants follow the configuration.
    ///
    /// # Errors
    /// Returns [`Error::InvalidArgument`] if `candidates` is empty.
    pub fn member_resolver<T>(
        &self,
        declaring: &TypeRecordRc,
        value_type: &TypeRecordRc,
        candidates: &[&str],
        access: MemberAccess,
    ) -> Result<AmbiguousMemberResolver<T>>
    where
        T: TryFrom<Value> + Into<Value> + Default,
    {
        AmbiguousMemberResolver::new(
            &self.catalog,
            declaring,
            value_type,
            candidates,
            access,
            self.config.backing_field_variants,
        )
    }

    /// Replace obfuscated type names in `text` with their real names
    pub fn deobfuscate_text(&self, text: &str) -> String {
        self.deobfuscation.deobfuscate_text(text)
    }

    /// The type catalog
    pub fn catalog(&self) -> &Arc<TypeCatalog> {
        &self.catalog
    }

    /// The deobfuscation cache
    pub fn deobfuscation(&self) -> &Arc<DeobfuscationCache> {
        &self.deobfuscation
    }

    /// The owner-thread dispatcher
    pub fn dispatcher(&self) -> &Arc<MainThreadDispatcher> {
        &self.dispatcher
    }

    /// The active object model
    pub fn model(&self) -> &dyn ObjectModel {
        self.model.as_ref()
    }

    /// Configuration in use
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Backend selected at build time
    pub fn backend(&self) -> Backend {
        self.config.backend
    }

    /// Warning container, if one was supplied
    pub fn diagnostics(&self) -> Option<&Arc<Diagnostics>> {
        self.diagnostics.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::customattributes::{CustomAttribute, CustomAttributeArgument},
        metadata::typesystem::TypeBuilder,
        runtime::NativeHeap,
    };

    fn obfuscated(namespace: &str, name: &str, original: &str) -> TypeRecordRc {
        TypeBuilder::class(namespace, name)
            .foreign()
            .attribute(
                CustomAttribute::new("ObfuscatedNameAttribute")
                    .with_arg(CustomAttributeArgument::String(original.to_string())),
            )
            .build()
    }

    #[test]
    fn test_dual_model_requires_runtime() {
        let result = BridgeContext::builder()
            .config(BridgeConfig::dual_model())
            .build();
        assert!(matches!(result, Err(Error::InvalidArgument(_))));

        let managed = BridgeContext::builder()
            .config(BridgeConfig::managed())
            .build()
            .unwrap();
        assert_eq!(managed.backend(), Backend::Managed);
        assert!(managed.diagnostics().is_none());
    }

    #[test]
    fn test_two_phase_initialization() {
        let context = BridgeContext::builder()
            .runtime(Arc::new(NativeHeap::new()))
            .build()
            .unwrap();

        context.initialize(&[ModuleInfo::new(
            "Assembly-CSharp",
            vec![obfuscated("MyGame", "PlayerController", "A.b39f")],
        )]);
        assert_eq!(
            context.deobfuscation().lookup("A.b39f").unwrap().fullname(),
            "MyGame.PlayerController"
        );

        // Later modules reach the cache through the catalog feed
        context.on_module_loaded(&ModuleInfo::new(
            "Late",
            vec![obfuscated("MyGame", "Inventory", "A.c1")],
        ));
        assert_eq!(
            context.deobfuscate_text("at A.c1.Add"),
            "at MyGame.Inventory.Add"
        );

        // Bridge-generated modules are ignored
        context.on_module_loaded(&ModuleInfo::bridge(
            "Injected",
            vec![obfuscated("MyGame", "Injected", "A.zz")],
        ));
        assert!(context.lookup("MyGame.Injected").is_none());
        assert!(context.deobfuscation().lookup("A.zz").is_none());
    }

    #[test]
    fn test_initialize_twice_subscribes_once() {
        let context = BridgeContext::builder()
            .runtime(Arc::new(NativeHeap::new()))
            .build()
            .unwrap();
        context.initialize(&[]);
        context.initialize(&[ModuleInfo::new(
            "Second",
            vec![obfuscated("MyGame", "Shop", "A.d")],
        )]);

        assert_eq!(context.deobfuscation().len(), 1);
    }
}
