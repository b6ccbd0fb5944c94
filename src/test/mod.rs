//! Dual-model fixture shared by the unit tests.
//!
//! [`DualModelFixture`] wires a catalog holding the `Il2Cpp`-prefixed shadow types to a
//! [`NativeHeap`] whose classes back them, the way a dual-model host looks after its
//! proxies were generated. [`collections`] builds foreign collections with reflective
//! enumerators on top of it.


use std::sync::Arc;

use strum::IntoEnumIterator;

use crate::{
    config::BridgeConfig,
    diagnostics::{DiagnosticSink, Diagnostics},
    interop::{CastEngine, DeobfuscationCache, EnumerationBridge, IdentityResolver},
    metadata::{
        catalog::TypeCatalog,
        customattributes::{CustomAttribute, CustomAttributeArgument, RecordAttributeReader},
        typesystem::{FieldFlags, FieldInfo, PrimitiveKind, TypeBuilder, TypeRecordRc},
    },
    runtime::{ForeignRuntime, NativeHeap},
    value::{Object, Value},
};

/// Runtime class name of `MyGame.PlayerController` in the fixture heap
pub const PLAYER_OBFUSCATED_NAME: &str = "A.b39f";

/// Catalog, heap and caches of a small dual-model host.
pub struct DualModelFixture {
    pub config: BridgeConfig,
    pub catalog: Arc<TypeCatalog>,
    pub heap: Arc<NativeHeap>,
    pub diagnostics: Arc<Diagnostics>,
    pub deobfuscation: Arc<DeobfuscationCache>,
    identity: Arc<IdentityResolver>,
}

impl DualModelFixture {
    pub fn new() -> Self {
        let config = BridgeConfig::dual_model();
        let diagnostics = Arc::new(Diagnostics::new());
        let sink = DiagnosticSink::new(diagnostics.clone());
        let catalog = Arc::new(TypeCatalog::new(&config, sink.clone()));
        let heap = Arc::new(NativeHeap::new());

        let native_object = catalog.lookup("System.Object").unwrap();
        let boolean = catalog.lookup("System.Boolean").unwrap();

        let object = TypeBuilder::class("Il2CppSystem", "Object")
            .assembly("Il2Cppmscorlib")
            .foreign()
            .extends(&native_object)
            .build();
        let string = TypeBuilder::class("Il2CppSystem", "String")
            .assembly("Il2Cppmscorlib")
            .foreign()
            .sealed()
            .extends(&object)
            .build();
        let hashtable = TypeBuilder::class("Il2CppSystem.Collections", "Hashtable")
            .assembly("Il2Cppmscorlib")
            .foreign()
            .extends(&object)
            .field(FieldInfo::new("buckets", object.clone(), FieldFlags::empty()))
            .build();
        let nullable = TypeBuilder::value_type("Il2CppSystem", "Nullable`1")
            .assembly("Il2Cppmscorlib")
            .foreign()
            .generic_definition()
            .field(FieldInfo::new("hasValue", boolean, FieldFlags::empty()))
            .field(FieldInfo::new("value", object.clone(), FieldFlags::empty()))
            .build();
        let player = TypeBuilder::class("MyGame", "PlayerController")
            .assembly("Assembly-CSharp")
            .foreign()
            .extends(&object)
            .attribute(
                CustomAttribute::new("Il2CppInterop.Common.ObfuscatedNameAttribute").with_arg(
                    CustomAttributeArgument::String(PLAYER_OBFUSCATED_NAME.to_string()),
                ),
            )
            .build();
        let state = TypeBuilder::enumeration("MyGame", "State")
            .assembly("Assembly-CSharp")
            .constant("Running", 1)
            .constant("Stopped", 2)
            .build();

        for record in [object, string, hashtable, nullable, player.clone(), state] {
            catalog.insert(record).unwrap();
        }
        for kind in PrimitiveKind::iter() {
            catalog
                .insert(
                    TypeBuilder::foreign_primitive(kind, &config.shadow_namespace_prefix)
                        .assembly("Il2Cppmscorlib")
                        .build(),
                )
                .unwrap();
        }

        heap.bind_type("System.Object", heap.object_class());
        heap.bind_type("Il2CppSystem.Object", heap.object_class());
        heap.bind_type("System.String", heap.string_class());
        heap.bind_type("Il2CppSystem.String", heap.string_class());
        for kind in PrimitiveKind::iter() {
            let class = heap.register_class(&kind.native_fullname(), Some(heap.object_class()));
            heap.bind_type(&kind.native_fullname(), class);
            heap.bind_type(&config.shadow_type_name(&kind.native_fullname()), class);
        }
        let player_class = heap.register_class(PLAYER_OBFUSCATED_NAME, Some(heap.object_class()));
        heap.bind_type(player.fullname_str(), player_class);

        let deobfuscation = Arc::new(DeobfuscationCache::new(
            Arc::new(RecordAttributeReader::new(&config.obfuscated_name_attribute)),
            sink.clone(),
        ));
        deobfuscation.scan(&catalog.all_types());

        let identity = Arc::new(IdentityResolver::new(
            catalog.clone(),
            deobfuscation.clone(),
            heap.clone(),
            config.clone(),
            sink,
        ));

        DualModelFixture {
            config,
            catalog,
            heap,
            diagnostics,
            deobfuscation,
            identity,
        }
    }

    pub fn sink(&self) -> DiagnosticSink {
        DiagnosticSink::new(self.diagnostics.clone())
    }

    pub fn identity(&self) -> Arc<IdentityResolver> {
        self.identity.clone()
    }

    pub fn cast_engine(&self) -> CastEngine {
        CastEngine::new(self.identity.clone(), self.sink())
    }

    pub fn enumeration(&self) -> EnumerationBridge {
        EnumerationBridge::new(self.identity.clone(), self.sink())
    }

    pub fn record(&self, fullname: &str) -> TypeRecordRc {
        self.catalog.lookup(fullname).unwrap()
    }

    // Native string wrapped in the Il2CppSystem.String proxy
    pub fn foreign_string(&self, text: &str) -> Value {
        let pointer = self.heap.new_string(text).unwrap();
        Value::Object(Arc::new(Object::wrapper(
            self.record("Il2CppSystem.String"),
            pointer,
        )))
    }

    // Fresh native instance of the class bound to `fullname`, wrapped in its proxy
    pub fn foreign_instance(&self, fullname: &str) -> Value {
        let record = self.record(fullname);
        let class = self.heap.class_for_type(&record).unwrap();
        let pointer = self.heap.alloc(class).unwrap();
        Value::Object(record.construct_wrapper(pointer).unwrap())
    }

    // Native boxed value held by an Il2CppSystem.Object proxy
    pub fn boxed(&self, value: Value) -> Value {
        let declared = value.declared_type(&self.catalog).unwrap();
        let class = self.heap.class_for_type(&declared).unwrap();
        let pointer = self.heap.box_value(class, &value).unwrap();
        Value::Object(Arc::new(Object::wrapper(
            self.record("Il2CppSystem.Object"),
            pointer,
        )))
    }
}
