//! Integration tests for the type catalog, implementation queries and member resolution.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use dotbridge::{prelude::*, Result};

fn managed() -> Result<BridgeContext> {
    BridgeContext::builder()
        .config(BridgeConfig::managed())
        .build()
}

fn names(types: &[TypeRecordRc]) -> Vec<String> {
    types.iter().map(|ty| ty.fullname()).collect()
}

#[test]
fn test_lookup_is_case_insensitive() -> Result<()> {
    let context = managed()?;
    context.initialize(&[ModuleInfo::new(
        "Assembly-CSharp",
        vec![TypeBuilder::class("MyGame.UI", "HealthBar").build()],
    )]);

    for spelling in ["MyGame.UI.HealthBar", "mygame.ui.healthbar", "MYGAME.UI.HEALTHBAR"] {
        assert_eq!(
            context.lookup(spelling).unwrap().fullname(),
            "MyGame.UI.HealthBar"
        );
    }
    assert!(context.lookup("MyGame.UI.Missing").is_none());
    assert!(context.catalog().namespaces().contains(&"MyGame.UI".to_string()));
    Ok(())
}

#[test]
fn test_reloaded_module_replaces_records() -> Result<()> {
    let context = managed()?;
    context.initialize(&[ModuleInfo::new(
        "Mod",
        vec![TypeBuilder::class("Mod", "Config").assembly("Mod").build()],
    )]);
    let before = context.catalog().len();

    let reloaded = TypeBuilder::class("Mod", "Config")
        .assembly("Mod")
        .sealed()
        .build();
    context.on_module_loaded(&ModuleInfo::new("Mod", vec![reloaded]));

    assert_eq!(context.catalog().len(), before);
    assert!(context
        .lookup("Mod.Config")
        .unwrap()
        .flags
        .contains(TypeFlags::SEALED));
    Ok(())
}

#[test]
fn test_implementations() -> Result<()> {
    let context = managed()?;
    let foo = TypeBuilder::class("A", "Foo").abstract_type().build();
    let bar = TypeBuilder::class("A", "Bar").extends(&foo).build();
    let baz = TypeBuilder::class("A", "Baz").extends(&bar).build();
    let closure = TypeBuilder::class("A", "Foo+<>c__DisplayClass2_0").extends(&foo).build();
    let state_machine = TypeBuilder::class("A", "Foo+<Run>d__5").extends(&bar).build();
    context.initialize(&[ModuleInfo::new(
        "A",
        vec![foo.clone(), bar.clone(), baz, closure, state_machine],
    )]);

    let found = context.implementations(&foo, ImplementationFilter::default());
    assert_eq!(names(&found), vec!["A.Bar", "A.Baz"]);

    let below_bar = context.implementations(&bar, ImplementationFilter::default());
    assert_eq!(names(&below_bar), vec!["A.Baz"]);

    // Abstract types only appear when asked for, the base itself never
    let with_abstract = context.implementations(
        &context.lookup("System.Object").unwrap(),
        ImplementationFilter::new(true, false, false),
    );
    let with_abstract = names(&with_abstract);
    assert!(with_abstract.contains(&"A.Foo".to_string()));
    assert!(!with_abstract.contains(&"System.Object".to_string()));
    assert!(!with_abstract.iter().any(|name| name.contains('<')));
    Ok(())
}

#[test]
fn test_interface_implementations() -> Result<()> {
    let context = managed()?;
    let weapon = TypeBuilder::interface("MyGame", "IWeapon").build();
    let sword = TypeBuilder::class("MyGame", "Sword").implements(&weapon).build();
    let shield = TypeBuilder::class("MyGame", "Shield").build();
    let mode = TypeBuilder::enumeration("MyGame", "Mode")
        .implements(&weapon)
        .constant("Off", 0)
        .build();
    context.initialize(&[ModuleInfo::new("MyGame", vec![weapon.clone(), sword, shield, mode])]);

    let strict = context.implementations(&weapon, ImplementationFilter::default());
    assert_eq!(names(&strict), vec!["MyGame.Sword"]);

    let with_enums = context.implementations(&weapon, ImplementationFilter::new(false, false, true));
    assert_eq!(names(&with_enums), vec!["MyGame.Mode", "MyGame.Sword"]);
    Ok(())
}

#[test]
fn test_late_module_updates_cached_implementations() -> Result<()> {
    let context = managed()?;
    let foo = TypeBuilder::class("A", "Foo").build();
    context.initialize(&[ModuleInfo::new(
        "A",
        vec![foo.clone(), TypeBuilder::class("A", "Bar").extends(&foo).build()],
    )]);
    assert_eq!(
        context.implementations(&foo, ImplementationFilter::default()).len(),
        1
    );

    context.on_module_loaded(&ModuleInfo::new(
        "B",
        vec![TypeBuilder::class("B", "Qux").extends_named("A.Foo").build()],
    ));
    assert_eq!(
        names(&context.implementations(&foo, ImplementationFilter::default())),
        vec!["A.Bar", "B.Qux"]
    );
    Ok(())
}

#[test]
fn test_types_loaded_during_scan_are_picked_up() -> Result<()> {
    let diagnostics = Arc::new(Diagnostics::new());
    let context = BridgeContext::builder()
        .config(BridgeConfig::managed())
        .diagnostics(diagnostics.clone())
        .build()?;
    let foo = TypeBuilder::class("A", "Foo").build();
    context.initialize(&[ModuleInfo::new(
        "A",
        vec![
            foo.clone(),
            TypeBuilder::class("A", "Lazy").extends_named("Deferred.Base").build(),
        ],
    )]);

    // The first base resolution loads a whole module
    let loads = Arc::new(AtomicUsize::new(0));
    let counter = loads.clone();
    let parent = foo.clone();
    context
        .catalog()
        .set_missing_type_handler(Arc::new(move |catalog: &TypeCatalog, name: &str| {
            if name == "Deferred.Base" {
                counter.fetch_add(1, Ordering::SeqCst);
                catalog.on_module_loaded(&ModuleInfo::new(
                    "Deferred",
                    vec![
                        TypeBuilder::class("Deferred", "Base").extends(&parent).build(),
                        TypeBuilder::class("Deferred", "Sibling").extends(&parent).build(),
                    ],
                ));
            }
        }));

    let found = context.implementations(&foo, ImplementationFilter::default());
    assert_eq!(
        names(&found),
        vec!["A.Lazy", "Deferred.Base", "Deferred.Sibling"]
    );
    assert_eq!(loads.load(Ordering::SeqCst), 1);
    assert_eq!(diagnostics.by_category(DiagnosticCategory::Catalog).len(), 1);
    Ok(())
}

#[test]
fn test_member_resolver_follows_renames() -> Result<()> {
    let context = managed()?;
    let int = context.lookup("System.Int32").unwrap();
    let string = context.lookup("System.String").unwrap();

    // Three releases of the same type, each naming the member differently
    let v1 = TypeBuilder::class("Game", "EnumeratorV1")
        .field(FieldInfo::new("current", int.clone(), FieldFlags::empty()))
        .build();
    let v2 = TypeBuilder::class("Game", "EnumeratorV2")
        .field(FieldInfo::new("m_current", int.clone(), FieldFlags::empty()))
        .build();
    let v3 = TypeBuilder::class("Game", "EnumeratorV3")
        .field(FieldInfo::new("m_current", string.clone(), FieldFlags::empty()))
        .field(FieldInfo::new("<Current>k__BackingField", int.clone(), FieldFlags::empty()))
        .build();

    for (ty, expected) in [
        (&v1, "current"),
        (&v2, "m_current"),
        (&v3, "<Current>k__BackingField"),
    ] {
        let resolver = context.member_resolver::<i32>(
            ty,
            &int,
            &["current", "Current"],
            MemberAccess::READ | MemberAccess::WRITE,
        )?;
        assert_eq!(resolver.member_name(), Some(expected));

        let instance = Value::Object(Arc::new(Object::new(ty.clone())));
        assert_eq!(resolver.get(&instance), 0);
        resolver.set(&instance, 12);
        assert_eq!(resolver.get(&instance), 12);
    }
    Ok(())
}

#[test]
fn test_unresolved_member_is_inert() -> Result<()> {
    let context = managed()?;
    let int = context.lookup("System.Int32").unwrap();
    let ty = TypeBuilder::class("Game", "Empty")
        .field(FieldInfo::literal("Max", int.clone(), Value::I32(3)))
        .build();

    let resolver = context.member_resolver::<i32>(&ty, &int, &["Max", "max"], MemberAccess::READ)?;
    assert!(!resolver.is_bound());

    let instance = Value::Object(Arc::new(Object::new(ty)));
    assert_eq!(resolver.get(&instance), 0);
    resolver.set(&instance, 5);
    assert!(resolver.read(&instance).is_none());

    assert!(matches!(
        context.member_resolver::<i32>(&int, &int, &[], MemberAccess::READ),
        Err(Error::InvalidArgument(_))
    ));
    Ok(())
}

#[test]
fn test_managed_casts() -> Result<()> {
    let context = managed()?;
    let byte = context.lookup("System.Byte").unwrap();
    let double = context.lookup("System.Double").unwrap();
    let mode = TypeBuilder::enumeration("Game", "Mode")
        .constant("Idle", 0)
        .constant("Busy", 1)
        .build();

    assert_eq!(
        context.try_cast(&Value::I32(255), &byte),
        CastOutcome::Converted(Value::U8(255))
    );
    assert!(context.try_cast(&Value::I32(256), &byte).is_incompatible());
    assert_eq!(
        context.try_cast(&Value::I64(2), &double),
        CastOutcome::Converted(Value::F64(2.0))
    );
    assert_eq!(
        context.try_cast(&Value::from("Busy"), &mode),
        CastOutcome::Converted(Value::Enum { ty: mode.clone(), value: 1 })
    );
    assert_eq!(
        context.try_cast(&Value::Null, &mode),
        CastOutcome::Converted(Value::Null)
    );
    Ok(())
}
