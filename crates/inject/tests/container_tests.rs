//! Integration tests for binding, planning and resolution
//!
//! Covers identifier lookups, contextual constraints, multi-injection,
//! error reporting and container hierarchies.

use std::sync::Arc;

use elif_inject::container::AutoFactory;
use elif_inject::prelude::*;
use elif_inject::{multi_bind_to_service, ContainerOptions, Newable, Resolved, Result};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug)]
struct Katana;

impl Injectable for Katana {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>().constructor([]).build()
    }

    fn construct(_args: &mut Arguments) -> Result<Self> {
        Ok(Katana)
    }
}

#[derive(Debug)]
struct Shuriken;

impl Injectable for Shuriken {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>().constructor([]).build()
    }

    fn construct(_args: &mut Arguments) -> Result<Self> {
        Ok(Shuriken)
    }
}

struct Ninja {
    katana: Arc<Katana>,
    shuriken: Arc<Shuriken>,
}

impl Injectable for Ninja {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>()
            .constructor([Param::of::<Katana>(), Param::of::<Shuriken>()])
            .build()
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Ninja {
            katana: args.next()?,
            shuriken: args.next()?,
        })
    }
}

/// Warrior whose two weapons are picked by name
struct Samurai {
    primary: Arc<Katana>,
    secondary: Arc<Shuriken>,
}

impl Injectable for Samurai {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>()
            .constructor([Param::token("Weapon"), Param::token("Weapon")])
            .param_tag(0, Tag::named("strong"))
            .param_tag(1, Tag::named("weak"))
            .build()
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Samurai {
            primary: args.next()?,
            secondary: args.next()?,
        })
    }
}

fn bind_weapons(container: &Container) -> Result<()> {
    container
        .bind(ServiceIdentifier::of::<Katana>())?
        .to::<Katana>();
    container
        .bind(ServiceIdentifier::of::<Shuriken>())?
        .to::<Shuriken>();
    Ok(())
}

#[test]
fn test_resolves_constructor_dependencies() -> Result<()> {
    init_tracing();
    let container = Container::new();
    bind_weapons(&container)?;
    container.bind(ServiceIdentifier::of::<Ninja>())?.to::<Ninja>();

    let ninja = container.get::<Ninja>(ServiceIdentifier::of::<Ninja>())?;
    assert!(Arc::strong_count(&ninja.katana) >= 1);
    assert!(Arc::strong_count(&ninja.shuriken) >= 1);
    Ok(())
}

#[test]
fn test_token_bound_to_constant_value() -> Result<()> {
    let container = Container::new();
    container.bind("Port")?.to_constant_value(8080u16);

    assert_eq!(*container.get::<u16>("Port")?, 8080);
    let err = container.get::<String>("Port").unwrap_err();
    assert!(matches!(err, InjectError::TypeMismatch { .. }));
    Ok(())
}

#[test]
fn test_not_registered_message() {
    let container = Container::new();
    let err = container.get::<Katana>("Katana").unwrap_err();

    assert!(err.is_not_registered());
    assert_eq!(
        err.to_string(),
        "No matching bindings found for serviceIdentifier: Katana"
    );
}

#[test]
fn test_ambiguous_match_lists_registered_bindings() -> Result<()> {
    let container = Container::new();
    container.bind("Weapon")?.to::<Katana>();
    container.bind("Weapon")?.to::<Shuriken>();

    let err = container.get_instance("Weapon").unwrap_err();
    assert!(err.is_ambiguous_match());
    assert_eq!(
        err.to_string(),
        "Ambiguous match found for serviceIdentifier: Weapon\nRegistered bindings:\n Katana\n Shuriken"
    );
    Ok(())
}

#[test]
fn test_named_constraints_select_bindings() -> Result<()> {
    let container = Container::new();
    container
        .bind("Weapon")?
        .to::<Katana>()
        .when_target_named("strong");
    container
        .bind("Weapon")?
        .to::<Shuriken>()
        .when_target_named("weak");
    container.bind("Samurai")?.to::<Samurai>();

    let samurai = container.get::<Samurai>("Samurai")?;
    assert!(Arc::strong_count(&samurai.primary) >= 1);
    assert!(Arc::strong_count(&samurai.secondary) >= 1);

    let katana = container.get_named::<Katana>("Weapon", "strong")?;
    assert!(Arc::strong_count(&katana) >= 1);
    Ok(())
}

#[test]
fn test_unnamed_get_over_named_bindings_is_ambiguous() -> Result<()> {
    let container = Container::new();
    container
        .bind("Weapon")?
        .to::<Katana>()
        .when_target_named("left");
    container
        .bind("Weapon")?
        .to::<Shuriken>()
        .when_target_named("right");

    assert!(container.get_named::<Katana>("Weapon", "left").is_ok());
    assert!(container.get_named::<Shuriken>("Weapon", "right").is_ok());

    let err = container.get_instance("Weapon").unwrap_err();
    assert!(err.is_ambiguous_match());
    assert!(err
        .to_string()
        .starts_with("Ambiguous match found for serviceIdentifier: Weapon"));

    // A single constrained binding that does not match is still missing
    container.unbind("Weapon")?;
    container
        .bind("Weapon")?
        .to::<Katana>()
        .when_target_named("left");
    assert!(container.get_instance("Weapon").unwrap_err().is_not_registered());
    Ok(())
}

#[test]
fn test_unbound_service_is_no_longer_resolvable() -> Result<()> {
    let container = Container::new();
    container.bind("Weapon")?.to::<Katana>();
    assert!(container.get::<Katana>("Weapon").is_ok());

    container.unbind("Weapon")?;
    assert!(!container.is_bound("Weapon"));
    assert!(container
        .get::<Katana>("Weapon")
        .unwrap_err()
        .is_not_registered());
    Ok(())
}

#[test]
fn test_named_lookup_failure_describes_target_and_bindings() -> Result<()> {
    let container = Container::new();
    container
        .bind("Weapon")?
        .to::<Katana>()
        .when_target_named("strong");

    let err = container.get_named::<Katana>("Weapon", "bow").unwrap_err();
    let message = err.to_string();

    assert!(message.starts_with("No matching bindings found for serviceIdentifier: Weapon"));
    assert!(message.contains(r#"Weapon - {"key":"named","value":"bow"}"#));
    assert!(message.contains("Registered bindings:"));
    assert!(message.contains(r#"Katana - {"key":"named","value":"strong"}"#));
    Ok(())
}

#[test]
fn test_tagged_constraints() -> Result<()> {
    let container = Container::new();
    container
        .bind("Weapon")?
        .to::<Katana>()
        .when_target_tagged("canThrow", false);
    container
        .bind("Weapon")?
        .to::<Shuriken>()
        .when_target_tagged("canThrow", true);

    assert!(container.get_tagged::<Shuriken>("Weapon", "canThrow", true).is_ok());
    assert!(container.get_tagged::<Katana>("Weapon", "canThrow", false).is_ok());

    assert!(container.is_bound_tagged("Weapon", "canThrow", true));
    assert!(!container.is_bound_tagged("Weapon", "canThrow", "maybe"));
    assert!(!container.is_bound_named("Weapon", "katana"));
    Ok(())
}

struct Archer {
    weapon: Arc<Shuriken>,
}

impl Injectable for Archer {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>()
            .constructor([Param::token("Weapon")])
            .build()
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Archer { weapon: args.next()? })
    }
}

struct Swordsman {
    weapon: Arc<Katana>,
}

impl Injectable for Swordsman {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>()
            .constructor([Param::token("Weapon")])
            .build()
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Swordsman { weapon: args.next()? })
    }
}

#[test]
fn test_when_injected_into_uses_parent_implementation() -> Result<()> {
    let container = Container::new();
    container
        .bind("Weapon")?
        .to::<Katana>()
        .when_injected_into(TypeKey::of::<Swordsman>());
    container
        .bind("Weapon")?
        .to::<Shuriken>()
        .when_injected_into(TypeKey::of::<Archer>());
    container.bind("Archer")?.to::<Archer>();
    container.bind("Swordsman")?.to::<Swordsman>();

    let archer = container.get::<Archer>("Archer")?;
    let swordsman = container.get::<Swordsman>("Swordsman")?;
    assert!(Arc::strong_count(&archer.weapon) >= 1);
    assert!(Arc::strong_count(&swordsman.weapon) >= 1);
    Ok(())
}

#[test]
fn test_ancestor_constraints() -> Result<()> {
    let container = Container::new();
    container
        .bind("Weapon")?
        .to::<Katana>()
        .when_any_ancestor_named("melee");
    container
        .bind("Weapon")?
        .to::<Shuriken>()
        .when_no_ancestor_named("melee");
    container
        .bind("Fighter")?
        .to::<Swordsman>()
        .when_target_named("melee");
    container
        .bind("Fighter")?
        .to::<Archer>()
        .when_target_is_default();

    let swordsman = container.get_named::<Swordsman>("Fighter", "melee")?;
    assert!(Arc::strong_count(&swordsman.weapon) >= 1);

    let archer = container.get::<Archer>("Fighter")?;
    assert!(Arc::strong_count(&archer.weapon) >= 1);
    Ok(())
}

#[test]
fn test_get_all_preserves_declaration_order() -> Result<()> {
    let container = Container::new();
    container
        .bind("Greeting")?
        .to_constant_value("hello".to_string())
        .when_target_named("english");
    container
        .bind("Greeting")?
        .to_constant_value("hola".to_string())
        .when_target_named("spanish");
    container
        .bind("Greeting")?
        .to_constant_value("bonjour".to_string())
        .when_target_named("french");

    let all = container.get_all::<String>("Greeting")?;
    let all: Vec<&str> = all.iter().map(|s| s.as_str()).collect();
    assert_eq!(all, vec!["hello", "hola", "bonjour"]);

    let french = container.get_all_named::<String>("Greeting", "french")?;
    assert_eq!(french.len(), 1);
    assert_eq!(french[0].as_str(), "bonjour");
    Ok(())
}

struct Armory {
    weapons: Vec<Arc<String>>,
    shield: Option<Arc<String>>,
}

impl Injectable for Armory {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>()
            .constructor([Param::untyped(), Param::token("Shield")])
            .param_tag(0, Tag::multi_inject("Weapon"))
            .param_tag(1, Tag::optional())
            .build()
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        Ok(Armory {
            weapons: args.next_all()?,
            shield: args.next_optional()?,
        })
    }
}

#[test]
fn test_multi_inject_and_optional_parameters() -> Result<()> {
    let container = Container::new();
    container.bind("Weapon")?.to_constant_value("katana".to_string());
    container.bind("Weapon")?.to_constant_value("shuriken".to_string());
    container.bind("Armory")?.to::<Armory>();

    let armory = container.get::<Armory>("Armory")?;
    assert_eq!(armory.weapons.len(), 2);
    assert_eq!(armory.weapons[1].as_str(), "shuriken");
    assert!(armory.shield.is_none());

    container.bind("Shield")?.to_constant_value("buckler".to_string());
    let armory = container.get::<Armory>("Armory")?;
    assert_eq!(armory.shield.as_deref().map(String::as_str), Some("buckler"));
    Ok(())
}

#[derive(Default)]
struct Dojo {
    master: Option<Arc<String>>,
    opened: bool,
}

impl Injectable for Dojo {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>()
            .constructor([])
            .property("master", "Master")
            .build()
    }

    fn construct(_args: &mut Arguments) -> Result<Self> {
        Ok(Dojo::default())
    }

    fn inject_property(&mut self, name: &str, value: Resolved) -> Result<()> {
        match name {
            "master" => {
                self.master = Some(value.downcast("master")?);
                Ok(())
            }
            other => Err(InjectError::custom(format!("unknown property {}", other))),
        }
    }

    fn post_construct(&mut self) -> Result<()> {
        self.opened = self.master.is_some();
        Ok(())
    }
}

#[test]
fn test_property_injection_runs_before_post_construct() -> Result<()> {
    let container = Container::new();
    container.bind("Master")?.to_constant_value("Splinter".to_string());
    container.bind("Dojo")?.to::<Dojo>();

    let dojo = container.get::<Dojo>("Dojo")?;
    assert_eq!(dojo.master.as_deref().map(String::as_str), Some("Splinter"));
    assert!(dojo.opened);
    Ok(())
}

struct Alpha;
struct Beta;

impl Injectable for Alpha {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>()
            .constructor([Param::of::<Beta>()])
            .build()
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        args.next::<Beta>()?;
        Ok(Alpha)
    }
}

impl Injectable for Beta {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>()
            .constructor([Param::of::<Alpha>()])
            .build()
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        args.next::<Alpha>()?;
        Ok(Beta)
    }
}

#[test]
fn test_circular_dependency_reports_chain() -> Result<()> {
    let container = Container::new();
    container.bind(ServiceIdentifier::of::<Alpha>())?.to::<Alpha>();
    container.bind(ServiceIdentifier::of::<Beta>())?.to::<Beta>();

    let err = container
        .get::<Alpha>(ServiceIdentifier::of::<Alpha>())
        .err()
        .unwrap();
    assert!(err.is_circular_dependency());
    assert_eq!(err.to_string(), "Circular dependency found: Alpha --> Beta --> Alpha");
    Ok(())
}

#[test]
fn test_max_plan_depth() -> Result<()> {
    let options = ContainerOptions::new().with_max_plan_depth(1);
    let container = Container::with_options(options)?;
    bind_weapons(&container)?;
    container.bind(ServiceIdentifier::of::<Ninja>())?.to::<Ninja>();

    let err = container
        .get::<Ninja>(ServiceIdentifier::of::<Ninja>())
        .err()
        .unwrap();
    assert!(matches!(err, InjectError::MaxDepthExceeded { depth: 1, .. }));
    assert!(err.to_string().ends_with("Ninja --> Katana"));
    Ok(())
}

struct Warrior;

impl Injectable for Warrior {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>()
            .constructor([Param::of::<Katana>(), Param::of::<Shuriken>()])
            .build()
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        args.next::<Katana>()?;
        args.next::<Shuriken>()?;
        Ok(Warrior)
    }
}

struct Ronin;

impl Injectable for Ronin {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>()
            .constructor([Param::of::<Katana>()])
            .extends::<Warrior>()
            .build()
    }

    fn construct(args: &mut Arguments) -> Result<Self> {
        args.next::<Katana>()?;
        Ok(Ronin)
    }
}

#[test]
fn test_derived_type_with_fewer_dependencies_than_base() -> Result<()> {
    let container = Container::new();
    bind_weapons(&container)?;
    container.bind("Ronin")?.to::<Ronin>();

    let err = container.get::<Ronin>("Ronin").err().unwrap();
    assert_eq!(
        err.to_string(),
        "The number of constructor arguments in the derived class Ronin must be >= than the number of constructor arguments of its base class."
    );

    let relaxed = Container::with_options(ContainerOptions::new().with_skip_base_class_checks(true))?;
    bind_weapons(&relaxed)?;
    relaxed.bind("Ronin")?.to::<Ronin>();
    assert!(relaxed.get::<Ronin>("Ronin").is_ok());
    Ok(())
}

struct Untyped;

impl Injectable for Untyped {
    fn metadata() -> Result<TypeMetadata> {
        TypeMetadata::builder::<Self>()
            .constructor([Param::untyped()])
            .build()
    }

    fn construct(_args: &mut Arguments) -> Result<Self> {
        Ok(Untyped)
    }
}

#[test]
fn test_untyped_parameter_requires_inject_tag() -> Result<()> {
    let container = Container::new();
    container.bind("Untyped")?.to::<Untyped>();

    let err = container.get::<Untyped>("Untyped").err().unwrap();
    assert_eq!(
        err.to_string(),
        "Missing required inject or multi-inject metadata in: argument 0 in class Untyped."
    );
    Ok(())
}

#[test]
fn test_auto_bind_injectable_types() -> Result<()> {
    let strict = Container::new();
    strict.register::<Ninja>();
    assert!(strict
        .get::<Ninja>(ServiceIdentifier::of::<Ninja>())
        .err()
        .unwrap()
        .is_not_registered());

    let container = Container::with_options(ContainerOptions::new().with_auto_bind_injectable(true))?;
    container.register::<Ninja>();
    container.register::<Katana>();
    container.register::<Shuriken>();

    let ninja = container.get::<Ninja>(ServiceIdentifier::of::<Ninja>())?;
    assert!(Arc::strong_count(&ninja.katana) >= 1);
    assert!(container.is_bound(ServiceIdentifier::of::<Katana>()));
    Ok(())
}

#[test]
fn test_to_self_and_resolve() -> Result<()> {
    let container = Container::new();
    bind_weapons(&container)?;
    container.register::<Ninja>();

    let ninja = container.resolve::<Ninja>()?;
    assert!(Arc::strong_count(&ninja.shuriken) >= 1);
    assert!(!container.is_bound(ServiceIdentifier::of::<Ninja>()));

    container.bind(ServiceIdentifier::of::<Ninja>())?.to_self()?;
    assert!(container.get::<Ninja>(ServiceIdentifier::of::<Ninja>()).is_ok());
    Ok(())
}

fn double(value: u32) -> u32 {
    value * 2
}

type KatanaFactory = Arc<dyn Fn() -> Result<Arc<Katana>> + Send + Sync>;

#[test]
fn test_factories_functions_and_constructors() -> Result<()> {
    let container = Container::new();
    container.bind("Katana")?.to::<Katana>();
    container.bind("KatanaFactory")?.to_factory(|context: &Context| {
        let container = context.container().clone();
        let factory: KatanaFactory = Arc::new(move || container.get::<Katana>("Katana"));
        Ok(factory)
    });
    container.bind("AutoKatana")?.to_auto_factory("Katana");
    container.bind("KatanaType")?.to_constructor::<Katana>();
    container
        .bind("Double")?
        .to_function(double as fn(u32) -> u32);

    let factory = container.get::<KatanaFactory>("KatanaFactory")?;
    assert!((**factory)().is_ok());

    let auto = container.get::<AutoFactory>("AutoKatana")?;
    assert!(auto.create::<Katana>().is_ok());

    let newable = container.get::<Newable>("KatanaType")?;
    assert_eq!(newable.name(), "Katana");

    let double = container.get::<fn(u32) -> u32>("Double")?;
    assert_eq!((*double)(21), 42);
    Ok(())
}

#[test]
fn test_to_service_and_multi_bind() -> Result<()> {
    let container = Container::new();
    container
        .bind("Katana")?
        .to::<Katana>()
        .in_singleton_scope();
    multi_bind_to_service(&container, "Katana", ["Sword", "Blade"])?;

    let katana = container.get::<Katana>("Katana")?;
    let sword = container.get::<Katana>("Sword")?;
    let blade = container.get::<Katana>("Blade")?;
    assert!(Arc::ptr_eq(&katana, &sword));
    assert!(Arc::ptr_eq(&sword, &blade));
    Ok(())
}

#[test]
fn test_child_containers_and_merge() -> Result<()> {
    let parent = Container::new();
    parent.bind("Weapon")?.to::<Katana>();

    let child = parent.create_child();
    child.bind("Weapon")?.to::<Shuriken>();
    assert!(child.get::<Shuriken>("Weapon").is_ok());
    assert!(parent.get::<Katana>("Weapon").is_ok());

    let other = Container::new();
    other.bind("Armor")?.to_constant_value("plate".to_string());

    let merged = Container::merge(&parent, &other)?;
    assert!(merged.get::<Katana>("Weapon").is_ok());
    assert_eq!(merged.get::<String>("Armor")?.as_str(), "plate");

    merged.unbind("Weapon")?;
    assert!(parent.is_bound("Weapon"));
    Ok(())
}

#[test]
fn test_rebind_replaces_local_bindings() -> Result<()> {
    let container = Container::new();
    container.bind("Level")?.to_constant_value(1u8);
    container.bind("Level")?.to_constant_value(2u8);

    container.rebind("Level")?.to_constant_value(3u8);
    assert_eq!(*container.get::<u8>("Level")?, 3);

    container.unbind_all()?;
    assert!(!container.is_bound("Level"));
    Ok(())
}
