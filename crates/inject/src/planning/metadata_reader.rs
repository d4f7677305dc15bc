use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use crate::container::identifier::{ServiceIdentifier, TypeKey};
use crate::errors::Result;
use crate::planning::injectable::{Injectable, Newable};
use crate::planning::metadata::Tag;

/// Constructor metadata of one type
#[derive(Debug, Clone, Default)]
pub struct ConstructorMetadata {
    /// Inferred identifier per parameter position; `None` when the type was
    /// never declared injectable
    pub compiler_generated: Option<Vec<Option<ServiceIdentifier>>>,
    /// User-declared tags per parameter position
    pub user_generated: BTreeMap<usize, Vec<Tag>>,
}

/// Source of dependency metadata consulted by the planner
pub trait MetadataReader: Send + Sync {
    fn get_constructor_metadata(&self, key: &TypeKey) -> Result<ConstructorMetadata>;

    /// User-declared tags per injected property
    fn get_properties_metadata(&self, key: &TypeKey) -> Result<Vec<(String, Vec<Tag>)>>;

    /// Declared base type of `key`, if any
    fn get_base_type(&self, key: &TypeKey) -> Result<Option<TypeKey>>;
}

/// Table of constructible types known to a container.
///
/// Registering a type also registers its declared base chain. The table is
/// the default [`MetadataReader`] and is shared between a container and its
/// children.
#[derive(Clone, Default)]
pub struct TypeRegistry {
    entries: Arc<RwLock<HashMap<TypeKey, Newable>>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Injectable>(&self) {
        self.register_newable(Newable::of::<T>());
    }

    pub fn register_newable(&self, newable: Newable) {
        let inserted = {
            let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
            entries.insert(newable.type_key(), newable).is_none()
        };
        if !inserted {
            return;
        }

        // Invalid metadata is reported when the type is planned
        if let Ok(metadata) = newable.metadata() {
            if let Some(base) = metadata.base() {
                self.register_newable(*base);
            }
        }
    }

    pub fn newable(&self, key: &TypeKey) -> Option<Newable> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
    }

    pub fn is_registered(&self, key: &TypeKey) -> bool {
        self.newable(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// New registry holding the types of both inputs
    pub fn merged(first: &TypeRegistry, second: &TypeRegistry) -> TypeRegistry {
        let merged = TypeRegistry::new();
        for registry in [first, second] {
            let newables: Vec<Newable> = registry
                .entries
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .values()
                .copied()
                .collect();
            for newable in newables {
                merged.register_newable(newable);
            }
        }
        merged
    }
}

impl MetadataReader for TypeRegistry {
    fn get_constructor_metadata(&self, key: &TypeKey) -> Result<ConstructorMetadata> {
        let Some(newable) = self.newable(key) else {
            return Ok(ConstructorMetadata::default());
        };
        let metadata = newable.metadata()?;
        Ok(ConstructorMetadata {
            compiler_generated: metadata
                .parameters()
                .map(|params| params.iter().map(|p| p.identifier().cloned()).collect()),
            user_generated: metadata.parameter_tags().clone(),
        })
    }

    fn get_properties_metadata(&self, key: &TypeKey) -> Result<Vec<(String, Vec<Tag>)>> {
        match self.newable(key) {
            Some(newable) => Ok(newable.metadata()?.property_tags().to_vec()),
            None => Ok(Vec::new()),
        }
    }

    fn get_base_type(&self, key: &TypeKey) -> Result<Option<TypeKey>> {
        match self.newable(key) {
            Some(newable) => Ok(newable.metadata()?.base().map(Newable::type_key)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeRegistry").field("types", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planning::injectable::{Param, TypeMetadata};
    use crate::resolution::arguments::Arguments;

    struct Warrior;

    impl Injectable for Warrior {
        fn metadata() -> Result<TypeMetadata> {
            TypeMetadata::builder::<Self>()
                .constructor([Param::token("Weapon")])
                .build()
        }

        fn construct(_args: &mut Arguments) -> Result<Self> {
            Ok(Warrior)
        }
    }

    struct Ninja;

    impl Injectable for Ninja {
        fn metadata() -> Result<TypeMetadata> {
            TypeMetadata::builder::<Self>()
                .constructor([Param::token("Weapon")])
                .param_tag(0, Tag::named("katana"))
                .extends::<Warrior>()
                .build()
        }

        fn construct(_args: &mut Arguments) -> Result<Self> {
            Ok(Ninja)
        }
    }

    #[test]
    fn test_registering_type_registers_base_chain() {
        let registry = TypeRegistry::new();
        registry.register::<Ninja>();

        assert!(registry.is_registered(&TypeKey::of::<Ninja>()));
        assert!(registry.is_registered(&TypeKey::of::<Warrior>()));
        assert_eq!(
            registry.get_base_type(&TypeKey::of::<Ninja>()).unwrap(),
            Some(TypeKey::of::<Warrior>())
        );
    }

    #[test]
    fn test_unknown_type_has_no_compiler_metadata() {
        let registry = TypeRegistry::new();
        let metadata = registry.get_constructor_metadata(&TypeKey::of::<Ninja>()).unwrap();

        assert!(metadata.compiler_generated.is_none());
        assert!(metadata.user_generated.is_empty());
    }

    #[test]
    fn test_constructor_metadata_reports_declarations() {
        let registry = TypeRegistry::new();
        registry.register::<Ninja>();
        let metadata = registry.get_constructor_metadata(&TypeKey::of::<Ninja>()).unwrap();

        assert_eq!(
            metadata.compiler_generated,
            Some(vec![Some(ServiceIdentifier::token("Weapon"))])
        );
        assert_eq!(metadata.user_generated[&0], vec![Tag::named("katana")]);
    }
}
