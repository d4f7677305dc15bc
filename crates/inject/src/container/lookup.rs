use std::collections::HashMap;
use std::sync::Arc;

use crate::container::binding::Binding;
use crate::container::identifier::ServiceIdentifier;
use crate::errors::{InjectError, Result};

/// Multi-map from service identifier to its bindings in registration order
#[derive(Debug, Default)]
pub struct Lookup {
    map: HashMap<ServiceIdentifier, Vec<Arc<Binding>>>,
}

impl Lookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding under `service_identifier`
    pub fn add(&mut self, service_identifier: ServiceIdentifier, binding: Arc<Binding>) -> Result<()> {
        if service_identifier.is_null() {
            return Err(InjectError::NullArgument);
        }
        self.map.entry(service_identifier).or_default().push(binding);
        Ok(())
    }

    pub fn get(&self, service_identifier: &ServiceIdentifier) -> Result<&[Arc<Binding>]> {
        if service_identifier.is_null() {
            return Err(InjectError::NullArgument);
        }
        self.map
            .get(service_identifier)
            .map(Vec::as_slice)
            .ok_or(InjectError::KeyNotFound)
    }

    /// Remove every binding of `service_identifier`, returning them
    pub fn remove(&mut self, service_identifier: &ServiceIdentifier) -> Result<Vec<Arc<Binding>>> {
        if service_identifier.is_null() {
            return Err(InjectError::NullArgument);
        }
        self.map
            .remove(service_identifier)
            .ok_or(InjectError::KeyNotFound)
    }

    /// Remove the bindings matching `condition`, dropping keys left empty
    pub fn remove_by_condition<F>(&mut self, condition: F) -> Vec<Arc<Binding>>
    where
        F: Fn(&Binding) -> bool,
    {
        let mut removed = Vec::new();
        self.map.retain(|_, bindings| {
            let (dropped, kept): (Vec<_>, Vec<_>) = bindings
                .drain(..)
                .partition(|binding| condition(binding.as_ref()));
            removed.extend(dropped);
            *bindings = kept;
            !bindings.is_empty()
        });
        removed
    }

    pub fn has_key(&self, service_identifier: &ServiceIdentifier) -> bool {
        self.map.contains_key(service_identifier)
    }

    /// Visit every identifier with its bindings
    pub fn traverse<F>(&self, mut visit: F)
    where
        F: FnMut(&ServiceIdentifier, &[Arc<Binding>]),
    {
        for (key, bindings) in &self.map {
            visit(key, bindings);
        }
    }

    /// Remove and return every binding
    pub fn drain(&mut self) -> Vec<Arc<Binding>> {
        self.map.drain().flat_map(|(_, bindings)| bindings).collect()
    }

    /// Number of registered identifiers
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Clone for Lookup {
    /// Copy the map structure, giving every binding a fresh clone so that
    /// later changes to the original do not leak into the copy
    fn clone(&self) -> Self {
        let map = self
            .map
            .iter()
            .map(|(key, bindings)| {
                let cloned = bindings
                    .iter()
                    .map(|binding| Arc::new(binding.clone_binding()))
                    .collect();
                (key.clone(), cloned)
            })
            .collect();
        Self { map }
    }
}
