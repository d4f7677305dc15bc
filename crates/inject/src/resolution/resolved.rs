use std::any::Any;
use std::sync::Arc;

use crate::container::binding::Instance;
use crate::errors::{InjectError, Result};

/// Outcome of resolving one request
#[derive(Debug, Clone)]
pub enum Resolved {
    Value(Instance),
    /// Result of a multi-inject target, in binding declaration order
    Many(Vec<Instance>),
    /// An optional target with no usable binding
    Missing,
}

impl Resolved {
    pub fn is_missing(&self) -> bool {
        matches!(self, Resolved::Missing)
    }

    /// Single instance, failing for array and missing results
    pub fn into_instance(self, service: &str) -> Result<Instance> {
        match self {
            Resolved::Value(instance) => Ok(instance),
            Resolved::Many(_) => Err(InjectError::TypeMismatch {
                service: service.to_string(),
                expected: "a single instance",
            }),
            Resolved::Missing => Err(InjectError::TypeMismatch {
                service: service.to_string(),
                expected: "a resolved instance",
            }),
        }
    }

    /// All instances; a single value becomes a one-element list
    pub fn into_instances(self) -> Vec<Instance> {
        match self {
            Resolved::Value(instance) => vec![instance],
            Resolved::Many(instances) => instances,
            Resolved::Missing => Vec::new(),
        }
    }

    pub fn downcast<T: Any + Send + Sync>(self, service: &str) -> Result<Arc<T>> {
        downcast_instance(service, self.into_instance(service)?)
    }

    pub fn downcast_optional<T: Any + Send + Sync>(self, service: &str) -> Result<Option<Arc<T>>> {
        match self {
            Resolved::Missing => Ok(None),
            other => other.downcast(service).map(Some),
        }
    }

    pub fn downcast_all<T: Any + Send + Sync>(self, service: &str) -> Result<Vec<Arc<T>>> {
        self.into_instances()
            .into_iter()
            .map(|instance| downcast_instance(service, instance))
            .collect()
    }
}

impl From<Instance> for Resolved {
    fn from(instance: Instance) -> Self {
        Resolved::Value(instance)
    }
}

/// Downcast a type-erased instance, reporting the requested type on failure
pub fn downcast_instance<T: Any + Send + Sync>(service: &str, instance: Instance) -> Result<Arc<T>> {
    instance
        .downcast::<T>()
        .map_err(|_| InjectError::TypeMismatch {
            service: service.to_string(),
            expected: std::any::type_name::<T>(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_downcast_variants() {
        let value = Resolved::Value(Arc::new(5i32));
        assert_eq!(*value.clone().downcast::<i32>("n").unwrap(), 5);
        assert!(value.downcast::<u8>("n").is_err());

        let many = Resolved::Many(vec![Arc::new(1i32), Arc::new(2i32)]);
        let all: Vec<i32> = many.downcast_all::<i32>("n").unwrap().iter().map(|v| **v).collect();
        assert_eq!(all, vec![1, 2]);

        assert!(Resolved::Missing.downcast_optional::<i32>("n").unwrap().is_none());
        assert!(Resolved::Missing.downcast::<i32>("n").is_err());
    }
}
