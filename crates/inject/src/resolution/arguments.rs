use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::container::binding::Instance;
use crate::errors::{InjectError, Result};
use crate::resolution::resolved::Resolved;

/// Resolved constructor arguments, consumed in parameter order
#[derive(Debug)]
pub struct Arguments {
    type_name: &'static str,
    values: VecDeque<Resolved>,
    position: usize,
}

impl Arguments {
    pub fn new(type_name: &'static str, values: Vec<Resolved>) -> Self {
        Self {
            type_name,
            values: values.into(),
            position: 0,
        }
    }

    /// Number of arguments not consumed yet
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Next argument as resolved by the container
    pub fn next_resolved(&mut self) -> Result<Resolved> {
        let value = self.values.pop_front().ok_or_else(|| {
            InjectError::custom(format!(
                "Constructor of {} requested argument {} but only {} were resolved",
                self.type_name,
                self.position,
                self.position
            ))
        })?;
        self.position += 1;
        Ok(value)
    }

    pub fn next_instance(&mut self) -> Result<Instance> {
        let service = self.describe_next();
        self.next_resolved()?.into_instance(&service)
    }

    /// Next argument downcast to `T`
    pub fn next<T: Any + Send + Sync>(&mut self) -> Result<Arc<T>> {
        let service = self.describe_next();
        self.next_resolved()?.downcast(&service)
    }

    /// Next argument of an optional parameter
    pub fn next_optional<T: Any + Send + Sync>(&mut self) -> Result<Option<Arc<T>>> {
        let service = self.describe_next();
        self.next_resolved()?.downcast_optional(&service)
    }

    /// Next argument of a multi-inject parameter
    pub fn next_all<T: Any + Send + Sync>(&mut self) -> Result<Vec<Arc<T>>> {
        let service = self.describe_next();
        self.next_resolved()?.downcast_all(&service)
    }

    fn describe_next(&self) -> String {
        format!("argument {} of {}", self.position, self.type_name)
    }
}
