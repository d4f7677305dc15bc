use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::container::identifier::ServiceIdentifier;
use crate::container::syntax::{BindingSyntax, BindingToSyntax};
use crate::container::Container;
use crate::errors::Result;

/// Unique identifier stamped on every binding a module registers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(Uuid);

impl ModuleId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ModuleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Registration helpers handed to a module while it is loaded
pub struct ModuleBinder<'a> {
    container: &'a Container,
    module_id: ModuleId,
}

impl<'a> ModuleBinder<'a> {
    pub(crate) fn new(container: &'a Container, module_id: ModuleId) -> Self {
        Self {
            container,
            module_id,
        }
    }

    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    /// Bind an identifier, tagging the binding with this module's id
    pub fn bind(&self, service_identifier: impl Into<ServiceIdentifier>) -> Result<BindingToSyntax> {
        let syntax = self.container.bind(service_identifier)?;
        syntax.binding().set_module_id(self.module_id);
        Ok(syntax)
    }

    pub fn unbind(&self, service_identifier: impl Into<ServiceIdentifier>) -> Result<()> {
        self.container.unbind(service_identifier)
    }

    pub fn is_bound(&self, service_identifier: impl Into<ServiceIdentifier>) -> bool {
        self.container.is_bound(service_identifier)
    }

    pub fn rebind(&self, service_identifier: impl Into<ServiceIdentifier>) -> Result<BindingToSyntax> {
        let syntax = self.container.rebind(service_identifier)?;
        syntax.binding().set_module_id(self.module_id);
        Ok(syntax)
    }
}

type Registry = Arc<dyn Fn(&ModuleBinder<'_>) -> Result<()> + Send + Sync>;

/// A group of bindings loaded and unloaded together
#[derive(Clone)]
pub struct ContainerModule {
    id: ModuleId,
    name: Option<String>,
    registry: Registry,
}

impl ContainerModule {
    pub fn new<F>(registry: F) -> Self
    where
        F: Fn(&ModuleBinder<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            id: ModuleId::new(),
            name: None,
            registry: Arc::new(registry),
        }
    }

    pub fn named<F>(name: impl Into<String>, registry: F) -> Self
    where
        F: Fn(&ModuleBinder<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let mut module = Self::new(registry);
        module.name = Some(name.into());
        module
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn register(&self, binder: &ModuleBinder<'_>) -> Result<()> {
        (self.registry)(binder)
    }
}

impl fmt::Debug for ContainerModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerModule")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// A module whose registration may await
#[async_trait]
pub trait AsyncContainerModule: Send + Sync {
    fn id(&self) -> ModuleId;

    async fn registry(&self, binder: &ModuleBinder<'_>) -> Result<()>;
}
