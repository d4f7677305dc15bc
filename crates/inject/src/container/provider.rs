use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};

use crate::container::binding::Instance;
use crate::container::container::{Container, ContainerInner};
use crate::container::identifier::ServiceIdentifier;
use crate::errors::{InjectError, Result};
use crate::resolution::resolved::downcast_instance;

/// Boxed future returned by a provider's creation entry point
pub type ProviderFuture = Pin<Box<dyn Future<Output = Result<Instance>> + Send>>;

/// Asynchronous creation entry point produced by a provider binding.
///
/// The resolver hands the provider out unevaluated; the caller awaits
/// [`Provider::provide`] to create the value.
#[derive(Clone)]
pub struct Provider {
    create: Arc<dyn Fn() -> ProviderFuture + Send + Sync>,
}

impl Provider {
    pub fn new<F, Fut>(create: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Instance>> + Send + 'static,
    {
        Self {
            create: Arc::new(move || Box::pin(create()) as ProviderFuture),
        }
    }

    /// Run the creation entry point
    pub async fn provide(&self) -> Result<Instance> {
        (self.create)().await
    }

    /// Run the creation entry point and downcast the produced value
    pub async fn provide_as<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        let instance = self.provide().await?;
        downcast_instance::<T>("provider", instance)
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Provider")
    }
}

/// Factory bound to a container and a service identifier.
///
/// Produced by `to_auto_factory`. Holds a weak handle so a cached factory
/// never keeps its container alive.
#[derive(Clone)]
pub struct AutoFactory {
    container: Weak<ContainerInner>,
    service_identifier: ServiceIdentifier,
}

impl AutoFactory {
    pub(crate) fn new(container: &Container, service_identifier: ServiceIdentifier) -> Self {
        Self {
            container: container.downgrade(),
            service_identifier,
        }
    }

    pub fn service_identifier(&self) -> &ServiceIdentifier {
        &self.service_identifier
    }

    /// Resolve the bound identifier as an untyped instance
    pub fn create_instance(&self) -> Result<Instance> {
        let container = Container::upgrade(&self.container).ok_or_else(|| {
            InjectError::custom(format!(
                "Container backing the auto factory for {} was dropped",
                self.service_identifier
            ))
        })?;
        container.get_instance(self.service_identifier.clone())
    }

    /// Resolve the bound identifier and downcast it
    pub fn create<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        let instance = self.create_instance()?;
        downcast_instance::<T>(&self.service_identifier.to_string(), instance)
    }
}

impl fmt::Debug for AutoFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoFactory")
            .field("service_identifier", &self.service_identifier)
            .finish()
    }
}
