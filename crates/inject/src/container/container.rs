use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::ContainerOptions;
use crate::container::binding::{Binding, Instance};
use crate::container::identifier::ServiceIdentifier;
use crate::container::lookup::Lookup;
use crate::container::middleware::{compose, Middleware, Next, NextArgs};
use crate::container::module::{AsyncContainerModule, ContainerModule, ModuleBinder, ModuleId};
use crate::container::snapshot::ContainerSnapshot;
use crate::container::syntax::BindingToSyntax;
use crate::errors::{InjectError, Result};
use crate::planning::injectable::Injectable;
use crate::planning::metadata::{Tag, TagKey, TagValue};
use crate::planning::metadata_reader::{MetadataReader, TypeRegistry};
use crate::planning::planner;
use crate::planning::request::Request;
use crate::planning::target::{Target, TargetType};
use crate::resolution::resolved::{downcast_instance, Resolved};
use crate::resolution::resolver;

pub(crate) struct ContainerInner {
    id: Uuid,
    options: ContainerOptions,
    parent: Option<Container>,
    bindings: RwLock<Lookup>,
    middleware: RwLock<Option<Next>>,
    applied_middleware: RwLock<Vec<Middleware>>,
    snapshots: RwLock<Vec<ContainerSnapshot>>,
    metadata_reader: RwLock<Arc<dyn MetadataReader>>,
    types: TypeRegistry,
}

/// Registry of bindings and entry point of every resolution.
///
/// `Container` is a cheap handle; clones share the same registry. Child
/// containers see their ancestors' bindings, never the other way round.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Create a container with default options
    pub fn new() -> Self {
        Self::build(ContainerOptions::default(), None, TypeRegistry::new())
    }

    /// Create a container with validated options
    pub fn with_options(options: ContainerOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self::build(options, None, TypeRegistry::new()))
    }

    fn build(options: ContainerOptions, parent: Option<Container>, types: TypeRegistry) -> Self {
        let reader: Arc<dyn MetadataReader> = Arc::new(types.clone());
        Self {
            inner: Arc::new(ContainerInner {
                id: Uuid::new_v4(),
                options,
                parent,
                bindings: RwLock::new(Lookup::new()),
                middleware: RwLock::new(None),
                applied_middleware: RwLock::new(Vec::new()),
                snapshots: RwLock::new(Vec::new()),
                metadata_reader: RwLock::new(reader),
                types,
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    pub fn parent(&self) -> Option<&Container> {
        self.inner.parent.as_ref()
    }

    /// Constructible types known to this container and its family
    pub fn types(&self) -> &TypeRegistry {
        &self.inner.types
    }

    /// Make `T` available to `to_self` and auto-binding
    pub fn register<T: Injectable>(&self) {
        self.inner.types.register::<T>();
    }

    pub(crate) fn downgrade(&self) -> Weak<ContainerInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn upgrade(inner: &Weak<ContainerInner>) -> Option<Container> {
        inner.upgrade().map(|inner| Container { inner })
    }

    fn read_bindings(&self) -> Result<RwLockReadGuard<'_, Lookup>> {
        self.inner
            .bindings
            .read()
            .map_err(|_| InjectError::lock("bindings"))
    }

    fn write_bindings(&self) -> Result<RwLockWriteGuard<'_, Lookup>> {
        self.inner
            .bindings
            .write()
            .map_err(|_| InjectError::lock("bindings"))
    }

    // Binding registration

    /// Start a new binding for `service_identifier`
    pub fn bind(&self, service_identifier: impl Into<ServiceIdentifier>) -> Result<BindingToSyntax> {
        let service_identifier = service_identifier.into();
        let binding = Arc::new(Binding::new(
            service_identifier.clone(),
            self.inner.options.default_scope,
        ));
        self.write_bindings()?
            .add(service_identifier.clone(), binding.clone())?;

        debug!(
            container = %self.inner.id,
            service = %service_identifier,
            scope = %binding.scope(),
            "binding registered"
        );
        Ok(BindingToSyntax::new(binding, self.clone()))
    }

    /// Drop the local bindings of `service_identifier`, then bind it again
    pub fn rebind(&self, service_identifier: impl Into<ServiceIdentifier>) -> Result<BindingToSyntax> {
        let service_identifier = service_identifier.into();
        if self.is_current_bound(service_identifier.clone()) {
            self.unbind(service_identifier.clone())?;
        }
        debug!(container = %self.inner.id, service = %service_identifier, "rebinding service");
        self.bind(service_identifier)
    }

    /// Remove every local binding of `service_identifier`, running the
    /// deactivation hook of cached singletons
    pub fn unbind(&self, service_identifier: impl Into<ServiceIdentifier>) -> Result<()> {
        let service_identifier = service_identifier.into();
        let removed = match self.write_bindings()?.remove(&service_identifier) {
            Ok(removed) => removed,
            Err(InjectError::KeyNotFound) => {
                return Err(InjectError::CannotUnbind {
                    service: service_identifier.to_string(),
                })
            }
            Err(err) => return Err(err),
        };

        debug!(
            container = %self.inner.id,
            service = %service_identifier,
            bindings = removed.len(),
            "service unbound"
        );
        removed.iter().try_for_each(|binding| binding.deactivate())
    }

    /// Remove every local binding
    pub fn unbind_all(&self) -> Result<()> {
        let removed = self.write_bindings()?.drain();
        debug!(container = %self.inner.id, bindings = removed.len(), "all services unbound");
        deactivate_all(&removed);
        Ok(())
    }

    // Existence checks

    /// Whether this container or an ancestor has a binding for the identifier
    pub fn is_bound(&self, service_identifier: impl Into<ServiceIdentifier>) -> bool {
        let service_identifier = service_identifier.into();
        self.is_current_bound(service_identifier.clone())
            || self
                .parent()
                .map(|parent| parent.is_bound(service_identifier))
                .unwrap_or(false)
    }

    /// Whether this container itself has a binding for the identifier
    pub fn is_current_bound(&self, service_identifier: impl Into<ServiceIdentifier>) -> bool {
        self.inner
            .bindings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .has_key(&service_identifier.into())
    }

    pub fn is_bound_named(
        &self,
        service_identifier: impl Into<ServiceIdentifier>,
        name: impl Into<TagValue>,
    ) -> bool {
        self.is_bound_tagged(service_identifier, TagKey::Named, name)
    }

    /// Whether any binding, here or in an ancestor, accepts a request
    /// tagged with `(key, value)`
    pub fn is_bound_tagged(
        &self,
        service_identifier: impl Into<ServiceIdentifier>,
        key: impl Into<TagKey>,
        value: impl Into<TagValue>,
    ) -> bool {
        let service_identifier = service_identifier.into();
        let tag = Tag::new(key, value);
        self.is_bound_with_tag(&service_identifier, &tag)
    }

    fn is_bound_with_tag(&self, service_identifier: &ServiceIdentifier, tag: &Tag) -> bool {
        let bindings: Vec<Arc<Binding>> = {
            let lookup = self
                .inner
                .bindings
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            lookup
                .get(service_identifier)
                .map(<[Arc<Binding>]>::to_vec)
                .unwrap_or_default()
        };

        let bound = if bindings.is_empty() {
            false
        } else {
            let target = Target::new(TargetType::Variable, "", service_identifier.clone())
                .with_tag(tag.clone());
            let request = Request::root(service_identifier.clone(), Vec::new(), target);
            bindings
                .iter()
                .any(|binding| binding.constraint().matches(&request))
        };

        bound
            || self
                .parent()
                .map(|parent| parent.is_bound_with_tag(service_identifier, tag))
                .unwrap_or(false)
    }

    /// Candidate bindings for planning: local ones if any, otherwise the
    /// nearest ancestor's
    pub(crate) fn get_bindings(&self, service_identifier: &ServiceIdentifier) -> Result<Vec<Arc<Binding>>> {
        {
            let lookup = self.read_bindings()?;
            if lookup.has_key(service_identifier) {
                return Ok(lookup.get(service_identifier)?.to_vec());
            }
        }
        match self.parent() {
            Some(parent) => parent.get_bindings(service_identifier),
            None => Ok(Vec::new()),
        }
    }

    // Resolution

    /// Resolve one value and downcast it to `T`
    pub fn get<T: Any + Send + Sync>(&self, service_identifier: impl Into<ServiceIdentifier>) -> Result<Arc<T>> {
        let service_identifier = service_identifier.into();
        let instance = self.get_instance(service_identifier.clone())?;
        downcast_instance(&service_identifier.to_string(), instance)
    }

    pub fn get_named<T: Any + Send + Sync>(
        &self,
        service_identifier: impl Into<ServiceIdentifier>,
        name: impl Into<TagValue>,
    ) -> Result<Arc<T>> {
        self.get_tagged(service_identifier, TagKey::Named, name)
    }

    pub fn get_tagged<T: Any + Send + Sync>(
        &self,
        service_identifier: impl Into<ServiceIdentifier>,
        key: impl Into<TagKey>,
        value: impl Into<TagValue>,
    ) -> Result<Arc<T>> {
        let mut args = NextArgs::new(service_identifier.into());
        args.tag = Some(Tag::new(key, value));
        let service = args.service_identifier.to_string();
        self.get_with(args)?.downcast(&service)
    }

    /// Resolve one value without downcasting it
    pub fn get_instance(&self, service_identifier: impl Into<ServiceIdentifier>) -> Result<Instance> {
        let args = NextArgs::new(service_identifier.into());
        let service = args.service_identifier.to_string();
        self.get_with(args)?.into_instance(&service)
    }

    /// Resolve every binding of the identifier, in declaration order
    pub fn get_all<T: Any + Send + Sync>(
        &self,
        service_identifier: impl Into<ServiceIdentifier>,
    ) -> Result<Vec<Arc<T>>> {
        let service_identifier = service_identifier.into();
        let service = service_identifier.to_string();
        self.get_all_resolved(service_identifier)?.downcast_all(&service)
    }

    pub fn get_all_instances(&self, service_identifier: impl Into<ServiceIdentifier>) -> Result<Vec<Instance>> {
        Ok(self.get_all_resolved(service_identifier.into())?.into_instances())
    }

    fn get_all_resolved(&self, service_identifier: ServiceIdentifier) -> Result<Resolved> {
        let mut args = NextArgs::new(service_identifier);
        args.avoid_constraints = true;
        args.is_multi_inject = true;
        self.get_with(args)
    }

    pub fn get_all_named<T: Any + Send + Sync>(
        &self,
        service_identifier: impl Into<ServiceIdentifier>,
        name: impl Into<TagValue>,
    ) -> Result<Vec<Arc<T>>> {
        self.get_all_tagged(service_identifier, TagKey::Named, name)
    }

    pub fn get_all_tagged<T: Any + Send + Sync>(
        &self,
        service_identifier: impl Into<ServiceIdentifier>,
        key: impl Into<TagKey>,
        value: impl Into<TagValue>,
    ) -> Result<Vec<Arc<T>>> {
        let mut args = NextArgs::new(service_identifier.into());
        args.is_multi_inject = true;
        args.tag = Some(Tag::new(key, value));
        let service = args.service_identifier.to_string();
        self.get_with(args)?.downcast_all(&service)
    }

    /// Construct `T` without registering it here, using a throwaway child
    /// container that inherits this container's bindings and middleware
    pub fn resolve<T: Injectable>(&self) -> Result<Arc<T>> {
        let child = self.create_child();
        child.bind(ServiceIdentifier::of::<T>())?.to::<T>();

        let applied = self
            .inner
            .applied_middleware
            .read()
            .map_err(|_| InjectError::lock("middleware"))?
            .clone();
        if !applied.is_empty() {
            child.apply_middleware(applied)?;
        }
        child.get::<T>(ServiceIdentifier::of::<T>())
    }

    /// Single entry point of every `get` variant
    fn get_with(&self, args: NextArgs) -> Result<Resolved> {
        let middleware = self
            .inner
            .middleware
            .read()
            .map_err(|_| InjectError::lock("middleware"))?
            .clone();

        match middleware {
            Some(chain) => chain(self, args)?.ok_or(InjectError::InvalidMiddlewareReturn),
            None => self.plan_and_resolve(args),
        }
    }

    fn plan_and_resolve(&self, args: NextArgs) -> Result<Resolved> {
        let reader = self
            .inner
            .metadata_reader
            .read()
            .map_err(|_| InjectError::lock("metadata reader"))?
            .clone();

        let context = planner::plan(reader.as_ref(), self, args.plan_options())?;
        let context = (args.context_interceptor)(context);
        resolver::resolve(&context)
    }

    // Middleware and metadata

    /// Wrap the resolution pipeline; the last middleware given runs first
    pub fn apply_middleware(&self, middlewares: impl IntoIterator<Item = Middleware>) -> Result<()> {
        let middlewares: Vec<Middleware> = middlewares.into_iter().collect();
        let mut current = self
            .inner
            .middleware
            .write()
            .map_err(|_| InjectError::lock("middleware"))?;

        let initial: Next = match current.clone() {
            Some(existing) => existing,
            None => Arc::new(|container: &Container, args: NextArgs| -> Result<Option<Resolved>> {
                container.plan_and_resolve(args).map(Some)
            }),
        };
        *current = Some(compose(initial, middlewares.iter().cloned()));

        self.inner
            .applied_middleware
            .write()
            .map_err(|_| InjectError::lock("middleware"))?
            .extend(middlewares.iter().cloned());

        debug!(container = %self.inner.id, count = middlewares.len(), "middleware applied");
        Ok(())
    }

    /// Replace the source of constructor and property metadata
    pub fn apply_custom_metadata_reader(&self, reader: Arc<dyn MetadataReader>) -> Result<()> {
        *self
            .inner
            .metadata_reader
            .write()
            .map_err(|_| InjectError::lock("metadata reader"))? = reader;
        debug!(container = %self.inner.id, "custom metadata reader applied");
        Ok(())
    }

    // Modules

    /// Run each module's registry, stamping its bindings with the module id
    pub fn load(&self, modules: &[&ContainerModule]) -> Result<()> {
        for module in modules {
            let binder = ModuleBinder::new(self, module.id());
            module.register(&binder)?;
            debug!(
                container = %self.inner.id,
                module = %module.id(),
                name = module.name().unwrap_or("anonymous"),
                "module loaded"
            );
        }
        Ok(())
    }

    pub async fn load_async(&self, modules: &[&dyn AsyncContainerModule]) -> Result<()> {
        for module in modules {
            let binder = ModuleBinder::new(self, module.id());
            module.registry(&binder).await?;
            debug!(container = %self.inner.id, module = %module.id(), "async module loaded");
        }
        Ok(())
    }

    /// Remove every binding registered by the given modules
    pub fn unload(&self, module_ids: &[ModuleId]) -> Result<()> {
        let removed = self.write_bindings()?.remove_by_condition(|binding| {
            binding
                .module_id()
                .map(|id| module_ids.contains(&id))
                .unwrap_or(false)
        });

        debug!(
            container = %self.inner.id,
            modules = module_ids.len(),
            bindings = removed.len(),
            "modules unloaded"
        );
        deactivate_all(&removed);
        Ok(())
    }

    // Snapshots

    /// Save the current bindings and middleware
    pub fn snapshot(&self) -> Result<()> {
        let bindings = self.read_bindings()?.clone();
        let middleware = self
            .inner
            .middleware
            .read()
            .map_err(|_| InjectError::lock("middleware"))?
            .clone();

        let mut snapshots = self
            .inner
            .snapshots
            .write()
            .map_err(|_| InjectError::lock("snapshots"))?;
        snapshots.push(ContainerSnapshot::of(bindings, middleware));
        debug!(container = %self.inner.id, depth = snapshots.len(), "snapshot taken");
        Ok(())
    }

    /// Return to the most recent snapshot
    pub fn restore(&self) -> Result<()> {
        let snapshot = self
            .inner
            .snapshots
            .write()
            .map_err(|_| InjectError::lock("snapshots"))?
            .pop()
            .ok_or(InjectError::NoMoreSnapshotsAvailable)?;

        *self.write_bindings()? = snapshot.bindings;
        *self
            .inner
            .middleware
            .write()
            .map_err(|_| InjectError::lock("middleware"))? = snapshot.middleware;
        debug!(container = %self.inner.id, "snapshot restored");
        Ok(())
    }

    // Hierarchy

    /// Child container with this container's options
    pub fn create_child(&self) -> Container {
        let child = Self::build(
            self.inner.options.clone(),
            Some(self.clone()),
            self.inner.types.clone(),
        );
        debug!(parent = %self.inner.id, child = %child.id(), "child container created");
        child
    }

    pub fn create_child_with_options(&self, options: ContainerOptions) -> Result<Container> {
        options.validate()?;
        let child = Self::build(options, Some(self.clone()), self.inner.types.clone());
        debug!(parent = %self.inner.id, child = %child.id(), "child container created");
        Ok(child)
    }

    /// New container holding a clone of every binding of `first` and `second`
    pub fn merge(first: &Container, second: &Container) -> Result<Container> {
        let merged = Self::build(
            ContainerOptions::default(),
            None,
            TypeRegistry::merged(first.types(), second.types()),
        );

        {
            let mut target = merged.write_bindings()?;
            for source in [first, second] {
                let lookup = source.read_bindings()?;
                let mut result = Ok(());
                lookup.traverse(|service_identifier, bindings| {
                    for binding in bindings {
                        if result.is_ok() {
                            result = target.add(
                                service_identifier.clone(),
                                Arc::new(binding.clone_binding()),
                            );
                        }
                    }
                });
                result?;
            }
        }

        debug!(
            first = %first.id(),
            second = %second.id(),
            merged = %merged.id(),
            "containers merged"
        );
        Ok(merged)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let services = self
            .inner
            .bindings
            .read()
            .map(|lookup| lookup.len())
            .unwrap_or_default();
        f.debug_struct("Container")
            .field("id", &self.inner.id)
            .field("parent", &self.inner.parent.as_ref().map(Container::id))
            .field("services", &services)
            .field("options", &self.inner.options)
            .finish()
    }
}

/// Deactivate dropped bindings, logging failures instead of stopping
fn deactivate_all(bindings: &[Arc<Binding>]) {
    for binding in bindings {
        if let Err(err) = binding.deactivate() {
            warn!(
                service = %binding.service_identifier(),
                error = %err,
                "deactivation handler failed"
            );
        }
    }
}
