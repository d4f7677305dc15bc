use std::any::Any;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::container::constraints::Constraint;
use crate::container::identifier::{ServiceIdentifier, TypeKey};
use crate::container::module::ModuleId;
use crate::container::provider::Provider;
use crate::container::scope::BindingScope;
use crate::errors::Result;
use crate::planning::context::Context;
use crate::planning::injectable::Newable;

/// Type-erased value produced or held by a binding
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Callable receiving the resolution context and producing a value
pub type DynamicValueFn = Arc<dyn Fn(&Context) -> Result<Instance> + Send + Sync>;

/// Callable returning the asynchronous creation entry point of a provider binding
pub type ProviderFn = Arc<dyn Fn(&Context) -> Result<Provider> + Send + Sync>;

/// Hook invoked on every produced instance; its return value replaces the instance
pub type ActivationFn = Arc<dyn Fn(&Context, Instance) -> Result<Instance> + Send + Sync>;

/// Hook invoked with a cached singleton when its binding is dropped
pub type DeactivationFn = Arc<dyn Fn(&Instance) -> Result<()> + Send + Sync>;

/// How a binding satisfies its service identifier
#[derive(Clone)]
pub enum BindingKind {
    /// Declared but never given an implementation
    Invalid,
    /// Construct the type with its dependencies injected
    Instance(Newable),
    ConstantValue(Instance),
    /// A callable stored and returned as-is
    Function(Instance),
    DynamicValue(DynamicValueFn),
    Factory(DynamicValueFn),
    Provider(ProviderFn),
    /// Return the constructible type handle itself
    Constructor(Newable),
}

impl BindingKind {
    pub fn name(&self) -> &'static str {
        match self {
            BindingKind::Invalid => "Invalid",
            BindingKind::Instance(_) => "Instance",
            BindingKind::ConstantValue(_) => "ConstantValue",
            BindingKind::Function(_) => "Function",
            BindingKind::DynamicValue(_) => "DynamicValue",
            BindingKind::Factory(_) => "Factory",
            BindingKind::Provider(_) => "Provider",
            BindingKind::Constructor(_) => "Constructor",
        }
    }

    /// Constructible type referenced by `Instance` and `Constructor` kinds
    pub fn implementation_type(&self) -> Option<&Newable> {
        match self {
            BindingKind::Instance(newable) | BindingKind::Constructor(newable) => Some(newable),
            _ => None,
        }
    }
}

impl fmt::Debug for BindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.implementation_type() {
            Some(newable) => write!(f, "{}({})", self.name(), newable.name()),
            None => f.write_str(self.name()),
        }
    }
}

struct BindingState {
    scope: BindingScope,
    kind: BindingKind,
    cache: Option<Instance>,
    activated: bool,
    constraint: Constraint,
    on_activation: Option<ActivationFn>,
    on_deactivation: Option<DeactivationFn>,
    module_id: Option<ModuleId>,
}

/// One registered way of satisfying a service identifier.
///
/// Bindings are shared as `Arc<Binding>` between the registry, planned
/// requests and the fluent syntax, which mutates them through interior
/// mutability after registration.
pub struct Binding {
    id: Uuid,
    service_identifier: ServiceIdentifier,
    state: RwLock<BindingState>,
}

impl Binding {
    pub fn new(service_identifier: ServiceIdentifier, scope: BindingScope) -> Self {
        Self {
            id: Uuid::new_v4(),
            service_identifier,
            state: RwLock::new(BindingState {
                scope,
                kind: BindingKind::Invalid,
                cache: None,
                activated: false,
                constraint: Constraint::always(),
                on_activation: None,
                on_deactivation: None,
                module_id: None,
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BindingState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BindingState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn service_identifier(&self) -> &ServiceIdentifier {
        &self.service_identifier
    }

    pub fn scope(&self) -> BindingScope {
        self.read().scope
    }

    pub fn set_scope(&self, scope: BindingScope) {
        self.write().scope = scope;
    }

    pub fn kind(&self) -> BindingKind {
        self.read().kind.clone()
    }

    /// Replace the implementation kind, discarding any cached singleton
    pub fn set_kind(&self, kind: BindingKind) {
        let mut state = self.write();
        state.cache = None;
        state.activated = false;
        state.kind = kind;
    }

    pub fn implementation_type(&self) -> Option<TypeKey> {
        self.read()
            .kind
            .implementation_type()
            .map(|newable| newable.type_key())
    }

    pub fn constraint(&self) -> Constraint {
        self.read().constraint.clone()
    }

    pub fn set_constraint(&self, constraint: Constraint) {
        self.write().constraint = constraint;
    }

    pub fn on_activation(&self) -> Option<ActivationFn> {
        self.read().on_activation.clone()
    }

    pub fn set_on_activation(&self, handler: ActivationFn) {
        self.write().on_activation = Some(handler);
    }

    pub fn on_deactivation(&self) -> Option<DeactivationFn> {
        self.read().on_deactivation.clone()
    }

    pub fn set_on_deactivation(&self, handler: DeactivationFn) {
        self.write().on_deactivation = Some(handler);
    }

    pub fn module_id(&self) -> Option<ModuleId> {
        self.read().module_id
    }

    pub fn set_module_id(&self, module_id: ModuleId) {
        self.write().module_id = Some(module_id);
    }

    pub fn is_activated(&self) -> bool {
        self.read().activated
    }

    /// Mark the binding as having produced a value at least once
    pub(crate) fn mark_activated(&self) {
        self.write().activated = true;
    }

    /// Whether a singleton value is cached on this binding
    pub fn is_cached(&self) -> bool {
        self.read().cache.is_some()
    }

    /// Cached singleton value, available once the binding is activated
    pub fn cached(&self) -> Option<Instance> {
        let state = self.read();
        if state.activated {
            state.cache.clone()
        } else {
            None
        }
    }

    /// Store a freshly produced singleton.
    ///
    /// If another resolution cached a value first, that value wins and is
    /// returned instead of `instance`.
    pub(crate) fn cache_singleton(&self, instance: Instance) -> Instance {
        let mut state = self.write();
        if let (true, Some(existing)) = (state.activated, state.cache.as_ref()) {
            return existing.clone();
        }
        state.cache = Some(instance.clone());
        state.activated = true;
        instance
    }

    /// Drop the cached singleton and run the deactivation hook on it
    pub fn deactivate(&self) -> Result<()> {
        let (cached, handler) = {
            let mut state = self.write();
            if !state.scope.is_singleton() {
                return Ok(());
            }
            state.activated = false;
            (state.cache.take(), state.on_deactivation.clone())
        };

        match (cached, handler) {
            (Some(instance), Some(handler)) => handler(&instance),
            _ => Ok(()),
        }
    }

    /// Structural copy with a fresh identity.
    ///
    /// The singleton cache and activation flag carry over only for
    /// singleton-scoped bindings.
    pub fn clone_binding(&self) -> Binding {
        let state = self.read();
        let singleton = state.scope.is_singleton();
        Binding {
            id: Uuid::new_v4(),
            service_identifier: self.service_identifier.clone(),
            state: RwLock::new(BindingState {
                scope: state.scope,
                kind: state.kind.clone(),
                cache: if singleton { state.cache.clone() } else { None },
                activated: singleton && state.activated,
                constraint: state.constraint.clone(),
                on_activation: state.on_activation.clone(),
                on_deactivation: state.on_deactivation.clone(),
                module_id: state.module_id,
            }),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("Binding")
            .field("id", &self.id)
            .field("service_identifier", &self.service_identifier)
            .field("scope", &state.scope)
            .field("kind", &state.kind)
            .field("activated", &state.activated)
            .finish()
    }
}
