use std::any::Any;
use std::sync::Arc;

use crate::container::binding::{Binding, BindingKind, Instance};
use crate::container::constraints::{Constraint, TypeOrIdentifier};
use crate::container::identifier::ServiceIdentifier;
use crate::container::provider::{AutoFactory, Provider};
use crate::container::scope::BindingScope;
use crate::container::Container;
use crate::errors::{InjectError, Result};
use crate::planning::context::Context;
use crate::planning::injectable::{Injectable, Newable};
use crate::planning::metadata::{TagKey, TagValue};
use crate::planning::request::Request;

/// Access to the binding a fluent syntax step configures
pub trait BindingSyntax {
    fn binding(&self) -> &Arc<Binding>;
}

/// Scope selection
pub trait InSyntax: BindingSyntax {
    /// Resolve once and reuse the value for the container's lifetime
    fn in_singleton_scope(&self) -> BindingWhenOnSyntax {
        self.in_scope(BindingScope::Singleton)
    }

    /// Resolve again on every request
    fn in_transient_scope(&self) -> BindingWhenOnSyntax {
        self.in_scope(BindingScope::Transient)
    }

    /// Share one value within a single `get`/`get_all` call
    fn in_request_scope(&self) -> BindingWhenOnSyntax {
        self.in_scope(BindingScope::Request)
    }

    fn in_scope(&self, scope: BindingScope) -> BindingWhenOnSyntax {
        self.binding().set_scope(scope);
        BindingWhenOnSyntax::new(self.binding().clone())
    }
}

/// Contextual constraints
pub trait WhenSyntax: BindingSyntax {
    /// Restrict the binding with an arbitrary predicate
    fn when<F>(&self, predicate: F) -> BindingOnSyntax
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        self.when_constraint(Constraint::new(predicate))
    }

    /// Restrict the binding with a prebuilt constraint
    fn when_constraint(&self, constraint: Constraint) -> BindingOnSyntax {
        self.binding().set_constraint(constraint);
        BindingOnSyntax::new(self.binding().clone())
    }

    fn when_target_named(&self, name: impl Into<TagValue>) -> BindingOnSyntax {
        self.when_constraint(Constraint::named(name))
    }

    /// Match targets that carry neither a name nor a custom tag
    fn when_target_is_default(&self) -> BindingOnSyntax {
        self.when(|request: &Request| {
            let target = request.target();
            !target.is_named() && !target.is_tagged()
        })
    }

    fn when_target_tagged(&self, key: impl Into<TagKey>, value: impl Into<TagValue>) -> BindingOnSyntax {
        self.when_constraint(Constraint::tagged(key, value))
    }

    /// Match when the direct parent is implemented by, or bound to, `parent`
    fn when_injected_into(&self, parent: impl Into<TypeOrIdentifier>) -> BindingOnSyntax {
        self.when_constraint(Constraint::type_of(parent).on_parent())
    }

    fn when_parent_named(&self, name: impl Into<TagValue>) -> BindingOnSyntax {
        self.when_constraint(Constraint::named(name).on_parent())
    }

    fn when_parent_tagged(&self, key: impl Into<TagKey>, value: impl Into<TagValue>) -> BindingOnSyntax {
        self.when_constraint(Constraint::tagged(key, value).on_parent())
    }

    fn when_any_ancestor_is(&self, ancestor: impl Into<TypeOrIdentifier>) -> BindingOnSyntax {
        self.when_constraint(Constraint::type_of(ancestor).any_ancestor())
    }

    fn when_no_ancestor_is(&self, ancestor: impl Into<TypeOrIdentifier>) -> BindingOnSyntax {
        self.when_constraint(Constraint::type_of(ancestor).no_ancestor())
    }

    fn when_any_ancestor_named(&self, name: impl Into<TagValue>) -> BindingOnSyntax {
        self.when_constraint(Constraint::named(name).any_ancestor())
    }

    fn when_no_ancestor_named(&self, name: impl Into<TagValue>) -> BindingOnSyntax {
        self.when_constraint(Constraint::named(name).no_ancestor())
    }

    fn when_any_ancestor_tagged(&self, key: impl Into<TagKey>, value: impl Into<TagValue>) -> BindingOnSyntax {
        self.when_constraint(Constraint::tagged(key, value).any_ancestor())
    }

    fn when_no_ancestor_tagged(&self, key: impl Into<TagKey>, value: impl Into<TagValue>) -> BindingOnSyntax {
        self.when_constraint(Constraint::tagged(key, value).no_ancestor())
    }

    fn when_any_ancestor_matches(&self, constraint: Constraint) -> BindingOnSyntax {
        self.when_constraint(constraint.any_ancestor())
    }

    fn when_no_ancestor_matches(&self, constraint: Constraint) -> BindingOnSyntax {
        self.when_constraint(constraint.no_ancestor())
    }
}

/// Lifecycle hooks
pub trait OnSyntax: BindingSyntax {
    /// Run `handler` on every produced value; its result replaces the value
    fn on_activation<F>(&self, handler: F) -> BindingWhenSyntax
    where
        F: Fn(&Context, Instance) -> Result<Instance> + Send + Sync + 'static,
    {
        self.binding().set_on_activation(Arc::new(handler));
        BindingWhenSyntax::new(self.binding().clone())
    }

    /// Run `handler` with the cached singleton when the binding is dropped
    fn on_deactivation<F>(&self, handler: F) -> BindingWhenSyntax
    where
        F: Fn(&Instance) -> Result<()> + Send + Sync + 'static,
    {
        self.binding().set_on_deactivation(Arc::new(handler));
        BindingWhenSyntax::new(self.binding().clone())
    }
}

macro_rules! continuation {
    ($(#[$doc:meta])* $name:ident: $($syntax:ident),+) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name {
            binding: Arc<Binding>,
        }

        impl $name {
            pub(crate) fn new(binding: Arc<Binding>) -> Self {
                Self { binding }
            }
        }

        impl BindingSyntax for $name {
            fn binding(&self) -> &Arc<Binding> {
                &self.binding
            }
        }

        $(impl $syntax for $name {})+
    };
}

continuation!(
    /// Scope, constraint and hook selection
    BindingInWhenOnSyntax: InSyntax, WhenSyntax, OnSyntax
);
continuation!(
    /// Constraint and hook selection
    BindingWhenOnSyntax: WhenSyntax, OnSyntax
);
continuation!(
    /// Hook selection after a constraint
    BindingOnSyntax: OnSyntax
);
continuation!(
    /// Constraint selection after a hook
    BindingWhenSyntax: WhenSyntax
);

/// First step of a new binding: choose what satisfies the identifier
#[derive(Debug)]
pub struct BindingToSyntax {
    binding: Arc<Binding>,
    container: Container,
}

impl BindingToSyntax {
    pub(crate) fn new(binding: Arc<Binding>, container: Container) -> Self {
        Self { binding, container }
    }

    /// Construct `T` with its dependencies injected
    pub fn to<T: Injectable>(&self) -> BindingInWhenOnSyntax {
        self.to_newable(Newable::of::<T>())
    }

    /// Construct the type behind `newable` with its dependencies injected
    pub fn to_newable(&self, newable: Newable) -> BindingInWhenOnSyntax {
        self.container.types().register_newable(newable);
        self.binding.set_kind(BindingKind::Instance(newable));
        BindingInWhenOnSyntax::new(self.binding.clone())
    }

    /// Bind a type identifier to its own registered constructor
    pub fn to_self(&self) -> Result<BindingInWhenOnSyntax> {
        let service_identifier = self.binding.service_identifier();
        let newable = service_identifier
            .as_type()
            .and_then(|key| self.container.types().newable(key))
            .ok_or_else(|| InjectError::InvalidToSelfValue {
                service: service_identifier.to_string(),
            })?;
        Ok(self.to_newable(newable))
    }

    pub fn to_constant_value<V: Any + Send + Sync>(&self, value: V) -> BindingWhenOnSyntax {
        self.binding
            .set_kind(BindingKind::ConstantValue(Arc::new(value)));
        BindingWhenOnSyntax::new(self.binding.clone())
    }

    /// Compute the value from the resolution context on each resolution
    /// the binding's scope allows
    pub fn to_dynamic_value<F, V>(&self, dynamic_value: F) -> BindingInWhenOnSyntax
    where
        F: Fn(&Context) -> Result<V> + Send + Sync + 'static,
        V: Any + Send + Sync,
    {
        self.binding.set_kind(BindingKind::DynamicValue(Arc::new(
            move |context: &Context| -> Result<Instance> { Ok(Arc::new(dynamic_value(context)?)) },
        )));
        BindingInWhenOnSyntax::new(self.binding.clone())
    }

    /// Resolve to the constructible handle of `T` rather than an instance
    pub fn to_constructor<T: Injectable>(&self) -> BindingWhenOnSyntax {
        let newable = Newable::of::<T>();
        self.container.types().register_newable(newable);
        self.binding.set_kind(BindingKind::Constructor(newable));
        BindingWhenOnSyntax::new(self.binding.clone())
    }

    /// Resolve to whatever `factory` builds from the context, usually a callable
    pub fn to_factory<F, V>(&self, factory: F) -> BindingWhenOnSyntax
    where
        F: Fn(&Context) -> Result<V> + Send + Sync + 'static,
        V: Any + Send + Sync,
    {
        self.binding.set_kind(BindingKind::Factory(Arc::new(
            move |context: &Context| -> Result<Instance> { Ok(Arc::new(factory(context)?)) },
        )));
        BindingWhenOnSyntax::new(self.binding.clone())
    }

    /// Store a callable and hand it out unchanged
    pub fn to_function<V: Any + Send + Sync>(&self, function: V) -> BindingWhenOnSyntax {
        self.binding
            .set_kind(BindingKind::Function(Arc::new(function)));
        BindingWhenOnSyntax::new(self.binding.clone())
    }

    /// Resolve to an [`AutoFactory`] that fetches `service_identifier` on demand
    pub fn to_auto_factory(&self, service_identifier: impl Into<ServiceIdentifier>) -> BindingWhenOnSyntax {
        let service_identifier = service_identifier.into();
        self.binding.set_kind(BindingKind::Factory(Arc::new(
            move |context: &Context| -> Result<Instance> {
                Ok(Arc::new(AutoFactory::new(
                    context.container(),
                    service_identifier.clone(),
                )))
            },
        )));
        BindingWhenOnSyntax::new(self.binding.clone())
    }

    /// Resolve to a [`Provider`] the caller awaits
    pub fn to_provider<F>(&self, provider: F) -> BindingWhenOnSyntax
    where
        F: Fn(&Context) -> Result<Provider> + Send + Sync + 'static,
    {
        self.binding.set_kind(BindingKind::Provider(Arc::new(provider)));
        BindingWhenOnSyntax::new(self.binding.clone())
    }

    /// Delegate to whatever `service` resolves to
    pub fn to_service(&self, service: impl Into<ServiceIdentifier>) {
        let service = service.into();
        self.binding.set_kind(BindingKind::DynamicValue(Arc::new(
            move |context: &Context| context.container().get_instance(service.clone()),
        )));
    }
}

impl BindingSyntax for BindingToSyntax {
    fn binding(&self) -> &Arc<Binding> {
        &self.binding
    }
}

/// Bind each of `types` so that it resolves to `service`
pub fn multi_bind_to_service<I>(
    container: &Container,
    service: impl Into<ServiceIdentifier>,
    types: I,
) -> Result<()>
where
    I: IntoIterator,
    I::Item: Into<ServiceIdentifier>,
{
    let service = service.into();
    for service_identifier in types {
        container.bind(service_identifier)?.to_service(service.clone());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuations_configure_the_same_binding() {
        let container = Container::new();
        let syntax = container.bind("Weapon").unwrap();
        let binding = syntax.binding().clone();

        syntax
            .to_dynamic_value(|_| Ok(7u8))
            .in_singleton_scope()
            .when_target_named("strong")
            .on_activation(|_, instance| Ok(instance));

        assert!(binding.scope().is_singleton());
        assert!(binding.on_activation().is_some());
        assert_eq!(
            binding.constraint().metadata(),
            Some(&crate::planning::metadata::Tag::named("strong"))
        );
    }

    #[test]
    fn test_to_self_requires_registered_type() {
        let container = Container::new();

        let err = container.bind("Katana").unwrap().to_self().unwrap_err();
        assert!(matches!(err, InjectError::InvalidToSelfValue { .. }));

        struct Unregistered;
        let err = container
            .bind(ServiceIdentifier::of::<Unregistered>())
            .unwrap()
            .to_self()
            .unwrap_err();
        assert!(matches!(err, InjectError::InvalidToSelfValue { .. }));
    }

    #[test]
    fn test_rebinding_kind_discards_cache() {
        let container = Container::new();
        let syntax = container.bind("Answer").unwrap();
        syntax.to_constant_value(1u32);
        syntax.binding().cache_singleton(Arc::new(1u32));

        syntax.to_function(|| 2u32);
        assert!(matches!(syntax.binding().kind(), BindingKind::Function(_)));
        assert!(syntax.binding().cached().is_none());
    }
}
