pub mod binding;
pub mod constraints;
#[allow(clippy::module_inception)]
pub mod container;
pub mod identifier;
pub mod lookup;
pub mod middleware;
pub mod module;
pub mod provider;
pub mod scope;
pub mod snapshot;
pub mod syntax;

pub use binding::{Binding, BindingKind, Instance};
pub use constraints::{traverse_ancestors, Constraint, TypeOrIdentifier};
pub use container::Container;
pub use identifier::{ServiceIdentifier, TypeKey};
pub use lookup::Lookup;
pub use middleware::{compose, middleware_fn, Middleware, Next, NextArgs};
pub use module::{AsyncContainerModule, ContainerModule, ModuleBinder, ModuleId};
pub use provider::{AutoFactory, Provider};
pub use scope::BindingScope;
pub use snapshot::ContainerSnapshot;
pub use syntax::{
    multi_bind_to_service, BindingInWhenOnSyntax, BindingOnSyntax, BindingSyntax, BindingToSyntax,
    BindingWhenOnSyntax, BindingWhenSyntax, InSyntax, OnSyntax, WhenSyntax,
};
