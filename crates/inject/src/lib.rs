pub mod config;
pub mod container;
pub mod errors;
pub mod planning;
pub mod resolution;

// Re-export key types for convenience
pub use config::ContainerOptions;
pub use container::{
    multi_bind_to_service, AsyncContainerModule, AutoFactory, Binding, BindingKind, BindingScope,
    Constraint, Container, ContainerModule, Instance, Middleware, ModuleBinder, ModuleId, Next,
    NextArgs, Provider, ServiceIdentifier, TypeKey,
};
pub use errors::{InjectError, Result};
pub use planning::{
    Context, Injectable, MetadataReader, Newable, Param, Request, Tag, TagKey, TagValue, Target,
    TargetType, TypeMetadata, TypeRegistry,
};
pub use resolution::{Arguments, Resolved};

/// Fluent binding traits and the types most bindings need
pub mod prelude {
    pub use crate::container::syntax::{BindingSyntax, InSyntax, OnSyntax, WhenSyntax};
    pub use crate::container::middleware::middleware_fn;
    pub use crate::{
        Arguments, BindingScope, Constraint, Container, ContainerModule, Context, Injectable,
        InjectError, Instance, Param, ServiceIdentifier, Tag, TypeKey, TypeMetadata,
    };
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}
