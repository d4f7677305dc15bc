use thiserror::Error;

/// Error type for binding, planning and resolution failures
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("No matching bindings found for serviceIdentifier:{details}")]
    NotRegistered { service: String, details: String },

    #[error("Ambiguous match found for serviceIdentifier: {service}{details}")]
    AmbiguousMatch { service: String, details: String },

    #[error("Circular dependency found: {chain}")]
    CircularDependency { chain: String },

    #[error("Maximum planning depth of {depth} exceeded: {chain}")]
    MaxDepthExceeded { depth: usize, chain: String },

    #[error("Metadata key was used more than once in a parameter: {key}")]
    DuplicatedMetadata { key: String },

    #[error("Cannot declare injectable metadata multiple times for {type_name}")]
    DuplicatedInjectableAnnotation { type_name: String },

    #[error("Missing required injectable metadata in: {type_name}.")]
    MissingInjectableAnnotation { type_name: String },

    #[error("Missing required inject or multi-inject metadata in: argument {index} in class {type_name}.")]
    MissingInjectAnnotation { index: usize, type_name: String },

    #[error("Missing required inject or multi-inject metadata in: property {property} in class {type_name}.")]
    MissingPropertyInjectAnnotation { property: String, type_name: String },

    #[error("The number of constructor arguments in the derived class {type_name} must be >= than the number of constructor arguments of its base class.")]
    ArgumentsLengthMismatch { type_name: String },

    #[error("Invalid return type in middleware. Middleware must return!")]
    InvalidMiddlewareReturn,

    #[error("No snapshot available to restore.")]
    NoMoreSnapshotsAvailable,

    #[error("Could not unbind serviceIdentifier: {service}")]
    CannotUnbind { service: String },

    #[error("NULL argument")]
    NullArgument,

    #[error("Key Not Found")]
    KeyNotFound,

    #[error("Invalid binding type: {service}")]
    InvalidBindingType { service: String },

    #[error("The to_self function can only be applied when a registered constructible type is used as service identifier: {service}")]
    InvalidToSelfValue { service: String },

    #[error("Resolved value for '{service}' is not of type {expected}")]
    TypeMismatch { service: String, expected: &'static str },

    #[error("Invalid container option '{field}': '{value}' (expected {expected})")]
    InvalidOption {
        field: String,
        value: String,
        expected: String,
    },

    #[error("Lock error on resource: {resource}")]
    Lock { resource: String },

    #[error("{message}")]
    Custom {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl InjectError {
    /// Create an error raised from user code (factories, hooks, constructors)
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
            source: None,
        }
    }

    /// Create a user error wrapping an underlying cause
    pub fn with_source(
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Custom {
            message: message.into(),
            source: Some(source),
        }
    }

    pub(crate) fn lock(resource: &str) -> Self {
        Self::Lock {
            resource: resource.to_string(),
        }
    }

    /// Check if the error reports a missing binding
    pub fn is_not_registered(&self) -> bool {
        matches!(self, Self::NotRegistered { .. })
    }

    /// Check if the error reports an ambiguous match
    pub fn is_ambiguous_match(&self) -> bool {
        matches!(self, Self::AmbiguousMatch { .. })
    }

    /// Check if the error reports a dependency cycle
    pub fn is_circular_dependency(&self) -> bool {
        matches!(self, Self::CircularDependency { .. })
    }
}

pub type Result<T> = std::result::Result<T, InjectError>;
