//! Explicit dependency declarations for constructible types
//!
//! A type becomes resolvable by implementing [`Injectable`]: it declares its
//! constructor parameters and injected properties through a
//! [`TypeMetadata`] and builds itself from resolved [`Arguments`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::container::binding::Instance;
use crate::container::identifier::{short_type_name, ServiceIdentifier, TypeKey};
use crate::errors::{InjectError, Result};
use crate::planning::metadata::Tag;
use crate::resolution::arguments::Arguments;
use crate::resolution::resolved::Resolved;

/// A type the container can construct
pub trait Injectable: Any + Send + Sync + Sized {
    /// Declared constructor parameters, property targets and base type
    fn metadata() -> Result<TypeMetadata>;

    /// Build the value from its resolved constructor arguments
    fn construct(args: &mut Arguments) -> Result<Self>;

    /// Assign a resolved property-injection target
    fn inject_property(&mut self, name: &str, _value: Resolved) -> Result<()> {
        Err(InjectError::custom(format!(
            "{} declares no injectable property named '{}'",
            short_type_name(std::any::type_name::<Self>()),
            name
        )))
    }

    /// Runs once after construction and property injection
    fn post_construct(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Identifier inferred for one constructor parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param(Option<ServiceIdentifier>);

impl Param {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Param(Some(ServiceIdentifier::of::<T>()))
    }

    pub fn token(name: &'static str) -> Self {
        Param(Some(ServiceIdentifier::token(name)))
    }

    /// A parameter whose type is too ambiguous to infer.
    ///
    /// It must carry an `inject` or `multi_inject` tag.
    pub fn untyped() -> Self {
        Param(None)
    }

    pub fn identifier(&self) -> Option<&ServiceIdentifier> {
        self.0.as_ref()
    }
}

impl From<ServiceIdentifier> for Param {
    fn from(id: ServiceIdentifier) -> Self {
        Param(Some(id))
    }
}

/// Declared dependency metadata of one constructible type
#[derive(Debug, Clone)]
pub struct TypeMetadata {
    type_key: TypeKey,
    parameters: Option<Vec<Param>>,
    parameter_tags: BTreeMap<usize, Vec<Tag>>,
    property_tags: Vec<(String, Vec<Tag>)>,
    base: Option<Newable>,
}

impl TypeMetadata {
    /// Start declaring metadata for `T`
    pub fn builder<T: 'static>() -> TypeMetadataBuilder {
        TypeMetadataBuilder {
            metadata: TypeMetadata {
                type_key: TypeKey::of::<T>(),
                parameters: None,
                parameter_tags: BTreeMap::new(),
                property_tags: Vec::new(),
                base: None,
            },
            error: None,
        }
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    /// Whether the constructor signature has been declared
    pub fn is_injectable(&self) -> bool {
        self.parameters.is_some()
    }

    pub fn parameters(&self) -> Option<&[Param]> {
        self.parameters.as_deref()
    }

    pub fn parameter_tags(&self) -> &BTreeMap<usize, Vec<Tag>> {
        &self.parameter_tags
    }

    pub fn property_tags(&self) -> &[(String, Vec<Tag>)] {
        &self.property_tags
    }

    pub fn base(&self) -> Option<&Newable> {
        self.base.as_ref()
    }
}

/// Builder for [`TypeMetadata`].
///
/// Declaration errors are recorded and reported by [`build`](Self::build).
#[derive(Debug)]
pub struct TypeMetadataBuilder {
    metadata: TypeMetadata,
    error: Option<InjectError>,
}

impl TypeMetadataBuilder {
    fn fail(&mut self, error: InjectError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Declare the ordered constructor parameters, marking the type injectable
    pub fn constructor(mut self, parameters: impl IntoIterator<Item = Param>) -> Self {
        if self.metadata.parameters.is_some() {
            let type_name = self.metadata.type_key.short_name().to_string();
            self.fail(InjectError::DuplicatedInjectableAnnotation { type_name });
        } else {
            self.metadata.parameters = Some(parameters.into_iter().collect());
        }
        self
    }

    /// Attach a tag to the constructor parameter at `index`
    pub fn param_tag(mut self, index: usize, tag: Tag) -> Self {
        let tags = self.metadata.parameter_tags.entry(index).or_default();
        if tags.iter().any(|existing| existing.key == tag.key) {
            let key = tag.key.to_string();
            self.fail(InjectError::DuplicatedMetadata { key });
        } else {
            tags.push(tag);
        }
        self
    }

    /// Attach a tag to the injected property `name`
    pub fn property_tag(mut self, name: impl Into<String>, tag: Tag) -> Self {
        let name = name.into();
        let position = self
            .metadata
            .property_tags
            .iter()
            .position(|(property, _)| *property == name);
        let tags = match position {
            Some(position) => &mut self.metadata.property_tags[position].1,
            None => {
                self.metadata.property_tags.push((name, Vec::new()));
                let last = self.metadata.property_tags.len() - 1;
                &mut self.metadata.property_tags[last].1
            }
        };
        if tags.iter().any(|existing| existing.key == tag.key) {
            let key = tag.key.to_string();
            self.fail(InjectError::DuplicatedMetadata { key });
        } else {
            tags.push(tag);
        }
        self
    }

    /// Shorthand for an injected property of identifier `id`
    pub fn property(self, name: impl Into<String>, id: impl Into<ServiceIdentifier>) -> Self {
        self.property_tag(name, Tag::inject(id))
    }

    /// Declare the base type whose constructor and properties this type inherits
    pub fn extends<B: Injectable>(mut self) -> Self {
        self.metadata.base = Some(Newable::of::<B>());
        self
    }

    pub fn build(self) -> Result<TypeMetadata> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.metadata),
        }
    }
}

type CreateFn = fn(Arguments, Vec<(String, Resolved)>) -> Result<Instance>;

/// Type-erased handle to a constructible type
#[derive(Clone, Copy)]
pub struct Newable {
    type_key: TypeKey,
    metadata: fn() -> Result<TypeMetadata>,
    create: CreateFn,
}

impl Newable {
    pub fn of<T: Injectable>() -> Self {
        Self {
            type_key: TypeKey::of::<T>(),
            metadata: T::metadata,
            create: create_instance::<T>,
        }
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn name(&self) -> &'static str {
        self.type_key.short_name()
    }

    pub fn metadata(&self) -> Result<TypeMetadata> {
        (self.metadata)()
    }

    /// Construct the type, inject `properties` and run its post-construct hook
    pub fn instantiate(
        &self,
        args: Arguments,
        properties: Vec<(String, Resolved)>,
    ) -> Result<Instance> {
        (self.create)(args, properties)
    }
}

impl PartialEq for Newable {
    fn eq(&self, other: &Self) -> bool {
        self.type_key == other.type_key
    }
}

impl fmt::Debug for Newable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Newable").field(&self.type_key.type_name()).finish()
    }
}

fn create_instance<T: Injectable>(
    mut args: Arguments,
    properties: Vec<(String, Resolved)>,
) -> Result<Instance> {
    let mut value = T::construct(&mut args)?;
    for (name, resolved) in properties {
        value.inject_property(&name, resolved)?;
    }
    value.post_construct()?;
    Ok(Arc::new(value))
}
