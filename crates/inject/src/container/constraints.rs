use std::fmt;
use std::sync::Arc;

use crate::container::identifier::{ServiceIdentifier, TypeKey};
use crate::planning::metadata::{Tag, TagKey, TagValue};
use crate::planning::request::Request;

/// Predicate deciding whether a binding applies to a candidate request.
///
/// Constraints built from a tag remember it so that diagnostics can list
/// which tag a binding was registered for.
#[derive(Clone)]
pub struct Constraint {
    predicate: Arc<dyn Fn(&Request) -> bool + Send + Sync>,
    metadata: Option<Tag>,
}

impl Constraint {
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            metadata: None,
        }
    }

    /// The default constraint of a fresh binding
    pub fn always() -> Self {
        Self::new(|_| true)
    }

    /// Matches requests whose target carries the tag `(key, value)`
    pub fn tagged(key: impl Into<TagKey>, value: impl Into<TagValue>) -> Self {
        let tag = Tag::new(key, value);
        let expected = tag.clone();
        Self {
            predicate: Arc::new(move |request: &Request| {
                request.target().matches_tag(&expected.key, &expected.value)
            }),
            metadata: Some(tag),
        }
    }

    /// Matches requests whose target is named `name`
    pub fn named(name: impl Into<TagValue>) -> Self {
        Self::tagged(TagKey::Named, name)
    }

    /// Matches requests whose first candidate binding is implemented by,
    /// or registered under, `ancestor`.
    ///
    /// Constraints are evaluated with one candidate at a time, so the first
    /// binding is the only one.
    pub fn type_of(ancestor: impl Into<TypeOrIdentifier>) -> Self {
        let ancestor = ancestor.into();
        Self::new(move |request: &Request| {
            let Some(binding) = request.bindings().first() else {
                return false;
            };
            match &ancestor {
                TypeOrIdentifier::Type(key) => binding.implementation_type().as_ref() == Some(key),
                TypeOrIdentifier::Identifier(id) => binding.service_identifier() == id,
            }
        })
    }

    /// Evaluate this constraint against the request's parent instead
    pub fn on_parent(self) -> Self {
        Self::new(move |request: &Request| match request.parent_request() {
            Some(parent) => self.matches(&parent),
            None => false,
        })
    }

    /// True when the constraint holds for any strict ancestor
    pub fn any_ancestor(self) -> Self {
        Self::new(move |request: &Request| traverse_ancestors(request, &self))
    }

    /// True when the constraint holds for no strict ancestor
    pub fn no_ancestor(self) -> Self {
        Self::new(move |request: &Request| !traverse_ancestors(request, &self))
    }

    pub fn and(self, other: Constraint) -> Self {
        let metadata = self.metadata.clone().or_else(|| other.metadata.clone());
        Self {
            predicate: Arc::new(move |request: &Request| self.matches(request) && other.matches(request)),
            metadata,
        }
    }

    pub fn or(self, other: Constraint) -> Self {
        Self::new(move |request: &Request| self.matches(request) || other.matches(request))
    }

    pub fn not(self) -> Self {
        Self::new(move |request: &Request| !self.matches(request))
    }

    pub fn matches(&self, request: &Request) -> bool {
        (self.predicate)(request)
    }

    /// Tag this constraint was built from, if any
    pub fn metadata(&self) -> Option<&Tag> {
        self.metadata.as_ref()
    }
}

impl fmt::Debug for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Argument of the "injected into" family of constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeOrIdentifier {
    /// Compared with the binding's implementation type
    Type(TypeKey),
    /// Compared with the binding's service identifier
    Identifier(ServiceIdentifier),
}

impl From<TypeKey> for TypeOrIdentifier {
    fn from(key: TypeKey) -> Self {
        TypeOrIdentifier::Type(key)
    }
}

impl From<&'static str> for TypeOrIdentifier {
    fn from(name: &'static str) -> Self {
        TypeOrIdentifier::Identifier(ServiceIdentifier::from(name))
    }
}

impl From<ServiceIdentifier> for TypeOrIdentifier {
    fn from(id: ServiceIdentifier) -> Self {
        TypeOrIdentifier::Identifier(id)
    }
}

/// Walk the parent chain of `request`, stopping at the first ancestor
/// accepted by `constraint`
pub fn traverse_ancestors(request: &Request, constraint: &Constraint) -> bool {
    let mut current = request.parent_request();
    while let Some(parent) = current {
        if constraint.matches(&parent) {
            return true;
        }
        current = parent.parent_request();
    }
    false
}
