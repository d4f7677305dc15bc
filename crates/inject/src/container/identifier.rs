use std::any::TypeId;
use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Handle to a Rust type used as a service key
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
}

impl TypeKey {
    /// Create a type key for `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Create a type key directly from a type ID and name
    pub fn from_parts(type_id: TypeId, type_name: &'static str) -> Self {
        Self { type_id, type_name }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified type name
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without its module path, used in diagnostics
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

/// Key naming what is requested from a container.
///
/// Tokens compare by value, type keys compare by `TypeId`. A token never
/// equals a type key even if the names coincide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceIdentifier {
    /// Opaque named token
    Token(Cow<'static, str>),
    /// Type handle
    Type(TypeKey),
}

impl ServiceIdentifier {
    /// Create a type identifier for `T`
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeKey::of::<T>())
    }

    /// Create a token identifier
    pub fn token(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Token(name.into())
    }

    /// The type key when this identifier is a type handle
    pub fn as_type(&self) -> Option<&TypeKey> {
        match self {
            Self::Type(key) => Some(key),
            Self::Token(_) => None,
        }
    }

    pub fn is_type(&self) -> bool {
        matches!(self, Self::Type(_))
    }

    /// An empty token is the only identifier treated as absent
    pub(crate) fn is_null(&self) -> bool {
        matches!(self, Self::Token(name) if name.is_empty())
    }
}

impl fmt::Display for ServiceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(name) => f.write_str(name),
            Self::Type(key) => f.write_str(key.short_name()),
        }
    }
}

impl From<&'static str> for ServiceIdentifier {
    fn from(name: &'static str) -> Self {
        Self::Token(Cow::Borrowed(name))
    }
}

impl From<String> for ServiceIdentifier {
    fn from(name: String) -> Self {
        Self::Token(Cow::Owned(name))
    }
}

impl From<TypeKey> for ServiceIdentifier {
    fn from(key: TypeKey) -> Self {
        Self::Type(key)
    }
}

impl From<&ServiceIdentifier> for ServiceIdentifier {
    fn from(id: &ServiceIdentifier) -> Self {
        id.clone()
    }
}

/// Strip module paths from a type name, keeping generic arguments readable
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let head = match full.find('<') {
        Some(pos) => &full[..pos],
        None => full,
    };
    match head.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}
