use std::fmt;

use crate::container::identifier::ServiceIdentifier;

/// Key of a tag attached to an injection point.
///
/// Every variant except `Custom` carries structural meaning for the planner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagKey {
    Inject,
    MultiInject,
    /// Label of the injection point itself (parameter or property name)
    Name,
    /// Name a binding must match via `when_target_named`
    Named,
    Optional,
    Unmanaged,
    Custom(String),
}

impl TagKey {
    /// Whether this key is a user-defined constraint tag
    pub fn is_custom(&self) -> bool {
        matches!(self, TagKey::Custom(_))
    }
}

impl fmt::Display for TagKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagKey::Inject => f.write_str("inject"),
            TagKey::MultiInject => f.write_str("multi_inject"),
            TagKey::Name => f.write_str("name"),
            TagKey::Named => f.write_str("named"),
            TagKey::Optional => f.write_str("optional"),
            TagKey::Unmanaged => f.write_str("unmanaged"),
            TagKey::Custom(key) => f.write_str(key),
        }
    }
}

impl From<&str> for TagKey {
    fn from(key: &str) -> Self {
        TagKey::Custom(key.to_string())
    }
}

impl From<String> for TagKey {
    fn from(key: String) -> Self {
        TagKey::Custom(key)
    }
}

/// Value half of a tag
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TagValue {
    Str(String),
    Int(i64),
    Bool(bool),
    Id(ServiceIdentifier),
}

impl TagValue {
    pub fn as_identifier(&self) -> Option<&ServiceIdentifier> {
        match self {
            TagValue::Id(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            TagValue::Str(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Str(value) => f.write_str(value),
            TagValue::Int(value) => write!(f, "{}", value),
            TagValue::Bool(value) => write!(f, "{}", value),
            TagValue::Id(id) => write!(f, "{}", id),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<ServiceIdentifier> for TagValue {
    fn from(id: ServiceIdentifier) -> Self {
        TagValue::Id(id)
    }
}

/// A `(key, value)` pair attached to an injection point
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: TagKey,
    pub value: TagValue,
}

impl Tag {
    pub fn new(key: impl Into<TagKey>, value: impl Into<TagValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn inject(id: impl Into<ServiceIdentifier>) -> Self {
        Self::new(TagKey::Inject, TagValue::Id(id.into()))
    }

    pub fn multi_inject(id: impl Into<ServiceIdentifier>) -> Self {
        Self::new(TagKey::MultiInject, TagValue::Id(id.into()))
    }

    pub fn named(name: impl Into<TagValue>) -> Self {
        Self::new(TagKey::Named, name)
    }

    pub fn target_name(name: impl Into<String>) -> Self {
        Self::new(TagKey::Name, TagValue::Str(name.into()))
    }

    pub fn optional() -> Self {
        Self::new(TagKey::Optional, true)
    }

    pub fn unmanaged() -> Self {
        Self::new(TagKey::Unmanaged, true)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{\"key\":\"{}\",\"value\":\"{}\"}}", self.key, self.value)
    }
}
