use crate::container::identifier::ServiceIdentifier;
use crate::planning::metadata::{Tag, TagKey, TagValue};

/// Kind of injection point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    ConstructorArgument,
    ClassProperty,
    /// Synthetic target of a top-level `get` call
    Variable,
}

/// One injection point and the tags declared on it
#[derive(Debug, Clone)]
pub struct Target {
    target_type: TargetType,
    service_identifier: ServiceIdentifier,
    name: String,
    metadata: Vec<Tag>,
}

impl Target {
    pub fn new(
        target_type: TargetType,
        name: impl Into<String>,
        service_identifier: ServiceIdentifier,
    ) -> Self {
        Self {
            target_type,
            service_identifier,
            name: name.into(),
            metadata: Vec::new(),
        }
    }

    /// Create a target carrying one initial tag
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.metadata.push(tag);
        self
    }

    /// Replace the target metadata
    pub fn with_metadata(mut self, metadata: Vec<Tag>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn target_type(&self) -> TargetType {
        self.target_type
    }

    pub fn service_identifier(&self) -> &ServiceIdentifier {
        &self.service_identifier
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn metadata(&self) -> &[Tag] {
        &self.metadata
    }

    pub fn has_tag(&self, key: &TagKey) -> bool {
        self.metadata.iter().any(|m| &m.key == key)
    }

    pub fn is_array(&self) -> bool {
        self.has_tag(&TagKey::MultiInject)
    }

    pub fn matches_array(&self, id: &ServiceIdentifier) -> bool {
        self.matches_tag(&TagKey::MultiInject, &TagValue::Id(id.clone()))
    }

    pub fn is_named(&self) -> bool {
        self.has_tag(&TagKey::Named)
    }

    /// Whether a user-defined constraint tag is present
    pub fn is_tagged(&self) -> bool {
        self.metadata.iter().any(|m| m.key.is_custom())
    }

    pub fn is_optional(&self) -> bool {
        self.matches_tag(&TagKey::Optional, &TagValue::Bool(true))
    }

    pub fn get_named_tag(&self) -> Option<&Tag> {
        self.metadata.iter().find(|m| m.key == TagKey::Named)
    }

    pub fn get_custom_tags(&self) -> Vec<&Tag> {
        self.metadata.iter().filter(|m| m.key.is_custom()).collect()
    }

    pub fn matches_named_tag(&self, name: &TagValue) -> bool {
        self.matches_tag(&TagKey::Named, name)
    }

    pub fn matches_tag(&self, key: &TagKey, value: &TagValue) -> bool {
        self.metadata
            .iter()
            .any(|m| &m.key == key && &m.value == value)
    }
}
