use serde::{Deserialize, Serialize};

use crate::errors::InjectError;

/// Binding scope enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingScope {
    /// One instance per binding for the lifetime of the container
    Singleton,
    /// New instance for every resolution
    Transient,
    /// One instance per top-level `get`/`get_all` call
    Request,
}

impl BindingScope {
    /// Check if the scope is singleton
    pub fn is_singleton(&self) -> bool {
        matches!(self, BindingScope::Singleton)
    }

    /// Check if the scope is transient
    pub fn is_transient(&self) -> bool {
        matches!(self, BindingScope::Transient)
    }

    /// Check if the scope is request
    pub fn is_request(&self) -> bool {
        matches!(self, BindingScope::Request)
    }

    /// Get the scope name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            BindingScope::Singleton => "singleton",
            BindingScope::Transient => "transient",
            BindingScope::Request => "request",
        }
    }
}

impl Default for BindingScope {
    fn default() -> Self {
        BindingScope::Transient
    }
}

impl std::fmt::Display for BindingScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BindingScope {
    type Err = InjectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "singleton" => Ok(BindingScope::Singleton),
            "transient" => Ok(BindingScope::Transient),
            "request" => Ok(BindingScope::Request),
            _ => Err(InjectError::InvalidOption {
                field: "default_scope".to_string(),
                value: s.to_string(),
                expected: "singleton, transient, or request".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_scope_from_str() {
        assert_eq!("singleton".parse::<BindingScope>().unwrap(), BindingScope::Singleton);
        assert_eq!("Transient".parse::<BindingScope>().unwrap(), BindingScope::Transient);
        assert_eq!("request".parse::<BindingScope>().unwrap(), BindingScope::Request);

        assert!("scoped".parse::<BindingScope>().is_err());
    }

    #[test]
    fn test_binding_scope_display() {
        assert_eq!(format!("{}", BindingScope::Singleton), "singleton");
        assert_eq!(format!("{}", BindingScope::Transient), "transient");
        assert_eq!(format!("{}", BindingScope::Request), "request");
        assert_eq!(BindingScope::default(), BindingScope::Transient);
    }
}
