use std::env;

use serde::{Deserialize, Serialize};

use crate::container::scope::BindingScope;
use crate::errors::{InjectError, Result};

/// Container behaviour switches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerOptions {
    /// Scope given to bindings that do not select one
    pub default_scope: BindingScope,
    /// Bind registered injectable types to themselves on first request
    pub auto_bind_injectable: bool,
    /// Skip the derived/base constructor dependency count check
    pub skip_base_class_checks: bool,
    /// Maximum nesting of constructed dependencies in one plan
    pub max_plan_depth: Option<usize>,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            default_scope: BindingScope::Transient,
            auto_bind_injectable: false,
            skip_base_class_checks: false,
            max_plan_depth: None,
        }
    }
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_scope(mut self, scope: BindingScope) -> Self {
        self.default_scope = scope;
        self
    }

    pub fn with_auto_bind_injectable(mut self, enabled: bool) -> Self {
        self.auto_bind_injectable = enabled;
        self
    }

    pub fn with_skip_base_class_checks(mut self, skip: bool) -> Self {
        self.skip_base_class_checks = skip;
        self
    }

    pub fn with_max_plan_depth(mut self, depth: usize) -> Self {
        self.max_plan_depth = Some(depth);
        self
    }

    /// Load options from `INJECT_*` environment variables
    pub fn from_env() -> Result<Self> {
        let mut options = Self::new();

        if let Ok(scope) = env::var("INJECT_DEFAULT_SCOPE") {
            options.default_scope = scope.parse()?;
        }

        if let Ok(value) = env::var("INJECT_AUTO_BIND_INJECTABLE") {
            options.auto_bind_injectable = parse_flag("auto_bind_injectable", &value)?;
        }

        if let Ok(value) = env::var("INJECT_SKIP_BASE_CLASS_CHECKS") {
            options.skip_base_class_checks = parse_flag("skip_base_class_checks", &value)?;
        }

        if let Ok(value) = env::var("INJECT_MAX_PLAN_DEPTH") {
            let depth = value.parse::<usize>().map_err(|_| InjectError::InvalidOption {
                field: "max_plan_depth".to_string(),
                value: value.clone(),
                expected: "positive integer".to_string(),
            })?;
            options.max_plan_depth = Some(depth);
        }

        options.validate()?;
        Ok(options)
    }

    /// Parse options from a JSON document; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let options: ContainerOptions =
            serde_json::from_str(json).map_err(|e| invalid_document(e, "a JSON options document"))?;
        options.validate()?;
        Ok(options)
    }

    /// Parse options from a YAML document; absent fields keep their defaults
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let options: ContainerOptions =
            serde_yaml::from_str(yaml).map_err(|e| invalid_document(e, "a YAML options document"))?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| InjectError::with_source("Could not serialize container options", Box::new(e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_plan_depth == Some(0) {
            return Err(InjectError::InvalidOption {
                field: "max_plan_depth".to_string(),
                value: "0".to_string(),
                expected: "positive integer".to_string(),
            });
        }
        Ok(())
    }
}

fn invalid_document(err: impl std::fmt::Display, expected: &str) -> InjectError {
    InjectError::InvalidOption {
        field: "document".to_string(),
        value: err.to_string(),
        expected: expected.to_string(),
    }
}

fn parse_flag(field: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(InjectError::InvalidOption {
            field: field.to_string(),
            value: value.to_string(),
            expected: "boolean".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "INJECT_DEFAULT_SCOPE",
            "INJECT_AUTO_BIND_INJECTABLE",
            "INJECT_SKIP_BASE_CLASS_CHECKS",
            "INJECT_MAX_PLAN_DEPTH",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let options = ContainerOptions::from_env().unwrap();
        assert_eq!(options, ContainerOptions::default());
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        env::set_var("INJECT_DEFAULT_SCOPE", "singleton");
        env::set_var("INJECT_AUTO_BIND_INJECTABLE", "true");
        env::set_var("INJECT_MAX_PLAN_DEPTH", "32");

        let options = ContainerOptions::from_env().unwrap();
        clear_env();

        assert_eq!(options.default_scope, BindingScope::Singleton);
        assert!(options.auto_bind_injectable);
        assert!(!options.skip_base_class_checks);
        assert_eq!(options.max_plan_depth, Some(32));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_bad_values() {
        clear_env();
        env::set_var("INJECT_SKIP_BASE_CLASS_CHECKS", "maybe");
        let err = ContainerOptions::from_env().unwrap_err();
        clear_env();

        assert!(matches!(
            err,
            InjectError::InvalidOption { ref field, .. } if field == "skip_base_class_checks"
        ));
    }

    #[test]
    fn test_from_json() {
        let options = ContainerOptions::from_json(r#"{"default_scope":"request"}"#).unwrap();
        assert_eq!(options.default_scope, BindingScope::Request);
        assert!(!options.auto_bind_injectable);

        let err = ContainerOptions::from_json(r#"{"default_scope":"scoped"}"#).unwrap_err();
        assert!(matches!(err, InjectError::InvalidOption { ref field, .. } if field == "document"));
        let err = ContainerOptions::from_json("{not json").unwrap_err();
        assert!(matches!(err, InjectError::InvalidOption { ref field, .. } if field == "document"));
        let err = ContainerOptions::from_json(r#"{"max_plan_depth":0}"#).unwrap_err();
        assert!(matches!(err, InjectError::InvalidOption { ref field, .. } if field == "max_plan_depth"));
    }

    #[test]
    fn test_yaml_round_trip() {
        let options = ContainerOptions::from_yaml("auto_bind_injectable: true\nmax_plan_depth: 8\n").unwrap();
        assert!(options.auto_bind_injectable);
        assert_eq!(options.max_plan_depth, Some(8));

        let yaml = options.to_yaml().unwrap();
        assert_eq!(ContainerOptions::from_yaml(&yaml).unwrap(), options);

        let err = ContainerOptions::from_yaml("max_plan_depth: [1, 2]").unwrap_err();
        assert!(matches!(err, InjectError::InvalidOption { ref field, .. } if field == "document"));
    }
}
