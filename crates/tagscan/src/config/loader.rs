use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Semantic checks the schema cannot express. Also applied to configs built in
/// code, so it is public.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if !(0.0..=100.0).contains(&config.min_ocr_confidence) {
        return Err(ConfigError::Validation {
            message: format!(
                "min_ocr_confidence must be within 0..=100, got {}",
                config.min_ocr_confidence
            ),
        });
    }

    if !(0.0..=100.0).contains(&config.ocr.fallback_confidence) {
        return Err(ConfigError::Validation {
            message: format!(
                "ocr.fallback_confidence must be within 0..=100, got {}",
                config.ocr.fallback_confidence
            ),
        });
    }

    let mut names = HashSet::new();
    for rule in &config.rules {
        if rule.name.trim().is_empty() {
            return Err(ConfigError::InvalidRule {
                name: rule.name.clone(),
                reason: "Rule name must not be empty".to_string(),
            });
        }
        if !names.insert(rule.name.as_str()) {
            return Err(ConfigError::InvalidRule {
                name: rule.name.clone(),
                reason: "Duplicate rule name".to_string(),
            });
        }
        if rule.tag_type.trim().is_empty() {
            return Err(ConfigError::InvalidRule {
                name: rule.name.clone(),
                reason: "Rule type must not be empty".to_string(),
            });
        }
    }

    config.rule_set()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::classifier::Classifier;
    use crate::config::schema::OcrPolicy;

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let config = load_config_from_str(r#"{ "version": "1.0" }"#).unwrap();
        assert!(!config.process_only_scanned_pages);
        assert!(config.rules.is_empty());
        assert!(config.ocr.enabled);
        assert_eq!(config.ocr.dpi, 300);
        assert_eq!(config.ocr.languages, vec!["eng".to_string()]);
        assert_eq!(config.ocr.fallback_confidence, 50.0);
        assert_eq!(config.ocr.policy, OcrPolicy::WhenNoNativeText);
    }

    #[test]
    fn test_load_config_with_rules() {
        let config_json = r#"
        {
            "version": "1.0",
            "process_only_scanned_pages": true,
            "min_ocr_confidence": 40,
            "ocr": { "dpi": 200, "policy": "whenever_image_available" },
            "rules": [
                { "name": "EC_TAG", "type": "TAG", "pattern": "EC-[A-Z0-9]{2,15}-\\d{6}" },
                { "name": "MODEL", "type": "MODEL", "pattern": "[A-Z]{2}\\d{4}" }
            ],
            "equipment_keywords": ["MOTOR", "PUMP"],
            "reject_keywords": ["COPYRIGHT"]
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert!(config.process_only_scanned_pages);
        assert_eq!(config.min_ocr_confidence, 40.0);
        assert_eq!(config.ocr.dpi, 200);
        assert_eq!(config.ocr.policy, OcrPolicy::WheneverImageAvailable);
        assert_eq!(config.rules.len(), 2);
        assert_eq!(config.rules[0].name, "EC_TAG");
        assert_eq!(config.rules[0].tag_type, "TAG");
        assert_eq!(config.equipment_keywords, vec!["MOTOR", "PUMP"]);
        assert_eq!(config.reject_keywords, vec!["COPYRIGHT"]);
    }

    #[test]
    fn test_invalid_json() {
        let result = load_config_from_str("not valid json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_unsupported_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_unknown_field_rejected_by_schema() {
        let result = load_config_from_str(r#"{ "version": "1.0", "worker_count": 4 }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_rule_missing_pattern_rejected_by_schema() {
        let result = load_config_from_str(
            r#"{ "version": "1.0", "rules": [ { "name": "A", "type": "TAG" } ] }"#,
        );
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_invalid_regex_is_load_time_error() {
        let result = load_config_from_str(
            r#"{ "version": "1.0", "rules": [ { "name": "BAD", "type": "TAG", "pattern": "[unclosed" } ] }"#,
        );
        match result {
            Err(ConfigError::InvalidRule { name, reason }) => {
                assert_eq!(name, "BAD");
                assert!(reason.contains("Invalid regex"));
            }
            other => panic!("Expected InvalidRule, got {:?}", other),
        }
    }

    #[test]
    fn test_rule_set_is_compiled_once_at_load() {
        let config = load_config_from_str(
            r#"{ "version": "1.0", "rules": [ { "name": "A", "type": "TAG", "pattern": "X-\\d+" } ] }"#,
        )
        .unwrap();
        assert!(config.compiled.get().is_some());

        let loaded = config.rule_set().unwrap();
        let shared = config.clone().rule_set().unwrap();
        let classifier = Classifier::from_config(&config).unwrap();

        assert!(Arc::ptr_eq(&loaded, &shared));
        assert!(std::ptr::eq(classifier.rules(), &*loaded));
        assert_eq!(loaded.rules()[0].name, "A");
    }

    #[test]
    fn test_duplicate_rule_names() {
        let result = load_config_from_str(
            r#"{ "version": "1.0", "rules": [
                { "name": "A", "type": "TAG", "pattern": "X\\d+" },
                { "name": "A", "type": "TAG", "pattern": "Y\\d+" }
            ] }"#,
        );
        match result {
            Err(ConfigError::InvalidRule { reason, .. }) => {
                assert!(reason.contains("Duplicate"));
            }
            other => panic!("Expected InvalidRule, got {:?}", other),
        }
    }

    #[test]
    fn test_confidence_out_of_range() {
        let result = load_config_from_str(r#"{ "version": "1.0", "min_ocr_confidence": 150 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_file() {
        let result = load_config("/nonexistent/tagscan/config.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }
}
