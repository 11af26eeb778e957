use std::ops::Range;

use regex::Regex;

use crate::config::schema::{Config, RuleConfig};
use crate::error::ConfigError;

/// A configured rule with its pattern compiled twice: as written, and anchored
/// to the whole input for full-match precedence.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: String,
    pub tag_type: String,
    pub pattern: Regex,
    anchored: Regex,
}

impl CompiledRule {
    pub fn compile(rule: &RuleConfig) -> Result<Self, ConfigError> {
        let invalid = |e: regex::Error| ConfigError::InvalidRule {
            name: rule.name.clone(),
            reason: format!("Invalid regex pattern: {}", e),
        };

        let pattern = Regex::new(&rule.pattern).map_err(invalid)?;
        let anchored = Regex::new(&format!("^(?:{})$", rule.pattern)).map_err(invalid)?;

        Ok(Self {
            name: rule.name.clone(),
            tag_type: rule.tag_type.clone(),
            pattern,
            anchored,
        })
    }

    pub fn matches_entirely(&self, chunk: &str) -> bool {
        self.anchored.is_match(chunk)
    }

    /// First match anywhere in the chunk with at least one non-whitespace
    /// character.
    pub fn find_in(&self, chunk: &str) -> Option<Range<usize>> {
        self.pattern
            .find_iter(chunk)
            .find(|m| !m.as_str().trim().is_empty())
            .map(|m| m.range())
    }
}

/// Immutable, pre-validated rule set shared by every classification call.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
    equipment_keywords: Vec<String>,
    reject_keywords: Vec<String>,
}

impl RuleSet {
    pub fn new(
        rules: &[RuleConfig],
        equipment_keywords: &[String],
        reject_keywords: &[String],
    ) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            rules,
            equipment_keywords: uppercase_keywords(equipment_keywords),
            reject_keywords: uppercase_keywords(reject_keywords),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(
            &config.rules,
            &config.equipment_keywords,
            &config.reject_keywords,
        )
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// First rule, in configured order, whose pattern covers the whole chunk.
    pub fn full_match(&self, chunk: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|rule| rule.matches_entirely(chunk))
    }

    /// First rule, in configured order, matching any substring of the chunk.
    pub fn partial_match(&self, chunk: &str) -> Option<(&CompiledRule, Range<usize>)> {
        self.rules
            .iter()
            .find_map(|rule| rule.find_in(chunk).map(|range| (rule, range)))
    }

    pub fn has_equipment_keyword(&self, text: &str) -> bool {
        contains_any(&text.to_uppercase(), &self.equipment_keywords)
    }

    pub fn has_reject_keyword(&self, text: &str) -> bool {
        contains_any(&text.to_uppercase(), &self.reject_keywords)
    }
}

fn uppercase_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_uppercase())
        .filter(|k| !k.is_empty())
        .collect()
}

fn contains_any(upper_text: &str, upper_keywords: &[String]) -> bool {
    upper_keywords.iter().any(|k| upper_text.contains(k.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(name: &str, tag_type: &str, pattern: &str) -> RuleConfig {
        RuleConfig::new(name, tag_type, pattern)
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = RuleSet::new(&[rule("BAD", "TAG", "(unclosed")], &[], &[]);
        assert!(matches!(result, Err(ConfigError::InvalidRule { name, .. }) if name == "BAD"));
    }

    #[test]
    fn test_full_match_requires_entire_chunk() {
        let set = RuleSet::new(&[rule("PUMP", "TAG", r"P-\d{3}")], &[], &[]).unwrap();
        assert!(set.full_match("P-101").is_some());
        assert!(set.full_match("P-101 SPARE").is_none());
    }

    #[test]
    fn test_anchoring_applies_to_all_alternatives() {
        let set = RuleSet::new(&[rule("ALT", "TAG", r"AB|CD-\d+")], &[], &[]).unwrap();
        assert!(set.full_match("CD-12").is_some());
        assert!(set.full_match("AB CD-12").is_none());
    }

    #[test]
    fn test_partial_match_returns_range_in_rule_order() {
        let set = RuleSet::new(
            &[
                rule("FIRST", "A", r"X-\d+"),
                rule("SECOND", "B", r"Y-\d+"),
            ],
            &[],
            &[],
        )
        .unwrap();

        let (rule, range) = set.partial_match("Y-1 then X-2").unwrap();
        assert_eq!(rule.name, "FIRST");
        assert_eq!(&"Y-1 then X-2"[range], "X-2");
    }

    #[test]
    fn test_empty_matches_are_ignored() {
        let set = RuleSet::new(&[rule("OPT", "TAG", r"\d*")], &[], &[]).unwrap();
        let (_, range) = set.partial_match("AB12").unwrap();
        assert_eq!(&"AB12"[range], "12");
        assert!(set.partial_match("ABC").is_none());
    }

    #[test]
    fn test_whitespace_only_matches_are_ignored() {
        let set = RuleSet::new(&[rule("SEP", "TAG", r"(?:TAG-\d+)?\s")], &[], &[]).unwrap();
        assert!(set.partial_match("PUMP ROOM").is_none());

        let (_, range) = set.partial_match("PUMP TAG-7 ROOM").unwrap();
        assert_eq!(&"PUMP TAG-7 ROOM"[range], "TAG-7 ");
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let set = RuleSet::new(
            &[],
            &["motor".to_string(), "  ".to_string()],
            &["Copyright".to_string()],
        )
        .unwrap();
        assert!(set.has_equipment_keyword("Motor 5HP"));
        assert!(!set.has_equipment_keyword("PUMP 5HP"));
        assert!(set.has_reject_keyword("COPYRIGHT 2020"));
    }
}
