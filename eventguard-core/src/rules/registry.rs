//! registry.rs - Named global rule fragments shared by all groups in one
//! snapshot.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;

use log::warn;
use regex::{Regex, RegexBuilder};

use crate::rules::compiler::{RuleExpression, RulePart};
use crate::rules::matcher::normalize_soft_separators;

/// Compiled size limit mirrors the rule-compilation limit used for group
/// rules.
const PATTERN_SIZE_LIMIT: usize = 10 * (1 << 20);

/// One named fragment. A fragment has up to two interpretations derived
/// from its alternatives: a token set served to `{enum#name}` references
/// and a pattern served to `{regexp#name}` references.
#[derive(Debug, Default)]
struct GlobalFragment {
    /// Soft-separator-normalized tokens from enum and literal alternatives.
    enum_tokens: Vec<String>,
    /// Alternation source for embedding into sequence regexes.
    pattern_source: Option<String>,
    /// Pre-compiled anchored form of `pattern_source` for standalone
    /// references.
    pattern: Option<Regex>,
}

/// Mapping from global rule name to compiled fragment. Built fresh per
/// snapshot, read-only after construction.
#[derive(Debug, Default)]
pub struct GlobalRuleRegistry {
    fragments: HashMap<String, GlobalFragment>,
}

impl GlobalRuleRegistry {
    /// Builds the registry from the descriptor document's `rules` map. A
    /// broken alternative or an uncompilable pattern disables that part of
    /// the fragment rather than failing the snapshot; references to it
    /// yield INCORRECT_RULE.
    pub fn build(rules: &HashMap<String, Vec<String>>) -> Self {
        let mut fragments = HashMap::with_capacity(rules.len());
        for (name, alternatives) in rules {
            fragments.insert(name.clone(), compile_fragment(name, alternatives));
        }
        Self { fragments }
    }

    /// Normalized token set for `{enum#name}`, or `None` if the name is
    /// unknown or has no enum interpretation.
    pub(crate) fn enum_tokens(&self, name: &str) -> Option<&[String]> {
        let tokens = &self.fragments.get(name)?.enum_tokens;
        if tokens.is_empty() {
            None
        } else {
            Some(tokens)
        }
    }

    /// Alternation fragment for embedding an `{enum#name}` reference into
    /// a sequence regex.
    pub(crate) fn enum_pattern_source(&self, name: &str) -> Option<String> {
        let tokens = self.enum_tokens(name)?;
        let escaped: Vec<String> = tokens.iter().map(|t| regex::escape(t)).collect();
        Some(format!("(?:{})", escaped.join("|")))
    }

    /// Anchored pattern for a standalone `{regexp#name}` reference.
    pub(crate) fn pattern(&self, name: &str) -> Option<&Regex> {
        self.fragments.get(name)?.pattern.as_ref()
    }

    /// Alternation fragment for embedding a `{regexp#name}` reference into
    /// a sequence regex.
    pub(crate) fn pattern_source(&self, name: &str) -> Option<&str> {
        self.fragments.get(name)?.pattern_source.as_deref()
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

fn compile_fragment(name: &str, alternatives: &[String]) -> GlobalFragment {
    let mut enum_tokens: Vec<String> = Vec::new();
    let mut pattern_alternatives: Vec<String> = Vec::new();

    for alternative in alternatives {
        let expression = match RuleExpression::compile(alternative) {
            Ok(expression) => expression,
            Err(err) => {
                warn!("Global rule '{name}': {err}");
                continue;
            }
        };
        match expression.parts() {
            [RulePart::Literal(text)] => {
                let normalized = normalize_soft_separators(text);
                if !enum_tokens.contains(&normalized) {
                    enum_tokens.push(normalized);
                }
                pattern_alternatives.push(regex::escape(text));
            }
            [RulePart::Enum(tokens)] => {
                for token in tokens {
                    let normalized = normalize_soft_separators(token);
                    if !enum_tokens.contains(&normalized) {
                        enum_tokens.push(normalized);
                    }
                }
            }
            [RulePart::Regexp(pattern)] => {
                pattern_alternatives.push(format!("(?:{pattern})"));
            }
            _ => {
                warn!(
                    "Global rule '{name}': alternative '{alternative}' is not a \
                     plain enum, literal or pattern and was skipped."
                );
            }
        }
    }

    let mut fragment = GlobalFragment { enum_tokens, ..Default::default() };
    if !pattern_alternatives.is_empty() {
        let source = pattern_alternatives.join("|");
        match RegexBuilder::new(&format!(r"\A(?:{source})\z"))
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
        {
            Ok(regex) => {
                fragment.pattern_source = Some(source);
                fragment.pattern = Some(regex);
            }
            Err(err) => {
                warn!("Global rule '{name}' has an invalid pattern: {err}");
            }
        }
    }
    fragment
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(entries: &[(&str, &[&str])]) -> GlobalRuleRegistry {
        let rules = entries
            .iter()
            .map(|(name, alts)| {
                (name.to_string(), alts.iter().map(|a| a.to_string()).collect())
            })
            .collect();
        GlobalRuleRegistry::build(&rules)
    }

    #[test]
    fn test_literal_alternatives_become_enum_tokens() {
        let registry = registry(&[("myEnum", &["REF_AAA", "REF_BBB", "REF_CCC"])]);
        let tokens = registry.enum_tokens("myEnum").unwrap();
        assert_eq!(tokens, &["REF_AAA", "REF_BBB", "REF_CCC"]);
    }

    #[test]
    fn test_regexp_alternatives_become_pattern() {
        let registry = registry(&[("integer", &[r"{regexp:-?\d+}"])]);
        let pattern = registry.pattern("integer").unwrap();
        assert!(pattern.is_match("42"));
        assert!(pattern.is_match("-7"));
        assert!(!pattern.is_match("42 items"));
        assert!(registry.enum_tokens("integer").is_none());
    }

    #[test]
    fn test_unknown_name_resolves_to_nothing() {
        let registry = registry(&[]);
        assert!(registry.enum_tokens("missing").is_none());
        assert!(registry.pattern("missing").is_none());
    }

    #[test]
    fn test_invalid_pattern_disables_fragment() {
        let registry = registry(&[("broken", &[r"{regexp:[unclosed}"])]);
        assert!(registry.pattern("broken").is_none());
        assert!(registry.pattern_source("broken").is_none());
    }

    #[test]
    fn test_enum_pattern_source_escapes_tokens() {
        let registry = registry(&[("dotted", &["{enum:a.b|c.d}"])]);
        assert_eq!(registry.enum_pattern_source("dotted").as_deref(), Some(r"(?:a\.b|c\.d)"));
    }
}
