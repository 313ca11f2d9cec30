//! matcher.rs - Evaluates compiled rule expressions against candidate
//! values.
//!
//! License: MIT OR APACHE 2.0

use log::warn;
use regex::{Regex, RegexBuilder};

use crate::escaper;
use crate::rules::compiler::{RuleExpression, RulePart};
use crate::rules::registry::GlobalRuleRegistry;
use crate::rules::{EventContext, UtilRuleProvider, ValidationResult};

const PATTERN_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Everything a rule needs at match time beyond the candidate value: the
/// snapshot's global fragments and the embedder's util matchers.
pub(crate) struct RuleScope<'a> {
    pub registry: &'a GlobalRuleRegistry,
    pub utils: &'a dyn UtilRuleProvider,
}

/// Collapses the soft separators that value escaping turns into
/// underscores, so a rule token like `NODE_REF_BBB` still matches the raw
/// form `NOD'E;REF:BBB`. Quote characters are dropped outright because
/// escaping removes them rather than replacing them.
pub(crate) fn normalize_soft_separators(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\'' | '"' => {}
            ' ' | ':' | ';' | ',' => out.push('_'),
            _ => out.push(c),
        }
    }
    out
}

impl RuleExpression {
    /// Evaluates this rule against a candidate value. Never ACCEPTED and
    /// never REJECTED at the same time: a rule either accepts, or reports
    /// why it could not.
    pub(crate) fn evaluate(
        &self,
        value: &str,
        context: &EventContext,
        scope: &RuleScope<'_>,
    ) -> ValidationResult {
        match self.parts() {
            [RulePart::Invalid] => ValidationResult::IncorrectRule,
            [RulePart::Literal(token)] => {
                matches_tokens(value, std::slice::from_ref(token))
            }
            [RulePart::Enum(tokens)] => matches_tokens(value, tokens),
            [RulePart::EnumRef(name)] => match scope.registry.enum_tokens(name) {
                Some(tokens) => matches_tokens(value, tokens),
                None => ValidationResult::IncorrectRule,
            },
            [RulePart::UtilRef(name)] => match scope.utils.resolve(name) {
                Some(util) => util.matches(value, context).into(),
                None => ValidationResult::IncorrectRule,
            },
            [RulePart::RegexpRef(name)] => match scope.registry.pattern(name) {
                Some(pattern) => matches_pattern(value, pattern),
                None => ValidationResult::IncorrectRule,
            },
            _ => self.evaluate_sequence(value, scope),
        }
    }

    /// Matches a standalone pattern or a multi-part sequence through one
    /// assembled anchored regex. `{util#...}` has no regex form, so a util
    /// reference inside a sequence makes the whole rule incorrect.
    fn evaluate_sequence(&self, value: &str, scope: &RuleScope<'_>) -> ValidationResult {
        let assembled = self
            .regex_cache
            .get_or_init(|| assemble_sequence_regex(self.parts(), scope.registry));
        match assembled {
            Some(pattern) => matches_pattern(value, pattern),
            None => ValidationResult::IncorrectRule,
        }
    }
}

/// Normalized token-set match: exact containment after soft-separator
/// normalization of both sides.
fn matches_tokens(value: &str, tokens: &[String]) -> ValidationResult {
    let normalized = normalize_soft_separators(value);
    let accepted = tokens
        .iter()
        .any(|token| normalize_soft_separators(token) == normalized);
    if accepted {
        ValidationResult::Accepted
    } else {
        ValidationResult::Rejected
    }
}

/// Anchored regex match: the raw value first, then the legacy-escaped form
/// for values that predate strict client-side escaping.
fn matches_pattern(value: &str, pattern: &Regex) -> ValidationResult {
    if pattern.is_match(value) {
        return ValidationResult::Accepted;
    }
    if let Some(cleaned) = escaper::cleanup_for_legacy_rules(value) {
        if pattern.is_match(&cleaned) {
            return ValidationResult::Accepted;
        }
    }
    ValidationResult::Rejected
}

fn assemble_sequence_regex(
    parts: &[RulePart],
    registry: &GlobalRuleRegistry,
) -> Option<Regex> {
    let mut source = String::from(r"\A(?:");
    for part in parts {
        match part {
            RulePart::Literal(text) => source.push_str(&regex::escape(text)),
            RulePart::Regexp(pattern) => {
                source.push_str("(?:");
                source.push_str(pattern);
                source.push(')');
            }
            RulePart::Enum(tokens) => {
                let escaped: Vec<String> = tokens.iter().map(|t| regex::escape(t)).collect();
                source.push_str("(?:");
                source.push_str(&escaped.join("|"));
                source.push(')');
            }
            RulePart::EnumRef(name) => {
                source.push_str(&registry.enum_pattern_source(name)?);
            }
            RulePart::RegexpRef(name) => {
                source.push_str("(?:");
                source.push_str(registry.pattern_source(name)?);
                source.push(')');
            }
            RulePart::UtilRef(_) | RulePart::Invalid => return None,
        }
    }
    source.push_str(r")\z");
    match RegexBuilder::new(&source).size_limit(PATTERN_SIZE_LIMIT).build() {
        Ok(pattern) => Some(pattern),
        Err(err) => {
            warn!("Failed to assemble rule pattern: {err}");
            None
        }
    }
}

/// Evaluates a list of alternative rules for one field.
///
/// An empty list means the field has no rules at all. Otherwise the first
/// accepting rule wins; if none accepts, the strongest failure is reported:
/// THIRD_PARTY over INCORRECT_RULE over REJECTED.
pub(crate) fn evaluate_alternatives(
    rules: &[RuleExpression],
    value: &str,
    context: &EventContext,
    scope: &RuleScope<'_>,
) -> ValidationResult {
    if rules.is_empty() {
        return ValidationResult::UndefinedRule;
    }
    let mut worst = ValidationResult::Rejected;
    for rule in rules {
        let result = rule.evaluate(value, context, scope);
        if result.is_accepted() {
            return result;
        }
        if result.negative_priority() > worst.negative_priority() {
            worst = result;
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use super::*;
    use crate::rules::{NoUtilRules, UtilMatch, UtilRule};

    struct PrefixUtil(&'static str);

    impl UtilRule for PrefixUtil {
        fn matches(&self, value: &str, _context: &EventContext) -> UtilMatch {
            if value.starts_with(self.0) {
                UtilMatch::Accepted
            } else {
                UtilMatch::ThirdParty
            }
        }
    }

    struct OneUtil(Arc<dyn UtilRule>);

    impl UtilRuleProvider for OneUtil {
        fn resolve(&self, name: &str) -> Option<Arc<dyn UtilRule>> {
            (name == "prefix").then(|| Arc::clone(&self.0))
        }
    }

    fn context() -> EventContext {
        EventContext { event_id: "event".to_string(), event_data: HashMap::new() }
    }

    fn empty_registry() -> GlobalRuleRegistry {
        GlobalRuleRegistry::build(&HashMap::new())
    }

    fn evaluate(rule: &str, value: &str, registry: &GlobalRuleRegistry) -> ValidationResult {
        let scope = RuleScope { registry, utils: &NoUtilRules };
        RuleExpression::compile_lossy(rule).evaluate(value, &context(), &scope)
    }

    #[test]
    fn test_enum_rule_matches_exact_tokens() {
        let registry = empty_registry();
        assert_eq!(evaluate("{enum:AAA|BBB}", "AAA", &registry), ValidationResult::Accepted);
        assert_eq!(evaluate("{enum:AAA|BBB}", "CCC", &registry), ValidationResult::Rejected);
        assert_eq!(evaluate("{enum:AAA|BBB}", "AA", &registry), ValidationResult::Rejected);
    }

    #[test]
    fn test_enum_rule_normalizes_soft_separators() {
        let registry = empty_registry();
        assert_eq!(
            evaluate("{enum:NODE_REF_BBB}", "NOD'E;REF:BBB", &registry),
            ValidationResult::Accepted
        );
        assert_eq!(
            evaluate("{enum:NODE_REF_BBB}", "NODE REF,BBB", &registry),
            ValidationResult::Accepted
        );
    }

    #[test]
    fn test_literal_rule_is_singleton_enum() {
        let registry = empty_registry();
        assert_eq!(evaluate("loaded", "loaded", &registry), ValidationResult::Accepted);
        assert_eq!(evaluate("loaded", "unloaded", &registry), ValidationResult::Rejected);
    }

    #[test]
    fn test_regexp_rule_is_anchored() {
        let registry = empty_registry();
        assert_eq!(evaluate(r"{regexp:\d+}", "123", &registry), ValidationResult::Accepted);
        assert_eq!(evaluate(r"{regexp:\d+}", "123abc", &registry), ValidationResult::Rejected);
        assert_eq!(evaluate(r"{regexp:\d+}", "abc123", &registry), ValidationResult::Rejected);
    }

    #[test]
    fn test_regexp_rule_falls_back_to_legacy_cleanup() {
        let registry = empty_registry();
        assert_eq!(
            evaluate(r"{regexp:[\d_]+}", "12: 3", &registry),
            ValidationResult::Accepted
        );
    }

    #[test]
    fn test_sequence_rule_matches_whole_value() {
        let registry = empty_registry();
        let rule = r"count_{regexp:\d+}_{enum:items|bytes}";
        assert_eq!(evaluate(rule, "count_42_items", &registry), ValidationResult::Accepted);
        assert_eq!(evaluate(rule, "count_42_lines", &registry), ValidationResult::Rejected);
        assert_eq!(evaluate(rule, "xcount_42_items", &registry), ValidationResult::Rejected);
    }

    #[test]
    fn test_global_references_resolve_through_registry() {
        let mut rules = HashMap::new();
        rules.insert("myEnum".to_string(), vec!["REF_AAA".to_string(), "REF_BBB".to_string()]);
        rules.insert("integer".to_string(), vec![r"{regexp:-?\d+}".to_string()]);
        let registry = GlobalRuleRegistry::build(&rules);

        assert_eq!(evaluate("{enum#myEnum}", "REF_AAA", &registry), ValidationResult::Accepted);
        assert_eq!(evaluate("{enum#myEnum}", "REF_XXX", &registry), ValidationResult::Rejected);
        assert_eq!(evaluate("{regexp#integer}", "-17", &registry), ValidationResult::Accepted);
        assert_eq!(
            evaluate("{enum#missing}", "REF_AAA", &registry),
            ValidationResult::IncorrectRule
        );
        assert_eq!(
            evaluate("{regexp#missing}", "-17", &registry),
            ValidationResult::IncorrectRule
        );
    }

    #[test]
    fn test_global_references_embed_in_sequences() {
        let mut rules = HashMap::new();
        rules.insert("integer".to_string(), vec![r"{regexp:\d+}".to_string()]);
        let registry = GlobalRuleRegistry::build(&rules);
        assert_eq!(
            evaluate("v{regexp#integer}.{regexp#integer}", "v12.3", &registry),
            ValidationResult::Accepted
        );
        assert_eq!(
            evaluate("v{regexp#integer}.{regexp#integer}", "v12.x", &registry),
            ValidationResult::Rejected
        );
    }

    #[test]
    fn test_util_rule_resolution() {
        let registry = empty_registry();
        let provider = OneUtil(Arc::new(PrefixUtil("com.vendor.")));
        let scope = RuleScope { registry: &registry, utils: &provider };
        let ctx = context();

        let rule = RuleExpression::compile_lossy("{util#prefix}");
        assert_eq!(
            rule.evaluate("com.vendor.Thing", &ctx, &scope),
            ValidationResult::Accepted
        );
        assert_eq!(rule.evaluate("org.other.Thing", &ctx, &scope), ValidationResult::ThirdParty);

        let unknown = RuleExpression::compile_lossy("{util#unknown}");
        assert_eq!(
            unknown.evaluate("com.vendor.Thing", &ctx, &scope),
            ValidationResult::IncorrectRule
        );
    }

    #[test]
    fn test_util_inside_sequence_is_incorrect() {
        let registry = empty_registry();
        let provider = OneUtil(Arc::new(PrefixUtil("com.vendor.")));
        let scope = RuleScope { registry: &registry, utils: &provider };
        let rule = RuleExpression::compile_lossy("prefix_{util#prefix}");
        assert_eq!(
            rule.evaluate("prefix_com.vendor.Thing", &context(), &scope),
            ValidationResult::IncorrectRule
        );
    }

    #[test]
    fn test_invalid_rule_is_incorrect() {
        let registry = empty_registry();
        assert_eq!(evaluate("{enum:AAA", "AAA", &registry), ValidationResult::IncorrectRule);
    }

    #[test]
    fn test_alternatives_short_circuit_on_accept() {
        let registry = empty_registry();
        let scope = RuleScope { registry: &registry, utils: &NoUtilRules };
        let rules = vec![
            RuleExpression::compile_lossy("{enum:AAA"),
            RuleExpression::compile_lossy("{enum:BBB}"),
        ];
        assert_eq!(
            evaluate_alternatives(&rules, "BBB", &context(), &scope),
            ValidationResult::Accepted
        );
    }

    #[test]
    fn test_alternatives_report_strongest_failure() {
        let registry = empty_registry();
        let provider = OneUtil(Arc::new(PrefixUtil("com.vendor.")));
        let scope = RuleScope { registry: &registry, utils: &provider };

        let rejected_then_incorrect = vec![
            RuleExpression::compile_lossy("{enum:BBB}"),
            RuleExpression::compile_lossy("{enum:AAA"),
        ];
        assert_eq!(
            evaluate_alternatives(&rejected_then_incorrect, "CCC", &context(), &scope),
            ValidationResult::IncorrectRule
        );

        let third_party_then_incorrect = vec![
            RuleExpression::compile_lossy("{util#prefix}"),
            RuleExpression::compile_lossy("{enum:AAA"),
        ];
        assert_eq!(
            evaluate_alternatives(&third_party_then_incorrect, "org.other.Thing", &context(), &scope),
            ValidationResult::ThirdParty
        );
    }

    #[test]
    fn test_no_alternatives_means_undefined_rule() {
        let registry = empty_registry();
        let scope = RuleScope { registry: &registry, utils: &NoUtilRules };
        assert_eq!(
            evaluate_alternatives(&[], "anything", &context(), &scope),
            ValidationResult::UndefinedRule
        );
    }
}
