//! compiler.rs - Parses rule strings into compiled rule expressions.
//!
//! A rule string is literal text interleaved with directives:
//! `{enum:a|b|c}`, `{regexp:<pattern>}`, `{enum#globalName}`,
//! `{regexp#globalName}` and `{util#ruleName}`. Compilation produces a
//! sequence of parts that anchors end-to-end against the candidate value.
//! Global references stay symbolic and are resolved against the current
//! snapshot's registry at match time.
//!
//! License: MIT OR APACHE 2.0

use log::warn;
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::errors::ValidatorError;

/// One segment of a compiled rule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulePart {
    /// Literal text that must appear verbatim.
    Literal(String),
    /// An inline token set, `{enum:a|b|c}`. Tokens may be empty.
    Enum(Vec<String>),
    /// An inline pattern, `{regexp:...}`.
    Regexp(String),
    /// Symbolic reference to a global enum fragment, `{enum#name}`.
    EnumRef(String),
    /// Symbolic reference to a global pattern fragment, `{regexp#name}`.
    RegexpRef(String),
    /// Reference to an embedder-supplied util matcher, `{util#name}`.
    UtilRef(String),
    /// Placeholder for a rule that failed to parse; always evaluates to
    /// INCORRECT_RULE.
    Invalid,
}

/// A compiled rule: an ordered sequence of parts matched against the whole
/// candidate value, never a substring.
#[derive(Debug, Clone)]
pub struct RuleExpression {
    pub(crate) parts: Vec<RulePart>,
    /// Assembled anchored regex for sequence matching, built on first use.
    /// `Some(None)` records a failed assembly. Sound to cache because the
    /// expression and the registry it resolves against belong to the same
    /// immutable snapshot.
    pub(crate) regex_cache: OnceCell<Option<Regex>>,
}

impl PartialEq for RuleExpression {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl RuleExpression {
    pub(crate) fn from_parts(parts: Vec<RulePart>) -> Self {
        Self { parts, regex_cache: OnceCell::new() }
    }

    pub fn parts(&self) -> &[RulePart] {
        &self.parts
    }

    /// Compiles one rule string. Directive scanning tracks brace depth so
    /// patterns containing quantifiers like `\d{2,3}` parse correctly.
    pub fn compile(rule: &str) -> Result<Self, ValidatorError> {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let chars: Vec<char> = rule.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            if chars[i] != '{' {
                literal.push(chars[i]);
                i += 1;
                continue;
            }
            let start = i + 1;
            let mut depth = 1;
            let mut end = None;
            let mut j = start;
            while j < chars.len() {
                match chars[j] {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            end = Some(j);
                            break;
                        }
                    }
                    _ => {}
                }
                j += 1;
            }
            let Some(end) = end else {
                return Err(parse_error(rule, "unbalanced '{'"));
            };
            if !literal.is_empty() {
                parts.push(RulePart::Literal(std::mem::take(&mut literal)));
            }
            let directive: String = chars[start..end].iter().collect();
            parts.push(parse_directive(rule, &directive)?);
            i = end + 1;
        }
        if !literal.is_empty() {
            parts.push(RulePart::Literal(literal));
        }
        if parts.is_empty() {
            // An empty rule string matches only the empty value.
            parts.push(RulePart::Literal(String::new()));
        }
        Ok(Self::from_parts(parts))
    }

    /// Like [`RuleExpression::compile`], but degrades an unparsable rule to
    /// an always-INCORRECT_RULE expression instead of failing the whole
    /// snapshot build.
    pub(crate) fn compile_lossy(rule: &str) -> Self {
        match Self::compile(rule) {
            Ok(expression) => expression,
            Err(err) => {
                warn!("Skipping unparsable validation rule: {err}");
                Self::from_parts(vec![RulePart::Invalid])
            }
        }
    }
}

fn parse_directive(rule: &str, directive: &str) -> Result<RulePart, ValidatorError> {
    if let Some(tokens) = directive.strip_prefix("enum:") {
        return Ok(RulePart::Enum(tokens.split('|').map(str::to_string).collect()));
    }
    if let Some(pattern) = directive.strip_prefix("regexp:") {
        return Ok(RulePart::Regexp(pattern.to_string()));
    }
    if let Some(name) = directive.strip_prefix("enum#") {
        return Ok(RulePart::EnumRef(name.to_string()));
    }
    if let Some(name) = directive.strip_prefix("regexp#") {
        return Ok(RulePart::RegexpRef(name.to_string()));
    }
    if let Some(name) = directive.strip_prefix("util#") {
        return Ok(RulePart::UtilRef(name.to_string()));
    }
    Err(parse_error(rule, &format!("unknown directive '{{{directive}}}'")))
}

fn parse_error(rule: &str, reason: &str) -> ValidatorError {
    ValidatorError::RuleParse { rule: rule.to_string(), reason: reason.to_string() }
}
