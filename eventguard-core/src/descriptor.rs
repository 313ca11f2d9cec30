//! descriptor.rs - Typed form of the remotely-configured rule descriptor
//! document.
//!
//! Fetching and transporting the document is the embedder's concern; this
//! module only defines the shape the rest of the crate consumes, plus a thin
//! JSON parse helper for embedders that hold the raw text.
//!
//! License: MIT OR APACHE 2.0

use std::collections::HashMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::ValidatorError;

/// Top-level descriptor document: per-group rule sets plus named global
/// rule fragments shared by all groups.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorDocument {
    #[serde(default)]
    pub groups: Vec<GroupDescriptor>,
    /// Global rules: name to list of rule-string alternatives, referenced
    /// from group rules as `{enum#name}` or `{regexp#name}`.
    #[serde(default)]
    pub rules: HashMap<String, Vec<String>>,
}

/// Rules and applicability windows for one event group.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDescriptor {
    pub id: String,
    /// Product build ranges this group's rules apply to.
    #[serde(default)]
    pub builds: Vec<RangeDescriptor>,
    /// Rule-format version ranges this group's rules apply to.
    #[serde(default)]
    pub versions: Vec<RangeDescriptor>,
    #[serde(default)]
    pub rules: Option<GroupRulesDescriptor>,
}

/// A half-open applicability window. A missing bound leaves that side open;
/// a window with neither bound matches nothing.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeDescriptor {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

/// Rule strings for one group: event-id alternatives and per-field-path
/// event-data alternatives. Field paths are dot-joined key chains.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRulesDescriptor {
    #[serde(default)]
    pub event_id: Vec<String>,
    #[serde(default)]
    pub event_data: HashMap<String, Vec<String>>,
}

impl DescriptorDocument {
    /// Parses a descriptor document from its JSON text. An unparsable
    /// document is the one fatal failure of snapshot construction.
    pub fn from_json(text: &str) -> Result<Self, ValidatorError> {
        let document: DescriptorDocument = serde_json::from_str(text)?;
        debug!(
            "Parsed rule descriptor document: {} groups, {} global rules.",
            document.groups.len(),
            document.rules.len()
        );
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document() {
        let document = DescriptorDocument::from_json(
            r#"{
              "groups": [{
                "id": "my.group",
                "builds": [{"from": "183.1234"}],
                "versions": [{"from": "2", "to": "5"}],
                "rules": {
                  "event_id": ["{enum:opened|closed}"],
                  "event_data": {"count": ["{regexp:\\d+}"]}
                }
              }],
              "rules": {"myEnum": ["REF_AAA", "REF_BBB"]}
            }"#,
        )
        .unwrap();
        assert_eq!(document.groups.len(), 1);
        let group = &document.groups[0];
        assert_eq!(group.id, "my.group");
        assert_eq!(group.builds[0].from.as_deref(), Some("183.1234"));
        let rules = group.rules.as_ref().unwrap();
        assert_eq!(rules.event_id.len(), 1);
        assert!(rules.event_data.contains_key("count"));
        assert_eq!(document.rules["myEnum"].len(), 2);
    }

    #[test]
    fn test_parse_rejects_malformed_document() {
        assert!(DescriptorDocument::from_json("{ not json").is_err());
    }

    #[test]
    fn test_missing_sections_default_to_empty() {
        let document = DescriptorDocument::from_json(r#"{"groups": [{"id": "g"}]}"#).unwrap();
        assert!(document.rules.is_empty());
        assert!(document.groups[0].rules.is_none());
        assert!(document.groups[0].builds.is_empty());
    }
}
