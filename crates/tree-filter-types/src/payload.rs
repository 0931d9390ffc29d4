//! Configuration payload handed from the server layer to the client layer.

use crate::term::TermId;
use serde::{Deserialize, Serialize};

/// Per-taxonomy entry of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    #[serde(default)]
    pub taxonomy: String,
    /// Display title; used to match the native widget.
    #[serde(default)]
    pub title: String,
    /// Every term id of the taxonomy.
    #[serde(default)]
    pub term_ids: Vec<TermId>,
}

/// Payload embedded in the page before the templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeFilterPayload {
    #[serde(default)]
    pub filters: Vec<FilterConfig>,
    /// Query-string namespace the server reads clauses from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_namespace: Option<String>,
}

impl TreeFilterPayload {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_payload_wire_shape() {
        let payload = TreeFilterPayload {
            filters: vec![FilterConfig {
                taxonomy: "tnc_tax_region".into(),
                title: "Region".into(),
                term_ids: vec![TermId::new(1).unwrap(), TermId::new(4).unwrap()],
            }],
            clause_namespace: None,
        };
        assert_eq!(
            payload.to_json().unwrap(),
            r#"{"filters":[{"taxonomy":"tnc_tax_region","title":"Region","termIds":[1,4]}]}"#
        );
    }

    #[test]
    fn test_payload_tolerates_missing_fields() {
        let payload =
            TreeFilterPayload::from_json(r#"{"filters":[{"taxonomy":"t"},{}],"clauseNamespace":"taxquery"}"#)
                .unwrap();
        assert_eq!(payload.filters.len(), 2);
        assert_eq!(payload.filters[0].title, "");
        assert!(payload.filters[1].taxonomy.is_empty());
        assert_eq!(payload.clause_namespace.as_deref(), Some("taxquery"));

        assert_eq!(TreeFilterPayload::from_json("{}").unwrap(), TreeFilterPayload::default());
    }
}
