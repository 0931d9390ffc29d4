//! Term store seam
//!
//! The tree filter never owns taxonomy data. It reads registered taxonomies
//! and their terms through [`TermStore`]; [`InMemoryTermStore`] backs the CLI
//! and tests and can be loaded from a JSON or YAML document:
//!
//! ```yaml
//! taxonomies:
//!   - meta:
//!       name: tnc_tax_region
//!       labels: { singular_name: Region }
//!     terms:
//!       - { term_id: 1, name: Europe }
//!       - { term_id: 2, name: France, parent: 1 }
//! ```

use crate::error::{Result, StoreError, TreeFilterError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tree_filter_types::TermId;

// =============================================================================
// DATA TYPES
// =============================================================================

/// Label set of a registered taxonomy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyLabels {
    #[serde(default)]
    pub singular_name: Option<String>,
}

/// Registered taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyMeta {
    /// Identifier, e.g. `tnc_tax_region`.
    pub name: String,
    /// Generic label.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub labels: TaxonomyLabels,
}

impl TaxonomyMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
            labels: TaxonomyLabels::default(),
        }
    }

    pub fn with_singular_name(mut self, singular: impl Into<String>) -> Self {
        self.labels.singular_name = Some(singular.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// One term as stored: a flat record with a parent pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub term_id: TermId,
    pub name: String,
    /// Parent term id, `0` for roots.
    #[serde(default)]
    pub parent: u64,
    /// Number of items tagged with the term.
    #[serde(default)]
    pub count: u64,
}

impl Term {
    pub fn new(term_id: TermId, name: impl Into<String>, parent: u64) -> Self {
        Self {
            term_id,
            name: name.into(),
            parent,
            count: 0,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent == 0
    }
}

/// Term lookup parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermQuery<'a> {
    pub taxonomy: &'a str,
    /// Restrict to direct children of this parent (`Some(0)` for roots).
    pub parent: Option<u64>,
    /// Skip terms with no tagged items.
    pub hide_empty: bool,
}

impl<'a> TermQuery<'a> {
    /// Every term of `taxonomy`, empty or not.
    pub fn all(taxonomy: &'a str) -> Self {
        Self {
            taxonomy,
            parent: None,
            hide_empty: false,
        }
    }

    /// Direct children of `parent`, empty or not.
    pub fn children_of(taxonomy: &'a str, parent: u64) -> Self {
        Self {
            taxonomy,
            parent: Some(parent),
            hide_empty: false,
        }
    }
}

// =============================================================================
// STORE TRAIT
// =============================================================================

/// Read-only source of taxonomies and terms.
pub trait TermStore {
    /// Every registered taxonomy, in registration order.
    fn taxonomies(&self) -> Vec<TaxonomyMeta>;

    /// Terms matching `query`, in store order.
    fn terms(&self, query: &TermQuery<'_>) -> std::result::Result<Vec<Term>, StoreError>;
}

impl<S: TermStore + ?Sized> TermStore for &S {
    fn taxonomies(&self) -> Vec<TaxonomyMeta> {
        (**self).taxonomies()
    }

    fn terms(&self, query: &TermQuery<'_>) -> std::result::Result<Vec<Term>, StoreError> {
        (**self).terms(query)
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub meta: TaxonomyMeta,
    #[serde(default)]
    pub terms: Vec<Term>,
}

/// Store backed by a document loaded up front.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InMemoryTermStore {
    #[serde(default)]
    taxonomies: Vec<TaxonomyEntry>,
}

impl InMemoryTermStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_taxonomy(mut self, meta: TaxonomyMeta, terms: Vec<Term>) -> Self {
        self.taxonomies.push(TaxonomyEntry { meta, terms });
        self
    }

    pub fn from_json_str(json: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| TreeFilterError::Json {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml_str(yaml: &str, origin: &Path) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|source| TreeFilterError::Yaml {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load a `.json`, `.yaml` or `.yml` file; other extensions are read as JSON.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TreeFilterError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&raw, path),
            _ => Self::from_json_str(&raw, path),
        }
    }

    fn entry(&self, taxonomy: &str) -> Option<&TaxonomyEntry> {
        self.taxonomies.iter().find(|entry| entry.meta.name == taxonomy)
    }
}

impl TermStore for InMemoryTermStore {
    fn taxonomies(&self) -> Vec<TaxonomyMeta> {
        self.taxonomies
            .iter()
            .map(|entry| entry.meta.clone())
            .collect()
    }

    fn terms(&self, query: &TermQuery<'_>) -> std::result::Result<Vec<Term>, StoreError> {
        let entry = self
            .entry(query.taxonomy)
            .ok_or_else(|| StoreError::UnknownTaxonomy(query.taxonomy.to_string()))?;

        Ok(entry
            .terms
            .iter()
            .filter(|term| query.parent.is_none_or(|parent| term.parent == parent))
            .filter(|term| !query.hide_empty || term.count > 0)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn id(raw: u64) -> TermId {
        TermId::new(raw).unwrap()
    }

    fn region_store() -> InMemoryTermStore {
        let mut leaf = Term::new(id(4), "Oceania", 0);
        leaf.count = 3;
        InMemoryTermStore::new().with_taxonomy(
            TaxonomyMeta::new("tnc_tax_region").with_singular_name("Region"),
            vec![
                Term::new(id(1), "Europe", 0),
                Term::new(id(2), "France", 1),
                Term::new(id(3), "Spain", 1),
                leaf,
            ],
        )
    }

    #[test]
    fn test_parent_filter() {
        let store = region_store();
        let roots = store
            .terms(&TermQuery::children_of("tnc_tax_region", 0))
            .unwrap();
        let names: Vec<&str> = roots.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Europe", "Oceania"]);

        let children = store
            .terms(&TermQuery::children_of("tnc_tax_region", 1))
            .unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(store.terms(&TermQuery::all("tnc_tax_region")).unwrap().len(), 4);
    }

    #[test]
    fn test_hide_empty() {
        let store = region_store();
        let query = TermQuery {
            hide_empty: true,
            ..TermQuery::all("tnc_tax_region")
        };
        let terms = store.terms(&query).unwrap();
        assert_eq!(terms.len(), 1);
        assert_eq!(terms[0].term_id, id(4));
    }

    #[test]
    fn test_unknown_taxonomy_is_an_error() {
        assert_eq!(
            region_store().terms(&TermQuery::all("tnc_tax_nope")),
            Err(StoreError::UnknownTaxonomy("tnc_tax_nope".into()))
        );
    }

    #[test]
    fn test_load_yaml_document() {
        let yaml = r#"
taxonomies:
  - meta:
      name: tnc_tax_region
      labels: { singular_name: Region, name: Regions }
    terms:
      - { term_id: 1, name: Europe }
      - { term_id: 2, name: France, parent: 1 }
"#;
        let store = InMemoryTermStore::from_yaml_str(yaml, Path::new("inline.yaml")).unwrap();
        let metas = store.taxonomies();
        assert_eq!(
            metas[0].labels,
            TaxonomyLabels {
                singular_name: Some("Region".into())
            }
        );
        let terms = store.terms(&TermQuery::all("tnc_tax_region")).unwrap();
        assert_eq!(terms[1].parent, 1);
    }

    #[test]
    fn test_zero_term_id_is_rejected_on_load() {
        let json = r#"{"taxonomies":[{"meta":{"name":"t"},"terms":[{"term_id":0,"name":"x"}]}]}"#;
        let err = InMemoryTermStore::from_json_str(json, Path::new("inline.json")).unwrap_err();
        assert!(matches!(err, TreeFilterError::Json { .. }));
    }
}
