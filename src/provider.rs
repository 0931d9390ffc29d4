//! Tree Provider
//!
//! Query layer over a [`TermStore`]: which taxonomies get a tree, what they
//! are called, which terms exist, which are selected. Every lookup is
//! fail-soft - a store error is logged and turns into an empty result.

use crate::config::TreeFilterConfig;
use crate::error::Result;
use crate::store::{TaxonomyMeta, Term, TermQuery, TermStore};
use std::collections::HashSet;
use tree_filter_types::{unique_terms, ClauseCodec, QueryParams, TermId};

/// Title used when a taxonomy has no usable label.
pub const FALLBACK_TITLE: &str = "Taxonomy";

/// Display title: singular label, then generic label, then raw name.
pub fn taxonomy_title(meta: &TaxonomyMeta) -> String {
    [
        meta.labels.singular_name.as_deref(),
        meta.label.as_deref(),
        Some(meta.name.as_str()),
    ]
    .into_iter()
    .flatten()
    .find(|candidate| !candidate.is_empty())
    .unwrap_or(FALLBACK_TITLE)
    .to_string()
}

pub struct TreeProvider<S> {
    store: S,
    taxonomy_prefix: String,
    codec: ClauseCodec,
}

impl<S: TermStore> TreeProvider<S> {
    pub fn new(store: S, config: &TreeFilterConfig) -> Result<Self> {
        Ok(Self::with_codec(
            store,
            config.taxonomy_prefix.clone(),
            config.codec()?,
        ))
    }

    pub fn with_codec(store: S, taxonomy_prefix: impl Into<String>, codec: ClauseCodec) -> Self {
        Self {
            store,
            taxonomy_prefix: taxonomy_prefix.into(),
            codec,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn codec(&self) -> &ClauseCodec {
        &self.codec
    }

    /// Registered taxonomies under the configured prefix, registration order.
    pub fn target_taxonomies(&self) -> Vec<TaxonomyMeta> {
        let mut seen = HashSet::new();
        self.store
            .taxonomies()
            .into_iter()
            .filter(|meta| meta.name.starts_with(self.taxonomy_prefix.as_str()))
            .filter(|meta| seen.insert(meta.name.clone()))
            .collect()
    }

    /// Term ids the request selects for `taxonomy`. Order carries no meaning.
    pub fn selected_term_ids(&self, taxonomy: &str, params: &QueryParams) -> Vec<TermId> {
        self.codec.selected_terms(params, taxonomy)
    }

    /// Every term id of `taxonomy`, including terms with no items.
    pub fn all_term_ids(&self, taxonomy: &str) -> Vec<TermId> {
        unique_terms(
            self.fetch(&TermQuery::all(taxonomy))
                .into_iter()
                .map(|term| term.term_id),
        )
    }

    /// Top-level terms of `taxonomy`.
    pub fn tree_roots(&self, taxonomy: &str) -> Vec<Term> {
        self.fetch(&TermQuery::children_of(taxonomy, 0))
    }

    /// Direct children of `parent`.
    pub fn children(&self, taxonomy: &str, parent: TermId) -> Vec<Term> {
        self.fetch(&TermQuery::children_of(taxonomy, parent.get()))
    }

    fn fetch(&self, query: &TermQuery<'_>) -> Vec<Term> {
        match self.store.terms(query) {
            Ok(terms) => terms,
            Err(e) => {
                tracing::warn!(
                    taxonomy = query.taxonomy,
                    parent = ?query.parent,
                    "term lookup failed, treating as empty: {}",
                    e
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::store::InMemoryTermStore;
    use pretty_assertions::assert_eq;

    fn id(raw: u64) -> TermId {
        TermId::new(raw).unwrap()
    }

    fn provider() -> TreeProvider<InMemoryTermStore> {
        let store = InMemoryTermStore::new()
            .with_taxonomy(
                TaxonomyMeta::new("tnc_tax_region").with_singular_name("Region"),
                vec![
                    Term::new(id(1), "Europe", 0),
                    Term::new(id(2), "France", 1),
                    Term::new(id(1), "Europe (dup)", 0),
                ],
            )
            .with_taxonomy(TaxonomyMeta::new("category"), vec![])
            .with_taxonomy(TaxonomyMeta::new("tnc_tax_2").with_label("Subjects"), vec![]);
        TreeProvider::new(store, &TreeFilterConfig::default()).unwrap()
    }

    struct BrokenStore;

    impl TermStore for BrokenStore {
        fn taxonomies(&self) -> Vec<TaxonomyMeta> {
            vec![TaxonomyMeta::new("tnc_tax_region")]
        }

        fn terms(&self, _query: &TermQuery<'_>) -> std::result::Result<Vec<Term>, StoreError> {
            Err(StoreError::Unavailable("connection reset".into()))
        }
    }

    #[test]
    fn test_title_priority() {
        let mut meta = TaxonomyMeta::new("tnc_tax_x")
            .with_label("Generic")
            .with_singular_name("Singular");
        assert_eq!(taxonomy_title(&meta), "Singular");

        meta.labels.singular_name = Some(String::new());
        assert_eq!(taxonomy_title(&meta), "Generic");

        meta.label = None;
        assert_eq!(taxonomy_title(&meta), "tnc_tax_x");

        meta.name.clear();
        assert_eq!(taxonomy_title(&meta), FALLBACK_TITLE);
    }

    #[test]
    fn test_target_taxonomies_match_prefix() {
        let names: Vec<String> = provider()
            .target_taxonomies()
            .into_iter()
            .map(|meta| meta.name)
            .collect();
        assert_eq!(names, vec!["tnc_tax_region", "tnc_tax_2"]);
    }

    #[test]
    fn test_selected_term_ids_from_request() {
        let params = QueryParams::parse(
            "clauseSet[0][taxonomy]=tnc_tax_2&clauseSet[0][terms][0]=5&clauseSet[0][terms][1]=9",
        );
        let mut selected = provider().selected_term_ids("tnc_tax_2", &params);
        selected.sort();
        assert_eq!(selected, vec![id(5), id(9)]);
        assert!(provider().selected_term_ids("tnc_tax_region", &params).is_empty());
    }

    #[test]
    fn test_all_term_ids_dedup() {
        assert_eq!(provider().all_term_ids("tnc_tax_region"), vec![id(1), id(2)]);
    }

    #[test]
    fn test_roots_and_children() {
        let provider = provider();
        assert_eq!(provider.tree_roots("tnc_tax_region").len(), 2);
        let children = provider.children("tnc_tax_region", id(1));
        assert_eq!(children[0].name, "France");
        assert!(provider.tree_roots("tnc_tax_2").is_empty());
    }

    #[test]
    fn test_store_errors_become_empty() {
        let provider =
            TreeProvider::with_codec(BrokenStore, "tnc_tax_", ClauseCodec::default());
        assert!(provider.all_term_ids("tnc_tax_region").is_empty());
        assert!(provider.tree_roots("tnc_tax_region").is_empty());
        assert!(provider.children("tnc_tax_region", id(1)).is_empty());
        assert!(provider.tree_roots("tnc_tax_unknown").is_empty());
    }
}
