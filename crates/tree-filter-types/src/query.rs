//! Multi-clause taxonomy query encoding
//!
//! Taxonomy filters live in the query string as positional clause groups:
//!
//! ```text
//! clauseSet[0][taxonomy]=tnc_tax_region
//! clauseSet[0][compare]=IN
//! clauseSet[0][terms][0]=2
//! clauseSet[0][terms][1]=4
//! ```
//!
//! Decoding tolerates gaps in clause indices, missing `compare` and junk
//! term values. Encoding always rewrites the namespace with contiguous
//! indices and leaves every other parameter alone.

use crate::term::TermId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::LazyLock;
use thiserror::Error;
use url::{form_urlencoded, Url};

/// Namespace used when no other is configured.
pub const DEFAULT_CLAUSE_NAMESPACE: &str = "clauseSet";

/// Comparison operator applied when a clause carries none.
pub const DEFAULT_COMPARE: &str = "IN";

/// `<namespace>[<index>][<field>]` with an optional `[<termIndex>]` suffix.
static CLAUSE_KEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([^\[\]]+)\[(\d+)\]\[(taxonomy|compare|terms)\](?:\[(\d+)\])?$").unwrap()
});

// =============================================================================
// QUERY CLAUSE
// =============================================================================

/// One taxonomy-scoped filter condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryClause {
    pub taxonomy: String,
    #[serde(default = "default_compare")]
    pub compare: String,
    pub terms: Vec<TermId>,
}

fn default_compare() -> String {
    DEFAULT_COMPARE.to_string()
}

impl QueryClause {
    /// Clause matching any of `terms`.
    pub fn new_in(taxonomy: impl Into<String>, terms: Vec<TermId>) -> Self {
        Self {
            taxonomy: taxonomy.into(),
            compare: default_compare(),
            terms,
        }
    }

    /// Whether the clause survives a decode: named taxonomy, at least one term.
    pub fn is_valid(&self) -> bool {
        !self.taxonomy.is_empty() && !self.terms.is_empty()
    }
}

// =============================================================================
// QUERY PARAMS
// =============================================================================

/// Ordered query parameters. Keys may repeat, order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string, with or without the leading `?`.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    pub fn from_url(url: &Url) -> Self {
        url.query_pairs().into_owned().collect()
    }

    /// First value stored under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &str) -> bool) {
        self.pairs.retain(|(k, v)| keep(k, v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` serialization, no leading `?`.
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }

    /// Overwrite the query component of `url` with these parameters.
    pub fn apply_to(&self, url: &mut Url) {
        if self.pairs.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&self.to_query_string()));
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

// =============================================================================
// CLAUSE CODEC
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("clause namespace must not be empty")]
    EmptyNamespace,

    #[error("clause namespace '{0}' must not contain brackets")]
    BracketInNamespace(String),
}

/// Reads and writes clause groups under one query-string namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClauseCodec {
    namespace: String,
}

impl Default for ClauseCodec {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_CLAUSE_NAMESPACE.to_string(),
        }
    }
}

/// Clause fields collected for one index before validation.
#[derive(Debug, Default)]
struct ClauseDraft {
    taxonomy: Option<String>,
    compare: Option<String>,
    terms: BTreeMap<u64, TermId>,
}

impl ClauseDraft {
    fn push_term(&mut self, position: Option<u64>, term: TermId) {
        let slot = position.unwrap_or_else(|| {
            self.terms
                .keys()
                .next_back()
                .map_or(0, |last| last.saturating_add(1))
        });
        self.terms.insert(slot, term);
    }

    fn finish(self) -> Option<QueryClause> {
        let taxonomy = self.taxonomy.filter(|t| !t.is_empty())?;
        if self.terms.is_empty() {
            return None;
        }
        Some(QueryClause {
            taxonomy,
            compare: self
                .compare
                .filter(|c| !c.is_empty())
                .unwrap_or_else(default_compare),
            terms: self.terms.into_values().collect(),
        })
    }
}

impl ClauseCodec {
    pub fn new(namespace: impl Into<String>) -> Result<Self, CodecError> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(CodecError::EmptyNamespace);
        }
        if namespace.contains(['[', ']']) {
            return Err(CodecError::BracketInNamespace(namespace));
        }
        Ok(Self { namespace })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Whether `key` lives under this codec's namespace.
    pub fn owns_key(&self, key: &str) -> bool {
        key.strip_prefix(self.namespace.as_str())
            .is_some_and(|rest| rest.starts_with('['))
    }

    /// Decode every well-formed clause, ordered by clause index.
    ///
    /// Never fails: unknown fields, non-numeric indices, invalid term values
    /// and clauses without a taxonomy or terms are dropped.
    pub fn decode(&self, params: &QueryParams) -> Vec<QueryClause> {
        let mut drafts: BTreeMap<u64, ClauseDraft> = BTreeMap::new();

        for (key, value) in params.iter() {
            let Some(caps) = CLAUSE_KEY_RE.captures(key) else {
                continue;
            };
            if &caps[1] != self.namespace.as_str() {
                continue;
            }
            let Ok(index) = caps[2].parse::<u64>() else {
                tracing::trace!(key, "dropping clause key with oversized index");
                continue;
            };
            let draft = drafts.entry(index).or_default();

            match &caps[3] {
                "taxonomy" => draft.taxonomy = Some(value.to_string()),
                "compare" => draft.compare = Some(value.to_string()),
                _ => {
                    let position = match caps.get(4).map(|m| m.as_str().parse::<u64>()) {
                        None => None,
                        Some(Ok(position)) => Some(position),
                        Some(Err(_)) => {
                            tracing::trace!(key, "dropping term with oversized position");
                            continue;
                        }
                    };
                    match TermId::parse_lenient(value) {
                        Some(term) => draft.push_term(position, term),
                        None => tracing::trace!(key, value, "dropping non-positive term value"),
                    }
                }
            }
        }

        drafts
            .into_values()
            .filter_map(ClauseDraft::finish)
            .collect()
    }

    /// Rewrite the namespace from `clauses`, keeping every other parameter.
    pub fn encode(&self, params: &mut QueryParams, clauses: &[QueryClause]) {
        params.retain(|key, _| !self.owns_key(key));

        let ns = &self.namespace;
        for (index, clause) in clauses.iter().enumerate() {
            params.append(format!("{ns}[{index}][taxonomy]"), clause.taxonomy.as_str());
            let compare = if clause.compare.is_empty() {
                DEFAULT_COMPARE
            } else {
                clause.compare.as_str()
            };
            params.append(format!("{ns}[{index}][compare]"), compare);
            for (term_index, term) in clause.terms.iter().enumerate() {
                params.append(
                    format!("{ns}[{index}][terms][{term_index}]"),
                    term.to_string(),
                );
            }
        }
    }

    /// Every term selected for `taxonomy` across all its clauses, first
    /// occurrence order, no duplicates.
    pub fn selected_terms(&self, params: &QueryParams, taxonomy: &str) -> Vec<TermId> {
        unique_terms(
            self.decode(params)
                .into_iter()
                .filter(|clause| clause.taxonomy == taxonomy)
                .flat_map(|clause| clause.terms),
        )
    }

    /// Replace whatever `taxonomy` had with a single `IN` clause over
    /// `terms`, appended after the other clauses. An empty `terms` removes
    /// the taxonomy's filter entirely.
    pub fn replace_taxonomy(&self, params: &mut QueryParams, taxonomy: &str, terms: Vec<TermId>) {
        let mut clauses: Vec<QueryClause> = self
            .decode(params)
            .into_iter()
            .filter(|clause| clause.taxonomy != taxonomy)
            .collect();
        if !terms.is_empty() {
            clauses.push(QueryClause::new_in(taxonomy, terms));
        }
        self.encode(params, &clauses);
    }
}

/// Deduplicate term ids keeping first occurrence order.
pub fn unique_terms(terms: impl IntoIterator<Item = TermId>) -> Vec<TermId> {
    let mut seen = HashSet::new();
    terms.into_iter().filter(|id| seen.insert(*id)).collect()
}
