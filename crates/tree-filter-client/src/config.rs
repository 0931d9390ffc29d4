//! Client configuration
//!
//! Built from the payload the server embeds ahead of the templates and
//! handed to [`crate::MountController::new`]. Nothing reads it globally.

use crate::dom::{Dom, NodeId, Selector};
use crate::error::ClientError;
use tree_filter_types::contract::{CONFIG_SCRIPT_ID, SIDEBAR_CLASS, SIDEBAR_ID};
use tree_filter_types::{ClauseCodec, TreeFilterPayload};

/// One taxonomy the client mounts a tree for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientFilter {
    pub taxonomy: String,
    /// Never empty; falls back to the taxonomy id.
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub filters: Vec<ClientFilter>,
    /// Ids of elements recognized as filter sidebars.
    pub sidebar_ids: Vec<String>,
    /// Classes of elements recognized as filter sidebars.
    pub sidebar_classes: Vec<String>,
    pub codec: ClauseCodec,
}

impl ClientConfig {
    pub fn from_payload(payload: &TreeFilterPayload) -> Result<Self, ClientError> {
        let codec = match payload.clause_namespace.as_deref() {
            Some(namespace) => ClauseCodec::new(namespace)?,
            None => ClauseCodec::default(),
        };

        let filters = payload
            .filters
            .iter()
            .filter(|entry| !entry.taxonomy.is_empty())
            .map(|entry| ClientFilter {
                taxonomy: entry.taxonomy.clone(),
                title: if entry.title.is_empty() {
                    entry.taxonomy.clone()
                } else {
                    entry.title.clone()
                },
            })
            .collect();

        Ok(Self {
            filters,
            sidebar_ids: vec![SIDEBAR_ID.to_string()],
            sidebar_classes: vec![SIDEBAR_CLASS.to_string()],
            codec,
        })
    }

    /// Read the payload script the server placed in `doc`.
    pub fn from_document(doc: &dyn Dom) -> Result<Self, ClientError> {
        let script = doc
            .element_by_id(CONFIG_SCRIPT_ID)
            .ok_or(ClientError::MissingPayload(CONFIG_SCRIPT_ID))?;
        let payload = TreeFilterPayload::from_json(&doc.text_content(script))?;
        Self::from_payload(&payload)
    }

    pub fn filter(&self, taxonomy: &str) -> Option<&ClientFilter> {
        self.filters.iter().find(|filter| filter.taxonomy == taxonomy)
    }

    /// Recognized sidebars in document order.
    pub fn sidebars(&self, doc: &dyn Dom) -> Vec<NodeId> {
        let selectors: Vec<Selector<'_>> = self
            .sidebar_ids
            .iter()
            .map(|id| Selector::id(id))
            .chain(self.sidebar_classes.iter().map(|class| Selector::class(class)))
            .collect();
        doc.query_any(doc.body(), &selectors)
    }
}
