//! Tree Renderer
//!
//! Serializes each target taxonomy into a dormant `<template>` holding the
//! collapsible tree, plus the configuration payload the client reads before
//! touching any template. Nothing here inserts into a live document.
//!
//! ```text
//! template#tnc-tree-filter-template-<tax>[data-tnc-tree-taxonomy]
//! └── div.tnc-tree-filter[data-taxonomy]
//!     └── div.collapse.show.tnc-tree-filter__collapse
//!         ├── div.collapse-trigger > button.tnc-tree-filter__header
//!         └── div#tnc-tree-content-<tax>.tnc-tree-filter__content
//!             └── div.tnc-tree-filter__tree
//!                 └── div.tnc-tree-node (recursive)
//! ```

use crate::provider::{taxonomy_title, TreeProvider};
use crate::store::{TaxonomyMeta, Term, TermStore};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tree_filter_types::contract::{
    CHECKBOX, CHILDREN, CONFIG_SCRIPT_ID, CONTENT_ID_PREFIX, ICON_EXPANDED, ICON_WRAPPER, NODE,
    NODE_HAS_CHILDREN, OPTION_VALUE_ATTR, ROW, TAXONOMY_ATTR, TEMPLATE_ID_PREFIX,
    TEMPLATE_TAXONOMY_ATTR, TOGGLE, TOGGLE_PLACEHOLDER, TREE, TREE_COLLAPSE, TREE_CONTENT,
    TREE_HEADER, TREE_ROOTS,
};
use tree_filter_types::{Element, FilterConfig, QueryParams, TermId, TreeFilterPayload};

static PERCENT_OCTET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[a-fA-F0-9][a-fA-F0-9]").unwrap());

static NON_CLASS_CHAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]").unwrap());

/// Reduce `raw` to characters valid in a class name or id.
pub fn sanitize_html_class(raw: &str) -> String {
    let without_octets = PERCENT_OCTET_RE.replace_all(raw, "");
    NON_CLASS_CHAR_RE
        .replace_all(&without_octets, "")
        .into_owned()
}

pub fn template_id(taxonomy: &str) -> String {
    format!("{TEMPLATE_ID_PREFIX}{taxonomy}")
}

pub fn content_id(taxonomy: &str) -> String {
    format!("{CONTENT_ID_PREFIX}{}", sanitize_html_class(taxonomy))
}

fn header_id(taxonomy: &str) -> String {
    format!("tnc-tree-header-{}", sanitize_html_class(taxonomy))
}

pub struct TreeRenderer<'p, S> {
    provider: &'p TreeProvider<S>,
}

impl<'p, S: TermStore> TreeRenderer<'p, S> {
    pub fn new(provider: &'p TreeProvider<S>) -> Self {
        Self { provider }
    }

    // =========================================================================
    // Payload
    // =========================================================================

    /// One entry per target taxonomy, in registration order.
    pub fn payload(&self) -> TreeFilterPayload {
        let filters = self
            .provider
            .target_taxonomies()
            .into_iter()
            .map(|meta| FilterConfig {
                title: taxonomy_title(&meta),
                term_ids: self.provider.all_term_ids(&meta.name),
                taxonomy: meta.name,
            })
            .collect();

        TreeFilterPayload {
            filters,
            clause_namespace: Some(self.provider.codec().namespace().to_string()),
        }
    }

    /// `<script type="application/json">` carrying `payload`.
    pub fn config_script(&self, payload: &TreeFilterPayload) -> Element {
        let json = match payload.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("failed to serialize tree filter payload: {}", e);
                "{}".to_string()
            }
        };
        Element::new("script")
            .attr("type", "application/json")
            .attr("id", CONFIG_SCRIPT_ID)
            .text(json.replace("</", "<\\/"))
    }

    // =========================================================================
    // Templates
    // =========================================================================

    /// Templates for every target taxonomy that has at least one root term.
    pub fn templates(&self, params: &QueryParams) -> Vec<Element> {
        self.provider
            .target_taxonomies()
            .iter()
            .filter_map(|meta| self.template(meta, params))
            .collect()
    }

    /// Template for one taxonomy, `None` when it has no root terms.
    pub fn template(&self, meta: &TaxonomyMeta, params: &QueryParams) -> Option<Element> {
        let taxonomy = meta.name.as_str();
        let roots = self.provider.tree_roots(taxonomy);
        if roots.is_empty() {
            tracing::debug!(taxonomy, "no root terms, skipping template");
            return None;
        }

        let selected: HashSet<TermId> = self
            .provider
            .selected_term_ids(taxonomy, params)
            .into_iter()
            .collect();
        let title = taxonomy_title(meta);
        let content_id = content_id(taxonomy);
        let header_id = header_id(taxonomy);

        let header = Element::new("button")
            .attr("type", "button")
            .attr("id", header_id.as_str())
            .class("label")
            .class(TREE_HEADER)
            .attr("aria-expanded", "true")
            .attr("aria-controls", content_id.as_str())
            .attr("aria-label", title.as_str())
            .child(
                Element::new("span")
                    .attr("aria-hidden", "true")
                    .class(ICON_WRAPPER)
                    .child(
                        Element::new("i")
                            .class(ICON_EXPANDED)
                            .class("tainacan-icon")
                            .class("tainacan-icon-1-25em"),
                    ),
            )
            .child(Element::new("span").class("collapse-label").text(title.as_str()));

        let tree = Element::new("div").class(TREE_ROOTS).children_from(
            roots
                .iter()
                .map(|root| self.render_node(root, taxonomy, &selected, true)),
        );

        let content = Element::new("div")
            .attr("id", content_id.as_str())
            .class("collapse-content")
            .class(TREE_CONTENT)
            .attr("role", "region")
            .attr("aria-labelledby", header_id.as_str())
            .child(tree);

        let filter = Element::new("div")
            .class(TREE)
            .attr(TAXONOMY_ATTR, taxonomy)
            .child(
                Element::new("div")
                    .class("collapse")
                    .class("show")
                    .class(TREE_COLLAPSE)
                    .child(Element::new("div").class("collapse-trigger").child(header))
                    .child(content),
            );

        Some(
            Element::new("template")
                .attr("id", template_id(taxonomy))
                .attr(TEMPLATE_TAXONOMY_ATTR, taxonomy)
                .child(filter),
        )
    }

    /// Markup for `term` and, recursively, its descendants.
    ///
    /// A node with children gets an active toggle and a nested children
    /// container; a leaf gets a placeholder toggle so rows stay aligned.
    pub fn render_node(
        &self,
        term: &Term,
        taxonomy: &str,
        selected: &HashSet<TermId>,
        selectable: bool,
    ) -> Element {
        let mut path = HashSet::new();
        self.render_node_within(term, taxonomy, selected, selectable, &mut path)
    }

    fn render_node_within(
        &self,
        term: &Term,
        taxonomy: &str,
        selected: &HashSet<TermId>,
        selectable: bool,
        path: &mut HashSet<TermId>,
    ) -> Element {
        path.insert(term.term_id);
        let children: Vec<Term> = self
            .provider
            .children(taxonomy, term.term_id)
            .into_iter()
            .filter(|child| !path.contains(&child.term_id))
            .collect();
        let has_children = !children.is_empty();

        let mut node = Element::new("div").class(NODE);
        if has_children {
            node = node.class(NODE_HAS_CHILDREN);
        }

        let toggle = if has_children {
            Element::new("button")
                .attr("type", "button")
                .class(TOGGLE)
                .attr("aria-expanded", "true")
                .attr("aria-label", "Toggle children")
        } else {
            Element::new("span")
                .class(TOGGLE)
                .class(TOGGLE_PLACEHOLDER)
                .attr("aria-hidden", "true")
        };

        let label = if selectable {
            let id = term.term_id.to_string();
            let mut input = Element::new("input")
                .attr("type", "checkbox")
                .attr("value", id.as_str())
                .attr(OPTION_VALUE_ATTR, id.as_str())
                .class(CHECKBOX);
            if selected.contains(&term.term_id) {
                input = input.attr("checked", "checked");
            }
            Element::new("label")
                .class("b-checkbox")
                .class("checkbox")
                .class("is-small")
                .child(input)
                .child(Element::new("span").class("check"))
                .child(
                    Element::new("span").class("control-label").child(
                        Element::new("span")
                            .class("checkbox-label-text")
                            .text(term.name.as_str()),
                    ),
                )
        } else {
            Element::new("strong").text(term.name.as_str())
        };

        node = node.child(Element::new("div").class(ROW).child(toggle).child(label));

        if has_children {
            let nested = children
                .iter()
                .map(|child| self.render_node_within(child, taxonomy, selected, selectable, path))
                .collect::<Vec<_>>();
            node = node.child(Element::new("div").class(CHILDREN).children_from(nested));
        }

        path.remove(&term.term_id);
        node
    }
}
