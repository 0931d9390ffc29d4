//! Document access
//!
//! [`Dom`] is the slice of browser DOM behavior the mount controller relies
//! on. Two backends implement it: [`Document`] here, and the live page under
//! `wasm32` (see `web.rs`).
//!
//! [`Document`] is an arena of element and text nodes:
//!
//! - structural edits (append, insert-before, remove, replace) that bump a
//!   mutation epoch, the way a child-list observer would see them
//! - inert `<template>` content kept out of the live tree until cloned
//! - the `checked` property and a display toggle, both separate from
//!   attributes and both invisible to the mutation epoch
//! - the current location plus a record of navigations
//!
//! Node ids are never reused. A removed subtree keeps its ids but is no
//! longer connected to the body.

use std::fmt::Write as _;
use tree_filter_types::markup::escape_html;
use tree_filter_types::{Element, Node};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(self) -> usize {
        self.0
    }
}

// =============================================================================
// DOM ACCESS
// =============================================================================

/// Document operations used by mounting, collapse, selection sync and
/// native widget matching.
pub trait Dom {
    fn body(&self) -> NodeId;

    /// Current page location.
    fn location(&self) -> Url;

    /// Full page navigation to `url`.
    fn navigate(&mut self, url: Url);

    /// Counter of structural (child list) changes.
    fn mutation_epoch(&self) -> u64;

    /// Insert `nodes` immediately before `reference`. Returns the new
    /// top-level ids, empty when `reference` has no parent.
    fn insert_before(&mut self, reference: NodeId, nodes: &[Node]) -> Vec<NodeId>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn element_children(&self, node: NodeId) -> Vec<NodeId>;

    fn is_connected(&self, node: NodeId) -> bool;

    fn matches(&self, node: NodeId, selector: &Selector<'_>) -> bool;

    /// Matching descendants of `scope` in document order.
    fn query_all(&self, scope: NodeId, selector: &Selector<'_>) -> Vec<NodeId>;

    /// Descendants of `scope` matching any of `selectors`, document order.
    fn query_any(&self, scope: NodeId, selectors: &[Selector<'_>]) -> Vec<NodeId>;

    fn query(&self, scope: NodeId, selector: &Selector<'_>) -> Option<NodeId> {
        self.query_all(scope, selector).into_iter().next()
    }

    /// `node` itself or its nearest matching ancestor.
    fn closest(&self, node: NodeId, selector: &Selector<'_>) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if self.matches(candidate, selector) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query(self.body(), &Selector::id(id))
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String>;

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str);

    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Add `class` when `on`, remove it otherwise.
    fn toggle_class(&mut self, node: NodeId, class: &str, on: bool);

    fn value(&self, node: NodeId) -> Option<String> {
        self.attr(node, "value")
    }

    fn is_checked(&self, node: NodeId) -> bool;

    fn set_checked(&mut self, node: NodeId, checked: bool);

    /// Whether the element itself is set to `display: none`.
    fn is_hidden(&self, node: NodeId) -> bool;

    fn set_hidden(&mut self, node: NodeId, hidden: bool);

    fn text_content(&self, node: NodeId) -> String;

    /// Inert content of a `<template>` element.
    fn template_content(&self, node: NodeId) -> Option<Vec<Node>>;
}

// =============================================================================
// SELECTORS
// =============================================================================

/// Compound selector: every listed part must match the same element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector<'a> {
    tag: Option<&'a str>,
    id: Option<&'a str>,
    classes: Vec<&'a str>,
    attrs: Vec<(&'a str, Option<&'a str>)>,
}

impl<'a> Selector<'a> {
    pub fn tag(tag: &'a str) -> Self {
        Self {
            tag: Some(tag),
            ..Default::default()
        }
    }

    pub fn class(class: &'a str) -> Self {
        Self {
            classes: vec![class],
            ..Default::default()
        }
    }

    pub fn id(id: &'a str) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn attr(name: &'a str) -> Self {
        Self {
            attrs: vec![(name, None)],
            ..Default::default()
        }
    }

    pub fn and_class(mut self, class: &'a str) -> Self {
        self.classes.push(class);
        self
    }

    pub fn and_tag(mut self, tag: &'a str) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_attr(mut self, name: &'a str) -> Self {
        self.attrs.push((name, None));
        self
    }

    pub fn with_attr_eq(mut self, name: &'a str, value: &'a str) -> Self {
        self.attrs.push((name, Some(value)));
        self
    }

    /// CSS selector text for the same compound selector.
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        if let Some(tag) = self.tag {
            css.push_str(tag);
        }
        if let Some(id) = self.id {
            css.push('#');
            css.push_str(&css_ident(id));
        }
        for class in &self.classes {
            css.push('.');
            css.push_str(&css_ident(class));
        }
        for (name, expected) in &self.attrs {
            match expected {
                Some(value) => {
                    let _ = write!(css, "[{}=\"{}\"]", css_ident(name), css_string(value));
                }
                None => {
                    let _ = write!(css, "[{}]", css_ident(name));
                }
            }
        }
        if css.is_empty() {
            css.push('*');
        }
        css
    }

    fn matches(&self, el: &ElementData) -> bool {
        self.tag.is_none_or(|tag| el.tag.eq_ignore_ascii_case(tag))
            && self.id.is_none_or(|id| el.attr("id") == Some(id))
            && self.classes.iter().all(|class| el.has_class(class))
            && self.attrs.iter().all(|(name, expected)| match el.attr(name) {
                Some(actual) => expected.is_none_or(|expected| actual == expected),
                None => false,
            })
    }
}

/// Escape an identifier for use after `#`, `.` or inside `[...]`.
fn css_ident(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, c) in raw.chars().enumerate() {
        if i == 0 && c.is_ascii_digit() {
            let _ = write!(out, "\\{:x} ", c as u32);
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            out.push(c);
        } else {
            out.push('\\');
            out.push(c);
        }
    }
    out
}

/// Quoted attribute value body.
fn css_string(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\a "),
            _ => out.push(c),
        }
    }
    out
}

// =============================================================================
// NODES
// =============================================================================

#[derive(Debug, Clone)]
struct ElementData {
    tag: String,
    attrs: Vec<(String, String)>,
    checked: bool,
    hidden: bool,
    template_content: Vec<Node>,
}

impl ElementData {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            checked: false,
            hidden: false,
            template_content: Vec::new(),
        }
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    fn set_attr(&mut self, name: &str, value: String) {
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }
}

#[derive(Debug, Clone)]
enum NodeData {
    Element(ElementData),
    Text(String),
}

#[derive(Debug, Clone)]
struct NodeRecord {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: NodeData,
}

// =============================================================================
// DOCUMENT
// =============================================================================

#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<NodeRecord>,
    body: NodeId,
    location: Url,
    navigations: Vec<Url>,
    epoch: u64,
}

impl Document {
    /// Empty document with a bare `<body>`, loaded at `location`.
    pub fn new(location: Url) -> Self {
        let body = NodeRecord {
            parent: None,
            children: Vec::new(),
            data: NodeData::Element(ElementData::new("body")),
        };
        Self {
            nodes: vec![body],
            body: NodeId(0),
            location,
            navigations: Vec::new(),
            epoch: 0,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Full page navigation to `url`.
    pub fn navigate(&mut self, url: Url) {
        tracing::info!(url = %url, "navigating");
        self.location = url.clone();
        self.navigations.push(url);
    }

    /// Every navigation so far, oldest first.
    pub fn navigations(&self) -> &[Url] {
        &self.navigations
    }

    /// Counter of structural (child list) changes.
    pub fn mutation_epoch(&self) -> u64 {
        self.epoch
    }

    // =========================================================================
    // Structural edits
    // =========================================================================

    pub fn append(&mut self, parent: NodeId, element: &Element) -> NodeId {
        let id = self.build_element(element);
        self.attach(parent, id, None);
        self.epoch += 1;
        id
    }

    /// Insert clones of `nodes` immediately before `reference`. Returns the
    /// new top-level ids, empty when `reference` has no parent.
    pub fn insert_before(&mut self, reference: NodeId, nodes: &[Node]) -> Vec<NodeId> {
        let Some(parent) = self.parent(reference) else {
            return Vec::new();
        };
        let Some(mut at) = self.position_in(parent, reference) else {
            return Vec::new();
        };
        let mut inserted = Vec::with_capacity(nodes.len());
        for node in nodes {
            let id = self.build(node);
            self.attach(parent, id, Some(at));
            at += 1;
            inserted.push(id);
        }
        if !inserted.is_empty() {
            self.epoch += 1;
        }
        inserted
    }

    /// Detach `node` (and its subtree) from its parent.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.parent(node) else {
            return;
        };
        self.nodes[parent.0].children.retain(|child| *child != node);
        self.nodes[node.0].parent = None;
        self.epoch += 1;
    }

    /// Swap `old` for a fresh build of `element`, in the same position.
    pub fn replace_with(&mut self, old: NodeId, element: &Element) -> Option<NodeId> {
        let parent = self.parent(old)?;
        let at = self.position_in(parent, old)?;
        let id = self.build_element(element);
        self.nodes[parent.0].children[at] = id;
        self.nodes[id.0].parent = Some(parent);
        self.nodes[old.0].parent = None;
        self.epoch += 1;
        Some(id)
    }

    fn position_in(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.nodes[parent.0]
            .children
            .iter()
            .position(|candidate| *candidate == child)
    }

    fn attach(&mut self, parent: NodeId, child: NodeId, at: Option<usize>) {
        self.nodes[child.0].parent = Some(parent);
        let children = &mut self.nodes[parent.0].children;
        match at {
            Some(at) if at <= children.len() => children.insert(at, child),
            _ => children.push(child),
        }
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeRecord {
            parent: None,
            children: Vec::new(),
            data,
        });
        id
    }

    fn build(&mut self, node: &Node) -> NodeId {
        match node {
            Node::Element(element) => self.build_element(element),
            Node::Text(text) => self.alloc(NodeData::Text(text.clone())),
        }
    }

    /// Detached subtree for `element`. A `<template>` keeps its children
    /// as inert content instead of live nodes.
    fn build_element(&mut self, element: &Element) -> NodeId {
        let mut data = ElementData::new(element.tag());
        data.attrs = element.attrs().to_vec();
        data.checked = element.get_attr("checked").is_some();

        if element.tag().eq_ignore_ascii_case("template") {
            data.template_content = element.children().to_vec();
            return self.alloc(NodeData::Element(data));
        }

        let id = self.alloc(NodeData::Element(data));
        for child in element.children() {
            let child = self.build(child);
            self.attach(id, child, None);
        }
        id
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0).and_then(|record| record.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|record| record.children.as_slice())
            .unwrap_or_default()
    }

    pub fn element_children(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.children(node)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
    }

    /// Descendants of `scope` in document order, `scope` excluded.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(scope).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.children(node).iter().rev().copied());
        }
        out
    }

    pub fn matches(&self, node: NodeId, selector: &Selector<'_>) -> bool {
        self.element(node).is_some_and(|el| selector.matches(el))
    }

    /// Matching descendants of `scope` in document order.
    pub fn query_all(&self, scope: NodeId, selector: &Selector<'_>) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| self.matches(*node, selector))
            .collect()
    }

    pub fn query(&self, scope: NodeId, selector: &Selector<'_>) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|node| self.matches(*node, selector))
    }

    /// `node` itself or its nearest matching ancestor.
    pub fn closest(&self, node: NodeId, selector: &Selector<'_>) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(candidate) = current {
            if self.matches(candidate, selector) {
                return Some(candidate);
            }
            current = self.parent(candidate);
        }
        None
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query(self.body, &Selector::id(id))
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let mut current = node;
        loop {
            if current == self.body {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    // =========================================================================
    // Element state
    // =========================================================================

    fn element(&self, node: NodeId) -> Option<&ElementData> {
        match self.nodes.get(node.0).map(|record| &record.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, node: NodeId) -> Option<&mut ElementData> {
        match self.nodes.get_mut(node.0).map(|record| &mut record.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(|el| el.tag.as_str())
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: impl Into<String>) {
        if let Some(el) = self.element_mut(node) {
            el.set_attr(name, value.into());
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|el| el.has_class(class))
    }

    /// Add `class` when `on`, remove it otherwise.
    pub fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        let Some(el) = self.element_mut(node) else {
            return;
        };
        let mut classes: Vec<String> = el
            .attr("class")
            .unwrap_or_default()
            .split_whitespace()
            .filter(|c| *c != class)
            .map(str::to_string)
            .collect();
        if on {
            classes.push(class.to_string());
        }
        el.set_attr("class", classes.join(" "));
    }

    pub fn value(&self, node: NodeId) -> Option<&str> {
        self.attr(node, "value")
    }

    pub fn is_checked(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|el| el.checked)
    }

    pub fn set_checked(&mut self, node: NodeId, checked: bool) {
        if let Some(el) = self.element_mut(node) {
            el.checked = checked;
        }
    }

    /// Whether the element itself is set to `display: none`.
    pub fn is_hidden(&self, node: NodeId) -> bool {
        self.element(node).is_some_and(|el| el.hidden)
    }

    pub fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        if let Some(el) = self.element_mut(node) {
            el.hidden = hidden;
        }
    }

    /// Inert content of a `<template>` element.
    pub fn template_content(&self, node: NodeId) -> Option<&[Node]> {
        self.element(node)
            .filter(|el| el.tag.eq_ignore_ascii_case("template"))
            .map(|el| el.template_content.as_slice())
    }

    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match self.nodes.get(node.0).map(|record| &record.data) {
            Some(NodeData::Text(text)) => out.push_str(text),
            Some(NodeData::Element(_)) => {
                for child in self.children(node) {
                    self.collect_text(*child, out);
                }
            }
            None => {}
        }
    }

    // =========================================================================
    // Serialization
    // =========================================================================

    /// Markup of `node` reflecting live state: the `checked` property and
    /// the display toggle are written as `checked` and `hidden` attributes.
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_html(node, &mut out);
        out
    }

    fn write_html(&self, node: NodeId, out: &mut String) {
        let Some(record) = self.nodes.get(node.0) else {
            return;
        };
        let el = match &record.data {
            NodeData::Text(text) => {
                out.push_str(&escape_html(text));
                return;
            }
            NodeData::Element(el) => el,
        };

        let _ = write!(out, "<{}", el.tag);
        for (name, value) in el.attrs.iter().filter(|(name, _)| name != "checked") {
            let _ = write!(out, " {}=\"{}\"", name, escape_html(value));
        }
        if el.checked {
            out.push_str(" checked");
        }
        if el.hidden {
            out.push_str(" hidden");
        }
        out.push('>');

        for content in &el.template_content {
            match content {
                Node::Element(element) => out.push_str(&element.to_html()),
                Node::Text(text) => out.push_str(&escape_html(text)),
            }
        }
        for child in &record.children {
            self.write_html(*child, out);
        }

        if el.tag != "input" {
            let _ = write!(out, "</{}>", el.tag);
        }
    }
}

impl Dom for Document {
    fn body(&self) -> NodeId {
        self.body
    }

    fn location(&self) -> Url {
        self.location.clone()
    }

    fn navigate(&mut self, url: Url) {
        Document::navigate(self, url);
    }

    fn mutation_epoch(&self) -> u64 {
        self.epoch
    }

    fn insert_before(&mut self, reference: NodeId, nodes: &[Node]) -> Vec<NodeId> {
        Document::insert_before(self, reference, nodes)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        Document::parent(self, node)
    }

    fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        Document::element_children(self, node).collect()
    }

    fn is_connected(&self, node: NodeId) -> bool {
        Document::is_connected(self, node)
    }

    fn matches(&self, node: NodeId, selector: &Selector<'_>) -> bool {
        Document::matches(self, node, selector)
    }

    fn query_all(&self, scope: NodeId, selector: &Selector<'_>) -> Vec<NodeId> {
        Document::query_all(self, scope, selector)
    }

    fn query_any(&self, scope: NodeId, selectors: &[Selector<'_>]) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|node| {
                selectors
                    .iter()
                    .any(|selector| Document::matches(self, *node, selector))
            })
            .collect()
    }

    fn query(&self, scope: NodeId, selector: &Selector<'_>) -> Option<NodeId> {
        Document::query(self, scope, selector)
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        Document::attr(self, node, name).map(str::to_string)
    }

    fn set_attr(&mut self, node: NodeId, name: &str, value: &str) {
        Document::set_attr(self, node, name, value);
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        Document::has_class(self, node, class)
    }

    fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        Document::toggle_class(self, node, class, on);
    }

    fn is_checked(&self, node: NodeId) -> bool {
        Document::is_checked(self, node)
    }

    fn set_checked(&mut self, node: NodeId, checked: bool) {
        Document::set_checked(self, node, checked);
    }

    fn is_hidden(&self, node: NodeId) -> bool {
        Document::is_hidden(self, node)
    }

    fn set_hidden(&mut self, node: NodeId, hidden: bool) {
        Document::set_hidden(self, node, hidden);
    }

    fn text_content(&self, node: NodeId) -> String {
        Document::text_content(self, node)
    }

    fn template_content(&self, node: NodeId) -> Option<Vec<Node>> {
        Document::template_content(self, node).map(<[Node]>::to_vec)
    }
}
