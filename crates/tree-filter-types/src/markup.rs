//! Owned markup tree
//!
//! The renderer builds templates as [`Element`] trees and serializes them
//! with [`Element::to_html`]; the client instantiates the same trees into
//! its live document. Attribute values and text are escaped on output, never
//! on input.

use std::fmt::Write as _;

/// Elements that never have content or a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];

/// Elements whose text children are written verbatim.
const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing an existing value.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Append one class to the `class` attribute.
    pub fn class(mut self, class: &str) -> Self {
        let classes = match self.get_attr("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr("class", classes);
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn children_from(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children
            .extend(children.into_iter().map(Node::Element));
        self
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some((_, existing)) => *existing = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attrs(&self) -> &[(String, String)] {
        &self.attrs
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Child elements, skipping text.
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// Depth-first search over this element and its descendants.
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(pred))
    }

    /// Concatenated descendant text.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape_html(value));
        }
        out.push('>');

        if VOID_ELEMENTS.contains(&self.tag.as_str()) {
            return;
        }

        let raw = RAW_TEXT_ELEMENTS.contains(&self.tag.as_str());
        for child in &self.children {
            match child {
                Node::Element(element) => element.write_html(out),
                Node::Text(text) if raw => out.push_str(text),
                Node::Text(text) => out.push_str(&escape_html(text)),
            }
        }

        let _ = write!(out, "</{}>", self.tag);
    }
}

fn collect_text(nodes: &[Node], out: &mut String) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => collect_text(&element.children, out),
        }
    }
}

/// Escape text for use in element content and quoted attribute values.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_nested_markup() {
        let el = Element::new("label")
            .class("b-checkbox")
            .class("checkbox")
            .child(Element::new("input").attr("type", "checkbox").attr("value", "3"))
            .child(Element::new("span").text("A & B <c>"));

        assert_eq!(
            el.to_html(),
            "<label class=\"b-checkbox checkbox\"><input type=\"checkbox\" value=\"3\">\
             <span>A &amp; B &lt;c&gt;</span></label>"
        );
        assert!(el.has_class("checkbox"));
        assert!(!el.has_class("check"));
    }

    #[test]
    fn test_attribute_values_are_escaped() {
        let el = Element::new("button").attr("aria-label", "Rock \"n\" Roll's");
        assert_eq!(
            el.to_html(),
            "<button aria-label=\"Rock &quot;n&quot; Roll&#039;s\"></button>"
        );
    }

    #[test]
    fn test_script_content_is_raw() {
        let el = Element::new("script").text(r#"{"a":"<b>"}"#);
        assert_eq!(el.to_html(), r#"<script>{"a":"<b>"}</script>"#);
    }

    #[test]
    fn test_set_attr_replaces() {
        let el = Element::new("div").attr("id", "a").attr("id", "b");
        assert_eq!(el.attrs().len(), 1);
        assert_eq!(el.get_attr("id"), Some("b"));
    }

    #[test]
    fn test_find_and_text_content() {
        let el = Element::new("div")
            .child(Element::new("span").class("collapse-label").text("Region"))
            .child(Element::new("p").text(" extra"));
        let label = el.find(&|e| e.has_class("collapse-label")).unwrap();
        assert_eq!(label.text_content(), "Region");
        assert_eq!(el.text_content(), "Region extra");
    }
}
