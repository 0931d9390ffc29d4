//! Collapse and expand state of mounted trees.
//!
//! Node state lives in the `is-collapsed` class on the node; tree state in
//! the content region's display toggle. Both mirror into `aria-expanded`.

use crate::dom::{Dom, NodeId, Selector};
use tree_filter_types::contract::{
    ICON_COLLAPSED, ICON_EXPANDED, ICON_RTL_MIRRORED, ICON_WRAPPER, NODE_COLLAPSED,
    NODE_HAS_CHILDREN, TOGGLE, TREE_CONTENT, TREE_HEADER,
};

fn aria_expanded(collapsed: bool) -> &'static str {
    if collapsed {
        "false"
    } else {
        "true"
    }
}

/// Collapse or expand one node's children. Leaves are ignored.
pub fn set_node_collapsed(doc: &mut dyn Dom, node: NodeId, collapsed: bool) {
    if !doc.has_class(node, NODE_HAS_CHILDREN) {
        return;
    }
    doc.toggle_class(node, NODE_COLLAPSED, collapsed);

    let toggle = doc
        .element_children(node)
        .first()
        .and_then(|row| doc.query(*row, &Selector::class(TOGGLE)));
    if let Some(toggle) = toggle {
        doc.set_attr(toggle, "aria-expanded", aria_expanded(collapsed));
    }
}

pub fn is_node_collapsed(doc: &dyn Dom, node: NodeId) -> bool {
    doc.has_class(node, NODE_COLLAPSED)
}

/// Collapse or expand a whole tree's content region.
pub fn set_tree_collapsed(doc: &mut dyn Dom, tree: NodeId, collapsed: bool) {
    let header = doc.query(tree, &Selector::class(TREE_HEADER));
    let content = doc.query(tree, &Selector::class(TREE_CONTENT));

    if let Some(content) = content {
        doc.set_hidden(content, collapsed);
    }
    let Some(header) = header else {
        return;
    };
    doc.set_attr(header, "aria-expanded", aria_expanded(collapsed));

    let icon = doc
        .query(header, &Selector::class(ICON_WRAPPER))
        .and_then(|wrapper| {
            doc.element_children(wrapper)
                .into_iter()
                .find(|child| doc.matches(*child, &Selector::tag("i")))
        });
    if let Some(icon) = icon {
        doc.toggle_class(icon, ICON_EXPANDED, !collapsed);
        doc.toggle_class(icon, ICON_COLLAPSED, collapsed);
        doc.toggle_class(icon, ICON_RTL_MIRRORED, collapsed);
    }
}

/// Whether the tree header currently reports its content as expanded.
pub fn is_tree_expanded(doc: &dyn Dom, tree: NodeId) -> bool {
    doc.query(tree, &Selector::class(TREE_HEADER))
        .is_none_or(|header| {
            doc.attr(header, "aria-expanded").as_deref() != Some("false")
        })
}

/// Apply `collapsed` to the tree and every expandable node in it.
pub fn collapse_or_expand_all(doc: &mut dyn Dom, tree: NodeId, collapsed: bool) {
    set_tree_collapsed(doc, tree, collapsed);
    for node in doc.query_all(tree, &Selector::class(NODE_HAS_CHILDREN)) {
        set_node_collapsed(doc, node, collapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use tree_filter_types::contract::{CHILDREN, NODE, ROW, TREE};
    use tree_filter_types::Element;
    use url::Url;

    fn tree() -> Element {
        let node = Element::new("div")
            .class(NODE)
            .class(NODE_HAS_CHILDREN)
            .child(
                Element::new("div").class(ROW).child(
                    Element::new("button")
                        .class(TOGGLE)
                        .attr("aria-expanded", "true"),
                ),
            )
            .child(Element::new("div").class(CHILDREN).child(Element::new("div").class(NODE)));

        Element::new("div")
            .class(TREE)
            .child(
                Element::new("button")
                    .class(TREE_HEADER)
                    .attr("aria-expanded", "true")
                    .child(
                        Element::new("span")
                            .class(ICON_WRAPPER)
                            .child(Element::new("i").class(ICON_EXPANDED)),
                    ),
            )
            .child(Element::new("div").class(TREE_CONTENT).child(node))
    }

    fn setup() -> (Document, NodeId) {
        let mut doc = Document::new(Url::parse("https://example.org/").unwrap());
        let body = doc.body();
        let tree = doc.append(body, &tree());
        (doc, tree)
    }

    #[test]
    fn test_tree_collapse_swaps_icon() {
        let (mut doc, tree) = setup();
        let content = doc.query(tree, &Selector::class(TREE_CONTENT)).unwrap();
        let icon = doc.query(tree, &Selector::tag("i")).unwrap();

        set_tree_collapsed(&mut doc, tree, true);
        assert!(doc.is_hidden(content));
        assert!(!is_tree_expanded(&doc, tree));
        assert!(doc.has_class(icon, ICON_COLLAPSED));
        assert!(doc.has_class(icon, ICON_RTL_MIRRORED));
        assert!(!doc.has_class(icon, ICON_EXPANDED));

        set_tree_collapsed(&mut doc, tree, false);
        assert!(!doc.is_hidden(content));
        assert!(is_tree_expanded(&doc, tree));
        assert!(doc.has_class(icon, ICON_EXPANDED));
        assert!(!doc.has_class(icon, ICON_COLLAPSED));
    }

    #[test]
    fn test_node_collapse_ignores_leaves() {
        let (mut doc, tree) = setup();
        let nodes = doc.query_all(tree, &Selector::class(NODE));
        let (parent, leaf) = (nodes[0], nodes[1]);
        let toggle = doc.query(parent, &Selector::class(TOGGLE)).unwrap();

        set_node_collapsed(&mut doc, parent, true);
        assert!(is_node_collapsed(&doc, parent));
        assert_eq!(doc.attr(toggle, "aria-expanded"), Some("false"));

        set_node_collapsed(&mut doc, leaf, true);
        assert!(!is_node_collapsed(&doc, leaf));
    }

    #[test]
    fn test_collapse_all_reaches_every_node() {
        let (mut doc, tree) = setup();
        collapse_or_expand_all(&mut doc, tree, true);
        let parent = doc.query(tree, &Selector::class(NODE_HAS_CHILDREN)).unwrap();
        assert!(is_node_collapsed(&doc, parent));
        assert!(!is_tree_expanded(&doc, tree));

        collapse_or_expand_all(&mut doc, tree, false);
        assert!(!is_node_collapsed(&doc, parent));
        assert!(is_tree_expanded(&doc, tree));
    }
}
