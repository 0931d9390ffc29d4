//! Native widget matching
//!
//! The host sidebar gives its widgets no stable identifier, so pairing a
//! taxonomy with its native widget is a heuristic. It sits behind
//! [`WidgetMatcher`] so the mount controller never depends on how the pairing
//! is made.

use crate::config::ClientFilter;
use crate::dom::{Dom, NodeId, Selector};
use std::collections::BTreeSet;
use tree_filter_types::contract::{
    NATIVE_OPTION_GROUP, NATIVE_TITLE, NATIVE_VIEW_ALL, NATIVE_WIDGET, OPTION_VALUE_ATTR, TREE,
};
use tree_filter_types::TermId;

pub trait WidgetMatcher {
    /// The native widget in `sidebar` that `filter`'s tree replaces.
    fn find_native_widget(
        &self,
        doc: &dyn Dom,
        sidebar: NodeId,
        filter: &ClientFilter,
    ) -> Option<NodeId>;
}

/// Pairs by normalized title text.
///
/// Only widgets exposing a "view all" affordance qualify: that marks a flat
/// option list, as opposed to an unrelated widget whose title happens to
/// match. Widgets inside an already mounted tree are never candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleMatcher;

impl WidgetMatcher for TitleMatcher {
    fn find_native_widget(
        &self,
        doc: &dyn Dom,
        sidebar: NodeId,
        filter: &ClientFilter,
    ) -> Option<NodeId> {
        let title = normalize_title(&filter.title);
        doc.query_all(sidebar, &Selector::class(NATIVE_WIDGET))
            .into_iter()
            .filter(|item| doc.closest(*item, &Selector::class(TREE)).is_none())
            .find(|item| {
                let label = doc
                    .query(*item, &Selector::class(NATIVE_TITLE))
                    .map(|label| doc.text_content(label))
                    .unwrap_or_default();
                let has_view_all = doc.query(*item, &Selector::class(NATIVE_VIEW_ALL)).is_some();
                has_view_all && normalize_title(&label) == title
            })
    }
}

/// Lowercase, collapse whitespace runs, trim.
pub fn normalize_title(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Term ids the native widget currently offers at its top level.
///
/// Reads `data-filter-option-value` from option inputs first; only when
/// that yields nothing does it fall back to the inputs' `value`.
pub fn native_top_level_option_ids(doc: &dyn Dom, widget: NodeId) -> BTreeSet<TermId> {
    let inputs = option_inputs(doc, widget);

    let explicit: BTreeSet<TermId> = inputs
        .iter()
        .filter_map(|input| doc.attr(*input, OPTION_VALUE_ATTR))
        .filter_map(|value| TermId::parse_lenient(&value))
        .collect();
    if !explicit.is_empty() {
        return explicit;
    }

    inputs
        .iter()
        .filter_map(|input| doc.value(*input))
        .filter_map(|value| TermId::parse_lenient(&value))
        .collect()
}

/// Inputs under a `<label>` that is a direct child of an option group.
fn option_inputs(doc: &dyn Dom, widget: NodeId) -> Vec<NodeId> {
    doc.query_all(widget, &Selector::class(NATIVE_OPTION_GROUP))
        .into_iter()
        .flat_map(|group| {
            doc.element_children(group)
                .into_iter()
                .filter(|child| doc.matches(*child, &Selector::tag("label")))
                .collect::<Vec<_>>()
        })
        .flat_map(|label| doc.query_all(label, &Selector::tag("input")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use tree_filter_types::Element;
    use url::Url;

    fn filter(title: &str) -> ClientFilter {
        ClientFilter {
            taxonomy: "tnc_tax_region".into(),
            title: title.into(),
        }
    }

    fn widget(title: &str, view_all: bool) -> Element {
        let mut el = Element::new("div")
            .class(NATIVE_WIDGET)
            .child(Element::new("span").class(NATIVE_TITLE).text(title));
        if view_all {
            el = el.child(Element::new("a").class(NATIVE_VIEW_ALL).text("View all"));
        }
        el
    }

    fn option(attr_value: Option<&str>, value: &str) -> Element {
        let mut input = Element::new("input").attr("type", "checkbox").attr("value", value);
        if let Some(attr_value) = attr_value {
            input = input.attr(OPTION_VALUE_ATTR, attr_value);
        }
        Element::new("div")
            .class(NATIVE_OPTION_GROUP)
            .child(Element::new("label").child(input))
    }

    #[test]
    fn test_title_normalization() {
        assert_eq!(normalize_title("  Region \n  of\tOrigin "), "region of origin");
        assert_eq!(normalize_title(""), "");
    }

    #[test]
    fn test_requires_view_all_affordance() {
        let mut doc = Document::new(Url::parse("https://example.org/").unwrap());
        let body = doc.body();
        let sidebar = doc.append(body, &Element::new("div"));
        doc.append(sidebar, &widget("Region", false));
        let flat = doc.append(sidebar, &widget(" region ", true));

        assert_eq!(
            TitleMatcher.find_native_widget(&doc, sidebar, &filter("REGION")),
            Some(flat)
        );
        assert_eq!(TitleMatcher.find_native_widget(&doc, sidebar, &filter("Other")), None);
    }

    #[test]
    fn test_skips_widgets_inside_trees() {
        let mut doc = Document::new(Url::parse("https://example.org/").unwrap());
        let body = doc.body();
        let sidebar = doc.append(body, &Element::new("div"));
        doc.append(
            sidebar,
            &Element::new("div").class(TREE).child(widget("Region", true)),
        );
        assert_eq!(TitleMatcher.find_native_widget(&doc, sidebar, &filter("Region")), None);
    }

    #[test]
    fn test_option_ids_prefer_explicit_attribute() {
        let mut doc = Document::new(Url::parse("https://example.org/").unwrap());
        let body = doc.body();
        let explicit = doc.append(
            body,
            &Element::new("div")
                .child(option(Some("4"), "x"))
                .child(option(None, "7")),
        );
        let fallback = doc.append(
            body,
            &Element::new("div")
                .child(option(None, "1"))
                .child(option(None, "not-a-term")),
        );

        let ids = |set: BTreeSet<TermId>| set.into_iter().map(TermId::get).collect::<Vec<_>>();
        assert_eq!(ids(native_top_level_option_ids(&doc, explicit)), vec![4]);
        assert_eq!(ids(native_top_level_option_ids(&doc, fallback)), vec![1]);
    }

    #[test]
    fn test_nested_option_groups_are_not_top_level_labels() {
        let mut doc = Document::new(Url::parse("https://example.org/").unwrap());
        let body = doc.body();
        let widget = doc.append(
            body,
            &Element::new("div").child(
                Element::new("div")
                    .class(NATIVE_OPTION_GROUP)
                    .child(Element::new("span").child(Element::new("label").child(
                        Element::new("input").attr(OPTION_VALUE_ATTR, "9"),
                    ))),
            ),
        );
        assert!(native_top_level_option_ids(&doc, widget).is_empty());
    }
}
