//! Selection sync between the location and a tree's checkboxes.

use crate::dom::{Dom, NodeId, Selector};
use std::collections::HashSet;
use tree_filter_types::contract::CHECKBOX;
use tree_filter_types::{ClauseCodec, QueryParams, TermId};
use url::Url;

/// Terms selected for `taxonomy` by the document's current location, across
/// every clause naming it.
pub fn selected_terms(doc: &dyn Dom, codec: &ClauseCodec, taxonomy: &str) -> HashSet<TermId> {
    codec
        .selected_terms(&QueryParams::from_url(&doc.location()), taxonomy)
        .into_iter()
        .collect()
}

/// Check exactly the boxes in `tree` whose value is in `selected`.
pub fn sync_checked_state(doc: &mut dyn Dom, tree: NodeId, selected: &HashSet<TermId>) {
    for checkbox in doc.query_all(tree, &Selector::class(CHECKBOX)) {
        let checked = doc
            .value(checkbox)
            .and_then(|value| TermId::parse_lenient(&value))
            .is_some_and(|id| selected.contains(&id));
        doc.set_checked(checkbox, checked);
    }
}

/// Ids of the checked boxes in `tree`, document order, hidden roots included.
pub fn checked_terms(doc: &dyn Dom, tree: NodeId) -> Vec<TermId> {
    doc.query_all(tree, &Selector::class(CHECKBOX))
        .into_iter()
        .filter(|checkbox| doc.is_checked(*checkbox))
        .filter_map(|checkbox| {
            doc.value(checkbox)
                .and_then(|value| TermId::parse_lenient(&value))
        })
        .collect()
}

/// `location` with `taxonomy`'s clause replaced by one `IN` clause over
/// `checked`, or dropped when nothing is checked. Other parameters and
/// other taxonomies' clauses are kept.
pub fn navigation_url(
    location: &Url,
    codec: &ClauseCodec,
    taxonomy: &str,
    checked: Vec<TermId>,
) -> Url {
    let mut params = QueryParams::from_url(location);
    codec.replace_taxonomy(&mut params, taxonomy, checked);
    let mut url = location.clone();
    params.apply_to(&mut url);
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use pretty_assertions::assert_eq;
    use tree_filter_types::{Element, QueryClause};

    fn ids(raw: &[u64]) -> Vec<TermId> {
        raw.iter().map(|id| TermId::new(*id).unwrap()).collect()
    }

    fn checkbox(value: &str) -> Element {
        Element::new("input")
            .attr("type", "checkbox")
            .attr("value", value)
            .class(CHECKBOX)
    }

    #[test]
    fn test_selection_follows_location() {
        let url = Url::parse(
            "https://example.org/?clauseSet[0][taxonomy]=tnc_tax_2&clauseSet[0][terms][0]=5&clauseSet[0][terms][1]=9",
        )
        .unwrap();
        let mut doc = Document::new(url);
        let body = doc.body();
        let tree = doc.append(
            body,
            &Element::new("div")
                .child(checkbox("5"))
                .child(checkbox("7").attr("checked", "checked"))
                .child(checkbox("9")),
        );

        let selected = selected_terms(&doc, &ClauseCodec::default(), "tnc_tax_2");
        assert_eq!(selected, ids(&[5, 9]).into_iter().collect::<HashSet<_>>());

        sync_checked_state(&mut doc, tree, &selected);
        assert_eq!(checked_terms(&doc, tree), ids(&[5, 9]));
    }

    #[test]
    fn test_navigation_replaces_only_own_clause() {
        let codec = ClauseCodec::default();
        let mut params = QueryParams::parse("view=grid");
        codec.encode(
            &mut params,
            &[
                QueryClause::new_in("tnc_tax_region", ids(&[1])),
                QueryClause::new_in("tnc_tax_kind", ids(&[8])),
            ],
        );
        let mut location = Url::parse("https://example.org/items/").unwrap();
        params.apply_to(&mut location);

        let url = navigation_url(&location, &codec, "tnc_tax_region", ids(&[3, 2]));
        let params = QueryParams::from_url(&url);
        assert_eq!(params.get("view"), Some("grid"));
        assert_eq!(
            codec.decode(&params),
            vec![
                QueryClause::new_in("tnc_tax_kind", ids(&[8])),
                QueryClause::new_in("tnc_tax_region", ids(&[3, 2])),
            ]
        );

        let cleared = navigation_url(&location, &codec, "tnc_tax_region", vec![]);
        assert_eq!(
            codec.decode(&QueryParams::from_url(&cleared)),
            vec![QueryClause::new_in("tnc_tax_kind", ids(&[8]))]
        );
    }
}
