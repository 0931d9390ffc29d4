//! Server markup mounted by the client, and the resulting navigation read
//! back by the server.

use pretty_assertions::assert_eq;
use tree_filter::{
    InMemoryTermStore, TaxonomyMeta, Term, TreeFilterConfig, TreeProvider, TreeRenderer,
};
use tree_filter_client::{boot, root_nodes, Document, MountState, NodeId, Selector, UiEvent};
use tree_filter_types::contract::{
    CHECKBOX, NATIVE_OPTION_GROUP, NATIVE_TITLE, NATIVE_VIEW_ALL, NATIVE_WIDGET, NODE_HAS_CHILDREN,
    OPTION_VALUE_ATTR, SIDEBAR_CLASS, TREE,
};
use tree_filter_types::{Element, QueryParams, TermId};
use url::Url;

fn id(raw: u64) -> TermId {
    TermId::new(raw).unwrap()
}

fn region_provider(config: &TreeFilterConfig) -> TreeProvider<InMemoryTermStore> {
    let store = InMemoryTermStore::new()
        .with_taxonomy(
            TaxonomyMeta::new("tnc_tax_region").with_singular_name("Region"),
            vec![
                Term::new(id(1), "Europe", 0),
                Term::new(id(2), "France", 1),
                Term::new(id(3), "Spain", 1),
                Term::new(id(4), "Asia", 0),
            ],
        )
        .with_taxonomy(TaxonomyMeta::new("category"), vec![Term::new(id(9), "Misc", 0)]);
    TreeProvider::new(store, config).unwrap()
}

fn native_widget(title: &str, options: &[u64]) -> Element {
    let mut widget = Element::new("div")
        .class(NATIVE_WIDGET)
        .child(Element::new("span").class(NATIVE_TITLE).text(title));
    for option in options {
        widget = widget.child(
            Element::new("div").class(NATIVE_OPTION_GROUP).child(
                Element::new("label").child(
                    Element::new("input")
                        .attr("type", "checkbox")
                        .attr(OPTION_VALUE_ATTR, option.to_string()),
                ),
            ),
        );
    }
    widget.child(Element::new("a").class(NATIVE_VIEW_ALL))
}

/// Browser-side page built from what the server rendered for `location`.
fn served_page(
    provider: &TreeProvider<InMemoryTermStore>,
    location: &str,
) -> (Document, NodeId) {
    let url = Url::parse(location).unwrap();
    let params = QueryParams::from_url(&url);
    let renderer = TreeRenderer::new(provider);
    let payload = renderer.payload();

    let mut doc = Document::new(url);
    let body = doc.body();
    let sidebar = doc.append(
        body,
        &Element::new("div")
            .class(SIDEBAR_CLASS)
            .child(native_widget("Region", &[1, 4])),
    );
    doc.append(body, &renderer.config_script(&payload));
    for template in renderer.templates(&params) {
        doc.append(body, &template);
    }
    (doc, sidebar)
}

#[test]
fn test_rendered_templates_mount_and_filter() {
    let config = TreeFilterConfig::default();
    let provider = region_provider(&config);
    let (mut doc, sidebar) = served_page(&provider, "https://example.org/items/?order=asc");

    let mut controller = boot(&mut doc).unwrap();
    assert_eq!(controller.config().filters.len(), 1);
    assert_eq!(controller.state(&doc, sidebar, "tnc_tax_region"), MountState::Mounted);

    let tree = doc.query(sidebar, &Selector::class(TREE)).unwrap();
    let roots = root_nodes(&doc, tree);
    assert_eq!(roots.len(), 2);
    assert!(doc.has_class(roots[0], NODE_HAS_CHILDREN));

    for term in [2, 4] {
        let checkbox = doc
            .query(tree, &Selector::class(CHECKBOX).with_attr_eq("value", &term.to_string()))
            .unwrap();
        doc.set_checked(checkbox, true);
    }
    let four = doc
        .query(tree, &Selector::class(CHECKBOX).with_attr_eq("value", "4"))
        .unwrap();
    assert!(controller.dispatch(&mut doc, UiEvent::Change(four)));

    let params = QueryParams::from_url(doc.location());
    assert_eq!(params.get("order"), Some("asc"));
    assert_eq!(
        provider.selected_term_ids("tnc_tax_region", &params),
        vec![id(2), id(4)]
    );

    // the next page load renders the selection as checked
    let (mut next, sidebar) = served_page(&provider, doc.location().as_str());
    boot(&mut next).unwrap();
    let tree = next.query(sidebar, &Selector::class(TREE)).unwrap();
    let checked: Vec<&str> = next
        .query_all(tree, &Selector::class(CHECKBOX))
        .into_iter()
        .filter(|checkbox| next.is_checked(*checkbox))
        .filter_map(|checkbox| next.value(checkbox))
        .collect();
    assert_eq!(checked, vec!["2", "4"]);
}

#[test]
fn test_configured_namespace_reaches_the_client() {
    let config = TreeFilterConfig {
        clause_namespace: "taxquery".into(),
        ..Default::default()
    };
    let provider = region_provider(&config);
    let (mut doc, sidebar) = served_page(&provider, "https://example.org/items/");

    let mut controller = boot(&mut doc).unwrap();
    assert_eq!(controller.config().codec.namespace(), "taxquery");

    let tree = doc.query(sidebar, &Selector::class(TREE)).unwrap();
    let one = doc
        .query(tree, &Selector::class(CHECKBOX).with_attr_eq("value", "1"))
        .unwrap();
    doc.set_checked(one, true);
    controller.dispatch(&mut doc, UiEvent::Change(one));

    let params = QueryParams::from_url(doc.location());
    assert_eq!(params.get("taxquery[0][taxonomy]"), Some("tnc_tax_region"));
    assert_eq!(params.get("taxquery[0][terms][0]"), Some("1"));
    assert_eq!(provider.selected_term_ids("tnc_tax_region", &params), vec![id(1)]);
}
