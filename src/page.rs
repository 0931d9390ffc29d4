//! Page assembly: the markup the server adds to a browsing page.

use crate::activation::{should_activate, ActivationHook, PageContext};
use crate::assets::AssetManifest;
use crate::config::TreeFilterConfig;
use crate::error::Result;
use crate::provider::TreeProvider;
use crate::render::TreeRenderer;
use crate::store::TermStore;
use tree_filter_types::{QueryParams, TreeFilterPayload};

/// Markup fragments for one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    pub assets: AssetManifest,
    pub payload: TreeFilterPayload,
    /// Goes in `<head>`: the stylesheet link.
    pub head: String,
    /// Goes before `</body>`: payload, templates, then the client script.
    pub footer: String,
    /// Number of templates in `footer`.
    pub template_count: usize,
}

pub struct PageRenderer<S> {
    provider: TreeProvider<S>,
    config: TreeFilterConfig,
    hook: Option<Box<dyn ActivationHook>>,
}

impl<S: TermStore> PageRenderer<S> {
    pub fn new(store: S, config: TreeFilterConfig) -> Result<Self> {
        Ok(Self {
            provider: TreeProvider::new(store, &config)?,
            config,
            hook: None,
        })
    }

    pub fn with_hook(mut self, hook: impl ActivationHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn provider(&self) -> &TreeProvider<S> {
        &self.provider
    }

    /// `None` when the filter does not attach to `page`.
    pub fn render(&self, page: &PageContext, params: &QueryParams) -> Option<RenderedPage> {
        if !should_activate(page, self.hook.as_deref()) {
            tracing::debug!(is_admin = page.is_admin, "tree filter not active on page");
            return None;
        }

        let renderer = TreeRenderer::new(&self.provider);
        let assets = AssetManifest::from_config(&self.config.assets);
        let payload = renderer.payload();
        let templates = renderer.templates(params);

        let mut footer = renderer.config_script(&payload).to_html();
        for template in &templates {
            footer.push_str(&template.to_html());
        }
        footer.push_str(&assets.script_tag().to_html());

        tracing::info!(
            taxonomies = payload.filters.len(),
            templates = templates.len(),
            "rendered tree filter markup"
        );

        Some(RenderedPage {
            head: assets.stylesheet_tag().to_html(),
            footer,
            template_count: templates.len(),
            assets,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activation::ContentSignal;
    use crate::store::{InMemoryTermStore, TaxonomyMeta, Term};
    use tree_filter_types::TermId;

    fn store() -> InMemoryTermStore {
        InMemoryTermStore::new().with_taxonomy(
            TaxonomyMeta::new("tnc_tax_region").with_singular_name("Region"),
            vec![Term::new(TermId::new(1).unwrap(), "Europe", 0)],
        )
    }

    #[test]
    fn test_payload_precedes_templates() {
        let renderer = PageRenderer::new(store(), TreeFilterConfig::default()).unwrap();
        let page = renderer
            .render(&PageContext::default(), &QueryParams::new())
            .unwrap();

        assert_eq!(page.template_count, 1);
        let payload_at = page.footer.find("tnc-tree-filter-config").unwrap();
        let template_at = page.footer.find("<template").unwrap();
        let script_at = page.footer.find("tree.js?ver=").unwrap();
        assert!(payload_at < template_at && template_at < script_at);
        assert!(page.head.contains("tree.css?ver="));
    }

    #[test]
    fn test_no_targets_still_emits_payload() {
        let renderer =
            PageRenderer::new(InMemoryTermStore::new(), TreeFilterConfig::default()).unwrap();
        let page = renderer
            .render(&PageContext::default(), &QueryParams::new())
            .unwrap();
        assert_eq!(page.template_count, 0);
        assert!(page.payload.filters.is_empty());
        assert!(page.footer.contains(r#"{"filters":[],"clauseNamespace":"clauseSet"}"#));
    }

    #[test]
    fn test_inactive_page_renders_nothing() {
        let renderer = PageRenderer::new(store(), TreeFilterConfig::default())
            .unwrap()
            .with_hook(|_: bool, signal: ContentSignal, _: &PageContext| {
                signal == ContentSignal::BrowsingUi
            });
        assert!(renderer
            .render(&PageContext::front_end("contact form"), &QueryParams::new())
            .is_none());
        assert!(renderer
            .render(
                &PageContext::front_end("[tainacan_items_list]"),
                &QueryParams::new()
            )
            .is_some());

        let admin = PageContext {
            is_admin: true,
            content: None,
        };
        assert!(renderer.render(&admin, &QueryParams::new()).is_none());
    }
}
