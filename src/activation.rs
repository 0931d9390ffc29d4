//! Page activation
//!
//! Decides whether the tree filter attaches to a page at all. Route
//! structures vary between sites, so content signals are advisory: the
//! default is to load, and an [`ActivationHook`] gets the final word.

/// What the server knows about the page being rendered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    /// Administrative (back-office) pages never load the filter.
    pub is_admin: bool,
    /// Raw content of the queried post, when there is one.
    pub content: Option<String>,
}

impl PageContext {
    pub fn front_end(content: impl Into<String>) -> Self {
        Self {
            is_admin: false,
            content: Some(content.into()),
        }
    }
}

/// Outcome of scanning page content for the browsing UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSignal {
    /// An items list shortcode or faceted-search block is present.
    BrowsingUi,
    /// Nothing conclusive; the list may be rendered by a template instead.
    Inconclusive,
}

const SHORTCODES: &[&str] = &["tainacan_items_list", "tainacan_items_list_tag"];
const BLOCKS: &[&str] = &["tainacan/faceted-search", "tainacan/items-list"];

pub fn detect_signal(page: &PageContext) -> ContentSignal {
    let Some(content) = page.content.as_deref() else {
        return ContentSignal::Inconclusive;
    };
    let has_shortcode = SHORTCODES.iter().any(|tag| has_shortcode(content, tag));
    let has_block = BLOCKS
        .iter()
        .any(|block| content.contains(&format!("<!-- wp:{block}")));
    if has_shortcode || has_block {
        ContentSignal::BrowsingUi
    } else {
        ContentSignal::Inconclusive
    }
}

/// `[tag]`, `[tag attr="x"]` or `[tag/]`, but not `[tag_more]`.
fn has_shortcode(content: &str, tag: &str) -> bool {
    let opener = format!("[{tag}");
    content.match_indices(&opener).any(|(at, _)| {
        matches!(
            content[at + opener.len()..].chars().next(),
            Some(']' | '/' | ' ' | '\t' | '\n' | '\r')
        )
    })
}

/// Override point for the load decision.
pub trait ActivationHook {
    fn should_load(&self, default: bool, signal: ContentSignal, page: &PageContext) -> bool;
}

impl<F> ActivationHook for F
where
    F: Fn(bool, ContentSignal, &PageContext) -> bool,
{
    fn should_load(&self, default: bool, signal: ContentSignal, page: &PageContext) -> bool {
        self(default, signal, page)
    }
}

/// Whether the tree filter should attach to `page`.
pub fn should_activate(page: &PageContext, hook: Option<&dyn ActivationHook>) -> bool {
    if page.is_admin {
        return false;
    }
    let signal = detect_signal(page);
    let default = true;
    match hook {
        Some(hook) => hook.should_load(default, signal, page),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_pages_never_activate() {
        let page = PageContext {
            is_admin: true,
            content: Some("[tainacan_items_list]".into()),
        };
        let always = |_: bool, _: ContentSignal, _: &PageContext| true;
        assert!(!should_activate(&page, Some(&always)));
    }

    #[test]
    fn test_default_is_to_load() {
        assert!(should_activate(&PageContext::default(), None));
        assert!(should_activate(&PageContext::front_end("plain text"), None));
    }

    #[test]
    fn test_signal_detection() {
        let cases = [
            ("[tainacan_items_list]", ContentSignal::BrowsingUi),
            ("x [tainacan_items_list_tag id=\"3\"] y", ContentSignal::BrowsingUi),
            ("<!-- wp:tainacan/faceted-search {\"a\":1} /-->", ContentSignal::BrowsingUi),
            ("<!-- wp:tainacan/items-list /-->", ContentSignal::BrowsingUi),
            ("[tainacan_items_listing]", ContentSignal::Inconclusive),
            ("nothing here", ContentSignal::Inconclusive),
        ];
        for (content, expected) in cases {
            assert_eq!(detect_signal(&PageContext::front_end(content)), expected, "{content}");
        }
        assert_eq!(detect_signal(&PageContext::default()), ContentSignal::Inconclusive);
    }

    #[test]
    fn test_hook_overrides_decision() {
        let only_browsing =
            |_: bool, signal: ContentSignal, _: &PageContext| signal == ContentSignal::BrowsingUi;
        assert!(!should_activate(&PageContext::front_end("about us"), Some(&only_browsing)));
        assert!(should_activate(
            &PageContext::front_end("[tainacan_items_list]"),
            Some(&only_browsing)
        ));
    }
}
