//! Sidebar Tree Filter - client layer
//!
//! Runs against the page the server layer produced: reads the configuration
//! payload, mounts each taxonomy's template beside its native widget, and
//! turns checkbox changes into navigations carrying the clause encoding.
//!
//! ```text
//!  ready ──► boot ──► MountController::start ──► mount_all
//!                              │
//!   observer ──► notify_mutation ──► reconcile ──► mount_all (coalesced)
//!   click/change ──► dispatch ──► collapse / navigate
//! ```
//!
//! Everything runs against the [`Dom`] trait. [`Document`] is an in-memory
//! arena used natively; on `wasm32` the `web` module implements the trait
//! over the live page and owns the observer, listeners and timers.

mod collapse;
mod config;
mod dom;
mod error;
mod matcher;
mod mount;
mod reconcile;
mod sync;
#[cfg(target_arch = "wasm32")]
mod web;

pub use collapse::{
    collapse_or_expand_all, is_node_collapsed, is_tree_expanded, set_node_collapsed,
    set_tree_collapsed,
};
pub use config::{ClientConfig, ClientFilter};
pub use dom::{Document, Dom, NodeId, Selector};
pub use error::{ClientError, MountSkip};
pub use matcher::{native_top_level_option_ids, normalize_title, TitleMatcher, WidgetMatcher};
pub use mount::{prune_roots, root_nodes, MountController, MountState, MountedTree, UiEvent};
pub use reconcile::Reconciler;
pub use sync::{checked_terms, navigation_url, selected_terms, sync_checked_state};
#[cfg(target_arch = "wasm32")]
pub use web::{start, WebDocument};

/// Ready-event entry point. `None` when the page carries no usable payload
/// or configures no taxonomy.
pub fn boot(doc: &mut dyn Dom) -> Option<MountController> {
    let mut controller = match MountController::from_document(doc) {
        Ok(controller) => controller,
        Err(ClientError::MissingPayload(_)) => return None,
        Err(e) => {
            tracing::warn!("tree filter disabled: {}", e);
            return None;
        }
    };
    if controller.config().filters.is_empty() {
        return None;
    }
    controller.start(doc);
    Some(controller)
}
