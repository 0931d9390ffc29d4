//! Mount Controller
//!
//! Places each taxonomy's dormant tree next to the matching native widget in
//! every recognized sidebar, scopes its roots to what the native widget
//! offers, and takes over from the native widget only when that scoping
//! succeeded.
//!
//! ```text
//! (sidebar, taxonomy):  Unmounted ──mount_one ok──► Mounted
//!                           ▲                          │
//!                           └── sidebar re-rendered ◄──┘
//! ```
//!
//! Every step is idempotent. Re-running a pass over mounted pairs leaves the
//! document unchanged, which is what lets [`MountController::reconcile`] run
//! after any structural change without bookkeeping per pair.

use crate::collapse::{
    collapse_or_expand_all, is_node_collapsed, is_tree_expanded, set_node_collapsed,
    set_tree_collapsed,
};
use crate::config::{ClientConfig, ClientFilter};
use crate::dom::{Dom, NodeId, Selector};
use crate::error::{ClientError, MountSkip};
use crate::matcher::{native_top_level_option_ids, TitleMatcher, WidgetMatcher};
use crate::reconcile::Reconciler;
use crate::sync::{checked_terms, navigation_url, selected_terms, sync_checked_state};
use std::collections::{BTreeSet, HashMap, VecDeque};
use tracing::{debug, info};
use tree_filter_types::contract::{
    CHECKBOX, NATIVE_COLLAPSE_ALL, NODE, TAXONOMY_ATTR, TEMPLATE_TAXONOMY_ATTR, TOGGLE,
    TOGGLE_PLACEHOLDER, TREE, TREE_HEADER, TREE_ROOTS,
};
use tree_filter_types::{Node, TermId};

// =============================================================================
// EVENTS AND STATE
// =============================================================================

/// User interaction delivered to the controller. Events bubble from the
/// target through its ancestors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Click(NodeId),
    Change(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountState {
    Unmounted,
    Mounted,
}

/// Outcome of a successful mount attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountedTree {
    pub sidebar: NodeId,
    pub tree: NodeId,
    pub native: NodeId,
    /// Whether this attempt cloned the template into the sidebar.
    pub inserted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    HeaderToggle { tree: NodeId },
    NodeToggle,
    CollapseAll { sidebar: NodeId },
    CheckboxChange,
}

impl Binding {
    fn handles(&self, event: &UiEvent) -> bool {
        match self {
            Binding::CheckboxChange => matches!(event, UiEvent::Change(_)),
            _ => matches!(event, UiEvent::Click(_)),
        }
    }
}

/// Work that runs after the current event finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    /// Propagate the native collapse-all control's new state.
    CollapseAll { control: NodeId, sidebar: NodeId },
}

// =============================================================================
// CONTROLLER
// =============================================================================

pub struct MountController {
    config: ClientConfig,
    templates: HashMap<String, Vec<Node>>,
    matcher: Box<dyn WidgetMatcher>,
    bindings: HashMap<NodeId, Binding>,
    deferred: VecDeque<Deferred>,
    reconciler: Reconciler,
}

impl MountController {
    /// Controller over the templates currently present in `doc`.
    pub fn new(config: ClientConfig, doc: &dyn Dom) -> Self {
        let selector = Selector::tag("template").with_attr(TEMPLATE_TAXONOMY_ATTR);
        let templates = doc
            .query_all(doc.body(), &selector)
            .into_iter()
            .filter_map(|template| {
                let taxonomy = doc.attr(template, TEMPLATE_TAXONOMY_ATTR)?;
                if taxonomy.is_empty() {
                    return None;
                }
                let content = doc.template_content(template)?;
                Some((taxonomy, content))
            })
            .collect();

        Self {
            config,
            templates,
            matcher: Box::new(TitleMatcher),
            bindings: HashMap::new(),
            deferred: VecDeque::new(),
            reconciler: Reconciler::new(),
        }
    }

    /// Read the payload script from `doc` and build a controller.
    pub fn from_document(doc: &dyn Dom) -> Result<Self, ClientError> {
        let config = ClientConfig::from_document(doc)?;
        Ok(Self::new(config, doc))
    }

    pub fn with_matcher(mut self, matcher: impl WidgetMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// First pass after the document is ready. Returns successful mounts.
    pub fn start(&mut self, doc: &mut dyn Dom) -> usize {
        if self.config.filters.is_empty() {
            debug!("no taxonomies configured, nothing to mount");
            return 0;
        }
        let mounted = self.mount_all(doc);
        self.reconciler.settle(doc.mutation_epoch());
        mounted
    }

    /// Attempt every (sidebar, taxonomy) pair. Returns successful mounts.
    pub fn mount_all(&mut self, doc: &mut dyn Dom) -> usize {
        let filters = self.config.filters.clone();
        let mut mounted = 0;
        for sidebar in self.config.sidebars(doc) {
            for filter in &filters {
                match self.mount_one(doc, sidebar, filter) {
                    Ok(_) => mounted += 1,
                    Err(reason) => {
                        debug!(taxonomy = %filter.taxonomy, %reason, "mount skipped");
                    }
                }
            }
        }
        mounted
    }

    pub fn mount_one(
        &mut self,
        doc: &mut dyn Dom,
        sidebar: NodeId,
        filter: &ClientFilter,
    ) -> Result<MountedTree, MountSkip> {
        let taxonomy = filter.taxonomy.as_str();
        let template = self
            .templates
            .get(taxonomy)
            .ok_or(MountSkip::NoTemplate)?;

        let native = self
            .matcher
            .find_native_widget(doc, sidebar, filter)
            .ok_or(MountSkip::NoNativeWidget)?;

        let allowed = native_top_level_option_ids(doc, native);
        if allowed.is_empty() {
            return Err(MountSkip::NoAllowedOptions);
        }

        let mut inserted = false;
        let tree = match find_tree(doc, sidebar, taxonomy) {
            Some(tree) => tree,
            None => {
                let content = template.clone();
                doc.insert_before(native, &content);
                inserted = true;
                find_tree(doc, sidebar, taxonomy).ok_or(MountSkip::TreeNotInserted)?
            }
        };

        if !prune_roots(doc, tree, &allowed) {
            doc.set_hidden(tree, true);
            doc.set_hidden(native, false);
            return Err(MountSkip::NoMatchingRoots);
        }
        doc.set_hidden(tree, false);

        let selected = selected_terms(doc, &self.config.codec, taxonomy);
        sync_checked_state(doc, tree, &selected);
        self.bind(doc, tree, sidebar);
        doc.set_hidden(native, true);

        if inserted {
            info!(taxonomy, allowed = allowed.len(), "mounted tree filter");
        }
        Ok(MountedTree {
            sidebar,
            tree,
            native,
            inserted,
        })
    }

    /// Whether `taxonomy`'s tree is showing in `sidebar`.
    pub fn state(&self, doc: &dyn Dom, sidebar: NodeId, taxonomy: &str) -> MountState {
        match find_tree(doc, sidebar, taxonomy) {
            Some(tree) if !doc.is_hidden(tree) => MountState::Mounted,
            _ => MountState::Unmounted,
        }
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Observer callback: the document changed somewhere.
    pub fn notify_mutation(&mut self) {
        self.reconciler.notify();
    }

    /// Run the pending pass, if any. Returns successful mounts of that pass.
    pub fn reconcile(&mut self, doc: &mut dyn Dom) -> Option<usize> {
        if !self.reconciler.begin(doc.mutation_epoch()) {
            return None;
        }
        self.bindings.retain(|node, _| doc.is_connected(*node));
        let mounted = self.mount_all(doc);
        self.reconciler.settle(doc.mutation_epoch());
        debug!(mounted, passes = self.reconciler.passes(), "reconciled");
        Some(mounted)
    }

    // =========================================================================
    // Interaction
    // =========================================================================

    fn bind(&mut self, doc: &dyn Dom, tree: NodeId, sidebar: NodeId) {
        if let Some(header) = doc.query(tree, &Selector::class(TREE_HEADER)) {
            self.bindings
                .entry(header)
                .or_insert(Binding::HeaderToggle { tree });
        }

        for toggle in doc.query_all(tree, &Selector::class(TOGGLE)) {
            if !doc.has_class(toggle, TOGGLE_PLACEHOLDER) {
                self.bindings.entry(toggle).or_insert(Binding::NodeToggle);
            }
        }

        if let Some(control) = doc.query(sidebar, &Selector::class(NATIVE_COLLAPSE_ALL)) {
            self.bindings
                .entry(control)
                .or_insert(Binding::CollapseAll { sidebar });
        }

        for checkbox in doc.query_all(tree, &Selector::class(CHECKBOX)) {
            self.bindings.entry(checkbox).or_insert(Binding::CheckboxChange);
        }
    }

    /// Deliver `event`. Returns whether any binding handled it.
    pub fn dispatch(&mut self, doc: &mut dyn Dom, event: UiEvent) -> bool {
        let target = match event {
            UiEvent::Click(node) | UiEvent::Change(node) => node,
        };
        if !doc.is_connected(target) {
            return false;
        }

        let mut handled = false;
        let mut current = Some(target);
        while let Some(node) = current {
            if let Some(binding) = self.bindings.get(&node).copied() {
                if binding.handles(&event) {
                    self.run(doc, node, binding);
                    handled = true;
                }
            }
            current = doc.parent(node);
        }
        handled
    }

    fn run(&mut self, doc: &mut dyn Dom, node: NodeId, binding: Binding) {
        match binding {
            Binding::HeaderToggle { tree } => {
                let expanded = is_tree_expanded(doc, tree);
                set_tree_collapsed(doc, tree, expanded);
            }
            Binding::NodeToggle => {
                if let Some(tree_node) = doc.closest(node, &Selector::class(NODE)) {
                    let collapse = !is_node_collapsed(doc, tree_node);
                    set_node_collapsed(doc, tree_node, collapse);
                }
            }
            Binding::CollapseAll { sidebar } => {
                self.deferred.push_back(Deferred::CollapseAll {
                    control: node,
                    sidebar,
                });
            }
            Binding::CheckboxChange => self.apply_selection(doc, node),
        }
    }

    /// Navigate to the location filtering by every checked box in the tree
    /// holding `checkbox`.
    fn apply_selection(&self, doc: &mut dyn Dom, checkbox: NodeId) {
        let Some(tree) = doc.closest(checkbox, &Selector::class(TREE)) else {
            return;
        };
        let Some(taxonomy) = doc
            .attr(tree, TAXONOMY_ATTR)
            .filter(|taxonomy| !taxonomy.is_empty())
        else {
            return;
        };

        let checked = checked_terms(doc, tree);
        debug!(taxonomy = %taxonomy, checked = checked.len(), "selection changed");
        let url = navigation_url(&doc.location(), &self.config.codec, &taxonomy, checked);
        doc.navigate(url);
    }

    pub fn has_deferred(&self) -> bool {
        !self.deferred.is_empty()
    }

    /// Run queued deferred work. Returns how many tasks ran.
    pub fn run_deferred(&mut self, doc: &mut dyn Dom) -> usize {
        let mut ran = 0;
        while let Some(task) = self.deferred.pop_front() {
            match task {
                Deferred::CollapseAll { control, sidebar } => {
                    let collapse = doc.attr(control, "aria-expanded").as_deref() == Some("false");
                    for tree in doc.query_all(sidebar, &Selector::class(TREE)) {
                        collapse_or_expand_all(doc, tree, collapse);
                    }
                }
            }
            ran += 1;
        }
        ran
    }
}

// =============================================================================
// TREE HELPERS
// =============================================================================

fn find_tree(doc: &dyn Dom, sidebar: NodeId, taxonomy: &str) -> Option<NodeId> {
    doc.query(
        sidebar,
        &Selector::class(TREE).with_attr_eq(TAXONOMY_ATTR, taxonomy),
    )
}

/// Root-level nodes of `tree`, hidden or not.
pub fn root_nodes(doc: &dyn Dom, tree: NodeId) -> Vec<NodeId> {
    let Some(container) = doc.query(tree, &Selector::class(TREE_ROOTS)) else {
        return Vec::new();
    };
    doc.element_children(container)
        .into_iter()
        .filter(|child| doc.has_class(*child, NODE))
        .collect()
}

/// Term id of a root node's own checkbox.
fn root_value(doc: &dyn Dom, root: NodeId) -> Option<TermId> {
    let row = doc.element_children(root).first().copied()?;
    let checkbox = doc.query(row, &Selector::class(CHECKBOX))?;
    doc.value(checkbox)
        .and_then(|value| TermId::parse_lenient(&value))
}

/// Show only the roots whose id is in `allowed`.
///
/// Returns `false` without hiding anything when `allowed` is empty or no
/// root matches; in the latter case every root is made visible again.
pub fn prune_roots(doc: &mut dyn Dom, tree: NodeId, allowed: &BTreeSet<TermId>) -> bool {
    if allowed.is_empty() {
        return false;
    }
    let roots = root_nodes(doc, tree);
    let keep: Vec<bool> = roots
        .iter()
        .map(|root| root_value(doc, *root).is_some_and(|id| allowed.contains(&id)))
        .collect();

    if !keep.contains(&true) {
        for root in roots {
            doc.set_hidden(root, false);
        }
        return false;
    }

    for (root, keep) in roots.into_iter().zip(keep) {
        doc.set_hidden(root, !keep);
    }
    true
}
