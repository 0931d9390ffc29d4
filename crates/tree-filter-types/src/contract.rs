//! Markup contract
//!
//! Class names, attributes and element ids shared by the renderer (which
//! emits them) and the mount controller (which queries them). The host page
//! section lists what the native filter sidebar is expected to expose.

// =============================================================================
// TREE TEMPLATE
// =============================================================================

/// Attribute on the `<template>` naming its taxonomy.
pub const TEMPLATE_TAXONOMY_ATTR: &str = "data-tnc-tree-taxonomy";
pub const TEMPLATE_ID_PREFIX: &str = "tnc-tree-filter-template-";
pub const CONTENT_ID_PREFIX: &str = "tnc-tree-content-";
pub const CONFIG_SCRIPT_ID: &str = "tnc-tree-filter-config";

/// Root element of a mounted tree filter; carries [`TAXONOMY_ATTR`].
pub const TREE: &str = "tnc-tree-filter";
pub const TAXONOMY_ATTR: &str = "data-taxonomy";
pub const TREE_COLLAPSE: &str = "tnc-tree-filter__collapse";
pub const TREE_HEADER: &str = "tnc-tree-filter__header";
pub const TREE_CONTENT: &str = "tnc-tree-filter__content";
/// Container whose direct children are the root nodes.
pub const TREE_ROOTS: &str = "tnc-tree-filter__tree";

pub const NODE: &str = "tnc-tree-node";
pub const NODE_HAS_CHILDREN: &str = "tnc-tree-node--has-children";
pub const NODE_COLLAPSED: &str = "is-collapsed";
pub const ROW: &str = "tnc-tree-row";
pub const TOGGLE: &str = "tnc-tree-toggle";
pub const TOGGLE_PLACEHOLDER: &str = "tnc-tree-toggle--placeholder";
pub const CHECKBOX: &str = "tnc-tree-checkbox";
pub const CHILDREN: &str = "tnc-tree-children";

/// Header icon classes.
pub const ICON_EXPANDED: &str = "tainacan-icon-arrowdown";
pub const ICON_COLLAPSED: &str = "tainacan-icon-arrowright";
pub const ICON_RTL_MIRRORED: &str = "tainacan-icon-is-rtl-mirrored";
pub const ICON_WRAPPER: &str = "icon";

// =============================================================================
// HOST PAGE
// =============================================================================

pub const SIDEBAR_ID: &str = "filters-items-list";
pub const SIDEBAR_CLASS: &str = "tainacan-filters-container";
pub const NATIVE_WIDGET: &str = "filter-item-forms";
pub const NATIVE_TITLE: &str = "collapse-label";
pub const NATIVE_VIEW_ALL: &str = "view-all-button";
pub const NATIVE_OPTION_GROUP: &str = "metadatum";
pub const NATIVE_COLLAPSE_ALL: &str = "collapse-all";

/// Attribute carrying a term id on option inputs, native and tree alike.
pub const OPTION_VALUE_ATTR: &str = "data-filter-option-value";
