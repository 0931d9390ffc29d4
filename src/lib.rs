//! Sidebar Tree Filter - server layer
//!
//! Replaces a faceted-search sidebar's flat taxonomy filter with an
//! expandable tree of checkboxes. This crate produces everything the page
//! needs before the client takes over:
//!
//! - `TreeProvider` - target taxonomies, titles, term ids, selection state
//! - `TreeRenderer` - one dormant `<template>` per taxonomy + config payload
//! - `PageRenderer` - activation check and final head/footer markup
//!
//! The client half (mounting templates next to the native widgets and
//! keeping checkboxes and the URL in sync) lives in `tree-filter-client`;
//! both halves share `tree-filter-types`.
//!
//! # Example
//!
//! ```
//! use tree_filter::{
//!     InMemoryTermStore, PageContext, PageRenderer, TaxonomyMeta, Term, TreeFilterConfig,
//! };
//! use tree_filter_types::{QueryParams, TermId};
//!
//! let store = InMemoryTermStore::new().with_taxonomy(
//!     TaxonomyMeta::new("tnc_tax_region").with_singular_name("Region"),
//!     vec![Term::new(TermId::new(1).unwrap(), "Europe", 0)],
//! );
//! let renderer = PageRenderer::new(store, TreeFilterConfig::default()).unwrap();
//! let page = renderer
//!     .render(&PageContext::default(), &QueryParams::new())
//!     .unwrap();
//! assert!(page.footer.contains("tnc-tree-filter-template-tnc_tax_region"));
//! ```

pub mod activation;
pub mod assets;
pub mod config;
mod error;
pub mod page;
pub mod provider;
pub mod render;
pub mod store;

pub use activation::{should_activate, ActivationHook, ContentSignal, PageContext};
pub use assets::{AssetManifest, AssetRef};
pub use config::{AssetConfig, TreeFilterConfig};
pub use error::{Result, StoreError, TreeFilterError};
pub use page::{PageRenderer, RenderedPage};
pub use provider::{taxonomy_title, TreeProvider, FALLBACK_TITLE};
pub use render::{sanitize_html_class, TreeRenderer};
pub use store::{InMemoryTermStore, TaxonomyLabels, TaxonomyMeta, Term, TermQuery, TermStore};
