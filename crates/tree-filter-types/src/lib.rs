//! Shared Types for the Sidebar Tree Filter
//!
//! This crate holds everything that crosses the server/client boundary:
//!
//! ```text
//! ┌──────────────────┐  payload + templates  ┌──────────────────┐
//! │  Server layer    │ ────────────────────► │  Client layer    │
//! │  (tree-filter)   │                       │  (mount / sync)  │
//! └──────────────────┘ ◄──── query string ── └──────────────────┘
//! ```
//!
//! - `TermId` - positive term identifier with lenient query-value coercion
//! - `QueryClause` / `ClauseCodec` - the multi-clause taxonomy query encoding
//! - `TreeFilterPayload` - configuration payload delivered before the templates
//! - `markup` - owned element tree the renderer emits and the client clones
//! - `contract` - class names, attributes and ids both sides agree on
//!
//! # Example
//!
//! ```
//! use tree_filter_types::{ClauseCodec, QueryClause, QueryParams, TermId};
//!
//! let codec = ClauseCodec::default();
//! let mut params = QueryParams::parse("view=grid");
//! let clause = QueryClause::new_in("tnc_tax_region", vec![TermId::new(2).unwrap()]);
//! codec.encode(&mut params, &[clause.clone()]);
//!
//! assert_eq!(codec.decode(&params), vec![clause]);
//! assert_eq!(params.get("view"), Some("grid"));
//! ```

pub mod contract;
pub mod markup;
mod payload;
mod query;
mod term;

pub use markup::{Element, Node};
pub use payload::{FilterConfig, TreeFilterPayload};
pub use query::{
    unique_terms, ClauseCodec, CodecError, QueryClause, QueryParams, DEFAULT_CLAUSE_NAMESPACE,
    DEFAULT_COMPARE,
};
pub use term::{InvalidTermId, TermId};
