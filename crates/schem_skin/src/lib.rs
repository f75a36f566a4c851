//! Skin-template parsing, per-cell-type template lookup, and port
//! classification.
//!
//! The skin document is parsed once into an opaque [`tree::SkinNode`] tree
//! and queried through [`query::SkinQuery`] for the rest of the pipeline's
//! lifetime; nothing downstream touches `quick_xml` event types directly.

#![warn(missing_docs)]

pub mod query;
pub mod tree;

pub use query::{CellTemplate, PortRole, Position, SkinOptions, SkinQuery, TemplatePort};
pub use tree::{SkinNode, SkinParseError};
