//! Drawing Assembler.
//!
//! Instantiates each flat-module cell's skin template at its computed
//! position, emits routed polylines and junction dots from the reconciled
//! layout, and serializes the resulting tree back to text.

#![warn(missing_docs)]

pub mod assemble;
pub mod tree;

pub use assemble::assemble_drawing;
pub use tree::{write_xml, DrawNode};
