//! Shared foundational types for the schem netlist-to-schematic toolchain.
//!
//! This crate provides the arena abstraction used to store flat IR entities,
//! a non-fatal diagnostic accumulator, and the common result type used by
//! fallible internal operations.

#![warn(missing_docs)]

pub mod arena;
pub mod diagnostics;
pub mod result;

pub use arena::{Arena, ArenaId};
pub use diagnostics::{Diagnostic, DiagnosticSink, Severity};
pub use result::{InternalError, SchemResult};
