//! The flat netlist intermediate representation and the yosys-style
//! netlist-JSON input types it is built from.
//!
//! `netlist` holds the deserialization-only input model; everything else in
//! this crate is the pipeline's own flat IR, produced by `schem_elaborate`
//! and consumed by `schem_layout`/`schem_draw`.

#![warn(missing_docs)]

pub mod cell;
pub mod ids;
pub mod module;
pub mod netlist;
pub mod port;
pub mod signal;
pub mod wire;

pub use cell::Cell;
pub use ids::{CellId, PortId, WireId};
pub use module::FlatModule;
pub use netlist::NetlistFile;
pub use port::FlatPort;
pub use signal::{Signal, SignalVector};
pub use wire::Wire;
