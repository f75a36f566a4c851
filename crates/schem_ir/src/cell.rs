//! Flattened cell (node) entities.

use crate::ids::{CellId, PortId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Synthetic cell type introduced by Constant Synthesis for a coalesced run
/// of literal bits (see `schem_elaborate::constants`).
pub const TYPE_CONSTANT: &str = "$_constant_";
/// Synthetic cell type introduced by Split/Join Synthesis to fan a wide bus
/// out into narrower ones.
pub const TYPE_SPLIT: &str = "$_split_";
/// Synthetic cell type introduced by Split/Join Synthesis to fan several
/// narrow buses into a wide one.
pub const TYPE_JOIN: &str = "$_join_";
/// Synthetic cell type standing in for a top-level module input port.
pub const TYPE_INPUT_EXT: &str = "$_inputExt_";
/// Synthetic cell type standing in for a top-level module output port.
pub const TYPE_OUTPUT_EXT: &str = "$_outputExt_";
/// Synthetic cell type injected by the Layout Request Builder at a
/// hyperedge's fan-out/fan-in points (see `schem_layout::request`); never
/// appears in a netlist-JSON input and never reaches the Drawing Assembler.
pub const TYPE_DUMMY: &str = "$_dummy_";

/// A flattened netlist cell — either a true netlist-JSON cell, a synthesized
/// constant/split/join, or a synthesized external input/output placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    /// This cell's own id.
    pub id: CellId,
    /// Instance name, unique within the flattened module.
    pub key: String,
    /// Cell type, e.g. `"$and"`, `"$_inputExt_"`, or a user submodule name.
    pub cell_type: String,
    /// Input port ids, in declaration order.
    pub input_ports: Vec<PortId>,
    /// Output port ids, in declaration order.
    pub output_ports: Vec<PortId>,
    /// Free-form attributes carried over from the netlist-JSON input (or
    /// synthesized, e.g. a constant cell's rendered hex value).
    pub attributes: IndexMap<String, String>,
}

impl Cell {
    /// Returns `true` if this cell is one of the synthetic kinds introduced
    /// by the pipeline rather than present in the original netlist-JSON.
    pub fn is_synthetic(&self) -> bool {
        matches!(
            self.cell_type.as_str(),
            TYPE_CONSTANT | TYPE_SPLIT | TYPE_JOIN | TYPE_INPUT_EXT | TYPE_OUTPUT_EXT | TYPE_DUMMY
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schem_common::ArenaId;

    fn cell(cell_type: &str) -> Cell {
        Cell {
            id: CellId::from_raw(0),
            key: "c0".to_string(),
            cell_type: cell_type.to_string(),
            input_ports: Vec::new(),
            output_ports: Vec::new(),
            attributes: IndexMap::new(),
        }
    }

    #[test]
    fn synthetic_types_are_detected() {
        assert!(cell(TYPE_CONSTANT).is_synthetic());
        assert!(cell(TYPE_SPLIT).is_synthetic());
        assert!(cell(TYPE_DUMMY).is_synthetic());
    }

    #[test]
    fn user_cell_types_are_not_synthetic() {
        assert!(!cell("$and").is_synthetic());
        assert!(!cell("my_submodule").is_synthetic());
    }
}
