//! The flattened module: the Flattener's output and every later stage's
//! input, all the way through Net Reconstruction.

use crate::cell::Cell;
use crate::ids::{CellId, PortId, WireId};
use crate::port::FlatPort;
use crate::wire::Wire;
use schem_common::{Arena, ArenaId};
use serde::{Deserialize, Serialize};

/// A single-level, hierarchy-free netlist: every cell instance from every
/// nested submodule has been inlined into one flat list of cells and ports.
///
/// `wires` is empty until the Net Builder runs; before that, ports only
/// carry their resolved [`crate::signal::SignalVector`] values and have not
/// yet been grouped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlatModule {
    /// Name of the module this flattening started from.
    pub name: String,
    /// Every cell in the flattened design.
    pub cells: Arena<CellId, Cell>,
    /// Every port in the flattened design, across all cells.
    pub ports: Arena<PortId, FlatPort>,
    /// Reconstructed nets, populated by the Net Builder.
    pub wires: Arena<WireId, Wire>,
}

impl FlatModule {
    /// Creates a new, empty flat module with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Arena::new(),
            ports: Arena::new(),
            wires: Arena::new(),
        }
    }

    /// Allocates a new cell with no ports yet and returns its id.
    pub fn add_cell(&mut self, key: impl Into<String>, cell_type: impl Into<String>, attributes: indexmap::IndexMap<String, String>) -> CellId {
        let id = CellId::from_raw(self.cells.len() as u32);
        self.cells.alloc(Cell {
            id,
            key: key.into(),
            cell_type: cell_type.into(),
            input_ports: Vec::new(),
            output_ports: Vec::new(),
            attributes,
        })
    }

    /// Allocates a port on behalf of `cell_id`, registering it on that
    /// cell's input or output port list.
    pub fn add_port(&mut self, cell_id: CellId, key: impl Into<String>, value: crate::signal::SignalVector, is_output: bool) -> PortId {
        let port_id = self.ports.alloc(FlatPort::new(
            PortId::from_raw(self.ports.len() as u32),
            key,
            value,
            cell_id,
            is_output,
        ));
        let cell = self.cells.get_mut(cell_id);
        if is_output {
            cell.output_ports.push(port_id);
        } else {
            cell.input_ports.push(port_id);
        }
        port_id
    }
}
