//! Flattened port entities.

use crate::ids::{CellId, PortId, WireId};
use crate::signal::SignalVector;
use serde::{Deserialize, Serialize};

/// A cell port after flattening, carrying its resolved signal vector and its
/// back-references into the owning cell and (once Net Reconstruction has
/// run) the wire it participates in.
///
/// `parent_node` and `wire` express mutable object-graph back-pointers as
/// stable [`CellId`]/[`WireId`] handles instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatPort {
    /// This port's own id.
    pub id: PortId,
    /// Port name as declared on the cell or module (e.g. `"A"`, `"Y"`).
    pub key: String,
    /// Resolved signal vector for this port.
    pub value: SignalVector,
    /// The cell this port belongs to.
    pub parent_node: CellId,
    /// `true` if this is a driving (output-like) port.
    pub is_output: bool,
    /// The wire this port has been grouped into, set by Net Reconstruction.
    pub wire: Option<WireId>,
}

impl FlatPort {
    /// Creates a new port not yet assigned to a wire.
    pub fn new(id: PortId, key: impl Into<String>, value: SignalVector, parent_node: CellId, is_output: bool) -> Self {
        Self {
            id,
            key: key.into(),
            value,
            parent_node,
            is_output,
            wire: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::Signal;
    use schem_common::ArenaId;

    #[test]
    fn new_port_has_no_wire_yet() {
        let port = FlatPort::new(
            PortId::from_raw(0),
            "Y",
            SignalVector::new(vec![Signal::Bit(1)]),
            CellId::from_raw(0),
            true,
        );
        assert!(port.wire.is_none());
        assert!(port.is_output);
    }
}
