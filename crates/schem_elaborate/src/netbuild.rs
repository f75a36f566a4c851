//! Net reconstruction: groups ports into wires by shared signal vector.
//!
//! Groups every port by its canonical signal-vector string into a [`Wire`],
//! partitioning each group into drivers/riders/laterals by the port's
//! classification against its cell's skin template, and writes the
//! resulting wire id back onto every port it contains.

use schem_common::ArenaId;
use schem_ir::ids::{PortId, WireId};
use schem_ir::module::FlatModule;
use schem_ir::wire::Wire;
use schem_skin::query::{PortRole, SkinQuery};
use std::collections::HashMap;

/// Groups all ports in `flat` into wires and back-fills `FlatPort::wire`.
pub fn build_nets(flat: &mut FlatModule, skin: &SkinQuery) {
    let mut groups: HashMap<String, Vec<PortId>> = HashMap::new();
    let mut order: Vec<String> = Vec::new();

    for (port_id, port) in flat.ports.iter() {
        let key = port.value.canonical();
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(port_id);
    }

    for key in order {
        let port_ids = groups.remove(&key).unwrap_or_default();
        let signal = flat.ports.get(port_ids[0]).value.clone();
        let wire_id = WireId::from_raw(flat.wires.len() as u32);
        flat.wires.alloc(Wire::new(wire_id, signal));

        for port_id in &port_ids {
            let role = classify_port(flat, skin, *port_id);
            let wire = flat.wires.get_mut(wire_id);
            match role {
                PortRole::Driver => wire.drivers.push(*port_id),
                PortRole::Rider => wire.riders.push(*port_id),
                PortRole::Lateral => wire.laterals.push(*port_id),
            }
            flat.ports.get_mut(*port_id).wire = Some(wire_id);
        }
    }
}

/// Classifies a port as driver/rider/lateral using its cell's skin
/// template, falling back to the direction recorded during flattening when
/// the template has no opinion (e.g. a synthesized `$_split_`/`$_join_`
/// port, whose template-free role is simply its declared input/output
/// side).
fn classify_port(flat: &FlatModule, skin: &SkinQuery, port_id: PortId) -> PortRole {
    let port = flat.ports.get(port_id);
    let cell = flat.cells.get(port.parent_node);

    if let Some(template) = skin.template_for(&cell.cell_type) {
        if let Some(role) = template.classify(&port.key) {
            return role;
        }
    }

    if port.is_output {
        PortRole::Driver
    } else {
        PortRole::Rider
    }
}
