//! Layout request construction.
//!
//! Turns an elaborated [`FlatModule`] into the flat, fixed-port-position
//! graph the external layout engine consumes, injecting `$_dummy_` nodes
//! at fan-out/fan-in points the engine cannot express as a true hyperedge.

use indexmap::IndexMap;
use schem_common::{Diagnostic, DiagnosticSink};
use schem_ir::cell::Cell;
use schem_ir::module::FlatModule;
use schem_ir::wire::Wire;
use schem_skin::query::{CellTemplate, SkinQuery};
use serde::{Deserialize, Serialize};

/// Prefix identifying a synthesized dummy cell id, as opposed to a real
/// flat-module cell key.
pub const DUMMY_PREFIX: &str = "$d_";

/// `true` if `id` names a dummy cell synthesized by this stage rather than
/// a real flat-module cell.
pub fn is_dummy_id(id: &str) -> bool {
    id.starts_with(DUMMY_PREFIX)
}

/// A fixed-position port on a layout child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutPort {
    /// Port id, matched against edge endpoints.
    pub pid: String,
    /// X offset within the child's body.
    pub x: f64,
    /// Y offset within the child's body.
    pub y: f64,
}

/// A text label the layout engine should reserve space for.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutLabel {
    /// Label text.
    pub text: String,
    /// X offset within the child's body.
    pub x: f64,
    /// Y offset within the child's body.
    pub y: f64,
}

/// A placeable child node: a real cell, or a synthesized dummy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutChild {
    /// Cell key, or a `$d_`-prefixed dummy id.
    pub id: String,
    /// Nominal body width.
    pub width: f64,
    /// Nominal body height.
    pub height: f64,
    /// Fixed-position ports.
    pub ports: Vec<LayoutPort>,
    /// Labels to reserve space for.
    pub labels: Vec<LayoutLabel>,
}

/// One endpoint of a layout edge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeEndpoint {
    /// The child id this endpoint attaches to.
    pub cell_id: String,
    /// The port id on that child.
    pub port_id: String,
}

/// An edge to be routed between two fixed ports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutEdge {
    /// Edge id, of the form `"e"+n`.
    pub id: String,
    /// Source endpoint.
    pub source: EdgeEndpoint,
    /// Target endpoint.
    pub target: EdgeEndpoint,
    /// `true` when this edge should hint the layout engine toward forward
    /// (left-to-right) routing priority — every driver→rider edge whose
    /// source is not a `$dff` cell.
    pub forward_priority: bool,
}

/// The full request handed to the layout engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutRequest {
    /// Request id (the module name).
    pub id: String,
    /// Placeable children, real and dummy.
    pub children: Vec<LayoutChild>,
    /// Edges to route.
    pub edges: Vec<LayoutEdge>,
}

/// Builds a [`LayoutRequest`] from a fully elaborated (flattened,
/// synthesized, net-built) module.
pub fn build_request(flat: &FlatModule, skin: &SkinQuery, diagnostics: &DiagnosticSink) -> LayoutRequest {
    let mut children = Vec::with_capacity(flat.cells.len());
    for cell in flat.cells.values() {
        children.push(build_child(cell, flat, skin, diagnostics));
    }

    let mut edges = Vec::new();
    let mut edge_counter = 0usize;
    let mut dummy_counter = 0usize;

    for wire in flat.wires.values() {
        emit_wire_edges(flat, wire, &mut children, &mut edges, &mut edge_counter, &mut dummy_counter);
    }

    LayoutRequest {
        id: flat.name.clone(),
        children,
        edges,
    }
}

fn build_child(cell: &Cell, flat: &FlatModule, skin: &SkinQuery, diagnostics: &DiagnosticSink) -> LayoutChild {
    let Some(template) = skin.template_for(&cell.cell_type) else {
        diagnostics.emit(Diagnostic::warning(format!("no template resolvable for cell '{}' of type '{}'", cell.key, cell.cell_type)));
        return LayoutChild {
            id: cell.key.clone(),
            width: 0.0,
            height: 0.0,
            ports: Vec::new(),
            labels: Vec::new(),
        };
    };

    if is_growable(&template.template_type) {
        build_growable_child(cell, flat, template)
    } else {
        build_literal_child(cell, flat, template, diagnostics)
    }
}

fn is_growable(template_type: &str) -> bool {
    matches!(template_type, schem_skin::query::cell_type::GENERIC | schem_skin::query::cell_type::SPLIT | schem_skin::query::cell_type::JOIN)
}

fn build_growable_child(cell: &Cell, flat: &FlatModule, template: &CellTemplate) -> LayoutChild {
    let pitch = template.port_pitch();
    let slot_count = cell.input_ports.len().max(cell.output_ports.len()).max(1);
    let height = pitch * slot_count as f64;

    let mut ports = Vec::new();
    let mut labels = Vec::new();

    if let Some(base) = template.input_ports.first() {
        for (i, port_id) in cell.input_ports.iter().enumerate() {
            let pid = flat.ports.get(*port_id).key.clone();
            let y = base.y + i as f64 * pitch;
            labels.push(LayoutLabel {
                text: pid.clone(),
                x: base.x,
                y,
            });
            ports.push(LayoutPort { pid, x: base.x, y });
        }
    }
    if let Some(base) = template.output_ports.first() {
        for (i, port_id) in cell.output_ports.iter().enumerate() {
            let pid = flat.ports.get(*port_id).key.clone();
            let y = base.y + i as f64 * pitch;
            labels.push(LayoutLabel {
                text: pid.clone(),
                x: base.x,
                y,
            });
            ports.push(LayoutPort { pid, x: base.x, y });
        }
    }

    LayoutChild {
        id: cell.key.clone(),
        width: template.width,
        height,
        ports,
        labels,
    }
}

fn build_literal_child(cell: &Cell, flat: &FlatModule, template: &CellTemplate, diagnostics: &DiagnosticSink) -> LayoutChild {
    let mut ports = Vec::new();
    let all_actual = cell.input_ports.iter().chain(cell.output_ports.iter());
    let all_template = template.input_ports.iter().chain(template.output_ports.iter()).chain(template.lateral_ports.iter());

    for port_id in all_actual {
        let pid = flat.ports.get(*port_id).key.clone();
        if let Some(t) = all_template.clone().find(|t| t.pid == pid) {
            ports.push(LayoutPort { pid, x: t.x, y: t.y });
        } else {
            diagnostics.emit(Diagnostic::warning(format!(
                "template for cell type '{}' has no declared anchor for port '{pid}'; placing at origin",
                cell.cell_type
            )));
            ports.push(LayoutPort { pid, x: 0.0, y: 0.0 });
        }
    }

    let labels = if matches!(template.template_type.as_str(), schem_skin::query::cell_type::INPUT_EXT | schem_skin::query::cell_type::OUTPUT_EXT) {
        vec![LayoutLabel {
            text: cell.key.clone(),
            x: template.width / 2.0,
            y: template.height / 2.0,
        }]
    } else {
        Vec::new()
    };

    LayoutChild {
        id: cell.key.clone(),
        width: template.width,
        height: template.height,
        ports,
        labels,
    }
}

fn emit_wire_edges(
    flat: &FlatModule,
    wire: &Wire,
    children: &mut Vec<LayoutChild>,
    edges: &mut Vec<LayoutEdge>,
    edge_counter: &mut usize,
    dummy_counter: &mut usize,
) {
    let endpoint = |port_id: &schem_ir::ids::PortId| {
        let port = flat.ports.get(*port_id);
        let cell = flat.cells.get(port.parent_node);
        EdgeEndpoint {
            cell_id: cell.key.clone(),
            port_id: port.key.clone(),
        }
    };

    let mut push_edge = |source: EdgeEndpoint, target: EdgeEndpoint, forward_priority: bool, edges: &mut Vec<LayoutEdge>| {
        let id = format!("e{edge_counter}");
        *edge_counter += 1;
        edges.push(LayoutEdge {
            id,
            source,
            target,
            forward_priority,
        });
    };

    let n_drivers = wire.drivers.len();
    let n_riders = wire.riders.len();
    let n_laterals = wire.laterals.len();

    if n_laterals == 0 && n_drivers >= 1 && n_riders >= 1 {
        for d in &wire.drivers {
            let forward_priority = !is_dff_source(flat, *d);
            for r in &wire.riders {
                push_edge(endpoint(d), endpoint(r), forward_priority, edges);
            }
        }
    } else if n_laterals >= 1 && (n_drivers >= 1 || n_riders >= 1) {
        for d in &wire.drivers {
            for l in &wire.laterals {
                push_edge(endpoint(d), endpoint(l), false, edges);
            }
        }
        for l in &wire.laterals {
            for r in &wire.riders {
                push_edge(endpoint(l), endpoint(r), false, edges);
            }
        }
    } else if n_riders == 0 && n_drivers >= 2 {
        let dummy_id = alloc_dummy(children, dummy_counter);
        for d in &wire.drivers {
            push_edge(endpoint(d), EdgeEndpoint { cell_id: dummy_id.clone(), port_id: ".p".to_string() }, false, edges);
        }
    } else if n_drivers == 0 && n_riders >= 2 {
        let dummy_id = alloc_dummy(children, dummy_counter);
        for r in &wire.riders {
            push_edge(EdgeEndpoint { cell_id: dummy_id.clone(), port_id: ".p".to_string() }, endpoint(r), false, edges);
        }
    } else if n_laterals >= 2 && n_drivers == 0 && n_riders == 0 {
        let (first, rest) = wire.laterals.split_first().expect("n_laterals >= 2");
        for l in rest {
            push_edge(endpoint(first), endpoint(l), false, edges);
        }
    }
    // Otherwise: exactly one driver xor one rider, no laterals — no edges.
}

fn is_dff_source(flat: &FlatModule, port_id: schem_ir::ids::PortId) -> bool {
    let port = flat.ports.get(port_id);
    flat.cells.get(port.parent_node).cell_type == "$dff"
}

fn alloc_dummy(children: &mut Vec<LayoutChild>, dummy_counter: &mut usize) -> String {
    let id = format!("{DUMMY_PREFIX}{dummy_counter}");
    *dummy_counter += 1;
    children.push(LayoutChild {
        id: id.clone(),
        width: 0.0,
        height: 0.0,
        ports: vec![LayoutPort { pid: ".p".to_string(), x: 0.0, y: 0.0 }],
        labels: Vec::new(),
    });
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use schem_ir::ids::CellId;
    use schem_ir::signal::{Signal, SignalVector};
    use schem_skin::tree::SkinNode;

    fn skin() -> SkinQuery {
        let doc = r#"<svg>
            <g s:type="generic" s:width="30" s:height="20">
                <text s:pid="A" s:x="0" s:y="0" s:position="left"/>
                <text s:pid="Y" s:x="30" s:y="0" s:position="right"/>
            </g>
        </svg>"#;
        SkinQuery::from_document(&SkinNode::parse(doc).unwrap())
    }

    fn module_with_fan_out(n_riders: usize) -> FlatModule {
        let mut flat = FlatModule::new("top");
        let driver_cell: CellId = flat.add_cell("u0", "$not", indexmap::IndexMap::new());
        flat.add_port(driver_cell, "Y", SignalVector::new(vec![Signal::Bit(1)]), true);
        for i in 0..n_riders {
            let rider_cell = flat.add_cell(format!("u{}", i + 1), "$not", indexmap::IndexMap::new());
            flat.add_port(rider_cell, "A", SignalVector::new(vec![Signal::Bit(1)]), false);
        }
        flat
    }

    /// `n_drivers` cells all driving the same signal, with no riders at
    /// all — the 0-rider/≥2-driver fan-in case that actually allocates a
    /// dummy (spec.md §4.5's table), as opposed to `module_with_fan_out`'s
    /// driver-plus-riders Cartesian case which never does.
    fn module_with_multi_driver(n_drivers: usize) -> FlatModule {
        let mut flat = FlatModule::new("top");
        for i in 0..n_drivers {
            let driver_cell = flat.add_cell(format!("u{i}"), "$not", indexmap::IndexMap::new());
            flat.add_port(driver_cell, "Y", SignalVector::new(vec![Signal::Bit(1)]), true);
        }
        flat
    }

    #[test]
    fn single_driver_single_rider_cartesian_edge() {
        let mut flat = module_with_fan_out(1);
        schem_elaborate::netbuild::build_nets(&mut flat, &skin());
        let diagnostics = DiagnosticSink::new();
        let request = build_request(&flat, &skin(), &diagnostics);
        assert_eq!(request.edges.len(), 1);
        assert!(!request.children.iter().any(|c| is_dummy_id(&c.id)));
    }

    #[test]
    fn one_driver_and_riders_is_cartesian_with_no_dummy() {
        let mut flat = module_with_fan_out(3);
        schem_elaborate::netbuild::build_nets(&mut flat, &skin());
        let diagnostics = DiagnosticSink::new();
        let request = build_request(&flat, &skin(), &diagnostics);

        assert_eq!(request.edges.len(), 3);
        assert!(request.edges.iter().all(|e| e.source.cell_id == "u0"));
        assert!(!request.children.iter().any(|c| is_dummy_id(&c.id)));
    }

    #[test]
    fn multi_driver_fan_in_gets_one_dummy() {
        let mut flat = module_with_multi_driver(3);
        schem_elaborate::netbuild::build_nets(&mut flat, &skin());
        let diagnostics = DiagnosticSink::new();
        let request = build_request(&flat, &skin(), &diagnostics);

        assert_eq!(request.edges.len(), 3);
        assert!(request.edges.iter().all(|e| is_dummy_id(&e.target.cell_id)));
        let dummies: Vec<_> = request.children.iter().filter(|c| is_dummy_id(&c.id)).collect();
        assert_eq!(dummies.len(), 1);
        assert_eq!(dummies[0].ports.len(), 1);
        assert_eq!(dummies[0].ports[0].pid, ".p");
    }

    #[test]
    fn dff_source_edge_has_no_forward_priority() {
        let mut flat = FlatModule::new("top");
        let dff_cell = flat.add_cell("r0", "$dff", indexmap::IndexMap::new());
        flat.add_port(dff_cell, "Q", SignalVector::new(vec![Signal::Bit(1)]), true);
        let rider_cell = flat.add_cell("u0", "$not", indexmap::IndexMap::new());
        flat.add_port(rider_cell, "A", SignalVector::new(vec![Signal::Bit(1)]), false);
        schem_elaborate::netbuild::build_nets(&mut flat, &skin());

        let diagnostics = DiagnosticSink::new();
        let request = build_request(&flat, &skin(), &diagnostics);
        assert_eq!(request.edges.len(), 1);
        assert!(!request.edges[0].forward_priority);
    }
}
