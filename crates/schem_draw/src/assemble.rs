//! Per-cell template instantiation, routed-line/junction emission, and final
//! drawing-tree assembly.

use indexmap::IndexMap;
use schem_common::{Diagnostic, DiagnosticSink};
use schem_ir::cell::{Cell, TYPE_CONSTANT};
use schem_ir::module::FlatModule;
use schem_layout::reconcile::{DrawingEdge, ReconciledDrawing};
use schem_layout::request::{LayoutChild, LayoutLabel, LayoutPort, LayoutRequest};
use schem_layout::response::{LayoutResponse, Point};
use schem_skin::query::{cell_type, CellTemplate, SkinQuery};
use schem_skin::tree::SkinNode;

/// Assembles the final drawing tree from an elaborated module, the request
/// used to lay it out, and the reconciled layout result.
///
/// `skin_root` is the parsed skin document: its `style` children are carried
/// into the output verbatim, and its root tag/attributes seed the output
/// root before `width`/`height` are overwritten with the computed layout
/// size.
pub fn assemble_drawing(
    flat: &FlatModule,
    skin: &SkinQuery,
    skin_root: &SkinNode,
    request: &LayoutRequest,
    response: &LayoutResponse,
    reconciled: &ReconciledDrawing,
    diagnostics: &DiagnosticSink,
) -> SkinNode {
    let positions: IndexMap<&str, Point> = response.children.iter().map(|c| (c.id.as_str(), c.position)).collect();
    let layout_children: IndexMap<&str, &LayoutChild> = request.children.iter().map(|c| (c.id.as_str(), c)).collect();

    let mut placed_cells = Vec::with_capacity(flat.cells.len());
    for cell in flat.cells.values() {
        let Some(template) = skin.template_for(&cell.cell_type) else {
            diagnostics.emit(Diagnostic::warning(format!("no template resolvable for cell '{}', omitting from drawing", cell.key)));
            continue;
        };
        let Some(layout_child) = layout_children.get(cell.key.as_str()) else {
            diagnostics.emit(Diagnostic::warning(format!("cell '{}' missing from layout request, omitting from drawing", cell.key)));
            continue;
        };
        let Some(position) = positions.get(cell.key.as_str()) else {
            diagnostics.emit(Diagnostic::warning(format!("cell '{}' missing a layout placement, omitting from drawing", cell.key)));
            continue;
        };
        placed_cells.push(instantiate_cell(cell, template, layout_child, *position));
    }

    let mut lines = Vec::with_capacity(reconciled.edges.len() + reconciled.junctions.len());
    for edge in &reconciled.edges {
        lines.push(make_polyline(edge));
    }
    for junction in &reconciled.junctions {
        lines.push(make_junction_dot(*junction));
    }

    build_root(skin_root, response.width, response.height, placed_cells, lines)
}

fn instantiate_cell(cell: &Cell, template: &CellTemplate, layout_child: &LayoutChild, position: Point) -> SkinNode {
    let mut node = template.node.clone();

    if is_growable(&template.template_type) {
        resize_body(&mut node, layout_child.width, layout_child.height);
        replicate_ports(&mut node, template, cell, layout_child);
    }

    let ref_text = render_ref(cell);
    let name_text = cell.attributes.get("value").map(String::as_str);
    substitute_text(&mut node, &ref_text, name_text, &cell.cell_type);

    set_transform(&mut node, position.x, position.y);
    node
}

fn is_growable(template_type: &str) -> bool {
    matches!(template_type, cell_type::GENERIC | cell_type::SPLIT | cell_type::JOIN)
}

/// The `ref` placeholder's replacement text: the cell key, except a
/// multi-bit `$_constant_` key is rendered as hex per the Drawing Assembler's
/// constant special case.
fn render_ref(cell: &Cell) -> String {
    if cell.cell_type == TYPE_CONSTANT && cell.key.len() > 1 && cell.key.chars().all(|c| c == '0' || c == '1') {
        let value = u64::from_str_radix(&cell.key, 2).unwrap_or(0);
        format!("0x{value:x}")
    } else {
        cell.key.clone()
    }
}

/// Replaces the text content of every element carrying `s:attribute`,
/// according to which placeholder it names: `ref` and `type` always
/// substitute, `name` only when the cell declared a `value` attribute
/// (leaving the template's default text otherwise).
fn substitute_text(node: &mut SkinNode, ref_text: &str, name_text: Option<&str>, type_text: &str) {
    if let SkinNode::Element { attrs, children, .. } = node {
        if let Some(kind) = attrs.get("s:attribute").cloned() {
            let replacement = match kind.as_str() {
                "ref" => Some(ref_text.to_string()),
                "name" => name_text.map(str::to_string),
                "type" => Some(type_text.to_string()),
                _ => None,
            };
            if let Some(replacement) = replacement {
                *children = vec![SkinNode::Text(replacement)];
            }
        }
        for child in children.iter_mut() {
            substitute_text(child, ref_text, name_text, type_text);
        }
    }
}

fn resize_body(node: &mut SkinNode, width: f64, height: f64) {
    if let SkinNode::Element { attrs, .. } = node {
        attrs.insert("s:width".to_string(), format_num(width));
        attrs.insert("s:height".to_string(), format_num(height));
    }
}

/// Replicates the template's first declared port on each side once per
/// actual port, translated to its computed slot, and appends a text label
/// per slot. Relies on [`LayoutChild::ports`] listing input slots before
/// output slots, matching how `schem_layout::request` builds it.
fn replicate_ports(node: &mut SkinNode, template: &CellTemplate, cell: &Cell, layout_child: &LayoutChild) {
    let n_inputs = cell.input_ports.len().min(layout_child.ports.len());
    let (input_slots, output_slots) = layout_child.ports.split_at(n_inputs);

    if let Some(proto) = template.input_ports.first() {
        replace_prototype(node, &proto.pid, input_slots);
    }
    if let Some(proto) = template.output_ports.first() {
        replace_prototype(node, &proto.pid, output_slots);
    }

    for label in &layout_child.labels {
        append_label(node, label);
    }
}

fn replace_prototype(node: &mut SkinNode, pid: &str, slots: &[LayoutPort]) -> bool {
    if let SkinNode::Element { children, .. } = node {
        if let Some(idx) = children.iter().position(|c| c.attr("s:pid") == Some(pid)) {
            let prototype = children[idx].clone();
            let replacements: Vec<SkinNode> = slots.iter().map(|slot| clone_port(&prototype, slot)).collect();
            children.splice(idx..idx + 1, replacements);
            return true;
        }
        for child in children.iter_mut() {
            if replace_prototype(child, pid, slots) {
                return true;
            }
        }
    }
    false
}

fn clone_port(prototype: &SkinNode, slot: &LayoutPort) -> SkinNode {
    let mut clone = prototype.clone();
    if let SkinNode::Element { attrs, .. } = &mut clone {
        attrs.insert("s:pid".to_string(), slot.pid.clone());
        attrs.insert("s:x".to_string(), format_num(slot.x));
        attrs.insert("s:y".to_string(), format_num(slot.y));
    }
    clone
}

fn append_label(node: &mut SkinNode, label: &LayoutLabel) {
    if let SkinNode::Element { children, .. } = node {
        let mut attrs = IndexMap::new();
        attrs.insert("x".to_string(), format_num(label.x));
        attrs.insert("y".to_string(), format_num(label.y));
        children.push(SkinNode::Element {
            tag: "text".to_string(),
            attrs,
            children: vec![SkinNode::Text(label.text.clone())],
        });
    }
}

fn set_transform(node: &mut SkinNode, x: f64, y: f64) {
    if let SkinNode::Element { attrs, .. } = node {
        attrs.insert("transform".to_string(), format!("translate({},{})", format_num(x), format_num(y)));
    }
}

fn make_polyline(edge: &DrawingEdge) -> SkinNode {
    let mut points = String::new();
    for p in std::iter::once(&edge.start_point).chain(edge.bend_points.iter()).chain(std::iter::once(&edge.end_point)) {
        points.push_str(&format_num(p.x));
        points.push(',');
        points.push_str(&format_num(p.y));
        points.push(' ');
    }
    let mut attrs = IndexMap::new();
    attrs.insert("points".to_string(), points.trim_end().to_string());
    attrs.insert("class".to_string(), "wire".to_string());
    SkinNode::Element {
        tag: "polyline".to_string(),
        attrs,
        children: Vec::new(),
    }
}

fn make_junction_dot(point: Point) -> SkinNode {
    let mut attrs = IndexMap::new();
    attrs.insert("cx".to_string(), format_num(point.x));
    attrs.insert("cy".to_string(), format_num(point.y));
    attrs.insert("r".to_string(), "2".to_string());
    attrs.insert("class".to_string(), "junction".to_string());
    SkinNode::Element {
        tag: "circle".to_string(),
        attrs,
        children: Vec::new(),
    }
}

fn build_root(skin_root: &SkinNode, width: f64, height: f64, cells: Vec<SkinNode>, lines: Vec<SkinNode>) -> SkinNode {
    let tag = skin_root.tag().unwrap_or("svg").to_string();
    let mut attrs = match skin_root {
        SkinNode::Element { attrs, .. } => attrs.clone(),
        SkinNode::Text(_) => IndexMap::new(),
    };
    attrs.insert("width".to_string(), format_num(width));
    attrs.insert("height".to_string(), format_num(height));

    let mut children: Vec<SkinNode> = skin_root.children_named("style").cloned().collect();
    children.extend(cells);
    children.extend(lines);

    SkinNode::Element { tag, attrs, children }
}

fn format_num(value: f64) -> String {
    if value == value.trunc() {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
