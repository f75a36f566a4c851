//! Flattening: converts one module's connection-indexed port/cell
//! declarations into a [`FlatModule`] of cell/port records, promoting the
//! module's own external ports to dedicated `$_inputExt_`/`$_outputExt_`
//! terminal cells. This stage does not recurse into submodule instances —
//! a cell whose type names another module in the design is carried through
//! as an opaque cell of that type, the same as any other unrecognized
//! type, and rendered by the generic-template fallback.

use indexmap::IndexMap;
use schem_common::{Diagnostic, DiagnosticSink, SchemResult};
use schem_ir::cell::{TYPE_INPUT_EXT, TYPE_OUTPUT_EXT};
use schem_ir::module::FlatModule;
use schem_ir::netlist::{CellDef, Direction, ModuleDef, RawBit};
use schem_ir::signal::{Signal, SignalVector};
use schem_skin::query::{Position, SkinQuery};

/// Flattens one module's ports and cells into a [`FlatModule`].
pub fn flatten(module_name: &str, module: &ModuleDef, skin: &SkinQuery, diagnostics: &DiagnosticSink) -> SchemResult<FlatModule> {
    let mut flat = FlatModule::new(module_name);

    for (port_name, port_def) in &module.ports {
        let bits = convert_bits(&port_def.bits, port_name, diagnostics);
        match port_def.direction {
            Direction::Input => {
                let cell_id = flat.add_cell(port_name.clone(), TYPE_INPUT_EXT, IndexMap::new());
                flat.add_port(cell_id, "Y", SignalVector::new(bits), true);
            }
            Direction::Output => {
                let cell_id = flat.add_cell(port_name.clone(), TYPE_OUTPUT_EXT, IndexMap::new());
                flat.add_port(cell_id, "A", SignalVector::new(bits), false);
            }
            Direction::InOut => {
                diagnostics.emit(Diagnostic::warning(format!(
                    "module port '{port_name}' is inout, which this pipeline does not model bit-level laterality for at the top level; treating as output"
                )));
                let cell_id = flat.add_cell(port_name.clone(), TYPE_OUTPUT_EXT, IndexMap::new());
                flat.add_port(cell_id, "A", SignalVector::new(bits), false);
            }
        }
    }

    for (cell_key, cell_def) in &module.cells {
        let attributes = cell_def
            .attributes
            .iter()
            .map(|(k, v)| (k.clone(), v.as_display()))
            .collect::<IndexMap<String, String>>();
        let cell_id = flat.add_cell(cell_key.clone(), cell_def.cell_type.clone(), attributes);

        for (conn_name, bits) in &cell_def.connections {
            let signal_bits = convert_bits(bits, conn_name, diagnostics);
            let is_output = resolve_direction(cell_def, conn_name, skin, diagnostics);
            flat.add_port(cell_id, conn_name.clone(), SignalVector::new(signal_bits), is_output);
        }
    }

    Ok(flat)
}

fn convert_bits(bits: &[RawBit], context: &str, diagnostics: &DiagnosticSink) -> Vec<Signal> {
    bits.iter()
        .map(|b| match b {
            RawBit::Net(n) => Signal::Bit(*n),
            RawBit::Literal(s) if s == "0" => Signal::Literal(false),
            RawBit::Literal(s) if s == "1" => Signal::Literal(true),
            RawBit::Literal(s) => {
                diagnostics.emit(Diagnostic::warning(format!(
                    "'{context}' carries non bit-level literal '{s}', treating as constant 0"
                )));
                Signal::Literal(false)
            }
        })
        .collect()
}

/// Determines whether a cell connection is an output (driving) port.
///
/// `port_directions`, when present, is authoritative. Otherwise the
/// template's declared port position decides: `left`/`top` is an input,
/// `right`/`bottom` is an output. A port the template doesn't recognize at
/// all (including a lateral pin, which is neither a pure input nor a pure
/// output in the layout sense) defaults to input, with a diagnostic.
fn resolve_direction(cell_def: &CellDef, conn_name: &str, skin: &SkinQuery, diagnostics: &DiagnosticSink) -> bool {
    if let Some(direction) = cell_def.port_directions.get(conn_name) {
        return *direction == Direction::Output;
    }

    let Some(template) = skin.template_for(&cell_def.cell_type) else {
        diagnostics.emit(Diagnostic::warning(format!(
            "no template available to infer direction for '{conn_name}' on cell type '{}', defaulting to input",
            cell_def.cell_type
        )));
        return false;
    };

    for port in template.input_ports.iter().chain(template.output_ports.iter()) {
        if port.pid == conn_name {
            return matches!(port.position, Some(pos) if !pos.is_input_side());
        }
    }

    diagnostics.emit(Diagnostic::warning(format!(
        "template for cell type '{}' has no declared position for port '{conn_name}', defaulting to input",
        cell_def.cell_type
    )));
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use schem_ir::netlist::PortDef;
    use schem_skin::tree::SkinNode;

    fn sample_skin() -> SkinQuery {
        let doc = r#"<svg>
            <g s:type="generic" s:width="30" s:height="20">
                <text s:pid="A" s:x="0" s:y="0" s:position="left"/>
                <text s:pid="Y" s:x="30" s:y="0" s:position="right"/>
            </g>
        </svg>"#;
        let root = SkinNode::parse(doc).unwrap();
        SkinQuery::from_document(&root)
    }

    fn sample_module() -> ModuleDef {
        let json = r#"{
            "ports": {
                "a": { "direction": "input", "bits": [2] },
                "y": { "direction": "output", "bits": [3] }
            },
            "cells": {
                "u1": {
                    "type": "$not",
                    "connections": { "A": [2], "Y": [3] },
                    "attributes": {}
                }
            }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn promotes_external_ports_to_terminal_cells() {
        let module = sample_module();
        let skin = sample_skin();
        let diagnostics = DiagnosticSink::new();
        let flat = flatten("top", &module, &skin, &diagnostics).unwrap();

        assert_eq!(flat.cells.len(), 3);
        let types: Vec<_> = flat.cells.values().map(|c| c.cell_type.as_str()).collect();
        assert!(types.contains(&TYPE_INPUT_EXT));
        assert!(types.contains(&TYPE_OUTPUT_EXT));
        assert!(types.contains(&"$not"));
    }

    #[test]
    fn infers_direction_from_template_when_port_directions_absent() {
        let module = sample_module();
        let skin = sample_skin();
        let diagnostics = DiagnosticSink::new();
        let flat = flatten("top", &module, &skin, &diagnostics).unwrap();

        let u1 = flat.cells.values().find(|c| c.key == "u1").unwrap();
        assert_eq!(u1.input_ports.len(), 1);
        assert_eq!(u1.output_ports.len(), 1);
        assert!(diagnostics.diagnostics().is_empty());
    }

    #[test]
    fn unknown_literal_bit_warns_and_defaults_to_zero() {
        let mut module = sample_module();
        module.ports.insert(
            "z".to_string(),
            PortDef {
                direction: Direction::Input,
                bits: vec![RawBit::Literal("x".to_string())],
            },
        );
        let skin = sample_skin();
        let diagnostics = DiagnosticSink::new();
        let _ = flatten("top", &module, &skin, &diagnostics).unwrap();
        assert_eq!(diagnostics.warning_count(), 1);
    }
}
