//! Elaboration pipeline: Flattening, Constant Synthesis, Split/Join
//! Synthesis, and Net Reconstruction — the stages that run synchronously
//! before the Layout Request Builder hands off to the external layout
//! engine.

#![warn(missing_docs)]

pub mod constants;
pub mod flatten;
pub mod netbuild;
pub mod splitjoin;

use schem_common::{DiagnosticSink, SchemResult};
use schem_ir::module::FlatModule;
use schem_ir::netlist::ModuleDef;
use schem_skin::query::SkinQuery;

/// Runs every elaboration stage over one module in order: Flatten, then
/// (unless disabled by the skin's `constants`/`splitsAndJoins` options)
/// Constant Synthesis and Split/Join Synthesis, then Net Reconstruction.
pub fn elaborate(module_name: &str, module: &ModuleDef, skin: &SkinQuery, diagnostics: &DiagnosticSink) -> SchemResult<FlatModule> {
    let mut flat = flatten::flatten(module_name, module, skin, diagnostics)?;

    if skin.options().constants {
        constants::synthesize_constants(&mut flat);
    }
    if skin.options().splits_and_joins {
        splitjoin::synthesize_split_join(&mut flat, diagnostics);
    }

    netbuild::build_nets(&mut flat, skin);

    Ok(flat)
}

#[cfg(test)]
mod tests {
    use super::*;
    use schem_skin::tree::SkinNode;

    fn skin() -> SkinQuery {
        let doc = r#"<svg>
            <g s:type="generic" s:width="30" s:height="20">
                <text s:pid="A" s:x="0" s:y="0" s:position="left"/>
                <text s:pid="Y" s:x="30" s:y="0" s:position="right"/>
            </g>
            <g s:type="inputExt" s:width="10" s:height="10">
                <text s:pid="Y" s:x="10" s:y="5" s:position="right"/>
            </g>
            <g s:type="outputExt" s:width="10" s:height="10">
                <text s:pid="A" s:x="0" s:y="5" s:position="left"/>
            </g>
        </svg>"#;
        SkinQuery::from_document(&SkinNode::parse(doc).unwrap())
    }

    #[test]
    fn single_inverter_produces_three_nodes_two_wires_no_dummies() {
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
        let module: ModuleDef = serde_json::from_str(json).unwrap();
        let skin = skin();
        let diagnostics = DiagnosticSink::new();

        let flat = elaborate("top", &module, &skin, &diagnostics).unwrap();

        assert_eq!(flat.cells.len(), 3);
        assert_eq!(flat.wires.len(), 2);
        for wire in flat.wires.values() {
            assert!(wire.drivers.len() <= 1);
        }
    }
}
