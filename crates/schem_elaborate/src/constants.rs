//! Constant synthesis.
//!
//! Replaces literal `0`/`1` bits inside input port vectors with fresh
//! integer signals driven by a synthesized `$_constant_` cell, coalescing
//! identical literal runs (by their reversed-bit name) onto a shared
//! driver.
//!
//! Only every signal id being distinct and identical-name runs sharing a
//! driver are load-bearing — the watermark's exact value is not — so this
//! implementation only advances the watermark for runs that are actually
//! synthesized rather than for every literal bit scanned, avoiding wasted
//! ids.

use indexmap::IndexMap;
use schem_ir::cell::TYPE_CONSTANT;
use schem_ir::ids::PortId;
use schem_ir::module::FlatModule;
use schem_ir::signal::{Signal, SignalVector};

/// Runs Constant Synthesis in place over a flattened module.
pub fn synthesize_constants(flat: &mut FlatModule) {
    let mut watermark = flat
        .ports
        .values()
        .filter(|p| p.is_output)
        .flat_map(|p| p.value.0.iter())
        .filter_map(Signal::as_net)
        .max()
        .unwrap_or(0);

    let mut known: IndexMap<String, Vec<u32>> = IndexMap::new();

    let input_port_ids: Vec<PortId> = flat.ports.iter().filter(|(_, p)| !p.is_output).map(|(id, _)| id).collect();

    for port_id in input_port_ids {
        let original = flat.ports.get(port_id).value.0.clone();
        if original.iter().all(|b| !b.is_literal()) {
            continue;
        }

        let mut rewritten = original.clone();
        let mut run_bits: Vec<bool> = Vec::new();
        let mut run_positions: Vec<usize> = Vec::new();

        for (idx, bit) in original.iter().enumerate() {
            match bit {
                Signal::Literal(b) => {
                    run_bits.push(*b);
                    run_positions.push(idx);
                }
                Signal::Bit(_) => {
                    flush_run(flat, &mut run_bits, &mut run_positions, &mut rewritten, &mut watermark, &mut known);
                }
            }
        }
        flush_run(flat, &mut run_bits, &mut run_positions, &mut rewritten, &mut watermark, &mut known);

        flat.ports.get_mut(port_id).value = SignalVector::new(rewritten);
    }
}

fn flush_run(
    flat: &mut FlatModule,
    run_bits: &mut Vec<bool>,
    run_positions: &mut Vec<usize>,
    rewritten: &mut [Signal],
    watermark: &mut u32,
    known: &mut IndexMap<String, Vec<u32>>,
) {
    if run_bits.is_empty() {
        return;
    }

    let name: String = run_bits.iter().rev().map(|b| if *b { '1' } else { '0' }).collect();

    let signals = known.entry(name.clone()).or_insert_with(|| {
        let fresh: Vec<u32> = run_bits
            .iter()
            .map(|_| {
                *watermark += 1;
                *watermark
            })
            .collect();

        let cell_id = flat.add_cell(name.clone(), TYPE_CONSTANT, IndexMap::new());
        let value = SignalVector::new(fresh.iter().map(|n| Signal::Bit(*n)).collect());
        flat.add_port(cell_id, "Y", value, true);
        fresh
    });

    for (offset, pos) in run_positions.iter().enumerate() {
        rewritten[*pos] = Signal::Bit(signals[offset]);
    }

    run_bits.clear();
    run_positions.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use schem_ir::ids::CellId;

    fn module_with_input(bits: Vec<Signal>) -> (FlatModule, PortId) {
        let mut flat = FlatModule::new("top");
        let cell_id: CellId = flat.add_cell("u1", "$not", IndexMap::new());
        let port = flat.add_port(cell_id, "A", SignalVector::new(bits), false);
        (flat, port)
    }

    #[test]
    fn replaces_all_literals_with_fresh_integers() {
        let (mut flat, port) = module_with_input(vec![Signal::Literal(false), Signal::Literal(false), Signal::Literal(true)]);
        synthesize_constants(&mut flat);
        assert!(flat.ports.get(port).value.is_all_resolved());
    }

    #[test]
    fn coalesces_identical_literal_runs() {
        let mut flat = FlatModule::new("top");
        let c1 = flat.add_cell("u1", "$not", IndexMap::new());
        let p1 = flat.add_port(c1, "A", SignalVector::new(vec![Signal::Literal(false), Signal::Literal(false), Signal::Literal(true)]), false);
        let c2 = flat.add_cell("u2", "$not", IndexMap::new());
        let p2 = flat.add_port(c2, "A", SignalVector::new(vec![Signal::Literal(false), Signal::Literal(false), Signal::Literal(true)]), false);

        synthesize_constants(&mut flat);

        assert_eq!(flat.ports.get(p1).value, flat.ports.get(p2).value);
        let constant_cells: Vec<_> = flat.cells.values().filter(|c| c.cell_type == TYPE_CONSTANT).collect();
        assert_eq!(constant_cells.len(), 1);
        assert_eq!(constant_cells[0].key, "100");
    }

    #[test]
    fn distinct_literal_runs_get_distinct_cells() {
        let mut flat = FlatModule::new("top");
        let c1 = flat.add_cell("u1", "$not", IndexMap::new());
        flat.add_port(c1, "A", SignalVector::new(vec![Signal::Literal(false)]), false);
        let c2 = flat.add_cell("u2", "$not", IndexMap::new());
        flat.add_port(c2, "A", SignalVector::new(vec![Signal::Literal(true)]), false);

        synthesize_constants(&mut flat);

        let constant_cells: Vec<_> = flat.cells.values().filter(|c| c.cell_type == TYPE_CONSTANT).collect();
        assert_eq!(constant_cells.len(), 2);
    }

    #[test]
    fn non_literal_ports_are_untouched() {
        let (mut flat, port) = module_with_input(vec![Signal::Bit(5), Signal::Bit(6)]);
        synthesize_constants(&mut flat);
        assert_eq!(flat.ports.get(port).value, SignalVector::new(vec![Signal::Bit(5), Signal::Bit(6)]));
    }
}
