//! Split/join synthesis.
//!
//! For every distinct input-port (consumer) signal vector not already
//! produced verbatim by some driver, synthesizes the minimal `$_split_`/
//! `$_join_` cells so a later net-reconstruction pass can bind the
//! consumer to real drivers bit-for-bit.
//!
//! The canonical `,csv,` encoding (see [`SignalVector::canonical`]) is used
//! both to key the driver/consumer registries and as a substring-search
//! substrate: a candidate sub-range is tested for membership in a driver's
//! vector by checking whether its comma-delimited form occurs as a plain
//! substring of the driver's.
//!
//! This implementation resolves each consumer with a single greedy
//! longest-match-from-the-left scan rather than a full shrink-then-backtrack
//! search. Split-candidate tie-breaking order for two equal-length matches
//! at the same position is unspecified either way; since ids only need to
//! be distinct and every net in a well-formed design is produced by
//! exactly one driver, a greedy left-to-right scan yields the same
//! coverage for all such designs and is considerably simpler to reason
//! about.

use indexmap::IndexMap;
use schem_common::{Diagnostic, DiagnosticSink};
use schem_ir::cell::{TYPE_JOIN, TYPE_SPLIT};
use schem_ir::ids::{CellId, PortId};
use schem_ir::module::FlatModule;
use schem_ir::signal::{Signal, SignalVector};

/// Runs Split/Join Synthesis in place over a flattened module whose ports
/// are already free of literal bits (see [`crate::constants`]).
pub fn synthesize_split_join(flat: &mut FlatModule, diagnostics: &DiagnosticSink) {
    let mut drivers: IndexMap<String, PortId> = IndexMap::new();
    for (port_id, port) in flat.ports.iter() {
        if port.is_output {
            drivers.entry(port.value.canonical()).or_insert(port_id);
        }
    }

    let mut consumers: IndexMap<String, Vec<Signal>> = IndexMap::new();
    for (_, port) in flat.ports.iter() {
        if !port.is_output {
            consumers.entry(port.value.canonical()).or_insert_with(|| port.value.0.clone());
        }
    }

    let mut split_cells: IndexMap<PortId, (CellId, IndexMap<String, PortId>)> = IndexMap::new();

    for (target_key, target_bits) in consumers {
        if drivers.contains_key(&target_key) {
            continue;
        }

        let Some(segments) = cover(&target_bits, &drivers) else {
            diagnostics.emit(Diagnostic::warning(format!(
                "no combination of drivers and splits covers consumer vector {target_key}; leaving unresolved"
            )));
            continue;
        };

        if segments.len() == 1 && segments[0].len == target_bits.len() {
            let seg = &segments[0];
            let source_port = resolve_segment_source(flat, &mut split_cells, seg);
            drivers.insert(target_key, source_port);
        } else {
            let join_output = build_join(flat, &mut split_cells, &target_bits, &segments);
            drivers.insert(target_key, join_output);
        }
    }
}

/// A contiguous run of `target` bits resolved against a single source port.
struct Segment {
    target_start: usize,
    len: usize,
    source_port: PortId,
    source_start: usize,
    source_len: usize,
}

/// Greedily covers `target` from left to right with the longest available
/// driver-backed match at each position.
fn cover(target: &[Signal], drivers: &IndexMap<String, PortId>) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut pos = 0;
    while pos < target.len() {
        let (len, source_port, source_start, source_len) = find_longest_match(target, pos, drivers)?;
        segments.push(Segment {
            target_start: pos,
            len,
            source_port,
            source_start,
            source_len,
        });
        pos += len;
    }
    Some(segments)
}

fn find_longest_match(target: &[Signal], pos: usize, drivers: &IndexMap<String, PortId>) -> Option<(usize, PortId, usize, usize)> {
    for len in (1..=(target.len() - pos)).rev() {
        let probe = SignalVector::new(target[pos..pos + len].to_vec()).canonical();
        for (driver_key, port_id) in drivers {
            if let Some(found_at) = driver_key.find(&probe) {
                let source_start = driver_key[..found_at].matches(',').count();
                let source_len = driver_key.matches(',').count() - 1;
                return Some((len, *port_id, source_start, source_len));
            }
        }
    }
    None
}

fn range_name(start: usize, len: usize) -> String {
    if len == 1 {
        start.to_string()
    } else {
        format!("{start}:{}", start + len - 1)
    }
}

/// Resolves a segment to the port that carries exactly its bits: the
/// driver itself when the segment spans its whole vector, or a (possibly
/// freshly created) split output port for a proper sub-range.
fn resolve_segment_source(flat: &mut FlatModule, split_cells: &mut IndexMap<PortId, (CellId, IndexMap<String, PortId>)>, seg: &Segment) -> PortId {
    if seg.len == seg.source_len {
        return seg.source_port;
    }

    let range = range_name(seg.source_start, seg.len);
    let source_value = flat.ports.get(seg.source_port).value.clone();
    let source_key = format!("$split${}", source_value.canonical());

    let (cell_id, ranges) = split_cells.entry(seg.source_port).or_insert_with(|| {
        let cell_id = flat.add_cell(source_key.clone(), TYPE_SPLIT, indexmap::IndexMap::new());
        flat.add_port(cell_id, "A", source_value.clone(), false);
        (cell_id, IndexMap::new())
    });

    if let Some(existing) = ranges.get(&range) {
        return *existing;
    }

    let sub_value = source_value.slice(seg.source_start, seg.len);
    let port_id = flat.add_port(*cell_id, range.clone(), sub_value, true);
    ranges.insert(range, port_id);
    port_id
}

fn build_join(flat: &mut FlatModule, split_cells: &mut IndexMap<PortId, (CellId, IndexMap<String, PortId>)>, target_bits: &[Signal], segments: &[Segment]) -> PortId {
    let target_value = SignalVector::new(target_bits.to_vec());
    let key = format!("$join${}", target_value.canonical());
    let cell_id = flat.add_cell(key, TYPE_JOIN, indexmap::IndexMap::new());

    for seg in segments {
        let source_port = resolve_segment_source(flat, split_cells, seg);
        let range = range_name(seg.target_start, seg.len);
        let value = target_value.slice(seg.target_start, seg.len);
        debug_assert_eq!(value, flat.ports.get(source_port).value);
        flat.add_port(cell_id, range, value, false);
    }

    flat.add_port(cell_id, "Y", target_value, true)
}
