//! Bit-level signal vectors.
//!
//! A netlist-JSON "bits" array is, per bit, either an integer net identifier
//! or the string literal `"0"`/`"1"`. Constant Synthesis (see
//! `schem_elaborate`) replaces every [`Signal::Literal`] with a
//! [`Signal::Bit`] driven by a synthesized constant-driver cell, so by the
//! time Net Reconstruction runs, every vector in the design is literal-free.
//! [`Signal`] and [`SignalVector`] stay generic over both states because
//! the Flattener and Constant Synthesizer need to operate before that point.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single bit of a signal vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    /// A net identifier, unique within the flattened design.
    Bit(u32),
    /// A constant `0` or `1` literal, not yet backed by a net.
    Literal(bool),
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Bit(n) => write!(f, "{n}"),
            Signal::Literal(b) => write!(f, "{}", if *b { 1 } else { 0 }),
        }
    }
}

impl Signal {
    /// Returns `true` if this bit is still a constant literal.
    pub fn is_literal(&self) -> bool {
        matches!(self, Signal::Literal(_))
    }

    /// Returns the net id backing this bit, if it has one.
    pub fn as_net(&self) -> Option<u32> {
        match self {
            Signal::Bit(n) => Some(*n),
            Signal::Literal(_) => None,
        }
    }
}

/// An ordered vector of [`Signal`] bits, least-significant bit first — the
/// same ordering yosys uses for a port's `bits` array.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SignalVector(pub Vec<Signal>);

impl SignalVector {
    /// Creates a signal vector from its bits.
    pub fn new(bits: Vec<Signal>) -> Self {
        Self(bits)
    }

    /// The number of bits in this vector.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the vector has no bits.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if every bit is still a constant literal.
    pub fn is_all_literal(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(Signal::is_literal)
    }

    /// Returns `true` if no bit is a constant literal.
    pub fn is_all_resolved(&self) -> bool {
        self.0.iter().all(|b| !b.is_literal())
    }

    /// The canonical `,<bit>,<bit>,...,` string key used both to group ports
    /// into nets (as a `HashMap` key) and, unreduced, as the substring-search
    /// substrate for Split/Join Synthesis. Every comparison in those
    /// algorithms is defined in terms of this exact representation — do not
    /// replace it with a hash of the bit list, the substring search depends
    /// on textual containment.
    pub fn canonical(&self) -> String {
        let mut s = String::from(",");
        for bit in &self.0 {
            s.push_str(&bit.to_string());
            s.push(',');
        }
        s
    }

    /// A sub-vector spanning `[start, start+len)`.
    pub fn slice(&self, start: usize, len: usize) -> SignalVector {
        SignalVector(self.0[start..start + len].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_matches_expected_csv_shape() {
        let v = SignalVector::new(vec![Signal::Bit(3), Signal::Bit(4), Signal::Bit(5)]);
        assert_eq!(v.canonical(), ",3,4,5,");
    }

    #[test]
    fn canonical_is_substring_friendly() {
        let whole = SignalVector::new(vec![Signal::Bit(3), Signal::Bit(4), Signal::Bit(5)]);
        let part = SignalVector::new(vec![Signal::Bit(4), Signal::Bit(5)]);
        assert!(whole.canonical().contains(&part.canonical()));
    }

    #[test]
    fn literal_and_resolved_detection() {
        let lit = SignalVector::new(vec![Signal::Literal(false), Signal::Literal(true)]);
        let mixed = SignalVector::new(vec![Signal::Bit(1), Signal::Literal(true)]);
        let resolved = SignalVector::new(vec![Signal::Bit(1), Signal::Bit(2)]);
        assert!(lit.is_all_literal());
        assert!(!mixed.is_all_literal());
        assert!(!mixed.is_all_resolved());
        assert!(resolved.is_all_resolved());
    }

    #[test]
    fn slice_extracts_subrange() {
        let v = SignalVector::new(vec![Signal::Bit(0), Signal::Bit(1), Signal::Bit(2), Signal::Bit(3)]);
        assert_eq!(v.slice(1, 2), SignalVector::new(vec![Signal::Bit(1), Signal::Bit(2)]));
    }
}
