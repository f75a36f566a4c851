//! Deserialization types for yosys-style netlist-JSON input.
//!
//! Mirrors the shape `write_json` produces: a top-level `modules` map keyed
//! by module name, each holding `ports` and `cells` maps keyed by their own
//! names. Key order matters — yosys emits ports and cells in declaration
//! order and the Flattener relies on it for deterministic output — so every
//! map here is an [`IndexMap`], not a `HashMap`.

use indexmap::IndexMap;
use serde::Deserialize;

/// Direction of a module port or cell connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Direction {
    /// Input port.
    #[serde(rename = "input")]
    Input,
    /// Output port.
    #[serde(rename = "output")]
    Output,
    /// Bidirectional port.
    #[serde(rename = "inout")]
    InOut,
}

/// A single bit of a netlist-JSON "bits" array: either a net id shared with
/// other connections on the same net, or a constant literal.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawBit {
    /// A net identifier.
    Net(u32),
    /// A constant literal, written by yosys as the string `"0"` or `"1"`
    /// (occasionally `"x"`/`"z"`, which this pipeline does not model — see
    /// Non-goals).
    Literal(String),
}

impl RawBit {
    /// Interprets this bit as a constant literal, if it is one of `"0"`/`"1"`.
    pub fn as_literal(&self) -> Option<bool> {
        match self {
            RawBit::Literal(s) if s == "0" => Some(false),
            RawBit::Literal(s) if s == "1" => Some(true),
            _ => None,
        }
    }
}

/// A module port declaration.
#[derive(Debug, Clone, Deserialize)]
pub struct PortDef {
    /// Declared direction.
    pub direction: Direction,
    /// Bit vector, LSB first.
    pub bits: Vec<RawBit>,
}

/// A free-form attribute value. Yosys renders integer attributes as
/// binary-digit strings (e.g. `"00000001"`); this accepts either that form
/// or a bare JSON number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    /// A string-encoded attribute value.
    Str(String),
    /// A numeric attribute value.
    Num(i64),
}

impl AttrValue {
    /// Interprets this attribute as an integer, accepting both a decimal
    /// number and a yosys-style binary-digit string.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Num(n) => Some(*n),
            AttrValue::Str(s) => i64::from_str_radix(s, 2).ok().or_else(|| s.parse().ok()),
        }
    }

    /// Renders this attribute as a plain display string.
    pub fn as_display(&self) -> String {
        match self {
            AttrValue::Str(s) => s.clone(),
            AttrValue::Num(n) => n.to_string(),
        }
    }
}

/// A cell instance within a module.
#[derive(Debug, Clone, Deserialize)]
pub struct CellDef {
    /// The cell's type: a yosys internal-cell name (e.g. `"$and"`) or the
    /// name of another module in this file for a submodule instance.
    #[serde(rename = "type")]
    pub cell_type: String,
    /// Per-connection direction, present for internal cells.
    #[serde(default)]
    pub port_directions: IndexMap<String, Direction>,
    /// Per-connection bit vectors, LSB first.
    pub connections: IndexMap<String, Vec<RawBit>>,
    /// Free-form cell attributes.
    #[serde(default)]
    pub attributes: IndexMap<String, AttrValue>,
}

/// A module definition.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDef {
    /// Declared ports, in declaration order.
    pub ports: IndexMap<String, PortDef>,
    /// Instantiated cells, in declaration order.
    #[serde(default)]
    pub cells: IndexMap<String, CellDef>,
    /// Free-form module attributes, including `top` when yosys marks a
    /// design's entry module.
    #[serde(default)]
    pub attributes: IndexMap<String, AttrValue>,
}

impl ModuleDef {
    /// `true` if this module carries yosys's `top` attribute set to `1`.
    pub fn is_top(&self) -> bool {
        self.attributes
            .get("top")
            .and_then(AttrValue::as_int)
            .map(|n| n == 1)
            .unwrap_or(false)
    }
}

/// The root of a netlist-JSON document.
#[derive(Debug, Clone, Deserialize)]
pub struct NetlistFile {
    /// Every module in the design, keyed by name.
    pub modules: IndexMap<String, ModuleDef>,
}

impl NetlistFile {
    /// Parses a netlist-JSON document from its textual form.
    pub fn from_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    /// Returns the name of the module to flatten from: the module carrying
    /// `attributes.top == 1`, or, if none is marked, the first module in
    /// file order.
    pub fn top_module_name(&self) -> Option<&str> {
        self.modules
            .iter()
            .find(|(_, m)| m.is_top())
            .or_else(|| self.modules.iter().next())
            .map(|(name, _)| name.as_str())
    }
}
