//! Template lookup, port classification, and skin-level option parsing.

use crate::tree::SkinNode;
use indexmap::IndexMap;
use log::warn;

/// Reserved template type names recognized on a cell template's `s:type`
/// attribute.
pub mod cell_type {
    /// Fallback template used for any cell type without a dedicated skin
    /// entry and for `$_constant_`/non-bus generic rendering.
    pub const GENERIC: &str = "generic";
    /// Bus-split synthesized cell template.
    pub const SPLIT: &str = "split";
    /// Bus-join synthesized cell template.
    pub const JOIN: &str = "join";
    /// External module input terminal template.
    pub const INPUT_EXT: &str = "inputExt";
    /// External module output terminal template.
    pub const OUTPUT_EXT: &str = "outputExt";
}

/// Port position on a cell's body, as declared by `s:position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    /// Left edge — an input side in the default left-to-right layout.
    Left,
    /// Right edge — an output side.
    Right,
    /// Top edge.
    Top,
    /// Bottom edge.
    Bottom,
}

impl Position {
    fn parse(s: &str) -> Option<Position> {
        match s {
            "left" => Some(Position::Left),
            "right" => Some(Position::Right),
            "top" => Some(Position::Top),
            "bottom" => Some(Position::Bottom),
            _ => None,
        }
    }

    /// `true` for the positions the Flattener infers as inputs when a cell
    /// has no explicit `port_directions`.
    pub fn is_input_side(&self) -> bool {
        matches!(self, Position::Left | Position::Top)
    }
}

/// A single port declared on a cell template.
#[derive(Debug, Clone)]
pub struct TemplatePort {
    /// Port id name (`s:pid`), matched against the cell's port key.
    pub pid: String,
    /// Anchor X offset within the template body.
    pub x: f64,
    /// Anchor Y offset within the template body.
    pub y: f64,
    /// Declared edge position, if any.
    pub position: Option<Position>,
    /// `true` if `s:dir="lateral"` was set explicitly.
    pub lateral: bool,
}

impl TemplatePort {
    fn from_node(node: &SkinNode) -> Option<TemplatePort> {
        let pid = node.attr("s:pid")?.to_string();
        let x = node.attr_f64("s:x").unwrap_or(0.0);
        let y = node.attr_f64("s:y").unwrap_or(0.0);
        let position = node.attr("s:position").and_then(Position::parse);
        let lateral = node.attr("s:dir") == Some("lateral");
        Some(TemplatePort {
            pid,
            x,
            y,
            position,
            lateral,
        })
    }
}

/// Whether a port acts as a net driver, rider, or lateral connection — see
/// the Data Model's wire invariant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortRole {
    /// Output port of a non-lateral template position.
    Driver,
    /// Input port of a non-lateral template position.
    Rider,
    /// Sideways connection, not a true driver or rider.
    Lateral,
}

/// A parsed cell template: its type, declared input/output ports, and body
/// geometry.
#[derive(Debug, Clone)]
pub struct CellTemplate {
    /// The template's declared `s:type`, or the cell-type name it was keyed
    /// under if `s:type` was absent (a "specific" template).
    pub template_type: String,
    /// Nominal body width.
    pub width: f64,
    /// Nominal body height.
    pub height: f64,
    /// Declared input-side ports (by template position), in document order.
    pub input_ports: Vec<TemplatePort>,
    /// Declared output-side ports, in document order.
    pub output_ports: Vec<TemplatePort>,
    /// Declared lateral ports, in document order.
    pub lateral_ports: Vec<TemplatePort>,
    /// The root skin node for this template, kept for cloning during
    /// drawing assembly.
    pub node: SkinNode,
}

impl CellTemplate {
    fn from_node(node: &SkinNode, generics_laterals: bool) -> CellTemplate {
        let template_type = node.attr("s:type").unwrap_or("").to_string();
        let width = node.attr_f64("s:width").unwrap_or(0.0);
        let height = node.attr_f64("s:height").unwrap_or(0.0);

        let mut input_ports = Vec::new();
        let mut output_ports = Vec::new();
        let mut lateral_ports = Vec::new();
        let is_generic = template_type == cell_type::GENERIC;

        node.walk(&mut |n| {
            if let Some(port) = TemplatePort::from_node(n) {
                let treat_as_lateral = port.lateral || (is_generic && generics_laterals);
                if treat_as_lateral {
                    lateral_ports.push(port);
                } else {
                    match port.position {
                        Some(pos) if pos.is_input_side() => input_ports.push(port),
                        Some(_) => output_ports.push(port),
                        None => lateral_ports.push(port),
                    }
                }
            }
        });

        CellTemplate {
            template_type,
            width,
            height,
            input_ports,
            output_ports,
            lateral_ports,
            node: node.clone(),
        }
    }

    /// Classifies a port on this template, by `pid`, into driver/rider/lateral.
    pub fn classify(&self, pid: &str) -> Option<PortRole> {
        if self.lateral_ports.iter().any(|p| p.pid == pid) {
            Some(PortRole::Lateral)
        } else if self.output_ports.iter().any(|p| p.pid == pid) {
            Some(PortRole::Driver)
        } else if self.input_ports.iter().any(|p| p.pid == pid) {
            Some(PortRole::Rider)
        } else {
            None
        }
    }

    /// The inter-port Y pitch used to grow generic/split/join body height,
    /// derived from the spacing between this template's first two
    /// same-side ports. Falls back to [`DEFAULT_PORT_PITCH`] when the
    /// template declares fewer than two ports on either side.
    pub fn port_pitch(&self) -> f64 {
        for side in [&self.input_ports, &self.output_ports] {
            if side.len() >= 2 {
                let delta = (side[1].y - side[0].y).abs();
                if delta > 0.0 {
                    return delta;
                }
            }
        }
        DEFAULT_PORT_PITCH
    }
}

/// Fallback inter-port Y pitch when a template doesn't declare enough ports
/// to derive one (see [`CellTemplate::port_pitch`]).
pub const DEFAULT_PORT_PITCH: f64 = 20.0;

/// Skin-level boolean/numeric options read from `s:properties`.
#[derive(Debug, Clone)]
pub struct SkinOptions {
    /// Run Constant Synthesis unless explicitly disabled.
    pub constants: bool,
    /// Run Split/Join Synthesis unless explicitly disabled.
    pub splits_and_joins: bool,
    /// Treat every port of a `generic` template as a lateral.
    pub generics_laterals: bool,
    /// Every other recognized option, coerced to string/number/bool as it
    /// was declared; the layout engine consumes these verbatim.
    pub layout_engine_options: IndexMap<String, String>,
}

impl Default for SkinOptions {
    fn default() -> Self {
        Self {
            constants: true,
            splits_and_joins: true,
            generics_laterals: false,
            layout_engine_options: IndexMap::new(),
        }
    }
}

/// Resolves cell templates by type name and exposes skin-level options.
///
/// Built once per render call from the parsed skin document and shared
/// read-only across the pipeline; the Drawing Assembler deep-clones a
/// template's [`SkinNode`] before mutating it for a specific cell instance
/// (see the Concurrency & Resource Model's template-reuse note).
pub struct SkinQuery {
    templates: IndexMap<String, CellTemplate>,
    options: SkinOptions,
}

impl SkinQuery {
    /// Builds a skin query from a parsed skin document root.
    pub fn from_document(root: &SkinNode) -> SkinQuery {
        let options = parse_options(root);
        let mut templates = IndexMap::new();

        root.walk(&mut |node| {
            if node.attr("s:type").is_some() {
                let template = CellTemplate::from_node(node, options.generics_laterals);
                let keys = template_keys(node, &template.template_type);
                for key in keys {
                    templates.entry(key).or_insert_with(|| template.clone());
                }
            }
        });

        SkinQuery { templates, options }
    }

    /// Looks up the template for a cell type, falling back to the first
    /// `generic` template for an unrecognized type (never fatal — see
    /// Error Handling Design).
    pub fn template_for(&self, cell_type: &str) -> Option<&CellTemplate> {
        if let Some(t) = self.templates.get(cell_type) {
            return Some(t);
        }
        warn!("unknown cell type '{cell_type}', falling back to generic template");
        self.templates.values().find(|t| t.template_type == cell_type::GENERIC)
    }

    /// The parsed skin-level options.
    pub fn options(&self) -> &SkinOptions {
        &self.options
    }
}

fn template_keys(node: &SkinNode, template_type: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(tag) = node.tag() {
        keys.push(tag.to_string());
    }
    if !template_type.is_empty() {
        keys.push(template_type.to_string());
    }
    for alias in node.children_named("s:alias") {
        if let Some(val) = alias.attr("val") {
            keys.push(val.to_string());
        }
    }
    keys
}

fn parse_options(root: &SkinNode) -> SkinOptions {
    let mut options = SkinOptions::default();
    let Some(properties) = root.find_child("s:properties") else {
        return options;
    };
    for child in properties.children() {
        if let SkinNode::Element { attrs, .. } = child {
            for (key, value) in attrs {
                match key.as_str() {
                    "constants" => options.constants = parse_bool_default(value, options.constants),
                    "splitsAndJoins" => options.splits_and_joins = parse_bool_default(value, options.splits_and_joins),
                    "genericsLaterals" => options.generics_laterals = parse_bool_default(value, options.generics_laterals),
                    _ => {}
                }
            }
        }
    }
    if let Some(layout_engine) = properties.find_child("s:layoutEngine") {
        if let SkinNode::Element { attrs, .. } = layout_engine {
            options.layout_engine_options = attrs.clone();
        }
    }
    options
}

fn parse_bool_default(value: &str, default: bool) -> bool {
    match value {
        "true" => true,
        "false" => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<svg>
        <s:properties>
            <s:property constants="false"/>
            <s:layoutEngine org.eclipse.elk.direction="RIGHT"/>
        </s:properties>
        <g s:type="generic" s:width="30" s:height="20">
            <text s:pid="in0" s:x="0" s:y="0" s:position="left"/>
            <text s:pid="in1" s:x="0" s:y="20" s:position="left"/>
            <text s:pid="out0" s:x="30" s:y="0" s:position="right"/>
        </g>
        <g s:type="inputExt" s:width="10" s:height="10">
            <s:alias val="$_inputExt_"/>
            <text s:pid="Y" s:x="10" s:y="5" s:position="right"/>
        </g>
    </svg>"#;

    #[test]
    fn parses_options_with_overrides() {
        let root = SkinNode::parse(DOC).unwrap();
        let query = SkinQuery::from_document(&root);
        assert!(!query.options().constants);
        assert!(query.options().splits_and_joins);
        assert_eq!(
            query.options().layout_engine_options.get("org.eclipse.elk.direction").map(String::as_str),
            Some("RIGHT")
        );
    }

    #[test]
    fn looks_up_template_by_alias() {
        let root = SkinNode::parse(DOC).unwrap();
        let query = SkinQuery::from_document(&root);
        let template = query.template_for("$_inputExt_").unwrap();
        assert_eq!(template.template_type, cell_type::INPUT_EXT);
    }

    #[test]
    fn unknown_type_falls_back_to_generic() {
        let root = SkinNode::parse(DOC).unwrap();
        let query = SkinQuery::from_document(&root);
        let template = query.template_for("$totally_unknown").unwrap();
        assert_eq!(template.template_type, cell_type::GENERIC);
    }

    #[test]
    fn generic_template_classifies_ports_by_position() {
        let root = SkinNode::parse(DOC).unwrap();
        let query = SkinQuery::from_document(&root);
        let template = query.template_for("generic").unwrap();
        assert_eq!(template.classify("in0"), Some(PortRole::Rider));
        assert_eq!(template.classify("out0"), Some(PortRole::Driver));
        assert_eq!(template.port_pitch(), 20.0);
    }
}
