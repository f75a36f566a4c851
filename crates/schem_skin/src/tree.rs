//! A tagged-variant tree model for the skin template document.
//!
//! The skin is an opaque, pre-parsed XML-like tree navigated entirely by
//! attribute names (`s:pid`, `s:x`, `s:position`, ...). Rather than carry
//! `quick_xml`'s borrowed event types through the rest of the crate, the
//! whole document is parsed once into this owned `element | text` tree,
//! with typed attribute accessors centralizing the number/boolean
//! coercions that would otherwise be sprinkled through every call site.

use indexmap::IndexMap;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// An error encountered while parsing a skin document.
#[derive(Debug, Error)]
pub enum SkinParseError {
    /// The underlying XML was malformed.
    #[error("malformed skin document: {0}")]
    Xml(#[from] quick_xml::Error),
    /// An element or attribute was not valid UTF-8.
    #[error("non-utf8 content in skin document: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

/// A node in the parsed skin tree.
#[derive(Debug, Clone)]
pub enum SkinNode {
    /// A tagged element with attributes and children.
    Element {
        /// Element tag name, e.g. `"g"`, `"s:properties"`, `"text"`.
        tag: String,
        /// Attributes in document order.
        attrs: IndexMap<String, String>,
        /// Child nodes in document order.
        children: Vec<SkinNode>,
    },
    /// A text run.
    Text(String),
}

impl SkinNode {
    /// Parses a complete skin document from its XML text.
    pub fn parse(xml: &str) -> Result<SkinNode, SkinParseError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);
        let mut stack: Vec<(String, IndexMap<String, String>, Vec<SkinNode>)> = Vec::new();
        let mut roots: Vec<SkinNode> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let attrs = read_attrs(&e)?;
                    stack.push((tag, attrs, Vec::new()));
                }
                Event::Empty(e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    let attrs = read_attrs(&e)?;
                    let node = SkinNode::Element {
                        tag,
                        attrs,
                        children: Vec::new(),
                    };
                    push_node(&mut stack, &mut roots, node);
                }
                Event::End(_) => {
                    if let Some((tag, attrs, children)) = stack.pop() {
                        let node = SkinNode::Element { tag, attrs, children };
                        push_node(&mut stack, &mut roots, node);
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape()?.into_owned();
                    if !text.trim().is_empty() {
                        push_node(&mut stack, &mut roots, SkinNode::Text(text));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        roots
            .into_iter()
            .find(|n| matches!(n, SkinNode::Element { .. }))
            .ok_or_else(|| quick_xml::Error::UnexpectedEof("no root element".into()).into())
    }

    /// This node's tag, if it is an element.
    pub fn tag(&self) -> Option<&str> {
        match self {
            SkinNode::Element { tag, .. } => Some(tag),
            SkinNode::Text(_) => None,
        }
    }

    /// This node's children, if it is an element; empty otherwise.
    pub fn children(&self) -> &[SkinNode] {
        match self {
            SkinNode::Element { children, .. } => children,
            SkinNode::Text(_) => &[],
        }
    }

    /// Raw string attribute lookup.
    pub fn attr(&self, name: &str) -> Option<&str> {
        match self {
            SkinNode::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            SkinNode::Text(_) => None,
        }
    }

    /// Numeric attribute lookup, parsing the attribute string as an `f64`.
    pub fn attr_f64(&self, name: &str) -> Option<f64> {
        self.attr(name).and_then(|v| v.parse().ok())
    }

    /// Boolean attribute lookup, accepting the literal strings `"true"` and
    /// `"false"`.
    pub fn attr_bool(&self, name: &str) -> Option<bool> {
        match self.attr(name) {
            Some("true") => Some(true),
            Some("false") => Some(false),
            _ => None,
        }
    }

    /// The text content of this element, concatenating any direct text
    /// children. Used for `ref`/`name` placeholder substitution targets.
    pub fn text_content(&self) -> String {
        self.children()
            .iter()
            .filter_map(|c| match c {
                SkinNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Finds the first direct child element with the given tag.
    pub fn find_child(&self, tag: &str) -> Option<&SkinNode> {
        self.children().iter().find(|c| c.tag() == Some(tag))
    }

    /// Iterates over all direct child elements with the given tag.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a SkinNode> {
        self.children().iter().filter(move |c| c.tag() == Some(tag))
    }

    /// Recursively visits this node and every descendant element.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a SkinNode)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }
}

fn read_attrs(e: &quick_xml::events::BytesStart) -> Result<IndexMap<String, String>, SkinParseError> {
    let mut attrs = IndexMap::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

fn push_node(stack: &mut Vec<(String, IndexMap<String, String>, Vec<SkinNode>)>, roots: &mut Vec<SkinNode>, node: SkinNode) {
    if let Some((_, _, children)) = stack.last_mut() {
        children.push(node);
    } else {
        roots.push(node);
    }
}
