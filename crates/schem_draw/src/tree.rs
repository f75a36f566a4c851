//! The output drawing tree.
//!
//! The assembled drawing is the same tagged-variant shape as the skin
//! document it was instantiated from — see [`schem_skin::tree::SkinNode`] —
//! so this module reuses that type rather than inventing a parallel one, and
//! adds only the write-side half `schem_skin::tree` doesn't need: a
//! `quick-xml` writer-based serializer back to text.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;
use schem_skin::tree::SkinNode;
use std::io::Cursor;

/// A node in the output drawing tree. Identical in shape to the skin tree.
pub type DrawNode = SkinNode;

/// Serializes a drawing tree to its XML text form.
pub fn write_xml(root: &DrawNode) -> Result<String, quick_xml::Error> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    write_node(&mut writer, root)?;
    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_node(writer: &mut Writer<Cursor<Vec<u8>>>, node: &DrawNode) -> Result<(), quick_xml::Error> {
    match node {
        DrawNode::Text(text) => {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        DrawNode::Element { tag, attrs, children } => {
            let mut start = BytesStart::new(tag.as_str());
            for (key, value) in attrs {
                start.push_attribute((key.as_str(), value.as_str()));
            }
            if children.is_empty() {
                writer.write_event(Event::Empty(start))?;
            } else {
                writer.write_event(Event::Start(start))?;
                for child in children {
                    write_node(writer, child)?;
                }
                writer.write_event(Event::End(BytesEnd::new(tag.as_str())))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_nested_element_with_text() {
        let doc = SkinNode::parse(r#"<svg width="10"><g><text>hi</text></g></svg>"#).unwrap();
        let xml = write_xml(&doc).unwrap();
        assert!(xml.contains("<svg width=\"10\">"));
        assert!(xml.contains("<text>hi</text>"));
    }

    #[test]
    fn childless_element_self_closes() {
        let doc = SkinNode::parse(r#"<circle cx="1" cy="2" r="3"/>"#).unwrap();
        let xml = write_xml(&doc).unwrap();
        assert_eq!(xml, r#"<circle cx="1" cy="2" r="3"/>"#);
    }
}
