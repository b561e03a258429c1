//! SVG codec: XML text to document tree and back
//!
//! Loading is the precondition gate of the document model: anything that is not
//! well-formed XML with an `<svg>` root is rejected here, before a presentation
//! is constructed.

use roxmltree::{NodeType, ParsingOptions};
use tracing::{debug, instrument, trace};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{
    Attribute, Document, Element, NamespaceDecl, NodeId, NodeKind, QName, ViewState,
};

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Parse SVG source into a mutable document tree.
#[instrument(level = "debug", skip(text), fields(bytes = text.len()))]
pub fn parse_document(text: &str) -> ApplicationResult<Document> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let xml = roxmltree::Document::parse_with_options(text, options)
        .map_err(|e| ApplicationError::invalid_document(e.to_string()))?;

    let root = xml.root_element();
    if root.tag_name().name() != "svg" {
        return Err(ApplicationError::invalid_document(format!(
            "root element is <{}>, expected <svg>",
            root.tag_name().name()
        )));
    }

    let mut document = Document::new(convert_element(root, None));
    let root_id = document.root();
    copy_children(&mut document, root_id, root)?;
    debug!(nodes = document.len(), "document parsed");
    Ok(document)
}

fn copy_children(
    document: &mut Document,
    parent: NodeId,
    source: roxmltree::Node<'_, '_>,
) -> ApplicationResult<()> {
    for child in source.children() {
        let kind = match child.node_type() {
            NodeType::Element => NodeKind::Element(convert_element(child, Some(source))),
            NodeType::Text => NodeKind::Text(child.text().unwrap_or_default().to_owned()),
            NodeType::Comment => NodeKind::Comment(child.text().unwrap_or_default().to_owned()),
            NodeType::PI | NodeType::Root => {
                trace!("skipping processing instruction");
                continue;
            }
        };
        let id = document.create(kind);
        document.append_child(parent, id)?;
        if child.is_element() {
            copy_children(document, id, child)?;
        }
    }
    Ok(())
}

fn convert_element(
    node: roxmltree::Node<'_, '_>,
    parent: Option<roxmltree::Node<'_, '_>>,
) -> Element {
    let tag = node.tag_name();
    let prefix = tag.namespace().and_then(|ns| {
        let default_ns = node
            .namespaces()
            .find(|n| n.name().is_none())
            .map(|n| n.uri());
        if default_ns == Some(ns) {
            None
        } else {
            node.lookup_prefix(ns)
        }
    });
    let name = QName {
        namespace: tag.namespace().map(str::to_owned),
        prefix: prefix.map(str::to_owned),
        local: tag.name().to_owned(),
    };

    let attributes = node
        .attributes()
        .map(|a| {
            let prefix = a.namespace().and_then(|ns| {
                if ns == XML_NAMESPACE {
                    Some("xml")
                } else {
                    node.lookup_prefix(ns)
                }
            });
            Attribute {
                name: QName {
                    namespace: a.namespace().map(str::to_owned),
                    prefix: prefix.map(str::to_owned),
                    local: a.name().to_owned(),
                },
                value: a.value().to_owned(),
            }
        })
        .collect();

    // Only declarations introduced by this element; inherited ones stay implicit
    let namespaces = node
        .namespaces()
        .filter(|n| n.uri() != XML_NAMESPACE)
        .filter(|n| {
            parent.map_or(true, |p| {
                !p.namespaces()
                    .any(|pn| pn.name() == n.name() && pn.uri() == n.uri())
            })
        })
        .map(|n| NamespaceDecl {
            prefix: n.name().map(str::to_owned),
            uri: n.uri().to_owned(),
        })
        .collect();

    Element {
        name,
        attributes,
        namespaces,
    }
}

/// Serialize a document tree to SVG text.
pub fn write_document(document: &Document) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\"?>\n");
    write_node(document, document.root(), &mut out);
    out.push('\n');
    out
}

fn write_node(document: &Document, id: NodeId, out: &mut String) {
    let Ok(node) = document.node(id) else {
        return;
    };
    match &node.kind {
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(&element.name.to_string());
            for ns in &element.namespaces {
                match &ns.prefix {
                    Some(prefix) => out.push_str(&format!(
                        " xmlns:{}=\"{}\"",
                        prefix,
                        escape(&ns.uri, true)
                    )),
                    None => out.push_str(&format!(" xmlns=\"{}\"", escape(&ns.uri, true))),
                }
            }
            for attribute in &element.attributes {
                out.push_str(&format!(
                    " {}=\"{}\"",
                    attribute.name,
                    escape(&attribute.value, true)
                ));
            }
            if node.children().is_empty() {
                out.push_str("/>");
            } else {
                out.push('>');
                for &child in node.children() {
                    write_node(document, child, out);
                }
                out.push_str(&format!("</{}>", element.name));
            }
        }
        NodeKind::Text(text) => out.push_str(&escape(text, false)),
        NodeKind::Comment(comment) => out.push_str(&format!("<!--{comment}-->")),
    }
}

fn escape(value: &str, in_attribute: bool) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' if in_attribute => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Initial camera for a document: its `viewBox`, else its `width`/`height`.
pub fn initial_view_state(document: &Document) -> ViewState {
    let Some(root) = document.element(document.root()) else {
        return ViewState::default();
    };
    if let Some(state) = root.attribute(None, "viewBox").and_then(ViewState::from_view_box) {
        return state;
    }
    let length = |name: &str| root.attribute(None, name).and_then(leading_number);
    match (length("width"), length("height")) {
        (Some(width), Some(height)) => {
            ViewState::from_view_box(&format!("0 0 {width} {height}")).unwrap_or_default()
        }
        _ => ViewState::default(),
    }
}

/// Numeric part of a length such as `"800px"` or `"21cm"`.
fn leading_number(value: &str) -> Option<f64> {
    let end = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == '-' || c == '+'))
        .unwrap_or(value.len());
    value[..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_lengths_with_units_when_parsing_then_keeps_number() {
        assert_eq!(leading_number("800px"), Some(800.0));
        assert_eq!(leading_number("21.5cm"), Some(21.5));
        assert_eq!(leading_number("auto"), None);
    }

    #[test]
    fn given_special_characters_when_escaping_then_entities_are_used() {
        assert_eq!(escape("a<b & \"c\"", true), "a&lt;b &amp; &quot;c&quot;");
        assert_eq!(escape("\"quoted\"", false), "\"quoted\"");
    }
}
