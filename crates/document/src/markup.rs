//! Reading XHTML-style markup into a [`Document`] and writing it back out.

use log::debug;
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};

use crate::error::{DocumentError, Result};
use crate::tree::{Document, Element, NodeId, NodeKind};

/// Tag of the synthetic element every parsed document hangs under.
pub const DOCUMENT_ROOT_TAG: &str = "document";
pub const DECORATION_TAG: &str = "mark";

fn resolve_html_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "nbsp" => Some("\u{a0}"),
        "copy" => Some("\u{a9}"),
        "mdash" => Some("\u{2014}"),
        "ndash" => Some("\u{2013}"),
        "hellip" => Some("\u{2026}"),
        _ => None,
    }
}

pub fn parse_markup(input: &str) -> Result<Document> {
    let mut doc = Document::new(DOCUMENT_ROOT_TAG);
    let mut reader = Reader::from_str(input);
    reader.trim_text(false);

    let mut open = vec![doc.root()];

    loop {
        let parent = open.last().copied().unwrap_or_else(|| doc.root());
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let element = element_from(&e).map_err(|err| markup_error(&reader, err))?;
                let id = doc.append_element(parent, element)?;
                open.push(id);
            }
            Ok(Event::Empty(e)) => {
                let element = element_from(&e).map_err(|err| markup_error(&reader, err))?;
                doc.append_element(parent, element)?;
            }
            Ok(Event::End(e)) => {
                if open.len() <= 1 {
                    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    return Err(DocumentError::UnbalancedTag(name));
                }
                open.pop();
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape_with(resolve_html_entity)
                    .map_err(|err| markup_error(&reader, err))?;
                if !text.is_empty() {
                    doc.append_text(parent, &text)?;
                }
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                if !text.is_empty() {
                    doc.append_text(parent, &text)?;
                }
            }
            Ok(Event::Comment(e)) => {
                let comment = String::from_utf8_lossy(&e.into_inner()).into_owned();
                let id = doc.create_comment(&comment);
                doc.append_child(parent, id)?;
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(markup_error(&reader, err)),
            // Declarations, processing instructions and doctypes carry no content.
            Ok(_) => debug!("Dropping prolog event at byte {}", reader.buffer_position()),
        }
    }

    if let Some(&unclosed) = open.get(1) {
        let tag = doc
            .element(unclosed)
            .map(|element| element.tag.clone())
            .unwrap_or_default();
        return Err(DocumentError::Markup {
            offset: input.len(),
            reason: format!("unclosed element `{}`", tag),
        });
    }

    Ok(doc)
}

fn element_from(start: &BytesStart<'_>) -> std::result::Result<Element, quick_xml::Error> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(&tag);

    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute.unescape_value()?.into_owned();
        if let Some(event) = key.strip_prefix("on").filter(|event| !event.is_empty()) {
            element.listeners.push(event.to_ascii_lowercase());
        }
        element.attributes.push((key, value));
    }

    Ok(element)
}

fn markup_error(reader: &Reader<&[u8]>, err: quick_xml::Error) -> DocumentError {
    DocumentError::Markup {
        offset: reader.buffer_position(),
        reason: err.to_string(),
    }
}

/// One `p` element per input line.
pub fn parse_plain_text(input: &str) -> Document {
    let mut doc = Document::new(DOCUMENT_ROOT_TAG);
    let root = doc.root();
    for line in input.lines() {
        let paragraph = doc.create_element(Element::new("p"));
        let _ = doc.append_child(root, paragraph);
        if !line.is_empty() {
            let _ = doc.append_text(paragraph, line);
        }
    }
    doc
}

/// Serializes `node` and its subtree. Decorations are written as
/// `<mark match-id=".." is-current="..">`.
pub fn to_markup(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    write_node(doc, node, &mut out);
    out
}

/// Serializes only the children of `node`.
pub fn inner_markup(doc: &Document, node: NodeId) -> String {
    let mut out = String::new();
    for &child in doc.children(node) {
        write_node(doc, child, &mut out);
    }
    out
}

fn write_node(doc: &Document, node: NodeId, out: &mut String) {
    let Some(current) = doc.get(node) else {
        return;
    };

    match current.kind() {
        NodeKind::Text(text) => out.push_str(&escape(text.as_str())),
        NodeKind::Comment(comment) => {
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->");
        }
        NodeKind::Element(element) => {
            out.push('<');
            out.push_str(&element.tag);
            for (key, value) in &element.attributes {
                write_attribute(out, key, value);
            }
            if current.children().is_empty() {
                out.push_str("/>");
                return;
            }
            out.push('>');
            for &child in current.children() {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(&element.tag);
            out.push('>');
        }
        NodeKind::Decoration(decoration) => {
            out.push('<');
            out.push_str(DECORATION_TAG);
            write_attribute(out, "match-id", &decoration.match_id);
            write_attribute(
                out,
                "is-current",
                if decoration.is_current { "true" } else { "false" },
            );
            out.push('>');
            for &child in current.children() {
                write_node(doc, child, out);
            }
            out.push_str("</");
            out.push_str(DECORATION_TAG);
            out.push('>');
        }
    }
}

fn write_attribute(out: &mut String, key: &str, value: &str) {
    out.push(' ');
    out.push_str(key);
    out.push_str("=\"");
    out.push_str(&escape(value));
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flatten::flatten;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_nested_markup() {
        let doc = parse_markup("<p>The quick <b>brown</b> fox</p>").unwrap();
        let root = doc.root();
        assert_eq!(flatten(&doc, root).text, "The quick brown fox");
        assert_eq!(
            inner_markup(&doc, root),
            "<p>The quick <b>brown</b> fox</p>"
        );
    }

    #[test]
    fn collects_listener_attributes() {
        let doc = parse_markup(r#"<button onclick="go()" class="x">Go</button>"#).unwrap();
        let button = doc.children(doc.root())[0];
        let element = doc.element(button).unwrap();
        assert_eq!(element.listeners, vec!["click".to_string()]);
        assert_eq!(element.attribute("class"), Some("x"));
        assert_eq!(
            inner_markup(&doc, doc.root()),
            r#"<button onclick="go()" class="x">Go</button>"#
        );
    }

    #[test]
    fn unescapes_entities_and_escapes_on_output() {
        let doc = parse_markup("<p>a &amp; b&nbsp;c &lt;d&gt;</p>").unwrap();
        assert_eq!(flatten(&doc, doc.root()).text, "a & b\u{a0}c <d>");
        assert_eq!(
            inner_markup(&doc, doc.root()),
            "<p>a &amp; b\u{a0}c &lt;d&gt;</p>"
        );
    }

    #[test]
    fn empty_elements_round_trip() {
        let doc = parse_markup("<p>line<br/>next</p>").unwrap();
        assert_eq!(inner_markup(&doc, doc.root()), "<p>line<br/>next</p>");
        assert_eq!(flatten(&doc, doc.root()).text, "linenext");
    }

    #[test]
    fn rejects_unbalanced_markup() {
        assert!(matches!(
            parse_markup("<p>open"),
            Err(DocumentError::Markup { .. })
        ));
        assert!(matches!(
            parse_markup("text</p>"),
            Err(DocumentError::UnbalancedTag(_)) | Err(DocumentError::Markup { .. })
        ));
    }

    #[test]
    fn plain_text_builds_paragraphs() {
        let doc = parse_plain_text("first line\n\nthird");
        let root = doc.root();
        assert_eq!(doc.children(root).len(), 3);
        assert_eq!(
            inner_markup(&doc, root),
            "<p>first line</p><p/><p>third</p>"
        );
    }

    #[test]
    fn writes_decorations_as_marks() {
        use crate::highlight::apply_highlights;
        use findmark_search::{SearchOptions, SearchPattern, find_matches};

        let mut doc = parse_markup("<p>cat and cat</p>").unwrap();
        let root = doc.root();
        let pattern = SearchPattern::compile("cat", SearchOptions::default())
            .unwrap()
            .unwrap();
        let matches = find_matches(&flatten(&doc, root).text, &pattern, "g");
        apply_highlights(&mut doc, root, &matches, Some(1));

        assert_eq!(
            inner_markup(&doc, root),
            "<p><mark match-id=\"g-0\" is-current=\"false\">cat</mark> and \
             <mark match-id=\"g-1\" is-current=\"true\">cat</mark></p>"
        );
    }

    #[test]
    fn comments_are_kept_but_not_searched() {
        let doc = parse_markup("<p>aa a<!-- c -->a</p>").unwrap();
        let root = doc.root();
        let p = doc.children(root)[0];
        assert_eq!(doc.comment(doc.children(p)[1]), Some(" c "));
        assert_eq!(flatten(&doc, root).text, "aa aa");
        assert_eq!(to_markup(&doc, p), "<p>aa a<!-- c -->a</p>");
    }

    #[test]
    fn comment_separated_text_stays_cross_leaf_across_rerenders() {
        use crate::highlight::apply_highlights;
        use findmark_search::{SearchOptions, SearchPattern, find_matches};

        let mut doc = parse_markup("<p>aa a<!-- c -->a</p>").unwrap();
        let root = doc.root();
        let pattern = SearchPattern::compile("aa", SearchOptions::default())
            .unwrap()
            .unwrap();
        let matches = find_matches(&flatten(&doc, root).text, &pattern, "m");
        assert_eq!(matches.len(), 2);

        let first = apply_highlights(&mut doc, root, &matches, Some(0));
        let first_markup = inner_markup(&doc, root);
        let second = apply_highlights(&mut doc, root, &matches, Some(0));

        assert_eq!(first, second);
        assert_eq!(second.cross_leaf, 1);
        assert_eq!(inner_markup(&doc, root), first_markup);
        assert_eq!(
            first_markup,
            "<p><mark match-id=\"m-0\" is-current=\"true\">aa</mark> a<!-- c -->a</p>"
        );
    }
}
