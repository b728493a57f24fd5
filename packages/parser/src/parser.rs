//! Markup → document tree.
//!
//! Accepts the lenient HTML subset an editable surface produces:
//! - void elements never take children
//! - a close tag closes the nearest matching open element, implicitly
//!   closing anything opened after it
//! - elements still open at end of input are closed implicitly
//! - comments and doctypes are dropped
//! - the `style` attribute is lifted into the element's style map

use crate::entities::decode;
use crate::tokenizer::{tokenize, Token};
use crate::{ParseError, ParseResult};
use scribe_dom::{Document, ElementData, NodeId};

/// Parse markup into a new document with a `div` root
pub fn parse(source: &str) -> ParseResult<Document> {
    parse_with_root(source, "div")
}

/// Parse markup into a new document whose root has the given tag
pub fn parse_with_root(source: &str, root_tag: &str) -> ParseResult<Document> {
    let mut doc = Document::new(root_tag);
    let root = doc.root();
    parse_into(&mut doc, root, source)?;
    Ok(doc)
}

/// Parse markup as a fragment and append the result to `parent`
pub fn parse_into(doc: &mut Document, parent: NodeId, source: &str) -> ParseResult<()> {
    let tokens = tokenize(source)?;
    let mut parser = Parser::new(doc, parent);

    for spanned in tokens {
        match spanned.token {
            Token::Comment(_) | Token::Doctype(_) => {}
            Token::Text(text) => parser.text(text)?,
            Token::OpenTag(raw) => {
                let tag = parse_open_tag(raw, spanned.span.start)?;
                parser.open(tag)?;
            }
            Token::CloseTag(raw) => {
                let name = close_tag_name(raw);
                parser.close(&name, spanned.span.start)?;
            }
        }
    }

    Ok(())
}

/// Tree builder holding the stack of open elements
struct Parser<'doc> {
    doc: &'doc mut Document,
    open: Vec<(NodeId, String)>,
}

impl<'doc> Parser<'doc> {
    fn new(doc: &'doc mut Document, parent: NodeId) -> Self {
        Self {
            doc,
            open: vec![(parent, String::new())],
        }
    }

    fn current(&self) -> NodeId {
        self.open.last().map(|(id, _)| *id).unwrap_or_else(|| self.doc.root())
    }

    fn text(&mut self, raw: &str) -> ParseResult<()> {
        let content = decode(raw);
        let parent = self.current();

        // Adjacent text runs (e.g. around a stray `<`) share one node
        if let Some(last) = self.doc.children(parent).last().copied() {
            if let Some(existing) = self.doc.text(last) {
                let merged = format!("{}{}", existing, content);
                self.doc.set_text(last, merged)?;
                return Ok(());
            }
        }

        let node = self.doc.create_text(content.into_owned());
        self.doc.append_child(parent, node)?;
        Ok(())
    }

    fn open(&mut self, tag: OpenTag) -> ParseResult<()> {
        let is_void = tag.data.is_void();
        let name = tag.data.tag.clone();
        let node = self.doc.create_element(tag.data);
        self.doc.append_child(self.current(), node)?;

        if !is_void && !tag.self_closing {
            self.open.push((node, name));
        }
        Ok(())
    }

    fn close(&mut self, name: &str, pos: usize) -> ParseResult<()> {
        if scribe_dom::is_void_element(name) {
            return Ok(());
        }
        // Index 0 is the fragment parent and never closes
        match self.open.iter().rposition(|(_, open)| open == name) {
            Some(idx) if idx > 0 => {
                self.open.truncate(idx);
                Ok(())
            }
            _ => Err(ParseError::stray_close_tag(pos, name)),
        }
    }
}

/// Parsed open tag
#[derive(Debug, Clone, PartialEq)]
struct OpenTag {
    data: ElementData,
    self_closing: bool,
}

fn parse_open_tag(raw: &str, pos: usize) -> ParseResult<OpenTag> {
    let inner = raw
        .strip_prefix('<')
        .and_then(|s| s.strip_suffix('>'))
        .ok_or_else(|| ParseError::unterminated_tag(pos))?;

    let name_end = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
        .unwrap_or(inner.len());
    let name = &inner[..name_end];
    if name.is_empty() {
        return Err(ParseError::invalid_tag_name(pos));
    }

    let mut data = ElementData::new(name);
    let mut self_closing = false;
    let mut rest = &inner[name_end..];

    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            break;
        }
        if let Some(after) = rest.strip_prefix('/') {
            self_closing = after.trim().is_empty();
            rest = after;
            continue;
        }

        let key_end = rest
            .find(|c: char| c.is_whitespace() || c == '=' || c == '/')
            .unwrap_or(rest.len());
        let key = rest[..key_end].to_ascii_lowercase();
        rest = rest[key_end..].trim_start();

        let value = if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, remaining) = read_attr_value(after_eq);
            rest = remaining;
            decode(value).into_owned()
        } else {
            String::new()
        };

        if key.is_empty() {
            // Lone `=` or similar junk; skip a character to make progress
            rest = rest.get(1..).unwrap_or("");
            continue;
        }

        if key == "style" {
            for (property, value) in parse_style(&value) {
                data.set_style(property, value);
            }
        } else {
            data.attributes.insert(key, value);
        }
    }

    Ok(OpenTag { data, self_closing })
}

fn read_attr_value(input: &str) -> (&str, &str) {
    for quote in ['"', '\''] {
        if let Some(body) = input.strip_prefix(quote) {
            return match body.find(quote) {
                Some(end) => (&body[..end], &body[end + 1..]),
                None => (body, ""),
            };
        }
    }
    let end = input.find(char::is_whitespace).unwrap_or(input.len());
    (&input[..end], &input[end..])
}

/// Split a `style` attribute into `(property, value)` pairs
pub fn parse_style(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (property, value) = decl.split_once(':')?;
            let property = property.trim().to_ascii_lowercase();
            let value = value.trim();
            if property.is_empty() || value.is_empty() {
                None
            } else {
                Some((property, value.to_string()))
            }
        })
        .collect()
}

fn close_tag_name(raw: &str) -> String {
    raw.trim_start_matches("</")
        .trim_end_matches('>')
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_inline() {
        let doc = parse("<p>Hello <strong>World</strong></p>").unwrap();
        let root = doc.root();
        let p = doc.children(root)[0];

        assert_eq!(doc.tag(p), Some("p"));
        assert_eq!(doc.children(p).len(), 2);
        assert_eq!(doc.tag(doc.children(p)[1]), Some("strong"));
        assert_eq!(doc.text_content(root), "Hello World");
    }

    #[test]
    fn test_parse_attributes_and_styles() {
        let doc = parse(r#"<span class=note data-x='1' style="font-size: 14px; COLOR:red">x</span>"#)
            .unwrap();
        let span = doc.children(doc.root())[0];
        let data = doc.element(span).unwrap();

        assert_eq!(data.attr("class"), Some("note"));
        assert_eq!(data.attr("data-x"), Some("1"));
        assert_eq!(data.style("font-size"), Some("14px"));
        assert_eq!(data.style("color"), Some("red"));
        assert_eq!(data.attr("style"), None);
    }

    #[test]
    fn test_void_elements_take_no_children() {
        let doc = parse("a<br>b<img src=\"x.png\">c").unwrap();
        let root = doc.root();

        assert_eq!(doc.children(root).len(), 5);
        assert_eq!(doc.tag(doc.children(root)[1]), Some("br"));
        assert!(doc.children(doc.children(root)[1]).is_empty());
        assert_eq!(doc.text_content(root), "abc");
    }

    #[test]
    fn test_close_tag_closes_intermediates() {
        let doc = parse("<p><em>a</p>b").unwrap();
        let root = doc.root();

        assert_eq!(doc.children(root).len(), 2);
        assert_eq!(doc.text(doc.children(root)[1]), Some("b"));
    }

    #[test]
    fn test_unclosed_elements_close_at_end() {
        let doc = parse("<ul><li>one<li>two").unwrap();
        assert_eq!(doc.text_content(doc.root()), "onetwo");
    }

    #[test]
    fn test_stray_close_tag_is_an_error() {
        assert_eq!(
            parse("a</b>"),
            Err(ParseError::StrayCloseTag { pos: 1, tag: "b".to_string() })
        );
    }

    #[test]
    fn test_entities_decoded_in_text() {
        let doc = parse("Tom &amp; Jerry &lt;3").unwrap();
        assert_eq!(doc.text_content(doc.root()), "Tom & Jerry <3");
    }

    #[test]
    fn test_whitespace_text_is_kept() {
        let doc = parse("<b>a</b> <i>b</i>").unwrap();
        let root = doc.root();
        assert_eq!(doc.children(root).len(), 3);
        assert_eq!(doc.text(doc.children(root)[1]), Some(" "));
    }

    #[test]
    fn test_parse_into_fragment() {
        let mut doc = Document::new("div");
        let root = doc.root();
        parse_into(&mut doc, root, "<p>x</p>").unwrap();
        parse_into(&mut doc, root, "<p>y</p>").unwrap();
        assert_eq!(doc.children(root).len(), 2);
    }
}
