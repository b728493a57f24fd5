use crate::entities::{escape_attr, escape_text};
use scribe_dom::{Document, ElementData, NodeId, NodeKind};

/// Serializer converts a document subtree back to markup.
///
/// Output is compact: whitespace inside text nodes is content, so nothing
/// is indented or wrapped. Attributes are written in key order followed by
/// the `style` attribute built from the element's style map.
pub struct Serializer<'doc> {
    doc: &'doc Document,
    output: String,
}

impl<'doc> Serializer<'doc> {
    pub fn new(doc: &'doc Document) -> Self {
        Self {
            doc,
            output: String::new(),
        }
    }

    /// Append the markup of `node` itself
    pub fn node(&mut self, node: NodeId) -> &mut Self {
        let Ok(entry) = self.doc.node(node) else {
            return self;
        };
        match &entry.kind {
            NodeKind::Text(content) => self.output.push_str(&escape_text(content)),
            NodeKind::Element(data) => {
                self.open_tag(data);
                if !data.is_void() {
                    self.children(node);
                    self.output.push_str("</");
                    self.output.push_str(&data.tag);
                    self.output.push('>');
                }
            }
        }
        self
    }

    /// Append the markup of every child of `node`
    pub fn children(&mut self, node: NodeId) -> &mut Self {
        for child in self.doc.children(node) {
            self.node(*child);
        }
        self
    }

    fn open_tag(&mut self, data: &ElementData) {
        self.output.push('<');
        self.output.push_str(&data.tag);
        for (key, value) in &data.attributes {
            self.output.push(' ');
            self.output.push_str(key);
            self.output.push_str("=\"");
            self.output.push_str(&escape_attr(value));
            self.output.push('"');
        }
        if !data.styles.is_empty() {
            let style = style_string(data);
            self.output.push_str(" style=\"");
            self.output.push_str(&escape_attr(&style));
            self.output.push('"');
        }
        self.output.push('>');
    }

    pub fn finish(self) -> String {
        self.output
    }
}

/// Render a style map as `prop: value; prop: value`
pub fn style_string(data: &ElementData) -> String {
    data.styles
        .iter()
        .map(|(property, value)| format!("{}: {}", property, value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Serialize `node` including its own tag
pub fn serialize(doc: &Document, node: NodeId) -> String {
    let mut serializer = Serializer::new(doc);
    serializer.node(node);
    serializer.finish()
}

/// Serialize the children of `node` (its inner markup)
pub fn serialize_children(doc: &Document, node: NodeId) -> String {
    let mut serializer = Serializer::new(doc);
    serializer.children(node);
    serializer.finish()
}
