//! # Scribe DOM
//!
//! The in-memory document tree backing an editable surface.
//!
//! Nodes live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Every node except the root has exactly one parent; detached
//! nodes stay in the arena but are unreachable from the root. Ids are never
//! reused, so an id captured before a mutation never aliases a new node.
//!
//! ```rust,ignore
//! use scribe_dom::{Document, ElementData};
//!
//! let mut doc = Document::new("div");
//! let text = doc.create_text("Hello World");
//! doc.append_child(doc.root(), text)?;
//!
//! let strong = doc.create_element(ElementData::new("strong"));
//! doc.wrap(text, strong)?;
//! assert_eq!(doc.text_content(doc.root()), "Hello World");
//! ```

mod document;
mod error;
mod node;
mod point;
pub mod text;

pub use document::{Descendants, Document};
pub use error::{DomError, DomResult};
pub use node::{is_void_element, ElementData, Node, NodeId, NodeKind};
pub use point::{Point, Range};
