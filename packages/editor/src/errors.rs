//! Error types for the editor

use scribe_dom::DomError;
use scribe_parser::ParseError;
use thiserror::Error;

pub type FormatResult<T> = Result<T, FormatError>;
pub type StructureResult<T> = Result<T, StructureError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Tree error: {0}")]
    Tree(#[from] DomError),

    #[error("Format error: {0}")]
    Format(#[from] FormatError),

    #[error("Structure error: {0}")]
    Structure(#[from] StructureError),
}

/// Failures of inline and block formatting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormatError {
    #[error("Tree error: {0}")]
    Tree(#[from] DomError),

    #[error("Invalid heading level: {0} (expected 1-6)")]
    InvalidHeadingLevel(u8),
}

/// Failures of list, link, image and table insertion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructureError {
    #[error("Tree error: {0}")]
    Tree(#[from] DomError),

    #[error("Address is empty")]
    EmptyAddress,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Invalid table size {rows}x{cols} (each must be between 1 and {max})")]
    InvalidTableSize { rows: usize, cols: usize, max: usize },
}
