use scribe_dom::DomError;
use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unterminated tag at {pos}")]
    UnterminatedTag { pos: usize },

    #[error("Close tag </{tag}> at {pos} has no matching open element")]
    StrayCloseTag { pos: usize, tag: String },

    #[error("Invalid tag name at {pos}")]
    InvalidTagName { pos: usize },

    #[error("Tree error: {0}")]
    Tree(#[from] DomError),
}

impl ParseError {
    pub fn unterminated_tag(pos: usize) -> Self {
        Self::UnterminatedTag { pos }
    }

    pub fn stray_close_tag(pos: usize, tag: impl Into<String>) -> Self {
        Self::StrayCloseTag {
            pos,
            tag: tag.into(),
        }
    }

    pub fn invalid_tag_name(pos: usize) -> Self {
        Self::InvalidTagName { pos }
    }
}
