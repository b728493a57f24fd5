use crate::NodeId;
use thiserror::Error;

pub type DomResult<T> = Result<T, DomError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Node {0} is not an element")]
    NotAnElement(NodeId),

    #[error("Node {0} is not text")]
    NotText(NodeId),

    #[error("Node {0} is not attached to a parent")]
    Detached(NodeId),

    #[error("Would create cycle")]
    CycleDetected,

    #[error("The root element cannot be moved, wrapped or removed")]
    RootImmutable,

    #[error("Offset {offset} out of bounds (length {len})")]
    OffsetOutOfBounds { offset: usize, len: usize },
}
