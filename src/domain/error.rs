//! Domain-level errors (no external dependencies)

use std::fmt;

use thiserror::Error;

use crate::domain::document::NodeId;
use crate::domain::ids::EntityId;

/// Caller-supplied reference that does not resolve inside a presentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidReference {
    Layer(String),
    Frame { index: usize, len: usize },
    FrameId(EntityId),
}

impl fmt::Display for InvalidReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReference::Layer(id) => write!(f, "no layer with id '{id}'"),
            InvalidReference::Frame { index, len } => {
                write!(f, "frame index {index} out of range (len {len})")
            }
            InvalidReference::FrameId(id) => write!(f, "no frame with id {id}"),
        }
    }
}

/// Domain errors represent contract violations on the document model.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid reference: {0}")]
    InvalidReference(InvalidReference),

    #[error("unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("{child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },

    #[error("not an element: {0}")]
    NotAnElement(NodeId),
}

impl DomainError {
    pub fn is_invalid_reference(&self) -> bool {
        matches!(self, DomainError::InvalidReference(_))
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
