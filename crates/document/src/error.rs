//! Error types for document construction and markup parsing.

pub type Result<T> = std::result::Result<T, DocumentError>;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Malformed markup
    #[error("Failed to parse markup at byte {offset}: {reason}")]
    Markup { offset: usize, reason: String },

    /// Closing tag without a matching open element
    #[error("Unexpected closing tag `{0}`")]
    UnbalancedTag(String),

    /// Node handle does not resolve to a live node
    #[error("Node {0} is not part of the document")]
    NodeNotFound(usize),

    /// Text operation on a node that is not a text leaf
    #[error("Node {0} is not a text node")]
    NotText(usize),
}
