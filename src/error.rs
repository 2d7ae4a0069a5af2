//! Errors raised while walking a conversation tree.

/// A structural problem with one conversation's node mapping.
///
/// These are per-conversation failures: the export driver logs them and
/// moves on to the next record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// Every node in the mapping has a parent.
    #[error("no root node found (every node has a parent)")]
    NoRoot,

    /// A root or child key points at a node that is not in the mapping.
    #[error("node {0:?} is referenced but missing from the mapping")]
    MissingNode(String),

    /// The walk went deeper than the configured ceiling.
    #[error("conversation tree is deeper than {limit} levels (at node {key:?})")]
    TooDeep { key: String, limit: usize },
}

pub type Result<T> = std::result::Result<T, TreeError>;
