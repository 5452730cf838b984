use thiserror::Error;

/// Errors reported before a flow computation starts.
///
/// Failures of the push/relabel invariants are not represented here: they
/// mean the solver itself is broken and abort the run with a panic.
#[derive(Debug, Error)]
pub enum Error {
    #[error("vertex {index} is out of range for a network of {nodes} nodes")]
    InvalidVertex { index: usize, nodes: usize },

    #[error("edge {edge} has negative capacity {capacity}")]
    NegativeCapacity { edge: usize, capacity: i64 },

    #[error("edge {edge} takes the total capacity at node {node} past the supported limit")]
    CapacityOverflow { edge: usize, node: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("failed to read network: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
