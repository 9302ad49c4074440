use thiserror::Error;

/// The crate-wide result type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors raised while constructing or materializing a [`Pipeline`].
///
/// Construction-time checks (`from_array`, `filter`, `reduce` preconditions)
/// fail before any element is produced. Errors raised during materialization
/// abort the whole `build`/`reduce` call; there is no partial result.
///
/// [`Pipeline`]: super::Pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The depth passed to [`Pipeline::from_array`] was not a positive
    /// integer.
    ///
    /// [`Pipeline::from_array`]: super::Pipeline::from_array
    #[error("depth must be a positive integer, got {0}")]
    InvalidDepth(usize),

    /// The requested depth does not match the source's nesting.
    #[error("requested depth {depth} does not match source rank {rank}")]
    ShapeMismatch { depth: usize, rank: usize },

    /// `filter` or `reduce` was invoked on a pipeline whose rank is not 1.
    #[error("operation requires a pipeline of rank 1, got rank {rank}")]
    UnsupportedRank { rank: usize },

    /// `reduce` was invoked on a pipeline that produced no elements.
    #[error("cannot reduce an empty pipeline")]
    EmptyReduce,

    /// A user-supplied transform or predicate failed.
    ///
    /// The original failure is reachable via [`std::error::Error::source()`].
    #[error("user function failed")]
    UserFunction(#[source] Box<dyn std::error::Error + Send + Sync>),
}
