//! Error types for session validation, stream reassembly and k-space placement.
use std::path::PathBuf;
use thiserror::Error;
use crate::sample_block::RawSampleBlock;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum SessionError {
    #[error("trajectory does not fit the session: {0}")]
    TrajectoryMismatch(String),
}

/// A chunk carried bytes past the end of the block being assembled. Blocks the
/// same chunk completed before the surplus was found are handed back in `completed`.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{surplus} bytes arrived past the end of a {block_bytes} byte sample block")]
pub struct StreamDesync {
    pub surplus: usize,
    pub block_bytes: usize,
    pub completed: Vec<RawSampleBlock>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum KSpaceError {
    #[error("row {row} of plane {plane} was already filled in this pass")]
    RowOverwrite { plane: usize, row: usize },
    #[error("cell ({plane}, {row}, {col}) is outside k-space")]
    OutOfBounds { plane: usize, row: usize, col: usize },
    #[error("row holds {found} samples, k-space rows hold {expected}")]
    RowLength { expected: usize, found: usize },
    #[error("block holds {available} samples but the readout needs {needed}")]
    ShortBlock { needed: usize, available: usize },
    #[error("raw block length {0} is not a whole number of complex samples")]
    RaggedBlock(usize),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("cannot write {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("nifti error: {0}")]
    Nifti(#[from] nifti::NiftiError),
    #[error("cannot write array of shape {0:?} as delimited text")]
    Shape(Vec<usize>),
}
