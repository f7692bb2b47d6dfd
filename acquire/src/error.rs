use thiserror::Error;
use mr_data::error::{ExportError, KSpaceError, SessionError, StreamDesync};
use recon::error::ReconError;
use scan_control::error::LinkError;
use utils::ConfigError;
use crate::scanner::ScanState;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot {operation} while {state:?}")]
    NotReady { operation: &'static str, state: ScanState },
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Link(#[from] LinkError),
    #[error(transparent)]
    Stream(#[from] StreamDesync),
    #[error(transparent)]
    KSpace(#[from] KSpaceError),
    #[error(transparent)]
    Recon(#[from] ReconError),
    #[error("console link lost: {0}")]
    LinkLost(String),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SequenceError {
    #[error("cannot read compiled sequence {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("compiled sequence {0} is empty")]
    Empty(String),
}
