use thiserror::Error;
use mr_data::error::ExportError;
use utils::ConfigError;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReconError {
    #[error("a {width} sample window centered at fraction {fraction} does not fit in {extent} samples")]
    CropOutOfRange { extent: usize, width: usize, fraction: f32 },
    #[error("expected k-space of shape {expected:?}, found {found:?}")]
    ShapeMismatch { expected: (usize,usize,usize), found: (usize,usize,usize) },
    #[error("no k-space passes were accumulated")]
    NoPasses,
    #[error("no {0} samples to analyse")]
    EmptyData(&'static str),
}

/// Failures of an offline reconstruction run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Recon(#[from] ReconError),
}
