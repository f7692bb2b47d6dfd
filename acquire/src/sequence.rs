//! The pulse sequence compiler lives outside this workspace; the scanner only
//! ever sees the bytes it produces.
use std::path::PathBuf;
use log::debug;
use crate::error::SequenceError;

pub trait SequenceCompiler {
    fn assemble(&self,description:&str) -> Result<Vec<u8>,SequenceError>;
}

/// Treats the description as the path of an already assembled program.
pub struct PrecompiledSequence {
    base_dir:PathBuf,
}

impl PrecompiledSequence {
    pub fn new(base_dir:PathBuf) -> Self {
        Self{base_dir}
    }
}

impl SequenceCompiler for PrecompiledSequence {
    fn assemble(&self,description:&str) -> Result<Vec<u8>,SequenceError> {
        let path = self.base_dir.join(description);
        let bytes = std::fs::read(&path).map_err(|source| SequenceError::Read{path:path.display().to_string(),source})?;
        if bytes.is_empty() {
            return Err(SequenceError::Empty(path.display().to_string()))
        }
        debug!("loaded {} byte sequence from {:?}",bytes.len(),path);
        Ok(bytes)
    }
}
