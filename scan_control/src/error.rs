//! Errors raised while encoding commands and writing them to the console.
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum CommandError {
    #[error("{field} value {value} does not fit in the command word (limit {limit})")]
    EncodingOverflow { field: &'static str, value: f64, limit: u32 },
    #[error("{field} value {value} is reserved on the wire")]
    ReservedValue { field: &'static str, value: u32 },
    #[error("word {word:#010x} is not a known command")]
    UnknownCommand { word: u32 },
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("console stopped accepting data after {written} of {total} bytes ({waited:?})")]
    LinkStalled { written: usize, total: usize, waited: Duration },
    #[error("console link closed")]
    Closed,
    #[error("I/O error on console link: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LinkError>;
