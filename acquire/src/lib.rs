pub mod error;
pub mod config;
pub mod sequence;
pub mod scanner;
pub mod receive;
pub mod args;
