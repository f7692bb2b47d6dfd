pub mod command;
pub mod error;
pub mod link;
pub mod args;
