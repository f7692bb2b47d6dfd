pub mod error;
pub mod session;
pub mod sample_block;
pub mod stream;
pub mod kspace;
pub mod trajectory;
pub mod cfl;
