pub mod error;
pub mod fft;
pub mod filter;
pub mod engine;
pub mod recon_config;
pub mod args;
pub mod export;
pub mod spectrum;
