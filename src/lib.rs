pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod ops;
pub mod vault;
pub mod writer;
