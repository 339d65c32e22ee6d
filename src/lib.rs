pub mod analysis;
pub mod ast;
pub mod config;
pub mod errors;
pub mod position;
pub mod symbol;
