pub mod export;
pub mod loader;
pub mod parser;
pub mod payload;
pub mod periods;
pub mod unit_inference;
