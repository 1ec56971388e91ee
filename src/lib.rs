pub mod classifier;
pub mod config;
pub mod error;
pub mod llm;
pub mod plant_info;
pub mod server;

pub use error::{Error, Result};
