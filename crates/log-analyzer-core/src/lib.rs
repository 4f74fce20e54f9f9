pub mod analysis;
pub mod config;
pub mod error;
pub mod log;
pub mod pipeline;
pub mod report;

pub use error::{Error, Result};
