pub mod config;
pub mod definition;
pub mod error;

pub use config::Config;
pub use definition::*;
pub use error::*;
