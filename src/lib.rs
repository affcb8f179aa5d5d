pub mod config;
pub mod error;
pub mod models;

pub use error::{NaglModelsError, Result};
pub use models::{ModelResolver, ProviderRegistry};
