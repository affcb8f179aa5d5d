//! Configuration module for nagl-models
//!
//! Loads config from `$XDG_CONFIG_HOME/nagl-models/config.toml` or
//! `~/.config/nagl-models/config.toml`. Falls back to built-in defaults if
//! the file doesn't exist. Partial configs are merged with defaults using
//! serde's default attributes.
//!
//! # Example
//!
//! ```no_run
//! use nagl_models::config::Config;
//!
//! let config = Config::load().expect("Failed to load config");
//! println!("Release feed: {}", config.releases_url);
//! ```

pub mod schema;

pub use schema::Config;
