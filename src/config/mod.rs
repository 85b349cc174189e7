//! Configuration loading with layered priority:
//! 1. Default values (hardcoded)
//! 2. Optional config file (explicit path or `ROLL_CONFIG_PATH`)
//! 3. Environment variables (highest priority)

mod rolls;
mod session;
mod stream;
pub use rolls::*;
pub use session::*;
pub use stream::*;

//---
use std::env;

use config::Config;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::errors::Result;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    /// Roll Engine parameters
    pub rolls: RollsConfig,
    /// Session TTL policy
    pub session: SessionConfig,
    /// Delivery-loop timer intervals
    pub stream: StreamConfig,
}

impl Settings {
    /// Load configuration. `path` points at an optional TOML file; env
    /// vars prefixed `ROLL` (`__` separator, e.g.
    /// `ROLL__ROLLS__BUFFER_DEPTH`) override everything.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::with_name(path).required(true));
        } else if let Ok(path) = env::var("ROLL_CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("ROLL")
                .separator("__")
                .ignore_empty(true)
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }
}
