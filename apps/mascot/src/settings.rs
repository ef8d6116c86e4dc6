use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shared::options::WidgetOptions;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database_url: String,
    /// Model descriptor paths in the catalog resolve against this directory.
    pub models_root: PathBuf,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub widget: WidgetOptions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/mascot.db".into(),
            models_root: PathBuf::from("."),
            viewport_width: 1280,
            viewport_height: 800,
            widget: WidgetOptions::default(),
        }
    }
}

/// Layers an optional TOML file and `MASCOT__*` environment variables over
/// the defaults.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    } else {
        builder = builder.add_source(config::File::with_name("mascot").required(false));
    }
    let settings = builder
        .add_source(
            config::Environment::with_prefix("MASCOT")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("failed to read mascot settings")?
        .try_deserialize::<Settings>()
        .context("invalid mascot settings")?;
    Ok(settings)
}

pub fn render_default_settings() -> anyhow::Result<String> {
    toml::to_string_pretty(&Settings::default()).context("failed to render default settings")
}
