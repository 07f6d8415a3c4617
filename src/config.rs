//! Optional `export-docs.toml` configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bootstrap::RenderSettings;
use crate::error::{Result, ToolError};
use crate::graph::RootAliases;
use crate::io::source::{DEFAULT_SHEET_URL_TEMPLATE, LoadOptions};
use crate::render::RenderOptions;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "export-docs.toml";

/// Where schemas are loaded from by default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Directory, base URL, workbook path or `sheets:<id>`.
    pub base: Option<String>,
    pub sheet_url_template: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base: None,
            sheet_url_template: DEFAULT_SHEET_URL_TEMPLATE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    /// Named spreadsheet ids, e.g. `staging` and `production`.
    pub sheets: BTreeMap<String, String>,
    pub roots: RootAliases,
    pub render: RenderOptions,
}

impl Config {
    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Loads `path`, or [`DEFAULT_CONFIG_FILE`] when no path is given. A
    /// missing default file yields the defaults; a missing explicit file is
    /// an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };
        if !path.exists() {
            if explicit {
                return Err(ToolError::MissingInput(path.to_path_buf()));
            }
            debug!(path = %path.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|err| ToolError::Config {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    /// Maps a configured sheet name onto its id; anything else is taken to
    /// be an id already.
    pub fn resolve_sheet(&self, name_or_id: &str) -> String {
        self.sheets
            .get(name_or_id)
            .cloned()
            .unwrap_or_else(|| name_or_id.to_string())
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            load: LoadOptions {
                sheet_url_template: self.source.sheet_url_template.clone(),
            },
            roots: self.roots.clone(),
            render: self.render.clone(),
        }
    }
}
