use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;

use crate::document::{Info, Server};
use crate::error::ConfigError;
use crate::security::{SecurityRequirement, SecurityScheme};

/// Top-level configuration loaded from `.routedoc.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RoutedocConfig {
    /// Directory receiving `{api}.json` files.
    pub output: String,
    /// Saved route dump; without one, action-documented operations cannot be placed.
    pub routes: Option<String>,
    /// Handler manifest (YAML or JSON).
    pub handlers: String,
    pub duplicate_policy: DuplicatePolicy,
    /// Also write `paths_index.json` next to the documents.
    pub write_paths_index: bool,
    pub docs: IndexMap<String, DocumentSettings>,
    pub stubs: StubConfig,
}

impl Default for RoutedocConfig {
    fn default() -> Self {
        Self {
            output: "public/open_api".to_string(),
            routes: None,
            handlers: "handlers.yaml".to_string(),
            duplicate_policy: DuplicatePolicy::default(),
            write_paths_index: false,
            docs: IndexMap::new(),
            stubs: StubConfig::default(),
        }
    }
}

/// Static settings of one named API document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DocumentSettings {
    #[serde(default)]
    pub info: Info,
    #[serde(default)]
    pub servers: Vec<Server>,
    #[serde(default)]
    pub global_security: Vec<SecurityRequirement>,
    #[serde(default)]
    pub global_security_schemes: IndexMap<String, SecurityScheme>,
    /// Handler group whose descendants make up the document.
    #[serde(default)]
    pub root_handler_group: Option<String>,
}

impl DocumentSettings {
    pub fn new(info: Info) -> Self {
        Self {
            info,
            ..Self::default()
        }
    }

    pub fn with_root(mut self, root: impl Into<String>) -> Self {
        self.root_handler_group = Some(root.into());
        self
    }
}

/// What to do when two handler groups document the same path or component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Later groups replace earlier ones.
    #[default]
    Overwrite,
    /// Replace, logging a warning.
    Warn,
    /// Fail the document build.
    Reject,
}

/// Template stub generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StubConfig {
    pub enabled: bool,
    pub overwrite: bool,
    pub directory: String,
    pub extension: String,
    /// Template key → template source (minijinja syntax).
    pub templates: IndexMap<String, String>,
}

impl Default for StubConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            overwrite: false,
            directory: "app/views".to_string(),
            extension: "json.jbuilder".to_string(),
            templates: IndexMap::new(),
        }
    }
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".routedoc.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<RoutedocConfig>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_yaml_ng::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# routedoc configuration
output: public/open_api
routes: routes.txt          # saved output of the framework's route listing
handlers: handlers.yaml     # handler groups and their metadata
duplicate_policy: overwrite # overwrite | warn | reject
write_paths_index: false

docs:
  homepage_api:
    info:
      title: APIs Doc
      description: API documentation
      version: "1.0.0"
    servers:
      - url: http://localhost:3000
        description: local
    root_handler_group: ApplicationController
    global_security:
      - ApiKeyAuth: []
    global_security_schemes:
      ApiKeyAuth:
        type: apiKey
        name: server_token
        in: query

stubs:
  enabled: false
  overwrite: false
  directory: app/views
  extension: json.jbuilder
  templates: {}
    # default: |
    #   json.partial! 'api/success'
"#
}
