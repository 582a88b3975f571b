use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RouteSourceError {
    #[error("failed to read routing dump {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read handler manifest {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse YAML manifest: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    #[error("failed to parse JSON manifest: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to build a single document. Never affects other API names.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no document settings configured for API `{0}`")]
    UnknownApi(String),

    #[error("API `{0}` has no root_handler_group configured")]
    MissingRootHandlerGroup(String),

    #[error("path `{path}` from `{group}` is already documented in API `{api}`")]
    DuplicatePath {
        api: String,
        path: String,
        group: String,
    },

    #[error("component `{section}/{name}` from `{group}` is already defined in API `{api}`")]
    DuplicateComponent {
        api: String,
        section: String,
        name: String,
        group: String,
    },

    #[error("failed to load routes: {0}")]
    Routes(#[from] RouteSourceError),

    #[error("failed to encode security schemes: {0}")]
    Json(#[from] serde_json::Error),
}
