use std::fs;
use std::path::{Path, PathBuf};

use heck::ToPascalCase;
use log::info;
use minijinja::{Environment, context};
use routedoc_core::GeneratedFile;
use routedoc_core::config::StubConfig;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StubError {
    #[error("no stub template configured under `{0}`")]
    MissingTemplate(String),

    #[error("expected `group#action`, got `{0}`")]
    InvalidActionPath(String),

    #[error("failed to render stub template `{key}`: {source}")]
    Render {
        key: String,
        source: minijinja::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What happened to a requested stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubOutcome {
    Written(PathBuf),
    /// A file already exists and overwriting is off.
    Kept(PathBuf),
    /// Stub generation is switched off in the config.
    Disabled,
}

/// Split `api/v1/examples#show` into `("api/v1/examples", "show")`.
///
/// Parent-directory segments are rejected so stubs stay under the stub directory.
pub fn split_action_path(action_path: &str) -> Result<(&str, &str), StubError> {
    match action_path.split_once('#') {
        Some((group, action))
            if !group.is_empty()
                && !action.is_empty()
                && !group.split('/').any(|segment| segment == "..")
                && !action.contains('/') =>
        {
            Ok((group, action))
        }
        _ => Err(StubError::InvalidActionPath(action_path.to_string())),
    }
}

/// Writes response template stubs for handler actions under
/// `{root}/{directory}/{group}/{action}.{extension}`.
pub struct StubWriter<'a> {
    config: &'a StubConfig,
    root: PathBuf,
}

impl<'a> StubWriter<'a> {
    pub fn new(config: &'a StubConfig, root: impl Into<PathBuf>) -> Self {
        Self {
            config,
            root: root.into(),
        }
    }

    /// Render the stub for an action without touching the filesystem.
    ///
    /// Templates see `group`, `action`, `resource` (last group segment) and
    /// `resource_class` (its PascalCase form).
    pub fn render(&self, action_path: &str, template_key: &str) -> Result<GeneratedFile, StubError> {
        let (group, action) = split_action_path(action_path)?;
        let source = self
            .config
            .templates
            .get(template_key)
            .ok_or_else(|| StubError::MissingTemplate(template_key.to_string()))?;

        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        let render_err = |source| StubError::Render {
            key: template_key.to_string(),
            source,
        };
        env.add_template(template_key, source).map_err(render_err)?;
        let tmpl = env.get_template(template_key).map_err(render_err)?;

        let resource = group.rsplit('/').next().unwrap_or(group);
        let content = tmpl
            .render(context! {
                group => group,
                action => action,
                resource => resource,
                resource_class => resource.to_pascal_case(),
            })
            .map_err(render_err)?;

        Ok(GeneratedFile {
            path: format!(
                "{}/{}/{}.{}",
                self.config.directory, group, action, self.config.extension
            ),
            content,
        })
    }

    /// Render and write the stub, honouring the enabled and overwrite settings.
    pub fn write(&self, action_path: &str, template_key: &str) -> Result<StubOutcome, StubError> {
        if !self.config.enabled {
            return Ok(StubOutcome::Disabled);
        }

        let file = self.render(action_path, template_key)?;
        let path = self.root.join(&file.path);
        if path.exists() && !self.config.overwrite {
            return Ok(StubOutcome::Kept(path));
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| io_err(parent, source))?;
        }
        fs::write(&path, &file.content).map_err(|source| io_err(&path, source))?;
        info!("stub generated: {}", file.path);
        Ok(StubOutcome::Written(path))
    }
}

fn io_err(path: &Path, source: std::io::Error) -> StubError {
    StubError::Io {
        path: path.to_path_buf(),
        source,
    }
}
