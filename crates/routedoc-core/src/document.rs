use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::DocumentSettings;
use crate::security::SecurityRequirement;

/// OpenAPI version written into every generated document.
pub const OPENAPI_VERSION: &str = "3.0.0";

/// Operations on one path, keyed by lower-case HTTP verb.
///
/// Operation bodies are opaque: they are assembled, never validated.
pub type PathItem = IndexMap<String, serde_json::Value>;

/// Named entries of one components section (`schemas`, `parameters`, ...).
pub type ComponentSection = IndexMap<String, serde_json::Value>;

/// Components keyed by section name.
pub type Components = IndexMap<String, ComponentSection>;

pub const SCHEMAS: &str = "schemas";
pub const SECURITY_SCHEMES: &str = "securitySchemes";

/// Info object describing the API.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    #[serde(rename = "termsOfService", skip_serializing_if = "Option::is_none")]
    pub terms_of_service: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<Contact>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<License>,
}

impl Info {
    pub fn new(title: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            version: version.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct License {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Tag grouping the operations of one handler group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerVariable {
    pub default: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub variables: IndexMap<String, ServerVariable>,
}

impl Server {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            description: None,
            variables: IndexMap::new(),
        }
    }
}

/// One assembled API description, built once per API name.
///
/// Empty sections are left out of the serialized form, so a document with no
/// global security has no `security` key at all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub openapi: String,

    pub info: Info,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, PathItem>,

    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub components: Components,
}

impl Document {
    /// Start a document from static settings: info, servers, global security and
    /// a components shell holding the configured security schemes.
    pub fn seed(settings: &DocumentSettings) -> Result<Self, serde_json::Error> {
        let mut security_schemes = ComponentSection::new();
        for (name, scheme) in &settings.global_security_schemes {
            security_schemes.insert(name.clone(), serde_json::to_value(scheme)?);
        }

        let mut components = Components::new();
        components.insert(SECURITY_SCHEMES.to_string(), security_schemes);
        components.insert(SCHEMAS.to_string(), ComponentSection::new());

        Ok(Self {
            openapi: OPENAPI_VERSION.to_string(),
            info: settings.info.clone(),
            servers: settings.servers.clone(),
            security: settings.global_security.clone(),
            tags: Vec::new(),
            paths: IndexMap::new(),
            components,
        })
    }

    /// Drop empty component sections, sort tags by name keeping the first of
    /// each name, and sort paths by key.
    pub fn finalize(&mut self) {
        self.components.retain(|_, section| !section.is_empty());

        // `sort_by` is stable, so the earliest tag of a name survives dedup.
        self.tags.sort_by(|a, b| a.name.cmp(&b.name));
        self.tags.dedup_by(|later, earlier| later.name == earlier.name);

        self.paths.sort_keys();
    }

    /// Lookup of a single operation by path and verb.
    pub fn operation(&self, path: &str, verb: &str) -> Option<&serde_json::Value> {
        self.paths.get(path)?.get(verb)
    }

    pub fn schema(&self, name: &str) -> Option<&serde_json::Value> {
        self.components.get(SCHEMAS)?.get(name)
    }

    /// Names of all tags, in document order.
    pub fn tag_names(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.name.as_str()).collect()
    }
}
