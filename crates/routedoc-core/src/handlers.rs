//! Explicit registry of handler groups and the collector that walks it.
//!
//! Handler groups register themselves together with the name of the group they
//! derive from; a document's root group selects every group whose ancestry
//! reaches it.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use heck::ToTitleCase;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::document::Tag;
use crate::error::ManifestError;
use crate::fragment::MetadataFragment;

/// A request-handling unit (controller) and the metadata it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerGroup {
    /// Type identifier, e.g. `Api::V1::ExamplesController`.
    pub name: String,

    /// Identifier of the group this one derives from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,

    /// Routing identifier, e.g. `api/v1/examples`.
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataFragment>,
}

impl HandlerGroup {
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            path: path.into(),
            metadata: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_metadata(mut self, metadata: MetadataFragment) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A group selected by [`HandlerRegistry::collect`].
#[derive(Debug, Clone, Copy)]
pub struct CollectedGroup<'a> {
    pub name: &'a str,
    pub path: &'a str,
    pub fragment: Option<&'a MetadataFragment>,
}

impl CollectedGroup<'_> {
    /// The fragment's tag, or one named after the last path segment
    /// (`api/v1/user_posts` → `User Posts`).
    pub fn tag(&self) -> Tag {
        if let Some(tag) = self.fragment.and_then(|f| f.tag.as_ref()) {
            return tag.clone();
        }
        let last = self.path.rsplit('/').next().unwrap_or(self.path);
        Tag::new(last.to_title_case())
    }
}

/// On-disk form of a registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HandlerManifest {
    #[serde(default)]
    pub handlers: Vec<HandlerGroup>,
}

#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    groups: Vec<HandlerGroup>,
    by_name: HashMap<String, usize>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group. Re-registering a name replaces the earlier entry in place.
    pub fn register(&mut self, group: HandlerGroup) {
        match self.by_name.get(&group.name) {
            Some(&idx) => {
                debug!("handler group {} re-registered", group.name);
                self.groups[idx] = group;
            }
            None => {
                self.by_name.insert(group.name.clone(), self.groups.len());
                self.groups.push(group);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&HandlerGroup> {
        self.by_name.get(name).map(|&idx| &self.groups[idx])
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every group descending from `root` (excluding `root` itself), in
    /// registration order.
    pub fn collect(&self, root: &str) -> Vec<CollectedGroup<'_>> {
        self.groups
            .iter()
            .filter(|group| self.descends_from(group, root))
            .map(|group| CollectedGroup {
                name: &group.name,
                path: &group.path,
                fragment: group.metadata.as_ref(),
            })
            .collect()
    }

    fn descends_from(&self, group: &HandlerGroup, root: &str) -> bool {
        let mut seen = HashSet::new();
        let mut current = group.parent.as_deref();

        while let Some(parent) = current {
            if parent == root {
                return true;
            }
            if !seen.insert(parent) {
                debug!("inheritance cycle through {parent}");
                return false;
            }
            current = self.get(parent).and_then(|g| g.parent.as_deref());
        }
        false
    }

    pub fn from_manifest(manifest: HandlerManifest) -> Self {
        let mut registry = Self::new();
        for group in manifest.handlers {
            registry.register(group);
        }
        registry
    }

    pub fn from_yaml(input: &str) -> Result<Self, ManifestError> {
        let manifest: HandlerManifest = serde_yaml_ng::from_str(input)?;
        Ok(Self::from_manifest(manifest))
    }

    pub fn from_json(input: &str) -> Result<Self, ManifestError> {
        let manifest: HandlerManifest = serde_json::from_str(input)?;
        Ok(Self::from_manifest(manifest))
    }

    /// Load a manifest file; `.json` files are read as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }
}

impl FromIterator<HandlerGroup> for HandlerRegistry {
    fn from_iter<I: IntoIterator<Item = HandlerGroup>>(iter: I) -> Self {
        let mut registry = Self::new();
        for group in iter {
            registry.register(group);
        }
        registry
    }
}
