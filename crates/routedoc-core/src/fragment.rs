use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::{Components, PathItem, Tag};

/// Metadata a handler group accumulates about itself before aggregation.
///
/// Operations can be documented either by path (`operations`) or by action
/// name (`actions`); the latter are placed at the path and verb the route
/// table assigns to the action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataFragment {
    /// Falls back to a name derived from the handler path when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub operations: IndexMap<String, PathItem>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub components: Components,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub actions: IndexMap<String, serde_json::Value>,
}

impl MetadataFragment {
    pub fn new(tag: Tag) -> Self {
        Self {
            tag: Some(tag),
            ..Self::default()
        }
    }

    /// Document an operation at an explicit path and verb.
    pub fn with_operation(
        mut self,
        path: impl Into<String>,
        verb: &str,
        operation: serde_json::Value,
    ) -> Self {
        self.operations
            .entry(path.into())
            .or_default()
            .insert(verb.to_lowercase(), operation);
        self
    }

    /// Document an operation by action name; its path comes from the route table.
    pub fn with_action(mut self, action: impl Into<String>, operation: serde_json::Value) -> Self {
        self.actions.insert(action.into(), operation);
        self
    }

    /// Add a named entry to a components section (`schemas`, `parameters`, ...).
    pub fn with_component(
        mut self,
        section: impl Into<String>,
        name: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.components
            .entry(section.into())
            .or_default()
            .insert(name.into(), value);
        self
    }

    pub fn with_schema(self, name: impl Into<String>, schema: serde_json::Value) -> Self {
        self.with_component(crate::document::SCHEMAS, name, schema)
    }
}
