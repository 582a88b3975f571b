//! Merges handler metadata into one document per configured API.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use log::{debug, error, info, warn};

use crate::config::{DocumentSettings, DuplicatePolicy, RoutedocConfig};
use crate::document::{Components, Document, PathItem};
use crate::error::BuildError;
use crate::handlers::{CollectedGroup, HandlerRegistry};
use crate::registry::DocumentRegistry;
use crate::route_table::RouteCache;

/// Outcome of a multi-document run.
#[derive(Debug, Default)]
pub struct Generated {
    pub documents: IndexMap<String, Arc<Document>>,
    /// Builds that failed; they never stop the remaining APIs from building.
    pub failures: IndexMap<String, BuildError>,
}

impl Generated {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Builds and caches documents from settings, handler metadata and routes.
///
/// Builds run under a lock, so each API name is assembled at most once even
/// with concurrent callers.
#[derive(Debug)]
pub struct Aggregator {
    docs: IndexMap<String, DocumentSettings>,
    handlers: HandlerRegistry,
    routes: RouteCache,
    policy: DuplicatePolicy,
    registry: Mutex<DocumentRegistry>,
}

impl Aggregator {
    pub fn new(
        docs: IndexMap<String, DocumentSettings>,
        handlers: HandlerRegistry,
        routes: RouteCache,
    ) -> Self {
        Self {
            docs,
            handlers,
            routes,
            policy: DuplicatePolicy::default(),
            registry: Mutex::new(DocumentRegistry::new()),
        }
    }

    pub fn from_config(
        config: &RoutedocConfig,
        handlers: HandlerRegistry,
        routes: RouteCache,
    ) -> Self {
        Self::new(config.docs.clone(), handlers, routes).with_policy(config.duplicate_policy)
    }

    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn routes(&self) -> &RouteCache {
        &self.routes
    }

    /// Build the document for `api`, or return the one already built.
    pub fn build_document(&self, api: &str) -> Result<Arc<Document>, BuildError> {
        let mut registry = self.lock_registry();
        if let Some(doc) = registry.document(api) {
            return Ok(doc);
        }

        let settings = self
            .docs
            .get(api)
            .ok_or_else(|| BuildError::UnknownApi(api.to_string()))?;
        let root = settings
            .root_handler_group
            .as_deref()
            .ok_or_else(|| BuildError::MissingRootHandlerGroup(api.to_string()))?;

        let mut doc = Document::seed(settings)?;
        let mut owned = Vec::new();

        for group in self.handlers.collect(root) {
            let Some(fragment) = group.fragment else {
                continue;
            };

            let paths = self.group_paths(&group)?;
            for (path, item) in paths {
                if doc.paths.contains_key(&path) {
                    self.duplicate(BuildError::DuplicatePath {
                        api: api.to_string(),
                        path: path.clone(),
                        group: group.name.to_string(),
                    })?;
                }
                doc.paths.insert(path, item);
            }

            doc.tags.push(group.tag());

            self.merge_components(api, &group, &mut doc.components, &fragment.components)?;

            owned.push(group.path);
        }

        doc.finalize();

        for path in owned {
            registry.record_path(path, api);
        }
        info!(
            "built `{}`: {} paths, {} tags",
            api,
            doc.paths.len(),
            doc.tags.len()
        );
        Ok(registry.publish(api, doc))
    }

    /// Build one document when `only` is given, otherwise every configured one.
    pub fn generate_all(&self, only: Option<&str>) -> Generated {
        let names: Vec<String> = match only {
            Some(name) => vec![name.to_string()],
            None => self.docs.keys().cloned().collect(),
        };

        let mut generated = Generated::default();
        for name in names {
            match self.build_document(&name) {
                Ok(doc) => {
                    generated.documents.insert(name, doc);
                }
                Err(e) => {
                    error!("failed to build `{name}`: {e}");
                    generated.failures.insert(name, e);
                }
            }
        }
        generated
    }

    /// The API whose document includes the given handler path.
    pub fn owner_of(&self, handler_path: &str) -> Option<String> {
        self.lock_registry().owner_of(handler_path).map(str::to_string)
    }

    /// Snapshot of the handler path → API index.
    pub fn path_index(&self) -> IndexMap<String, String> {
        self.lock_registry().path_index().clone()
    }

    /// Drop cached documents, the path index and the parsed routes.
    pub fn reset(&self) {
        self.lock_registry().reset();
        self.routes.reset();
    }

    fn lock_registry(&self) -> MutexGuard<'_, DocumentRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// A group's own paths: explicit operations first, then action-documented
    /// operations placed through the route table.
    fn group_paths(
        &self,
        group: &CollectedGroup<'_>,
    ) -> Result<IndexMap<String, PathItem>, BuildError> {
        let Some(fragment) = group.fragment else {
            return Ok(IndexMap::new());
        };

        let mut paths = fragment.operations.clone();
        if fragment.actions.is_empty() {
            return Ok(paths);
        }

        let table = self.routes.table()?;
        for (action, operation) in &fragment.actions {
            match table.verb_and_path_of(group.path, action) {
                Some((path, verb)) => {
                    paths
                        .entry(path.to_string())
                        .or_default()
                        .insert(verb.to_string(), operation.clone());
                }
                None => warn!("no route for {}#{}, operation skipped", group.path, action),
            }
        }

        for action in table.actions_of(group.path) {
            if !fragment.actions.contains_key(action) {
                debug!("{}#{} is routed but undocumented", group.path, action);
            }
        }

        Ok(paths)
    }

    /// Merge entry by entry inside each section. A group's `schemas` adds to
    /// the section built so far rather than replacing it as a whole.
    fn merge_components(
        &self,
        api: &str,
        group: &CollectedGroup<'_>,
        target: &mut Components,
        source: &Components,
    ) -> Result<(), BuildError> {
        for (section, entries) in source {
            let merged = target.entry(section.clone()).or_default();
            for (name, value) in entries {
                if merged.contains_key(name) {
                    self.duplicate(BuildError::DuplicateComponent {
                        api: api.to_string(),
                        section: section.clone(),
                        name: name.clone(),
                        group: group.name.to_string(),
                    })?;
                }
                merged.insert(name.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Apply the duplicate policy to a detected collision.
    fn duplicate(&self, collision: BuildError) -> Result<(), BuildError> {
        match self.policy {
            DuplicatePolicy::Overwrite => {
                debug!("{collision}, overwriting");
                Ok(())
            }
            DuplicatePolicy::Warn => {
                warn!("{collision}, overwriting");
                Ok(())
            }
            DuplicatePolicy::Reject => Err(collision),
        }
    }
}
