use std::sync::Arc;

use indexmap::IndexMap;

use crate::document::Document;

/// Build-once document cache plus the reverse index from handler path to the
/// API that owns it.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    documents: IndexMap<String, Arc<Document>>,
    path_index: IndexMap<String, String>,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document(&self, api: &str) -> Option<Arc<Document>> {
        self.documents.get(api).cloned()
    }

    /// Store a document unless one is already cached under `api`; either way
    /// the cached document is returned.
    pub fn publish(&mut self, api: &str, document: Document) -> Arc<Document> {
        Arc::clone(
            self.documents
                .entry(api.to_string())
                .or_insert_with(|| Arc::new(document)),
        )
    }

    pub fn record_path(&mut self, handler_path: &str, api: &str) {
        self.path_index
            .insert(handler_path.to_string(), api.to_string());
    }

    /// The API whose document includes the given handler path.
    pub fn owner_of(&self, handler_path: &str) -> Option<&str> {
        self.path_index.get(handler_path).map(String::as_str)
    }

    pub fn path_index(&self) -> &IndexMap<String, String> {
        &self.path_index
    }

    pub fn reset(&mut self) {
        self.documents.clear();
        self.path_index.clear();
    }
}
