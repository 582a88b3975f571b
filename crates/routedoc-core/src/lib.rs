pub mod aggregate;
pub mod config;
pub mod document;
pub mod error;
pub mod fragment;
pub mod handlers;
pub mod path_template;
pub mod registry;
pub mod route_table;
pub mod security;

pub use aggregate::{Aggregator, Generated};
pub use document::Document;
pub use fragment::MetadataFragment;
pub use handlers::{HandlerGroup, HandlerRegistry};
pub use route_table::{RouteCache, RouteRecord, RouteTable};

/// A file to be written, with path relative to an output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}
