//! Parsing of the framework's tabular route listing.
//!
//! A dump looks like:
//!
//! ```text
//!          Prefix Verb   URI Pattern                        Controller#Action
//! api_v1_examples GET    /api/v1/examples(.:format)         api/v1/examples#index
//!                 POST   /api/v1/examples(.:format)         api/v1/examples#create
//!  api_v1_example GET    /api/v1/examples/:id(.:format)     api/v1/examples#show
//! ```
//!
//! The header line is dropped; lines that do not carry a verb, a path and a
//! `group#action` target are skipped.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use indexmap::IndexMap;
use log::debug;
use regex::Regex;
use serde::Serialize;

use crate::error::RouteSourceError;
use crate::path_template;

static ROUTE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:\S+\s+)??(?P<verbs>[A-Z]+(?:\|[A-Z]+)*)\s+(?P<path>/\S*)\s+(?P<group>[^\s#]+)#(?P<action>\S+)",
    )
    .expect("route line pattern is valid")
});

/// One route: HTTP verb and path template bound to a handler action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRecord {
    /// Lower-case verb, e.g. `get`.
    pub http_verb: String,
    pub path_template: String,
    pub handler_group: String,
    pub action: String,
}

/// Classification of a single dump line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// One record per verb listed on the line.
    Routes(Vec<RouteRecord>),
    Skipped,
}

/// Parse a single line of the route dump.
pub fn parse_line(line: &str) -> ParsedLine {
    let Some(caps) = ROUTE_LINE.captures(line) else {
        return ParsedLine::Skipped;
    };

    let path_template = path_template::normalize(&caps["path"]);
    let handler_group = &caps["group"];
    let action = &caps["action"];

    let records = caps["verbs"]
        .split('|')
        .map(|verb| RouteRecord {
            http_verb: verb.to_lowercase(),
            path_template: path_template.clone(),
            handler_group: handler_group.to_string(),
            action: action.to_string(),
        })
        .collect();

    ParsedLine::Routes(records)
}

/// Route records grouped by handler group, in dump order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteTable {
    groups: IndexMap<String, Vec<RouteRecord>>,
}

impl RouteTable {
    /// Parse a full route dump. The first line is a header and is ignored.
    pub fn parse(dump: &str) -> Self {
        let mut groups: IndexMap<String, Vec<RouteRecord>> = IndexMap::new();

        for (lineno, line) in dump.lines().enumerate().skip(1) {
            match parse_line(line) {
                ParsedLine::Routes(records) => {
                    for record in records {
                        groups
                            .entry(record.handler_group.clone())
                            .or_default()
                            .push(record);
                    }
                }
                ParsedLine::Skipped => {
                    debug!("route dump line {} skipped: {:?}", lineno + 1, line.trim());
                }
            }
        }

        Self { groups }
    }

    /// Records of one handler group, empty when the group has no routes.
    pub fn routes_of(&self, handler_group: &str) -> &[RouteRecord] {
        self.groups
            .get(handler_group)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Action names routed to a handler group, in dump order.
    pub fn actions_of(&self, handler_group: &str) -> Vec<&str> {
        self.routes_of(handler_group)
            .iter()
            .map(|r| r.action.as_str())
            .collect()
    }

    /// `(path_template, http_verb)` of an action. The first registered route wins.
    pub fn verb_and_path_of(&self, handler_group: &str, action: &str) -> Option<(&str, &str)> {
        self.routes_of(handler_group)
            .iter()
            .find(|r| r.action == action)
            .map(|r| (r.path_template.as_str(), r.http_verb.as_str()))
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[RouteRecord])> {
        self.groups.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Total number of records across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Where the raw routing dump comes from.
pub trait RouteSource: Send + Sync {
    fn load(&self) -> Result<String, RouteSourceError>;
}

/// An in-memory dump.
#[derive(Debug, Clone, Default)]
pub struct StaticRoutes(pub String);

impl RouteSource for StaticRoutes {
    fn load(&self) -> Result<String, RouteSourceError> {
        Ok(self.0.clone())
    }
}

/// A dump saved to disk, e.g. `rails routes > routes.txt`.
#[derive(Debug, Clone)]
pub struct FileRoutes {
    pub path: PathBuf,
}

impl FileRoutes {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RouteSource for FileRoutes {
    fn load(&self) -> Result<String, RouteSourceError> {
        fs::read_to_string(&self.path).map_err(|source| RouteSourceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

/// Memoizes the parsed table: the source is read and parsed at most once
/// until [`RouteCache::reset`].
pub struct RouteCache {
    source: Box<dyn RouteSource>,
    table: Mutex<Option<Arc<RouteTable>>>,
}

impl RouteCache {
    pub fn new(source: impl RouteSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            table: Mutex::new(None),
        }
    }

    /// A cache over an empty dump; every action lookup misses.
    pub fn empty() -> Self {
        Self::new(StaticRoutes::default())
    }

    /// The parsed table, loading it on first access.
    pub fn table(&self) -> Result<Arc<RouteTable>, RouteSourceError> {
        let mut slot = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(table) = slot.as_ref() {
            return Ok(Arc::clone(table));
        }

        let dump = self.source.load()?;
        let table = Arc::new(RouteTable::parse(&dump));
        debug!(
            "parsed {} routes across {} handler groups",
            table.len(),
            table.groups.len()
        );
        *slot = Some(Arc::clone(&table));
        Ok(table)
    }

    pub fn is_loaded(&self) -> bool {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Forget the parsed table; the next access reloads the source.
    pub fn reset(&self) {
        *self.table.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl std::fmt::Debug for RouteCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteCache")
            .field("loaded", &self.is_loaded())
            .finish()
    }
}
