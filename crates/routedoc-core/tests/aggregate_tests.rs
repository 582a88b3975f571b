use std::sync::Arc;

use indexmap::IndexMap;
use routedoc_core::config::{DocumentSettings, DuplicatePolicy};
use routedoc_core::document::{Info, Server, Tag};
use routedoc_core::error::BuildError;
use routedoc_core::route_table::StaticRoutes;
use routedoc_core::security::{self, ApiKeyLocation, SecurityScheme};
use routedoc_core::{Aggregator, HandlerGroup, HandlerRegistry, MetadataFragment, RouteCache};
use serde_json::json;

const ROUTES: &str = include_str!("fixtures/routes.txt");
const HANDLERS: &str = include_str!("fixtures/handlers.yaml");

fn settings(title: &str, root: &str) -> DocumentSettings {
    DocumentSettings::new(Info::new(title, "1.0.0")).with_root(root)
}

fn single(settings: DocumentSettings, groups: Vec<HandlerGroup>) -> Aggregator {
    let mut docs = IndexMap::new();
    docs.insert("api".to_string(), settings);
    Aggregator::new(docs, groups.into_iter().collect(), RouteCache::empty())
}

fn group(name: &str, fragment: MetadataFragment) -> HandlerGroup {
    HandlerGroup::new(name, name.to_lowercase())
        .with_parent("Root")
        .with_metadata(fragment)
}

fn fixture_aggregator() -> Aggregator {
    let mut v1 = settings("V1", "Api::V1::BaseController");
    v1.servers.push(Server::new("http://localhost:3000"));
    v1.global_security.push(security::requirement("ApiKeyAuth", &[]));
    v1.global_security_schemes.insert(
        "ApiKeyAuth".to_string(),
        SecurityScheme::api_key("server_token", ApiKeyLocation::Query),
    );

    let mut docs = IndexMap::new();
    docs.insert("v1".to_string(), v1);
    docs.insert("admin".to_string(), settings("Admin", "Admin::BaseController"));

    let handlers = HandlerRegistry::from_yaml(HANDLERS).unwrap();
    Aggregator::new(docs, handlers, RouteCache::new(StaticRoutes(ROUTES.to_string())))
}

#[test]
fn single_group_scenario() {
    let mut s = DocumentSettings::new(Info {
        title: "T".to_string(),
        ..Info::default()
    })
    .with_root("Root");
    s.global_security = Vec::new();

    let agg = single(
        s,
        vec![group(
            "X",
            MetadataFragment::new(Tag::new("X")).with_operation("/x", "get", json!({"summary": "x"})),
        )],
    );
    let doc = agg.build_document("api").unwrap();
    let value = serde_json::to_value(&*doc).unwrap();

    assert_eq!(value["paths"], json!({"/x": {"get": {"summary": "x"}}}));
    assert_eq!(value["tags"], json!([{"name": "X"}]));
    assert!(value.get("components").is_none());
    assert!(value.get("security").is_none());
    assert!(value.get("servers").is_none());
}

#[test]
fn duplicate_path_last_processed_wins() {
    let agg = single(
        settings("T", "Root"),
        vec![
            group(
                "A",
                MetadataFragment::new(Tag::new("A")).with_operation("/dup", "get", json!({"from": "A"})),
            ),
            group(
                "B",
                MetadataFragment::new(Tag::new("B")).with_operation("/dup", "post", json!({"from": "B"})),
            ),
        ],
    );
    let doc = agg.build_document("api").unwrap();
    assert_eq!(doc.paths.len(), 1);
    assert_eq!(doc.paths["/dup"].keys().collect::<Vec<_>>(), vec!["post"]);
    assert_eq!(doc.operation("/dup", "post"), Some(&json!({"from": "B"})));
}

#[test]
fn reject_policy_fails_on_duplicate_path() {
    let agg = single(
        settings("T", "Root"),
        vec![
            group("A", MetadataFragment::new(Tag::new("A")).with_operation("/dup", "get", json!({}))),
            group("B", MetadataFragment::new(Tag::new("B")).with_operation("/dup", "get", json!({}))),
        ],
    )
    .with_policy(DuplicatePolicy::Reject);

    match agg.build_document("api") {
        Err(BuildError::DuplicatePath { path, group, .. }) => {
            assert_eq!(path, "/dup");
            assert_eq!(group, "B");
        }
        other => panic!("expected duplicate path error, got {other:?}"),
    }
}

#[test]
fn warn_policy_still_overwrites() {
    let agg = single(
        settings("T", "Root"),
        vec![
            group("A", MetadataFragment::new(Tag::new("A")).with_operation("/dup", "get", json!(1))),
            group("B", MetadataFragment::new(Tag::new("B")).with_operation("/dup", "get", json!(2))),
        ],
    )
    .with_policy(DuplicatePolicy::Warn);
    let doc = agg.build_document("api").unwrap();
    assert_eq!(doc.operation("/dup", "get"), Some(&json!(2)));
}

#[test]
fn tags_and_paths_are_sorted() {
    let agg = single(
        settings("T", "Root"),
        vec![
            group("Zeta", MetadataFragment::new(Tag::new("zeta")).with_operation("/z", "get", json!({}))),
            group("Alpha", MetadataFragment::new(Tag::new("alpha")).with_operation("/b", "get", json!({}))),
            group("Mid", MetadataFragment::new(Tag::new("mid")).with_operation("/a/{id}", "get", json!({}))),
        ],
    );
    let doc = agg.build_document("api").unwrap();
    assert_eq!(doc.tag_names(), vec!["alpha", "mid", "zeta"]);
    assert_eq!(doc.paths.keys().collect::<Vec<_>>(), vec!["/a/{id}", "/b", "/z"]);
}

#[test]
fn equal_tag_names_keep_first_processed() {
    let agg = single(
        settings("T", "Root"),
        vec![
            group("A", MetadataFragment::new(Tag::new("Shared").with_description("from A"))),
            group("B", MetadataFragment::new(Tag::new("Shared").with_description("from B"))),
        ],
    );
    let doc = agg.build_document("api").unwrap();
    assert_eq!(doc.tags.len(), 1);
    assert_eq!(doc.tags[0].description.as_deref(), Some("from A"));
}

#[test]
fn build_is_idempotent() {
    let agg = single(
        settings("T", "Root"),
        vec![group("X", MetadataFragment::new(Tag::new("X")))],
    );
    let first = agg.build_document("api").unwrap();
    let second = agg.build_document("api").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second.tags.len(), 1);
}

#[test]
fn reset_allows_rebuild() {
    let agg = single(
        settings("T", "Root"),
        vec![group("X", MetadataFragment::new(Tag::new("X")))],
    );
    let first = agg.build_document("api").unwrap();
    agg.reset();
    assert!(agg.owner_of("x").is_none());

    let rebuilt = agg.build_document("api").unwrap();
    assert!(!Arc::ptr_eq(&first, &rebuilt));
    assert_eq!(*first, *rebuilt);
}

#[test]
fn concurrent_builds_share_one_document() {
    let agg = single(
        settings("T", "Root"),
        vec![group("X", MetadataFragment::new(Tag::new("X")))],
    );
    let docs: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| s.spawn(|| agg.build_document("api").unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert!(docs.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}

#[test]
fn unknown_api_and_missing_root_are_errors() {
    let mut docs = IndexMap::new();
    docs.insert(
        "rootless".to_string(),
        DocumentSettings::new(Info::new("R", "1")),
    );
    let agg = Aggregator::new(docs, HandlerRegistry::new(), RouteCache::empty());

    assert!(matches!(
        agg.build_document("nope"),
        Err(BuildError::UnknownApi(name)) if name == "nope"
    ));
    assert!(matches!(
        agg.build_document("rootless"),
        Err(BuildError::MissingRootHandlerGroup(_))
    ));
}

#[test]
fn actions_are_placed_through_routes() {
    let agg = fixture_aggregator();
    let doc = agg.build_document("v1").unwrap();

    assert_eq!(
        doc.paths.keys().collect::<Vec<_>>(),
        vec!["/api/v1/examples", "/api/v1/examples/{id}", "/api/v1/ping"]
    );
    assert_eq!(
        doc.paths["/api/v1/examples/{id}"].keys().collect::<Vec<_>>(),
        vec!["get", "patch"]
    );
    assert_eq!(
        doc.operation("/api/v1/examples", "get").unwrap()["summary"],
        "List examples"
    );
    // `archive` has no route and is dropped.
    assert!(doc
        .paths
        .values()
        .flat_map(|item| item.values())
        .all(|op| op["summary"] != "Not routed"));
}

#[test]
fn fixture_document_sections() {
    let agg = fixture_aggregator();
    let doc = agg.build_document("v1").unwrap();

    assert_eq!(doc.tag_names(), vec!["Examples", "Health"]);
    assert!(doc.schema("Example").is_some());
    assert!(doc.components["securitySchemes"].contains_key("ApiKeyAuth"));
    assert_eq!(doc.security.len(), 1);
    assert_eq!(doc.servers[0].url, "http://localhost:3000");
}

#[test]
fn documents_do_not_cross_contaminate() {
    let agg = fixture_aggregator();
    let generated = agg.generate_all(None);
    assert!(generated.is_success());
    assert_eq!(
        generated.documents.keys().collect::<Vec<_>>(),
        vec!["v1", "admin"]
    );

    let admin = &generated.documents["admin"];
    assert_eq!(admin.tag_names(), vec!["Admin Users"]);
    assert_eq!(admin.paths.keys().collect::<Vec<_>>(), vec!["/admin/users"]);
    assert!(!admin.components.contains_key("schemas"));

    let v1 = &generated.documents["v1"];
    assert!(!v1.paths.contains_key("/admin/users"));
}

#[test]
fn path_index_tracks_contributing_groups() {
    let agg = fixture_aggregator();
    agg.generate_all(None);

    assert_eq!(agg.owner_of("api/v1/examples").as_deref(), Some("v1"));
    assert_eq!(agg.owner_of("api/v1/health").as_deref(), Some("v1"));
    assert_eq!(agg.owner_of("admin/users").as_deref(), Some("admin"));
    // No metadata, no index entry.
    assert!(agg.owner_of("api/v1/user_posts").is_none());
    assert!(agg.owner_of("api/v1/base").is_none());
    assert_eq!(agg.path_index().len(), 3);
}

#[test]
fn routes_are_loaded_lazily() {
    let agg = fixture_aggregator();
    agg.build_document("admin").unwrap();
    assert!(!agg.routes().is_loaded());

    agg.build_document("v1").unwrap();
    assert!(agg.routes().is_loaded());
}

#[test]
fn one_failure_does_not_stop_the_run() {
    let mut docs = IndexMap::new();
    docs.insert("broken".to_string(), DocumentSettings::new(Info::new("B", "1")));
    docs.insert("ok".to_string(), settings("OK", "Root"));
    let agg = Aggregator::new(
        docs,
        [group("X", MetadataFragment::new(Tag::new("X")))]
            .into_iter()
            .collect(),
        RouteCache::empty(),
    );

    let generated = agg.generate_all(None);
    assert!(!generated.is_success());
    assert!(generated.failures.contains_key("broken"));
    assert!(generated.documents.contains_key("ok"));
}

#[test]
fn generate_only_named_api() {
    let agg = fixture_aggregator();
    let generated = agg.generate_all(Some("admin"));
    assert_eq!(generated.documents.keys().collect::<Vec<_>>(), vec!["admin"]);

    let missing = agg.generate_all(Some("v2"));
    assert!(matches!(
        missing.failures.get("v2"),
        Some(BuildError::UnknownApi(_))
    ));
}

#[test]
fn serialized_document_shape() {
    let mut s = settings("Pets", "Root");
    s.servers.push(Server::new("http://localhost:3000"));
    s.global_security.push(security::requirement("ApiKeyAuth", &[]));
    s.global_security_schemes.insert(
        "ApiKeyAuth".to_string(),
        SecurityScheme::api_key("X-Api-Key", ApiKeyLocation::Header),
    );
    let agg = single(
        s,
        vec![group(
            "Pets",
            MetadataFragment::new(Tag::new("Pets"))
                .with_operation("/pets", "get", json!({"summary": "List pets"}))
                .with_schema("Pet", json!({"type": "object"})),
        )],
    );
    let doc = agg.build_document("api").unwrap();

    insta::assert_snapshot!(serde_json::to_string_pretty(&*doc).unwrap(), @r#"
    {
      "openapi": "3.0.0",
      "info": {
        "title": "Pets",
        "version": "1.0.0"
      },
      "servers": [
        {
          "url": "http://localhost:3000"
        }
      ],
      "security": [
        {
          "ApiKeyAuth": []
        }
      ],
      "tags": [
        {
          "name": "Pets"
        }
      ],
      "paths": {
        "/pets": {
          "get": {
            "summary": "List pets"
          }
        }
      },
      "components": {
        "securitySchemes": {
          "ApiKeyAuth": {
            "type": "apiKey",
            "name": "X-Api-Key",
            "in": "header"
          }
        },
        "schemas": {
          "Pet": {
            "type": "object"
          }
        }
      }
    }
    "#);
}
