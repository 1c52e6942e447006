//! Commands exercised against seeded SQLite way databases.

use super::helpers::{SEED_JSON, Workspace, way_document};
use super::*;
use crate::edit::{EditAction, ParseConfig, apply, parse};
use crate::import::{ImportConfig, import, load_seed};
use crate::query::{QueryConfig, bbox, relations};
use mapedit_core::{EditSettings, GeometryError, Precondition, ProtocolError, WayAction, WayEditor};
use mapedit_data::{IngestError, ParseMode};
use rstest::rstest;

#[rstest]
fn parse_prints_the_candidate_way() {
    let workspace = Workspace::new();
    let config = ParseConfig {
        document: workspace.write("way.osm", &way_document(r#"id="9" changeset="1""#, &[3, 1])),
        mode: ParseMode::Create,
    };
    let way = parse(&config).expect("parse");
    assert_eq!(way.id, None);
    assert_eq!(way.nodes, vec![3, 1]);

    let mut buffer = Vec::new();
    write_json(&mut buffer, &way).expect("write json");
    let printed: serde_json::Value = serde_json::from_slice(&buffer).expect("json output");
    assert_eq!(printed["changeset_id"], 1);
    assert_eq!(printed["tags"]["highway"], "footway");
}

#[rstest]
fn parse_surfaces_document_errors() {
    let workspace = Workspace::new();
    let config = ParseConfig {
        document: workspace.write("way.osm", "<osm/>"),
        mode: ParseMode::Create,
    };
    assert!(matches!(
        parse(&config),
        Err(CliError::Ingest(IngestError::MissingWay))
    ));
}

#[rstest]
fn imported_ways_start_their_history() {
    let workspace = Workspace::new();
    let database = workspace.seeded_database();
    let store = open_store(&database).expect("open seeded database");
    let editor = WayEditor::new(store, EditSettings::default());
    let current = editor.current(1).expect("load").expect("seeded way");
    assert_eq!(current.version, 1);
    assert_eq!(current.nodes, vec![1, 2, 3]);
    let history = editor.history(1).expect("history");
    assert_eq!(
        history.first().map(|entry| entry.action),
        Some(WayAction::Create)
    );
}

#[rstest]
fn import_counts_every_section() {
    let workspace = Workspace::new();
    let config = ImportConfig {
        seed: workspace.write("seed.json", SEED_JSON),
        database: workspace.path("nested/map.sqlite"),
    };
    let report = import(&config).expect("import");
    assert_eq!(report.nodes, 4);
    assert_eq!(report.changesets, 2);
    assert_eq!(report.relations, 1);
    assert_eq!(report.ways, vec![1]);
}

#[rstest]
fn unknown_seed_sections_are_rejected() {
    let workspace = Workspace::new();
    let path = workspace.write("seed.json", r#"{"points": []}"#);
    assert!(matches!(load_seed(&path), Err(CliError::ParseSeed { .. })));
}

#[rstest]
fn apply_create_allocates_past_imported_ids() {
    let workspace = Workspace::new();
    let database = workspace.seeded_database();
    let config = workspace.apply_config(
        &way_document(r#"changeset="1""#, &[1, 2, 3, 1]),
        &database,
        EditAction::Create,
    );
    let way = apply(&config).expect("create");
    assert_eq!(way.id, Some(2));
    assert_eq!(way.version, 1);
    assert!(way.visible);
}

#[rstest]
fn apply_modify_bumps_the_version() {
    let workspace = Workspace::new();
    let database = workspace.seeded_database();
    let config = workspace.apply_config(
        &way_document(r#"id="1" version="1" changeset="1""#, &[3, 2]),
        &database,
        EditAction::Modify,
    );
    let way = apply(&config).expect("modify");
    assert_eq!(way.version, 2);
    assert_eq!(way.nodes, vec![3, 2]);
}

#[rstest]
fn apply_modify_with_stale_version_is_refused() {
    let workspace = Workspace::new();
    let database = workspace.seeded_database();
    let config = workspace.apply_config(
        &way_document(r#"id="1" version="3" changeset="1""#, &[3, 2]),
        &database,
        EditAction::Modify,
    );
    match apply(&config) {
        Err(CliError::Protocol(ProtocolError::VersionMismatch {
            provided, server, ..
        })) => {
            assert_eq!(provided, 3);
            assert_eq!(server, 1);
        }
        other => panic!("expected VersionMismatch, found {other:?}"),
    }
}

#[rstest]
fn apply_modify_rejects_deleted_nodes() {
    let workspace = Workspace::new();
    let database = workspace.seeded_database();
    let config = workspace.apply_config(
        &way_document(r#"id="1" version="1" changeset="1""#, &[1, 4]),
        &database,
        EditAction::Modify,
    );
    assert!(matches!(
        apply(&config),
        Err(CliError::Protocol(ProtocolError::PreconditionFailed(
            Precondition::NodesUnavailable { .. }
        )))
    ));
}

#[rstest]
fn apply_delete_respects_relation_membership() {
    let workspace = Workspace::new();
    let database = workspace.seeded_database();
    let document = way_document(r#"id="1" version="1" changeset="1""#, &[]);

    let blocked = workspace.apply_config(&document, &database, EditAction::Delete);
    assert!(matches!(
        apply(&blocked),
        Err(CliError::Protocol(ProtocolError::PreconditionFailed(
            Precondition::StillUsedByRelations { .. }
        )))
    ));

    let mut permitted = workspace.apply_config(&document, &database, EditAction::Delete);
    permitted.settings = permitted.settings.with_orphaned_members(true);
    let way = apply(&permitted).expect("delete");
    assert!(!way.visible);
    assert!(way.nodes.is_empty());
}

#[rstest]
fn apply_under_a_closed_changeset_is_refused() {
    let workspace = Workspace::new();
    let database = workspace.seeded_database();
    let config = workspace.apply_config(
        &way_document(r#"changeset="2""#, &[1, 2]),
        &database,
        EditAction::Create,
    );
    assert!(matches!(
        apply(&config),
        Err(CliError::Protocol(ProtocolError::ChangesetAlreadyClosed { .. }))
    ));
}

#[rstest]
fn bbox_covers_the_seeded_way() {
    let workspace = Workspace::new();
    let config = QueryConfig {
        way_id: 1,
        database: workspace.seeded_database(),
    };
    let report = bbox(&config).expect("bbox");
    assert_eq!(report.way_id, 1);
    assert_eq!(report.min_lon, -0.13);
    assert_eq!(report.max_lat, 51.51);
}

#[rstest]
fn bbox_of_unknown_way_fails() {
    let workspace = Workspace::new();
    let config = QueryConfig {
        way_id: 99,
        database: workspace.seeded_database(),
    };
    assert!(matches!(
        bbox(&config),
        Err(CliError::Geometry(GeometryError::UnknownWay { way_id: 99 }))
    ));
}

#[rstest]
fn relations_lists_back_references() {
    let workspace = Workspace::new();
    let config = QueryConfig {
        way_id: 1,
        database: workspace.seeded_database(),
    };
    let report = relations(&config).expect("relations");
    let ids: Vec<_> = report.relations.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![10]);
    assert_eq!(report.members.len(), 1);
    assert_eq!(
        report.members.first().map(|member| member.role.as_str()),
        Some("outer")
    );
}

#[rstest]
fn query_commands_require_an_existing_database() {
    let workspace = Workspace::new();
    let config = QueryConfig {
        way_id: 1,
        database: workspace.path("missing.sqlite"),
    };
    assert!(matches!(relations(&config), Err(CliError::MissingSourceFile { .. })));
}
