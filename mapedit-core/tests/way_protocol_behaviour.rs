//! Behavioural tests for the way edit protocol.

use mapedit_core::test_support::{OPEN_CHANGESET, USER, seeded_store};
use mapedit_core::{
    EditSettings, MemoryMapStore, Precondition, ProtocolError, Relation, RelationMember, Way,
    WayAction, WayEditor,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use std::{cell::RefCell, fs, path::PathBuf};

type Outcome = RefCell<Option<Result<Way, ProtocolError>>>;

#[fixture]
fn editor() -> RefCell<WayEditor<MemoryMapStore>> {
    RefCell::new(WayEditor::new(seeded_store(), EditSettings::default()))
}

#[fixture]
fn stored_way() -> RefCell<Option<Way>> {
    RefCell::new(None)
}

#[fixture]
fn outcome() -> Outcome {
    RefCell::new(None)
}

fn candidate(nodes: &[u64]) -> Way {
    Way::new()
        .with_changeset(OPEN_CHANGESET)
        .with_nodes(nodes.iter().copied())
        .with_tag("highway", "footway")
}

fn stored(stored_way: &RefCell<Option<Way>>) -> Way {
    stored_way
        .borrow()
        .clone()
        .expect("a way should be stored first")
}

fn delete_stored(
    editor: &RefCell<WayEditor<MemoryMapStore>>,
    stored_way: &RefCell<Option<Way>>,
    outcome: &Outcome,
) {
    let way = stored(stored_way);
    let way_id = way.id.expect("stored way has an id");
    let result = editor.borrow_mut().delete_with_history(way_id, &way, USER);
    if let Ok(deleted) = &result {
        *stored_way.borrow_mut() = Some(deleted.clone());
    }
    *outcome.borrow_mut() = Some(result);
}

fn expect_error(outcome: &Outcome) -> ProtocolError {
    outcome
        .borrow_mut()
        .take()
        .expect("an edit was attempted")
        .expect_err("expected the edit to be refused")
}

#[given("an editor over the seeded map")]
fn seeded_editor(
    #[from(editor)] editor: &RefCell<WayEditor<MemoryMapStore>>,
    #[from(outcome)] outcome: &Outcome,
) {
    assert_eq!(editor.borrow().store().way_count(), 0);
    *outcome.borrow_mut() = None;
}

#[given("a stored way over nodes 1 and 2")]
fn stored_way_exists(
    #[from(editor)] editor: &RefCell<WayEditor<MemoryMapStore>>,
    #[from(stored_way)] stored_way: &RefCell<Option<Way>>,
) {
    let created = editor
        .borrow_mut()
        .create_with_history(&candidate(&[1, 2]), USER)
        .expect("seed way");
    *stored_way.borrow_mut() = Some(created);
}

#[given("a visible relation using the stored way")]
fn relation_uses_way(
    #[from(editor)] editor: &RefCell<WayEditor<MemoryMapStore>>,
    #[from(stored_way)] stored_way: &RefCell<Option<Way>>,
) {
    let way_id = stored(stored_way).id.expect("stored way has an id");
    editor
        .borrow_mut()
        .store_mut()
        .insert_relation(Relation::new(30), [RelationMember::way(30, way_id, 1)]);
}

#[when("I create a way over nodes 1, 2 and 3")]
fn create_three(
    #[from(editor)] editor: &RefCell<WayEditor<MemoryMapStore>>,
    #[from(stored_way)] stored_way: &RefCell<Option<Way>>,
    #[from(outcome)] outcome: &Outcome,
) {
    let result = editor
        .borrow_mut()
        .create_with_history(&candidate(&[1, 2, 3]), USER);
    if let Ok(created) = &result {
        *stored_way.borrow_mut() = Some(created.clone());
    }
    *outcome.borrow_mut() = Some(result);
}

#[when("I create a way over nodes 1 and 4")]
fn create_with_deleted_node(
    #[from(editor)] editor: &RefCell<WayEditor<MemoryMapStore>>,
    #[from(outcome)] outcome: &Outcome,
) {
    let result = editor
        .borrow_mut()
        .create_with_history(&candidate(&[1, 4]), USER);
    *outcome.borrow_mut() = Some(result);
}

#[when("I update the stored way claiming version 5")]
fn update_stale(
    #[from(editor)] editor: &RefCell<WayEditor<MemoryMapStore>>,
    #[from(stored_way)] stored_way: &RefCell<Option<Way>>,
    #[from(outcome)] outcome: &Outcome,
) {
    let way = stored(stored_way);
    let way_id = way.id.expect("stored way has an id");
    let result = editor
        .borrow_mut()
        .update_from(way_id, &way.with_version(5), USER);
    *outcome.borrow_mut() = Some(result);
}

#[when("I delete the stored way")]
fn delete_way(
    #[from(editor)] editor: &RefCell<WayEditor<MemoryMapStore>>,
    #[from(stored_way)] stored_way: &RefCell<Option<Way>>,
    #[from(outcome)] outcome: &Outcome,
) {
    delete_stored(editor, stored_way, outcome);
}

#[when("I delete the stored way again")]
fn delete_way_again(
    #[from(editor)] editor: &RefCell<WayEditor<MemoryMapStore>>,
    #[from(stored_way)] stored_way: &RefCell<Option<Way>>,
    #[from(outcome)] outcome: &Outcome,
) {
    delete_stored(editor, stored_way, outcome);
}

#[then("the edit succeeds at version 1")]
fn created_at_version_one(#[from(outcome)] outcome: &Outcome) {
    let borrowed = outcome.borrow();
    let way = borrowed
        .as_ref()
        .expect("an edit was attempted")
        .as_ref()
        .expect("expected the edit to succeed");
    assert_eq!(way.version, 1);
    assert!(way.visible);
    assert_eq!(way.nodes, vec![1, 2, 3]);
}

#[then("the way history lists a single create")]
fn history_has_create(
    #[from(editor)] editor: &RefCell<WayEditor<MemoryMapStore>>,
    #[from(stored_way)] stored_way: &RefCell<Option<Way>>,
) {
    let way_id = stored(stored_way).id.expect("stored way has an id");
    let history = editor.borrow().history(way_id).expect("read history");
    let actions: Vec<_> = history.iter().map(|entry| entry.action).collect();
    assert_eq!(actions, vec![WayAction::Create]);
}

#[then("a version mismatch is reported")]
fn version_mismatch(#[from(outcome)] outcome: &Outcome) {
    match expect_error(outcome) {
        ProtocolError::VersionMismatch {
            provided, server, ..
        } => {
            assert_eq!(provided, 5);
            assert_eq!(server, 1);
        }
        other => panic!("expected a version mismatch, got {other:?}"),
    }
}

#[then("a relation precondition failure is reported")]
fn relation_precondition(#[from(outcome)] outcome: &Outcome) {
    match expect_error(outcome) {
        ProtocolError::PreconditionFailed(Precondition::StillUsedByRelations {
            relation_ids,
            ..
        }) => assert_eq!(relation_ids, vec![30]),
        other => panic!("expected a relation precondition failure, got {other:?}"),
    }
}

#[then("the stored way is still visible")]
fn still_visible(
    #[from(editor)] editor: &RefCell<WayEditor<MemoryMapStore>>,
    #[from(stored_way)] stored_way: &RefCell<Option<Way>>,
) {
    let way_id = stored(stored_way).id.expect("stored way has an id");
    let current = editor
        .borrow()
        .current(way_id)
        .expect("read way")
        .expect("way exists");
    assert!(current.visible);
    assert_eq!(current.version, 1);
}

#[then("an already deleted error is reported")]
fn already_deleted(#[from(outcome)] outcome: &Outcome) {
    let err = expect_error(outcome);
    assert!(
        matches!(err, ProtocolError::AlreadyDeleted { .. }),
        "expected an already deleted error, got {err:?}"
    );
}

#[then("a node precondition failure is reported")]
fn node_precondition(#[from(outcome)] outcome: &Outcome) {
    match expect_error(outcome) {
        ProtocolError::PreconditionFailed(Precondition::NodesUnavailable { node_ids, .. }) => {
            assert_eq!(node_ids, vec![4]);
        }
        other => panic!("expected a node precondition failure, got {other:?}"),
    }
}

#[scenario(path = "tests/features/way_protocol.feature", index = 0)]
fn creating_a_way(
    editor: RefCell<WayEditor<MemoryMapStore>>,
    stored_way: RefCell<Option<Way>>,
    outcome: Outcome,
) {
    let _ = (editor, stored_way, outcome);
}

#[scenario(path = "tests/features/way_protocol.feature", index = 1)]
fn stale_update(
    editor: RefCell<WayEditor<MemoryMapStore>>,
    stored_way: RefCell<Option<Way>>,
    outcome: Outcome,
) {
    let _ = (editor, stored_way, outcome);
}

#[scenario(path = "tests/features/way_protocol.feature", index = 2)]
fn delete_in_use(
    editor: RefCell<WayEditor<MemoryMapStore>>,
    stored_way: RefCell<Option<Way>>,
    outcome: Outcome,
) {
    let _ = (editor, stored_way, outcome);
}

#[scenario(path = "tests/features/way_protocol.feature", index = 3)]
fn delete_twice(
    editor: RefCell<WayEditor<MemoryMapStore>>,
    stored_way: RefCell<Option<Way>>,
    outcome: Outcome,
) {
    let _ = (editor, stored_way, outcome);
}

#[scenario(path = "tests/features/way_protocol.feature", index = 4)]
fn deleted_node(
    editor: RefCell<WayEditor<MemoryMapStore>>,
    stored_way: RefCell<Option<Way>>,
    outcome: Outcome,
) {
    let _ = (editor, stored_way, outcome);
}

#[test]
fn scenario_indices_follow_feature_order() {
    let feature =
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/features/way_protocol.feature");
    let contents = fs::read_to_string(&feature).unwrap_or_else(|err| {
        panic!("failed to read feature file {feature:?}: {err}");
    });
    let titles: Vec<&str> = contents
        .lines()
        .filter_map(|line| line.trim().strip_prefix("Scenario: "))
        .collect();
    assert_eq!(
        titles,
        vec![
            "creating a way under an open changeset",
            "updating from a stale version",
            "deleting a way that a relation still uses",
            "deleting a way twice",
            "referencing a deleted node",
        ]
    );
}
