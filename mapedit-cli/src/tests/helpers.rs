//! Test helpers for building seeded way databases and documents on disk.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tempfile::TempDir;

use crate::edit::{ApplyConfig, EditAction};
use crate::import::{ImportConfig, import};
use mapedit_core::EditSettings;

/// User owning the open changeset in [`SEED_JSON`].
pub(super) const USER: u64 = 1;

/// Nodes 1-3 around London, node 4 deleted, an open changeset 1 and a
/// closed changeset 2 for [`USER`], way 1 over nodes 1-3 and relation 10
/// holding way 1.
pub(super) const SEED_JSON: &str = r#"{
    "nodes": [
        {"id": 1, "location": {"x": -0.1276, "y": 51.5072}, "visible": true},
        {"id": 2, "location": {"x": -0.1200, "y": 51.5100}, "visible": true},
        {"id": 3, "location": {"x": -0.1300, "y": 51.5000}, "visible": true},
        {"id": 4, "location": {"x": 0.0, "y": 0.0}, "visible": false}
    ],
    "changesets": [
        {"id": 1, "user_id": 1, "open": true},
        {"id": 2, "user_id": 1, "open": false}
    ],
    "relations": [
        {
            "id": 10,
            "version": 1,
            "visible": true,
            "members": [
                {"relation_id": 10, "member_type": "way", "member_id": 1, "role": "outer", "sequence_id": 1}
            ]
        }
    ],
    "ways": [
        {"id": 1, "changeset_id": 1, "nodes": [1, 2, 3], "tags": {"highway": "path"}}
    ]
}"#;

pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    pub(super) fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        let path = self.path(name);
        write_utf8(&path, contents.as_bytes());
        path
    }

    /// Import [`SEED_JSON`] into a fresh database and return its path.
    pub(super) fn seeded_database(&self) -> Utf8PathBuf {
        let config = ImportConfig {
            seed: self.write("seed.json", SEED_JSON),
            database: self.path("map.sqlite"),
        };
        import(&config).expect("seed database");
        config.database
    }

    pub(super) fn apply_config(
        &self,
        document: &str,
        database: &Utf8Path,
        action: EditAction,
    ) -> ApplyConfig {
        ApplyConfig {
            document: self.write("way.osm", document),
            database: database.to_path_buf(),
            action,
            user: USER,
            settings: EditSettings::default(),
        }
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    fs::write(path.as_std_path(), contents).expect("write file");
}

pub(super) fn way_document(attributes: &str, nodes: &[u64]) -> String {
    let refs: String = nodes
        .iter()
        .map(|node| format!(r#"<nd ref="{node}"/>"#))
        .collect();
    format!(r#"<osm><way {attributes}>{refs}<tag k="highway" v="footway"/></way></osm>"#)
}
