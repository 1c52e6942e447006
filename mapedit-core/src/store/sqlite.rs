//! SQLite-backed map store.
//!
//! Way history lives in `ways` and `way_nodes`, keyed by `(way_id, version)`.
//! `current_ways` holds the pointer that commits compare-and-swap on. Tags
//! are stored as JSON objects.

use std::fmt;

use camino::Utf8Path;
use geo::Coord;
use log::debug;
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};

use super::{HistoryEntry, StoreError, WayAction, WayCommit, WayStore};
use crate::{
    Changeset, ChangesetId, ChangesetLookup, ElementKind, Node, NodeId, NodeLookup, Relation,
    RelationId, RelationMember, RelationStore, Tags, Way, WayId,
};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS nodes (
        id INTEGER PRIMARY KEY,
        lon REAL NOT NULL,
        lat REAL NOT NULL,
        visible INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS changesets (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        open INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS relations (
        id INTEGER PRIMARY KEY,
        version INTEGER NOT NULL,
        visible INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS relation_members (
        relation_id INTEGER NOT NULL,
        member_type TEXT NOT NULL,
        member_id INTEGER NOT NULL,
        member_role TEXT NOT NULL,
        sequence_id INTEGER NOT NULL,
        PRIMARY KEY (relation_id, sequence_id)
    );
    CREATE INDEX IF NOT EXISTS relation_members_member_idx
        ON relation_members (member_type, member_id);
    CREATE TABLE IF NOT EXISTS way_ids (
        id INTEGER PRIMARY KEY AUTOINCREMENT
    );
    CREATE TABLE IF NOT EXISTS current_ways (
        id INTEGER PRIMARY KEY,
        version INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS ways (
        way_id INTEGER NOT NULL,
        version INTEGER NOT NULL,
        visible INTEGER NOT NULL,
        changeset_id INTEGER,
        tags TEXT NOT NULL,
        action TEXT NOT NULL,
        user_id INTEGER NOT NULL,
        PRIMARY KEY (way_id, version)
    );
    CREATE TABLE IF NOT EXISTS way_nodes (
        way_id INTEGER NOT NULL,
        version INTEGER NOT NULL,
        sequence_id INTEGER NOT NULL,
        node_id INTEGER NOT NULL,
        PRIMARY KEY (way_id, version, sequence_id),
        FOREIGN KEY (way_id, version) REFERENCES ways (way_id, version)
    );
";

/// Map store persisted in a SQLite database.
///
/// Commits run inside an immediate transaction, so the version check and the
/// write happen under SQLite's write lock even with several processes
/// sharing the file.
pub struct SqliteMapStore {
    connection: Connection,
}

impl fmt::Debug for SqliteMapStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteMapStore")
            .field("path", &self.connection.path())
            .finish_non_exhaustive()
    }
}

impl SqliteMapStore {
    /// Open or create a database file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the directory, the database or
    /// the schema cannot be created.
    pub fn open(path: &Utf8Path) -> Result<Self, StoreError> {
        mapedit_fs::ensure_parent_dir(path)
            .map_err(|source| StoreError::backend("create parent directory", source))?;
        let connection = Connection::open(path.as_std_path())
            .map_err(|source| StoreError::backend("open database", source))?;
        Self::with_connection(connection)
    }

    /// A private database that disappears when the store is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the schema cannot be created.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory()
            .map_err(|source| StoreError::backend("open database", source))?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self, StoreError> {
        connection
            .pragma_update(None, "foreign_keys", true)
            .map_err(|source| StoreError::backend("enable foreign keys", source))?;
        connection
            .execute_batch(SCHEMA)
            .map_err(|source| StoreError::backend("create schema", source))?;
        Ok(Self { connection })
    }

    /// Add or replace a node.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the row cannot be written.
    pub fn insert_node(&self, node: &Node) -> Result<(), StoreError> {
        self.connection
            .execute(
                "INSERT OR REPLACE INTO nodes (id, lon, lat, visible) VALUES (?1, ?2, ?3, ?4)",
                params![node.id, node.location.x, node.location.y, node.visible],
            )
            .map_err(|source| StoreError::backend("write node", source))?;
        Ok(())
    }

    /// Add or replace a changeset.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the row cannot be written.
    pub fn insert_changeset(&self, changeset: &Changeset) -> Result<(), StoreError> {
        self.connection
            .execute(
                "INSERT OR REPLACE INTO changesets (id, user_id, open) VALUES (?1, ?2, ?3)",
                params![changeset.id, changeset.user_id, changeset.open],
            )
            .map_err(|source| StoreError::backend("write changeset", source))?;
        Ok(())
    }

    /// Add or replace a relation together with its members.
    ///
    /// Members are re-pointed at `relation.id`; previous members are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Backend`] when the rows cannot be written.
    pub fn insert_relation(
        &mut self,
        relation: &Relation,
        members: &[RelationMember],
    ) -> Result<(), StoreError> {
        let transaction = self
            .connection
            .transaction()
            .map_err(|source| StoreError::backend("begin transaction", source))?;
        transaction
            .execute(
                "INSERT OR REPLACE INTO relations (id, version, visible) VALUES (?1, ?2, ?3)",
                params![relation.id, relation.version, relation.visible],
            )
            .map_err(|source| StoreError::backend("write relation", source))?;
        transaction
            .execute(
                "DELETE FROM relation_members WHERE relation_id = ?1",
                params![relation.id],
            )
            .map_err(|source| StoreError::backend("clear relation members", source))?;
        {
            let mut insert = transaction
                .prepare(
                    "INSERT INTO relation_members \
                     (relation_id, member_type, member_id, member_role, sequence_id) \
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                )
                .map_err(|source| StoreError::backend("prepare member insert", source))?;
            for member in members {
                insert
                    .execute(params![
                        relation.id,
                        member.member_type.as_str(),
                        member.member_id,
                        member.role,
                        member.sequence_id,
                    ])
                    .map_err(|source| StoreError::backend("write relation member", source))?;
            }
        }
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit transaction", source))
    }

    fn load_snapshot(
        &self,
        way_id: WayId,
        version: u64,
    ) -> Result<Option<HistoryEntry>, StoreError> {
        let row = self
            .connection
            .query_row(
                "SELECT visible, changeset_id, tags, action, user_id \
                 FROM ways WHERE way_id = ?1 AND version = ?2",
                params![way_id, version],
                read_snapshot_row,
            )
            .optional()
            .map_err(|source| StoreError::backend("read way", source))?;
        row.map(|snapshot| self.assemble(way_id, version, snapshot))
            .transpose()
    }

    fn assemble(
        &self,
        way_id: WayId,
        version: u64,
        snapshot: SnapshotRow,
    ) -> Result<HistoryEntry, StoreError> {
        let tags: Tags = serde_json::from_str(&snapshot.tags)
            .map_err(|source| StoreError::backend("decode way tags", source))?;
        let action = WayAction::from_name(&snapshot.action).ok_or_else(|| {
            StoreError::backend(
                "decode way action",
                format!("unknown action {:?} for way {way_id}", snapshot.action),
            )
        })?;
        Ok(HistoryEntry {
            way: Way {
                id: Some(way_id),
                version,
                visible: snapshot.visible,
                changeset_id: snapshot.changeset_id,
                nodes: self.load_way_nodes(way_id, version)?,
                tags,
            },
            action,
            user_id: snapshot.user_id,
        })
    }

    fn load_way_nodes(&self, way_id: WayId, version: u64) -> Result<Vec<NodeId>, StoreError> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT node_id FROM way_nodes \
                 WHERE way_id = ?1 AND version = ?2 ORDER BY sequence_id",
            )
            .map_err(|source| StoreError::backend("prepare way node query", source))?;
        let rows = statement
            .query_map(params![way_id, version], |row| row.get::<_, NodeId>(0))
            .map_err(|source| StoreError::backend("read way nodes", source))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|source| StoreError::backend("read way nodes", source))
    }
}

struct SnapshotRow {
    visible: bool,
    changeset_id: Option<ChangesetId>,
    tags: String,
    action: String,
    user_id: u64,
}

fn read_snapshot_row(row: &Row<'_>) -> rusqlite::Result<SnapshotRow> {
    Ok(SnapshotRow {
        visible: row.get(0)?,
        changeset_id: row.get(1)?,
        tags: row.get(2)?,
        action: row.get(3)?,
        user_id: row.get(4)?,
    })
}

fn stored_version(transaction: &Transaction<'_>, way_id: WayId) -> Result<Option<u64>, StoreError> {
    transaction
        .query_row(
            "SELECT version FROM current_ways WHERE id = ?1",
            params![way_id],
            |row| row.get(0),
        )
        .optional()
        .map_err(|source| StoreError::backend("read current version", source))
}

fn write_snapshot(
    transaction: &Transaction<'_>,
    way_id: WayId,
    entry: &HistoryEntry,
) -> Result<(), StoreError> {
    let way = &entry.way;
    let tags = serde_json::to_string(&way.tags)
        .map_err(|source| StoreError::backend("encode way tags", source))?;
    transaction
        .execute(
            "INSERT INTO ways (way_id, version, visible, changeset_id, tags, action, user_id) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                way_id,
                way.version,
                way.visible,
                way.changeset_id,
                tags,
                entry.action.as_str(),
                entry.user_id,
            ],
        )
        .map_err(|source| StoreError::backend("write way", source))?;

    let mut insert = transaction
        .prepare(
            "INSERT INTO way_nodes (way_id, version, sequence_id, node_id) \
             VALUES (?1, ?2, ?3, ?4)",
        )
        .map_err(|source| StoreError::backend("prepare way node insert", source))?;
    for (node_id, sequence_id) in way.nodes.iter().zip(1_usize..) {
        insert
            .execute(params![way_id, way.version, sequence_id, node_id])
            .map_err(|source| StoreError::backend("write way node", source))?;
    }

    transaction
        .execute(
            "INSERT INTO current_ways (id, version) VALUES (?1, ?2) \
             ON CONFLICT (id) DO UPDATE SET version = excluded.version",
            params![way_id, way.version],
        )
        .map_err(|source| StoreError::backend("move current pointer", source))?;
    transaction
        .execute(
            "INSERT OR IGNORE INTO way_ids (id) VALUES (?1)",
            params![way_id],
        )
        .map_err(|source| StoreError::backend("reserve way id", source))?;
    Ok(())
}

impl NodeLookup for SqliteMapStore {
    fn node(&self, id: NodeId) -> Result<Option<Node>, StoreError> {
        self.connection
            .query_row(
                "SELECT lon, lat, visible FROM nodes WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Node {
                        id,
                        location: Coord {
                            x: row.get(0)?,
                            y: row.get(1)?,
                        },
                        visible: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(|source| StoreError::backend("read node", source))
    }
}

impl ChangesetLookup for SqliteMapStore {
    fn changeset(&self, id: ChangesetId) -> Result<Option<Changeset>, StoreError> {
        self.connection
            .query_row(
                "SELECT user_id, open FROM changesets WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Changeset {
                        id,
                        user_id: row.get(0)?,
                        open: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(|source| StoreError::backend("read changeset", source))
    }
}

impl RelationStore for SqliteMapStore {
    fn relation(&self, id: RelationId) -> Result<Option<Relation>, StoreError> {
        self.connection
            .query_row(
                "SELECT version, visible FROM relations WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Relation {
                        id,
                        version: row.get(0)?,
                        visible: row.get(1)?,
                    })
                },
            )
            .optional()
            .map_err(|source| StoreError::backend("read relation", source))
    }

    fn members_referencing(
        &self,
        member_type: ElementKind,
        member_id: u64,
    ) -> Result<Vec<RelationMember>, StoreError> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT relation_id, member_role, sequence_id FROM relation_members \
                 WHERE member_type = ?1 AND member_id = ?2",
            )
            .map_err(|source| StoreError::backend("prepare member query", source))?;
        let rows = statement
            .query_map(params![member_type.as_str(), member_id], |row| {
                Ok(RelationMember {
                    relation_id: row.get(0)?,
                    member_type,
                    member_id,
                    role: row.get(1)?,
                    sequence_id: row.get(2)?,
                })
            })
            .map_err(|source| StoreError::backend("read relation members", source))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|source| StoreError::backend("read relation members", source))
    }
}

impl WayStore for SqliteMapStore {
    fn load_current(&self, way_id: WayId) -> Result<Option<Way>, StoreError> {
        let current: Option<u64> = self
            .connection
            .query_row(
                "SELECT version FROM current_ways WHERE id = ?1",
                params![way_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|source| StoreError::backend("read current version", source))?;
        match current {
            Some(version) => self.load_version(way_id, version),
            None => Ok(None),
        }
    }

    fn load_version(&self, way_id: WayId, version: u64) -> Result<Option<Way>, StoreError> {
        let snapshot = self.load_snapshot(way_id, version)?;
        Ok(snapshot.map(|entry| entry.way))
    }

    fn history(&self, way_id: WayId) -> Result<Vec<HistoryEntry>, StoreError> {
        let versions = {
            let mut statement = self
                .connection
                .prepare("SELECT version FROM ways WHERE way_id = ?1 ORDER BY version")
                .map_err(|source| StoreError::backend("prepare history query", source))?;
            let rows = statement
                .query_map(params![way_id], |row| row.get::<_, u64>(0))
                .map_err(|source| StoreError::backend("read history", source))?;
            rows.collect::<Result<Vec<_>, _>>()
                .map_err(|source| StoreError::backend("read history", source))?
        };
        let mut history = Vec::with_capacity(versions.len());
        for version in versions {
            if let Some(entry) = self.load_snapshot(way_id, version)? {
                history.push(entry);
            }
        }
        Ok(history)
    }

    fn allocate_id(&mut self) -> Result<WayId, StoreError> {
        self.connection
            .execute("INSERT INTO way_ids DEFAULT VALUES", [])
            .map_err(|source| StoreError::backend("allocate way id", source))?;
        WayId::try_from(self.connection.last_insert_rowid())
            .map_err(|source| StoreError::backend("allocate way id", source))
    }

    fn commit(&mut self, commit: WayCommit) -> Result<(), StoreError> {
        let transaction = self
            .connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|source| StoreError::backend("begin transaction", source))?;
        let found = stored_version(&transaction, commit.way_id()?)?;
        let way_id = commit.check_against(found)?;
        write_snapshot(&transaction, way_id, &commit.entry)?;
        transaction
            .commit()
            .map_err(|source| StoreError::backend("commit transaction", source))?;
        debug!(
            "Committed way {way_id} version {} ({})",
            commit.entry.way.version, commit.entry.action
        );
        Ok(())
    }
}
