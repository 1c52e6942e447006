//! Tunable limits and policies for way edits.

/// Default upper bound on the number of node references in one way.
pub const DEFAULT_MAX_NODES: usize = 2000;

/// Limits and policies applied by validation and the edit transitions.
///
/// # Examples
///
/// ```
/// use mapedit_core::EditSettings;
///
/// let settings = EditSettings::default().with_max_nodes(10);
/// assert_eq!(settings.max_nodes, 10);
/// assert!(settings.allow_resurrection);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EditSettings {
    /// Maximum number of node references a valid way may hold.
    pub max_nodes: usize,
    /// Whether an update may revive a soft-deleted way.
    pub allow_resurrection: bool,
    /// Whether a way still used by visible relations may be deleted.
    pub allow_orphaned_members: bool,
}

impl Default for EditSettings {
    fn default() -> Self {
        Self {
            max_nodes: DEFAULT_MAX_NODES,
            allow_resurrection: true,
            allow_orphaned_members: false,
        }
    }
}

impl EditSettings {
    /// Override the node-count limit.
    #[must_use]
    pub const fn with_max_nodes(self, max_nodes: usize) -> Self {
        Self { max_nodes, ..self }
    }

    /// Override the resurrection policy.
    #[must_use]
    pub const fn with_resurrection(self, allow_resurrection: bool) -> Self {
        Self {
            allow_resurrection,
            ..self
        }
    }

    /// Override the policy for deleting ways that relations still use.
    #[must_use]
    pub const fn with_orphaned_members(self, allow_orphaned_members: bool) -> Self {
        Self {
            allow_orphaned_members,
            ..self
        }
    }
}
