//! Tag sets attached to map elements.
//!
//! Tags mirror OpenStreetMap's free-form key/value structure. Keys are unique
//! within an element: [`validate_tags`] rejects a repeated key instead of
//! letting the later value win.

use std::collections::{HashMap, hash_map::Entry};
use std::fmt;

use thiserror::Error;

/// Key/value tags owned by a single element.
pub type Tags = HashMap<String, String>;

/// Longest tag key or value accepted, counted in characters.
pub const MAX_TAG_LENGTH: usize = 255;

/// Kind of map element a tag set or relation member refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ElementKind {
    /// A point element.
    Node,
    /// An ordered polyline or polygon.
    Way,
    /// A grouping of other elements.
    Relation,
}

impl ElementKind {
    /// Lower-case name used in messages and storage.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }

    /// Parse the lower-case storage name back into a kind.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "node" => Some(Self::Node),
            "way" => Some(Self::Way),
            "relation" => Some(Self::Relation),
            _ => None,
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Names an element in error messages.
///
/// Renders as `kind/id`, leaving the id empty for elements that have not
/// been created yet.
///
/// # Examples
///
/// ```
/// use mapedit_core::ElementRef;
///
/// assert_eq!(ElementRef::way(None).to_string(), "way/");
/// assert_eq!(ElementRef::way(Some(23)).to_string(), "way/23");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementRef {
    /// Element kind.
    pub kind: ElementKind,
    /// Identifier, if the element has one.
    pub id: Option<u64>,
}

impl ElementRef {
    /// Reference a way by its optional identifier.
    #[must_use]
    pub const fn way(id: Option<u64>) -> Self {
        Self {
            kind: ElementKind::Way,
            id,
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/", self.kind)?;
        if let Some(id) = self.id {
            write!(f, "{id}")?;
        }
        Ok(())
    }
}

/// A tag as it arrived on the wire, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagCandidate {
    /// Raw key attribute, `None` when absent.
    pub key: Option<String>,
    /// Raw value attribute, `None` when absent.
    pub value: Option<String>,
}

impl TagCandidate {
    /// Candidate with both attributes present.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(value.into()),
        }
    }
}

/// Errors returned by [`validate_tags`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// A tag had no key, or an empty one.
    #[error("tag is missing key")]
    MissingKey,
    /// A tag had a key but no value attribute.
    #[error("tag is missing value")]
    MissingValue,
    /// The same key appeared twice on one element.
    #[error("Element {element} has duplicate tags with key {key}")]
    DuplicateKey {
        /// Element carrying the duplicate.
        element: ElementRef,
        /// The repeated key.
        key: String,
    },
    /// A key or value exceeded [`MAX_TAG_LENGTH`] characters.
    #[error(
        "tag {key:?} is {length} characters long, the limit is {limit}",
        limit = MAX_TAG_LENGTH
    )]
    TooLong {
        /// Key of the offending tag.
        key: String,
        /// Character count of the longer of key and value.
        length: usize,
    },
}

/// Validate raw tag candidates into a [`Tags`] map.
///
/// Candidates are checked in order, so the first offending tag decides the
/// error. Empty values are accepted; absent ones are not.
///
/// # Errors
///
/// Returns [`TagError`] describing the first candidate that failed.
///
/// # Examples
///
/// ```
/// use mapedit_core::{ElementRef, TagCandidate, TagError, validate_tags};
///
/// let tags = validate_tags(
///     ElementRef::way(Some(23)),
///     [TagCandidate::new("dup", "test"), TagCandidate::new("dup", "tester")],
/// );
/// let err = tags.expect_err("duplicate keys are rejected");
/// assert_eq!(err.to_string(), "Element way/23 has duplicate tags with key dup");
/// ```
pub fn validate_tags<I>(element: ElementRef, candidates: I) -> Result<Tags, TagError>
where
    I: IntoIterator<Item = TagCandidate>,
{
    let mut tags = Tags::new();
    for candidate in candidates {
        let key = candidate
            .key
            .filter(|key| !key.is_empty())
            .ok_or(TagError::MissingKey)?;
        let value = candidate.value.ok_or(TagError::MissingValue)?;
        check_tag(&key, &value)?;
        match tags.entry(key) {
            Entry::Occupied(existing) => {
                return Err(TagError::DuplicateKey {
                    element,
                    key: existing.key().clone(),
                });
            }
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
        }
    }
    Ok(tags)
}

/// Check a single key/value pair that is already known to be unique.
pub(crate) fn check_tag(key: &str, value: &str) -> Result<(), TagError> {
    if key.is_empty() {
        return Err(TagError::MissingKey);
    }
    let length = key.chars().count().max(value.chars().count());
    if length > MAX_TAG_LENGTH {
        return Err(TagError::TooLong {
            key: key.to_owned(),
            length,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn collects_unique_tags() {
        let tags = validate_tags(
            ElementRef::way(None),
            [
                TagCandidate::new("highway", "residential"),
                TagCandidate::new("name", ""),
            ],
        )
        .expect("valid tags");
        assert_eq!(tags.len(), 2);
        assert_eq!(tags.get("name").map(String::as_str), Some(""));
    }

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    fn rejects_absent_or_empty_key(#[case] key: Option<String>) {
        let candidate = TagCandidate {
            key,
            value: Some("value".into()),
        };
        let err = validate_tags(ElementRef::way(None), [candidate]).expect_err("missing key");
        assert_eq!(err, TagError::MissingKey);
        assert_eq!(err.to_string(), "tag is missing key");
    }

    #[rstest]
    fn rejects_absent_value() {
        let candidate = TagCandidate {
            key: Some("key".into()),
            value: None,
        };
        let err = validate_tags(ElementRef::way(None), [candidate]).expect_err("missing value");
        assert_eq!(err, TagError::MissingValue);
        assert_eq!(err.to_string(), "tag is missing value");
    }

    #[rstest]
    #[case(None, "Element way/ has duplicate tags with key dup")]
    #[case(Some(23), "Element way/23 has duplicate tags with key dup")]
    fn duplicate_key_names_the_element(#[case] id: Option<u64>, #[case] expected: &str) {
        let err = validate_tags(
            ElementRef::way(id),
            [
                TagCandidate::new("dup", "test"),
                TagCandidate::new("dup", "tester"),
            ],
        )
        .expect_err("duplicate key");
        assert_eq!(err.to_string(), expected);
    }

    #[rstest]
    fn rejects_overlong_values() {
        let long = "x".repeat(MAX_TAG_LENGTH + 1);
        let err = validate_tags(ElementRef::way(None), [TagCandidate::new("note", long)])
            .expect_err("overlong value");
        assert!(matches!(err, TagError::TooLong { length, .. } if length == MAX_TAG_LENGTH + 1));
    }

    #[rstest]
    fn counts_characters_not_bytes() {
        let accented = "é".repeat(MAX_TAG_LENGTH);
        let candidates = [TagCandidate::new("name", accented)];
        assert!(validate_tags(ElementRef::way(None), candidates).is_ok());
    }
}
