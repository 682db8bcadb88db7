//! Core types for dpres-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Opaque, globally unique identifier for an entity
///
/// References are minted by the repository and never reused. The client
/// treats them as opaque strings: no format, encoding, or ordering is
/// assumed, and they are percent-encoded when embedded in URL paths.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRef(String);

impl EntityRef {
    /// Create a new EntityRef from an opaque identifier
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EntityRef {
    fn from(reference: String) -> Self {
        Self(reference)
    }
}

impl From<&str> for EntityRef {
    fn from(reference: &str) -> Self {
        Self(reference.to_string())
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Entity kind
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Container entity with zero or more children
    Folder,
    /// Leaf entity with an associated content bitstream
    Asset,
}

/// A node in the repository's hierarchical tree
///
/// This is the abbreviated record carried by traversal list pages. List
/// pages may omit long fields; [`crate::fetcher::fetch`] resolves the full
/// record for a single entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Opaque unique identifier, immutable once assigned
    #[serde(rename = "ref")]
    pub reference: EntityRef,

    /// Folder or asset
    pub kind: EntityKind,

    /// Display title
    pub title: String,

    /// Free-text description, if any
    #[serde(default)]
    pub description: Option<String>,

    /// Access-classification label
    pub security_tag: String,

    /// Parent reference (absent only for children of the repository root)
    #[serde(default)]
    pub parent: Option<EntityRef>,
}

/// Content descriptors for an asset's bitstream
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentInfo {
    /// Original filename of the bitstream
    pub filename: String,

    /// Size of the bitstream in bytes
    pub size_bytes: u64,

    /// MIME type of the bitstream
    pub content_type: String,
}

/// Fully populated entity record, as returned by [`crate::fetcher::fetch`]
///
/// Carries every metadata field; `content` is present for assets and absent
/// for folders.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullEntity {
    /// The entity record
    #[serde(flatten)]
    pub entity: Entity,

    /// Content descriptors (assets only)
    #[serde(default)]
    pub content: Option<ContentInfo>,
}

/// One page of a folder's children, as returned by the entity API
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct ChildrenPage {
    /// Child records in server order
    pub children: Vec<Entity>,

    /// Total number of children of this folder
    pub total: u64,
}

/// Outcome of a completed download
///
/// Returned by [`crate::download::download`] once the bitstream has been
/// fully written and renamed into place.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadResult {
    /// Local path the bitstream was written to
    pub path: PathBuf,

    /// Number of bytes transferred
    pub bytes_written: u64,
}
