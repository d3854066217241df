// Copyright 2025 Cowboy AI, LLC.

//! Lifecycle metadata and the persistence boundary shared by every entity

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::versionstamp::VersionId;

/// Opaque, caller-defined key/value contents carried verbatim by entities
pub type Contents = serde_json::Map<String, serde_json::Value>;

/// Unordered set of labels
pub type Tags = BTreeSet<String>;

/// Collect labels into a [`Tags`] set
pub fn tags<I, S>(labels: I) -> Tags
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    labels.into_iter().map(Into::into).collect()
}

/// Creation and update timestamps
///
/// # Examples
///
/// ```rust
/// use lab_provenance::Lifecycle;
///
/// let mut lifecycle = Lifecycle::new();
/// assert_eq!(lifecycle.created_at, lifecycle.updated_at);
/// lifecycle.touch();
/// assert!(lifecycle.updated_at >= lifecycle.created_at);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Lifecycle {
    /// When the entity was created
    pub created_at: DateTime<Utc>,
    /// When the entity was last saved
    pub updated_at: DateTime<Utc>,
}

impl Lifecycle {
    /// Lifecycle starting now
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    /// Lifecycle restored from stored timestamps
    pub fn restored(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        Self {
            created_at,
            updated_at,
        }
    }

    /// Stamp `updated_at` with the current time, never moving it backwards
    pub fn touch(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        if now > self.updated_at {
            self.updated_at = now;
        }
        self.updated_at
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

/// Run status shared by samples and experiments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Not started
    #[default]
    Pending,
    /// In progress
    Running,
    /// Finished
    Completed,
    /// Failed
    Error,
    /// Abandoned
    Cancelled,
}

impl Status {
    /// Whether no further transition is expected
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Completed | Status::Error | Status::Cancelled)
    }
}

/// What a save call hands back to the persistence collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SaveReceipt {
    /// Saved entity
    pub id: VersionId,
    /// Its name at save time
    pub name: String,
    /// The freshly stamped update time
    pub updated_at: DateTime<Utc>,
}

/// Persistence boundary
///
/// Durability lives outside this crate. Saving only stamps `updated_at` and
/// reports what was saved.
pub trait Persist {
    /// Stamp `updated_at` and report (id, name, updated_at)
    fn save(&mut self) -> SaveReceipt;
}
