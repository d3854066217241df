// Copyright 2025 Cowboy AI, LLC.

//! Actors: operators, instruments and algorithms that perform events
//!
//! Actions, measurements and analyses hold a shared reference to an actor
//! (`Arc<Actor>`). They never own it.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::entity::{Contents, Lifecycle, Persist, SaveReceipt, Tags};
use crate::versionstamp::{VersionId, VersionstampGenerator};

/// Availability of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActorStatus {
    /// Ready for work
    #[default]
    Idle,
    /// Performing an event
    Occupied,
    /// Reserved, not available
    Locked,
    /// Faulted
    Error,
}

/// One entry in an actor's version history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ActorVersion {
    /// Version number, starting at 1
    pub v: u32,
    /// What changed
    pub description: String,
    /// When the version was recorded
    pub created_at: DateTime<Utc>,
}

/// A named participant referenced by events
#[derive(Debug, Clone)]
pub struct Actor {
    id: VersionId,
    name: String,
    description: String,
    tags: Tags,
    status: ActorStatus,
    contents: Contents,
    lifecycle: Lifecycle,
    versioning: Vec<ActorVersion>,
}

impl PartialEq for Actor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Actor {}

impl Actor {
    /// Create an idle actor at version 1
    pub fn new(
        generator: &VersionstampGenerator,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let lifecycle = Lifecycle::new();
        let actor = Self {
            id: generator.next(),
            name: name.into(),
            description: description.into(),
            tags: Tags::new(),
            status: ActorStatus::Idle,
            contents: Contents::new(),
            lifecycle,
            versioning: vec![ActorVersion {
                v: 1,
                description: "ver: 1".to_string(),
                created_at: lifecycle.created_at,
            }],
        };
        info!(actor_id = %actor.id, actor_name = %actor.name, "actor created");
        actor
    }

    /// Attach tags
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Attach opaque contents (e.g. a `procedure`)
    pub fn with_contents(mut self, contents: Contents) -> Self {
        self.contents = contents;
        self
    }

    /// Identifier
    pub fn id(&self) -> VersionId {
        self.id
    }

    /// Name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Tags
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Contents
    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    /// Current status
    pub fn status(&self) -> ActorStatus {
        self.status
    }

    /// Lifecycle timestamps
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Change status
    pub fn set_status(&mut self, status: ActorStatus) {
        info!(actor_id = %self.id, from = ?self.status, to = ?status, "actor status changed");
        self.status = status;
    }

    /// Version history, oldest first
    pub fn versions(&self) -> &[ActorVersion] {
        &self.versioning
    }

    /// Latest version number
    pub fn current_version(&self) -> u32 {
        self.versioning.last().map(|v| v.v).unwrap_or(0)
    }

    /// Record a new version and return its number
    pub fn version(&mut self, description: impl Into<String>) -> u32 {
        let v = self.current_version() + 1;
        self.versioning.push(ActorVersion {
            v,
            description: description.into(),
            created_at: Utc::now(),
        });
        v
    }

    /// Structural record view
    pub fn to_record(&self) -> ActorRecord {
        ActorRecord {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            status: self.status,
            tags: self.tags.iter().cloned().collect(),
            contents: self.contents.clone(),
            created_at: self.lifecycle.created_at,
            updated_at: self.lifecycle.updated_at,
            versioning: self.versioning.clone(),
        }
    }

    /// Rebuild an actor, keeping its id, timestamps and history
    pub fn from_record(record: ActorRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            tags: record.tags.into_iter().collect(),
            status: record.status,
            contents: record.contents,
            lifecycle: Lifecycle::restored(record.created_at, record.updated_at),
            versioning: record.versioning,
        }
    }
}

impl Persist for Actor {
    fn save(&mut self) -> SaveReceipt {
        let updated_at = self.lifecycle.touch();
        info!(actor_id = %self.id, "actor saved");
        SaveReceipt {
            id: self.id,
            name: self.name.clone(),
            updated_at,
        }
    }
}

/// Serialized form of an [`Actor`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ActorRecord {
    /// Identifier
    pub id: VersionId,
    /// Name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Status
    #[serde(default)]
    pub status: ActorStatus,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Opaque contents
    #[serde(default)]
    pub contents: Contents,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last save time
    pub updated_at: DateTime<Utc>,
    /// Version history
    #[serde(default)]
    pub versioning: Vec<ActorVersion>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::tags;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_actor_is_idle_at_version_one() {
        let gen = VersionstampGenerator::new();
        let actor = Actor::new(&gen, "Operator", "bench operator");
        assert_eq!(actor.status(), ActorStatus::Idle);
        assert_eq!(actor.current_version(), 1);
        assert!(VersionstampGenerator::validate(&actor.id().to_string()));
    }

    #[test]
    fn test_versioning_appends() {
        let gen = VersionstampGenerator::new();
        let mut actor = Actor::new(&gen, "Tube Furnace 1", "sintering furnace");
        assert_eq!(actor.version("replaced thermocouple"), 2);
        assert_eq!(actor.version("recalibrated"), 3);
        assert_eq!(actor.versions().len(), 3);
        assert_eq!(actor.versions()[1].description, "replaced thermocouple");
    }

    #[test]
    fn test_record_round_trip_preserves_identity() {
        let gen = VersionstampGenerator::new();
        let mut contents = Contents::new();
        contents.insert("procedure".into(), serde_json::json!({"step_1": "load"}));
        let mut actor = Actor::new(&gen, "CNN Phase Identification", "phase id model")
            .with_tags(tags(["CNN", "PhaseID"]))
            .with_contents(contents);
        actor.set_status(ActorStatus::Locked);

        let record = actor.to_record();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["status"], "locked");

        let back = Actor::from_record(serde_json::from_value(json).unwrap());
        assert_eq!(back, actor);
        assert_eq!(back.to_record(), record);
    }

    #[test]
    fn test_save_stamps_updated_at() {
        let gen = VersionstampGenerator::new();
        let mut actor = Actor::new(&gen, "Aeris", "XRD instrument");
        let receipt = actor.save();
        assert_eq!(receipt.id, actor.id());
        assert_eq!(receipt.name, "Aeris");
        assert_eq!(receipt.updated_at, actor.lifecycle().updated_at);
    }
}
