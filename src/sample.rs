// Copyright 2025 Cowboy AI, LLC.

//! The sample aggregate: owner of a provenance graph
//!
//! A sample holds an [`EventArena`] and a membership set over it. Every node
//! reachable through the arena is owned by the sample; membership decides which
//! of them make up the lineage that [`Sample::valid_graph`] checks.
//!
//! ```mermaid
//! graph LR
//!     Fe[Iron powder] --> A0[procurement]
//!     A0 --> M0[material]
//!     M0 --> A1[grind]
//!     A1 --> M1[material]
//!     M1 --> A2[sinter]
//!     A2 --> M2[material]
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexSet;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::context::NamingContext;
use crate::config::NamingConfig;
use crate::entity::{Contents, Lifecycle, Persist, SaveReceipt, Status, Tags};
use crate::errors::{ProvenanceError, ProvenanceResult};
use crate::event::{EventArena, EventKind, EventNode, EventRecord};
use crate::graph::{LineageReport, ProvenanceGraph};
use crate::ingredient::Ingredient;
use crate::versionstamp::{VersionId, VersionstampGenerator};

/// Status of a sample
pub type SampleStatus = Status;

/// Aggregate root owning a set of events
#[derive(Debug, Clone)]
pub struct Sample {
    id: VersionId,
    name: String,
    description: String,
    tags: Tags,
    status: SampleStatus,
    contents: Contents,
    lifecycle: Lifecycle,
    arena: EventArena,
    events: IndexSet<VersionId>,
}

impl Sample {
    /// Empty sample with an explicit name
    pub fn new(generator: Arc<VersionstampGenerator>, name: impl Into<String>) -> Self {
        let id = generator.next();
        let name = name.into();
        info!(sample_id = %id, sample_name = %name, "sample created");
        Self {
            id,
            name,
            description: String::new(),
            tags: Tags::new(),
            status: SampleStatus::default(),
            contents: Contents::new(),
            lifecycle: Lifecycle::new(),
            arena: EventArena::new(generator),
            events: IndexSet::new(),
        }
    }

    /// Empty sample named from its administrative context
    pub fn named_for(
        generator: Arc<VersionstampGenerator>,
        context: &NamingContext,
        config: &NamingConfig,
    ) -> Self {
        let name = context.sample_name(&generator, config);
        Self::new(generator, name)
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach tags
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    /// Attach opaque contents
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

    /// Status
    pub fn status(&self) -> SampleStatus {
        self.status
    }

    /// Move to `status`
    pub fn set_status(&mut self, status: SampleStatus) {
        if self.status.is_terminal() && status != self.status {
            warn!(sample_id = %self.id, from = ?self.status, to = ?status, "status left a terminal state");
        }
        self.status = status;
    }

    /// Contents
    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    /// Lifecycle timestamps
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// The arena holding every event this sample owns
    pub fn arena(&self) -> &EventArena {
        &self.arena
    }

    /// Mutable arena, for building events before adding them
    pub fn arena_mut(&mut self) -> &mut EventArena {
        &mut self.arena
    }

    /// The generator shared by the sample and its events
    pub fn generator(&self) -> &Arc<VersionstampGenerator> {
        self.arena.generator()
    }

    /// Add an event held by the arena; returns `false` if already a member
    pub fn add_event(&mut self, id: VersionId) -> ProvenanceResult<bool> {
        let node = self.arena.node(id)?;
        let added = self.events.insert(id);
        if added {
            debug!(sample_id = %self.id, event_id = %id, kind = %node.kind(), "event added to sample");
        }
        Ok(added)
    }

    /// Move a constructed node into the arena and add it as a member
    pub fn insert_event(&mut self, node: EventNode) -> ProvenanceResult<VersionId> {
        let id = self.arena.insert(node)?;
        self.add_event(id)?;
        Ok(id)
    }

    /// Whether `id` is a member
    pub fn contains_event(&self, id: VersionId) -> bool {
        self.events.contains(&id)
    }

    /// Member ids in the order they were added
    pub fn event_ids(&self) -> &IndexSet<VersionId> {
        &self.events
    }

    /// Member events in the order they were added
    pub fn events(&self) -> impl Iterator<Item = &EventNode> {
        self.events.iter().filter_map(|id| self.arena.get(*id))
    }

    /// Member events of one kind
    pub fn events_of_kind(&self, kind: EventKind) -> impl Iterator<Item = &EventNode> {
        self.events().filter(move |event| event.kind() == kind)
    }

    /// Directed graph over the members and everything they link to
    pub fn graph(&self) -> ProvenanceGraph {
        ProvenanceGraph::from_events(self.events())
    }

    /// Acyclicity and connectivity summary of [`Sample::graph`]
    pub fn lineage_report(&self) -> LineageReport {
        let report = self.graph().report();
        debug!(
            sample_id = %self.id,
            vertices = report.vertex_count,
            edges = report.edge_count,
            components = report.component_count,
            acyclic = report.acyclic,
            "lineage checked"
        );
        report
    }

    /// Whether the members form one acyclic, weakly connected lineage
    pub fn valid_graph(&self) -> bool {
        self.lineage_report().is_valid()
    }

    /// Wire and register a chain of actions as one linear process
    ///
    /// Each action feeds the next through the single material it generates.
    /// Missing intermediate materials are generated, and an action with no
    /// ingredients consumes the whole of its predecessor's material. All
    /// checks run before anything is mutated.
    #[instrument(skip(self, actions), fields(sample_id = %self.id, actions = actions.len()))]
    pub fn add_linear_sample_process(&mut self, actions: &[VersionId]) -> ProvenanceResult<()> {
        self.check_linear_chain(actions)?;
        let (first, rest) = actions.split_first().ok_or(ProvenanceError::EmptyChain)?;

        let inputs: Vec<VersionId> = self
            .arena
            .node(*first)?
            .ingredients()
            .iter()
            .map(Ingredient::material)
            .collect();
        for material in inputs {
            self.add_event(material)?;
        }
        self.add_event(*first)?;

        let mut previous = *first;
        for next in rest {
            let intermediate = self.single_product(previous)?;
            self.add_event(intermediate)?;
            if self.arena.node(*next)?.ingredients().is_empty() {
                let whole = Ingredient::whole(self.arena.node(intermediate)?)?;
                self.arena.add_ingredient(*next, whole)?;
            }
            self.add_event(*next)?;
            previous = *next;
        }

        if self.arena.node(previous)?.generated_materials().is_empty() {
            self.arena.generate_generic_material(previous, None)?;
        }
        let finals = self.arena.node(previous)?.generated_materials().to_vec();
        for material in finals {
            self.add_event(material)?;
        }

        info!(events = self.events.len(), "linear sample process added");
        Ok(())
    }

    fn check_linear_chain(&self, actions: &[VersionId]) -> ProvenanceResult<()> {
        let Some((_, leading)) = actions.split_last() else {
            warn!(sample_id = %self.id, "linear sample process without actions");
            return Err(ProvenanceError::EmptyChain);
        };
        for id in actions {
            self.arena.node_of_kind(*id, EventKind::Action)?;
        }

        for id in leading {
            let generated = self.arena.node(*id)?.generated_materials().len();
            if generated > 1 {
                warn!(action_id = %id, generated, "ambiguous linear chain");
                return Err(ProvenanceError::AmbiguousChain {
                    action_id: *id,
                    generated,
                });
            }
        }

        for pair in actions.windows(2) {
            let (previous, next) = (self.arena.node(pair[0])?, self.arena.node(pair[1])?);
            if next.ingredients().is_empty() {
                continue;
            }
            let continues = next
                .ingredients()
                .iter()
                .any(|ingredient| previous.generated_materials().contains(&ingredient.material()));
            if !continues {
                warn!(previous = %previous.id(), next = %next.id(), "broken linear chain");
                return Err(ProvenanceError::BrokenChain {
                    previous: previous.id(),
                    next: next.id(),
                });
            }
        }
        Ok(())
    }

    fn single_product(&mut self, action: VersionId) -> ProvenanceResult<VersionId> {
        match self.arena.node(action)?.generated_materials().first() {
            Some(material) => Ok(*material),
            None => self.arena.generate_generic_material(action, None),
        }
    }

    /// Record view, with member event records when `include_events` is set
    pub fn to_record(&self, include_events: bool) -> ProvenanceResult<SampleRecord> {
        let events = if include_events {
            let records = self
                .events
                .iter()
                .map(|id| self.arena.to_record(*id))
                .collect::<ProvenanceResult<Vec<_>>>()?;
            Some(records)
        } else {
            None
        };
        Ok(SampleRecord {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            tags: self.tags.iter().cloned().collect(),
            status: self.status,
            created_at: self.lifecycle.created_at,
            updated_at: self.lifecycle.updated_at,
            contents: self.contents.clone(),
            events,
        })
    }

    /// Record view as JSON
    pub fn to_dict(&self, include_events: bool) -> ProvenanceResult<serde_json::Value> {
        Ok(serde_json::to_value(self.to_record(include_events)?)?)
    }

    /// Rebuild a sample and its member events from a record
    pub fn from_record(
        generator: Arc<VersionstampGenerator>,
        record: &SampleRecord,
    ) -> ProvenanceResult<Self> {
        let mut arena = EventArena::new(generator);
        let mut events = IndexSet::new();
        for event in record.events.iter().flatten() {
            events.insert(arena.import_record(event)?);
        }
        debug!(sample_id = %record.id, events = events.len(), "sample restored");
        Ok(Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            tags: record.tags.iter().cloned().collect(),
            status: record.status,
            contents: record.contents.clone(),
            lifecycle: Lifecycle::restored(record.created_at, record.updated_at),
            arena,
            events,
        })
    }

    /// Rebuild a sample from a JSON record
    pub fn from_dict(
        generator: Arc<VersionstampGenerator>,
        value: serde_json::Value,
    ) -> ProvenanceResult<Self> {
        let record: SampleRecord = serde_json::from_value(value)?;
        Self::from_record(generator, &record)
    }
}

impl Persist for Sample {
    fn save(&mut self) -> SaveReceipt {
        let updated_at = self.lifecycle.touch();
        info!(sample_id = %self.id, sample_name = %self.name, status = ?self.status, "sample saved");
        SaveReceipt {
            id: self.id,
            name: self.name.clone(),
            updated_at,
        }
    }
}

/// Serialized form of a [`Sample`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SampleRecord {
    /// Identifier
    pub id: VersionId,
    /// Name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Status
    #[serde(default)]
    pub status: SampleStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last save time
    pub updated_at: DateTime<Utc>,
    /// Opaque contents
    #[serde(default)]
    pub contents: Contents,
    /// Member event records, when requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub events: Option<Vec<EventRecord>>,
}
