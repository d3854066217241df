// Copyright 2025 Cowboy AI, LLC.

//! Id-indexed storage for event nodes
//!
//! Links between nodes are id references, so every operation that touches two
//! nodes (linking, ingredients, generated materials, measurement material,
//! analysis inputs) goes through the arena. Each operation checks everything it
//! needs before mutating, so a failed call leaves no half-added link behind.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, info};

use super::kind::{EventKind, EventRef};
use super::node::EventNode;
use super::record::{build_record, EventRecord};
use crate::actor::Actor;
use crate::entity::{Persist, SaveReceipt};
use crate::errors::{ProvenanceError, ProvenanceResult};
use crate::ingredient::{Ingredient, IngredientInput};
use crate::versionstamp::{VersionId, VersionstampGenerator};

/// Owner of event nodes, keyed by id in insertion order
#[derive(Debug, Clone)]
pub struct EventArena {
    generator: Arc<VersionstampGenerator>,
    nodes: IndexMap<VersionId, EventNode>,
}

impl EventArena {
    /// Empty arena minting ids from `generator`
    pub fn new(generator: Arc<VersionstampGenerator>) -> Self {
        Self {
            generator,
            nodes: IndexMap::new(),
        }
    }

    /// The generator used for new nodes
    pub fn generator(&self) -> &Arc<VersionstampGenerator> {
        &self.generator
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is held here
    pub fn contains(&self, id: VersionId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Node by id
    pub fn get(&self, id: VersionId) -> Option<&EventNode> {
        self.nodes.get(&id)
    }

    /// Mutable node by id
    pub fn get_mut(&mut self, id: VersionId) -> Option<&mut EventNode> {
        self.nodes.get_mut(&id)
    }

    /// Node by id, or `EventNotFound`
    pub fn node(&self, id: VersionId) -> ProvenanceResult<&EventNode> {
        self.nodes.get(&id).ok_or(ProvenanceError::EventNotFound(id))
    }

    fn node_mut(&mut self, id: VersionId) -> ProvenanceResult<&mut EventNode> {
        self.nodes
            .get_mut(&id)
            .ok_or(ProvenanceError::EventNotFound(id))
    }

    /// Node by id, checked against an expected kind
    pub fn node_of_kind(&self, id: VersionId, kind: EventKind) -> ProvenanceResult<&EventNode> {
        let node = self.node(id)?;
        if node.kind() != kind {
            return Err(ProvenanceError::type_mismatch(kind, node.kind()));
        }
        Ok(node)
    }

    /// All nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &EventNode> {
        self.nodes.values()
    }

    /// Take ownership of a constructed node
    pub fn insert(&mut self, node: EventNode) -> ProvenanceResult<VersionId> {
        let id = node.id();
        if self.nodes.contains_key(&id) {
            return Err(ProvenanceError::DuplicateEvent(id));
        }
        debug!(event_id = %id, kind = %node.kind(), name = %node.name(), "event created");
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Create a node of `kind`
    pub fn create(&mut self, name: impl Into<String>, kind: EventKind) -> ProvenanceResult<VersionId> {
        let node = EventNode::new(&self.generator, name, kind)?;
        self.insert(node)
    }

    /// Create a material
    pub fn create_material(&mut self, name: impl Into<String>) -> ProvenanceResult<VersionId> {
        self.create(name, EventKind::Material)
    }

    /// Create an action, optionally performed by `actor`
    pub fn create_action(
        &mut self,
        name: impl Into<String>,
        actor: Option<Arc<Actor>>,
    ) -> ProvenanceResult<VersionId> {
        let node = EventNode::action(&self.generator, name, actor)?;
        self.insert(node)
    }

    /// Create a measurement
    pub fn create_measurement(&mut self, name: impl Into<String>) -> ProvenanceResult<VersionId> {
        self.create(name, EventKind::Measurement)
    }

    /// Create an analysis, optionally performed by `actor`
    pub fn create_analysis(
        &mut self,
        name: impl Into<String>,
        actor: Option<Arc<Actor>>,
    ) -> ProvenanceResult<VersionId> {
        let node = EventNode::analysis(&self.generator, name, actor)?;
        self.insert(node)
    }

    /// Link `upstream -> downstream` on both nodes
    ///
    /// Returns `false` when the link already existed. The link table is not
    /// enforced here; a node with a disallowed neighbour simply reports
    /// [`EventNode::invalid`].
    pub fn link(&mut self, upstream: VersionId, downstream: VersionId) -> ProvenanceResult<bool> {
        let up_ref = self.node(upstream)?.event_ref();
        let down_ref = self.node(downstream)?.event_ref();
        if self.node(downstream)?.has_upstream(upstream) {
            return Ok(false);
        }
        self.node_mut(upstream)?.push_downstream(down_ref);
        self.node_mut(downstream)?.push_upstream(up_ref);
        debug!(
            upstream = %upstream,
            upstream_kind = %up_ref.kind,
            downstream = %downstream,
            downstream_kind = %down_ref.kind,
            "events linked"
        );
        Ok(true)
    }

    /// Register an ingredient on an action and link its material upstream
    ///
    /// A bare material id is wrapped as an unspecified-amount ingredient.
    pub fn add_ingredient(
        &mut self,
        action: VersionId,
        ingredient: impl Into<IngredientInput>,
    ) -> ProvenanceResult<()> {
        self.node_of_kind(action, EventKind::Action)?;
        let ingredient = match ingredient.into() {
            IngredientInput::Ingredient(ingredient) => {
                self.node_of_kind(ingredient.material(), EventKind::Material)?;
                ingredient
            }
            IngredientInput::Material(material) => {
                Ingredient::unspecified(self.node(material)?)?
            }
        };
        let material = ingredient.material();
        debug!(action = %action, material = %material, ingredient = %ingredient.name(), "ingredient added");
        self.node_mut(action)?.action_state_mut()?.ingredients.push(ingredient);
        self.link(material, action)?;
        Ok(())
    }

    /// Register `material` as generated by `action`; duplicates are a no-op
    pub fn add_generated_material(
        &mut self,
        action: VersionId,
        material: VersionId,
    ) -> ProvenanceResult<bool> {
        if self
            .node_of_kind(action, EventKind::Action)?
            .generated_materials()
            .contains(&material)
        {
            return Ok(false);
        }
        self.node_of_kind(material, EventKind::Material)?;
        self.node_mut(action)?
            .action_state_mut()?
            .generated_materials
            .push(material);
        self.link(action, material)?;
        Ok(true)
    }

    /// Create, link and return the single material an action produces
    ///
    /// Without a `name`, the material is named after the action, its
    /// ingredients and a fresh versionstamp.
    pub fn generate_generic_material(
        &mut self,
        action: VersionId,
        name: Option<&str>,
    ) -> ProvenanceResult<VersionId> {
        let node = self.node_of_kind(action, EventKind::Action)?;
        if !node.generated_materials().is_empty() {
            return Err(ProvenanceError::AlreadyGenerated { action_id: action });
        }
        let name = match name {
            Some(name) => name.to_string(),
            None => generic_material_name(node, self.generator.next()),
        };

        let material = EventNode::material(&self.generator, name)?;
        let material = self.insert(material)?;
        self.add_generated_material(action, material)?;
        info!(action = %action, material = %material, "generic material generated");
        Ok(material)
    }

    /// Assign the one material a measurement is taken from
    pub fn set_material(&mut self, measurement: VersionId, material: VersionId) -> ProvenanceResult<()> {
        if self
            .node_of_kind(measurement, EventKind::Measurement)?
            .measured_material()
            .is_some()
        {
            return Err(ProvenanceError::AlreadyAssigned {
                event_id: measurement,
                field: "material",
            });
        }
        self.node_of_kind(material, EventKind::Material)?;
        self.node_mut(measurement)?.measurement_state_mut()?.material = Some(material);
        self.link(material, measurement)?;
        Ok(())
    }

    /// Assign the actor of an action, measurement or analysis once
    pub fn set_actor(&mut self, event: VersionId, actor: Arc<Actor>) -> ProvenanceResult<()> {
        self.node_mut(event)?.set_actor(actor)
    }

    /// Feed a measurement into an analysis; duplicates are a no-op
    pub fn add_measurement(&mut self, analysis: VersionId, measurement: VersionId) -> ProvenanceResult<bool> {
        if self
            .node_of_kind(analysis, EventKind::Analysis)?
            .measurements()
            .contains(&measurement)
        {
            return Ok(false);
        }
        self.node_of_kind(measurement, EventKind::Measurement)?;
        self.node_mut(analysis)?
            .analysis_state_mut()?
            .measurements
            .push(measurement);
        self.link(measurement, analysis)?;
        Ok(true)
    }

    /// Feed another analysis into an analysis; duplicates are a no-op
    pub fn add_upstream_analysis(
        &mut self,
        analysis: VersionId,
        upstream: VersionId,
    ) -> ProvenanceResult<bool> {
        if self
            .node_of_kind(analysis, EventKind::Analysis)?
            .upstream_analyses()
            .contains(&upstream)
        {
            return Ok(false);
        }
        self.node_of_kind(upstream, EventKind::Analysis)?;
        self.node_mut(analysis)?
            .analysis_state_mut()?
            .upstream_analyses
            .push(upstream);
        self.link(upstream, analysis)?;
        Ok(true)
    }

    /// Structural record of a node with nested actor, ingredient and material records
    pub fn to_record(&self, id: VersionId) -> ProvenanceResult<EventRecord> {
        build_record(self.node(id)?, &|id| self.nodes.get(&id))
    }

    /// Record of a node as JSON
    pub fn to_dict(&self, id: VersionId) -> ProvenanceResult<serde_json::Value> {
        self.to_record(id)?.to_value()
    }

    /// Rebuild a node and any nested materials from a record
    ///
    /// Nodes already held under the same id are kept as they are.
    pub fn import_record(&mut self, record: &EventRecord) -> ProvenanceResult<VersionId> {
        // rebuild everything first so a bad record inserts nothing
        let node = EventNode::from_record(record)?;
        let nested = record
            .nested_materials()
            .map(EventNode::from_record)
            .collect::<ProvenanceResult<Vec<_>>>()?;

        for material in nested {
            if !self.contains(material.id()) {
                self.insert(material)?;
            }
        }
        let id = node.id();
        if !self.contains(id) {
            self.insert(node)?;
        }
        Ok(id)
    }

    /// Rebuild a node from a JSON record
    pub fn from_dict(&mut self, value: serde_json::Value) -> ProvenanceResult<VersionId> {
        self.import_record(&EventRecord::from_value(value)?)
    }

    /// Save one node
    pub fn save(&mut self, id: VersionId) -> ProvenanceResult<SaveReceipt> {
        Ok(self.node_mut(id)?.save())
    }

    /// References of every node linked to `id` in either direction
    pub fn neighbours(&self, id: VersionId) -> ProvenanceResult<Vec<EventRef>> {
        let node = self.node(id)?;
        Ok(node
            .upstream()
            .iter()
            .chain(node.downstream())
            .copied()
            .collect())
    }
}

fn generic_material_name(action: &EventNode, stamp: VersionId) -> String {
    let ingredients: Vec<&str> = action.ingredients().iter().map(Ingredient::name).collect();
    if ingredients.is_empty() {
        format!("{}:{}", action.name(), stamp)
    } else {
        format!("{}:{}:{}", action.name(), ingredients.join("+"), stamp)
    }
}
