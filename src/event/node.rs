// Copyright 2025 Cowboy AI, LLC.

//! The event node: shared metadata, link sequences and a per-kind payload

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::kind::{EventKind, EventRef};
use crate::actor::Actor;
use crate::entity::{Contents, Lifecycle, Persist, SaveReceipt, Tags};
use crate::errors::{ProvenanceError, ProvenanceResult};
use crate::ingredient::Ingredient;
use crate::versionstamp::{VersionId, VersionstampGenerator};

/// Shortest accepted event name, in characters
pub const MIN_NAME_LEN: usize = 3;

pub(crate) fn check_name(name: &str) -> ProvenanceResult<()> {
    if name.chars().count() < MIN_NAME_LEN {
        return Err(ProvenanceError::InvalidName {
            name: name.to_string(),
            min_len: MIN_NAME_LEN,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ActionState {
    pub(crate) actor: Option<Arc<Actor>>,
    pub(crate) ingredients: Vec<Ingredient>,
    pub(crate) generated_materials: Vec<VersionId>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MeasurementState {
    pub(crate) actor: Option<Arc<Actor>>,
    pub(crate) material: Option<VersionId>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct AnalysisState {
    pub(crate) actor: Option<Arc<Actor>>,
    pub(crate) measurements: Vec<VersionId>,
    pub(crate) upstream_analyses: Vec<VersionId>,
}

#[derive(Debug, Clone)]
pub(crate) enum EventPayload {
    Material,
    Action(ActionState),
    Measurement(MeasurementState),
    Analysis(AnalysisState),
}

impl EventPayload {
    fn empty(kind: EventKind) -> Self {
        match kind {
            EventKind::Material => EventPayload::Material,
            EventKind::Action => EventPayload::Action(ActionState::default()),
            EventKind::Measurement => EventPayload::Measurement(MeasurementState::default()),
            EventKind::Analysis => EventPayload::Analysis(AnalysisState::default()),
        }
    }

    fn kind(&self) -> EventKind {
        match self {
            EventPayload::Material => EventKind::Material,
            EventPayload::Action(_) => EventKind::Action,
            EventPayload::Measurement(_) => EventKind::Measurement,
            EventPayload::Analysis(_) => EventKind::Analysis,
        }
    }

    fn actor_slot(&mut self) -> Option<&mut Option<Arc<Actor>>> {
        match self {
            EventPayload::Material => None,
            EventPayload::Action(state) => Some(&mut state.actor),
            EventPayload::Measurement(state) => Some(&mut state.actor),
            EventPayload::Analysis(state) => Some(&mut state.actor),
        }
    }
}

/// Why a node is structurally invalid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum NodeViolation {
    /// An upstream link points at a kind this node may not consume
    UpstreamKind {
        /// Offending link
        link: EventRef,
    },
    /// A downstream link points at a kind this node may not feed
    DownstreamKind {
        /// Offending link
        link: EventRef,
    },
    /// No actor performs the event
    MissingActor,
    /// Action with neither ingredients nor generated materials
    NoIngredientsOrProducts,
    /// Measurement with no associated material
    MissingMaterial,
    /// Analysis with neither measurements nor upstream analyses
    NoAnalysisInputs,
}

/// A vertex of the provenance graph
///
/// Equality is identity: two nodes are equal iff their ids match. Links are
/// non-owning [`EventRef`]s resolved through the owning
/// [`EventArena`](crate::EventArena).
#[derive(Debug, Clone)]
pub struct EventNode {
    id: VersionId,
    name: String,
    description: String,
    tags: Tags,
    lifecycle: Lifecycle,
    contents: Contents,
    upstream: Vec<EventRef>,
    downstream: Vec<EventRef>,
    payload: EventPayload,
}

impl PartialEq for EventNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EventNode {}

impl Hash for EventNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // names are immutable after construction
        self.name.hash(state);
        self.id.hash(state);
    }
}

impl fmt::Display for EventNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}, {})", self.kind(), self.name, self.id)
    }
}

impl EventNode {
    /// Construct a node of the given kind with a fresh id
    pub fn new(
        generator: &VersionstampGenerator,
        name: impl Into<String>,
        kind: EventKind,
    ) -> ProvenanceResult<Self> {
        let name = name.into();
        check_name(&name)?;
        Ok(Self::restored(
            generator.next(),
            name,
            Lifecycle::new(),
            EventPayload::empty(kind),
        ))
    }

    /// Construct a node whose kind is given as text
    pub fn with_kind_name(
        generator: &VersionstampGenerator,
        name: impl Into<String>,
        kind: &str,
    ) -> ProvenanceResult<Self> {
        let kind = kind.parse::<EventKind>()?;
        Self::new(generator, name, kind)
    }

    pub(crate) fn restored(
        id: VersionId,
        name: String,
        lifecycle: Lifecycle,
        payload: EventPayload,
    ) -> Self {
        Self {
            id,
            name,
            description: String::new(),
            tags: Tags::new(),
            lifecycle,
            contents: Contents::new(),
            upstream: Vec::new(),
            downstream: Vec::new(),
            payload,
        }
    }

    /// New material
    pub fn material(generator: &VersionstampGenerator, name: impl Into<String>) -> ProvenanceResult<Self> {
        Self::new(generator, name, EventKind::Material)
    }

    /// New action, optionally with its actor
    pub fn action(
        generator: &VersionstampGenerator,
        name: impl Into<String>,
        actor: Option<Arc<Actor>>,
    ) -> ProvenanceResult<Self> {
        let mut node = Self::new(generator, name, EventKind::Action)?;
        node.install_actor(actor);
        Ok(node)
    }

    /// New measurement; material and actor are assigned afterwards
    pub fn measurement(generator: &VersionstampGenerator, name: impl Into<String>) -> ProvenanceResult<Self> {
        Self::new(generator, name, EventKind::Measurement)
    }

    /// New analysis, optionally with its actor
    pub fn analysis(
        generator: &VersionstampGenerator,
        name: impl Into<String>,
        actor: Option<Arc<Actor>>,
    ) -> ProvenanceResult<Self> {
        let mut node = Self::new(generator, name, EventKind::Analysis)?;
        node.install_actor(actor);
        Ok(node)
    }

    fn install_actor(&mut self, actor: Option<Arc<Actor>>) {
        if let Some(slot) = self.payload.actor_slot() {
            *slot = actor;
        }
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

    /// Attach opaque contents (e.g. a material's `formula`)
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

    /// Kind, fixed at construction
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Tags
    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    /// Add a tag
    pub fn add_tag(&mut self, tag: impl Into<String>) -> bool {
        self.tags.insert(tag.into())
    }

    /// Contents
    pub fn contents(&self) -> &Contents {
        &self.contents
    }

    /// Lifecycle timestamps
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Minimal reference to this node
    pub fn event_ref(&self) -> EventRef {
        EventRef::new(self.id, self.kind())
    }

    /// Upstream links, in insertion order
    pub fn upstream(&self) -> &[EventRef] {
        &self.upstream
    }

    /// Downstream links, in insertion order
    pub fn downstream(&self) -> &[EventRef] {
        &self.downstream
    }

    /// Whether `id` is linked upstream
    pub fn has_upstream(&self, id: VersionId) -> bool {
        self.upstream.iter().any(|r| r.event_id == id)
    }

    /// Whether `id` is linked downstream
    pub fn has_downstream(&self, id: VersionId) -> bool {
        self.downstream.iter().any(|r| r.event_id == id)
    }

    /// Append `other` to the upstream sequence
    ///
    /// One half of a link: pair with `other.add_downstream(self)`, or use
    /// [`EventArena::link`](crate::EventArena::link) which does both.
    pub fn add_upstream(&mut self, other: &EventNode) {
        self.upstream.push(other.event_ref());
    }

    /// Append `other` to the downstream sequence
    ///
    /// One half of a link: pair with `other.add_upstream(self)`.
    pub fn add_downstream(&mut self, other: &EventNode) {
        self.downstream.push(other.event_ref());
    }

    pub(crate) fn push_upstream(&mut self, link: EventRef) {
        self.upstream.push(link);
    }

    pub(crate) fn push_downstream(&mut self, link: EventRef) {
        self.downstream.push(link);
    }

    /// Actor performing the event (never set on materials)
    pub fn actor(&self) -> Option<&Arc<Actor>> {
        match &self.payload {
            EventPayload::Material => None,
            EventPayload::Action(state) => state.actor.as_ref(),
            EventPayload::Measurement(state) => state.actor.as_ref(),
            EventPayload::Analysis(state) => state.actor.as_ref(),
        }
    }

    /// Assign the actor once
    ///
    /// Materials have no actor (`TypeMismatch`); a second assignment fails
    /// with `AlreadyAssigned`.
    pub fn set_actor(&mut self, actor: Arc<Actor>) -> ProvenanceResult<()> {
        let id = self.id;
        let kind = self.kind();
        let slot = self
            .payload
            .actor_slot()
            .ok_or_else(|| ProvenanceError::type_mismatch("action, measurement or analysis", kind))?;
        if slot.is_some() {
            return Err(ProvenanceError::AlreadyAssigned {
                event_id: id,
                field: "actor",
            });
        }
        *slot = Some(actor);
        Ok(())
    }

    /// Ingredients of an action (empty for other kinds)
    pub fn ingredients(&self) -> &[Ingredient] {
        match &self.payload {
            EventPayload::Action(state) => &state.ingredients,
            _ => &[],
        }
    }

    /// Materials generated by an action (empty for other kinds)
    pub fn generated_materials(&self) -> &[VersionId] {
        match &self.payload {
            EventPayload::Action(state) => &state.generated_materials,
            _ => &[],
        }
    }

    /// Material measured by a measurement
    pub fn measured_material(&self) -> Option<VersionId> {
        match &self.payload {
            EventPayload::Measurement(state) => state.material,
            _ => None,
        }
    }

    /// Measurements consumed by an analysis (empty for other kinds)
    pub fn measurements(&self) -> &[VersionId] {
        match &self.payload {
            EventPayload::Analysis(state) => &state.measurements,
            _ => &[],
        }
    }

    /// Analyses consumed by an analysis (empty for other kinds)
    pub fn upstream_analyses(&self) -> &[VersionId] {
        match &self.payload {
            EventPayload::Analysis(state) => &state.upstream_analyses,
            _ => &[],
        }
    }

    pub(crate) fn action_state_mut(&mut self) -> ProvenanceResult<&mut ActionState> {
        match &mut self.payload {
            EventPayload::Action(state) => Ok(state),
            other => Err(ProvenanceError::type_mismatch(EventKind::Action, other.kind())),
        }
    }

    pub(crate) fn measurement_state_mut(&mut self) -> ProvenanceResult<&mut MeasurementState> {
        match &mut self.payload {
            EventPayload::Measurement(state) => Ok(state),
            other => Err(ProvenanceError::type_mismatch(EventKind::Measurement, other.kind())),
        }
    }

    pub(crate) fn analysis_state_mut(&mut self) -> ProvenanceResult<&mut AnalysisState> {
        match &mut self.payload {
            EventPayload::Analysis(state) => Ok(state),
            other => Err(ProvenanceError::type_mismatch(EventKind::Analysis, other.kind())),
        }
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    pub(crate) fn set_tags(&mut self, tags: Tags) {
        self.tags = tags;
    }

    pub(crate) fn set_contents(&mut self, contents: Contents) {
        self.contents = contents;
    }

    /// Everything that makes this node structurally invalid right now
    pub fn violations(&self) -> Vec<NodeViolation> {
        let kind = self.kind();
        let mut violations: Vec<NodeViolation> = self
            .upstream
            .iter()
            .filter(|link| !kind.accepts_upstream(link.kind))
            .map(|link| NodeViolation::UpstreamKind { link: *link })
            .collect();
        violations.extend(
            self.downstream
                .iter()
                .filter(|link| !kind.accepts_downstream(link.kind))
                .map(|link| NodeViolation::DownstreamKind { link: *link }),
        );

        if kind.requires_actor() && self.actor().is_none() {
            violations.push(NodeViolation::MissingActor);
        }
        match &self.payload {
            EventPayload::Material => {}
            EventPayload::Action(state) => {
                if state.ingredients.is_empty() && state.generated_materials.is_empty() {
                    violations.push(NodeViolation::NoIngredientsOrProducts);
                }
            }
            EventPayload::Measurement(state) => {
                if state.material.is_none() {
                    violations.push(NodeViolation::MissingMaterial);
                }
            }
            EventPayload::Analysis(state) => {
                if state.measurements.is_empty() && state.upstream_analyses.is_empty() {
                    violations.push(NodeViolation::NoAnalysisInputs);
                }
            }
        }
        violations
    }

    /// Whether the node breaks the link table or lacks required state
    ///
    /// A pure query: incomplete nodes are expected while a graph is built.
    pub fn invalid(&self) -> bool {
        !self.violations().is_empty()
    }
}

impl Persist for EventNode {
    fn save(&mut self) -> SaveReceipt {
        let updated_at = self.lifecycle.touch();
        tracing::debug!(event_id = %self.id, kind = %self.kind(), "event saved");
        SaveReceipt {
            id: self.id,
            name: self.name.clone(),
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gen() -> VersionstampGenerator {
        VersionstampGenerator::new()
    }

    #[test]
    fn test_short_name_rejected() {
        let g = gen();
        assert_eq!(
            EventNode::material(&g, "Fe"),
            Err(ProvenanceError::InvalidName {
                name: "Fe".to_string(),
                min_len: 3
            })
        );
        assert!(EventNode::material(&g, "FeO").is_ok());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let g = gen();
        let err = EventNode::with_kind_name(&g, "procurement", "shipment").unwrap_err();
        assert_eq!(err, ProvenanceError::InvalidKind("shipment".to_string()));
        let node = EventNode::with_kind_name(&g, "procurement", "action").unwrap();
        assert_eq!(node.kind(), EventKind::Action);
    }

    #[test]
    fn test_identity_equality() {
        let g = gen();
        let a = EventNode::material(&g, "dopant_Cu").unwrap();
        let b = EventNode::material(&g, "dopant_Cu").unwrap();
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_manual_symmetric_link() {
        let g = gen();
        let mut mix = EventNode::action(&g, "mix", None).unwrap();
        let mut cu = EventNode::material(&g, "dopant_Cu").unwrap();
        mix.add_upstream(&cu);
        cu.add_downstream(&mix);
        assert!(mix.has_upstream(cu.id()));
        assert!(cu.has_downstream(mix.id()));
        assert_eq!(mix.upstream()[0].kind, EventKind::Material);
    }

    #[test]
    fn test_material_validity_follows_table() {
        let g = gen();
        let mut material = EventNode::material(&g, "anode").unwrap();
        let action = EventNode::action(&g, "cast", None).unwrap();
        let measurement = EventNode::measurement(&g, "XRD").unwrap();

        material.add_upstream(&action);
        material.add_downstream(&measurement);
        assert!(!material.invalid());

        let mut bad = EventNode::material(&g, "cathode").unwrap();
        bad.add_upstream(&measurement);
        assert!(bad.invalid());
        assert_eq!(
            bad.violations(),
            vec![NodeViolation::UpstreamKind {
                link: measurement.event_ref()
            }]
        );
    }

    #[test]
    fn test_action_without_inputs_is_invalid() {
        let g = gen();
        let operator = Arc::new(Actor::new(&g, "Operator", "lab operator"));
        let mut action = EventNode::action(&g, "heat", Some(operator)).unwrap();
        let material = EventNode::material(&g, "precursor").unwrap();
        action.add_upstream(&material);
        assert!(action.invalid());
        assert_eq!(action.violations(), vec![NodeViolation::NoIngredientsOrProducts]);
    }

    #[test]
    fn test_set_actor_is_single_assignment() {
        let g = gen();
        let aeris = Arc::new(Actor::new(&g, "Aeris", "XRD"));
        let mut xrd = EventNode::measurement(&g, "XRD").unwrap();
        xrd.set_actor(aeris.clone()).unwrap();
        assert_eq!(
            xrd.set_actor(aeris),
            Err(ProvenanceError::AlreadyAssigned {
                event_id: xrd.id(),
                field: "actor"
            })
        );

        let mut material = EventNode::material(&g, "powder").unwrap();
        let actor = Arc::new(Actor::new(&g, "Operator", ""));
        assert!(matches!(
            material.set_actor(actor),
            Err(ProvenanceError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_measured_material_only_on_measurements() {
        let g = gen();
        let powder = EventNode::material(&g, "powder").unwrap();
        let mut xrd = EventNode::measurement(&g, "XRD").unwrap();
        assert_eq!(xrd.measured_material(), None);
        assert_eq!(powder.measured_material(), None);

        xrd.measurement_state_mut().unwrap().material = Some(powder.id());
        assert_eq!(xrd.measured_material(), Some(powder.id()));
        assert!(!xrd.violations().contains(&NodeViolation::MissingMaterial));
    }

    #[test]
    fn test_save_returns_receipt() {
        let g = gen();
        let mut node = EventNode::material(&g, "electrolyte").unwrap();
        let receipt = node.save();
        assert_eq!(receipt.id, node.id());
        assert_eq!(receipt.name, "electrolyte");
        assert_eq!(receipt.updated_at, node.lifecycle().updated_at);
    }
}
