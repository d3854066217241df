// Copyright 2025 Cowboy AI, LLC.

//! Structural record views of events and their reconstruction
//!
//! Links to other events are serialized as minimal [`LinkRecord`]s. Actor,
//! ingredient and material sub-records are nested in full; a nested material
//! never nests further, which bounds the recursion at one level.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::kind::{EventKind, EventRef};
use super::node::{check_name, ActionState, AnalysisState, EventNode, EventPayload, MeasurementState};
use crate::actor::{Actor, ActorRecord};
use crate::entity::{Contents, Lifecycle};
use crate::errors::{ProvenanceError, ProvenanceResult};
use crate::ingredient::Ingredient;
use crate::versionstamp::VersionId;

/// Serialized form of an [`EventNode`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EventRecord {
    /// Identifier
    pub id: VersionId,
    /// Name
    pub name: String,
    /// Kind as text; rebuilding rejects unknown kinds
    pub kind: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last save time
    pub updated_at: DateTime<Utc>,
    /// Opaque contents
    #[serde(default)]
    pub contents: Contents,
    /// Upstream links
    #[serde(default)]
    pub upstream: Vec<LinkRecord>,
    /// Downstream links
    #[serde(default)]
    pub downstream: Vec<LinkRecord>,
    /// Actor, for actions, measurements and analyses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActorRecord>,
    /// Action ingredients
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingredients: Vec<IngredientRecord>,
    /// Materials generated by an action
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub generated_materials: Vec<LinkRecord>,
    /// Material measured by a measurement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<Box<EventRecord>>,
    /// Measurements consumed by an analysis
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measurements: Vec<LinkRecord>,
    /// Analyses consumed by an analysis
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstream_analyses: Vec<LinkRecord>,
}

/// Serialized form of an [`EventRef`]
///
/// The kind stays text so an unrecognised kind surfaces as `UnknownEventKind`
/// when the link is rebuilt, not as a parse failure of the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LinkRecord {
    /// Linked event id
    pub event_id: VersionId,
    /// Linked event kind as text
    pub kind: String,
}

impl LinkRecord {
    /// The link, rejecting unknown kinds with `UnknownEventKind`
    pub fn event_ref(&self) -> ProvenanceResult<EventRef> {
        let kind = self
            .kind
            .parse::<EventKind>()
            .map_err(|_| ProvenanceError::UnknownEventKind(self.kind.clone()))?;
        Ok(EventRef::new(self.event_id, kind))
    }
}

impl From<EventRef> for LinkRecord {
    fn from(link: EventRef) -> Self {
        Self {
            event_id: link.event_id,
            kind: link.kind.to_string(),
        }
    }
}

/// Serialized form of an [`Ingredient`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IngredientRecord {
    /// Name
    pub name: String,
    /// Amount, absent when unspecified
    #[serde(default)]
    pub amount: Option<f64>,
    /// Unit, absent when unspecified
    #[serde(default)]
    pub unit: Option<String>,
    /// Opaque contents
    #[serde(default)]
    pub contents: Contents,
    /// The consumed material
    pub material: Box<EventRecord>,
}

impl EventRecord {
    /// Record as a JSON value
    pub fn to_value(&self) -> ProvenanceResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Parse a record from a JSON value
    pub fn from_value(value: serde_json::Value) -> ProvenanceResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Kind, rejecting unknown names with `UnknownEventKind`
    pub fn event_kind(&self) -> ProvenanceResult<EventKind> {
        self.kind
            .parse::<EventKind>()
            .map_err(|_| ProvenanceError::UnknownEventKind(self.kind.clone()))
    }

    /// Nested material records (ingredient materials and a measured material)
    pub fn nested_materials(&self) -> impl Iterator<Item = &EventRecord> {
        self.ingredients
            .iter()
            .map(|ingredient| &*ingredient.material)
            .chain(self.material.as_deref())
    }
}

fn material_id(record: &EventRecord) -> ProvenanceResult<VersionId> {
    let kind = record.event_kind()?;
    if kind != EventKind::Material {
        return Err(ProvenanceError::type_mismatch(EventKind::Material, kind));
    }
    Ok(record.id)
}

fn refs_to_ids(links: &[LinkRecord], expected: EventKind) -> ProvenanceResult<Vec<VersionId>> {
    links
        .iter()
        .map(|link| {
            let link = link.event_ref()?;
            if link.kind == expected {
                Ok(link.event_id)
            } else {
                Err(ProvenanceError::type_mismatch(expected, link.kind))
            }
        })
        .collect()
}

fn ids_to_refs(ids: &[VersionId], kind: EventKind) -> Vec<LinkRecord> {
    ids.iter().map(|id| EventRef::new(*id, kind).into()).collect()
}

fn links_to_records(links: &[EventRef]) -> Vec<LinkRecord> {
    links.iter().copied().map(LinkRecord::from).collect()
}

/// Build the record of `node`, resolving nested materials through `lookup`
pub(crate) fn build_record<'a, F>(node: &EventNode, lookup: &F) -> ProvenanceResult<EventRecord>
where
    F: Fn(VersionId) -> Option<&'a EventNode>,
{
    let nested = |id: VersionId| -> ProvenanceResult<Box<EventRecord>> {
        let material = lookup(id).ok_or(ProvenanceError::EventNotFound(id))?;
        Ok(Box::new(build_record(material, lookup)?))
    };

    let ingredients = node
        .ingredients()
        .iter()
        .map(|ingredient| {
            Ok(IngredientRecord {
                name: ingredient.name().to_string(),
                amount: ingredient.amount(),
                unit: ingredient.unit().map(str::to_string),
                contents: ingredient.contents().clone(),
                material: nested(ingredient.material())?,
            })
        })
        .collect::<ProvenanceResult<Vec<_>>>()?;

    let material = node.measured_material().map(nested).transpose()?;

    Ok(EventRecord {
        id: node.id(),
        name: node.name().to_string(),
        kind: node.kind().to_string(),
        description: node.description().to_string(),
        tags: node.tags().iter().cloned().collect(),
        created_at: node.lifecycle().created_at,
        updated_at: node.lifecycle().updated_at,
        contents: node.contents().clone(),
        upstream: links_to_records(node.upstream()),
        downstream: links_to_records(node.downstream()),
        actor: node.actor().map(|actor| actor.to_record()),
        ingredients,
        generated_materials: ids_to_refs(node.generated_materials(), EventKind::Material),
        material,
        measurements: ids_to_refs(node.measurements(), EventKind::Measurement),
        upstream_analyses: ids_to_refs(node.upstream_analyses(), EventKind::Analysis),
    })
}

impl EventNode {
    /// Rebuild a variant-correct node from its record
    ///
    /// Nested material records only contribute their ids here; use
    /// [`EventArena::import_record`](crate::EventArena::import_record) to
    /// restore them as nodes too.
    pub fn from_record(record: &EventRecord) -> ProvenanceResult<Self> {
        let kind = record.event_kind()?;
        check_name(&record.name)?;
        let actor = record
            .actor
            .clone()
            .map(|actor| Arc::new(Actor::from_record(actor)));

        let payload = match kind {
            EventKind::Material => EventPayload::Material,
            EventKind::Action => {
                let ingredients = record
                    .ingredients
                    .iter()
                    .map(|ingredient| {
                        Ok(Ingredient::restored(
                            ingredient.name.clone(),
                            material_id(&ingredient.material)?,
                            ingredient.amount,
                            ingredient.unit.clone(),
                            ingredient.contents.clone(),
                        ))
                    })
                    .collect::<ProvenanceResult<Vec<_>>>()?;
                EventPayload::Action(ActionState {
                    actor,
                    ingredients,
                    generated_materials: refs_to_ids(
                        &record.generated_materials,
                        EventKind::Material,
                    )?,
                })
            }
            EventKind::Measurement => EventPayload::Measurement(MeasurementState {
                actor,
                material: record.material.as_deref().map(material_id).transpose()?,
            }),
            EventKind::Analysis => EventPayload::Analysis(AnalysisState {
                actor,
                measurements: refs_to_ids(&record.measurements, EventKind::Measurement)?,
                upstream_analyses: refs_to_ids(&record.upstream_analyses, EventKind::Analysis)?,
            }),
        };

        let mut node = EventNode::restored(
            record.id,
            record.name.clone(),
            Lifecycle::restored(record.created_at, record.updated_at),
            payload,
        );
        node.set_description(record.description.clone());
        node.set_tags(record.tags.iter().cloned().collect());
        node.set_contents(record.contents.clone());
        for link in &record.upstream {
            node.push_upstream(link.event_ref()?);
        }
        for link in &record.downstream {
            node.push_downstream(link.event_ref()?);
        }
        Ok(node)
    }

    /// Rebuild a node from a JSON record
    pub fn from_dict(value: serde_json::Value) -> ProvenanceResult<Self> {
        Self::from_record(&EventRecord::from_value(value)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versionstamp::VersionstampGenerator;
    use serde_json::json;

    fn no_lookup(_: VersionId) -> Option<&'static EventNode> {
        None
    }

    fn material_record(gen: &VersionstampGenerator) -> EventRecord {
        let node = EventNode::material(gen, "Titanium Dioxide").unwrap();
        build_record(&node, &no_lookup).unwrap()
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let gen = VersionstampGenerator::new();
        let mut record = material_record(&gen);
        record.kind = "sample".to_string();
        assert_eq!(
            EventNode::from_record(&record),
            Err(ProvenanceError::UnknownEventKind("sample".to_string()))
        );
    }

    #[test]
    fn test_unknown_link_kind_rejected() {
        let gen = VersionstampGenerator::new();
        let mut value = material_record(&gen).to_value().unwrap();
        value["upstream"] = json!([{ "event_id": gen.next().to_string(), "kind": "reagent" }]);

        let record = EventRecord::from_value(value).unwrap();
        assert_eq!(
            EventNode::from_record(&record),
            Err(ProvenanceError::UnknownEventKind("reagent".to_string()))
        );
    }

    #[test]
    fn test_unknown_generated_material_kind_rejected() {
        let gen = VersionstampGenerator::new();
        let action = EventNode::action(&gen, "grind", None).unwrap();
        let mut record = build_record(&action, &no_lookup).unwrap();
        record.generated_materials.push(LinkRecord {
            event_id: gen.next(),
            kind: "powder".to_string(),
        });
        assert_eq!(
            EventNode::from_record(&record),
            Err(ProvenanceError::UnknownEventKind("powder".to_string()))
        );
    }

    #[test]
    fn test_material_record_shape() {
        let gen = VersionstampGenerator::new();
        let record = material_record(&gen);
        let value = record.to_value().unwrap();
        assert_eq!(value["kind"], json!("material"));
        assert_eq!(value["upstream"], json!([]));
        assert!(value.get("ingredients").is_none());
        assert!(value.get("actor").is_none());
    }

    #[test]
    fn test_nested_material_must_be_material() {
        let gen = VersionstampGenerator::new();
        let mut nested = material_record(&gen);
        nested.kind = "analysis".to_string();
        let action = EventNode::action(&gen, "grind", None).unwrap();
        let mut record = build_record(&action, &no_lookup).unwrap();
        record.ingredients.push(IngredientRecord {
            name: "TiO2".to_string(),
            amount: Some(1.0),
            unit: Some("g".to_string()),
            contents: Contents::new(),
            material: Box::new(nested),
        });
        assert!(matches!(
            EventNode::from_record(&record),
            Err(ProvenanceError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_from_dict_restores_links() {
        let gen = VersionstampGenerator::new();
        let mut material = EventNode::material(&gen, "Iron powder").unwrap();
        let action = EventNode::action(&gen, "procurement", None).unwrap();
        material.add_upstream(&action);

        let value = build_record(&material, &no_lookup).unwrap().to_value().unwrap();
        let back = EventNode::from_dict(value).unwrap();
        assert_eq!(back, material);
        assert_eq!(back.upstream(), material.upstream());
        assert_eq!(back.lifecycle(), material.lifecycle());
    }
}
