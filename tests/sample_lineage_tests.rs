// Copyright 2025 Cowboy AI, LLC.

use std::sync::Arc;

use lab_provenance::{
    tags, Actor, EventKind, Experiment, Ingredient, Lab, ProvenanceError, Sample,
    VersionstampGenerator, WHOLE_UNIT,
};
use pretty_assertions::assert_eq;

fn sample() -> (Sample, Arc<Actor>) {
    let generator = Arc::new(VersionstampGenerator::new());
    let operator = Arc::new(Actor::new(&generator, "Operator", "lab operator"));
    (Sample::new(generator, "first_sample"), operator)
}

/// [A0(Fe), A1, A2]: only the first action names an ingredient
#[test]
fn linear_chain_generates_intermediates() {
    let (mut sample, operator) = sample();
    let arena = sample.arena_mut();
    let fe = arena.create_material("Iron powder").unwrap();
    let a0 = arena.create_action("procurement", Some(operator.clone())).unwrap();
    let a1 = arena.create_action("grind", Some(operator.clone())).unwrap();
    let a2 = arena.create_action("sinter", Some(operator)).unwrap();
    arena.add_ingredient(a0, fe).unwrap();

    sample.add_linear_sample_process(&[a0, a1, a2]).unwrap();

    assert_eq!(sample.events_of_kind(EventKind::Action).count(), 3);
    let materials: Vec<_> = sample.events_of_kind(EventKind::Material).collect();
    assert_eq!(materials.len(), 4);
    assert!(materials.iter().filter(|m| m.id() != fe).count() >= 2);

    let a1_node = sample.arena().node(a1).unwrap();
    assert_eq!(a1_node.ingredients().len(), 1);
    assert_eq!(a1_node.ingredients()[0].unit(), Some(WHOLE_UNIT));
    assert_eq!(
        Some(a1_node.ingredients()[0].material()),
        sample.arena().node(a0).unwrap().generated_materials().first().copied()
    );

    for event in sample.events() {
        assert!(!event.invalid(), "{event}: {:?}", event.violations());
    }
    assert!(sample.valid_graph());

    let order = sample.graph().topological_order().unwrap();
    let position = |id| order.iter().position(|v| *v == id).unwrap();
    assert!(position(fe) < position(a0));
    assert!(position(a0) < position(a1));
    assert!(position(a1) < position(a2));
}

#[test]
fn chain_reuses_existing_products() {
    let (mut sample, operator) = sample();
    let arena = sample.arena_mut();
    let tio2 = arena.create_material("Titanium Dioxide").unwrap();
    let buy = arena.create_action("procurement", Some(operator.clone())).unwrap();
    arena.add_generated_material(buy, tio2).unwrap();
    let grind = arena.create_action("grind", Some(operator)).unwrap();
    let weighed = Ingredient::new(arena.node(tio2).unwrap(), 1.0, "g").unwrap();
    arena.add_ingredient(grind, weighed).unwrap();
    let before = arena.len();

    sample.add_linear_sample_process(&[buy, grind]).unwrap();

    // only the final product is new
    assert_eq!(sample.arena().len(), before + 1);
    assert_eq!(sample.event_ids().len(), 4);
    assert_eq!(sample.arena().node(grind).unwrap().ingredients().len(), 1);
    assert!(sample.valid_graph());
}

#[test]
fn ambiguous_chain_rejected_before_mutation() {
    let (mut sample, operator) = sample();
    let arena = sample.arena_mut();
    let a0 = arena.create_action("split", Some(operator.clone())).unwrap();
    let left = arena.create_material("left half").unwrap();
    let right = arena.create_material("right half").unwrap();
    arena.add_generated_material(a0, left).unwrap();
    arena.add_generated_material(a0, right).unwrap();
    let a1 = arena.create_action("grind", Some(operator)).unwrap();
    let before = arena.len();

    assert_eq!(
        sample.add_linear_sample_process(&[a0, a1]),
        Err(ProvenanceError::AmbiguousChain {
            action_id: a0,
            generated: 2
        })
    );
    assert!(sample.event_ids().is_empty());
    assert_eq!(sample.arena().len(), before);
    assert!(sample.arena().node(a1).unwrap().ingredients().is_empty());
}

#[test]
fn final_action_may_generate_many() {
    let (mut sample, operator) = sample();
    let arena = sample.arena_mut();
    let ore = arena.create_material("ore sample").unwrap();
    let a0 = arena.create_action("crush", Some(operator.clone())).unwrap();
    arena.add_ingredient(a0, ore).unwrap();
    let a1 = arena.create_action("sieve", Some(operator)).unwrap();
    let fine = arena.create_material("fine fraction").unwrap();
    let coarse = arena.create_material("coarse fraction").unwrap();
    arena.add_generated_material(a1, fine).unwrap();
    arena.add_generated_material(a1, coarse).unwrap();

    sample.add_linear_sample_process(&[a0, a1]).unwrap();
    assert!(sample.contains_event(fine));
    assert!(sample.contains_event(coarse));
    assert!(sample.valid_graph());
}

#[test]
fn disconnected_sample_is_invalid() {
    let (mut sample, operator) = sample();
    let arena = sample.arena_mut();
    let fe = arena.create_material("Iron powder").unwrap();
    let a0 = arena.create_action("procurement", Some(operator)).unwrap();
    arena.add_ingredient(a0, fe).unwrap();
    let stray = arena.create_material("stray powder").unwrap();

    sample.add_linear_sample_process(&[a0]).unwrap();
    assert!(sample.valid_graph());

    sample.add_event(stray).unwrap();
    let report = sample.lineage_report();
    assert_eq!(report.component_count, 2);
    assert!(report.acyclic);
    assert!(!sample.valid_graph());
}

#[test]
fn action_material_action_cycle_is_invalid() {
    let (mut sample, operator) = sample();
    let arena = sample.arena_mut();
    let action = arena.create_action("anneal", Some(operator)).unwrap();
    let material = arena.generate_generic_material(action, Some("annealed foil")).unwrap();
    arena.add_ingredient(action, material).unwrap();

    sample.add_event(action).unwrap();
    sample.add_event(material).unwrap();

    assert!(!sample.arena().node(action).unwrap().invalid());
    let report = sample.lineage_report();
    assert!(!report.acyclic);
    assert_eq!(report.component_count, 1);
    assert!(!sample.valid_graph());
    assert_eq!(sample.graph().topological_order(), None);
}

#[test]
fn links_to_non_members_count_as_external() {
    let (mut sample, operator) = sample();
    let arena = sample.arena_mut();
    let fe = arena.create_material("Iron powder").unwrap();
    let a0 = arena.create_action("procurement", Some(operator)).unwrap();
    arena.add_ingredient(a0, fe).unwrap();

    sample.add_event(a0).unwrap();
    let graph = sample.graph();
    assert_eq!(graph.vertex_count(), 2);
    assert_eq!(graph.external_vertices().count(), 1);
    assert!(graph.has_edge(fe, a0));
    // the external vertex still joins the component
    assert!(sample.valid_graph());
}

#[test]
fn experiment_samples_round_trip_through_records() {
    let generator = Arc::new(VersionstampGenerator::new());
    let mut lab = Lab::new(generator.clone(), "Ceder Group", "acl", "Berkeley");
    let project = lab.create_project("ceramics", None, tags(["oxides"])).clone();
    let mut experiment = Experiment::new(generator.clone(), "TiO2 sinter", &lab, &project);

    let operator = Arc::new(Actor::new(&generator, "Operator", ""));
    let sample = experiment.create_sample("pellet", tags(["xrd"]));
    let arena = sample.arena_mut();
    let tio2 = arena.create_material("Titanium Dioxide").unwrap();
    let grind = arena.create_action("grind", Some(operator)).unwrap();
    arena.add_ingredient(grind, tio2).unwrap();
    sample.add_linear_sample_process(&[grind]).unwrap();

    let value = sample.to_dict(true).unwrap();
    let restored = Sample::from_dict(generator, value).unwrap();

    assert_eq!(restored.name(), sample.name());
    assert_eq!(restored.tags(), sample.tags());
    assert_eq!(restored.to_record(true).unwrap(), sample.to_record(true).unwrap());
    assert!(restored.valid_graph());
}

#[test]
fn unknown_kind_in_sample_record_rejected() {
    let (mut sample, operator) = sample();
    let arena = sample.arena_mut();
    let fe = arena.create_material("Iron powder").unwrap();
    let a0 = arena.create_action("procurement", Some(operator)).unwrap();
    arena.add_ingredient(a0, fe).unwrap();
    sample.add_linear_sample_process(&[a0]).unwrap();

    let mut value = sample.to_dict(true).unwrap();
    value["events"][0]["kind"] = serde_json::json!("reagent");
    let generator = sample.generator().clone();
    assert_eq!(
        Sample::from_dict(generator, value).err(),
        Some(ProvenanceError::UnknownEventKind("reagent".to_string()))
    );
}
