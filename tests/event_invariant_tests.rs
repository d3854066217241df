// Copyright 2025 Cowboy AI, LLC.

use std::sync::Arc;

use lab_provenance::{
    Actor, EventArena, EventKind, EventNode, Ingredient, NodeViolation, ProvenanceError,
    VersionstampGenerator,
};
use test_case::test_case;

fn arena() -> EventArena {
    EventArena::new(Arc::new(VersionstampGenerator::new()))
}

fn actor(arena: &EventArena, name: &str) -> Arc<Actor> {
    Arc::new(Actor::new(arena.generator(), name, ""))
}

#[test_case(EventKind::Material, EventKind::Action, false ; "action from material")]
#[test_case(EventKind::Action, EventKind::Material, false ; "material from action")]
#[test_case(EventKind::Material, EventKind::Measurement, false ; "measurement from material")]
#[test_case(EventKind::Measurement, EventKind::Analysis, false ; "analysis from measurement")]
#[test_case(EventKind::Analysis, EventKind::Analysis, false ; "analysis from analysis")]
#[test_case(EventKind::Action, EventKind::Measurement, true ; "measurement from action")]
#[test_case(EventKind::Action, EventKind::Action, true ; "action from action")]
#[test_case(EventKind::Measurement, EventKind::Material, true ; "material from measurement")]
#[test_case(EventKind::Analysis, EventKind::Measurement, true ; "measurement from analysis")]
#[test_case(EventKind::Material, EventKind::Analysis, true ; "analysis from material")]
fn link_kind_table(upstream: EventKind, downstream: EventKind, breaks_table: bool) {
    let mut arena = arena();
    let up = arena.create("upstream", upstream).unwrap();
    let down = arena.create("downstream", downstream).unwrap();
    arena.link(up, down).unwrap();

    let up_violates = arena
        .node(up)
        .unwrap()
        .violations()
        .iter()
        .any(|v| matches!(v, NodeViolation::DownstreamKind { .. }));
    let down_violates = arena
        .node(down)
        .unwrap()
        .violations()
        .iter()
        .any(|v| matches!(v, NodeViolation::UpstreamKind { .. }));
    assert_eq!(up_violates || down_violates, breaks_table);
}

#[test]
fn complete_events_are_valid() {
    let mut arena = arena();
    let operator = actor(&arena, "Operator");
    let aeris = actor(&arena, "Aeris");
    let cnn = actor(&arena, "CNN");

    let precursor = arena.create_material("precursor").unwrap();
    let heat = arena.create_action("heat", Some(operator)).unwrap();
    arena.add_ingredient(heat, precursor).unwrap();
    let product = arena.generate_generic_material(heat, None).unwrap();

    let xrd = arena.create_measurement("XRD").unwrap();
    arena.set_material(xrd, product).unwrap();
    arena.set_actor(xrd, aeris).unwrap();

    let phase = arena.create_analysis("phase id", Some(cnn)).unwrap();
    arena.add_measurement(phase, xrd).unwrap();

    for id in [precursor, heat, product, xrd, phase] {
        let node = arena.node(id).unwrap();
        assert!(!node.invalid(), "{node}: {:?}", node.violations());
    }
}

#[test]
fn incomplete_events_report_missing_state() {
    let mut arena = arena();
    let heat = arena.create_action("heat", None).unwrap();
    let xrd = arena.create_measurement("XRD").unwrap();
    let phase = arena.create_analysis("phase id", None).unwrap();

    assert_eq!(
        arena.node(heat).unwrap().violations(),
        vec![NodeViolation::MissingActor, NodeViolation::NoIngredientsOrProducts]
    );
    assert_eq!(
        arena.node(xrd).unwrap().violations(),
        vec![NodeViolation::MissingActor, NodeViolation::MissingMaterial]
    );
    assert_eq!(
        arena.node(phase).unwrap().violations(),
        vec![NodeViolation::MissingActor, NodeViolation::NoAnalysisInputs]
    );
}

#[test]
fn typed_operations_reject_wrong_kinds() {
    let mut arena = arena();
    let material = arena.create_material("powder").unwrap();
    let action = arena.create_action("mix", None).unwrap();
    let measurement = arena.create_measurement("XRD").unwrap();
    let analysis = arena.create_analysis("phase id", None).unwrap();

    let mismatch = |result: Result<bool, ProvenanceError>| {
        matches!(result, Err(ProvenanceError::TypeMismatch { .. }))
    };
    assert!(mismatch(arena.add_generated_material(measurement, material)));
    assert!(mismatch(arena.add_generated_material(action, measurement)));
    assert!(mismatch(arena.add_measurement(analysis, material)));
    assert!(mismatch(arena.add_upstream_analysis(analysis, measurement)));
    assert!(matches!(
        arena.set_material(measurement, action),
        Err(ProvenanceError::TypeMismatch { .. })
    ));
    assert!(matches!(
        arena.set_actor(material, actor(&arena, "Operator")),
        Err(ProvenanceError::TypeMismatch { .. })
    ));

    for id in [material, action, measurement, analysis] {
        let node = arena.node(id).unwrap();
        assert!(node.upstream().is_empty() && node.downstream().is_empty(), "{node}");
    }
}

#[test]
fn ingredient_from_foreign_arena_is_not_found() {
    let mut arena = arena();
    let gen = VersionstampGenerator::new();
    let foreign = EventNode::material(&gen, "Nickel powder").unwrap();
    let mix = arena.create_action("mix", None).unwrap();

    let ingredient = Ingredient::whole(&foreign).unwrap();
    assert_eq!(
        arena.add_ingredient(mix, ingredient),
        Err(ProvenanceError::EventNotFound(foreign.id()))
    );
    assert!(arena.node(mix).unwrap().ingredients().is_empty());
}

#[test]
fn duplicate_insert_rejected() {
    let mut arena = arena();
    let node = EventNode::material(arena.generator(), "powder").unwrap();
    let copy = node.clone();
    let id = arena.insert(node).unwrap();
    assert_eq!(arena.insert(copy), Err(ProvenanceError::DuplicateEvent(id)));
    assert_eq!(arena.len(), 1);
}

#[test]
fn short_names_rejected_everywhere() {
    let mut arena = arena();
    assert!(matches!(
        arena.create_material("Fe"),
        Err(ProvenanceError::InvalidName { .. })
    ));
    assert!(matches!(
        arena.create_action("go", None),
        Err(ProvenanceError::InvalidName { .. })
    ));
    assert!(arena.is_empty());
}
