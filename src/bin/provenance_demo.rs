// Copyright 2025 Cowboy AI, LLC.

//! Provenance Demo
//!
//! Builds the lineage of a sintered TiO2 pellet:
//! - procurement of TiO2 powder
//! - grind, sinter, grind as one linear process
//! - XRD measurement of the final material
//! - CNN phase identification from the XRD pattern
//!
//! then checks that the sample forms one valid lineage and prints its DOT graph.
//!
//! Set `LAB_PROVENANCE_LOG=lab_provenance=debug` for link-level logs.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::info;

use lab_provenance::{
    tags, telemetry, Actor, Contents, Experiment, Ingredient, Lab, Persist, ProvenanceConfig,
    Status, VersionstampGenerator,
};

fn contents(value: serde_json::Value) -> Contents {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Contents::new(),
    }
}

fn main() -> Result<()> {
    let config = ProvenanceConfig::from_env().context("reading configuration")?;
    telemetry::init(&config.telemetry).context("installing tracing subscriber")?;

    let generator = Arc::new(VersionstampGenerator::new());

    let mut lab = Lab::new(generator.clone(), "Ceder Group", "acl", "Berkeley");
    let project = lab
        .create_project("ceramics", Some("Solid-state synthesis"), tags(["oxides"]))
        .clone();
    let mut experiment = Experiment::new(generator.clone(), "TiO2 sinter", &lab, &project)
        .with_naming(config.naming.clone());

    let operator = Arc::new(
        Actor::new(&generator, "Operator", "Operator for the lab").with_tags(tags(["operator", "lab"])),
    );
    let aeris = Arc::new(
        Actor::new(
            &generator,
            "Aeris X-ray Diffraction",
            "X-ray diffraction instrument for material characterization",
        )
        .with_tags(tags(["XRD", "Aeris"])),
    );
    let furnace = Arc::new(
        Actor::new(&generator, "Tube Furnace 1", "High-temperature tube furnace for sintering")
            .with_tags(tags(["furnace", "sintering"])),
    );
    let phase_id = Arc::new(
        Actor::new(
            &generator,
            "CNN Phase Identification",
            "Convolutional Neural Network for phase identification from XRD patterns",
        )
        .with_contents(contents(json!({
            "procedure": {
                "step_1": "Load XRD data",
                "step_2": "Preprocess data",
                "step_3": "Run CNN model",
            }
        }))),
    );

    let sample = experiment.create_sample("sintered TiO2 pellet", tags(["demo"]));
    let arena = sample.arena_mut();

    let tio2 = arena.create_material("Titanium Dioxide")?;
    arena
        .get_mut(tio2)
        .context("material just created")?
        .add_tag("precursor");
    let procurement = arena.create_action("procurement", Some(operator.clone()))?;
    arena.add_generated_material(procurement, tio2)?;

    let first_grind = arena.create_action("grind", Some(operator.clone()))?;
    let weighed = Ingredient::new(arena.node(tio2)?, 1.0, "g")?;
    arena.add_ingredient(first_grind, weighed)?;

    let sinter = arena.create_action("sinter", Some(furnace))?;
    let final_grind = arena.create_action("grind", Some(operator))?;

    sample.add_linear_sample_process(&[procurement, first_grind, sinter, final_grind])?;

    let arena = sample.arena_mut();
    let pellet = *arena
        .node(final_grind)?
        .generated_materials()
        .first()
        .context("final grind produced no material")?;
    let xrd = arena.create_measurement("XRD")?;
    arena.set_material(xrd, pellet)?;
    arena.set_actor(xrd, aeris)?;
    let analysis = arena.create_analysis("Phase Identification", Some(phase_id))?;
    arena.add_measurement(analysis, xrd)?;

    sample.add_event(xrd)?;
    sample.add_event(analysis)?;

    for event in sample.events() {
        info!(event = %event, invalid = event.invalid(), "event in sample");
    }

    let report = sample.lineage_report();
    info!(
        sample = %sample.name(),
        vertices = report.vertex_count,
        edges = report.edge_count,
        components = report.component_count,
        acyclic = report.acyclic,
        "lineage report"
    );
    if !report.is_valid() {
        bail!("sample {} does not form a single lineage", sample.name());
    }

    sample.set_status(Status::Completed);
    let receipt = sample.save();
    info!(id = %receipt.id, name = %receipt.name, updated_at = %receipt.updated_at, "sample saved");

    println!("{}", sample.graph().to_dot());
    println!("{}", serde_json::to_string_pretty(&sample.to_dict(false)?)?);

    experiment.set_status(Status::Completed);
    experiment.save();
    Ok(())
}
