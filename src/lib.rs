//! # Lab Provenance
//!
//! Provenance of physical-science experiments as a directed graph of typed
//! events, with globally orderable identifiers for every entity.
//!
//! This crate provides:
//! - **Versionstamps**: 12-byte time-ordered ids from a thread-safe generator
//! - **Events**: materials, actions, measurements and analyses with a central link table
//! - **Actors** and **Ingredients**: who performed an event and what it consumed
//! - **Samples**: aggregate roots owning events and checking that they form one lineage
//! - **Context**: labs, projects and experiments that own and name samples
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use lab_provenance::{Actor, Sample, VersionstampGenerator};
//!
//! let generator = Arc::new(VersionstampGenerator::new());
//! let operator = Arc::new(Actor::new(&generator, "Operator", "bench operator"));
//! let mut sample = Sample::new(generator, "FE-PELLET-01");
//!
//! let arena = sample.arena_mut();
//! let iron = arena.create_material("Iron powder").unwrap();
//! let buy = arena.create_action("procurement", Some(operator.clone())).unwrap();
//! let grind = arena.create_action("grind", Some(operator)).unwrap();
//! arena.add_ingredient(buy, iron).unwrap();
//!
//! sample.add_linear_sample_process(&[buy, grind]).unwrap();
//! assert!(sample.valid_graph());
//! ```

#![warn(missing_docs)]

mod actor;
mod context;
mod entity;
mod errors;
mod ingredient;
mod sample;
mod versionstamp;

pub mod config;
pub mod event;
pub mod graph;
pub mod telemetry;

pub use actor::{Actor, ActorRecord, ActorStatus, ActorVersion};
pub use config::{NamingConfig, ProvenanceConfig, TelemetryConfig};
pub use context::{
    generate_sample_name, Experiment, ExperimentRecord, Lab, NamingContext, Project,
};
pub use entity::{tags, Contents, Lifecycle, Persist, SaveReceipt, Status, Tags};
pub use errors::{ProvenanceError, ProvenanceResult};
pub use event::{
    EventArena, EventKind, EventNode, EventRecord, EventRef, IngredientRecord, LinkRecord,
    NodeViolation, MIN_NAME_LEN,
};
pub use graph::{EventVertex, LineageReport, ProvenanceGraph};
pub use ingredient::{Ingredient, IngredientInput, WHOLE_AMOUNT, WHOLE_UNIT};
pub use sample::{Sample, SampleRecord, SampleStatus};
pub use versionstamp::{
    Clock, SystemClock, VersionId, VersionstampGenerator, MAX_TIMESTAMP_US, STAMP_BYTES,
    STAMP_HEX_LEN,
};
