// Copyright 2025 Cowboy AI, LLC.

//! Provenance events
//!
//! Four kinds of event make up a provenance graph:
//!
//! ```mermaid
//! graph LR
//!     M[Material] --> A[Action]
//!     A --> M2[Material]
//!     M2 --> X[Measurement]
//!     X --> Y[Analysis]
//!     Y --> Y2[Analysis]
//! ```
//!
//! Nodes are owned by an [`EventArena`] and link to each other through
//! [`EventRef`]s.

mod arena;
mod kind;
mod node;
mod record;

pub use arena::EventArena;
pub use kind::{EventKind, EventRef};
pub use node::{EventNode, NodeViolation, MIN_NAME_LEN};
pub use record::{EventRecord, IngredientRecord, LinkRecord};
