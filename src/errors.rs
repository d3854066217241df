// Copyright 2025 Cowboy AI, LLC.

//! Error types for provenance operations
//!
//! Structural invalidity of a node or a sample graph is never reported through
//! this type. It is a normal intermediate state and is answered by
//! [`EventNode::invalid`](crate::EventNode::invalid) and
//! [`Sample::valid_graph`](crate::Sample::valid_graph) instead.

use thiserror::Error;

use crate::versionstamp::VersionId;

/// Errors that can occur in provenance operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProvenanceError {
    /// Event name is shorter than the minimum length
    #[error("Invalid name: {name:?} must be at least {min_len} characters long")]
    InvalidName {
        /// The rejected name
        name: String,
        /// Minimum accepted length
        min_len: usize,
    },

    /// Event kind not recognised at construction
    #[error("Invalid event kind: {0}")]
    InvalidKind(String),

    /// Event kind not recognised while rebuilding a record
    #[error("Unknown event kind: {0}")]
    UnknownEventKind(String),

    /// Versionstamp is not 24 lowercase hex characters
    #[error("Poisoned versionstamp: {0:?}")]
    PoisonedStamp(String),

    /// Merging the stamp would move the generator clock backwards
    #[error("Out of order versionstamp: incoming {incoming_us}us is behind generator clock {current_us}us")]
    OutOfOrder {
        /// Timestamp carried by the external stamp
        incoming_us: u64,
        /// Generator's last issued timestamp
        current_us: u64,
    },

    /// External stamp carries a timestamp beyond the generator's range
    #[error("Versionstamp overflow: incoming {incoming_us}us exceeds maximum {max_us}us")]
    StampOverflow {
        /// Timestamp carried by the external stamp
        incoming_us: u64,
        /// Latest timestamp a generator adopts
        max_us: u64,
    },

    /// Single-assignment field was set twice
    #[error("Already assigned: {field} on event {event_id}")]
    AlreadyAssigned {
        /// Event carrying the field
        event_id: VersionId,
        /// Field that was already set
        field: &'static str,
    },

    /// Action already produced its generated material
    #[error("Action {action_id} already has a generated material")]
    AlreadyGenerated {
        /// The action
        action_id: VersionId,
    },

    /// Wrong kind of value passed to a typed setter or linker
    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the operation needed
        expected: String,
        /// What it was given
        found: String,
    },

    /// Event id is not known to the owning context
    #[error("Event not found: {0}")]
    EventNotFound(VersionId),

    /// Event id is already present in the owning context
    #[error("Event already exists: {0}")]
    DuplicateEvent(VersionId),

    /// Linear process built from an empty action list
    #[error("Linear sample process requires at least one action")]
    EmptyChain,

    /// Non-final action in a linear process generates more than one material
    #[error("Ambiguous chain: action {action_id} generates {generated} materials")]
    AmbiguousChain {
        /// Offending action
        action_id: VersionId,
        /// How many materials it generates
        generated: usize,
    },

    /// Next action does not consume anything the previous action generated
    #[error("Broken chain: action {next} uses no material generated by action {previous}")]
    BrokenChain {
        /// Upstream action
        previous: VersionId,
        /// Downstream action
        next: VersionId,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Telemetry could not be installed
    #[error("Telemetry error: {0}")]
    TelemetryError(String),
}

/// Result type for provenance operations
pub type ProvenanceResult<T> = Result<T, ProvenanceError>;

impl From<serde_json::Error> for ProvenanceError {
    fn from(err: serde_json::Error) -> Self {
        ProvenanceError::SerializationError(err.to_string())
    }
}

impl ProvenanceError {
    pub(crate) fn type_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        ProvenanceError::TypeMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Check if this is a validation error (bad input rejected at construction)
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            ProvenanceError::InvalidName { .. }
                | ProvenanceError::InvalidKind(_)
                | ProvenanceError::UnknownEventKind(_)
                | ProvenanceError::PoisonedStamp(_)
                | ProvenanceError::StampOverflow { .. }
        )
    }

    /// Check if this is a state error (operation conflicts with current state)
    pub fn is_state_error(&self) -> bool {
        matches!(
            self,
            ProvenanceError::AlreadyAssigned { .. }
                | ProvenanceError::AlreadyGenerated { .. }
                | ProvenanceError::OutOfOrder { .. }
                | ProvenanceError::AmbiguousChain { .. }
                | ProvenanceError::BrokenChain { .. }
                | ProvenanceError::DuplicateEvent(_)
        )
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProvenanceError::EventNotFound(_))
    }
}
