// Copyright 2025 Cowboy AI, LLC.

//! Event kinds and the link table between them

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::ProvenanceError;
use crate::versionstamp::VersionId;

/// The four kinds of provenance event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// A physical material in a physical state
    Material,
    /// A process performed by an actor that transforms materials
    Action,
    /// Raw data taken from a material
    Measurement,
    /// Interpretation of measurements or other analyses
    Analysis,
}

impl EventKind {
    /// All kinds
    pub const ALL: [EventKind; 4] = [
        EventKind::Material,
        EventKind::Action,
        EventKind::Measurement,
        EventKind::Analysis,
    ];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Material => "material",
            EventKind::Action => "action",
            EventKind::Measurement => "measurement",
            EventKind::Analysis => "analysis",
        }
    }

    /// Kinds that may appear upstream of this kind
    pub fn allowed_upstream(&self) -> &'static [EventKind] {
        match self {
            EventKind::Material => &[EventKind::Action],
            EventKind::Action => &[EventKind::Material],
            EventKind::Measurement => &[EventKind::Material],
            EventKind::Analysis => &[EventKind::Measurement, EventKind::Analysis],
        }
    }

    /// Kinds that may appear downstream of this kind
    pub fn allowed_downstream(&self) -> &'static [EventKind] {
        match self {
            EventKind::Material => &[EventKind::Action, EventKind::Measurement],
            EventKind::Action => &[EventKind::Material, EventKind::Measurement],
            EventKind::Measurement => &[EventKind::Analysis],
            EventKind::Analysis => &[EventKind::Analysis],
        }
    }

    /// Whether `other` may feed into this kind
    pub fn accepts_upstream(&self, other: EventKind) -> bool {
        self.allowed_upstream().contains(&other)
    }

    /// Whether this kind may feed into `other`
    pub fn accepts_downstream(&self, other: EventKind) -> bool {
        self.allowed_downstream().contains(&other)
    }

    /// Whether events of this kind are performed by an actor
    pub fn requires_actor(&self) -> bool {
        !matches!(self, EventKind::Material)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ProvenanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "material" => Ok(EventKind::Material),
            "action" => Ok(EventKind::Action),
            "measurement" => Ok(EventKind::Measurement),
            "analysis" => Ok(EventKind::Analysis),
            other => Err(ProvenanceError::InvalidKind(other.to_string())),
        }
    }
}

/// Minimal, non-owning reference to another event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct EventRef {
    /// Referenced event
    pub event_id: VersionId,
    /// Its kind
    pub kind: EventKind,
}

impl EventRef {
    /// Build a reference
    pub fn new(event_id: VersionId, kind: EventKind) -> Self {
        Self { event_id, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(EventKind::Material, EventKind::Action, true ; "material from action")]
    #[test_case(EventKind::Material, EventKind::Measurement, false ; "material from measurement")]
    #[test_case(EventKind::Action, EventKind::Material, true ; "action from material")]
    #[test_case(EventKind::Action, EventKind::Action, false ; "action from action")]
    #[test_case(EventKind::Measurement, EventKind::Material, true ; "measurement from material")]
    #[test_case(EventKind::Measurement, EventKind::Action, false ; "measurement from action")]
    #[test_case(EventKind::Analysis, EventKind::Measurement, true ; "analysis from measurement")]
    #[test_case(EventKind::Analysis, EventKind::Analysis, true ; "analysis from analysis")]
    #[test_case(EventKind::Analysis, EventKind::Material, false ; "analysis from material")]
    fn test_upstream_table(kind: EventKind, upstream: EventKind, allowed: bool) {
        assert_eq!(kind.accepts_upstream(upstream), allowed);
    }

    #[test]
    fn test_table_is_symmetric_except_action_to_measurement() {
        // every allowed downstream edge a -> b is an allowed upstream edge of b,
        // apart from action -> measurement which a measurement never accepts
        for a in EventKind::ALL {
            for b in a.allowed_downstream() {
                if (a, *b) == (EventKind::Action, EventKind::Measurement) {
                    assert!(!b.accepts_upstream(a));
                } else {
                    assert!(b.accepts_upstream(a), "{a} -> {b}");
                }
            }
        }
    }

    #[test]
    fn test_parse_and_display() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.as_str());
        }
        assert_eq!(
            "sample".parse::<EventKind>(),
            Err(ProvenanceError::InvalidKind("sample".to_string()))
        );
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&EventKind::Measurement).unwrap();
        assert_eq!(json, "\"measurement\"");
    }
}
