// Copyright 2025 Cowboy AI, LLC.

//! Directed provenance graph derived from event links
//!
//! Vertices are event ids; edges run upstream to downstream and are the union
//! of every member's upstream and downstream links. A link whose target is not
//! a member still produces an edge, to a vertex marked external.

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::{connected_components, is_cyclic_directed, toposort};
use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::event::{EventKind, EventNode, EventRef};
use crate::versionstamp::VersionId;

/// Label of vertices that are link targets but not members
pub const EXTERNAL_LABEL: &str = "external";

/// A vertex of the provenance graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventVertex {
    /// Event id
    pub id: VersionId,
    /// Event kind
    pub kind: EventKind,
    /// Event name, or [`EXTERNAL_LABEL`] for non-members
    pub name: String,
    /// Whether the event is outside the member set
    pub external: bool,
}

impl fmt::Display for EventVertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.name)
    }
}

/// An upstream-to-downstream edge, weighted by the kinds it joins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEdge {
    /// Upstream kind
    pub from: EventKind,
    /// Downstream kind
    pub to: EventKind,
}

impl fmt::Display for EventEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Summary of a lineage check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageReport {
    /// Number of vertices, external ones included
    pub vertex_count: usize,
    /// Number of distinct edges
    pub edge_count: usize,
    /// Number of external vertices
    pub external_count: usize,
    /// Number of weakly connected components
    pub component_count: usize,
    /// Whether the graph has no directed cycle
    pub acyclic: bool,
}

impl LineageReport {
    /// Acyclic with exactly one weakly connected component
    pub fn is_valid(&self) -> bool {
        self.acyclic && self.component_count == 1
    }
}

/// Directed graph over a set of events
#[derive(Debug, Clone, Default)]
pub struct ProvenanceGraph {
    graph: DiGraph<EventVertex, EventEdge>,
    index: HashMap<VersionId, NodeIndex>,
}

impl ProvenanceGraph {
    /// Build the graph of `events` and everything they link to
    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a EventNode>) -> Self {
        let events: Vec<&EventNode> = events.into_iter().collect();
        let mut graph = Self::default();

        for event in &events {
            graph.member_vertex(event);
        }
        for event in &events {
            let this = event.event_ref();
            for link in event.upstream() {
                graph.add_edge(*link, this);
            }
            for link in event.downstream() {
                graph.add_edge(this, *link);
            }
        }
        graph
    }

    fn member_vertex(&mut self, event: &EventNode) {
        let vertex = EventVertex {
            id: event.id(),
            kind: event.kind(),
            name: event.name().to_string(),
            external: false,
        };
        let index = self.graph.add_node(vertex);
        self.index.insert(event.id(), index);
    }

    fn vertex_for(&mut self, link: EventRef) -> NodeIndex {
        if let Some(index) = self.index.get(&link.event_id) {
            return *index;
        }
        let index = self.graph.add_node(EventVertex {
            id: link.event_id,
            kind: link.kind,
            name: EXTERNAL_LABEL.to_string(),
            external: true,
        });
        self.index.insert(link.event_id, index);
        index
    }

    fn add_edge(&mut self, from: EventRef, to: EventRef) {
        let a = self.vertex_for(from);
        let b = self.vertex_for(to);
        // both halves of a symmetric link land on the same edge
        self.graph.update_edge(
            a,
            b,
            EventEdge {
                from: from.kind,
                to: to.kind,
            },
        );
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of distinct edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether `id` is a vertex
    pub fn contains(&self, id: VersionId) -> bool {
        self.index.contains_key(&id)
    }

    /// Vertex for `id`
    pub fn vertex(&self, id: VersionId) -> Option<&EventVertex> {
        self.index.get(&id).map(|index| &self.graph[*index])
    }

    /// All vertices
    pub fn vertices(&self) -> impl Iterator<Item = &EventVertex> {
        self.graph.node_indices().map(move |index| &self.graph[index])
    }

    /// All edges as (upstream id, downstream id)
    pub fn edges(&self) -> impl Iterator<Item = (VersionId, VersionId)> + '_ {
        self.graph.edge_indices().filter_map(move |edge| {
            self.graph
                .edge_endpoints(edge)
                .map(|(a, b)| (self.graph[a].id, self.graph[b].id))
        })
    }

    /// Whether the edge `from -> to` exists
    pub fn has_edge(&self, from: VersionId, to: VersionId) -> bool {
        match (self.index.get(&from), self.index.get(&to)) {
            (Some(a), Some(b)) => self.graph.contains_edge(*a, *b),
            _ => false,
        }
    }

    /// Vertices outside the member set
    pub fn external_vertices(&self) -> impl Iterator<Item = &EventVertex> {
        self.vertices().filter(|vertex| vertex.external)
    }

    /// Whether the graph has no directed cycle
    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.graph)
    }

    /// Number of weakly connected components
    pub fn component_count(&self) -> usize {
        connected_components(&self.graph)
    }

    /// Event ids in upstream-first order, or `None` when there is a cycle
    pub fn topological_order(&self) -> Option<Vec<VersionId>> {
        toposort(&self.graph, None)
            .ok()
            .map(|order| order.into_iter().map(|index| self.graph[index].id).collect())
    }

    /// Acyclicity and connectivity summary
    pub fn report(&self) -> LineageReport {
        LineageReport {
            vertex_count: self.vertex_count(),
            edge_count: self.edge_count(),
            external_count: self.external_vertices().count(),
            component_count: self.component_count(),
            acyclic: self.is_acyclic(),
        }
    }

    /// Acyclic with exactly one weakly connected component; an empty graph is invalid
    pub fn is_valid(&self) -> bool {
        self.report().is_valid()
    }

    /// Graphviz DOT text
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::with_config(&self.graph, &[Config::EdgeNoLabel]))
    }
}
