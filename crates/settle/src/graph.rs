//! Graph model consumed by the embedding solver.
//!
//! The solver only talks to graphs through the [`GraphComponent`] trait, so
//! callers can lay out their own structures. [`Graph`] is the crate's own
//! implementation, backed by a `petgraph` directed graph with name lookup.

mod description;

pub use description::{ConstraintDescription, EdgeDescription, GraphDescription, VertexDescription};

use std::fmt;

use indexmap::IndexMap;
use log::trace;
use petgraph::{
    algo::connected_components,
    graph::{DiGraph, EdgeIndex, NodeIndex},
};
use thiserror::Error;

use settle_core::geometry::{Bounds, Point, Size};

use crate::constraint::PositionConstraint;

/// Opaque identity of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(NodeIndex);

impl VertexId {
    pub fn new(index: usize) -> Self {
        Self(NodeIndex::new(index))
    }

    pub fn index(self) -> usize {
        self.0.index()
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

/// Errors raised while building a [`Graph`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("duplicate vertex name `{0}`")]
    DuplicateVertex(String),

    #[error("unknown vertex `{0}`")]
    UnknownVertex(String),

    #[error("edge endpoint {0} does not exist")]
    DanglingEdge(VertexId),
}

/// A graph vertex: a box with mass and charge.
#[derive(Debug, Clone)]
pub struct Vertex {
    name: String,
    mass: f64,
    charge: f64,
    size: Size,
    /// Top-left corner of the bounding box.
    position: Point,
    constraint: Option<Box<dyn PositionConstraint>>,
}

impl Vertex {
    /// Creates a unit-mass, unit-charge vertex of the given size at the origin.
    pub fn new(name: impl Into<String>, size: Size) -> Self {
        Self {
            name: name.into(),
            mass: 1.0,
            charge: 1.0,
            size,
            position: Point::ZERO,
            constraint: None,
        }
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn with_charge(mut self, charge: f64) -> Self {
        self.charge = charge;
        self
    }

    /// Places the top-left corner of the vertex at `position`.
    pub fn with_position(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Places the center of the vertex at `center`.
    pub fn with_center(mut self, center: Point) -> Self {
        self.set_center(center);
        self
    }

    pub fn with_constraint(mut self, constraint: impl PositionConstraint + 'static) -> Self {
        self.constraint = Some(Box::new(constraint));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn charge(&self) -> f64 {
        self.charge
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn center(&self) -> Point {
        self.position.add_point(self.size.half_extent())
    }

    pub fn set_center(&mut self, center: Point) {
        self.position = center.sub_point(self.size.half_extent());
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(self.position, self.size)
    }

    pub fn constraint(&self) -> Option<&dyn PositionConstraint> {
        self.constraint.as_deref()
    }

    pub fn set_constraint(&mut self, constraint: Option<Box<dyn PositionConstraint>>) {
        self.constraint = constraint;
    }
}

/// A directed connection between two vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    source: VertexId,
    target: VertexId,
    spring_coefficient: f64,
}

impl Edge {
    pub fn new(source: VertexId, target: VertexId) -> Self {
        Self {
            source,
            target,
            spring_coefficient: 1.0,
        }
    }

    /// Scales this edge's share of the connection spring force.
    pub fn with_spring_coefficient(mut self, coefficient: f64) -> Self {
        self.spring_coefficient = coefficient;
        self
    }

    pub fn source(&self) -> VertexId {
        self.source
    }

    pub fn target(&self) -> VertexId {
        self.target
    }

    pub fn spring_coefficient(&self) -> f64 {
        self.spring_coefficient
    }
}

/// Indexed view of a graph the solver can read topology from and write
/// positions into.
///
/// Vertex and edge indices are dense, `0..count`. Indexing out of range is a
/// contract violation and may panic.
pub trait GraphComponent {
    fn vertex_count(&self) -> usize;

    fn vertex(&self, index: usize) -> &Vertex;

    fn vertex_mut(&mut self, index: usize) -> &mut Vertex;

    fn edge_count(&self) -> usize;

    fn edge(&self, index: usize) -> &Edge;

    /// Index of the vertex with identity `id`, or `None` when the identity
    /// does not belong to this graph.
    fn index_of_vertex(&self, id: VertexId) -> Option<usize>;
}

/// The crate's own [`GraphComponent`], with vertices addressable by name.
#[derive(Debug, Clone, Default)]
pub struct Graph {
    inner: DiGraph<Vertex, Edge>,
    names: IndexMap<String, VertexId>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex and returns its identity.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateVertex`] if a vertex with the same name
    /// already exists.
    pub fn add_vertex(&mut self, vertex: Vertex) -> Result<VertexId, GraphError> {
        if self.names.contains_key(vertex.name()) {
            return Err(GraphError::DuplicateVertex(vertex.name().to_string()));
        }
        let name = vertex.name().to_string();
        let id = VertexId(self.inner.add_node(vertex));
        trace!(name = name.as_str(), id:% = id; "Added vertex");
        self.names.insert(name, id);
        Ok(id)
    }

    /// Adds an edge between two existing vertices.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DanglingEdge`] if either endpoint is not a
    /// vertex of this graph.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        for endpoint in [edge.source(), edge.target()] {
            if self.inner.node_weight(endpoint.0).is_none() {
                return Err(GraphError::DanglingEdge(endpoint));
            }
        }
        self.inner.add_edge(edge.source().0, edge.target().0, edge);
        Ok(())
    }

    /// Connects two vertices by name with a default edge.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownVertex`] if either name is not known.
    pub fn connect(&mut self, source: &str, target: &str) -> Result<(), GraphError> {
        let source = self.require_id(source)?;
        let target = self.require_id(target)?;
        self.add_edge(Edge::new(source, target))
    }

    pub fn id_by_name(&self, name: &str) -> Option<VertexId> {
        self.names.get(name).copied()
    }

    pub fn vertex_by_name(&self, name: &str) -> Option<&Vertex> {
        self.id_by_name(name).map(|id| &self.inner[id.0])
    }

    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.inner.node_weights()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.inner.edge_weights()
    }

    /// Smallest rectangle containing every vertex box, or `None` for an
    /// empty graph.
    pub fn bounds(&self) -> Option<Bounds> {
        self.vertices()
            .map(Vertex::bounds)
            .reduce(|acc, bounds| acc.merge(&bounds))
    }

    /// Number of weakly connected components.
    pub fn component_count(&self) -> usize {
        connected_components(&self.inner)
    }

    fn require_id(&self, name: &str) -> Result<VertexId, GraphError> {
        self.id_by_name(name)
            .ok_or_else(|| GraphError::UnknownVertex(name.to_string()))
    }
}

impl GraphComponent for Graph {
    fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    fn vertex(&self, index: usize) -> &Vertex {
        &self.inner[NodeIndex::new(index)]
    }

    fn vertex_mut(&mut self, index: usize) -> &mut Vertex {
        &mut self.inner[NodeIndex::new(index)]
    }

    fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    fn edge(&self, index: usize) -> &Edge {
        &self.inner[EdgeIndex::new(index)]
    }

    fn index_of_vertex(&self, id: VertexId) -> Option<usize> {
        self.inner.node_weight(id.0).map(|_| id.index())
    }
}
