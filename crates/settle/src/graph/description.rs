//! Serializable description of a graph.
//!
//! This is the shape of a graph file:
//!
//! ```toml
//! [[vertex]]
//! name = "hub"
//! size = { width = 80.0, height = 40.0 }
//! constraint = { kind = "fixed", x = 0.0, y = 0.0 }
//!
//! [[vertex]]
//! name = "leaf"
//! mass = 2.0
//! position = { x = 120.0, y = 0.0 }
//!
//! [[edge]]
//! source = "hub"
//! target = "leaf"
//! ```
//!
//! Vertex positions are top-left corners, constraint coordinates are
//! centers. Vertices without a position are placed on a square grid.

use serde::{Deserialize, Serialize};

use settle_core::geometry::{Bounds, Point, Size};

use super::{Edge, Graph, GraphError, Vertex};
use crate::constraint::{AxisLock, DEFAULT_STIFFNESS, FixedPoint, PositionConstraint, Region};

/// Spacing of the grid used for vertices without an explicit position.
const GRID_CELL: f64 = 100.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GraphDescription {
    #[serde(default, rename = "vertex")]
    vertices: Vec<VertexDescription>,
    #[serde(default, rename = "edge")]
    edges: Vec<EdgeDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VertexDescription {
    name: String,
    #[serde(default = "unit")]
    mass: f64,
    #[serde(default = "unit")]
    charge: f64,
    #[serde(default = "default_size")]
    size: Size,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Point>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    constraint: Option<ConstraintDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EdgeDescription {
    source: String,
    target: String,
    #[serde(default = "unit")]
    spring: f64,
}

/// A position constraint as written in a graph file, tagged by `kind`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConstraintDescription {
    Fixed {
        x: f64,
        y: f64,
        #[serde(default = "default_stiffness")]
        stiffness: f64,
    },
    Horizontal {
        y: f64,
        #[serde(default = "default_stiffness")]
        stiffness: f64,
    },
    Vertical {
        x: f64,
        #[serde(default = "default_stiffness")]
        stiffness: f64,
    },
    Region {
        min: Point,
        max: Point,
        #[serde(default = "default_stiffness")]
        stiffness: f64,
    },
}

impl ConstraintDescription {
    fn build(self) -> Box<dyn PositionConstraint> {
        match self {
            Self::Fixed { x, y, stiffness } => {
                Box::new(FixedPoint::new(Point::new(x, y)).with_stiffness(stiffness))
            }
            Self::Horizontal { y, stiffness } => {
                Box::new(AxisLock::horizontal(y).with_stiffness(stiffness))
            }
            Self::Vertical { x, stiffness } => {
                Box::new(AxisLock::vertical(x).with_stiffness(stiffness))
            }
            Self::Region {
                min,
                max,
                stiffness,
            } => Box::new(Region::new(Bounds::new(min, max)).with_stiffness(stiffness)),
        }
    }
}

impl VertexDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mass: 1.0,
            charge: 1.0,
            size: default_size(),
            position: None,
            constraint: None,
        }
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_constraint(mut self, constraint: ConstraintDescription) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl EdgeDescription {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            spring: 1.0,
        }
    }
}

impl GraphDescription {
    pub fn new(vertices: Vec<VertexDescription>, edges: Vec<EdgeDescription>) -> Self {
        Self { vertices, edges }
    }

    pub fn vertices(&self) -> &[VertexDescription] {
        &self.vertices
    }

    pub fn edges(&self) -> &[EdgeDescription] {
        &self.edges
    }

    /// Builds the described graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateVertex`] for repeated vertex names and
    /// [`GraphError::UnknownVertex`] for edges naming a vertex that is not
    /// described.
    pub fn into_graph(self) -> Result<Graph, GraphError> {
        let columns = grid_columns(self.vertices.len());
        let mut graph = Graph::new();

        for (i, description) in self.vertices.into_iter().enumerate() {
            let position = description.position.unwrap_or_else(|| {
                let (row, col) = (i / columns, i % columns);
                Point::new(col as f64 * GRID_CELL, row as f64 * GRID_CELL)
            });
            let mut vertex = Vertex::new(description.name, description.size)
                .with_mass(description.mass)
                .with_charge(description.charge)
                .with_position(position);
            vertex.set_constraint(description.constraint.map(ConstraintDescription::build));
            graph.add_vertex(vertex)?;
        }

        for description in self.edges {
            let source = graph.require_id(&description.source)?;
            let target = graph.require_id(&description.target)?;
            graph.add_edge(Edge::new(source, target).with_spring_coefficient(description.spring))?;
        }

        Ok(graph)
    }
}

fn grid_columns(count: usize) -> usize {
    ((count as f64).sqrt().ceil() as usize).max(1)
}

fn unit() -> f64 {
    1.0
}

fn default_stiffness() -> f64 {
    DEFAULT_STIFFNESS
}

fn default_size() -> Size {
    Size::new(80.0, 40.0)
}
