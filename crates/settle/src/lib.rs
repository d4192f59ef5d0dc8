//! Settle - force-directed graph embedding.
//!
//! Lays out the vertices of a graph in the plane by simulating springs,
//! electric repulsion and magnetic dipoles between edges, integrated with an
//! adaptive Runge-Kutta scheme under a wall-clock budget.
//!
//! The solver itself is [`ForceDirectedEmbedding`], which works on anything
//! implementing [`graph::GraphComponent`]. [`LayoutBuilder`] bundles the usual
//! pipeline: build a graph from a [`graph::GraphDescription`], embed it, and
//! render the result as SVG.

pub mod config;
pub mod constraint;
pub mod embedding;
pub mod export;
pub mod graph;

mod error;

pub use settle_core::{geometry, points};

pub use embedding::{EmbedError, EmbedOutcome, ForceDirectedEmbedding, Phase, Termination};
pub use error::SettleError;

use log::{debug, info};

use config::AppConfig;
use graph::{Graph, GraphDescription};

/// Builder for laying out and rendering graph descriptions.
///
/// # Examples
///
/// ```rust,no_run
/// use settle::{LayoutBuilder, config::AppConfig, graph::GraphDescription};
///
/// let builder = LayoutBuilder::new(AppConfig::default());
/// let (graph, outcome) = builder
///     .layout(GraphDescription::default())
///     .expect("Failed to lay out");
/// let svg = builder.render_svg(&graph).expect("Failed to render");
/// println!("{} ({})", svg, outcome.termination());
/// ```
#[derive(Debug, Default)]
pub struct LayoutBuilder {
    config: AppConfig,
}

impl LayoutBuilder {
    /// Create a new layout builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build the described graph and embed it.
    ///
    /// # Errors
    ///
    /// Returns `SettleError` for an invalid embedding configuration, an
    /// inconsistent description, or a graph the solver rejects.
    pub fn layout(
        &self,
        description: GraphDescription,
    ) -> Result<(Graph, EmbedOutcome), SettleError> {
        let mut embedding = ForceDirectedEmbedding::new(self.config.embedding().clone())?;

        let mut graph = description.into_graph()?;
        debug!(
            vertices = graph.vertices().count(),
            components = graph.component_count();
            "Graph built"
        );

        let outcome = embedding.embed(&mut graph)?;
        info!(
            termination:% = outcome.termination(),
            cycles = outcome.cycles();
            "Layout finished"
        );

        Ok((graph, outcome))
    }

    /// Render a laid-out graph to an SVG string.
    ///
    /// # Errors
    ///
    /// Returns `SettleError::Export` if the graph cannot be rendered.
    pub fn render_svg(&self, graph: &Graph) -> Result<String, SettleError> {
        Ok(export::svg::render_svg(graph, self.config.export())?)
    }
}
