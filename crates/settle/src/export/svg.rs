//! SVG export of a laid-out graph.
//!
//! Vertices are drawn as labelled rectangles and edges as straight lines
//! between vertex centers. The view box covers every vertex plus the
//! configured margin.

use std::{fs::File, io::Write, path::Path};

use log::{debug, error, info};
use svg::{
    Document,
    node::element::{Group, Line, Rectangle, Text},
};

use settle_core::geometry::Bounds;

use super::Error;
use crate::{config::ExportConfig, graph::GraphComponent};

const STROKE: &str = "#333333";
const VERTEX_FILL: &str = "#f5f5f5";
const FONT_SIZE: f64 = 12.0;

/// Renders `graph` into an SVG document string.
///
/// # Errors
///
/// Returns [`Error::Render`] if a vertex position is not finite.
pub fn render_svg<G>(graph: &G, config: &ExportConfig) -> Result<String, Error>
where
    G: GraphComponent + ?Sized,
{
    Ok(build_document(graph, config)?.to_string())
}

/// Renders `graph` and writes it to `path`.
///
/// # Errors
///
/// Returns [`Error::Render`] if the graph cannot be rendered and
/// [`Error::Io`] if the file cannot be written.
pub fn write_svg<G>(graph: &G, config: &ExportConfig, path: &Path) -> Result<(), Error>
where
    G: GraphComponent + ?Sized,
{
    let document = build_document(graph, config)?;

    info!(path:? = path; "Creating SVG file");
    let mut file = File::create(path).inspect_err(|err| {
        error!(path:? = path, err:% = err; "Failed to create SVG file");
    })?;
    write!(file, "{document}").inspect_err(|err| {
        error!(path:? = path, err:% = err; "Failed to write SVG content");
    })?;

    Ok(())
}

fn build_document<G>(graph: &G, config: &ExportConfig) -> Result<Document, Error>
where
    G: GraphComponent + ?Sized,
{
    let mut bounds: Option<Bounds> = None;
    for i in 0..graph.vertex_count() {
        let vertex = graph.vertex(i);
        if !vertex.position().is_finite() {
            return Err(Error::Render(format!(
                "vertex `{}` has a non-finite position",
                vertex.name()
            )));
        }
        let vertex_bounds = vertex.bounds();
        bounds = Some(match bounds {
            Some(acc) => acc.merge(&vertex_bounds),
            None => vertex_bounds,
        });
    }
    let view = bounds.unwrap_or_default().expand(config.margin());
    debug!(
        width = view.width(),
        height = view.height();
        "Computed SVG view box"
    );

    let mut document = Document::new()
        .set("viewBox", (view.min_x(), view.min_y(), view.width(), view.height()))
        .set("width", view.width())
        .set("height", view.height());

    if let Some(color) = config.background_color() {
        document = document.add(
            Rectangle::new()
                .set("x", view.min_x())
                .set("y", view.min_y())
                .set("width", view.width())
                .set("height", view.height())
                .set("fill", color),
        );
    }

    let mut edges = Group::new().set("stroke", STROKE).set("stroke-width", 1.5);
    for i in 0..graph.edge_count() {
        let edge = graph.edge(i);
        let (Some(source), Some(target)) = (
            graph.index_of_vertex(edge.source()),
            graph.index_of_vertex(edge.target()),
        ) else {
            continue;
        };
        let (from, to) = (graph.vertex(source).center(), graph.vertex(target).center());
        edges = edges.add(
            Line::new()
                .set("x1", from.x())
                .set("y1", from.y())
                .set("x2", to.x())
                .set("y2", to.y()),
        );
    }
    document = document.add(edges);

    for i in 0..graph.vertex_count() {
        let vertex = graph.vertex(i);
        let mut group = Group::new().add(
            Rectangle::new()
                .set("x", vertex.position().x())
                .set("y", vertex.position().y())
                .set("width", vertex.size().width())
                .set("height", vertex.size().height())
                .set("fill", VERTEX_FILL)
                .set("stroke", STROKE)
                .set("rx", 3.0),
        );
        if config.show_labels() {
            let center = vertex.center();
            group = group.add(
                Text::new(vertex.name())
                    .set("x", center.x())
                    .set("y", center.y())
                    .set("text-anchor", "middle")
                    .set("dominant-baseline", "central")
                    .set("font-family", "sans-serif")
                    .set("font-size", FONT_SIZE),
            );
        }
        document = document.add(group);
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Graph, Vertex};
    use settle_core::geometry::{Point, Size};

    fn two_vertices() -> Graph {
        let mut graph = Graph::new();
        graph
            .add_vertex(Vertex::new("left", Size::new(40.0, 20.0)))
            .unwrap();
        graph
            .add_vertex(
                Vertex::new("right", Size::new(40.0, 20.0)).with_position(Point::new(100.0, 0.0)),
            )
            .unwrap();
        graph.connect("left", "right").unwrap();
        graph
    }

    #[test]
    fn test_render_contains_vertices_and_edges() {
        let svg = render_svg(&two_vertices(), &ExportConfig::default()).unwrap();

        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<rect").count(), 2);
        assert_eq!(svg.matches("<line").count(), 1);
        assert!(svg.contains("<text") && svg.contains("left"));
        assert!(svg.contains("viewBox=\"-20 -20 180 60\""));
    }

    #[test]
    fn test_background_and_hidden_labels() {
        let config = ExportConfig::default()
            .with_background_color("white")
            .with_show_labels(false)
            .with_margin(0.0);
        let svg = render_svg(&two_vertices(), &config).unwrap();

        assert_eq!(svg.matches("<rect").count(), 3);
        assert!(svg.contains("fill=\"white\""));
        assert!(!svg.contains("<text"));
    }

    #[test]
    fn test_non_finite_position_fails_to_render() {
        let mut graph = Graph::new();
        graph
            .add_vertex(
                Vertex::new("lost", Size::default())
                    .with_position(Point::new(f64::INFINITY, 0.0)),
            )
            .unwrap();
        assert!(matches!(
            render_svg(&graph, &ExportConfig::default()),
            Err(Error::Render(_))
        ));
    }

    #[test]
    fn test_write_svg_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.svg");
        write_svg(&two_vertices(), &ExportConfig::default(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
    }

    #[test]
    fn test_write_svg_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("graph.svg");

        assert!(matches!(
            write_svg(&two_vertices(), &ExportConfig::default(), &path),
            Err(Error::Io(_))
        ));
        assert!(!path.exists());
    }
}
