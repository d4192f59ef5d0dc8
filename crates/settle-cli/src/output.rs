//! Output writers for a laid-out graph.

use std::{fs, path::Path};

use log::info;
use serde::Serialize;

use settle::{LayoutBuilder, SettleError, graph::Graph};

use crate::args::OutputFormat;

#[derive(Debug, Serialize)]
struct Positions<'a> {
    vertex: Vec<PlacedVertex<'a>>,
}

/// Final placement of one vertex. `x`/`y` is the top-left corner.
#[derive(Debug, Serialize)]
struct PlacedVertex<'a> {
    name: &'a str,
    x: f64,
    y: f64,
    center_x: f64,
    center_y: f64,
}

/// Writes `graph` to `path` in the requested format.
///
/// # Errors
///
/// Returns `SettleError::Export` if the graph cannot be rendered or
/// serialized and `SettleError::Io` if the file cannot be written.
pub fn write_output(
    builder: &LayoutBuilder,
    graph: &Graph,
    format: OutputFormat,
    path: impl AsRef<Path>,
) -> Result<(), SettleError> {
    let content = match format {
        OutputFormat::Svg => builder.render_svg(graph)?,
        OutputFormat::Toml => positions_toml(graph)?,
    };

    let path = path.as_ref();
    fs::write(path, content)?;
    info!(path:? = path, format:? = format; "Output written");
    Ok(())
}

/// Serializes the vertex positions of `graph` as a TOML document.
pub fn positions_toml(graph: &Graph) -> Result<String, SettleError> {
    let positions = Positions {
        vertex: graph
            .vertices()
            .map(|vertex| PlacedVertex {
                name: vertex.name(),
                x: vertex.position().x(),
                y: vertex.position().y(),
                center_x: vertex.center().x(),
                center_y: vertex.center().y(),
            })
            .collect(),
    };
    toml::to_string(&positions).map_err(|err| SettleError::Export(Box::new(err)))
}
