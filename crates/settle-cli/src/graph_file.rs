//! Graph file loading.
//!
//! Graph files are TOML documents deserialized into a
//! [`GraphDescription`]. Syntax and schema errors keep their byte span and the
//! source text so they can be shown with a snippet.

use std::{fs, path::Path};

use log::{debug, error};

use settle::{SettleError, graph::GraphDescription};

/// Reads and parses the graph file at `path`.
///
/// # Errors
///
/// Returns `SettleError::Io` if the file cannot be read and
/// `SettleError::Parse` if it is not a valid graph description.
pub fn load_graph(path: impl AsRef<Path>) -> Result<GraphDescription, SettleError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).inspect_err(|err| {
        error!(path:? = path, err:% = err; "Failed to read graph file");
    })?;
    let description = parse_graph(&source)?;
    debug!(
        path:? = path,
        vertices = description.vertices().len(),
        edges = description.edges().len();
        "Graph file loaded"
    );
    Ok(description)
}

/// Parses a graph description from TOML source text.
pub fn parse_graph(source: &str) -> Result<GraphDescription, SettleError> {
    toml::from_str(source).map_err(|err| parse_error(&err, source))
}

pub(crate) fn parse_error(err: &toml::de::Error, source: &str) -> SettleError {
    SettleError::new_parse_error(err.message(), err.span(), source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_graph() {
        let description = parse_graph(
            r#"
            [[vertex]]
            name = "a"

            [[vertex]]
            name = "b"
            constraint = { kind = "horizontal", y = 10.0 }

            [[edge]]
            source = "a"
            target = "b"
            "#,
        )
        .unwrap();

        assert_eq!(description.vertices().len(), 2);
        assert_eq!(description.edges().len(), 1);
    }

    #[test]
    fn test_syntax_error_has_span() {
        let source = "[[vertex]]\nname = \n";
        match parse_graph(source) {
            Err(SettleError::Parse { span, src, .. }) => {
                assert!(span.is_some());
                assert_eq!(src, source);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let source = "[[vertex]]\nname = \"a\"\ncolour = \"red\"\n";
        assert!(matches!(
            parse_graph(source),
            Err(SettleError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_graph(dir.path().join("absent.toml")),
            Err(SettleError::Io(_))
        ));
    }
}
