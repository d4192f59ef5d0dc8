//! Rendering of [`SettleError`] through miette.
//!
//! Every error becomes one [`Report`]. Parse errors carry the offending
//! source, so miette can print a snippet with the failing span underlined.

use std::{error::Error, fmt};

use miette::{Diagnostic, LabeledSpan, SourceCode, SourceSpan};

use settle::SettleError;

/// A [`SettleError`] viewed as a miette diagnostic.
pub struct Report<'a>(&'a SettleError);

impl<'a> Report<'a> {
    pub fn new(err: &'a SettleError) -> Self {
        Self(err)
    }

    pub fn error(&self) -> &SettleError {
        self.0
    }
}

impl fmt::Debug for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0, f)
    }
}

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            // toml messages end with a newline
            SettleError::Parse { message, .. } => f.write_str(message.trim_end()),
            err => fmt::Display::fmt(err, f),
        }
    }
}

impl Error for Report<'_> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Error::source(self.0)
    }
}

impl Diagnostic for Report<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match self.0 {
            SettleError::Io(_) => "settle::io",
            SettleError::Parse { .. } => "settle::parse",
            SettleError::Config(_) => "settle::config",
            SettleError::Graph(_) => "settle::graph",
            SettleError::Embed(_) => "settle::embed",
            SettleError::Export(_) => "settle::export",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.0 {
            SettleError::Config(_) => "check the [embedding] section of the configuration file",
            SettleError::Embed(_) => "masses must be positive; charges, positions and spring coefficients finite",
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        match self.0 {
            SettleError::Parse { src, .. } => Some(src as &dyn SourceCode),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let SettleError::Parse {
            span: Some(span), ..
        } = self.0
        else {
            return None;
        };
        let span = SourceSpan::new(span.start.into(), span.len());
        let label = LabeledSpan::new_primary_with_span(Some("here".to_string()), span);
        Some(Box::new(std::iter::once(label)))
    }
}

/// Wraps `err` for rendering with a miette report handler.
pub fn to_report(err: &SettleError) -> Report<'_> {
    Report::new(err)
}

#[cfg(test)]
mod tests {
    use settle::config::ConfigError;

    use super::*;

    #[test]
    fn test_parse_error_with_span() {
        let err = SettleError::new_parse_error("invalid value\n", Some(7..9), "name = ??");

        let report = to_report(&err);
        assert_eq!(report.to_string(), "invalid value");
        assert_eq!(report.code().unwrap().to_string(), "settle::parse");
        assert!(report.source_code().is_some());

        let labels: Vec<_> = report.labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 7);
        assert_eq!(labels[0].len(), 2);
        assert!(labels[0].primary());
    }

    #[test]
    fn test_parse_error_without_span() {
        let err = SettleError::new_parse_error("missing field `name`", None, "[[vertex]]");
        let report = to_report(&err);

        assert!(report.labels().is_none());
        assert!(report.source_code().is_some());
    }

    #[test]
    fn test_config_error() {
        let err = SettleError::Config(ConfigError::ZeroTimeLimit);

        let report = to_report(&err);
        assert!(report.to_string().starts_with("Configuration error:"));
        assert_eq!(report.code().unwrap().to_string(), "settle::config");
        assert!(report.help().is_some());
        assert!(report.source_code().is_none());
    }

    #[test]
    fn test_rendered_report_contains_snippet() {
        let source = "[[vertex]]\nname = \n";
        let err = SettleError::new_parse_error("expected a value", Some(11..15), source);

        let mut out = String::new();
        miette::GraphicalReportHandler::new_themed(miette::GraphicalTheme::unicode_nocolor())
            .render_report(&mut out, &to_report(&err))
            .unwrap();
        assert!(out.contains("settle::parse"));
        assert!(out.contains("name ="));
    }
}
