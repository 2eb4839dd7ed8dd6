//! Error adapter for converting layout errors and validation warnings to
//! miette diagnostics.
//!
//! This module provides the bridge between the library's standard error and
//! warning types and miette's rich diagnostic formatting used in the CLI.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, Severity as MietteSeverity};

use bpmn_layout::{
    LayoutError,
    validate::{Severity, ValidationWarning},
};

/// Adapter for [`LayoutError`].
pub struct ErrorAdapter<'a>(pub &'a LayoutError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            LayoutError::Io(_) => "bpmn_layout::io",
            LayoutError::Config(_) => "bpmn_layout::config",
            LayoutError::Input(_) => "bpmn_layout::input",
            LayoutError::Engine(_) => "bpmn_layout::engine",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match &self.0 {
            LayoutError::Config(_) => "check the TOML file against the documented [layout] sections",
            LayoutError::Input(_) => "the input must be a JSON-serialized process model",
            LayoutError::Engine(_) => "select the `basic` engine to avoid external tools",
            LayoutError::Io(_) => return None,
        };
        Some(Box::new(help))
    }
}

/// Adapter for a [`ValidationWarning`] about the input model.
pub struct WarningAdapter<'a>(pub &'a ValidationWarning);

impl fmt::Debug for WarningAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for WarningAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.message())
    }
}

impl std::error::Error for WarningAdapter<'_> {}

impl MietteDiagnostic for WarningAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(format!(
            "bpmn_layout::validate::{}",
            self.0.code().as_str()
        )))
    }

    fn severity(&self) -> Option<MietteSeverity> {
        Some(match self.0.severity() {
            Severity::Error => MietteSeverity::Error,
            Severity::Warning => MietteSeverity::Warning,
            Severity::Info => MietteSeverity::Advice,
        })
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        self.0
            .element_id()
            .map(|id| Box::new(format!("element `{id}`")) as Box<dyn fmt::Display>)
    }
}

/// A reportable diagnostic that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A finding about the input model.
    Warning(WarningAdapter<'a>),
    /// A failure of the run.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Warning(w) => fmt::Display::fmt(w, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Warning(_) => None,
            Reportable::Error(e) => std::error::Error::source(e),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Warning(w) => w.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn severity(&self) -> Option<MietteSeverity> {
        match self {
            Reportable::Warning(w) => w.severity(),
            Reportable::Error(e) => e.severity(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Warning(w) => w.help(),
            Reportable::Error(e) => e.help(),
        }
    }
}

/// Convert a [`LayoutError`] into a list of reportable errors.
pub fn to_reportables(err: &LayoutError) -> Vec<Reportable<'_>> {
    vec![Reportable::Error(ErrorAdapter(err))]
}

/// Convert validation findings into reportables, most severe first.
pub fn warning_reportables(warnings: &[ValidationWarning]) -> Vec<Reportable<'_>> {
    let mut sorted: Vec<&ValidationWarning> = warnings.iter().collect();
    sorted.sort_by_key(|warning| warning.severity());
    sorted
        .into_iter()
        .map(|warning| Reportable::Warning(WarningAdapter(warning)))
        .collect()
}
