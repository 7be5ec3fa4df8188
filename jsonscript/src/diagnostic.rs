//!
//! Diagnostic Module - Backend Error Reporting
//!
//! Backends report problems as plain `Diagnostic` values. A diagnostic that
//! points into a method body carries a `Location` with the owning method and
//! a span into that body.
//!
//! Diagnostics render two ways:
//! - `Display`: one line, `Acme.Widget.Run(1:5): error JS0103: message`
//! - `DiagnosticReporter`: a miette report quoting the method body with the
//!   offending span labelled
//!
//! Usage:
//!   let reporter = DiagnosticReporter::new(&unit);
//!   reporter.report_all(&diagnostics);
//!

use std::fmt;

use miette::{LabeledSpan, NamedSource, Report, SourceSpan};
use thiserror::Error;

use crate::dom::CompileUnit;
use crate::source::{line_col, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub namespace: String,
    pub class: String,
    pub method: String,
    pub span: Span,
    pub line: usize,
    pub col: usize,
}

impl Location {
    pub fn in_body(
        namespace: impl Into<String>,
        class: impl Into<String>,
        method: impl Into<String>,
        body: &str,
        span: Span,
    ) -> Self {
        let (line, col) = line_col(body, span.start);
        Self {
            namespace: namespace.into(),
            class: class.into(),
            method: method.into(),
            span,
            line,
            col,
        }
    }

    pub fn qualified_method(&self) -> String {
        format!("{}.{}.{}", self.namespace, self.class, self.method)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: String,
    pub message: String,
    pub location: Option<Location>,
}

impl Diagnostic {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code: code.into(),
            message: message.into(),
            location: None,
        }
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, message)
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{}({}:{}): ", loc.qualified_method(), loc.line, loc.col)?;
        }
        write!(f, "{} {}: {}", self.severity, self.code, self.message)
    }
}

#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct BodyDiagnostic {
    code: String,
    message: String,
    severity: Severity,
    src: NamedSource<String>,
    span: SourceSpan,
}

impl miette::Diagnostic for BodyDiagnostic {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(&self.code))
    }

    fn severity(&self) -> Option<miette::Severity> {
        Some(match self.severity {
            Severity::Error => miette::Severity::Error,
            Severity::Warning => miette::Severity::Warning,
        })
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some("here".to_string()),
            self.span,
        ))))
    }
}

impl BodyDiagnostic {
    pub fn new(diag: &Diagnostic, location: &Location, body: &str) -> Self {
        let start = (location.span.start as usize).min(body.len());
        let len = (location.span.len() as usize).min(body.len() - start);
        Self {
            code: diag.code.clone(),
            message: diag.message.clone(),
            severity: diag.severity,
            src: NamedSource::new(location.qualified_method(), body.to_string()),
            span: (start, len).into(),
        }
    }
}

/// Renders diagnostics against the compile unit they were produced for, so
/// located diagnostics can quote the method body.
pub struct DiagnosticReporter<'a> {
    unit: &'a CompileUnit,
}

impl<'a> DiagnosticReporter<'a> {
    pub fn new(unit: &'a CompileUnit) -> Self {
        Self { unit }
    }

    pub fn render(&self, diag: &Diagnostic) -> String {
        match diag.location.as_ref().and_then(|loc| self.body_of(loc).map(|b| (loc, b))) {
            Some((loc, body)) => format!("{:?}", Report::new(BodyDiagnostic::new(diag, loc, body))),
            None => diag.to_string(),
        }
    }

    pub fn report(&self, diag: &Diagnostic) {
        eprintln!("{}", self.render(diag));
    }

    pub fn report_all(&self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            self.report(diag);
        }
    }

    fn body_of(&self, loc: &Location) -> Option<&'a str> {
        let ns = self.unit.namespaces.iter().find(|ns| ns.name == loc.namespace)?;
        let ty = ns.types.iter().find(|t| t.name == loc.class)?;
        let method = ty.methods.iter().find(|m| m.name == loc.method)?;
        Some(method.body.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{MethodDecl, NamespaceDecl, TypeDecl, Visibility};

    fn unit_with_body(body: &str) -> CompileUnit {
        CompileUnit {
            namespaces: vec![NamespaceDecl {
                name: "Acme".to_string(),
                imports: Vec::new(),
                types: vec![TypeDecl {
                    name: "Widget".to_string(),
                    visibility: Visibility::Public,
                    is_static: false,
                    methods: vec![MethodDecl {
                        name: "Run".to_string(),
                        visibility: Visibility::Public,
                        is_static: false,
                        return_type: "System.Void".to_string(),
                        params: Vec::new(),
                        body: body.to_string(),
                    }],
                }],
            }],
        }
    }

    #[test]
    fn test_display_with_location() {
        let body = "var x = 1;\nfoo(x);";
        let diag = Diagnostic::error("JS0103", "The name 'foo' does not exist in the current context")
            .at(Location::in_body("Acme", "Widget", "Run", body, Span::new(11, 14)));

        assert_eq!(
            diag.to_string(),
            "Acme.Widget.Run(2:1): error JS0103: The name 'foo' does not exist in the current context"
        );
    }

    #[test]
    fn test_display_without_location() {
        let diag = Diagnostic::warning("JS0006", "Metadata file 'Foo.dll' could not be found");
        assert_eq!(diag.to_string(), "warning JS0006: Metadata file 'Foo.dll' could not be found");
        assert!(!diag.is_error());
    }

    #[test]
    fn test_reporter_quotes_body() {
        let body = "Console.WriteLine(missing);";
        let unit = unit_with_body(body);
        let diag = Diagnostic::error("JS0103", "The name 'missing' does not exist in the current context")
            .at(Location::in_body("Acme", "Widget", "Run", body, Span::new(18, 25)));

        let rendered = DiagnosticReporter::new(&unit).render(&diag);
        assert!(rendered.contains("JS0103"));
        assert!(rendered.contains("Console.WriteLine(missing);"));
    }

    #[test]
    fn test_reporter_falls_back_to_display() {
        let unit = unit_with_body("");
        let diag = Diagnostic::error("JS0006", "Metadata file 'Foo.dll' could not be found");
        assert_eq!(DiagnosticReporter::new(&unit).render(&diag), diag.to_string());
    }
}
