//! Semantic diagnostics
//!
//! Issues found while compiling a pass never abort the compile. They are
//! collected as [`Diagnostic`] values carrying a severity and the span of the
//! construct at fault; the caller decides what to do with them.

use crate::parser::ast::Span;
use crate::render_state::RenderStateKind;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
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

/// Shader stage an entry point is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
        }
    }
}

/// What went wrong
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// A second `VertexShader = ...;` / `FragmentShader = ...;` in one pass
    DuplicateEntry { stage: Stage },

    /// Entry assignment naming no declared function
    UnknownEntry { stage: Stage, name: String },

    /// `BlendState = name;` with no matching named declaration in scope
    UnknownRenderState { kind: RenderStateKind, name: String },

    /// Identifier that is neither declared nor a built-in
    UndeclaredIdentifier { name: String },

    /// Attribute or varying parameter used without selecting a field
    InterfaceValue { stage: Stage, name: String },
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::DuplicateEntry { stage } => {
                write!(f, "multiple {} main function found", stage.name())
            }
            DiagnosticKind::UnknownEntry { stage, name } => {
                write!(f, "{} entry '{}' is not a declared function", stage.name(), name)
            }
            DiagnosticKind::UnknownRenderState { kind, name } => {
                write!(f, "unknown {} '{}'", kind, name)
            }
            DiagnosticKind::UndeclaredIdentifier { name } => {
                write!(f, "undeclared identifier '{}'", name)
            }
            DiagnosticKind::InterfaceValue { stage, name } => write!(
                f,
                "'{}' is a {} interface struct and can only be read field by field",
                name,
                stage.name()
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(kind: DiagnosticKind, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            kind,
            span,
        }
    }

    pub fn warning(kind: DiagnosticKind, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            kind,
            span,
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}: {}", self.severity, self.span.start, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::SourceLocation;

    #[test]
    fn test_duplicate_entry_message() {
        let span = Span::new(SourceLocation::new(3, 5), SourceLocation::new(3, 24));
        let diag = Diagnostic::error(DiagnosticKind::DuplicateEntry { stage: Stage::Vertex }, span);
        assert_eq!(diag.message(), "multiple vertex main function found");
        assert_eq!(
            diag.to_string(),
            "error at line 3, column 5: multiple vertex main function found"
        );
        assert!(diag.is_error());
    }

    #[test]
    fn test_warning_display() {
        let diag = Diagnostic::warning(
            DiagnosticKind::UndeclaredIdentifier { name: "foo".into() },
            Span::default(),
        );
        assert!(!diag.is_error());
        assert!(diag.to_string().starts_with("warning"));
    }
}
