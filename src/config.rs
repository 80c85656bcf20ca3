//! Compiler configuration

/// Default fragment-stage precision statement.
pub const DEFAULT_PRECISION_HEADER: &str = "precision mediump float;";

/// Default limit on nested `#include` expansion.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 16;

/// Options shared by every pass compiled from one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Line placed at the top of every fragment program; `None` emits nothing.
    pub precision_header: Option<String>,
    /// Warn about identifiers that resolve to nothing and are not built-ins.
    pub report_undeclared: bool,
    pub max_include_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            precision_header: Some(DEFAULT_PRECISION_HEADER.to_string()),
            report_undeclared: true,
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_precision_header(mut self, header: Option<impl Into<String>>) -> Self {
        self.precision_header = header.map(Into::into);
        self
    }

    pub fn with_report_undeclared(mut self, report: bool) -> Self {
        self.report_undeclared = report;
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::default();
        assert_eq!(config.precision_header.as_deref(), Some(DEFAULT_PRECISION_HEADER));
        assert!(config.report_undeclared);
        assert_eq!(config.max_include_depth, 16);
    }

    #[test]
    fn test_builder_setters() {
        let config = CompilerConfig::new()
            .with_precision_header(None::<String>)
            .with_report_undeclared(false)
            .with_max_include_depth(2);
        assert_eq!(config.precision_header, None);
        assert!(!config.report_undeclared);
        assert_eq!(config.max_include_depth, 2);
    }
}
