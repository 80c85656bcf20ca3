//! `#include` expansion
//!
//! Runs before lexing. Each line of the form `#include "path"` (or
//! `#include <path>`) is replaced by the resolved text, which is expanded in
//! turn. Every other line passes through untouched, other directives included.
//! Where the text comes from is up to the [`IncludeResolver`].

use log::trace;
use rustc_hash::FxHashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IncludeError {
    #[error("include '{path}' not found")]
    NotFound { path: String },

    /// Resolver-specific failure, e.g. an I/O error
    #[error("cannot read include '{path}': {message}")]
    Unreadable { path: String, message: String },

    #[error("malformed #include at line {line} of {file}")]
    Malformed { file: String, line: usize },

    #[error("'{path}' is recursively included from {file} at line {line}")]
    Recursive { path: String, file: String, line: usize },

    #[error("include depth limit {limit} exceeded by '{path}'")]
    TooDeep { path: String, limit: usize },
}

/// Supplies the text of included files.
pub trait IncludeResolver {
    fn resolve(&self, path: &str) -> Result<String, IncludeError>;
}

/// In-memory resolver keyed by include path.
#[derive(Debug, Clone, Default)]
pub struct MapIncludeResolver {
    files: FxHashMap<String, String>,
}

impl MapIncludeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) {
        self.files.insert(path.into(), text.into());
    }
}

impl IncludeResolver for MapIncludeResolver {
    fn resolve(&self, path: &str) -> Result<String, IncludeError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| IncludeError::NotFound { path: path.to_string() })
    }
}

/// Path named by an `#include` line; `Some(None)` for an include line
/// without a well-formed path, `None` for any other line.
fn include_target(line: &str) -> Option<Option<&str>> {
    let rest = line.trim_start().strip_prefix('#')?.trim_start().strip_prefix("include")?;
    let rest = rest.trim();
    let path = match rest.chars().next() {
        Some('"') => rest[1..].strip_suffix('"'),
        Some('<') => rest[1..].strip_suffix('>'),
        _ => None,
    };
    Some(path.filter(|p| !p.is_empty()))
}

struct Expander<'r> {
    resolver: &'r dyn IncludeResolver,
    max_depth: usize,
    /// Files currently being expanded, outermost first
    active: Vec<String>,
}

impl Expander<'_> {
    fn expand(&mut self, source: &str, file: &str, out: &mut String) -> Result<(), IncludeError> {
        for (index, line) in source.lines().enumerate() {
            let Some(target) = include_target(line) else {
                out.push_str(line);
                out.push('\n');
                continue;
            };
            let line_number = index + 1;
            let path = target.ok_or_else(|| IncludeError::Malformed {
                file: file.to_string(),
                line: line_number,
            })?;
            if self.active.iter().any(|active| active == path) {
                return Err(IncludeError::Recursive {
                    path: path.to_string(),
                    file: file.to_string(),
                    line: line_number,
                });
            }
            if self.active.len() >= self.max_depth {
                return Err(IncludeError::TooDeep {
                    path: path.to_string(),
                    limit: self.max_depth,
                });
            }
            trace!("expanding include '{}' from {}:{}", path, file, line_number);
            let text = self.resolver.resolve(path)?;
            self.active.push(path.to_string());
            self.expand(&text, path, out)?;
            self.active.pop();
        }
        Ok(())
    }
}

/// Recursively substitute `#include` lines, at most `max_depth` levels deep.
pub fn expand_includes(
    source: &str,
    resolver: &dyn IncludeResolver,
    max_depth: usize,
) -> Result<String, IncludeError> {
    let mut expander = Expander {
        resolver,
        max_depth,
        active: Vec::new(),
    };
    let mut out = String::with_capacity(source.len());
    expander.expand(source, "<root>", &mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_expansion() {
        let resolver = MapIncludeResolver::new()
            .with_file("common.glsl", "#include \"math.glsl\"\nfloat common;")
            .with_file("math.glsl", "#define PI 3.14159");
        let out = expand_includes("#include \"common.glsl\"\nvoid f() { }", &resolver, 16).unwrap();
        assert_eq!(out, "#define PI 3.14159\nfloat common;\nvoid f() { }\n");
    }

    #[test]
    fn test_same_file_twice_is_not_a_cycle() {
        let resolver = MapIncludeResolver::new().with_file("a", "float a;");
        let out = expand_includes("#include <a>\n#include <a>", &resolver, 16).unwrap();
        assert_eq!(out, "float a;\nfloat a;\n");
    }

    #[test]
    fn test_cycle_detected() {
        let resolver = MapIncludeResolver::new()
            .with_file("a", "#include \"b\"")
            .with_file("b", "#include \"a\"");
        let err = expand_includes("#include \"a\"", &resolver, 16).unwrap_err();
        assert_eq!(
            err,
            IncludeError::Recursive {
                path: "a".into(),
                file: "b".into(),
                line: 1
            }
        );
    }

    #[test]
    fn test_depth_limit() {
        let resolver = MapIncludeResolver::new()
            .with_file("a", "#include \"b\"")
            .with_file("b", "float b;");
        let err = expand_includes("#include \"a\"", &resolver, 1).unwrap_err();
        assert!(matches!(err, IncludeError::TooDeep { limit: 1, .. }));
    }

    #[test]
    fn test_missing_and_malformed() {
        let resolver = MapIncludeResolver::new();
        assert_eq!(
            expand_includes("#include \"nope\"", &resolver, 4).unwrap_err(),
            IncludeError::NotFound { path: "nope".into() }
        );
        assert!(matches!(
            expand_includes("float x;\n#include nope", &resolver, 4).unwrap_err(),
            IncludeError::Malformed { line: 2, .. }
        ));
    }
}
