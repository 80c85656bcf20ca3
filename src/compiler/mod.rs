//! Semantic pass and code generation
//!
//! Every pass of a document is compiled independently: a
//! [`CompilationContext`] collects the globals visible from the pass, and the
//! stage serializer emits only what each entry function reaches. Semantic
//! problems become [`Diagnostic`]s and never stop sibling passes.

pub mod builtins;
pub mod context;
pub mod diagnostics;
pub mod render_states;
pub mod serializer;

pub use context::CompilationContext;
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity, Stage};

use crate::builder::build_shader;
use crate::config::CompilerConfig;
use crate::include::{expand_includes, IncludeError, IncludeResolver};
use crate::parser::ast::{AstNode, EditorPropertyAst, PassItem, ShaderAst, TagAst, TagValue};
use crate::parser::lexer::{tokenize, LexError};
use crate::parser::{ParseError, Parser};
use crate::render_state::RenderStates;
use log::debug;
use std::collections::BTreeMap;
use thiserror::Error;

/// Fatal failure: the document could not be turned into an AST.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Include(#[from] IncludeError),
}

/// Output of one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPass {
    pub name: String,
    pub tags: BTreeMap<String, TagValue>,
    pub render_states: RenderStates,
    /// Vertex program text; empty when the pass has no usable vertex entry.
    pub vert: String,
    pub frag: String,
    pub vert_entry: Option<String>,
    pub frag_entry: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassEntry {
    Pass(CompiledPass),
    /// Reference to a pass of another shader, resolved by the renderer.
    UsePass(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSubShader {
    pub name: String,
    pub tags: BTreeMap<String, TagValue>,
    pub passes: Vec<PassEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledShader {
    pub name: String,
    pub editor_properties: Vec<EditorPropertyAst>,
    pub sub_shaders: Vec<CompiledSubShader>,
    pub diagnostics: Vec<Diagnostic>,
}

impl CompiledShader {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// All compiled passes in document order, skipping `UsePass` entries.
    pub fn passes(&self) -> impl Iterator<Item = &CompiledPass> {
        self.sub_shaders.iter().flat_map(|sub| {
            sub.passes.iter().filter_map(|entry| match entry {
                PassEntry::Pass(pass) => Some(pass),
                PassEntry::UsePass(_) => None,
            })
        })
    }
}

pub(crate) fn collect_tags(tags: &[AstNode<TagAst>]) -> BTreeMap<String, TagValue> {
    tags.iter()
        .map(|tag| (tag.content.key.clone(), tag.content.value.clone()))
        .collect()
}

/// Compile every pass of an already-built document.
pub fn compile_ast(shader: &ShaderAst, config: &CompilerConfig) -> CompiledShader {
    debug!("compiling shader '{}'", shader.name);
    let mut ctx = CompilationContext::new(config);
    let mut diagnostics = Vec::new();
    let mut sub_shaders = Vec::with_capacity(shader.sub_shaders.len());

    for sub_shader in &shader.sub_shaders {
        let sub_shader = &sub_shader.content;
        debug!("compiling subshader '{}'", sub_shader.name);
        ctx.reset_for_sub_shader();
        let mut passes = Vec::with_capacity(sub_shader.passes.len());
        for item in &sub_shader.passes {
            match &item.content {
                PassItem::Pass(pass) => {
                    passes.push(PassEntry::Pass(ctx.compile_pass(shader, sub_shader, pass)));
                    diagnostics.extend(ctx.take_diagnostics());
                }
                PassItem::UsePass(path) => passes.push(PassEntry::UsePass(path.clone())),
            }
        }
        sub_shaders.push(CompiledSubShader {
            name: sub_shader.name.clone(),
            tags: collect_tags(&sub_shader.tags),
            passes,
        });
    }

    CompiledShader {
        name: shader.name.clone(),
        editor_properties: shader
            .editor_properties
            .iter()
            .map(|property| property.content.clone())
            .collect(),
        sub_shaders,
        diagnostics,
    }
}

/// Compile an include-free document.
pub fn compile(source: &str, config: &CompilerConfig) -> Result<CompiledShader, CompileError> {
    let tokens = tokenize(source)?;
    let cst = Parser::from_tokens(tokens).parse_document()?;
    let ast = build_shader(&cst)?;
    Ok(compile_ast(&ast.content, config))
}

/// Expand `#include` lines through `resolver`, then compile.
pub fn compile_with_includes(
    source: &str,
    resolver: &dyn IncludeResolver,
    config: &CompilerConfig,
) -> Result<CompiledShader, CompileError> {
    let expanded = expand_includes(source, resolver, config.max_include_depth)?;
    compile(&expanded, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_pass_and_tags() {
        let compiled = compile(
            r#"Shader "S" {
                SubShader "D" {
                    Tags { Queue = "Geometry", Order = 2 }
                    UsePass "Other/Main/Shadow"
                    Pass "P" { Tags { LightMode = "Forward" } }
                }
            }"#,
            &CompilerConfig::default(),
        )
        .unwrap();
        let sub = &compiled.sub_shaders[0];
        assert_eq!(sub.tags.get("Order"), Some(&TagValue::Number(2.0)));
        assert_eq!(sub.passes[0], PassEntry::UsePass("Other/Main/Shadow".into()));
        let pass = compiled.passes().next().unwrap();
        assert_eq!(pass.tags.get("LightMode"), Some(&TagValue::String("Forward".into())));
        assert!(pass.vert.is_empty() && pass.frag.is_empty());
    }

    #[test]
    fn test_unknown_entry_is_error() {
        let compiled = compile(
            r#"Shader "S" { SubShader "D" { Pass "P" { FragmentShader = nothing; } } }"#,
            &CompilerConfig::default(),
        )
        .unwrap();
        assert!(compiled.has_errors());
        assert_eq!(
            compiled.diagnostics[0].message(),
            "fragment entry 'nothing' is not a declared function"
        );
        assert_eq!(compiled.passes().next().unwrap().frag, "");
    }

    #[test]
    fn test_lex_error_surfaces() {
        let err = compile("Shader \"S\" { @ }", &CompilerConfig::default()).unwrap_err();
        assert!(matches!(err, CompileError::Lex(_)));
    }
}
