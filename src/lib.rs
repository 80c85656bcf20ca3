//! # Introduction
//!
//! shaderlab compiles shader documents, `Shader` / `SubShader` / `Pass` blocks
//! holding render-state declarations, structs, functions and
//! preprocessor-style macros, into one minimal vertex program and one minimal
//! fragment program per pass, plus the pass's resolved render state.
//!
//! ## Compilation pipeline
//!
//! ```text
//! Source → Includes → Lexer → Parser (CST) → Builder (AST)
//!        → per Pass: Context + Serializer
//! ```
//!
//! 1. [`include`]: substitutes `#include` lines through an
//!    [`include::IncludeResolver`].
//! 2. [`parser`]: tokenises the document and builds a concrete syntax tree.
//! 3. [`builder`]: lowers the CST to typed [`parser::ast`] nodes.
//! 4. [`compiler`]: compiles each pass independently; only the globals an entry
//!    function reaches end up in its stage, in dependency order.
//! 5. [`render_state`] and [`engine`]: the render-state vocabulary and the
//!    engine enum families values are checked against.
//!
//! Structural errors abort the document with a [`compiler::CompileError`];
//! semantic problems are collected as [`compiler::Diagnostic`]s and never stop
//! other passes.
//!
//! ```
//! use shaderlab::{compile, CompilerConfig};
//!
//! let shader = compile(
//!     r#"Shader "S" { SubShader "D" { Pass "P" {
//!         vec4 tint;
//!         void frag() { gl_FragColor = tint; }
//!         FragmentShader = frag;
//!     } } }"#,
//!     &CompilerConfig::default(),
//! )
//! .unwrap();
//! let pass = shader.passes().next().unwrap();
//! assert!(pass.frag.contains("uniform vec4 tint;"));
//! ```

pub mod builder;
pub mod compiler;
pub mod config;
pub mod engine;
pub mod include;
pub mod parser;
pub mod render_state;

pub use compiler::{
    compile, compile_ast, compile_with_includes, CompileError, CompiledPass, CompiledShader,
};
pub use config::CompilerConfig;
