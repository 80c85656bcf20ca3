//! Shader document parser
//!
//! This module turns include-expanded source text into a concrete syntax tree:
//! - [`lexer`]: Tokenization (source text → tokens)
//! - [`parse`]: Parsing (tokens → [`cst::CstNode`])
//! - [`cst`]: Concrete syntax tree node definitions
//! - [`ast`]: Typed AST node definitions, built from the CST by [`crate::builder`]
//!
//! # Document Shape
//!
//! - One `Shader` block holding editor properties, render states, global
//!   declarations and `SubShader` blocks
//! - `SubShader` blocks hold tags, render states, declarations and `Pass` or
//!   `UsePass` entries
//! - `Pass` blocks hold entry-point and render-state assignments plus the
//!   declarations of the shading sub-language
//!
//! # Parser Implementation
//!
//! Hand-written predictive recursive descent parser with bounded lookahead.
//! No external parser generator dependencies.

pub mod ast;
pub mod cst;
mod declarations;
mod expressions;
pub mod lexer;
pub mod parse;
mod statements;

pub use parse::{parse_cst, ParseError, Parser};
