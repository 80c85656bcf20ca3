//! Main parser coordinator
//!
//! This module provides the [`Parser`] struct and core parsing infrastructure,
//! including the error type, helper methods, and the main parse entry point.
//!
//! # Parser Architecture
//!
//! The Parser is a predictive recursive descent parser with a bounded
//! lookahead of [`MAX_LOOKAHEAD`] tokens. It produces a concrete syntax tree
//! ([`CstNode`]); the typed AST is built from it afterwards by
//! [`crate::builder`].
//! - This module: Parser struct, helper methods, and coordination
//! - `declarations`: Shader/SubShader/Pass blocks, render states, structs,
//!   variables, functions
//! - `statements`: function bodies, statements and macro conditionals
//! - `expressions`: ternary → relational → additive → multiplicative → atomic
//!
//! Parser methods are split across multiple files using `impl Parser` blocks,
//! allowing each module to extend the Parser with related functionality while
//! maintaining access to the shared parser state.

use crate::parser::ast::SourceLocation;
use crate::parser::cst::{CstChild, CstKind, CstNode};
use crate::parser::lexer::{LexError, Lexer, Token, TokenKind};
use thiserror::Error;

/// Largest number of tokens any decision looks ahead.
pub const MAX_LOOKAHEAD: usize = 8;

/// Parser error type
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Parse error at {location}: {message}")]
pub struct ParseError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Predictive recursive descent parser for shader documents
pub struct Parser {
    pub(crate) tokens: Vec<Token>,
    pub(crate) position: usize,
}

impl Parser {
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let mut lexer = Lexer::new(source);
        let tokens = lexer.tokenize()?;
        Ok(Self::from_tokens(tokens))
    }

    /// Parser over an existing token stream; a trailing `Eof` is added if missing.
    pub fn from_tokens(mut tokens: Vec<Token>) -> Self {
        if !tokens.last().is_some_and(|t| t.kind == TokenKind::Eof) {
            let end = tokens.last().map(|t| t.span).unwrap_or_default();
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: end,
            });
        }
        Self {
            tokens,
            position: 0,
        }
    }

    /// Parse the whole document: exactly one `Shader` block.
    pub fn parse_document(&mut self) -> Result<CstNode, ParseError> {
        let shader = self.parse_shader()?;
        if !self.is_at_end() {
            return Err(self.error_here(format!(
                "Expected end of file after Shader block, found {}",
                self.peek()
            )));
        }
        Ok(shader)
    }

    // ===== Helper methods =====

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind().same_kind(kind)
    }

    pub(crate) fn check_ahead(&self, n: usize, kind: &TokenKind) -> bool {
        self.peek_ahead_kind(n).same_kind(kind)
    }

    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_at_end() {
            self.position += 1;
        }
        token
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.position.min(last)]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Kind of the token `n` positions ahead; `Eof` past the end.
    pub(crate) fn peek_ahead_kind(&self, n: usize) -> &TokenKind {
        debug_assert!(n < MAX_LOOKAHEAD);
        let last = self.tokens.len() - 1;
        &self.tokens[(self.position + n).min(last)].kind
    }

    pub(crate) fn current_location(&self) -> SourceLocation {
        self.peek().location()
    }

    pub(crate) fn error_here(&self, message: String) -> ParseError {
        ParseError {
            message,
            location: self.current_location(),
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("{}, found {}", message, self.peek())))
        }
    }

    pub(crate) fn expect_lbrace(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect(&TokenKind::LBrace, &format!("Expected '{{' {ctx}"))
    }

    pub(crate) fn expect_rbrace(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect(&TokenKind::RBrace, &format!("Expected '}}' {ctx}"))
    }

    pub(crate) fn expect_lparen(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect(&TokenKind::LParen, &format!("Expected '(' {ctx}"))
    }

    pub(crate) fn expect_rparen(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect(&TokenKind::RParen, &format!("Expected ')' {ctx}"))
    }

    pub(crate) fn expect_semicolon(&mut self, ctx: &str) -> Result<Token, ParseError> {
        self.expect(&TokenKind::Semicolon, &format!("Expected ';' {ctx}"))
    }

    pub(crate) fn expect_identifier(&mut self, ctx: &str) -> Result<Token, ParseError> {
        if matches!(self.peek_kind(), TokenKind::Ident(_)) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("Expected identifier {ctx}, found {}", self.peek())))
        }
    }

    pub(crate) fn expect_string(&mut self, ctx: &str) -> Result<Token, ParseError> {
        if matches!(self.peek_kind(), TokenKind::StringLiteral(_)) {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!("Expected string {ctx}, found {}", self.peek())))
        }
    }

    /// Parse items until the closing brace of a block, which is consumed.
    /// `what` names the block for the missing-brace error.
    pub(crate) fn parse_items_until_rbrace(
        &mut self,
        children: &mut Vec<CstChild>,
        what: &str,
        mut item: impl FnMut(&mut Parser) -> Result<CstNode, ParseError>,
    ) -> Result<(), ParseError> {
        let context = format!("to close {what}");
        while !self.check(&TokenKind::RBrace) {
            if self.is_at_end() {
                return Err(self.error_here(format!("Expected '}}' {context}, found end of file")));
            }
            children.push(item(self)?.into());
        }
        children.push(self.expect_rbrace(&context)?.into());
        Ok(())
    }

    /// Single-token node.
    pub(crate) fn leaf(&mut self, kind: CstKind) -> CstNode {
        let token = self.advance();
        CstNode::new(kind, vec![token.into()])
    }
}

/// Lex and parse `source` into a concrete syntax tree.
pub fn parse_cst(source: &str) -> Result<CstNode, ParseError> {
    Parser::new(source)?.parse_document()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_document() {
        let cst = parse_cst(r#"Shader "S" { }"#).unwrap();
        assert_eq!(cst.kind, CstKind::Shader);
        assert_eq!(cst.children.len(), 4);
    }

    #[test]
    fn test_missing_closing_brace_is_fatal() {
        let err = parse_cst(r#"Shader "S" { SubShader "D" { "#).unwrap_err();
        assert!(err.message.contains("Expected '}' to close SubShader"), "{}", err);
    }

    #[test]
    fn test_block_keeps_its_closing_brace() {
        let cst = parse_cst(r#"Shader "S" { SubShader "D" { } }"#).unwrap();
        let sub_shader = cst.nodes_of(CstKind::SubShader).next().unwrap();
        assert!(matches!(
            sub_shader.children.last(),
            Some(CstChild::Token(Token { kind: TokenKind::RBrace, .. }))
        ));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let err = parse_cst(r#"Shader "S" { } extra"#).unwrap_err();
        assert!(err.message.contains("end of file"));
        assert_eq!(err.location, SourceLocation::new(1, 16));
    }

    #[test]
    fn test_lex_error_surfaces_as_parse_error() {
        let err = parse_cst("Shader \"S\" { @ }").unwrap_err();
        assert!(err.message.contains("Unexpected character"));
    }

    #[test]
    fn test_root_span_covers_document() {
        let cst = parse_cst("Shader \"S\" {\n}\n").unwrap();
        assert_eq!(cst.span.start, SourceLocation::new(1, 1));
        assert_eq!(cst.span.end, SourceLocation::new(2, 2));
    }
}
