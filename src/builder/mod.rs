//! AST builder
//!
//! One bottom-up, purely structural visit of the concrete syntax tree. Each CST
//! node yields one typed [`AstNode`] whose span is the span of the CST node,
//! i.e. the union of everything it consumed. Two normalisations happen here:
//!
//! 1. Operator chains become [`ExprAst::Chain`] (operator list plus operand
//!    list); a precedence level holding a single operand collapses into it.
//! 2. [`TypeAst::is_custom`] is set for types spelled as a bare identifier.
//!
//! Item dispatch is an exhaustive `match` over [`CstKind`], so a new production
//! cannot be added without deciding how each consumer treats it. A CST that
//! does not have the shape its production promises yields a [`ParseError`]
//! starting with "malformed syntax tree".
//!
//! [`ExprAst::Chain`]: crate::parser::ast::ExprAst::Chain
//! [`TypeAst::is_custom`]: crate::parser::ast::TypeAst::is_custom

mod declarations;
mod expressions;
mod statements;

use crate::parser::ast::{AstNode, ShaderAst};
use crate::parser::cst::{CstChild, CstKind, CstNode};
use crate::parser::lexer::{Token, TokenKind};
use crate::parser::parse::{parse_cst, ParseError};

/// Build the typed AST of a whole document from its CST root.
pub fn build_shader(root: &CstNode) -> Result<AstNode<ShaderAst>, ParseError> {
    declarations::build_shader(root)
}

/// Lex, parse and build in one call.
pub fn parse_shader(source: &str) -> Result<AstNode<ShaderAst>, ParseError> {
    let cst = parse_cst(source)?;
    build_shader(&cst)
}

pub(crate) fn malformed(node: &CstNode, what: &str) -> ParseError {
    ParseError {
        message: format!("malformed syntax tree: {} in {:?}", what, node.kind),
        location: node.span.start,
    }
}

/// Sequential reader over the children of one CST node.
pub(crate) struct Cursor<'a> {
    node: &'a CstNode,
    position: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(node: &'a CstNode) -> Self {
        Self { node, position: 0 }
    }

    pub(crate) fn error(&self, what: &str) -> ParseError {
        malformed(self.node, what)
    }

    fn peek(&self) -> Option<&'a CstChild> {
        self.node.children.get(self.position)
    }

    pub(crate) fn is_done(&self) -> bool {
        self.position >= self.node.children.len()
    }

    pub(crate) fn next(&mut self) -> Option<&'a CstChild> {
        let child = self.peek();
        if child.is_some() {
            self.position += 1;
        }
        child
    }

    /// Next child, which must be a token.
    pub(crate) fn token(&mut self) -> Result<&'a Token, ParseError> {
        match self.next() {
            Some(CstChild::Token(token)) => Ok(token),
            _ => Err(self.error("expected token")),
        }
    }

    /// Consume the next child when it is a token of the same kind as `kind`.
    pub(crate) fn token_if(&mut self, kind: &TokenKind) -> Option<&'a Token> {
        match self.peek() {
            Some(CstChild::Token(token)) if token.kind.same_kind(kind) => {
                self.position += 1;
                Some(token)
            }
            _ => None,
        }
    }

    /// Consume the next child when `pred` accepts its token kind.
    pub(crate) fn token_where(&mut self, pred: impl Fn(&TokenKind) -> bool) -> Option<&'a Token> {
        match self.peek() {
            Some(CstChild::Token(token)) if pred(&token.kind) => {
                self.position += 1;
                Some(token)
            }
            _ => None,
        }
    }

    /// Next child, which must be a node of `kind`.
    pub(crate) fn node(&mut self, kind: CstKind) -> Result<&'a CstNode, ParseError> {
        self.node_if(kind)
            .ok_or_else(|| self.error(&format!("expected {:?}", kind)))
    }

    pub(crate) fn node_if(&mut self, kind: CstKind) -> Option<&'a CstNode> {
        match self.peek() {
            Some(CstChild::Node(node)) if node.kind == kind => {
                self.position += 1;
                Some(node)
            }
            _ => None,
        }
    }

    /// Next child if it is a node of any kind.
    pub(crate) fn any_node(&mut self) -> Option<&'a CstNode> {
        match self.peek() {
            Some(CstChild::Node(node)) => {
                self.position += 1;
                Some(node)
            }
            _ => None,
        }
    }

    pub(crate) fn ident(&mut self) -> Result<String, ParseError> {
        match self.token()?.kind {
            TokenKind::Ident(ref name) => Ok(name.clone()),
            _ => Err(self.error("expected identifier")),
        }
    }

    pub(crate) fn string(&mut self) -> Result<String, ParseError> {
        match self.token()?.kind {
            TokenKind::StringLiteral(ref text) => Ok(text.clone()),
            _ => Err(self.error("expected string literal")),
        }
    }

    /// Everything consumed; trailing children mean the shape is wrong.
    pub(crate) fn finish(&self) -> Result<(), ParseError> {
        if self.is_done() {
            Ok(())
        } else {
            Err(self.error("unexpected trailing child"))
        }
    }
}

/// Numeric value of an int or float literal, including `0x` forms.
pub(crate) fn number_value(text: &str) -> Option<f64> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok().map(|v| v as f64),
        None => text.parse::<f64>().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{BlendFactor, EngineEnumValue};
    use crate::parser::ast::*;
    use crate::render_state::{RenderStateKind, RenderStateProperty, RenderStateValue};

    const END_TO_END: &str = r#"Shader "S" { SubShader "D" { Pass "P" {
        struct A { vec3 pos; }
        vec4 f(A a){ return vec4(a.pos,1.0); }
        VertexShader = vert;
        FragmentShader = f;
    } } }"#;

    fn first_pass(shader: &ShaderAst) -> &PassAst {
        match &shader.sub_shaders[0].content.passes[0].content {
            PassItem::Pass(pass) => pass,
            PassItem::UsePass(path) => panic!("unexpected UsePass {path}"),
        }
    }

    #[test]
    fn test_build_end_to_end_document() {
        let shader = parse_shader(END_TO_END).unwrap().content;
        assert_eq!(shader.name, "S");
        assert_eq!(shader.sub_shaders[0].content.name, "D");
        let pass = first_pass(&shader);
        assert_eq!(pass.name, "P");
        assert_eq!(pass.declarations.len(), 2);
        assert!(matches!(&pass.declarations[0].content, GlobalItem::Struct(s) if s.name == "A"));
        match &pass.declarations[1].content {
            GlobalItem::Function(f) => {
                assert_eq!(f.name, "f");
                assert_eq!(f.args[0].content.ty.content.name, "A");
                assert!(f.args[0].content.ty.content.is_custom);
                assert!(!f.return_type.content.is_custom);
            }
            other => panic!("expected function, got {other:?}"),
        }
        assert_eq!(
            pass.properties.iter().map(|p| p.content.clone()).collect::<Vec<_>>(),
            vec![
                PassPropertyAst::VertexEntry("vert".into()),
                PassPropertyAst::FragmentEntry("f".into())
            ]
        );
    }

    #[test]
    fn test_parent_span_encloses_children() {
        let shader = parse_shader(END_TO_END).unwrap();
        let sub = &shader.content.sub_shaders[0];
        assert!(shader.span.contains(&sub.span));
        let pass = &sub.content.passes[0];
        assert!(sub.span.contains(&pass.span));
        for decl in &first_pass(&shader.content).declarations {
            assert!(pass.span.contains(&decl.span));
        }
    }

    #[test]
    fn test_render_state_value_is_engine_enum() {
        let shader = parse_shader(
            r#"Shader "S" { BlendState { SrcColorBlendFactor = BlendFactor.SrcAlpha; Enabled[1] = true; } }"#,
        )
        .unwrap()
        .content;
        let decl = &shader.render_states[0].content;
        assert_eq!(decl.kind, RenderStateKind::Blend);
        assert_eq!(decl.name, None);
        let first = &decl.properties[0].content;
        assert_eq!(first.property, RenderStateProperty::SrcColorBlendFactor);
        assert_eq!(
            first.value,
            RenderStateValue::Enum(EngineEnumValue::BlendFactor(BlendFactor::SrcAlpha))
        );
        let second = &decl.properties[1].content;
        assert_eq!(second.index, Some(1));
        assert_eq!(second.value, RenderStateValue::Bool(true));
    }

    #[test]
    fn test_malformed_tree_is_reported() {
        let bogus = CstNode::new(CstKind::Bool, Vec::new());
        let err = build_shader(&bogus).unwrap_err();
        assert!(err.message.starts_with("malformed syntax tree"), "{}", err);
    }

    #[test]
    fn test_number_values() {
        assert_eq!(number_value("0x1F"), Some(31.0));
        assert_eq!(number_value("2."), Some(2.0));
        assert_eq!(number_value(".5"), Some(0.5));
        assert_eq!(number_value("1.5e-3"), Some(0.0015));
    }
}
