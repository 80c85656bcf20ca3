//! Concrete syntax tree
//!
//! The parser records every production it recognises as a [`CstNode`] whose
//! children are the sub-productions and tokens it consumed, in order. Nothing
//! is dropped or normalised here; that is the job of [`crate::builder`].

use super::ast::Span;
use super::lexer::Token;

/// One variant per grammar production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CstKind {
    // Document structure
    Shader,
    SubShader,
    Pass,
    UsePass,
    Tags,
    Tag,
    EditorProperties,
    EditorProperty,
    EntryAssign,
    RenderStateAssign,
    RenderQueueAssign,
    RenderStateDecl,
    RenderStateProperty,

    // Declarations
    Struct,
    StructField,
    VariableDecl,
    Declarator,
    Type,
    ArraySpecifier,
    Fn,
    FnArg,
    FnBody,

    // Macros
    Directive,
    Condition,
    ElifBranch,
    ElseBranch,

    // Statements
    Block,
    If,
    For,
    Return,
    Jump,
    Assignment,
    ExpressionStatement,

    // Expressions
    Ternary,
    Relational,
    Additive,
    Multiplicative,
    Atomic,
    Paren,
    Call,
    Variable,
    MemberAccess,
    IndexAccess,
    Number,
    Bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CstChild {
    Node(CstNode),
    Token(Token),
}

impl CstChild {
    pub fn span(&self) -> Span {
        match self {
            CstChild::Node(node) => node.span,
            CstChild::Token(token) => token.span,
        }
    }
}

impl From<Token> for CstChild {
    fn from(token: Token) -> Self {
        CstChild::Token(token)
    }
}

impl From<CstNode> for CstChild {
    fn from(node: CstNode) -> Self {
        CstChild::Node(node)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CstNode {
    pub kind: CstKind,
    pub span: Span,
    pub children: Vec<CstChild>,
}

impl CstNode {
    /// Build a node; its span is the union of its children's spans.
    pub fn new(kind: CstKind, children: Vec<CstChild>) -> Self {
        let span = children
            .iter()
            .map(CstChild::span)
            .reduce(Span::union)
            .unwrap_or_default();
        Self {
            kind,
            span,
            children,
        }
    }

    /// Direct child nodes of the given kind.
    pub fn nodes_of(&self, kind: CstKind) -> impl Iterator<Item = &CstNode> {
        self.children.iter().filter_map(move |child| match child {
            CstChild::Node(node) if node.kind == kind => Some(node),
            _ => None,
        })
    }
}
