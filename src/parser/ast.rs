// AST (Abstract Syntax Tree) definitions for the shader language

use crate::engine::RenderQueueType;
use crate::render_state::{RenderStateKind, RenderStateProperty, RenderStateValue};
use std::fmt;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Half-open source range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl Span {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Smallest span enclosing both.
    pub fn union(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn contains(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{}",
            self.start.line, self.start.column, self.end.line, self.end.column
        )
    }
}

/// A typed AST payload with the span of everything it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct AstNode<T> {
    pub content: T,
    pub span: Span,
}

impl<T> AstNode<T> {
    pub fn new(content: T, span: Span) -> Self {
        Self { content, span }
    }
}

/// Precision qualifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Precision {
    Low,
    Medium,
    High,
}

impl Precision {
    pub fn as_str(self) -> &'static str {
        match self {
            Precision::Low => "lowp",
            Precision::Medium => "mediump",
            Precision::High => "highp",
        }
    }
}

/// A type name. `is_custom` is set when the name is a bare identifier
/// (a struct) rather than a built-in type keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAst {
    pub name: String,
    pub is_custom: bool,
}

// ===== Document structure =====

#[derive(Debug, Clone, PartialEq)]
pub struct ShaderAst {
    pub name: String,
    pub editor_properties: Vec<AstNode<EditorPropertyAst>>,
    pub sub_shaders: Vec<AstNode<SubShaderAst>>,
    pub tags: Vec<AstNode<TagAst>>,
    pub render_states: Vec<AstNode<RenderStateDeclarationAst>>,
    pub declarations: Vec<AstNode<GlobalItem>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubShaderAst {
    pub name: String,
    pub tags: Vec<AstNode<TagAst>>,
    pub passes: Vec<AstNode<PassItem>>,
    pub render_states: Vec<AstNode<RenderStateDeclarationAst>>,
    pub declarations: Vec<AstNode<GlobalItem>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PassItem {
    Pass(PassAst),
    /// `UsePass "Shader/SubShader/Pass"`
    UsePass(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassAst {
    pub name: String,
    pub tags: Vec<AstNode<TagAst>>,
    pub properties: Vec<AstNode<PassPropertyAst>>,
    pub render_states: Vec<AstNode<RenderStateDeclarationAst>>,
    pub declarations: Vec<AstNode<GlobalItem>>,
}

/// Property assignments that configure a pass rather than declare code.
#[derive(Debug, Clone, PartialEq)]
pub enum PassPropertyAst {
    VertexEntry(String),
    FragmentEntry(String),
    /// `BlendState = name;` selects a named render-state declaration.
    StateReference { kind: RenderStateKind, name: String },
    RenderQueue(RenderQueueValue),
}

#[derive(Debug, Clone, PartialEq)]
pub enum RenderQueueValue {
    Fixed(RenderQueueType),
    Variable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagAst {
    pub key: String,
    pub value: TagValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    String(String),
    Number(f64),
    Bool(bool),
}

/// `name("Display Name", Kind) = default;` inside `EditorProperties`.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorPropertyAst {
    pub name: String,
    pub display_name: String,
    pub kind: String,
    pub default: Option<PropertyDefault>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyDefault {
    Number(f64),
    Bool(bool),
    String(String),
    Tuple(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderStateDeclarationAst {
    pub kind: RenderStateKind,
    pub name: Option<String>,
    pub properties: Vec<AstNode<RenderStatePropertyAst>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderStatePropertyAst {
    pub property: RenderStateProperty,
    pub index: Option<usize>,
    pub value: RenderStateValue,
}

// ===== Declarations =====

/// A declaration at Shader, SubShader or Pass level.
#[derive(Debug, Clone, PartialEq)]
pub enum GlobalItem {
    Struct(StructAst),
    Variable(VariableDeclarationAst),
    Function(FnAst),
    Directive(MacroDirectiveAst),
    Condition(MacroConditionAst<GlobalItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructAst {
    pub name: String,
    pub fields: Vec<AstNode<StructFieldAst>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructFieldAst {
    pub precision: Option<Precision>,
    pub ty: AstNode<TypeAst>,
    pub name: String,
    pub array_size: Option<AstNode<ExprAst>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclarationAst {
    pub is_const: bool,
    pub precision: Option<Precision>,
    pub ty: AstNode<TypeAst>,
    pub declarators: Vec<AstNode<DeclaratorAst>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclaratorAst {
    pub name: String,
    pub array_size: Option<AstNode<ExprAst>>,
    pub init: Option<AstNode<ExprAst>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgDecorator {
    In,
    Out,
    InOut,
}

impl ArgDecorator {
    pub fn as_str(self) -> &'static str {
        match self {
            ArgDecorator::In => "in",
            ArgDecorator::Out => "out",
            ArgDecorator::InOut => "inout",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnArgAst {
    pub decorator: Option<ArgDecorator>,
    pub is_const: bool,
    pub precision: Option<Precision>,
    pub ty: AstNode<TypeAst>,
    pub name: String,
    pub array_size: Option<AstNode<ExprAst>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnAst {
    pub precision: Option<Precision>,
    pub return_type: AstNode<TypeAst>,
    pub name: String,
    pub args: Vec<AstNode<FnArgAst>>,
    pub body: AstNode<FnBodyAst>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnBodyAst {
    pub items: Vec<AstNode<FnBodyItem>>,
}

/// Statements and macros interleaved in source order.
#[derive(Debug, Clone, PartialEq)]
pub enum FnBodyItem {
    Statement(StatementAst),
    Directive(MacroDirectiveAst),
    Condition(MacroConditionAst<FnBodyItem>),
}

// ===== Macros =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKind {
    Define,
    Undef,
}

/// `#define NAME rest` or `#undef NAME`, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct MacroDirectiveAst {
    pub kind: DirectiveKind,
    pub name: String,
    /// Everything after the directive keyword.
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    If,
    Ifdef,
    Ifndef,
}

impl ConditionKind {
    pub fn directive(self) -> &'static str {
        match self {
            ConditionKind::If => "#if",
            ConditionKind::Ifdef => "#ifdef",
            ConditionKind::Ifndef => "#ifndef",
        }
    }
}

/// `#if/#ifdef/#ifndef ... (#elif ...)* (#else ...)? #endif`
#[derive(Debug, Clone, PartialEq)]
pub struct MacroConditionAst<T> {
    pub kind: ConditionKind,
    pub condition: String,
    pub body: Vec<AstNode<T>>,
    pub elif_branches: Vec<AstNode<MacroBranchAst<T>>>,
    pub else_branch: Option<AstNode<Vec<AstNode<T>>>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MacroBranchAst<T> {
    pub condition: String,
    pub body: Vec<AstNode<T>>,
}

// ===== Statements =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    Increment,
    Decrement,
    PreIncrement,
    PreDecrement,
}

impl AssignOp {
    pub fn as_str(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::AddAssign => "+=",
            AssignOp::SubAssign => "-=",
            AssignOp::MulAssign => "*=",
            AssignOp::DivAssign => "/=",
            AssignOp::Increment | AssignOp::PreIncrement => "++",
            AssignOp::Decrement | AssignOp::PreDecrement => "--",
        }
    }

    /// `++x` / `--x`, written before the target.
    pub fn is_prefix(self) -> bool {
        matches!(self, AssignOp::PreIncrement | AssignOp::PreDecrement)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Discard,
    Break,
    Continue,
}

impl JumpKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JumpKind::Discard => "discard",
            JumpKind::Break => "break",
            JumpKind::Continue => "continue",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementAst {
    Block(FnBodyAst),
    If {
        condition: AstNode<ExprAst>,
        then_branch: Box<AstNode<StatementAst>>,
        else_branch: Option<Box<AstNode<StatementAst>>>,
    },
    For {
        init: Option<Box<AstNode<StatementAst>>>,
        condition: Option<AstNode<ExprAst>>,
        update: Option<Box<AstNode<StatementAst>>>,
        body: Box<AstNode<StatementAst>>,
    },
    Return(Option<AstNode<ExprAst>>),
    Jump(JumpKind),
    Declaration(VariableDeclarationAst),
    Function(Box<FnAst>),
    /// `target op value;`, or `target++;` with no value.
    Assignment {
        target: AstNode<ExprAst>,
        op: AssignOp,
        value: Option<AstNode<ExprAst>>,
    },
    /// A bare expression, in practice a call.
    Expression(AstNode<ExprAst>),
}

// ===== Expressions =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Plus,
    Not,
}

impl UnaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
        }
    }
}

/// `.member` or `[index]` after a primary expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Accessor {
    Member(String),
    Index(AstNode<ExprAst>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprAst {
    Ternary {
        condition: Box<AstNode<ExprAst>>,
        then_expr: Box<AstNode<ExprAst>>,
        else_expr: Box<AstNode<ExprAst>>,
    },
    /// `operands[0] operators[0] operands[1] ...`; always one more operand
    /// than operators.
    Chain {
        operators: Vec<BinaryOp>,
        operands: Vec<AstNode<ExprAst>>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<AstNode<ExprAst>>,
    },
    /// Literal text as written, e.g. `1.0` or `2e-3`.
    Number(String),
    Bool(bool),
    Call {
        callee: String,
        args: Vec<AstNode<ExprAst>>,
        accessors: Vec<AstNode<Accessor>>,
    },
    Variable {
        root: String,
        accessors: Vec<AstNode<Accessor>>,
    },
    Paren {
        inner: Box<AstNode<ExprAst>>,
        accessors: Vec<AstNode<Accessor>>,
    },
}
