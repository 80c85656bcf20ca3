//! Function bodies and statements

use super::declarations::{build_condition, build_directive, build_function, build_variable_decl};
use super::expressions::build_expression;
use super::{malformed, Cursor};
use crate::parser::ast::*;
use crate::parser::cst::{CstChild, CstKind, CstNode};
use crate::parser::lexer::TokenKind;
use crate::parser::parse::ParseError;

pub(super) fn build_fn_body(node: &CstNode) -> Result<AstNode<FnBodyAst>, ParseError> {
    Ok(AstNode::new(build_braced_items(node)?, node.span))
}

/// `{ item* }` as used by function bodies and nested blocks.
fn build_braced_items(node: &CstNode) -> Result<FnBodyAst, ParseError> {
    let mut cursor = Cursor::new(node);
    cursor
        .token_if(&TokenKind::LBrace)
        .ok_or_else(|| cursor.error("expected '{'"))?;
    let mut items = Vec::new();
    while let Some(child) = cursor.any_node() {
        items.push(build_body_item(child)?);
    }
    cursor
        .token_if(&TokenKind::RBrace)
        .ok_or_else(|| cursor.error("expected '}'"))?;
    cursor.finish()?;
    Ok(FnBodyAst { items })
}

fn build_body_item(node: &CstNode) -> Result<AstNode<FnBodyItem>, ParseError> {
    let item = match node.kind {
        CstKind::Directive => FnBodyItem::Directive(build_directive(node)?),
        CstKind::Condition => FnBodyItem::Condition(build_condition(node, build_body_item)?),
        CstKind::Block
        | CstKind::If
        | CstKind::For
        | CstKind::Return
        | CstKind::Jump
        | CstKind::VariableDecl
        | CstKind::Fn
        | CstKind::Assignment
        | CstKind::ExpressionStatement => FnBodyItem::Statement(build_statement(node)?.content),
        CstKind::Shader
        | CstKind::SubShader
        | CstKind::Pass
        | CstKind::UsePass
        | CstKind::Tags
        | CstKind::Tag
        | CstKind::EditorProperties
        | CstKind::EditorProperty
        | CstKind::EntryAssign
        | CstKind::RenderStateAssign
        | CstKind::RenderQueueAssign
        | CstKind::RenderStateDecl
        | CstKind::RenderStateProperty
        | CstKind::Struct
        | CstKind::StructField
        | CstKind::Declarator
        | CstKind::Type
        | CstKind::ArraySpecifier
        | CstKind::FnArg
        | CstKind::FnBody
        | CstKind::ElifBranch
        | CstKind::ElseBranch
        | CstKind::Ternary
        | CstKind::Relational
        | CstKind::Additive
        | CstKind::Multiplicative
        | CstKind::Atomic
        | CstKind::Paren
        | CstKind::Call
        | CstKind::Variable
        | CstKind::MemberAccess
        | CstKind::IndexAccess
        | CstKind::Number
        | CstKind::Bool => return Err(malformed(node, "not a function body item")),
    };
    Ok(AstNode::new(item, node.span))
}

fn build_statement(node: &CstNode) -> Result<AstNode<StatementAst>, ParseError> {
    let statement = match node.kind {
        CstKind::Block => StatementAst::Block(build_braced_items(node)?),
        CstKind::If => build_if(node)?,
        CstKind::For => build_for(node)?,
        CstKind::Return => {
            let mut cursor = Cursor::new(node);
            cursor.token()?;
            let value = match cursor.node_if(CstKind::Ternary) {
                Some(expr) => Some(build_expression(expr)?),
                None => None,
            };
            cursor
                .token_if(&TokenKind::Semicolon)
                .ok_or_else(|| cursor.error("expected ';'"))?;
            cursor.finish()?;
            StatementAst::Return(value)
        }
        CstKind::Jump => {
            let mut cursor = Cursor::new(node);
            let kind = match cursor.token()?.kind {
                TokenKind::Discard => JumpKind::Discard,
                TokenKind::Break => JumpKind::Break,
                TokenKind::Continue => JumpKind::Continue,
                _ => return Err(cursor.error("expected jump keyword")),
            };
            cursor
                .token_if(&TokenKind::Semicolon)
                .ok_or_else(|| cursor.error("expected ';'"))?;
            cursor.finish()?;
            StatementAst::Jump(kind)
        }
        CstKind::VariableDecl => StatementAst::Declaration(build_variable_decl(node)?),
        CstKind::Fn => StatementAst::Function(Box::new(build_function(node)?)),
        CstKind::Assignment => build_assignment(node)?,
        CstKind::ExpressionStatement => {
            let mut cursor = Cursor::new(node);
            let expr = build_expression(cursor.node(CstKind::Ternary)?)?;
            cursor.token_if(&TokenKind::Semicolon);
            cursor.finish()?;
            StatementAst::Expression(expr)
        }
        _ => return Err(malformed(node, "not a statement")),
    };
    Ok(AstNode::new(statement, node.span))
}

/// Statement position may hold a macro-free item only.
fn build_nested_statement(node: &CstNode) -> Result<Box<AstNode<StatementAst>>, ParseError> {
    Ok(Box::new(build_statement(node)?))
}

fn build_if(node: &CstNode) -> Result<StatementAst, ParseError> {
    let mut cursor = Cursor::new(node);
    cursor.token()?;
    cursor
        .token_if(&TokenKind::LParen)
        .ok_or_else(|| cursor.error("expected '('"))?;
    let condition = build_expression(cursor.node(CstKind::Ternary)?)?;
    cursor
        .token_if(&TokenKind::RParen)
        .ok_or_else(|| cursor.error("expected ')'"))?;
    let then_node = cursor.any_node().ok_or_else(|| cursor.error("expected statement"))?;
    let then_branch = build_nested_statement(then_node)?;
    let else_branch = if cursor.token_if(&TokenKind::Else).is_some() {
        let else_node = cursor.any_node().ok_or_else(|| cursor.error("expected statement"))?;
        Some(build_nested_statement(else_node)?)
    } else {
        None
    };
    cursor.finish()?;
    Ok(StatementAst::If {
        condition,
        then_branch,
        else_branch,
    })
}

fn build_for(node: &CstNode) -> Result<StatementAst, ParseError> {
    let mut cursor = Cursor::new(node);
    cursor.token()?;
    cursor
        .token_if(&TokenKind::LParen)
        .ok_or_else(|| cursor.error("expected '('"))?;

    // Init: a node carrying its own ';', or a bare ';'
    let init = match cursor.next() {
        Some(CstChild::Node(init)) => Some(build_nested_statement(init)?),
        Some(CstChild::Token(token)) if token.kind == TokenKind::Semicolon => None,
        _ => return Err(cursor.error("expected loop initializer")),
    };
    let condition = match cursor.node_if(CstKind::Ternary) {
        Some(expr) => Some(build_expression(expr)?),
        None => None,
    };
    cursor
        .token_if(&TokenKind::Semicolon)
        .ok_or_else(|| cursor.error("expected ';'"))?;
    let update = match cursor.any_node() {
        Some(update) => Some(build_nested_statement(update)?),
        None => None,
    };
    cursor
        .token_if(&TokenKind::RParen)
        .ok_or_else(|| cursor.error("expected ')'"))?;
    let body_node = cursor.any_node().ok_or_else(|| cursor.error("expected loop body"))?;
    let body = build_nested_statement(body_node)?;
    cursor.finish()?;
    Ok(StatementAst::For {
        init,
        condition,
        update,
        body,
    })
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    match kind {
        TokenKind::Eq => Some(AssignOp::Assign),
        TokenKind::PlusEq => Some(AssignOp::AddAssign),
        TokenKind::MinusEq => Some(AssignOp::SubAssign),
        TokenKind::StarEq => Some(AssignOp::MulAssign),
        TokenKind::SlashEq => Some(AssignOp::DivAssign),
        TokenKind::PlusPlus => Some(AssignOp::Increment),
        TokenKind::MinusMinus => Some(AssignOp::Decrement),
        _ => None,
    }
}

fn build_assignment(node: &CstNode) -> Result<StatementAst, ParseError> {
    let mut cursor = Cursor::new(node);

    // Prefix `++x` / `--x`
    let prefix = cursor.token_where(|k| matches!(k, TokenKind::PlusPlus | TokenKind::MinusMinus));
    if let Some(token) = prefix {
        let op = if token.kind == TokenKind::PlusPlus {
            AssignOp::PreIncrement
        } else {
            AssignOp::PreDecrement
        };
        let target = build_expression(cursor.node(CstKind::Ternary)?)?;
        cursor.token_if(&TokenKind::Semicolon);
        cursor.finish()?;
        return Ok(StatementAst::Assignment {
            target,
            op,
            value: None,
        });
    }

    let target = build_expression(cursor.node(CstKind::Ternary)?)?;
    let op = assign_op(&cursor.token()?.kind)
        .ok_or_else(|| cursor.error("expected assignment operator"))?;
    let value = match cursor.node_if(CstKind::Ternary) {
        Some(expr) => Some(build_expression(expr)?),
        None => None,
    };
    if value.is_none() != matches!(op, AssignOp::Increment | AssignOp::Decrement) {
        return Err(cursor.error("assignment operand mismatch"));
    }
    cursor.token_if(&TokenKind::Semicolon);
    cursor.finish()?;
    Ok(StatementAst::Assignment { target, op, value })
}
