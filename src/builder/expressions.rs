//! Expressions: precedence levels collapse, operator chains flatten

use super::{malformed, Cursor};
use crate::parser::ast::*;
use crate::parser::cst::{CstKind, CstNode};
use crate::parser::lexer::TokenKind;
use crate::parser::parse::ParseError;

/// Build any expression-level node into its typed form.
pub(super) fn build_expression(node: &CstNode) -> Result<AstNode<ExprAst>, ParseError> {
    match node.kind {
        CstKind::Ternary => build_ternary(node),
        CstKind::Relational | CstKind::Additive | CstKind::Multiplicative => build_chain(node),
        CstKind::Atomic => build_atomic(node),
        CstKind::Paren => build_paren(node),
        CstKind::Call => build_call(node),
        CstKind::Variable => build_variable(node),
        CstKind::Number => {
            let mut cursor = Cursor::new(node);
            let text = match &cursor.token()?.kind {
                TokenKind::IntLiteral(text) | TokenKind::FloatLiteral(text) => text.clone(),
                _ => return Err(cursor.error("expected number literal")),
            };
            cursor.finish()?;
            Ok(AstNode::new(ExprAst::Number(text), node.span))
        }
        CstKind::Bool => {
            let mut cursor = Cursor::new(node);
            let value = match cursor.token()?.kind {
                TokenKind::True => true,
                TokenKind::False => false,
                _ => return Err(cursor.error("expected boolean literal")),
            };
            cursor.finish()?;
            Ok(AstNode::new(ExprAst::Bool(value), node.span))
        }
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
        | CstKind::VariableDecl
        | CstKind::Declarator
        | CstKind::Type
        | CstKind::ArraySpecifier
        | CstKind::Fn
        | CstKind::FnArg
        | CstKind::FnBody
        | CstKind::Directive
        | CstKind::Condition
        | CstKind::ElifBranch
        | CstKind::ElseBranch
        | CstKind::Block
        | CstKind::If
        | CstKind::For
        | CstKind::Return
        | CstKind::Jump
        | CstKind::Assignment
        | CstKind::ExpressionStatement
        | CstKind::MemberAccess
        | CstKind::IndexAccess => Err(malformed(node, "not an expression")),
    }
}

fn next_expression(cursor: &mut Cursor<'_>) -> Result<AstNode<ExprAst>, ParseError> {
    let node = cursor.any_node().ok_or_else(|| cursor.error("expected operand"))?;
    build_expression(node)
}

fn build_ternary(node: &CstNode) -> Result<AstNode<ExprAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    let condition = next_expression(&mut cursor)?;
    if cursor.token_if(&TokenKind::Question).is_none() {
        cursor.finish()?;
        return Ok(condition);
    }
    let then_expr = next_expression(&mut cursor)?;
    cursor
        .token_if(&TokenKind::Colon)
        .ok_or_else(|| cursor.error("expected ':'"))?;
    let else_expr = next_expression(&mut cursor)?;
    cursor.finish()?;
    Ok(AstNode::new(
        ExprAst::Ternary {
            condition: Box::new(condition),
            then_expr: Box::new(then_expr),
            else_expr: Box::new(else_expr),
        },
        node.span,
    ))
}

fn binary_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Lt => Some(BinaryOp::Lt),
        TokenKind::Gt => Some(BinaryOp::Gt),
        TokenKind::Le => Some(BinaryOp::Le),
        TokenKind::Ge => Some(BinaryOp::Ge),
        TokenKind::EqEq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::Ne),
        TokenKind::AndAnd => Some(BinaryOp::And),
        TokenKind::OrOr => Some(BinaryOp::Or),
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Mod),
        _ => None,
    }
}

/// `operand (op operand)*` → [`ExprAst::Chain`], or the lone operand.
fn build_chain(node: &CstNode) -> Result<AstNode<ExprAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    let mut operands = vec![next_expression(&mut cursor)?];
    let mut operators = Vec::new();
    while !cursor.is_done() {
        let op = binary_op(&cursor.token()?.kind).ok_or_else(|| cursor.error("expected operator"))?;
        operators.push(op);
        operands.push(next_expression(&mut cursor)?);
    }
    if operators.is_empty() {
        return operands.pop().ok_or_else(|| cursor.error("expected operand"));
    }
    Ok(AstNode::new(ExprAst::Chain { operators, operands }, node.span))
}

fn build_atomic(node: &CstNode) -> Result<AstNode<ExprAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    let sign =
        cursor.token_where(|k| matches!(k, TokenKind::Minus | TokenKind::Plus | TokenKind::Bang));
    let op = match sign {
        Some(token) => match token.kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            _ => Some(UnaryOp::Not),
        },
        None => None,
    };
    let operand = next_expression(&mut cursor)?;
    cursor.finish()?;
    match op {
        Some(op) => Ok(AstNode::new(
            ExprAst::Unary {
                op,
                operand: Box::new(operand),
            },
            node.span,
        )),
        None => Ok(operand),
    }
}

fn build_accessors(cursor: &mut Cursor<'_>) -> Result<Vec<AstNode<Accessor>>, ParseError> {
    let mut accessors = Vec::new();
    while let Some(node) = cursor.any_node() {
        let mut inner = Cursor::new(node);
        let accessor = match node.kind {
            CstKind::MemberAccess => {
                inner.token()?;
                Accessor::Member(inner.ident()?)
            }
            CstKind::IndexAccess => {
                inner.token()?;
                let index = build_expression(inner.node(CstKind::Ternary)?)?;
                inner.token()?;
                Accessor::Index(index)
            }
            _ => return Err(malformed(node, "expected accessor")),
        };
        inner.finish()?;
        accessors.push(AstNode::new(accessor, node.span));
    }
    cursor.finish()?;
    Ok(accessors)
}

fn build_paren(node: &CstNode) -> Result<AstNode<ExprAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    cursor
        .token_if(&TokenKind::LParen)
        .ok_or_else(|| cursor.error("expected '('"))?;
    let inner = build_expression(cursor.node(CstKind::Ternary)?)?;
    cursor
        .token_if(&TokenKind::RParen)
        .ok_or_else(|| cursor.error("expected ')'"))?;
    let accessors = build_accessors(&mut cursor)?;
    Ok(AstNode::new(
        ExprAst::Paren {
            inner: Box::new(inner),
            accessors,
        },
        node.span,
    ))
}

fn build_call(node: &CstNode) -> Result<AstNode<ExprAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    let callee = match &cursor.token()?.kind {
        TokenKind::Ident(name) => name.clone(),
        TokenKind::BuiltinType(name) => name.to_string(),
        _ => return Err(cursor.error("expected callee")),
    };
    cursor
        .token_if(&TokenKind::LParen)
        .ok_or_else(|| cursor.error("expected '('"))?;
    let mut args = Vec::new();
    while let Some(arg) = cursor.node_if(CstKind::Ternary) {
        args.push(build_expression(arg)?);
        if cursor.token_if(&TokenKind::Comma).is_none() {
            break;
        }
    }
    cursor
        .token_if(&TokenKind::RParen)
        .ok_or_else(|| cursor.error("expected ')'"))?;
    let accessors = build_accessors(&mut cursor)?;
    Ok(AstNode::new(
        ExprAst::Call {
            callee,
            args,
            accessors,
        },
        node.span,
    ))
}

fn build_variable(node: &CstNode) -> Result<AstNode<ExprAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    let root = cursor.ident()?;
    let accessors = build_accessors(&mut cursor)?;
    Ok(AstNode::new(ExprAst::Variable { root, accessors }, node.span))
}

#[cfg(test)]
mod tests {
    use super::build_expression;
    use crate::parser::ast::*;
    use crate::parser::parse::Parser;

    fn expr(source: &str) -> ExprAst {
        let mut parser = Parser::new(source).unwrap();
        let cst = parser.parse_expression().unwrap();
        build_expression(&cst).unwrap().content
    }

    fn var(name: &str) -> ExprAst {
        ExprAst::Variable {
            root: name.into(),
            accessors: Vec::new(),
        }
    }

    fn operand_contents(operands: &[AstNode<ExprAst>]) -> Vec<ExprAst> {
        operands.iter().map(|o| o.content.clone()).collect()
    }

    #[test]
    fn test_single_operand_levels_collapse() {
        assert_eq!(expr("x"), var("x"));
        assert_eq!(expr("2.0"), ExprAst::Number("2.0".into()));
        assert_eq!(expr("true"), ExprAst::Bool(true));
    }

    #[test]
    fn test_chain_is_flattened() {
        match expr("a + b - c") {
            ExprAst::Chain { operators, operands } => {
                assert_eq!(operators, vec![BinaryOp::Add, BinaryOp::Sub]);
                assert_eq!(operand_contents(&operands), vec![var("a"), var("b"), var("c")]);
            }
            other => panic!("expected chain, got {other:?}"),
        }
    }

    #[test]
    fn test_nested_precedence() {
        match expr("a < b * c") {
            ExprAst::Chain { operators, operands } => {
                assert_eq!(operators, vec![BinaryOp::Lt]);
                assert!(matches!(
                    &operands[1].content,
                    ExprAst::Chain { operators, .. } if operators == &vec![BinaryOp::Mul]
                ));
            }
            other => panic!("expected chain, got {other:?}"),
        }
    }

    #[test]
    fn test_unary_and_ternary() {
        match expr("!ok ? -x : x") {
            ExprAst::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                assert!(matches!(condition.content, ExprAst::Unary { op: UnaryOp::Not, .. }));
                assert!(matches!(then_expr.content, ExprAst::Unary { op: UnaryOp::Neg, .. }));
                assert_eq!(else_expr.content, var("x"));
            }
            other => panic!("expected ternary, got {other:?}"),
        }
    }

    #[test]
    fn test_call_and_accessors() {
        match expr("texture2D(tex, uv).rgb") {
            ExprAst::Call {
                callee,
                args,
                accessors,
            } => {
                assert_eq!(callee, "texture2D");
                assert_eq!(operand_contents(&args), vec![var("tex"), var("uv")]);
                assert_eq!(accessors[0].content, Accessor::Member("rgb".into()));
            }
            other => panic!("expected call, got {other:?}"),
        }
        match expr("lights[0].color") {
            ExprAst::Variable { root, accessors } => {
                assert_eq!(root, "lights");
                assert_eq!(accessors.len(), 2);
                assert!(matches!(&accessors[0].content, Accessor::Index(_)));
            }
            other => panic!("expected variable, got {other:?}"),
        }
    }

    #[test]
    fn test_paren_span_encloses_inner() {
        let mut parser = Parser::new("(a + b).x").unwrap();
        let cst = parser.parse_expression().unwrap();
        let built = build_expression(&cst).unwrap();
        match &built.content {
            ExprAst::Paren { inner, accessors } => {
                assert!(built.span.contains(&inner.span));
                assert_eq!(accessors.len(), 1);
            }
            other => panic!("expected paren, got {other:?}"),
        }
    }
}
