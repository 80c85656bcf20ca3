//! Expression parsing implementation
//!
//! Every expression is rooted at a `Ternary` node and always nests the full
//! precedence chain, even when a level holds a single operand:
//!
//! ```text
//! ternary        ::= relational ("?" ternary ":" ternary)?
//! relational     ::= additive (("<"|">"|"<="|">="|"=="|"!="|"&&"|"||") additive)*
//! additive       ::= multiplicative (("+"|"-") multiplicative)*
//! multiplicative ::= atomic (("*"|"/"|"%") atomic)*
//! atomic         ::= ("+"|"-"|"!") atomic | primary
//! primary        ::= "(" ternary ")" accessor* | number | bool
//!                  | (ident|type) "(" args? ")" accessor* | ident accessor*
//! accessor       ::= "." ident | "[" ternary "]"
//! ```
//!
//! Logical and comparison operators share one level; the serializer re-emits
//! them in source order so the target compiler applies its own precedence.

use crate::parser::cst::{CstChild, CstKind, CstNode};
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

impl Parser {
    /// Parse an expression (entry point)
    pub(crate) fn parse_expression(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![self.parse_relational()?.into()];
        if self.check(&TokenKind::Question) {
            children.push(self.advance().into());
            children.push(self.parse_expression()?.into());
            children.push(
                self.expect(&TokenKind::Colon, "Expected ':' in conditional expression")?
                    .into(),
            );
            children.push(self.parse_expression()?.into());
        }
        Ok(CstNode::new(CstKind::Ternary, children))
    }

    fn parse_relational(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![self.parse_additive()?.into()];
        while matches!(
            self.peek_kind(),
            TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::Le
                | TokenKind::Ge
                | TokenKind::EqEq
                | TokenKind::NotEq
                | TokenKind::AndAnd
                | TokenKind::OrOr
        ) {
            children.push(self.advance().into());
            children.push(self.parse_additive()?.into());
        }
        Ok(CstNode::new(CstKind::Relational, children))
    }

    fn parse_additive(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![self.parse_multiplicative()?.into()];
        while matches!(self.peek_kind(), TokenKind::Plus | TokenKind::Minus) {
            children.push(self.advance().into());
            children.push(self.parse_multiplicative()?.into());
        }
        Ok(CstNode::new(CstKind::Additive, children))
    }

    fn parse_multiplicative(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![self.parse_atomic()?.into()];
        while matches!(self.peek_kind(), TokenKind::Star | TokenKind::Slash | TokenKind::Percent) {
            children.push(self.advance().into());
            children.push(self.parse_atomic()?.into());
        }
        Ok(CstNode::new(CstKind::Multiplicative, children))
    }

    fn parse_atomic(&mut self) -> Result<CstNode, ParseError> {
        let children: Vec<CstChild> = match self.peek_kind() {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Bang => {
                vec![self.advance().into(), self.parse_atomic()?.into()]
            }
            _ => vec![self.parse_primary()?.into()],
        };
        Ok(CstNode::new(CstKind::Atomic, children))
    }

    fn parse_primary(&mut self) -> Result<CstNode, ParseError> {
        match self.peek_kind() {
            TokenKind::LParen => {
                let mut children: Vec<CstChild> = vec![
                    self.advance().into(),
                    self.parse_expression()?.into(),
                    self.expect_rparen("after expression")?.into(),
                ];
                self.parse_accessors(&mut children)?;
                Ok(CstNode::new(CstKind::Paren, children))
            }
            TokenKind::IntLiteral(_) | TokenKind::FloatLiteral(_) => Ok(self.leaf(CstKind::Number)),
            TokenKind::True | TokenKind::False => Ok(self.leaf(CstKind::Bool)),
            TokenKind::Ident(_) | TokenKind::BuiltinType(_)
                if self.check_ahead(1, &TokenKind::LParen) =>
            {
                self.parse_call()
            }
            TokenKind::Ident(_) => {
                let mut children: Vec<CstChild> = vec![self.advance().into()];
                self.parse_accessors(&mut children)?;
                Ok(CstNode::new(CstKind::Variable, children))
            }
            _ => Err(self.error_here(format!("Expected expression, found {}", self.peek()))),
        }
    }

    /// Call or constructor: `name ( args ) accessor*`
    fn parse_call(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![self.advance().into(), self.advance().into()];
        if !self.check(&TokenKind::RParen) {
            loop {
                children.push(self.parse_expression()?.into());
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                children.push(self.advance().into());
            }
        }
        children.push(self.expect_rparen("after arguments")?.into());
        self.parse_accessors(&mut children)?;
        Ok(CstNode::new(CstKind::Call, children))
    }

    fn parse_accessors(&mut self, children: &mut Vec<CstChild>) -> Result<(), ParseError> {
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    let access: Vec<CstChild> = vec![
                        self.advance().into(),
                        self.expect_identifier("after '.'")?.into(),
                    ];
                    children.push(CstNode::new(CstKind::MemberAccess, access).into());
                }
                TokenKind::LBracket => {
                    let access: Vec<CstChild> = vec![
                        self.advance().into(),
                        self.parse_expression()?.into(),
                        self.expect(&TokenKind::RBracket, "Expected ']' after index")?.into(),
                    ];
                    children.push(CstNode::new(CstKind::IndexAccess, access).into());
                }
                _ => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::cst::{CstChild, CstKind, CstNode};
    use crate::parser::parse::Parser;

    fn expr(source: &str) -> CstNode {
        let mut parser = Parser::new(source).unwrap();
        let node = parser.parse_expression().unwrap();
        assert!(parser.is_at_end(), "trailing tokens in {source}");
        node
    }

    fn only_node(node: &CstNode) -> &CstNode {
        match node.children.as_slice() {
            [CstChild::Node(child)] => child,
            other => panic!("expected single child, found {}", other.len()),
        }
    }

    #[test]
    fn test_full_precedence_chain_for_literal() {
        let ternary = expr("1.0");
        let relational = only_node(&ternary);
        let additive = only_node(relational);
        let multiplicative = only_node(additive);
        let atomic = only_node(multiplicative);
        let number = only_node(atomic);
        assert_eq!(relational.kind, CstKind::Relational);
        assert_eq!(additive.kind, CstKind::Additive);
        assert_eq!(multiplicative.kind, CstKind::Multiplicative);
        assert_eq!(atomic.kind, CstKind::Atomic);
        assert_eq!(number.kind, CstKind::Number);
    }

    #[test]
    fn test_binary_levels() {
        let ternary = expr("a + b * c < d");
        let relational = only_node(&ternary);
        assert_eq!(relational.nodes_of(CstKind::Additive).count(), 2);
        let additive = relational.nodes_of(CstKind::Additive).next().unwrap();
        assert_eq!(additive.nodes_of(CstKind::Multiplicative).count(), 2);
    }

    #[test]
    fn test_ternary() {
        let ternary = expr("x > 0.5 ? a : b");
        assert_eq!(ternary.children.len(), 5);
    }

    #[test]
    fn test_call_with_accessors() {
        let ternary = expr("texture2D(u_tex, v_uv).rgb");
        let call = only_node(only_node(only_node(only_node(only_node(&ternary)))));
        assert_eq!(call.kind, CstKind::Call);
        assert_eq!(call.nodes_of(CstKind::Ternary).count(), 2);
        assert_eq!(call.nodes_of(CstKind::MemberAccess).count(), 1);
    }

    #[test]
    fn test_constructor_call() {
        let ternary = expr("vec4(pos, 1.0)");
        let call = only_node(only_node(only_node(only_node(only_node(&ternary)))));
        assert_eq!(call.kind, CstKind::Call);
    }

    #[test]
    fn test_variable_with_index_and_member() {
        let ternary = expr("lights[i + 1].color");
        let variable = only_node(only_node(only_node(only_node(only_node(&ternary)))));
        assert_eq!(variable.kind, CstKind::Variable);
        assert_eq!(variable.nodes_of(CstKind::IndexAccess).count(), 1);
        assert_eq!(variable.nodes_of(CstKind::MemberAccess).count(), 1);
    }

    #[test]
    fn test_unary_nesting() {
        let ternary = expr("-!x");
        let atomic = only_node(only_node(only_node(only_node(&ternary))));
        assert_eq!(atomic.children.len(), 2);
        assert_eq!(atomic.nodes_of(CstKind::Atomic).count(), 1);
    }

    #[test]
    fn test_missing_operand() {
        let mut parser = Parser::new("a + ;").unwrap();
        let err = parser.parse_expression().unwrap_err();
        assert!(err.message.contains("Expected expression"));
    }
}
