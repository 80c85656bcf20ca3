//! Statement parsing implementation
//!
//! Function bodies, statements, and the macro conditionals that may appear both
//! at declaration level and inside function bodies.
//!
//! # Grammar
//!
//! ```text
//! fn_body    ::= "{" body_item* "}"
//! body_item  ::= directive | condition<body_item> | statement
//! statement  ::= block | if | for | return | jump | var_decl | function
//!              | assignment | expr ";"
//! assignment ::= expr assign_op expr ";" | expr ("++"|"--") ";" | ("++"|"--") expr ";"
//! for        ::= "for" "(" (var_decl | assignment | expr ";" | ";") expr? ";" update? ")"
//!                statement
//! condition<X> ::= (#if|#ifdef|#ifndef) X* (#elif X*)* (#else X*)? #endif
//! ```

use crate::parser::ast::SourceLocation;
use crate::parser::cst::{CstChild, CstKind, CstNode};
use crate::parser::declarations::DeclShape;
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};

/// Parses one item of a conditional body.
pub(crate) type ItemParser = fn(&mut Parser) -> Result<CstNode, ParseError>;

fn is_assign_op(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
    )
}

impl Parser {
    /// `{ body_item* }`
    pub(crate) fn parse_fn_body(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![self.expect_lbrace("to open function body")?.into()];
        self.parse_items_until_rbrace(&mut children, "function body", |p| p.parse_body_item())?;
        Ok(CstNode::new(CstKind::FnBody, children))
    }

    pub(crate) fn parse_body_item(&mut self) -> Result<CstNode, ParseError> {
        match self.peek_kind() {
            TokenKind::MacroDefine(_) | TokenKind::MacroUndef(_) => {
                Ok(self.leaf(CstKind::Directive))
            }
            TokenKind::MacroIf(_) | TokenKind::MacroIfdef(_) | TokenKind::MacroIfndef(_) => {
                self.parse_condition(|p| p.parse_body_item())
            }
            _ => self.parse_statement(),
        }
    }

    pub(crate) fn parse_statement(&mut self) -> Result<CstNode, ParseError> {
        match self.peek_kind() {
            TokenKind::LBrace => {
                let mut children: Vec<CstChild> = vec![self.advance().into()];
                self.parse_items_until_rbrace(&mut children, "block", |p| p.parse_body_item())?;
                Ok(CstNode::new(CstKind::Block, children))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => {
                let mut children: Vec<CstChild> = vec![self.advance().into()];
                if !self.check(&TokenKind::Semicolon) {
                    children.push(self.parse_expression()?.into());
                }
                children.push(self.expect_semicolon("after return")?.into());
                Ok(CstNode::new(CstKind::Return, children))
            }
            TokenKind::Discard | TokenKind::Break | TokenKind::Continue => {
                let children: Vec<CstChild> = vec![
                    self.advance().into(),
                    self.expect_semicolon("after jump statement")?.into(),
                ];
                Ok(CstNode::new(CstKind::Jump, children))
            }
            TokenKind::MacroElif(_) | TokenKind::MacroElse | TokenKind::MacroEndif => {
                Err(self.error_here(format!("{} without matching '#if'", self.peek())))
            }
            _ => match self.declaration_shape() {
                Some(DeclShape::Function) => self.parse_function(),
                Some(DeclShape::Variable) => self.parse_variable_decl(),
                None => self.parse_simple_statement(true),
            },
        }
    }

    /// `if ( expr ) statement (else statement)?`
    fn parse_if(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![
            self.advance().into(),
            self.expect_lparen("after 'if'")?.into(),
            self.parse_expression()?.into(),
            self.expect_rparen("after if condition")?.into(),
            self.parse_statement()?.into(),
        ];
        if self.check(&TokenKind::Else) {
            children.push(self.advance().into());
            children.push(self.parse_statement()?.into());
        }
        Ok(CstNode::new(CstKind::If, children))
    }

    fn parse_for(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![
            self.advance().into(),
            self.expect_lparen("after 'for'")?.into(),
        ];

        // Init consumes its own ';'
        if self.check(&TokenKind::Semicolon) {
            children.push(self.advance().into());
        } else if self.declaration_shape() == Some(DeclShape::Variable) {
            children.push(self.parse_variable_decl()?.into());
        } else {
            children.push(self.parse_simple_statement(true)?.into());
        }

        if !self.check(&TokenKind::Semicolon) {
            children.push(self.parse_expression()?.into());
        }
        children.push(self.expect_semicolon("after loop condition")?.into());

        if !self.check(&TokenKind::RParen) {
            children.push(self.parse_simple_statement(false)?.into());
        }
        children.push(self.expect_rparen("after loop header")?.into());
        children.push(self.parse_statement()?.into());
        Ok(CstNode::new(CstKind::For, children))
    }

    /// Assignment, increment or bare expression. The trailing `;` is only
    /// consumed when `terminated` (a `for` update has none).
    fn parse_simple_statement(&mut self, terminated: bool) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = Vec::new();
        let kind = if matches!(self.peek_kind(), TokenKind::PlusPlus | TokenKind::MinusMinus) {
            children.push(self.advance().into());
            children.push(self.parse_expression()?.into());
            CstKind::Assignment
        } else {
            children.push(self.parse_expression()?.into());
            if is_assign_op(self.peek_kind()) {
                children.push(self.advance().into());
                children.push(self.parse_expression()?.into());
                CstKind::Assignment
            } else if matches!(self.peek_kind(), TokenKind::PlusPlus | TokenKind::MinusMinus) {
                children.push(self.advance().into());
                CstKind::Assignment
            } else {
                CstKind::ExpressionStatement
            }
        };
        if terminated {
            children.push(self.expect_semicolon("after statement")?.into());
        }
        Ok(CstNode::new(kind, children))
    }

    /// Macro conditional whose branches hold items parsed by `item`.
    ///
    /// Children: the opening directive token, the items of the first branch,
    /// one `ElifBranch` per `#elif`, an optional `ElseBranch`, then `#endif`.
    pub(crate) fn parse_condition(&mut self, item: ItemParser) -> Result<CstNode, ParseError> {
        let open = self.advance();
        let open_location = open.location();
        let mut children: Vec<CstChild> = vec![open.into()];
        self.parse_branch_items(&mut children, item, open_location)?;

        let mut seen_else = false;
        loop {
            match self.peek_kind() {
                TokenKind::MacroEndif => {
                    children.push(self.advance().into());
                    return Ok(CstNode::new(CstKind::Condition, children));
                }
                TokenKind::MacroElif(_) if !seen_else => {
                    let mut branch: Vec<CstChild> = vec![self.advance().into()];
                    self.parse_branch_items(&mut branch, item, open_location)?;
                    children.push(CstNode::new(CstKind::ElifBranch, branch).into());
                }
                TokenKind::MacroElse if !seen_else => {
                    seen_else = true;
                    let mut branch: Vec<CstChild> = vec![self.advance().into()];
                    self.parse_branch_items(&mut branch, item, open_location)?;
                    children.push(CstNode::new(CstKind::ElseBranch, branch).into());
                }
                _ => {
                    return Err(self.error_here(format!(
                        "Expected '#endif' after '#else', found {}",
                        self.peek()
                    )))
                }
            }
        }
    }

    fn parse_branch_items(
        &mut self,
        children: &mut Vec<CstChild>,
        item: ItemParser,
        open_location: SourceLocation,
    ) -> Result<(), ParseError> {
        loop {
            match self.peek_kind() {
                TokenKind::MacroElif(_) | TokenKind::MacroElse | TokenKind::MacroEndif => {
                    return Ok(())
                }
                TokenKind::RBrace | TokenKind::Eof => {
                    return Err(ParseError {
                        message: format!(
                            "Unterminated macro conditional opened at {}, found {}",
                            open_location,
                            self.peek()
                        ),
                        location: self.current_location(),
                    })
                }
                _ => children.push(item(self)?.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::cst::{CstKind, CstNode};
    use crate::parser::parse::parse_cst;

    fn body(statements: &str) -> CstNode {
        let source = format!(r#"Shader "S" {{ void f() {{ {statements} }} }}"#);
        let cst = parse_cst(&source).unwrap();
        let function = cst.nodes_of(CstKind::Fn).next().unwrap().clone();
        let fn_body = function.nodes_of(CstKind::FnBody).next().unwrap().clone();
        fn_body
    }

    fn kinds(node: &CstNode) -> Vec<CstKind> {
        node.children
            .iter()
            .filter_map(|c| match c {
                crate::parser::cst::CstChild::Node(n) => Some(n.kind),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_statement_kinds() {
        let body =
            body("float x = 1.0; x += 2.0; x++; ++x; f(); if (x > 1.0) { discard; } else return; ");
        assert_eq!(
            kinds(&body),
            vec![
                CstKind::VariableDecl,
                CstKind::Assignment,
                CstKind::Assignment,
                CstKind::Assignment,
                CstKind::ExpressionStatement,
                CstKind::If,
            ]
        );
    }

    #[test]
    fn test_for_loop_header() {
        let body = body("for (int i = 0; i < 4; i++) { break; }");
        let for_node = body.nodes_of(CstKind::For).next().unwrap();
        assert_eq!(
            kinds(for_node),
            vec![CstKind::VariableDecl, CstKind::Ternary, CstKind::Assignment, CstKind::Block]
        );
    }

    #[test]
    fn test_empty_for_header() {
        let body = body("for (;;) continue;");
        let for_node = body.nodes_of(CstKind::For).next().unwrap();
        assert_eq!(kinds(for_node), vec![CstKind::Jump]);
    }

    #[test]
    fn test_condition_in_body() {
        let body = body(
            "#if QUALITY > 1\n x = 1.0;\n #elif QUALITY > 0\n x = 0.5;\n #else\n x = 0.0;\n #endif\n",
        );
        let cond = body.nodes_of(CstKind::Condition).next().unwrap();
        assert_eq!(cond.nodes_of(CstKind::Assignment).count(), 1);
        assert_eq!(cond.nodes_of(CstKind::ElifBranch).count(), 1);
        assert_eq!(cond.nodes_of(CstKind::ElseBranch).count(), 1);
    }

    #[test]
    fn test_unterminated_condition_is_fatal() {
        let err = parse_cst("Shader \"S\" { void f() {\n#ifdef A\n x = 1.0;\n } }").unwrap_err();
        assert!(err.message.contains("Unterminated macro conditional"), "{}", err);
    }

    #[test]
    fn test_stray_endif_is_fatal() {
        let err = parse_cst("Shader \"S\" { void f() {\n#endif\n } }").unwrap_err();
        assert!(err.message.contains("without matching '#if'"));
    }

    #[test]
    fn test_missing_semicolon() {
        let err = parse_cst("Shader \"S\" { void f() { x = 1.0 } }").unwrap_err();
        assert!(err.message.contains("Expected ';' after statement"));
    }
}
