//! Declaration parsing implementation
//!
//! This module handles the document structure and every declaration form:
//!
//! - `Shader`, `SubShader`, `Pass`, `UsePass` blocks
//! - `Tags { ... }` and `EditorProperties { ... }`
//! - Pass property assignments: entry points, render-state references and the
//!   render queue
//! - Render-state declarations (`BlendState name? { Prop = value; }`), with the
//!   property/value-category table enforced here
//! - Struct, variable and function declarations
//!
//! # Grammar
//!
//! ```text
//! shader     ::= "Shader" string "{" shader_item* "}"
//! sub_shader ::= "SubShader" string "{" sub_item* "}"
//! pass       ::= "Pass" string "{" pass_item* "}"
//! struct     ::= "struct" ident "{" (precision? type ident array? ";")* "}" ";"?
//! var_decl   ::= "const"? precision? type declarator ("," declarator)* ";"
//! function   ::= precision? type ident "(" args? ")" fn_body
//! ```
//!
//! All parsing methods are implemented as `pub(crate)` methods on the [`Parser`] struct.

use crate::engine::EnumFamily;
use crate::parser::cst::{CstChild, CstKind, CstNode};
use crate::parser::lexer::TokenKind;
use crate::parser::parse::{ParseError, Parser};
use crate::render_state::{RenderStateKind, RenderStateProperty, ValueCategory};

/// Which block an item appears in; decides the accepted alternatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    Shader,
    SubShader,
    Pass,
}

impl Scope {
    fn name(self) -> &'static str {
        match self {
            Scope::Shader => "Shader",
            Scope::SubShader => "SubShader",
            Scope::Pass => "Pass",
        }
    }
}

/// Declaration shapes distinguished by lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclShape {
    Variable,
    Function,
}

impl Parser {
    pub(crate) fn parse_shader(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![
            self.expect(&TokenKind::Shader, "Expected 'Shader' at start of document")?.into(),
            self.expect_string("after 'Shader'")?.into(),
            self.expect_lbrace("after shader name")?.into(),
        ];
        self.parse_items_until_rbrace(&mut children, "Shader", |p| {
            p.parse_block_item(Scope::Shader)
        })?;
        Ok(CstNode::new(CstKind::Shader, children))
    }

    fn parse_sub_shader(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![
            self.advance().into(),
            self.expect_string("after 'SubShader'")?.into(),
            self.expect_lbrace("after subshader name")?.into(),
        ];
        self.parse_items_until_rbrace(&mut children, "SubShader", |p| {
            p.parse_block_item(Scope::SubShader)
        })?;
        Ok(CstNode::new(CstKind::SubShader, children))
    }

    fn parse_pass(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![
            self.advance().into(),
            self.expect_string("after 'Pass'")?.into(),
            self.expect_lbrace("after pass name")?.into(),
        ];
        self.parse_items_until_rbrace(&mut children, "Pass", |p| p.parse_block_item(Scope::Pass))?;
        Ok(CstNode::new(CstKind::Pass, children))
    }

    /// One item of a Shader, SubShader or Pass block
    pub(crate) fn parse_block_item(&mut self, scope: Scope) -> Result<CstNode, ParseError> {
        let kind = self.peek_kind().clone();
        match kind {
            TokenKind::SubShader if scope == Scope::Shader => self.parse_sub_shader(),
            TokenKind::EditorProperties if scope == Scope::Shader => self.parse_editor_properties(),
            TokenKind::Pass if scope == Scope::SubShader => self.parse_pass(),
            TokenKind::UsePass if scope == Scope::SubShader => {
                let children: Vec<CstChild> = vec![
                    self.advance().into(),
                    self.expect_string("after 'UsePass'")?.into(),
                ];
                Ok(CstNode::new(CstKind::UsePass, children))
            }
            TokenKind::Tags => self.parse_tags(),
            TokenKind::VertexShader | TokenKind::FragmentShader if scope == Scope::Pass => {
                self.parse_simple_assign(CstKind::EntryAssign, "entry function name")
            }
            TokenKind::RenderQueueType if scope == Scope::Pass => self.parse_render_queue_assign(),
            TokenKind::BlendState
            | TokenKind::DepthState
            | TokenKind::StencilState
            | TokenKind::RasterState => {
                if self.check_ahead(1, &TokenKind::Eq) {
                    if scope != Scope::Pass {
                        return Err(self.error_here(format!(
                            "Render state assignment is only allowed in a Pass, found one in a {}",
                            scope.name()
                        )));
                    }
                    self.parse_simple_assign(CstKind::RenderStateAssign, "render state name")
                } else {
                    self.parse_render_state_decl()
                }
            }
            _ if self.starts_declaration() => self.parse_declaration(),
            _ => Err(self.error_here(format!(
                "Unexpected {} in {} block",
                self.peek(),
                scope.name()
            ))),
        }
    }

    /// Whether the next tokens begin a struct, variable, function or global macro.
    fn starts_declaration(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Struct
                | TokenKind::MacroDefine(_)
                | TokenKind::MacroUndef(_)
                | TokenKind::MacroIf(_)
                | TokenKind::MacroIfdef(_)
                | TokenKind::MacroIfndef(_)
        ) || self.declaration_shape().is_some()
    }

    /// A declaration at Shader/SubShader/Pass level, or inside a conditional
    /// at that level.
    pub(crate) fn parse_declaration(&mut self) -> Result<CstNode, ParseError> {
        match self.peek_kind() {
            TokenKind::Struct => self.parse_struct(),
            TokenKind::MacroDefine(_) | TokenKind::MacroUndef(_) => {
                Ok(self.leaf(CstKind::Directive))
            }
            TokenKind::MacroIf(_) | TokenKind::MacroIfdef(_) | TokenKind::MacroIfndef(_) => {
                self.parse_condition(|p| p.parse_declaration())
            }
            _ => match self.declaration_shape() {
                Some(DeclShape::Function) => self.parse_function(),
                Some(DeclShape::Variable) => self.parse_variable_decl(),
                None => Err(self.error_here(format!(
                    "Expected declaration, found {}",
                    self.peek()
                ))),
            },
        }
    }

    /// `const? precision? type ident` followed by `(` for a function.
    pub(crate) fn declaration_shape(&self) -> Option<DeclShape> {
        let mut i = 0;
        let is_const = self.check_ahead(i, &TokenKind::Const);
        if is_const {
            i += 1;
        }
        if matches!(self.peek_ahead_kind(i), TokenKind::Precision(_)) {
            i += 1;
        }
        if !matches!(
            self.peek_ahead_kind(i),
            TokenKind::BuiltinType(_) | TokenKind::Void | TokenKind::Ident(_)
        ) {
            return None;
        }
        i += 1;
        if !matches!(self.peek_ahead_kind(i), TokenKind::Ident(_)) {
            return None;
        }
        i += 1;
        if !is_const && self.check_ahead(i, &TokenKind::LParen) {
            Some(DeclShape::Function)
        } else {
            Some(DeclShape::Variable)
        }
    }

    /// `Keyword = ident;`
    fn parse_simple_assign(&mut self, kind: CstKind, what: &str) -> Result<CstNode, ParseError> {
        let children: Vec<CstChild> = vec![
            self.advance().into(),
            self.expect(&TokenKind::Eq, "Expected '='")?.into(),
            self.expect_identifier(&format!("as {what}"))?.into(),
            self.expect_semicolon("after assignment")?.into(),
        ];
        Ok(CstNode::new(kind, children))
    }

    /// `RenderQueueType = RenderQueueType.X | ident;`
    fn parse_render_queue_assign(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![
            self.advance().into(),
            self.expect(&TokenKind::Eq, "Expected '=' after 'RenderQueueType'")?.into(),
        ];
        match self.peek_kind() {
            TokenKind::EnumValue(v) if v.family() == EnumFamily::RenderQueueType => {}
            TokenKind::Ident(_) => {}
            _ => {
                return Err(self.error_here(format!(
                    "Expected a RenderQueueType value, found {}",
                    self.peek()
                )))
            }
        }
        children.push(self.advance().into());
        children.push(self.expect_semicolon("after render queue")?.into());
        Ok(CstNode::new(CstKind::RenderQueueAssign, children))
    }

    /// `Tags { key = value, ... }`
    fn parse_tags(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![
            self.advance().into(),
            self.expect_lbrace("after 'Tags'")?.into(),
        ];
        self.parse_items_until_rbrace(&mut children, "Tags", |p| {
            let mut tag: Vec<CstChild> = vec![
                p.expect_identifier("as tag name")?.into(),
                p.expect(&TokenKind::Eq, "Expected '=' after tag name")?.into(),
            ];
            match p.peek_kind() {
                TokenKind::StringLiteral(_)
                | TokenKind::IntLiteral(_)
                | TokenKind::FloatLiteral(_)
                | TokenKind::True
                | TokenKind::False => tag.push(p.advance().into()),
                _ => return Err(p.error_here(format!("Expected tag value, found {}", p.peek()))),
            }
            if p.check(&TokenKind::Comma) || p.check(&TokenKind::Semicolon) {
                tag.push(p.advance().into());
            }
            Ok(CstNode::new(CstKind::Tag, tag))
        })?;
        Ok(CstNode::new(CstKind::Tags, children))
    }

    /// `EditorProperties { name("Display", Kind) = default; ... }`
    fn parse_editor_properties(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![
            self.advance().into(),
            self.expect_lbrace("after 'EditorProperties'")?.into(),
        ];
        self.parse_items_until_rbrace(&mut children, "EditorProperties", |p| {
            p.parse_editor_property()
        })?;
        Ok(CstNode::new(CstKind::EditorProperties, children))
    }

    fn parse_editor_property(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![
            self.expect_identifier("as property name")?.into(),
            self.expect_lparen("after property name")?.into(),
            self.expect_string("as display name")?.into(),
            self.expect(&TokenKind::Comma, "Expected ',' after display name")?.into(),
            self.expect_identifier("as property kind")?.into(),
            self.expect_rparen("after property kind")?.into(),
        ];
        if self.check(&TokenKind::Eq) {
            children.push(self.advance().into());
            if self.check(&TokenKind::LParen) {
                children.push(self.advance().into());
                loop {
                    self.push_signed_number(&mut children)?;
                    if !self.check(&TokenKind::Comma) {
                        break;
                    }
                    children.push(self.advance().into());
                }
                children.push(self.expect_rparen("after default tuple")?.into());
            } else {
                match self.peek_kind() {
                    TokenKind::True | TokenKind::False | TokenKind::StringLiteral(_) => {
                        children.push(self.advance().into())
                    }
                    _ => self.push_signed_number(&mut children)?,
                }
            }
        }
        children.push(self.expect_semicolon("after editor property")?.into());
        Ok(CstNode::new(CstKind::EditorProperty, children))
    }

    /// `-`? number
    fn push_signed_number(&mut self, children: &mut Vec<CstChild>) -> Result<(), ParseError> {
        if self.check(&TokenKind::Minus) {
            children.push(self.advance().into());
        }
        match self.peek_kind() {
            TokenKind::IntLiteral(_) | TokenKind::FloatLiteral(_) => {
                children.push(self.advance().into());
                Ok(())
            }
            _ => Err(self.error_here(format!("Expected number, found {}", self.peek()))),
        }
    }

    /// `BlendState name? { Property([index])? = value; ... }`
    fn parse_render_state_decl(&mut self) -> Result<CstNode, ParseError> {
        let keyword = self.advance();
        let kind = keyword.kind.render_state_kind().ok_or_else(|| ParseError {
            message: format!("Expected render state keyword, found {}", keyword),
            location: keyword.location(),
        })?;
        let mut children: Vec<CstChild> = vec![keyword.into()];
        if matches!(self.peek_kind(), TokenKind::Ident(_)) {
            children.push(self.advance().into());
        }
        children.push(self.expect_lbrace(&format!("after '{}'", kind))?.into());
        self.parse_items_until_rbrace(&mut children, kind.keyword(), |p| {
            p.parse_render_state_property(kind)
        })?;
        Ok(CstNode::new(CstKind::RenderStateDecl, children))
    }

    fn parse_render_state_property(
        &mut self,
        kind: RenderStateKind,
    ) -> Result<CstNode, ParseError> {
        let location = self.current_location();
        let name_token = self.expect_identifier(&format!("as {} property", kind))?;
        let name = match &name_token.kind {
            TokenKind::Ident(name) => name.clone(),
            _ => String::new(),
        };
        let property = RenderStateProperty::from_name(kind, &name).ok_or_else(|| ParseError {
            message: format!("Unknown property '{}' in {}", name, kind),
            location,
        })?;

        let mut children: Vec<CstChild> = vec![name_token.into()];
        if self.check(&TokenKind::LBracket) {
            if !property.is_indexed() {
                return Err(
                    self.error_here(format!("Property {} does not take an index", property))
                );
            }
            children.push(self.advance().into());
            if !matches!(self.peek_kind(), TokenKind::IntLiteral(_)) {
                return Err(
                    self.error_here(format!("Expected integer index, found {}", self.peek()))
                );
            }
            children.push(self.advance().into());
            children.push(self.expect(&TokenKind::RBracket, "Expected ']' after index")?.into());
        }
        children.push(self.expect(&TokenKind::Eq, "Expected '=' after property name")?.into());

        let category = property.category();
        let fits = match self.peek_kind() {
            TokenKind::Ident(_) => true,
            TokenKind::IntLiteral(_) | TokenKind::FloatLiteral(_) | TokenKind::Minus => {
                category == ValueCategory::Number
            }
            TokenKind::True | TokenKind::False => category == ValueCategory::Bool,
            TokenKind::EnumValue(v) => category == ValueCategory::Enum(v.family()),
            _ => false,
        };
        if !fits {
            return Err(self.error_here(format!(
                "Expected {} for {}, found {}",
                category,
                property,
                self.peek()
            )));
        }
        if category == ValueCategory::Number && !matches!(self.peek_kind(), TokenKind::Ident(_)) {
            self.push_signed_number(&mut children)?;
        } else {
            children.push(self.advance().into());
        }
        children.push(self.expect_semicolon("after render state value")?.into());
        Ok(CstNode::new(CstKind::RenderStateProperty, children))
    }

    /// `struct Name { fields } ;?`
    pub(crate) fn parse_struct(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = vec![
            self.advance().into(),
            self.expect_identifier("after 'struct'")?.into(),
            self.expect_lbrace("after struct name")?.into(),
        ];
        self.parse_items_until_rbrace(&mut children, "struct", |p| {
            let mut field: Vec<CstChild> = Vec::new();
            if matches!(p.peek_kind(), TokenKind::Precision(_)) {
                field.push(p.advance().into());
            }
            field.push(p.parse_type()?.into());
            field.push(p.expect_identifier("as struct field name")?.into());
            if p.check(&TokenKind::LBracket) {
                field.push(p.parse_array_specifier()?.into());
            }
            field.push(p.expect_semicolon("after struct field")?.into());
            Ok(CstNode::new(CstKind::StructField, field))
        })?;
        if self.check(&TokenKind::Semicolon) {
            children.push(self.advance().into());
        }
        Ok(CstNode::new(CstKind::Struct, children))
    }

    /// Type: built-in keyword, `void`, or a struct name
    pub(crate) fn parse_type(&mut self) -> Result<CstNode, ParseError> {
        match self.peek_kind() {
            TokenKind::BuiltinType(_) | TokenKind::Void | TokenKind::Ident(_) => {
                Ok(self.leaf(CstKind::Type))
            }
            _ => Err(self.error_here(format!("Expected type, found {}", self.peek()))),
        }
    }

    /// `[ expr ]`
    pub(crate) fn parse_array_specifier(&mut self) -> Result<CstNode, ParseError> {
        let children: Vec<CstChild> = vec![
            self.advance().into(),
            self.parse_expression()?.into(),
            self.expect(&TokenKind::RBracket, "Expected ']' after array size")?.into(),
        ];
        Ok(CstNode::new(CstKind::ArraySpecifier, children))
    }

    /// `const? precision? type declarator (, declarator)* ;`
    pub(crate) fn parse_variable_decl(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = Vec::new();
        if self.check(&TokenKind::Const) {
            children.push(self.advance().into());
        }
        if matches!(self.peek_kind(), TokenKind::Precision(_)) {
            children.push(self.advance().into());
        }
        children.push(self.parse_type()?.into());
        loop {
            let mut declarator: Vec<CstChild> =
                vec![self.expect_identifier("as variable name")?.into()];
            if self.check(&TokenKind::LBracket) {
                declarator.push(self.parse_array_specifier()?.into());
            }
            if self.check(&TokenKind::Eq) {
                declarator.push(self.advance().into());
                declarator.push(self.parse_expression()?.into());
            }
            children.push(CstNode::new(CstKind::Declarator, declarator).into());
            if !self.check(&TokenKind::Comma) {
                break;
            }
            children.push(self.advance().into());
        }
        children.push(self.expect_semicolon("after variable declaration")?.into());
        Ok(CstNode::new(CstKind::VariableDecl, children))
    }

    /// `precision? type name ( args ) { body }`
    pub(crate) fn parse_function(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = Vec::new();
        if matches!(self.peek_kind(), TokenKind::Precision(_)) {
            children.push(self.advance().into());
        }
        children.push(self.parse_type()?.into());
        children.push(self.expect_identifier("as function name")?.into());
        children.push(self.expect_lparen("after function name")?.into());

        if self.check(&TokenKind::Void) && self.check_ahead(1, &TokenKind::RParen) {
            children.push(self.advance().into());
        } else if !self.check(&TokenKind::RParen) {
            loop {
                children.push(self.parse_fn_arg()?.into());
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                children.push(self.advance().into());
            }
        }
        children.push(self.expect_rparen("after parameters")?.into());
        children.push(self.parse_fn_body()?.into());
        Ok(CstNode::new(CstKind::Fn, children))
    }

    /// `const? (in|out|inout)? const? precision? type name array?`, with
    /// `const` accepted on either side of the direction.
    fn parse_fn_arg(&mut self) -> Result<CstNode, ParseError> {
        let mut children: Vec<CstChild> = Vec::new();
        let leading_const = self.check(&TokenKind::Const);
        if leading_const {
            children.push(self.advance().into());
        }
        if matches!(self.peek_kind(), TokenKind::In | TokenKind::Out | TokenKind::InOut) {
            children.push(self.advance().into());
        }
        if !leading_const && self.check(&TokenKind::Const) {
            children.push(self.advance().into());
        }
        if matches!(self.peek_kind(), TokenKind::Precision(_)) {
            children.push(self.advance().into());
        }
        children.push(self.parse_type()?.into());
        children.push(self.expect_identifier("as parameter name")?.into());
        if self.check(&TokenKind::LBracket) {
            children.push(self.parse_array_specifier()?.into());
        }
        Ok(CstNode::new(CstKind::FnArg, children))
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::cst::CstKind;
    use crate::parser::parse::parse_cst;

    fn pass_body(items: &str) -> String {
        format!(r#"Shader "S" {{ SubShader "D" {{ Pass "P" {{ {items} }} }} }}"#)
    }

    #[test]
    fn test_parse_nested_blocks() {
        let cst = parse_cst(&pass_body("")).unwrap();
        let sub = cst.nodes_of(CstKind::SubShader).next().unwrap();
        assert_eq!(sub.nodes_of(CstKind::Pass).count(), 1);
    }

    #[test]
    fn test_parse_render_state_decl() {
        let cst = parse_cst(&pass_body(
            "BlendState { Enabled[0] = true; SrcColorBlendFactor = BlendFactor.SrcAlpha; ColorWriteMask = 15; }",
        ))
        .unwrap();
        let pass = cst
            .nodes_of(CstKind::SubShader)
            .next()
            .unwrap()
            .nodes_of(CstKind::Pass)
            .next()
            .unwrap();
        let decl = pass.nodes_of(CstKind::RenderStateDecl).next().unwrap();
        assert_eq!(decl.nodes_of(CstKind::RenderStateProperty).count(), 3);
    }

    #[test]
    fn test_wrong_category_value_is_fatal() {
        let err = parse_cst(&pass_body("RasterState { CullMode = BlendFactor.One; }")).unwrap_err();
        assert!(err.message.contains("Expected a CullMode value"), "{}", err);
    }

    #[test]
    fn test_unknown_property_is_fatal() {
        let err = parse_cst(&pass_body("DepthState { Bogus = true; }")).unwrap_err();
        assert!(err.message.contains("Unknown property 'Bogus' in DepthState"));
    }

    #[test]
    fn test_index_on_scalar_property_rejected() {
        let err = parse_cst(&pass_body("DepthState { WriteEnabled[1] = true; }")).unwrap_err();
        assert!(err.message.contains("does not take an index"));
    }

    #[test]
    fn test_pass_assignments() {
        let cst = parse_cst(&pass_body(
            "VertexShader = vert; FragmentShader = frag; BlendState = additive; RenderQueueType = RenderQueueType.Transparent;",
        ))
        .unwrap();
        let pass = cst
            .nodes_of(CstKind::SubShader)
            .next()
            .unwrap()
            .nodes_of(CstKind::Pass)
            .next()
            .unwrap();
        assert_eq!(pass.nodes_of(CstKind::EntryAssign).count(), 2);
        assert_eq!(pass.nodes_of(CstKind::RenderStateAssign).count(), 1);
        assert_eq!(pass.nodes_of(CstKind::RenderQueueAssign).count(), 1);
    }

    #[test]
    fn test_entry_assign_outside_pass_rejected() {
        let err = parse_cst(r#"Shader "S" { VertexShader = vert; }"#).unwrap_err();
        assert!(err.message.contains("in Shader block"));
    }

    #[test]
    fn test_function_versus_variable() {
        let cst = parse_cst(&pass_body(
            "const float PI = 3.14; mat4 u_mvp, u_model; highp vec4 shade(in vec3 n, Light l[2]) { return vec4(n, 1.0); }",
        ))
        .unwrap();
        let pass = cst
            .nodes_of(CstKind::SubShader)
            .next()
            .unwrap()
            .nodes_of(CstKind::Pass)
            .next()
            .unwrap();
        assert_eq!(pass.nodes_of(CstKind::VariableDecl).count(), 2);
        let function = pass.nodes_of(CstKind::Fn).next().unwrap();
        assert_eq!(function.nodes_of(CstKind::FnArg).count(), 2);
    }

    #[test]
    fn test_global_conditional_declarations() {
        let cst = parse_cst(&pass_body(
            "#ifdef USE_FOG\n struct Fog { float d; };\n #else\n float noFog;\n #endif\n",
        ))
        .unwrap();
        let pass = cst
            .nodes_of(CstKind::SubShader)
            .next()
            .unwrap()
            .nodes_of(CstKind::Pass)
            .next()
            .unwrap();
        let cond = pass.nodes_of(CstKind::Condition).next().unwrap();
        assert_eq!(cond.nodes_of(CstKind::Struct).count(), 1);
        assert_eq!(cond.nodes_of(CstKind::ElseBranch).count(), 1);
    }

    #[test]
    fn test_editor_properties_and_tags() {
        let cst = parse_cst(
            r#"Shader "S" {
                EditorProperties { baseColor("Base Color", Color) = (1, 1, 1, 1); metal("Metal", Float) = 0.5; }
                SubShader "D" { Tags { ReplacementTag = "Opaque", Priority = 2 } }
            }"#,
        )
        .unwrap();
        let props = cst.nodes_of(CstKind::EditorProperties).next().unwrap();
        assert_eq!(props.nodes_of(CstKind::EditorProperty).count(), 2);
        let tags = cst
            .nodes_of(CstKind::SubShader)
            .next()
            .unwrap()
            .nodes_of(CstKind::Tags)
            .next()
            .unwrap();
        assert_eq!(tags.nodes_of(CstKind::Tag).count(), 2);
    }
}
