//! Document blocks, render states and declarations

use super::expressions::build_expression;
use super::statements::build_fn_body;
use super::{malformed, number_value, Cursor};
use crate::engine::EngineEnumValue;
use crate::parser::ast::*;
use crate::parser::cst::{CstKind, CstNode};
use crate::parser::lexer::TokenKind;
use crate::parser::parse::ParseError;
use crate::render_state::{RenderStateKind, RenderStateProperty, RenderStateValue};

/// What one item of a Shader, SubShader or Pass block turns into.
enum BlockItem {
    SubShader(AstNode<SubShaderAst>),
    EditorProperties(Vec<AstNode<EditorPropertyAst>>),
    Pass(AstNode<PassItem>),
    Tags(Vec<AstNode<TagAst>>),
    Property(AstNode<PassPropertyAst>),
    RenderState(AstNode<RenderStateDeclarationAst>),
    Declaration(AstNode<GlobalItem>),
}

fn build_block_item(node: &CstNode) -> Result<BlockItem, ParseError> {
    match node.kind {
        CstKind::SubShader => Ok(BlockItem::SubShader(build_sub_shader(node)?)),
        CstKind::EditorProperties => {
            Ok(BlockItem::EditorProperties(build_editor_properties(node)?))
        }
        CstKind::Pass => {
            let pass = build_pass(node)?;
            Ok(BlockItem::Pass(AstNode::new(PassItem::Pass(pass), node.span)))
        }
        CstKind::UsePass => {
            let mut cursor = Cursor::new(node);
            cursor.token()?;
            let path = cursor.string()?;
            cursor.finish()?;
            Ok(BlockItem::Pass(AstNode::new(PassItem::UsePass(path), node.span)))
        }
        CstKind::Tags => Ok(BlockItem::Tags(build_tags(node)?)),
        CstKind::EntryAssign | CstKind::RenderStateAssign | CstKind::RenderQueueAssign => {
            Ok(BlockItem::Property(build_pass_property(node)?))
        }
        CstKind::RenderStateDecl => Ok(BlockItem::RenderState(build_render_state_decl(node)?)),
        CstKind::Struct
        | CstKind::VariableDecl
        | CstKind::Fn
        | CstKind::Directive
        | CstKind::Condition => Ok(BlockItem::Declaration(build_global_item(node)?)),
        CstKind::Shader
        | CstKind::Tag
        | CstKind::EditorProperty
        | CstKind::RenderStateProperty
        | CstKind::StructField
        | CstKind::Declarator
        | CstKind::Type
        | CstKind::ArraySpecifier
        | CstKind::FnArg
        | CstKind::FnBody
        | CstKind::ElifBranch
        | CstKind::ElseBranch
        | CstKind::Block
        | CstKind::If
        | CstKind::For
        | CstKind::Return
        | CstKind::Jump
        | CstKind::Assignment
        | CstKind::ExpressionStatement
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
        | CstKind::Bool => Err(malformed(node, "not a block item")),
    }
}

/// Keyword, name string and `{` of a block; returns the block name.
fn open_block(cursor: &mut Cursor<'_>) -> Result<String, ParseError> {
    cursor.token()?;
    let name = cursor.string()?;
    cursor
        .token_if(&TokenKind::LBrace)
        .ok_or_else(|| cursor.error("expected '{'"))?;
    Ok(name)
}

/// Block items up to the closing `}`.
fn block_items<'a>(cursor: &mut Cursor<'a>) -> Result<Vec<(&'a CstNode, BlockItem)>, ParseError> {
    let mut items = Vec::new();
    while let Some(node) = cursor.any_node() {
        items.push((node, build_block_item(node)?));
    }
    cursor
        .token_if(&TokenKind::RBrace)
        .ok_or_else(|| cursor.error("expected '}'"))?;
    cursor.finish()?;
    Ok(items)
}

pub(super) fn build_shader(node: &CstNode) -> Result<AstNode<ShaderAst>, ParseError> {
    if node.kind != CstKind::Shader {
        return Err(malformed(node, "document root is not a Shader"));
    }
    let mut cursor = Cursor::new(node);
    let mut shader = ShaderAst {
        name: open_block(&mut cursor)?,
        editor_properties: Vec::new(),
        sub_shaders: Vec::new(),
        tags: Vec::new(),
        render_states: Vec::new(),
        declarations: Vec::new(),
    };
    for (child, item) in block_items(&mut cursor)? {
        match item {
            BlockItem::SubShader(sub) => shader.sub_shaders.push(sub),
            BlockItem::EditorProperties(props) => shader.editor_properties.extend(props),
            BlockItem::Tags(tags) => shader.tags.extend(tags),
            BlockItem::RenderState(state) => shader.render_states.push(state),
            BlockItem::Declaration(decl) => shader.declarations.push(decl),
            BlockItem::Pass(_) | BlockItem::Property(_) => {
                return Err(malformed(child, "pass item at Shader level"))
            }
        }
    }
    Ok(AstNode::new(shader, node.span))
}

fn build_sub_shader(node: &CstNode) -> Result<AstNode<SubShaderAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    let mut sub = SubShaderAst {
        name: open_block(&mut cursor)?,
        tags: Vec::new(),
        passes: Vec::new(),
        render_states: Vec::new(),
        declarations: Vec::new(),
    };
    for (child, item) in block_items(&mut cursor)? {
        match item {
            BlockItem::Pass(pass) => sub.passes.push(pass),
            BlockItem::Tags(tags) => sub.tags.extend(tags),
            BlockItem::RenderState(state) => sub.render_states.push(state),
            BlockItem::Declaration(decl) => sub.declarations.push(decl),
            BlockItem::SubShader(_) | BlockItem::EditorProperties(_) | BlockItem::Property(_) => {
                return Err(malformed(child, "item not allowed in SubShader"))
            }
        }
    }
    Ok(AstNode::new(sub, node.span))
}

fn build_pass(node: &CstNode) -> Result<PassAst, ParseError> {
    let mut cursor = Cursor::new(node);
    let mut pass = PassAst {
        name: open_block(&mut cursor)?,
        tags: Vec::new(),
        properties: Vec::new(),
        render_states: Vec::new(),
        declarations: Vec::new(),
    };
    for (child, item) in block_items(&mut cursor)? {
        match item {
            BlockItem::Tags(tags) => pass.tags.extend(tags),
            BlockItem::Property(property) => pass.properties.push(property),
            BlockItem::RenderState(state) => pass.render_states.push(state),
            BlockItem::Declaration(decl) => pass.declarations.push(decl),
            BlockItem::SubShader(_) | BlockItem::EditorProperties(_) | BlockItem::Pass(_) => {
                return Err(malformed(child, "item not allowed in Pass"))
            }
        }
    }
    Ok(pass)
}

fn build_tags(node: &CstNode) -> Result<Vec<AstNode<TagAst>>, ParseError> {
    let mut cursor = Cursor::new(node);
    cursor.token()?;
    cursor
        .token_if(&TokenKind::LBrace)
        .ok_or_else(|| cursor.error("expected '{'"))?;
    let mut tags = Vec::new();
    while let Some(tag) = cursor.node_if(CstKind::Tag) {
        let mut inner = Cursor::new(tag);
        let key = inner.ident()?;
        inner
            .token_if(&TokenKind::Eq)
            .ok_or_else(|| inner.error("expected '='"))?;
        let value = match &inner.token()?.kind {
            TokenKind::StringLiteral(text) => TagValue::String(text.clone()),
            TokenKind::IntLiteral(text) | TokenKind::FloatLiteral(text) => {
                TagValue::Number(number_value(text).ok_or_else(|| inner.error("invalid number"))?)
            }
            TokenKind::True => TagValue::Bool(true),
            TokenKind::False => TagValue::Bool(false),
            _ => return Err(inner.error("invalid tag value")),
        };
        inner.token_where(|k| matches!(k, TokenKind::Comma | TokenKind::Semicolon));
        inner.finish()?;
        tags.push(AstNode::new(TagAst { key, value }, tag.span));
    }
    cursor
        .token_if(&TokenKind::RBrace)
        .ok_or_else(|| cursor.error("expected '}'"))?;
    cursor.finish()?;
    Ok(tags)
}

/// Optional `-` followed by a number literal.
fn signed_number(cursor: &mut Cursor<'_>) -> Result<f64, ParseError> {
    let negative = cursor.token_if(&TokenKind::Minus).is_some();
    let value = match &cursor.token()?.kind {
        TokenKind::IntLiteral(text) | TokenKind::FloatLiteral(text) => {
            number_value(text).ok_or_else(|| cursor.error("invalid number"))?
        }
        _ => return Err(cursor.error("expected number")),
    };
    Ok(if negative { -value } else { value })
}

fn build_editor_properties(node: &CstNode) -> Result<Vec<AstNode<EditorPropertyAst>>, ParseError> {
    let mut cursor = Cursor::new(node);
    cursor.token()?;
    cursor
        .token_if(&TokenKind::LBrace)
        .ok_or_else(|| cursor.error("expected '{'"))?;
    let mut properties = Vec::new();
    while let Some(prop) = cursor.node_if(CstKind::EditorProperty) {
        let mut inner = Cursor::new(prop);
        let name = inner.ident()?;
        inner.token()?;
        let display_name = inner.string()?;
        inner.token()?;
        let kind = inner.ident()?;
        inner.token()?;

        let default = if inner.token_if(&TokenKind::Eq).is_some() {
            if inner.token_if(&TokenKind::LParen).is_some() {
                let mut values = vec![signed_number(&mut inner)?];
                while inner.token_if(&TokenKind::Comma).is_some() {
                    values.push(signed_number(&mut inner)?);
                }
                inner
                    .token_if(&TokenKind::RParen)
                    .ok_or_else(|| inner.error("expected ')'"))?;
                Some(PropertyDefault::Tuple(values))
            } else if inner.token_if(&TokenKind::True).is_some() {
                Some(PropertyDefault::Bool(true))
            } else if inner.token_if(&TokenKind::False).is_some() {
                Some(PropertyDefault::Bool(false))
            } else if let Some(token) =
                inner.token_where(|k| matches!(k, TokenKind::StringLiteral(_)))
            {
                match &token.kind {
                    TokenKind::StringLiteral(text) => Some(PropertyDefault::String(text.clone())),
                    _ => None,
                }
            } else {
                Some(PropertyDefault::Number(signed_number(&mut inner)?))
            }
        } else {
            None
        };
        inner
            .token_if(&TokenKind::Semicolon)
            .ok_or_else(|| inner.error("expected ';'"))?;
        inner.finish()?;
        properties.push(AstNode::new(
            EditorPropertyAst {
                name,
                display_name,
                kind,
                default,
            },
            prop.span,
        ));
    }
    cursor
        .token_if(&TokenKind::RBrace)
        .ok_or_else(|| cursor.error("expected '}'"))?;
    cursor.finish()?;
    Ok(properties)
}

fn build_pass_property(node: &CstNode) -> Result<AstNode<PassPropertyAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    let keyword = cursor.token()?;
    cursor
        .token_if(&TokenKind::Eq)
        .ok_or_else(|| cursor.error("expected '='"))?;
    let value = cursor.token()?;
    cursor
        .token_if(&TokenKind::Semicolon)
        .ok_or_else(|| cursor.error("expected ';'"))?;
    cursor.finish()?;

    let property = match (&keyword.kind, &value.kind) {
        (TokenKind::VertexShader, TokenKind::Ident(name)) => {
            PassPropertyAst::VertexEntry(name.clone())
        }
        (TokenKind::FragmentShader, TokenKind::Ident(name)) => {
            PassPropertyAst::FragmentEntry(name.clone())
        }
        (
            TokenKind::RenderQueueType,
            TokenKind::EnumValue(EngineEnumValue::RenderQueueType(queue)),
        ) => PassPropertyAst::RenderQueue(RenderQueueValue::Fixed(*queue)),
        (TokenKind::RenderQueueType, TokenKind::Ident(name)) => {
            PassPropertyAst::RenderQueue(RenderQueueValue::Variable(name.clone()))
        }
        (kind, TokenKind::Ident(name)) => match kind.render_state_kind() {
            Some(kind) => PassPropertyAst::StateReference {
                kind,
                name: name.clone(),
            },
            None => return Err(malformed(node, "unknown pass property")),
        },
        _ => return Err(malformed(node, "unknown pass property")),
    };
    Ok(AstNode::new(property, node.span))
}

fn build_render_state_decl(
    node: &CstNode,
) -> Result<AstNode<RenderStateDeclarationAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    let kind = cursor
        .token()?
        .kind
        .render_state_kind()
        .ok_or_else(|| cursor.error("expected state keyword"))?;
    let name = match cursor.token_where(|k| matches!(k, TokenKind::Ident(_))) {
        Some(token) => match &token.kind {
            TokenKind::Ident(name) => Some(name.clone()),
            _ => None,
        },
        None => None,
    };
    cursor
        .token_if(&TokenKind::LBrace)
        .ok_or_else(|| cursor.error("expected '{'"))?;
    let mut properties = Vec::new();
    while let Some(prop) = cursor.node_if(CstKind::RenderStateProperty) {
        properties.push(build_render_state_property(prop, kind)?);
    }
    cursor
        .token_if(&TokenKind::RBrace)
        .ok_or_else(|| cursor.error("expected '}'"))?;
    cursor.finish()?;
    Ok(AstNode::new(
        RenderStateDeclarationAst {
            kind,
            name,
            properties,
        },
        node.span,
    ))
}

fn build_render_state_property(
    node: &CstNode,
    kind: RenderStateKind,
) -> Result<AstNode<RenderStatePropertyAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    let name = cursor.ident()?;
    let property = RenderStateProperty::from_name(kind, &name)
        .ok_or_else(|| cursor.error("unknown render state property"))?;

    let index = if cursor.token_if(&TokenKind::LBracket).is_some() {
        let index = match &cursor.token()?.kind {
            TokenKind::IntLiteral(text) => number_value(text).map(|v| v as usize),
            _ => None,
        }
        .ok_or_else(|| cursor.error("expected integer index"))?;
        cursor.token_if(&TokenKind::RBracket)
            .ok_or_else(|| cursor.error("expected ']'"))?;
        Some(index)
    } else {
        None
    };
    cursor
        .token_if(&TokenKind::Eq)
        .ok_or_else(|| cursor.error("expected '='"))?;

    let value = if let Some(token) = cursor.token_where(|k| {
        matches!(
            k,
            TokenKind::True | TokenKind::False | TokenKind::EnumValue(_) | TokenKind::Ident(_)
        )
    }) {
        match &token.kind {
            TokenKind::True => RenderStateValue::Bool(true),
            TokenKind::False => RenderStateValue::Bool(false),
            TokenKind::EnumValue(v) => RenderStateValue::Enum(*v),
            TokenKind::Ident(name) => RenderStateValue::Variable(name.clone()),
            _ => return Err(cursor.error("invalid render state value")),
        }
    } else {
        RenderStateValue::Number(signed_number(&mut cursor)?)
    };
    if !value.fits(property.category()) {
        return Err(malformed(node, "render state value of the wrong category"));
    }
    cursor
        .token_if(&TokenKind::Semicolon)
        .ok_or_else(|| cursor.error("expected ';'"))?;
    cursor.finish()?;
    Ok(AstNode::new(
        RenderStatePropertyAst {
            property,
            index,
            value,
        },
        node.span,
    ))
}

/// A declaration-level item: struct, variable, function or macro.
pub(super) fn build_global_item(node: &CstNode) -> Result<AstNode<GlobalItem>, ParseError> {
    let item = match node.kind {
        CstKind::Struct => GlobalItem::Struct(build_struct(node)?),
        CstKind::VariableDecl => GlobalItem::Variable(build_variable_decl(node)?),
        CstKind::Fn => GlobalItem::Function(build_function(node)?),
        CstKind::Directive => GlobalItem::Directive(build_directive(node)?),
        CstKind::Condition => GlobalItem::Condition(build_condition(node, build_global_item)?),
        _ => return Err(malformed(node, "not a declaration")),
    };
    Ok(AstNode::new(item, node.span))
}

fn build_struct(node: &CstNode) -> Result<StructAst, ParseError> {
    let mut cursor = Cursor::new(node);
    cursor.token()?;
    let name = cursor.ident()?;
    cursor
        .token_if(&TokenKind::LBrace)
        .ok_or_else(|| cursor.error("expected '{'"))?;
    let mut fields = Vec::new();
    while let Some(field) = cursor.node_if(CstKind::StructField) {
        let mut inner = Cursor::new(field);
        let precision = precision(&mut inner);
        let ty = build_type(inner.node(CstKind::Type)?)?;
        let field_name = inner.ident()?;
        let array_size = match inner.node_if(CstKind::ArraySpecifier) {
            Some(spec) => Some(build_array_specifier(spec)?),
            None => None,
        };
        inner
            .token_if(&TokenKind::Semicolon)
            .ok_or_else(|| inner.error("expected ';'"))?;
        inner.finish()?;
        fields.push(AstNode::new(
            StructFieldAst {
                precision,
                ty,
                name: field_name,
                array_size,
            },
            field.span,
        ));
    }
    cursor
        .token_if(&TokenKind::RBrace)
        .ok_or_else(|| cursor.error("expected '}'"))?;
    cursor.token_if(&TokenKind::Semicolon);
    cursor.finish()?;
    Ok(StructAst { name, fields })
}

fn precision(cursor: &mut Cursor<'_>) -> Option<Precision> {
    match cursor.token_where(|k| matches!(k, TokenKind::Precision(_))) {
        Some(token) => match token.kind {
            TokenKind::Precision(p) => Some(p),
            _ => None,
        },
        None => None,
    }
}

pub(super) fn build_type(node: &CstNode) -> Result<AstNode<TypeAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    let ty = match &cursor.token()?.kind {
        TokenKind::BuiltinType(name) => TypeAst {
            name: name.to_string(),
            is_custom: false,
        },
        TokenKind::Void => TypeAst {
            name: "void".to_string(),
            is_custom: false,
        },
        TokenKind::Ident(name) => TypeAst {
            name: name.clone(),
            is_custom: true,
        },
        _ => return Err(cursor.error("expected type")),
    };
    cursor.finish()?;
    Ok(AstNode::new(ty, node.span))
}

fn build_array_specifier(node: &CstNode) -> Result<AstNode<ExprAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    cursor.token()?;
    let size = build_expression(cursor.node(CstKind::Ternary)?)?;
    cursor.token()?;
    cursor.finish()?;
    Ok(size)
}

pub(super) fn build_variable_decl(node: &CstNode) -> Result<VariableDeclarationAst, ParseError> {
    let mut cursor = Cursor::new(node);
    let is_const = cursor.token_if(&TokenKind::Const).is_some();
    let precision = precision(&mut cursor);
    let ty = build_type(cursor.node(CstKind::Type)?)?;
    let mut declarators = Vec::new();
    loop {
        let declarator = cursor.node(CstKind::Declarator)?;
        let mut inner = Cursor::new(declarator);
        let name = inner.ident()?;
        let array_size = match inner.node_if(CstKind::ArraySpecifier) {
            Some(spec) => Some(build_array_specifier(spec)?),
            None => None,
        };
        let init = if inner.token_if(&TokenKind::Eq).is_some() {
            Some(build_expression(inner.node(CstKind::Ternary)?)?)
        } else {
            None
        };
        inner.finish()?;
        declarators.push(AstNode::new(
            DeclaratorAst {
                name,
                array_size,
                init,
            },
            declarator.span,
        ));
        if cursor.token_if(&TokenKind::Comma).is_none() {
            break;
        }
    }
    cursor
        .token_if(&TokenKind::Semicolon)
        .ok_or_else(|| cursor.error("expected ';'"))?;
    cursor.finish()?;
    Ok(VariableDeclarationAst {
        is_const,
        precision,
        ty,
        declarators,
    })
}

pub(super) fn build_function(node: &CstNode) -> Result<FnAst, ParseError> {
    let mut cursor = Cursor::new(node);
    let precision = precision(&mut cursor);
    let return_type = build_type(cursor.node(CstKind::Type)?)?;
    let name = cursor.ident()?;
    cursor
        .token_if(&TokenKind::LParen)
        .ok_or_else(|| cursor.error("expected '('"))?;
    cursor.token_if(&TokenKind::Void);
    let mut args = Vec::new();
    while let Some(arg) = cursor.node_if(CstKind::FnArg) {
        args.push(build_fn_arg(arg)?);
        cursor.token_if(&TokenKind::Comma);
    }
    cursor
        .token_if(&TokenKind::RParen)
        .ok_or_else(|| cursor.error("expected ')'"))?;
    let body = build_fn_body(cursor.node(CstKind::FnBody)?)?;
    cursor.finish()?;
    Ok(FnAst {
        precision,
        return_type,
        name,
        args,
        body,
    })
}

fn build_fn_arg(node: &CstNode) -> Result<AstNode<FnArgAst>, ParseError> {
    let mut cursor = Cursor::new(node);
    let leading_const = cursor.token_if(&TokenKind::Const).is_some();
    let decorator =
        cursor.token_where(|k| matches!(k, TokenKind::In | TokenKind::Out | TokenKind::InOut));
    let decorator = match decorator {
        Some(token) => match token.kind {
            TokenKind::In => Some(ArgDecorator::In),
            TokenKind::Out => Some(ArgDecorator::Out),
            _ => Some(ArgDecorator::InOut),
        },
        None => None,
    };
    let is_const = leading_const || cursor.token_if(&TokenKind::Const).is_some();
    let precision = precision(&mut cursor);
    let ty = build_type(cursor.node(CstKind::Type)?)?;
    let name = cursor.ident()?;
    let array_size = match cursor.node_if(CstKind::ArraySpecifier) {
        Some(spec) => Some(build_array_specifier(spec)?),
        None => None,
    };
    cursor.finish()?;
    Ok(AstNode::new(
        FnArgAst {
            decorator,
            is_const,
            precision,
            ty,
            name,
            array_size,
        },
        node.span,
    ))
}

pub(super) fn build_directive(node: &CstNode) -> Result<MacroDirectiveAst, ParseError> {
    let mut cursor = Cursor::new(node);
    let (kind, text) = match &cursor.token()?.kind {
        TokenKind::MacroDefine(text) => (DirectiveKind::Define, text.clone()),
        TokenKind::MacroUndef(text) => (DirectiveKind::Undef, text.clone()),
        _ => return Err(cursor.error("expected #define or #undef")),
    };
    cursor.finish()?;
    let name = text
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default()
        .to_string();
    Ok(MacroDirectiveAst { kind, name, text })
}

/// Macro conditional whose branch items are built by `item`.
pub(super) fn build_condition<T>(
    node: &CstNode,
    item: fn(&CstNode) -> Result<AstNode<T>, ParseError>,
) -> Result<MacroConditionAst<T>, ParseError> {
    let mut cursor = Cursor::new(node);
    let (kind, condition) = match &cursor.token()?.kind {
        TokenKind::MacroIf(text) => (ConditionKind::If, text.clone()),
        TokenKind::MacroIfdef(text) => (ConditionKind::Ifdef, text.clone()),
        TokenKind::MacroIfndef(text) => (ConditionKind::Ifndef, text.clone()),
        _ => return Err(cursor.error("expected conditional directive")),
    };

    let mut body = Vec::new();
    let mut elif_branches = Vec::new();
    let mut else_branch = None;
    while let Some(child) = cursor.any_node() {
        match child.kind {
            CstKind::ElifBranch => {
                let mut inner = Cursor::new(child);
                let condition = match &inner.token()?.kind {
                    TokenKind::MacroElif(text) => text.clone(),
                    _ => return Err(inner.error("expected #elif")),
                };
                let body = branch_items(&mut inner, item)?;
                elif_branches.push(AstNode::new(MacroBranchAst { condition, body }, child.span));
            }
            CstKind::ElseBranch => {
                let mut inner = Cursor::new(child);
                inner
                    .token_if(&TokenKind::MacroElse)
                    .ok_or_else(|| inner.error("expected #else"))?;
                else_branch = Some(AstNode::new(branch_items(&mut inner, item)?, child.span));
            }
            _ if elif_branches.is_empty() && else_branch.is_none() => body.push(item(child)?),
            _ => return Err(malformed(child, "item after #elif/#else branch")),
        }
    }
    cursor
        .token_if(&TokenKind::MacroEndif)
        .ok_or_else(|| cursor.error("expected #endif"))?;
    cursor.finish()?;
    Ok(MacroConditionAst {
        kind,
        condition,
        body,
        elif_branches,
        else_branch,
    })
}

fn branch_items<T>(
    cursor: &mut Cursor<'_>,
    item: fn(&CstNode) -> Result<AstNode<T>, ParseError>,
) -> Result<Vec<AstNode<T>>, ParseError> {
    let mut items = Vec::new();
    while let Some(node) = cursor.any_node() {
        items.push(item(node)?);
    }
    cursor.finish()?;
    Ok(items)
}

#[cfg(test)]
mod tests {
    use crate::builder::parse_shader;
    use crate::engine::RenderQueueType;
    use crate::parser::ast::*;
    use crate::render_state::RenderStateKind;

    fn pass(items: &str) -> PassAst {
        let source = format!(r#"Shader "S" {{ SubShader "D" {{ Pass "P" {{ {items} }} }} }}"#);
        let shader = parse_shader(&source).unwrap().content;
        match shader.sub_shaders[0].content.passes[0].content.clone() {
            PassItem::Pass(pass) => pass,
            PassItem::UsePass(_) => panic!("expected pass"),
        }
    }

    #[test]
    fn test_pass_properties() {
        let pass = pass(
            "BlendState = additive; RenderQueueType = RenderQueueType.Transparent; RenderQueueType = queue;",
        );
        let props: Vec<_> = pass.properties.into_iter().map(|p| p.content).collect();
        assert_eq!(
            props,
            vec![
                PassPropertyAst::StateReference {
                    kind: RenderStateKind::Blend,
                    name: "additive".into()
                },
                PassPropertyAst::RenderQueue(RenderQueueValue::Fixed(RenderQueueType::Transparent)),
                PassPropertyAst::RenderQueue(RenderQueueValue::Variable("queue".into())),
            ]
        );
    }

    #[test]
    fn test_variable_declarators() {
        let pass = pass("const highp float scale = 2.0, bias[2];");
        match &pass.declarations[0].content {
            GlobalItem::Variable(var) => {
                assert!(var.is_const);
                assert_eq!(var.precision, Some(Precision::High));
                assert_eq!(var.ty.content.name, "float");
                assert_eq!(var.declarators.len(), 2);
                assert_eq!(
                    var.declarators[0].content.init.as_ref().map(|e| e.content.clone()),
                    Some(ExprAst::Number("2.0".into()))
                );
                assert_eq!(
                    var.declarators[1].content.array_size.as_ref().map(|e| e.content.clone()),
                    Some(ExprAst::Number("2".into()))
                );
            }
            other => panic!("expected variable, got {other:?}"),
        }
    }

    #[test]
    fn test_function_args() {
        let pass = pass("void f(inout vec3 c, const in float k) { }");
        match &pass.declarations[0].content {
            GlobalItem::Function(f) => {
                assert_eq!(f.args[0].content.decorator, Some(ArgDecorator::InOut));
                assert_eq!(f.args[1].content.decorator, Some(ArgDecorator::In));
                assert!(f.args[1].content.is_const);
                assert!(!f.args[0].content.is_const);
                assert_eq!(f.return_type.content.name, "void");
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_global_condition_branches() {
        let pass = pass(
            "#define FOG 1\n#if FOG\n float fogDensity;\n#elif LOW\n float a;\n#else\n float b;\n#endif\n",
        );
        assert!(matches!(
            &pass.declarations[0].content,
            GlobalItem::Directive(d) if d.name == "FOG" && d.text == "FOG 1"
        ));
        match &pass.declarations[1].content {
            GlobalItem::Condition(cond) => {
                assert_eq!(cond.kind, ConditionKind::If);
                assert_eq!(cond.condition, "FOG");
                assert_eq!(cond.body.len(), 1);
                assert_eq!(cond.elif_branches[0].content.condition, "LOW");
                assert_eq!(cond.else_branch.as_ref().map(|b| b.content.len()), Some(1));
            }
            other => panic!("expected condition, got {other:?}"),
        }
    }

    #[test]
    fn test_editor_property_defaults() {
        let shader = parse_shader(
            r#"Shader "S" { EditorProperties {
                tint("Tint", Color) = (1, 0.5, -1, 1);
                useFog("Use Fog", Boolean) = true;
                offset("Offset", Float) = -2;
                tex("Texture", Texture2D);
            } }"#,
        )
        .unwrap()
        .content;
        let defaults: Vec<_> = shader
            .editor_properties
            .iter()
            .map(|p| p.content.default.clone())
            .collect();
        assert_eq!(
            defaults,
            vec![
                Some(PropertyDefault::Tuple(vec![1.0, 0.5, -1.0, 1.0])),
                Some(PropertyDefault::Bool(true)),
                Some(PropertyDefault::Number(-2.0)),
                None,
            ]
        );
        assert_eq!(shader.editor_properties[0].content.display_name, "Tint");
    }

    #[test]
    fn test_use_pass_and_tags() {
        let shader = parse_shader(
            r#"Shader "S" { SubShader "D" { Tags { ReplacementTag = "Opaque", pipelineStage = 1 } UsePass "Other/Default/Forward" } }"#,
        )
        .unwrap()
        .content;
        let sub = &shader.sub_shaders[0].content;
        assert_eq!(sub.tags[0].content.value, TagValue::String("Opaque".into()));
        assert_eq!(sub.tags[1].content.value, TagValue::Number(1.0));
        assert_eq!(
            sub.passes[0].content,
            PassItem::UsePass("Other/Default/Forward".into())
        );
    }
}
