//! Render-state resolution for one pass
//!
//! Unnamed state blocks apply directly: Shader, then SubShader, then Pass
//! level, later entries overwriting earlier ones per key. Named blocks only
//! apply when a pass selects them with `BlendState = name;`, and the pass's
//! own assignments are applied last.

use super::diagnostics::{Diagnostic, DiagnosticKind};
use crate::engine::EngineEnumValue;
use crate::parser::ast::{
    AstNode, PassAst, PassPropertyAst, RenderQueueValue, RenderStateDeclarationAst, ShaderAst,
    SubShaderAst,
};
use crate::render_state::{
    RenderStateKey, RenderStateKind, RenderStateProperty, RenderStateValue, RenderStates,
};
use log::trace;

fn apply(states: &mut RenderStates, decl: &RenderStateDeclarationAst) {
    for property in &decl.properties {
        let property = &property.content;
        states.insert(
            RenderStateKey::new(property.property, property.index),
            property.value.clone(),
        );
    }
}

/// Named declaration visible from the pass, innermost block first.
fn find_named<'a>(
    scopes: [&'a [AstNode<RenderStateDeclarationAst>]; 3],
    kind: RenderStateKind,
    name: &str,
) -> Option<&'a RenderStateDeclarationAst> {
    scopes.into_iter().find_map(|decls| {
        decls
            .iter()
            .map(|decl| &decl.content)
            .find(|decl| decl.kind == kind && decl.name.as_deref() == Some(name))
    })
}

pub fn resolve_render_states(
    shader: &ShaderAst,
    sub_shader: &SubShaderAst,
    pass: &PassAst,
    diagnostics: &mut Vec<Diagnostic>,
) -> RenderStates {
    let mut states = RenderStates::new();
    for decls in [&shader.render_states, &sub_shader.render_states, &pass.render_states] {
        for decl in decls.iter().filter(|decl| decl.content.name.is_none()) {
            apply(&mut states, &decl.content);
        }
    }

    let scopes = [
        pass.render_states.as_slice(),
        sub_shader.render_states.as_slice(),
        shader.render_states.as_slice(),
    ];
    for property in &pass.properties {
        match &property.content {
            PassPropertyAst::StateReference { kind, name } => {
                match find_named(scopes, *kind, name) {
                    Some(decl) => {
                        trace!("pass '{}' uses {} '{}'", pass.name, kind, name);
                        apply(&mut states, decl);
                    }
                    None => diagnostics.push(Diagnostic::error(
                        DiagnosticKind::UnknownRenderState {
                            kind: *kind,
                            name: name.clone(),
                        },
                        property.span,
                    )),
                }
            }
            PassPropertyAst::RenderQueue(queue) => {
                let value = match queue {
                    RenderQueueValue::Fixed(queue) => {
                        RenderStateValue::Enum(EngineEnumValue::RenderQueueType(*queue))
                    }
                    RenderQueueValue::Variable(name) => RenderStateValue::Variable(name.clone()),
                };
                let key = RenderStateKey::new(RenderStateProperty::RenderQueueType, None);
                states.insert(key, value);
            }
            PassPropertyAst::VertexEntry(_) | PassPropertyAst::FragmentEntry(_) => {}
        }
    }
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::parse_shader;
    use crate::engine::{BlendFactor, CullMode, RenderQueueType};
    use crate::parser::ast::PassItem;

    fn resolve(source: &str) -> (RenderStates, Vec<Diagnostic>) {
        let shader = parse_shader(source).unwrap().content;
        let sub = &shader.sub_shaders[0].content;
        let PassItem::Pass(pass) = &sub.passes[0].content else {
            panic!("expected pass");
        };
        let mut diagnostics = Vec::new();
        let states = resolve_render_states(&shader, sub, pass, &mut diagnostics);
        (states, diagnostics)
    }

    fn key(property: RenderStateProperty, index: Option<usize>) -> RenderStateKey {
        RenderStateKey::new(property, index)
    }

    #[test]
    fn test_inner_blocks_override_outer() {
        let (states, diagnostics) = resolve(
            r#"Shader "S" {
                RasterState { CullMode = CullMode.Back; DepthBias = 1; }
                SubShader "D" {
                    Pass "P" { RasterState { CullMode = CullMode.Off; } }
                }
            }"#,
        );
        assert!(diagnostics.is_empty());
        assert_eq!(
            states.get(&key(RenderStateProperty::CullMode, None)),
            Some(&RenderStateValue::Enum(EngineEnumValue::CullMode(CullMode::Off)))
        );
        assert_eq!(
            states.get(&key(RenderStateProperty::DepthBias, None)),
            Some(&RenderStateValue::Number(1.0))
        );
    }

    #[test]
    fn test_named_state_selected_by_pass() {
        let (states, diagnostics) = resolve(
            r#"Shader "S" {
                BlendState additive { SrcColorBlendFactor[0] = BlendFactor.One; Enabled[0] = true; }
                SubShader "D" {
                    Pass "P" { BlendState = additive; RenderQueueType = RenderQueueType.Transparent; }
                }
            }"#,
        );
        assert!(diagnostics.is_empty());
        assert_eq!(
            states.get(&key(RenderStateProperty::SrcColorBlendFactor, Some(0))),
            Some(&RenderStateValue::Enum(EngineEnumValue::BlendFactor(BlendFactor::One)))
        );
        assert_eq!(
            states.get(&key(RenderStateProperty::RenderQueueType, None)),
            Some(&RenderStateValue::Enum(EngineEnumValue::RenderQueueType(
                RenderQueueType::Transparent
            )))
        );
    }

    #[test]
    fn test_unknown_named_state() {
        let (states, diagnostics) =
            resolve(r#"Shader "S" { SubShader "D" { Pass "P" { DepthState = missing; } } }"#);
        assert!(states.is_empty());
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].message(), "unknown DepthState 'missing'");
    }
}
