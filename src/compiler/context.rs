//! Per-pass compilation context
//!
//! Holds the semantic state of one pass compile: the global symbol list
//! (shader-level, then subshader-level, then pass-level declarations), the
//! function scope frames, the entry-point slots and the diagnostics raised so
//! far. One context is reused for every pass of a document and cleared with
//! [`CompilationContext::reset_for_pass`] in between; nothing survives a reset.
//!
//! What has already been emitted is not tracked here but in the
//! [`StageState`] of the stage being serialized, so reference state can never
//! leak from one stage or pass into another.

use super::diagnostics::{Diagnostic, DiagnosticKind, Stage};
use super::render_states::resolve_render_states;
use super::serializer::StageState;
use super::CompiledPass;
use crate::config::CompilerConfig;
use crate::parser::ast::*;
use log::{debug, trace, warn};
use rustc_hash::FxHashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Struct,
    Variable,
    Function,
}

/// The declaration a global symbol stands for.
#[derive(Debug, Clone, Copy)]
pub enum GlobalDecl<'a> {
    Struct(&'a StructAst),
    /// One declarator of a (possibly multi-name) variable declaration
    Variable {
        decl: &'a VariableDeclarationAst,
        declarator: &'a DeclaratorAst,
    },
    Function(&'a FnAst),
}

/// One condition of a macro guard.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GuardTerm {
    Defined { name: String, negated: bool },
    Expr { text: String, negated: bool },
}

impl GuardTerm {
    fn from_condition(kind: ConditionKind, condition: &str) -> Self {
        let name = condition.trim().to_string();
        match kind {
            ConditionKind::Ifdef => GuardTerm::Defined { name, negated: false },
            ConditionKind::Ifndef => GuardTerm::Defined { name, negated: true },
            ConditionKind::If => GuardTerm::Expr {
                text: name,
                negated: false,
            },
        }
    }

    fn negated(&self) -> Self {
        match self {
            GuardTerm::Defined { name, negated } => GuardTerm::Defined {
                name: name.clone(),
                negated: !negated,
            },
            GuardTerm::Expr { text, negated } => GuardTerm::Expr {
                text: text.clone(),
                negated: !negated,
            },
        }
    }
}

impl fmt::Display for GuardTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bang = |negated: &bool| if *negated { "!" } else { "" };
        match self {
            GuardTerm::Defined { name, negated } => write!(f, "{}defined({})", bang(negated), name),
            GuardTerm::Expr { text, negated } => write!(f, "{}({})", bang(negated), text),
        }
    }
}

/// Conjunction of the macro conditions enclosing a declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Guard(Vec<GuardTerm>);

impl Guard {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn with(&self, terms: impl IntoIterator<Item = GuardTerm>) -> Guard {
        let mut guard = self.clone();
        guard.0.extend(terms);
        guard
    }

    /// Wrap `text` in `#if <guard>` / `#endif` unless unguarded.
    pub fn wrap(&self, text: &str) -> String {
        if self.is_empty() {
            return text.to_string();
        }
        let condition = self
            .0
            .iter()
            .map(GuardTerm::to_string)
            .collect::<Vec<_>>()
            .join(" && ");
        format!("#if {}\n{}#endif\n", condition, text)
    }
}

#[derive(Debug, Clone)]
pub struct GlobalSymbol<'a> {
    pub name: &'a str,
    pub decl: GlobalDecl<'a>,
    pub span: Span,
    pub guard: Guard,
}

impl GlobalSymbol<'_> {
    pub fn kind(&self) -> SymbolKind {
        match self.decl {
            GlobalDecl::Struct(_) => SymbolKind::Struct,
            GlobalDecl::Variable { .. } => SymbolKind::Variable,
            GlobalDecl::Function(_) => SymbolKind::Function,
        }
    }
}

/// A block-level `#define` / `#undef`, emitted at the top of every stage.
#[derive(Debug, Clone)]
pub struct GlobalDirective<'a> {
    pub directive: &'a MacroDirectiveAst,
    pub guard: Guard,
}

/// Scope frame of one function being serialized. Scoping is function-flat:
/// locals declared in nested blocks live in the function's frame.
#[derive(Debug)]
pub struct Frame<'a> {
    pub fn_name: &'a str,
    locals: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct EntrySlot<'a> {
    pub name: &'a str,
    pub span: Span,
}

pub struct CompilationContext<'a> {
    pub(crate) config: &'a CompilerConfig,
    pub(crate) globals: Vec<GlobalSymbol<'a>>,
    /// name → indices into `globals`, declaration order
    by_name: FxHashMap<&'a str, Vec<usize>>,
    pub(crate) directives: Vec<GlobalDirective<'a>>,
    pub(crate) frames: Vec<Frame<'a>>,
    pub(crate) vert_entry: Option<EntrySlot<'a>>,
    pub(crate) frag_entry: Option<EntrySlot<'a>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> CompilationContext<'a> {
    pub fn new(config: &'a CompilerConfig) -> Self {
        Self {
            config,
            globals: Vec::new(),
            by_name: FxHashMap::default(),
            directives: Vec::new(),
            frames: Vec::new(),
            vert_entry: None,
            frag_entry: None,
            diagnostics: Vec::new(),
        }
    }

    /// Clear all state ahead of a pass compile.
    pub fn reset_for_pass(&mut self) {
        self.globals.clear();
        self.by_name.clear();
        self.directives.clear();
        self.frames.clear();
        self.vert_entry = None;
        self.frag_entry = None;
        self.diagnostics.clear();
    }

    pub fn reset_for_sub_shader(&mut self) {
        self.reset_for_pass();
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub(crate) fn report(&mut self, diagnostic: Diagnostic) {
        if diagnostic.is_error() {
            warn!("{}", diagnostic);
        }
        self.diagnostics.push(diagnostic);
    }

    /// Register the declarations of one block, in source order.
    pub fn add_globals(&mut self, items: &'a [AstNode<GlobalItem>]) {
        self.collect_globals(items, &Guard::default());
    }

    fn collect_globals(&mut self, items: &'a [AstNode<GlobalItem>], guard: &Guard) {
        for item in items {
            match &item.content {
                GlobalItem::Struct(s) => {
                    self.push_global(&s.name, GlobalDecl::Struct(s), item.span, guard)
                }
                GlobalItem::Variable(decl) => {
                    for declarator in &decl.declarators {
                        let global = GlobalDecl::Variable {
                            decl,
                            declarator: &declarator.content,
                        };
                        self.push_global(&declarator.content.name, global, declarator.span, guard);
                    }
                }
                GlobalItem::Function(f) => {
                    self.push_global(&f.name, GlobalDecl::Function(f), item.span, guard)
                }
                GlobalItem::Directive(directive) => self.directives.push(GlobalDirective {
                    directive,
                    guard: guard.clone(),
                }),
                GlobalItem::Condition(cond) => {
                    let first = GuardTerm::from_condition(cond.kind, &cond.condition);
                    self.collect_globals(&cond.body, &guard.with([first.clone()]));
                    let mut previous = vec![first.negated()];
                    for branch in &cond.elif_branches {
                        let condition = &branch.content.condition;
                        let term = GuardTerm::from_condition(ConditionKind::If, condition);
                        let branch_guard =
                            guard.with(previous.iter().cloned().chain([term.clone()]));
                        self.collect_globals(&branch.content.body, &branch_guard);
                        previous.push(term.negated());
                    }
                    if let Some(else_branch) = &cond.else_branch {
                        self.collect_globals(&else_branch.content, &guard.with(previous));
                    }
                }
            }
        }
    }

    fn push_global(&mut self, name: &'a str, decl: GlobalDecl<'a>, span: Span, guard: &Guard) {
        self.by_name.entry(name).or_default().push(self.globals.len());
        self.globals.push(GlobalSymbol {
            name,
            decl,
            span,
            guard: guard.clone(),
        });
    }

    pub(crate) fn push_frame(&mut self, fn_name: &'a str) {
        self.frames.push(Frame {
            fn_name,
            locals: Vec::new(),
        });
    }

    pub(crate) fn pop_frame(&mut self) {
        self.frames.pop();
    }

    pub(crate) fn declare_local(&mut self, name: &str) {
        if let Some(frame) = self.frames.last_mut() {
            frame.locals.push(name.to_string());
        }
    }

    /// Whether `name` is a parameter or local of the current function or of
    /// a function enclosing it, searching innermost frame first.
    pub fn find_local(&self, name: &str) -> bool {
        self.frames
            .iter()
            .rev()
            .any(|frame| frame.locals.iter().any(|local| local == name))
    }

    /// Kind of the global `name`, preferring structs, then variables, then
    /// functions.
    pub fn find_global(&self, name: &str) -> Option<SymbolKind> {
        let kinds: Vec<SymbolKind> = self
            .by_name
            .get(name)?
            .iter()
            .map(|&i| self.globals[i].kind())
            .collect();
        [SymbolKind::Struct, SymbolKind::Variable, SymbolKind::Function]
            .into_iter()
            .find(|kind| kinds.contains(kind))
    }

    pub(crate) fn global_struct(&self, name: &str) -> Option<&'a StructAst> {
        self.by_name.get(name)?.iter().find_map(|&i| match self.globals[i].decl {
            GlobalDecl::Struct(s) => Some(s),
            _ => None,
        })
    }

    pub(crate) fn global_function(&self, name: &str) -> Option<&'a FnAst> {
        self.by_name.get(name)?.iter().find_map(|&i| match self.globals[i].decl {
            GlobalDecl::Function(f) => Some(f),
            _ => None,
        })
    }

    /// Emit every global named `name` into the stage on its first reference.
    ///
    /// The name is marked before its definitions are serialized, so recursion
    /// terminates, and each definition is appended only after everything it
    /// references. Returns whether `name` is a global at all.
    pub fn reference_global(&mut self, name: &str, state: &mut StageState<'a>) -> bool {
        let Some(indices) = self.by_name.get(name).cloned() else {
            return false;
        };
        if !state.mark_emitted(name) {
            return true;
        }
        trace!("{} stage references global '{}'", state.stage.name(), name);
        // A global body never sees the locals of the function referencing it.
        let frames = std::mem::take(&mut self.frames);
        let in_entry = std::mem::replace(&mut state.in_entry, false);
        for index in indices {
            let symbol = self.globals[index].clone();
            let text = self.serialize_global(&symbol, state);
            state.push_global_text(&symbol.guard.wrap(&text));
        }
        state.in_entry = in_entry;
        self.frames = frames;
        true
    }

    fn assign_entry(&mut self, stage: Stage, name: &'a str, span: Span) {
        let slot = match stage {
            Stage::Vertex => &mut self.vert_entry,
            Stage::Fragment => &mut self.frag_entry,
        };
        if slot.is_some() {
            self.report(Diagnostic::error(DiagnosticKind::DuplicateEntry { stage }, span));
            return;
        }
        *slot = Some(EntrySlot { name, span });
    }

    /// Compile one pass: collect globals from the enclosing blocks, fill the
    /// entry slots, then serialize each filled stage.
    pub fn compile_pass(
        &mut self,
        shader: &'a ShaderAst,
        sub_shader: &'a SubShaderAst,
        pass: &'a PassAst,
    ) -> CompiledPass {
        self.reset_for_pass();
        debug!("compiling pass '{}'", pass.name);

        self.add_globals(&shader.declarations);
        self.add_globals(&sub_shader.declarations);
        self.add_globals(&pass.declarations);

        for property in &pass.properties {
            match &property.content {
                PassPropertyAst::VertexEntry(name) => {
                    self.assign_entry(Stage::Vertex, name, property.span)
                }
                PassPropertyAst::FragmentEntry(name) => {
                    self.assign_entry(Stage::Fragment, name, property.span)
                }
                PassPropertyAst::StateReference { .. } | PassPropertyAst::RenderQueue(_) => {}
            }
        }

        let vert = match self.vert_entry {
            Some(slot) => self.compile_stage(Stage::Vertex, slot),
            None => String::new(),
        };
        let frag = match self.frag_entry {
            Some(slot) => self.compile_stage(Stage::Fragment, slot),
            None => String::new(),
        };

        let mut state_diagnostics = Vec::new();
        let render_states = resolve_render_states(shader, sub_shader, pass, &mut state_diagnostics);
        for diagnostic in state_diagnostics {
            self.report(diagnostic);
        }

        CompiledPass {
            name: pass.name.clone(),
            tags: super::collect_tags(&pass.tags),
            render_states,
            vert,
            frag,
            vert_entry: self.vert_entry.map(|slot| slot.name.to_string()),
            frag_entry: self.frag_entry.map(|slot| slot.name.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::parse_shader;

    fn pass_ast(items: &str) -> ShaderAst {
        let source = format!(r#"Shader "S" {{ SubShader "D" {{ Pass "P" {{ {items} }} }} }}"#);
        parse_shader(&source).unwrap().content
    }

    fn parts(shader: &ShaderAst) -> (&SubShaderAst, &PassAst) {
        let sub = &shader.sub_shaders[0].content;
        match &sub.passes[0].content {
            PassItem::Pass(pass) => (sub, pass),
            PassItem::UsePass(_) => panic!("expected pass"),
        }
    }

    #[test]
    fn test_global_lookup_order() {
        let shader = pass_ast("struct light { float i; }; float light; void light() { }");
        let (_, pass) = parts(&shader);
        let config = CompilerConfig::default();
        let mut ctx = CompilationContext::new(&config);
        ctx.add_globals(&pass.declarations);
        assert_eq!(ctx.find_global("light"), Some(SymbolKind::Struct));
        assert_eq!(ctx.find_global("missing"), None);
        assert_eq!(ctx.globals.len(), 3);
    }

    #[test]
    fn test_local_lookup_searches_outward() {
        let config = CompilerConfig::default();
        let mut ctx = CompilationContext::new(&config);
        ctx.push_frame("outer");
        ctx.declare_local("x");
        ctx.push_frame("inner");
        ctx.declare_local("y");
        assert!(ctx.find_local("x"));
        assert!(ctx.find_local("y"));
        ctx.pop_frame();
        assert!(!ctx.find_local("y"));
        assert!(ctx.find_local("x"));
    }

    #[test]
    fn test_guards_from_conditionals() {
        let shader = pass_ast(
            "#ifdef FOG\n float fogA;\n#elif QUALITY > 1\n float fogB;\n#else\n float fogC;\n#endif\n",
        );
        let (_, pass) = parts(&shader);
        let config = CompilerConfig::default();
        let mut ctx = CompilationContext::new(&config);
        ctx.add_globals(&pass.declarations);
        let wrapped: Vec<String> = ctx.globals.iter().map(|g| g.guard.wrap("x\n")).collect();
        assert_eq!(wrapped[0], "#if defined(FOG)\nx\n#endif\n");
        assert_eq!(wrapped[1], "#if !defined(FOG) && (QUALITY > 1)\nx\n#endif\n");
        assert_eq!(wrapped[2], "#if !defined(FOG) && !(QUALITY > 1)\nx\n#endif\n");
    }

    #[test]
    fn test_reset_clears_everything() {
        let shader = pass_ast("float a; VertexShader = v; VertexShader = w; void v() { }");
        let (sub, pass) = parts(&shader);
        let config = CompilerConfig::default();
        let mut ctx = CompilationContext::new(&config);
        let compiled = ctx.compile_pass(&shader, sub, pass);
        assert_eq!(compiled.vert_entry.as_deref(), Some("v"));
        assert_eq!(ctx.diagnostics().len(), 1);
        ctx.reset_for_sub_shader();
        assert!(ctx.globals.is_empty());
        assert!(ctx.diagnostics().is_empty());
        assert!(ctx.vert_entry.is_none());
    }
}
