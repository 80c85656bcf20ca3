//! Stage serializer
//!
//! Turns one entry function into the text of a single stage program. Nothing
//! is emitted up front: the entry body is walked and every identifier is
//! resolved as it is met (protocol variable, local, global, built-in or
//! macro). The first reference to a global serializes it, after its own
//! dependencies, so the stage ends up containing exactly the globals the
//! entry can reach, each defined before its first use.
//!
//! Stage program layout:
//!
//! 1. precision header (fragment stage only, from [`CompilerConfig`])
//! 2. block-level `#define` / `#undef` lines
//! 3. reached globals in dependency order
//! 4. `attribute` declarations for read fields of the attribute struct
//! 5. `varying` declarations for used fields of the varying struct
//! 6. the entry function itself
//!
//! [`CompilerConfig`]: crate::config::CompilerConfig

use super::builtins::is_builtin;
use super::context::{CompilationContext, EntrySlot, GlobalDecl, GlobalSymbol};
use super::diagnostics::{Diagnostic, DiagnosticKind, Stage};
use crate::parser::ast::*;
use crate::parser::lexer::{tokenize, TokenKind};
use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

const INDENT: &str = "    ";

fn indent(depth: usize) -> String {
    INDENT.repeat(depth)
}

fn precision_prefix(precision: Option<Precision>) -> String {
    precision.map(|p| format!("{} ", p.as_str())).unwrap_or_default()
}

fn directive_line(directive: &MacroDirectiveAst) -> String {
    match directive.kind {
        DirectiveKind::Define => format!("#define {}\n", directive.text),
        DirectiveKind::Undef => format!("#undef {}\n", directive.text),
    }
}

/// Identifiers the replacement text of a `#define` refers to, leaving out the
/// macro's own parameters and member names after a `.`.
fn macro_references(directive: &MacroDirectiveAst) -> Vec<String> {
    let rest = directive
        .text
        .strip_prefix(directive.name.as_str())
        .unwrap_or(&directive.text);
    let (params, body): (Vec<&str>, &str) = match rest.strip_prefix('(') {
        Some(after) => match after.split_once(')') {
            Some((params, body)) => (params.split(',').map(str::trim).collect(), body),
            None => return Vec::new(),
        },
        None => (Vec::new(), rest),
    };
    // a body the lexer rejects (token pasting, stringizing) pulls in nothing
    let Ok(tokens) = tokenize(body) else {
        return Vec::new();
    };
    let mut names: Vec<String> = Vec::new();
    let mut after_dot = false;
    for token in &tokens {
        if let TokenKind::Ident(name) = &token.kind {
            if !after_dot && !params.contains(&name.as_str()) && !names.contains(name) {
                names.push(name.clone());
            }
        }
        after_dot = token.kind == TokenKind::Dot;
    }
    names
}

/// A struct whose fields become stage interface variables, and the fields
/// the stage actually touched.
#[derive(Debug, Default)]
struct FieldTable<'a> {
    structure: Option<&'a StructAst>,
    referenced: FxHashSet<String>,
}

/// Everything one stage serialization accumulates.
#[derive(Debug)]
pub struct StageState<'a> {
    pub stage: Stage,
    emitted: FxHashSet<String>,
    globals: String,
    attributes: FieldTable<'a>,
    varyings: FieldTable<'a>,
    attribute_vars: Vec<String>,
    varying_vars: Vec<String>,
    macros: FxHashMap<String, Vec<&'a MacroDirectiveAst>>,
    expanding: FxHashSet<String>,
    warned: FxHashSet<String>,
    /// Set while the entry function's own body is being walked.
    pub(crate) in_entry: bool,
}

impl<'a> StageState<'a> {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            emitted: FxHashSet::default(),
            globals: String::new(),
            attributes: FieldTable::default(),
            varyings: FieldTable::default(),
            attribute_vars: Vec::new(),
            varying_vars: Vec::new(),
            macros: FxHashMap::default(),
            expanding: FxHashSet::default(),
            warned: FxHashSet::default(),
            in_entry: false,
        }
    }

    /// Mark `name` as emitted; false if it already was.
    pub fn mark_emitted(&mut self, name: &str) -> bool {
        self.emitted.insert(name.to_string())
    }

    pub fn is_emitted(&self, name: &str) -> bool {
        self.emitted.contains(name)
    }

    pub(crate) fn push_global_text(&mut self, text: &str) {
        self.globals.push_str(text);
    }

    fn protocol_table(&mut self, root: &str) -> Option<&mut FieldTable<'a>> {
        if !self.in_entry {
            return None;
        }
        if self.attribute_vars.iter().any(|v| v == root) {
            Some(&mut self.attributes)
        } else if self.varying_vars.iter().any(|v| v == root) {
            Some(&mut self.varyings)
        } else {
            None
        }
    }

    fn is_varying_var(&self, expr: &ExprAst) -> bool {
        match expr {
            ExprAst::Variable { root, accessors } => {
                self.in_entry && accessors.is_empty() && self.varying_vars.iter().any(|v| v == root)
            }
            _ => false,
        }
    }

    fn define(&mut self, directive: &'a MacroDirectiveAst) {
        if directive.kind == DirectiveKind::Define {
            self.macros
                .entry(directive.name.clone())
                .or_default()
                .push(directive);
        }
    }
}

impl<'a> CompilationContext<'a> {
    /// The struct the vertex entry returns, if it returns one.
    fn varying_struct(&self) -> Option<&'a StructAst> {
        let entry = self.global_function(self.vert_entry?.name)?;
        let ty = &entry.return_type.content;
        if !ty.is_custom {
            return None;
        }
        self.global_struct(&ty.name)
    }

    /// Serialize the program of one stage starting from its entry function.
    pub(crate) fn compile_stage(&mut self, stage: Stage, slot: EntrySlot<'a>) -> String {
        let Some(entry) = self.global_function(slot.name) else {
            self.report(Diagnostic::error(
                DiagnosticKind::UnknownEntry {
                    stage,
                    name: slot.name.to_string(),
                },
                slot.span,
            ));
            return String::new();
        };
        debug!("serializing {} stage from '{}'", stage.name(), slot.name);

        let mut state = StageState::new(stage);
        for global in &self.directives {
            state.define(global.directive);
        }
        state.mark_emitted(slot.name);

        let varying = self.varying_struct();
        let returns_varying = stage == Stage::Vertex && varying.is_some();
        if returns_varying {
            state.varyings.structure = varying;
        }

        let mut args = Vec::new();
        for (position, arg) in entry.args.iter().enumerate() {
            let ty = &arg.content.ty.content;
            let is_varying_type = varying.is_some_and(|v| v.name == ty.name);
            if stage == Stage::Vertex && position == 0 && ty.is_custom && !is_varying_type {
                if let Some(attributes) = self.global_struct(&ty.name) {
                    state.attributes.structure = Some(attributes);
                    state.attribute_vars.push(arg.content.name.clone());
                    continue;
                }
            }
            if stage == Stage::Fragment && is_varying_type {
                state.varyings.structure = varying;
                state.varying_vars.push(arg.content.name.clone());
                continue;
            }
            args.push(arg);
        }

        self.push_frame(&entry.name);
        let args: Vec<String> = args
            .into_iter()
            .map(|arg| self.fn_arg(&arg.content, &mut state))
            .collect();
        let return_type = if returns_varying {
            "void".to_string()
        } else {
            self.type_name(&entry.return_type, &mut state)
        };
        state.in_entry = true;
        let body = self.entry_body(&entry.body.content.items, &mut state);
        state.in_entry = false;
        self.pop_frame();

        let entry_text = format!(
            "{}{} {}({}) {{\n{}}}\n",
            precision_prefix(entry.precision),
            return_type,
            entry.name,
            args.join(", "),
            body
        );

        let attributes = self.attrib_text(&mut state);
        let varyings = self.varying_text(&mut state);

        let mut out = String::new();
        if stage == Stage::Fragment {
            if let Some(header) = &self.config.precision_header {
                out.push_str(header);
                out.push('\n');
            }
        }
        for global in &self.directives {
            out.push_str(&global.guard.wrap(&directive_line(global.directive)));
        }
        out.push_str(&state.globals);
        out.push_str(&attributes);
        out.push_str(&varyings);
        out.push_str(&entry_text);
        out
    }

    /// Entry body; a trailing `return <varying>;` disappears entirely.
    fn entry_body(
        &mut self,
        items: &'a [AstNode<FnBodyItem>],
        state: &mut StageState<'a>,
    ) -> String {
        let mut out = String::new();
        for (position, item) in items.iter().enumerate() {
            if position + 1 == items.len() {
                if let FnBodyItem::Statement(StatementAst::Return(Some(value))) = &item.content {
                    if state.is_varying_var(&value.content) {
                        continue;
                    }
                }
            }
            out.push_str(&self.body_item(item, 1, state));
        }
        out
    }

    /// `attribute` lines for the attribute-struct fields the entry read.
    pub(crate) fn attrib_text(&mut self, state: &mut StageState<'a>) -> String {
        let table = std::mem::take(&mut state.attributes);
        self.interface_block(&table, "attribute", state)
    }

    pub(crate) fn varying_text(&mut self, state: &mut StageState<'a>) -> String {
        let table = std::mem::take(&mut state.varyings);
        self.interface_block(&table, "varying", state)
    }

    fn interface_block(
        &mut self,
        table: &FieldTable<'a>,
        qualifier: &str,
        state: &mut StageState<'a>,
    ) -> String {
        let Some(structure) = table.structure else {
            return String::new();
        };
        let mut out = String::new();
        for field in &structure.fields {
            if table.referenced.contains(&field.content.name) {
                let decl = self.field_declaration(&field.content, state);
                out.push_str(&format!("{} {};\n", qualifier, decl));
            }
        }
        out
    }

    pub(crate) fn serialize_global(
        &mut self,
        symbol: &GlobalSymbol<'a>,
        state: &mut StageState<'a>,
    ) -> String {
        match symbol.decl {
            GlobalDecl::Struct(structure) => self.struct_definition(structure, state),
            GlobalDecl::Variable { decl, declarator } => {
                self.global_variable(decl, declarator, state)
            }
            GlobalDecl::Function(function) => self.function_definition(function, 0, state),
        }
    }

    fn struct_definition(
        &mut self,
        structure: &'a StructAst,
        state: &mut StageState<'a>,
    ) -> String {
        let mut out = format!("struct {} {{\n", structure.name);
        for field in &structure.fields {
            let decl = self.field_declaration(&field.content, state);
            out.push_str(&format!("{}{};\n", INDENT, decl));
        }
        out.push_str("};\n");
        out
    }

    fn field_declaration(
        &mut self,
        field: &'a StructFieldAst,
        state: &mut StageState<'a>,
    ) -> String {
        let ty = self.type_name(&field.ty, state);
        let array = self.array_suffix(field.array_size.as_ref(), state);
        format!("{}{} {}{}", precision_prefix(field.precision), ty, field.name, array)
    }

    /// `const` globals keep their initializer, uninitialized globals become
    /// uniforms, anything else stays a plain global.
    fn global_variable(
        &mut self,
        decl: &'a VariableDeclarationAst,
        declarator: &'a DeclaratorAst,
        state: &mut StageState<'a>,
    ) -> String {
        let ty = self.type_name(&decl.ty, state);
        let array = self.array_suffix(declarator.array_size.as_ref(), state);
        let init = declarator
            .init
            .as_ref()
            .map(|value| format!(" = {}", self.expression(value, state)));
        let qualifier = match (decl.is_const, &init) {
            (true, _) => "const ",
            (false, None) => "uniform ",
            (false, Some(_)) => "",
        };
        format!(
            "{}{}{} {}{}{};\n",
            qualifier,
            precision_prefix(decl.precision),
            ty,
            declarator.name,
            array,
            init.unwrap_or_default()
        )
    }

    fn function_definition(
        &mut self,
        function: &'a FnAst,
        depth: usize,
        state: &mut StageState<'a>,
    ) -> String {
        self.push_frame(&function.name);
        let args: Vec<String> = function
            .args
            .iter()
            .map(|arg| self.fn_arg(&arg.content, state))
            .collect();
        let return_type = self.type_name(&function.return_type, state);
        let body = self.body_items(&function.body.content.items, depth + 1, state);
        self.pop_frame();
        let ind = indent(depth);
        format!(
            "{}{}{} {}({}) {{\n{}{}}}\n",
            ind,
            precision_prefix(function.precision),
            return_type,
            function.name,
            args.join(", "),
            body,
            ind
        )
    }

    /// Render a parameter and declare it in the current frame.
    fn fn_arg(&mut self, arg: &'a FnArgAst, state: &mut StageState<'a>) -> String {
        let ty = self.type_name(&arg.ty, state);
        let array = self.array_suffix(arg.array_size.as_ref(), state);
        self.declare_local(&arg.name);
        let mut out = String::new();
        if arg.is_const {
            out.push_str("const ");
        }
        if let Some(decorator) = arg.decorator {
            out.push_str(decorator.as_str());
            out.push(' ');
        }
        out.push_str(&format!("{}{} {}{}", precision_prefix(arg.precision), ty, arg.name, array));
        out
    }

    fn type_name(&mut self, ty: &'a AstNode<TypeAst>, state: &mut StageState<'a>) -> String {
        if ty.content.is_custom {
            self.resolve_name(&ty.content.name, ty.span, state);
        }
        ty.content.name.clone()
    }

    fn array_suffix(
        &mut self,
        size: Option<&'a AstNode<ExprAst>>,
        state: &mut StageState<'a>,
    ) -> String {
        match size {
            Some(size) => format!("[{}]", self.expression(size, state)),
            None => String::new(),
        }
    }

    fn body_items(
        &mut self,
        items: &'a [AstNode<FnBodyItem>],
        depth: usize,
        state: &mut StageState<'a>,
    ) -> String {
        items.iter().map(|item| self.body_item(item, depth, state)).collect()
    }

    fn body_item(
        &mut self,
        item: &'a AstNode<FnBodyItem>,
        depth: usize,
        state: &mut StageState<'a>,
    ) -> String {
        match &item.content {
            FnBodyItem::Statement(statement) => self.statement(statement, depth, state),
            FnBodyItem::Directive(directive) => {
                state.define(directive);
                directive_line(directive)
            }
            FnBodyItem::Condition(condition) => {
                // directives stay at column zero
                let mut out = format!("{} {}\n", condition.kind.directive(), condition.condition);
                out.push_str(&self.body_items(&condition.body, depth, state));
                for branch in &condition.elif_branches {
                    out.push_str(&format!("#elif {}\n", branch.content.condition));
                    out.push_str(&self.body_items(&branch.content.body, depth, state));
                }
                if let Some(else_branch) = &condition.else_branch {
                    out.push_str("#else\n");
                    out.push_str(&self.body_items(&else_branch.content, depth, state));
                }
                out.push_str("#endif\n");
                out
            }
        }
    }

    fn statement(
        &mut self,
        statement: &'a StatementAst,
        depth: usize,
        state: &mut StageState<'a>,
    ) -> String {
        let ind = indent(depth);
        match statement {
            StatementAst::Block(body) => {
                format!("{}{{\n{}{}}}\n", ind, self.body_items(&body.items, depth + 1, state), ind)
            }
            StatementAst::If {
                condition,
                then_branch,
                else_branch,
            } => format!(
                "{}{}",
                ind,
                self.if_statement(condition, then_branch, else_branch.as_deref(), depth, state)
            ),
            StatementAst::For {
                init,
                condition,
                update,
                body,
            } => {
                let init = init
                    .as_deref()
                    .map(|s| self.inline_statement(&s.content, state))
                    .unwrap_or_default();
                let condition = condition
                    .as_ref()
                    .map(|c| format!(" {}", self.expression(c, state)))
                    .unwrap_or_default();
                let update = update
                    .as_deref()
                    .map(|s| format!(" {}", self.inline_statement(&s.content, state)))
                    .unwrap_or_default();
                let body = self.branch(body, depth, state);
                format!("{}for ({};{};{}){}", ind, init, condition, update, body)
            }
            StatementAst::Return(None) => format!("{}return;\n", ind),
            StatementAst::Return(Some(value)) => {
                if state.is_varying_var(&value.content) {
                    format!("{}return;\n", ind)
                } else {
                    format!("{}return {};\n", ind, self.expression(value, state))
                }
            }
            StatementAst::Jump(kind) => format!("{}{};\n", ind, kind.as_str()),
            StatementAst::Declaration(decl) => {
                if self.declares_varying(decl, state) {
                    return String::new();
                }
                format!("{}{};\n", ind, self.local_declaration(decl, state))
            }
            StatementAst::Function(function) => {
                self.declare_local(&function.name);
                self.function_definition(function, depth, state)
            }
            StatementAst::Assignment { .. } | StatementAst::Expression(_) => {
                format!("{}{};\n", ind, self.inline_statement(statement, state))
            }
        }
    }

    /// `if (...)` and its branches, without leading indentation.
    fn if_statement(
        &mut self,
        condition: &'a AstNode<ExprAst>,
        then_branch: &'a AstNode<StatementAst>,
        else_branch: Option<&'a AstNode<StatementAst>>,
        depth: usize,
        state: &mut StageState<'a>,
    ) -> String {
        let mut out = format!("if ({})", self.expression(condition, state));
        out.push_str(&self.branch(then_branch, depth, state));
        let Some(else_branch) = else_branch else {
            return out;
        };
        if matches!(then_branch.content, StatementAst::Block(_)) {
            out.pop();
            out.push(' ');
        } else {
            out.push_str(&indent(depth));
        }
        match &else_branch.content {
            StatementAst::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push_str("else ");
                let nested = else_branch.as_deref();
                out.push_str(&self.if_statement(condition, then_branch, nested, depth, state));
            }
            _ => {
                out.push_str("else");
                out.push_str(&self.branch(else_branch, depth, state));
            }
        }
        out
    }

    /// Body of an `if`/`else`/`for`: a braced block on the same line, or a
    /// single statement indented on the next.
    fn branch(
        &mut self,
        statement: &'a AstNode<StatementAst>,
        depth: usize,
        state: &mut StageState<'a>,
    ) -> String {
        match &statement.content {
            StatementAst::Block(body) => format!(
                " {{\n{}{}}}\n",
                self.body_items(&body.items, depth + 1, state),
                indent(depth)
            ),
            other => format!("\n{}", self.statement(other, depth + 1, state)),
        }
    }

    /// Statement text with no indentation or terminator, as used inside
    /// `for (...)`.
    fn inline_statement(
        &mut self,
        statement: &'a StatementAst,
        state: &mut StageState<'a>,
    ) -> String {
        match statement {
            StatementAst::Declaration(decl) => self.local_declaration(decl, state),
            StatementAst::Assignment { target, op, value } => {
                let target = self.expression(target, state);
                match value {
                    Some(value) => {
                        format!("{} {} {}", target, op.as_str(), self.expression(value, state))
                    }
                    None if op.is_prefix() => format!("{}{}", op.as_str(), target),
                    None => format!("{}{}", target, op.as_str()),
                }
            }
            StatementAst::Expression(expr) => self.expression(expr, state),
            other => {
                let text = self.statement(other, 0, state);
                text.trim_end().trim_end_matches(';').to_string()
            }
        }
    }

    /// `V o;` inside the vertex entry, where `V` is the varying struct,
    /// declares protocol variables instead of a local.
    fn declares_varying(
        &self,
        decl: &'a VariableDeclarationAst,
        state: &mut StageState<'a>,
    ) -> bool {
        let is_varying = state.in_entry
            && state.stage == Stage::Vertex
            && state.varyings.structure.is_some_and(|v| v.name == decl.ty.content.name)
            && decl.declarators.iter().all(|d| d.content.init.is_none());
        if is_varying {
            for declarator in &decl.declarators {
                state.varying_vars.push(declarator.content.name.clone());
            }
        }
        is_varying
    }

    /// Each name is declared after its initializer is serialized, so
    /// `float x = x;` still reads the outer `x`.
    fn local_declaration(
        &mut self,
        decl: &'a VariableDeclarationAst,
        state: &mut StageState<'a>,
    ) -> String {
        let ty = self.type_name(&decl.ty, state);
        let mut declarators = Vec::new();
        for declarator in &decl.declarators {
            let declarator = &declarator.content;
            let mut text = declarator.name.clone();
            text.push_str(&self.array_suffix(declarator.array_size.as_ref(), state));
            if let Some(init) = &declarator.init {
                text.push_str(" = ");
                text.push_str(&self.expression(init, state));
            }
            self.declare_local(&declarator.name);
            declarators.push(text);
        }
        let qualifier = if decl.is_const { "const " } else { "" };
        format!(
            "{}{}{} {}",
            qualifier,
            precision_prefix(decl.precision),
            ty,
            declarators.join(", ")
        )
    }

    pub(crate) fn expression(
        &mut self,
        expr: &'a AstNode<ExprAst>,
        state: &mut StageState<'a>,
    ) -> String {
        match &expr.content {
            ExprAst::Ternary {
                condition,
                then_expr,
                else_expr,
            } => format!(
                "{} ? {} : {}",
                self.expression(condition, state),
                self.expression(then_expr, state),
                self.expression(else_expr, state)
            ),
            ExprAst::Chain { operators, operands } => {
                let mut operands = operands.iter();
                let mut out = operands
                    .next()
                    .map(|first| self.expression(first, state))
                    .unwrap_or_default();
                for (op, operand) in operators.iter().zip(operands) {
                    out.push_str(&format!(" {} {}", op.as_str(), self.expression(operand, state)));
                }
                out
            }
            ExprAst::Unary { op, operand } => {
                let operand = self.expression(operand, state);
                // `- -a` must not fuse into a decrement
                let fuses = matches!(op, UnaryOp::Neg | UnaryOp::Plus)
                    && operand.starts_with(op.as_str());
                let gap = if fuses { " " } else { "" };
                format!("{}{}{}", op.as_str(), gap, operand)
            }
            ExprAst::Number(text) => text.clone(),
            ExprAst::Bool(value) => value.to_string(),
            ExprAst::Call {
                callee,
                args,
                accessors,
            } => {
                if !is_builtin(callee) {
                    self.resolve_name(callee, expr.span, state);
                }
                let args: Vec<String> =
                    args.iter().map(|arg| self.expression(arg, state)).collect();
                let accessors = self.accessors(accessors, state);
                format!("{}({}){}", callee, args.join(", "), accessors)
            }
            ExprAst::Variable { root, accessors } => {
                self.variable(root, accessors, expr.span, state)
            }
            ExprAst::Paren { inner, accessors } => {
                let inner = self.expression(inner, state);
                format!("({}){}", inner, self.accessors(accessors, state))
            }
        }
    }

    /// `attr.pos` on a protocol variable becomes the interface variable
    /// `pos`; anything else resolves normally. A protocol variable has no
    /// value of its own once its fields are split out, so any other use of
    /// it is an error.
    fn variable(
        &mut self,
        root: &str,
        accessors: &'a [AstNode<Accessor>],
        span: Span,
        state: &mut StageState<'a>,
    ) -> String {
        if let Some((first, rest)) = accessors.split_first() {
            if let Accessor::Member(field) = &first.content {
                if let Some(table) = state.protocol_table(root) {
                    table.referenced.insert(field.clone());
                    return format!("{}{}", field, self.accessors(rest, state));
                }
            }
        }
        if state.protocol_table(root).is_some() {
            if state.warned.insert(root.to_string()) {
                self.report(Diagnostic::error(
                    DiagnosticKind::InterfaceValue {
                        stage: state.stage,
                        name: root.to_string(),
                    },
                    span,
                ));
            }
        } else {
            self.resolve_name(root, span, state);
        }
        format!("{}{}", root, self.accessors(accessors, state))
    }

    fn accessors(
        &mut self,
        accessors: &'a [AstNode<Accessor>],
        state: &mut StageState<'a>,
    ) -> String {
        let mut out = String::new();
        for accessor in accessors {
            match &accessor.content {
                Accessor::Member(name) => {
                    out.push('.');
                    out.push_str(name);
                }
                Accessor::Index(index) => {
                    out.push('[');
                    out.push_str(&self.expression(index, state));
                    out.push(']');
                }
            }
        }
        out
    }

    /// Resolve an identifier: local, then global (emitting it), then
    /// built-in or macro. Anything else is reported once per stage.
    fn resolve_name(&mut self, name: &str, span: Span, state: &mut StageState<'a>) {
        if self.find_local(name) || self.reference_global(name, state) || is_builtin(name) {
            return;
        }
        if let Some(directives) = state.macros.get(name) {
            self.expand_macro(name, directives.clone(), span, state);
            return;
        }
        if self.config.report_undeclared && state.warned.insert(name.to_string()) {
            self.report(Diagnostic::warning(
                DiagnosticKind::UndeclaredIdentifier { name: name.to_string() },
                span,
            ));
        }
    }

    /// A macro use resolves the names its replacement text mentions, at the
    /// use site. A macro is not expanded again inside its own expansion.
    fn expand_macro(
        &mut self,
        name: &str,
        directives: Vec<&'a MacroDirectiveAst>,
        span: Span,
        state: &mut StageState<'a>,
    ) {
        if !state.expanding.insert(name.to_string()) {
            return;
        }
        for directive in directives {
            for reference in macro_references(directive) {
                self.resolve_name(&reference, span, state);
            }
        }
        state.expanding.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::parse_shader;
    use crate::compiler::diagnostics::Severity;
    use crate::compiler::{compile_ast, CompiledPass, PassEntry};
    use crate::config::CompilerConfig;

    fn compile_pass_source(items: &str, config: &CompilerConfig) -> (CompiledPass, Vec<Severity>) {
        let source = format!(r#"Shader "S" {{ SubShader "D" {{ Pass "P" {{ {items} }} }} }}"#);
        let ast = parse_shader(&source).unwrap();
        let mut compiled = compile_ast(&ast.content, config);
        let severities = compiled.diagnostics.iter().map(|d| d.severity).collect();
        match compiled.sub_shaders.remove(0).passes.remove(0) {
            PassEntry::Pass(pass) => (pass, severities),
            PassEntry::UsePass(_) => panic!("expected pass"),
        }
    }

    fn no_header() -> CompilerConfig {
        CompilerConfig::default().with_precision_header(None::<String>)
    }

    #[test]
    fn test_attribute_and_varying_protocol() {
        let (pass, severities) = compile_pass_source(
            "struct Attr { vec3 pos; vec2 uv; vec3 unused; }
             struct V { vec2 a; vec2 b; vec2 c; }
             V vert(Attr attr) {
                 V o;
                 o.a = attr.uv;
                 o.b = attr.uv;
                 o.c = attr.uv;
                 gl_Position = vec4(attr.pos, 1.0);
                 return o;
             }
             vec4 frag(V v) { return vec4(v.b, 0.0, 1.0); }
             VertexShader = vert;
             FragmentShader = frag;",
            &no_header(),
        );
        assert!(severities.is_empty());
        assert_eq!(
            pass.vert,
            "attribute vec3 pos;\nattribute vec2 uv;\n\
             varying vec2 a;\nvarying vec2 b;\nvarying vec2 c;\n\
             void vert() {\n    a = uv;\n    b = uv;\n    c = uv;\n    gl_Position = vec4(pos, 1.0);\n}\n"
        );
        assert_eq!(
            pass.frag,
            "varying vec2 b;\nvec4 frag() {\n    return vec4(b, 0.0, 1.0);\n}\n"
        );
    }

    #[test]
    fn test_dependencies_precede_use() {
        let (pass, _) = compile_pass_source(
            "float scale;
             float helper(float x) { return x * scale; }
             float unused() { return 1.0; }
             vec4 frag() { return vec4(helper(1.0)); }
             FragmentShader = frag;",
            &CompilerConfig::default(),
        );
        assert_eq!(
            pass.frag,
            "precision mediump float;\n\
             uniform float scale;\n\
             float helper(float x) {\n    return x * scale;\n}\n\
             vec4 frag() {\n    return vec4(helper(1.0));\n}\n"
        );
    }

    #[test]
    fn test_local_shadows_global() {
        let (pass, _) = compile_pass_source(
            "float x; void frag() { float x = 1.0; gl_FragColor = vec4(x); } FragmentShader = frag;",
            &no_header(),
        );
        assert!(!pass.frag.contains("uniform float x;"));
        assert!(pass.frag.contains("    float x = 1.0;\n"));
    }

    #[test]
    fn test_undeclared_reported_once() {
        let (pass, severities) = compile_pass_source(
            "void frag() { gl_FragColor = vec4(missing, missing, 0.0, 1.0); } FragmentShader = frag;",
            &no_header(),
        );
        assert_eq!(severities, vec![Severity::Warning]);
        assert!(pass.frag.contains("vec4(missing, missing, 0.0, 1.0)"));

        let quiet = no_header().with_report_undeclared(false);
        let (_, severities) = compile_pass_source(
            "void frag() { gl_FragColor = vec4(missing); } FragmentShader = frag;",
            &quiet,
        );
        assert!(severities.is_empty());
    }

    #[test]
    fn test_if_else_chain_layout() {
        let (pass, _) = compile_pass_source(
            "float a;
             void frag() {
                 if (a > 0.0) { discard; }
                 else if (a < 1.0) gl_FragColor = vec4(1.0);
                 else { gl_FragColor = vec4(0.0); }
             }
             FragmentShader = frag;",
            &no_header(),
        );
        assert_eq!(
            pass.frag,
            "uniform float a;\n\
             void frag() {\n\
             \x20   if (a > 0.0) {\n\
             \x20       discard;\n\
             \x20   } else if (a < 1.0)\n\
             \x20       gl_FragColor = vec4(1.0);\n\
             \x20   else {\n\
             \x20       gl_FragColor = vec4(0.0);\n\
             \x20   }\n\
             }\n"
        );
    }

    #[test]
    fn test_for_loop_layout() {
        let (pass, _) = compile_pass_source(
            "void frag() { float s = 0.0; for (int i = 0; i < 4; i++) { s += 1.0; } gl_FragColor = vec4(s); }
             FragmentShader = frag;",
            &no_header(),
        );
        assert!(pass
            .frag
            .contains("    for (int i = 0; i < 4; i++) {\n        s += 1.0;\n    }\n"));
    }

    #[test]
    fn test_body_macros_stay_at_column_zero() {
        let (pass, severities) = compile_pass_source(
            "void frag() {\n#ifdef FOG\n gl_FragColor = vec4(1.0);\n#else\n gl_FragColor = vec4(0.0);\n#endif\n}\nFragmentShader = frag;",
            &no_header(),
        );
        assert!(severities.is_empty());
        assert!(pass.frag.contains(
            "#ifdef FOG\n    gl_FragColor = vec4(1.0);\n#else\n    gl_FragColor = vec4(0.0);\n#endif\n"
        ));
    }

    #[test]
    fn test_guarded_global_and_defines() {
        let (pass, severities) = compile_pass_source(
            "#define SCALE 2.0\n#ifdef FOG\nfloat fog;\n#endif\nvoid frag() { gl_FragColor = vec4(fog * SCALE); }\nFragmentShader = frag;",
            &no_header(),
        );
        assert!(severities.is_empty());
        assert!(pass
            .frag
            .starts_with("#define SCALE 2.0\n#if defined(FOG)\nuniform float fog;\n#endif\n"));
    }

    #[test]
    fn test_struct_fields_pull_in_constants() {
        let (pass, severities) = compile_pass_source(
            "const int N = 2;
             struct Light { vec3 dir; float power[N]; };
             void frag() { Light l; l.dir = vec3(0.0); gl_FragColor = vec4(l.dir, l.power[0]); }
             FragmentShader = frag;",
            &no_header(),
        );
        assert!(severities.is_empty());
        assert!(pass.frag.contains("    Light l;\n    l.dir = vec3(0.0);\n"));
        assert!(pass.frag.starts_with(
            "const int N = 2;\nstruct Light {\n    vec3 dir;\n    float power[N];\n};\n"
        ));
    }

    #[test]
    fn test_define_body_pulls_in_globals() {
        let (pass, severities) = compile_pass_source(
            "vec4 u_tint;\n\
             #define TINT u_tint\n\
             void frag() {\n    gl_FragColor = TINT;\n}\n\
             FragmentShader = frag;",
            &no_header(),
        );
        assert!(severities.is_empty());
        assert_eq!(
            pass.frag,
            "#define TINT u_tint\n\
             uniform vec4 u_tint;\n\
             void frag() {\n    gl_FragColor = TINT;\n}\n"
        );
    }

    #[test]
    fn test_function_macro_in_body_skips_its_parameters() {
        let (pass, severities) = compile_pass_source(
            "float k;\n\
             float x;\n\
             void frag() {\n\
             #define SCALED(x) ((x) * k)\n\
             gl_FragColor = vec4(SCALED(2.0));\n\
             }\n\
             FragmentShader = frag;",
            &no_header(),
        );
        assert!(severities.is_empty());
        assert!(pass.frag.starts_with("uniform float k;\nvoid frag() {\n"));
        assert!(!pass.frag.contains("uniform float x;"));
        assert!(pass.frag.contains("#define SCALED(x) ((x) * k)\n"));
    }

    #[test]
    fn test_self_referencing_macro_terminates() {
        let (_, severities) = compile_pass_source(
            "#define LOOP LOOP + 1.0\nvoid frag() { gl_FragColor = vec4(LOOP); }\nFragmentShader = frag;",
            &no_header(),
        );
        assert!(severities.is_empty());
    }

    #[test]
    fn test_whole_attribute_value_is_an_error() {
        let (pass, severities) = compile_pass_source(
            "struct Attr { vec3 pos; }
             vec4 toClip(Attr a) { return vec4(a.pos, 1.0); }
             void vert(Attr attr) { gl_Position = toClip(attr); }
             VertexShader = vert;",
            &no_header(),
        );
        assert_eq!(severities, vec![Severity::Error]);
        assert!(pass.vert.contains("struct Attr {\n    vec3 pos;\n};\n"));
        assert!(pass.vert.contains("vec4 toClip(Attr a) {"));
    }

    #[test]
    fn test_whole_varying_value_is_an_error() {
        let (pass, severities) = compile_pass_source(
            "struct V { vec2 uv; }
             V vert() { V o; o.uv = vec2(0.0); gl_Position = vec4(0.0); return o; }
             vec4 shade(V v) { return vec4(v.uv, 0.0, 1.0); }
             void frag(V v) { gl_FragColor = shade(v); gl_FragColor += shade(v); }
             VertexShader = vert;
             FragmentShader = frag;",
            &no_header(),
        );
        assert_eq!(severities, vec![Severity::Error]);
        assert!(pass.frag.contains("struct V {\n    vec2 uv;\n};\n"));
        assert!(!pass.vert.contains("struct V"));
    }

    #[test]
    fn test_nested_signs_stay_separate() {
        let (pass, _) = compile_pass_source(
            "float a; void frag() { gl_FragColor = vec4(- -a, -(-a), + +a, float(!!true)); }
             FragmentShader = frag;",
            &no_header(),
        );
        assert!(pass.frag.contains("vec4(- -a, -(-a), + +a, float(!!true))"));
    }
}
