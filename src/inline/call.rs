//! Call sites.
//!
//! Arguments are substituted for parameters where that keeps evaluation
//! order and effects intact; the rest are bound first with `var p = arg`.
//! The body's shape then picks a strategy:
//!
//! - `{ return e }` becomes the expression `e`;
//! - an empty body becomes nothing (or the arguments' effects);
//! - any other body is spliced in place of a call statement.
//!
//! When nothing fits, the call becomes a call of a function literal
//! holding the body, which is always correct but rarely pretty.

use gofix_syntax::ast::{AssignOp, BinaryOp, Decl, Expr, ExprId, ForKind, SimpleStmt, Span, Spec, Stmt, StmtId};
use gofix_syntax::{FuncRef, NodeRef};
use gofix_types::{BasicKind, TyId, Type};
use tracing::trace;

use super::{Rewrite, Site, reindent};
use crate::callee::{Callee, Hole, HoleKind, ParamKind, ResultExpr, Shape, TextRange, TypeText};
use crate::edit::TextEdit;
use crate::error::InlineError;
use crate::expr::{
    Class, PREC_PRIMARY, PREC_UNARY, classify, conversion, is_effect, mentioned_names, parenthesize, precedence,
    required_precedence, struct_fields,
};
use crate::imports::ImportManager;
use crate::refactor::delete_stmt;

/// How the call names its callee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CallForm {
    /// `F(x)` or `pkg.F(x)`.
    Func,
    /// `recv.M(x)`; `path` walks embedded fields from `recv` to the
    /// method's receiver.
    Method { recv: ExprId, path: Vec<u32> },
    /// `T.M(recv, x)`.
    MethodExpr,
}

/// Where the call stands.
#[derive(Debug)]
enum Context {
    /// An expression statement.
    Stmt(StmtId),
    /// `return f(x)`.
    Return(StmtId),
    /// A multi-value call whose results flow into slots of these types,
    /// where known.
    Multi(Vec<Option<TyId>>),
    /// `go`, `defer`, or a statement in a header.
    Literal,
    Expr,
}

/// One argument, ready for substitution.
#[derive(Debug, Clone)]
struct Arg {
    text: String,
    prec: u8,
    /// A receiver before `&` or `*` was applied, for selector operands.
    plain: Option<(String, u8)>,
    class: Class,
    /// Canonical default type.
    key: Option<String>,
    nil: bool,
    composite: bool,
    names: Vec<String>,
    spans: Vec<Span>,
    exprs: Vec<ExprId>,
    /// A conversion to the parameter's type may be needed.
    convertible: bool,
}

struct Plan {
    span: Span,
    edits: Vec<TextEdit>,
}

struct Inliner<'s, 'a> {
    site: &'s Site<'a>,
    callee: &'s Callee,
    call: ExprId,
    call_span: Span,
    form: &'s CallForm,
    imports: ImportManager<'a>,
    free: Vec<String>,
    args: Vec<Arg>,
    bind: Vec<bool>,
    subst: Vec<(String, u8)>,
    /// Source ranges the replacement no longer contains.
    dropped: Vec<Span>,
    head: Span,
}

/// Rewrites the call expression `call` of `callee`.
pub(crate) fn inline_call(
    site: &Site<'_>,
    call: ExprId,
    callee: &Callee,
    form: &CallForm,
) -> Result<Rewrite, InlineError> {
    let display = callee.display();
    if callee.generic {
        return Err(InlineError::Generic(display));
    }
    if callee.effects.recover {
        return Err(InlineError::Recover(display));
    }
    if callee.pkg_path != site.here()
        && let Some(name) = callee.unexported.first()
    {
        return Err(InlineError::Unexported {
            callee: display,
            name: name.clone(),
        });
    }
    let (prog, fid) = (site.prog, site.fid);
    let arena = &site.file.arena;
    let Expr::Call {
        func,
        l_paren,
        args,
        ellipsis,
        r_paren,
    } = arena.exprs[call]
    else {
        return Err(InlineError::Unsupported("not a call"));
    };
    let args = arena.exprs_list(args);
    let spread = args.len() == 1
        && prog
            .info
            .type_of(fid, args[0])
            .is_some_and(|t| matches!(prog.types.get(t), Type::Tuple(_)));
    if spread && *form != CallForm::Func {
        return Err(InlineError::SpreadMethodCall);
    }

    let call_span = arena.exprs.span(call);
    let func_span = arena.exprs.span(func);
    let head = match form {
        CallForm::Method { recv, .. } => Span {
            start: arena.exprs.span(*recv).end,
            end: func_span.end,
        },
        _ => func_span,
    };
    let mut inl = Inliner {
        site,
        callee,
        call,
        call_span,
        form,
        imports: ImportManager::new(prog, site.imports, call_span.start),
        free: Vec::new(),
        args: Vec::new(),
        bind: Vec::new(),
        subst: Vec::new(),
        dropped: Vec::new(),
        head,
    };
    inl.reset()?;

    let ctx = inl.context();
    trace!(callee = %callee.name, ?ctx, spread, "call site");
    let plan = match ctx {
        Context::Literal => None,
        _ if spread => None,
        _ => {
            inl.prepare(args, ellipsis.is_some())?;
            inl.strategy(&ctx)?
        }
    };
    let plan = match plan {
        Some(p) => p,
        None => {
            inl.reset()?;
            inl.literalize(l_paren, r_paren)?
        }
    };
    Ok(inl.finish(plan))
}

impl<'a> Inliner<'_, 'a> {
    /// Starts the rewrite's imports over, so an abandoned strategy leaves
    /// nothing behind.
    fn reset(&mut self) -> Result<(), InlineError> {
        let site = self.site;
        let callee = self.callee;
        let mut imports = ImportManager::new(site.prog, site.imports, self.call_span.start);
        imports.forbid(callee.locals.iter().cloned());
        imports.forbid(callee.params.iter().filter(|p| p.is_named()).map(|p| p.name.clone()));
        self.free = callee
            .free
            .iter()
            .map(|f| site.free_text(f, &mut imports, self.call_span.start))
            .collect::<Result<_, _>>()?;
        self.imports = imports;
        self.dropped = vec![self.head];
        Ok(())
    }

    fn finish(mut self, plan: Plan) -> Rewrite {
        for span in std::mem::take(&mut self.dropped) {
            self.imports.replace(span);
        }
        let (mut edits, commit) = self.imports.finish();
        edits.extend(plan.edits);
        Rewrite {
            span: plan.span,
            edits,
            commit,
        }
    }

    fn context(&self) -> Context {
        let site = self.site;
        let (arena, insp) = (&site.file.arena, &site.file.inspector);
        match insp.parent(NodeRef::Expr(self.call)) {
            Some(NodeRef::Stmt(st)) => match arena.stmts[st] {
                Stmt::Go { .. } | Stmt::Defer { .. } => Context::Literal,
                Stmt::Return { results, .. } if arena.exprs_list(results) == [self.call] => Context::Return(st),
                _ => self.value_context(),
            },
            Some(NodeRef::Simple(ss)) if matches!(arena.simple_stmts[ss], SimpleStmt::Expr(_)) => {
                match insp.parent(NodeRef::Simple(ss)) {
                    Some(NodeRef::Stmt(st)) if arena.stmts[st] == Stmt::Simple(ss) => Context::Stmt(st),
                    _ => Context::Literal,
                }
            }
            _ => self.value_context(),
        }
    }

    fn value_context(&self) -> Context {
        if self.callee.results.len() > 1
            && let Some(slots) = result_slots(self.site, self.call)
        {
            return Context::Multi(slots);
        }
        Context::Expr
    }

    fn prepare(&mut self, args: &[ExprId], ellipsis: bool) -> Result<(), InlineError> {
        let callee = self.callee;
        let mut out = Vec::with_capacity(callee.params.len());
        let mut rest = args.iter();
        match self.form {
            CallForm::Method { recv, path } => out.push(self.receiver(*recv, path)?),
            CallForm::MethodExpr => {
                let &first = rest
                    .next()
                    .ok_or(InlineError::Unsupported("method expression call without receiver"))?;
                out.push(Arg {
                    convertible: false,
                    ..self.arg(first)
                });
            }
            CallForm::Func => {}
        }
        for p in &callee.params[out.len().min(callee.params.len())..] {
            let a = match &p.kind {
                ParamKind::Variadic { elem } if !ellipsis => {
                    let extra: Vec<ExprId> = rest.by_ref().copied().collect();
                    self.pack(elem, &extra)?
                }
                _ => {
                    let &e = rest.next().ok_or(InlineError::Unsupported("argument count mismatch"))?;
                    self.arg(e)
                }
            };
            out.push(a);
        }
        if rest.next().is_some() || out.len() != callee.params.len() {
            return Err(InlineError::Unsupported("argument count mismatch"));
        }
        self.args = out;
        self.bind = self.bindings();
        self.subst = self.substitutions()?;
        Ok(())
    }

    fn arg(&self, e: ExprId) -> Arg {
        let site = self.site;
        let (prog, fid) = (site.prog, site.fid);
        let arena = &site.file.arena;
        let span = arena.exprs.span(e);
        let ty = prog.info.type_of(fid, e);
        Arg {
            text: site.text(span).to_string(),
            prec: precedence(arena, e),
            plain: None,
            class: classify(prog, fid, e),
            key: ty.map(|t| prog.canonical_type_string(prog.types.default_type(t))),
            nil: ty.is_some_and(|t| prog.types.basic_kind(t) == Some(BasicKind::UntypedNil)),
            composite: matches!(arena.exprs[arena.unparen(e)], Expr::CompositeLit { .. }),
            names: mentioned_names(arena, &site.file.inspector, e)
                .into_iter()
                .map(|s| prog.interner.resolve(s).to_string())
                .collect(),
            spans: vec![span],
            exprs: vec![e],
            convertible: true,
        }
    }

    /// The receiver operand, with embedded fields spelled out and `&` or
    /// `*` applied to match the method's receiver.
    fn receiver(&self, recv: ExprId, path: &[u32]) -> Result<Arg, InlineError> {
        let site = self.site;
        let (prog, fid) = (site.prog, site.fid);
        let arena = &site.file.arena;
        let base = self.arg(recv);
        let mut plain = base.text.clone();
        let mut prec = base.prec;
        let mut ty = prog
            .info
            .type_of(fid, recv)
            .ok_or(InlineError::Unsupported("receiver type unknown"))?;
        for &i in path {
            let &field = struct_fields(prog, ty)
                .and_then(|fields| fields.get(i as usize))
                .ok_or(InlineError::Unsupported("embedded field path"))?;
            plain = format!("{}.{}", parenthesize(&plain, prec, PREC_PRIMARY), prog.obj_name(field));
            prec = PREC_PRIMARY;
            ty = prog.object(field).ty;
        }
        let pointer = matches!(
            self.callee.params.first().map(|p| &p.kind),
            Some(ParamKind::Receiver { pointer: true })
        );
        let ident = path.is_empty() && matches!(arena.exprs[arena.unparen(recv)], Expr::Ident(_));
        let c = base.class;
        let (text, tprec, class) = match (pointer, prog.types.is_pointer(ty)) {
            (true, false) => (
                format!("&{}", parenthesize(&plain, prec, PREC_UNARY)),
                PREC_UNARY,
                Class {
                    reads: c.reads && !ident,
                    constant: false,
                    ..c
                },
            ),
            (false, true) => (
                format!("*{}", parenthesize(&plain, prec, PREC_UNARY)),
                PREC_UNARY,
                Class {
                    reads: true,
                    constant: false,
                    ..c
                },
            ),
            _ => (
                plain.clone(),
                prec,
                Class {
                    reads: c.reads || !path.is_empty(),
                    constant: c.constant && path.is_empty(),
                    ..c
                },
            ),
        };
        Ok(Arg {
            text,
            prec: tprec,
            plain: Some((plain, prec)),
            class,
            convertible: false,
            ..base
        })
    }

    /// The trailing arguments of a variadic call, as one slice.
    fn pack(&mut self, elem: &TypeText, extra: &[ExprId]) -> Result<Arg, InlineError> {
        if extra.is_empty() {
            return Ok(Arg {
                text: "nil".to_string(),
                prec: PREC_PRIMARY,
                plain: None,
                class: Class {
                    pure: true,
                    reads: false,
                    dup: true,
                    constant: true,
                },
                key: None,
                nil: true,
                composite: false,
                names: Vec::new(),
                spans: Vec::new(),
                exprs: Vec::new(),
                convertible: true,
            });
        }
        let ty = elem.render(|path, name| self.imports.prefix(path, name))?;
        let parts: Vec<Arg> = extra.iter().map(|&e| self.arg(e)).collect();
        let texts: Vec<&str> = parts.iter().map(|a| a.text.as_str()).collect();
        Ok(Arg {
            text: format!("[]{ty}{{{}}}", texts.join(", ")),
            prec: PREC_PRIMARY,
            plain: None,
            class: Class {
                pure: parts.iter().all(|a| a.class.pure),
                reads: parts.iter().any(|a| a.class.reads),
                dup: false,
                constant: false,
            },
            key: None,
            nil: false,
            composite: true,
            names: parts.iter().flat_map(|a| a.names.iter().cloned()).collect(),
            spans: parts.iter().flat_map(|a| a.spans.iter().copied()).collect(),
            exprs: extra.to_vec(),
            convertible: false,
        })
    }

    /// Which parameters must be bound rather than substituted.
    fn bindings(&self) -> Vec<bool> {
        let callee = self.callee;
        let params = &callee.params;
        let args = &self.args;
        let mut bind: Vec<bool> = params
            .iter()
            .zip(args)
            .map(|(p, a)| {
                let u = &p.uses;
                let c = a.class;
                p.is_named()
                    && u.refs > 0
                    && (u.assigned
                        || u.addr_taken
                        || (u.refs > 1 && !c.dup)
                        || (!c.pure && (u.conditional || u.effect_before))
                        || (c.reads && !c.constant && u.effect_before)
                        || (u.captured && !c.constant)
                        || a.names.iter().any(|n| callee.locals.contains(n)))
            })
            .collect();

        let n = bind.len();
        let refd = |i: usize| params[i].uses.refs > 0;
        let rank = |i: usize| params[i].uses.first_ref.unwrap_or(u32::MAX);
        // Evaluated ahead of every substituted argument, in call order.
        let early = |bind: &[bool], i: usize| bind[i] || (!refd(i) && !args[i].class.pure);
        // Evaluating `k` before `j` could change what either sees.
        let conflict = |j: usize, k: usize| {
            let (a, b) = (args[j].class, args[k].class);
            (!a.pure && (b.reads || !b.pure)) || (a.reads && !b.pure)
        };
        loop {
            let mut changed = false;
            for j in 0..n {
                if bind[j] || !refd(j) || !params[j].is_named() {
                    continue;
                }
                let reordered = (0..n).any(|k| {
                    if k == j || args[k].class.constant {
                        return false;
                    }
                    if early(&bind, k) {
                        k > j && conflict(j, k)
                    } else if refd(k) {
                        (k < j) != (rank(k) < rank(j)) && conflict(j, k)
                    } else {
                        false
                    }
                });
                if reordered {
                    bind[j] = true;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        bind
    }

    fn needs_bindings(&self) -> bool {
        self.bind.iter().any(|&b| b)
            || self
                .callee
                .params
                .iter()
                .zip(&self.args)
                .any(|(p, a)| p.uses.refs == 0 && !a.class.pure)
    }

    /// Text substituted for each parameter, converted where the argument's
    /// type differs from the parameter's.
    fn substitutions(&mut self) -> Result<Vec<(String, u8)>, InlineError> {
        let callee = self.callee;
        let mut out = Vec::with_capacity(callee.params.len());
        for (i, p) in callee.params.iter().enumerate() {
            let a = &self.args[i];
            let convert = a.convertible
                && !self.bind[i]
                && p.uses.refs > 0
                && !p.uses.implicit_ok
                && (a.nil || a.key.as_ref().is_some_and(|k| *k != p.ty.key));
            if convert {
                let ty = p.ty.render(|path, name| self.imports.prefix(path, name))?;
                out.push((conversion(&ty, &a.text), PREC_PRIMARY));
            } else {
                out.push((a.text.clone(), a.prec));
            }
        }
        Ok(out)
    }

    /// `var p = arg` for each bound parameter and `_ = arg` for each
    /// unreferenced argument with effects, to run before the statement at
    /// `at`. `None` if some binding cannot be written there.
    fn binding_decls(&mut self, at: u32) -> Result<Option<Vec<String>>, InlineError> {
        let callee = self.callee;
        let site = self.site;
        let mut out = Vec::new();
        for (i, p) in callee.params.iter().enumerate() {
            let a = &self.args[i];
            if !self.bind[i] && (p.uses.refs > 0 || a.class.pure) {
                continue;
            }
            if !a.exprs.iter().all(|&e| visible_at(site, e, at)) {
                trace!(param = %p.name, "argument not visible before the statement");
                return Ok(None);
            }
            if !self.bind[i] {
                out.push(format!("_ = {}", a.text));
                continue;
            }
            if !fresh(site, &p.name, at) {
                trace!(param = %p.name, "binding name taken");
                return Ok(None);
            }
            let typed = a.nil || (a.convertible && a.key.as_ref().is_some_and(|k| *k != p.ty.key));
            if typed {
                let text = a.text.clone();
                let ty = p.ty.render(|path, name| self.imports.prefix(path, name))?;
                out.push(format!("var {} {ty} = {text}", p.name));
            } else {
                out.push(format!("var {} = {}", p.name, a.text));
            }
        }
        Ok(Some(out))
    }

    /// Bindings for a replacement of statement `st`, or `None` when they
    /// are needed and cannot be placed.
    fn bindings_before(&mut self, st: Option<StmtId>) -> Result<Option<Vec<String>>, InlineError> {
        if !self.needs_bindings() {
            return Ok(Some(Vec::new()));
        }
        if !self.site.options.allow_binding_decl {
            return Ok(None);
        }
        let Some(at) = binding_stmt(self.site, self.call) else {
            return Ok(None);
        };
        if st.is_some_and(|s| s != at) {
            return Ok(None);
        }
        let start = self.site.file.arena.stmts.span(at).start;
        self.binding_decls(start)
    }

    fn drop_unused_args(&mut self) {
        for (p, a) in self.callee.params.iter().zip(&self.args) {
            if p.uses.refs == 0 && a.class.pure {
                self.dropped.extend(a.spans.iter().copied());
            }
        }
    }

    fn fill(&self, h: &Hole) -> Option<String> {
        match h.kind {
            HoleKind::Free { index } => self.free.get(index as usize).cloned(),
            HoleKind::Param {
                index,
                need,
                selector_base,
                in_header,
            } => {
                let i = index as usize;
                if self.bind.get(i).copied().unwrap_or(true) {
                    return None;
                }
                let a = self.args.get(i)?;
                let (text, prec) = match (&a.plain, selector_base) {
                    (Some((t, p)), true) => (t.as_str(), *p),
                    _ => {
                        let (t, p) = self.subst.get(i)?;
                        (t.as_str(), *p)
                    }
                };
                let mut t = parenthesize(text, prec, need);
                if in_header && a.composite && !t.starts_with('(') {
                    t = format!("({t})");
                }
                Some(t)
            }
        }
    }

    fn render(&self, r: TextRange) -> Result<String, InlineError> {
        self.callee.render(r, |h| Ok(self.fill(h)))
    }

    /// Copies `r` with only the free names re-spelled.
    fn render_free(&self, r: TextRange) -> Result<String, InlineError> {
        self.callee.render(r, |h| {
            Ok(match h.kind {
                HoleKind::Free { index } => self.free.get(index as usize).cloned(),
                HoleKind::Param { .. } => None,
            })
        })
    }

    fn strategy(&mut self, ctx: &Context) -> Result<Option<Plan>, InlineError> {
        let callee = self.callee;
        match (&callee.shape, ctx) {
            (Shape::Empty, Context::Stmt(st)) => self.empty(*st),
            (Shape::Return { exprs, spread }, _) => self.reduce(exprs, *spread, ctx),
            (Shape::Stmts { range, returns: false }, Context::Stmt(st)) if self.spliceable() => {
                self.splice(*range, *st)
            }
            (Shape::Stmts { range, returns: true }, Context::Return(st))
                if self.spliceable() && self.tail_call_ok(*st) =>
            {
                self.splice(*range, *st)
            }
            _ => Ok(None),
        }
    }

    fn spliceable(&self) -> bool {
        let e = &self.callee.effects;
        !e.defer && !e.labels && !e.named_results
    }

    /// `return f(x)` where the caller returns exactly what the callee does.
    fn tail_call_ok(&self, st: StmtId) -> bool {
        let prog = self.site.prog;
        let Some(results) = caller_results(self.site, NodeRef::Stmt(st)) else {
            return false;
        };
        !self.callee.results.is_empty()
            && results.len() == self.callee.results.len()
            && results
                .iter()
                .zip(&self.callee.results)
                .all(|(&t, r)| prog.canonical_type_string(t) == r.ty.key)
    }

    /// A call statement of a function with an empty body.
    fn empty(&mut self, st: StmtId) -> Result<Option<Plan>, InlineError> {
        let site = self.site;
        let effects: Vec<String> = self
            .args
            .iter()
            .filter(|a| !a.class.pure)
            .map(|a| format!("_ = {}", a.text))
            .collect();
        let span = site.file.arena.stmts.span(st);
        if effects.is_empty() {
            let edits = delete_stmt(site.file, NodeRef::Stmt(st))
                .map_err(|_| InlineError::Unsupported("call statement cannot be deleted"))?;
            self.dropped.push(span);
            let span = edits.iter().map(|e| e.span).fold(span, Span::to);
            return Ok(Some(Plan { span, edits }));
        }
        if effects.len() > 1 && !listed(site, st) {
            return Ok(None);
        }
        self.drop_unused_args();
        let text = effects.join(&separator(site, span.start));
        Ok(Some(Plan {
            span,
            edits: vec![TextEdit::replace(span, text)],
        }))
    }

    /// `{ return e1, ..., en }`: the call becomes the expressions.
    fn reduce(&mut self, exprs: &[ResultExpr], spread: bool, ctx: &Context) -> Result<Option<Plan>, InlineError> {
        let site = self.site;
        let callee = self.callee;
        let arena = &site.file.arena;
        match ctx {
            Context::Stmt(st) => {
                let st = *st;
                let Some(mut lines) = self.bindings_before(Some(st))? else {
                    return Ok(None);
                };
                let keep_pure = !lines.is_empty();
                for e in exprs {
                    let t = self.render(e.range)?;
                    if e.call {
                        lines.push(t);
                    } else if !e.pure || keep_pure {
                        lines.push(format!("_ = {t}"));
                    }
                }
                let span = arena.stmts.span(st);
                if lines.is_empty() {
                    let edits = delete_stmt(site.file, NodeRef::Stmt(st))
                        .map_err(|_| InlineError::Unsupported("call statement cannot be deleted"))?;
                    self.dropped.push(span);
                    let span = edits.iter().map(|e| e.span).fold(span, Span::to);
                    return Ok(Some(Plan { span, edits }));
                }
                if lines.len() > 1 && !listed(site, st) {
                    return Ok(None);
                }
                self.drop_unused_args();
                let text = lines.join(&separator(site, span.start));
                Ok(Some(Plan {
                    span,
                    edits: vec![TextEdit::replace(span, text)],
                }))
            }
            Context::Expr | Context::Return(_) if exprs.len() == 1 && !spread && callee.results.len() == 1 => {
                let Some(before) = self.bindings_before(None)? else {
                    return Ok(None);
                };
                let e = &exprs[0];
                let slot = slot_type(site, self.call);
                let (text, prec) = self.result_text(e, 0, slot)?;
                let text = parenthesize(&text, prec, required_precedence(arena, &site.file.inspector, self.call));
                self.drop_unused_args();
                Ok(Some(self.with_bindings(before, text)))
            }
            Context::Multi(_) | Context::Return(_) if callee.results.len() > 1 => {
                let slots: Vec<Option<TyId>> = match ctx {
                    Context::Multi(s) => s.clone(),
                    Context::Return(st) => match caller_results(site, NodeRef::Stmt(*st)) {
                        Some(r) if r.len() == callee.results.len() => r.into_iter().map(Some).collect(),
                        _ => return Ok(None),
                    },
                    _ => return Ok(None),
                };
                let Some(before) = self.bindings_before(None)? else {
                    return Ok(None);
                };
                let parts = if spread {
                    vec![self.render(exprs[0].range)?]
                } else {
                    let mut parts = Vec::with_capacity(exprs.len());
                    for (i, e) in exprs.iter().enumerate() {
                        let slot = slots.get(i).copied().flatten();
                        parts.push(self.result_text(e, i, slot)?.0);
                    }
                    parts
                };
                self.drop_unused_args();
                Ok(Some(self.with_bindings(before, parts.join(", "))))
            }
            _ => Ok(None),
        }
    }

    /// Result expression `e` for result `i`, converted unless the slot it
    /// flows into already has the result's type.
    fn result_text(&mut self, e: &ResultExpr, i: usize, slot: Option<TyId>) -> Result<(String, u8), InlineError> {
        let prog = self.site.prog;
        let text = self.render(e.range)?;
        let Some(result) = self.callee.results.get(i) else {
            return Ok((text, e.prec));
        };
        let same = slot.is_some_and(|t| prog.canonical_type_string(t) == result.ty.key);
        if !e.convert || same {
            return Ok((text, e.prec));
        }
        let ty = result.ty.render(|path, name| self.imports.prefix(path, name))?;
        Ok((conversion(&ty, &text), PREC_PRIMARY))
    }

    /// Replaces the call with `text`, placing `before` ahead of the
    /// enclosing statement.
    fn with_bindings(&self, before: Vec<String>, text: String) -> Plan {
        let site = self.site;
        let mut edits = vec![TextEdit::replace(self.call_span, text)];
        let mut span = self.call_span;
        if !before.is_empty()
            && let Some(st) = binding_stmt(site, self.call)
        {
            let at = site.file.arena.stmts.span(st).start;
            let sep = separator(site, at);
            let mut joined = before.join(&sep);
            joined.push_str(&sep);
            edits.push(TextEdit::insert(at, joined));
            span = span.to(Span::point(at));
        }
        Plan { span, edits }
    }

    /// Replaces call statement `st` with the body's statements.
    fn splice(&mut self, range: TextRange, st: StmtId) -> Result<Option<Plan>, InlineError> {
        let site = self.site;
        if !listed(site, st) {
            return Ok(None);
        }
        let Some(before) = self.bindings_before(Some(st))? else {
            return Ok(None);
        };
        let span = site.file.arena.stmts.span(st);
        let indent = site.indent_at(span.start).to_string();
        let body = self.render(range)?;
        let clash = self.callee.locals.iter().any(|l| !fresh(site, l, span.start));
        let text = if clash {
            let inner = format!("{indent}\t");
            let mut t = String::from("{");
            for b in &before {
                t.push('\n');
                t.push_str(&inner);
                t.push_str(b);
            }
            t.push('\n');
            t.push_str(&inner);
            t.push_str(&reindent(&body, &self.callee.indent, &inner));
            t.push('\n');
            t.push_str(&indent);
            t.push('}');
            t
        } else {
            let mut parts = before;
            parts.push(reindent(&body, &self.callee.indent, &indent));
            parts.join(&separator(site, span.start))
        };
        self.drop_unused_args();
        Ok(Some(Plan {
            span,
            edits: vec![TextEdit::replace(span, text)],
        }))
    }

    /// `func(params) results { body }(args)`.
    fn literalize(&mut self, l_paren: Span, r_paren: Span) -> Result<Plan, InlineError> {
        let site = self.site;
        let callee = self.callee;
        if !site.options.allow_literalization {
            return Err(InlineError::Unsupported("literalization disabled"));
        }
        let mut params = Vec::new();
        if let Some(r) = callee.recv_text {
            let t = self.render_free(r)?;
            let unnamed = callee.params.first().is_some_and(|p| p.name.is_empty());
            params.push(if unnamed {
                format!("_ {}", t.trim())
            } else {
                t.trim().to_string()
            });
        }
        let p = self.render_free(callee.params_text)?;
        if !p.trim().is_empty() {
            params.push(p.trim().to_string());
        }
        let results = match callee.results_text {
            Some(r) => format!(" {}", self.render_free(r)?),
            None => String::new(),
        };
        let indent = site.indent_at(self.call_span.start).to_string();
        let body = reindent(&self.render_free(callee.body)?, "", &indent);

        let mut args = Vec::new();
        if let CallForm::Method { recv, path } = self.form {
            args.push(self.receiver(*recv, path)?.text);
        }
        let written = site.text(Span {
            start: l_paren.end,
            end: r_paren.start,
        });
        let written = written.trim().trim_end_matches(',').trim_end();
        if !written.is_empty() {
            args.push(written.to_string());
        }
        let text = format!("func({}){results} {body}({})", params.join(", "), args.join(", "));
        Ok(Plan {
            span: self.call_span,
            edits: vec![TextEdit::replace(self.call_span, text)],
        })
    }
}

/// Text between statements placed where `pos` stands.
fn separator(site: &Site<'_>, pos: u32) -> String {
    if site.starts_line(pos) {
        format!("\n{}", site.indent_at(pos))
    } else {
        "; ".to_string()
    }
}

/// `name` declared at `pos` would neither shadow nor clash.
fn fresh(site: &Site<'_>, name: &str, pos: u32) -> bool {
    let prog = site.prog;
    if prog.resolve_name(site.fid, name, pos).is_some() {
        return false;
    }
    let scope = prog.innermost_scope(site.fid, pos);
    prog.interner
        .lookup(name)
        .is_none_or(|sym| !prog.scope(scope).names.contains_key(&sym))
}

/// Every name in `e` still means the same thing at `pos`.
fn visible_at(site: &Site<'_>, e: ExprId, pos: u32) -> bool {
    let (prog, fid) = (site.prog, site.fid);
    let file = site.file;
    let arena = &file.arena;
    std::iter::once(NodeRef::Expr(e))
        .chain(file.inspector.descendants(NodeRef::Expr(e)).iter().copied())
        .all(|n| {
            let NodeRef::Expr(id) = n else { return true };
            if !matches!(arena.exprs[id], Expr::Ident(_)) {
                return true;
            }
            let span = arena.exprs.span(id);
            match prog.info.use_of(fid, span.start) {
                Some(obj) => prog.resolve_name(fid, file.text(span), pos) == Some(obj),
                None => true,
            }
        })
}

/// Statement `st` sits in a statement list, where more statements may be
/// put next to it.
fn listed(site: &Site<'_>, st: StmtId) -> bool {
    let file = site.file;
    let arena = &file.arena;
    match file.inspector.parent(NodeRef::Stmt(st)) {
        Some(NodeRef::Func(_) | NodeRef::SwitchClause(_) | NodeRef::CommClause(_)) => true,
        Some(NodeRef::Expr(e)) => matches!(arena.exprs[e], Expr::FuncLit { .. }),
        Some(NodeRef::Stmt(p)) => match arena.stmts[p] {
            Stmt::Block(_) | Stmt::For { .. } => true,
            Stmt::If { else_stmt, .. } => else_stmt != Some(st),
            _ => false,
        },
        _ => false,
    }
}

/// The statement ahead of which the call's arguments can be bound: it
/// must run the call unconditionally, exactly once, and with no effect
/// of its own evaluated first.
fn binding_stmt(site: &Site<'_>, call: ExprId) -> Option<StmtId> {
    let (prog, fid) = (site.prog, site.fid);
    let file = site.file;
    let (arena, insp) = (&file.arena, &file.inspector);
    let call_span = arena.exprs.span(call);
    let mut child = NodeRef::Expr(call);
    for a in insp.ancestors(child) {
        match a {
            NodeRef::Expr(e) => match arena.exprs[e] {
                Expr::FuncLit { .. } => return None,
                Expr::Binary {
                    op: BinaryOp::LAnd | BinaryOp::LOr,
                    right,
                    ..
                } if NodeRef::Expr(right) == child => return None,
                _ => {}
            },
            NodeRef::Stmt(st) => {
                let ok = match arena.stmts[st] {
                    Stmt::Simple(_)
                    | Stmt::Return { .. }
                    | Stmt::Decl(_)
                    | Stmt::If { .. }
                    | Stmt::Switch { .. }
                    | Stmt::TypeSwitch { .. }
                    | Stmt::Go { .. }
                    | Stmt::Defer { .. } => true,
                    Stmt::For {
                        kind: ForKind::Range { expr, .. },
                        ..
                    } => arena.exprs.span(expr).covers(call_span),
                    _ => false,
                };
                if !ok || !listed(site, st) {
                    return None;
                }
                let effect_first = insp.descendants(NodeRef::Stmt(st)).iter().any(|&n| match n {
                    NodeRef::Expr(e) => arena.exprs.span(e).end <= call_span.start && is_effect(prog, fid, e),
                    _ => false,
                });
                return (!effect_first).then_some(st);
            }
            NodeRef::Simple(_) | NodeRef::Decl(_) => {}
            _ => return None,
        }
        child = a;
    }
    None
}

/// Result types of the function enclosing `n`.
fn caller_results(site: &Site<'_>, n: NodeRef) -> Option<Vec<TyId>> {
    let (prog, fid) = (site.prog, site.fid);
    let file = site.file;
    let ty = match file.inspector.enclosing_func(n)? {
        FuncRef::Decl(id) => {
            let obj = prog.info.def(fid, file.arena.funcs[id].name.pos.start)?;
            prog.object(obj).ty
        }
        FuncRef::Lit(e) => prog.info.type_of(fid, e)?,
    };
    let sig = prog.types.signature(ty)?;
    Some(sig.results.iter().map(|&r| prog.object(r).ty).collect())
}

/// Parameter types of the function `func` calls, with a variadic
/// parameter's element type repeated for the extra arguments.
fn param_slots(site: &Site<'_>, func: ExprId, count: usize, ellipsis: bool) -> Option<Vec<TyId>> {
    let prog = site.prog;
    let ty = prog.info.type_of(site.fid, func)?;
    let sig = prog.types.signature(ty)?;
    let mut out: Vec<TyId> = sig.params.iter().map(|&p| prog.object(p).ty).collect();
    if sig.variadic && !ellipsis {
        let last = out.pop()?;
        let elem = match prog.types.get(prog.types.underlying(last)) {
            Type::Slice(e) => *e,
            _ => return None,
        };
        while out.len() < count {
            out.push(elem);
        }
    }
    Some(out)
}

/// Type of the slot a single-valued call flows into, where it is fixed by
/// something other than the call.
fn slot_type(site: &Site<'_>, call: ExprId) -> Option<TyId> {
    let (prog, fid) = (site.prog, site.fid);
    let file = site.file;
    let arena = &file.arena;
    match file.inspector.parent(NodeRef::Expr(call))? {
        NodeRef::Simple(ss) => match arena.simple_stmts[ss] {
            SimpleStmt::Assign {
                lhs,
                op: AssignOp::Assign,
                rhs,
                ..
            } => {
                let (lhs, rhs) = (arena.exprs_list(lhs), arena.exprs_list(rhs));
                let i = rhs.iter().position(|&r| r == call)?;
                (lhs.len() == rhs.len()).then_some(())?;
                prog.info.type_of(fid, lhs[i])
            }
            _ => None,
        },
        NodeRef::Decl(d) => {
            let Decl::Gen(g) = arena.decls[d];
            arena.specs_list(g.specs).iter().find_map(|s| match s {
                Spec::Value(v) if v.typ.is_some() && arena.exprs_list(v.values).contains(&call) => {
                    let name = arena.ident_names(v.names).first()?;
                    Some(prog.object(prog.info.def(fid, name.pos.start)?).ty)
                }
                _ => None,
            })
        }
        NodeRef::Stmt(st) => match arena.stmts[st] {
            Stmt::Return { results, .. } => {
                let results = arena.exprs_list(results);
                let i = results.iter().position(|&r| r == call)?;
                let types = caller_results(site, NodeRef::Stmt(st))?;
                (types.len() == results.len()).then(|| types[i])
            }
            _ => None,
        },
        NodeRef::Expr(outer) => match arena.exprs[outer] {
            Expr::Call {
                func, args, ellipsis, ..
            } if func != call => {
                let args = arena.exprs_list(args);
                let i = args.iter().position(|&a| a == call)?;
                param_slots(site, func, args.len(), ellipsis.is_some())?.get(i).copied()
            }
            _ => None,
        },
        _ => None,
    }
}

/// Slot types for a multi-valued call standing alone on the right of an
/// assignment, in a declaration, or as the sole argument of a call.
fn result_slots(site: &Site<'_>, call: ExprId) -> Option<Vec<Option<TyId>>> {
    let (prog, fid) = (site.prog, site.fid);
    let file = site.file;
    let arena = &file.arena;
    match file.inspector.parent(NodeRef::Expr(call))? {
        NodeRef::Simple(ss) => match arena.simple_stmts[ss] {
            SimpleStmt::Assign {
                lhs,
                op: AssignOp::Assign,
                rhs,
                ..
            } if arena.exprs_list(rhs) == [call] => Some(
                arena
                    .exprs_list(lhs)
                    .iter()
                    .map(|&l| match arena.exprs[l] {
                        Expr::Ident(_) if file.text(arena.exprs.span(l)) == "_" => None,
                        _ => prog.info.type_of(fid, l),
                    })
                    .collect(),
            ),
            SimpleStmt::ShortVarDecl { names, values, .. } if arena.exprs_list(values) == [call] => {
                Some(vec![None; arena.ident_names(names).len()])
            }
            _ => None,
        },
        NodeRef::Decl(d) => {
            let Decl::Gen(g) = arena.decls[d];
            arena.specs_list(g.specs).iter().find_map(|s| match s {
                Spec::Value(v) if arena.exprs_list(v.values) == [call] => {
                    let names = arena.ident_names(v.names);
                    let ty = v.typ.and_then(|_| {
                        let name = names.first()?;
                        Some(prog.object(prog.info.def(fid, name.pos.start)?).ty)
                    });
                    Some(vec![ty; names.len()])
                }
                _ => None,
            })
        }
        NodeRef::Expr(outer) => match arena.exprs[outer] {
            Expr::Call { func, args, .. } if func != call && arena.exprs_list(args) == [call] => {
                let count = match prog.info.type_of(fid, call).map(|t| prog.types.get(t)) {
                    Some(Type::Tuple(items)) => items.len(),
                    _ => return None,
                };
                let slots = param_slots(site, func, count, false)?;
                (slots.len() == count).then(|| slots.into_iter().map(Some).collect())
            }
            _ => None,
        },
        _ => None,
    }
}
