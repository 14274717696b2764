//! Builds a [`Callee`] from a checked function declaration.

use gofix_syntax::ast::{
    AssignOp, AstArena, BinaryOp, CommStmt, Decl, Expr, ExprId, ForKind, FuncDeclId, GenDeclKind, Key, LiteralValue,
    Element, RangeLhs, SimpleStmt, Span, Spec, Stmt, Type as TypeExpr, UnaryOp,
};
use gofix_syntax::{FuncRef, Inspector, NodeRef};
use gofix_types::program::is_exported;
use gofix_types::{Builtin, FileId, Mode, ObjId, ObjKind, PkgId, Program, SelectionKind, TyId, Type, VarKind};
use rustc_hash::{FxHashMap, FxHashSet};

use super::{
    BodyEffects, Callee, FreeRef, Hole, HoleKind, Param, ParamKind, ParamUses, ResultExpr, ResultVar, Shape, TextRange,
    TypeText,
};
use crate::error::AnalysisError;
use crate::expr::{builtin_of, classify, is_effect, precedence, qualifier, required_precedence};

pub(crate) fn analyze(prog: &Program, fid: FileId, id: FuncDeclId, obj: ObjId) -> Result<Callee, AnalysisError> {
    let file = prog.file(fid);
    let arena = &file.arena;
    let fd = arena.funcs[id];
    let body = fd.body.ok_or(AnalysisError::NoBody)?;
    if fd.recv.is_some_and(|r| generic_receiver(arena, r.typ)) {
        return Err(AnalysisError::GenericMethod);
    }
    let nodes = file.inspector.descendants(NodeRef::Func(id));
    let local_type = nodes.iter().any(|n| match *n {
        NodeRef::Decl(d) => {
            let Decl::Gen(g) = arena.decls[d];
            g.kind == GenDeclKind::Type
        }
        _ => false,
    });
    if local_type {
        return Err(AnalysisError::LocalType);
    }

    let decl = fd.func_pos.to(body.r_brace);
    let content = file.src.get(decl.range()).ok_or(AnalysisError::Source)?.to_string();
    let sig = prog.types.signature(prog.object(obj).ty).cloned().unwrap_or_default();
    let param_objs: Vec<ObjId> = sig.recv.into_iter().chain(sig.params.iter().copied()).collect();
    let result_tys: Vec<TyId> = sig.results.iter().map(|&r| prog.object(r).ty).collect();
    let named_results = sig.results.iter().any(|&r| !matches!(prog.obj_name(r), "" | "_"));

    let mut scan = Scan {
        prog,
        fid,
        arena,
        insp: &file.inspector,
        decl,
        func: id,
        own_sig: fd.sig,
        pkg: prog.object(obj).pkg,
        params: param_objs.iter().enumerate().map(|(i, &o)| (o, i)).collect(),
        param_tys: param_objs.iter().map(|&o| prog.object(o).ty).collect(),
        result_tys: result_tys.clone(),
        named_results,
        uses: vec![
            ParamUses {
                implicit_ok: true,
                ..ParamUses::default()
            };
            param_objs.len()
        ],
        first: vec![None; param_objs.len()],
        holes: Vec::new(),
        free: Vec::new(),
        free_index: FxHashMap::default(),
        handled: FxHashSet::default(),
        effect_ends: Vec::new(),
        locals: FxHashSet::default(),
        unexported: Vec::new(),
        effects: BodyEffects::default(),
    };
    for &n in nodes {
        scan.node(n);
    }

    let base = decl.start;
    let rel = |s: Span| TextRange {
        start: s.start - base,
        end: s.end - base,
    };

    let first_effect = scan.effect_ends.iter().copied().min();
    let mut order: Vec<(u32, usize)> = scan.first.iter().enumerate().filter_map(|(i, f)| f.map(|p| (p, i))).collect();
    order.sort_unstable();
    for (rank, &(pos, i)) in order.iter().enumerate() {
        scan.uses[i].first_ref = Some(rank as u32);
        scan.uses[i].effect_before = first_effect.is_some_and(|end| end <= pos);
    }

    let params: Vec<Param> = param_objs
        .iter()
        .enumerate()
        .map(|(i, &o)| {
            let ty = prog.object(o).ty;
            let kind = if i == 0 && sig.recv.is_some() {
                ParamKind::Receiver {
                    pointer: prog.types.is_pointer(ty),
                }
            } else if sig.variadic && i + 1 == param_objs.len() {
                let elem = match prog.types.get(ty) {
                    Type::Slice(e) => *e,
                    _ => ty,
                };
                ParamKind::Variadic {
                    elem: TypeText::of(prog, elem),
                }
            } else {
                ParamKind::Plain
            };
            Param {
                name: prog.obj_name(o).to_string(),
                ty: TypeText::of(prog, ty),
                kind,
                uses: scan.uses[i].clone(),
            }
        })
        .collect();
    let results = sig
        .results
        .iter()
        .map(|&r| ResultVar {
            name: prog.obj_name(r).to_string(),
            ty: TypeText::of(prog, prog.object(r).ty),
        })
        .collect();

    let all_stmts = arena.stmts_list(body.stmts);
    let mut stmts = all_stmts;
    if sig.results.is_empty()
        && let Some((last, rest)) = stmts.split_last()
        && matches!(arena.stmts[*last], Stmt::Return { results, .. } if results.is_empty())
    {
        stmts = rest;
    }
    let shape = match stmts {
        [] => Shape::Empty,
        [only] => match arena.stmts[*only] {
            Stmt::Return { results, .. } if !results.is_empty() => scan
                .return_shape(arena.exprs_list(results), rel)
                .unwrap_or_else(|| scan.stmts_shape(stmts, rel)),
            _ => scan.stmts_shape(stmts, rel),
        },
        _ => scan.stmts_shape(stmts, rel),
    };

    let indent = match all_stmts.first() {
        Some(&s) => {
            let start = arena.stmts.span(s).start;
            if file.lines.same_line(body.l_brace.start, start) {
                String::new()
            } else {
                file.lines.indentation(&file.src, start).to_string()
            }
        }
        None => String::new(),
    };

    let sig_node = arena.signatures[fd.sig];
    let results_text = sig_node.results.map(|r| match r {
        gofix_syntax::ast::Results::Params(fl) => rel(fl.l_paren.to(fl.r_paren)),
        gofix_syntax::ast::Results::Type(t) => rel(arena.types.span(t)),
    });
    let (pkg_path, pkg_name) = scan
        .pkg
        .map(|p| (prog.package(p).path.clone(), prog.package(p).name.clone()))
        .unwrap_or_default();
    let name = match prog.object(obj).kind {
        ObjKind::Func { recv_base: Some(b) } => format!("{}.{}", prog.obj_name(b), prog.obj_name(obj)),
        _ => prog.obj_name(obj).to_string(),
    };

    let mut holes = scan.holes;
    holes.sort_by_key(|h| h.0.start);
    let mut locals: Vec<String> = scan.locals.into_iter().collect();
    locals.sort();
    let mut unexported = scan.unexported;
    unexported.sort();
    unexported.dedup();

    Ok(Callee {
        name,
        pkg_path,
        pkg_name,
        content,
        body: rel(arena.block_span(&body)),
        recv_text: fd.recv.map(|r| rel(Span::new(r.l_paren.end as usize, r.r_paren.start as usize))),
        params_text: rel(Span::new(
            sig_node.params.l_paren.end as usize,
            sig_node.params.r_paren.start as usize,
        )),
        results_text,
        indent,
        params,
        results,
        generic: fd.type_params.is_some(),
        holes: holes.into_iter().map(|h| Hole { range: rel(h.0), kind: h.1 }).collect(),
        free: scan.free,
        locals,
        unexported,
        shape,
        effects: scan.effects,
    })
}

/// `func (l *List[T]) ...`
fn generic_receiver(arena: &AstArena, mut t: gofix_syntax::ast::TypeId) -> bool {
    loop {
        match arena.types[t] {
            TypeExpr::Pointer { elem, .. } | TypeExpr::Paren { typ: elem } => t = elem,
            TypeExpr::Named { args, .. } => return !args.is_empty(),
            _ => return false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    Addr,
}

struct Scan<'p> {
    prog: &'p Program,
    fid: FileId,
    arena: &'p AstArena,
    insp: &'p Inspector,
    decl: Span,
    func: FuncDeclId,
    own_sig: gofix_syntax::ast::SignatureId,
    pkg: Option<PkgId>,
    params: FxHashMap<ObjId, usize>,
    param_tys: Vec<TyId>,
    result_tys: Vec<TyId>,
    named_results: bool,
    uses: Vec<ParamUses>,
    /// Position of each parameter's first reference.
    first: Vec<Option<u32>>,
    /// Absolute spans, made relative at the end.
    holes: Vec<(Span, HoleKind)>,
    free: Vec<FreeRef>,
    free_index: FxHashMap<ObjId, u16>,
    /// Qualifiers already covered by their selector's hole.
    handled: FxHashSet<ExprId>,
    effect_ends: Vec<u32>,
    locals: FxHashSet<String>,
    unexported: Vec<String>,
    effects: BodyEffects,
}

impl Scan<'_> {
    fn node(&mut self, n: NodeRef) {
        match n {
            NodeRef::Expr(e) => self.expr(e),
            NodeRef::Stmt(s) => self.stmt(s),
            NodeRef::Simple(s) => self.simple(s),
            NodeRef::Type(t) => self.type_ref(t),
            NodeRef::Field(f) => self.field(f),
            _ => {}
        }
    }

    fn use_of(&self, pos: u32) -> Option<ObjId> {
        self.prog.info.use_of(self.fid, pos)
    }

    fn expr(&mut self, e: ExprId) {
        let span = self.arena.exprs.span(e);
        match self.arena.exprs[e] {
            Expr::Ident(_) => {
                if !self.handled.contains(&e)
                    && let Some(obj) = self.use_of(span.start)
                {
                    self.reference(span, obj, Some(e));
                }
            }
            Expr::Selector { expr: base, sel, .. } => {
                if qualifier(self.prog, self.fid, base).is_some() {
                    self.handled.insert(base);
                    if let Some(obj) = self.use_of(sel.pos.start) {
                        self.free_hole(span, obj);
                    }
                } else if let Some(obj) = self.use_of(sel.pos.start) {
                    self.member(obj);
                }
            }
            Expr::CompositeLit { lit, .. } => self.keys(lit),
            Expr::Call { func, .. } => {
                match builtin_of(self.prog, self.fid, func) {
                    Some(Builtin::Recover) => self.effects.recover = true,
                    Some(Builtin::Panic) => self.effects.panics = true,
                    _ => {}
                }
                if is_effect(self.prog, self.fid, e) {
                    self.effect_ends.push(span.end);
                }
            }
            Expr::Unary { op: UnaryOp::Recv, .. } => self.effect_ends.push(span.end),
            _ => {}
        }
    }

    /// Bare keys of composite literals are not expressions of their own.
    fn keys(&mut self, lit: LiteralValue) {
        for el in self.arena.keyed_elems_list(lit.elems).to_vec() {
            match el.key {
                Some(Key::Name(n)) => {
                    if let Some(obj) = self.use_of(n.pos.start) {
                        self.reference(n.pos, obj, None);
                    }
                }
                Some(Key::Literal(l)) => self.keys(l),
                _ => {}
            }
            if let Element::Literal(l) = el.value {
                self.keys(l);
            }
        }
    }

    fn stmt(&mut self, s: gofix_syntax::ast::StmtId) {
        let span = self.arena.stmts.span(s);
        match self.arena.stmts[s] {
            Stmt::Defer { .. } => self.effects.defer = true,
            Stmt::Go { .. } => {
                self.effects.go_stmt = true;
                self.effect_ends.push(span.end);
            }
            Stmt::Labeled { .. } => self.effects.labels = true,
            Stmt::Return { results, .. } if results.is_empty() && self.named_results => {
                self.effects.named_results = true;
            }
            Stmt::Decl(d) => {
                let arena = self.arena;
                let Decl::Gen(g) = arena.decls[d];
                for spec in arena.specs_list(g.specs) {
                    if let Spec::Value(vs) = spec {
                        for n in self.arena.ident_names(vs.names) {
                            self.local(n.sym);
                        }
                    }
                }
            }
            Stmt::For {
                kind: ForKind::Range {
                    lhs: Some(RangeLhs::Define { names, .. }),
                    ..
                },
                ..
            } => {
                for n in self.arena.ident_names(names).to_vec() {
                    self.local(n.sym);
                }
            }
            Stmt::TypeSwitch { guard, .. } => {
                if let Some(b) = guard.bind {
                    self.local(b.sym);
                }
            }
            _ => {}
        }
    }

    fn simple(&mut self, s: gofix_syntax::ast::SimpleStmtId) {
        let span = self.arena.simple_stmts.span(s);
        match self.arena.simple_stmts[s] {
            SimpleStmt::Send { .. } => self.effect_ends.push(span.end),
            SimpleStmt::IncDec { expr, .. } => self.write(expr, span.end),
            SimpleStmt::Assign { lhs, .. } => {
                for &l in self.arena.exprs_list(lhs).to_vec().iter() {
                    self.write(l, span.end);
                }
            }
            SimpleStmt::ShortVarDecl { names, .. } => {
                for n in self.arena.ident_names(names).to_vec() {
                    match self.use_of(n.pos.start) {
                        Some(obj) => {
                            if let Some(&i) = self.params.get(&obj) {
                                self.uses[i].assigned = true;
                            }
                        }
                        None => self.local(n.sym),
                    }
                }
            }
            _ => {}
        }
    }

    fn local(&mut self, sym: gofix_syntax::ast::Symbol) {
        let name = self.prog.interner.resolve(sym);
        if name != "_" && !name.is_empty() {
            self.locals.insert(name.to_string());
        }
    }

    /// An assignment to `lhs`; anything but a plain local variable is an
    /// effect the caller could observe.
    fn write(&mut self, lhs: ExprId, end: u32) {
        let arena = self.arena;
        let mut root = arena.unparen(lhs);
        let direct = matches!(arena.exprs[root], Expr::Ident(_));
        loop {
            match arena.exprs[root] {
                Expr::Selector { expr, .. } | Expr::Index { base: expr, .. } => root = arena.unparen(expr),
                Expr::Unary {
                    op: UnaryOp::Deref,
                    expr,
                    ..
                } => root = arena.unparen(expr),
                _ => break,
            }
        }
        let obj = match arena.exprs[root] {
            Expr::Ident(_) => self.use_of(arena.exprs.span(root).start),
            _ => None,
        };
        let Some(obj) = obj else {
            // `_ = x`
            if !direct {
                self.effect_ends.push(end);
            }
            return;
        };
        let o = self.prog.object(obj);
        if matches!(o.kind, ObjKind::Var(VarKind::Package)) {
            self.effects.writes_globals = true;
        }
        let local = o.pos.is_some_and(|p| p.file == self.fid && self.decl.covers(p.span)) && !self.params.contains_key(&obj);
        if !(direct && local) {
            self.effect_ends.push(end);
        }
    }

    fn type_ref(&mut self, t: gofix_syntax::ast::TypeId) {
        match self.arena.types[t] {
            TypeExpr::Named { pkg: Some(p), name, .. } => {
                if let Some(obj) = self.use_of(name.pos.start) {
                    self.free_hole(p.pos.to(name.pos), obj);
                }
            }
            TypeExpr::Named { pkg: None, name, .. } => {
                if let Some(obj) = self.use_of(name.pos.start) {
                    self.reference(name.pos, obj, None);
                }
            }
            _ => {}
        }
    }

    /// Names of function literal parameters and struct fields; the
    /// function's own parameters are not locals.
    fn field(&mut self, f: gofix_syntax::ast::FieldId) {
        if self.insp.parent(NodeRef::Field(f)) == Some(NodeRef::Signature(self.own_sig)) {
            return;
        }
        for n in self.arena.ident_names(self.arena.fields[f].names).to_vec() {
            self.local(n.sym);
        }
    }

    fn reference(&mut self, span: Span, obj: ObjId, e: Option<ExprId>) {
        if let Some(&i) = self.params.get(&obj) {
            self.param_ref(i, span, e);
            return;
        }
        let o = self.prog.object(obj);
        if o.pos.is_some_and(|p| p.file == self.fid && self.decl.covers(p.span)) {
            if matches!(o.kind, ObjKind::Var(VarKind::Result)) {
                self.effects.named_results = true;
            }
            return;
        }
        match o.kind {
            ObjKind::PkgName { .. } | ObjKind::Label | ObjKind::Func { recv_base: Some(_) } => {}
            ObjKind::Var(VarKind::Field { .. }) => self.member(obj),
            _ => self.free_hole(span, obj),
        }
    }

    /// A field or method named by a selector or a composite literal key.
    fn member(&mut self, obj: ObjId) {
        let o = self.prog.object(obj);
        let name = self.prog.obj_name(obj);
        if o.pkg.is_some() && o.pkg == self.pkg && !is_exported(name) {
            self.unexported.push(name.to_string());
        }
    }

    fn free_hole(&mut self, span: Span, obj: ObjId) {
        let prog = self.prog;
        let o = prog.object(obj);
        let name = prog.obj_name(obj);
        if o.pkg.is_some() && o.pkg == self.pkg && !is_exported(name) {
            self.unexported.push(name.to_string());
        }
        if matches!(o.kind, ObjKind::Var(VarKind::Package)) {
            self.effects.reads_globals = true;
        }
        let index = match self.free_index.get(&obj) {
            Some(&i) => i,
            None => {
                self.free.push(FreeRef {
                    name: name.to_string(),
                    pkg_path: o.pkg.map(|p| prog.package(p).path.clone()),
                    pkg_name: o.pkg.map(|p| prog.package(p).name.clone()).unwrap_or_default(),
                });
                let i = (self.free.len() - 1) as u16;
                self.free_index.insert(obj, i);
                i
            }
        };
        self.holes.push((span, HoleKind::Free { index }));
    }

    fn param_ref(&mut self, i: usize, span: Span, e: Option<ExprId>) {
        self.uses[i].refs += 1;
        if self.first[i].is_none_or(|p| span.start < p) {
            self.first[i] = Some(span.start);
        }
        let Some(e) = e else {
            self.uses[i].implicit_ok = false;
            self.holes.push((
                span,
                HoleKind::Param {
                    index: i as u16,
                    need: 0,
                    selector_base: false,
                    in_header: false,
                },
            ));
            return;
        };
        let arena = self.arena;
        let insp = self.insp;
        let node = NodeRef::Expr(e);
        let selector_base = matches!(
            insp.parent(node),
            Some(NodeRef::Expr(p)) if matches!(arena.exprs[p], Expr::Selector { expr, .. } if expr == e)
        );
        if matches!(insp.enclosing_func(node), Some(FuncRef::Lit(_))) {
            self.uses[i].captured = true;
        }
        if self.conditional(e, span) {
            self.uses[i].conditional = true;
        }
        match self.access(e) {
            Access::Write => self.uses[i].assigned = true,
            Access::Addr => self.uses[i].addr_taken = true,
            Access::Read => {}
        }
        let implicit = self.implicit(e, i);
        self.uses[i].implicit_ok &= implicit;
        self.holes.push((
            span,
            HoleKind::Param {
                index: i as u16,
                need: required_precedence(arena, insp, e),
                selector_base,
                in_header: self.in_header(e, span),
            },
        ));
    }

    /// The reference may run zero or many times per call.
    fn conditional(&self, e: ExprId, span: Span) -> bool {
        let arena = self.arena;
        for a in self.insp.ancestors(NodeRef::Expr(e)) {
            match a {
                NodeRef::Func(_) => break,
                NodeRef::SwitchClause(_) | NodeRef::CommClause(_) => return true,
                NodeRef::Expr(x) => match arena.exprs[x] {
                    Expr::FuncLit { .. } => return true,
                    Expr::Binary {
                        op: BinaryOp::LAnd | BinaryOp::LOr,
                        right,
                        ..
                    } if arena.exprs.span(right).covers(span) => return true,
                    _ => {}
                },
                NodeRef::Stmt(s) => match arena.stmts[s] {
                    Stmt::For { .. } | Stmt::Select { .. } => return true,
                    Stmt::If { init, cond, .. } => {
                        let in_cond = arena.exprs.span(cond).covers(span);
                        let in_init = init.is_some_and(|i| arena.simple_stmts.span(i).covers(span));
                        if !in_cond && !in_init {
                            return true;
                        }
                    }
                    _ => {}
                },
                _ => {}
            }
        }
        false
    }

    /// Composite literals in a control clause header need parentheses.
    fn in_header(&self, e: ExprId, span: Span) -> bool {
        let arena = self.arena;
        for a in self.insp.ancestors(NodeRef::Expr(e)) {
            let header_end = match a {
                NodeRef::Func(_) => return false,
                NodeRef::Expr(x) if matches!(arena.exprs[x], Expr::FuncLit { .. }) => return false,
                NodeRef::Stmt(s) => match arena.stmts[s] {
                    Stmt::If { then_block, .. } => then_block.l_brace.start,
                    Stmt::For { body, .. } => body.l_brace.start,
                    Stmt::Switch { l_brace, .. } | Stmt::TypeSwitch { l_brace, .. } => l_brace.start,
                    _ => continue,
                },
                _ => continue,
            };
            let start = a.span(arena).start;
            if start <= span.start && span.end <= header_end {
                return true;
            }
        }
        false
    }

    /// Whether the reference is assigned to or has its address taken,
    /// possibly through field selections and array indexing.
    fn access(&self, e: ExprId) -> Access {
        let (prog, arena, fid) = (self.prog, self.arena, self.fid);
        let mut top = e;
        loop {
            match self.insp.parent(NodeRef::Expr(top)) {
                Some(NodeRef::Expr(p)) => match arena.exprs[p] {
                    Expr::Paren { .. } => top = p,
                    Expr::Selector { expr, .. } if expr == top => match prog.info.selection(fid, p) {
                        Some(sel) if sel.kind == SelectionKind::FieldVal => {
                            if prog.types.is_pointer(sel.recv) || sel.indirect {
                                return Access::Read;
                            }
                            top = p;
                        }
                        Some(sel) if sel.kind == SelectionKind::MethodVal => {
                            let m = prog.object(sel.obj);
                            let ptr_recv = prog
                                .types
                                .signature(m.ty)
                                .and_then(|s| s.recv)
                                .is_some_and(|r| prog.types.is_pointer(prog.object(r).ty));
                            return if ptr_recv && !prog.types.is_pointer(sel.recv) && !sel.indirect {
                                Access::Addr
                            } else {
                                Access::Read
                            };
                        }
                        _ => return Access::Read,
                    },
                    Expr::Index { base, .. } if base == top => {
                        if !self.is_array(top) {
                            return Access::Read;
                        }
                        top = p;
                    }
                    Expr::Slice { expr, .. } if expr == top => {
                        return if self.is_array(top) { Access::Addr } else { Access::Read };
                    }
                    Expr::Unary { op: UnaryOp::Addr, .. } => return Access::Addr,
                    _ => return Access::Read,
                },
                Some(NodeRef::Simple(s)) => {
                    return match arena.simple_stmts[s] {
                        SimpleStmt::Assign { lhs, .. } if arena.exprs_list(lhs).contains(&top) => Access::Write,
                        SimpleStmt::IncDec { expr, .. } if expr == top => Access::Write,
                        _ => Access::Read,
                    };
                }
                Some(NodeRef::Stmt(s)) => {
                    return match arena.stmts[s] {
                        Stmt::For {
                            kind:
                                ForKind::Range {
                                    lhs: Some(RangeLhs::Assign { exprs, .. }),
                                    ..
                                },
                            ..
                        } if arena.exprs_list(exprs).contains(&top) => Access::Write,
                        _ => Access::Read,
                    };
                }
                Some(NodeRef::CommClause(c)) => {
                    return match arena.comm_clauses[c].comm {
                        Some(CommStmt::Recv {
                            lhs: Some(RangeLhs::Assign { exprs, .. }),
                            ..
                        }) if arena.exprs_list(exprs).contains(&top) => Access::Write,
                        _ => Access::Read,
                    };
                }
                _ => return Access::Read,
            }
        }
    }

    fn is_array(&self, e: ExprId) -> bool {
        self.prog
            .info
            .type_of(self.fid, e)
            .is_some_and(|t| matches!(self.prog.types.get(self.prog.types.underlying(t)), Type::Array { .. }))
    }

    /// The reference is assigned or passed to a slot of exactly the
    /// parameter's type, so the argument would be converted there too. A
    /// returned parameter does not count: the call's own type is at stake.
    fn implicit(&self, e: ExprId, i: usize) -> bool {
        let (prog, arena, fid) = (self.prog, self.arena, self.fid);
        let pty = self.param_tys[i];
        let target = match self.insp.parent(NodeRef::Expr(e)) {
            Some(NodeRef::Expr(p)) => match arena.exprs[p] {
                Expr::Call {
                    func, args, ellipsis, ..
                } if func != e => {
                    if !matches!(prog.info.type_and_value(fid, func).map(|tv| tv.mode), Some(Mode::Value | Mode::Variable)) {
                        return false;
                    }
                    let Some(sig) = prog.info.type_of(fid, func).and_then(|t| prog.types.signature(t)) else {
                        return false;
                    };
                    let Some(idx) = arena.exprs_list(args).iter().position(|&a| a == e) else {
                        return false;
                    };
                    let n = sig.params.len();
                    if sig.variadic && idx + 1 >= n {
                        let Some(&last) = sig.params.last() else { return false };
                        let lt = prog.object(last).ty;
                        match (ellipsis, prog.types.get(lt)) {
                            (Some(_), _) => lt,
                            (None, Type::Slice(elem)) => *elem,
                            _ => return false,
                        }
                    } else {
                        match sig.params.get(idx) {
                            Some(&p) => prog.object(p).ty,
                            None => return false,
                        }
                    }
                }
                _ => return false,
            },
            Some(NodeRef::Simple(s)) => match arena.simple_stmts[s] {
                SimpleStmt::Assign {
                    lhs,
                    op: AssignOp::Assign,
                    rhs,
                    ..
                } => {
                    let (lhs, rhs) = (arena.exprs_list(lhs), arena.exprs_list(rhs));
                    let Some(idx) = rhs.iter().position(|&r| r == e) else {
                        return false;
                    };
                    if lhs.len() != rhs.len() {
                        return false;
                    }
                    match prog.info.type_of(fid, lhs[idx]) {
                        Some(t) => t,
                        None => return false,
                    }
                }
                _ => return false,
            },
            _ => return false,
        };
        prog.identical(target, pty)
    }

    fn return_shape(&self, exprs: &[ExprId], rel: impl Fn(Span) -> TextRange) -> Option<Shape> {
        let (prog, arena, fid) = (self.prog, self.arena, self.fid);
        let result_expr = |e: ExprId, convert: bool| {
            let inner = arena.unparen(e);
            let call = matches!(arena.exprs[inner], Expr::Call { func, .. }
                if matches!(prog.info.type_and_value(fid, func).map(|tv| tv.mode), Some(Mode::Value | Mode::Variable)));
            ResultExpr {
                range: rel(arena.exprs.span(e)),
                prec: precedence(arena, e),
                pure: classify(prog, fid, e).pure,
                call,
                convert,
            }
        };
        if exprs.len() == self.result_tys.len() {
            let exprs = exprs
                .iter()
                .zip(&self.result_tys)
                .map(|(&e, &rt)| {
                    let convert = match prog.info.type_of(fid, e) {
                        Some(t) => !prog.identical(prog.types.default_type(t), rt),
                        None => false,
                    };
                    result_expr(e, convert)
                })
                .collect();
            return Some(Shape::Return { exprs, spread: false });
        }
        let [single] = exprs else { return None };
        let ty = prog.info.type_of(fid, *single)?;
        let Type::Tuple(ts) = prog.types.get(ty) else {
            return None;
        };
        let same = ts.len() == self.result_tys.len() && ts.iter().zip(&self.result_tys).all(|(&a, &b)| prog.identical(a, b));
        same.then(|| Shape::Return {
            exprs: vec![result_expr(*single, false)],
            spread: true,
        })
    }

    fn stmts_shape(&self, stmts: &[gofix_syntax::ast::StmtId], rel: impl Fn(Span) -> TextRange) -> Shape {
        let arena = self.arena;
        let (Some(&first), Some(&last)) = (stmts.first(), stmts.last()) else {
            return Shape::Empty;
        };
        let span = arena.stmts.span(first).to(arena.stmts.span(last));
        let returns = self
            .insp
            .descendants(NodeRef::Func(self.func))
            .iter()
            .filter(|n| matches!(n, NodeRef::Stmt(s) if matches!(arena.stmts[*s], Stmt::Return { .. })))
            .any(|&n| span.covers(n.span(arena)) && self.insp.enclosing_func(n) == Some(FuncRef::Decl(self.func)));
        Shape::Stmts {
            range: rel(span),
            returns,
        }
    }
}
