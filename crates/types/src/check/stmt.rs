//! Statements and local declarations.

use gofix_syntax::ast::{
    Block, CommStmt, Decl, ForKind, GenDeclKind, ListRef, RangeLhs, SimpleStmt, SimpleStmtId, Spec, Stmt, StmtId,
    SwitchClause, TypeCaseElem, TypeId,
};

use super::Checker;
use crate::objects::{ObjKind, VarKind};
use crate::scope::ScopeKind;
use crate::types::{BasicKind, Type, TypeTable};
use crate::TyId;

impl Checker<'_> {
    pub(super) fn stmt_list(&mut self, list: ListRef<StmtId>) {
        for &s in self.arena().stmts_list(list) {
            self.stmt(s);
        }
    }

    fn block(&mut self, b: &Block) {
        let outer = self.open_scope(ScopeKind::Block, self.arena().block_span(b));
        self.stmt_list(b.stmts);
        self.close_scope(outer);
    }

    fn stmt(&mut self, id: StmtId) {
        let arena = self.arena();
        let span = arena.stmts.span(id);
        match arena.stmts[id] {
            Stmt::Simple(s) => self.simple_stmt(s),
            Stmt::Decl(d) => self.local_decl(d),
            Stmt::Labeled { label, stmt, .. } => {
                let obj = self.new_object(label.sym, ObjKind::Label, TypeTable::INVALID, Some(label.pos), None, 0);
                self.record_def(label.pos, obj);
                self.ctx.labels.push((label.sym, obj));
                self.stmt(stmt);
            }
            Stmt::Go { call, .. } | Stmt::Defer { call, .. } => {
                self.expr(call);
            }
            Stmt::Return { results, .. } => {
                for &r in arena.exprs_list(results) {
                    self.expr(r);
                }
            }
            Stmt::Branch { label, .. } => {
                if let Some(l) = label {
                    self.ctx.label_uses.push((l.sym, l.pos));
                }
            }
            Stmt::Block(b) => self.block(&b),
            Stmt::If {
                init,
                cond,
                then_block,
                else_stmt,
                ..
            } => {
                let outer = self.open_scope(ScopeKind::Block, span);
                if let Some(s) = init {
                    self.simple_stmt(s);
                }
                self.expr(cond);
                self.block(&then_block);
                if let Some(e) = else_stmt {
                    self.stmt(e);
                }
                self.close_scope(outer);
            }
            Stmt::For { kind, body, .. } => {
                let outer = self.open_scope(ScopeKind::Block, span);
                match kind {
                    ForKind::Infinite => {}
                    ForKind::Cond(c) => {
                        self.expr(c);
                    }
                    ForKind::Clause { init, cond, post, .. } => {
                        if let Some(s) = init {
                            self.simple_stmt(s);
                        }
                        if let Some(c) = cond {
                            self.expr(c);
                        }
                        if let Some(s) = post {
                            self.simple_stmt(s);
                        }
                    }
                    ForKind::Range { lhs, expr, .. } => {
                        let x = self.expr(expr);
                        let (k, v) = self.range_types(x.ty);
                        match lhs {
                            Some(RangeLhs::Define { names, .. }) => {
                                let scope = self.scope();
                                for (name, ty) in arena.ident_names(names).iter().zip([k, v]) {
                                    self.declare(scope, *name, ObjKind::Var(VarKind::Local), ty, body.l_brace.start);
                                }
                            }
                            Some(RangeLhs::Assign { exprs, .. }) => {
                                for &e in arena.exprs_list(exprs) {
                                    self.expr(e);
                                }
                            }
                            None => {}
                        }
                    }
                }
                self.block(&body);
                self.close_scope(outer);
            }
            Stmt::Switch { init, tag, clauses, .. } => {
                let outer = self.open_scope(ScopeKind::Block, span);
                if let Some(s) = init {
                    self.simple_stmt(s);
                }
                if let Some(t) = tag {
                    self.expr(t);
                }
                for &cid in arena.switch_clause_ids(clauses) {
                    let SwitchClause::Expr { exprs, stmts, .. } = arena.switch_clauses[cid] else { continue };
                    for &e in arena.exprs_list(exprs) {
                        self.expr(e);
                    }
                    let clause = self.open_scope(ScopeKind::Block, arena.switch_clauses.span(cid));
                    self.stmt_list(stmts);
                    self.close_scope(clause);
                }
                self.close_scope(outer);
            }
            Stmt::TypeSwitch { init, guard, clauses, .. } => {
                let outer = self.open_scope(ScopeKind::Block, span);
                if let Some(s) = init {
                    self.simple_stmt(s);
                }
                let x = self.expr(guard.expr);
                let mut first = true;
                for &cid in arena.switch_clause_ids(clauses) {
                    let SwitchClause::Type {
                        types,
                        colon_pos,
                        stmts,
                        ..
                    } = arena.switch_clauses[cid]
                    else {
                        continue;
                    };
                    let cases: Vec<Option<TyId>> = arena
                        .type_case_elems(types)
                        .iter()
                        .map(|c| match *c {
                            TypeCaseElem::Type(t) => Some(self.resolve_type(t)),
                            TypeCaseElem::Nil(_) => None,
                        })
                        .collect();
                    let clause = self.open_scope(ScopeKind::Block, arena.switch_clauses.span(cid));
                    if let Some(bind) = guard.bind {
                        let ty = match cases.as_slice() {
                            [Some(t)] => *t,
                            _ => x.ty,
                        };
                        let scope = self.scope();
                        let obj = self.new_object(
                            bind.sym,
                            ObjKind::Var(VarKind::Local),
                            ty,
                            Some(bind.pos),
                            Some(scope),
                            colon_pos.end,
                        );
                        if bind.sym != self.blank {
                            self.prog.scopes[scope.index()].names.insert(bind.sym, obj);
                        }
                        let fid = self.fid();
                        self.prog.info.implicits.insert((fid, cid), obj);
                        if first {
                            self.record_def(bind.pos, obj);
                        }
                    }
                    first = false;
                    self.stmt_list(stmts);
                    self.close_scope(clause);
                }
                self.close_scope(outer);
            }
            Stmt::Select { clauses, .. } => {
                for &cid in arena.comm_clause_ids(clauses) {
                    let cc = arena.comm_clauses[cid];
                    let clause = self.open_scope(ScopeKind::Block, arena.comm_clauses.span(cid));
                    match cc.comm {
                        Some(CommStmt::Send { chan, value, .. }) => {
                            self.expr(chan);
                            self.expr(value);
                        }
                        Some(CommStmt::Recv { lhs, expr }) => {
                            let x = self.expr(expr);
                            match lhs {
                                Some(RangeLhs::Define { names, .. }) => {
                                    let scope = self.scope();
                                    let ok = self.basic(BasicKind::Bool);
                                    for (name, ty) in arena.ident_names(names).iter().zip([x.ty, ok]) {
                                        self.declare(scope, *name, ObjKind::Var(VarKind::Local), ty, cc.colon_pos.end);
                                    }
                                }
                                Some(RangeLhs::Assign { exprs, .. }) => {
                                    for &e in arena.exprs_list(exprs) {
                                        self.expr(e);
                                    }
                                }
                                None => {}
                            }
                        }
                        None => {}
                    }
                    self.stmt_list(cc.stmts);
                    self.close_scope(clause);
                }
            }
        }
    }

    fn simple_stmt(&mut self, id: SimpleStmtId) {
        let arena = self.arena();
        match arena.simple_stmts[id] {
            SimpleStmt::Empty(_) => {}
            SimpleStmt::Expr(e) | SimpleStmt::IncDec { expr: e, .. } => {
                self.expr(e);
            }
            SimpleStmt::Send { chan, value, .. } => {
                self.expr(chan);
                self.expr(value);
            }
            SimpleStmt::Assign { lhs, rhs, .. } => {
                for &e in arena.exprs_list(rhs) {
                    self.expr(e);
                }
                for &e in arena.exprs_list(lhs) {
                    self.expr(e);
                }
            }
            SimpleStmt::ShortVarDecl { names, values, .. } => {
                let names = arena.ident_names(names);
                let types = self.rhs_types(arena.exprs_list(values), names.len());
                let scope = self.scope();
                let visible_from = arena.simple_stmts.span(id).end;
                for (name, ty) in names.iter().zip(types) {
                    let existing = (name.sym != self.blank)
                        .then(|| self.prog.scopes[scope.index()].lookup(name.sym))
                        .flatten();
                    match existing {
                        Some(obj) => self.record_use(name.pos, obj),
                        None => {
                            self.declare(scope, *name, ObjKind::Var(VarKind::Local), ty, visible_from);
                        }
                    }
                }
            }
        }
    }

    /// `const`, `var` and `type` declarations inside a function.
    fn local_decl(&mut self, id: gofix_syntax::ast::DeclId) {
        let arena = self.arena();
        let Decl::Gen(g) = arena.decls[id];
        let scope = self.scope();
        match g.kind {
            GenDeclKind::Import => {}
            GenDeclKind::Const => {
                let mut last: (Option<TypeId>, ListRef<gofix_syntax::ast::ExprId>) = (None, ListRef::EMPTY);
                for (iota, spec) in arena.specs_list(g.specs).iter().enumerate() {
                    let Spec::Value(vs) = spec else { continue };
                    if !vs.values.is_empty() || vs.typ.is_some() {
                        last = (vs.typ, vs.values);
                    }
                    let values = arena.exprs_list(last.1);
                    for (i, name) in arena.ident_names(vs.names).iter().enumerate() {
                        let obj = self.declare(scope, *name, ObjKind::Const { value: None }, TypeTable::INVALID, vs.span.end);
                        self.const_decl(obj, last.0, values.get(i).copied(), iota as i128);
                    }
                }
            }
            GenDeclKind::Var => {
                for spec in arena.specs_list(g.specs) {
                    let Spec::Value(vs) = spec else { continue };
                    let names = arena.ident_names(vs.names);
                    let types = self.value_types(vs.typ, arena.exprs_list(vs.values), names.len());
                    for (name, ty) in names.iter().zip(types) {
                        self.declare(scope, *name, ObjKind::Var(VarKind::Local), ty, vs.span.end);
                    }
                }
            }
            GenDeclKind::Type => {
                for spec in arena.specs_list(g.specs) {
                    let Spec::Type(ts) = spec else { continue };
                    let obj = self.declare_type_name(scope, ts, ts.name.pos.start);
                    self.type_decl(obj, ts);
                }
            }
        }
    }

    /// Key and value types of ranging over a value of type `ty`.
    fn range_types(&self, ty: TyId) -> (TyId, TyId) {
        let types = &self.prog.types;
        let int = self.basic(BasicKind::Int);
        match types.get(types.underlying(ty)) {
            Type::Basic(k) if matches!(k, BasicKind::String | BasicKind::UntypedString) => {
                (int, self.basic(BasicKind::Rune))
            }
            Type::Basic(k) if k.is_integer() => (types.default_type(ty), TypeTable::INVALID),
            Type::Slice(elem) | Type::Array { elem, .. } => (int, *elem),
            Type::Pointer(p) => match types.get(types.underlying(*p)) {
                Type::Array { elem, .. } => (int, *elem),
                _ => (TypeTable::INVALID, TypeTable::INVALID),
            },
            Type::Map { key, value } => (*key, *value),
            Type::Chan { elem, .. } => (*elem, TypeTable::INVALID),
            Type::Signature(sig) => {
                let yield_params = sig
                    .params
                    .first()
                    .and_then(|&y| types.signature(self.prog.objects[y.index()].ty))
                    .map(|s| s.params.clone())
                    .unwrap_or_default();
                let at = |i: usize| {
                    yield_params
                        .get(i)
                        .map_or(TypeTable::INVALID, |&p| self.prog.objects[p.index()].ty)
                };
                (at(0), at(1))
            }
            _ => (TypeTable::INVALID, TypeTable::INVALID),
        }
    }
}
