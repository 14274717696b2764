//! Type checking of one package.
//!
//! Runs in phases over the package's files:
//!
//! 1. collect package-level objects and imports, attach methods to their
//!    receiver types;
//! 2. resolve type declarations, then constants, variables and function
//!    signatures (lazily, so declaration order does not matter);
//! 3. check function bodies.

mod expr;
mod stmt;
mod typexpr;

use gofix_syntax::ast::*;
use rustc_hash::FxHashMap;

use crate::constant::ConstValue;
use crate::info::{Mode, TypeAndValue};
use crate::objects::{Builtin, ObjKind, ObjPos, Object, VarKind};
use crate::program::{File, ImportInfo, Program, unquote};
use crate::scope::ScopeKind;
use crate::types::{BasicKind, Named, Type, TypeTable};
use crate::{FileId, ObjId, PkgId, ScopeId, TyId};

/// Checks `files` as package `pkg` and returns each file's imports.
pub(crate) fn check_package(prog: &mut Program, pkg: PkgId, files: &[File]) -> Vec<Vec<ImportInfo>> {
    let mut c = Checker::new(prog, pkg, files);
    c.collect();
    c.resolve_all();
    c.check_bodies();
    c.imports
}

/// Result of checking an expression.
#[derive(Debug, Clone)]
pub(super) struct Operand {
    pub mode: Mode,
    pub ty: TyId,
    pub value: Option<ConstValue>,
    pub builtin: Option<Builtin>,
}

impl Operand {
    pub fn invalid() -> Self {
        Self::new(Mode::Invalid, TypeTable::INVALID)
    }

    pub fn new(mode: Mode, ty: TyId) -> Self {
        Self {
            mode,
            ty,
            value: None,
            builtin: None,
        }
    }

    pub fn constant(ty: TyId, value: ConstValue) -> Self {
        Self {
            mode: Mode::Constant,
            ty,
            value: Some(value),
            builtin: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DeclInfo {
    Const {
        file: usize,
        typ: Option<TypeId>,
        init: Option<ExprId>,
        iota: i128,
    },
    Var {
        file: usize,
        spec: ValueSpec,
    },
    Type {
        file: usize,
        spec: TypeSpec,
    },
    Func {
        file: usize,
        decl: FuncDeclId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeclState {
    InProgress,
    Done,
}

/// Where the checker currently is.
#[derive(Debug, Clone, Default)]
struct Ctx {
    file: usize,
    scope: Option<ScopeId>,
    /// Signature of the enclosing function.
    sig: Option<TyId>,
    iota: Option<i128>,
    labels: Vec<(Symbol, ObjId)>,
    label_uses: Vec<(Symbol, Span)>,
}

pub(super) struct Checker<'a> {
    prog: &'a mut Program,
    pkg: PkgId,
    files: &'a [File],
    imports: Vec<Vec<ImportInfo>>,
    decls: FxHashMap<ObjId, DeclInfo>,
    decl_order: Vec<ObjId>,
    state: FxHashMap<ObjId, DeclState>,
    func_scopes: FxHashMap<(usize, FuncDeclId), ScopeId>,
    bodies: Vec<(usize, FuncDeclId, ObjId)>,
    ctx: Ctx,
    blank: Symbol,
}

impl<'a> Checker<'a> {
    fn new(prog: &'a mut Program, pkg: PkgId, files: &'a [File]) -> Self {
        let blank = prog.interner.intern("_");
        Self {
            prog,
            pkg,
            files,
            imports: vec![Vec::new(); files.len()],
            decls: FxHashMap::default(),
            decl_order: Vec::new(),
            state: FxHashMap::default(),
            func_scopes: FxHashMap::default(),
            bodies: Vec::new(),
            ctx: Ctx::default(),
            blank,
        }
    }

    // -------------------------------------------------------------------------
    // Shorthands
    // -------------------------------------------------------------------------

    fn arena(&self) -> &'a AstArena {
        &self.files[self.ctx.file].arena
    }

    fn src(&self) -> &'a str {
        &self.files[self.ctx.file].src
    }

    fn fid(&self) -> FileId {
        self.files[self.ctx.file].id
    }

    fn scope(&self) -> ScopeId {
        self.ctx.scope.unwrap_or(self.prog.universe)
    }

    fn pkg_scope(&self) -> ScopeId {
        self.prog.packages[self.pkg.index()].scope
    }

    fn basic(&self, k: BasicKind) -> TyId {
        self.prog.types.basic(k)
    }

    fn name(&self, sym: Symbol) -> &str {
        self.prog.interner.resolve(sym)
    }

    fn error(&mut self, span: Span, msg: impl Into<String>) {
        let fid = self.fid();
        self.prog.error(fid, span, msg);
    }

    fn record_def(&mut self, pos: Span, obj: ObjId) {
        let fid = self.fid();
        self.prog.info.defs.insert((fid, pos.start), obj);
    }

    fn record_use(&mut self, pos: Span, obj: ObjId) {
        let fid = self.fid();
        self.prog.info.uses.insert((fid, pos.start), obj);
    }

    fn record(&mut self, e: ExprId, x: &Operand) {
        let fid = self.fid();
        self.prog.info.types.insert(
            (fid, e),
            TypeAndValue {
                mode: x.mode,
                ty: x.ty,
                value: x.value.clone(),
            },
        );
    }

    fn new_object(&mut self, name: Symbol, kind: ObjKind, ty: TyId, pos: Option<Span>, parent: Option<ScopeId>, scope_pos: u32) -> ObjId {
        let fid = self.fid();
        self.prog.add_object(Object {
            name,
            kind,
            pkg: Some(self.pkg),
            ty,
            pos: pos.map(|span| ObjPos { file: fid, span }),
            parent,
            scope_pos,
        })
    }

    /// Declares `ident` in `scope`; blank identifiers get an object that is
    /// not inserted.
    fn declare(&mut self, scope: ScopeId, ident: IdentName, kind: ObjKind, ty: TyId, scope_pos: u32) -> ObjId {
        let obj = self.new_object(ident.sym, kind, ty, Some(ident.pos), Some(scope), scope_pos);
        if ident.sym != self.blank {
            self.prog.scopes[scope.index()].names.insert(ident.sym, obj);
        }
        self.record_def(ident.pos, obj);
        obj
    }

    fn open_scope(&mut self, kind: ScopeKind, span: Span) -> Option<ScopeId> {
        let fid = self.fid();
        let outer = self.ctx.scope;
        let s = self.prog.new_scope(kind, Some(self.scope()), Some(fid), span);
        self.ctx.scope = Some(s);
        outer
    }

    fn close_scope(&mut self, outer: Option<ScopeId>) {
        self.ctx.scope = outer;
    }

    /// Resolves `sym` from the current scope outwards.
    fn lookup(&mut self, sym: Symbol) -> Option<ObjId> {
        let mut cur = Some(self.scope());
        while let Some(s) = cur {
            let scope = &self.prog.scopes[s.index()];
            if let Some(obj) = scope.lookup(sym) {
                self.resolve_obj(obj);
                return Some(obj);
            }
            cur = scope.parent;
        }
        None
    }

    fn file_ctx(&self, file: usize) -> Ctx {
        Ctx {
            file,
            scope: Some(self.files[file].scope),
            ..Ctx::default()
        }
    }

    // -------------------------------------------------------------------------
    // Phase 1: collection
    // -------------------------------------------------------------------------

    fn collect(&mut self) {
        let mut methods = Vec::new();
        for file in 0..self.files.len() {
            self.ctx = self.file_ctx(file);
            let arena = self.arena();
            let root = self.files[file].root;
            for decl in arena.top_decls(root.decls) {
                match *decl {
                    TopLevelDecl::Decl(id) => {
                        let Decl::Gen(g) = arena.decls[id];
                        match g.kind {
                            GenDeclKind::Import => {
                                for spec in arena.specs_list(g.specs) {
                                    if let Spec::Import(imp) = spec {
                                        self.collect_import(file, imp);
                                    }
                                }
                            }
                            GenDeclKind::Const => self.collect_consts(file, &g),
                            GenDeclKind::Var => self.collect_vars(file, &g),
                            GenDeclKind::Type => {
                                for spec in arena.specs_list(g.specs) {
                                    if let Spec::Type(ts) = spec {
                                        self.collect_type(file, *ts);
                                    }
                                }
                            }
                        }
                    }
                    TopLevelDecl::Func(id) => {
                        let fd = arena.funcs[id];
                        let pkg_scope = self.pkg_scope();
                        let kind = ObjKind::Func { recv_base: None };
                        let obj = if fd.recv.is_some() {
                            let obj = self.new_object(fd.name.sym, kind, TypeTable::INVALID, Some(fd.name.pos), None, 0);
                            self.record_def(fd.name.pos, obj);
                            methods.push((file, id, obj));
                            obj
                        } else if self.name(fd.name.sym) == "init" {
                            let obj = self.new_object(fd.name.sym, kind, TypeTable::INVALID, Some(fd.name.pos), Some(pkg_scope), 0);
                            self.record_def(fd.name.pos, obj);
                            obj
                        } else {
                            self.declare(pkg_scope, fd.name, kind, TypeTable::INVALID, 0)
                        };
                        self.add_decl(obj, DeclInfo::Func { file, decl: id });
                        if fd.body.is_some() {
                            self.bodies.push((file, id, obj));
                        }
                    }
                }
            }
        }
        for (file, id, obj) in methods {
            self.attach_method(file, id, obj);
        }
    }

    fn add_decl(&mut self, obj: ObjId, info: DeclInfo) {
        self.decls.insert(obj, info);
        self.decl_order.push(obj);
    }

    fn collect_import(&mut self, file: usize, imp: &ImportSpec) {
        let path = unquote(&self.files[file].src[imp.path.raw.range()]);
        let target = self.prog.package_by_path(&path);
        if target.is_none() {
            self.error(imp.path.raw, format!("could not import {path}"));
        }
        let file_scope = self.files[file].scope;
        let (name, obj) = match imp.name {
            Some(ImportName::Blank(_)) => (Some("_".to_string()), None),
            Some(ImportName::Dot(_)) => {
                if let Some(p) = target {
                    let scope = self.prog.packages[p.index()].scope;
                    let members: Vec<(Symbol, ObjId)> = self.prog.scopes[scope.index()]
                        .names
                        .iter()
                        .filter(|(s, _)| crate::program::is_exported(self.prog.interner.resolve(**s)))
                        .map(|(s, o)| (*s, *o))
                        .collect();
                    for (s, o) in members {
                        self.prog.scopes[file_scope.index()].names.insert(s, o);
                    }
                }
                (Some(".".to_string()), None)
            }
            Some(ImportName::Name(id)) => {
                let obj = target.map(|p| self.declare(file_scope, id, ObjKind::PkgName { imported: p }, TypeTable::INVALID, 0));
                (Some(self.name(id.sym).to_string()), obj)
            }
            None => {
                let obj = target.map(|p| {
                    let pkg_name = self.prog.packages[p.index()].name.clone();
                    let sym = self.prog.interner.intern(&pkg_name);
                    let obj = self.new_object(
                        sym,
                        ObjKind::PkgName { imported: p },
                        TypeTable::INVALID,
                        Some(imp.path.raw),
                        Some(file_scope),
                        0,
                    );
                    self.prog.scopes[file_scope.index()].names.insert(sym, obj);
                    obj
                });
                (None, obj)
            }
        };
        self.imports[file].push(ImportInfo {
            spec_span: imp.span,
            path,
            name,
            pkg: target,
            obj,
        });
    }

    fn collect_consts(&mut self, file: usize, g: &GenDecl) {
        let arena = self.arena();
        let pkg_scope = self.pkg_scope();
        let mut last: (Option<TypeId>, ListRef<ExprId>) = (None, ListRef::EMPTY);
        for (iota, spec) in arena.specs_list(g.specs).iter().enumerate() {
            let Spec::Value(vs) = spec else { continue };
            if !vs.values.is_empty() || vs.typ.is_some() {
                last = (vs.typ, vs.values);
            }
            let values = arena.exprs_list(last.1);
            for (i, name) in arena.ident_names(vs.names).iter().enumerate() {
                let obj = self.declare(pkg_scope, *name, ObjKind::Const { value: None }, TypeTable::INVALID, 0);
                self.add_decl(
                    obj,
                    DeclInfo::Const {
                        file,
                        typ: last.0,
                        init: values.get(i).copied(),
                        iota: iota as i128,
                    },
                );
            }
        }
    }

    fn collect_vars(&mut self, file: usize, g: &GenDecl) {
        let arena = self.arena();
        let pkg_scope = self.pkg_scope();
        for spec in arena.specs_list(g.specs) {
            let Spec::Value(vs) = spec else { continue };
            for name in arena.ident_names(vs.names) {
                let obj = self.declare(pkg_scope, *name, ObjKind::Var(VarKind::Package), TypeTable::INVALID, 0);
                self.add_decl(obj, DeclInfo::Var { file, spec: *vs });
            }
        }
    }

    fn collect_type(&mut self, file: usize, ts: TypeSpec) {
        let pkg_scope = self.pkg_scope();
        let obj = self.declare_type_name(pkg_scope, &ts, 0);
        self.add_decl(obj, DeclInfo::Type { file, spec: ts });
    }

    /// Declares the name of a type spec; defined types get their named
    /// type right away so that the right-hand side may refer to it.
    pub(super) fn declare_type_name(&mut self, scope: ScopeId, ts: &TypeSpec, scope_pos: u32) -> ObjId {
        let obj = self.declare(
            scope,
            ts.name,
            ObjKind::TypeName { alias: ts.is_alias() },
            TypeTable::INVALID,
            scope_pos,
        );
        if !ts.is_alias() {
            let named = self.prog.types.alloc(Type::Named(Named {
                obj,
                underlying: TypeTable::INVALID,
                methods: Vec::new(),
                tparams: Vec::new(),
                targs: Vec::new(),
                origin: None,
            }));
            self.prog.objects[obj.index()].ty = named;
        }
        obj
    }

    /// Adds method `obj` to the named type its receiver names.
    fn attach_method(&mut self, file: usize, id: FuncDeclId, obj: ObjId) {
        let arena = &self.files[file].arena;
        let Some(recv) = arena.funcs[id].recv else { return };
        let mut t = recv.typ;
        let base = loop {
            match arena.types[t] {
                Type_::Pointer { elem, .. } | Type_::Paren { typ: elem } => t = elem,
                Type_::Named { pkg: None, name, .. } => break Some(name.sym),
                _ => break None,
            }
        };
        let Some(tn) = base.and_then(|sym| self.prog.scopes[self.pkg_scope().index()].lookup(sym)) else {
            return;
        };
        self.prog.objects[obj.index()].kind = ObjKind::Func { recv_base: Some(tn) };
        let named_ty = self.prog.objects[tn.index()].ty;
        if let Type::Named(n) = self.prog.types.get_mut(named_ty) {
            n.methods.push(obj);
        }
    }

    // -------------------------------------------------------------------------
    // Phase 2: package-level declarations
    // -------------------------------------------------------------------------

    fn resolve_all(&mut self) {
        let order = self.decl_order.clone();
        for &obj in &order {
            if matches!(self.decls.get(&obj), Some(DeclInfo::Type { .. })) {
                self.resolve_obj(obj);
            }
        }
        self.prog.complete_pending_instances();
        for obj in order {
            self.resolve_obj(obj);
        }
    }

    /// Types the package-level object `obj` if that has not happened yet.
    fn resolve_obj(&mut self, obj: ObjId) {
        match self.state.get(&obj) {
            Some(DeclState::Done) => return,
            Some(DeclState::InProgress) => return,
            None => {}
        }
        let Some(&info) = self.decls.get(&obj) else { return };
        self.state.insert(obj, DeclState::InProgress);
        let file = match info {
            DeclInfo::Const { file, .. } | DeclInfo::Var { file, .. } | DeclInfo::Type { file, .. } | DeclInfo::Func { file, .. } => file,
        };
        let ctx = self.file_ctx(file);
        let saved = std::mem::replace(&mut self.ctx, ctx);
        match info {
            DeclInfo::Const { typ, init, iota, .. } => self.const_decl(obj, typ, init, iota),
            DeclInfo::Var { spec, .. } => self.var_decl(&spec),
            DeclInfo::Type { spec, .. } => self.type_decl(obj, &spec),
            DeclInfo::Func { decl, .. } => self.func_decl(file, obj, decl),
        }
        self.ctx = saved;
        self.state.insert(obj, DeclState::Done);
    }

    pub(super) fn const_decl(&mut self, obj: ObjId, typ: Option<TypeId>, init: Option<ExprId>, iota: i128) {
        let saved_iota = self.ctx.iota.replace(iota);
        let declared = typ.map(|t| self.resolve_type(t));
        let x = match init {
            Some(e) => self.expr(e),
            None => Operand::invalid(),
        };
        self.ctx.iota = saved_iota;
        let ty = declared.unwrap_or(x.ty);
        let value = x.value.or(Some(ConstValue::Unknown));
        let o = &mut self.prog.objects[obj.index()];
        o.ty = ty;
        o.kind = ObjKind::Const { value };
    }

    /// Types every variable of `spec` at once.
    fn var_decl(&mut self, spec: &ValueSpec) {
        let arena = self.arena();
        let names = arena.ident_names(spec.names);
        let values = arena.exprs_list(spec.values);
        let types = self.value_types(spec.typ, values, names.len());
        let fid = self.fid();
        for (name, ty) in names.iter().zip(types) {
            if let Some(obj) = self.prog.info.def(fid, name.pos.start) {
                self.prog.objects[obj.index()].ty = ty;
                self.state.insert(obj, DeclState::Done);
            }
        }
    }

    /// Types of `n` variables declared with an optional type and values.
    pub(super) fn value_types(&mut self, typ: Option<TypeId>, values: &[ExprId], n: usize) -> Vec<TyId> {
        match typ {
            Some(t) => {
                let ty = self.resolve_type(t);
                for &v in values {
                    self.expr(v);
                }
                vec![ty; n]
            }
            None => self.rhs_types(values, n),
        }
    }

    /// Types of `n` variables initialised from `values`, untyped constants
    /// taking their default type.
    pub(super) fn rhs_types(&mut self, values: &[ExprId], n: usize) -> Vec<TyId> {
        if values.len() == 1 && n > 1 {
            let x = self.expr(values[0]);
            let mut out = match self.prog.types.get(x.ty) {
                Type::Tuple(ts) => ts.clone(),
                _ if x.mode == Mode::CommaOk || x.mode == Mode::MapIndex => vec![x.ty, self.basic(BasicKind::Bool)],
                _ => vec![x.ty],
            };
            out.resize(n, TypeTable::INVALID);
            return out;
        }
        let mut out: Vec<TyId> = values
            .iter()
            .map(|&v| {
                let x = self.expr(v);
                self.prog.types.default_type(x.ty)
            })
            .collect();
        out.resize(n, TypeTable::INVALID);
        out
    }

    /// Declares the type parameters of a generic type or function in
    /// `scope` and returns their types.
    pub(super) fn declare_type_params(&mut self, tps: TypeParamsId, scope: ScopeId) -> Vec<TyId> {
        let arena = self.arena();
        let mut out = Vec::new();
        let mut pending = Vec::new();
        for &d in arena.type_param_decl_ids(arena.type_params[tps].params) {
            let decl = arena.type_param_decls[d];
            for name in arena.ident_names(decl.names) {
                let obj = self.declare(scope, *name, ObjKind::TypeName { alias: false }, TypeTable::INVALID, 0);
                let ty = self.prog.types.alloc(Type::TypeParam(crate::types::TypeParam {
                    obj,
                    index: out.len(),
                    constraint: TypeTable::INVALID,
                }));
                self.prog.objects[obj.index()].ty = ty;
                out.push(ty);
                pending.push((ty, decl.constraint));
            }
        }
        for (ty, constraint) in pending {
            let c = self.resolve_type(constraint);
            if let Type::TypeParam(p) = self.prog.types.get_mut(ty) {
                p.constraint = c;
            }
        }
        out
    }

    /// Resolves the right-hand side of a type declaration.
    pub(super) fn type_decl(&mut self, obj: ObjId, spec: &TypeSpec) {
        let outer = match spec.type_params {
            Some(tps) => {
                let outer = self.open_scope(ScopeKind::Block, spec.span);
                let scope = self.scope();
                let tparams = self.declare_type_params(tps, scope);
                let named = self.prog.objects[obj.index()].ty;
                if let Type::Named(n) = self.prog.types.get_mut(named) {
                    n.tparams = tparams;
                }
                Some(outer)
            }
            None => None,
        };
        let rhs = self.resolve_type(spec.typ);
        if spec.is_alias() {
            self.prog.objects[obj.index()].ty = rhs;
        } else {
            let named = self.prog.objects[obj.index()].ty;
            let under = self.prog.types.underlying(rhs);
            let under = if under == named { TypeTable::INVALID } else { under };
            if let Type::Named(n) = self.prog.types.get_mut(named) {
                n.underlying = under;
            }
            self.prog.complete_pending_instances();
        }
        if let Some(outer) = outer {
            self.close_scope(outer);
        }
    }

    fn func_decl(&mut self, file: usize, obj: ObjId, id: FuncDeclId) {
        let arena = self.arena();
        let fd = arena.funcs[id];
        let span = arena.funcs.span(id);
        let outer = self.open_scope(ScopeKind::Func, span);
        let scope = self.scope();

        let tparams = match fd.type_params {
            Some(tps) => self.declare_type_params(tps, scope),
            None => Vec::new(),
        };
        let recv = fd.recv.map(|r| {
            self.bind_receiver_type_params(r.typ, scope);
            let ty = self.resolve_type(r.typ);
            let name = r.name.unwrap_or(IdentName {
                sym: self.prog.interner.intern(""),
                pos: Span::point(r.l_paren.end),
            });
            if r.name.is_some() {
                self.declare(scope, name, ObjKind::Var(VarKind::Receiver), ty, span.start)
            } else {
                self.new_object(name.sym, ObjKind::Var(VarKind::Receiver), ty, None, Some(scope), span.start)
            }
        });
        let mut sig = self.signature(fd.sig, Some(scope), span.start);
        sig.tparams = tparams;
        sig.recv = recv;
        let ty = self.prog.types.alloc(Type::Signature(sig));
        self.prog.objects[obj.index()].ty = ty;
        self.func_scopes.insert((file, id), scope);
        self.close_scope(outer);
    }

    /// `func (l *List[T]) ...`: binds `T` to the type parameters of `List`.
    fn bind_receiver_type_params(&mut self, typ: TypeId, scope: ScopeId) {
        let arena = self.arena();
        let mut t = typ;
        loop {
            match arena.types[t] {
                Type_::Pointer { elem, .. } | Type_::Paren { typ: elem } => t = elem,
                Type_::Named { pkg: None, name, args } if !args.is_empty() => {
                    let Some(base) = self.prog.scopes[self.pkg_scope().index()].lookup(name.sym) else {
                        return;
                    };
                    let base_ty = self.prog.objects[base.index()].ty;
                    let tparams = match self.prog.types.get(base_ty) {
                        Type::Named(n) => n.tparams.clone(),
                        _ => return,
                    };
                    for (&arg, &tp) in arena.types_list(args).iter().zip(&tparams) {
                        if let Type_::Named { pkg: None, name, .. } = arena.types[arg] {
                            self.declare(scope, name, ObjKind::TypeName { alias: false }, tp, 0);
                        }
                    }
                    return;
                }
                _ => return,
            }
        }
    }

    // -------------------------------------------------------------------------
    // Phase 3: bodies
    // -------------------------------------------------------------------------

    fn check_bodies(&mut self) {
        let bodies = std::mem::take(&mut self.bodies);
        for (file, id, obj) in bodies {
            let Some(&scope) = self.func_scopes.get(&(file, id)) else { continue };
            self.ctx = self.file_ctx(file);
            self.ctx.scope = Some(scope);
            self.ctx.sig = Some(self.prog.objects[obj.index()].ty);
            let Some(body) = self.files[file].arena.funcs[id].body else { continue };
            self.stmt_list(body.stmts);
            self.resolve_labels();
        }
    }

    pub(super) fn resolve_labels(&mut self) {
        let uses = std::mem::take(&mut self.ctx.label_uses);
        for (sym, pos) in uses {
            match self.ctx.labels.iter().find(|(s, _)| *s == sym) {
                Some(&(_, obj)) => self.record_use(pos, obj),
                None => {
                    let msg = format!("label {} not defined", self.name(sym));
                    self.error(pos, msg);
                }
            }
        }
        self.ctx.labels.clear();
    }
}

/// The syntax tree's `Type`, renamed to keep it apart from the model's.
pub(super) use gofix_syntax::ast::Type as Type_;
