//! Expressions.

use gofix_syntax::ast::{
    ArrayLen, BasicLit, BasicLitKind, BinaryOp, Element, Expr, ExprId, IdentName, Key, KeyedElement, ListRef, Span,
    Symbol, UnaryOp,
};
use smallvec::SmallVec;

use super::{Checker, Operand, Type_};
use crate::constant::ConstValue;
use crate::info::{Mode, Selection, SelectionKind};
use crate::objects::{Builtin, ObjKind, Object, VarKind};
use crate::scope::ScopeKind;
use crate::subst::SubstMap;
use crate::types::{BasicKind, Signature, Type, TypeTable};
use crate::{ObjId, TyId};

impl Checker<'_> {
    /// Checks `e` and records its type and value.
    pub(super) fn expr(&mut self, e: ExprId) -> Operand {
        let x = self.expr_inner(e);
        self.record(e, &x);
        x
    }

    fn expr_inner(&mut self, e: ExprId) -> Operand {
        let arena = self.arena();
        let span = arena.exprs.span(e);
        match arena.exprs[e] {
            Expr::Ident(sym) => self.ident(sym, span),
            Expr::BasicLit(lit) => self.basic_lit(lit),
            Expr::FuncLit { sig, body, .. } => {
                let outer = self.open_scope(ScopeKind::Func, span);
                let scope = self.scope();
                let sig = self.signature(sig, Some(scope), span.start);
                let ty = self.prog.types.alloc(Type::Signature(sig));
                let saved_sig = self.ctx.sig.replace(ty);
                let saved_labels = std::mem::take(&mut self.ctx.labels);
                let saved_uses = std::mem::take(&mut self.ctx.label_uses);
                self.stmt_list(body.stmts);
                self.resolve_labels();
                self.ctx.sig = saved_sig;
                self.ctx.labels = saved_labels;
                self.ctx.label_uses = saved_uses;
                self.close_scope(outer);
                Operand::new(Mode::Value, ty)
            }
            Expr::CompositeLit { typ, lit } => {
                let ty = match arena.types[typ] {
                    Type_::Array {
                        len: ArrayLen::Ellipsis(_),
                        elem,
                    } => {
                        let elem = self.resolve_type(elem);
                        let len = self.literal_len(arena.keyed_elems_list(lit.elems));
                        self.prog.types.alloc(Type::Array { len: Some(len), elem })
                    }
                    _ => self.resolve_type(typ),
                };
                self.literal(ty, lit.elems);
                Operand::new(Mode::Value, ty)
            }
            Expr::Paren { expr, .. } => self.expr(expr),
            Expr::Selector { expr, sel, .. } => self.selector(e, expr, sel),
            Expr::Index { base, indices, .. } => self.index(base, indices),
            Expr::Slice { expr, lo, hi, max, .. } => {
                let x = self.expr(expr);
                for i in [lo, hi, max].into_iter().flatten() {
                    self.expr(i);
                }
                let ty = match self.prog.types.get(self.prog.types.underlying(x.ty)).clone() {
                    Type::Basic(k) if k == BasicKind::UntypedString => self.basic(BasicKind::String),
                    Type::Slice(_) | Type::Basic(_) => x.ty,
                    Type::Array { elem, .. } => self.prog.types.alloc(Type::Slice(elem)),
                    Type::Pointer(p) => match self.prog.types.get(self.prog.types.underlying(p)) {
                        Type::Array { elem, .. } => {
                            let elem = *elem;
                            self.prog.types.alloc(Type::Slice(elem))
                        }
                        _ => TypeTable::INVALID,
                    },
                    _ => TypeTable::INVALID,
                };
                Operand::new(Mode::Value, ty)
            }
            Expr::TypeAssert { expr, typ, .. } => {
                let x = self.expr(expr);
                match typ {
                    Some(t) => {
                        let ty = self.resolve_type(t);
                        Operand::new(Mode::CommaOk, ty)
                    }
                    None => Operand::new(Mode::Value, x.ty),
                }
            }
            Expr::Call { func, args, ellipsis, .. } => self.call(func, args, ellipsis.is_some()),
            Expr::Unary { op, expr, .. } => self.unary(op, expr),
            Expr::Binary { left, op, right, .. } => self.binary(left, op, right),
            Expr::TypeExpr(t) => {
                let ty = self.resolve_type(t);
                Operand::new(Mode::TypeExpr, ty)
            }
        }
    }

    fn ident(&mut self, sym: Symbol, span: Span) -> Operand {
        if sym == self.blank {
            return Operand::new(Mode::Variable, TypeTable::INVALID);
        }
        let Some(obj) = self.lookup(sym) else {
            let msg = format!("undefined: {}", self.name(sym));
            self.error(span, msg);
            return Operand::invalid();
        };
        self.record_use(span, obj);
        self.obj_operand(obj)
    }

    /// Operand denoted by a use of `obj`.
    pub(super) fn obj_operand(&mut self, obj: ObjId) -> Operand {
        let o = &self.prog.objects[obj.index()];
        let ty = o.ty;
        match &o.kind {
            ObjKind::Const { .. } if obj == self.prog.iota_obj() => {
                Operand::constant(ty, ConstValue::Int(self.ctx.iota.unwrap_or(0)))
            }
            ObjKind::Const { value } => Operand::constant(ty, value.clone().unwrap_or(ConstValue::Unknown)),
            ObjKind::Var(_) => Operand::new(Mode::Variable, ty),
            ObjKind::TypeName { .. } => Operand::new(Mode::TypeExpr, ty),
            ObjKind::Func { .. } | ObjKind::Nil => Operand::new(Mode::Value, ty),
            ObjKind::Builtin(b) => Operand {
                builtin: Some(*b),
                ..Operand::new(Mode::Builtin, ty)
            },
            ObjKind::PkgName { .. } | ObjKind::Label => Operand::invalid(),
        }
    }

    fn basic_lit(&mut self, lit: BasicLit) -> Operand {
        let raw = &self.src()[lit.raw.range()];
        let (kind, value) = match lit.kind {
            BasicLitKind::Int => (BasicKind::UntypedInt, ConstValue::parse_int(raw)),
            BasicLitKind::Float => (BasicKind::UntypedFloat, ConstValue::parse_float(raw)),
            BasicLitKind::Imag => (BasicKind::UntypedComplex, ConstValue::Unknown),
            BasicLitKind::Rune => (BasicKind::UntypedRune, ConstValue::parse_rune(raw)),
            BasicLitKind::String => (BasicKind::UntypedString, ConstValue::parse_string(raw)),
        };
        Operand::constant(self.basic(kind), value)
    }

    // -------------------------------------------------------------------------
    // Composite literals
    // -------------------------------------------------------------------------

    /// Length of `[...]T{...}`.
    fn literal_len(&mut self, elems: &[KeyedElement]) -> u64 {
        let mut next = 0u64;
        let mut len = 0u64;
        for el in elems {
            if let Some(Key::Expr(k)) = el.key {
                if let Some(i) = self.expr(k).value.and_then(|v| v.as_int()) {
                    next = u64::try_from(i).unwrap_or(0);
                }
            }
            next += 1;
            len = len.max(next);
        }
        len
    }

    /// Checks the elements of a literal of type `ty`.
    fn literal(&mut self, ty: TyId, elems: ListRef<KeyedElement>) {
        let arena = self.arena();
        let mut base = self.prog.types.underlying(ty);
        if let Type::Pointer(e) = self.prog.types.get(base) {
            base = self.prog.types.underlying(*e);
        }
        match self.prog.types.get(base).clone() {
            Type::Struct(st) => {
                for (i, el) in arena.keyed_elems_list(elems).iter().enumerate() {
                    let field = match el.key {
                        Some(Key::Name(id)) => {
                            let f = st.fields.iter().copied().find(|&f| self.prog.objects[f.index()].name == id.sym);
                            if let Some(f) = f {
                                self.record_use(id.pos, f);
                            }
                            f
                        }
                        Some(Key::Expr(k)) => {
                            self.expr(k);
                            None
                        }
                        Some(Key::Literal(_)) => None,
                        None => st.fields.get(i).copied(),
                    };
                    let fty = field.map_or(TypeTable::INVALID, |f| self.prog.objects[f.index()].ty);
                    self.element(el.value, fty);
                }
            }
            Type::Array { elem, .. } | Type::Slice(elem) => {
                for el in arena.keyed_elems_list(elems) {
                    self.key(el.key, self.basic(BasicKind::Int));
                    self.element(el.value, elem);
                }
            }
            Type::Map { key, value } => {
                for el in arena.keyed_elems_list(elems) {
                    self.key(el.key, key);
                    self.element(el.value, value);
                }
            }
            _ => {
                for el in arena.keyed_elems_list(elems) {
                    self.key(el.key, TypeTable::INVALID);
                    self.element(el.value, TypeTable::INVALID);
                }
            }
        }
    }

    fn key(&mut self, key: Option<Key>, ty: TyId) {
        match key {
            Some(Key::Name(id)) => self.ident_name(id),
            Some(Key::Expr(k)) => {
                self.expr(k);
            }
            Some(Key::Literal(lv)) => self.literal(ty, lv.elems),
            None => {}
        }
    }

    fn element(&mut self, el: Element, ty: TyId) {
        match el {
            Element::Expr(e) => {
                self.expr(e);
            }
            Element::Literal(lv) => self.literal(ty, lv.elems),
        }
    }

    /// A bare identifier with no expression node of its own.
    fn ident_name(&mut self, id: IdentName) {
        if let Some(obj) = self.lookup(id.sym) {
            self.record_use(id.pos, obj);
        }
    }

    // -------------------------------------------------------------------------
    // Selectors and indexing
    // -------------------------------------------------------------------------

    fn selector(&mut self, e: ExprId, base: ExprId, sel: IdentName) -> Operand {
        let arena = self.arena();
        if let Expr::Ident(sym) = arena.exprs[base] {
            let pkg = self
                .lookup(sym)
                .filter(|&o| matches!(self.prog.objects[o.index()].kind, ObjKind::PkgName { .. }));
            if let Some(pkg_obj) = pkg {
                self.record_use(arena.exprs.span(base), pkg_obj);
                let ObjKind::PkgName { imported } = self.prog.objects[pkg_obj.index()].kind else {
                    return Operand::invalid();
                };
                let scope = self.prog.packages[imported.index()].scope;
                let member = self.prog.scopes[scope.index()]
                    .lookup(sel.sym)
                    .filter(|_| crate::program::is_exported(self.name(sel.sym)));
                let Some(member) = member else {
                    let msg = format!("undefined: {}.{}", self.name(sym), self.name(sel.sym));
                    self.error(sel.pos, msg);
                    return Operand::invalid();
                };
                self.record_use(sel.pos, member);
                return self.obj_operand(member);
            }
        }

        let x = self.expr(base);
        if x.mode == Mode::Invalid {
            return x;
        }
        let mut recv = x.ty;
        if let Type::TypeParam(p) = self.prog.types.get(recv) {
            recv = p.constraint;
        }
        let Some(found) = self.prog.lookup_field_or_method(recv, sel.sym) else {
            let msg = format!("{} undefined", self.name(sel.sym));
            self.error(sel.pos, msg);
            return Operand::invalid();
        };
        self.record_use(sel.pos, found.obj);
        let obj = self.prog.objects[found.obj.index()].clone();
        let fid = self.fid();

        if x.mode == Mode::TypeExpr {
            let method_ty = self.method_type(x.ty, &found.index, &obj);
            let ty = self.method_expr_type(x.ty, method_ty);
            self.prog.info.selections.insert(
                (fid, e),
                Selection {
                    kind: SelectionKind::MethodExpr,
                    recv: x.ty,
                    obj: found.obj,
                    index: found.index,
                    indirect: found.indirect,
                },
            );
            return Operand::new(Mode::Value, ty);
        }

        let (kind, op) = if obj.is_field() {
            (SelectionKind::FieldVal, Operand::new(Mode::Variable, obj.ty))
        } else {
            let ty = self.method_type(x.ty, &found.index, &obj);
            (SelectionKind::MethodVal, Operand::new(Mode::Value, ty))
        };
        self.prog.info.selections.insert(
            (fid, e),
            Selection {
                kind,
                recv: x.ty,
                obj: found.obj,
                index: found.index,
                indirect: found.indirect,
            },
        );
        op
    }

    /// Type of method `m` reached from `recv` along `index`, with the type
    /// arguments of an instantiated receiver substituted.
    fn method_type(&mut self, recv: TyId, index: &[u32], m: &Object) -> TyId {
        let mut t = recv;
        for &i in &index[..index.len().saturating_sub(1)] {
            if let Some(e) = self.prog.types.pointer_elem(t) {
                t = e;
            }
            let field = match self.prog.types.get(self.prog.types.underlying(t)) {
                Type::Struct(st) => st.fields.get(i as usize).copied(),
                _ => None,
            };
            match field {
                Some(f) => t = self.prog.objects[f.index()].ty,
                None => return m.ty,
            }
        }
        if let Some(e) = self.prog.types.pointer_elem(t) {
            t = e;
        }
        let map: SubstMap = match self.prog.types.get(t) {
            Type::Named(n) => match n.origin.map(|o| self.prog.types.get(o)) {
                Some(Type::Named(g)) => g.tparams.iter().copied().zip(n.targs.iter().copied()).collect(),
                _ => SubstMap::default(),
            },
            _ => SubstMap::default(),
        };
        self.prog.subst(m.ty, &map)
    }

    /// `T.m` has the receiver as its first parameter.
    fn method_expr_type(&mut self, recv: TyId, method_ty: TyId) -> TyId {
        let Some(sig) = self.prog.types.signature(method_ty).cloned() else {
            return TypeTable::INVALID;
        };
        let name = self.prog.interner.intern("");
        let first = self.new_object(name, ObjKind::Var(VarKind::Param), recv, None, None, 0);
        let mut params = vec![first];
        params.extend(sig.params);
        self.prog.types.alloc(Type::Signature(Signature {
            recv: None,
            tparams: Vec::new(),
            params,
            results: sig.results,
            variadic: sig.variadic,
        }))
    }

    fn index(&mut self, base: ExprId, indices: ListRef<ExprId>) -> Operand {
        let arena = self.arena();
        let x = self.expr(base);
        let idx = arena.exprs_list(indices);

        if x.mode == Mode::TypeExpr {
            let targs: Vec<TyId> = idx.iter().map(|&i| self.expr_as_type(i)).collect();
            let ty = match self.name_pos(base) {
                Some(name) => self.instantiate_at(x.ty, targs, name),
                None => self.prog.instantiate(x.ty, targs),
            };
            return Operand::new(Mode::TypeExpr, ty);
        }
        if let Some(sig) = self.prog.types.signature(x.ty).filter(|s| !s.tparams.is_empty()) {
            let tparams = sig.tparams.clone();
            let targs: Vec<TyId> = idx.iter().map(|&i| self.expr_as_type(i)).collect();
            let map: SubstMap = tparams.iter().copied().zip(targs.iter().copied()).collect();
            if let Some(name) = self.name_pos(base) {
                let fid = self.fid();
                self.prog.info.instances.insert((fid, name.pos.start), targs.iter().copied().collect());
            }
            let ty = self.prog.subst(x.ty, &map);
            return Operand::new(Mode::Value, ty);
        }

        for &i in idx {
            self.expr(i);
        }
        let types = &self.prog.types;
        match types.get(types.underlying(x.ty)).clone() {
            Type::Basic(k) if matches!(k, BasicKind::String | BasicKind::UntypedString) => {
                Operand::new(Mode::Value, self.basic(BasicKind::Byte))
            }
            Type::Slice(elem) => Operand::new(Mode::Variable, elem),
            Type::Array { elem, .. } => {
                let mode = if x.mode == Mode::Variable { Mode::Variable } else { Mode::Value };
                Operand::new(mode, elem)
            }
            Type::Pointer(p) => match types.get(types.underlying(p)) {
                Type::Array { elem, .. } => Operand::new(Mode::Variable, *elem),
                _ => Operand::invalid(),
            },
            Type::Map { value, .. } => Operand::new(Mode::MapIndex, value),
            _ => Operand::invalid(),
        }
    }

    /// Identifier naming the function or type of `e`: `f`, `pkg.f`, `x.m`.
    fn name_pos(&self, e: ExprId) -> Option<IdentName> {
        let arena = self.arena();
        let e = arena.unparen(e);
        match arena.exprs[e] {
            Expr::Ident(sym) => Some(IdentName {
                sym,
                pos: arena.exprs.span(e),
            }),
            Expr::Selector { sel, .. } => Some(sel),
            Expr::Index { base, .. } => self.name_pos(base),
            _ => None,
        }
    }

    // -------------------------------------------------------------------------
    // Calls
    // -------------------------------------------------------------------------

    fn call(&mut self, func: ExprId, args: ListRef<ExprId>, spread: bool) -> Operand {
        let arena = self.arena();
        let args = arena.exprs_list(args);
        let f = self.expr(func);
        match f.mode {
            Mode::Invalid => {
                for &a in args {
                    self.expr(a);
                }
                return Operand::invalid();
            }
            Mode::TypeExpr => return self.conversion(f.ty, args),
            Mode::Builtin => return self.builtin(f.builtin, args),
            _ => {}
        }
        let Some(mut sig) = self.prog.types.signature(f.ty).cloned() else {
            for &a in args {
                self.expr(a);
            }
            let msg = "cannot call non-function";
            self.error(arena.exprs.span(func), msg);
            return Operand::invalid();
        };

        let arg_types: Vec<TyId> = if args.len() == 1 && sig.params.len() > 1 {
            let x = self.expr(args[0]);
            match self.prog.types.get(x.ty) {
                Type::Tuple(ts) => ts.clone(),
                _ => vec![x.ty],
            }
        } else {
            args.iter().map(|&a| self.expr(a).ty).collect()
        };

        if !sig.tparams.is_empty() {
            let mut map = SubstMap::default();
            let n = sig.params.len();
            for (i, &at) in arg_types.iter().enumerate() {
                let Some(&p) = sig.params.get(i.min(n.saturating_sub(1))) else { break };
                let mut pt = self.prog.objects[p.index()].ty;
                if sig.variadic && i + 1 >= n && !spread {
                    if let Type::Slice(e) = self.prog.types.get(pt) {
                        pt = *e;
                    }
                }
                let at = self.prog.types.default_type(at);
                self.prog.unify(pt, at, &mut map);
            }
            let targs: SmallVec<[TyId; 2]> = sig
                .tparams
                .iter()
                .map(|tp| map.get(tp).copied().unwrap_or(TypeTable::INVALID))
                .collect();
            if let Some(name) = self.name_pos(func) {
                let fid = self.fid();
                self.prog.info.instances.entry((fid, name.pos.start)).or_insert(targs);
            }
            let inst = self.prog.subst(f.ty, &map);
            self.record(func, &Operand::new(f.mode, inst));
            if let Some(s) = self.prog.types.signature(inst) {
                sig = s.clone();
            }
        }

        match sig.results.as_slice() {
            [] => Operand::new(Mode::NoValue, TypeTable::INVALID),
            [r] => Operand::new(Mode::Value, self.prog.objects[r.index()].ty),
            rs => {
                let tys = rs.iter().map(|r| self.prog.objects[r.index()].ty).collect();
                let ty = self.prog.types.alloc(Type::Tuple(tys));
                Operand::new(Mode::Value, ty)
            }
        }
    }

    /// `T(x)`; constants stay constant when converted to a basic type.
    fn conversion(&mut self, target: TyId, args: &[ExprId]) -> Operand {
        let mut x = Operand::invalid();
        for &a in args {
            x = self.expr(a);
        }
        let basic_target = matches!(self.prog.types.get(self.prog.types.underlying(target)), Type::Basic(_));
        match x.value {
            Some(v) if x.mode == Mode::Constant && basic_target => Operand::constant(target, v),
            _ => Operand::new(Mode::Value, target),
        }
    }

    fn builtin(&mut self, b: Option<Builtin>, args: &[ExprId]) -> Operand {
        let Some(b) = b else {
            return Operand::invalid();
        };
        let int = self.basic(BasicKind::Int);
        match b {
            Builtin::Make | Builtin::New => {
                let ty = match args.first() {
                    Some(&t) => self.expr_as_type(t),
                    None => TypeTable::INVALID,
                };
                for &a in args.iter().skip(1) {
                    self.expr(a);
                }
                let ty = if b == Builtin::New {
                    self.prog.types.alloc(Type::Pointer(ty))
                } else {
                    ty
                };
                return Operand::new(Mode::Value, ty);
            }
            _ => {}
        }
        let xs: Vec<Operand> = args.iter().map(|&a| self.expr(a)).collect();
        match b {
            Builtin::Len | Builtin::Cap => match xs.first().and_then(|x| x.value.clone()) {
                Some(ConstValue::Str(s)) => Operand::constant(int, ConstValue::Int(s.len() as i128)),
                _ => Operand::new(Mode::Value, int),
            },
            Builtin::Append => Operand::new(Mode::Value, xs.first().map_or(TypeTable::INVALID, |x| x.ty)),
            Builtin::Copy => Operand::new(Mode::Value, int),
            Builtin::Recover => Operand::new(Mode::Value, self.prog.any_type()),
            Builtin::Complex => {
                let untyped = xs.iter().all(|x| self.prog.types.is_untyped(x.ty));
                let k = if untyped { BasicKind::UntypedComplex } else { BasicKind::Complex128 };
                Operand::new(Mode::Value, self.basic(k))
            }
            Builtin::Real | Builtin::Imag => Operand::new(Mode::Value, self.basic(BasicKind::Float64)),
            Builtin::Min | Builtin::Max => {
                let ty = xs
                    .iter()
                    .map(|x| x.ty)
                    .find(|&t| !self.prog.types.is_untyped(t))
                    .or_else(|| xs.first().map(|x| x.ty))
                    .unwrap_or(TypeTable::INVALID);
                let op = if b == Builtin::Min { BinaryOp::Lt } else { BinaryOp::Gt };
                let mut best: Option<ConstValue> = None;
                for x in &xs {
                    match (&x.value, &best) {
                        (Some(v), None) if x.mode == Mode::Constant => best = Some(v.clone()),
                        (Some(v), Some(cur)) if x.mode == Mode::Constant => {
                            if ConstValue::binary(op, v, cur) == ConstValue::Bool(true) {
                                best = Some(v.clone());
                            }
                        }
                        _ => return Operand::new(Mode::Value, ty),
                    }
                }
                match best {
                    Some(v) => Operand::constant(ty, v),
                    None => Operand::new(Mode::Value, ty),
                }
            }
            Builtin::Clear
            | Builtin::Close
            | Builtin::Delete
            | Builtin::Panic
            | Builtin::Print
            | Builtin::Println
            | Builtin::Make
            | Builtin::New => Operand::new(Mode::NoValue, TypeTable::INVALID),
        }
    }

    // -------------------------------------------------------------------------
    // Operators
    // -------------------------------------------------------------------------

    fn unary(&mut self, op: UnaryOp, e: ExprId) -> Operand {
        let x = self.expr(e);
        match op {
            UnaryOp::Addr => {
                let ty = self.prog.types.alloc(Type::Pointer(x.ty));
                Operand::new(Mode::Value, ty)
            }
            UnaryOp::Deref if x.mode == Mode::TypeExpr => {
                let ty = self.prog.types.alloc(Type::Pointer(x.ty));
                Operand::new(Mode::TypeExpr, ty)
            }
            UnaryOp::Deref => match self.prog.types.pointer_elem(x.ty) {
                Some(elem) => Operand::new(Mode::Variable, elem),
                None => Operand::invalid(),
            },
            UnaryOp::Recv => match self.prog.types.get(self.prog.types.underlying(x.ty)) {
                Type::Chan { elem, .. } => Operand::new(Mode::CommaOk, *elem),
                _ => Operand::invalid(),
            },
            UnaryOp::Plus | UnaryOp::Minus | UnaryOp::Not | UnaryOp::Xor => match x.value {
                Some(v) if x.mode == Mode::Constant => Operand::constant(x.ty, ConstValue::unary(op, &v)),
                _ => Operand::new(Mode::Value, x.ty),
            },
        }
    }

    fn binary(&mut self, left: ExprId, op: BinaryOp, right: ExprId) -> Operand {
        let x = self.expr(left);
        let y = self.expr(right);
        let ty = if op.is_comparison() {
            self.basic(BasicKind::UntypedBool)
        } else if op.is_shift() {
            x.ty
        } else {
            self.mixed_type(x.ty, y.ty)
        };
        match (&x.value, &y.value) {
            (Some(a), Some(b)) if x.mode == Mode::Constant && y.mode == Mode::Constant => {
                let integer = self.prog.types.basic_kind(ty).is_some_and(|k| k.is_integer());
                let v = match (a, b) {
                    (ConstValue::Int(p), ConstValue::Int(q)) if op == BinaryOp::Div && !integer && *q != 0 => {
                        ConstValue::Float(*p as f64 / *q as f64)
                    }
                    _ => ConstValue::binary(op, a, b),
                };
                Operand::constant(ty, v)
            }
            _ => Operand::new(Mode::Value, ty),
        }
    }

    /// Result type of an arithmetic operation: the typed operand wins, two
    /// untyped operands take the higher numeric kind.
    fn mixed_type(&self, x: TyId, y: TyId) -> TyId {
        let types = &self.prog.types;
        match (types.is_untyped(x), types.is_untyped(y)) {
            (true, true) => {
                let rank = |t: TyId| types.basic_kind(t).map_or(0, |k| k.untyped_rank());
                if rank(y) > rank(x) { y } else { x }
            }
            (true, false) => y,
            _ => x,
        }
    }
}
