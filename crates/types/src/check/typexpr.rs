//! Type expressions.

use gofix_syntax::ast::{ArrayLen, Expr, FieldList, IdentName, InterfaceElem, Results, SignatureId, TypeId};

use super::{Checker, Type_};
use crate::objects::{ObjKind, VarKind};
use crate::scope::ScopeKind;
use crate::types::{InterfaceType, Signature, StructType, Term, Type, TypeTable};
use crate::{ObjId, ScopeId, TyId};

impl Checker<'_> {
    /// Model type denoted by the type expression `t`.
    pub(super) fn resolve_type(&mut self, t: TypeId) -> TyId {
        let arena = self.arena();
        match arena.types[t] {
            Type_::Named { pkg, name, args } => {
                let Some(obj) = self.type_name(pkg, name) else {
                    return TypeTable::INVALID;
                };
                let ty = self.prog.objects[obj.index()].ty;
                if args.is_empty() {
                    return ty;
                }
                let targs: Vec<TyId> = arena.types_list(args).iter().map(|&a| self.resolve_type(a)).collect();
                self.instantiate_at(ty, targs, name)
            }
            Type_::Pointer { elem, .. } => {
                let e = self.resolve_type(elem);
                self.prog.types.alloc(Type::Pointer(e))
            }
            Type_::Array { len, elem } => {
                let len = match len {
                    ArrayLen::Expr(e) => self.expr(e).value.and_then(|v| v.as_int()).and_then(|n| u64::try_from(n).ok()),
                    ArrayLen::Ellipsis(_) => None,
                };
                let elem = self.resolve_type(elem);
                self.prog.types.alloc(Type::Array { len, elem })
            }
            Type_::Slice { elem } => {
                let e = self.resolve_type(elem);
                self.prog.types.alloc(Type::Slice(e))
            }
            Type_::Map { key, value } => {
                let key = self.resolve_type(key);
                let value = self.resolve_type(value);
                self.prog.types.alloc(Type::Map { key, value })
            }
            Type_::Chan { dir, elem } => {
                let elem = self.resolve_type(elem);
                self.prog.types.alloc(Type::Chan { dir, elem })
            }
            Type_::Func { sig, .. } => {
                let span = arena.types.span(t);
                let outer = self.open_scope(ScopeKind::Func, span);
                let scope = self.scope();
                let sig = self.signature(sig, Some(scope), span.start);
                self.close_scope(outer);
                self.prog.types.alloc(Type::Signature(sig))
            }
            Type_::Struct { fields, .. } => self.struct_type(arena.fields_list(fields)),
            Type_::Interface { elems, .. } => {
                let mut it = InterfaceType::default();
                for elem in arena.interface_elems(elems) {
                    match *elem {
                        InterfaceElem::Method { name, sig } => {
                            let sig = self.signature(sig, None, 0);
                            let ty = self.prog.types.alloc(Type::Signature(sig));
                            let m = self.new_object(name.sym, ObjKind::Func { recv_base: None }, ty, Some(name.pos), None, 0);
                            self.record_def(name.pos, m);
                            it.methods.push(m);
                        }
                        InterfaceElem::Embed(t) => {
                            let e = self.resolve_type(t);
                            it.embeds.push(e);
                        }
                    }
                }
                self.prog.types.alloc(Type::Interface(it))
            }
            Type_::Union { terms } => {
                let terms: Vec<Term> = arena
                    .type_terms(terms)
                    .iter()
                    .map(|term| Term {
                        tilde: term.tilde,
                        ty: self.resolve_type(term.typ),
                    })
                    .collect();
                self.prog.types.alloc(Type::Union(terms))
            }
            Type_::Paren { typ } => self.resolve_type(typ),
        }
    }

    /// Resolves `pkg.name` or `name` to a type name and records the uses.
    fn type_name(&mut self, pkg: Option<IdentName>, name: IdentName) -> Option<ObjId> {
        let obj = match pkg {
            Some(p) => {
                let pkg_obj = self.lookup(p.sym)?;
                self.record_use(p.pos, pkg_obj);
                let ObjKind::PkgName { imported } = self.prog.objects[pkg_obj.index()].kind else {
                    let msg = format!("{} is not a package", self.name(p.sym));
                    self.error(p.pos, msg);
                    return None;
                };
                let scope = self.prog.packages[imported.index()].scope;
                self.prog.scopes[scope.index()].lookup(name.sym)
            }
            None => self.lookup(name.sym),
        };
        let Some(obj) = obj else {
            let msg = format!("undefined: {}", self.name(name.sym));
            self.error(name.pos, msg);
            return None;
        };
        self.record_use(name.pos, obj);
        if !self.prog.objects[obj.index()].is_type_name() {
            let msg = format!("{} is not a type", self.name(name.sym));
            self.error(name.pos, msg);
            return None;
        }
        Some(obj)
    }

    /// Instantiates the generic type `generic`, recording the type
    /// arguments at the position of `name`. A receiver naming its own
    /// type parameters denotes the generic type itself.
    pub(super) fn instantiate_at(&mut self, generic: TyId, targs: Vec<TyId>, name: IdentName) -> TyId {
        let tparams = match self.prog.types.get(generic) {
            Type::Named(n) if !n.tparams.is_empty() => n.tparams.clone(),
            _ => return generic,
        };
        if tparams == targs {
            return generic;
        }
        let fid = self.fid();
        self.prog.info.instances.insert((fid, name.pos.start), targs.iter().copied().collect());
        self.prog.instantiate(generic, targs)
    }

    fn struct_type(&mut self, fields: &[gofix_syntax::ast::FieldId]) -> TyId {
        let arena = self.arena();
        let mut st = StructType::default();
        for &f in fields {
            let field = arena.fields[f];
            let ty = self.resolve_type(field.typ);
            let tag = field.tag.map(|t| self.src()[t.raw.range()].to_string());
            if field.is_embed {
                let Some(name) = embedded_name(arena, field.typ) else { continue };
                let obj = self.new_object(
                    name.sym,
                    ObjKind::Var(VarKind::Field { embedded: true }),
                    ty,
                    Some(name.pos),
                    None,
                    0,
                );
                self.record_def(name.pos, obj);
                st.fields.push(obj);
                st.tags.push(tag);
                continue;
            }
            for name in arena.ident_names(field.names) {
                let obj = self.new_object(
                    name.sym,
                    ObjKind::Var(VarKind::Field { embedded: false }),
                    ty,
                    Some(name.pos),
                    None,
                    0,
                );
                self.record_def(name.pos, obj);
                st.fields.push(obj);
                st.tags.push(tag.clone());
            }
        }
        self.prog.types.alloc(Type::Struct(st))
    }

    /// Parameters and results of a signature. With a `scope`, named
    /// parameters are declared in it, visible from `scope_pos`.
    pub(super) fn signature(&mut self, sig: SignatureId, scope: Option<ScopeId>, scope_pos: u32) -> Signature {
        let s = self.arena().signatures[sig];
        let mut out = Signature::default();
        let (params, variadic) = self.params(&s.params, VarKind::Param, scope, scope_pos);
        out.params = params;
        out.variadic = variadic;
        out.results = match s.results {
            Some(Results::Params(fl)) => self.params(&fl, VarKind::Result, scope, scope_pos).0,
            Some(Results::Type(t)) => {
                let ty = self.resolve_type(t);
                let name = self.prog.interner.intern("");
                vec![self.new_object(name, ObjKind::Var(VarKind::Result), ty, None, scope, scope_pos)]
            }
            None => Vec::new(),
        };
        out
    }

    fn params(&mut self, list: &FieldList, kind: VarKind, scope: Option<ScopeId>, scope_pos: u32) -> (Vec<ObjId>, bool) {
        let arena = self.arena();
        let mut out = Vec::new();
        let mut variadic = false;
        for &f in arena.fields_list(list.fields) {
            let field = arena.fields[f];
            let mut ty = self.resolve_type(field.typ);
            if field.ellipsis_pos.is_some() {
                ty = self.prog.types.alloc(Type::Slice(ty));
                variadic = true;
            }
            let names = arena.ident_names(field.names);
            if names.is_empty() {
                let name = self.prog.interner.intern("");
                out.push(self.new_object(name, ObjKind::Var(kind), ty, None, scope, scope_pos));
                continue;
            }
            for &name in names {
                let obj = match scope {
                    Some(s) => self.declare(s, name, ObjKind::Var(kind), ty, scope_pos),
                    None => {
                        let obj = self.new_object(name.sym, ObjKind::Var(kind), ty, Some(name.pos), None, 0);
                        self.record_def(name.pos, obj);
                        obj
                    }
                };
                out.push(obj);
            }
        }
        (out, variadic)
    }

    /// Type denoted by an expression used as a type argument or operand of
    /// `make`/`new`.
    pub(super) fn expr_as_type(&mut self, e: gofix_syntax::ast::ExprId) -> TyId {
        if let Expr::TypeExpr(t) = self.arena().exprs[e] {
            let ty = self.resolve_type(t);
            self.record(e, &super::Operand::new(crate::info::Mode::TypeExpr, ty));
            return ty;
        }
        let x = self.expr(e);
        if x.mode != crate::info::Mode::TypeExpr {
            self.error(self.arena().exprs.span(e), "not a type");
            return TypeTable::INVALID;
        }
        x.ty
    }
}

/// Name an embedded field is known by: the type name, without package
/// qualifier, pointer or type arguments.
pub(super) fn embedded_name(arena: &gofix_syntax::ast::AstArena, mut t: TypeId) -> Option<IdentName> {
    loop {
        match arena.types[t] {
            Type_::Pointer { elem, .. } | Type_::Paren { typ: elem } => t = elem,
            Type_::Named { name, .. } => return Some(name),
            _ => return None,
        }
    }
}
