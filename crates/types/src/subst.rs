//! Type identity, substitution of type parameters and argument inference.

use rustc_hash::FxHashMap;

use crate::objects::Object;
use crate::program::Program;
use crate::types::{InterfaceType, Named, Signature, StructType, Term, Type};
use crate::{ObjId, TyId};

pub(crate) type SubstMap = FxHashMap<TyId, TyId>;

impl Program {
    /// Structural type identity.
    pub fn identical(&self, a: TyId, b: TyId) -> bool {
        self.identical_at(a, b, 0)
    }

    fn identical_at(&self, a: TyId, b: TyId, depth: u32) -> bool {
        if a == b {
            return true;
        }
        if depth > 32 {
            return false;
        }
        let d = depth + 1;
        match (self.types.get(a), self.types.get(b)) {
            (Type::Basic(x), Type::Basic(y)) => x.canonical() == y.canonical(),
            (Type::Named(x), Type::Named(y)) => {
                x.origin.is_some()
                    && x.origin == y.origin
                    && x.targs.len() == y.targs.len()
                    && x.targs.iter().zip(&y.targs).all(|(&p, &q)| self.identical_at(p, q, d))
            }
            (Type::Pointer(x), Type::Pointer(y)) | (Type::Slice(x), Type::Slice(y)) => self.identical_at(*x, *y, d),
            (Type::Array { len: l1, elem: e1 }, Type::Array { len: l2, elem: e2 }) => {
                l1 == l2 && self.identical_at(*e1, *e2, d)
            }
            (Type::Map { key: k1, value: v1 }, Type::Map { key: k2, value: v2 }) => {
                self.identical_at(*k1, *k2, d) && self.identical_at(*v1, *v2, d)
            }
            (Type::Chan { dir: d1, elem: e1 }, Type::Chan { dir: d2, elem: e2 }) => {
                d1 == d2 && self.identical_at(*e1, *e2, d)
            }
            (Type::Signature(x), Type::Signature(y)) => {
                x.variadic == y.variadic
                    && self.same_obj_types(&x.params, &y.params, d)
                    && self.same_obj_types(&x.results, &y.results, d)
            }
            (Type::Struct(x), Type::Struct(y)) => {
                x.fields.len() == y.fields.len()
                    && x.tags == y.tags
                    && x.fields.iter().zip(&y.fields).all(|(&f, &g)| {
                        let (f, g) = (self.object(f), self.object(g));
                        f.name == g.name && f.kind == g.kind && self.identical_at(f.ty, g.ty, d)
                    })
            }
            (Type::Interface(_), Type::Interface(_)) => {
                let (mx, my) = (self.interface_methods(a), self.interface_methods(b));
                mx.len() == my.len()
                    && mx.iter().all(|&m| {
                        my.iter().any(|&n| {
                            self.object(m).name == self.object(n).name
                                && self.identical_at(self.object(m).ty, self.object(n).ty, d)
                        })
                    })
            }
            (Type::Tuple(x), Type::Tuple(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(&p, &q)| self.identical_at(p, q, d))
            }
            _ => false,
        }
    }

    fn same_obj_types(&self, xs: &[ObjId], ys: &[ObjId], d: u32) -> bool {
        xs.len() == ys.len()
            && xs
                .iter()
                .zip(ys)
                .all(|(&x, &y)| self.identical_at(self.object(x).ty, self.object(y).ty, d))
    }

    /// Replaces type parameters in `ty` according to `map`.
    pub(crate) fn subst(&mut self, ty: TyId, map: &SubstMap) -> TyId {
        if map.is_empty() {
            return ty;
        }
        self.subst_at(ty, map, 0)
    }

    fn subst_at(&mut self, ty: TyId, map: &SubstMap, depth: u32) -> TyId {
        if let Some(&t) = map.get(&ty) {
            return t;
        }
        if depth > 32 {
            return ty;
        }
        let d = depth + 1;
        match self.types.get(ty).clone() {
            Type::Pointer(e) => {
                let e2 = self.subst_at(e, map, d);
                if e2 == e { ty } else { self.types.alloc(Type::Pointer(e2)) }
            }
            Type::Slice(e) => {
                let e2 = self.subst_at(e, map, d);
                if e2 == e { ty } else { self.types.alloc(Type::Slice(e2)) }
            }
            Type::Array { len, elem } => {
                let e2 = self.subst_at(elem, map, d);
                if e2 == elem {
                    ty
                } else {
                    self.types.alloc(Type::Array { len, elem: e2 })
                }
            }
            Type::Map { key, value } => {
                let (k2, v2) = (self.subst_at(key, map, d), self.subst_at(value, map, d));
                if (k2, v2) == (key, value) {
                    ty
                } else {
                    self.types.alloc(Type::Map { key: k2, value: v2 })
                }
            }
            Type::Chan { dir, elem } => {
                let e2 = self.subst_at(elem, map, d);
                if e2 == elem {
                    ty
                } else {
                    self.types.alloc(Type::Chan { dir, elem: e2 })
                }
            }
            Type::Tuple(ts) => {
                let ts2: Vec<TyId> = ts.iter().map(|&t| self.subst_at(t, map, d)).collect();
                if ts2 == ts { ty } else { self.types.alloc(Type::Tuple(ts2)) }
            }
            Type::Signature(sig) => {
                let params = self.subst_vars(&sig.params, map, d);
                let results = self.subst_vars(&sig.results, map, d);
                if params == sig.params && results == sig.results {
                    return ty;
                }
                self.types.alloc(Type::Signature(Signature {
                    recv: sig.recv,
                    tparams: Vec::new(),
                    params,
                    results,
                    variadic: sig.variadic,
                }))
            }
            Type::Struct(st) => {
                let fields = self.subst_vars(&st.fields, map, d);
                if fields == st.fields {
                    return ty;
                }
                self.types.alloc(Type::Struct(StructType { fields, tags: st.tags }))
            }
            Type::Interface(it) => {
                let methods = self.subst_vars(&it.methods, map, d);
                let embeds: Vec<TyId> = it.embeds.iter().map(|&t| self.subst_at(t, map, d)).collect();
                if methods == it.methods && embeds == it.embeds {
                    return ty;
                }
                self.types.alloc(Type::Interface(InterfaceType { methods, embeds }))
            }
            Type::Union(terms) => {
                let terms2: Vec<Term> = terms
                    .iter()
                    .map(|t| Term {
                        tilde: t.tilde,
                        ty: self.subst_at(t.ty, map, d),
                    })
                    .collect();
                self.types.alloc(Type::Union(terms2))
            }
            Type::Named(n) if !n.targs.is_empty() => {
                let targs: Vec<TyId> = n.targs.iter().map(|&t| self.subst_at(t, map, d)).collect();
                if targs == n.targs {
                    return ty;
                }
                match n.origin {
                    Some(origin) => self.instantiate(origin, targs),
                    None => ty,
                }
            }
            _ => ty,
        }
    }

    /// Copies of `vars` with substituted types; unchanged objects are kept.
    fn subst_vars(&mut self, vars: &[ObjId], map: &SubstMap, d: u32) -> Vec<ObjId> {
        vars.iter()
            .map(|&v| {
                let ty = self.objects[v.index()].ty;
                let ty2 = self.subst_at(ty, map, d);
                if ty2 == ty {
                    v
                } else {
                    let obj = Object {
                        ty: ty2,
                        ..self.objects[v.index()].clone()
                    };
                    self.add_object(obj)
                }
            })
            .collect()
    }

    /// Instance of the generic named type `generic` with `targs`. Instances
    /// are shared: the same arguments give the same type.
    pub(crate) fn instantiate(&mut self, generic: TyId, targs: Vec<TyId>) -> TyId {
        if let Some(&t) = self.instances.get(&(generic, targs.clone())) {
            return t;
        }
        let Type::Named(g) = self.types.get(generic).clone() else {
            return generic;
        };
        let inst = self.types.alloc(Type::Named(Named {
            obj: g.obj,
            underlying: crate::TypeTable::INVALID,
            methods: Vec::new(),
            tparams: Vec::new(),
            targs: targs.clone(),
            origin: Some(generic),
        }));
        self.instances.insert((generic, targs), inst);
        self.complete_instance(inst);
        inst
    }

    /// Fills in the underlying type of an instance once its origin is
    /// resolved.
    pub(crate) fn complete_instance(&mut self, inst: TyId) {
        let Type::Named(n) = self.types.get(inst).clone() else {
            return;
        };
        let Some(origin) = n.origin else {
            return;
        };
        let Type::Named(g) = self.types.get(origin).clone() else {
            return;
        };
        if g.underlying == crate::TypeTable::INVALID {
            return;
        }
        let map: SubstMap = g.tparams.iter().copied().zip(n.targs.iter().copied()).collect();
        let u = self.subst(g.underlying, &map);
        let u = self.types.underlying(u);
        if let Type::Named(n) = self.types.get_mut(inst) {
            n.underlying = u;
        }
    }

    /// Completes instances created while their origin was still being
    /// declared.
    pub(crate) fn complete_pending_instances(&mut self) {
        let pending: Vec<TyId> = self
            .instances
            .values()
            .copied()
            .filter(|&t| matches!(self.types.get(t), Type::Named(n) if n.underlying == crate::TypeTable::INVALID))
            .collect();
        for t in pending {
            self.complete_instance(t);
        }
    }

    /// Binds type parameters in `param` by matching it against `arg`.
    pub(crate) fn unify(&self, param: TyId, arg: TyId, map: &mut SubstMap) {
        self.unify_at(param, arg, map, 0);
    }

    fn unify_at(&self, param: TyId, arg: TyId, map: &mut SubstMap, depth: u32) {
        if depth > 16 {
            return;
        }
        let d = depth + 1;
        match (self.types.get(param), self.types.get(arg)) {
            (Type::TypeParam(_), _) => {
                map.entry(param).or_insert(arg);
            }
            (Type::Pointer(p), Type::Pointer(a)) | (Type::Slice(p), Type::Slice(a)) => self.unify_at(*p, *a, map, d),
            (Type::Array { elem: p, .. }, Type::Array { elem: a, .. })
            | (Type::Chan { elem: p, .. }, Type::Chan { elem: a, .. }) => self.unify_at(*p, *a, map, d),
            (Type::Map { key: pk, value: pv }, Type::Map { key: ak, value: av }) => {
                self.unify_at(*pk, *ak, map, d);
                self.unify_at(*pv, *av, map, d);
            }
            (Type::Named(p), Type::Named(a)) if p.origin.is_some() && p.origin == a.origin => {
                for (&x, &y) in p.targs.iter().zip(&a.targs) {
                    self.unify_at(x, y, map, d);
                }
            }
            (Type::Signature(p), Type::Signature(a)) => {
                for (&x, &y) in p.params.iter().zip(&a.params).chain(p.results.iter().zip(&a.results)) {
                    self.unify_at(self.object(x).ty, self.object(y).ty, map, d);
                }
            }
            (Type::Slice(_), Type::Named(_)) => {
                let u = self.types.underlying(arg);
                if u != arg {
                    self.unify_at(param, u, map, d);
                }
            }
            _ => {}
        }
    }
}
