//! Types back to Go source text.

use std::fmt::Write;

use gofix_syntax::ast::ChanDir;

use crate::program::Program;
use crate::types::Type;
use crate::{ObjId, PkgId, TyId};

/// Maps a package to the prefix its names are written with; `None` writes
/// names unqualified.
pub type Qualifier<'q> = &'q dyn Fn(PkgId) -> Option<String>;

/// Spells a type parameter; `None` keeps its declared name.
pub type TypeParamText<'q> = &'q dyn Fn(TyId) -> Option<String>;

impl Program {
    /// Source form of `ty`, naming packages through `qual`.
    pub fn type_string(&self, ty: TyId, qual: Qualifier<'_>) -> String {
        let mut out = String::new();
        Printer {
            prog: self,
            qual,
            tparam: None,
            depth: 0,
            canonical: false,
        }
        .ty(&mut out, ty);
        out
    }

    /// Like [`Program::type_string`], with type parameters spelled by
    /// `tparam`.
    pub fn type_string_with(&self, ty: TyId, qual: Qualifier<'_>, tparam: TypeParamText<'_>) -> String {
        let mut out = String::new();
        Printer {
            prog: self,
            qual,
            tparam: Some(tparam),
            depth: 0,
            canonical: false,
        }
        .ty(&mut out, ty);
        out
    }

    /// Form qualified by full package paths. Two types print the same
    /// canonical string exactly when they are identical.
    pub fn canonical_type_string(&self, ty: TyId) -> String {
        let qual = |p: PkgId| Some(self.package(p).path.clone());
        let mut out = String::new();
        Printer {
            prog: self,
            qual: &qual,
            tparam: None,
            depth: 0,
            canonical: true,
        }
        .ty(&mut out, ty);
        out
    }
}

struct Printer<'a, 'q> {
    prog: &'a Program,
    qual: Qualifier<'q>,
    tparam: Option<TypeParamText<'q>>,
    depth: u32,
    /// Spell `byte`, `rune` and `any` as the types they stand for.
    canonical: bool,
}

impl Printer<'_, '_> {
    fn ty(&mut self, out: &mut String, ty: TyId) {
        if self.depth > 64 {
            out.push_str("...");
            return;
        }
        self.depth += 1;
        self.ty_inner(out, ty);
        self.depth -= 1;
    }

    fn ty_inner(&mut self, out: &mut String, ty: TyId) {
        let prog = self.prog;
        if ty == prog.any_type() && !self.canonical {
            out.push_str("any");
            return;
        }
        match prog.types.get(ty) {
            Type::Invalid => out.push_str("invalid type"),
            Type::Basic(k) if self.canonical => out.push_str(k.canonical().name()),
            Type::Basic(k) => out.push_str(k.name()),
            Type::Named(n) => {
                self.obj_name(out, n.obj);
                if !n.targs.is_empty() {
                    out.push('[');
                    self.list(out, &n.targs);
                    out.push(']');
                }
            }
            Type::TypeParam(p) => match self.tparam.and_then(|f| f(ty)) {
                Some(text) => out.push_str(&text),
                None => out.push_str(prog.obj_name(p.obj)),
            },
            Type::Pointer(e) => {
                out.push('*');
                self.ty(out, *e);
            }
            Type::Slice(e) => {
                out.push_str("[]");
                self.ty(out, *e);
            }
            Type::Array { len, elem } => {
                match len {
                    Some(n) => {
                        let _ = write!(out, "[{n}]");
                    }
                    None => out.push_str("[...]"),
                }
                self.ty(out, *elem);
            }
            Type::Map { key, value } => {
                out.push_str("map[");
                self.ty(out, *key);
                out.push(']');
                self.ty(out, *value);
            }
            Type::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                let paren = *dir != ChanDir::Recv
                    && matches!(prog.types.get(*elem), Type::Chan { dir: ChanDir::Recv, .. });
                if paren {
                    out.push('(');
                }
                self.ty(out, *elem);
                if paren {
                    out.push(')');
                }
            }
            Type::Signature(_) => {
                out.push_str("func");
                self.signature(out, ty);
            }
            Type::Struct(s) => {
                out.push_str("struct{");
                for (i, &f) in s.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    let field = prog.object(f);
                    let embedded = matches!(
                        field.kind,
                        crate::ObjKind::Var(crate::VarKind::Field { embedded: true })
                    );
                    if !embedded {
                        out.push_str(prog.obj_name(f));
                        out.push(' ');
                    }
                    self.ty(out, field.ty);
                    if let Some(Some(tag)) = s.tags.get(i) {
                        out.push(' ');
                        out.push_str(tag);
                    }
                }
                out.push('}');
            }
            Type::Interface(it) => {
                out.push_str("interface{");
                let mut first = true;
                for &m in &it.methods {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    out.push_str(prog.obj_name(m));
                    self.signature(out, prog.object(m).ty);
                }
                for &e in &it.embeds {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    self.ty(out, e);
                }
                out.push('}');
            }
            Type::Tuple(ts) => {
                out.push('(');
                self.list(out, ts);
                out.push(')');
            }
            Type::Union(terms) => {
                for (i, t) in terms.iter().enumerate() {
                    if i > 0 {
                        out.push_str(" | ");
                    }
                    if t.tilde {
                        out.push('~');
                    }
                    self.ty(out, t.ty);
                }
            }
        }
    }

    fn obj_name(&mut self, out: &mut String, obj: ObjId) {
        let o = self.prog.object(obj);
        if let Some(prefix) = o.pkg.and_then(|p| (self.qual)(p)) {
            if !prefix.is_empty() {
                out.push_str(&prefix);
                out.push('.');
            }
        }
        out.push_str(self.prog.interner.resolve(o.name));
    }

    fn list(&mut self, out: &mut String, tys: &[TyId]) {
        for (i, &t) in tys.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.ty(out, t);
        }
    }

    /// Parameter and result lists of a signature, without names.
    fn signature(&mut self, out: &mut String, ty: TyId) {
        let prog = self.prog;
        let Type::Signature(sig) = prog.types.get(ty) else {
            out.push_str("()");
            return;
        };
        out.push('(');
        let n = sig.params.len();
        for (i, &p) in sig.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let pty = prog.object(p).ty;
            match prog.types.get(pty) {
                Type::Slice(elem) if sig.variadic && i + 1 == n => {
                    out.push_str("...");
                    self.ty(out, *elem);
                }
                _ => self.ty(out, pty),
            }
        }
        out.push(')');
        match sig.results.as_slice() {
            [] => {}
            [r] => {
                out.push(' ');
                self.ty(out, prog.object(*r).ty);
            }
            rs => {
                out.push_str(" (");
                let tys: Vec<TyId> = rs.iter().map(|&r| prog.object(r).ty).collect();
                self.list(out, &tys);
                out.push(')');
            }
        }
    }
}
