//! Finds `//go:fix inline` declarations of one package, checks them and
//! exports their facts.
//!
//! A directive on a `const` or `type` group covers every spec of the group;
//! a directive on a spec covers only that spec. Functions take the
//! directive on their own doc comment.

use std::rc::Rc;

use gofix_syntax::NodeRef;
use gofix_syntax::ast::{ArrayLen, Decl, DeclId, Expr, FuncDeclId, GenDecl, GenDeclKind, Span, Spec, TopLevelDecl, Type as TypeExpr, TypeSpec, ValueSpec};
use gofix_types::program::is_exported;
use gofix_types::{FileId, ObjId, ObjKind, PkgId, Program};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, warn};

use crate::callee::{self, Callee};
use crate::config::Options;
use crate::directive::fix_inline;
use crate::edit::Diagnostic;
use crate::error::DirectiveError;
use crate::expr::qualifier;
use crate::facts::{AliasFact, ConstFact, Fact, FactStore, ObjectKey};

/// Inlinable declarations of the package being analyzed.
#[derive(Debug, Default)]
pub struct LocalFacts {
    pub funcs: FxHashMap<ObjId, Rc<Callee>>,
    pub consts: FxHashMap<ObjId, ConstFact>,
    pub aliases: FxHashSet<ObjId>,
}

#[derive(Debug, Default)]
pub struct Discovery {
    pub facts: LocalFacts,
    /// Invalid directives and candidates.
    pub diagnostics: Vec<Diagnostic>,
    pub exported: usize,
}

/// Runs discovery over every file of `pkg`.
pub fn discover(prog: &Program, pkg: PkgId, options: &Options, store: &mut dyn FactStore) -> Discovery {
    let mut d = Discoverer {
        prog,
        options,
        store,
        out: Discovery::default(),
    };
    for &fid in &prog.package(pkg).files {
        d.file(fid);
    }
    d.out
}

struct Discoverer<'a> {
    prog: &'a Program,
    options: &'a Options,
    store: &'a mut dyn FactStore,
    out: Discovery,
}

impl Discoverer<'_> {
    fn file(&mut self, fid: FileId) {
        let prog = self.prog;
        let file = prog.file(fid);
        let arena = &file.arena;
        for &td in arena.top_decls(file.root.decls) {
            let root = match td {
                TopLevelDecl::Func(id) => {
                    self.func(fid, id);
                    NodeRef::Func(id)
                }
                TopLevelDecl::Decl(d) => {
                    self.decl(fid, d);
                    NodeRef::Decl(d)
                }
            };
            // Declarations in function bodies and literals. Their facts stay
            // in the package: `exportable` refuses anything not package-level.
            for &n in file.inspector.descendants(root) {
                if let NodeRef::Decl(d) = n {
                    self.decl(fid, d);
                }
            }
        }
    }

    fn func(&mut self, fid: FileId, id: FuncDeclId) {
        let prog = self.prog;
        let file = prog.file(fid);
        let fd = file.arena.funcs[id];
        let Some(dir) = fix_inline(&file.arena, &file.src, fd.doc) else {
            return;
        };
        let Some(obj) = prog.info.def(fid, fd.name.pos.start) else {
            return;
        };
        match callee::analyze(prog, fid, id, obj) {
            Ok(c) => {
                debug!(callee = %c.display(), "inlinable function");
                if self.exportable(obj) {
                    self.export(obj, Fact::Func(Box::new(c.clone())));
                }
                self.out.facts.funcs.insert(obj, Rc::new(c));
            }
            Err(e) => self.invalid(fid, dir, format!("invalid inlining candidate: {e}")),
        }
    }

    fn decl(&mut self, fid: FileId, d: DeclId) {
        let Decl::Gen(g) = self.prog.file(fid).arena.decls[d];
        match g.kind {
            GenDeclKind::Const | GenDeclKind::Type => self.group(fid, &g),
            GenDeclKind::Import | GenDeclKind::Var => {}
        }
    }

    fn group(&mut self, fid: FileId, g: &GenDecl) {
        let prog = self.prog;
        let file = prog.file(fid);
        let arena = &file.arena;
        let group_dir = fix_inline(arena, &file.src, g.doc);
        for spec in arena.specs_list(g.specs) {
            match spec {
                Spec::Value(vs) => {
                    if let Some(dir) = group_dir.or_else(|| fix_inline(arena, &file.src, vs.doc)) {
                        self.constant(fid, vs, dir);
                    }
                }
                Spec::Type(ts) => {
                    if let Some(dir) = group_dir.or_else(|| fix_inline(arena, &file.src, ts.doc)) {
                        self.alias(fid, ts, dir);
                    }
                }
                Spec::Import(_) => {}
            }
        }
    }

    fn constant(&mut self, fid: FileId, vs: &ValueSpec, dir: Span) {
        let prog = self.prog;
        let arena = &prog.file(fid).arena;
        let names = arena.ident_names(vs.names);
        let values = arena.exprs_list(vs.values);
        for (name, &value) in names.iter().zip(values) {
            let Some(lhs) = self.prog.info.def(fid, name.pos.start) else {
                continue;
            };
            match self.const_rhs(fid, value) {
                Ok(fact) => {
                    debug!(name = self.prog.obj_name(lhs), rhs = %fact.rhs_name, "inlinable constant");
                    if self.exportable(lhs) {
                        self.export(lhs, Fact::Const(fact.clone()));
                    }
                    self.out.facts.consts.insert(lhs, fact);
                }
                Err(e) => self.invalid(fid, dir, format!("invalid inline directive: {e}")),
            }
        }
    }

    /// The constant a const spec's value names.
    fn const_rhs(&self, fid: FileId, value: gofix_syntax::ast::ExprId) -> Result<ConstFact, DirectiveError> {
        let prog = self.prog;
        let arena = &prog.file(fid).arena;
        let pos = match arena.exprs[value] {
            Expr::Ident(_) => arena.exprs.span(value).start,
            Expr::Selector { expr, sel, .. } if qualifier(prog, fid, expr).is_some() => sel.pos.start,
            _ => return Err(DirectiveError::NotAConstName),
        };
        let rhs = prog.info.use_of(fid, pos).ok_or(DirectiveError::NotAConstName)?;
        if prog.in_universe(rhs) && prog.obj_name(rhs) == "iota" {
            return Err(DirectiveError::Iota);
        }
        if !matches!(prog.object(rhs).kind, ObjKind::Const { .. }) {
            return Err(DirectiveError::NotAConstName);
        }
        let (rhs_pkg_path, rhs_pkg_name) = prog
            .object(rhs)
            .pkg
            .map(|p| (prog.package(p).path.clone(), prog.package(p).name.clone()))
            .unwrap_or_default();
        Ok(ConstFact {
            rhs_name: prog.obj_name(rhs).to_string(),
            rhs_pkg_path,
            rhs_pkg_name,
            rhs_obj: Some(rhs),
        })
    }

    fn alias(&mut self, fid: FileId, ts: &TypeSpec, dir: Span) {
        let prog = self.prog;
        let file = prog.file(fid);
        let arena = &file.arena;
        if !ts.is_alias() {
            self.invalid(fid, dir, format!("invalid inline directive: {}", DirectiveError::NotAlias));
            return;
        }
        let root = NodeRef::Type(ts.typ);
        let array = std::iter::once(root)
            .chain(file.inspector.descendants(root).iter().copied())
            .any(|n| match n {
                NodeRef::Type(t) => matches!(
                    arena.types[t],
                    TypeExpr::Array { len: ArrayLen::Expr(e), .. } if !matches!(arena.exprs[e], Expr::BasicLit(_))
                ),
                _ => false,
            });
        if array {
            self.invalid(fid, dir, format!("invalid inline directive: {}", DirectiveError::ArrayType));
            return;
        }
        if ts.type_params.is_some() && !self.options.inline_generic_aliases {
            return;
        }
        let Some(obj) = self.prog.info.def(fid, ts.name.pos.start) else {
            return;
        };
        debug!(name = self.prog.obj_name(obj), "inlinable alias");
        if self.exportable(obj) {
            self.export(obj, Fact::Alias(AliasFact));
        }
        self.out.facts.aliases.insert(obj);
    }

    /// Exported package-level objects, and exported methods of exported
    /// types.
    fn exportable(&self, obj: ObjId) -> bool {
        let prog = self.prog;
        if !is_exported(prog.obj_name(obj)) {
            return false;
        }
        match prog.object(obj).kind {
            ObjKind::Func { recv_base: Some(base) } => is_exported(prog.obj_name(base)),
            _ => prog.is_package_level(obj),
        }
    }

    fn export(&mut self, obj: ObjId, fact: Fact) {
        let Some(key) = ObjectKey::of(self.prog, obj) else {
            return;
        };
        match self.store.export_object_fact(key, &fact) {
            Ok(()) => self.out.exported += 1,
            Err(e) => warn!(error = %e, "fact not exported"),
        }
    }

    fn invalid(&mut self, fid: FileId, dir: Span, message: String) {
        debug!(%message, "rejected directive");
        self.out.diagnostics.push(Diagnostic::new(fid, dir, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::{FactKind, MemoryFactStore};
    use gofix_types::ProgramBuilder;

    fn run(src: &str) -> (Program, Discovery, MemoryFactStore) {
        let prog = ProgramBuilder::new()
            .package("example.com/a", &[("a.go", src)])
            .build()
            .unwrap();
        let mut store = MemoryFactStore::new();
        let pkg = prog.package_by_path("example.com/a").unwrap();
        let d = discover(&prog, pkg, &Options::default(), &mut store);
        (prog, d, store)
    }

    fn messages(d: &Discovery) -> Vec<&str> {
        d.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn group_directive_covers_every_spec() {
        let (_, d, store) = run("package a\n\nconst Pointer = 1\nconst Other = 2\n\n//go:fix inline\nconst (\n\tPtr = Pointer\n\tOth = Other\n)\n");
        assert!(d.diagnostics.is_empty());
        assert_eq!(d.facts.consts.len(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn spec_directive_covers_only_its_spec() {
        let (_, d, _) = run("package a\n\nconst X = 1\n\nconst (\n\t//go:fix inline\n\tY = X\n\tZ = X\n)\n");
        assert_eq!(d.facts.consts.len(), 1);
    }

    #[test]
    fn iota_and_expressions_are_rejected() {
        let (_, d, _) = run("package a\n\n//go:fix inline\nconst I = iota\n\n//go:fix inline\nconst J = 1 + 2\n");
        assert_eq!(
            messages(&d),
            [
                "invalid inline directive: const value is iota",
                "invalid inline directive: const value is not the name of another constant",
            ]
        );
    }

    #[test]
    fn unexported_declarations_are_not_exported() {
        let (_, d, store) = run("package a\n\n//go:fix inline\nfunc f(x int) int { return x }\n");
        assert_eq!(d.facts.funcs.len(), 1);
        assert_eq!(d.exported, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn methods_of_exported_types_are_exported() {
        let (_, d, store) = run("package a\n\ntype T struct{}\n\n//go:fix inline\nfunc (T) M() int { return 1 }\n");
        assert_eq!(d.exported, 1);
        assert_eq!(store.keys(), [(ObjectKey::new("example.com/a", "T.M"), FactKind::Func)]);
    }

    #[test]
    fn alias_checks() {
        let (_, d, store) = run(
            "package a\n\nconst N = 5\n\ntype M[T any] []T\n\n//go:fix inline\ntype A = [N]int\n\n//go:fix inline\ntype B int\n\n//go:fix inline\ntype G[T any] = M[T]\n\n//go:fix inline\ntype C = [3]int\n",
        );
        assert_eq!(
            messages(&d),
            [
                "invalid inline directive: array types not supported",
                "invalid inline directive: not a type alias",
            ]
        );
        assert_eq!(d.facts.aliases.len(), 1);
        assert_eq!(store.keys(), [(ObjectKey::new("example.com/a", "C"), FactKind::Alias)]);
    }

    #[test]
    fn rejected_functions_report_the_reason() {
        let (_, d, _) = run("package a\n\n//go:fix inline\nfunc F() { type t int; var _ t }\n");
        assert_eq!(
            messages(&d),
            ["invalid inlining candidate: function body declares a local type"]
        );
        assert!(d.facts.funcs.is_empty());
    }

    #[test]
    fn declarations_inside_bodies_stay_in_package() {
        let (_, d, store) = run(
            "package a\n\nconst X = 1\n\nfunc _() {\n\t//go:fix inline\n\tconst C = X\n\t//go:fix inline\n\ttype A = int\n\t_ = C\n\tvar _ A\n}\n",
        );
        assert!(d.diagnostics.is_empty(), "{:?}", messages(&d));
        assert_eq!(d.facts.consts.len(), 1);
        assert_eq!(d.facts.aliases.len(), 1);
        assert_eq!(d.exported, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn directives_in_function_literals_are_checked() {
        let (_, d, _) = run("package a\n\nvar f = func() {\n\t//go:fix inline\n\tconst c = iota\n\t_ = c\n}\n");
        assert_eq!(messages(&d), ["invalid inline directive: const value is iota"]);
    }
}
