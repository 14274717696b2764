//! Uses of type aliases.
//!
//! The alias's right-hand side is printed back as source for the use
//! site: names of the use site's own package bare, names of other
//! packages under whatever qualifier the file has (or gets) for them.

use gofix_syntax::NodeRef;
use gofix_syntax::ast::{Decl, Expr, Span, Spec, TopLevelDecl};
use gofix_types::program::is_exported;
use gofix_types::{ObjId, PkgId, Program, TyId, Type};
use rustc_hash::FxHashMap;

use super::{Rewrite, Site, universe_object};
use crate::edit::TextEdit;
use crate::error::InlineError;
use crate::expr::type_needs_parens;
use crate::imports::ImportManager;

/// Replaces the use of alias `alias` at `span` (`node`) with its
/// right-hand side, instantiated with the type arguments at `args`.
pub(crate) fn inline_alias(
    site: &Site<'_>,
    node: NodeRef,
    span: Span,
    alias: ObjId,
    args: &[Span],
) -> Result<Rewrite, InlineError> {
    let prog = site.prog;
    let ty = prog.object(alias).ty;
    let params = type_params(prog, alias);
    if !params.is_empty() && !site.options.inline_generic_aliases {
        return Err(InlineError::Unsupported("generic alias"));
    }
    if params.len() != args.len() {
        return Err(InlineError::Unsupported("type argument count mismatch"));
    }
    let targs: FxHashMap<TyId, String> = params
        .iter()
        .zip(args)
        .map(|(&p, &a)| (p, site.text(a).to_string()))
        .collect();

    let mut spelled = Spelling {
        site,
        pos: span.start,
        imports: ImportManager::new(prog, site.imports, span.start),
        prefixes: FxHashMap::default(),
        targs: &targs,
        any: universe_object(prog, "any").map(|o| prog.object(o).ty),
    };
    spelled.visit(ty, 0)?;
    let Spelling {
        mut imports, prefixes, ..
    } = spelled;

    let qual = |p: PkgId| prefixes.get(&p).filter(|q| !q.is_empty()).cloned();
    let tparam = |t: TyId| targs.get(&t).cloned();
    let mut text = prog.type_string_with(ty, &qual, &tparam);
    if operand(site, node) && type_needs_parens(&text) {
        text = format!("({text})");
    }

    imports.replace(span);
    let (mut edits, commit) = imports.finish();
    edits.push(TextEdit::replace(span, text));
    Ok(Rewrite { span, edits, commit })
}

/// Type parameters of a generic alias, in declaration order.
fn type_params(prog: &Program, alias: ObjId) -> Vec<TyId> {
    let Some(pos) = prog.object(alias).pos else {
        return Vec::new();
    };
    let file = prog.file(pos.file);
    let arena = &file.arena;
    let spec = arena.top_decls(file.root.decls).iter().find_map(|td| match *td {
        TopLevelDecl::Decl(d) => {
            let Decl::Gen(g) = arena.decls[d];
            arena.specs_list(g.specs).iter().find_map(|s| match s {
                Spec::Type(ts) if ts.name.pos == pos.span => Some(*ts),
                _ => None,
            })
        }
        TopLevelDecl::Func(_) => None,
    });
    let Some(tp) = spec.and_then(|ts| ts.type_params) else {
        return Vec::new();
    };
    arena
        .type_param_decl_ids(arena.type_params[tp].params)
        .iter()
        .flat_map(|&d| arena.ident_names(arena.type_param_decls[d].names).iter())
        .filter_map(|n| prog.info.def(pos.file, n.pos.start))
        .map(|o| prog.object(o).ty)
        .collect()
}

/// Decides how each name in a type is written at the use site.
struct Spelling<'s, 'a> {
    site: &'s Site<'a>,
    pos: u32,
    imports: ImportManager<'a>,
    prefixes: FxHashMap<PkgId, String>,
    targs: &'s FxHashMap<TyId, String>,
    any: Option<TyId>,
}

impl Spelling<'_, '_> {
    fn visit(&mut self, ty: TyId, depth: u32) -> Result<(), InlineError> {
        if depth > 64 {
            return Err(InlineError::Unsupported("type too deep"));
        }
        let d = depth + 1;
        let prog = self.site.prog;
        if Some(ty) == self.any {
            return self.universe("any");
        }
        match prog.types.get(ty) {
            Type::Invalid => Err(InlineError::Unsupported("invalid type")),
            Type::Basic(k) => self.universe(k.name()),
            Type::Named(n) => {
                self.name(n.obj)?;
                for &t in &n.targs {
                    self.visit(t, d)?;
                }
                Ok(())
            }
            Type::TypeParam(_) if self.targs.contains_key(&ty) => Ok(()),
            Type::TypeParam(_) => Err(InlineError::Unsupported("type parameter outside the alias")),
            Type::Pointer(e) | Type::Slice(e) | Type::Array { elem: e, .. } | Type::Chan { elem: e, .. } => {
                self.visit(*e, d)
            }
            Type::Map { key, value } => {
                self.visit(*key, d)?;
                self.visit(*value, d)
            }
            Type::Signature(s) => {
                for &o in s.params.iter().chain(&s.results) {
                    self.visit(prog.object(o).ty, d)?;
                }
                Ok(())
            }
            Type::Struct(s) => {
                for &f in &s.fields {
                    self.visit(prog.object(f).ty, d)?;
                }
                Ok(())
            }
            Type::Interface(it) => {
                for &m in &it.methods {
                    self.visit(prog.object(m).ty, d)?;
                }
                for &e in &it.embeds {
                    self.visit(e, d)?;
                }
                Ok(())
            }
            Type::Tuple(ts) => {
                for &t in ts {
                    self.visit(t, d)?;
                }
                Ok(())
            }
            Type::Union(terms) => {
                for t in terms {
                    self.visit(t.ty, d)?;
                }
                Ok(())
            }
        }
    }

    fn universe(&self, name: &str) -> Result<(), InlineError> {
        match universe_object(self.site.prog, name) {
            Some(obj) => self.site.check_visible(name, obj, self.pos),
            None => Ok(()),
        }
    }

    fn name(&mut self, obj: ObjId) -> Result<(), InlineError> {
        let site = self.site;
        let prog = site.prog;
        let o = prog.object(obj);
        let name = prog.obj_name(obj);
        match o.pkg {
            None => site.check_visible(name, obj, self.pos),
            Some(p) if p == site.pkg() => site.check_visible(name, obj, self.pos),
            Some(p) => {
                if !is_exported(name) {
                    return Err(InlineError::Unsupported("alias names an unexported type of another package"));
                }
                if !self.prefixes.contains_key(&p) {
                    let pkg = prog.package(p);
                    let q = self.imports.prefix(&pkg.path, &pkg.name)?;
                    self.prefixes.insert(p, q);
                }
                Ok(())
            }
        }
    }
}

/// The use is the operand of a call or selector, where `*T` would not
/// parse.
fn operand(site: &Site<'_>, node: NodeRef) -> bool {
    let NodeRef::Expr(e) = node else {
        return false;
    };
    let file = site.file;
    match file.inspector.parent(node) {
        Some(NodeRef::Expr(p)) => match file.arena.exprs[p] {
            Expr::Call { func, .. } => func == e,
            Expr::Selector { expr, .. } => expr == e,
            _ => false,
        },
        _ => false,
    }
}
