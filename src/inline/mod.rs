//! # Inlining
//!
//! Visits every reference of a file in source order and rewrites the ones
//! that name an inlinable declaration: calls ([`call`]), constant uses
//! ([`constant`]) and alias uses ([`alias`]). Each accepted rewrite becomes
//! one [`Diagnostic`] with a single fix; a reference inside a range an
//! earlier rewrite already replaced is left for a later run.

mod alias;
mod call;
mod constant;

use std::cell::RefCell;
use std::rc::Rc;

use gofix_syntax::ast::{Expr, ExprId, Span, Type as TypeExpr, TypeId};
use gofix_syntax::NodeRef;
use gofix_types::{File, FileId, ObjId, ObjKind, PkgId, Program, SelectionKind, VarKind};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::callee::{Callee, FreeRef};
use crate::config::Options;
use crate::discovery::LocalFacts;
use crate::edit::{Diagnostic, TextEdit};
use crate::error::InlineError;
use crate::expr::qualifier;
use crate::facts::{ConstFact, Fact, FactKind, FactStore, ObjectKey};
use crate::imports::{FileImports, ImportCommit, ImportManager};

pub(crate) use call::CallForm;

/// Inlinable declarations as seen from one package: its own, and those
/// other packages exported facts for.
pub struct Registry<'a> {
    prog: &'a Program,
    pkg: PkgId,
    local: &'a LocalFacts,
    store: &'a dyn FactStore,
    funcs: RefCell<FxHashMap<ObjId, Option<Rc<Callee>>>>,
    consts: RefCell<FxHashMap<ObjId, Option<ConstFact>>>,
    aliases: RefCell<FxHashMap<ObjId, bool>>,
}

impl<'a> Registry<'a> {
    pub fn new(prog: &'a Program, pkg: PkgId, local: &'a LocalFacts, store: &'a dyn FactStore) -> Self {
        Self {
            prog,
            pkg,
            local,
            store,
            funcs: RefCell::default(),
            consts: RefCell::default(),
            aliases: RefCell::default(),
        }
    }

    /// Key under which another package published facts about `obj`.
    fn imported_key(&self, obj: ObjId) -> Option<ObjectKey> {
        let o = self.prog.object(obj);
        if o.pkg.is_none() || o.pkg == Some(self.pkg) {
            return None;
        }
        ObjectKey::of(self.prog, obj)
    }

    pub fn callee(&self, obj: ObjId) -> Option<Rc<Callee>> {
        if let Some(c) = self.local.funcs.get(&obj) {
            return Some(Rc::clone(c));
        }
        if let Some(c) = self.funcs.borrow().get(&obj) {
            return c.clone();
        }
        let c = self
            .imported_key(obj)
            .and_then(|k| self.store.import_object_fact(&k, FactKind::Func))
            .and_then(|f| match f {
                Fact::Func(c) => Some(Rc::new(*c)),
                _ => None,
            });
        self.funcs.borrow_mut().insert(obj, c.clone());
        c
    }

    /// The constant's fact, with its right-hand side resolved in this
    /// program.
    pub fn constant(&self, obj: ObjId) -> Option<ConstFact> {
        if let Some(c) = self.local.consts.get(&obj) {
            return Some(c.clone());
        }
        if let Some(c) = self.consts.borrow().get(&obj) {
            return c.clone();
        }
        let prog = self.prog;
        let c = self
            .imported_key(obj)
            .and_then(|k| self.store.import_object_fact(&k, FactKind::Const))
            .and_then(|f| match f {
                Fact::Const(mut c) => {
                    c.rhs_obj = if c.rhs_pkg_path.is_empty() {
                        universe_object(prog, &c.rhs_name)
                    } else {
                        prog.package_by_path(&c.rhs_pkg_path)
                            .and_then(|p| prog.package_member(p, &c.rhs_name))
                    };
                    Some(c)
                }
                _ => None,
            });
        self.consts.borrow_mut().insert(obj, c.clone());
        c
    }

    pub fn is_alias(&self, obj: ObjId) -> bool {
        if self.local.aliases.contains(&obj) {
            return true;
        }
        if let Some(&a) = self.aliases.borrow().get(&obj) {
            return a;
        }
        let a = self
            .imported_key(obj)
            .and_then(|k| self.store.import_object_fact(&k, FactKind::Alias))
            .is_some();
        self.aliases.borrow_mut().insert(obj, a);
        a
    }
}

pub(crate) fn universe_object(prog: &Program, name: &str) -> Option<ObjId> {
    let sym = prog.interner.lookup(name)?;
    prog.scope(prog.universe).lookup(sym)
}

/// The file a rewrite happens in.
pub(crate) struct Site<'a> {
    pub prog: &'a Program,
    pub fid: FileId,
    pub file: &'a File,
    pub options: &'a Options,
    pub imports: &'a FileImports,
}

impl Site<'_> {
    pub fn pkg(&self) -> PkgId {
        self.file.pkg
    }

    pub fn here(&self) -> &str {
        &self.prog.package(self.file.pkg).path
    }

    pub fn text(&self, span: Span) -> &str {
        self.file.text(span)
    }

    /// `name` written bare at `pos` must still mean `expected`.
    pub fn check_visible(&self, name: &str, expected: ObjId, pos: u32) -> Result<(), InlineError> {
        let found = self.prog.resolve_name(self.fid, name, pos);
        if found == Some(expected) {
            return Ok(());
        }
        Err(InlineError::Shadowed {
            name: name.to_string(),
            by: match found {
                Some(o) => self.describe(o),
                None => "nothing visible".to_string(),
            },
        })
    }

    fn describe(&self, obj: ObjId) -> String {
        let o = self.prog.object(obj);
        let what = match o.kind {
            ObjKind::Var(VarKind::Package) => "package variable",
            ObjKind::Var(_) => "local variable",
            ObjKind::Const { .. } => "constant",
            ObjKind::TypeName { .. } => "type",
            ObjKind::Func { .. } => "function",
            ObjKind::PkgName { .. } => "import",
            _ => "declaration",
        };
        match o.pos {
            Some(p) if p.file == self.fid => format!("{what} on line {}", self.file.lines.line(p.span.start)),
            _ => what.to_string(),
        }
    }

    /// How a name the callee body uses freely is written at `pos`.
    pub fn free_text(&self, f: &FreeRef, imports: &mut ImportManager<'_>, pos: u32) -> Result<String, InlineError> {
        let expected = match f.pkg_path.as_deref() {
            None => universe_object(self.prog, &f.name),
            Some(path) if path == self.here() => self.prog.package_member(self.pkg(), &f.name),
            Some(path) => {
                let q = imports.prefix(path, &f.pkg_name)?;
                return Ok(format!("{q}.{}", f.name));
            }
        };
        let expected = expected.ok_or_else(|| InlineError::Shadowed {
            name: f.name.clone(),
            by: "nothing visible".to_string(),
        })?;
        self.check_visible(&f.name, expected, pos)?;
        Ok(f.name.clone())
    }

    /// Leading whitespace of the line holding `pos`.
    pub fn indent_at(&self, pos: u32) -> &str {
        self.file.lines.indentation(&self.file.src, pos)
    }

    /// Nothing but whitespace precedes `pos` on its line.
    pub fn starts_line(&self, pos: u32) -> bool {
        let start = self.file.lines.line_start(pos);
        self.file
            .src
            .get(start as usize..pos as usize)
            .is_some_and(|s| s.trim().is_empty())
    }
}

/// The edits of one accepted rewrite.
pub(crate) struct Rewrite {
    /// Source range the rewrite owns; later rewrites must stay clear of it.
    pub span: Span,
    pub edits: Vec<TextEdit>,
    pub commit: ImportCommit,
}

/// Moves text written at indentation `strip` to indentation `add`. The
/// first line is left alone, as are lines inside raw strings.
pub(crate) fn reindent(text: &str, strip: &str, add: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut raw = false;
    for (i, line) in text.split('\n').enumerate() {
        let body = if i == 0 {
            line
        } else {
            out.push('\n');
            if raw {
                line
            } else {
                let body = line.strip_prefix(strip).unwrap_or(line);
                if !body.is_empty() {
                    out.push_str(add);
                }
                body
            }
        };
        out.push_str(body);
        raw = raw_after(body, raw);
    }
    out
}

/// Whether a raw string is still open at the end of `line`.
fn raw_after(line: &str, mut raw: bool) -> bool {
    let mut chars = line.chars();
    while let Some(c) = chars.next() {
        if raw {
            if c == '`' {
                raw = false;
            }
            continue;
        }
        match c {
            '`' => raw = true,
            '"' | '\'' => {
                while let Some(d) = chars.next() {
                    match d {
                        '\\' => {
                            chars.next();
                        }
                        _ if d == c => break,
                        _ => {}
                    }
                }
            }
            '/' if chars.clone().next() == Some('/') => break,
            _ => {}
        }
    }
    raw
}

/// What a visited node refers to.
enum Reference {
    Call {
        call: ExprId,
        obj: ObjId,
        callee: Rc<Callee>,
        form: CallForm,
    },
    Const {
        obj: ObjId,
        fact: ConstFact,
    },
    Alias {
        obj: ObjId,
        args: Vec<Span>,
    },
}

/// Rewrites the references of file `fid` to inlinable declarations.
pub fn inline_file(prog: &Program, fid: FileId, options: &Options, registry: &Registry<'_>) -> Vec<Diagnostic> {
    let file = prog.file(fid);
    let mut imports = FileImports::new(prog, fid);
    let mut claimed: Vec<Span> = Vec::new();
    let mut out = Vec::new();
    for &node in file.inspector.nodes() {
        let Some(reference) = find_reference(prog, fid, registry, node) else {
            continue;
        };
        let span = node.span(&file.arena);
        if claimed.iter().any(|c| c.start < span.end && span.start < c.end) {
            trace!(?span, "inside an earlier rewrite");
            continue;
        }
        let site = Site {
            prog,
            fid,
            file,
            options,
            imports: &imports,
        };
        let (result, message, title) = match &reference {
            Reference::Call { call, obj, callee, form } => {
                if inside_own_body(prog, fid, node, *obj) {
                    continue;
                }
                let display = callee.display();
                (
                    call::inline_call(&site, *call, callee, form),
                    format!("Call of {display} should be inlined"),
                    format!("Inline call of {display}"),
                )
            }
            Reference::Const { obj, fact } => {
                let name = prog.obj_name(*obj);
                (
                    constant::inline_constant(&site, span, fact),
                    format!("Constant {name} should be inlined"),
                    format!("Inline constant {name}"),
                )
            }
            Reference::Alias { obj, args } => {
                if embedded_field(file, node) {
                    continue;
                }
                let name = prog.obj_name(*obj);
                (
                    alias::inline_alias(&site, node, span, *obj, args),
                    format!("Type alias {name} should be inlined"),
                    format!("Inline type alias {name}"),
                )
            }
        };
        match result {
            Ok(rw) => {
                debug!(file = %file.name, %message, "inlined");
                claimed.push(rw.span);
                imports.commit(rw.commit);
                out.push(Diagnostic::new(fid, span, message).with_fix(title, rw.edits));
            }
            Err(e) if e.is_reported() => out.push(Diagnostic::new(fid, span, e.to_string())),
            Err(e) => trace!(file = %file.name, ?span, reason = %e, "not inlined"),
        }
    }
    out
}

fn find_reference(prog: &Program, fid: FileId, registry: &Registry<'_>, node: NodeRef) -> Option<Reference> {
    let file = prog.file(fid);
    let arena = &file.arena;
    match node {
        NodeRef::Expr(e) => match arena.exprs[e] {
            Expr::Call { func, args, .. } => {
                let (obj, form) = call_target(prog, fid, func, arena.exprs_list(args).first().copied())?;
                let callee = registry.callee(obj)?;
                Some(Reference::Call {
                    call: e,
                    obj,
                    callee,
                    form,
                })
            }
            Expr::Ident(_) | Expr::Selector { .. } => {
                let obj = named_expr(prog, fid, e)?;
                match prog.object(obj).kind {
                    ObjKind::Const { .. } => {
                        let fact = registry.constant(obj)?;
                        Some(Reference::Const { obj, fact })
                    }
                    // `A[T]` is handled at the index expression.
                    ObjKind::TypeName { alias: true } if registry.is_alias(obj) && !indexed(file, e) => {
                        Some(Reference::Alias { obj, args: Vec::new() })
                    }
                    _ => None,
                }
            }
            Expr::Index { base, indices, .. } => {
                let obj = named_expr(prog, fid, base)?;
                (prog.object(obj).is_alias() && registry.is_alias(obj)).then(|| Reference::Alias {
                    obj,
                    args: arena.exprs_list(indices).iter().map(|&i| arena.exprs.span(i)).collect(),
                })
            }
            _ => None,
        },
        NodeRef::Type(t) => {
            let TypeExpr::Named { name, args, .. } = arena.types[t] else {
                return None;
            };
            let obj = prog.info.use_of(fid, name.pos.start)?;
            if !prog.object(obj).is_alias() || !registry.is_alias(obj) {
                return None;
            }
            Some(Reference::Alias {
                obj,
                args: arena.types_list(args).iter().map(|&a: &TypeId| arena.types.span(a)).collect(),
            })
        }
        _ => None,
    }
}

/// The object an identifier or qualified identifier names.
fn named_expr(prog: &Program, fid: FileId, e: ExprId) -> Option<ObjId> {
    let arena = &prog.file(fid).arena;
    match arena.exprs[e] {
        Expr::Ident(_) => prog.info.use_of(fid, arena.exprs.span(e).start),
        Expr::Selector { expr, sel, .. } => {
            qualifier(prog, fid, expr)?;
            prog.info.use_of(fid, sel.pos.start)
        }
        _ => None,
    }
}

/// `e` is the operand of an index expression.
fn indexed(file: &File, e: ExprId) -> bool {
    match file.inspector.parent(NodeRef::Expr(e)) {
        Some(NodeRef::Expr(p)) => matches!(file.arena.exprs[p], Expr::Index { base, .. } if base == e),
        _ => false,
    }
}

/// The function or method a call invokes, and how.
fn call_target(prog: &Program, fid: FileId, func: ExprId, first_arg: Option<ExprId>) -> Option<(ObjId, CallForm)> {
    let arena = &prog.file(fid).arena;
    let mut f = arena.unparen(func);
    // `F[int](x)`
    if let Expr::Index { base, .. } = arena.exprs[f] {
        f = arena.unparen(base);
    }
    let (obj, form) = match arena.exprs[f] {
        Expr::Ident(_) => (prog.info.use_of(fid, arena.exprs.span(f).start)?, CallForm::Func),
        Expr::Selector { expr, sel, .. } => match qualifier(prog, fid, expr) {
            Some(_) => (prog.info.use_of(fid, sel.pos.start)?, CallForm::Func),
            None => {
                let s = prog.info.selection(fid, f)?;
                match s.kind {
                    SelectionKind::MethodVal => (
                        s.obj,
                        CallForm::Method {
                            recv: expr,
                            path: s.index.iter().take(s.index.len().saturating_sub(1)).copied().collect(),
                        },
                    ),
                    SelectionKind::MethodExpr => {
                        first_arg?;
                        (s.obj, CallForm::MethodExpr)
                    }
                    SelectionKind::FieldVal => return None,
                }
            }
        },
        _ => return None,
    };
    matches!(prog.object(obj).kind, ObjKind::Func { .. }).then_some((obj, form))
}

/// A call of a function from inside its own declaration.
fn inside_own_body(prog: &Program, fid: FileId, node: NodeRef, obj: ObjId) -> bool {
    let file = prog.file(fid);
    file.inspector.ancestors(node).any(|a| match a {
        NodeRef::Func(id) => prog.info.def(fid, file.arena.funcs[id].name.pos.start) == Some(obj),
        _ => false,
    })
}

/// `struct{ A }`: replacing the type would rename the field.
fn embedded_field(file: &File, node: NodeRef) -> bool {
    let arena = &file.arena;
    let mut n = node;
    loop {
        match file.inspector.parent(n) {
            Some(p @ NodeRef::Type(t)) if matches!(arena.types[t], TypeExpr::Pointer { .. }) => n = p,
            Some(NodeRef::Field(f)) => return arena.fields[f].names.is_empty(),
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reindenting_moves_every_line_but_the_first() {
        let text = "if x {\n\t\tf()\n\t}";
        assert_eq!(reindent(text, "\t", "\t\t"), "if x {\n\t\t\tf()\n\t\t}");
        assert_eq!(reindent("a\n\n\tb", "\t", "  "), "a\n\n  b");
    }

    #[test]
    fn raw_strings_keep_their_lines() {
        let text = "s := `one\n\ttwo`\n\tg()";
        assert_eq!(reindent(text, "\t", ""), "s := `one\n\ttwo`\ng()");
        let quoted = "s := \"`\"\n\tg()";
        assert_eq!(reindent(quoted, "\t", ""), "s := \"`\"\ng()");
    }
}
