//! Import bookkeeping for rewrites.
//!
//! Replacement text may name packages the caller's file does not import
//! yet, and may remove the last use of a package it does import. An
//! [`ImportManager`] hands out qualifiers for one rewrite and turns its
//! decisions into edits; [`FileImports`] remembers what earlier rewrites of
//! the same file already consumed, kept or deleted.

use gofix_syntax::NodeRef;
use gofix_syntax::ast::{Decl, Expr, GenDecl, GenDeclKind, Span, Spec, TopLevelDecl, Type as TypeExpr};
use gofix_types::{File, FileId, ObjId, ObjKind, Program};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

use crate::edit::TextEdit;
use crate::error::InlineError;

/// Per-file import state shared by the rewrites of one pass.
#[derive(Debug)]
pub struct FileImports {
    fid: FileId,
    /// Every use of each imported package name.
    uses: FxHashMap<ObjId, Vec<Span>>,
    /// Source ranges replaced by accepted rewrites.
    consumed: Vec<Span>,
    /// Imports that accepted rewrites spell in their replacements.
    kept: FxHashSet<usize>,
    deleted: FxHashSet<usize>,
    /// Imports that accepted rewrites add, as `(path, name)`.
    added: Vec<(String, String)>,
}

impl FileImports {
    pub fn new(prog: &Program, fid: FileId) -> Self {
        let file = prog.file(fid);
        let arena = &file.arena;
        let mut uses: FxHashMap<ObjId, Vec<Span>> = FxHashMap::default();
        for &n in file.inspector.nodes() {
            let pos = match n {
                NodeRef::Expr(e) if matches!(arena.exprs[e], Expr::Ident(_)) => arena.exprs.span(e),
                NodeRef::Type(t) => match arena.types[t] {
                    TypeExpr::Named { pkg: Some(p), .. } => p.pos,
                    _ => continue,
                },
                _ => continue,
            };
            if let Some(obj) = prog.info.use_of(fid, pos.start)
                && matches!(prog.object(obj).kind, ObjKind::PkgName { .. })
            {
                uses.entry(obj).or_default().push(pos);
            }
        }
        Self {
            fid,
            uses,
            consumed: Vec::new(),
            kept: FxHashSet::default(),
            deleted: FxHashSet::default(),
            added: Vec::new(),
        }
    }

    /// Records an accepted rewrite.
    pub fn commit(&mut self, c: ImportCommit) {
        self.consumed.extend(c.replaced);
        self.kept.extend(c.reused);
        self.deleted.extend(c.deleted);
        for a in c.added {
            if !self.added.iter().any(|(p, n)| *p == a.path && *n == a.name) {
                self.added.push((a.path, a.name));
            }
        }
    }

    fn unused_after(&self, pkg_name: ObjId, replaced: &[Span]) -> bool {
        self.uses.get(&pkg_name).is_none_or(|uses| {
            uses.iter()
                .all(|u| self.consumed.iter().chain(replaced).any(|r| r.covers(*u)))
        })
    }
}

/// What an accepted rewrite did to the file's imports.
#[derive(Debug, Default)]
pub struct ImportCommit {
    replaced: Vec<Span>,
    reused: Vec<usize>,
    deleted: Vec<usize>,
    added: Vec<NewImport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NewImport {
    path: String,
    name: String,
    pkg_name: String,
}

/// Qualifiers and import edits for one rewrite at `pos`.
pub struct ImportManager<'p> {
    prog: &'p Program,
    file: &'p File,
    pos: u32,
    state: &'p FileImports,
    forbidden: FxHashSet<String>,
    added: Vec<NewImport>,
    reused: Vec<usize>,
    replaced: Vec<Span>,
}

impl<'p> ImportManager<'p> {
    pub fn new(prog: &'p Program, state: &'p FileImports, pos: u32) -> Self {
        Self {
            prog,
            file: prog.file(state.fid),
            pos,
            state,
            forbidden: FxHashSet::default(),
            added: Vec::new(),
            reused: Vec::new(),
            replaced: Vec::new(),
        }
    }

    /// Names the replacement declares itself; qualifiers must avoid them.
    pub fn forbid<S: Into<String>>(&mut self, names: impl IntoIterator<Item = S>) {
        self.forbidden.extend(names.into_iter().map(Into::into));
    }

    /// The rewrite removes the text at `span`. Imports whose last use goes
    /// with it are deleted.
    pub fn replace(&mut self, span: Span) {
        self.replaced.push(span);
    }

    /// The qualifier under which package `path` (declared as `name`) is
    /// spelled at the rewrite; empty for the caller's own package.
    pub fn prefix(&mut self, path: &str, name: &str) -> Result<String, InlineError> {
        let prog = self.prog;
        let here = prog.package(self.file.pkg).path.as_str();
        if path == here {
            return Ok(String::new());
        }
        if let Some(a) = self.added.iter().find(|a| a.path == path) {
            return Ok(a.name.clone());
        }
        for (i, imp) in self.file.imports.iter().enumerate() {
            if imp.path != path || self.state.deleted.contains(&i) {
                continue;
            }
            let Some(n) = prog.import_name(imp) else { continue };
            if self.forbidden.contains(n) {
                continue;
            }
            if imp.obj.is_some() && prog.resolve_name(self.file.id, n, self.pos) == imp.obj {
                self.reused.push(i);
                return Ok(n.to_string());
            }
        }
        if !prog.can_import(here, path) {
            return Err(InlineError::NotImportable(path.to_string()));
        }
        // Spelled like an earlier fix's import, so both insert the same text.
        let earlier = self
            .state
            .added
            .iter()
            .find(|(p, n)| p == path && !self.forbidden.contains(n) && prog.resolve_name(self.file.id, n, self.pos).is_none());
        if let Some((_, n)) = earlier {
            self.added.push(NewImport {
                path: path.to_string(),
                name: n.clone(),
                pkg_name: name.to_string(),
            });
            return Ok(n.clone());
        }
        let base = if is_identifier(name) { name } else { "pkg" };
        let mut k = 1;
        let fresh = loop {
            let candidate = if k == 1 { base.to_string() } else { format!("{base}{k}") };
            if self.available(&candidate) {
                break candidate;
            }
            k += 1;
        };
        trace!(path, name = %fresh, "new import");
        self.added.push(NewImport {
            path: path.to_string(),
            name: fresh.clone(),
            pkg_name: name.to_string(),
        });
        Ok(fresh)
    }

    fn available(&self, name: &str) -> bool {
        !self.forbidden.contains(name)
            && self.prog.resolve_name(self.file.id, name, self.pos).is_none()
            && !self.file.imports.iter().any(|imp| self.prog.import_name(imp) == Some(name))
            && !self.added.iter().any(|a| a.name == name)
            && !self.state.added.iter().any(|(_, n)| n == name)
    }

    /// Import edits of the rewrite, and the record to commit if it is
    /// accepted.
    pub fn finish(self) -> (Vec<TextEdit>, ImportCommit) {
        let mut candidates: Vec<ObjId> = self
            .state
            .uses
            .iter()
            .filter(|(_, uses)| uses.iter().any(|u| self.replaced.iter().any(|r| r.covers(*u))))
            .map(|(&o, _)| o)
            .collect();
        candidates.sort_unstable();
        let mut deleted: Vec<usize> = Vec::new();
        for &obj in &candidates {
            let Some(i) = self.file.imports.iter().position(|imp| imp.obj == Some(obj)) else {
                continue;
            };
            if deleted.contains(&i)
                || self.reused.contains(&i)
                || self.state.kept.contains(&i)
                || self.state.deleted.contains(&i)
                || !self.state.unused_after(obj, &self.replaced)
            {
                continue;
            }
            deleted.push(i);
        }

        let decls = import_decls(self.file);
        let mut edits = Vec::new();
        let insert_into = decls.last().map(|d| d.0);
        edits.extend(self.insertions(decls.last().copied()));
        for &(span, g) in &decls {
            let specs = self.file.arena.specs_list(g.specs);
            let gone: Vec<Span> = specs
                .iter()
                .filter_map(|s| match s {
                    Spec::Import(is) => Some(is.span),
                    _ => None,
                })
                .filter(|s| deleted.iter().any(|&i| self.file.imports[i].spec_span == *s))
                .collect();
            if gone.is_empty() {
                continue;
            }
            let whole = gone.len() == specs.len() && (g.l_paren.is_none() || insert_into != Some(span) || self.added.is_empty());
            if whole {
                edits.push(TextEdit::delete(self.decl_extent(span, self.added.is_empty())));
            } else {
                edits.extend(gone.into_iter().map(|s| TextEdit::delete(self.line_extent(s))));
            }
        }

        let commit = ImportCommit {
            replaced: self.replaced,
            reused: self.reused,
            deleted,
            added: self.added,
        };
        (edits, commit)
    }

    /// One edit per new import, so that fixes adding the same import
    /// insert the same text.
    fn insertions(&self, last: Option<(Span, GenDecl)>) -> Vec<TextEdit> {
        let lines = &self.file.lines;
        let src = &self.file.src;
        self.added
            .iter()
            .map(|a| {
                let spec = if a.name == a.pkg_name {
                    format!("\"{}\"", a.path)
                } else {
                    format!("{} \"{}\"", a.name, a.path)
                };
                match last {
                    Some((_, g @ GenDecl { r_paren: Some(r), .. })) => {
                        let start = lines.line_start(r.start);
                        let own_line = src.get(start as usize..r.start as usize).is_some_and(|s| s.trim().is_empty());
                        if g.specs.is_empty() {
                            TextEdit::insert(r.start, format!("{spec}; "))
                        } else if own_line {
                            TextEdit::insert(start, format!("\t{spec}\n"))
                        } else {
                            TextEdit::insert(r.start, format!("; {spec}"))
                        }
                    }
                    Some((span, _)) => TextEdit::insert(span.start, format!("import {spec}\n")),
                    None => TextEdit::insert(self.file.root.name.pos.end, format!("\n\nimport {spec}")),
                }
            })
            .collect()
    }

    /// `span` with its whole line if nothing else is on it.
    fn line_extent(&self, span: Span) -> Span {
        let (lines, src) = (&self.file.lines, &self.file.src);
        let ls = lines.line_start(span.start);
        let le = lines.line_end(span.end);
        let before = src.get(ls as usize..span.start as usize).unwrap_or("x");
        let after = src.get(span.end as usize..le as usize).unwrap_or("x").trim_start();
        if before.trim().is_empty() && (after.is_empty() || after.starts_with("//")) {
            Span {
                start: ls,
                end: (le + 1).min(src.len() as u32),
            }
        } else {
            span
        }
    }

    /// A whole declaration's lines, plus one following blank line if
    /// `blank`.
    fn decl_extent(&self, span: Span, blank: bool) -> Span {
        let mut ext = self.line_extent(span);
        if blank && ext != span && self.file.src.as_bytes().get(ext.end as usize) == Some(&b'\n') {
            ext.end += 1;
        }
        ext
    }
}

fn import_decls(file: &File) -> Vec<(Span, GenDecl)> {
    let arena = &file.arena;
    arena
        .top_decls(file.root.decls)
        .iter()
        .filter_map(|td| match *td {
            TopLevelDecl::Decl(d) => {
                let Decl::Gen(g) = arena.decls[d];
                (g.kind == GenDeclKind::Import).then(|| (arena.decls.span(d), g))
            }
            TopLevelDecl::Func(_) => None,
        })
        .collect()
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c == '_' || c.is_alphabetic()) && chars.all(|c| c == '_' || c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::apply_edits;
    use gofix_types::ProgramBuilder;

    const B: (&str, &str) = ("b.go", "package b\n\nfunc F() {}\n");

    fn program(a: &str) -> Program {
        ProgramBuilder::new()
            .package("example.com/b", &[B])
            .package("example.com/c", &[("c.go", "package c\n\nconst K = 1\n")])
            .package("example.com/a", &[("a.go", a)])
            .build()
            .unwrap()
    }

    fn file_a(prog: &Program) -> FileId {
        prog.file_by_name("a.go").unwrap()
    }

    #[test]
    fn existing_imports_are_reused() {
        let src = "package a\n\nimport \"example.com/b\"\n\nfunc g() { b.F() }\n";
        let prog = program(src);
        let state = FileImports::new(&prog, file_a(&prog));
        let mut m = ImportManager::new(&prog, &state, src.find("b.F").unwrap() as u32);
        assert_eq!(m.prefix("example.com/b", "b").unwrap(), "b");
        assert_eq!(m.prefix("example.com/a", "a").unwrap(), "");
        let (edits, _) = m.finish();
        assert!(edits.is_empty());
    }

    #[test]
    fn shadowed_names_get_a_fresh_import() {
        let src = "package a\n\nfunc g() {\n\tc := 0\n\t_ = c\n}\n";
        let prog = program(src);
        let state = FileImports::new(&prog, file_a(&prog));
        let mut m = ImportManager::new(&prog, &state, src.find("_ = c").unwrap() as u32);
        assert_eq!(m.prefix("example.com/c", "c").unwrap(), "c2");
        let (edits, _) = m.finish();
        assert_eq!(
            apply_edits(src, &edits).unwrap(),
            "package a\n\nimport c2 \"example.com/c\"\n\nfunc g() {\n\tc := 0\n\t_ = c\n}\n"
        );
    }

    #[test]
    fn imports_extend_the_last_group() {
        let src = "package a\n\nimport (\n\t\"example.com/b\"\n)\n\nfunc g() { b.F() }\n";
        let prog = program(src);
        let state = FileImports::new(&prog, file_a(&prog));
        let mut m = ImportManager::new(&prog, &state, src.find("b.F").unwrap() as u32);
        assert_eq!(m.prefix("example.com/c", "c").unwrap(), "c");
        let (edits, _) = m.finish();
        assert_eq!(
            apply_edits(src, &edits).unwrap(),
            "package a\n\nimport (\n\t\"example.com/b\"\n\t\"example.com/c\"\n)\n\nfunc g() { b.F() }\n"
        );
    }

    #[test]
    fn unused_import_is_replaced() {
        let src = "package a\n\nimport \"example.com/b\"\n\nfunc g() { b.F() }\n";
        let prog = program(src);
        let fid = file_a(&prog);
        let state = FileImports::new(&prog, fid);
        let at = src.find("b.F()").unwrap();
        let mut m = ImportManager::new(&prog, &state, at as u32);
        m.replace(Span::new(at, at + 5));
        assert_eq!(m.prefix("example.com/c", "c").unwrap(), "c");
        let (mut edits, _) = m.finish();
        edits.push(TextEdit::replace(Span::new(at, at + 5), "_ = c.K"));
        assert_eq!(
            apply_edits(src, &edits).unwrap(),
            "package a\n\nimport \"example.com/c\"\n\nfunc g() { _ = c.K }\n"
        );
    }

    #[test]
    fn imports_still_used_elsewhere_stay() {
        let src = "package a\n\nimport \"example.com/b\"\n\nfunc g() { b.F(); b.F() }\n";
        let prog = program(src);
        let fid = file_a(&prog);
        let mut state = FileImports::new(&prog, fid);
        let first = src.find("b.F()").unwrap();
        let second = src.rfind("b.F()").unwrap();

        let mut m = ImportManager::new(&prog, &state, first as u32);
        m.replace(Span::new(first, first + 5));
        let (edits, commit) = m.finish();
        assert!(edits.is_empty());
        state.commit(commit);

        let mut m = ImportManager::new(&prog, &state, second as u32);
        m.replace(Span::new(second, second + 5));
        let (edits, _) = m.finish();
        assert_eq!(edits, [TextEdit::delete(Span::new(11, 35))]);
    }

    #[test]
    fn later_fixes_repeat_earlier_insertions() {
        let src = "package a\n\nfunc g() {}\n\nfunc h() {}\n";
        let prog = program(src);
        let fid = file_a(&prog);
        let mut state = FileImports::new(&prog, fid);

        let mut m = ImportManager::new(&prog, &state, src.find("{}").unwrap() as u32);
        assert_eq!(m.prefix("example.com/c", "c").unwrap(), "c");
        let (first, commit) = m.finish();
        state.commit(commit);

        let mut m = ImportManager::new(&prog, &state, src.rfind("{}").unwrap() as u32);
        assert_eq!(m.prefix("example.com/c", "c").unwrap(), "c");
        assert_eq!(m.prefix("example.com/b", "b").unwrap(), "b");
        let (second, _) = m.finish();
        assert_eq!(second[0], first[0]);

        let all: Vec<TextEdit> = first.into_iter().chain(second).collect();
        assert_eq!(
            apply_edits(src, &all).unwrap(),
            "package a\n\nimport \"example.com/c\"\n\nimport \"example.com/b\"\n\nfunc g() {}\n\nfunc h() {}\n"
        );
    }

    #[test]
    fn internal_packages_are_not_importable_from_outside() {
        let prog = ProgramBuilder::new()
            .package("example.com/x/internal/y", &[("y.go", "package y\n\nconst K = 1\n")])
            .package("example.com/a", &[("a.go", "package a\n")])
            .build()
            .unwrap();
        let fid = prog.file_by_name("a.go").unwrap();
        let state = FileImports::new(&prog, fid);
        let mut m = ImportManager::new(&prog, &state, 0);
        assert_eq!(
            m.prefix("example.com/x/internal/y", "y"),
            Err(InlineError::NotImportable("example.com/x/internal/y".into()))
        );
    }
}
