use gofix_syntax::ast::{AstArena, Interner, SourceFile, Span};
use gofix_syntax::{Inspector, LineIndex, ParseFailure, parse_file};
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::debug;

use crate::check;
use crate::info::Info;
use crate::objects::{ObjKind, Object};
use crate::scope::{Scope, ScopeKind};
use crate::types::TypeTable;
use crate::universe::{self, UniverseTypes};
use crate::{FileId, ObjId, PkgId, ScopeId, TyId};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ParseFailure,
    },
    #[error("package {0} added twice")]
    DuplicatePackage(String),
    #[error("{path}: files declare both package {first} and package {second}")]
    MixedPackageNames { path: String, first: String, second: String },
    #[error("package {0} has no files")]
    EmptyPackage(String),
}

/// A problem found while checking. Checking carries on regardless.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TypeError {
    pub file: FileId,
    pub span: Span,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ImportInfo {
    pub spec_span: Span,
    /// Unquoted import path.
    pub path: String,
    /// Explicit local name, including `_` and `.`.
    pub name: Option<String>,
    pub pkg: Option<PkgId>,
    /// The `PkgName` object declared in the file scope.
    pub obj: Option<ObjId>,
}

#[derive(Debug)]
pub struct File {
    pub id: FileId,
    pub name: String,
    pub pkg: PkgId,
    pub src: String,
    pub arena: AstArena,
    pub root: SourceFile,
    pub lines: LineIndex,
    pub scope: ScopeId,
    pub imports: Vec<ImportInfo>,
    pub inspector: Inspector,
}

impl File {
    pub fn text(&self, span: Span) -> &str {
        self.src.get(span.range()).unwrap_or("")
    }
}

#[derive(Debug, Clone)]
pub struct Package {
    pub id: PkgId,
    pub path: String,
    pub name: String,
    pub files: Vec<FileId>,
    pub scope: ScopeId,
}

#[derive(Debug)]
pub struct Program {
    pub interner: Interner,
    pub files: Vec<File>,
    pub packages: Vec<Package>,
    pub objects: Vec<Object>,
    pub types: TypeTable,
    pub scopes: Vec<Scope>,
    pub info: Info,
    pub universe: ScopeId,
    pub errors: Vec<TypeError>,
    /// Packages with their dependencies first.
    pub order: Vec<PkgId>,
    pub(crate) universe_types: UniverseTypes,
    pub(crate) instances: FxHashMap<(TyId, Vec<TyId>), TyId>,
}

impl Program {
    fn empty() -> Self {
        let mut prog = Self {
            interner: Interner::new(),
            files: Vec::new(),
            packages: Vec::new(),
            objects: Vec::new(),
            types: TypeTable::default(),
            scopes: Vec::new(),
            info: Info::default(),
            universe: ScopeId(0),
            errors: Vec::new(),
            order: Vec::new(),
            universe_types: UniverseTypes::default(),
            instances: FxHashMap::default(),
        };
        prog.universe = universe::populate(&mut prog);
        prog
    }

    pub(crate) fn add_object(&mut self, obj: Object) -> ObjId {
        let id = ObjId(self.objects.len() as u32);
        self.objects.push(obj);
        id
    }

    pub fn object(&self, id: ObjId) -> &Object {
        &self.objects[id.index()]
    }

    pub fn obj_name(&self, id: ObjId) -> &str {
        self.interner.resolve(self.objects[id.index()].name)
    }

    pub fn file(&self, id: FileId) -> &File {
        &self.files[id.index()]
    }

    pub fn package(&self, id: PkgId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn package_by_path(&self, path: &str) -> Option<PkgId> {
        self.packages.iter().find(|p| p.path == path).map(|p| p.id)
    }

    pub fn file_by_name(&self, name: &str) -> Option<FileId> {
        self.files.iter().find(|f| f.name == name).map(|f| f.id)
    }

    pub fn obj_pkg_path(&self, id: ObjId) -> Option<&str> {
        self.objects[id.index()].pkg.map(|p| self.packages[p.index()].path.as_str())
    }

    /// Declared in a package scope (not a field, method or local).
    pub fn is_package_level(&self, id: ObjId) -> bool {
        self.objects[id.index()]
            .parent
            .is_some_and(|s| self.scopes[s.index()].kind == ScopeKind::Package)
    }

    pub fn in_universe(&self, id: ObjId) -> bool {
        self.objects[id.index()].parent == Some(self.universe)
    }

    /// Package-level object `name` of package `pkg`.
    pub fn package_member(&self, pkg: PkgId, name: &str) -> Option<ObjId> {
        let sym = self.interner.lookup(name)?;
        self.scopes[self.packages[pkg.index()].scope.index()].lookup(sym)
    }

    /// Method `name` declared on the named type `type_name`.
    pub fn method_of(&self, type_name: ObjId, name: &str) -> Option<ObjId> {
        let named = self.types.named(self.objects[type_name.index()].ty)?;
        named.methods.iter().copied().find(|&m| self.obj_name(m) == name)
    }

    /// Local name under which `imp` is visible in its file, if any.
    pub fn import_name<'a>(&'a self, imp: &'a ImportInfo) -> Option<&'a str> {
        match imp.name.as_deref() {
            Some("_" | ".") => None,
            Some(n) => Some(n),
            None => imp.pkg.map(|p| self.packages[p.index()].name.as_str()),
        }
    }

    /// Whether code in package `from` may import `to`: `internal`
    /// directories are private to their parent tree and `main` packages
    /// cannot be imported.
    pub fn can_import(&self, from: &str, to: &str) -> bool {
        if from == to {
            return false;
        }
        if self
            .package_by_path(to)
            .is_some_and(|p| self.packages[p.index()].name == "main")
        {
            return false;
        }
        let segments: Vec<&str> = to.split('/').collect();
        match segments.iter().rposition(|&s| s == "internal") {
            None => true,
            Some(0) => true,
            Some(i) => {
                let parent = segments[..i].join("/");
                from == parent || from.starts_with(&format!("{parent}/"))
            }
        }
    }

    pub(crate) fn error(&mut self, file: FileId, span: Span, message: impl Into<String>) {
        self.errors.push(TypeError {
            file,
            span,
            message: message.into(),
        });
    }

    pub(crate) fn any_type(&self) -> TyId {
        self.universe_types.any
    }

    pub(crate) fn iota_obj(&self) -> ObjId {
        self.universe_types.iota
    }

    pub fn is_builtin(&self, id: ObjId) -> bool {
        matches!(self.objects[id.index()].kind, ObjKind::Builtin(_))
    }
}

/// Collects packages, then parses and checks them as one program.
#[derive(Debug, Default)]
pub struct ProgramBuilder {
    packages: Vec<(String, Vec<(String, String)>)>,
}

impl ProgramBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds package `path` made of `(file name, source)` pairs.
    pub fn package(mut self, path: &str, files: &[(&str, &str)]) -> Self {
        self.packages.push((
            path.to_string(),
            files.iter().map(|(n, s)| (n.to_string(), s.to_string())).collect(),
        ));
        self
    }

    pub fn build(self) -> Result<Program, LoadError> {
        let mut prog = Program::empty();
        let mut parsed_pkgs = Vec::with_capacity(self.packages.len());
        let mut seen = FxHashSet::default();

        for (path, files) in self.packages {
            if !seen.insert(path.clone()) {
                return Err(LoadError::DuplicatePackage(path));
            }
            if files.is_empty() {
                return Err(LoadError::EmptyPackage(path));
            }
            let mut parsed = Vec::with_capacity(files.len());
            let mut pkg_name: Option<String> = None;
            for (name, src) in files {
                let pf = parse_file(&src, &mut prog.interner).map_err(|source| LoadError::Parse {
                    file: name.clone(),
                    source,
                })?;
                let declared = prog.interner.resolve(pf.file.name.sym).to_string();
                match &pkg_name {
                    Some(first) if *first != declared => {
                        return Err(LoadError::MixedPackageNames {
                            path,
                            first: first.clone(),
                            second: declared,
                        });
                    }
                    Some(_) => {}
                    None => pkg_name = Some(declared),
                }
                parsed.push((name, src, pf));
            }
            let id = PkgId(prog.packages.len() as u32);
            let scope = prog.new_scope(ScopeKind::Package, Some(prog.universe), None, Span::default());
            prog.packages.push(Package {
                id,
                path,
                name: pkg_name.unwrap_or_default(),
                files: Vec::new(),
                scope,
            });
            parsed_pkgs.push(Some(parsed));
        }

        let order = dependency_order(&prog, &parsed_pkgs);
        for pkg in order {
            let Some(parsed) = parsed_pkgs[pkg.index()].take() else {
                continue;
            };
            let pkg_scope = prog.packages[pkg.index()].scope;
            let mut files = Vec::with_capacity(parsed.len());
            for (name, src, pf) in parsed {
                let id = FileId((prog.files.len() + files.len()) as u32);
                let span = Span::new(0, src.len());
                let scope = prog.new_scope(ScopeKind::File, Some(pkg_scope), Some(id), span);
                let inspector = Inspector::new(&pf.arena, &pf.file);
                files.push(File {
                    id,
                    name,
                    pkg,
                    lines: LineIndex::new(&src),
                    src,
                    arena: pf.arena,
                    root: pf.file,
                    scope,
                    imports: Vec::new(),
                    inspector,
                });
            }
            let imports = check::check_package(&mut prog, pkg, &files);
            for (file, imps) in files.iter_mut().zip(imports) {
                file.imports = imps;
            }
            prog.packages[pkg.index()].files = files.iter().map(|f| f.id).collect();
            prog.files.extend(files);
            prog.order.push(pkg);
            debug!(
                path = %prog.packages[pkg.index()].path,
                errors = prog.errors.len(),
                "checked package"
            );
        }
        Ok(prog)
    }
}

type ParsedPackage = Vec<(String, String, gofix_syntax::ParsedFile)>;

/// Packages ordered so that every import comes before its importer;
/// ties keep the order in which packages were added.
fn dependency_order(prog: &Program, parsed: &[Option<ParsedPackage>]) -> Vec<PkgId> {
    let deps: Vec<Vec<PkgId>> = parsed
        .iter()
        .map(|files| {
            let mut out = Vec::new();
            for (_, src, pf) in files.iter().flatten() {
                for path in import_paths(src, pf) {
                    if let Some(p) = prog.package_by_path(&path) {
                        out.push(p);
                    }
                }
            }
            out
        })
        .collect();

    let mut order = Vec::with_capacity(parsed.len());
    let mut state = vec![0u8; parsed.len()];
    fn visit(p: usize, deps: &[Vec<PkgId>], state: &mut [u8], order: &mut Vec<PkgId>) {
        if state[p] != 0 {
            return;
        }
        state[p] = 1;
        for d in &deps[p] {
            visit(d.index(), deps, state, order);
        }
        state[p] = 2;
        order.push(PkgId(p as u32));
    }
    for p in 0..parsed.len() {
        visit(p, &deps, &mut state, &mut order);
    }
    order
}

fn import_paths<'a>(src: &'a str, pf: &'a gofix_syntax::ParsedFile) -> impl Iterator<Item = String> + 'a {
    use gofix_syntax::ast::{Decl, GenDeclKind, Spec, TopLevelDecl};
    pf.arena
        .top_decls(pf.file.decls)
        .iter()
        .filter_map(|d| match d {
            TopLevelDecl::Decl(id) => Some(*id),
            TopLevelDecl::Func(_) => None,
        })
        .flat_map(move |id| {
            let Decl::Gen(g) = pf.arena.decls[id];
            let specs = if g.kind == GenDeclKind::Import {
                pf.arena.specs_list(g.specs)
            } else {
                &[]
            };
            specs.iter().filter_map(move |s| match s {
                Spec::Import(imp) => Some(unquote(&src[imp.path.raw.range()])),
                _ => None,
            })
        })
}

pub(crate) fn unquote(raw: &str) -> String {
    raw.trim_matches(|c| c == '"' || c == '`').to_string()
}

/// Go's export rule: the name starts with an upper-case letter.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_packages_are_private_to_their_tree() {
        let prog = ProgramBuilder::new()
            .package("a/internal/x", &[("x.go", "package x\n")])
            .package("cmd", &[("main.go", "package main\nfunc main() {}\n")])
            .build()
            .unwrap();
        assert!(prog.can_import("a", "a/internal/x"));
        assert!(prog.can_import("a/b/c", "a/internal/x"));
        assert!(!prog.can_import("b", "a/internal/x"));
        assert!(!prog.can_import("ab", "a/internal/x"));
        assert!(!prog.can_import("a", "cmd"));
        assert!(prog.can_import("a", "fmt"));
    }

    #[test]
    fn packages_are_checked_dependencies_first() {
        let prog = ProgramBuilder::new()
            .package("top", &[("t.go", "package top\nimport \"low\"\nvar V = low.X\n")])
            .package("low", &[("l.go", "package low\nconst X = 1\n")])
            .build()
            .unwrap();
        let names: Vec<_> = prog.order.iter().map(|&p| prog.package(p).path.as_str()).collect();
        assert_eq!(names, ["low", "top"]);
        assert!(prog.errors.is_empty(), "{:?}", prog.errors);
    }

    #[test]
    fn mixed_package_clauses_are_rejected() {
        let err = ProgramBuilder::new()
            .package("p", &[("a.go", "package a\n"), ("b.go", "package b\n")])
            .build()
            .unwrap_err();
        assert!(matches!(err, LoadError::MixedPackageNames { .. }));
    }
}
