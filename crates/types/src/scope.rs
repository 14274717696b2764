use gofix_syntax::ast::{Span, Symbol};
use rustc_hash::FxHashMap;

use crate::program::Program;
use crate::{FileId, ObjId, ScopeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Universe,
    Package,
    File,
    Func,
    Block,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    pub names: FxHashMap<Symbol, ObjId>,
    /// File and extent of local scopes.
    pub file: Option<FileId>,
    pub span: Span,
}

impl Scope {
    pub(crate) fn new(kind: ScopeKind, parent: Option<ScopeId>, file: Option<FileId>, span: Span) -> Self {
        Self {
            kind,
            parent,
            children: Vec::new(),
            names: FxHashMap::default(),
            file,
            span,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self.kind, ScopeKind::Func | ScopeKind::Block)
    }

    pub fn lookup(&self, name: Symbol) -> Option<ObjId> {
        self.names.get(&name).copied()
    }
}

impl Program {
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub(crate) fn new_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>, file: Option<FileId>, span: Span) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(kind, parent, file, span));
        if let Some(p) = parent {
            self.scopes[p.index()].children.push(id);
        }
        id
    }

    /// Scope chain from `id` outwards to the universe.
    pub fn scope_chain(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), move |&s| self.scopes[s.index()].parent)
    }

    /// Innermost scope of `file` enclosing `pos`.
    pub fn innermost_scope(&self, file: FileId, pos: u32) -> ScopeId {
        let mut cur = self.files[file.index()].scope;
        'descend: loop {
            for &child in &self.scopes[cur.index()].children {
                let s = &self.scopes[child.index()];
                if s.file == Some(file) && s.is_local() && s.span.start <= pos && pos < s.span.end {
                    cur = child;
                    continue 'descend;
                }
            }
            return cur;
        }
    }

    /// Resolves `name` as seen from `pos` inside `scope`: local objects
    /// declared after `pos` are not yet visible.
    pub fn lookup_at(&self, scope: ScopeId, name: Symbol, pos: u32) -> Option<(ScopeId, ObjId)> {
        for s in self.scope_chain(scope) {
            let sc = &self.scopes[s.index()];
            if let Some(obj) = sc.lookup(name) {
                if sc.is_local() && self.objects[obj.index()].scope_pos > pos {
                    continue;
                }
                return Some((s, obj));
            }
        }
        None
    }

    /// Resolves `name` at `pos` in `file`.
    pub fn resolve_name(&self, file: FileId, name: &str, pos: u32) -> Option<ObjId> {
        let sym = self.interner.lookup(name)?;
        let scope = self.innermost_scope(file, pos);
        self.lookup_at(scope, sym, pos).map(|(_, o)| o)
    }

    /// Every name visible from `pos` in `file`.
    pub fn names_in_scope(&self, file: FileId, pos: u32) -> impl Iterator<Item = &str> + '_ {
        let scope = self.innermost_scope(file, pos);
        self.scope_chain(scope).flat_map(move |s| {
            let sc = &self.scopes[s.index()];
            sc.names
                .iter()
                .filter(move |&(_, &o)| !sc.is_local() || self.objects[o.index()].scope_pos <= pos)
                .map(|(&sym, _)| self.interner.resolve(sym))
        })
    }
}
