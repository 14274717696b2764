//! Parent links and pre-order traversal over a parsed file.
//!
//! The arena only stores child links. Rewrites need to ask the other way
//! round ("which statement holds this call?", "is this expression the
//! operand of a selector?"), so an [`Inspector`] flattens the tree once and
//! records every node's parent and subtree extent.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::ast::*;
use crate::walk::{Visitor, walk_file};

/// Any id-bearing node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRef {
    Decl(DeclId),
    Func(FuncDeclId),
    Stmt(StmtId),
    Simple(SimpleStmtId),
    Expr(ExprId),
    Type(TypeId),
    Field(FieldId),
    Signature(SignatureId),
    SwitchClause(SwitchClauseId),
    CommClause(CommClauseId),
    TypeParams(TypeParamsId),
    TypeParamDecl(TypeParamDeclId),
}

impl NodeRef {
    pub fn span(self, a: &AstArena) -> Span {
        match self {
            NodeRef::Decl(id) => a.decls.span(id),
            NodeRef::Func(id) => a.funcs.span(id),
            NodeRef::Stmt(id) => a.stmts.span(id),
            NodeRef::Simple(id) => a.simple_stmts.span(id),
            NodeRef::Expr(id) => a.exprs.span(id),
            NodeRef::Type(id) => a.types.span(id),
            NodeRef::Field(id) => a.fields.span(id),
            NodeRef::Signature(id) => a.signatures.span(id),
            NodeRef::SwitchClause(id) => a.switch_clauses.span(id),
            NodeRef::CommClause(id) => a.comm_clauses.span(id),
            NodeRef::TypeParams(id) => a.type_params.span(id),
            NodeRef::TypeParamDecl(id) => a.type_param_decls.span(id),
        }
    }

    pub fn as_expr(self) -> Option<ExprId> {
        match self {
            NodeRef::Expr(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_stmt(self) -> Option<StmtId> {
        match self {
            NodeRef::Stmt(id) => Some(id),
            _ => None,
        }
    }
}

/// The function whose body encloses a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FuncRef {
    Decl(FuncDeclId),
    /// A `func(...) { ... }` literal.
    Lit(ExprId),
}

const NO_PARENT: u32 = u32::MAX;

#[derive(Debug, Clone, Default)]
pub struct Inspector {
    nodes: Vec<NodeRef>,
    parents: Vec<u32>,
    /// One past the last descendant of each node.
    ends: Vec<u32>,
    index: FxHashMap<NodeRef, u32>,
    func_lits: FxHashSet<ExprId>,
}

impl Inspector {
    pub fn new(arena: &AstArena, file: &SourceFile) -> Self {
        let mut b = Builder::default();
        walk_file(arena, file, &mut b);
        let index = b
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (*n, i as u32))
            .collect();
        let func_lits = b
            .nodes
            .iter()
            .filter_map(|n| n.as_expr())
            .filter(|&e| matches!(arena.exprs[e], Expr::FuncLit { .. }))
            .collect();
        Self {
            nodes: b.nodes,
            parents: b.parents,
            ends: b.ends,
            index,
            func_lits,
        }
    }

    /// Every node in pre-order.
    pub fn nodes(&self) -> &[NodeRef] {
        &self.nodes
    }

    pub fn contains(&self, n: NodeRef) -> bool {
        self.index.contains_key(&n)
    }

    pub fn parent(&self, n: NodeRef) -> Option<NodeRef> {
        let i = *self.index.get(&n)?;
        match self.parents[i as usize] {
            NO_PARENT => None,
            p => Some(self.nodes[p as usize]),
        }
    }

    /// Ancestors from the immediate parent outwards.
    pub fn ancestors(&self, n: NodeRef) -> impl Iterator<Item = NodeRef> + '_ {
        std::iter::successors(self.parent(n), move |&p| self.parent(p))
    }

    /// Strict descendants of `n`, in pre-order.
    pub fn descendants(&self, n: NodeRef) -> &[NodeRef] {
        match self.index.get(&n) {
            Some(&i) => &self.nodes[i as usize + 1..self.ends[i as usize] as usize],
            None => &[],
        }
    }

    pub fn enclosing_func(&self, n: NodeRef) -> Option<FuncRef> {
        self.ancestors(n).find_map(|p| match p {
            NodeRef::Func(id) => Some(FuncRef::Decl(id)),
            NodeRef::Expr(id) if self.is_func_lit_body(n, id) => Some(FuncRef::Lit(id)),
            _ => None,
        })
    }

    /// True if `n` sits inside the body of the function literal `lit`
    /// (not its signature).
    fn is_func_lit_body(&self, n: NodeRef, lit: ExprId) -> bool {
        if !self.func_lits.contains(&lit) {
            return false;
        }
        let mut child = n;
        for p in self.ancestors(n) {
            if p == NodeRef::Expr(lit) {
                return !matches!(child, NodeRef::Signature(_));
            }
            child = p;
        }
        false
    }

    /// Nearest statement containing `n`, `n` itself excluded.
    pub fn enclosing_stmt(&self, n: NodeRef) -> Option<StmtId> {
        self.ancestors(n).find_map(NodeRef::as_stmt)
    }

    /// Innermost node covering `[start, end)`.
    pub fn innermost(&self, arena: &AstArena, span: Span) -> Option<NodeRef> {
        let mut found = None;
        let mut i = 0usize;
        while i < self.nodes.len() {
            let s = self.nodes[i].span(arena);
            if s.covers(span) {
                found = Some(self.nodes[i]);
                i += 1;
            } else {
                i = self.ends[i] as usize;
            }
        }
        found
    }
}

/// A node together with the inspector that knows its surroundings.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'i> {
    inspector: &'i Inspector,
    node: NodeRef,
}

impl<'i> Cursor<'i> {
    pub fn node(&self) -> NodeRef {
        self.node
    }

    pub fn parent(&self) -> Option<Cursor<'i>> {
        let node = self.inspector.parent(self.node)?;
        Some(Cursor {
            inspector: self.inspector,
            node,
        })
    }

    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef> + 'i {
        self.inspector.ancestors(self.node)
    }

    pub fn enclosing_func(&self) -> Option<FuncRef> {
        self.inspector.enclosing_func(self.node)
    }

    pub fn enclosing_stmt(&self) -> Option<StmtId> {
        self.inspector.enclosing_stmt(self.node)
    }
}

impl Inspector {
    pub fn cursor(&self, node: NodeRef) -> Option<Cursor<'_>> {
        self.contains(node).then_some(Cursor {
            inspector: self,
            node,
        })
    }
}

#[derive(Default)]
struct Builder {
    nodes: Vec<NodeRef>,
    parents: Vec<u32>,
    ends: Vec<u32>,
    stack: Vec<u32>,
}

impl<'ast> Visitor<'ast> for Builder {
    fn enter(&mut self, _: &'ast AstArena, n: NodeRef) -> bool {
        let idx = self.nodes.len() as u32;
        self.parents.push(self.stack.last().copied().unwrap_or(NO_PARENT));
        self.nodes.push(n);
        self.ends.push(idx + 1);
        self.stack.push(idx);
        true
    }

    fn leave(&mut self, _: NodeRef) {
        if let Some(idx) = self.stack.pop() {
            self.ends[idx as usize] = self.nodes.len() as u32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_file;

    #[test]
    fn call_inside_func_lit_reports_lit_as_enclosing_func() {
        let src = "package p\nfunc f() {\n\tg := func() { h() }\n\t_ = g\n}\n";
        let mut interner = Interner::new();
        let parsed = parse_file(src, &mut interner).unwrap();
        let insp = Inspector::new(&parsed.arena, &parsed.file);

        let call = parsed
            .arena
            .exprs
            .iter()
            .find(|(_, e)| matches!(e, Expr::Call { .. }))
            .map(|(id, _)| id)
            .unwrap();
        let Some(FuncRef::Lit(lit)) = insp.enclosing_func(NodeRef::Expr(call)) else {
            panic!("expected function literal");
        };
        assert!(matches!(parsed.arena.exprs[lit], Expr::FuncLit { .. }));
        let outer = insp.ancestors(NodeRef::Expr(lit)).find_map(|n| match n {
            NodeRef::Func(id) => Some(id),
            _ => None,
        });
        assert!(outer.is_some());
        assert!(insp.enclosing_stmt(NodeRef::Expr(call)).is_some());
    }

    #[test]
    fn innermost_finds_the_call() {
        let src = "package p\nfunc f() { x := g(1) + 2; _ = x }\n";
        let mut interner = Interner::new();
        let parsed = parse_file(src, &mut interner).unwrap();
        let insp = Inspector::new(&parsed.arena, &parsed.file);
        let at = src.find("g(1)").unwrap();
        let node = insp.innermost(&parsed.arena, Span::new(at, at + 4)).unwrap();
        let id = node.as_expr().unwrap();
        assert!(matches!(parsed.arena.exprs[id], Expr::Call { .. }));
    }
}
