//! Arena traversal.
//!
//! `#[derive(WalkAst)]` generates [`Walk`] for the node payloads: it walks
//! each field in order. Ids are where the visitor gets a say. Reaching one
//! hands the visitor a [`NodeRef`], and the payload behind it is only walked
//! if [`Visitor::enter`] agrees.

use crate::ast::*;
use crate::inspect::NodeRef;

pub trait Walk<'ast> {
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V);
}

/// Pre-order visitor over id-bearing nodes.
pub trait Visitor<'ast> {
    /// Returning `false` skips the node's children; `leave` still runs.
    fn enter(&mut self, a: &'ast AstArena, n: NodeRef) -> bool {
        let _ = (a, n);
        true
    }

    fn leave(&mut self, _n: NodeRef) {}
}

/// Visits every node of a file in source order.
pub fn walk_file<'ast, V: Visitor<'ast> + ?Sized>(a: &'ast AstArena, f: &'ast SourceFile, v: &mut V) {
    f.walk(a, v);
}

/// Walks the children of `n`, without entering `n` itself.
pub fn descend<'ast, V: Visitor<'ast> + ?Sized>(a: &'ast AstArena, n: NodeRef, v: &mut V) {
    match n {
        NodeRef::Decl(id) => a.decls[id].walk(a, v),
        NodeRef::Func(id) => a.funcs[id].walk(a, v),
        NodeRef::Stmt(id) => a.stmts[id].walk(a, v),
        NodeRef::Simple(id) => a.simple_stmts[id].walk(a, v),
        NodeRef::Expr(id) => a.exprs[id].walk(a, v),
        NodeRef::Type(id) => a.types[id].walk(a, v),
        NodeRef::Field(id) => a.fields[id].walk(a, v),
        NodeRef::Signature(id) => a.signatures[id].walk(a, v),
        NodeRef::SwitchClause(id) => a.switch_clauses[id].walk(a, v),
        NodeRef::CommClause(id) => a.comm_clauses[id].walk(a, v),
        NodeRef::TypeParams(id) => a.type_params[id].walk(a, v),
        NodeRef::TypeParamDecl(id) => a.type_param_decls[id].walk(a, v),
    }
}

macro_rules! node_ids {
    ($($id:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'ast> Walk<'ast> for $id {
                fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
                    let n = NodeRef::$variant(*self);
                    if v.enter(a, n) {
                        descend(a, n, v);
                    }
                    v.leave(n);
                }
            }
        )*
    };
}

node_ids! {
    DeclId => Decl,
    FuncDeclId => Func,
    StmtId => Stmt,
    SimpleStmtId => Simple,
    ExprId => Expr,
    TypeId => Type,
    FieldId => Field,
    SignatureId => Signature,
    SwitchClauseId => SwitchClause,
    CommClauseId => CommClause,
    TypeParamsId => TypeParams,
    TypeParamDeclId => TypeParamDecl,
}

/// Arena lists that can be walked element by element.
pub trait ListSlice<T> {
    fn slice(&self, r: ListRef<T>) -> &[T];
}

macro_rules! lists {
    ($($t:ty => $getter:ident),* $(,)?) => {
        $(
            impl ListSlice<$t> for AstArena {
                fn slice(&self, r: ListRef<$t>) -> &[$t] {
                    self.$getter(r)
                }
            }
        )*
    };
}

lists! {
    ExprId => exprs_list,
    StmtId => stmts_list,
    TypeId => types_list,
    FieldId => fields_list,
    KeyedElement => keyed_elems_list,
    Spec => specs_list,
    TopLevelDecl => top_decls,
    SwitchClauseId => switch_clause_ids,
    CommClauseId => comm_clause_ids,
    TypeCaseElem => type_case_elems,
    TypeTerm => type_terms,
    InterfaceElem => interface_elems,
    IdentName => ident_names,
    TypeParamDeclId => type_param_decl_ids,
}

impl<'ast, T> Walk<'ast> for ListRef<T>
where
    AstArena: ListSlice<T>,
    T: Walk<'ast>,
{
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        a.slice(*self).iter().for_each(|item| item.walk(a, v));
    }
}

impl<'ast, T: Walk<'ast>> Walk<'ast> for Option<T> {
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        if let Some(x) = self {
            x.walk(a, v);
        }
    }
}

impl<'ast> Walk<'ast> for Block {
    fn walk<V: Visitor<'ast> + ?Sized>(&self, a: &'ast AstArena, v: &mut V) {
        self.stmts.walk(a, v);
    }
}

// Leaves: nothing below them carries an id.
macro_rules! leaves {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<'ast> Walk<'ast> for $ty {
                fn walk<V: Visitor<'ast> + ?Sized>(&self, _: &'ast AstArena, _: &mut V) {}
            }
        )*
    };
}

leaves!(Span, Symbol, BasicLit, StringLit, GenDeclKind);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_file;

    /// Counts expressions, optionally refusing to look inside function literals.
    #[derive(Default)]
    struct Exprs {
        prune: bool,
        seen: usize,
        depth: usize,
        max_depth: usize,
    }

    impl<'ast> Visitor<'ast> for Exprs {
        fn enter(&mut self, a: &'ast AstArena, n: NodeRef) -> bool {
            self.depth += 1;
            self.max_depth = self.max_depth.max(self.depth);
            match n {
                NodeRef::Expr(e) => {
                    self.seen += 1;
                    !(self.prune && matches!(a.exprs[e], Expr::FuncLit { .. }))
                }
                _ => true,
            }
        }

        fn leave(&mut self, _: NodeRef) {
            self.depth -= 1;
        }
    }

    #[test]
    fn enter_can_prune_a_subtree() {
        let src = "package p\nfunc f() { g(1, 2); h(func() { k(3) }) }\n";
        let mut interner = Interner::new();
        let parsed = parse_file(src, &mut interner).unwrap();
        let mut full = Exprs::default();
        walk_file(&parsed.arena, &parsed.file, &mut full);
        let mut pruned = Exprs {
            prune: true,
            ..Exprs::default()
        };
        walk_file(&parsed.arena, &parsed.file, &mut pruned);
        // `k(3)` is three expressions: the call, `k` and `3`.
        assert_eq!(full.seen, pruned.seen + 3);
        assert_eq!(pruned.depth, 0);
        assert!(full.max_depth > pruned.max_depth);
    }
}
