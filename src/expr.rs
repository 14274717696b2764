//! Syntactic and semantic questions about single expressions, asked both
//! of callee bodies and of call sites.

use gofix_syntax::ast::{AstArena, Element, Expr, ExprId, Symbol, UnaryOp};
use gofix_syntax::{Inspector, NodeRef};
use gofix_types::{BasicKind, FileId, Mode, ObjKind, Program, SelectionKind, Type};

/// Selectors, calls, indexing and operands.
pub(crate) const PREC_PRIMARY: u8 = 7;
pub(crate) const PREC_UNARY: u8 = 6;

pub(crate) fn precedence(arena: &AstArena, e: ExprId) -> u8 {
    match arena.exprs[e] {
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary { .. } => PREC_UNARY,
        _ => PREC_PRIMARY,
    }
}

/// Precedence an expression needs to stand where `e` stands without
/// parentheses.
pub(crate) fn required_precedence(arena: &AstArena, insp: &Inspector, e: ExprId) -> u8 {
    let Some(NodeRef::Expr(p)) = insp.parent(NodeRef::Expr(e)) else {
        return 0;
    };
    match arena.exprs[p] {
        Expr::Binary { left, op, .. } if left == e => op.precedence(),
        Expr::Binary { op, .. } => op.precedence() + 1,
        // `-(-x)`, not `--x`
        Expr::Unary { .. } => PREC_PRIMARY,
        Expr::Selector { expr, .. } | Expr::Slice { expr, .. } | Expr::TypeAssert { expr, .. } if expr == e => {
            PREC_PRIMARY
        }
        Expr::Index { base, .. } if base == e => PREC_PRIMARY,
        Expr::Call { func, .. } if func == e => PREC_PRIMARY,
        _ => 0,
    }
}

/// Wraps `text` in parentheses if an expression of precedence `prec` is not
/// strong enough for a slot needing `need`.
pub(crate) fn parenthesize(text: &str, prec: u8, need: u8) -> String {
    if prec < need {
        format!("({text})")
    } else {
        text.to_string()
    }
}

/// How an argument may be moved, dropped or copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Class {
    /// Evaluating it has no side effects.
    pub pure: bool,
    /// Its value depends on variables or memory.
    pub reads: bool,
    /// Cheap and safe to evaluate more than once.
    pub dup: bool,
    /// Denotes a constant, `nil`, a function or a type.
    pub constant: bool,
}

impl Class {
    const CONSTANT: Class = Class {
        pure: true,
        reads: false,
        dup: true,
        constant: true,
    };
    const IMPURE: Class = Class {
        pure: false,
        reads: true,
        dup: false,
        constant: false,
    };

    fn value(pure: bool, reads: bool) -> Class {
        Class {
            pure,
            reads,
            dup: false,
            constant: false,
        }
    }

    fn and(self, other: Class) -> Class {
        Class {
            pure: self.pure && other.pure,
            reads: self.reads || other.reads,
            dup: false,
            constant: false,
        }
    }
}

pub(crate) fn classify(prog: &Program, fid: FileId, e: ExprId) -> Class {
    let arena = &prog.file(fid).arena;
    let tv = prog.info.type_and_value(fid, e);
    if tv.is_some_and(|tv| tv.value.is_some()) {
        let string = tv.is_some_and(|tv| {
            matches!(
                prog.types.basic_kind(tv.ty),
                Some(BasicKind::String | BasicKind::UntypedString)
            )
        });
        let dup = match arena.exprs[arena.unparen(e)] {
            Expr::Ident(_) | Expr::Selector { .. } => true,
            Expr::BasicLit(lit) => !string || lit.raw.len() <= 2,
            Expr::Unary { expr, .. } => matches!(arena.exprs[expr], Expr::BasicLit(_)),
            _ => false,
        };
        return Class { dup, ..Class::CONSTANT };
    }
    match arena.exprs[e] {
        Expr::Ident(_) => ident_class(prog, fid, arena.exprs.span(e).start),
        Expr::BasicLit(_) | Expr::TypeExpr(_) => Class::CONSTANT,
        Expr::Paren { expr, .. } => classify(prog, fid, expr),
        Expr::FuncLit { .. } => Class::value(true, false),
        Expr::Selector { expr, sel, .. } => {
            if qualifier(prog, fid, expr).is_some() {
                return ident_class(prog, fid, sel.pos.start);
            }
            let base = classify(prog, fid, expr);
            match prog.info.selection(fid, e).map(|s| s.kind) {
                Some(SelectionKind::MethodExpr) => Class::CONSTANT,
                _ => Class::value(base.pure, true),
            }
        }
        Expr::Unary { op, expr, .. } => {
            let inner = classify(prog, fid, expr);
            match op {
                UnaryOp::Recv => Class::IMPURE,
                UnaryOp::Addr if matches!(arena.exprs[arena.unparen(expr)], Expr::Ident(_)) => Class {
                    pure: true,
                    reads: false,
                    dup: true,
                    constant: false,
                },
                UnaryOp::Addr => Class::value(inner.pure, inner.reads),
                UnaryOp::Deref => Class::value(inner.pure, true),
                _ => Class::value(inner.pure, inner.reads),
            }
        }
        Expr::Binary { left, right, .. } => classify(prog, fid, left).and(classify(prog, fid, right)),
        Expr::Index { base, indices, .. } => {
            let mut c = classify(prog, fid, base).and(Class::value(true, true));
            for &i in arena.exprs_list(indices) {
                c = c.and(classify(prog, fid, i));
            }
            c
        }
        Expr::Slice { expr, lo, hi, max, .. } => {
            let mut c = classify(prog, fid, expr).and(Class::value(true, true));
            for i in [lo, hi, max].into_iter().flatten() {
                c = c.and(classify(prog, fid, i));
            }
            c
        }
        Expr::TypeAssert { .. } => Class::IMPURE,
        Expr::CompositeLit { lit, .. } => {
            let elems = arena.keyed_elems_list(lit.elems);
            let mut c = Class::value(true, false);
            for el in elems {
                if let Some(gofix_syntax::ast::Key::Expr(k)) = el.key {
                    c = c.and(classify(prog, fid, k));
                }
                if let Element::Expr(v) = el.value {
                    c = c.and(classify(prog, fid, v));
                }
            }
            Class {
                dup: elems.is_empty(),
                ..c
            }
        }
        Expr::Call { func, args, .. } => {
            let args = arena.exprs_list(args);
            match prog.info.type_and_value(fid, func).map(|tv| tv.mode) {
                Some(Mode::TypeExpr) => {
                    let inner = args.first().map_or(Class::CONSTANT, |&a| classify(prog, fid, a));
                    Class {
                        dup: inner.dup,
                        ..Class::value(inner.pure, inner.reads)
                    }
                }
                Some(Mode::Builtin) if builtin_of(prog, fid, func).is_some_and(|b| b.is_pure()) => args
                    .iter()
                    .fold(Class::value(true, false), |c, &a| c.and(classify(prog, fid, a))),
                _ => Class::IMPURE,
            }
        }
    }
}

fn ident_class(prog: &Program, fid: FileId, pos: u32) -> Class {
    match prog.info.use_of(fid, pos).map(|o| &prog.object(o).kind) {
        Some(ObjKind::Var(_)) => Class {
            pure: true,
            reads: true,
            dup: true,
            constant: false,
        },
        Some(_) => Class::CONSTANT,
        None => Class::value(true, true),
    }
}

/// The builtin a call's function expression denotes.
pub(crate) fn builtin_of(prog: &Program, fid: FileId, func: ExprId) -> Option<gofix_types::Builtin> {
    let arena = &prog.file(fid).arena;
    let Expr::Ident(_) = arena.exprs[arena.unparen(func)] else {
        return None;
    };
    let pos = arena.exprs.span(arena.unparen(func)).start;
    match prog.object(prog.info.use_of(fid, pos)?).kind {
        ObjKind::Builtin(b) => Some(b),
        _ => None,
    }
}

/// The imported package object if `e` is the qualifier of `pkg.Name`.
pub(crate) fn qualifier(prog: &Program, fid: FileId, e: ExprId) -> Option<gofix_types::ObjId> {
    let arena = &prog.file(fid).arena;
    let Expr::Ident(_) = arena.exprs[e] else {
        return None;
    };
    let obj = prog.info.use_of(fid, arena.exprs.span(e).start)?;
    matches!(prog.object(obj).kind, ObjKind::PkgName { .. }).then_some(obj)
}

/// True if evaluating `e` itself (not its operands) may have an effect
/// visible outside the expression.
pub(crate) fn is_effect(prog: &Program, fid: FileId, e: ExprId) -> bool {
    let arena = &prog.file(fid).arena;
    match arena.exprs[e] {
        Expr::Unary { op: UnaryOp::Recv, .. } => true,
        Expr::Call { func, .. } => match prog.info.type_and_value(fid, func).map(|tv| tv.mode) {
            Some(Mode::TypeExpr) => false,
            Some(Mode::Builtin) => !builtin_of(prog, fid, func).is_some_and(|b| {
                b.is_pure() || matches!(b, gofix_types::Builtin::Append | gofix_types::Builtin::Make | gofix_types::Builtin::New)
            }),
            _ => true,
        },
        _ => false,
    }
}

/// Identifiers mentioned anywhere in `e`.
pub(crate) fn mentioned_names(arena: &AstArena, insp: &Inspector, e: ExprId) -> Vec<Symbol> {
    std::iter::once(NodeRef::Expr(e))
        .chain(insp.descendants(NodeRef::Expr(e)).iter().copied())
        .filter_map(|n| match n {
            NodeRef::Expr(id) => match arena.exprs[id] {
                Expr::Ident(sym) => Some(sym),
                _ => None,
            },
            NodeRef::Type(t) => match arena.types[t] {
                gofix_syntax::ast::Type::Named { pkg, name, .. } => Some(pkg.map_or(name.sym, |p| p.sym)),
                _ => None,
            },
            _ => None,
        })
        .collect()
}

/// Whether `ty` prints as something that must be parenthesized before it
/// can be called as a conversion: `*T`, `<-chan T`, `func()`, `chan T`.
pub(crate) fn type_needs_parens(text: &str) -> bool {
    text.starts_with('*') || text.starts_with("<-") || text.starts_with("func") || text.starts_with("chan")
}

/// `T(x)`, parenthesizing `T` when it would not parse as a callee.
pub(crate) fn conversion(ty: &str, x: &str) -> String {
    if type_needs_parens(ty) {
        format!("({ty})({x})")
    } else {
        format!("{ty}({x})")
    }
}

/// The struct type behind `ty`, through one pointer.
pub(crate) fn struct_fields(prog: &Program, ty: gofix_types::TyId) -> Option<&[gofix_types::ObjId]> {
    let t = prog.types.pointer_elem(ty).unwrap_or(ty);
    match prog.types.get(prog.types.underlying(t)) {
        Type::Struct(s) => Some(&s.fields),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parentheses_only_when_needed() {
        assert_eq!(parenthesize("a + b", 4, 5), "(a + b)");
        assert_eq!(parenthesize("a * b", 5, 5), "a * b");
        assert_eq!(parenthesize("x", PREC_PRIMARY, PREC_PRIMARY), "x");
    }

    #[test]
    fn conversions_of_awkward_types() {
        assert_eq!(conversion("int64", "x"), "int64(x)");
        assert_eq!(conversion("*T", "nil"), "(*T)(nil)");
        assert_eq!(conversion("func()", "nil"), "(func())(nil)");
        assert_eq!(conversion("<-chan int", "c"), "(<-chan int)(c)");
    }
}
