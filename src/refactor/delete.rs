//! Removing statements and variables while keeping the file well formed.

use gofix_syntax::NodeRef;
use gofix_syntax::ast::{Decl, ExprId, ForKind, GenDeclKind, IdentName, ListRef, SimpleStmt, Span, Spec, Stmt};
use gofix_types::{File, FileId, ObjId, ObjKind, Program, VarKind};

use crate::edit::TextEdit;
use crate::error::DeleteError;
use crate::expr::classify;

/// Edits removing the statement `node`, a `Stmt` or a header `Simple`.
///
/// A statement alone on its line goes with the whole line, trailing
/// comment included. An `if` or `switch` init goes with its semicolon; a
/// `for` init or post keeps both semicolons. A labeled statement becomes
/// the empty statement.
pub fn delete_stmt(file: &File, node: NodeRef) -> Result<Vec<TextEdit>, DeleteError> {
    let arena = &file.arena;
    let insp = &file.inspector;
    if !insp.contains(node) {
        return Err(DeleteError::NotFound);
    }
    let span = node.span(arena);
    let parent = insp.parent(node).ok_or(DeleteError::NotFound)?;
    match node {
        NodeRef::Simple(s) => {
            let NodeRef::Stmt(p) = parent else {
                return Err(DeleteError::NotFound);
            };
            let end = match arena.stmts[p] {
                Stmt::Simple(_) => return delete_stmt(file, parent),
                Stmt::If { init: Some(i), cond, .. } if i == s => arena.exprs.span(cond).start,
                Stmt::Switch {
                    init: Some(i),
                    tag,
                    l_brace,
                    ..
                } if i == s => tag.map_or(l_brace.start, |t| arena.exprs.span(t).start),
                Stmt::TypeSwitch { init: Some(i), guard, .. } if i == s => guard.span.start,
                Stmt::For {
                    kind: ForKind::Clause { .. },
                    ..
                } => span.end,
                _ => return Err(DeleteError::NotFound),
            };
            Ok(vec![TextEdit::delete(Span { start: span.start, end })])
        }
        NodeRef::Stmt(s) => {
            if let NodeRef::Stmt(p) = parent {
                match arena.stmts[p] {
                    Stmt::If {
                        else_stmt: Some(e), ..
                    } if e == s => return Err(DeleteError::ElseBranch),
                    Stmt::Labeled { .. } => return Ok(vec![TextEdit::replace(span, ";")]),
                    _ => {}
                }
            }
            Ok(vec![TextEdit::delete(stmt_extent(file, span))])
        }
        _ => Err(DeleteError::NotFound),
    }
}

/// The text to delete along with a statement at `span`.
pub(crate) fn stmt_extent(file: &File, span: Span) -> Span {
    let src = file.src.as_bytes();
    let ls = file.lines.line_start(span.start);
    let le = file.lines.line_end(span.end);
    let before = file.src.get(ls as usize..span.start as usize).unwrap_or("x");
    let after = file.src.get(span.end as usize..le as usize).unwrap_or("x").trim_start();
    if before.trim().is_empty() && (after.is_empty() || after.starts_with("//")) {
        return Span {
            start: ls,
            end: (le + 1).min(src.len() as u32),
        };
    }
    let blank = |b: u8| b == b' ' || b == b'\t';
    let mut end = span.end as usize;
    while end < src.len() && blank(src[end]) {
        end += 1;
    }
    if src.get(end) == Some(&b';') {
        end += 1;
        while end < src.len() && blank(src[end]) {
            end += 1;
        }
        return Span {
            start: span.start,
            end: end as u32,
        };
    }
    let mut start = span.start as usize;
    while start > ls as usize && blank(src[start - 1]) {
        start -= 1;
    }
    Span {
        start: start as u32,
        end: end as u32,
    }
}

/// Edits removing the declaration of local or package variable `obj`.
///
/// A name whose initializer has effects is replaced by `_` so the effect
/// stays; `v := f()` becomes `_ = f()`. Removing the last new name of a
/// `:=` turns it into `=`.
pub fn delete_var(prog: &Program, fid: FileId, obj: ObjId) -> Result<Vec<TextEdit>, DeleteError> {
    match prog.object(obj).kind {
        ObjKind::Var(VarKind::Param | VarKind::Result | VarKind::Receiver) => return Err(DeleteError::Parameter),
        ObjKind::Var(VarKind::Package | VarKind::Local) => {}
        _ => return Err(DeleteError::NotAVariable),
    }
    let pos = prog.object(obj).pos.filter(|p| p.file == fid).ok_or(DeleteError::NotFound)?;
    let file = prog.file(fid);
    let arena = &file.arena;
    let node = file.inspector.innermost(arena, pos.span).ok_or(DeleteError::NotFound)?;
    let names_of = |names: ListRef<IdentName>| arena.ident_names(names).to_vec();
    match node {
        NodeRef::Decl(d) => {
            let Decl::Gen(g) = arena.decls[d];
            if g.kind != GenDeclKind::Var {
                return Err(DeleteError::NotAVariable);
            }
            let specs = arena.specs_list(g.specs);
            let (vs, spec_span) = specs
                .iter()
                .find_map(|s| match s {
                    Spec::Value(vs) if vs.span.covers(pos.span) => Some((*vs, vs.span)),
                    _ => None,
                })
                .ok_or(DeleteError::NotFound)?;
            let names = names_of(vs.names);
            let values = arena.exprs_list(vs.values);
            let i = names.iter().position(|n| n.pos == pos.span).ok_or(DeleteError::NotFound)?;
            let value = (values.len() == names.len()).then(|| values[i]);
            let impure = value.is_some_and(|v| !classify(prog, fid, v).pure) || (!values.is_empty() && value.is_none());
            if impure {
                return Ok(vec![TextEdit::replace(pos.span, "_")]);
            }
            if names.len() > 1 {
                return Ok(remove_pair(file, &names, values, i));
            }
            if specs.len() > 1 {
                return Ok(vec![TextEdit::delete(stmt_extent(file, spec_span))]);
            }
            match file.inspector.parent(node) {
                Some(p @ NodeRef::Stmt(_)) => delete_stmt(file, p),
                _ => Ok(vec![TextEdit::delete(stmt_extent(file, arena.decls.span(d)))]),
            }
        }
        NodeRef::Simple(s) => {
            let SimpleStmt::ShortVarDecl { names, op_pos, values } = arena.simple_stmts[s] else {
                return Err(DeleteError::NotAVariable);
            };
            let names = names_of(names);
            let values = arena.exprs_list(values);
            let i = names.iter().position(|n| n.pos == pos.span).ok_or(DeleteError::NotFound)?;
            let value = (values.len() == names.len()).then(|| values[i]);
            let pure = value.is_some_and(|v| classify(prog, fid, v).pure);
            if names.len() == 1 {
                return if pure {
                    delete_stmt(file, node)
                } else {
                    Ok(vec![TextEdit::replace(pos.span.to(op_pos), "_ =")])
                };
            }
            let new_left = names
                .iter()
                .enumerate()
                .any(|(j, n)| j != i && prog.info.def(fid, n.pos.start).is_some());
            let mut edits = if pure {
                remove_pair(file, &names, values, i)
            } else {
                vec![TextEdit::replace(pos.span, "_")]
            };
            if !new_left {
                edits.push(TextEdit::replace(op_pos, "="));
            }
            Ok(edits)
        }
        _ => Err(DeleteError::NotAVariable),
    }
}

/// Drops the `i`th name and, if paired, the `i`th value.
fn remove_pair(file: &File, names: &[IdentName], values: &[ExprId], i: usize) -> Vec<TextEdit> {
    let arena = &file.arena;
    let name_spans: Vec<Span> = names.iter().map(|n| n.pos).collect();
    let mut edits = vec![TextEdit::delete(list_item(&name_spans, i))];
    if values.len() == names.len() {
        let value_spans: Vec<Span> = values.iter().map(|&v| arena.exprs.span(v)).collect();
        edits.push(TextEdit::delete(list_item(&value_spans, i)));
    }
    edits
}

/// Item `i` of a comma-separated list, with the separator on one side.
fn list_item(items: &[Span], i: usize) -> Span {
    match (items.get(i + 1), i.checked_sub(1).and_then(|p| items.get(p))) {
        (Some(next), _) => Span {
            start: items[i].start,
            end: next.start,
        },
        (None, Some(prev)) => Span {
            start: prev.end,
            end: items[i].end,
        },
        (None, None) => items[i],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::apply_edits;
    use gofix_syntax::ast::Expr;
    use gofix_types::ProgramBuilder;

    fn program(src: &str) -> Program {
        ProgramBuilder::new()
            .package("example.com/a", &[("a.go", src)])
            .build()
            .unwrap()
    }

    /// Offset of the first `needle` past the shared declarations.
    fn after_prelude(src: &str, needle: &str) -> u32 {
        (PRELUDE.len() + src[PRELUDE.len()..].find(needle).unwrap()) as u32
    }

    /// The statement containing the first call of `name` below the prelude.
    fn stmt_calling(prog: &Program, name: &str) -> NodeRef {
        let file = &prog.files[0];
        let at = after_prelude(&file.src, &format!("{name}("));
        let call = file
            .inspector
            .nodes()
            .iter()
            .copied()
            .find(|n| matches!(n, NodeRef::Expr(e) if matches!(file.arena.exprs[*e], Expr::Call { .. }) && n.span(&file.arena).start == at))
            .unwrap();
        file.inspector.ancestors(call).find(|n| matches!(n, NodeRef::Stmt(_) | NodeRef::Simple(_))).unwrap()
    }

    fn delete(src: &str, name: &str) -> Result<String, DeleteError> {
        let prog = program(src);
        let edits = delete_stmt(&prog.files[0], stmt_calling(&prog, name))?;
        Ok(apply_edits(src, &edits).unwrap())
    }

    fn var(src: &str, name: &str) -> Result<String, DeleteError> {
        let prog = program(src);
        let fid = prog.files[0].id;
        let obj = prog.info.def(fid, after_prelude(src, name)).unwrap();
        let edits = delete_var(&prog, fid, obj)?;
        Ok(apply_edits(src, &edits).unwrap())
    }

    const PRELUDE: &str = "package a\n\nfunc f() {}\nfunc g() int { return 0 }\n\n";

    #[test]
    fn statement_on_its_own_line() {
        let src = format!("{PRELUDE}func _() {{\n\tf() // gone\n\tg()\n}}\n");
        assert_eq!(delete(&src, "f").unwrap(), format!("{PRELUDE}func _() {{\n\tg()\n}}\n"));
    }

    #[test]
    fn statement_sharing_a_line() {
        let src = format!("{PRELUDE}func _() {{ f() }}\n");
        assert_eq!(delete(&src, "f").unwrap(), format!("{PRELUDE}func _() {{}}\n"));
        let src = format!("{PRELUDE}func _() {{ f(); g() }}\n");
        assert_eq!(delete(&src, "f").unwrap(), format!("{PRELUDE}func _() {{ g() }}\n"));
    }

    #[test]
    fn header_statements() {
        let src = format!("{PRELUDE}func _() {{\n\tif f(); true {{\n\t}}\n}}\n");
        assert_eq!(
            delete(&src, "f").unwrap(),
            format!("{PRELUDE}func _() {{\n\tif true {{\n\t}}\n}}\n")
        );
        let src = format!("{PRELUDE}func _() {{\n\tfor i := 0; i < 3; f() {{\n\t}}\n}}\n");
        assert_eq!(
            delete(&src, "f").unwrap(),
            format!("{PRELUDE}func _() {{\n\tfor i := 0; i < 3;  {{\n\t}}\n}}\n")
        );
    }

    #[test]
    fn else_branches_and_labels() {
        let src = format!("{PRELUDE}func _() {{\n\tif true {{\n\t}} else {{\n\t}}\n}}\n");
        let prog = program(&src);
        let file = &prog.files[0];
        let else_block = file
            .inspector
            .nodes()
            .iter()
            .copied()
            .find(|n| matches!(n, NodeRef::Stmt(s) if matches!(file.arena.stmts[*s], Stmt::Block(_))))
            .unwrap();
        assert_eq!(delete_stmt(file, else_block), Err(DeleteError::ElseBranch));

        let src = format!("{PRELUDE}func _() {{\nL:\n\tf()\n\tgoto L\n}}\n");
        assert_eq!(
            delete(&src, "f").unwrap(),
            format!("{PRELUDE}func _() {{\nL:\n\t;\n\tgoto L\n}}\n")
        );
    }

    #[test]
    fn short_variable_declarations() {
        let src = format!("{PRELUDE}func _() {{\n\tx, v := 1, 2\n\t_ = x\n}}\n");
        assert_eq!(
            var(&src, "v").unwrap(),
            format!("{PRELUDE}func _() {{\n\tx := 1\n\t_ = x\n}}\n")
        );
        let src = format!("{PRELUDE}func _() {{\n\tx, v := 1, g()\n\t_ = x\n}}\n");
        assert_eq!(
            var(&src, "v").unwrap(),
            format!("{PRELUDE}func _() {{\n\tx, _ := 1, g()\n\t_ = x\n}}\n")
        );
        let src = format!("{PRELUDE}func _() {{\n\tv := g()\n}}\n");
        assert_eq!(var(&src, "v").unwrap(), format!("{PRELUDE}func _() {{\n\t_ = g()\n}}\n"));
    }

    #[test]
    fn var_declarations() {
        let src = format!("{PRELUDE}var (\n\ta = 1\n\tv = 2\n)\n");
        assert_eq!(var(&src, "v =").unwrap(), format!("{PRELUDE}var (\n\ta = 1\n)\n"));
        let src = format!("{PRELUDE}var a, v = 1, 2\n");
        assert_eq!(var(&src, "v =").unwrap(), format!("{PRELUDE}var a = 1\n"));
        assert_eq!(var(&src, "a,").unwrap(), format!("{PRELUDE}var v = 2\n"));
    }

    #[test]
    fn parameters_are_not_deletable() {
        let src = format!("{PRELUDE}func h(p int) {{}}\n");
        assert_eq!(var(&src, "p int"), Err(DeleteError::Parameter));
    }
}
