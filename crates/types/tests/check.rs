use gofix_syntax::ast::{ExprId, Span};
use gofix_types::{
    ConstValue, FileId, ObjKind, ObjId, PkgId, Program, ProgramBuilder, SelectionKind, TyId, VarKind,
};

fn single(src: &str) -> (Program, FileId) {
    let prog = ProgramBuilder::new()
        .package("example.com/p", &[("p.go", src)])
        .build()
        .expect("program loads");
    assert!(prog.errors.is_empty(), "unexpected type errors: {:?}", prog.errors);
    let fid = prog.file_by_name("p.go").unwrap();
    (prog, fid)
}

/// Offset of the `nth` occurrence of `needle` in `src`.
fn offset(src: &str, needle: &str, nth: usize) -> usize {
    src.match_indices(needle).nth(nth).map(|(i, _)| i).unwrap_or_else(|| panic!("{needle:?} #{nth} not found"))
}

fn expr_at(prog: &Program, fid: FileId, needle: &str) -> ExprId {
    let file = prog.file(fid);
    let at = offset(&file.src, needle, 0);
    file.inspector
        .innermost(&file.arena, Span::new(at, at + needle.len()))
        .and_then(|n| n.as_expr())
        .unwrap_or_else(|| panic!("no expression at {needle:?}"))
}

fn type_at(prog: &Program, fid: FileId, needle: &str) -> String {
    let e = expr_at(prog, fid, needle);
    let ty = prog.info.type_of(fid, e).expect("expression has a type");
    unqualified(prog, ty)
}

fn unqualified(prog: &Program, ty: TyId) -> String {
    prog.type_string(ty, &|_: PkgId| None::<String>)
}

fn obj_at(prog: &Program, fid: FileId, needle: &str, nth: usize) -> ObjId {
    let at = offset(&prog.file(fid).src, needle, nth) as u32;
    prog.info.object_at(fid, at).expect("identifier resolves")
}

#[test]
fn short_var_decl_shadows_from_the_end_of_the_statement() {
    let src = "package p\n\nvar x = 1\n\nfunc f() int {\n\tx := \"s\" + string(rune(x))\n\t_ = x\n\treturn 0\n}\n";
    let (prog, fid) = single(src);

    let inner = obj_at(&prog, fid, "x", 1);
    assert_eq!(prog.object(inner).kind, ObjKind::Var(VarKind::Local));
    assert_eq!(unqualified(&prog, prog.object(inner).ty), "string");

    let in_rhs = obj_at(&prog, fid, "x", 2);
    assert!(prog.is_package_level(in_rhs));

    let at_use = offset(src, "_ = x", 0) as u32 + 4;
    assert_eq!(prog.resolve_name(fid, "x", at_use), Some(inner));
    let before = offset(src, "x :=", 0) as u32;
    assert_eq!(prog.resolve_name(fid, "x", before), Some(in_rhs));
}

#[test]
fn selections_through_embedded_pointers() {
    let src = "package p\n\ntype Inner struct{ N int }\n\nfunc (i *Inner) Get() int { return i.N }\n\ntype Outer struct{ *Inner }\n\nfunc use(o Outer) int { return o.Get() + o.N }\n";
    let (prog, fid) = single(src);

    let get = prog.info.selection(fid, expr_at(&prog, fid, "o.Get")).expect("selection");
    assert_eq!(get.kind, SelectionKind::MethodVal);
    assert_eq!(get.index.as_slice(), &[0, 0]);
    assert!(get.indirect);
    assert_eq!(prog.obj_name(get.obj), "Get");

    let n = prog.info.selection(fid, expr_at(&prog, fid, "o.N")).expect("selection");
    assert_eq!(n.kind, SelectionKind::FieldVal);
    assert_eq!(n.depth(), 1);
    assert_eq!(type_at(&prog, fid, "o.N"), "int");
}

#[test]
fn generic_types_and_functions_are_instantiated() {
    let src = "package p\n\ntype List[T any] struct{ items []T }\n\nfunc (l *List[T]) Push(v T) { l.items = append(l.items, v) }\n\nfunc Map[T, U any](xs []T, f func(T) U) []U { return nil }\n\nfunc use() {\n\tvar l List[string]\n\tl.Push(\"a\")\n\t_ = Map([]int{1}, func(i int) string { return \"\" })\n}\n";
    let (prog, fid) = single(src);

    assert_eq!(type_at(&prog, fid, "l.Push"), "func(string)");
    assert_eq!(type_at(&prog, fid, "Map([]int{1}, func(i int) string { return \"\" })"), "[]string");

    let at = offset(src, "Map([]int", 0) as u32;
    let targs = prog.info.instances.get(&(fid, at)).expect("instance recorded");
    let names: Vec<String> = targs.iter().map(|&t| unqualified(&prog, t)).collect();
    assert_eq!(names, ["int", "string"]);
}

#[test]
fn iota_repeats_through_implicit_specs() {
    let src = "package p\n\nconst (\n\tA = iota * 10\n\tB\n\tC\n)\n\nconst S = \"ab\" + \"c\"\n";
    let (prog, _) = single(src);
    let pkg = prog.order[0];
    let value = |name: &str| prog.object(prog.package_member(pkg, name).unwrap()).const_value().cloned();
    assert_eq!(value("A"), Some(ConstValue::Int(0)));
    assert_eq!(value("C"), Some(ConstValue::Int(20)));
    assert_eq!(value("S"), Some(ConstValue::Str("abc".into())));
}

#[test]
fn types_print_with_qualifiers() {
    let prog = ProgramBuilder::new()
        .package("example.com/a", &[("a.go", "package a\n\ntype T struct{}\n\nfunc New() *T { return nil }\n")])
        .package("example.com/b", &[("b.go", "package b\n\nimport \"example.com/a\"\n\nvar V = a.New()\n")])
        .build()
        .unwrap();
    assert!(prog.errors.is_empty(), "{:?}", prog.errors);
    let b = prog.package_by_path("example.com/b").unwrap();
    let v = prog.object(prog.package_member(b, "V").unwrap()).ty;

    let by_name = |p: PkgId| Some(prog.package(p).name.clone());
    assert_eq!(prog.type_string(v, &by_name), "*a.T");
    assert_eq!(prog.canonical_type_string(v), "*example.com/a.T");
    assert_eq!(unqualified(&prog, v), "*T");
}

#[test]
fn type_switch_clauses_get_their_own_objects() {
    let src = "package p\n\nfunc f(x any) {\n\tswitch v := x.(type) {\n\tcase int:\n\t\t_ = v\n\tcase string, error:\n\t\t_ = v\n\t}\n}\n";
    let (prog, fid) = single(src);
    let first = offset(src, "_ = v", 0) as u32 + 4;
    let second = offset(src, "_ = v", 1) as u32 + 4;
    let a = prog.info.use_of(fid, first).unwrap();
    let b = prog.info.use_of(fid, second).unwrap();
    assert_ne!(a, b);
    assert_eq!(unqualified(&prog, prog.object(a).ty), "int");
    assert_eq!(unqualified(&prog, prog.object(b).ty), "any");
}

#[test]
fn undefined_names_are_reported() {
    let prog = ProgramBuilder::new()
        .package("p", &[("p.go", "package p\n\nvar v = missing + 1\n")])
        .build()
        .unwrap();
    assert_eq!(prog.errors.len(), 1);
    assert_eq!(prog.errors[0].message, "undefined: missing");
}

#[test]
fn method_expressions_take_the_receiver_first() {
    let src = "package p\n\ntype T int\n\nfunc (t T) Add(n int) int { return int(t) + n }\n\nvar f = T.Add\n";
    let (prog, fid) = single(src);
    assert_eq!(type_at(&prog, fid, "T.Add"), "func(T, int) int");
    let sel = prog.info.selection(fid, expr_at(&prog, fid, "T.Add")).unwrap();
    assert_eq!(sel.kind, SelectionKind::MethodExpr);
}

#[test]
fn predeclared_error_and_comparable() {
    let src = "package p\n\nfunc msg(e error) string { return e.Error() }\n\nfunc eq[T comparable](a, b T) bool { return a == b }\n";
    let (prog, fid) = single(src);

    assert_eq!(type_at(&prog, fid, "e.Error()"), "string");
    let e = obj_at(&prog, fid, "e error", 0);
    assert_eq!(unqualified(&prog, prog.object(e).ty), "error");

    let c = obj_at(&prog, fid, "comparable", 0);
    assert_eq!(prog.object(c).kind, ObjKind::TypeName { alias: false });
    assert_eq!(unqualified(&prog, prog.object(c).ty), "comparable");
}

#[test]
fn import_names_come_from_the_spec_or_the_package() {
    let mathx = "package m\n\nconst One = 1\n";
    let src = "package p\n\nimport (\n\t\"example.com/mathx\"\n\tk \"example.com/mathx\"\n\t_ \"example.com/mathx\"\n)\n\nvar _ = m.One + k.One\n";
    let prog = ProgramBuilder::new()
        .package("example.com/mathx", &[("m.go", mathx)])
        .package("example.com/p", &[("p.go", src)])
        .build()
        .expect("program loads");
    assert!(prog.errors.is_empty(), "unexpected type errors: {:?}", prog.errors);
    let file = prog.file(prog.file_by_name("p.go").unwrap());
    let names: Vec<Option<&str>> = file.imports.iter().map(|imp| prog.import_name(imp)).collect();
    assert_eq!(names, [Some("m"), Some("k"), None]);
}
