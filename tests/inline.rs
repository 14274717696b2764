use gofix::{Analyzer, Diagnostic, MemoryFactStore, Options, PackageReport, apply_fixes};
use gofix_types::{Program, ProgramBuilder};
use std::sync::Once;

static INIT: Once = Once::new();

fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

struct Run {
    prog: Program,
    reports: Vec<PackageReport>,
}

impl Run {
    fn diagnostics(&self, path: &str) -> &[Diagnostic] {
        let report = self.reports.iter().find(|r| r.path == path).unwrap();
        &report.diagnostics
    }

    fn messages(&self, path: &str) -> Vec<&str> {
        self.diagnostics(path).iter().map(|d| d.message.as_str()).collect()
    }

    /// The package's only file with every suggested fix applied.
    fn fixed(&self, path: &str) -> String {
        let pkg = self.prog.package_by_path(path).unwrap();
        let fid = self.prog.package(pkg).files[0];
        let file = self.prog.file(fid);
        apply_fixes(&file.src, fid, self.diagnostics(path)).unwrap()
    }
}

/// Loads one single-file package per `(path, source)`, dependencies first.
fn run_with(pkgs: &[(&str, &str)], options: Options) -> Run {
    init_tracing();
    let mut builder = ProgramBuilder::new();
    for &(path, src) in pkgs {
        let name = format!("{}.go", path.rsplit('/').next().unwrap());
        builder = builder.package(path, &[(name.as_str(), src)]);
    }
    let prog = builder.build().unwrap();
    let mut store = MemoryFactStore::new();
    let reports = Analyzer::new(options).run(&prog, &mut store);
    Run { prog, reports }
}

fn run(pkgs: &[(&str, &str)]) -> Run {
    run_with(pkgs, Options::default())
}

/// Inlines within a single package `example.com/a` and returns the result.
fn inline(src: &str) -> String {
    run(&[("example.com/a", src)]).fixed("example.com/a")
}

const A: &str = "example.com/a";

#[test]
fn identity_call_in_expression() {
    let src = "package a\n\n//go:fix inline\nfunc f(x int) int { return x }\n\nvar _ = f(0)\n";
    let r = run(&[(A, src)]);
    assert_eq!(r.messages(A), ["Call of example.com/a.f should be inlined"]);
    assert_eq!(
        r.fixed(A),
        "package a\n\n//go:fix inline\nfunc f(x int) int { return x }\n\nvar _ = 0\n"
    );
}

#[test]
fn long_string_used_twice_is_bound() {
    let src = "package a\n\n//go:fix inline\nfunc f(s string, i int) { print(s, s, i, i) }\n\nfunc _() { f(\"hi\", 0) }\n";
    assert_eq!(
        inline(src),
        "package a\n\n//go:fix inline\nfunc f(s string, i int) { print(s, s, i, i) }\n\nfunc _() { var s = \"hi\"; print(s, s, 0, 0) }\n"
    );
}

#[test]
fn shadowed_constant_is_left_alone() {
    let src = "package a\n\n//go:fix inline\nconst Ptr = Pointer\n\nconst Pointer = 0\n\nfunc _() {\n\tvar Pointer int\n\t_ = Pointer\n\t_ = Ptr\n}\n";
    let r = run(&[(A, src)]);
    assert!(r.messages(A).is_empty(), "{:?}", r.messages(A));
}

#[test]
fn constant_in_same_package() {
    let src = "package a\n\n//go:fix inline\nconst Ptr = Pointer\n\nconst Pointer = 0\n\nvar _ = Ptr\n";
    assert_eq!(
        inline(src),
        "package a\n\n//go:fix inline\nconst Ptr = Pointer\n\nconst Pointer = 0\n\nvar _ = Pointer\n"
    );
}

#[test]
fn constant_across_packages() {
    let b = "package b\n\n//go:fix inline\nconst E = F\n\nconst F = 1\n";
    let c = "package c\n\nimport \"example.com/b\"\n\nvar _ = b.E\n";
    let r = run(&[("example.com/b", b), ("example.com/c", c)]);
    assert_eq!(r.messages("example.com/c"), ["Constant E should be inlined"]);
    assert_eq!(
        r.fixed("example.com/c"),
        "package c\n\nimport \"example.com/b\"\n\nvar _ = b.F\n"
    );
}

#[test]
fn variadic_arguments_become_a_slice() {
    let src = "package a\n\n//go:fix inline\nfunc f(x int, rest ...int) { println(x, rest) }\n\nfunc _() { f(1, 2, 3) }\n";
    assert!(
        inline(src).ends_with("func _() { println(1, []int{2, 3}) }\n"),
        "{}",
        inline(src)
    );
}

#[test]
fn array_alias_is_rejected() {
    let src = "package a\n\nconst N = 5\n\n//go:fix inline\ntype A = [N]int\n";
    let r = run(&[(A, src)]);
    assert_eq!(r.messages(A), ["invalid inline directive: array types not supported"]);
}

#[test]
fn value_receiver_method() {
    let src = "package a\n\ntype T struct{ n int }\n\n//go:fix inline\nfunc (t T) Get() int { return t.n }\n\nfunc _(x T) int { return x.Get() }\n";
    assert!(inline(src).ends_with("func _(x T) int { return x.n }\n"), "{}", inline(src));
}

#[test]
fn pointer_receiver_on_addressable_value() {
    let src = "package a\n\ntype T struct{ n int }\n\n//go:fix inline\nfunc (t *T) Set(v int) { t.n = v }\n\nfunc _() {\n\tvar x T\n\tx.Set(1)\n\t_ = x\n}\n";
    assert!(
        inline(src).ends_with("func _() {\n\tvar x T\n\tx.n = 1\n\t_ = x\n}\n"),
        "{}",
        inline(src)
    );
}

#[test]
fn deferred_call_becomes_a_literal() {
    let src = "package a\n\n//go:fix inline\nfunc f() { println(\"a\") }\n\nfunc _() { defer f() }\n";
    assert!(
        inline(src).ends_with("func _() { defer func() { println(\"a\") }() }\n"),
        "{}",
        inline(src)
    );
}

#[test]
fn deferred_call_without_literalization_is_skipped() {
    let src = "package a\n\n//go:fix inline\nfunc f() { println(\"a\") }\n\nfunc _() { defer f() }\n";
    let options = Options {
        allow_literalization: false,
        ..Options::default()
    };
    let r = run_with(&[(A, src)], options);
    assert!(r.messages(A).is_empty(), "{:?}", r.messages(A));
}

#[test]
fn empty_body_removes_the_statement() {
    let src = "package a\n\n//go:fix inline\nfunc f() {}\n\nfunc _() {\n\tf()\n\tprintln()\n}\n";
    assert!(
        inline(src).ends_with("func _() {\n\tprintln()\n}\n"),
        "{}",
        inline(src)
    );
}

#[test]
fn multiple_results_in_a_short_variable_declaration() {
    let src = "package a\n\n//go:fix inline\nfunc two() (int, int) { return 1, 2 }\n\nfunc _() {\n\ta, b := two()\n\tprintln(a, b)\n}\n";
    assert!(
        inline(src).contains("\ta, b := 1, 2\n"),
        "{}",
        inline(src)
    );
}

#[test]
fn tail_call_splices_the_body() {
    let src = "package a\n\n//go:fix inline\nfunc abs(x int) int {\n\tif x < 0 {\n\t\treturn -x\n\t}\n\treturn x\n}\n\nfunc g(y int) int {\n\treturn abs(y)\n}\n";
    assert!(
        inline(src).ends_with("func g(y int) int {\n\tif y < 0 {\n\t\treturn -y\n\t}\n\treturn y\n}\n"),
        "{}",
        inline(src)
    );
}

#[test]
fn reordered_effects_are_bound_first() {
    let src = "package a\n\nfunc g() int { return 1 }\nfunc h() int { return 2 }\n\n//go:fix inline\nfunc f(a, b int) int { return b + a }\n\nfunc _() { _ = f(g(), h()) }\n";
    assert!(
        inline(src).ends_with("func _() { var a = g(); _ = h() + a }\n"),
        "{}",
        inline(src)
    );
}

#[test]
fn recover_is_reported_at_the_call() {
    let src = "package a\n\n//go:fix inline\nfunc r() { recover() }\n\nfunc _() { r() }\n";
    let r = run(&[(A, src)]);
    assert_eq!(
        r.messages(A),
        ["cannot inline call to example.com/a.r: body calls recover"]
    );
    assert!(r.diagnostics(A)[0].fixes.is_empty());
}

#[test]
fn unexported_names_do_not_cross_packages() {
    let b = "package b\n\nfunc helper() int { return 1 }\n\n//go:fix inline\nfunc F() int { return helper() }\n";
    let c = "package c\n\nimport \"example.com/b\"\n\nvar _ = b.F()\n";
    let r = run(&[("example.com/b", b), ("example.com/c", c)]);
    let messages = r.messages("example.com/c");
    assert_eq!(messages.len(), 1);
    assert!(messages[0].ends_with("body refers to unexported helper"), "{}", messages[0]);
}

#[test]
fn callee_imports_move_to_the_caller() {
    let m = "package m\n\nfunc Twice(x int) int { return 2 * x }\n";
    let b = "package b\n\nimport \"example.com/m\"\n\n//go:fix inline\nfunc Double(x int) int { return m.Twice(x) }\n";
    let c = "package c\n\nimport \"example.com/b\"\n\nvar _ = b.Double(1)\n";
    let r = run(&[("example.com/m", m), ("example.com/b", b), ("example.com/c", c)]);
    let out = r.fixed("example.com/c");
    assert!(out.contains("var _ = m.Twice(1)\n"), "{out}");
    assert!(out.contains("\"example.com/m\""), "{out}");
    assert!(!out.contains("\"example.com/b\""), "{out}");
}

#[test]
fn alias_in_same_package() {
    let src = "package a\n\n//go:fix inline\ntype A = int\n\nvar _ A = 1\n";
    assert!(inline(src).ends_with("var _ int = 1\n"), "{}", inline(src));
}

#[test]
fn alias_across_packages_reuses_the_import() {
    let b = "package b\n\ntype T struct{}\n\n//go:fix inline\ntype A = T\n";
    let c = "package c\n\nimport \"example.com/b\"\n\nvar _ b.A\n";
    let r = run(&[("example.com/b", b), ("example.com/c", c)]);
    assert_eq!(r.messages("example.com/c"), ["Type alias A should be inlined"]);
    assert_eq!(r.fixed("example.com/c"), "package c\n\nimport \"example.com/b\"\n\nvar _ b.T\n");
}

#[test]
fn pointer_alias_is_parenthesized_in_a_conversion() {
    let src = "package a\n\n//go:fix inline\ntype P = *int\n\nvar _ = P(nil)\n";
    assert!(inline(src).ends_with("var _ = (*int)(nil)\n"), "{}", inline(src));
}

#[test]
fn generic_alias_is_silent_by_default() {
    let src = "package a\n\ntype M[T any] []T\n\n//go:fix inline\ntype A[T any] = M[T]\n\nvar _ A[int]\n";
    let r = run(&[(A, src)]);
    assert!(r.messages(A).is_empty(), "{:?}", r.messages(A));
    assert_eq!(r.reports[0].facts_exported, 0);
}

#[test]
fn fixes_of_one_pass_never_overlap() {
    let src = "package a\n\n//go:fix inline\nfunc f(x int) int { return x }\n\nvar _ = f(f(1))\n";
    let r = run(&[(A, src)]);
    // The inner call sits inside the outer rewrite and waits for a later pass.
    assert_eq!(r.diagnostics(A).len(), 1);
    assert!(r.fixed(A).ends_with("var _ = f(1)\n"), "{}", r.fixed(A));
}

#[test]
fn constant_declared_in_a_body() {
    let src = "package a\n\nconst X = 1\n\nfunc _() {\n\t//go:fix inline\n\tconst c = X\n\t_ = c\n}\n";
    let r = run(&[(A, src)]);
    assert_eq!(r.messages(A), ["Constant c should be inlined"]);
    assert!(r.fixed(A).ends_with("\tconst c = X\n\t_ = X\n}\n"), "{}", r.fixed(A));
}

#[test]
fn alias_declared_in_a_body() {
    let src = "package a\n\nfunc _() {\n\t//go:fix inline\n\ttype A = int\n\tvar v A\n\t_ = v\n}\n";
    let r = run(&[(A, src)]);
    assert_eq!(r.messages(A), ["Type alias A should be inlined"]);
    assert!(r.fixed(A).contains("\tvar v int\n"), "{}", r.fixed(A));
}

#[test]
fn iota_directive_in_a_body_is_rejected() {
    let src = "package a\n\nfunc _() {\n\t//go:fix inline\n\tconst c = iota\n\t_ = c\n}\n";
    let r = run(&[(A, src)]);
    assert_eq!(r.messages(A), ["invalid inline directive: const value is iota"]);
}
