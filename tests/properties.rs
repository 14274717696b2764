use gofix::{Analyzer, MemoryFactStore, Options, apply_fixes};
use gofix_types::ProgramBuilder;
use proptest::prelude::*;

const BODIES: &[&str] = &[
    "return x",
    "return x + y",
    "return y * x",
    "return -x",
    "return x + x",
    "return g() + x",
    "v = x; return y",
    "if x > 0 { return y }; return x",
    "println(x); return y",
    "defer println(y); return x",
];

const ARGS: &[&str] = &[
    "1", "v", "g()", "v + 1", "-v", "(v)", "len(\"abc\")", "<-ch", "1.0", "s[0]", "m[\"k\"]",
];

const CALLERS: &[&str] = &[
    "_ = f(A, B)",
    "println(f(A, B))",
    "f(A, B)",
    "go f(A, B)",
    "defer f(A, B)",
    "if f(A, B) > 0 {\n\t}",
    "for i := f(A, B); i < 3; i++ {\n\t}",
    "w := f(A, B)\n\t_ = w",
    "_ = f(A, B) + f(B, A)",
    "x := 2\n\t_ = f(A, x) + x",
];

fn program(body: &str, a: &str, b: &str, caller: &str) -> String {
    let call = caller.replace('A', a).replace('B', b);
    format!(
        "package p\n\nvar v int\nvar ch chan int\nvar s []int\nvar m map[string]int\n\nfunc g() int {{ return 1 }}\n\n//go:fix inline\nfunc f(x, y int) int {{\n\t{body}\n}}\n\nfunc _() int {{\n\t{call}\n\treturn 0\n}}\n"
    )
}

fn messages(src: &str) -> Vec<String> {
    let prog = ProgramBuilder::new()
        .package("example.com/p", &[("p.go", src)])
        .build()
        .unwrap();
    let mut store = MemoryFactStore::new();
    Analyzer::new(Options::default())
        .run(&prog, &mut store)
        .into_iter()
        .flat_map(|r| r.diagnostics)
        .map(|d| d.message)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn analysis_never_panics_and_is_repeatable(
        body in prop::sample::select(BODIES),
        a in prop::sample::select(ARGS),
        b in prop::sample::select(ARGS),
        caller in prop::sample::select(CALLERS),
    ) {
        let src = program(body, a, b, caller);
        prop_assert_eq!(messages(&src), messages(&src));
    }

    #[test]
    fn each_fix_yields_a_well_typed_file(
        body in prop::sample::select(BODIES),
        a in prop::sample::select(ARGS),
        b in prop::sample::select(ARGS),
        caller in prop::sample::select(CALLERS),
    ) {
        let src = program(body, a, b, caller);
        let prog = ProgramBuilder::new()
            .package("example.com/p", &[("p.go", src.as_str())])
            .build()
            .unwrap();
        let mut store = MemoryFactStore::new();
        let reports = Analyzer::new(Options::default()).run(&prog, &mut store);
        prop_assume!(prog.errors.is_empty());
        let fid = prog.files[0].id;
        for d in reports.iter().flat_map(|r| &r.diagnostics) {
            let fixed = apply_fixes(&src, fid, std::slice::from_ref(d));
            prop_assert!(fixed.is_ok(), "{}", d.message);
            let fixed = fixed.unwrap();
            let again = ProgramBuilder::new()
                .package("example.com/p", &[("p.go", fixed.as_str())])
                .build();
            prop_assert!(
                matches!(&again, Ok(p) if p.errors.is_empty()),
                "{}\n{fixed}\n{:?}",
                d.message,
                again.map(|p| p.errors)
            );
        }
    }
}
