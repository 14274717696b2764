#![no_main]

use gofix::{Analyzer, MemoryFactStore, Options, apply_fixes};
use gofix_types::ProgramBuilder;
use libfuzzer_sys::fuzz_target;

/// A fixed inlinable API, so the fuzzed caller has something to call.
const API: &str = r#"package api

//go:fix inline
func Add(x, y int) int { return x + y }

//go:fix inline
func Each(xs ...int) { for _, x := range xs { println(x) } }

type T struct{ N int }

//go:fix inline
func (t *T) Inc(d int) { t.N += d }

//go:fix inline
const One = Uno

const Uno = 1

//go:fix inline
type Alias = T
"#;

fuzz_target!(|data: &[u8]| {
    let Ok(src) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(prog) = ProgramBuilder::new()
        .package("example.com/api", &[("api.go", API)])
        .package("example.com/fuzz", &[("fuzz.go", src)])
        .build()
    else {
        return;
    };
    let mut store = MemoryFactStore::new();
    let reports = Analyzer::new(Options::default()).run(&prog, &mut store);
    let Some(pkg) = prog.package_by_path("example.com/fuzz") else {
        return;
    };
    for &fid in &prog.package(pkg).files {
        for report in &reports {
            let _ = apply_fixes(&prog.file(fid).src, fid, &report.diagnostics);
        }
    }
});
