use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use gofix::{Analyzer, MemoryFactStore, Options, apply_fixes};
use gofix_syntax::lexer::Lexer;
use gofix_syntax::{ast::Interner, parse_file};
use gofix_types::{Program, ProgramBuilder};
use std::hint::black_box as bb;

// =============================================================================
// Corpus: an inlinable API and a caller of growing size
// =============================================================================

const API: &str = r#"
package api

import "strings"

//go:fix inline
func Trim(s string) string { return strings.TrimSpace(s) }

//go:fix inline
func Add(x, y int) int { return x + y }

//go:fix inline
func Log(msg string, args ...any) { println(msg, args) }

type Point struct{ X, Y int }

//go:fix inline
func (p Point) Sum() int { return p.X + p.Y }

//go:fix inline
const Answer = Fortytwo

const Fortytwo = 42

//go:fix inline
type Pt = Point
"#;

const STRINGS: &str = r#"
package strings

func TrimSpace(s string) string { return s }
"#;

fn caller(funcs: usize) -> String {
    let mut src = String::from("package app\n\nimport \"example.com/api\"\n\nvar g int\n\nfunc next() int { g++; return g }\n");
    for i in 0..funcs {
        src.push_str(&format!(
            r#"
func f{i}(p api.Pt, s string) int {{
	api.Log("call", {i})
	x := api.Add(next(), {i})
	_ = api.Trim(s + s)
	return api.Add(x, p.Sum()) + api.Answer
}}
"#
        ));
    }
    src
}

fn program(funcs: usize) -> Program {
    let app = caller(funcs);
    ProgramBuilder::new()
        .package("strings", &[("strings.go", STRINGS)])
        .package("example.com/api", &[("api.go", API)])
        .package("example.com/app", &[("app.go", app.as_str())])
        .build()
        .unwrap()
}

// =============================================================================
// Benchmark 1: Front end (lex, parse, load)
// =============================================================================

fn bench_front_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("front_end");

    for funcs in [10usize, 100] {
        let src = caller(funcs);
        group.throughput(Throughput::Bytes(src.len() as u64));

        group.bench_with_input(BenchmarkId::new("lex", funcs), &src, |b, src| {
            b.iter(|| bb(Lexer::new(bb(src)).count()));
        });

        group.bench_with_input(BenchmarkId::new("parse", funcs), &src, |b, src| {
            b.iter_batched(
                Interner::default,
                |mut interner| bb(parse_file(bb(src), &mut interner).is_ok()),
                BatchSize::SmallInput,
            );
        });

        group.bench_function(BenchmarkId::new("load_and_check", funcs), |b| {
            b.iter(|| bb(program(funcs).errors.len()));
        });
    }

    group.finish();
}

// =============================================================================
// Benchmark 2: Analysis (discovery, facts, inlining) on a loaded program
// =============================================================================

fn bench_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");
    let analyzer = Analyzer::new(Options::default());

    for funcs in [10usize, 100] {
        let prog = program(funcs);
        group.throughput(Throughput::Elements(funcs as u64));

        group.bench_with_input(BenchmarkId::new("run", funcs), &prog, |b, prog| {
            b.iter(|| {
                let mut store = MemoryFactStore::new();
                let reports = analyzer.run(bb(prog), &mut store);
                bb(reports.iter().map(|r| r.diagnostics.len()).sum::<usize>())
            });
        });

        let mut store = MemoryFactStore::new();
        let reports = analyzer.run(&prog, &mut store);
        let Some(app) = prog.package_by_path("example.com/app") else {
            continue;
        };
        let fid = prog.package(app).files[0];
        let src = prog.file(fid).src.clone();
        let diags: Vec<_> = reports.into_iter().flat_map(|r| r.diagnostics).collect();
        group.bench_with_input(BenchmarkId::new("apply_fixes", funcs), &diags, |b, diags| {
            b.iter(|| bb(apply_fixes(&src, fid, diags).map(|s| s.len())));
        });
    }

    group.finish();
}

// =============================================================================
// Criterion registration
// =============================================================================

criterion_group!(benches, bench_front_end, bench_analysis);
criterion_main!(benches);
