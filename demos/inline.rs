//! Runs the inliner over Go files given as `import/path=file.go` and prints
//! the diagnostics, or with `--fix` the rewritten sources.
//!
//! ```text
//! RUST_LOG=gofix=debug cargo run --example inline -- --fix example.com/a=a.go example.com/b=b.go
//! ```

use std::env;

use gofix::{Analyzer, MemoryFactStore, Options, apply_fixes};
use gofix_types::ProgramBuilder;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut fix = false;
    let mut inputs = Vec::new();
    for arg in env::args().skip(1) {
        if arg == "--fix" {
            fix = true;
            continue;
        }
        let Some((path, file)) = arg.split_once('=') else {
            eprintln!("usage: cargo run --example inline -- [--fix] <import/path>=<file.go>...");
            std::process::exit(2);
        };
        let src = std::fs::read_to_string(file).unwrap_or_else(|e| {
            eprintln!("{file}: {e}");
            std::process::exit(2);
        });
        inputs.push((path.to_string(), file.to_string(), src));
    }

    let mut builder = ProgramBuilder::new();
    for (path, file, src) in &inputs {
        builder = builder.package(path, &[(file.as_str(), src.as_str())]);
    }
    let prog = match builder.build() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("load failed: {e}");
            std::process::exit(1);
        }
    };
    for e in &prog.errors {
        let file = prog.file(e.file);
        let (line, col) = file.lines.line_col(e.span.start);
        eprintln!("{}:{line}:{col}: type error: {}", file.name, e.message);
    }

    let mut store = MemoryFactStore::new();
    let reports = Analyzer::new(Options::from_env()).run(&prog, &mut store);
    for report in &reports {
        for &fid in &prog.package(report.pkg).files {
            let file = prog.file(fid);
            if fix {
                match apply_fixes(&file.src, fid, &report.diagnostics) {
                    Ok(out) => println!("// {}\n{out}", file.name),
                    Err(e) => eprintln!("{}: {e}", file.name),
                }
                continue;
            }
            for d in report.diagnostics.iter().filter(|d| d.file == fid) {
                let (line, col) = file.lines.line_col(d.span.start);
                println!("{}:{line}:{col}: {}", file.name, d.message);
            }
        }
    }
}
