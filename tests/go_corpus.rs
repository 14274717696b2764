use gofix::{Analyzer, MemoryFactStore, Options, apply_fixes};
use gofix_types::ProgramBuilder;
use walkdir::WalkDir;

/// Every `.go` file under `GOFIX_CORPUS`, loaded as a package of its own:
/// the analyzer must not panic and its fixes must apply.
#[test]
fn analyzes_go_corpus_if_configured() {
    let Some(root) = std::env::var_os("GOFIX_CORPUS") else {
        eprintln!("GOFIX_CORPUS not set; skipping corpus test");
        return;
    };

    let mut total = 0usize;
    let mut loaded = 0usize;
    let mut diagnostics = 0usize;

    for entry in WalkDir::new(&root).into_iter().filter_map(|e| e.ok()) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("go") {
            continue;
        }
        if path.to_string_lossy().contains("testdata") {
            continue;
        }
        let Ok(src) = std::fs::read_to_string(path) else {
            continue;
        };
        total += 1;

        let name = path.to_string_lossy();
        let Ok(prog) = ProgramBuilder::new()
            .package("corpus/pkg", &[(name.as_ref(), src.as_str())])
            .build()
        else {
            continue;
        };
        loaded += 1;

        let mut store = MemoryFactStore::new();
        let reports = Analyzer::new(Options::default()).run(&prog, &mut store);
        let fid = prog.files[0].id;
        for report in &reports {
            diagnostics += report.diagnostics.len();
            if let Err(e) = apply_fixes(&src, fid, &report.diagnostics) {
                panic!("{}: fixes do not apply: {e}", path.display());
            }
        }
    }

    eprintln!("Analyzed {loaded} of {total} Go files, {diagnostics} diagnostics.");
}
