//! Package-by-package driver.

use gofix_types::{PkgId, Program};
use tracing::{debug, info, instrument};

use crate::config::Options;
use crate::discovery::discover;
use crate::edit::Diagnostic;
use crate::facts::FactStore;
use crate::inline::{Registry, inline_file};

/// Findings for one package.
#[derive(Debug)]
pub struct PackageReport {
    pub pkg: PkgId,
    pub path: String,
    /// Invalid directives first, then rewrites in file and source order.
    pub diagnostics: Vec<Diagnostic>,
    pub facts_exported: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    options: Options,
}

impl Analyzer {
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Analyzes every package, dependencies before dependents, so that
    /// each sees the facts its imports exported.
    #[instrument(skip_all, fields(packages = prog.order.len()))]
    pub fn run(&self, prog: &Program, store: &mut dyn FactStore) -> Vec<PackageReport> {
        let reports: Vec<PackageReport> = prog.order.iter().map(|&pkg| self.package(prog, pkg, store)).collect();
        info!(
            diagnostics = reports.iter().map(|r| r.diagnostics.len()).sum::<usize>(),
            "analysis done"
        );
        reports
    }

    /// Analyzes one package. Facts of the packages it imports must already
    /// be in `store`.
    pub fn package(&self, prog: &Program, pkg: PkgId, store: &mut dyn FactStore) -> PackageReport {
        let path = prog.package(pkg).path.clone();
        let found = discover(prog, pkg, &self.options, store);
        let mut diagnostics = found.diagnostics;
        let registry = Registry::new(prog, pkg, &found.facts, &*store);
        for &fid in &prog.package(pkg).files {
            diagnostics.extend(inline_file(prog, fid, &self.options, &registry));
        }
        debug!(%path, diagnostics = diagnostics.len(), exported = found.exported, "package analyzed");
        PackageReport {
            pkg,
            path,
            diagnostics,
            facts_exported: found.exported,
        }
    }
}
