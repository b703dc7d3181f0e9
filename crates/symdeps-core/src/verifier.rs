//! Main verification orchestrator
//!
//! Extracts every library's object files, reconciles them against the
//! declaration, then resolves the declared dependency graph.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::Result;
use crate::extract::{discover_objects, SymbolSource};
use crate::manifest::DependencySpec;
use crate::object_store::ObjectStore;
use crate::reconcile::reconcile;
use crate::report::VerificationReport;
use crate::resolver::ExportResolver;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

pub struct Verifier<S> {
    root: PathBuf,
    spec: DependencySpec,
    source: S,
    object_extension: String,
}

impl<S: SymbolSource> Verifier<S> {
    pub fn new<P: AsRef<Path>>(root: P, spec: DependencySpec, source: S) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            spec,
            source,
            object_extension: "o".to_string(),
        }
    }

    /// Look for `*.<extension>` files instead of `*.o`
    pub fn with_object_extension(mut self, extension: impl Into<String>) -> Self {
        self.object_extension = extension.into();
        self
    }

    pub fn spec(&self) -> &DependencySpec {
        &self.spec
    }

    /// Run the whole verification.
    ///
    /// Hard errors are collected in the report. A dependency cycle or an
    /// extraction failure aborts the run with `Err`.
    pub fn run(&self) -> Result<VerificationReport> {
        let start = Instant::now();
        let mut diagnostics = Diagnostics::new();
        let mut store = ObjectStore::new();

        for item in self.spec.system_items() {
            for symbol in item.exports.iter().flatten() {
                store.seed_owner(symbol, &item.name);
            }
        }

        info!("Reading object files under {}", self.root.display());
        for library in &self.spec.libraries {
            self.read_library(library, &mut store, &mut diagnostics)?;
        }
        info!("Read {} object files", store.len());

        let reconciliation = reconcile(&store.keys(), &self.spec.declared_files());
        reconciliation.report(&mut diagnostics);

        let ignored_symbols: Vec<String> = store.ignored_symbols().iter().cloned().collect();
        if !ignored_symbols.is_empty() {
            diagnostics.push(Diagnostic::IgnoredSymbols {
                symbols: ignored_symbols.clone(),
            });
        }

        let mut items_resolved = 0;
        if !diagnostics.has_errors() {
            info!("Resolving {} libraries", self.spec.libraries.len());
            let mut resolver = ExportResolver::new(&self.spec, &store);
            resolver.resolve_libraries(&mut diagnostics)?;
            items_resolved = resolver.resolved_count();
        } else {
            info!("Skipping dependency resolution after reconciliation errors");
        }

        let mut report = VerificationReport::new(diagnostics);
        report.summary.libraries = self.spec.libraries.len();
        report.summary.object_files = store.len();
        report.summary.items_resolved = items_resolved;
        report.reconciliation = reconciliation;
        report.ignored_symbols = ignored_symbols;
        report.set_duration(start.elapsed().as_millis());

        Ok(report)
    }

    fn read_library(
        &self,
        library: &str,
        store: &mut ObjectStore,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let paths = discover_objects(&self.root, library, &self.object_extension)?;
        debug!("Library {}: {} object files", library, paths.len());

        for path in paths {
            let object_name = match path.file_name() {
                Some(name) => name.to_string_lossy().to_string(),
                None => continue,
            };
            let records = self.source.symbols(&path)?;
            store.record(library, &object_name, records, diagnostics);
        }

        Ok(())
    }
}
