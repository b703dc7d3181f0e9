//! symdeps core
//!
//! Verifies that the declared dependency graph of a set of libraries matches the
//! dependency graph implied by the symbol tables of their object files.
//!
//! The verification runs in three layers:
//! 1. Manifest reconciliation (every built object file is declared, and vice versa)
//! 2. Import resolution (every undefined symbol is exported along a declared dependency path)
//! 3. Dependency hygiene (declared dependencies that satisfy no import are reported)
//!
//! # Example
//!
//! ```no_run
//! use symdeps_core::{DependencySpec, NmSymbolSource, Verifier};
//!
//! let spec = DependencySpec::load("dependencies.toml")?;
//! let verifier = Verifier::new("build/lib", spec, NmSymbolSource::new()?);
//! let report = verifier.run()?;
//!
//! assert!(report.is_success());
//! # Ok::<(), symdeps_core::SymdepsError>(())
//! ```

pub mod diagnostics;
pub mod extract;
pub mod manifest;
pub mod object_store;
pub mod reconcile;
pub mod report;
pub mod resolver;
pub mod symbols;

mod error;
mod verifier;

pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{Result, SymdepsError};
pub use extract::{NmSymbolSource, SymbolSource};
pub use manifest::{DependencySpec, Item, ItemKind};
pub use report::{ExitStatus, VerificationReport};
pub use symbols::{SymbolKind, SymbolRecord, SymbolSet};
pub use verifier::Verifier;

/// Re-exports for convenience
pub mod prelude {
    pub use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
    pub use crate::extract::{NmSymbolSource, SymbolSource};
    pub use crate::manifest::{DependencySpec, Item, ItemKind};
    pub use crate::object_store::ObjectStore;
    pub use crate::reconcile::Reconciliation;
    pub use crate::report::{ExitStatus, VerificationReport};
    pub use crate::resolver::ExportResolver;
    pub use crate::verifier::Verifier;
    pub use crate::{Result, SymdepsError};
}
