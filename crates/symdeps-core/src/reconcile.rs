//! Built versus declared object file reconciliation

use crate::diagnostics::{Diagnostic, Diagnostics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    /// Built, but claimed by no item
    pub missing_from_declaration: Vec<String>,
    /// Declared, but not built
    pub missing_from_build: Vec<String>,
}

impl Reconciliation {
    pub fn is_consistent(&self) -> bool {
        self.missing_from_declaration.is_empty() && self.missing_from_build.is_empty()
    }

    /// Record one error per non-empty side
    pub fn report(&self, diagnostics: &mut Diagnostics) {
        if !self.missing_from_declaration.is_empty() {
            diagnostics.push(Diagnostic::FilesMissingFromDeclaration {
                files: self.missing_from_declaration.clone(),
            });
        }
        if !self.missing_from_build.is_empty() {
            diagnostics.push(Diagnostic::FilesMissingFromBuild {
                files: self.missing_from_build.clone(),
            });
        }
    }
}

pub fn reconcile(discovered: &BTreeSet<String>, declared: &BTreeSet<String>) -> Reconciliation {
    Reconciliation {
        missing_from_declaration: discovered.difference(declared).cloned().collect(),
        missing_from_build: declared.difference(discovered).cloned().collect(),
    }
}
