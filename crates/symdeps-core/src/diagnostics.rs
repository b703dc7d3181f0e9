//! Diagnostics collected during a verification run
//!
//! Informational diagnostics are advisory. Error diagnostics decide the verdict.

use crate::manifest::ItemKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "Info"),
            Severity::Error => write!(f, "Error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An object file key was recorded twice; the second record was dropped
    DuplicateObjectFile { key: String },

    /// A symbol is exported by more than one owner; the first owner is kept
    DuplicateExport {
        symbol: String,
        owner: String,
        duplicate: String,
    },

    /// ABI-support symbols excluded from the analysis
    IgnoredSymbols { symbols: Vec<String> },

    /// Built object files that no item declares
    FilesMissingFromDeclaration { files: Vec<String> },

    /// Declared object files that were not built
    FilesMissingFromBuild { files: Vec<String> },

    /// A declared dependency exports nothing the item's own files import
    UnneededDependency {
        item_kind: ItemKind,
        item: String,
        dependency: String,
    },

    /// An import that no declared dependency path satisfies
    UnresolvedImport {
        item_kind: ItemKind,
        item: String,
        file: String,
        symbol: String,
        owner: Option<String>,
    },
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Diagnostic::DuplicateObjectFile { .. }
            | Diagnostic::DuplicateExport { .. }
            | Diagnostic::IgnoredSymbols { .. }
            | Diagnostic::UnneededDependency { .. } => Severity::Info,
            Diagnostic::FilesMissingFromDeclaration { .. }
            | Diagnostic::FilesMissingFromBuild { .. }
            | Diagnostic::UnresolvedImport { .. } => Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DuplicateObjectFile { key } => {
                write!(f, "duplicate object file {}", key)
            }
            Diagnostic::DuplicateExport {
                symbol,
                owner,
                duplicate,
            } => write!(
                f,
                "{} exported by both {} and {}, keeping {}",
                symbol, owner, duplicate, owner
            ),
            Diagnostic::IgnoredSymbols { symbols } => {
                write!(f, "ignored symbols:\n{:?}", symbols)
            }
            Diagnostic::FilesMissingFromDeclaration { files } => {
                write!(f, "files missing from the dependency declaration:\n{:?}", files)
            }
            Diagnostic::FilesMissingFromBuild { files } => {
                write!(f, "files in the dependency declaration but not built:\n{:?}", files)
            }
            Diagnostic::UnneededDependency {
                item_kind,
                item,
                dependency,
            } => write!(
                f,
                " {} {}  does not need to depend on  {}",
                item_kind, item, dependency
            ),
            Diagnostic::UnresolvedImport {
                item_kind,
                item,
                file,
                symbol,
                owner,
            } => {
                write!(
                    f,
                    " {} {}  file  {}  imports  {}  but  {}  ",
                    item_kind, item, file, symbol, item
                )?;
                match owner {
                    Some(owner) => write!(f, "does not depend on  {}", owner),
                    None => write!(f, "has no dependency that exports it"),
                }
            }
        }
    }
}

/// Collects diagnostics for one run
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics are printed once by the report; the log only traces them.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        debug!("{}: {}", diagnostic.severity(), diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(Diagnostic::is_error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity() == severity)
            .count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}
