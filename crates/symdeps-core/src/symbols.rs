//! Symbol records and the ABI-support ignore list

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An ordered set of symbol names
pub type SymbolSet = BTreeSet<String>;

/// How an object file's symbol table lists a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SymbolKind {
    /// Referenced but not defined (nm type `U`)
    Undefined,
    /// Defined with the given nm type letter (`T`, `D`, `B`, `W`, `V`, ...)
    Defined(char),
}

impl SymbolKind {
    /// Classify an nm type field. Returns `None` for an empty field.
    pub fn from_nm_type(field: &str) -> Option<Self> {
        let mut chars = field.trim().chars();
        let letter = chars.next()?;
        if letter == 'U' {
            Some(SymbolKind::Undefined)
        } else {
            Some(SymbolKind::Defined(letter))
        }
    }

    pub fn is_import(&self) -> bool {
        matches!(self, SymbolKind::Undefined)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolRecord {
    pub name: String,
    pub kind: SymbolKind,
}

impl SymbolRecord {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn import(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Undefined)
    }

    pub fn export(name: impl Into<String>) -> Self {
        Self::new(name, SymbolKind::Defined('T'))
    }
}

/// C++ runtime support symbols that every object may rely on.
///
/// Matches names like `__cxa_pure_virtual`,
/// `vtable for __cxxabiv1::__si_class_type_info` and `DW.ref.__gxx_personality_v0`.
pub fn is_ignored(name: &str) -> bool {
    name.starts_with("__cxa") || name.contains("__cxxabi") || name.contains("__gxx")
}
