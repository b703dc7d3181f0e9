//! Per-object import/export sets and the symbol owner index

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::symbols::{is_ignored, SymbolRecord, SymbolSet};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Symbols one object file imports and exports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectFile {
    pub imports: SymbolSet,
    pub exports: SymbolSet,
}

#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: BTreeMap<String, ObjectFile>,
    owners: BTreeMap<String, String>,
    ignored: SymbolSet,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key(library: &str, object_name: &str) -> String {
        format!("{}/{}", library, object_name)
    }

    /// Register a symbol provided from outside the build. An existing owner is kept.
    pub fn seed_owner(&mut self, symbol: &str, owner: &str) {
        self.owners
            .entry(symbol.to_string())
            .or_insert_with(|| owner.to_string());
    }

    /// Classify and store one object file's symbol records.
    ///
    /// A second record for the same key is reported and dropped.
    pub fn record<I>(
        &mut self,
        library: &str,
        object_name: &str,
        records: I,
        diagnostics: &mut Diagnostics,
    ) where
        I: IntoIterator<Item = SymbolRecord>,
    {
        let key = Self::key(library, object_name);
        if self.objects.contains_key(&key) {
            debug!("Object file {} recorded twice", key);
            diagnostics.push(Diagnostic::DuplicateObjectFile { key });
            return;
        }

        let mut object = ObjectFile::default();
        for record in records {
            if is_ignored(&record.name) {
                self.ignored.insert(record.name);
                continue;
            }

            if record.kind.is_import() {
                object.imports.insert(record.name);
                continue;
            }

            match self.owners.entry(record.name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(key.clone());
                }
                Entry::Occupied(slot) if slot.get() != &key => {
                    diagnostics.push(Diagnostic::DuplicateExport {
                        symbol: record.name.clone(),
                        owner: slot.get().clone(),
                        duplicate: key.clone(),
                    });
                }
                Entry::Occupied(_) => {}
            }
            object.exports.insert(record.name);
        }

        debug!(
            "Recorded {}: {} imports, {} exports",
            key,
            object.imports.len(),
            object.exports.len()
        );
        self.objects.insert(key, object);
    }

    pub fn get(&self, key: &str) -> Option<&ObjectFile> {
        self.objects.get(key)
    }

    pub fn keys(&self) -> BTreeSet<String> {
        self.objects.keys().cloned().collect()
    }

    pub fn owner_of(&self, symbol: &str) -> Option<&str> {
        self.owners.get(symbol).map(String::as_str)
    }

    pub fn ignored_symbols(&self) -> &SymbolSet {
        &self.ignored
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
