//! The dependency declaration
//!
//! Libraries, groups and externally provided symbol sets, loaded from TOML.

use crate::error::{Result, SymdepsError};
use crate::symbols::SymbolSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Owns object files and is verified as a top-level library
    Library,
    /// A logical grouping of files or other items
    Group,
    /// Symbols provided from outside the build (libc, libm, ...)
    System,
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKind::Library => write!(f, "library"),
            ItemKind::Group => write!(f, "group"),
            ItemKind::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(skip)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deps: Option<Vec<String>>,
    /// Declared exports, for items whose symbols come from outside the build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exports: Option<SymbolSet>,
}

impl Item {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            files: None,
            deps: None,
            exports: None,
        }
    }

    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = Some(files.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps = Some(deps.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_exports<I, S>(mut self, exports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exports = Some(exports.into_iter().map(Into::into).collect());
        self
    }

    pub fn files(&self) -> &[String] {
        self.files.as_deref().unwrap_or(&[])
    }

    pub fn deps(&self) -> &[String] {
        self.deps.as_deref().unwrap_or(&[])
    }

    pub fn owns_files(&self) -> bool {
        !self.files().is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct RawSpec {
    #[serde(default)]
    libraries: Option<Vec<String>>,
    #[serde(default)]
    items: BTreeMap<String, Item>,
}

/// The declared dependency graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySpec {
    pub libraries: Vec<String>,
    pub items: BTreeMap<String, Item>,
}

impl DependencySpec {
    /// Build a declaration from items. Without explicit `libraries`, every
    /// `library` item is verified, in name order.
    pub fn new<I>(libraries: Option<Vec<String>>, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = Item>,
    {
        let mut by_name: BTreeMap<String, Item> = BTreeMap::new();
        for item in items {
            if by_name.contains_key(&item.name) {
                return Err(SymdepsError::InvalidSpec(format!(
                    "item '{}' is declared twice",
                    item.name
                )));
            }
            by_name.insert(item.name.clone(), item);
        }
        let items = by_name;

        let libraries = libraries.unwrap_or_else(|| {
            items
                .values()
                .filter(|item| item.kind == ItemKind::Library)
                .map(|item| item.name.clone())
                .collect()
        });

        let spec = Self { libraries, items };
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawSpec = toml::from_str(content)?;
        let items = raw.items.into_iter().map(|(name, mut item)| {
            item.name = name;
            item
        });
        Self::new(raw.libraries, items)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn item(&self, name: &str) -> Option<&Item> {
        self.items.get(name)
    }

    /// Every object file key claimed by some item
    pub fn declared_files(&self) -> BTreeSet<String> {
        self.items
            .values()
            .flat_map(|item| item.files().iter().cloned())
            .collect()
    }

    /// Items whose exports are declared rather than built
    pub fn system_items(&self) -> impl Iterator<Item = &Item> {
        self.items.values().filter(|item| item.exports.is_some())
    }

    pub fn validate(&self) -> Result<()> {
        for library in &self.libraries {
            if !self.items.contains_key(library) {
                return Err(SymdepsError::InvalidSpec(format!(
                    "library '{}' is not a declared item",
                    library
                )));
            }
        }

        let mut claimed: BTreeMap<&str, &str> = BTreeMap::new();
        for item in self.items.values() {
            for dep in item.deps() {
                if !self.items.contains_key(dep) {
                    return Err(SymdepsError::InvalidSpec(format!(
                        "{} {} depends on unknown item '{}'",
                        item.kind, item.name, dep
                    )));
                }
            }

            for file in item.files() {
                let well_formed = file
                    .split_once('/')
                    .is_some_and(|(library, name)| {
                        !library.is_empty() && !name.is_empty() && !name.contains('/')
                    });
                if !well_formed {
                    return Err(SymdepsError::InvalidSpec(format!(
                        "file '{}' of {} {} is not of the form library/object",
                        file, item.kind, item.name
                    )));
                }

                if let Some(previous) = claimed.insert(file, &item.name) {
                    return Err(SymdepsError::InvalidSpec(format!(
                        "file '{}' is listed by both {} and {}",
                        file, previous, item.name
                    )));
                }
            }
        }

        Ok(())
    }
}
