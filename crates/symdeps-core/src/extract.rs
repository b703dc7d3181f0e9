//! Symbol table extraction
//!
//! Runs `nm` on object files and parses its System V output format.

use crate::error::{Result, SymdepsError};
use crate::symbols::{SymbolKind, SymbolRecord};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Produces the symbol records of one object file
pub trait SymbolSource {
    fn symbols(&self, path: &Path) -> Result<Vec<SymbolRecord>>;
}

pub struct NmSymbolSource {
    nm_binary: PathBuf,
}

impl NmSymbolSource {
    /// Use the `nm` found on `PATH`
    pub fn new() -> Result<Self> {
        let nm_binary = which::which("nm").map_err(|_| SymdepsError::NmNotFound)?;
        Ok(Self { nm_binary })
    }

    pub fn with_binary<P: AsRef<Path>>(nm_binary: P) -> Self {
        Self {
            nm_binary: nm_binary.as_ref().to_path_buf(),
        }
    }

    pub fn binary(&self) -> &Path {
        &self.nm_binary
    }
}

impl SymbolSource for NmSymbolSource {
    fn symbols(&self, path: &Path) -> Result<Vec<SymbolRecord>> {
        debug!("Running {} on {}", self.nm_binary.display(), path.display());

        let output = Command::new(&self.nm_binary)
            .args(["--demangle", "--format=sysv", "--extern-only", "--no-sort"])
            .arg(path)
            .output()
            .map_err(|e| SymdepsError::Extraction {
                file: path.to_path_buf(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(SymdepsError::Extraction {
                file: path.to_path_buf(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(parse_sysv(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `nm --format=sysv` output.
///
/// Data lines look like `name |value|class|type|size|line|section`; anything
/// with fewer than three fields, an empty name or an empty class is skipped.
pub fn parse_sysv(output: &str) -> Vec<SymbolRecord> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line.split('|').collect();
            if fields.len() < 3 {
                return None;
            }
            let name = fields[0].trim();
            if name.is_empty() {
                return None;
            }
            let kind = SymbolKind::from_nm_type(fields[2])?;
            Some(SymbolRecord::new(name, kind))
        })
        .collect()
}

/// List `root/library/*.<extension>`, sorted. A missing directory has no objects.
pub fn discover_objects(root: &Path, library: &str, extension: &str) -> Result<Vec<PathBuf>> {
    let dir = root.join(library);
    if !dir.is_dir() {
        debug!("No build directory for library {} at {}", library, dir.display());
        return Ok(Vec::new());
    }

    let pattern = format!(
        "{}/*.{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        extension
    );
    let mut paths: Vec<PathBuf> = glob::glob(&pattern)?
        .filter_map(|entry| entry.ok())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    Ok(paths)
}
