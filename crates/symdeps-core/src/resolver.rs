//! Transitive export resolution over the declared dependency graph
//!
//! Each item's export set is its own files' exports plus the export sets of
//! everything it depends on. Resolving an item also checks that its files'
//! imports are satisfied by that set, and reports declared dependencies that
//! satisfy none of them.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::{Result, SymdepsError};
use crate::manifest::DependencySpec;
use crate::object_store::ObjectStore;
use crate::symbols::SymbolSet;
use std::collections::HashMap;
use tracing::debug;

pub struct ExportResolver<'a> {
    spec: &'a DependencySpec,
    store: &'a ObjectStore,
    /// Computed export sets, one per resolved item
    cache: HashMap<String, SymbolSet>,
}

impl<'a> ExportResolver<'a> {
    pub fn new(spec: &'a DependencySpec, store: &'a ObjectStore) -> Self {
        Self {
            spec,
            store,
            cache: HashMap::new(),
        }
    }

    /// Resolve every top-level library, each with a fresh call stack.
    pub fn resolve_libraries(&mut self, diagnostics: &mut Diagnostics) -> Result<()> {
        let spec = self.spec;
        for library in &spec.libraries {
            let mut call_stack = Vec::new();
            self.resolve_exports(library, &mut call_stack, diagnostics)?;
        }
        Ok(())
    }

    /// Compute the transitive export set of `name`.
    ///
    /// `call_stack` holds the items currently being resolved; meeting `name`
    /// on it again is a dependency cycle and aborts resolution.
    pub fn resolve_exports(
        &mut self,
        name: &str,
        call_stack: &mut Vec<String>,
        diagnostics: &mut Diagnostics,
    ) -> Result<&SymbolSet> {
        let spec = self.spec;
        let store = self.store;
        let item = spec
            .item(name)
            .ok_or_else(|| SymdepsError::UnknownItem(name.to_string()))?;

        if let Some(start) = call_stack.iter().position(|parent| parent == name) {
            let mut path = call_stack[start..].to_vec();
            path.push(name.to_string());
            return Err(SymdepsError::CircularDependency {
                kind: item.kind.to_string(),
                item: name.to_string(),
                path,
            });
        }

        if self.cache.contains_key(name) {
            return Ok(&self.cache[name]);
        }

        if let Some(declared) = &item.exports {
            debug!("{} {} provides {} declared exports", item.kind, name, declared.len());
            self.cache.insert(name.to_string(), declared.clone());
            return Ok(&self.cache[name]);
        }

        debug!("Resolving {} {} (stack: {:?})", item.kind, name, call_stack);
        call_stack.push(name.to_string());

        let mut imports = SymbolSet::new();
        let mut exports = SymbolSet::new();
        for file in item.files() {
            if let Some(object) = store.get(file) {
                imports.extend(object.imports.iter().cloned());
                exports.extend(object.exports.iter().cloned());
            }
        }
        let ignored = store.ignored_symbols();
        imports.retain(|symbol| !exports.contains(symbol) && !ignored.contains(symbol));

        for dep in item.deps() {
            let dep_exports = self.resolve_exports(dep, call_stack, diagnostics)?;

            // Umbrella items without files only aggregate their dependencies.
            if item.owns_files() && imports.is_disjoint(dep_exports) {
                diagnostics.push(Diagnostic::UnneededDependency {
                    item_kind: item.kind,
                    item: name.to_string(),
                    dependency: dep.clone(),
                });
            }

            // Re-exported even when unneeded here; dependents may rely on it.
            exports.extend(dep_exports.iter().cloned());
        }

        imports.retain(|symbol| !exports.contains(symbol));
        for symbol in &imports {
            for file in item.files() {
                let imports_symbol = store
                    .get(file)
                    .is_some_and(|object| object.imports.contains(symbol));
                if imports_symbol {
                    diagnostics.push(Diagnostic::UnresolvedImport {
                        item_kind: item.kind,
                        item: name.to_string(),
                        file: file.clone(),
                        symbol: symbol.clone(),
                        owner: store.owner_of(symbol).map(str::to_string),
                    });
                }
            }
        }

        call_stack.pop();
        self.cache.insert(name.to_string(), exports);
        Ok(&self.cache[name])
    }

    /// The memoized export set of an already resolved item
    pub fn exports_of(&self, name: &str) -> Option<&SymbolSet> {
        self.cache.get(name)
    }

    pub fn resolved_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Severity;
    use crate::manifest::{Item, ItemKind};
    use crate::symbols::SymbolRecord;

    fn store_with(objects: Vec<(&str, &str, Vec<SymbolRecord>)>) -> ObjectStore {
        let mut store = ObjectStore::new();
        let mut diagnostics = Diagnostics::new();
        for (library, name, records) in objects {
            store.record(library, name, records, &mut diagnostics);
        }
        store
    }

    fn resolve(
        spec: &DependencySpec,
        store: &ObjectStore,
        name: &str,
    ) -> (Result<SymbolSet>, Diagnostics) {
        let mut resolver = ExportResolver::new(spec, store);
        let mut diagnostics = Diagnostics::new();
        let result = resolver
            .resolve_exports(name, &mut Vec::new(), &mut diagnostics)
            .cloned();
        (result, diagnostics)
    }

    #[test]
    fn test_two_item_cycle_is_fatal() {
        let spec = DependencySpec::new(
            None,
            vec![
                Item::new("a", ItemKind::Library).with_deps(["b"]),
                Item::new("b", ItemKind::Library).with_deps(["a"]),
            ],
        )
        .unwrap();
        let store = ObjectStore::new();

        let (result, _) = resolve(&spec, &store, "a");
        match result {
            Err(SymdepsError::CircularDependency { item, path, .. }) => {
                assert_eq!(item, "a");
                assert_eq!(path, vec!["a", "b", "a"]);
            }
            other => panic!("expected a cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let spec = DependencySpec::new(
            None,
            vec![Item::new("a", ItemKind::Group).with_deps(["a"])],
        )
        .unwrap();
        let store = ObjectStore::new();

        let (result, _) = resolve(&spec, &store, "a");
        let message = result.unwrap_err().to_string();
        assert!(message.contains("group a has a circular dependency"), "{}", message);
        assert!(message.contains("a -> a"), "{}", message);
    }

    #[test]
    fn test_exports_are_transitive() {
        let spec = DependencySpec::new(
            None,
            vec![
                Item::new("a", ItemKind::Library)
                    .with_files(["a/a.o"])
                    .with_deps(["b"]),
                Item::new("b", ItemKind::Library)
                    .with_files(["b/b.o"])
                    .with_deps(["c"]),
                Item::new("c", ItemKind::Library).with_files(["c/c.o"]),
            ],
        )
        .unwrap();
        let store = store_with(vec![
            ("a", "a.o", vec![SymbolRecord::export("a_fn")]),
            (
                "b",
                "b.o",
                vec![SymbolRecord::export("b_fn"), SymbolRecord::import("c_fn")],
            ),
            ("c", "c.o", vec![SymbolRecord::export("c_fn")]),
        ]);

        let (result, _) = resolve(&spec, &store, "a");
        let exports = result.unwrap();
        assert!(exports.contains("a_fn"));
        assert!(exports.contains("b_fn"));
        assert!(exports.contains("c_fn"));
    }

    #[test]
    fn test_unresolved_import_names_item_file_and_symbol() {
        let spec = DependencySpec::new(
            None,
            vec![Item::new("a", ItemKind::Library).with_files(["a/one.o", "a/two.o"])],
        )
        .unwrap();
        let store = store_with(vec![
            ("a", "one.o", vec![SymbolRecord::export("one_fn")]),
            ("a", "two.o", vec![SymbolRecord::import("foo")]),
        ]);

        let (result, diagnostics) = resolve(&spec, &store, "a");
        assert!(result.is_ok());
        assert!(diagnostics.has_errors());

        let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0],
            &Diagnostic::UnresolvedImport {
                item_kind: ItemKind::Library,
                item: "a".to_string(),
                file: "a/two.o".to_string(),
                symbol: "foo".to_string(),
                owner: None,
            }
        );
    }

    #[test]
    fn test_unresolved_imports_are_all_reported() {
        let spec = DependencySpec::new(
            None,
            vec![
                Item::new("a", ItemKind::Library).with_files(["a/one.o", "a/two.o"]),
                Item::new("other", ItemKind::Library).with_files(["other/x.o"]),
            ],
        )
        .unwrap();
        let store = store_with(vec![
            (
                "a",
                "one.o",
                vec![SymbolRecord::import("foo"), SymbolRecord::import("bar")],
            ),
            ("a", "two.o", vec![SymbolRecord::import("foo")]),
            ("other", "x.o", vec![SymbolRecord::export("bar")]),
        ]);

        let (_, diagnostics) = resolve(&spec, &store, "a");
        let unresolved: Vec<_> = diagnostics
            .iter()
            .filter_map(|d| match d {
                Diagnostic::UnresolvedImport {
                    file,
                    symbol,
                    owner,
                    ..
                } => Some((file.as_str(), symbol.as_str(), owner.clone())),
                _ => None,
            })
            .collect();

        assert_eq!(
            unresolved,
            vec![
                ("a/one.o", "bar", Some("other/x.o".to_string())),
                ("a/one.o", "foo", None),
                ("a/two.o", "foo", None),
            ]
        );
    }

    #[test]
    fn test_import_satisfied_through_transitive_dependency() {
        let spec = DependencySpec::new(
            None,
            vec![
                Item::new("a", ItemKind::Library)
                    .with_files(["a/a.o"])
                    .with_deps(["b"]),
                Item::new("b", ItemKind::Library)
                    .with_files(["b/b.o"])
                    .with_deps(["c"]),
                Item::new("c", ItemKind::Library).with_files(["c/c.o"]),
            ],
        )
        .unwrap();
        let store = store_with(vec![
            ("a", "a.o", vec![SymbolRecord::import("foo")]),
            ("b", "b.o", vec![SymbolRecord::export("b_fn")]),
            ("c", "c.o", vec![SymbolRecord::export("foo")]),
        ]);

        let (result, diagnostics) = resolve(&spec, &store, "a");
        assert!(result.unwrap().contains("foo"));
        assert!(!diagnostics.has_errors());

        // b's export set is transitive and carries c's foo, so a needs b
        assert!(!diagnostics.iter().any(|d| matches!(
            d,
            Diagnostic::UnneededDependency { item, dependency, .. }
                if item == "a" && dependency == "b"
        )));
    }

    #[test]
    fn test_unused_dependency_is_informational() {
        let spec = DependencySpec::new(
            None,
            vec![
                Item::new("a", ItemKind::Library)
                    .with_files(["a/a.o"])
                    .with_deps(["d"]),
                Item::new("d", ItemKind::Library).with_files(["d/d.o"]),
            ],
        )
        .unwrap();
        let store = store_with(vec![
            ("a", "a.o", vec![SymbolRecord::export("a_fn")]),
            ("d", "d.o", vec![SymbolRecord::export("d_fn")]),
        ]);

        let (result, diagnostics) = resolve(&spec, &store, "a");
        assert!(result.unwrap().contains("d_fn"));
        assert_eq!(diagnostics.count(Severity::Info), 1);
        assert_eq!(diagnostics.count(Severity::Error), 0);
    }

    #[test]
    fn test_umbrella_group_never_reports_unneeded() {
        let spec = DependencySpec::new(
            None,
            vec![
                Item::new("all", ItemKind::Group).with_deps(["a", "b"]),
                Item::new("a", ItemKind::Library).with_files(["a/a.o"]),
                Item::new("b", ItemKind::Library).with_files(["b/b.o"]),
            ],
        )
        .unwrap();
        let store = store_with(vec![
            ("a", "a.o", vec![SymbolRecord::export("a_fn")]),
            ("b", "b.o", vec![SymbolRecord::export("b_fn")]),
        ]);

        let (result, diagnostics) = resolve(&spec, &store, "all");
        let exports = result.unwrap();
        assert!(exports.contains("a_fn") && exports.contains("b_fn"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_ignored_symbols_never_unresolved() {
        let spec = DependencySpec::new(
            None,
            vec![Item::new("a", ItemKind::Library).with_files(["a/a.o"])],
        )
        .unwrap();
        let store = store_with(vec![(
            "a",
            "a.o",
            vec![
                SymbolRecord::import("__cxa_pure_virtual"),
                SymbolRecord::import("vtable for __cxxabiv1::__class_type_info"),
            ],
        )]);

        let (result, diagnostics) = resolve(&spec, &store, "a");
        assert!(result.is_ok());
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_system_symbols_satisfy_imports() {
        let spec = DependencySpec::new(
            None,
            vec![
                Item::new("a", ItemKind::Library)
                    .with_files(["a/a.o"])
                    .with_deps(["system_symbols"]),
                Item::new("system_symbols", ItemKind::System).with_exports(["malloc", "free"]),
            ],
        )
        .unwrap();
        let store = store_with(vec![("a", "a.o", vec![SymbolRecord::import("malloc")])]);

        let (result, diagnostics) = resolve(&spec, &store, "a");
        let exports = result.unwrap();
        assert!(exports.contains("malloc"));
        assert!(exports.contains("free"));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_shared_dependency_resolved_once() {
        let spec = DependencySpec::new(
            None,
            vec![
                Item::new("a", ItemKind::Library)
                    .with_files(["a/a.o"])
                    .with_deps(["shared"]),
                Item::new("b", ItemKind::Library)
                    .with_files(["b/b.o"])
                    .with_deps(["shared"]),
                Item::new("shared", ItemKind::Library)
                    .with_files(["shared/s.o"])
                    .with_deps(["unused"]),
                Item::new("unused", ItemKind::Library).with_files(["unused/u.o"]),
            ],
        )
        .unwrap();
        let store = store_with(vec![
            ("a", "a.o", vec![SymbolRecord::import("s_fn")]),
            ("b", "b.o", vec![SymbolRecord::import("s_fn")]),
            ("shared", "s.o", vec![SymbolRecord::export("s_fn")]),
            ("unused", "u.o", vec![SymbolRecord::export("u_fn")]),
        ]);

        let mut resolver = ExportResolver::new(&spec, &store);
        let mut diagnostics = Diagnostics::new();
        resolver.resolve_libraries(&mut diagnostics).unwrap();

        // shared's unneeded dependency is reported once, not per dependent
        let unneeded = diagnostics
            .iter()
            .filter(|d| matches!(d, Diagnostic::UnneededDependency { item, .. } if item == "shared"))
            .count();
        assert_eq!(unneeded, 1);
        assert_eq!(resolver.resolved_count(), 4);
        assert!(resolver.exports_of("a").unwrap().contains("u_fn"));
    }

    #[test]
    fn test_unknown_item() {
        let spec = DependencySpec::new(None, Vec::<Item>::new()).unwrap();
        let store = ObjectStore::new();

        let (result, _) = resolve(&spec, &store, "ghost");
        assert!(matches!(result, Err(SymdepsError::UnknownItem(name)) if name == "ghost"));
    }
}
