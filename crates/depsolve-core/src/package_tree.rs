//! Package tree (spec §3): `(ImportRoot, map[package-path -> Package | Error])`.
//!
//! This is the shape the consumed `Source::list_packages` contract (§6.1)
//! returns. Errors per package are carried through rather than surfaced
//! immediately, so that a flatten/reach-map pass over the tree can decide
//! per-package whether the error actually matters (an error in a package
//! nobody imports is harmless).

use std::collections::BTreeMap;

/// A single analyzed package within a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub name: String,
    pub import_path: String,
    pub comment_path: Option<String>,
    pub imports: Vec<String>,
    pub test_imports: Vec<String>,
}

impl Package {
    pub fn new(name: impl Into<String>, import_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            import_path: import_path.into(),
            comment_path: None,
            imports: Vec::new(),
            test_imports: Vec::new(),
        }
    }

    pub fn with_imports(mut self, imports: Vec<String>) -> Self {
        self.imports = imports;
        self
    }

    pub fn with_test_imports(mut self, imports: Vec<String>) -> Self {
        self.test_imports = imports;
        self
    }
}

/// Either a successfully analyzed package, or the error encountered while
/// analyzing it (unparseable source, missing directory, etc).
#[derive(Debug, Clone)]
pub enum PackageOrError {
    Package(Package),
    Error(String),
}

/// `(ImportRoot, {package-path -> Package|Error})`, per spec §3.
#[derive(Debug, Clone)]
pub struct PackageTree {
    pub import_root: String,
    pub packages: BTreeMap<String, PackageOrError>,
}

impl PackageTree {
    pub fn new(import_root: impl Into<String>) -> Self {
        Self {
            import_root: import_root.into(),
            packages: BTreeMap::new(),
        }
    }

    pub fn insert_package(&mut self, path: impl Into<String>, pkg: Package) -> &mut Self {
        self.packages.insert(path.into(), PackageOrError::Package(pkg));
        self
    }

    pub fn insert_error(&mut self, path: impl Into<String>, reason: impl Into<String>) -> &mut Self {
        self.packages.insert(path.into(), PackageOrError::Error(reason.into()));
        self
    }

    /// All package paths that resolved to errors, paired with the reason.
    pub fn errors(&self) -> Vec<(&str, &str)> {
        self.packages
            .iter()
            .filter_map(|(path, entry)| match entry {
                PackageOrError::Error(reason) => Some((path.as_str(), reason.as_str())),
                PackageOrError::Package(_) => None,
            })
            .collect()
    }

    pub fn package(&self, path: &str) -> Option<&Package> {
        match self.packages.get(path) {
            Some(PackageOrError::Package(p)) => Some(p),
            _ => None,
        }
    }

    pub fn package_paths(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_carried_through_not_dropped() {
        let mut tree = PackageTree::new("example.org/a");
        tree.insert_package("example.org/a", Package::new("a", "example.org/a"));
        tree.insert_error("example.org/a/broken", "syntax error");

        assert_eq!(tree.errors(), vec![("example.org/a/broken", "syntax error")]);
        assert!(tree.package("example.org/a").is_some());
        assert!(tree.package("example.org/a/broken").is_none());
    }
}
