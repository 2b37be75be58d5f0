//! Manifest validation
//!
//! A manifest is checked once, when it is loaded, so that resolution never has
//! to cope with a broken graph. The checks run in a fixed order and stop at the
//! first problem:
//!
//! 1. Package identity (non-empty name and version)
//! 2. Bundle records (non-empty name, well-formed hash, unique name and file)
//! 3. Dependency edges (every target exists)
//! 4. Dependency cycles (three-color DFS, reports the offending chain)
//! 5. Assets (unique path, owning bundle exists)
//! 6. Address index (targets exist, no collisions after case folding)
//!
//! ## Cycle detection
//!
//! Uses DFS with three-color marking:
//!
//! 1. **WHITE** (unvisited): Node hasn't been processed
//! 2. **GRAY** (on the current path): Node is on the explicit DFS stack
//! 3. **BLACK** (finished): Node and all its dependencies are acyclic
//!
//! A cycle exists when we reach a GRAY node. The chain is reported from that
//! node back to itself, e.g. `a -> b -> a`.

use std::collections::{HashMap, HashSet};

use crate::error::ValidationIssue;
use crate::hash;

use super::AddressCase;
use super::document::ManifestDocument;

type Outcome = std::result::Result<(), ValidationIssue>;

/// Validate a manifest document
///
/// # Errors
///
/// Returns the first [`ValidationIssue`] found.
pub fn validate(doc: &ManifestDocument, case: AddressCase) -> Outcome {
    check_identity(doc)?;
    check_bundles(doc)?;

    let edges: HashMap<&str, &[String]> = doc
        .bundles
        .iter()
        .map(|b| (b.name.as_str(), b.dependencies.as_slice()))
        .collect();

    check_dangling_edges(doc, &edges)?;
    check_cycles(doc, &edges)?;
    check_assets(doc, &edges)?;
    check_addresses(doc, case)
}

fn malformed(reason: &str) -> ValidationIssue {
    ValidationIssue::Malformed {
        reason: reason.to_string(),
    }
}

fn check_identity(doc: &ManifestDocument) -> Outcome {
    if doc.package_name.trim().is_empty() {
        return Err(malformed("package_name is empty"));
    }
    if doc.package_version.trim().is_empty() {
        return Err(malformed("package_version is empty"));
    }
    Ok(())
}

fn check_bundles(doc: &ManifestDocument) -> Outcome {
    let mut names = HashSet::new();
    let mut files = HashSet::new();

    for bundle in &doc.bundles {
        if bundle.name.trim().is_empty() {
            return Err(malformed("bundle with empty name"));
        }
        if !hash::is_valid_hash(&bundle.hash) {
            return Err(ValidationIssue::InvalidHash {
                name: bundle.name.clone(),
                hash: bundle.hash.clone(),
            });
        }
        // Distinct names may still flatten onto the same file
        if !names.insert(bundle.name.as_str()) || !files.insert(bundle.file_name()) {
            return Err(ValidationIssue::DuplicateBundle {
                name: bundle.name.clone(),
            });
        }
    }
    Ok(())
}

fn check_dangling_edges(doc: &ManifestDocument, edges: &HashMap<&str, &[String]>) -> Outcome {
    for bundle in &doc.bundles {
        if let Some(dep) = bundle
            .dependencies
            .iter()
            .find(|dep| !edges.contains_key(dep.as_str()))
        {
            return Err(ValidationIssue::DanglingDependency {
                bundle: bundle.name.clone(),
                dependency: dep.clone(),
            });
        }
    }
    Ok(())
}

/// State for the cycle search
struct CycleSearch<'a> {
    /// Dependency map (adjacency list)
    edges: &'a HashMap<&'a str, &'a [String]>,
    /// Finished bundles (BLACK)
    finished: HashSet<&'a str>,
    /// Current DFS path (GRAY), in visit order, with the next edge to follow
    path: Vec<(&'a str, usize)>,
    /// Names on `path`, for constant-time GRAY checks
    on_path: HashSet<&'a str>,
}

impl<'a> CycleSearch<'a> {
    /// Iterative DFS from `root`; the explicit stack keeps deep chains off the
    /// thread stack
    fn visit(&mut self, root: &'a str) -> Outcome {
        if self.finished.contains(root) {
            return Ok(());
        }
        self.enter(root);

        while let Some((name, next)) = self.path.last_mut() {
            let name = *name;
            let deps = self.edges.get(name).copied().unwrap_or_default();

            let Some(dep) = deps.get(*next) else {
                self.path.pop();
                self.on_path.remove(name);
                self.finished.insert(name);
                continue;
            };
            *next += 1;

            let dep = dep.as_str();
            if self.on_path.contains(dep) {
                return Err(self.cycle_through(dep));
            }
            if !self.finished.contains(dep) {
                self.enter(dep);
            }
        }
        Ok(())
    }

    fn enter(&mut self, name: &'a str) {
        self.path.push((name, 0));
        self.on_path.insert(name);
    }

    fn cycle_through(&self, name: &str) -> ValidationIssue {
        let start = self
            .path
            .iter()
            .position(|(n, _)| *n == name)
            .unwrap_or_default();
        let mut chain: Vec<&str> = self.path[start..].iter().map(|(n, _)| *n).collect();
        chain.push(name);
        ValidationIssue::DependencyCycle {
            chain: chain.join(" -> "),
        }
    }
}

fn check_cycles(doc: &ManifestDocument, edges: &HashMap<&str, &[String]>) -> Outcome {
    let mut search = CycleSearch {
        edges,
        finished: HashSet::new(),
        path: Vec::new(),
        on_path: HashSet::new(),
    };

    // Document order keeps the reported chain deterministic
    for bundle in &doc.bundles {
        search.visit(bundle.name.as_str())?;
    }
    Ok(())
}

fn check_assets(doc: &ManifestDocument, edges: &HashMap<&str, &[String]>) -> Outcome {
    let mut paths = HashSet::new();
    for asset in &doc.assets {
        if asset.path.trim().is_empty() {
            return Err(malformed("asset with empty path"));
        }
        if !paths.insert(asset.path.as_str()) {
            return Err(ValidationIssue::DuplicateAsset {
                path: asset.path.clone(),
            });
        }
        if !edges.contains_key(asset.bundle.as_str()) {
            return Err(ValidationIssue::UnknownOwner {
                path: asset.path.clone(),
                bundle: asset.bundle.clone(),
            });
        }
    }
    Ok(())
}

fn check_addresses(doc: &ManifestDocument, case: AddressCase) -> Outcome {
    let paths: HashSet<&str> = doc.assets.iter().map(|a| a.path.as_str()).collect();
    let mut folded: HashMap<String, &str> = HashMap::new();

    for (address, target) in &doc.addresses {
        if !paths.contains(target.as_str()) {
            return Err(ValidationIssue::UnknownAddressTarget {
                address: address.clone(),
                target: target.clone(),
            });
        }

        let key = case.normalize(address).into_owned();
        if let Some(first) = folded.get(&key) {
            if *first != target.as_str() {
                return Err(ValidationIssue::AddressCollision {
                    address: key,
                    first: (*first).to_string(),
                    second: target.clone(),
                });
            }
            continue;
        }
        folded.insert(key, target.as_str());
    }
    Ok(())
}
