//! Dependency closure over a validated manifest

use std::collections::HashSet;

use super::{Manifest, PackageBundle};

/// Collect the transitive dependencies of `root` in preorder
///
/// The manifest is acyclic, so the visited set only deduplicates shared
/// dependencies (diamonds); it never has to break a loop.
pub(super) fn closure<'a>(manifest: &'a Manifest, root: &str) -> Vec<&'a PackageBundle> {
    let Some(root) = manifest.bundle(root) else {
        return Vec::new();
    };

    let mut visited: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::new();
    // (bundle, index of the next dependency to follow)
    let mut stack: Vec<(&'a PackageBundle, usize)> = vec![(root, 0)];
    visited.insert(root.name.as_str());

    while let Some((bundle, next)) = stack.last_mut() {
        let Some(dep) = bundle.dependencies.get(*next) else {
            stack.pop();
            continue;
        };
        *next += 1;

        let Some(dep) = manifest.bundle(dep) else {
            continue;
        };
        if visited.insert(dep.name.as_str()) {
            ordered.push(dep);
            stack.push((dep, 0));
        }
    }

    ordered
}
