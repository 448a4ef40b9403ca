//! Platform dependency graph
//!
//! A directed edge `parent -> child` exists when one of the child's internal
//! `FROM` references resolves to the parent platform (see
//! [`ManifestInfo::platforms_for_reference`]). The graph is computed once and
//! all traversals are iterative with explicit visited sets, so a malformed
//! manifest with a reference cycle cannot loop forever.

use std::collections::{BTreeSet, HashSet};

use log::{debug, warn};

use crate::manifest::{ManifestInfo, PlatformId, PlatformInfo};

/// Parent/child relations between the platforms of one manifest
#[derive(Debug, Clone)]
pub struct PlatformGraph<'a> {
    manifest: &'a ManifestInfo,
    parents: Vec<Vec<PlatformId>>,
    children: Vec<Vec<PlatformId>>,
}

impl<'a> PlatformGraph<'a> {
    pub fn build(manifest: &'a ManifestInfo) -> Self {
        let count = manifest.platforms().len();
        let mut parents: Vec<Vec<PlatformId>> = vec![Vec::new(); count];
        let mut children: Vec<Vec<PlatformId>> = vec![Vec::new(); count];

        for platform in manifest.platforms() {
            let mut found = BTreeSet::new();
            for reference in &platform.internal_from_images {
                let resolved = manifest.platforms_for_reference(reference, platform);
                if resolved.is_empty() {
                    debug!(
                        "{}: '{}' is not built by this manifest",
                        platform.path, reference
                    );
                }
                for parent in resolved {
                    if parent == platform.id {
                        warn!("{} references its own tag '{}'", platform.path, reference);
                        continue;
                    }
                    found.insert(parent);
                }
            }
            for parent in found {
                parents[platform.id.0].push(parent);
                children[parent.0].push(platform.id);
            }
        }

        Self {
            manifest,
            parents,
            children,
        }
    }

    pub fn manifest(&self) -> &'a ManifestInfo {
        self.manifest
    }

    /// Platforms this platform is built from, in declaration order
    pub fn parents(&self, id: PlatformId) -> &[PlatformId] {
        &self.parents[id.0]
    }

    /// Platforms built directly from this platform, in declaration order
    pub fn children(&self, id: PlatformId) -> &[PlatformId] {
        &self.children[id.0]
    }

    /// Platforms with no parents
    pub fn roots(&self) -> Vec<PlatformId> {
        self.manifest
            .platform_ids()
            .into_iter()
            .filter(|id| self.parents[id.0].is_empty())
            .collect()
    }

    /// Transitive parents, sorted; never contains `id`
    pub fn ancestors(&self, id: PlatformId) -> Vec<PlatformId> {
        let mut found = BTreeSet::new();
        self.collect_ancestors(id, None, &mut found);
        found.remove(&id);
        found.into_iter().collect()
    }

    /// Transitive children, sorted; never contains `id`
    ///
    /// With `include_ancestors_of_descendants`, every other parent of a
    /// descendant is pulled in together with its ancestors, so the result
    /// holds everything needed to rebuild the descendants. When `available`
    /// is given, platforms outside it are neither returned nor traversed.
    pub fn descendants(
        &self,
        id: PlatformId,
        include_ancestors_of_descendants: bool,
        available: Option<&HashSet<PlatformId>>,
    ) -> Vec<PlatformId> {
        let is_available = |p: PlatformId| available.map_or(true, |set| set.contains(&p));

        let mut found = BTreeSet::new();
        let mut visited = HashSet::from([id]);
        let mut stack: Vec<PlatformId> = self.children(id).to_vec();

        while let Some(current) = stack.pop() {
            if !is_available(current) || !visited.insert(current) {
                continue;
            }
            found.insert(current);
            stack.extend(self.children(current).iter().copied());

            if include_ancestors_of_descendants {
                let mut extra = BTreeSet::new();
                for &parent in self.parents(current) {
                    if is_available(parent) {
                        extra.insert(parent);
                        self.collect_ancestors(parent, available, &mut extra);
                    }
                }
                found.extend(extra);
            }
        }

        found.remove(&id);
        found.into_iter().collect()
    }

    /// Split `nodes` into connected components of the graph restricted to
    /// `nodes`
    ///
    /// Components are ordered by their first member in `nodes`; members of a
    /// component are sorted.
    pub fn complete_subgraphs(&self, nodes: &[PlatformId]) -> Vec<Vec<PlatformId>> {
        let members: HashSet<PlatformId> = nodes.iter().copied().collect();
        let mut assigned = HashSet::new();
        let mut subgraphs = Vec::new();

        for &start in nodes {
            if !assigned.insert(start) {
                continue;
            }
            let mut component = BTreeSet::from([start]);
            let mut stack = vec![start];
            while let Some(current) = stack.pop() {
                let neighbors = self.parents(current).iter().chain(self.children(current));
                for &next in neighbors {
                    if members.contains(&next) && assigned.insert(next) {
                        component.insert(next);
                        stack.push(next);
                    }
                }
            }
            subgraphs.push(component.into_iter().collect());
        }

        subgraphs
    }

    /// Platform metadata for an id
    pub fn platform(&self, id: PlatformId) -> &'a PlatformInfo {
        self.manifest.platform(id)
    }

    fn collect_ancestors(
        &self,
        id: PlatformId,
        available: Option<&HashSet<PlatformId>>,
        found: &mut BTreeSet<PlatformId>,
    ) {
        let mut visited = HashSet::from([id]);
        let mut stack: Vec<PlatformId> = self.parents(id).to_vec();
        while let Some(current) = stack.pop() {
            if available.is_some_and(|set| !set.contains(&current)) || !visited.insert(current) {
                continue;
            }
            found.insert(current);
            stack.extend(self.parents(current).iter().copied());
        }
    }
}
