//! # Stale image detection
//!
//! Decides which platforms must be rebuilt because a base image they were
//! built from has moved. For each platform of the selected set:
//!
//! 1. A platform with no record in the image-info baseline is always rebuilt
//!    (with a warning).
//! 2. Every external base image is pulled and its current digest compared to
//!    the digest recorded in the baseline. A missing recorded digest or a
//!    different digest makes the platform stale.
//! 3. A stale platform drags in all of its descendants within the selected
//!    set, so everything built on top of it is rebuilt too.
//!
//! Digest lookups go through the run's [`DigestCache`], so an image shared by
//! many platforms is pulled once. Platforms are checked in parallel and the
//! first failure aborts the run.

use std::collections::{BTreeSet, HashSet};

use log::{debug, info, warn};
use rayon::prelude::*;

use crate::cache::DigestCache;
use crate::context::RunContext;
use crate::docker::{self, DigestSource};
use crate::error::Result;
use crate::graph::PlatformGraph;
use crate::image_info::{digest_sha, ImageData, ImageInfoDocument};
use crate::manifest::{PlatformId, PlatformInfo};

pub struct StaleImageDetector<'a> {
    graph: &'a PlatformGraph<'a>,
    source: &'a dyn DigestSource,
    digests: &'a DigestCache,
}

impl<'a> StaleImageDetector<'a> {
    pub fn new(
        graph: &'a PlatformGraph<'a>,
        source: &'a dyn DigestSource,
        context: &'a RunContext,
    ) -> Self {
        Self {
            graph,
            source,
            digests: context.digests(),
        }
    }

    /// Sorted, de-duplicated paths of the platforms to rebuild
    pub fn stale_paths(
        &self,
        platforms: &[PlatformId],
        baseline: &ImageInfoDocument,
    ) -> Result<Vec<String>> {
        let available: HashSet<PlatformId> = platforms.iter().copied().collect();

        let mut stale = Vec::new();
        let mut recorded = Vec::new();
        for &id in platforms {
            let platform = self.graph.platform(id);
            match baseline.image(&platform.repo_name, &platform.path) {
                Some(image) => recorded.push((id, image)),
                None => {
                    warn!(
                        "No image info found for '{}'; it will be rebuilt",
                        platform.path
                    );
                    stale.push(id);
                }
            }
        }

        let changed = recorded
            .par_iter()
            .map(|&(id, image)| -> Result<Option<PlatformId>> {
                let platform = self.graph.platform(id);
                Ok(self.has_changed_base(platform, image)?.then_some(id))
            })
            .collect::<Result<Vec<_>>>()?;
        stale.extend(changed.into_iter().flatten());

        let mut paths = BTreeSet::new();
        for id in stale {
            paths.insert(self.graph.platform(id).path.clone());
            for descendant in self.graph.descendants(id, false, Some(&available)) {
                let path = &self.graph.platform(descendant).path;
                if paths.insert(path.clone()) {
                    debug!("'{}' is rebuilt with its ancestor", path);
                }
            }
        }

        info!(
            "{} of {} platforms need to be rebuilt",
            paths.len(),
            platforms.len()
        );
        Ok(paths.into_iter().collect())
    }

    fn has_changed_base(&self, platform: &PlatformInfo, image: &ImageData) -> Result<bool> {
        for reference in &platform.external_from_images {
            let Some(recorded) = image.base_images.get(reference) else {
                info!(
                    "'{}': no digest recorded for base image {}",
                    platform.path, reference
                );
                return Ok(true);
            };

            let current = docker::cached_digest(self.source, self.digests, reference)?;
            if digest_sha(recorded) != digest_sha(&current) {
                info!(
                    "'{}': base image {} changed ({} -> {})",
                    platform.path,
                    reference,
                    digest_sha(recorded),
                    digest_sha(&current)
                );
                return Ok(true);
            }
        }
        Ok(false)
    }
}
