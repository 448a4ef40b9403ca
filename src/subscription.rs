//! # Subscriptions
//!
//! A subscription watches the manifest of another repository: where the
//! manifest lives, where its image-info baseline lives and, optionally, which
//! OS type to consider. Evaluating a list of subscriptions yields the stale
//! image paths of each one.
//!
//! ```json
//! [
//!   {
//!     "id": "dotnet-docker-main",
//!     "manifest": { "url": "https://github.com/example/docker.git", "branch": "main", "path": "manifest.json" },
//!     "imageInfo": { "url": "https://github.com/example/versions.git", "branch": "main", "path": "build-info/image-info.json" },
//!     "osType": "linux"
//!   }
//! ]
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::context::RunContext;
use crate::docker::DigestSource;
use crate::error::{Error, Result};
use crate::filesystem::DiskFiles;
use crate::filter::ManifestFilter;
use crate::git::{GitFile, RemoteRepository};
use crate::graph::PlatformGraph;
use crate::image_info::ImageInfoDocument;
use crate::manifest::{ManifestInfo, ManifestOptions};
use crate::stale::StaleImageDetector;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: String,
    pub manifest: GitFile,
    pub image_info: GitFile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_type: Option<String>,
}

/// Stale image paths of one subscription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionImagePaths {
    pub subscription_id: String,
    pub paths: Vec<String>,
}

/// Parse and validate a subscriptions document
pub fn parse_subscriptions(json: &str) -> Result<Vec<Subscription>> {
    let subscriptions: Vec<Subscription> = serde_json::from_str(json)?;

    let mut ids = BTreeSet::new();
    for subscription in &subscriptions {
        if !ids.insert(subscription.id.as_str()) {
            return Err(Error::Subscription {
                id: subscription.id.clone(),
                message: "duplicate subscription id".to_string(),
            });
        }
        validate_file(&subscription.id, "manifest", &subscription.manifest)?;
        validate_file(&subscription.id, "imageInfo", &subscription.image_info)?;
    }

    Ok(subscriptions)
}

/// Read and validate a subscriptions file
pub fn load_subscriptions(path: &Path) -> Result<Vec<Subscription>> {
    let content = fs::read_to_string(path).map_err(|e| Error::Filesystem {
        message: format!("Failed to read subscriptions '{}': {}", path.display(), e),
    })?;
    parse_subscriptions(&content)
}

fn validate_file(id: &str, field: &str, file: &GitFile) -> Result<()> {
    let invalid = |message: String| Error::Subscription {
        id: id.to_string(),
        message: format!("{}: {}", field, message),
    };

    // local paths are accepted so repositories can be mirrored on disk
    if Url::parse(&file.url).is_err() && !Path::new(&file.url).exists() {
        return Err(invalid(format!("'{}' is neither a URL nor a local path", file.url)));
    }
    if file.branch.trim().is_empty() {
        return Err(invalid("branch is empty".to_string()));
    }
    if file.path.trim().is_empty() {
        return Err(invalid("path is empty".to_string()));
    }
    Ok(())
}

/// Computes the stale images of subscriptions
pub struct SubscriptionEvaluator<'a> {
    remote: &'a dyn RemoteRepository,
    digests: &'a dyn DigestSource,
    context: &'a RunContext,
    options: &'a ManifestOptions,
    filter: &'a ManifestFilter,
}

impl<'a> SubscriptionEvaluator<'a> {
    /// `filter` applies to every subscription; a subscription's `osType`
    /// replaces its OS type pattern
    pub fn new(
        remote: &'a dyn RemoteRepository,
        digests: &'a dyn DigestSource,
        context: &'a RunContext,
        options: &'a ManifestOptions,
        filter: &'a ManifestFilter,
    ) -> Self {
        Self {
            remote,
            digests,
            context,
            options,
            filter,
        }
    }

    /// Evaluate all subscriptions in parallel, results sorted by id
    pub fn evaluate(&self, subscriptions: &[Subscription]) -> Result<Vec<SubscriptionImagePaths>> {
        let mut results = subscriptions
            .par_iter()
            .map(|subscription| self.evaluate_one(subscription))
            .collect::<Result<Vec<_>>>()?;
        results.sort_by(|a, b| a.subscription_id.cmp(&b.subscription_id));
        Ok(results)
    }

    fn evaluate_one(&self, subscription: &Subscription) -> Result<SubscriptionImagePaths> {
        info!("Evaluating subscription '{}'", subscription.id);

        let checkout = self
            .remote
            .checkout(&subscription.manifest.url, &subscription.manifest.branch)?;
        let files = DiskFiles::new(&checkout);
        let manifest = ManifestInfo::load(
            &files,
            &subscription.manifest.path,
            self.options,
            self.context,
        )?;

        let baseline = match self.remote.fetch_file(&subscription.image_info)? {
            Some(content) => ImageInfoDocument::parse(&content)?,
            None => {
                warn!(
                    "Subscription '{}': no image info at {}",
                    subscription.id, subscription.image_info
                );
                ImageInfoDocument::new()
            }
        };

        let mut filter = self.filter.clone();
        if let Some(os_type) = &subscription.os_type {
            filter.os_type = Some(os_type.clone());
        }
        let platforms = filter.apply(&manifest)?;

        let graph = PlatformGraph::build(&manifest);
        let paths = StaleImageDetector::new(&graph, self.digests, self.context)
            .stale_paths(&platforms, &baseline)?;

        Ok(SubscriptionImagePaths {
            subscription_id: subscription.id.clone(),
            paths,
        })
    }
}
