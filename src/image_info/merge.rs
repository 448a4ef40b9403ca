//! Image-info merge
//!
//! Documents produced by independent build jobs are merged field by field
//! with four primitives:
//!
//! - [`replace_scalar`]: the source value wins when it is present.
//! - [`union_dict`]: key-wise union, the source wins on collisions.
//! - [`replace_list`]: the source list replaces the target list entirely.
//! - [`union_list`]: sorted, de-duplicated union.
//!
//! `simpleTags` is the only replaced list: a build reports the complete set of
//! tags an image has, so tags moved to another image must not come back.
//!
//! Repos are matched by name and images by path. Entries only present in the
//! source are added; entries only present in the target are kept. The result
//! is sorted, and merging is associative and idempotent.

use std::collections::BTreeMap;

use log::debug;

use super::{ImageData, ImageInfoDocument, RepoData};

/// Overwrite `target` when `source` has a value
pub fn replace_scalar<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
    if let Some(value) = source {
        *target = Some(value.clone());
    }
}

/// Overwrite the whole `target` list when `source` has one
pub fn replace_list<T: Clone>(target: &mut Option<Vec<T>>, source: &Option<Vec<T>>) {
    if let Some(values) = source {
        *target = Some(values.clone());
    }
}

/// Union of both lists, sorted and without duplicates
pub fn union_list<T: Ord + Clone>(target: &mut Vec<T>, source: &[T]) {
    target.extend(source.iter().cloned());
    target.sort();
    target.dedup();
}

/// Key-wise union; values from `source` replace values in `target`
pub fn union_dict<K: Ord + Clone, V: Clone>(target: &mut BTreeMap<K, V>, source: &BTreeMap<K, V>) {
    for (key, value) in source {
        target.insert(key.clone(), value.clone());
    }
}

pub fn merge_image_data(target: &mut ImageData, source: &ImageData) {
    union_dict(&mut target.base_images, &source.base_images);
    replace_list(&mut target.simple_tags, &source.simple_tags);
    union_list(&mut target.shared_tags, &source.shared_tags);
    replace_scalar(&mut target.digest, &source.digest);
    replace_scalar(&mut target.product_version, &source.product_version);
    replace_scalar(&mut target.os_type, &source.os_type);
    replace_scalar(&mut target.os_version, &source.os_version);
    replace_scalar(&mut target.architecture, &source.architecture);
    replace_scalar(&mut target.created, &source.created);
    replace_scalar(&mut target.commit_url, &source.commit_url);
}

pub fn merge_repo_data(target: &mut RepoData, source: &RepoData) {
    for (path, image) in &source.images {
        let entry = target.images.entry(path.clone()).or_default();
        merge_image_data(entry, image);
    }
}

/// Merge `source` into `target`
pub fn merge_documents(target: &mut ImageInfoDocument, source: &ImageInfoDocument) {
    for repo in &source.repos {
        let index = match target.repos.iter().position(|r| r.repo == repo.repo) {
            Some(index) => index,
            None => {
                debug!("Adding repo '{}'", repo.repo);
                target.repos.push(RepoData::new(&repo.repo));
                target.repos.len() - 1
            }
        };
        merge_repo_data(&mut target.repos[index], repo);
    }
    target.repos.sort_by(|a, b| a.repo.cmp(&b.repo));
}

/// Fold documents left to right into a new canonical document
pub fn merge_all<'a, I>(documents: I) -> ImageInfoDocument
where
    I: IntoIterator<Item = &'a ImageInfoDocument>,
{
    let mut merged = ImageInfoDocument::new();
    for document in documents {
        merge_documents(&mut merged, document);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(tags: &[&str]) -> ImageData {
        ImageData {
            simple_tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            ..Default::default()
        }
    }

    fn document(repo: &str, path: &str, data: ImageData) -> ImageInfoDocument {
        let mut repo = RepoData::new(repo);
        repo.images.insert(path.to_string(), data);
        ImageInfoDocument { repos: vec![repo] }
    }

    mod primitives {
        use super::*;

        #[test]
        fn test_replace_scalar() {
            let mut target = Some("old".to_string());
            replace_scalar(&mut target, &None);
            assert_eq!(target.as_deref(), Some("old"));
            replace_scalar(&mut target, &Some("new".to_string()));
            assert_eq!(target.as_deref(), Some("new"));
        }

        #[test]
        fn test_replace_list_with_empty_list() {
            let mut target = Some(vec![1, 2]);
            replace_list(&mut target, &None);
            assert_eq!(target, Some(vec![1, 2]));
            replace_list(&mut target, &Some(vec![]));
            assert_eq!(target, Some(vec![]));
        }

        #[test]
        fn test_union_list() {
            let mut target = vec!["b", "d"];
            union_list(&mut target, &["c", "a", "b"]);
            assert_eq!(target, vec!["a", "b", "c", "d"]);
        }

        #[test]
        fn test_union_dict_source_wins() {
            let mut target: BTreeMap<&str, &str> = [("a", "1"), ("b", "2")].into_iter().collect();
            let source: BTreeMap<&str, &str> = [("b", "3"), ("c", "4")].into_iter().collect();
            union_dict(&mut target, &source);
            assert_eq!(
                target,
                [("a", "1"), ("b", "3"), ("c", "4")].into_iter().collect()
            );
        }
    }

    mod documents {
        use super::*;

        #[test]
        fn test_simple_tags_are_replaced() {
            let mut target = document("r", "p", image(&["a", "b"]));
            merge_documents(&mut target, &document("r", "p", image(&["a", "c"])));

            let merged = target.image("r", "p").unwrap();
            assert_eq!(
                merged.simple_tags,
                Some(vec!["a".to_string(), "c".to_string()])
            );
        }

        #[test]
        fn test_image_fields() {
            let mut target = document(
                "r",
                "p",
                ImageData {
                    base_images: [("ubuntu:jammy".to_string(), "sha256:old".to_string())]
                        .into_iter()
                        .collect(),
                    shared_tags: vec!["8.0".to_string()],
                    digest: Some("r@sha256:1".to_string()),
                    created: Some("2024-01-01".to_string()),
                    ..Default::default()
                },
            );
            let source = document(
                "r",
                "p",
                ImageData {
                    base_images: [
                        ("ubuntu:jammy".to_string(), "sha256:new".to_string()),
                        ("alpine".to_string(), "sha256:a".to_string()),
                    ]
                    .into_iter()
                    .collect(),
                    shared_tags: vec!["latest".to_string(), "8.0".to_string()],
                    digest: Some("r@sha256:2".to_string()),
                    ..Default::default()
                },
            );
            merge_documents(&mut target, &source);

            let merged = target.image("r", "p").unwrap();
            assert_eq!(merged.base_images["ubuntu:jammy"], "sha256:new");
            assert_eq!(merged.base_images["alpine"], "sha256:a");
            assert_eq!(merged.shared_tags, vec!["8.0", "latest"]);
            assert_eq!(merged.digest.as_deref(), Some("r@sha256:2"));
            assert_eq!(merged.created.as_deref(), Some("2024-01-01"));
        }

        #[test]
        fn test_disjoint_entries_are_kept() {
            let mut target = document("z", "p1", image(&["1"]));
            merge_documents(&mut target, &document("a", "p2", image(&["2"])));
            merge_documents(&mut target, &document("z", "p3", image(&["3"])));

            let repos: Vec<&str> = target.repos.iter().map(|r| r.repo.as_str()).collect();
            assert_eq!(repos, vec!["a", "z"]);
            assert_eq!(target.repo("z").unwrap().images.len(), 2);
            assert!(target.image("z", "p1").is_some());
        }

        #[test]
        fn test_merge_all() {
            let merged = merge_all(&[
                document("r", "p", image(&["1"])),
                document("r", "p", image(&["2"])),
            ]);
            assert_eq!(merged.image("r", "p").unwrap().simple_tags, Some(vec!["2".to_string()]));
            assert_eq!(
                merge_all(Vec::<ImageInfoDocument>::new().iter()),
                ImageInfoDocument::new()
            );
        }
    }

    mod laws {
        use super::*;
        use proptest::prelude::*;
        use std::collections::BTreeSet;

        fn small_string() -> impl Strategy<Value = String> {
            prop_oneof![Just("a"), Just("b"), Just("c")].prop_map(String::from)
        }

        fn image_data() -> impl Strategy<Value = ImageData> {
            (
                proptest::collection::btree_map(small_string(), small_string(), 0..3),
                proptest::option::of(proptest::collection::vec(small_string(), 0..3)),
                proptest::collection::btree_set(small_string(), 0..3),
                proptest::option::of(small_string()),
                proptest::option::of(small_string()),
                proptest::option::of(small_string()),
            )
                .prop_map(
                    |(base_images, simple_tags, shared_tags, digest, os_version, created)| {
                        ImageData {
                            base_images,
                            simple_tags,
                            shared_tags: shared_tags.into_iter().collect(),
                            digest,
                            os_version,
                            created,
                            ..Default::default()
                        }
                    },
                )
        }

        fn canonical_document() -> impl Strategy<Value = ImageInfoDocument> {
            proptest::collection::btree_map(
                small_string(),
                proptest::collection::btree_map(small_string(), image_data(), 0..3),
                0..3,
            )
            .prop_map(|repos| ImageInfoDocument {
                repos: repos
                    .into_iter()
                    .map(|(repo, images)| RepoData { repo, images })
                    .collect(),
            })
        }

        fn merged(left: &ImageInfoDocument, right: &ImageInfoDocument) -> ImageInfoDocument {
            let mut target = left.clone();
            merge_documents(&mut target, right);
            target
        }

        proptest! {
            #[test]
            fn prop_merge_is_idempotent(document in canonical_document()) {
                prop_assert_eq!(merged(&document, &document), document);
            }

            #[test]
            fn prop_merge_is_associative(
                a in canonical_document(),
                b in canonical_document(),
                c in canonical_document(),
            ) {
                prop_assert_eq!(merged(&merged(&a, &b), &c), merged(&a, &merged(&b, &c)));
            }

            #[test]
            fn prop_merge_output_is_sorted(a in canonical_document(), b in canonical_document()) {
                let result = merged(&a, &b);
                let names: Vec<&String> = result.repos.iter().map(|r| &r.repo).collect();
                let sorted: BTreeSet<&String> = names.iter().copied().collect();
                prop_assert_eq!(names, sorted.into_iter().collect::<Vec<_>>());
            }
        }
    }
}
