//! Property-based tests for path manipulation functions.

#[cfg(test)]
mod proptest_tests {
    use crate::path::{common_prefix_segments, glob_match, join, normalize_relative, parent};
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = String> {
        "[a-z0-9][a-z0-9._-]{0,8}"
    }

    fn relative_path() -> impl Strategy<Value = String> {
        proptest::collection::vec(segment(), 1..6).prop_map(|segments| segments.join("/"))
    }

    proptest! {
        /// Normalizing twice gives the same result as normalizing once
        #[test]
        fn normalize_relative_is_idempotent(path in relative_path()) {
            let once = normalize_relative(&path).unwrap();
            prop_assert_eq!(normalize_relative(&once).unwrap(), once);
        }

        /// Separators, `./` prefixes and trailing slashes do not change the result
        #[test]
        fn normalize_relative_ignores_spelling(path in relative_path()) {
            let windows = format!(".\\{}\\", path.replace('/', "\\"));
            prop_assert_eq!(normalize_relative(&windows).unwrap(), path);
        }

        /// A `..` segment anywhere is rejected
        #[test]
        fn normalize_relative_rejects_parent_segments(
            before in relative_path(),
            after in relative_path(),
        ) {
            let escaping = format!("{}/../{}", before, after);
            prop_assert!(normalize_relative(&escaping).is_err());
        }

        /// `parent` undoes `join`
        #[test]
        fn parent_of_join(base in relative_path(), name in segment()) {
            let joined = join(&base, &name);
            prop_assert_eq!(parent(&joined), base.as_str());
        }

        /// The common prefix is a prefix of every path
        #[test]
        fn common_prefix_is_shared(paths in proptest::collection::vec(relative_path(), 1..5)) {
            let prefix = common_prefix_segments(paths.iter().map(String::as_str));
            for path in &paths {
                let segments: Vec<&str> = path.split('/').collect();
                prop_assert!(prefix.len() <= segments.len());
                for (shared, segment) in prefix.iter().zip(&segments) {
                    prop_assert_eq!(shared.as_str(), *segment);
                }
            }
        }

        /// A pattern without wildcards matches itself regardless of case
        #[test]
        fn glob_match_literal(path in relative_path()) {
            prop_assert!(glob_match(&path, &path).unwrap());
            prop_assert!(glob_match(&path.to_uppercase(), &path).unwrap());
        }
    }
}
