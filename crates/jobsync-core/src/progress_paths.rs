use std::collections::BTreeSet;
use std::ops::Bound;

/// True if any folder in `folders` is a literal prefix of `path`.
pub(crate) fn is_under_any(folders: &BTreeSet<String>, path: &str) -> bool {
    folders.iter().any(|folder| path.starts_with(folder.as_str()))
}

/// True if any entry in `paths` starts with `prefix`.
///
/// Entries sharing a prefix sort contiguously, so the first entry at or after
/// `prefix` is the only candidate.
pub(crate) fn any_under(paths: &BTreeSet<String>, prefix: &str) -> bool {
    paths
        .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
        .next()
        .is_some_and(|path| path.starts_with(prefix))
}

/// Number of `/`-separated segments, used to order folder deletions deepest first.
pub(crate) fn depth(path: &str) -> usize {
    path.trim_end_matches('/').split('/').count()
}

pub(crate) fn is_folder(path: &str) -> bool {
    path.ends_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn folder_prefix_matches_itself_and_descendants() {
        let folders = set(&["folder1/", "folder2/subfolder/"]);
        assert!(is_under_any(&folders, "folder1/"));
        assert!(is_under_any(&folders, "folder1/file.json"));
        assert!(is_under_any(&folders, "folder1/nested/deep/file.json"));
        assert!(is_under_any(&folders, "folder2/subfolder/file.json"));
        assert!(!is_under_any(&folders, "folder2/file.json"));
        assert!(!is_under_any(&folders, "file.json"));
    }

    #[test]
    fn any_under_finds_nested_entries() {
        let paths = set(&["a/b/c.json", "m.json", "z/y.json"]);
        assert!(any_under(&paths, "a/"));
        assert!(any_under(&paths, "a/b/"));
        assert!(any_under(&paths, "a/b/c.json"));
        assert!(any_under(&paths, ""));
        assert!(!any_under(&paths, "a/c/"));
        assert!(!any_under(&paths, "b/"));
        assert!(!any_under(&paths, "zz/"));
    }

    #[test]
    fn any_under_empty_set_is_false() {
        assert!(!any_under(&BTreeSet::new(), "a/"));
    }

    #[test]
    fn depth_counts_segments() {
        assert_eq!(depth("a/"), 1);
        assert_eq!(depth("a/b/c/"), 3);
        assert_eq!(depth("a/b.json"), 2);
    }
}
