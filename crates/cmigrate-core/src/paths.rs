//! Path canonicalization
//!
//! Every file key in the index goes through [`canonicalize`], so `src/a.c`,
//! `./src/a.c` and `/abs/project/src/a.c` all collapse to one key.

use std::path::{Component, Path, PathBuf};

/// Resolve `path` to an absolute, normalized form.
///
/// The longest existing prefix is resolved through the filesystem (symlinks
/// included) and the missing tail is appended lexically. A key therefore
/// does not change once the file is created, and spellings through a
/// symlinked directory collapse even before the file exists.
pub fn canonicalize(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();

    if let Ok(resolved) = std::fs::canonicalize(path) {
        return resolved;
    }

    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path.to_path_buf(),
        }
    };

    for ancestor in absolute.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        if let Ok(base) = std::fs::canonicalize(ancestor) {
            let rest = absolute.strip_prefix(ancestor).unwrap_or(absolute.as_path());
            return normalize(&base.join(rest));
        }
    }

    normalize(&absolute)
}

/// Lexically normalize a path: drop `.` and fold `..` into its parent.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                // leading `..` of a relative path are kept
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_dots() {
        assert_eq!(
            normalize(Path::new("/a/./b/../c.c")),
            PathBuf::from("/a/c.c")
        );
        assert_eq!(normalize(Path::new("/../x.h")), PathBuf::from("/x.h"));
    }

    #[test]
    fn test_normalize_keeps_leading_parents() {
        assert_eq!(normalize(Path::new("../../x")), PathBuf::from("../../x"));
        assert_eq!(normalize(Path::new("a/../../x")), PathBuf::from("../x"));
        assert_eq!(normalize(Path::new("./../a/./b/..")), PathBuf::from("../a"));
    }

    #[test]
    fn test_missing_file_key_is_stable_after_creation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("src/./new.c");

        let before = canonicalize(&path);
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(&path, "").unwrap();
        let after = canonicalize(&path);

        assert_eq!(before, after);
    }

    #[cfg(unix)]
    #[test]
    fn test_missing_file_through_symlinked_dir() {
        let dir = TempDir::new().unwrap();
        let real = dir.path().join("real");
        fs::create_dir(&real).unwrap();
        std::os::unix::fs::symlink(&real, dir.path().join("link")).unwrap();

        let via_real = canonicalize(real.join("a.c"));
        let via_link = canonicalize(dir.path().join("link/a.c"));
        assert_eq!(via_real, via_link);

        fs::write(real.join("a.c"), "").unwrap();
        assert_eq!(canonicalize(dir.path().join("link/a.c")), via_real);
    }

    #[test]
    fn test_relative_and_absolute_collapse() {
        let cwd = std::env::current_dir().unwrap();
        let relative = canonicalize("does/not/exist.c");
        let absolute = canonicalize(cwd.join("does/./not/exist.c"));
        assert_eq!(relative, absolute);
        assert!(relative.is_absolute());
    }

    #[test]
    fn test_existing_file_resolves() {
        let cwd = std::env::current_dir().unwrap();
        let via_dot = canonicalize(".");
        assert_eq!(via_dot, std::fs::canonicalize(&cwd).unwrap());
    }
}
