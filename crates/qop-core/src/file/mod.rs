//! File operations for qop.
//!
//! This module handles:
//! - Recursive file enumeration with relative-path preservation
//! - Wire-path normalization (`/` separators on every platform)
//! - Path sanitization on the receiving side
//!
//! The walker is shared by the sender sequencer and the directory diff
//! tool, so both sides of a transfer agree on what "all files under this
//! root" means.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Recursively enumerate every regular file under `root`.
///
/// Returns paths relative to `root`, sorted for deterministic traversal.
/// Directories themselves are not listed; symlinks are not followed.
///
/// # Errors
///
/// Returns an error if `root` does not exist or is not a directory.
pub fn list_all_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::DirectoryNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(Error::NotADirectory(root.to_path_buf()));
    }

    let mut files = Vec::new();

    for entry in walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_path_buf();
        files.push(relative);
    }

    files.sort();
    Ok(files)
}

/// Convert a relative path into its wire form: components joined by `/`.
///
/// The wire grammar uses `/` regardless of the sending platform so that a
/// Windows sender and a Unix receiver reproduce the same tree.
#[must_use]
pub fn wire_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Convert a wire path back into a platform path.
#[must_use]
pub fn path_from_wire(wire: &str) -> PathBuf {
    wire.split('/').filter(|p| !p.is_empty()).collect()
}

/// Sanitize a received relative path against directory traversal.
///
/// # Arguments
///
/// * `base` - Output directory the file must stay inside
/// * `relative` - Relative path announced by a path marker
///
/// # Returns
///
/// The joined absolute path, or `None` if the relative path contains
/// parent-directory components or is absolute.
#[must_use]
pub fn sanitize_path(base: &Path, relative: &Path) -> Option<PathBuf> {
    for component in relative.components() {
        match component {
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            _ => {}
        }
    }

    let full_path = base.join(relative);

    if full_path.starts_with(base) {
        Some(full_path)
    } else {
        None
    }
}

/// Whether `path` carries one of the recognized extensions.
///
/// Extensions are compared without the leading dot, case-insensitively.
/// An empty list disables filtering and accepts every file.
#[must_use]
pub fn has_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }

    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

/// Format a byte count for display.
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(path, b"x").expect("write file");
    }

    #[test]
    fn test_list_all_files_nested() {
        let temp_dir = TempDir::new().expect("create temp dir");
        touch(&temp_dir.path().join("a.txt"));
        touch(&temp_dir.path().join("sub/b.txt"));
        touch(&temp_dir.path().join("sub/deeper/c.txt"));

        let files = list_all_files(temp_dir.path()).expect("list files");
        assert_eq!(
            files,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("sub/b.txt"),
                PathBuf::from("sub/deeper/c.txt"),
            ]
        );
    }

    #[test]
    fn test_list_all_files_skips_directories() {
        let temp_dir = TempDir::new().expect("create temp dir");
        std::fs::create_dir_all(temp_dir.path().join("empty/nested")).expect("mkdir");
        touch(&temp_dir.path().join("only.txt"));

        let files = list_all_files(temp_dir.path()).expect("list files");
        assert_eq!(files, vec![PathBuf::from("only.txt")]);
    }

    #[test]
    fn test_list_all_files_missing_root() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let missing = temp_dir.path().join("nope");
        let result = list_all_files(&missing);
        assert!(matches!(result, Err(Error::DirectoryNotFound(_))));
    }

    #[test]
    fn test_list_all_files_root_is_file() {
        let temp_dir = TempDir::new().expect("create temp dir");
        let file = temp_dir.path().join("plain.txt");
        touch(&file);
        let result = list_all_files(&file);
        assert!(matches!(result, Err(Error::NotADirectory(_))));
    }

    #[test]
    fn test_wire_path_uses_forward_slashes() {
        let path: PathBuf = ["sub", "deeper", "c.txt"].iter().collect();
        assert_eq!(wire_path(&path), "sub/deeper/c.txt");
    }

    #[test]
    fn test_path_from_wire() {
        let expected: PathBuf = ["sub", "c.txt"].iter().collect();
        assert_eq!(path_from_wire("sub/c.txt"), expected);
        assert_eq!(path_from_wire("sub//c.txt"), expected);
    }

    #[test]
    fn test_sanitize_path_valid() {
        let base = Path::new("/tmp/out");
        assert_eq!(
            sanitize_path(base, Path::new("sub/file.txt")),
            Some(PathBuf::from("/tmp/out/sub/file.txt"))
        );
    }

    #[test]
    fn test_sanitize_path_rejects_traversal() {
        let base = Path::new("/tmp/out");
        assert_eq!(sanitize_path(base, Path::new("../escape.txt")), None);
        assert_eq!(sanitize_path(base, Path::new("sub/../../escape.txt")), None);
    }

    #[test]
    fn test_sanitize_path_rejects_absolute() {
        let base = Path::new("/tmp/out");
        assert_eq!(sanitize_path(base, Path::new("/etc/passwd")), None);
    }

    #[test]
    fn test_has_extension() {
        let exts = vec!["py".to_string(), ".rs".to_string()];
        assert!(has_extension(Path::new("a.py"), &exts));
        assert!(has_extension(Path::new("dir/b.RS"), &exts));
        assert!(!has_extension(Path::new("c.txt"), &exts));
        assert!(!has_extension(Path::new("no_extension"), &exts));
    }

    #[test]
    fn test_has_extension_empty_list_accepts_all() {
        assert!(has_extension(Path::new("anything.bin"), &[]));
        assert!(has_extension(Path::new("no_extension"), &[]));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1024 * 1024), "1.0 MB");
    }
}
