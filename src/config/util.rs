//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the absolute path to the config file if found
///
/// # Example
/// ```text
/// /home/user/site/assets/css/  ← cwd
/// /home/user/site/assets/bustle.toml  ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    find_config_from(&cwd, config_name)
}

/// Walk up from `start` looking for `config_name`.
pub fn find_config_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

/// Resolve a configured directory: expand `~`, then join relative paths with `root`.
pub fn resolve_dir(root: &Path, dir: &Path) -> PathBuf {
    let raw = dir.to_string_lossy();
    let expanded = PathBuf::from(shellexpand::tilde(&raw).as_ref());
    if expanded.is_absolute() {
        expanded
    } else {
        root.join(expanded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_find_config_from_parent() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("css/libs");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("bustle.toml"), "").unwrap();

        let found = find_config_from(&nested, Path::new("bustle.toml")).unwrap();
        assert_eq!(found, dir.path().join("bustle.toml"));
    }

    #[test]
    fn test_find_config_from_missing() {
        let dir = TempDir::new().unwrap();
        assert!(find_config_from(dir.path(), Path::new("no-such-config.toml")).is_none());
    }

    #[test]
    fn test_resolve_dir() {
        let root = Path::new("/site/assets");
        assert_eq!(
            resolve_dir(root, Path::new("build")),
            PathBuf::from("/site/assets/build")
        );
        assert_eq!(resolve_dir(root, Path::new("/tmp/out")), PathBuf::from("/tmp/out"));
        assert!(resolve_dir(root, Path::new("~/data")).is_absolute());
    }
}
