//! Mapping from changed paths to the work they re-trigger.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use globset::{GlobSet, GlobSetBuilder};

use super::roots::literal_prefix;
use super::types::Target;
use crate::config::PipelineConfig;
use crate::utils::path::{compile_glob, normalize_path, to_slash};

struct Trigger {
    target: Target,
    globs: GlobSet,
}

/// Root-relative glob matching for every watched asset class.
///
/// - style: `style.watch` globs plus the exact style sources
/// - each script bundle: its exact source list
/// - lint: `lint.files` globs plus the config file
pub struct TriggerSet {
    root: PathBuf,
    canonical_root: PathBuf,
    /// Output directories; changes there never trigger anything.
    ignored: Vec<PathBuf>,
    triggers: Vec<Trigger>,
    /// Directories that must be watched for the triggers to see events.
    dirs: Vec<PathBuf>,
}

impl TriggerSet {
    pub fn from_config(config: &PipelineConfig) -> Self {
        let root = config.get_root().to_path_buf();
        let mut set = Self {
            canonical_root: normalize_path(&root),
            ignored: vec![
                normalize_path(&config.output.build_dir),
                normalize_path(&config.output.hash_dir),
            ],
            root,
            triggers: Vec::new(),
            dirs: Vec::new(),
        };

        if config.style.is_enabled() {
            set.add(Target::Style, &config.style.watch, &config.style.sources);
        }
        for script in &config.scripts {
            set.add(Target::Script(script.name.clone()), &[], &script.sources);
        }
        if !config.lint.files.is_empty() || config.lint.config {
            let config_file: Vec<PathBuf> = if config.lint.config {
                vec![config.config_path.clone()]
            } else {
                Vec::new()
            };
            set.add(Target::Lint, &config.lint.files, &config_file);
        }
        set
    }

    fn add(&mut self, target: Target, patterns: &[String], files: &[PathBuf]) {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            match compile_glob(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                    self.dirs.push(self.root.join(literal_prefix(pattern)));
                }
                Err(e) => crate::log!("warning"; "ignoring watch glob `{}`: {}", pattern, e),
            }
        }

        for file in files {
            let path = self.relative(file);
            if let Ok(glob) = compile_glob(&globset::escape(&path)) {
                builder.add(glob);
            }
            let dir = file
                .parent()
                .map_or_else(|| self.root.clone(), Path::to_path_buf);
            self.dirs.push(dir);
        }

        match builder.build() {
            Ok(globs) => self.triggers.push(Trigger { target, globs }),
            Err(e) => crate::log!("warning"; "cannot watch {}: {}", target, e),
        }
    }

    /// Slash path relative to the root, or the whole path when outside it.
    fn relative(&self, path: &Path) -> String {
        let rel = path
            .strip_prefix(&self.canonical_root)
            .or_else(|_| path.strip_prefix(&self.root))
            .unwrap_or(path);
        to_slash(rel)
    }

    fn is_ignored(&self, path: &Path) -> bool {
        self.ignored.iter().any(|dir| path.starts_with(dir))
    }

    /// Every target matched by at least one of `paths`, in a stable order.
    pub fn targets<'a>(&self, paths: impl IntoIterator<Item = &'a PathBuf>) -> BTreeSet<Target> {
        let mut targets = BTreeSet::new();
        for path in paths {
            if self.is_ignored(path) {
                continue;
            }
            let rel = self.relative(path);
            for trigger in &self.triggers {
                if trigger.globs.is_match(&rel) {
                    targets.insert(trigger.target.clone());
                }
            }
        }
        targets
    }

    /// Directories the watcher must cover, before deduplication.
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }
}
