//! Starter config generation.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};

use crate::config::CONFIG_FILE;
use crate::log;

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

/// Generate a commented starter config.
pub fn generate_config_template() -> String {
    format!(
        r#"# bustle configuration file (v{version})

[output]
# Unminified and minified artifacts
build_dir = "build"
# Fingerprint records read by the templating layer
hash_dir = "../templates/_data"
minify_suffix = ".min"
# "yaml" (key: hash lines) or "json"
record_format = "yaml"
hash_length = 8

[style]
# Concatenated in this order
sources = ["css/main.css"]
dest = "style.css"
record = "css_hashsum.yml"
watch = ["css/**/*.{{less,css}}"]
# Preprocessor reading stdin, writing CSS to stdout (omit for plain CSS)
# compiler = ["lessc", "-"]
browsers = ["last 3 version", "> 1%", "ie 8"]
compatibility = ["ie 7"]
rem_fallback = true
rem_root = 16.0

[[script]]
name = "app"
sources = ["js/plugins.js", "js/script.js"]
dest = "app.js"
record = "js_hashsum.yml"

[lint]
files = ["js/*.js"]
config = true

[lint.rules]
eqeqeq = true
debugger = true

[watch]
debounce_ms = 300
cooldown_ms = 800

[alert]
beep = true
"#,
        version = env!("CARGO_PKG_VERSION")
    )
}

/// Write the starter config next to (or at) `config_path`.
pub fn init_project(config_path: &Path, dry: bool, force: bool) -> Result<()> {
    if dry {
        print!("{}", generate_config_template());
        return Ok(());
    }

    let path = target_path(config_path)?;
    if path.exists() && !force {
        bail!("`{}` already exists, pass --force to overwrite", path.display());
    }
    let root = path.parent().unwrap_or(Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create '{}'", root.display()))?;
    write_config(&path)?;
    write_ignore_files(root, Path::new("build"))?;

    log!("init"; "wrote {}", path.display());
    Ok(())
}

fn target_path(config_path: &Path) -> Result<PathBuf> {
    if config_path.is_absolute() {
        return Ok(config_path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    Ok(cwd.join(config_path))
}

pub fn write_config(path: &Path) -> Result<()> {
    fs::write(path, generate_config_template())
        .with_context(|| format!("Failed to write config file '{}'", path.display()))
}

/// Write `.gitignore` / `.ignore` listing the build directory.
///
/// Existing ignore files are left alone.
pub fn write_ignore_files(root: &Path, build_dir: &Path) -> Result<()> {
    let pattern = Path::new("/").join(build_dir);
    let content = format!("{}/\n", pattern.to_string_lossy());

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write '{}'", path.display()))?;
        }
    }

    Ok(())
}
