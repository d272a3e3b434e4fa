//! Configuration section definitions.
//!
//! Each module corresponds to a section in `bustle.toml`:
//!
//! | Module   | TOML Section          | Purpose                            |
//! |----------|-----------------------|------------------------------------|
//! | `output` | `[output]`            | Build/record directories, naming   |
//! | `style`  | `[style]`             | Stylesheet asset class             |
//! | `script` | `[[script]]`          | Script bundles                     |
//! | `lint`   | `[lint]`              | Advisory script checks             |
//! | `watch`  | `[watch]`, `[alert]`  | Event coalescing, error bell       |

mod lint;
mod output;
mod script;
mod style;
mod watch;

pub use lint::{LintConfig, LintRules};
pub use output::{OutputConfig, RecordFormat};
pub use script::{ScriptConfig, normalize_scripts, validate_scripts};
pub use style::StyleConfig;
pub use watch::{AlertConfig, WatchConfig};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Destination and record names must be plain filenames.
fn validate_filename(diag: &mut ConfigDiagnostics, field: FieldPath, name: &str) {
    if name.is_empty() {
        diag.error(field, "must not be empty");
    } else if name.contains(['/', '\\']) || name == "." || name == ".." {
        diag.error_with_hint(
            field,
            format!("`{name}` is not a plain filename"),
            "directories are set in [output]",
        );
    }
}

fn validate_globs(diag: &mut ConfigDiagnostics, field: FieldPath, patterns: &[String]) {
    for pattern in patterns {
        if let Err(e) = crate::utils::path::compile_glob(pattern) {
            diag.error(field.clone(), format!("invalid glob `{pattern}`: {e}"));
        }
    }
}
