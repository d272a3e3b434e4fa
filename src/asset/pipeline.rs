//! Asset pipelines: concatenate, transform, write, minify, fingerprint.
//!
//! ```text
//! sources ──concat──▶ transforms ──▶ <dest>          (unminified)
//!                                  └─▶ minifier ──▶ <dest.min>
//!                                  └─▶ fingerprint ──▶ record[key]
//! ```
//!
//! Every stage, the minifier included, runs in memory before anything is
//! written, so a failing stage leaves the previous artifacts and record
//! untouched.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use thiserror::Error;

use super::class::{AssetClass, AssetKind, MinifyRule};
use super::minify::{CssMinifier, JsMinifier};
use super::stage::{Stage, StageError};
use super::style::{ExternalCompiler, PlainCss, Prefix, RemFallback, resolve_targets};
use crate::config::{PipelineConfig, RecordFormat, ScriptConfig};
use crate::record::{Fingerprint, RecordError, RecordWriter};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read source {}: {}", .0.display(), .1)]
    Source(PathBuf, #[source] io::Error),

    #[error("cannot write {}: {}", .0.display(), .1)]
    Write(PathBuf, #[source] io::Error),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error("invalid browser targets: {0}")]
    Targets(String),
}

impl PipelineError {
    /// Compile-type errors are reported and the caller carries on;
    /// everything else points at a broken environment or configuration.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Stage(_))
    }
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub name: String,
    pub kind: AssetKind,
    pub artifact: PathBuf,
    pub minified: PathBuf,
    pub fingerprint: Fingerprint,
    /// Value stored under this class's key before the run.
    pub previous: Option<String>,
    pub elapsed: Duration,
}

impl BuildReport {
    /// Whether the fingerprint differs from the recorded one.
    pub fn changed(&self) -> bool {
        self.previous.as_deref() != Some(self.fingerprint.as_str())
    }
}

pub struct Pipeline {
    class: AssetClass,
    build_dir: PathBuf,
    hash_dir: PathBuf,
    format: RecordFormat,
    minify_rule: MinifyRule,
    hash_length: usize,
    transforms: Vec<Box<dyn Stage>>,
    minifier: Box<dyn Stage>,
    records: RecordWriter,
}

impl Pipeline {
    /// Pipeline for `class` with no transforms, writing where `config.output` says.
    pub fn new(
        class: AssetClass,
        config: &PipelineConfig,
        minifier: Box<dyn Stage>,
        records: RecordWriter,
    ) -> Self {
        let output = &config.output;
        Self {
            class,
            build_dir: output.build_dir.clone(),
            hash_dir: output.hash_dir.clone(),
            format: output.record_format,
            minify_rule: MinifyRule::new(output.minify_suffix.clone()),
            hash_length: output.hash_length,
            transforms: Vec::new(),
            minifier,
            records,
        }
    }

    /// Append a transform stage.
    pub fn pipe(mut self, stage: impl Stage + 'static) -> Self {
        self.transforms.push(Box::new(stage));
        self
    }

    /// The stylesheet pipeline: compile, prefix, rem fallback, CSS minifier.
    pub fn style(config: &PipelineConfig, records: RecordWriter) -> Result<Self, PipelineError> {
        let style = &config.style;
        let browsers = resolve_targets(&style.browsers).map_err(PipelineError::Targets)?;
        let compatibility =
            resolve_targets(&style.compatibility).map_err(PipelineError::Targets)?;

        let class = AssetClass::style(style);
        let pipeline = Self::new(class, config, Box::new(CssMinifier::new(compatibility)), records);
        let pipeline = match &style.compiler {
            Some(command) => pipeline.pipe(ExternalCompiler::new(command.clone(), config.root.clone())),
            None => pipeline.pipe(PlainCss),
        };
        let pipeline = pipeline.pipe(Prefix::new(browsers));
        Ok(if style.rem_fallback {
            pipeline.pipe(RemFallback::new(style.rem_root))
        } else {
            pipeline
        })
    }

    /// A script pipeline built from its three variable parts.
    ///
    /// The bundle name and record key default to the destination's file
    /// stem; relative sources resolve against the project root.
    pub fn script(
        sources: Vec<PathBuf>,
        dest: impl Into<String>,
        record: impl Into<String>,
        config: &PipelineConfig,
        records: RecordWriter,
    ) -> Self {
        let dest = dest.into();
        let name = Path::new(&dest)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| dest.clone());
        let class = AssetClass {
            key: name.clone(),
            name,
            kind: AssetKind::Script,
            sources: sources.into_iter().map(|p| config.root_join(p)).collect(),
            dest,
            record: record.into(),
            separator: ScriptConfig::default().separator,
        };
        Self::new(class, config, Box::new(JsMinifier), records)
    }

    /// Script pipeline for a configured `[[script]]` bundle.
    pub fn script_bundle(
        bundle: &ScriptConfig,
        config: &PipelineConfig,
        records: RecordWriter,
    ) -> Self {
        Self::script(
            bundle.sources.clone(),
            bundle.dest.clone(),
            bundle.record.clone(),
            config,
            records,
        )
        .with_name(bundle.name.clone())
        .with_key(bundle.key())
        .with_separator(bundle.separator.clone())
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.class.name = name.into();
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.class.key = key.into();
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.class.separator = separator.into();
        self
    }

    pub fn class(&self) -> &AssetClass {
        &self.class
    }

    pub fn name(&self) -> &str {
        &self.class.name
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.build_dir.join(&self.class.dest)
    }

    pub fn minified_path(&self) -> PathBuf {
        self.build_dir.join(self.minify_rule.apply(&self.class.dest))
    }

    pub fn record_path(&self) -> PathBuf {
        self.hash_dir.join(&self.class.record)
    }

    /// Stage names in execution order, minifier last.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.transforms
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.minifier.name()))
            .collect()
    }

    /// Run every stage once.
    pub fn run(&self) -> Result<BuildReport, PipelineError> {
        let start = Instant::now();

        let mut bytes = self.class.concatenate()?;
        for stage in &self.transforms {
            bytes = stage.apply(&bytes)?;
            crate::debug!(self.class.kind.label(); "{}: {} after {}", self.class.name, bytes.len(), stage.name());
        }

        let minified_bytes = self.minifier.apply(&bytes)?;

        fs::create_dir_all(&self.build_dir)
            .map_err(|e| PipelineError::Write(self.build_dir.clone(), e))?;
        let artifact = self.artifact_path();
        write(&artifact, &bytes)?;
        let minified = self.minified_path();
        write(&minified, &minified_bytes)?;

        let fingerprint = Fingerprint::compute(&bytes, self.hash_length);
        let previous = self.records.update(
            &self.record_path(),
            &self.class.key,
            fingerprint.as_str(),
            self.format,
        )?;

        Ok(BuildReport {
            name: self.class.name.clone(),
            kind: self.class.kind,
            artifact,
            minified,
            fingerprint,
            previous,
            elapsed: start.elapsed(),
        })
    }
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), PipelineError> {
    fs::write(path, bytes).map_err(|e| PipelineError::Write(path.to_path_buf(), e))
}
