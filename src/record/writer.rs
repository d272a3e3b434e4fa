//! Single-writer queue for fingerprint record files.
//!
//! Several pipelines may finish at nearly the same time and target the same
//! record file. All physical writes are funneled through one thread; each
//! request re-reads the file, replaces its own key and atomically renames a
//! temp file into place.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam::channel::{self, Sender};

use super::{FingerprintRecord, RecordError};
use crate::config::RecordFormat;

struct WriteRequest {
    path: PathBuf,
    key: String,
    value: String,
    format: RecordFormat,
    reply: Sender<Result<Option<String>, RecordError>>,
}

/// Handle to the record writer thread. Cheap to clone.
///
/// The thread exits once every handle has been dropped.
#[derive(Clone)]
pub struct RecordWriter {
    tx: Sender<WriteRequest>,
}

impl RecordWriter {
    /// Start the writer thread.
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = channel::unbounded::<WriteRequest>();
        thread::Builder::new()
            .name("record-writer".into())
            .spawn(move || {
                for request in rx {
                    let result = apply(&request);
                    // Requester may have given up; nothing to report to.
                    let _ = request.reply.send(result);
                }
            })?;
        Ok(Self { tx })
    }

    /// Store `value` under `key` in the record at `path`.
    ///
    /// Blocks until the write is on disk and returns the previous value.
    pub fn update(
        &self,
        path: &Path,
        key: &str,
        value: &str,
        format: RecordFormat,
    ) -> Result<Option<String>, RecordError> {
        let (reply, response) = channel::bounded(1);
        self.tx
            .send(WriteRequest {
                path: path.to_path_buf(),
                key: key.to_string(),
                value: value.to_string(),
                format,
                reply,
            })
            .map_err(|_| RecordError::Closed)?;
        response.recv().map_err(|_| RecordError::Closed)?
    }
}

fn apply(request: &WriteRequest) -> Result<Option<String>, RecordError> {
    let path = &request.path;
    let io_err = |e| RecordError::Io(path.clone(), e);

    let mut record = match fs::read_to_string(path) {
        Ok(content) => FingerprintRecord::parse(&content, request.format).unwrap_or_else(|e| {
            crate::log!("warning"; "{}: {}, rewriting", path.display(), e);
            FingerprintRecord::new()
        }),
        Err(e) if e.kind() == io::ErrorKind::NotFound => FingerprintRecord::new(),
        Err(e) => return Err(io_err(e)),
    };

    let previous = record.set(&request.key, &request.value);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let tmp = temp_path(path);
    let content = record.render(request.format)?;
    fs::write(&tmp, content).map_err(io_err)?;
    fs::rename(&tmp, path).map_err(io_err)?;

    crate::debug!("record"; "{} <- {}: {}", path.display(), request.key, request.value);
    Ok(previous)
}

/// Sibling temp file, hidden so glob watchers skip it.
fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}
