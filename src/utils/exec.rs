//! External command execution.
//!
//! Builder-based API for running a preprocessor with stdin piping and
//! captured output.
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let output = Cmd::from_slice(&["lessc", "-"])
//!     .cwd(root)
//!     .stdin(source)
//!     .run()?;
//! ```

use std::{
    ffi::{OsStr, OsString},
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Command, Output, Stdio},
};

/// Command builder for external process execution.
#[derive(Default)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    stdin_data: Option<Vec<u8>>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["lessc", "-"]` or `["npx", "lessc", "-"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Add a single argument.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set stdin data to pipe to the process.
    pub fn stdin<D: AsRef<[u8]>>(mut self, data: D) -> Self {
        self.stdin_data = Some(data.as_ref().to_vec());
        self
    }

    /// Get the program name for error messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Execute the command and capture its output.
    ///
    /// A non-zero exit status is not an error here; callers inspect
    /// `output.status` and decide how to report stderr.
    pub fn run(self) -> io::Result<Output> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(if self.stdin_data.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn()?;

        // Feed stdin from a separate thread so a child that writes before it
        // finishes reading cannot fill the stdout pipe and deadlock.
        let writer = match (child.stdin.take(), self.stdin_data) {
            (Some(mut stdin), Some(data)) => Some(std::thread::spawn(move || {
                // Broken pipe just means the child stopped reading early.
                let _ = stdin.write_all(&data);
            })),
            _ => None,
        };

        let output = child.wait_with_output()?;
        if let Some(writer) = writer {
            let _ = writer.join();
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slice_splits_program() {
        let cmd = Cmd::from_slice(&["lessc", "--no-color", "-"]);
        assert_eq!(cmd.program_name(), "lessc");
        assert_eq!(cmd.args.len(), 2);
    }

    #[test]
    fn test_empty_arg_skipped() {
        let cmd = Cmd::new("lessc").arg("").arg("-");
        assert_eq!(cmd.args, vec![OsString::from("-")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_stdin_roundtrip_through_cat() {
        let output = Cmd::new("cat").stdin(".x{color:red}").run().unwrap();
        assert!(output.status.success());
        assert_eq!(output.stdout, b".x{color:red}");
    }

    #[cfg(unix)]
    #[test]
    fn test_failure_status_is_returned() {
        let output = Cmd::new("false").run().unwrap();
        assert!(!output.status.success());
    }

    #[test]
    fn test_missing_program_is_io_error() {
        assert!(Cmd::new("definitely-not-a-real-program-xyz").run().is_err());
    }
}
