//! Source revision lookup

use std::io::Read;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Placeholder recorded when the revision cannot be determined
pub const UNAVAILABLE: &str = "unavailable";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Best-effort `git describe --always` with a bounded wait
///
/// Never fails: a missing binary, a non-repository directory, a non-zero
/// exit or a timeout all produce [`UNAVAILABLE`].
#[derive(Debug, Clone)]
pub struct GitRevision {
    program: PathBuf,
    dir: Option<PathBuf>,
    timeout: Duration,
}

impl Default for GitRevision {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
            dir: None,
            timeout: Duration::from_secs(2),
        }
    }
}

impl GitRevision {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable in place of `git`
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Describe the repository containing `dir` instead of the working directory
    pub fn dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Current revision, or [`UNAVAILABLE`]
    pub fn describe(&self) -> String {
        match self.run() {
            Ok(revision) => {
                debug!(revision = %revision, "source revision");
                revision
            }
            Err(reason) => {
                warn!(program = %self.program.display(), %reason, "source revision unavailable");
                UNAVAILABLE.to_string()
            }
        }
    }

    fn run(&self) -> Result<String, String> {
        let mut command = Command::new(&self.program);
        command
            .args(["describe", "--always"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        if let Some(dir) = &self.dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|e| e.to_string())?;
        let deadline = Instant::now() + self.timeout;

        let status = loop {
            match child.try_wait().map_err(|e| e.to_string())? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    // Reap the child so it does not linger as a zombie
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(format!("timed out after {:?}", self.timeout));
                }
                None => thread::sleep(POLL_INTERVAL),
            }
        };

        if !status.success() {
            return Err(format!("exited with {status}"));
        }

        let mut stdout = String::new();
        if let Some(mut pipe) = child.stdout.take() {
            pipe.read_to_string(&mut stdout).map_err(|e| e.to_string())?;
        }

        let revision = stdout.trim();
        if revision.is_empty() {
            return Err("empty output".to_string());
        }
        Ok(revision.to_string())
    }
}
