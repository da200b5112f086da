//! Write lock for one project.
//!
//! Every command that saves holds `outline/.lock` across its whole
//! load-mutate-save cycle. While held, the file names the holder's pid and
//! command, so a command that gives up waiting can say what it waited on.

use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

pub const LOCK_FILE: &str = ".lock";

/// How long a command waits for another `ol` to finish
pub const DEFAULT_WAIT: Duration = Duration::from_secs(5);

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// The process currently writing the project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHolder {
    pub pid: u32,
    pub command: String,
}

impl LockHolder {
    fn current(command: &str) -> Self {
        LockHolder {
            pid: std::process::id(),
            command: command.to_string(),
        }
    }

    /// `"<pid> <command>"`, as written into the lock file
    pub fn parse(text: &str) -> Option<Self> {
        let (pid, command) = text.trim().split_once(' ')?;
        let command = command.trim();
        if command.is_empty() {
            return None;
        }
        Some(LockHolder {
            pid: pid.parse().ok()?,
            command: command.to_string(),
        })
    }
}

impl fmt::Display for LockHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "`ol {}` (pid {})", self.command, self.pid)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("could not record lock holder in {path}: {source}")]
    Record { path: PathBuf, source: io::Error },
    #[error("project is busy: {} is still writing ({})", describe(.holder), .path.display())]
    Busy {
        path: PathBuf,
        holder: Option<LockHolder>,
    },
}

fn describe(holder: &Option<LockHolder>) -> String {
    match holder {
        Some(holder) => holder.to_string(),
        None => "another ol process".to_string(),
    }
}

/// Held for as long as the guard lives. Dropping it clears the holder line
/// and releases the flock; the file itself stays for the next command.
#[derive(Debug)]
pub struct ProjectLock {
    file: File,
    holder: LockHolder,
}

impl ProjectLock {
    /// Lock the project for `command`, polling until `wait` runs out.
    pub fn acquire(outline_dir: &Path, command: &str, wait: Duration) -> Result<Self, LockError> {
        let path = outline_dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + wait;
        loop {
            match try_flock(&file) {
                Ok(true) => break,
                Ok(false) if Instant::now() < deadline => thread::sleep(POLL_INTERVAL),
                Ok(false) => {
                    let holder = read_holder(&path);
                    tracing::warn!(command, holder = %describe(&holder), "project lock busy");
                    return Err(LockError::Busy { path, holder });
                }
                Err(source) => return Err(LockError::Open { path, source }),
            }
        }

        let holder = LockHolder::current(command);
        record(&mut file, &holder).map_err(|source| LockError::Record {
            path: path.clone(),
            source,
        })?;
        tracing::debug!(command, "project lock acquired");
        Ok(ProjectLock { file, holder })
    }

    pub fn holder(&self) -> &LockHolder {
        &self.holder
    }
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        // still under the flock here; it goes away with the handle
        let _ = self.file.set_len(0);
        tracing::debug!(command = %self.holder.command, "project lock released");
    }
}

/// Who the lock file says holds the lock. Stale or empty text gives None.
pub fn read_holder(path: &Path) -> Option<LockHolder> {
    fs::read_to_string(path).ok().as_deref().and_then(LockHolder::parse)
}

fn record(file: &mut File, holder: &LockHolder) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{} {}", holder.pid, holder.command)?;
    file.flush()
}

/// Non-blocking exclusive flock. Ok(false) when someone else has it.
#[cfg(unix)]
fn try_flock(file: &File) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock {
        Ok(false)
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn try_flock(_file: &File) -> io::Result<bool> {
    Ok(true)
}
