//! Captured pre-images of registered paths and how to put them back.
//!
//! Capture happens once, at registration. Restoration trusts nothing about
//! what happened in between: it probes the live path and undoes whatever it
//! finds, so a file that became a directory, a symlink that became a file,
//! or a path that vanished are all handled the same way.

use crate::error::{Result, TxError};

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// State of one path at the moment it was registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityState {
    /// Regular file with its full content.
    File { content: Vec<u8> },
    /// Symbolic link with its exact target.
    Symlink { target: PathBuf },
    /// Nothing existed at the path.
    NoEnt,
}

impl EntityState {
    /// Short noun used in log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            EntityState::File { .. } => "file",
            EntityState::Symlink { .. } => "symlink",
            EntityState::NoEnt => "noent",
        }
    }
}

/// A registered path together with its captured state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    path: PathBuf,
    state: EntityState,
}

/// One failed step while restoring an entity.
#[derive(Debug)]
pub(crate) struct RestoreFailure {
    pub step: &'static str,
    pub source: io::Error,
}

impl RestoreFailure {
    fn new(step: &'static str, source: io::Error) -> Self {
        Self { step, source }
    }
}

impl Entity {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &EntityState {
        &self.state
    }

    /// Probes `path` without following a terminal symlink and captures it.
    ///
    /// Existing directories are rejected. An absent path is only accepted
    /// when `allow_missing` is set.
    pub fn capture(path: &Path, allow_missing: bool) -> Result<Self> {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if !allow_missing {
                    return Err(TxError::MissingEntity(path.to_path_buf()));
                }
                return Ok(Self {
                    path: path.to_path_buf(),
                    state: EntityState::NoEnt,
                });
            }
            Err(source) => {
                return Err(TxError::Probe {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let file_type = metadata.file_type();
        let state = if file_type.is_dir() {
            return Err(TxError::ExistingDirectory(path.to_path_buf()));
        } else if file_type.is_file() {
            let content = fs::read(path).map_err(|source| TxError::Capture {
                kind: "file",
                path: path.to_path_buf(),
                source,
            })?;
            EntityState::File { content }
        } else if file_type.is_symlink() {
            let target = fs::read_link(path).map_err(|source| TxError::Capture {
                kind: "symlink",
                path: path.to_path_buf(),
                source,
            })?;
            EntityState::Symlink { target }
        } else {
            return Err(TxError::UnsupportedKind(path.to_path_buf()));
        };

        Ok(Self {
            path: path.to_path_buf(),
            state,
        })
    }

    /// Puts the captured state back at the path.
    ///
    /// Returns every step that failed; an empty list means the path now
    /// matches the capture.
    pub(crate) fn restore(&self) -> Vec<RestoreFailure> {
        match &self.state {
            EntityState::File { content } => self.restore_file(content),
            EntityState::Symlink { target } => self.restore_symlink(target),
            EntityState::NoEnt => self.restore_noent(),
        }
    }

    fn restore_file(&self, content: &[u8]) -> Vec<RestoreFailure> {
        if let Ok(metadata) = fs::symlink_metadata(&self.path) {
            let file_type = metadata.file_type();
            if file_type.is_dir() {
                if let Err(e) = fs::remove_dir(&self.path) {
                    return vec![RestoreFailure::new("rmdir", e)];
                }
            } else if !file_type.is_file() {
                // Opening a fifo for writing would block; replace anything irregular
                if let Err(e) = ignore_not_found(fs::remove_file(&self.path)) {
                    return vec![RestoreFailure::new("unlink", e)];
                }
            }
        }

        match write_file(&self.path, content) {
            Ok(()) => Vec::new(),
            Err(e) => vec![RestoreFailure::new("write", e)],
        }
    }

    fn restore_symlink(&self, target: &Path) -> Vec<RestoreFailure> {
        // Compare raw bytes; `Path` equality treats "a/" as "a" and "a/./b" as "a/b"
        if fs::read_link(&self.path)
            .is_ok_and(|live| live.as_os_str() == target.as_os_str())
        {
            return Vec::new();
        }

        let mut failures = Vec::new();
        if let Err(e) = remove_entry(&self.path) {
            failures.push(RestoreFailure::new("remove", e));
        }
        if let Err(e) = make_symlink(target, &self.path) {
            failures.push(RestoreFailure::new("symlink", e));
        }
        failures
    }

    fn restore_noent(&self) -> Vec<RestoreFailure> {
        let metadata = match fs::symlink_metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => return vec![RestoreFailure::new("lstat", e)],
        };

        let file_type = metadata.file_type();
        let result = if file_type.is_dir() {
            fs::remove_dir(&self.path).map_err(|e| RestoreFailure::new("rmdir", e))
        } else {
            ignore_not_found(fs::remove_file(&self.path))
                .map_err(|e| RestoreFailure::new("unlink", e))
        };

        result.err().into_iter().collect()
    }
}

/// Creates or truncates a regular file and writes `content` to it.
fn write_file(path: &Path, content: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let mut file = options.open(path)?;
    file.write_all(content)?;
    file.flush()
}

/// Removes whatever occupies `path`; an already absent path is fine.
fn remove_entry(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.file_type().is_dir() => fs::remove_dir(path),
        Ok(_) => ignore_not_found(fs::remove_file(path)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

fn ignore_not_found(result: io::Result<()>) -> io::Result<()> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

#[cfg(unix)]
fn make_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn make_symlink(_target: &Path, link: &Path) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("cannot recreate symlink {} on this platform", link.display()),
    ))
}
