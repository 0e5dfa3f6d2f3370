//! Shared action log
//!
//! Every intercepted process of a build appends to the same JSON file, shaped
//! like a `compile_commands.json` database: one entry per source file.
//! Appends take an exclusive `flock` for the whole read-modify-write cycle, so
//! parallel compiler processes never interleave their writes.

use nix::fcntl::{Flock, FlockArg};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::action::Action;
use crate::error::{Error, Result};

/// One compilation database entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Working directory of the invocation
    pub directory: String,
    /// Normalized argument list
    pub arguments: Vec<String>,
    /// Source file this entry is about
    pub file: String,
    /// Produced file, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl LogEntry {
    /// Split an action into one entry per source
    pub fn from_action(action: &Action, directory: &Path) -> Vec<LogEntry> {
        let directory = directory.to_string_lossy().into_owned();
        action
            .sources
            .iter()
            .map(|source| LogEntry {
                directory: directory.clone(),
                arguments: action.arguments.clone(),
                file: source.clone(),
                output: action.output.clone(),
            })
            .collect()
    }
}

/// Handle to an action log file
#[derive(Debug, Clone)]
pub struct ActionLog {
    path: PathBuf,
}

impl ActionLog {
    /// Refer to the log at `path`; the file is created on first append
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the actions and return the number of entries written
    pub fn append(&self, actions: &[Action], directory: &Path) -> Result<usize> {
        let new_entries: Vec<LogEntry> = actions
            .iter()
            .flat_map(|action| LogEntry::from_action(action, directory))
            .collect();
        if new_entries.is_empty() {
            return Ok(0);
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        let mut file = self.lock(file)?;

        let mut entries = self.read_entries(&mut file)?;
        let added = new_entries.len();
        entries.extend(new_entries);

        let json = serde_json::to_string_pretty(&entries)?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(json.as_bytes())?;
        file.write_all(b"\n")?;
        file.flush()?;

        tracing::debug!(
            path = %self.path.display(),
            added,
            total = entries.len(),
            "appended to action log"
        );
        Ok(added)
    }

    /// Read all entries; a missing or empty file has none
    pub fn entries(&self) -> Result<Vec<LogEntry>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut file = Flock::lock(file, FlockArg::LockShared).map_err(|(_, errno)| {
            Error::Lock {
                path: self.path.clone(),
                errno,
            }
        })?;
        self.read_entries(&mut file)
    }

    fn lock(&self, file: File) -> Result<Flock<File>> {
        Flock::lock(file, FlockArg::LockExclusive).map_err(|(_, errno)| {
            tracing::warn!(path = %self.path.display(), %errno, "cannot lock action log");
            Error::Lock {
                path: self.path.clone(),
                errno,
            }
        })
    }

    fn read_entries(&self, file: &mut File) -> Result<Vec<LogEntry>> {
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|source| Error::CorruptLog {
            path: self.path.clone(),
            source,
        })
    }
}
