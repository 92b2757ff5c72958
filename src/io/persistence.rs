// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Debounced, tiered project saving and startup recovery.
//!
//! Every project change schedules a save; a newer change replaces the
//! pending one, so a burst of edits collapses into one write once the
//! quiet period has elapsed. The clock is passed in by the caller, which
//! keeps the manager single-threaded and deterministic: the UI loop calls
//! [`PersistenceManager::poll`] with the current instant.
//!
//! A save always writes the backup store first (best effort) and then, if a
//! save target has been granted, overwrites the target with the same snapshot.

use super::serialization::{self, Format};
use crate::error::PersistError;
use crate::models::project::Project;
use chrono::{DateTime, Local};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Quiet period between the last change and the save.
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(400);

/// Key of the single backup entry.
pub const DEFAULT_BACKUP_KEY: &str = "harborlabel.project";

/// Local key/value store holding the latest project snapshot.
pub trait BackupStore {
    fn read(&self, key: &str) -> io::Result<Option<String>>;
    fn write(&mut self, key: &str, contents: &str) -> io::Result<()>;
}

/// A writable destination granted by the user, overwritten on every save.
pub trait SaveTarget {
    fn describe(&self) -> String;
    fn overwrite(&mut self, contents: &[u8]) -> io::Result<()>;
}

/// Receives manual exports.
pub trait ExportSink {
    fn deliver(&mut self, contents: &[u8], suggested_name: &str) -> io::Result<()>;
}

/// Backup entries stored as `<dir>/<key>.json`.
pub struct FileBackupStore {
    dir: PathBuf,
}

impl FileBackupStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl BackupStore for FileBackupStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, key: &str, contents: &str) -> io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        write_atomic(&self.path(key), contents.as_bytes())
    }
}

/// In-memory backup store. Clones share the same entries.
#[derive(Clone, Default)]
pub struct MemoryBackupStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    writes: Rc<RefCell<usize>>,
}

impl MemoryBackupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of writes performed so far.
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl BackupStore for MemoryBackupStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, contents: &str) -> io::Result<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), contents.to_string());
        *self.writes.borrow_mut() += 1;
        Ok(())
    }
}

/// A project file on disk chosen through a save dialog.
pub struct FileSaveTarget {
    path: PathBuf,
}

impl FileSaveTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveTarget for FileSaveTarget {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn overwrite(&mut self, contents: &[u8]) -> io::Result<()> {
        write_atomic(&self.path, contents)
    }
}

/// Write to a temporary sibling, then rename over the destination.
fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut temp = path.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);
    std::fs::write(&temp, contents)?;
    std::fs::rename(&temp, path)
}

/// What happened to the save target during one save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The snapshot was written to the save target.
    Saved { target: String },
    /// No save target is granted; only the backup was written.
    BackupOnly,
    /// Writing the save target (or encoding the snapshot) failed.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SaveReport {
    pub at: DateTime<Local>,
    pub backup_ok: bool,
    pub outcome: SaveOutcome,
}

impl SaveReport {
    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, SaveOutcome::Failed { .. })
    }

    /// One-line status for display.
    pub fn message(&self) -> String {
        let time = self.at.format("%H:%M:%S");
        match (&self.outcome, self.backup_ok) {
            (SaveOutcome::Saved { target }, _) => format!("Saved to {} at {}", target, time),
            (SaveOutcome::BackupOnly, true) => format!("Backed up at {}", time),
            (SaveOutcome::BackupOnly, false) => format!("Backup failed at {}", time),
            (SaveOutcome::Failed { .. }, true) => format!("Save failed; backup retained ({})", time),
            (SaveOutcome::Failed { .. }, false) => format!("Save failed at {}", time),
        }
    }
}

struct PendingSave {
    due: Instant,
    project: Project,
}

pub struct PersistenceManager {
    delay: Duration,
    backup: Box<dyn BackupStore>,
    backup_key: String,
    target: Option<Box<dyn SaveTarget>>,
    pending: Option<PendingSave>,
    last_report: Option<SaveReport>,
}

impl PersistenceManager {
    pub fn new(backup: Box<dyn BackupStore>) -> Self {
        Self {
            delay: DEFAULT_SAVE_DELAY,
            backup,
            backup_key: DEFAULT_BACKUP_KEY.to_string(),
            target: None,
            pending: None,
            last_report: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_backup_key(mut self, key: impl Into<String>) -> Self {
        self.backup_key = key.into();
        self
    }

    /// Load the backed-up project if it exists, parses and has frames.
    pub fn recover(&self) -> Option<Project> {
        let text = match self.backup.read(&self.backup_key) {
            Ok(Some(text)) => text,
            Ok(None) => return None,
            Err(e) => {
                log::warn!("Could not read backup: {}", e);
                return None;
            }
        };
        match serialization::from_json(&text) {
            Ok(project) if !project.is_empty() => {
                log::info!("Recovered project with {} frames from backup", project.frames.len());
                Some(project)
            }
            Ok(_) => None,
            Err(e) => {
                log::warn!("Ignoring unusable backup: {}", e);
                None
            }
        }
    }

    /// Grant a save target, returning the one it replaces.
    pub fn choose_save_target(&mut self, target: Box<dyn SaveTarget>) -> Option<Box<dyn SaveTarget>> {
        log::info!("Saving to {}", target.describe());
        self.target.replace(target)
    }

    pub fn release_save_target(&mut self) -> Option<Box<dyn SaveTarget>> {
        self.target.take()
    }

    pub fn save_target(&self) -> Option<String> {
        self.target.as_ref().map(|t| t.describe())
    }

    /// Schedule a save of `project`, cancelling any pending one.
    pub fn schedule_save(&mut self, project: Project, now: Instant) {
        self.pending = Some(PendingSave {
            due: now + self.delay,
            project,
        });
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending save fires, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|p| p.due)
    }

    /// Run the pending save if its quiet period has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<SaveReport> {
        if self.pending.as_ref()?.due > now {
            return None;
        }
        let pending = self.pending.take()?;
        Some(self.save(&pending.project))
    }

    /// Run the pending save immediately, regardless of its deadline.
    pub fn flush(&mut self) -> Option<SaveReport> {
        let pending = self.pending.take()?;
        Some(self.save(&pending.project))
    }

    /// Save `project` now. A pending save is superseded and cancelled.
    pub fn save_now(&mut self, project: &Project) -> SaveReport {
        self.pending = None;
        self.save(project)
    }

    pub fn last_report(&self) -> Option<&SaveReport> {
        self.last_report.as_ref()
    }

    fn save(&mut self, project: &Project) -> SaveReport {
        let report = match serialization::to_json(project) {
            Ok(json) => {
                let backup_ok = match self.backup.write(&self.backup_key, &json) {
                    Ok(()) => true,
                    Err(e) => {
                        log::warn!("{}", PersistError::Backup(e));
                        false
                    }
                };
                let outcome = match self.target.as_mut() {
                    None => SaveOutcome::BackupOnly,
                    Some(target) => match target.overwrite(json.as_bytes()) {
                        Ok(()) => SaveOutcome::Saved {
                            target: target.describe(),
                        },
                        Err(e) => {
                            let error = PersistError::Target(e);
                            log::warn!("{}", error);
                            SaveOutcome::Failed {
                                error: error.to_string(),
                            }
                        }
                    },
                };
                SaveReport {
                    at: Local::now(),
                    backup_ok,
                    outcome,
                }
            }
            Err(e) => {
                let error = PersistError::Serialize(e);
                log::error!("{}", error);
                SaveReport {
                    at: Local::now(),
                    backup_ok: false,
                    outcome: SaveOutcome::Failed {
                        error: error.to_string(),
                    },
                }
            }
        };
        log::debug!("{}", report.message());
        self.last_report = Some(report.clone());
        report
    }

    /// Encode `project` and hand it to `sink`, independent of the debounce.
    /// Returns the suggested file name used.
    pub fn export(
        &self,
        project: &Project,
        format: Format,
        sink: &mut dyn ExportSink,
    ) -> Result<String, PersistError> {
        let text = serialization::encode(project, format)
            .map_err(|e| PersistError::Export(e.to_string()))?;
        let name = export_file_name(Local::now(), format);
        sink.deliver(text.as_bytes(), &name)
            .map_err(|e| PersistError::Export(e.to_string()))?;
        log::info!("Exported {}", name);
        Ok(name)
    }
}

/// Suggested export file name, e.g. `harborlabel-20250102-153000.json`.
pub fn export_file_name(at: DateTime<Local>, format: Format) -> String {
    format!("harborlabel-{}.{}", at.format("%Y%m%d-%H%M%S"), format.extension())
}
