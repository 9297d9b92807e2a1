//! Extension-filtered backups into timestamped directories.
use chrono::{DateTime, Local};
use serde::Serialize;
use std::{
    collections::BTreeSet,
    fs,
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

use crate::constants::BACKUP_TIMESTAMP_FORMAT;
use crate::error::HostkeepError;

/// Set of file extensions a backup collects, compared case-sensitively
/// against the final extension of each file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionFilter(BTreeSet<String>);

impl ExtensionFilter {
    /// Parses a comma-separated list such as `txt,py` or `.txt, .py`.
    pub fn parse(list: &str) -> Result<Self, HostkeepError> {
        let extensions: BTreeSet<String> = list
            .split(',')
            .map(|item| item.trim().trim_start_matches('.'))
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();

        if extensions.is_empty() {
            return Err(HostkeepError::EmptyExtensionSet);
        }
        Ok(Self(extensions))
    }

    /// Whether `path` ends in one of the extensions.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.0.contains(ext))
    }

    /// The extensions, sorted.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// Source files selected at scan time, sorted by path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BackupManifest {
    /// Matching files, in copy order.
    pub files: Vec<PathBuf>,
}

/// Outcome of a completed backup run.
#[derive(Debug, Clone, Serialize)]
pub struct BackupReport {
    /// Directory the files were copied into.
    pub destination: PathBuf,
    /// Source files copied.
    pub copied: Vec<PathBuf>,
    /// Source files that disappeared before they could be copied.
    pub skipped: Vec<PathBuf>,
    /// Source files that could not be copied for any other reason.
    pub failed: Vec<PathBuf>,
}

impl BackupReport {
    /// Error to exit with when some copies failed.
    pub fn into_result(self) -> Result<Self, HostkeepError> {
        if self.failed.is_empty() {
            Ok(self)
        } else {
            Err(HostkeepError::BackupIncomplete {
                failed: self.failed.len(),
            })
        }
    }
}

/// Copies every file under a source root whose extension matches into a new
/// `<prefix>_<YYYYmmdd_HHMMSS>` directory.
#[derive(Debug, Clone)]
pub struct BackupCollector {
    source: PathBuf,
    filter: ExtensionFilter,
    destination_root: PathBuf,
    prefix: String,
}

impl BackupCollector {
    /// Creates a collector for `source`, placing backups under `destination_root`.
    pub fn new(
        source: impl Into<PathBuf>,
        filter: ExtensionFilter,
        destination_root: impl Into<PathBuf>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            filter,
            destination_root: destination_root.into(),
            prefix: prefix.into(),
        }
    }

    /// Destination directory for a run started at `at`.
    pub fn destination_for(&self, at: DateTime<Local>) -> PathBuf {
        self.destination_root.join(format!(
            "{}_{}",
            self.prefix,
            at.format(BACKUP_TIMESTAMP_FORMAT)
        ))
    }

    /// Creates the destination and any missing parents. The destination itself
    /// must not exist yet, so a directory is never shared between runs.
    pub fn create_destination(&self, at: DateTime<Local>) -> Result<PathBuf, HostkeepError> {
        let destination = self.destination_for(at);
        let create_error = |source| HostkeepError::DirectoryCreate {
            path: destination.clone(),
            source,
        };

        fs::create_dir_all(&self.destination_root).map_err(create_error)?;
        fs::create_dir(&destination).map_err(create_error)?;

        debug!("Created backup directory {}", destination.display());
        Ok(destination)
    }

    /// Walks the source root and collects matching files, never descending
    /// into `exclude`.
    pub fn scan(&self, exclude: Option<&Path>) -> io::Result<BackupManifest> {
        let exclude = exclude.and_then(|path| path.canonicalize().ok());
        let mut files = Vec::new();
        self.walk(&self.source, exclude.as_deref(), &mut files, true)?;
        files.sort();
        Ok(BackupManifest { files })
    }

    fn walk(
        &self,
        dir: &Path,
        exclude: Option<&Path>,
        files: &mut Vec<PathBuf>,
        is_root: bool,
    ) -> io::Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if !is_root && err.kind() == ErrorKind::NotFound => {
                debug!("Directory {} vanished during scan", dir.display());
                return Ok(());
            }
            Err(err) => return Err(err),
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("Skipping unreadable entry in {}: {err}", dir.display());
                    continue;
                }
            };
            let path = entry.path();
            let Ok(file_type) = entry.file_type() else {
                continue;
            };

            if file_type.is_dir() {
                if exclude.is_some_and(|ex| path.canonicalize().is_ok_and(|p| p == ex)) {
                    debug!("Not descending into backup destination {}", path.display());
                    continue;
                }
                if let Err(err) = self.walk(&path, exclude, files, false) {
                    warn!("Skipping directory {}: {err}", path.display());
                }
            } else if (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
                && self.filter.matches(&path)
            {
                files.push(path);
            }
        }

        Ok(())
    }

    /// Runs a backup stamped with the current local time.
    pub fn run(&self) -> Result<BackupReport, HostkeepError> {
        self.run_at(Local::now())
    }

    /// Runs a backup stamped with `at`.
    ///
    /// The destination is created before anything is copied. Files that
    /// vanish between scan and copy are skipped; when two sources share a
    /// file name the one copied last wins.
    pub fn run_at(&self, at: DateTime<Local>) -> Result<BackupReport, HostkeepError> {
        if !self.source.is_dir() {
            return Err(HostkeepError::SourceNotDirectory(self.source.clone()));
        }

        let destination = self.create_destination(at)?;
        let manifest = self.scan(Some(&destination))?;
        info!(
            "Copying {} file(s) from {} to {}",
            manifest.files.len(),
            self.source.display(),
            destination.display()
        );

        Ok(self.copy_into(manifest, destination))
    }

    /// Copies every manifest entry into `destination`, preserving base names.
    pub fn copy_into(&self, manifest: BackupManifest, destination: PathBuf) -> BackupReport {
        let mut report = BackupReport {
            destination,
            copied: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        };

        for source in manifest.files {
            let Some(name) = source.file_name() else {
                continue;
            };
            let target = report.destination.join(name);

            match replace_file(&source, &target) {
                Ok(bytes) => {
                    debug!("Copied {} ({bytes} bytes)", source.display());
                    report.copied.push(source);
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    warn!("Source vanished before copy, skipping: {}", source.display());
                    report.skipped.push(source);
                }
                Err(err) => {
                    warn!("Failed to copy {}: {err}", source.display());
                    report.failed.push(source);
                }
            }
        }

        report
    }
}

/// Copies `source` next to `target` and renames it into place.
///
/// `fs::copy` carries the source's permission bits, so an earlier read-only
/// copy cannot be written over; the rename replaces it regardless. A source
/// that vanished leaves any existing `target` untouched.
fn replace_file(source: &Path, target: &Path) -> io::Result<u64> {
    let Some(name) = target.file_name() else {
        return fs::copy(source, target);
    };
    let mut partial_name = std::ffi::OsString::from(".");
    partial_name.push(name);
    partial_name.push(".partial");
    let partial = target.with_file_name(partial_name);

    let bytes = match fs::copy(source, &partial) {
        Ok(bytes) => bytes,
        Err(err) => {
            let _ = fs::remove_file(&partial);
            return Err(err);
        }
    };

    if target.exists() {
        debug!("Overwriting {} with {}", target.display(), source.display());
    }
    if let Err(err) = fs::rename(&partial, target) {
        let _ = fs::remove_file(&partial);
        return Err(err);
    }
    Ok(bytes)
}

/// Writes the destination path followed by a one-line summary.
pub fn write_report<W: Write>(out: &mut W, report: &BackupReport) -> io::Result<()> {
    writeln!(out, "Backup directory: {}", report.destination.display())?;
    writeln!(
        out,
        "Copied {} file(s), skipped {} vanished, {} failed",
        report.copied.len(),
        report.skipped.len(),
        report.failed.len()
    )
}
