//! IPv4 frequency analysis over plain-text log files.
use regex::Regex;
use serde::Serialize;
use std::{
    collections::HashMap,
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::constants::IPV4_PATTERN;
use crate::error::HostkeepError;

/// A single address and how many times it appeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpCount {
    /// The matched address text, exactly as it appeared in the log.
    pub ip: String,
    /// Number of occurrences.
    pub count: u64,
}

/// Occurrence counts keyed by address, remembering first-seen order so that
/// equal counts rank in the order the addresses first appeared.
#[derive(Debug, Default)]
pub struct IpFrequencyTable {
    index: HashMap<String, usize>,
    entries: Vec<IpCount>,
}

impl IpFrequencyTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of `ip`.
    pub fn record(&mut self, ip: &str) {
        match self.index.get(ip) {
            Some(&slot) => self.entries[slot].count += 1,
            None => {
                self.index.insert(ip.to_string(), self.entries.len());
                self.entries.push(IpCount {
                    ip: ip.to_string(),
                    count: 1,
                });
            }
        }
    }

    /// Number of distinct addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no address has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count for a single address, if it was seen.
    pub fn count_of(&self, ip: &str) -> Option<u64> {
        self.index.get(ip).map(|&slot| self.entries[slot].count)
    }

    /// The `n` most frequent addresses, by descending count, ties by first
    /// occurrence.
    pub fn top(&self, n: usize) -> Vec<IpCount> {
        let mut ranked = self.entries.clone();
        // Stable sort keeps insertion order among equal counts.
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked.truncate(n);
        ranked
    }
}

/// Scans log files for IPv4-looking tokens and reports the most frequent ones.
pub struct LogAnalyzer {
    pattern: Regex,
    top_n: usize,
}

impl LogAnalyzer {
    /// Creates an analyzer reporting the `top_n` most frequent addresses.
    pub fn new(top_n: usize) -> Self {
        Self {
            pattern: Regex::new(IPV4_PATTERN).expect("IPv4 pattern is valid"),
            top_n,
        }
    }

    /// Number of entries the report is truncated to.
    pub fn top_n(&self) -> usize {
        self.top_n
    }

    /// Adds every match in `line` to `table`.
    pub fn scan_line(&self, line: &str, table: &mut IpFrequencyTable) {
        for found in self.pattern.find_iter(line) {
            table.record(found.as_str());
        }
    }

    /// Builds the frequency table from any buffered reader. Lines that are not
    /// valid UTF-8 are scanned lossily.
    pub fn scan_reader<R: BufRead>(&self, mut reader: R) -> io::Result<IpFrequencyTable> {
        let mut table = IpFrequencyTable::new();
        let mut buf = Vec::new();
        let mut lines = 0usize;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            lines += 1;
            self.scan_line(&String::from_utf8_lossy(&buf), &mut table);
        }

        debug!("Scanned {lines} lines, {} distinct addresses", table.len());
        Ok(table)
    }

    /// Opens `path` and builds its frequency table.
    ///
    /// A path that is missing, unreadable, or not a regular file fails with
    /// [`HostkeepError::FileNotFound`].
    pub fn scan_file(&self, path: &Path) -> Result<IpFrequencyTable, HostkeepError> {
        let not_found = || HostkeepError::FileNotFound {
            path: PathBuf::from(path),
        };

        if !path.is_file() {
            return Err(not_found());
        }

        let file = File::open(path).map_err(|err| {
            debug!("Opening {} failed: {err}", path.display());
            not_found()
        })?;

        info!("Analyzing {}", path.display());
        Ok(self.scan_reader(BufReader::new(file))?)
    }

    /// Scans `path` and returns the top entries.
    pub fn analyze(&self, path: &Path) -> Result<Vec<IpCount>, HostkeepError> {
        let table = self.scan_file(path)?;
        Ok(table.top(self.top_n))
    }
}

/// Writes the report as `<count> <ip>` lines, counts right-aligned.
pub fn write_report<W: Write>(out: &mut W, entries: &[IpCount]) -> io::Result<()> {
    for entry in entries {
        writeln!(out, "{:>7} {}", entry.count, entry.ip)?;
    }
    Ok(())
}

/// Writes the report as a JSON array of `{"ip", "count"}` objects.
pub fn write_json_report<W: Write>(
    out: &mut W,
    entries: &[IpCount],
) -> Result<(), HostkeepError> {
    serde_json::to_writer_pretty(&mut *out, entries)?;
    writeln!(out)?;
    Ok(())
}
