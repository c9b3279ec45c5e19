//! Append-only record store (CSV log of threat records).
//!
//! The whole log is indexed by `Clean_URL` when the store is opened. A missing
//! file is an empty store; a file with a foreign header or a short/unparsable
//! row fails the open, since there is no way to repair the log in place.
//! Appends never rewrite existing rows and are fsynced before returning.

mod record;

pub use record::{ThreatRecord, HEADER};

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::url_model::CanonicalUrl;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("open record store {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("record store {}: unexpected header {found:?}", .path.display())]
    Header { path: PathBuf, found: Vec<String> },
    #[error("record store {} line {line}: {reason}", .path.display())]
    Malformed {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("write record store {}: {reason}", .path.display())]
    Write { path: PathBuf, reason: String },
}

/// Single-writer handle over the log plus its in-memory key index.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    index: HashSet<CanonicalUrl>,
    /// Whether the log on disk already starts with `HEADER`.
    has_header: bool,
}

impl RecordStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("no record store at {}; starting empty", path.display());
                return Ok(Self {
                    path,
                    index: HashSet::new(),
                    has_header: false,
                });
            }
            Err(e) => return Err(StoreError::Open { path, source: e }),
        };
        let (index, has_header) = load_index(&path, file)?;
        tracing::info!(records = index.len(), "loaded record store {}", path.display());
        Ok(Self {
            path,
            index,
            has_header,
        })
    }

    pub fn exists(&self, url: &CanonicalUrl) -> bool {
        self.index.contains(url)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Appends every record whose URL is not yet present; returns how many were written.
    ///
    /// Duplicates (against the log or earlier in the same batch) are skipped
    /// silently. The header is written first when the log has none yet.
    pub fn append(&mut self, records: &[ThreatRecord]) -> Result<usize, StoreError> {
        let mut batch = HashSet::new();
        let fresh: Vec<&ThreatRecord> = records
            .iter()
            .filter(|r| {
                let new = !self.index.contains(&r.clean_url) && batch.insert(r.clean_url.clone());
                if !new {
                    tracing::debug!(url = %r.clean_url, "already stored; skipping");
                }
                new
            })
            .collect();
        if fresh.is_empty() {
            return Ok(0);
        }

        self.write_rows(&fresh)?;
        for r in &fresh {
            self.index.insert(r.clean_url.clone());
        }
        tracing::info!(written = fresh.len(), total = self.index.len(), "appended to record store");
        Ok(fresh.len())
    }

    fn write_rows(&mut self, rows: &[&ThreatRecord]) -> Result<(), StoreError> {
        let fail = |reason: String| StoreError::Write {
            path: self.path.clone(),
            reason,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| fail(format!("create dir {}: {}", parent.display(), e)))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| fail(e.to_string()))?;
        let len = file.metadata().map_err(|e| fail(e.to_string()))?.len();
        if !self.has_header && len > 0 {
            // Headerless log holds nothing but blank lines.
            file.set_len(0).map_err(|e| fail(format!("truncate: {}", e)))?;
        } else if len > 0 && !ends_with_newline(&mut file).map_err(|e| fail(e.to_string()))? {
            file.write_all(b"\n").map_err(|e| fail(e.to_string()))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if !self.has_header {
            writer.write_record(HEADER).map_err(|e| fail(e.to_string()))?;
        }
        for row in rows {
            writer.serialize(row).map_err(|e| fail(e.to_string()))?;
        }
        writer.flush().map_err(|e| fail(e.to_string()))?;
        let file = writer
            .into_inner()
            .map_err(|e| fail(e.error().to_string()))?;
        file.sync_all().map_err(|e| fail(format!("sync: {}", e)))?;
        self.has_header = true;
        Ok(())
    }
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))?;
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn load_index(path: &Path, file: File) -> Result<(HashSet<CanonicalUrl>, bool), StoreError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(file);
    let headers = reader.headers().map_err(|e| malformed(path, &e))?.clone();
    if headers.is_empty() {
        // Empty or blank file left by an interrupted first write; header comes with the next append.
        return Ok((HashSet::new(), false));
    }
    if headers.iter().ne(HEADER.iter().copied()) {
        return Err(StoreError::Header {
            path: path.to_path_buf(),
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    let mut index = HashSet::new();
    for row in reader.deserialize::<ThreatRecord>() {
        let record = row.map_err(|e| malformed(path, &e))?;
        index.insert(record.clean_url);
    }
    Ok((index, true))
}

fn malformed(path: &Path, err: &csv::Error) -> StoreError {
    StoreError::Malformed {
        path: path.to_path_buf(),
        line: err.position().map(|p| p.line()).unwrap_or(0),
        reason: err.to_string(),
    }
}
