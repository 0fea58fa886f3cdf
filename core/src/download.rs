//! Download destinations and the file-writing side of a download.
//!
//! # Design
//! `prepare` enforces the destination policy before any bytes are requested,
//! so a refused overwrite never costs a round-trip. `write_from` owns the file
//! handle for the whole transfer: the data is synced before success is
//! reported, and a file left behind by a failed transfer is removed.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::ClientError;
use crate::http::Headers;
use crate::transport;

const CHUNK_SIZE: usize = 64 * 1024;

/// Where a download is written and what is allowed on the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub path: PathBuf,
    pub overwrite_existing: bool,
    pub create_intermediate_directories: bool,
}

impl Destination {
    /// Fail if the file exists; require the parent directory to exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            overwrite_existing: false,
            create_intermediate_directories: false,
        }
    }

    pub fn overwrite_existing(mut self, yes: bool) -> Self {
        self.overwrite_existing = yes;
        self
    }

    pub fn create_intermediate_directories(mut self, yes: bool) -> Self {
        self.create_intermediate_directories = yes;
        self
    }

    /// Check the policy flags against the filesystem and create missing
    /// parent directories when allowed.
    pub fn prepare(&self) -> Result<(), ClientError> {
        if self.path.is_dir() {
            return Err(ClientError::fs(
                &self.path,
                io::Error::new(io::ErrorKind::InvalidInput, "destination is a directory"),
            ));
        }
        if self.path.exists() && !self.overwrite_existing {
            return Err(ClientError::fs(
                &self.path,
                io::Error::new(io::ErrorKind::AlreadyExists, "destination already exists"),
            ));
        }
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => return Ok(()),
        };
        if parent.is_dir() {
            return Ok(());
        }
        if !self.create_intermediate_directories {
            return Err(ClientError::fs(
                parent,
                io::Error::new(io::ErrorKind::NotFound, "parent directory does not exist"),
            ));
        }
        fs::create_dir_all(parent).map_err(|e| ClientError::fs(parent, e))
    }

    /// Stream `reader` into the destination and return the number of bytes
    /// written. When `expected_len` is known, a short or long transfer is a
    /// failure.
    pub fn write_from(&self, reader: &mut dyn Read, expected_len: Option<u64>) -> Result<u64, ClientError> {
        let mut options = OpenOptions::new();
        options.write(true);
        if self.overwrite_existing {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let mut file = options.open(&self.path).map_err(|e| ClientError::fs(&self.path, e))?;

        let result = copy_to_file(reader, &mut file, &self.path, expected_len);
        drop(file);
        if result.is_err() {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::debug!(path = %self.path.display(), error = %e, "failed to remove partial download");
            }
        }
        result
    }
}

fn copy_to_file(
    reader: &mut dyn Read,
    file: &mut File,
    path: &Path,
    expected_len: Option<u64>,
) -> Result<u64, ClientError> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(read_error(e)),
        };
        file.write_all(&buf[..n]).map_err(|e| ClientError::fs(path, e))?;
        written += n as u64;
    }
    file.sync_all().map_err(|e| ClientError::fs(path, e))?;

    match expected_len {
        Some(expected) if expected != written => Err(ClientError::Network(format!(
            "transfer ended after {written} of {expected} bytes"
        ))),
        _ => Ok(written),
    }
}

/// Errors surfacing from the response body reader are transport failures.
/// ureq wraps its own errors in `io::Error`, so unwrap those first.
fn read_error(e: io::Error) -> ClientError {
    match e.downcast::<ureq::Error>() {
        Ok(inner) => transport::classify(inner),
        Err(e) if e.kind() == io::ErrorKind::TimedOut => ClientError::Timeout,
        Err(e) => ClientError::Network(e.to_string()),
    }
}

/// Where a completed download ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutput {
    Memory(Vec<u8>),
    File { path: PathBuf, bytes_written: u64 },
}

#[derive(Debug, Clone)]
pub struct Download {
    pub status: u16,
    pub headers: Headers,
    pub output: DownloadOutput,
}

impl Download {
    /// The buffered body, for in-memory downloads.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.output {
            DownloadOutput::Memory(bytes) => Some(bytes),
            DownloadOutput::File { .. } => None,
        }
    }

    /// The written file, for downloads to a destination.
    pub fn file_path(&self) -> Option<&Path> {
        match &self.output {
            DownloadOutput::File { path, .. } => Some(path),
            DownloadOutput::Memory(_) => None,
        }
    }

    pub fn content_length(&self) -> Option<u64> {
        self.headers.get("content-length").and_then(|v| v.trim().parse().ok())
    }
}
