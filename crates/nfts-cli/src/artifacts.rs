//! Per-unit debug files.
//!
//! File names follow the layout other NFTS signers write, so two debug
//! directories can be compared with `nfts compare`:
//! `canonical_NFTS_{i}.bin`, `canonical_NFTS_{i}.txt`, `hash_NFTS_{i}.bin`,
//! `signature_NFTS_{i}.bin` and `signature_NFTS_{i}.b64`.

use nfts_canonical::Digest;
use nfts_core::Signature;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Bytes shown on each side of the first differing offset.
const WINDOW_BEFORE: usize = 5;
const WINDOW_AFTER: usize = 6;

pub fn canonical_file(unit: usize) -> String {
    format!("canonical_NFTS_{unit}.bin")
}

pub fn hash_file(unit: usize) -> String {
    format!("hash_NFTS_{unit}.bin")
}

pub fn signature_file(unit: usize) -> String {
    format!("signature_NFTS_{unit}.bin")
}

/// Writer for one debug directory.
#[derive(Debug, Clone)]
pub struct DebugArtifacts {
    dir: PathBuf,
}

impl DebugArtifacts {
    /// Creates the directory if needed.
    pub fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Canonical bytes, as binary and as text, plus their raw SHA-1.
    pub fn write_canonical(&self, unit: usize, canonical: &[u8]) -> io::Result<()> {
        fs::write(self.dir.join(canonical_file(unit)), canonical)?;
        fs::write(
            self.dir.join(format!("canonical_NFTS_{unit}.txt")),
            String::from_utf8_lossy(canonical).as_bytes(),
        )?;
        let hash = Digest::sha1(canonical)
            .to_bytes()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(self.dir.join(hash_file(unit)), hash)
    }

    pub fn write_signature(&self, unit: usize, signature: &Signature) -> io::Result<()> {
        fs::write(self.dir.join(signature_file(unit)), &signature.raw)?;
        fs::write(
            self.dir.join(format!("signature_NFTS_{unit}.b64")),
            signature.encoded.as_bytes(),
        )
    }
}

/// Result of comparing the same artifact from two directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileComparison {
    /// The file does not exist on one side.
    Missing(PathBuf),
    Equal {
        len: usize,
    },
    Different {
        len_a: usize,
        len_b: usize,
        /// First differing offset; the shorter length when one is a prefix.
        offset: usize,
        window_start: usize,
        window_a: String,
        window_b: String,
    },
}

impl FileComparison {
    pub fn is_equal(&self) -> bool {
        matches!(self, FileComparison::Equal { .. })
    }
}

pub fn compare_files(a: &Path, b: &Path) -> io::Result<FileComparison> {
    for path in [a, b] {
        if !path.exists() {
            return Ok(FileComparison::Missing(path.to_path_buf()));
        }
    }
    Ok(compare_bytes(&fs::read(a)?, &fs::read(b)?))
}

pub fn compare_bytes(a: &[u8], b: &[u8]) -> FileComparison {
    if a == b {
        return FileComparison::Equal { len: a.len() };
    }
    let min_len = a.len().min(b.len());
    let offset = a
        .iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .unwrap_or(min_len);
    let window_start = offset.saturating_sub(WINDOW_BEFORE);
    let window_end = (offset + WINDOW_AFTER).min(min_len);
    FileComparison::Different {
        len_a: a.len(),
        len_b: b.len(),
        offset,
        window_start,
        window_a: hex::encode(&a[window_start..window_end]),
        window_b: hex::encode(&b[window_start..window_end]),
    }
}
