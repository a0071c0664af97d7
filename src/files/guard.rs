//! Traversal-guarded filesystem root.
//!
//! # Responsibilities
//! - Turn an untrusted URL sub-path into a path under the root
//! - Report whether that path is missing, a directory, or a file
//! - Resolve directories to their `index.html` for directory routes
//!
//! # Design Decisions
//! - Lexical clean first (`..` pops, clamped at the root), then an explicit
//!   "root is a prefix" check before touching the filesystem
//! - Files are re-checked after canonicalization so symlinks cannot escape
//! - Directory listings are never produced

use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

pub const INDEX_FILE: &str = "index.html";

/// Error resolving a path under a guarded root.
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("path {0:?} is not a valid file path")]
    InvalidPath(String),

    #[error("path {0:?} escapes the root")]
    Traversal(String),

    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

/// What the resolved path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Missing,
    Directory,
    File,
}

/// A sub-path resolved against a guarded root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticFileRequest {
    pub path: PathBuf,
    pub kind: FileKind,
}

/// A directory that untrusted paths are resolved under.
#[derive(Debug, Clone)]
pub struct GuardedRoot {
    root: PathBuf,
}

impl GuardedRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lexically join a URL sub-path onto the root.
    pub fn join(&self, sub_path: &str) -> Result<PathBuf, FsError> {
        let decoded = percent_decode_str(sub_path)
            .decode_utf8()
            .map_err(|_| FsError::InvalidPath(sub_path.to_string()))?;

        let mut segments: Vec<&str> = Vec::new();
        for segment in decoded.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                s if s.contains('\\') || s.contains('\0') => {
                    return Err(FsError::InvalidPath(sub_path.to_string()));
                }
                s => segments.push(s),
            }
        }

        let mut path = self.root.clone();
        path.extend(&segments);

        if !path.starts_with(&self.root) {
            return Err(FsError::Traversal(sub_path.to_string()));
        }
        Ok(path)
    }

    /// Resolve a sub-path and stat it.
    pub async fn resolve(&self, sub_path: &str) -> Result<StaticFileRequest, FsError> {
        let path = self.join(sub_path)?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok(StaticFileRequest { path, kind: FileKind::Missing });
            }
            Err(source) => return Err(FsError::Io { path, source }),
        };

        if metadata.is_dir() {
            return Ok(StaticFileRequest { path, kind: FileKind::Directory });
        }

        self.ensure_contained(&path, sub_path).await?;
        Ok(StaticFileRequest { path, kind: FileKind::File })
    }

    /// Resolve a sub-path to a servable file. Directories resolve to their
    /// `index.html`; a directory without one is not found.
    pub async fn open(&self, sub_path: &str) -> Result<PathBuf, FsError> {
        let resolved = self.resolve(sub_path).await?;
        match resolved.kind {
            FileKind::File => Ok(resolved.path),
            FileKind::Missing => Err(FsError::NotFound(resolved.path)),
            FileKind::Directory => {
                let index = resolved.path.join(INDEX_FILE);
                match tokio::fs::metadata(&index).await {
                    Ok(metadata) if metadata.is_file() => {
                        self.ensure_contained(&index, sub_path).await?;
                        Ok(index)
                    }
                    _ => Err(FsError::NotFound(index)),
                }
            }
        }
    }

    async fn ensure_contained(&self, path: &Path, sub_path: &str) -> Result<(), FsError> {
        let root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|source| FsError::Io { path: self.root.clone(), source })?;
        let target = tokio::fs::canonicalize(path)
            .await
            .map_err(|source| FsError::Io { path: path.to_path_buf(), source })?;

        if target.starts_with(&root) {
            Ok(())
        } else {
            tracing::warn!(
                requested = %sub_path,
                resolved = %target.display(),
                "Path traversal attempt blocked"
            );
            Err(FsError::Traversal(sub_path.to_string()))
        }
    }
}
