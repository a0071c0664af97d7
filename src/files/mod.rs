//! Guarded file serving.
//!
//! # Data Flow
//! ```text
//! wildcard capture (untrusted)
//!     → guard.rs (decode, clean, prefix check, stat, canonical check)
//!     → serve.rs (404 page for missing/dirs, hotlink guard, file bytes)
//! ```

pub mod guard;
pub mod serve;

use std::path::PathBuf;

use crate::config::StaticFilesConfig;

pub use guard::{FileKind, FsError, GuardedRoot, StaticFileRequest};

/// Settings of the hotlink-guarded static asset handler.
#[derive(Debug, Clone)]
pub struct StaticSite {
    pub root: GuardedRoot,
    pub not_found_page: PathBuf,
    pub rejected_path: String,
    pub allow_missing_referer: bool,
}

impl StaticSite {
    pub fn from_config(config: &StaticFilesConfig) -> Self {
        Self {
            root: GuardedRoot::new(config.root.clone()),
            not_found_page: config.not_found_page.clone(),
            rejected_path: config.rejected_path.clone(),
            allow_missing_referer: config.allow_missing_referer,
        }
    }
}
