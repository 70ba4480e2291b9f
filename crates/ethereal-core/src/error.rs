//! Error taxonomy.
//!
//! Only `CatalogLoadError` is fatal (the viewer renders it and stops there).
//! Everything else is absorbed by the coordinator with a degraded fallback.

use std::path::PathBuf;

use thiserror::Error;

/// The manifest could not be fetched or parsed.
#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch manifest {url}: {message}")]
    Fetch { url: String, message: String },
    #[error("malformed manifest: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("manifest lists no animations")]
    Empty,
}

/// A music identifier could not be turned into a playable URL.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MusicResolutionError {
    #[error("audio storage is not configured (missing {0})")]
    NotConfigured(&'static str),
    #[error("audio lookup for {music} failed: {message}")]
    Lookup { music: String, message: String },
}

/// The display surface could not produce a preview image.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScreenshotCaptureError {
    #[error("no preview available for {0}")]
    Unavailable(String),
    #[error("preview capture failed: {0}")]
    Failed(String),
}

/// No native share capability could take the link.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShareError {
    #[error("sharing is not supported here")]
    Unsupported,
    #[error("share failed: {0}")]
    Failed(String),
}

/// The favorites slot could not be written.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write favorites to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode favorites: {0}")]
    Encode(#[from] serde_json::Error),
}
