//! Terminal implementations of the coordinator's capabilities.

use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, warn};

use ethereal_core::coordinator::{DisplaySurface, ScreenshotCapture, ShareTarget};
use ethereal_core::error::{ScreenshotCaptureError, ShareError};
use ethereal_core::link;

/// What the display surface is currently showing.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    pub animation: String,
    /// Path relative to the content root, e.g. `data/x.html`.
    pub content_path: String,
    /// Where the document is served by the local content server.
    pub url: String,
    /// The document exists under the content root.
    pub available: bool,
}

pub type SharedViewport = Arc<RwLock<Option<Viewport>>>;

/// Publishes the shown animation to the viewer panel and the content server.
pub struct TerminalSurface {
    content_root: PathBuf,
    base_url: String,
    viewport: SharedViewport,
}

impl TerminalSurface {
    pub fn new(content_root: PathBuf, base_url: String, viewport: SharedViewport) -> Self {
        Self {
            content_root,
            base_url,
            viewport,
        }
    }
}

impl DisplaySurface for TerminalSurface {
    fn show(&mut self, animation: &str, content_path: &str) {
        let available = self.content_root.join(content_path).is_file();
        if !available {
            warn!("display: {} missing under {}", content_path, self.content_root.display());
        }
        let next = Viewport {
            animation: animation.to_string(),
            content_path: content_path.to_string(),
            url: link::content_url(&self.base_url, animation),
            available,
        };
        match self.viewport.write() {
            Ok(mut guard) => *guard = Some(next),
            Err(e) => warn!("display: viewport lock poisoned: {}", e),
        }
    }
}

/// Preview capture from pre-rendered thumbnails at `<root>/thumbs/<id>.png`.
pub struct ThumbnailCapture {
    thumbs_dir: PathBuf,
}

impl ThumbnailCapture {
    pub fn new(content_root: &Path) -> Self {
        Self {
            thumbs_dir: content_root.join("thumbs"),
        }
    }
}

impl ScreenshotCapture for ThumbnailCapture {
    fn capture(&mut self, animation: &str) -> Result<String, ScreenshotCaptureError> {
        let path = self.thumbs_dir.join(format!("{}.png", animation));
        let bytes = std::fs::read(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ScreenshotCaptureError::Unavailable(animation.to_string()),
            _ => ScreenshotCaptureError::Failed(format!("{}: {}", path.display(), e)),
        })?;
        if bytes.is_empty() {
            return Err(ScreenshotCaptureError::Failed(format!(
                "{} is empty",
                path.display()
            )));
        }
        debug!("capture: {} ({} bytes)", path.display(), bytes.len());
        Ok(format!("data:image/png;base64,{}", STANDARD.encode(bytes)))
    }
}

/// Native share = the system clipboard.
pub struct ClipboardShare {
    clipboard: Option<arboard::Clipboard>,
}

impl ClipboardShare {
    pub fn new() -> Self {
        let clipboard = match arboard::Clipboard::new() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("share: clipboard unavailable: {}", e);
                None
            }
        };
        Self { clipboard }
    }
}

impl Default for ClipboardShare {
    fn default() -> Self {
        Self::new()
    }
}

impl ShareTarget for ClipboardShare {
    fn share(&mut self, url: &str) -> Result<(), ShareError> {
        let clipboard = self.clipboard.as_mut().ok_or(ShareError::Unsupported)?;
        clipboard
            .set_text(url.to_string())
            .map_err(|e| ShareError::Failed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_encodes_thumbnail_as_data_url() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("thumbs")).unwrap();
        std::fs::write(dir.path().join("thumbs").join("aurora.png"), [0x89, b'P', b'N', b'G']).unwrap();

        let mut capture = ThumbnailCapture::new(dir.path());
        assert_eq!(
            capture.capture("aurora").unwrap(),
            "data:image/png;base64,iVBORw=="
        );
    }

    #[test]
    fn missing_thumbnail_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut capture = ThumbnailCapture::new(dir.path());
        assert_eq!(
            capture.capture("ghost"),
            Err(ScreenshotCaptureError::Unavailable("ghost".into()))
        );
    }

    #[test]
    fn show_publishes_viewport() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data").join("a.html"), "<html></html>").unwrap();

        let viewport = SharedViewport::default();
        let mut surface = TerminalSurface::new(
            dir.path().to_path_buf(),
            "http://127.0.0.1:8990/".into(),
            viewport.clone(),
        );
        surface.show("a", "data/a.html");
        let shown = viewport.read().unwrap().clone().unwrap();
        assert_eq!(shown.url, "http://127.0.0.1:8990/data/a.html");
        assert!(shown.available);

        surface.show("b", "data/b.html");
        assert!(!viewport.read().unwrap().as_ref().unwrap().available);
    }
}
