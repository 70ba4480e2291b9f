//! Inert surfaces for rendering and snapshot tests.

use ethereal_core::coordinator::{
    AudioSink, Coordinator, DisplaySurface, ScreenshotCapture, ShareTarget, Surfaces,
};
use ethereal_core::error::{ScreenshotCaptureError, ShareError};
use ethereal_core::favorites::FavoritesStore;

pub struct Null;

impl DisplaySurface for Null {
    fn show(&mut self, _animation: &str, _content_path: &str) {}
}

impl AudioSink for Null {
    fn set_source(&mut self, _url: &str) {}
    fn clear(&mut self) {}
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn resume(&mut self) {}
}

impl ScreenshotCapture for Null {
    fn capture(&mut self, animation: &str) -> Result<String, ScreenshotCaptureError> {
        Err(ScreenshotCaptureError::Unavailable(animation.into()))
    }
}

impl ShareTarget for Null {
    fn share(&mut self, _url: &str) -> Result<(), ShareError> {
        Err(ShareError::Unsupported)
    }
}

pub fn null_surfaces() -> Surfaces {
    Surfaces {
        display: Box::new(Null),
        audio: Box::new(Null),
        capture: Box::new(Null),
        share: Box::new(Null),
    }
}

pub fn coordinator() -> Coordinator {
    Coordinator::new(
        FavoritesStore::in_memory(),
        null_surfaces(),
        "http://127.0.0.1:8990/",
    )
}
