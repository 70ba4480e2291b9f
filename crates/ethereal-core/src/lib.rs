//! Core of the ethereal viewer: catalog, credits, favorites and the
//! playback/navigation coordinator.
//!
//! Nothing in this crate touches a terminal, a window or a browser.  Every
//! outward capability (showing content, playing audio, capturing a preview,
//! sharing a link) is a trait in [`coordinator`] that a front end implements.

pub mod audio_url;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod credits;
pub mod error;
pub mod favorites;
pub mod input;
pub mod intent;
pub mod link;
pub mod platform;
