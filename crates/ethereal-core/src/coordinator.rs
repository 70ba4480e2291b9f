//! Coordinator — single owner of the viewer state.
//!
//! ```text
//!   Loading ──catalog ok──▶ Ready ◀──▶ { About | Favorites | Share }
//!      │
//!      └──catalog err──▶ Failed
//! ```
//!
//! The coordinator consumes [`Intent`]s and drives the injected surfaces.  It
//! never awaits: work that has to leave the event loop (music resolution) is
//! returned as an [`Effect`] and its result is fed back through
//! [`Coordinator::on_music_resolved`].
//!
//! Every `load_current` bumps a generation token.  A music result is applied
//! only if it carries the latest token, so when two loads race the most recent
//! navigation wins regardless of which lookup finishes last.

use rand::Rng;
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;
use crate::credits::{CreditLookup, CreditResolver};
use crate::error::{CatalogLoadError, MusicResolutionError, ScreenshotCaptureError, ShareError};
use crate::favorites::{FavoriteEntry, FavoritesStore};
use crate::intent::{Intent, Overlay};
use crate::link;

// ── Capabilities ──────────────────────────────────────────────────────────────

/// The surface the current animation is rendered on.
pub trait DisplaySurface {
    fn show(&mut self, animation: &str, content_path: &str);
}

/// Looping background audio.
pub trait AudioSink {
    /// Swap the source and prepare it without starting playback.
    fn set_source(&mut self, url: &str);
    /// Stop playback and drop the source.
    fn clear(&mut self);
    fn play(&mut self);
    fn pause(&mut self);
    /// Resume only if a source is set and playback was paused.
    fn resume(&mut self);
}

/// Best-effort preview of the display surface.
pub trait ScreenshotCapture {
    /// Returns the preview as a `data:` URL.
    fn capture(&mut self, animation: &str) -> Result<String, ScreenshotCaptureError>;
}

/// Native share capability.
pub trait ShareTarget {
    fn share(&mut self, url: &str) -> Result<(), ShareError>;
}

/// Everything the coordinator drives.
pub struct Surfaces {
    pub display: Box<dyn DisplaySurface>,
    pub audio: Box<dyn AudioSink>,
    pub capture: Box<dyn ScreenshotCapture>,
    pub share: Box<dyn ShareTarget>,
}

// ── State / effects ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Loading,
    Ready,
    /// The catalog could not be loaded; the message is shown as-is.
    Failed(String),
}

/// Content of the about panel for one animation.
#[derive(Debug, Clone, PartialEq)]
pub struct AboutView {
    pub animation: String,
    pub filename: String,
    pub credit: CreditLookup,
}

/// A music lookup the host has to run, tagged with the load generation.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicRequest {
    pub token: u64,
    pub music: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
}

/// Short user-facing message about an absorbed failure or a completed action.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Work handed back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ResolveMusic(MusicRequest),
    Notice(Notice),
}

// ── Coordinator ───────────────────────────────────────────────────────────────

pub struct Coordinator {
    phase: Phase,
    catalog: Option<Catalog>,
    index: usize,
    overlay: Overlay,
    /// A user gesture has been seen; audio may start.
    interacted: bool,
    hidden: bool,
    /// The audio sink holds a resolved source for the current animation.
    music_ready: bool,
    favorited: bool,
    generation: u64,
    about: Option<AboutView>,
    share_link: Option<String>,
    share_base: String,
    favorites: FavoritesStore,
    surfaces: Surfaces,
}

impl Coordinator {
    pub fn new(favorites: FavoritesStore, surfaces: Surfaces, share_base: impl Into<String>) -> Self {
        Self {
            phase: Phase::Loading,
            catalog: None,
            index: 0,
            overlay: Overlay::None,
            interacted: false,
            hidden: false,
            music_ready: false,
            favorited: false,
            generation: 0,
            about: None,
            share_link: None,
            share_base: share_base.into(),
            favorites,
            surfaces,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    pub fn current(&self) -> Option<&str> {
        self.catalog.as_ref()?.get(self.index)
    }

    pub fn current_music(&self) -> Option<&str> {
        let catalog = self.catalog.as_ref()?;
        catalog.music_for(catalog.get(self.index)?)
    }

    pub fn is_favorited(&self) -> bool {
        self.favorited
    }

    /// Text of the favorite toggle for the current animation.
    pub fn favorite_label(&self) -> &'static str {
        if self.favorited {
            "Unfavorite"
        } else {
            "Favorite"
        }
    }

    pub fn favorites(&self) -> Vec<FavoriteEntry> {
        self.favorites.list()
    }

    pub fn about(&self) -> Option<&AboutView> {
        self.about.as_ref()
    }

    pub fn share_link(&self) -> Option<&str> {
        self.share_link.as_deref()
    }

    pub fn has_interacted(&self) -> bool {
        self.interacted
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn music_ready(&self) -> bool {
        self.music_ready
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Credit for the current animation's music.
    pub fn current_credit(&self) -> CreditLookup {
        match &self.catalog {
            Some(catalog) => CreditResolver::new(catalog.credits()).resolve(self.current_music()),
            None => CreditLookup::NoMusic,
        }
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    /// Leave `Loading`.  On success the deep-linked animation (if present in
    /// the catalog) becomes current and is loaded.
    pub fn on_catalog_loaded(
        &mut self,
        result: Result<Catalog, CatalogLoadError>,
        deep_link: Option<&str>,
    ) -> Vec<Effect> {
        match result {
            Ok(catalog) => {
                self.index = catalog.initial_position(deep_link);
                if let Some(wanted) = deep_link {
                    if !catalog.contains(wanted) {
                        warn!("coordinator: deep link {:?} not in catalog", wanted);
                    }
                }
                self.catalog = Some(catalog);
                self.phase = Phase::Ready;
                info!("coordinator: ready at index {}", self.index);
                self.load_current()
            }
            Err(e) => {
                error!("coordinator: catalog load failed: {}", e);
                self.phase = Phase::Failed(e.to_string());
                Vec::new()
            }
        }
    }

    // ── Dispatch ──────────────────────────────────────────────────────────────

    pub fn dispatch(&mut self, intent: Intent) -> Vec<Effect> {
        if self.phase != Phase::Ready {
            match intent {
                Intent::Interact => self.record_interaction(),
                Intent::VisibilityChanged { hidden } => self.set_hidden(hidden),
                other => debug!("coordinator: ignoring {:?} in {:?}", other, self.phase),
            }
            return Vec::new();
        }
        if intent.is_navigation() && self.overlay.is_open() {
            debug!("coordinator: {:?} suppressed by {:?}", intent, self.overlay);
            return Vec::new();
        }

        match intent {
            Intent::Next => self.next(),
            Intent::Previous => self.previous(),
            Intent::Random => self.random(),
            Intent::GoTo(animation) => self.go_to(&animation),
            Intent::ToggleFavorite => self.toggle_favorite(),
            Intent::RemoveFavorite(animation) => self.remove_favorite(&animation),
            Intent::ShowAbout => {
                self.show_about();
                Vec::new()
            }
            Intent::HideAbout => {
                self.hide_overlay(Overlay::About);
                Vec::new()
            }
            Intent::ShowFavorites => {
                self.overlay = Overlay::Favorites;
                Vec::new()
            }
            Intent::HideFavorites => {
                self.hide_overlay(Overlay::Favorites);
                Vec::new()
            }
            Intent::Share => self.share(),
            Intent::ShowShare => {
                self.show_share();
                Vec::new()
            }
            Intent::HideShare => {
                self.hide_overlay(Overlay::Share);
                Vec::new()
            }
            Intent::CloseOverlay => {
                self.close_overlay();
                Vec::new()
            }
            Intent::Interact => {
                self.record_interaction();
                Vec::new()
            }
            Intent::VisibilityChanged { hidden } => {
                self.set_hidden(hidden);
                Vec::new()
            }
        }
    }

    // ── Navigation ────────────────────────────────────────────────────────────

    fn len(&self) -> usize {
        self.catalog.as_ref().map_or(0, Catalog::len)
    }

    pub fn next(&mut self) -> Vec<Effect> {
        let len = self.len();
        if len == 0 {
            return Vec::new();
        }
        self.index = (self.index + 1) % len;
        self.load_current()
    }

    pub fn previous(&mut self) -> Vec<Effect> {
        let len = self.len();
        if len == 0 {
            return Vec::new();
        }
        self.index = (self.index + len - 1) % len;
        self.load_current()
    }

    pub fn random(&mut self) -> Vec<Effect> {
        let len = self.len();
        if len == 0 {
            return Vec::new();
        }
        self.index = rand::thread_rng().gen_range(0..len);
        self.load_current()
    }

    /// Jump to `animation`.  Unknown identifiers leave the position alone.
    pub fn go_to(&mut self, animation: &str) -> Vec<Effect> {
        match self.catalog.as_ref().and_then(|c| c.position_of(animation)) {
            Some(index) => {
                self.index = index;
                self.load_current()
            }
            None => {
                warn!("coordinator: go_to unknown animation {:?}", animation);
                vec![Effect::Notice(Notice::new(
                    NoticeLevel::Warning,
                    format!("{} is not in the catalog", animation),
                ))]
            }
        }
    }

    /// Show the current animation, rebind its music and refresh everything
    /// that depends on the current position.
    pub fn load_current(&mut self) -> Vec<Effect> {
        let Some(animation) = self.current().map(str::to_string) else {
            return Vec::new();
        };
        self.generation += 1;
        debug!(
            "coordinator: load {} (index {}, generation {})",
            animation, self.index, self.generation
        );

        self.surfaces
            .display
            .show(&animation, &link::content_path(&animation));
        self.favorited = self.favorites.contains(&animation);
        if self.overlay == Overlay::About {
            self.about = Some(self.about_for(&animation));
        }

        match self.current_music().map(str::to_string) {
            Some(music) => vec![Effect::ResolveMusic(MusicRequest {
                token: self.generation,
                music,
            })],
            None => {
                self.surfaces.audio.clear();
                self.music_ready = false;
                Vec::new()
            }
        }
    }

    /// Apply a music lookup.  Results from superseded loads are dropped.
    /// Returns whether the result was applied.
    pub fn on_music_resolved(
        &mut self,
        token: u64,
        result: Result<String, MusicResolutionError>,
    ) -> bool {
        if token != self.generation {
            debug!(
                "coordinator: dropping stale music result (token {}, current {})",
                token, self.generation
            );
            return false;
        }
        match result {
            Ok(url) => {
                self.surfaces.audio.set_source(&url);
                self.music_ready = true;
                if self.interacted && !self.hidden {
                    self.surfaces.audio.play();
                }
            }
            Err(e) => {
                warn!("coordinator: music unavailable: {}", e);
                self.surfaces.audio.clear();
                self.music_ready = false;
            }
        }
        true
    }

    // ── Favorites ─────────────────────────────────────────────────────────────

    pub fn toggle_favorite(&mut self) -> Vec<Effect> {
        let Some(animation) = self.current().map(str::to_string) else {
            return Vec::new();
        };
        let mut effects = Vec::new();

        let result = if self.favorites.contains(&animation) {
            self.favorites.remove(&animation)
        } else {
            let screenshot = match self.surfaces.capture.capture(&animation) {
                Ok(data) => Some(data),
                Err(e) => {
                    warn!("coordinator: screenshot for {} failed: {}", animation, e);
                    effects.push(Effect::Notice(Notice::new(
                        NoticeLevel::Info,
                        "Saved without preview",
                    )));
                    None
                }
            };
            self.favorites.add(&animation, screenshot)
        };
        if let Err(e) = result {
            warn!("coordinator: favorites not saved: {}", e);
            effects.push(Effect::Notice(Notice::new(
                NoticeLevel::Warning,
                "Favorites could not be saved",
            )));
        }

        self.favorited = self.favorites.contains(&animation);
        effects
    }

    pub fn remove_favorite(&mut self, animation: &str) -> Vec<Effect> {
        let mut effects = Vec::new();
        if let Err(e) = self.favorites.remove(animation) {
            warn!("coordinator: favorites not saved: {}", e);
            effects.push(Effect::Notice(Notice::new(
                NoticeLevel::Warning,
                "Favorites could not be saved",
            )));
        }
        if self.current() == Some(animation) {
            self.favorited = self.favorites.contains(animation);
        }
        effects
    }

    // ── Overlays ──────────────────────────────────────────────────────────────

    fn about_for(&self, animation: &str) -> AboutView {
        AboutView {
            animation: animation.to_string(),
            filename: format!("{}.html", animation),
            credit: self.current_credit(),
        }
    }

    pub fn show_about(&mut self) {
        if let Some(animation) = self.current().map(str::to_string) {
            self.about = Some(self.about_for(&animation));
            self.overlay = Overlay::About;
        }
    }

    pub fn show_share(&mut self) {
        if let Some(animation) = self.current() {
            self.share_link = Some(link::share_url(&self.share_base, animation));
            self.overlay = Overlay::Share;
        }
    }

    /// Try the native share capability; show the link for manual copy when it
    /// is missing or fails.
    pub fn share(&mut self) -> Vec<Effect> {
        let Some(animation) = self.current() else {
            return Vec::new();
        };
        let url = link::share_url(&self.share_base, animation);
        match self.surfaces.share.share(&url) {
            Ok(()) => {
                info!("coordinator: shared {}", url);
                self.share_link = Some(url);
                vec![Effect::Notice(Notice::new(NoticeLevel::Success, "Link copied"))]
            }
            Err(e) => {
                debug!("coordinator: native share unavailable ({}), showing link", e);
                self.show_share();
                Vec::new()
            }
        }
    }

    fn hide_overlay(&mut self, which: Overlay) {
        if self.overlay == which {
            self.overlay = Overlay::None;
        }
    }

    pub fn close_overlay(&mut self) {
        self.overlay = Overlay::None;
    }

    // ── Session ───────────────────────────────────────────────────────────────

    pub fn record_interaction(&mut self) {
        if self.interacted {
            return;
        }
        self.interacted = true;
        info!("coordinator: first interaction");
        if self.music_ready && !self.hidden {
            self.surfaces.audio.play();
        }
    }

    /// Pause while hidden, resume when shown.  Position and overlay are kept.
    pub fn set_hidden(&mut self, hidden: bool) {
        if self.hidden == hidden {
            return;
        }
        self.hidden = hidden;
        if hidden {
            self.surfaces.audio.pause();
        } else if self.interacted {
            self.surfaces.audio.resume();
        }
    }
}
