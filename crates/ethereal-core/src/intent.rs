//! Intents — everything the coordinator can be asked to do.
//!
//! Input sources (keyboard, swipes, the favorites page, the HTTP API) only
//! produce intents; the coordinator is the only thing that acts on them.

/// All commands understood by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    // ── Navigation ───────────────────────────────────────────────────────────
    Next,
    Previous,
    Random,
    GoTo(String),

    // ── Favorites ────────────────────────────────────────────────────────────
    ToggleFavorite,
    RemoveFavorite(String),

    // ── Overlays ─────────────────────────────────────────────────────────────
    ShowAbout,
    HideAbout,
    ShowFavorites,
    HideFavorites,
    /// Hand the share link to the native share capability, falling back to
    /// the share panel.
    Share,
    ShowShare,
    HideShare,
    /// Close whichever overlay is open.
    CloseOverlay,

    // ── Session ──────────────────────────────────────────────────────────────
    /// First user gesture; unlocks audio playback.
    Interact,
    VisibilityChanged { hidden: bool },
}

impl Intent {
    /// Intents that are dropped (not queued) while an overlay is open.
    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::Next | Self::Previous | Self::Random | Self::ToggleFavorite
        )
    }
}

/// The single active overlay.  At most one is open at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overlay {
    #[default]
    None,
    About,
    Favorites,
    Share,
}

impl Overlay {
    pub fn is_open(self) -> bool {
        self != Self::None
    }
}
