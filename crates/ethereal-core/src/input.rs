//! Input mapping — keys and swipe gestures to intents.
//!
//! Both kinds of input can arrive from several targets (the main view and the
//! embedded content).  Each target keeps its own swipe origin so a gesture that
//! starts on one target never completes on another.

use std::collections::HashMap;

use tracing::trace;

use crate::config::InputConfig;
use crate::intent::{Intent, Overlay};

/// Keys the mapper understands, independent of the terminal/browser key type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Up,
    Down,
    Char(char),
    Other,
}

/// Where an input event was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputTarget {
    Document,
    Embedded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    /// Finger moved down the screen.
    Down,
    /// Finger moved up the screen.
    Up,
}

/// Classify a gesture by its displacement.  Vertical travel must dominate
/// horizontal travel and exceed `min_distance`.
pub fn classify_swipe(dx: f32, dy: f32, min_distance: f32) -> Option<Swipe> {
    if dy.abs() > dx.abs() && dy.abs() > min_distance {
        Some(if dy > 0.0 { Swipe::Down } else { Swipe::Up })
    } else {
        None
    }
}

pub struct InputMapper {
    min_distance: f32,
    favorite_key: char,
    origins: HashMap<InputTarget, (f32, f32)>,
}

impl InputMapper {
    pub fn new(config: &InputConfig) -> Self {
        Self {
            min_distance: config.swipe_min_distance,
            favorite_key: config.favorite_key,
            origins: HashMap::new(),
        }
    }

    /// Map a key press.  While an overlay is open only `Escape` does anything.
    /// Fixed bindings win over `favorite_key`; see `config::RESERVED_KEYS`.
    pub fn map_key(&self, key: Key, overlay: Overlay) -> Option<Intent> {
        if overlay.is_open() {
            return match key {
                Key::Escape => Some(Intent::CloseOverlay),
                _ => None,
            };
        }
        match key {
            Key::Up | Key::Char('k') => Some(Intent::Previous),
            Key::Down | Key::Char('j') => Some(Intent::Next),
            Key::Char(c) if c == self.favorite_key => Some(Intent::ToggleFavorite),
            Key::Char('r') => Some(Intent::Random),
            Key::Char('a') => Some(Intent::ShowAbout),
            Key::Char('v') => Some(Intent::ShowFavorites),
            Key::Char('s') => Some(Intent::Share),
            _ => None,
        }
    }

    pub fn touch_start(&mut self, target: InputTarget, x: f32, y: f32) {
        self.origins.insert(target, (x, y));
    }

    pub fn touch_cancel(&mut self, target: InputTarget) {
        self.origins.remove(&target);
    }

    /// Finish a gesture.  A touch end without a recorded start is ignored.
    pub fn touch_end(
        &mut self,
        target: InputTarget,
        x: f32,
        y: f32,
        overlay: Overlay,
    ) -> Option<Intent> {
        let (start_x, start_y) = self.origins.remove(&target)?;
        let swipe = classify_swipe(x - start_x, y - start_y, self.min_distance);
        trace!("input: {:?} swipe {:?}", target, swipe);
        if overlay.is_open() {
            return None;
        }
        match swipe? {
            Swipe::Down => Some(Intent::Next),
            Swipe::Up => Some(Intent::Previous),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> InputMapper {
        InputMapper::new(&InputConfig::default())
    }

    #[test]
    fn arrow_keys_navigate_when_no_overlay() {
        let m = mapper();
        assert_eq!(m.map_key(Key::Up, Overlay::None), Some(Intent::Previous));
        assert_eq!(m.map_key(Key::Down, Overlay::None), Some(Intent::Next));
        assert_eq!(m.map_key(Key::Char('f'), Overlay::None), Some(Intent::ToggleFavorite));
        assert_eq!(m.map_key(Key::Escape, Overlay::None), None);
    }

    #[test]
    fn overlay_gates_everything_but_escape() {
        let m = mapper();
        for overlay in [Overlay::About, Overlay::Favorites, Overlay::Share] {
            assert_eq!(m.map_key(Key::Down, overlay), None);
            assert_eq!(m.map_key(Key::Char('f'), overlay), None);
            assert_eq!(m.map_key(Key::Escape, overlay), Some(Intent::CloseOverlay));
        }
    }

    #[test]
    fn custom_favorite_key() {
        let m = InputMapper::new(&InputConfig {
            swipe_min_distance: 50.0,
            favorite_key: 'h',
        });
        assert_eq!(m.map_key(Key::Char('h'), Overlay::None), Some(Intent::ToggleFavorite));
        assert_eq!(m.map_key(Key::Char('f'), Overlay::None), None);
    }

    #[test]
    fn reserved_keys_are_bound() {
        let m = mapper();
        for key in crate::config::RESERVED_KEYS.iter().filter(|k| **k != 'q') {
            let intent = m.map_key(Key::Char(*key), Overlay::None);
            assert!(intent.is_some(), "{} unbound", key);
            assert_ne!(intent, Some(Intent::ToggleFavorite));
        }
    }

    #[test]
    fn swipe_classification() {
        assert_eq!(classify_swipe(0.0, 80.0, 50.0), Some(Swipe::Down));
        assert_eq!(classify_swipe(10.0, -80.0, 50.0), Some(Swipe::Up));
        assert_eq!(classify_swipe(0.0, 50.0, 50.0), None);
        assert_eq!(classify_swipe(90.0, 80.0, 50.0), None);
    }

    #[test]
    fn swipes_map_to_navigation() {
        let mut m = mapper();
        m.touch_start(InputTarget::Document, 100.0, 100.0);
        assert_eq!(
            m.touch_end(InputTarget::Document, 105.0, 200.0, Overlay::None),
            Some(Intent::Next)
        );
        m.touch_start(InputTarget::Embedded, 100.0, 300.0);
        assert_eq!(
            m.touch_end(InputTarget::Embedded, 100.0, 100.0, Overlay::None),
            Some(Intent::Previous)
        );
    }

    #[test]
    fn short_gestures_and_orphan_ends_do_nothing() {
        let mut m = mapper();
        m.touch_start(InputTarget::Document, 0.0, 0.0);
        assert_eq!(m.touch_end(InputTarget::Document, 0.0, 20.0, Overlay::None), None);
        assert_eq!(m.touch_end(InputTarget::Document, 0.0, 400.0, Overlay::None), None);
    }

    #[test]
    fn targets_track_origins_independently() {
        let mut m = mapper();
        m.touch_start(InputTarget::Document, 0.0, 0.0);
        assert_eq!(m.touch_end(InputTarget::Embedded, 0.0, 400.0, Overlay::None), None);
        assert_eq!(
            m.touch_end(InputTarget::Document, 0.0, 400.0, Overlay::None),
            Some(Intent::Next)
        );
    }

    #[test]
    fn swipes_are_gated_by_overlay() {
        let mut m = mapper();
        m.touch_start(InputTarget::Document, 0.0, 0.0);
        assert_eq!(m.touch_end(InputTarget::Document, 0.0, 400.0, Overlay::Favorites), None);
    }
}
