//! Credit lookup — turns a music identifier into an attribution line and a
//! link back to the track's source page.

use std::sync::OnceLock;

use regex::Regex;

use crate::catalog::CreditSource;

pub const NO_MUSIC_TEXT: &str = "No music for this animation.";

/// Result of a credit lookup.  A miss is a value, not an error: it is shown
/// to the user as-is so gaps in the credits table stay visible.
#[derive(Debug, Clone, PartialEq)]
pub enum CreditLookup {
    /// The animation has no music bound.
    NoMusic,
    Found { text: String, url: String },
    /// The music identifier is not listed under any source.
    NotFound { music: String },
}

impl CreditLookup {
    pub fn text(&self) -> String {
        match self {
            Self::NoMusic => NO_MUSIC_TEXT.to_string(),
            Self::Found { text, .. } => text.clone(),
            Self::NotFound { music } => format!("Credit not found for {}", music),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Found { url, .. } => Some(url),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub struct CreditResolver<'a> {
    sources: &'a [CreditSource],
}

impl<'a> CreditResolver<'a> {
    pub fn new(sources: &'a [CreditSource]) -> Self {
        Self { sources }
    }

    /// First entry (in manifest order) whose track list holds `music` wins.
    pub fn resolve(&self, music: Option<&str>) -> CreditLookup {
        let Some(music) = music.map(str::trim).filter(|m| !m.is_empty()) else {
            return CreditLookup::NoMusic;
        };

        for source in self.sources {
            if let Some(entry) = source
                .entries
                .iter()
                .find(|e| e.tracks.iter().any(|t| t == music))
            {
                let mut text = format!("Music by {} on {}", entry.credit, source_name(&source.source));
                if let Some(license) = entry.license.as_deref().filter(|l| !l.is_empty()) {
                    text.push_str(&format!(" (license: {})", license));
                }
                return CreditLookup::Found {
                    text,
                    url: source_url(music, &source.source),
                };
            }
        }

        CreditLookup::NotFound {
            music: music.to_string(),
        }
    }
}

fn track_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d+)_|-(\d+)$").expect("static pattern"))
}

/// Numeric id embedded in a music identifier: the leading digit run before an
/// underscore (`10_fs`), else the trailing digit run after a hyphen
/// (`pix-song-10`).  Empty when neither is present.
pub fn track_id(music: &str) -> &str {
    track_id_pattern()
        .captures(music)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .map(|m| m.as_str())
        .unwrap_or("")
}

/// Link to the track's page on its source, or to the source itself when no
/// id can be extracted.
pub fn source_url(music: &str, source: &str) -> String {
    let source = source.trim_end_matches('/');
    match track_id(music) {
        "" => format!("https://{}", source),
        id => format!("https://{}/{}", source, id),
    }
}

/// Short display name of a source: the second-level label of its host
/// (`freesound.org/people/x` → `freesound`), or the whole source when the
/// host has no dot.
pub fn source_name(source: &str) -> &str {
    let host = source.split('/').next().unwrap_or(source);
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() >= 2 {
        labels[labels.len() - 2]
    } else {
        source
    }
}
