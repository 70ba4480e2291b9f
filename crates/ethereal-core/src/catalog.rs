//! Catalog loading — the manifest of animations, their music and the credits
//! table.
//!
//! Manifest shape (JSON):
//!
//! ```text
//! {
//!   "animations": { "<animation>": "<music>" | null, ... },
//!   "credits": { "<source>": [ { "credit": "...", "tracks": ["..."], "license": "..." } ] }
//! }
//! ```
//!
//! Key order of both maps is kept: it is the manifest order of the catalog and
//! the scan order of the credit lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::CatalogConfig;
use crate::error::CatalogLoadError;

/// One attribution record inside a credit source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditEntry {
    pub credit: String,
    #[serde(default)]
    pub tracks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
}

/// All credit entries published under one source (e.g. a sound library path).
#[derive(Debug, Clone, PartialEq)]
pub struct CreditSource {
    pub source: String,
    pub entries: Vec<CreditEntry>,
}

/// Parsed manifest, still in manifest order.
#[derive(Debug, Clone, PartialEq)]
pub struct Manifest {
    pub animations: Vec<(String, Option<String>)>,
    pub credits: Vec<CreditSource>,
}

#[derive(Deserialize)]
struct RawManifest {
    animations: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    credits: serde_json::Map<String, serde_json::Value>,
}

impl Manifest {
    pub fn parse(content: &str) -> Result<Self, CatalogLoadError> {
        let raw: RawManifest = serde_json::from_str(content)?;

        let mut animations = Vec::with_capacity(raw.animations.len());
        for (animation, music) in raw.animations {
            let music: Option<String> = serde_json::from_value(music)?;
            animations.push((animation, music.filter(|m| !m.trim().is_empty())));
        }
        if animations.is_empty() {
            return Err(CatalogLoadError::Empty);
        }

        let mut credits = Vec::with_capacity(raw.credits.len());
        for (source, entries) in raw.credits {
            let entries: Vec<CreditEntry> = serde_json::from_value(entries)?;
            credits.push(CreditSource { source, entries });
        }

        Ok(Self {
            animations,
            credits,
        })
    }
}

/// The loaded, immutable working catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    animations: Vec<String>,
    music: HashMap<String, String>,
    credits: Vec<CreditSource>,
}

impl Catalog {
    /// Build a catalog in manifest order.
    pub fn from_manifest(manifest: Manifest) -> Self {
        let mut animations = Vec::with_capacity(manifest.animations.len());
        let mut music = HashMap::new();
        for (animation, track) in manifest.animations {
            if let Some(track) = track {
                music.insert(animation.clone(), track);
            }
            animations.push(animation);
        }
        Self {
            animations,
            music,
            credits: manifest.credits,
        }
    }

    /// Build a catalog and permute its order once with `rng`.
    pub fn shuffled<R: Rng + ?Sized>(manifest: Manifest, rng: &mut R) -> Self {
        let mut catalog = Self::from_manifest(manifest);
        catalog.animations.shuffle(rng);
        catalog
    }

    pub fn len(&self) -> usize {
        self.animations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.is_empty()
    }

    pub fn animations(&self) -> &[String] {
        &self.animations
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.animations.get(index).map(String::as_str)
    }

    pub fn position_of(&self, animation: &str) -> Option<usize> {
        self.animations.iter().position(|a| a == animation)
    }

    pub fn contains(&self, animation: &str) -> bool {
        self.position_of(animation).is_some()
    }

    /// Music bound to `animation`, if any.
    pub fn music_for(&self, animation: &str) -> Option<&str> {
        self.music.get(animation).map(String::as_str)
    }

    pub fn credits(&self) -> &[CreditSource] {
        &self.credits
    }

    /// Starting position: the deep-linked animation when it exists, else 0.
    pub fn initial_position(&self, deep_link: Option<&str>) -> usize {
        deep_link
            .and_then(|animation| self.position_of(animation))
            .unwrap_or(0)
    }
}

/// Where the manifest is read from.
#[derive(Debug, Clone, PartialEq)]
pub enum ManifestSource {
    Url(String),
    File(PathBuf),
}

impl ManifestSource {
    /// URLs are used as-is; relative paths resolve against `content_root`.
    pub fn resolve(manifest: &str, content_root: &Path) -> Self {
        let manifest = manifest.trim();
        if manifest.starts_with("http://") || manifest.starts_with("https://") {
            return Self::Url(manifest.to_string());
        }
        let path = PathBuf::from(manifest);
        if path.is_absolute() {
            Self::File(path)
        } else {
            Self::File(content_root.join(path))
        }
    }
}

/// Fetches the manifest and builds the working catalog.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    source: ManifestSource,
    shuffle: bool,
}

impl CatalogLoader {
    pub fn new(source: ManifestSource, shuffle: bool) -> Self {
        Self { source, shuffle }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(
            ManifestSource::resolve(&config.manifest, &config.content_root),
            config.shuffle,
        )
    }

    pub fn source(&self) -> &ManifestSource {
        &self.source
    }

    /// Fetch, parse and order the catalog.  Every call reshuffles.
    pub async fn load(&self) -> Result<Catalog, CatalogLoadError> {
        let content = self.fetch().await?;
        let manifest = Manifest::parse(&content)?;
        let catalog = if self.shuffle {
            Catalog::shuffled(manifest, &mut rand::thread_rng())
        } else {
            Catalog::from_manifest(manifest)
        };
        info!(
            "catalog: loaded {} animations, {} credit sources (shuffle={})",
            catalog.len(),
            catalog.credits().len(),
            self.shuffle
        );
        Ok(catalog)
    }

    async fn fetch(&self) -> Result<String, CatalogLoadError> {
        match &self.source {
            ManifestSource::File(path) => {
                debug!("catalog: reading manifest {}", path.display());
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| CatalogLoadError::Read {
                        path: path.clone(),
                        source,
                    })
            }
            ManifestSource::Url(url) => {
                debug!("catalog: fetching manifest {}", url);
                let fetch_error = |e: reqwest::Error| CatalogLoadError::Fetch {
                    url: url.clone(),
                    message: e.to_string(),
                };
                reqwest::get(url)
                    .await
                    .and_then(|resp| resp.error_for_status())
                    .map_err(fetch_error)?
                    .text()
                    .await
                    .map_err(fetch_error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const MANIFEST: &str = r#"{
        "animations": { "c": "10_fs", "a": null, "b": "pix-song-10", "d": "" },
        "credits": {
            "freesound.org/people/someone/sounds": [
                { "credit": "someone", "tracks": ["10_fs"] }
            ],
            "pixabay.com/music": [
                { "credit": "pix", "tracks": ["pix-song-10"], "license": "CC0" }
            ]
        }
    }"#;

    #[test]
    fn parse_keeps_manifest_order() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let names: Vec<&str> = manifest.animations.iter().map(|(a, _)| a.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b", "d"]);
        assert_eq!(manifest.credits[0].source, "freesound.org/people/someone/sounds");
        assert_eq!(manifest.credits[1].entries[0].license.as_deref(), Some("CC0"));
    }

    #[test]
    fn null_and_empty_music_are_unbound() {
        let catalog = Catalog::from_manifest(Manifest::parse(MANIFEST).unwrap());
        assert_eq!(catalog.music_for("c"), Some("10_fs"));
        assert_eq!(catalog.music_for("a"), None);
        assert_eq!(catalog.music_for("d"), None);
        assert_eq!(catalog.music_for("missing"), None);
    }

    #[test]
    fn credits_are_optional() {
        let manifest = Manifest::parse(r#"{"animations": {"a": null}}"#).unwrap();
        assert!(manifest.credits.is_empty());
    }

    #[test]
    fn malformed_manifests_fail() {
        assert!(matches!(
            Manifest::parse("not json"),
            Err(CatalogLoadError::Parse(_))
        ));
        assert!(matches!(
            Manifest::parse(r#"{"credits": {}}"#),
            Err(CatalogLoadError::Parse(_))
        ));
        assert!(matches!(
            Manifest::parse(r#"{"animations": {"a": 3}}"#),
            Err(CatalogLoadError::Parse(_))
        ));
        assert!(matches!(
            Manifest::parse(r#"{"animations": {}}"#),
            Err(CatalogLoadError::Empty)
        ));
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let manifest = Manifest::parse(MANIFEST).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let catalog = Catalog::shuffled(manifest, &mut rng);
        let mut names = catalog.animations().to_vec();
        names.sort();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert_eq!(catalog.music_for("b"), Some("pix-song-10"));
    }

    #[test]
    fn deep_link_selects_initial_position() {
        let manifest = Manifest::parse(r#"{"animations": {"a": null, "b": null, "c": null}}"#).unwrap();
        let catalog = Catalog::from_manifest(manifest);
        assert_eq!(catalog.initial_position(Some("b")), 1);
        assert_eq!(catalog.initial_position(Some("zzz")), 0);
        assert_eq!(catalog.initial_position(None), 0);
    }

    #[test]
    fn manifest_source_resolution() {
        let root = Path::new("/srv/public");
        assert_eq!(
            ManifestSource::resolve("data.json", root),
            ManifestSource::File(PathBuf::from("/srv/public/data.json"))
        );
        assert_eq!(
            ManifestSource::resolve("https://cdn.example/data.json", root),
            ManifestSource::Url("https://cdn.example/data.json".into())
        );
    }
}
