use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::platform;

/// Environment overrides for the audio storage settings.
pub const ENV_AUDIO_ENDPOINT: &str = "ETHEREAL_AUDIO_ENDPOINT";
pub const ENV_AUDIO_BUCKET: &str = "ETHEREAL_AUDIO_BUCKET";
pub const ENV_AUDIO_PROJECT: &str = "ETHEREAL_AUDIO_PROJECT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub share: ShareConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

/// Where the manifest and the content documents live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Manifest location: an `http(s)://` URL or a local file path.
    /// Relative paths resolve against `content_root`.
    #[serde(default = "default_manifest")]
    pub manifest: String,
    /// Directory holding `data.json` and `data/<animation>.html`.
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,
    /// Shuffle the animation order once per load.
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
}

/// Remote object storage used to derive audio URLs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub bucket_id: String,
    #[serde(default)]
    pub project_id: String,
    /// Issue a HEAD request before handing the URL to the player.
    #[serde(default)]
    pub verify_remote: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_http_enabled")]
    pub enabled: bool,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Base URL for share links.  Empty = the local content server.
    #[serde(default)]
    pub base_url: String,
}

/// Keys with a fixed meaning in the main view; `favorite_key` may not be one
/// of them.
pub const RESERVED_KEYS: &[char] = &['j', 'k', 'r', 'a', 'v', 's', 'q'];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Minimum vertical travel (pixels) for a drag to count as a swipe.
    #[serde(default = "default_swipe_min_distance")]
    pub swipe_min_distance: f32,
    /// Toggles the favorite state.  Must not be in `RESERVED_KEYS`.
    #[serde(default = "default_favorite_key")]
    pub favorite_key: char,
}

impl InputConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        if RESERVED_KEYS.contains(&self.favorite_key) {
            anyhow::bail!(
                "input.favorite_key '{}' is already bound (reserved: {:?})",
                self.favorite_key,
                RESERVED_KEYS
            );
        }
        if self.favorite_key.is_whitespace() || self.favorite_key.is_control() {
            anyhow::bail!("input.favorite_key must be a printable character");
        }
        if self.swipe_min_distance.is_nan() || self.swipe_min_distance < 0.0 {
            anyhow::bail!(
                "input.swipe_min_distance must be a non-negative number, got {}",
                self.swipe_min_distance
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// The single slot the favorites list is persisted to.
    #[serde(default = "default_favorites_file")]
    pub favorites_file: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            manifest: default_manifest(),
            content_root: default_content_root(),
            shuffle: default_shuffle(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: default_http_enabled(),
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            swipe_min_distance: default_swipe_min_distance(),
            favorite_key: default_favorite_key(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            favorites_file: default_favorites_file(),
        }
    }
}

fn default_manifest() -> String {
    "data.json".to_string()
}

fn default_content_root() -> PathBuf {
    platform::data_dir().join("public")
}

fn default_shuffle() -> bool {
    true
}

fn default_http_enabled() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8990
}

fn default_swipe_min_distance() -> f32 {
    50.0
}

fn default_favorite_key() -> char {
    'f'
}

fn default_favorites_file() -> PathBuf {
    platform::data_dir().join("favorites.json")
}

impl AudioConfig {
    /// Apply `ETHEREAL_AUDIO_*` overrides on top of the file values.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields = [
            (ENV_AUDIO_ENDPOINT, &mut self.endpoint),
            (ENV_AUDIO_BUCKET, &mut self.bucket_id),
            (ENV_AUDIO_PROJECT, &mut self.project_id),
        ];
        for (key, field) in fields {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *field = value.trim().to_string();
            }
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load from `path`, writing the defaults there on first run.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str::<Self>(&content)?
        } else {
            let config = Self::default();
            config.save_to(path)?;
            config
        };
        config.input.validate()?;
        config.audio.apply_env();
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    /// Base URL of the local content server, e.g. `http://127.0.0.1:8990/`.
    pub fn local_base_url(&self) -> String {
        format!("http://{}:{}/", self.http.bind_address, self.http.port)
    }

    /// Base URL embedded in share links.
    pub fn share_base_url(&self) -> String {
        if self.share.base_url.trim().is_empty() {
            self.local_base_url()
        } else {
            self.share.base_url.trim().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.http.enabled);
        assert_eq!(config.http.port, 8990);
        assert!(config.catalog.shuffle);
        assert_eq!(config.catalog.manifest, "data.json");
        assert_eq!(config.input.swipe_min_distance, 50.0);
        assert_eq!(config.input.favorite_key, 'f');
        assert!(config.paths.favorites_file.ends_with("favorites.json"));
        assert_eq!(config.share_base_url(), "http://127.0.0.1:8990/");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            [catalog]
            shuffle = false

            [audio]
            endpoint = "cloud.example.com"
            "#,
        )
        .unwrap();
        assert!(!config.catalog.shuffle);
        assert_eq!(config.catalog.manifest, "data.json");
        assert_eq!(config.audio.endpoint, "cloud.example.com");
        assert_eq!(config.http.port, 8990);
    }

    #[test]
    fn env_overrides_non_empty_values_only() {
        let mut audio = AudioConfig {
            endpoint: "file.example.com".into(),
            bucket_id: "b1".into(),
            project_id: "p1".into(),
            verify_remote: false,
        };
        audio.apply_overrides(|key| match key {
            ENV_AUDIO_ENDPOINT => Some("env.example.com".into()),
            ENV_AUDIO_BUCKET => Some("   ".into()),
            _ => None,
        });
        assert_eq!(audio.endpoint, "env.example.com");
        assert_eq!(audio.bucket_id, "b1");
        assert_eq!(audio.project_id, "p1");
    }

    #[test]
    fn first_load_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.http.port, 8990);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.catalog.manifest, config.catalog.manifest);
    }

    #[test]
    fn favorite_key_may_not_shadow_built_in_keys() {
        for key in ['j', 'k', 'r', 's', 'q'] {
            let input = InputConfig {
                favorite_key: key,
                ..InputConfig::default()
            };
            assert!(input.validate().is_err(), "{} accepted", key);
        }
        assert!(InputConfig::default().validate().is_ok());
        assert!(InputConfig {
            favorite_key: 'h',
            ..InputConfig::default()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn colliding_favorite_key_fails_to_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[input]\nfavorite_key = \"j\"\n").unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("favorite_key"));
    }

    #[test]
    fn custom_share_base_wins() {
        let mut config = Config::default();
        config.share.base_url = "https://ethereal.example/".into();
        assert_eq!(config.share_base_url(), "https://ethereal.example/");
    }
}
