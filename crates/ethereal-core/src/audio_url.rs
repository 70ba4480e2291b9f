//! Audio URL derivation.
//!
//! Tracks live in a remote object-storage bucket.  A track's file id is the
//! first 20 hex chars of the MD5 of its music identifier, so the URL can be
//! computed without any index.

use md5::{Digest, Md5};
use tracing::debug;

use crate::config::AudioConfig;
use crate::error::MusicResolutionError;

const FILE_ID_LEN: usize = 20;

/// Storage file id for a music identifier.
pub fn file_id(music: &str) -> String {
    let mut hex = hex::encode(Md5::digest(music.as_bytes()));
    hex.truncate(FILE_ID_LEN);
    hex
}

#[derive(Debug, Clone)]
pub struct AudioUrlBuilder {
    endpoint: String,
    bucket_id: String,
    project_id: String,
}

impl AudioUrlBuilder {
    pub fn new(
        endpoint: impl Into<String>,
        bucket_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            bucket_id: bucket_id.into(),
            project_id: project_id.into(),
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(&config.endpoint, &config.bucket_id, &config.project_id)
    }

    pub fn build(&self, music: &str) -> Result<String, MusicResolutionError> {
        if self.endpoint.is_empty() {
            return Err(MusicResolutionError::NotConfigured("endpoint"));
        }
        if self.bucket_id.is_empty() {
            return Err(MusicResolutionError::NotConfigured("bucket id"));
        }
        if self.project_id.is_empty() {
            return Err(MusicResolutionError::NotConfigured("project id"));
        }
        let endpoint = self
            .endpoint
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        Ok(format!(
            "https://{}/v1/storage/buckets/{}/files/{}/view?project={}",
            endpoint,
            self.bucket_id,
            file_id(music),
            self.project_id
        ))
    }
}

/// Builds the URL and, when configured, checks that the file exists.
#[derive(Debug, Clone)]
pub struct AudioResolver {
    builder: AudioUrlBuilder,
    client: reqwest::Client,
    verify_remote: bool,
}

impl AudioResolver {
    pub fn new(builder: AudioUrlBuilder, verify_remote: bool) -> Self {
        Self {
            builder,
            client: reqwest::Client::new(),
            verify_remote,
        }
    }

    pub fn from_config(config: &AudioConfig) -> Self {
        Self::new(AudioUrlBuilder::from_config(config), config.verify_remote)
    }

    pub async fn resolve(&self, music: &str) -> Result<String, MusicResolutionError> {
        let url = self.builder.build(music)?;
        if self.verify_remote {
            debug!("audio: verifying {}", url);
            self.client
                .head(&url)
                .send()
                .await
                .and_then(|resp| resp.error_for_status())
                .map_err(|e| MusicResolutionError::Lookup {
                    music: music.to_string(),
                    message: e.to_string(),
                })?;
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_id_is_truncated_md5() {
        assert_eq!(file_id("password"), "5f4dcc3b5aa765d61d83");
        assert_eq!(file_id("10_fs").len(), FILE_ID_LEN);
    }

    #[test]
    fn builds_storage_url() {
        let builder = AudioUrlBuilder::new("https://cloud.example.com/", "tracks", "viewer");
        assert_eq!(
            builder.build("password").unwrap(),
            "https://cloud.example.com/v1/storage/buckets/tracks/files/5f4dcc3b5aa765d61d83/view?project=viewer"
        );
    }

    #[test]
    fn missing_settings_are_reported() {
        let builder = AudioUrlBuilder::new("", "tracks", "viewer");
        assert_eq!(
            builder.build("x"),
            Err(MusicResolutionError::NotConfigured("endpoint"))
        );
        let builder = AudioUrlBuilder::new("cloud.example.com", "tracks", "");
        assert_eq!(
            builder.build("x"),
            Err(MusicResolutionError::NotConfigured("project id"))
        );
    }

    #[tokio::test]
    async fn resolver_without_verification_is_offline() {
        let resolver = AudioResolver::new(
            AudioUrlBuilder::new("cloud.example.com", "tracks", "viewer"),
            false,
        );
        let url = resolver.resolve("password").await.unwrap();
        assert!(url.contains("/files/5f4dcc3b5aa765d61d83/"));
    }
}
