//! Configuration resolution for mixid-extract
//!
//! Each setting is resolved ENV → TOML → default. Command-line values (output
//! folder, links switch) are applied by the binaries before calling in here.

use crate::pipeline::ExtractionWorkflow;
use crate::services::{
    AcrCloudClient, AcrCloudConfig, AudioSegmenter, ScdlDownloader, TracklistWriter,
    YouTubeResolver,
};
use crate::services::youtube_resolver::DEFAULT_MAX_RETRIES;
use crate::types::{LinkResolver, NoLinks};
use mixid_common::config::{resolve_setting, TomlConfig};
use mixid_common::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub const ACR_HOST_ENV: &str = "ACR_HOST";
pub const ACR_KEY_ENV: &str = "ACR_KEY";
pub const ACR_SECRET_ENV: &str = "ACR_SECRET";
pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";

/// Video link lookup settings
#[derive(Debug, Clone)]
pub struct LinkSettings {
    pub enabled: bool,
    pub youtube_api_key: Option<String>,
    pub max_retries: u32,
}

/// Everything needed to assemble an [`ExtractionWorkflow`]
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub acrcloud: AcrCloudConfig,
    pub links: LinkSettings,
    pub output_dir: PathBuf,
    pub downloader_program: Option<String>,
}

impl ExtractorConfig {
    /// Resolve credentials and settings; `links_disabled` comes from the CLI
    pub fn resolve(toml_config: &TomlConfig, output_dir: PathBuf, links_disabled: bool) -> Result<Self> {
        let acrcloud = resolve_acrcloud_config(toml_config)?;

        let links = LinkSettings {
            enabled: toml_config.links.enabled && !links_disabled,
            youtube_api_key: resolve_setting(
                None,
                YOUTUBE_API_KEY_ENV,
                toml_config.links.youtube_api_key.as_deref(),
            ),
            max_retries: toml_config.links.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        };

        Ok(Self {
            acrcloud,
            links,
            output_dir,
            downloader_program: toml_config.downloader.program.clone(),
        })
    }

    /// Wire the production collaborators together
    pub fn build_workflow(&self) -> Result<ExtractionWorkflow> {
        let recognizer = AcrCloudClient::new(self.acrcloud.clone())
            .map_err(|e| Error::Internal(format!("ACRCloud client: {}", e)))?;

        let link_resolver: Arc<dyn LinkResolver> = if self.links.enabled {
            let mode = if self.links.youtube_api_key.is_some() {
                "YouTube Data API"
            } else {
                "search page"
            };
            info!("Video links enabled ({})", mode);
            Arc::new(
                YouTubeResolver::new(self.links.youtube_api_key.clone(), self.links.max_retries)
                    .map_err(|e| Error::Internal(format!("YouTube client: {}", e)))?,
            )
        } else {
            info!("Video links disabled");
            Arc::new(NoLinks)
        };

        Ok(ExtractionWorkflow::new(
            Arc::new(ScdlDownloader::for_output_dir(
                self.downloader_program.clone(),
                &self.output_dir,
            )),
            Arc::new(AudioSegmenter::new()),
            Arc::new(recognizer),
            link_resolver,
            TracklistWriter::new(&self.output_dir),
        ))
    }
}

/// Resolve ACRCloud project credentials
///
/// **Priority:** ENV → TOML. All three of host, access key and access secret
/// are required.
pub fn resolve_acrcloud_config(toml_config: &TomlConfig) -> Result<AcrCloudConfig> {
    let section = &toml_config.acrcloud;

    let host = resolve_setting(None, ACR_HOST_ENV, section.host.as_deref());
    let access_key = resolve_setting(None, ACR_KEY_ENV, section.access_key.as_deref());
    let access_secret = resolve_setting(None, ACR_SECRET_ENV, section.access_secret.as_deref());

    let (Some(host), Some(access_key), Some(access_secret)) = (host, access_key, access_secret)
    else {
        return Err(Error::Config(
            "ACRCloud credentials not configured. Please configure using one of:\n\
             1. Environment (or .env file): ACR_HOST, ACR_KEY, ACR_SECRET\n\
             2. TOML config: ~/.config/mixid/config.toml, [acrcloud] table with\n\
             \x20  host, access_key and access_secret\n\
             \n\
             Credentials are listed in your ACRCloud console project."
                .to_string(),
        ));
    };

    let mut config = AcrCloudConfig::new(host, access_key, access_secret);
    if let Some(secs) = section.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    if let Some(ms) = section.min_interval_ms {
        config.min_interval = Duration::from_millis(ms);
    }

    info!(host = %config.host, "ACRCloud credentials resolved");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for name in [ACR_HOST_ENV, ACR_KEY_ENV, ACR_SECRET_ENV, YOUTUBE_API_KEY_ENV] {
            std::env::remove_var(name);
        }
    }

    fn toml_with_credentials() -> TomlConfig {
        let mut config = TomlConfig::default();
        config.acrcloud.host = Some("identify-eu-west-1.acrcloud.com".to_string());
        config.acrcloud.access_key = Some("toml-key".to_string());
        config.acrcloud.access_secret = Some("toml-secret".to_string());
        config
    }

    #[test]
    #[serial]
    fn test_missing_credentials_is_config_error() {
        clear_env();
        let err = resolve_acrcloud_config(&TomlConfig::default()).unwrap_err();
        match err {
            Error::Config(msg) => assert!(msg.contains("ACR_KEY")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_env_overrides_toml() {
        clear_env();
        std::env::set_var(ACR_KEY_ENV, "env-key");

        let mut toml_config = toml_with_credentials();
        toml_config.acrcloud.timeout_secs = Some(5);
        let config = resolve_acrcloud_config(&toml_config).unwrap();

        assert_eq!(config.access_key, "env-key");
        assert_eq!(config.access_secret, "toml-secret");
        assert_eq!(config.timeout, Duration::from_secs(5));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_links_disabled_by_cli_or_toml() {
        clear_env();
        let mut toml_config = toml_with_credentials();

        let config = ExtractorConfig::resolve(&toml_config, PathBuf::from("out"), true).unwrap();
        assert!(!config.links.enabled);

        toml_config.links.enabled = false;
        let config = ExtractorConfig::resolve(&toml_config, PathBuf::from("out"), false).unwrap();
        assert!(!config.links.enabled);

        toml_config.links.enabled = true;
        let config = ExtractorConfig::resolve(&toml_config, PathBuf::from("out"), false).unwrap();
        assert!(config.links.enabled);
        assert_eq!(config.links.max_retries, DEFAULT_MAX_RETRIES);
        assert!(config.links.youtube_api_key.is_none());
    }
}
