//! Pipeline configuration for `waypress.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                        |
//! |-------------|------------------------------------------------|
//! | `[site]`    | Site identity (url, name, description)         |
//! | `[extract]` | Source XML, data directory, chunking knobs     |
//! | `[sitemap]` | Sitemap XML output location and pagination     |
//!
//! # Example
//!
//! ```toml
//! [site]
//! url = "https://travelasker.com"
//! name = "TravelAsker"
//!
//! [extract]
//! source = "travelasker.WordPress.xml"
//! data_dir = "data"
//! chunk_size = 500
//!
//! [sitemap]
//! output_dir = "dist"
//! urls_per_sitemap = 1000
//! ```
//!
//! Every field has a default; the config file and each section are optional.
//! CLI flags override the file after load.

use crate::cli::{Cli, Commands};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Root configuration structure representing waypress.toml
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default)]
    pub site: SiteSection,

    #[serde(default)]
    pub extract: ExtractSection,

    #[serde(default)]
    pub sitemap: SitemapSection,
}

/// Site identity used by sitemap URLs and JSON-LD.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    pub url: String,
    pub name: String,
    pub description: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            url: "https://travelasker.com".into(),
            name: "TravelAsker".into(),
            description: "Travel Guides by Locals & Experts. Maximize your travel \
                          with travel advice, guides, reviews, and more."
                .into(),
        }
    }
}

/// Ingestion settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractSection {
    /// WXR export path.
    pub source: PathBuf,
    /// Directory the data files are published into.
    pub data_dir: PathBuf,
    /// Posts per chunk file.
    pub chunk_size: usize,
    /// Entries in recent.json.
    pub recent_limit: usize,
}

impl Default for ExtractSection {
    fn default() -> Self {
        Self {
            source: PathBuf::from("export.xml"),
            data_dir: PathBuf::from("data"),
            chunk_size: 500,
            recent_limit: 20,
        }
    }
}

/// Sitemap XML emission settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapSection {
    pub output_dir: PathBuf,
    pub urls_per_sitemap: usize,
}

impl Default for SitemapSection {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("dist"),
            urls_per_sitemap: 1000,
        }
    }
}

impl PipelineConfig {
    /// Load from a TOML file.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)
            .map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Ok(toml::from_str(&raw)?)
    }

    /// Load the config file if present, then apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = if cli.config.exists() {
            Self::from_path(&cli.config)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// CLI flags win over the config file.
    fn update_with_cli(&mut self, cli: &Cli) {
        if let Some(source) = &cli.source {
            self.extract.source = source.clone();
        }
        if let Some(data_dir) = &cli.data_dir {
            self.extract.data_dir = data_dir.clone();
        }
        match &cli.command {
            Commands::Extract { chunk_size } => {
                if let Some(size) = chunk_size {
                    self.extract.chunk_size = *size;
                }
            }
            Commands::Sitemap { output } => {
                if let Some(output) = output {
                    self.sitemap.output_dir = output.clone();
                }
            }
            Commands::Authors | Commands::Get { .. } => {}
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.extract.chunk_size == 0 {
            return Err(ConfigError::Validation(
                "extract.chunk_size must be at least 1".into(),
            ));
        }
        if self.sitemap.urls_per_sitemap == 0 {
            return Err(ConfigError::Validation(
                "sitemap.urls_per_sitemap must be at least 1".into(),
            ));
        }
        if self.site.url.is_empty() {
            return Err(ConfigError::Validation("site.url must not be empty".into()));
        }
        Ok(())
    }

    /// Site url without a trailing slash, for URL assembly.
    pub fn site_url(&self) -> &str {
        self.site.url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.extract.chunk_size, 500);
        assert_eq!(config.extract.recent_limit, 20);
        assert_eq!(config.sitemap.urls_per_sitemap, 1000);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [extract]
            source = "dump.xml"
            chunk_size = 100
            "#,
        )
        .unwrap();
        assert_eq!(config.extract.source, PathBuf::from("dump.xml"));
        assert_eq!(config.extract.chunk_size, 100);
        // untouched sections keep defaults
        assert_eq!(config.extract.data_dir, PathBuf::from("data"));
        assert_eq!(config.site.name, "TravelAsker");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<PipelineConfig, _> = toml::from_str("[extract]\nchunks = 3\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_validation_rejects_zero_chunk_size() {
        let mut config = PipelineConfig::default();
        config.extract.chunk_size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_site_url_trailing_slash_trimmed() {
        let mut config = PipelineConfig::default();
        config.site.url = "https://example.com/".into();
        assert_eq!(config.site_url(), "https://example.com");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".into());
        assert!(format!("{err}").contains("bad value"));
    }
}
