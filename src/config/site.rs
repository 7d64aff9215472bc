//! Site configuration (_config.yml)

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable that overrides `api.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub logo: String,

    // URL
    pub url: String,
    pub root: String,

    // Directory
    pub public_dir: String,
    pub post_dir: String,

    // Date / Time format
    pub locale: String,
    pub timezone: String,
    pub date_format: String,

    // Reading time
    pub words_per_minute: usize,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub build: BuildConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "SpaceTraveling".to_string(),
            logo: "/logo.svg".to_string(),

            url: "http://localhost:4000".to_string(),
            root: "/".to_string(),

            public_dir: "public".to_string(),
            post_dir: "post".to_string(),

            locale: "pt-BR".to_string(),
            timezone: "America/Sao_Paulo".to_string(),
            date_format: "dd MMM yyyy".to_string(),

            words_per_minute: 200,

            api: ApiConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would only fail later, at render time
    pub fn validate(&self) -> Result<()> {
        crate::helpers::parse_locale(&self.locale)?;
        crate::helpers::parse_timezone(&self.timezone)?;
        if self.words_per_minute == 0 {
            anyhow::bail!("words_per_minute must be greater than zero");
        }
        if self.api.page_size == 0 {
            anyhow::bail!("api.page_size must be greater than zero");
        }
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var(ACCESS_TOKEN_ENV) {
            if !token.is_empty() {
                tracing::debug!("Using access token from {}", ACCESS_TOKEN_ENV);
                self.api.access_token = Some(token);
            }
        }
    }
}

/// Content API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: usize,
    pub timeout_secs: Option<u64>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 1,
            timeout_secs: None,
        }
    }
}

/// Build-time settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Max detail documents fetched at once
    pub concurrency: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}
