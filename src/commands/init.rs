//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Default `_config.yml` written by `init`
const CONFIG_TEMPLATE: &str = r#"# Site
title: SpaceTraveling
logo: /logo.svg

# URL
url: http://localhost:4000
root: /

# Directory
public_dir: public
post_dir: post

# Date / Time format (date-fns style pattern)
locale: pt-BR
timezone: America/Sao_Paulo
date_format: dd MMM yyyy

# Reading time
words_per_minute: 200

# Content API
## The access token can also be set with PRISMIC_ACCESS_TOKEN
api:
  endpoint: https://your-repository.cdn.prismic.io/api/v2
  document_type: posts
  page_size: 1

build:
  concurrency: 4
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }
    fs::write(&config_path, CONFIG_TEMPLATE)?;
    tracing::debug!("Wrote {:?}", config_path);

    Ok(())
}
