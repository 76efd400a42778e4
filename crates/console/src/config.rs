//! Console configuration.
//!
//! Figment merges the built-in defaults, `console.toml` (or the file given on
//! the command line) and `CONSOLE_*` environment variables, with `__`
//! separating sections: `CONSOLE_BACKEND__TOKEN=...`.

use backend::{BackendConfig, FetchConfig};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "console.toml";
pub const ENV_PREFIX: &str = "CONSOLE_";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    pub backend: BackendConfig,
    pub fetch: FetchConfig,
    pub view: ViewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub items_per_page: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self { items_per_page: 10 }
    }
}

impl ConsoleConfig {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Self::from_figment(
            Figment::from(Serialized::defaults(ConsoleConfig::default()))
                .merge(Toml::file(file))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> anyhow::Result<Self> {
        let config: Self = figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Invalid console configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.fetch.page_size == 0 {
            anyhow::bail!("fetch.page_size must be greater than zero");
        }
        if self.fetch.max_batches == 0 {
            anyhow::bail!("fetch.max_batches must be greater than zero");
        }
        if self.view.items_per_page == 0 {
            anyhow::bail!("view.items_per_page must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_toml(toml: &str) -> anyhow::Result<ConsoleConfig> {
        ConsoleConfig::from_figment(
            Figment::from(Serialized::defaults(ConsoleConfig::default())).merge(Toml::string(toml)),
        )
    }

    #[test]
    fn test_defaults_match_backend_paging() {
        let config = with_toml("").unwrap();
        assert_eq!(config.fetch.page_size, 3000);
        assert_eq!(config.fetch.max_batches, 10);
        assert_eq!(config.view.items_per_page, 10);
    }

    #[test]
    fn test_partial_sections() {
        let config = with_toml(
            r#"
            [fetch]
            max_batches = 30

            [view]
            items_per_page = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.fetch.max_batches, 30);
        assert_eq!(config.fetch.page_size, 3000);
        assert_eq!(config.view.items_per_page, 25);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(with_toml("[fetch]\npage_size = 0").is_err());
    }
}
