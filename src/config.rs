use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use notioncover::PropertyNames;
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = ".config/cover-sync.toml";

#[derive(Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub notion: NotionConfig,
    pub properties: PropertyNames,
}

impl Config {
    pub fn open(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path).context("Failed to read file")?;
        let config = toml::from_str(&text).context("Failed to parse config")?;
        Ok(config)
    }

    /// 指定がなければ ~/.config/cover-sync.toml を探す、それもなければデフォルト
    pub fn load(path: Option<&Path>) -> Result<Config> {
        if let Some(path) = path {
            return Config::open(path).with_context(|| format!("Failed to load {path:?}"));
        }
        match default_path() {
            Some(path) if path.exists() => {
                log::debug!("config = {path:?}");
                Config::open(&path).with_context(|| format!("Failed to load {path:?}"))
            }
            _ => Ok(Config::default()),
        }
    }
}

#[derive(Deserialize, PartialEq, Clone, Debug, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct NotionConfig {
    pub base_url: Option<String>,
    pub version: Option<String>,
}

fn default_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(DEFAULT_CONFIG_PATH))
}

#[test]
fn test_parse_full_config() {
    let config: Config = toml::from_str(
        r#"
        [notion]
        base-url = "http://localhost:8080/v1"
        version = "2022-02-22"

        [properties]
        theme = "Main Theme"
        content-type = "Content Type"
        content-type-value = "Post"
        "#,
    )
    .unwrap();
    assert_eq!(
        config.notion.base_url.as_deref(),
        Some("http://localhost:8080/v1")
    );
    assert_eq!(config.notion.version.as_deref(), Some("2022-02-22"));
    assert_eq!(
        config.properties,
        PropertyNames {
            theme: "Main Theme".to_string(),
            content_type: "Content Type".to_string(),
            content_type_value: "Post".to_string(),
        }
    );
}

#[test]
fn test_parse_partial_config() {
    let config: Config = toml::from_str(
        r#"
        [properties]
        theme = "Tema"
        "#,
    )
    .unwrap();
    assert_eq!(config.notion, NotionConfig::default());
    assert_eq!(config.properties.theme, "Tema");
    assert_eq!(config.properties.content_type, "Tipo de contenido");
    assert_eq!(config.properties.content_type_value, "Blog");
}

#[test]
fn test_empty_config_is_default() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config, Config::default());
}
