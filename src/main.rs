mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use notioncover::{
    notion::client::{self, Notion},
    sync_covers, to_dashed_id, ThemeMap,
};
use shadow_rs::shadow;

use crate::config::Config;

shadow!(build);

#[derive(Parser, Debug)]
#[clap(version = build::CLAP_LONG_VERSION)]
pub struct Cli {
    #[clap(short, long, env = "NOTION_TOKEN", hide_env_values = true)]
    token: String,

    #[clap(short, long, env = "DATABASE_ID")]
    database_id: String,

    /// theme,image_url の CSV
    #[clap(long, default_value = "images.csv")]
    csv: PathBuf,

    #[clap(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();

    let Cli {
        token,
        database_id,
        csv,
        config,
    } = Cli::parse();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stdout)
        .init();

    let Config { notion, properties } = Config::load(config.as_deref())?;

    let images = ThemeMap::open(&csv).context("Failed to load theme mappings")?;
    log::info!("Loaded {} theme mappings", images.len());

    let database_id = to_dashed_id(&database_id).context("parse database id")?;

    let mut client_config = client::NotionConfig::new(token);
    if let Some(base_url) = notion.base_url {
        client_config.base_url = base_url;
    }
    if let Some(version) = notion.version {
        client_config.version = version;
    }
    let client = Notion::new(client_config)?;
    log::debug!("base_url = {}", client.base_url());

    let summary = sync_covers(&client, &database_id, &images, &properties).await?;
    log::debug!("{summary:?}");

    Ok(())
}
