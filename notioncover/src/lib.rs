pub mod mapping;
pub mod notion;

use anyhow::{bail, ensure, Result};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::notion::{
    client::NotionApi,
    types::{ApiResponse, DatabaseQuery, ErrorEnvelope, Page, PropertyValue, UpdatePageRequest},
};

pub use crate::mapping::ThemeMap;

pub const QUERY_FAILURE_MESSAGE: &str = "Error retrieving pages from database";
pub const QUERY_FAILURE_CODE: u16 = 400;

/// データベース側のプロパティ名
#[derive(Deserialize, PartialEq, Eq, Clone, Debug)]
#[serde(rename_all = "kebab-case", default)]
pub struct PropertyNames {
    pub theme: String,
    pub content_type: String,
    pub content_type_value: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        PropertyNames {
            theme: "Tema Principal".to_string(),
            content_type: "Tipo de contenido".to_string(),
            content_type_value: "Blog".to_string(),
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct Summary {
    pub total: usize,
    pub updated: usize,
    pub unmapped: usize,
    pub failed: usize,
    pub undecodable: usize,
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("{message} (code {code}): {envelope}")]
    QueryRejected {
        message: String,
        code: u16,
        envelope: ErrorEnvelope,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// 対象のページを取ってきて、テーマに対応する画像をカバーにする
pub async fn sync_covers<N: NotionApi + Sync>(
    client: &N,
    database_id: &str,
    images: &ThemeMap,
    properties: &PropertyNames,
) -> Result<Summary, SyncError> {
    let query =
        DatabaseQuery::select_equals(&properties.content_type, &properties.content_type_value);
    let pages = match client.query_database(database_id, &query).await? {
        ApiResponse::Ok(res) => res.results,
        ApiResponse::Error(envelope) => {
            log::error!("{QUERY_FAILURE_MESSAGE}: {envelope}");
            return Err(SyncError::QueryRejected {
                message: QUERY_FAILURE_MESSAGE.to_string(),
                code: QUERY_FAILURE_CODE,
                envelope,
            });
        }
    };

    log::info!(
        "Processing {} {} pages",
        pages.len(),
        properties.content_type_value.to_lowercase()
    );

    let mut summary = Summary {
        total: pages.len(),
        ..Default::default()
    };
    for page in &pages {
        let theme = match page_theme(page, &properties.theme) {
            Ok(theme) => theme,
            Err(e) => {
                log::warn!("Skipping page {}: {e}", page.id);
                summary.undecodable += 1;
                continue;
            }
        };

        let Some(url) = images.lookup(theme) else {
            log::info!("No image found for theme: {theme}");
            summary.unmapped += 1;
            continue;
        };

        log::info!("Updating cover for theme: {theme}");
        let req = UpdatePageRequest::external_cover(url);
        match client.update_page(&page.id, &req).await {
            Ok(ApiResponse::Ok(_)) => summary.updated += 1,
            Ok(ApiResponse::Error(envelope)) => {
                log::error!("Error updating cover for theme: {theme} ({envelope})");
                summary.failed += 1;
            }
            Err(e) => {
                log::error!("Error updating cover for theme: {theme} ({e:#})");
                summary.failed += 1;
            }
        }
    }

    log::info!("Successfully updated {} pages", summary.updated);
    Ok(summary)
}

/// ページの select プロパティの選択肢名を取り出す
pub fn page_theme<'a>(page: &'a Page, property: &str) -> Result<&'a str> {
    match page.properties.get(property) {
        Some(PropertyValue::Select {
            select: Some(option),
        }) => Ok(option.name.as_str()),
        Some(PropertyValue::Select { select: None }) => bail!("{property:?} has no selection"),
        Some(_) => bail!("{property:?} is not a select property"),
        None => bail!("{property:?} not found"),
    }
}

/// id をダッシュでつなげたやつにする
pub fn to_dashed_id(id: &str) -> Result<String> {
    let id = id.trim();
    ensure!(id.replace('-', "").len() == 32, "invalid notion id {id:?}");
    let id = Uuid::try_parse(id).map_err(|e| anyhow::anyhow!("invalid notion id {id:?}: {e}"))?;
    Ok(id.hyphenated().to_string())
}

#[test]
fn test_to_dashed_id() {
    const ID: &str = "2131b10cebf64938a1277089ff02dbe4";
    assert_eq!(
        to_dashed_id(ID).ok(),
        Some("2131b10c-ebf6-4938-a127-7089ff02dbe4".to_string())
    );
    assert_eq!(
        to_dashed_id("2131b10c-ebf6-4938-a127-7089ff02dbe4").ok(),
        Some("2131b10c-ebf6-4938-a127-7089ff02dbe4".to_string())
    );
    assert!(to_dashed_id("not-an-id").is_err());
}
