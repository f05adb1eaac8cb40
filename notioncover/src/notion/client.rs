use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{header, Method};
use serde::{de::DeserializeOwned, Serialize};

use super::types::*;

pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";
pub const NOTION_VERSION: &str = "2022-06-28";

#[derive(Clone, Debug)]
pub struct NotionConfig {
    pub token: String,
    pub base_url: String,
    pub version: String,
}

impl NotionConfig {
    pub fn new(token: String) -> NotionConfig {
        NotionConfig {
            token,
            base_url: NOTION_API_BASE.to_string(),
            version: NOTION_VERSION.to_string(),
        }
    }
}

/// 同期処理から見た Notion
#[async_trait]
pub trait NotionApi {
    async fn query_database(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
    ) -> Result<ApiResponse<QueryDatabaseResponse>>;

    async fn update_page(
        &self,
        page_id: &str,
        req: &UpdatePageRequest,
    ) -> Result<ApiResponse<Page>>;
}

#[derive(Debug)]
pub struct Notion {
    config: NotionConfig,
    client: reqwest::Client,
}

impl Notion {
    pub fn new(config: NotionConfig) -> Result<Notion> {
        let client = reqwest::Client::builder().build().context("build client")?;
        Ok(Notion { config, client })
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    pub async fn request<R: DeserializeOwned>(
        &self,
        method: Method,
        resource: &str,
        body: &impl Serialize,
    ) -> Result<ApiResponse<R>> {
        let url = format!("{}{resource}", self.base_url());
        log::debug!("{method} {url}");
        let res = self
            .client
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json")
            .header("Notion-Version", &self.config.version)
            .bearer_auth(&self.config.token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to request {url}"))?;
        let status = res.status();
        let text = res.text().await.context("read body")?;

        let value = match serde_json::from_str::<serde_json::Value>(&text) {
            Ok(value) => value,
            Err(_) if !status.is_success() => bail!("{status} {text}"),
            Err(e) => return Err(e).with_context(|| format!("parse json {text:?}")),
        };
        if value.get("status").is_some() {
            let envelope = serde_json::from_value::<ErrorEnvelope>(value)
                .with_context(|| format!("parse error envelope {text:?}"))?;
            log::debug!("{url} -> {envelope}");
            return Ok(ApiResponse::Error(envelope));
        }
        if !status.is_success() {
            bail!("{status} {text}");
        }
        let res = serde_json::from_value::<R>(value)
            .with_context(|| format!("parse json {text:?}"))?;
        Ok(ApiResponse::Ok(res))
    }
}

#[async_trait]
impl NotionApi for Notion {
    async fn query_database(
        &self,
        database_id: &str,
        query: &DatabaseQuery,
    ) -> Result<ApiResponse<QueryDatabaseResponse>> {
        self.request(
            Method::POST,
            &format!("/databases/{database_id}/query"),
            query,
        )
        .await
    }

    async fn update_page(
        &self,
        page_id: &str,
        req: &UpdatePageRequest,
    ) -> Result<ApiResponse<Page>> {
        self.request(Method::PATCH, &format!("/pages/{page_id}"), req)
            .await
    }
}
