use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::TargetStore;
use crate::config::NotionConfig;
use crate::error::{read_json, SyncError};
use crate::model::record::{FieldMap, RecordPage, SelectOption};
use crate::util::retry::RetryPolicy;

const API_BASE: &str = "https://api.notion.com/v1";
const API_VERSION: &str = "2022-06-28";
const QUERY_PAGE_SIZE: u32 = 100;

pub struct NotionStore {
    api_base: String,
    database_id: String,
    auth_header: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct CreatedPage {
    id: String,
}

impl NotionStore {
    pub fn new(
        config: &NotionConfig,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, SyncError> {
        Self::with_base_url(API_BASE.to_string(), config, timeout, retry)
    }

    pub fn with_base_url(
        api_base: String,
        config: &NotionConfig,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_base,
            database_id: config.database_id.clone(),
            auth_header: format!("Bearer {}", config.token),
            client,
            retry,
        })
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, SyncError> {
        let url = format!("{}{path}", self.api_base);
        let what = format!("{method} {path}");
        self.retry
            .execute(&what, || async {
                let resp = self
                    .client
                    .request(method.clone(), &url)
                    .header("Authorization", &self.auth_header)
                    .header("Notion-Version", API_VERSION)
                    .json(body)
                    .send()
                    .await?;
                read_json(resp).await
            })
            .await
    }
}

#[async_trait]
impl TargetStore for NotionStore {
    fn name(&self) -> &str {
        "Notion"
    }

    async fn query_page(&self, cursor: Option<&str>) -> Result<RecordPage, SyncError> {
        let mut body = json!({ "page_size": QUERY_PAGE_SIZE });
        if let Some(cursor) = cursor {
            body["start_cursor"] = json!(cursor);
        }
        let path = format!("/databases/{}/query", self.database_id);
        self.send(reqwest::Method::POST, &path, &body).await
    }

    async fn create_record(&self, fields: &FieldMap) -> Result<String, SyncError> {
        let body = json!({
            "parent": { "database_id": self.database_id },
            "properties": fields,
        });
        let page: CreatedPage = self.send(reqwest::Method::POST, "/pages", &body).await?;
        Ok(page.id)
    }

    async fn update_record(&self, record_id: &str, fields: &FieldMap) -> Result<(), SyncError> {
        let body = json!({ "properties": fields });
        let path = format!("/pages/{record_id}");
        let _: serde_json::Value = self.send(reqwest::Method::PATCH, &path, &body).await?;
        Ok(())
    }

    async fn set_field_options(
        &self,
        field: &str,
        options: &[SelectOption],
    ) -> Result<(), SyncError> {
        let body = json!({
            "properties": {
                field: { "multi_select": { "options": options } }
            }
        });
        let path = format!("/databases/{}", self.database_id);
        let _: serde_json::Value = self.send(reqwest::Method::PATCH, &path, &body).await?;
        Ok(())
    }
}
