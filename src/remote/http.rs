//! reqwest-backed implementation of [`RemoteDrive`].
//!
//! Every API call is a JSON POST returning a `{ success, message, ... }`
//! envelope; uploads go to a separate ingest host as multipart parts.

use super::{
    AggregateResult, ConnectInfo, DriveItem, ProgressFn, RemoteDrive, SelectionItem,
};
use crate::common::config::AppConfig;
use crate::common::errors::ClientError;
use async_trait::async_trait;
use chrono::Local;
use reqwest::multipart;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

const USER_AGENT: &str = concat!("pandrive/", env!("CARGO_PKG_VERSION"));

pub struct HttpDrive {
    client: reqwest::Client,
    base_url: String,
    upload_url: String,
    token: String,
    page_size: u32,
    part_size: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    success: bool,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(flatten)]
    info: Option<ConnectInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    files: Vec<DriveItem>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateContainerResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DirectLinkResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregateResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(flatten)]
    result: Option<AggregateResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadPartResponse {
    success: bool,
    #[serde(default)]
    message: String,
    #[serde(default)]
    fid: String,
}

impl HttpDrive {
    pub fn new(config: &AppConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            upload_url: config.api.upload_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            page_size: config.api.page_size,
            part_size: config.transfer.part_size,
        }
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T, ClientError> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("Accesstoken", &self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let text = response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        serde_json::from_str(&text)
            .map_err(|e| ClientError::ResponseParse(format!("{path}: {e}")))
    }
}

#[async_trait]
impl RemoteDrive for HttpDrive {
    async fn connect(&self, token: &str) -> Result<ConnectInfo, ClientError> {
        let response: ConnectResponse = self
            .post_json("connect", json!({ "token": token }))
            .await?;

        if !response.success {
            return Err(ClientError::Connection(response.message));
        }
        response
            .info
            .ok_or_else(|| ClientError::ResponseParse("connect: missing session fields".into()))
    }

    async fn list(&self, location_id: &str) -> Result<Vec<DriveItem>, ClientError> {
        let response: ListResponse = self
            .post_json(
                "list",
                json!({ "locationId": location_id, "pageSize": self.page_size }),
            )
            .await?;

        if !response.success {
            return Err(ClientError::Remote(response.message));
        }
        Ok(response.files)
    }

    async fn upload(
        &self,
        payload: &Path,
        name: &str,
        size: u64,
        target_id: &str,
        progress: ProgressFn<'_>,
    ) -> Result<String, ClientError> {
        let total_parts = size.div_ceil(self.part_size).max(1);
        let unique_id = Uuid::new_v4().to_string();
        let batch_no = Local::now().format("%Y%m%d%H%M%S").to_string();
        let url = format!("{}/upload", self.upload_url);

        let mut file = tokio::fs::File::open(payload)
            .await
            .map_err(|e| ClientError::Transport(format!("{}: {e}", payload.display())))?;

        let mut sent: u64 = 0;
        let mut fid = String::new();

        for part_index in 1..=total_parts {
            let part_len = (size - sent).min(self.part_size) as usize;
            let mut buffer = vec![0u8; part_len];
            file.read_exact(&mut buffer)
                .await
                .map_err(|e| ClientError::Transport(format!("{}: {e}", payload.display())))?;

            let form = multipart::Form::new()
                .text("uniqueId", unique_id.clone())
                .text("batchNo", batch_no.clone())
                .text("fileName", name.to_string())
                .text("fileSize", size.to_string())
                .text("totalPart", total_parts.to_string())
                .text("partIndex", part_index.to_string())
                .text("partSize", part_len.to_string())
                .text("directoryId", target_id.to_string())
                .part(
                    "file",
                    multipart::Part::bytes(buffer).file_name(name.to_string()),
                );

            let response = self
                .client
                .post(&url)
                .header("Accesstoken", &self.token)
                .multipart(form)
                .send()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;

            let text = response
                .text()
                .await
                .map_err(|e| ClientError::Transport(e.to_string()))?;
            let part: UploadPartResponse = serde_json::from_str(&text)
                .map_err(|e| ClientError::ResponseParse(format!("upload part {part_index}: {e}")))?;

            if !part.success {
                return Err(ClientError::Remote(part.message));
            }
            if !part.fid.is_empty() {
                fid = part.fid;
            }

            sent += part_len as u64;
            progress(sent, size.max(1));
        }

        if fid.is_empty() {
            return Err(ClientError::ResponseParse(
                "upload completed but no file id was returned".into(),
            ));
        }
        Ok(fid)
    }

    async fn delete(&self, item_id: &str, is_container: bool) -> Result<(), ClientError> {
        let response: Envelope = self
            .post_json(
                "delete",
                json!({ "itemId": item_id, "isContainer": is_container }),
            )
            .await?;

        if !response.success {
            return Err(ClientError::Remote(response.message));
        }
        Ok(())
    }

    async fn create_container(&self, name: &str, parent_id: &str) -> Result<String, ClientError> {
        let response: CreateContainerResponse = self
            .post_json(
                "createContainer",
                json!({ "name": name, "parentId": parent_id }),
            )
            .await?;

        if !response.success {
            return Err(ClientError::Remote(response.message));
        }
        if response.id.is_empty() {
            return Err(ClientError::ResponseParse(
                "createContainer: response carried no container id".into(),
            ));
        }
        Ok(response.id)
    }

    async fn direct_link(&self, fid: &str) -> Result<String, ClientError> {
        let response: DirectLinkResponse = self
            .post_json("getDirectLink", json!({ "itemId": fid }))
            .await?;

        if !response.success {
            return Err(ClientError::Remote(response.message));
        }
        if response.url.is_empty() {
            return Err(ClientError::ResponseParse(
                "getDirectLink: response carried no url".into(),
            ));
        }
        Ok(response.url)
    }

    async fn aggregate_links(
        &self,
        items: &[SelectionItem],
        target_path: &str,
    ) -> Result<AggregateResult, ClientError> {
        let response: AggregateResponse = self
            .post_json(
                "aggregateLinks",
                json!({ "items": items, "targetPath": target_path }),
            )
            .await?;

        if !response.success {
            return Err(ClientError::Remote(response.message));
        }
        response
            .result
            .ok_or_else(|| ClientError::ResponseParse("aggregateLinks: missing result fields".into()))
    }
}
