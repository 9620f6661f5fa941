//! 项目服务的 HTTP 客户端
//!
//! 以 JSON POST 调用本地项目服务：`/setMatches`、`/setTarget`、`/getSegment`。

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::translation::config::OrchestratorConfig;
use crate::translation::error::{TranslationError, TranslationResult};
use crate::translation::storage::project::{
    ProjectService, SegmentData, SegmentRequest, ServiceStatus, SetMatchesRequest,
    SetTargetRequest,
};

/// 基于 reqwest 的项目服务客户端
#[derive(Debug, Clone)]
pub struct HttpProjectService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProjectService {
    pub fn new(base_url: &str, timeout: Duration) -> TranslationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TranslationError::ConfigError(format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &OrchestratorConfig) -> TranslationResult<Self> {
        Self::new(&config.service_url, config.request_timeout())
    }

    fn endpoint(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation)
    }

    async fn post<B, R>(&self, operation: &str, body: &B) -> TranslationResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.endpoint(operation);
        tracing::debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranslationError::NetworkError(format!(
                "{} returned HTTP status {}",
                operation,
                status.as_u16()
            )));
        }

        let text = response.text().await?;
        parse_response(&text)
    }
}

/// 解析服务响应：先检查状态，再取数据
fn parse_response<R: DeserializeOwned>(text: &str) -> TranslationResult<R> {
    let status: ServiceStatus = serde_json::from_str(text)?;
    status.check()?;
    Ok(serde_json::from_str(text)?)
}

#[async_trait]
impl ProjectService for HttpProjectService {
    async fn set_matches(&self, request: &SetMatchesRequest) -> TranslationResult<()> {
        let _: ServiceStatus = self.post("setMatches", request).await?;
        Ok(())
    }

    async fn set_target(&self, request: &SetTargetRequest) -> TranslationResult<()> {
        let _: ServiceStatus = self.post("setTarget", request).await?;
        Ok(())
    }

    async fn get_segment(&self, request: &SegmentRequest) -> TranslationResult<SegmentData> {
        self.post("getSegment", request).await
    }
}
