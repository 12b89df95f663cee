use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::error::TransportError;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct PortalResponse {
    pub status: u16,
    /// Final URL after redirects; login outcome markers live here.
    pub final_url: String,
    pub body: String,
}

impl PortalResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait PortalTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<PortalResponse, TransportError>;

    async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<PortalResponse, TransportError>;

    async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<PortalResponse, TransportError>;
}

pub fn portal_base(subdomain: &str, base_override: Option<&Url>) -> String {
    match base_override {
        Some(url) => url.as_str().trim_end_matches('/').to_string(),
        None => format!("https://{subdomain}.edupage.org"),
    }
}

pub fn with_query(base: &str, path: &str, params: &[(&str, &str)]) -> String {
    let raw = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
    match Url::parse_with_params(&raw, params) {
        Ok(url) => url.to_string(),
        Err(_) => raw,
    }
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;

        Ok(Self { client })
    }

    async fn read(
        url: &str,
        sent: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<PortalResponse, TransportError> {
        let response = sent.map_err(|e| TransportError::Request {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| TransportError::Body {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(%url, status, bytes = body.len(), "portal response");

        Ok(PortalResponse {
            status,
            final_url,
            body,
        })
    }
}

#[async_trait]
impl PortalTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<PortalResponse, TransportError> {
        Self::read(url, self.client.get(url).send().await).await
    }

    async fn post_form(
        &self,
        url: &str,
        fields: &[(String, String)],
    ) -> Result<PortalResponse, TransportError> {
        Self::read(url, self.client.post(url).form(fields).send().await).await
    }

    async fn post_json(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<PortalResponse, TransportError> {
        Self::read(url, self.client.post(url).json(payload).send().await).await
    }
}
