//! HTTP client for the REST API

use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::api::response::{ApiResponse, ResponseBody};
use crate::api::session::Session;
use crate::api::ResourceApi;
use crate::config::Config;
use crate::errors::ApiError;
use crate::models::{Resource, ResourceItem};

/// Thin wrapper over `reqwest::Client` that knows the API layout
///
/// When a session is attached its token is sent as a bearer credential on
/// every request; the cookie jar carries any session cookie the server sets.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    bearer: Option<String>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Self::with_base(&config.api_base, config)
    }

    /// Client rooted at a different host, e.g. the recovery service
    pub fn with_base(base: &str, config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .cookie_store(true)
            .build()?;

        Ok(Self {
            http,
            base_url: Url::parse(base)?,
            bearer: None,
        })
    }

    pub fn with_session(mut self, session: Option<&Session>) -> Self {
        self.bearer = session.map(|s| s.token.clone());
        self
    }

    pub fn set_bearer(&mut self, token: Option<String>) {
        self.bearer = token;
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer.is_some()
    }

    /// `<base>/api/<segments...>`
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::Config(format!("Base URL cannot carry a path: {}", self.base_url)))?
            .pop_if_empty()
            .push("api")
            .extend(segments);
        Ok(url)
    }

    pub fn resource_url(&self, resource: Resource, id: Option<&str>) -> Result<Url, ApiError> {
        match id {
            Some(id) => self.endpoint(&[resource.path(), id]),
            None => self.endpoint(&[resource.path()]),
        }
    }

    /// Issue a request and decode whatever comes back, whatever the status
    pub async fn send(&self, method: Method, url: Url, body: Option<&Value>) -> Result<ApiResponse, ApiError> {
        debug!("{} {}", method, url);

        let mut request = self.http.request(method, url);
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;

        debug!("Response status {} ({} bytes)", status, text.len());

        Ok(ApiResponse {
            status,
            body: ResponseBody::parse(&text),
        })
    }

    /// GET that fails on non-2xx
    pub async fn get(&self, segments: &[&str]) -> Result<ResponseBody, ApiError> {
        let url = self.endpoint(segments)?;
        self.send(Method::GET, url, None).await?.into_result()
    }

    /// POST a JSON body and return the raw response for status-specific handling
    pub async fn post(&self, segments: &[&str], body: &Value) -> Result<ApiResponse, ApiError> {
        let url = self.endpoint(segments)?;
        self.send(Method::POST, url, Some(body)).await
    }

    pub async fn put(&self, segments: &[&str], body: &Value) -> Result<ResponseBody, ApiError> {
        let url = self.endpoint(segments)?;
        self.send(Method::PUT, url, Some(body)).await?.into_result()
    }
}

#[async_trait]
impl ResourceApi for ApiClient {
    async fn list(&self, resource: Resource) -> Result<Vec<ResourceItem>, ApiError> {
        let url = self.resource_url(resource, None)?;
        let url_text = url.to_string();
        self.send(Method::GET, url, None)
            .await?
            .into_result()?
            .into_items(&url_text)
    }

    async fn fetch(&self, resource: Resource, id: &str) -> Result<ResourceItem, ApiError> {
        let url = self.resource_url(resource, Some(id))?;
        let url_text = url.to_string();
        let body = self.send(Method::GET, url, None).await?.into_result()?;
        match body {
            ResponseBody::Json(Value::Object(obj)) => Ok(ResourceItem::new(obj)),
            other => Err(ApiError::Decode {
                url: url_text,
                reason: format!("expected a JSON object, got {:?}", other),
            }),
        }
    }

    async fn create(&self, resource: Resource, payload: &Map<String, Value>) -> Result<ResponseBody, ApiError> {
        let url = self.resource_url(resource, None)?;
        let body = Value::Object(payload.clone());
        self.send(Method::POST, url, Some(&body)).await?.into_result()
    }

    async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: &Map<String, Value>,
    ) -> Result<ResponseBody, ApiError> {
        let url = self.resource_url(resource, Some(id))?;
        let body = Value::Object(payload.clone());
        self.send(Method::PUT, url, Some(&body)).await?.into_result()
    }

    async fn delete(&self, resource: Resource, id: &str) -> Result<ResponseBody, ApiError> {
        let url = self.resource_url(resource, Some(id))?;
        self.send(Method::DELETE, url, None).await?.into_result()
    }
}
