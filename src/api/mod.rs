//! Remote API access
//!
//! `ResourceApi` is the seam between the list controller and the network:
//! the controller only ever talks to this trait, `ApiClient` implements it
//! over HTTP.

pub mod client;
pub mod recovery;
pub mod response;
pub mod session;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::ApiError;
use crate::models::{Resource, ResourceItem};

pub use client::ApiClient;
pub use recovery::{RecoveryFlow, RecoveryStep};
pub use response::{ApiResponse, ResponseBody};
pub use session::{Authenticator, LoginErrors, Session, SessionStore};

/// CRUD operations over a collection resource
#[async_trait]
pub trait ResourceApi: Send + Sync {
    /// `GET /api/<resource>`
    async fn list(&self, resource: Resource) -> Result<Vec<ResourceItem>, ApiError>;

    /// `GET /api/<resource>/:id`
    async fn fetch(&self, resource: Resource, id: &str) -> Result<ResourceItem, ApiError>;

    /// `POST /api/<resource>`
    async fn create(&self, resource: Resource, payload: &Map<String, Value>) -> Result<ResponseBody, ApiError>;

    /// `PUT /api/<resource>/:id`
    async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: &Map<String, Value>,
    ) -> Result<ResponseBody, ApiError>;

    /// `DELETE /api/<resource>/:id`
    async fn delete(&self, resource: Resource, id: &str) -> Result<ResponseBody, ApiError>;
}
