//! In-memory `ResourceApi` used by unit tests

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::api::{ResourceApi, ResponseBody};
use crate::errors::ApiError;
use crate::models::{Resource, ResourceItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Fetch,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
pub enum Failure {
    Status(u16, String),
    Decode,
}

#[derive(Default)]
struct State {
    collections: HashMap<Resource, Vec<ResourceItem>>,
    failures: HashMap<Op, Failure>,
    next_id: usize,
}

#[derive(Default)]
pub struct FakeApi {
    state: Mutex<State>,
    requests: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(self, resource: Resource, items: Vec<Value>) -> Self {
        self.seed(resource, items);
        self
    }

    pub fn seed(&self, resource: Resource, items: Vec<Value>) {
        let items = items
            .into_iter()
            .map(|v| serde_json::from_value(v).expect("test item must be an object"))
            .collect();
        self.state.lock().unwrap().collections.insert(resource, items);
    }

    pub fn fail(&self, op: Op, failure: Failure) {
        self.state.lock().unwrap().failures.insert(op, failure);
    }

    pub fn recover(&self, op: Op) {
        self.state.lock().unwrap().failures.remove(&op);
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn stored(&self, resource: Resource) -> Vec<ResourceItem> {
        self.state.lock().unwrap().collections.get(&resource).cloned().unwrap_or_default()
    }

    fn begin(&self, op: Op) -> Result<(), ApiError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        match self.state.lock().unwrap().failures.get(&op) {
            Some(Failure::Status(status, message)) => Err(ApiError::Status {
                status: *status,
                message: message.clone(),
            }),
            Some(Failure::Decode) => Err(ApiError::Decode {
                url: "fake://".to_string(),
                reason: "body is not JSON: <html>".to_string(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ResourceApi for FakeApi {
    async fn list(&self, resource: Resource) -> Result<Vec<ResourceItem>, ApiError> {
        self.begin(Op::List)?;
        Ok(self.stored(resource))
    }

    async fn fetch(&self, resource: Resource, id: &str) -> Result<ResourceItem, ApiError> {
        self.begin(Op::Fetch)?;
        self.stored(resource)
            .into_iter()
            .find(|item| item.has_id(id))
            .ok_or_else(|| ApiError::Status {
                status: 404,
                message: "Not found".to_string(),
            })
    }

    async fn create(&self, resource: Resource, payload: &Map<String, Value>) -> Result<ResponseBody, ApiError> {
        self.begin(Op::Create)?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let mut fields = payload.clone();
        fields.insert("_id".to_string(), Value::String(format!("new-{}", state.next_id)));
        let item = ResourceItem::new(fields.clone());
        state.collections.entry(resource).or_default().push(item);
        Ok(ResponseBody::Json(Value::Object(fields)))
    }

    async fn update(
        &self,
        resource: Resource,
        id: &str,
        payload: &Map<String, Value>,
    ) -> Result<ResponseBody, ApiError> {
        self.begin(Op::Update)?;
        let mut state = self.state.lock().unwrap();
        let items = state.collections.entry(resource).or_default();
        let item = items.iter_mut().find(|item| item.has_id(id)).ok_or_else(|| ApiError::Status {
            status: 404,
            message: "Not found".to_string(),
        })?;
        item.merge(payload);
        Ok(ResponseBody::Json(Value::Object(item.fields().clone())))
    }

    async fn delete(&self, resource: Resource, id: &str) -> Result<ResponseBody, ApiError> {
        self.begin(Op::Delete)?;
        let mut state = self.state.lock().unwrap();
        let items = state.collections.entry(resource).or_default();
        let before = items.len();
        items.retain(|item| !item.has_id(id));
        if items.len() == before {
            return Err(ApiError::Status {
                status: 404,
                message: "Not found".to_string(),
            });
        }
        Ok(ResponseBody::Json(serde_json::json!({"message": "deleted"})))
    }
}
