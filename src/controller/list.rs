//! Generic list controller shared by every resource screen

use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::api::{ResourceApi, ResponseBody};
use crate::controller::pagination::{PageView, Paginated};
use crate::errors::ApiError;
use crate::models::{Resource, ResourceItem};
use crate::schema::{schema_for, ResourceSchema};
use crate::validation::{validate_payload, ValidationMode};

/// Lifecycle of the collection behind a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Mounted, nothing requested yet
    Idle,
    Loading,
    Ready,
}

/// Identifies one issued `load()`; only the newest ticket may change state
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// Result of a load running in a spawned task
#[derive(Debug)]
pub struct LoadResult {
    pub resource: Resource,
    pub ticket: LoadTicket,
    pub result: Result<Vec<ResourceItem>, ApiError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The collection was replaced with this many items
    Applied(usize),
    /// A newer load was issued meanwhile; nothing changed
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteTicket {
    id: String,
}

impl DeleteTicket {
    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    Removed,
    /// A delete for this id is already in flight
    AlreadyPending,
}

/// Paginated, locally mutable view over one remote collection
///
/// The server stays the source of truth: every successful `load()` replaces
/// the collection wholesale, while creates, updates and deletes patch the
/// local copy until the next load.
pub struct ResourceListController<A> {
    api: Arc<A>,
    schema: ResourceSchema,
    items: Vec<ResourceItem>,
    view: PageView,
    phase: Phase,
    pending_delete: Option<String>,
    deleting: HashSet<String>,
    issued: u64,
}

impl<A: ResourceApi> ResourceListController<A> {
    pub fn new(api: Arc<A>, resource: Resource, page_size: usize) -> Self {
        Self {
            api,
            schema: schema_for(resource),
            items: Vec::new(),
            view: PageView::new(page_size),
            phase: Phase::Idle,
            pending_delete: None,
            deleting: HashSet::new(),
            issued: 0,
        }
    }

    pub fn resource(&self) -> Resource {
        self.schema.resource
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    pub fn api(&self) -> Arc<A> {
        self.api.clone()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    pub fn items(&self) -> &[ResourceItem] {
        &self.items
    }

    pub fn find(&self, id: &str) -> Option<&ResourceItem> {
        self.items.iter().find(|item| item.has_id(id))
    }

    /// Items on the current page
    pub fn visible(&self) -> &[ResourceItem] {
        self.view.slice(&self.items)
    }

    pub fn page_size(&self) -> usize {
        self.view.page_size()
    }

    /// Id of the most recently started delete, shown as the busy row
    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    /// Whether a delete of `id` is still in flight
    pub fn is_pending(&self, id: &str) -> bool {
        self.deleting.contains(id)
    }

    /// Start a load: marks the controller loading and issues a fresh ticket
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued += 1;
        self.phase = Phase::Loading;
        LoadTicket(self.issued)
    }

    /// Apply the response of a load started with `begin_load`
    ///
    /// Responses for anything but the most recently issued ticket are
    /// discarded, so overlapping loads resolve to the newest request no
    /// matter which answer arrives last. Failures keep the previous items.
    pub fn apply_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<ResourceItem>, ApiError>,
    ) -> Result<LoadOutcome, ApiError> {
        if ticket.0 != self.issued {
            debug!(
                "Discarding stale {} load #{} (latest #{})",
                self.resource(),
                ticket.0,
                self.issued
            );
            return Ok(LoadOutcome::Stale);
        }

        self.phase = Phase::Ready;
        match result {
            Ok(items) => {
                let strip = self.schema.strip_fields;
                self.items = items.into_iter().map(|item| item.without_fields(strip)).collect();
                self.view.clamp(self.items.len());
                debug!("Loaded {} {}", self.items.len(), self.resource());
                Ok(LoadOutcome::Applied(self.items.len()))
            }
            Err(e) => {
                warn!("Error fetching {}: {}", self.resource(), e);
                Err(e)
            }
        }
    }

    /// Fetch the full collection and replace the local copy
    pub async fn load(&mut self) -> Result<usize, ApiError> {
        let ticket = self.begin_load();
        let result = self.api.list(self.resource()).await;
        match self.apply_load(ticket, result)? {
            LoadOutcome::Applied(count) => Ok(count),
            LoadOutcome::Stale => Ok(self.items.len()),
        }
    }

    /// Re-run `load()` because the screen became visible again
    pub async fn refresh_on_focus(&mut self) -> Result<usize, ApiError> {
        info!("{} regained focus, refreshing", self.resource());
        self.load().await
    }

    /// Issue a load on a spawned task; the result arrives on `tx`
    pub fn spawn_load(&mut self, tx: UnboundedSender<LoadResult>) -> LoadTicket
    where
        A: 'static,
    {
        let ticket = self.begin_load();
        let api = self.api.clone();
        let resource = self.resource();
        tokio::spawn(async move {
            let result = api.list(resource).await;
            if tx.send(LoadResult { resource, ticket, result }).is_err() {
                debug!("Screen for {} closed before load #{} finished", resource, ticket.0);
            }
        });
        ticket
    }

    pub async fn fetch_one(&self, id: &str) -> Result<ResourceItem, ApiError> {
        self.api.fetch(self.resource(), id).await
    }

    fn ensure_mutable(&self) -> Result<(), ApiError> {
        if self.resource().is_mutable() {
            Ok(())
        } else {
            Err(ApiError::ReadOnly(self.resource()))
        }
    }

    /// Validate, POST, and splice the created item into the local collection
    pub async fn create(&mut self, payload: Map<String, Value>) -> Result<Option<ResourceItem>, ApiError> {
        self.ensure_mutable()?;
        validate_payload(&self.schema.fields, &payload, ValidationMode::Create)?;

        let body = self.api.create(self.resource(), &payload).await.map_err(|e| {
            warn!("Error creating {}: {}", self.resource().singular(), e);
            e
        })?;

        let created = body.as_item();
        match &created {
            Some(item) => {
                info!("Created {} {}", self.resource().singular(), item.id().unwrap_or_default());
                self.splice(item.clone());
            }
            None => debug!("Create response carried no item; waiting for the next load"),
        }
        Ok(created)
    }

    /// Validate, PUT, and replace the local copy of `id`
    pub async fn update(&mut self, id: &str, payload: Map<String, Value>) -> Result<Option<ResourceItem>, ApiError> {
        self.ensure_mutable()?;
        validate_payload(&self.schema.fields, &payload, ValidationMode::Update)?;

        let body = self.api.update(self.resource(), id, &payload).await.map_err(|e| {
            warn!("Error updating {} {}: {}", self.resource().singular(), id, e);
            e
        })?;

        info!("Updated {} {}", self.resource().singular(), id);
        let updated = match body.as_item().filter(|item| item.has_id(id)) {
            Some(item) => {
                self.splice(item.clone());
                Some(item)
            }
            None => self.find_mut(id).map(|item| {
                item.merge(&payload);
                item.clone()
            }),
        };
        Ok(updated)
    }

    /// Mark `id` as being deleted; `None` if that delete is already in flight
    pub fn begin_remove(&mut self, id: &str) -> Option<DeleteTicket> {
        if self.is_pending(id) {
            debug!("Delete of {} already in flight", id);
            return None;
        }
        self.deleting.insert(id.to_string());
        self.pending_delete = Some(id.to_string());
        Some(DeleteTicket { id: id.to_string() })
    }

    /// Apply the outcome of a delete started with `begin_remove`
    pub fn apply_remove(&mut self, ticket: DeleteTicket, result: Result<ResponseBody, ApiError>) -> Result<(), ApiError> {
        self.deleting.remove(&ticket.id);
        if self.pending_delete.as_deref() == Some(ticket.id.as_str()) {
            self.pending_delete = None;
        }

        match result {
            Ok(_) => {
                self.items.retain(|item| !item.has_id(&ticket.id));
                self.view.clamp(self.items.len());
                info!("Deleted {} {}", self.resource().singular(), ticket.id);
                Ok(())
            }
            Err(e) => {
                warn!("Error deleting {} {}: {}", self.resource().singular(), ticket.id, e);
                Err(e)
            }
        }
    }

    /// Delete `id` (after the user confirmed), then reload to reconcile
    pub async fn remove(&mut self, id: &str) -> Result<RemoveOutcome, ApiError> {
        self.ensure_mutable()?;
        let Some(ticket) = self.begin_remove(id) else {
            return Ok(RemoveOutcome::AlreadyPending);
        };

        let result = self.api.delete(self.resource(), id).await;
        self.apply_remove(ticket, result)?;

        if let Err(e) = self.load().await {
            warn!("Reload after deleting {} failed: {}", id, e.user_message());
        }
        Ok(RemoveOutcome::Removed)
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut ResourceItem> {
        self.items.iter_mut().find(|item| item.has_id(id))
    }

    /// Replace the item with the same id, or append it
    fn splice(&mut self, item: ResourceItem) {
        let Some(id) = item.id() else {
            return;
        };
        let item = item.without_fields(self.schema.strip_fields);
        match self.find_mut(&id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
        self.view.clamp(self.items.len());
    }
}

impl<A: ResourceApi> Paginated for ResourceListController<A> {
    fn current_page(&self) -> usize {
        self.view.page()
    }

    fn set_page(&mut self, page: usize) -> usize {
        self.view.set_page(page, self.items.len())
    }

    fn total_pages(&self) -> usize {
        self.view.total_pages(self.items.len())
    }

    fn controls_enabled(&self) -> bool {
        !self.is_loading() && self.total_pages() > 1
    }
}
