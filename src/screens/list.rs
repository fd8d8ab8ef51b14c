//! List screen: one paginated table per resource

use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use crate::api::ResourceApi;
use crate::controller::{LoadOutcome, LoadResult, Paginated, RemoveOutcome, ResourceListController};
use crate::models::ResourceItem;
use crate::notify::{NoticeKind, Notifier};
use crate::screens::{Confirm, Route, Screen, ScreenAction};

/// Things the user can ask a list screen to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListIntent {
    NextPage,
    PreviousPage,
    FirstPage,
    LastPage,
    GoToPage(usize),
    Refresh,
    Open(String),
    New,
    Delete(String),
}

pub struct ListScreen<A> {
    controller: ResourceListController<A>,
    loads: UnboundedSender<LoadResult>,
}

impl<A: ResourceApi + 'static> ListScreen<A> {
    /// Loads run on spawned tasks and report back through `loads`
    pub fn new(controller: ResourceListController<A>, loads: UnboundedSender<LoadResult>) -> Self {
        Self { controller, loads }
    }

    pub fn controller(&self) -> &ResourceListController<A> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ResourceListController<A> {
        &mut self.controller
    }

    pub fn refresh(&mut self) {
        let ticket = self.controller.spawn_load(self.loads.clone());
        debug!("Issued {} load {:?}", self.controller.resource(), ticket);
    }

    /// Feed back the result of a spawned load
    pub fn apply_loaded(&mut self, message: LoadResult, notifier: &mut Notifier) -> ScreenAction {
        if message.resource != self.controller.resource() {
            return ScreenAction::None;
        }
        match self.controller.apply_load(message.ticket, message.result) {
            Ok(LoadOutcome::Applied(count)) => ScreenAction::SetStatus(self.status_line(count)),
            Ok(LoadOutcome::Stale) => ScreenAction::None,
            Err(e) => {
                notifier.toast(NoticeKind::Error, e.user_message());
                ScreenAction::SetError(e.user_message())
            }
        }
    }

    fn status_line(&self, count: usize) -> String {
        format!(
            "{}: {} items, page {}/{}",
            self.controller.resource().label(),
            count,
            self.controller.current_page(),
            self.controller.total_pages()
        )
    }

    fn page_status(&self) -> ScreenAction {
        ScreenAction::SetStatus(self.status_line(self.controller.items().len()))
    }

    pub async fn handle(
        &mut self,
        intent: ListIntent,
        notifier: &mut Notifier,
        confirm: &mut dyn Confirm,
    ) -> ScreenAction {
        let resource = self.controller.resource();
        match intent {
            ListIntent::NextPage => {
                if !self.controller.has_next_page() {
                    return ScreenAction::SetStatus("Already on the last page".to_string());
                }
                self.controller.next_page();
                self.page_status()
            }
            ListIntent::PreviousPage => {
                if !self.controller.has_previous_page() {
                    return ScreenAction::SetStatus("Already on the first page".to_string());
                }
                self.controller.previous_page();
                self.page_status()
            }
            ListIntent::FirstPage => {
                self.controller.go_to_first_page();
                self.page_status()
            }
            ListIntent::LastPage => {
                self.controller.go_to_last_page();
                self.page_status()
            }
            ListIntent::GoToPage(page) => {
                self.controller.set_page(page);
                self.page_status()
            }
            ListIntent::Refresh => {
                self.refresh();
                ScreenAction::SetStatus(format!("Loading {}...", resource.label().to_lowercase()))
            }
            ListIntent::Open(id) => {
                let item = match self.controller.find(&id) {
                    Some(item) => item.clone(),
                    None => match self.controller.fetch_one(&id).await {
                        Ok(item) => item,
                        Err(e) => return ScreenAction::SetError(e.user_message()),
                    },
                };
                ScreenAction::NavigateTo(Route::Detail {
                    resource,
                    item: Some(item),
                })
            }
            ListIntent::New => {
                if !resource.is_mutable() {
                    return ScreenAction::SetError(format!("{} are read-only", resource.label()));
                }
                ScreenAction::NavigateTo(Route::Detail { resource, item: None })
            }
            ListIntent::Delete(id) => self.delete(&id, notifier, confirm).await,
        }
    }

    async fn delete(&mut self, id: &str, notifier: &mut Notifier, confirm: &mut dyn Confirm) -> ScreenAction {
        let resource = self.controller.resource();
        if self.controller.is_pending(id) {
            return ScreenAction::None;
        }

        let label = self
            .controller
            .find(id)
            .and_then(ResourceItem::name)
            .map(|name| format!("'{}'", name))
            .unwrap_or_else(|| id.to_string());
        let prompt = format!("Delete {} {}? This cannot be undone.", resource.singular(), label);
        if !confirm.confirm("Confirm delete", &prompt).await {
            return ScreenAction::SetStatus("Delete cancelled".to_string());
        }

        match self.controller.remove(id).await {
            Ok(RemoveOutcome::Removed) => {
                let message = format!("Deleted {} {}", resource.singular(), label);
                notifier.success(message.clone());
                ScreenAction::SetStatus(message)
            }
            Ok(RemoveOutcome::AlreadyPending) => ScreenAction::None,
            Err(e) => {
                notifier.error(e.user_message());
                ScreenAction::SetError(e.user_message())
            }
        }
    }
}

impl<A: ResourceApi + 'static> Screen for ListScreen<A> {
    fn route(&self) -> Route {
        Route::List(self.controller.resource())
    }

    fn title(&self) -> String {
        self.controller.resource().label().to_string()
    }

    /// Re-run the load whenever the list is shown again
    async fn on_focus(&mut self) -> ScreenAction {
        self.refresh();
        ScreenAction::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeApi, Failure, Op};
    use crate::models::Resource;
    use crate::screens::AssumeYes;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct Decline;

    #[async_trait]
    impl Confirm for Decline {
        async fn confirm(&mut self, _title: &str, _message: &str) -> bool {
            false
        }
    }

    fn screen(api: Arc<FakeApi>) -> (ListScreen<FakeApi>, mpsc::UnboundedReceiver<LoadResult>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let controller = ResourceListController::new(api, Resource::Suppliers, 13);
        (ListScreen::new(controller, tx), rx)
    }

    fn seeded(count: usize) -> Arc<FakeApi> {
        let items = (0..count)
            .map(|i| json!({"_id": format!("s{}", i), "name": format!("Proveedor {}", i), "contact": "2222-0000"}))
            .collect();
        Arc::new(FakeApi::new().with_items(Resource::Suppliers, items))
    }

    #[tokio::test]
    async fn test_focus_loads_through_channel() {
        let api = seeded(20);
        let (mut screen, mut rx) = screen(api.clone());
        let mut notifier = Notifier::new();

        screen.on_focus().await;
        assert!(screen.controller().is_loading());
        let message = rx.recv().await.unwrap();
        let action = screen.apply_loaded(message, &mut notifier);
        assert_eq!(action, ScreenAction::SetStatus("Suppliers: 20 items, page 1/2".to_string()));

        let action = screen.handle(ListIntent::NextPage, &mut notifier, &mut AssumeYes).await;
        assert_eq!(action, ScreenAction::SetStatus("Suppliers: 20 items, page 2/2".to_string()));
        assert_eq!(screen.controller().visible().len(), 7);

        let action = screen.handle(ListIntent::NextPage, &mut notifier, &mut AssumeYes).await;
        assert_eq!(action, ScreenAction::SetStatus("Already on the last page".to_string()));
        assert_eq!(screen.controller().current_page(), 2);

        screen.handle(ListIntent::FirstPage, &mut notifier, &mut AssumeYes).await;
        let action = screen.handle(ListIntent::PreviousPage, &mut notifier, &mut AssumeYes).await;
        assert_eq!(action, ScreenAction::SetStatus("Already on the first page".to_string()));
    }

    #[tokio::test]
    async fn test_failed_load_surfaces_toast() {
        let api = seeded(1);
        api.fail(Op::List, Failure::Status(503, "Servidor ocupado".to_string()));
        let (mut screen, mut rx) = screen(api);
        let mut notifier = Notifier::new();

        screen.refresh();
        let action = screen.apply_loaded(rx.recv().await.unwrap(), &mut notifier);
        assert_eq!(action, ScreenAction::SetError("Servidor ocupado".to_string()));
        assert_eq!(notifier.drain()[0].message, "Servidor ocupado");
    }

    #[tokio::test]
    async fn test_declined_delete_makes_no_request() {
        let api = seeded(2);
        let (mut screen, _rx) = screen(api.clone());
        screen.controller_mut().load().await.unwrap();
        let before = api.request_count();

        let action = screen
            .handle(ListIntent::Delete("s0".to_string()), &mut Notifier::new(), &mut Decline)
            .await;
        assert_eq!(action, ScreenAction::SetStatus("Delete cancelled".to_string()));
        assert_eq!(api.request_count(), before);
        assert_eq!(screen.controller().items().len(), 2);
    }

    #[tokio::test]
    async fn test_confirmed_delete_notifies() {
        let api = seeded(2);
        let (mut screen, _rx) = screen(api);
        screen.controller_mut().load().await.unwrap();
        let mut notifier = Notifier::new();

        screen
            .handle(ListIntent::Delete("s1".to_string()), &mut notifier, &mut AssumeYes)
            .await;
        assert!(screen.controller().find("s1").is_none());
        assert_eq!(notifier.drain()[0].message, "Deleted supplier 'Proveedor 1'");
    }

    #[tokio::test]
    async fn test_open_and_new_navigate() {
        let api = seeded(1);
        let (mut screen, _rx) = screen(api);
        screen.controller_mut().load().await.unwrap();
        let mut notifier = Notifier::new();

        match screen.handle(ListIntent::Open("s0".to_string()), &mut notifier, &mut AssumeYes).await {
            ScreenAction::NavigateTo(Route::Detail { item: Some(item), .. }) => assert!(item.has_id("s0")),
            other => panic!("unexpected action: {:?}", other),
        }
        assert_eq!(
            screen.handle(ListIntent::New, &mut notifier, &mut AssumeYes).await,
            ScreenAction::NavigateTo(Route::Detail {
                resource: Resource::Suppliers,
                item: None
            })
        );
        assert!(matches!(
            screen.handle(ListIntent::Open("missing".to_string()), &mut notifier, &mut AssumeYes).await,
            ScreenAction::SetError(_)
        ));
    }
}
