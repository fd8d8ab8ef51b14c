use crate::api::ResourceApi;
use crate::controller::{ResourceForm, ResourceListController};
use crate::errors::ApiError;
use crate::models::{Resource, ResourceItem};
use crate::notify::Notifier;
use crate::schema::ResourceSchema;
use crate::screens::{Route, Screen, ScreenAction};

/// Create/edit screen for a single item
pub struct DetailScreen {
    form: ResourceForm,
    item: Option<ResourceItem>,
}

impl DetailScreen {
    pub fn new(schema: &ResourceSchema, item: Option<ResourceItem>) -> Result<Self, ApiError> {
        let form = ResourceForm::new(schema, item.as_ref())?;
        Ok(Self { form, item })
    }

    pub fn resource(&self) -> Resource {
        self.form.resource()
    }

    pub fn form(&self) -> &ResourceForm {
        &self.form
    }

    pub fn item(&self) -> Option<&ResourceItem> {
        self.item.as_ref()
    }

    pub fn set(&mut self, key: &str, value: &str) -> ScreenAction {
        match self.form.set(key, value) {
            Ok(()) => ScreenAction::None,
            Err(e) => ScreenAction::SetError(e.user_message()),
        }
    }

    /// Submit the form; on success go back so the list refreshes
    pub async fn save<A: ResourceApi>(
        &mut self,
        controller: &mut ResourceListController<A>,
        notifier: &mut Notifier,
    ) -> ScreenAction {
        let editing = self.form.is_edit();
        match self.form.submit(controller).await {
            Ok(_) => {
                let verb = if editing { "updated" } else { "added" };
                let mut noun = self.resource().singular().to_string();
                if let Some(first) = noun.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                notifier.success(format!("{} {}", noun, verb));
                ScreenAction::NavigateBack
            }
            // keep the form open so the user can fix the fields
            Err(e @ ApiError::Validation(_)) => ScreenAction::SetError(e.user_message()),
            Err(e) => {
                notifier.error(e.user_message());
                ScreenAction::SetError(e.user_message())
            }
        }
    }
}

impl Screen for DetailScreen {
    fn route(&self) -> Route {
        Route::Detail {
            resource: self.resource(),
            item: self.item.clone(),
        }
    }

    fn title(&self) -> String {
        self.form.title()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeApi, Failure, Op};
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_save_new_item_navigates_back() {
        let api = Arc::new(FakeApi::new().with_items(Resource::Suppliers, vec![]));
        let mut controller = ResourceListController::new(api, Resource::Suppliers, 13);
        let mut screen = DetailScreen::new(controller.schema(), None).unwrap();
        let mut notifier = Notifier::new();

        assert_eq!(screen.set("name", "Ceras SV"), ScreenAction::None);
        screen.set("contact", "2222-3333");
        assert_eq!(screen.title(), "New supplier");

        let action = screen.save(&mut controller, &mut notifier).await;
        assert_eq!(action, ScreenAction::NavigateBack);
        assert_eq!(notifier.drain()[0].message, "Supplier added");
        assert_eq!(controller.items().len(), 1);
    }

    #[tokio::test]
    async fn test_server_rejection_stays_on_form() {
        let api = Arc::new(FakeApi::new());
        api.fail(Op::Create, Failure::Status(400, "Proveedor duplicado".to_string()));
        let mut controller = ResourceListController::new(api, Resource::Suppliers, 13);
        let mut screen = DetailScreen::new(controller.schema(), None).unwrap();
        screen.set("name", "Ceras SV");
        screen.set("contact", "2222-3333");

        let action = screen.save(&mut controller, &mut Notifier::new()).await;
        assert_eq!(action, ScreenAction::SetError("Proveedor duplicado".to_string()));
        assert_eq!(screen.form().get("name"), Some("Ceras SV"));
    }

    #[tokio::test]
    async fn test_edit_screen_route_keeps_item() {
        let api = Arc::new(FakeApi::new());
        let controller = ResourceListController::new(api, Resource::Collections, 13);
        let item: ResourceItem = serde_json::from_value(json!({"_id": "c1", "name": "Otoño"})).unwrap();
        let mut screen = DetailScreen::new(controller.schema(), Some(item.clone())).unwrap();
        assert_eq!(
            screen.route(),
            Route::Detail {
                resource: Resource::Collections,
                item: Some(item)
            }
        );
        assert!(screen.set("color", "rosa") != ScreenAction::None);
    }
}
