//! The signed-in employee's own profile

use tracing::info;

use crate::api::{ApiClient, ResourceApi};
use crate::controller::ResourceForm;
use crate::errors::ApiError;
use crate::models::{Resource, ResourceItem};
use crate::notify::Notifier;
use crate::schema::schema_for;

pub struct ProfileEditor {
    client: ApiClient,
    employee: ResourceItem,
    form: ResourceForm,
}

impl ProfileEditor {
    /// Resolve the session's employee via `auth/verify` and load it
    pub async fn load(client: ApiClient) -> Result<Self, ApiError> {
        if !client.is_authenticated() {
            return Err(ApiError::NotAuthenticated);
        }

        let verified = client.get(&["auth", "verify"]).await?;
        let id = verified
            .find_str(&["id", "_id", "user.id", "user._id"])
            .ok_or_else(|| ApiError::Decode {
                url: "auth/verify".to_string(),
                reason: "response carried no employee id".to_string(),
            })?;

        let employee = client.fetch(Resource::Employees, &id).await?;
        let form = ResourceForm::for_edit(&schema_for(Resource::Employees), &employee)?;
        Ok(Self { client, employee, form })
    }

    pub fn employee(&self) -> &ResourceItem {
        &self.employee
    }

    pub fn form(&self) -> &ResourceForm {
        &self.form
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ApiError> {
        self.form.set(key, value)
    }

    /// PUT the edited profile; an unchanged (masked) password is not sent
    pub async fn save(&mut self) -> Result<&ResourceItem, ApiError> {
        let id = self.employee.id().ok_or(ApiError::NotAuthenticated)?;
        let payload = self.form.validated_payload()?;

        let body = self.client.update(Resource::Employees, &id, &payload).await?;
        match body.as_item().filter(|item| item.has_id(&id)) {
            Some(item) => self.employee = item,
            None => self.employee.merge(&payload),
        }
        self.form = ResourceForm::for_edit(&schema_for(Resource::Employees), &self.employee)?;
        info!("Profile {} updated", id);
        Ok(&self.employee)
    }

    /// Save and report the outcome as a toast
    pub async fn submit(&mut self, notifier: &mut Notifier) -> bool {
        let result = self.save().await.map(|_| "Profile updated");
        notifier.toast_result(&result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Session;
    use crate::config::Config;
    use crate::controller::MASKED_PASSWORD;
    use crate::notify::{NoticeKind, Presentation};
    use crate::testing::StubServer;

    const EMPLOYEE: &str = r#"{
        "_id": "e1", "name": "Ana", "surnames": "Martinez", "phone": "7777-1234",
        "email": "ana@rosecandle.co", "dui": "01234567-8", "user": "ana", "password": "$2b$10$hash"
    }"#;

    fn client(base: &str) -> ApiClient {
        let config = Config {
            api_base: base.to_string(),
            ..Config::default()
        };
        let session = Session::new("tok".to_string(), None);
        ApiClient::new(&config).unwrap().with_session(Some(&session))
    }

    #[tokio::test]
    async fn test_load_and_save_without_password() {
        let server = StubServer::builder()
            .route("GET", "/api/auth/verify", 200, r#"{"id":"e1"}"#)
            .route("GET", "/api/employees/e1", 200, EMPLOYEE)
            .route("PUT", "/api/employees/e1", 200, r#"{"message":"Employee updated"}"#)
            .start()
            .await;

        let mut profile = ProfileEditor::load(client(server.base_url())).await.unwrap();
        assert_eq!(profile.form().get("password"), Some(MASKED_PASSWORD));

        profile.set("phone", "7000-0000").unwrap();
        let saved = profile.save().await.unwrap();
        assert_eq!(saved.display_field("phone"), "7000-0000");

        let requests = server.requests();
        let put = requests.iter().find(|r| r.method == "PUT").unwrap();
        assert_eq!(put.json()["phone"], "7000-0000");
        assert!(put.json().get("password").is_none());
        assert_eq!(put.header("authorization"), Some("Bearer tok"));
    }

    #[tokio::test]
    async fn test_invalid_edit_is_not_sent() {
        let server = StubServer::builder()
            .route("GET", "/api/auth/verify", 200, r#"{"user":{"_id":"e1"}}"#)
            .route("GET", "/api/employees/e1", 200, EMPLOYEE)
            .start()
            .await;

        let mut profile = ProfileEditor::load(client(server.base_url())).await.unwrap();
        profile.set("dui", "123").unwrap();
        assert!(profile.save().await.unwrap_err().is_validation());
        assert_eq!(server.request_count(), 2);
    }

    #[tokio::test]
    async fn test_submit_reports_toasts() {
        let server = StubServer::builder()
            .route("GET", "/api/auth/verify", 200, r#"{"id":"e1"}"#)
            .route("GET", "/api/employees/e1", 200, EMPLOYEE)
            .route("PUT", "/api/employees/e1", 500, r#"{"message":"Base de datos no disponible"}"#)
            .start()
            .await;
        let mut notifier = Notifier::new();

        let mut profile = ProfileEditor::load(client(server.base_url())).await.unwrap();
        profile.set("phone", "7000-0000").unwrap();
        assert!(!profile.submit(&mut notifier).await);

        let shown = notifier.drain();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].kind, NoticeKind::Error);
        assert_eq!(shown[0].presentation, Presentation::Toast);
    }

    #[tokio::test]
    async fn test_requires_session() {
        let client = ApiClient::new(&Config::default()).unwrap();
        assert!(matches!(ProfileEditor::load(client).await, Err(ApiError::NotAuthenticated)));
    }
}
