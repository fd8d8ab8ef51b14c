//! Three-step password recovery
//!
//! The server hands out a short-lived token at each step; the flow keeps it
//! and threads it into the next request.

use serde_json::json;
use tracing::{info, warn};

use crate::api::client::ApiClient;
use crate::api::response::ApiResponse;
use crate::errors::ApiError;
use crate::validation::{FieldError, Pattern, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStep {
    RequestCode,
    VerifyCode,
    NewPassword,
    Done,
}

pub struct RecoveryFlow {
    client: ApiClient,
    step: RecoveryStep,
    email: Option<String>,
    token: Option<String>,
}

fn invalid(field: &str, message: &str) -> ApiError {
    ApiError::Validation(ValidationErrors::from(vec![FieldError::new(field, message)]))
}

impl RecoveryFlow {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            step: RecoveryStep::RequestCode,
            email: None,
            token: None,
        }
    }

    pub fn step(&self) -> RecoveryStep {
        self.step
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    fn expect_step(&self, expected: RecoveryStep) -> Result<(), ApiError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(ApiError::InvalidState(format!(
                "Password recovery is at step {:?}, expected {:?}",
                self.step, expected
            )))
        }
    }

    /// Extract the next token, or turn the response into an error
    fn next_token(response: ApiResponse, fallback: &str) -> Result<String, ApiError> {
        let token = response.body.find_str(&["token"]);
        match (response.status, token) {
            (200, Some(token)) => Ok(token),
            (status, _) => Err(ApiError::Status {
                status,
                message: response
                    .body
                    .find_str(&["message"])
                    .unwrap_or_else(|| fallback.to_string()),
            }),
        }
    }

    /// Step 1: e-mail a code to the user
    pub async fn request_code(&mut self, email: &str) -> Result<&'static str, ApiError> {
        let email = email.trim();
        if !Pattern::Email.is_match(email) {
            return Err(invalid("email", "must be a valid e-mail address"));
        }

        let response = self
            .client
            .post(&["recoveryPassword", "requestCode"], &json!({ "email": email }))
            .await?;
        let token = Self::next_token(response, "Could not send the code")?;

        info!("Recovery code sent to {}", email);
        self.token = Some(token);
        self.email = Some(email.to_string());
        self.step = RecoveryStep::VerifyCode;
        Ok("Code sent to your e-mail")
    }

    pub async fn resend_code(&mut self) -> Result<&'static str, ApiError> {
        self.expect_step(RecoveryStep::VerifyCode)?;
        let email = self
            .email
            .clone()
            .ok_or_else(|| ApiError::InvalidState("No e-mail to resend the code to".to_string()))?;
        self.request_code(&email).await
    }

    /// Step 2: check the five digit code
    pub async fn verify_code(&mut self, code: &str) -> Result<&'static str, ApiError> {
        self.expect_step(RecoveryStep::VerifyCode)?;
        let code = code.trim();
        if !Pattern::RecoveryCode.is_match(code) {
            return Err(invalid("code", "must be exactly 5 digits"));
        }

        let body = json!({ "code": code, "token": self.token });
        let response = self.client.post(&["recoveryPassword", "verifyCode"], &body).await?;
        let token = Self::next_token(response, "Invalid code").map_err(|e| {
            warn!("Recovery code rejected: {}", e);
            e
        })?;

        self.token = Some(token);
        self.step = RecoveryStep::NewPassword;
        Ok("Code verified")
    }

    /// Step 3: set the new password
    pub async fn update_password(&mut self, new_password: &str, confirmation: &str) -> Result<&'static str, ApiError> {
        self.expect_step(RecoveryStep::NewPassword)?;
        if new_password.is_empty() {
            return Err(invalid("newPassword", "is required"));
        }
        if new_password != confirmation {
            return Err(invalid("confirmPassword", "passwords do not match"));
        }

        let body = json!({ "newPassword": new_password, "token": self.token });
        let response = self.client.post(&["recoveryPassword", "newPassword"], &body).await?;
        if response.status != 200 {
            return Err(ApiError::Status {
                status: response.status,
                message: response
                    .body
                    .find_str(&["message"])
                    .unwrap_or_else(|| "Could not update the password".to_string()),
            });
        }

        self.token = None;
        self.step = RecoveryStep::Done;
        info!("Password updated through recovery");
        Ok("Password updated")
    }

    /// Return to the first step, discarding the token
    pub fn go_back(&mut self) {
        self.step = RecoveryStep::RequestCode;
        self.token = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::StubServer;

    fn flow(base: &str) -> RecoveryFlow {
        let config = Config::default();
        RecoveryFlow::new(ApiClient::with_base(base, &config).unwrap())
    }

    #[tokio::test]
    async fn test_full_recovery_threads_tokens() {
        let server = StubServer::builder()
            .route("POST", "/api/recoveryPassword/requestCode", 200, r#"{"token":"t1"}"#)
            .route("POST", "/api/recoveryPassword/verifyCode", 200, r#"{"token":"t2"}"#)
            .route("POST", "/api/recoveryPassword/newPassword", 200, r#"{"message":"ok"}"#)
            .start()
            .await;
        let mut flow = flow(server.base_url());

        flow.request_code("ana@rosecandle.co").await.unwrap();
        assert_eq!(flow.step(), RecoveryStep::VerifyCode);

        flow.verify_code("12345").await.unwrap();
        assert_eq!(flow.step(), RecoveryStep::NewPassword);

        flow.update_password("nueva-clave", "nueva-clave").await.unwrap();
        assert_eq!(flow.step(), RecoveryStep::Done);

        let requests = server.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[1].json()["token"], "t1");
        assert_eq!(requests[1].json()["code"], "12345");
        assert_eq!(requests[2].json()["token"], "t2");
    }

    #[tokio::test]
    async fn test_bad_code_blocks_request() {
        let server = StubServer::builder()
            .route("POST", "/api/recoveryPassword/requestCode", 200, r#"{"token":"t1"}"#)
            .start()
            .await;
        let mut flow = flow(server.base_url());
        flow.request_code("ana@rosecandle.co").await.unwrap();

        let err = flow.verify_code("12a45").await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(server.request_count(), 1);
        assert_eq!(flow.step(), RecoveryStep::VerifyCode);
    }

    #[tokio::test]
    async fn test_rejected_request_keeps_step() {
        let server = StubServer::builder()
            .route("POST", "/api/recoveryPassword/requestCode", 404, r#"{"message":"Correo no registrado"}"#)
            .start()
            .await;
        let mut flow = flow(server.base_url());

        let err = flow.request_code("nadie@rosecandle.co").await.unwrap_err();
        assert_eq!(err.user_message(), "Correo no registrado");
        assert_eq!(flow.step(), RecoveryStep::RequestCode);
    }

    #[tokio::test]
    async fn test_steps_out_of_order() {
        let mut flow = flow("http://127.0.0.1:1");
        assert!(matches!(flow.verify_code("12345").await, Err(ApiError::InvalidState(_))));
        assert!(matches!(flow.update_password("a", "a").await, Err(ApiError::InvalidState(_))));
        assert!(flow.request_code("not-an-email").await.unwrap_err().is_validation());
        flow.go_back();
        assert_eq!(flow.step(), RecoveryStep::RequestCode);
    }
}
