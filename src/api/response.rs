//! Lenient decoding of API responses
//!
//! Bodies are always read as text first. JSON is used when it parses, the raw
//! text otherwise, so a mislabelled body never aborts the calling flow.

use serde_json::Value;

use crate::errors::ApiError;
use crate::models::ResourceItem;

#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Empty,
    Json(Value),
    Text(String),
}

impl ResponseBody {
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return ResponseBody::Empty;
        }
        match serde_json::from_str::<Value>(text) {
            Ok(value) => ResponseBody::Json(value),
            Err(_) => ResponseBody::Text(text.to_string()),
        }
    }

    /// User-facing reason for a failed request
    pub fn error_message(&self, status: u16) -> String {
        let fallback = || format!("Server responded with status {}", status);
        match self {
            ResponseBody::Empty => fallback(),
            ResponseBody::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    fallback()
                } else {
                    text.to_string()
                }
            }
            ResponseBody::Json(value) => {
                if let Some(message) = ["message", "error"]
                    .iter()
                    .find_map(|key| value.get(*key).and_then(Value::as_str))
                    .filter(|m| !m.trim().is_empty())
                {
                    return message.to_string();
                }
                match value {
                    Value::Null => fallback(),
                    Value::String(s) if s.trim().is_empty() => fallback(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }
            }
        }
    }

    /// The item a create or update answered with, if the body carries one
    pub fn as_item(&self) -> Option<ResourceItem> {
        let ResponseBody::Json(value) = self else {
            return None;
        };
        let candidates = [Some(value), value.get("data"), value.get("item")];
        candidates
            .into_iter()
            .flatten()
            .filter_map(|v| v.as_object())
            .map(|obj| ResourceItem::new(obj.clone()))
            .find(|item| item.id().is_some())
    }

    /// Decode a list response; anything but an array of objects is an error
    pub fn into_items(self, url: &str) -> Result<Vec<ResourceItem>, ApiError> {
        let decode_error = |reason: String| ApiError::Decode {
            url: url.to_string(),
            reason,
        };
        match self {
            ResponseBody::Json(Value::Array(values)) => values
                .into_iter()
                .map(|value| match value {
                    Value::Object(obj) => Ok(ResourceItem::new(obj)),
                    other => Err(decode_error(format!("expected an object, got {}", other))),
                })
                .collect(),
            ResponseBody::Json(other) => Err(decode_error(format!("expected a JSON array, got {}", other))),
            ResponseBody::Text(text) => Err(decode_error(format!(
                "body is not JSON: {}",
                text.chars().take(300).collect::<String>()
            ))),
            ResponseBody::Empty => Err(decode_error("empty body".to_string())),
        }
    }

    pub fn json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// First string found at any of the given dotted paths, e.g. `data.token`
    pub fn find_str(&self, paths: &[&str]) -> Option<String> {
        let value = self.json()?;
        paths.iter().find_map(|path| {
            path.split('.')
                .try_fold(value, |v, key| v.get(key))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
    }
}

/// Status plus decoded body of a completed request
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into `ApiError::Status`
    pub fn into_result(self) -> Result<ResponseBody, ApiError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(ApiError::Status {
                status: self.status,
                message: self.body.error_message(self.status),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_falls_back_to_text() {
        assert_eq!(ResponseBody::parse(""), ResponseBody::Empty);
        assert_eq!(ResponseBody::parse("<html>Bad Gateway</html>"), ResponseBody::Text("<html>Bad Gateway</html>".to_string()));
        assert_eq!(ResponseBody::parse(r#"{"ok":true}"#), ResponseBody::Json(json!({"ok": true})));
    }

    #[test]
    fn test_error_message_precedence() {
        let message = ResponseBody::Json(json!({"message": "Proveedor en uso", "error": "E_REF"}));
        assert_eq!(message.error_message(409), "Proveedor en uso");

        let error = ResponseBody::Json(json!({"error": "Not found"}));
        assert_eq!(error.error_message(404), "Not found");

        let other = ResponseBody::Json(json!({"detail": "x"}));
        assert_eq!(other.error_message(400), r#"{"detail":"x"}"#);

        let text = ResponseBody::Text("Internal Server Error".to_string());
        assert_eq!(text.error_message(500), "Internal Server Error");

        assert_eq!(ResponseBody::Empty.error_message(500), "Server responded with status 500");
    }

    #[test]
    fn test_into_items_requires_array_of_objects() {
        let items = ResponseBody::Json(json!([{"_id": "a"}, {"_id": "b"}])).into_items("u").unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id().as_deref(), Some("b"));

        assert!(ResponseBody::Json(json!({"_id": "a"})).into_items("u").is_err());
        assert!(ResponseBody::Json(json!([1, 2])).into_items("u").is_err());
        assert!(ResponseBody::Text("oops".to_string()).into_items("u").is_err());
    }

    #[test]
    fn test_as_item_and_find_str() {
        let direct = ResponseBody::Json(json!({"_id": "n1", "name": "Velas"}));
        assert_eq!(direct.as_item().unwrap().name(), Some("Velas"));

        let wrapped = ResponseBody::Json(json!({"message": "ok", "data": {"_id": "n2"}}));
        assert_eq!(wrapped.as_item().unwrap().id().as_deref(), Some("n2"));

        assert!(ResponseBody::Json(json!({"message": "created"})).as_item().is_none());

        let login = ResponseBody::Json(json!({"data": {"token": "t0k"}}));
        assert_eq!(login.find_str(&["token", "data.token"]).as_deref(), Some("t0k"));
    }

    #[test]
    fn test_into_result() {
        let ok = ApiResponse { status: 201, body: ResponseBody::Empty };
        assert!(ok.into_result().is_ok());

        let failed = ApiResponse { status: 500, body: ResponseBody::Json(json!({"message": "boom"})) };
        match failed.into_result() {
            Err(ApiError::Status { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
