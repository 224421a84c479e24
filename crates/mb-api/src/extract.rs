//! Custom Axum extractors

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{json, Value};

/// Request body accepted as JSON or as an HTML form post.
///
/// Without a content type the body is read as JSON, and an empty body
/// deserializes from `{}` so bodiless DELETE/PUT calls reach the handler.
/// Every rejection is a `400` with an `invalid_body` JSON object.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase);

        match content_type.as_deref() {
            Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => {
                let Form(value) = Form::<T>::from_request(req, state)
                    .await
                    .map_err(|rejection| invalid_body(rejection.body_text()))?;
                Ok(Self(value))
            }
            Some(ct) if ct.starts_with("application/json") => {
                let Json(value) = Json::<T>::from_request(req, state)
                    .await
                    .map_err(|rejection| invalid_body(rejection.body_text()))?;
                Ok(Self(value))
            }
            _ => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(|rejection| invalid_body(rejection.body_text()))?;
                let body: &[u8] = if bytes.iter().all(u8::is_ascii_whitespace) {
                    b"{}"
                } else {
                    &bytes
                };
                serde_json::from_slice(body)
                    .map(Self)
                    .map_err(|e| invalid_body(e.to_string()))
            }
        }
    }
}

fn invalid_body(message: String) -> Response {
    tracing::debug!(%message, "request body rejected");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "invalid_body",
            "message": message
        })),
    )
        .into_response()
}

/// Reads an optional field as text whatever scalar the client sent, so
/// `"delete_password": 1234` means the same as `"delete_password": "1234"`.
/// Use with `#[serde(default, deserialize_with = "lenient_string")]`.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(other) => Some(other.to_string()),
    })
}
