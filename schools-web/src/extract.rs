use std::collections::HashMap;

use axum::extract::{Form, FromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::Json;
use serde_json::{Map, Value};

use crate::error::ApiError;

/// Untyped request body, accepted as JSON or as an urlencoded form.
///
/// Form fields arrive as strings; the validator parses numbers from either.
#[derive(Debug)]
pub struct Payload(pub Value);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

/// Query string or form fields as a JSON object of strings.
pub fn fields_to_value(fields: HashMap<String, String>) -> Value {
    let map: Map<String, Value> = fields
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    Value::Object(map)
}

impl<S> FromRequest<S> for Payload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::malformed(e.body_text()))?;
            Ok(Payload(fields_to_value(fields)))
        } else {
            let Json(value) = Json::<Value>::from_request(req, state)
                .await
                .map_err(|e| ApiError::malformed(e.body_text()))?;
            Ok(Payload(value))
        }
    }
}
