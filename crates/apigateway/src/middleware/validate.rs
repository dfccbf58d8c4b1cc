use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use validator::{Validate, ValidationError, ValidationErrors};

/// JSON extractor that runs `validator` rules before the handler sees the body.
/// Rejections are `400` (or the JSON rejection status) with per-field details.
pub struct SimpleValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for SimpleValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = (StatusCode, axum::Json<Value>);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(value) = axum::Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                let payload = json!({
                    "status": "fail",
                    "message": rejection.body_text(),
                });
                (rejection.status(), axum::Json(payload))
            })?;

        value.validate().map_err(|errors| {
            let details = field_details(&errors);
            let payload = json!({
                "status": "fail",
                "message": summary(&details),
                "details": details,
            });
            (StatusCode::BAD_REQUEST, axum::Json(payload))
        })?;

        Ok(Self(value))
    }
}

fn describe(field: &str, error: &ValidationError) -> String {
    if let Some(message) = &error.message {
        return message.to_string();
    }

    match error.code.as_ref() {
        "range" => match (error.params.get("min"), error.params.get("max")) {
            (Some(min), Some(max)) => format!("must be between {min} and {max}"),
            (Some(min), None) => format!("must be at least {min}"),
            (None, Some(max)) => format!("must be at most {max}"),
            (None, None) => "Value out of range".to_string(),
        },
        "length" => "Invalid length".to_string(),
        "required" => "is required".to_string(),
        _ => format!("Invalid {field}"),
    }
}

fn field_details(errors: &ValidationErrors) -> Map<String, Value> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields
        .into_iter()
        .map(|(field, field_errors)| {
            let messages: Vec<String> = field_errors.iter().map(|e| describe(&field, e)).collect();
            (field.to_string(), json!(messages))
        })
        .collect()
}

fn summary(details: &Map<String, Value>) -> String {
    if details.is_empty() {
        return "Validation failed".to_string();
    }

    details
        .iter()
        .filter_map(|(field, messages)| {
            let first = messages.as_array()?.first()?.as_str()?;
            Some(format!("{field}: {first}"))
        })
        .collect::<Vec<_>>()
        .join("; ")
}
