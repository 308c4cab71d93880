//! Typed request fields with required-field validation.
//!
//! [`Fields<T>`] deserializes the raw payload `T::Raw` from the request:
//!
//! - `GET`: the query string
//! - `application/json` body: JSON
//! - `application/x-www-form-urlencoded` body: form fields
//! - no body: the query string
//!
//! Any other body is rejected rather than ignored. The raw payload is then
//! handed to [`RequestFields::validate`], which either produces the typed
//! request or names the required fields that are absent or blank.

use axum::{
    Form, Json,
    body::Bytes,
    extract::{FromRequest, Query, Request},
    http::{Method, Uri, header::CONTENT_TYPE},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Outcome of validation: the typed request, or the missing field names.
pub type Validated<T> = Result<T, Vec<&'static str>>;

/// A request built from a raw payload once its required fields are present.
pub trait RequestFields: Sized {
    /// Payload as it is deserialized from the request.
    type Raw: DeserializeOwned;

    /// Build the request, or return the missing required field names in
    /// declaration order.
    fn validate(raw: Self::Raw) -> Validated<Self>;
}

/// Whether a submitted value counts as absent. Whitespace-only is blank.
#[must_use]
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Collect the names whose value is absent or blank.
#[must_use]
pub fn missing(fields: &[(&'static str, Option<&str>)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.is_none_or(is_blank))
        .map(|(name, _)| *name)
        .collect()
}

/// Extractor for a validated request payload.
#[derive(Debug, Clone)]
pub struct Fields<T>(pub T);

enum Body {
    Json,
    Form,
    Other,
}

fn body_kind(req: &Request) -> Body {
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        Body::Json
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        Body::Form
    } else {
        Body::Other
    }
}

fn from_query<R: DeserializeOwned>(uri: &Uri) -> Result<R, AppError> {
    Query::<R>::try_from_uri(uri)
        .map(|Query(raw)| raw)
        .map_err(|e| AppError::BadRequest(e.body_text()))
}

async fn read_raw<R, S>(req: Request, state: &S) -> Result<R, AppError>
where
    R: DeserializeOwned,
    S: Send + Sync,
{
    if req.method() == Method::GET {
        return from_query(req.uri());
    }

    match body_kind(&req) {
        Body::Json => Json::<R>::from_request(req, state)
            .await
            .map(|Json(raw)| raw)
            .map_err(|e| AppError::BadRequest(e.body_text())),
        Body::Form => Form::<R>::from_request(req, state)
            .await
            .map(|Form(raw)| raw)
            .map_err(|e| AppError::BadRequest(e.body_text())),
        Body::Other => {
            let uri = req.uri().clone();
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if body.is_empty() {
                from_query(&uri)
            } else {
                Err(AppError::BadRequest(
                    "Expected a JSON or form-encoded body".to_string(),
                ))
            }
        }
    }
}

impl<S, T> FromRequest<S> for Fields<T>
where
    S: Send + Sync,
    T: RequestFields,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let raw = read_raw::<T::Raw, S>(req, state).await?;
        T::validate(raw).map(Self).map_err(|missing| {
            AppError::MissingFields(missing.into_iter().map(String::from).collect())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body as HttpBody;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct ContactForm {
        name: Option<String>,
        rows: Option<i64>,
    }

    #[derive(Debug)]
    struct Contact {
        name: String,
        rows: Option<i64>,
    }

    impl RequestFields for Contact {
        type Raw = ContactForm;

        fn validate(raw: ContactForm) -> Validated<Self> {
            match raw.name.filter(|name| !is_blank(name)) {
                Some(name) => Ok(Self {
                    name,
                    rows: raw.rows,
                }),
                None => Err(vec!["name"]),
            }
        }
    }

    async fn extract(req: Request) -> Result<Contact, AppError> {
        Fields::<Contact>::from_request(req, &()).await.map(|Fields(c)| c)
    }

    #[test]
    fn test_missing_treats_blank_as_absent() {
        let names = missing(&[("a", Some("x")), ("b", None), ("c", Some("  ")), ("d", Some(""))]);
        assert_eq!(names, vec!["b", "c", "d"]);
        assert!(is_blank(" \t"));
        assert!(!is_blank(" u1 "));
    }

    #[tokio::test]
    async fn test_get_reads_query_string() {
        let req = Request::get("/contact?name=home&rows=2")
            .body(HttpBody::empty())
            .unwrap();
        let contact = extract(req).await.unwrap();
        assert_eq!(contact.name, "home");
        assert_eq!(contact.rows, Some(2));
    }

    #[tokio::test]
    async fn test_json_body_is_read_for_mutating_verbs() {
        let req = Request::post("/contact")
            .header(CONTENT_TYPE, "application/json")
            .body(HttpBody::from(r#"{"name":"home","extra":true}"#))
            .unwrap();
        assert_eq!(extract(req).await.unwrap().name, "home");
    }

    #[tokio::test]
    async fn test_form_body_is_read_for_mutating_verbs() {
        let req = Request::post("/contact")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(HttpBody::from("name=Via+Roma&rows=3"))
            .unwrap();
        let contact = extract(req).await.unwrap();
        assert_eq!(contact.name, "Via Roma");
        assert_eq!(contact.rows, Some(3));
    }

    #[tokio::test]
    async fn test_unsupported_body_is_bad_request() {
        let req = Request::post("/contact?name=home")
            .header(CONTENT_TYPE, "text/plain")
            .body(HttpBody::from("name=home"))
            .unwrap();
        let err = extract(req).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn test_missing_required_field_is_rejected() {
        let req = Request::post("/contact")
            .header(CONTENT_TYPE, "application/json")
            .body(HttpBody::from(r#"{"name":" ","rows":1}"#))
            .unwrap();
        let err = extract(req).await.unwrap_err();
        assert!(matches!(&err, AppError::MissingFields(names) if names == &["name"]));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let req = Request::post("/contact")
            .header(CONTENT_TYPE, "application/json")
            .body(HttpBody::from("{not json"))
            .unwrap();
        let err = extract(req).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_without_body_reads_query_string() {
        let req = Request::delete("/contact?name=home")
            .body(HttpBody::empty())
            .unwrap();
        assert_eq!(extract(req).await.unwrap().name, "home");
    }
}
