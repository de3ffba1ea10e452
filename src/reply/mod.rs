//! Tagged handler results and response encoding.
//!
//! Handlers declare how their result should reach the wire by choosing a
//! [`Reply`] variant, instead of the encoder guessing from the value's
//! runtime shape. Encoding follows a four-way table:
//!
//! | Variant            | Content-Type                      | Body                      |
//! |--------------------|-----------------------------------|---------------------------|
//! | [`Reply::Text`]    | `application/json; charset=utf-8` | the string, verbatim      |
//! | [`Reply::Json`]    | `application/json; charset=utf-8` | serialized JSON           |
//! | [`Reply::Opaque`]  | *(none)*                          | native rendering, verbatim|
//! | [`Reply::Scalar`]  | *(none)*                          | default string conversion |
//!
//! The `Text` case deliberately skips JSON escaping: a handler returning
//! `"hello"` produces the body `hello`, not `"hello"`. The two header-less
//! cases are equally deliberate — callers rely on `Content-Type` being
//! absent there.

use std::fmt;

use serde_json::Value;

use crate::http::{Response, StatusCode};

/// Content type written for the `Text` and `Json` encoding branches.
const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// A handler's result, tagged with its intended wire encoding.
///
/// # Examples
///
/// ```
/// use bitroute::reply::Reply;
/// use serde_json::json;
///
/// let reply = Reply::json(json!({"menus": {"home": "Home"}}));
/// let response = reply.into_response();
/// assert_eq!(response.status().as_u16(), 200);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Pre-rendered text written verbatim under the JSON content type.
    Text(String),
    /// Structured data (mapping or sequence) serialized to JSON.
    Json(Value),
    /// An opaque record rendered in the language-native object format.
    /// Compatibility branch; the exact format is not a wire guarantee.
    Opaque(String),
    /// A bare scalar (number, boolean, null) written as its default string
    /// conversion with no content type.
    Scalar(Value),
}

impl Reply {
    /// Tags `text` to be written verbatim (no JSON quoting or escaping).
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }

    /// Tags `value` for JSON serialization. Build the value with
    /// [`serde_json::json!`] or any `Into<Value>` type.
    pub fn json(value: impl Into<Value>) -> Self {
        Reply::Json(value.into())
    }

    /// Tags `value` as an opaque record, captured via its [`fmt::Debug`]
    /// rendering.
    pub fn opaque(value: impl fmt::Debug) -> Self {
        Reply::Opaque(format!("{value:?}"))
    }

    /// Tags a bare scalar (number, boolean, null) for default string
    /// conversion.
    pub fn scalar(value: impl Into<Value>) -> Self {
        Reply::Scalar(value.into())
    }

    /// Encodes this reply into a `200 OK` wire response per the module-level
    /// table.
    pub fn into_response(self) -> Response {
        let response = Response::new(StatusCode::Ok);
        match self {
            Reply::Text(text) => response.header("Content-Type", JSON_CONTENT_TYPE).body(text),
            Reply::Json(value) => response
                .header("Content-Type", JSON_CONTENT_TYPE)
                // Display on Value is compact JSON and cannot fail.
                .body(value.to_string()),
            Reply::Opaque(rendered) => response.body(rendered),
            Reply::Scalar(value) => response.body(scalar_body(&value)),
        }
    }
}

// Default string conversion for scalars. A string smuggled into the scalar
// branch is written bare rather than JSON-quoted.
fn scalar_body(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body_string(response: &Response) -> String {
        String::from_utf8(response.body_as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn text_written_verbatim_with_json_content_type() {
        let response = Reply::text("hello").into_response();
        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.headers().get("content-type"), Some(JSON_CONTENT_TYPE));
        // Not double-quoted: the string bypasses JSON escaping entirely.
        assert_eq!(body_string(&response), "hello");
    }

    #[test]
    fn json_mapping_serialized_with_content_type() {
        let response = Reply::json(json!({"a": 1})).into_response();
        assert_eq!(response.headers().get("content-type"), Some(JSON_CONTENT_TYPE));
        assert_eq!(body_string(&response), r#"{"a":1}"#);
    }

    #[test]
    fn json_sequence_serialized() {
        let response = Reply::json(json!([1, 2, 3])).into_response();
        assert_eq!(body_string(&response), "[1,2,3]");
    }

    #[test]
    fn scalar_has_no_content_type() {
        let response = Reply::scalar(42).into_response();
        assert!(response.headers().get("content-type").is_none());
        assert_eq!(body_string(&response), "42");
    }

    #[test]
    fn scalar_bool_and_null() {
        assert_eq!(body_string(&Reply::scalar(true).into_response()), "true");
        assert_eq!(
            body_string(&Reply::scalar(Value::Null).into_response()),
            "null"
        );
    }

    #[test]
    fn opaque_has_no_content_type() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Record {
            id: u32,
        }

        let response = Reply::opaque(Record { id: 7 }).into_response();
        assert!(response.headers().get("content-type").is_none());
        assert_eq!(body_string(&response), "Record { id: 7 }");
    }

    #[test]
    fn every_variant_is_200() {
        for reply in [
            Reply::text("x"),
            Reply::json(json!({})),
            Reply::opaque(()),
            Reply::scalar(1),
        ] {
            assert_eq!(reply.into_response().status(), StatusCode::Ok);
        }
    }
}
