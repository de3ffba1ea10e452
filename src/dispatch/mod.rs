//! Request normalization and dispatch.
//!
//! [`RequestInput`] flattens a parsed [`Request`] plus host-supplied ambient
//! parameters into the `(method, path, payload)` triple handlers consume.
//! [`Dispatcher`] matches that triple against a [`RouteTable`], invokes the
//! resolved handler, and encodes its [`Reply`](crate::reply::Reply) — or
//! answers `404 Page not found` without invoking anything.
//!
//! Payload precedence, lowest to highest: ambient parameters, then decoded
//! JSON body fields, then query-string fields. Later sources overwrite
//! earlier ones on key collision. A missing, non-object, or undecodable body
//! contributes nothing; that is silent degradation, not an error.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::http::{Method, Request, Response, StatusCode};
use crate::router::{RouteProvider, RouteTable};

/// Body sent with every `404` dispatch outcome.
const NOT_FOUND_BODY: &str = "Page not found";

/// The flattened key/value input handed to handlers.
pub type Payload = serde_json::Map<String, Value>;

/// A normalized request: uppercase method, slash-stripped path, merged payload.
///
/// # Examples
///
/// ```
/// use bitroute::dispatch::{Payload, RequestInput};
/// use bitroute::http::{Method, Request};
///
/// let raw = b"get /menus/?name=home HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, _) = Request::parse(raw).unwrap();
/// let input = RequestInput::from_request(&request, Payload::new());
///
/// assert_eq!(input.method, Method::Get);
/// assert_eq!(input.path, "/menus");
/// assert_eq!(input.payload["name"], "home");
/// ```
#[derive(Debug)]
pub struct RequestInput {
    /// The transport verb, uppercased.
    pub method: Method,
    /// The request target's path component with exactly one trailing slash
    /// stripped. The root `/` becomes the empty string; the route table
    /// normalizes declared paths the same way, so a declared `/` still
    /// matches.
    pub path: String,
    /// Ambient, body, and query fields merged in precedence order.
    pub payload: Payload,
}

impl RequestInput {
    /// Normalizes `request`, layering its body and query fields over the
    /// host-supplied `ambient` parameters.
    pub fn from_request(request: &Request, ambient: Payload) -> Self {
        let method: Method = request
            .method()
            .as_str()
            .to_ascii_uppercase()
            .parse()
            .unwrap(); // Infallible

        let raw_path = request.path();
        let path = raw_path.strip_suffix('/').unwrap_or(raw_path).to_owned();

        let mut payload = ambient;

        if let Ok(Value::Object(fields)) = serde_json::from_slice::<Value>(request.body()) {
            payload.extend(fields);
        }

        for (key, value) in request.query_params() {
            payload.insert(key.clone(), Value::String(value.clone()));
        }

        Self {
            method,
            path,
            payload,
        }
    }

    /// Deserializes the merged payload into a typed value.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`serde_json::Error`] when the payload does
    /// not match `T`'s shape.
    pub fn payload_as<T>(&self) -> Result<T, serde_json::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        serde_json::from_value(Value::Object(self.payload.clone()))
    }
}

/// Matches normalized requests against a route table and runs the handlers.
///
/// The table is built once and shared read-only behind an `Arc`, so a
/// `Dispatcher` is cheap to clone into every connection task. The dispatch
/// cycle itself is synchronous and non-suspending; the host owns all
/// concurrency fan-out.
///
/// # Examples
///
/// ```
/// use bitroute::dispatch::{Dispatcher, Payload, RequestInput};
/// use bitroute::http::Method;
/// use bitroute::reply::Reply;
/// use bitroute::router::{MethodMask, RouteDeclaration, RouteTable};
///
/// let mut table = RouteTable::new();
/// table.insert(RouteDeclaration::new("/ping", MethodMask::GET, |_payload| {
///     Reply::text("pong")
/// }));
///
/// let dispatcher = Dispatcher::new(table);
/// let response = dispatcher.dispatch(RequestInput {
///     method: Method::Get,
///     path: "/ping".into(),
///     payload: Payload::new(),
/// });
/// assert_eq!(response.status().as_u16(), 200);
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<RouteTable>,
}

impl Dispatcher {
    /// Wraps a finished route table for dispatching.
    pub fn new(table: RouteTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Builds the route table from a provider manifest and wraps it.
    pub fn from_providers(providers: &[&dyn RouteProvider]) -> Self {
        Self::new(RouteTable::build(providers))
    }

    /// Returns the underlying route table.
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Runs one dispatch cycle for a normalized request.
    ///
    /// On a miss this returns `404` with the body `Page not found` and no
    /// handler is invoked. On a hit the handler receives the payload and its
    /// reply is encoded per the four-way table in [`crate::reply`]. A handler
    /// panic is not caught here; it propagates to the host.
    pub fn dispatch(&self, input: RequestInput) -> Response {
        let Some(entry) = self.table.lookup(&input.method, &input.path) else {
            debug!(method = %input.method, path = %input.path, "no route matched");
            return Response::new(StatusCode::NotFound).body(NOT_FOUND_BODY);
        };

        debug!(method = %input.method, path = %entry.path(), "route matched");
        (entry.handler())(input.payload).into_response()
    }

    /// Normalizes `request` with an empty ambient map and dispatches it.
    pub fn handle(&self, request: &Request) -> Response {
        self.dispatch(RequestInput::from_request(request, Payload::new()))
    }
}
