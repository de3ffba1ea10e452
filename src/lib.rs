//! # bitroute
//!
//! A declarative HTTP router: handlers advertise routes as `(path, verb
//! bitmask)` declarations, a route table is built once from an explicit
//! provider manifest, and inbound requests are matched case- and
//! trailing-slash-insensitively before the handler's tagged reply is
//! encoded onto the wire. A from-scratch async HTTP/1.1 host carries the
//! whole thing end to end.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bitroute::dispatch::Dispatcher;
//! use bitroute::reply::Reply;
//! use bitroute::router::{MethodMask, RouteDeclaration, RouteProvider};
//! use bitroute::server::Server;
//! use serde_json::json;
//!
//! struct MenuController;
//!
//! impl RouteProvider for MenuController {
//!     fn routes(&self) -> Vec<RouteDeclaration> {
//!         vec![RouteDeclaration::new("/menus", MethodMask::GET, |_payload| {
//!             Reply::json(json!({"menus": {"home": "Home"}}))
//!         })]
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dispatcher = Dispatcher::from_providers(&[&MenuController]);
//!     let server = Server::bind("127.0.0.1:8080").await?;
//!     println!("Listening on http://127.0.0.1:8080");
//!     server.serve(dispatcher).await?;
//!     Ok(())
//! }
//! ```

pub mod dispatch;
pub mod http;
pub mod reply;
pub mod router;
pub mod server;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use dispatch::{Dispatcher, Payload, RequestInput};
pub use http::{Headers, Method, Request, Response, StatusCode};
pub use reply::Reply;
pub use router::{MethodMask, RouteDeclaration, RouteProvider, RouteTable};
pub use server::{Server, ServerError};
