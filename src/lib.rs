//! # trellis
//!
//! A small web framework with the plumbing most applications end up writing
//! anyway: an ordered route table, onion-style middleware, cookie-backed
//! sessions, and CSRF protection. Handlers are plain `async fn`s returning
//! `Result<Response>`; everything that can go wrong maps onto a fixed
//! five-kind error taxonomy with fixed status codes.
//!
//! ## The pipeline
//!
//! ```text
//! transport events ─▶ Assembler ─▶ Request ─▶ route lookup
//!      ─▶ middleware chain (first registered = outermost) ─▶ handler
//!      ─▶ Response (or error, mapped to a textual response) ─▶ wire
//! ```
//!
//! Routes match in registration order, first match wins — the route table
//! reads top to bottom like the file that built it. Middleware composes like
//! nested scoped blocks: the first `wrap` sees the request first and the
//! response last.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use trellis::{App, CsrfProtection, Request, Response, Result, Server, SessionMiddleware};
//!
//! #[tokio::main]
//! async fn main() {
//!     let csrf = CsrfProtection::new();
//!
//!     let app = App::new()
//!         .wrap(SessionMiddleware::new())
//!         .wrap(csrf.clone())
//!         .get("/users/<id>", get_user)
//!         .get("/static/*", static_stub);
//!
//!     Server::bind("0.0.0.0:8000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Result<Response> {
//!     let id = req.param("id").unwrap_or("unknown");
//!     Ok(Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes()))
//! }
//!
//! async fn static_stub(_req: Request) -> Result<Response> {
//!     Ok(Response::text("static"))
//! }
//! ```

mod assembler;
mod dispatch;
mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod server;
mod status;
mod value;

pub mod auth;
pub mod csrf;
pub mod db;
pub mod middleware;
pub mod session;

pub use assembler::{Assembler, TransportEvent};
pub use csrf::CsrfProtection;
pub use dispatch::Dispatcher;
pub use error::{Error, Result};
pub use handler::Handler;
pub use method::Method;
pub use middleware::Middleware;
pub use pattern::PathPattern;
pub use request::Request;
pub use response::Response;
pub use router::Router;
pub use server::{App, Server};
pub use session::{Session, SessionMiddleware};
pub use status::Status;
pub use value::Value;
