//! # spur
//!
//! A minimal HTTP toolkit: an ordered route table, a middleware pipeline,
//! request/response helpers, JSON bodies and a static-file middleware, on
//! top of tokio and hyper.
//!
//! ## The pipeline
//!
//! Every request goes through the same stages, one after another:
//!
//! 1. **Body**: POST, PUT and PATCH bodies are read in full and decoded as
//!    JSON (`{}` when empty). Invalid JSON is answered with `400` right away.
//! 2. **Middleware**: in registration order, optionally filtered by a path
//!    prefix.
//! 3. **Routing**: an exact lookup on the path first, then the
//!    parameterized patterns (`/users/:id`) in registration order.
//! 4. **Handlers**: the matched route's handler chain.
//!
//! A handler continues the pipeline by returning `Ok(())`, aborts it by
//! returning `Err` (the client gets `500 Server Error`, the error goes to the
//! log), and ends it by sending a response. No route: `404 Not Found`.
//!
//! What this crate intentionally leaves to the reverse proxy in front of it:
//! TLS, keep-alive tuning, body-size limits and rate limiting.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use serde_json::json;
//! use spur::{App, Error, Request, Response, Server, StatusCode, middleware};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let app = App::new()
//!         .get("/users/:id", get_user)
//!         .post("/users",    create_user)
//!         .middleware(middleware::static_files("public"));
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(req: Request, res: Response) -> Result<(), Error> {
//!     res.json(&json!({ "userId": req.param("id") }))
//! }
//!
//! async fn create_user(req: Request, res: Response) -> Result<(), Error> {
//!     let name = req.body().and_then(|b| b.get("name")).cloned();
//!     res.status(StatusCode::CREATED).send(json!({ "name": name }))
//! }
//! ```
//!
//! ## Logging
//!
//! spur emits [`tracing`] events and never installs a subscriber; that is
//! the application's call.

mod app;
mod body;
mod dispatch;
mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;
pub mod mime;

pub use app::App;
pub use error::{BoxError, Error};
pub use handler::{Chain, Handler, IntoChain, IntoOutcome};
pub use http::StatusCode;
pub use method::Method;
pub use pattern::Params;
pub use request::{QueryValue, Request};
pub use response::{Payload, Response, ResponseBody};
pub use server::{Server, ServerHandle};
