//! The application: route table plus middleware chain.
//!
//! Build it once at startup with chained calls, then hand it to
//! [`App::listen`] or [`Server::serve`](crate::Server::serve). Serving takes
//! ownership, so nothing can be registered once requests are flowing.

use bytes::Bytes;
use hyper::body::Body;

use crate::dispatch;
use crate::error::{BoxError, Error};
use crate::handler::IntoChain;
use crate::method::Method;
use crate::middleware::MiddlewareChain;
use crate::response::ResponseBody;
use crate::router::RouteTable;
use crate::server::{Server, ServerHandle};

/// Routes and middleware for one server.
///
/// Requests whose method is not a standard HTTP method (RFC 9110) are
/// answered `405 Method Not Allowed` before anything registered here runs:
/// no middleware, including [`static_files`](crate::middleware::static_files),
/// sees them.
///
/// ```rust,no_run
/// use serde_json::json;
/// use spur::{App, Error, Request, Response, StatusCode, middleware};
///
/// # async fn run() -> Result<(), Error> {
/// let app = App::new()
///     .middleware(log_requests)
///     .get("/", home)
///     .get("/users/:id", get_user)
///     .post("/data", create_data)
///     .middleware(middleware::static_files("public"));
///
/// let server = app.listen("0.0.0.0:3000").await?;
/// println!("listening on {}", server.local_addr());
/// server.wait().await
/// # }
///
/// async fn log_requests(req: Request, _res: Response) {
///     tracing::info!(path = req.path(), "incoming");
/// }
///
/// async fn home(_req: Request, res: Response) -> Result<(), Error> {
///     res.send("Welcome!")
/// }
///
/// async fn get_user(req: Request, res: Response) -> Result<(), Error> {
///     res.json(&json!({ "userId": req.param("id") }))
/// }
///
/// async fn create_data(_req: Request, res: Response) -> Result<(), Error> {
///     res.status(StatusCode::CREATED).send("Data received")
/// }
/// ```
pub struct App {
    pub(crate) routes: RouteTable,
    pub(crate) middleware: MiddlewareChain,
}

impl App {
    pub fn new() -> Self {
        Self { routes: RouteTable::new(), middleware: MiddlewareChain::new() }
    }

    /// Register a handler chain for a method + pattern pair. Returns `self`
    /// for chaining.
    ///
    /// Patterns are `/`-separated; a `:name` segment captures that position
    /// of the path, readable with `req.param("name")`. Registering an
    /// equivalent pattern again replaces the earlier chain.
    pub fn on(mut self, method: Method, pattern: &str, handlers: impl IntoChain) -> Self {
        self.routes.register(method, pattern, handlers.into_chain());
        self
    }

    pub fn get(self, pattern: &str, handlers: impl IntoChain) -> Self {
        self.on(Method::Get, pattern, handlers)
    }

    pub fn post(self, pattern: &str, handlers: impl IntoChain) -> Self {
        self.on(Method::Post, pattern, handlers)
    }

    pub fn put(self, pattern: &str, handlers: impl IntoChain) -> Self {
        self.on(Method::Put, pattern, handlers)
    }

    pub fn patch(self, pattern: &str, handlers: impl IntoChain) -> Self {
        self.on(Method::Patch, pattern, handlers)
    }

    pub fn delete(self, pattern: &str, handlers: impl IntoChain) -> Self {
        self.on(Method::Delete, pattern, handlers)
    }

    /// Append middleware that runs for every request. A [`Chain`] adds one
    /// middleware entry per handler, in order.
    ///
    /// [`Chain`]: crate::Chain
    pub fn middleware(self, handlers: impl IntoChain) -> Self {
        self.push_middleware(None, handlers)
    }

    /// Append middleware that runs only when the decoded request path starts
    /// with `prefix`.
    pub fn middleware_at(self, prefix: &str, handlers: impl IntoChain) -> Self {
        self.push_middleware(Some(prefix), handlers)
    }

    fn push_middleware(mut self, prefix: Option<&str>, handlers: impl IntoChain) -> Self {
        for handler in handlers.into_chain().into_handlers() {
            self.middleware.push(prefix.map(str::to_owned), handler);
        }
        self
    }

    /// Runs one request through the pipeline and returns the finalized
    /// response. The server calls this for every request; it is also the
    /// way to exercise an `App` without a socket.
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<ResponseBody>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<BoxError>,
    {
        dispatch::dispatch(self, req).await
    }

    /// Binds `addr` and starts serving in the background. Returns once the
    /// listener is bound and accepting.
    pub async fn listen(self, addr: &str) -> Result<ServerHandle, Error> {
        Server::bind(addr).spawn(self).await
    }
}

impl Default for App {
    fn default() -> Self { Self::new() }
}
