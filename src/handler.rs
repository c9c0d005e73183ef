//! Handler trait, handler chains and type erasure.
//!
//! # How async handlers are stored
//!
//! Routes and middleware hold handlers of *different* concrete types in one
//! collection, so every handler is erased behind `dyn ErasedHandler`:
//!
//! ```text
//! async fn show(req: Request, res: Response) -> Result<(), Error> { … }
//!        ↓ app.get("/users/:id", show)
//! show.into_boxed_handler()                     ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                     ← stored as BoxedHandler
//!        ↓
//! handler.call(req, res)  at request time       ← one vtable dispatch
//!        ↓
//! Box::pin(async { show(req, res).await.into_outcome() })
//! ```
//!
//! # Continuation
//!
//! A handler's return value is its continuation signal. `Ok(())` (or `()`)
//! hands control to the next handler; `Err(e)` aborts the pipeline with `e`.
//! Calling a terminal [`Response`] helper (`send`, `json`, `end`) finalizes
//! the request and nothing after that handler runs.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased handler future.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'static>>;

#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request, res: Response) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Where the pipeline stands after a stage ran without error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Flow {
    /// Nothing finalized the response; move on to the next stage.
    Continue,
    /// A handler finalized the response; skip everything that is left.
    Finished,
}

// ── Outcome ───────────────────────────────────────────────────────────────────

/// Conversion of a handler's return value into the pipeline's continuation
/// signal.
///
/// Implemented for `()` (always continue) and for `Result<(), E>` where `E`
/// converts into [`Error`].
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<(), Error>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), Error> { Ok(()) }
}

impl<E: Into<Error>> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), Error> { self.map_err(Into::into) }
}

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid middleware or route handler.
///
/// You never implement this yourself. It is satisfied by any function or
/// closure of the shape:
///
/// ```text
/// async fn name(req: Request, res: Response) -> impl IntoOutcome
/// ```
///
/// Closures passed straight to the registration methods need their argument
/// types spelled out: `|req: Request, res: Response| async move { … }`.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, O> private::Sealed for F
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: IntoOutcome + Send + 'static,
{
}

impl<F, Fut, O> Handler for F
where
    F: Fn(Request, Response) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = O> + Send + 'static,
    O: IntoOutcome + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, O> ErasedHandler for FnHandler<F>
where
    F: Fn(Request, Response) -> Fut + Send + Sync,
    Fut: Future<Output = O> + Send + 'static,
    O: IntoOutcome + Send + 'static,
{
    fn call(&self, req: Request, res: Response) -> BoxFuture {
        let fut = (self.0)(req, res);
        Box::pin(async move { fut.await.into_outcome() })
    }
}

// ── Chains ────────────────────────────────────────────────────────────────────

/// An ordered sequence of handlers registered under one route.
///
/// ```rust,no_run
/// # use spur::{App, Chain, Request, Response, Error};
/// # async fn authenticate(_: Request, _: Response) -> Result<(), Error> { Ok(()) }
/// # async fn update_user(_: Request, _: Response) -> Result<(), Error> { Ok(()) }
/// App::new().put("/users/:id", Chain::new(authenticate).then(update_user));
/// ```
#[derive(Clone)]
pub struct Chain {
    handlers: Vec<BoxedHandler>,
}

impl Chain {
    pub fn new(first: impl Handler) -> Self {
        Self { handlers: vec![first.into_boxed_handler()] }
    }

    /// Appends a handler that runs after the ones already in the chain.
    pub fn then(mut self, next: impl Handler) -> Self {
        self.handlers.push(next.into_boxed_handler());
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &BoxedHandler> {
        self.handlers.iter()
    }

    pub(crate) fn into_handlers(self) -> Vec<BoxedHandler> {
        self.handlers
    }
}

/// Anything that can be registered as a route's handler chain: a single
/// [`Handler`] or a [`Chain`].
pub trait IntoChain {
    fn into_chain(self) -> Chain;
}

impl<H: Handler> IntoChain for H {
    fn into_chain(self) -> Chain {
        Chain::new(self)
    }
}

impl IntoChain for Chain {
    fn into_chain(self) -> Chain {
        self
    }
}
