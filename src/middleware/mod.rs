//! Middleware layer.
//!
//! Middleware runs for every request, after the body is parsed and before
//! routing, strictly in registration order. An entry registered with a prefix
//! only runs when the decoded path starts with that prefix. The test is a
//! plain string prefix, not segment-aware: prefix `/us` also covers `/users`.
//!
//! A middleware continues the pipeline by returning `Ok(())`, aborts it by
//! returning `Err`, and ends it early by finalizing the response (this is how
//! [`static_files`] serves a file without any route running).

mod static_files;

pub use static_files::static_files;

use crate::error::Error;
use crate::handler::{BoxedHandler, Flow};
use crate::request::Request;
use crate::response::Response;

struct Layer {
    prefix: Option<String>,
    handler: BoxedHandler,
}

impl Layer {
    fn applies_to(&self, path: &str) -> bool {
        self.prefix.as_deref().is_none_or(|prefix| path.starts_with(prefix))
    }
}

#[derive(Default)]
pub(crate) struct MiddlewareChain {
    layers: Vec<Layer>,
}

impl MiddlewareChain {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, prefix: Option<String>, handler: BoxedHandler) {
        self.layers.push(Layer { prefix, handler });
    }

    pub(crate) fn len(&self) -> usize {
        self.layers.len()
    }

    pub(crate) async fn run(&self, req: &Request, res: &Response) -> Result<Flow, Error> {
        for layer in self.layers.iter().filter(|l| l.applies_to(req.path())) {
            layer.handler.call(req.clone(), res.clone()).await?;
            if res.is_sent() {
                return Ok(Flow::Finished);
            }
        }
        Ok(Flow::Continue)
    }
}
