//! Per-request pipeline.
//!
//! ```text
//! Received ─▶ BodyParsing ─▶ MiddlewareRunning ─▶ RouteMatching ─▶ RouteHandling ─▶ Finalized
//!              (POST/PUT/PATCH)      │                  │
//!                                    └─ response sent ──┴─ no route: 404 ─────────────▶ Finalized
//! ```
//!
//! Stages run strictly one after another; none is revisited. Any stage may
//! fail, which jumps straight to `Finalized` with an error response. Exactly
//! one response leaves this module per request.

use std::fmt;
use std::time::Instant;

use bytes::Bytes;
use http::StatusCode;
use hyper::body::Body;
use tracing::{debug, error};

use crate::app::App;
use crate::body;
use crate::error::{BoxError, Error};
use crate::handler::Flow;
use crate::method::Method;
use crate::request::Request;
use crate::response::{Response, ResponseBody};

/// The stage a request failed in, for logs.
#[derive(Clone, Copy, Debug)]
enum Stage {
    BodyParsing,
    MiddlewareRunning,
    RouteMatching,
    RouteHandling,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BodyParsing       => "body-parsing",
            Self::MiddlewareRunning => "middleware",
            Self::RouteMatching     => "route-matching",
            Self::RouteHandling     => "route-handling",
        })
    }
}

pub(crate) async fn dispatch<B>(app: &App, req: http::Request<B>) -> http::Response<ResponseBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();
    let response = Response::new();

    let Ok(method) = Method::try_from(&parts.method) else {
        debug!(method = %parts.method, "unsupported method");
        response.replace(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        return response.into_http();
    };

    let mut request = Request::new(method, parts.uri, parts.headers);
    if let Err((stage, err)) = run(app, &mut request, &response, body).await {
        finalize_error(&response, stage, err);
    }

    let http = response.into_http();
    debug!(
        %method,
        path = request.path(),
        status = http.status().as_u16(),
        elapsed_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        "request finalized"
    );
    http
}

async fn run<B>(
    app: &App,
    req: &mut Request,
    res: &Response,
    body: B,
) -> Result<(), (Stage, Error)>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    if req.method().carries_body() {
        body::parse(req, res, body).await.map_err(|e| (Stage::BodyParsing, e))?;
    }

    let flow = app.middleware.run(req, res).await.map_err(|e| (Stage::MiddlewareRunning, e))?;
    if flow == Flow::Finished {
        return Ok(());
    }

    let Some((chain, params)) = app.routes.lookup(req.method(), req.path()) else {
        return Err((Stage::RouteMatching, Error::NotFound));
    };

    let req = req.with_params(params);
    for handler in chain.iter() {
        handler.call(req.clone(), res.clone()).await.map_err(|e| (Stage::RouteHandling, e))?;
        if res.is_sent() {
            break;
        }
    }
    Ok(())
}

/// Turns a pipeline failure into the client-facing response. A response that
/// is already finalized is left alone; the failure is only logged.
fn finalize_error(res: &Response, stage: Stage, err: Error) {
    if err.is_server_error() {
        error!(%stage, error = %err, "request failed");
    } else {
        debug!(%stage, error = %err, "request rejected");
    }

    if res.is_sent() {
        return;
    }
    match err {
        Error::NotFound => res.replace(StatusCode::NOT_FOUND, "Not Found"),
        Error::BadRequest(_) => res.replace(StatusCode::BAD_REQUEST, "Bad Request"),
        _ => res.replace(StatusCode::INTERNAL_SERVER_ERROR, "Server Error"),
    }
}
