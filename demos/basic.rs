//! Minimal spur example: a logging middleware, a few routes and static files.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/
//!   curl http://localhost:3000/users/42
//!   curl -X POST http://localhost:3000/data \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"alice"}'
//!   curl http://localhost:3000/index.css

use serde_json::json;
use spur::{App, Error, Request, Response, StatusCode, middleware};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let public = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/public");

    let app = App::new()
        .middleware(log_request)
        .get("/",          home)
        .get("/users/:id", get_user)
        .post("/data",     create_data)
        .middleware(middleware::static_files(public));

    let server = app.listen("0.0.0.0:3000").await?;
    info!(addr = %server.local_addr(), "server running");
    server.wait().await
}

async fn log_request(req: Request, _res: Response) {
    info!(method = %req.method(), path = req.path(), "middleware running");
}

// GET /
async fn home(_req: Request, res: Response) -> Result<(), Error> {
    res.send("Welcome to spur!")
}

// GET /users/:id
async fn get_user(req: Request, res: Response) -> Result<(), Error> {
    res.json(&json!({ "userId": req.param("id") }))
}

// POST /data → 201
//
// The body is already decoded: req.body() is the JSON value, `{}` when the
// client sent nothing. Malformed JSON never gets here (400 Invalid JSON).
async fn create_data(req: Request, res: Response) -> Result<(), Error> {
    info!(body = ?req.body(), "data received");
    res.status(StatusCode::CREATED).send("Data received")
}
