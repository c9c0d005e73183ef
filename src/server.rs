//! HTTP server and graceful shutdown.
//!
//! [`Server::serve`] runs in the foreground until SIGTERM or Ctrl-C, then
//! stops accepting, lets every in-flight connection finish and returns.
//! [`Server::spawn`] (and its shorthand [`App::listen`](crate::App::listen))
//! runs the same loop on a background task and hands back a
//! [`ServerHandle`].

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::app::App;
use crate::error::Error;

/// The HTTP server.
pub struct Server {
    addr: String,
}

impl Server {
    /// Configures the server to bind to `addr` (`host:port`) when it starts.
    /// Resolution and binding errors surface from [`serve`](Server::serve) or
    /// [`spawn`](Server::spawn).
    ///
    /// ```rust
    /// use spur::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Serves `app` until SIGTERM or Ctrl-C, then drains in-flight
    /// connections.
    pub async fn serve(self, app: App) -> Result<(), Error> {
        self.serve_with_shutdown(app, shutdown_signal()).await
    }

    /// Serves `app` until `signal` resolves, then drains in-flight
    /// connections.
    pub async fn serve_with_shutdown(
        self,
        app: App,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr.as_str()).await?;
        run(listener, Arc::new(app), signal).await
    }

    /// Binds now and serves `app` on a background task.
    pub async fn spawn(self, app: App) -> Result<ServerHandle, Error> {
        let listener = TcpListener::bind(self.addr.as_str()).await?;
        let local_addr = listener.local_addr()?;
        let (shutdown, stop) = oneshot::channel::<()>();

        // A dropped sender resolves `stop` too, so dropping the handle also
        // shuts the server down.
        let task = tokio::spawn(run(listener, Arc::new(app), async move {
            let _ = stop.await;
        }));

        Ok(ServerHandle { local_addr, shutdown, task })
    }
}

/// A server running on a background task.
///
/// Dropping the handle stops the server the same way [`shutdown`] does,
/// without waiting for it.
///
/// [`shutdown`]: ServerHandle::shutdown
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<Result<(), Error>>,
}

impl ServerHandle {
    /// The bound address; useful after binding port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stops accepting, waits for in-flight connections to finish.
    pub async fn shutdown(self) -> Result<(), Error> {
        let _ = self.shutdown.send(());
        self.task.await?
    }

    /// Waits until the server stops on its own (accept loop failure or task
    /// panic). Keeps the server running in the meantime.
    pub async fn wait(self) -> Result<(), Error> {
        let Self { shutdown: _keep_alive, task, .. } = self;
        task.await?
    }
}

async fn run(listener: TcpListener, app: Arc<App>, signal: impl Future<Output = ()>) -> Result<(), Error> {
    info!(
        addr = %listener.local_addr()?,
        routes = app.routes.len(),
        middleware = app.middleware.len(),
        "spur listening"
    );

    // Every spawned connection task, so shutdown can wait for them.
    let mut tasks = tokio::task::JoinSet::new();

    // Flipped once on shutdown; idle keep-alive connections close on it
    // instead of holding the drain open.
    let (drain_tx, drain_rx) = watch::channel(());

    tokio::pin!(signal);

    loop {
        tokio::select! {
            // Check shutdown first so a signal stops accepting immediately,
            // even if more connections are queued.
            biased;

            () = &mut signal => {
                info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                break;
            }

            res = listener.accept() => {
                let (stream, remote_addr) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        error!("accept error: {e}");
                        continue;
                    }
                };

                let app = Arc::clone(&app);
                let mut drain = drain_rx.clone();
                let io = TokioIo::new(stream);

                tasks.spawn(async move {
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let app = Arc::clone(&app);
                        async move { Ok::<_, Infallible>(app.handle(req).await) }
                    });

                    // HTTP/1.1 or HTTP/2, whatever the client speaks.
                    let builder = ConnBuilder::new(TokioExecutor::new());
                    let conn = builder.serve_connection(io, svc);
                    tokio::pin!(conn);

                    let result = tokio::select! {
                        res = conn.as_mut() => res,
                        _ = drain.changed() => {
                            // Finish the request in progress, then close.
                            conn.as_mut().graceful_shutdown();
                            conn.await
                        }
                    };
                    if let Err(e) = result {
                        error!(peer = %remote_addr, "connection error: {e}");
                    }
                });
            }

            // Reap finished connection tasks so the JoinSet does not grow
            // without bound on long-running servers.
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    let _ = drain_tx.send(());
    while tasks.join_next().await.is_some() {}

    info!("spur stopped");
    Ok(())
}

/// Resolves on the first shutdown signal the process receives: SIGTERM or
/// SIGINT on Unix, Ctrl-C elsewhere. If a handler cannot be installed that
/// signal is simply never observed.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
