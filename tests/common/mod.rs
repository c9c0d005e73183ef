//! Shared helpers for integration tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use spur::{App, ServerHandle};

/// Starts `app` on an ephemeral local port.
pub async fn start(app: App) -> ServerHandle {
    app.listen("127.0.0.1:0").await.expect("server failed to bind")
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .expect("client build")
}

pub fn url(server: &ServerHandle, path: &str) -> String {
    format!("http://{}{}", server.local_addr(), path)
}

/// A fresh directory under the system temp dir, populated with `files`.
#[allow(dead_code)]
pub fn public_dir(files: &[(&str, &str)]) -> PathBuf {
    static NEXT: AtomicUsize = AtomicUsize::new(0);
    let dir = std::env::temp_dir().join(format!(
        "spur-it-{}-{}",
        std::process::id(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).unwrap();
    for (name, contents) in files {
        std::fs::write(dir.join(name), contents).unwrap();
    }
    dir
}
