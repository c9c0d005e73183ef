//! Static file serving.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::BytesMut;
use http_body_util::{BodyExt, StreamBody};
use hyper::body::Frame;
use tokio::fs::{self, File};
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::Error;
use crate::handler::Handler;
use crate::mime;
use crate::request::Request;
use crate::response::{Response, ResponseBody};

const CHUNK_SIZE: usize = 64 * 1024;

/// Middleware serving files below `root`.
///
/// The request's decoded path (query string excluded) is resolved under
/// `root`. A regular file is streamed back with a content type taken from
/// [`mime::content_type`], and the request ends there. Anything else (a
/// missing path, a directory, a path containing `..`) falls through to the
/// next middleware or route, as does any path whose metadata cannot be read.
/// Failing to open or read a file that exists aborts the request with a 500.
///
/// ```rust,no_run
/// use spur::{App, middleware};
///
/// let app = App::new().middleware(middleware::static_files("public"));
/// ```
pub fn static_files(root: impl Into<PathBuf>) -> impl Handler {
    let root = Arc::new(root.into());
    move |req: Request, res: Response| {
        let root = Arc::clone(&root);
        async move { serve(&root, &req, &res).await }
    }
}

async fn serve(root: &Path, req: &Request, res: &Response) -> Result<(), Error> {
    let Some(path) = resolve(root, req.path()) else {
        return Ok(());
    };

    // A path that cannot be inspected (missing, NUL byte, name too long)
    // names no file; only a failure to open an existing file is an error.
    let meta = match fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => return Ok(()),
        Err(e) => {
            if !matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) {
                debug!(path = %path.display(), error = %e, "static path not inspectable, falling through");
            }
            return Ok(());
        }
    };

    let file = File::open(&path).await?;
    debug!(path = %path.display(), bytes = meta.len(), "serving static file");
    res.finish_with(Some(mime::content_type(&path)), file_body(file))
}

/// Joins `request_path` onto `root`. Only plain name components are
/// accepted, so the result can never leave `root`.
fn resolve(root: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = Path::new(request_path.trim_start_matches('/'));
    if relative.components().any(|c| !matches!(c, Component::Normal(_))) {
        return None;
    }
    Some(root.join(relative))
}

fn file_body(file: File) -> ResponseBody {
    let chunks = futures_util::stream::try_unfold(file, |mut file| async move {
        let mut buf = BytesMut::with_capacity(CHUNK_SIZE);
        if file.read_buf(&mut buf).await? == 0 {
            return Ok(None);
        }
        Ok::<_, std::io::Error>(Some((Frame::data(buf.freeze()), file)))
    });
    StreamBody::new(chunks).boxed_unsync()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::header::CONTENT_TYPE;
    use http::{HeaderMap, StatusCode, Uri};

    use super::*;
    use crate::method::Method;

    /// A fresh directory under the system temp dir.
    fn scratch_dir() -> PathBuf {
        static NEXT: AtomicUsize = AtomicUsize::new(0);
        let dir = std::env::temp_dir().join(format!(
            "spur-static-{}-{}",
            std::process::id(),
            NEXT.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn get(uri: &'static str) -> Request {
        Request::new(Method::Get, Uri::from_static(uri), HeaderMap::new())
    }

    #[test]
    fn resolve_rejects_traversal() {
        let root = Path::new("public");
        assert_eq!(resolve(root, "/css/site.css"), Some(root.join("css/site.css")));
        assert_eq!(resolve(root, "/"), Some(root.join("")));
        assert_eq!(resolve(root, "/../secret"), None);
        assert_eq!(resolve(root, "/css/../../secret"), None);
    }

    #[tokio::test]
    async fn streams_file_with_content_type() {
        let root = scratch_dir();
        // Larger than one chunk so the body arrives in several frames.
        let css = "body { color: red; }\n".repeat(8 * 1024);
        std::fs::write(root.join("index.css"), &css).unwrap();

        let res = Response::new();
        serve(&root, &get("/index.css?v=3"), &res).await.unwrap();
        assert!(res.is_sent());

        let http = res.into_http();
        assert_eq!(http.status(), StatusCode::OK);
        assert_eq!(http.headers()[CONTENT_TYPE], "text/css");
        let body = http.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, css.as_bytes());
    }

    #[tokio::test]
    async fn unknown_extension_is_plain_text() {
        let root = scratch_dir();
        std::fs::write(root.join("notes.md"), "# hi").unwrap();

        let res = Response::new();
        serve(&root, &get("/notes.md"), &res).await.unwrap();
        assert_eq!(res.into_http().headers()[CONTENT_TYPE], "text/plain");
    }

    #[tokio::test]
    async fn decodes_path_before_lookup() {
        let root = scratch_dir();
        std::fs::write(root.join("my page.html"), "<p>hi</p>").unwrap();

        let res = Response::new();
        serve(&root, &get("/my%20page.html"), &res).await.unwrap();
        assert!(res.is_sent());
    }

    #[tokio::test]
    async fn missing_files_and_directories_fall_through() {
        let root = scratch_dir();
        std::fs::create_dir_all(root.join("nested")).unwrap();
        std::fs::write(root.join("file.txt"), "x").unwrap();

        for uri in ["/missing.css", "/nested", "/", "/file.txt/below", "/../etc/passwd"] {
            let res = Response::new();
            serve(&root, &get_owned(uri), &res).await.unwrap();
            assert!(!res.is_sent(), "{uri} should fall through");
        }
    }

    #[tokio::test]
    async fn uninspectable_paths_fall_through() {
        let root = scratch_dir();
        let long_name = format!("/{}.css", "a".repeat(300));

        for uri in ["/%00", "/style%00.css", long_name.as_str()] {
            let res = Response::new();
            serve(&root, &get_owned(uri), &res).await.unwrap();
            assert!(!res.is_sent(), "{uri} should fall through");
        }
    }

    fn get_owned(uri: &str) -> Request {
        Request::new(Method::Get, uri.parse().unwrap(), HeaderMap::new())
    }
}
