//! Content-type lookup for static files.

use std::path::Path;

/// Returns the content type for `path` based on its extension.
///
/// The table is deliberately small. Anything not listed, including files
/// without an extension, is served as `text/plain`. Extensions are matched
/// case-sensitively.
///
/// ```
/// use spur::mime::content_type;
/// assert_eq!(content_type("public/site.css"), "text/css");
/// assert_eq!(content_type("README"), "text/plain");
/// ```
pub fn content_type(path: impl AsRef<Path>) -> &'static str {
    match path.as_ref().extension().and_then(|e| e.to_str()) {
        Some("html") => "text/html",
        Some("css") => "text/css",
        Some("js") => "text/javascript",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "text/plain",
    }
}
