//! Request classification helpers.
//!
//! # Responsibilities
//! - Detect static assets by file extension
//! - Derive the short tag that labels a request in every payload format
//!
//! # Design Decisions
//! - Extension matching is exact and case-sensitive
//! - Both functions ignore the query string

/// Extensions treated as static assets.
pub const STATIC_EXTENSIONS: [&str; 10] = [
    "css", "js", "jpeg", "jpg", "png", "gif", "ico", "svg", "woff", "woff2",
];

/// Strip the query string from a request target.
fn strip_query(uri: &str) -> &str {
    uri.split('?').next().unwrap_or(uri)
}

/// Returns true if the URI points at a static asset.
///
/// The "extension" is everything after the last `.` of the path. A path
/// without any `.` yields the whole path, which never matches.
pub fn is_static(uri: &str) -> bool {
    let path = strip_query(uri);
    let extension = path.rsplit('.').next().unwrap_or(path);
    STATIC_EXTENSIONS.contains(&extension)
}

/// Derive the tag for a request.
///
/// `"root"` for `/`, otherwise the lowercased method followed by the path
/// with every `/` replaced by `_`.
pub fn tag(method: &str, uri: &str) -> String {
    if uri == "/" {
        return "root".to_string();
    }
    format!(
        "{}{}",
        method.to_lowercase(),
        strip_query(uri).replace('/', "_")
    )
}
