//! Fixed extension tables for asset classification and content types.

/// Extensions accepted as assets, both for archive entries and mirrored resources
pub const ASSET_EXTENSIONS: &[&str] = &[
    "css", "js", "jpg", "jpeg", "png", "gif", "svg", "webp", "ico", "woff", "woff2", "ttf", "eot",
];

/// Extensions stored as decoded text rather than raw bytes
pub const TEXT_EXTENSIONS: &[&str] = &["css", "js", "svg"];

/// Extensions recognized as image mockups
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "svg", "webp"];

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

#[must_use]
pub fn is_asset_extension(ext: &str) -> bool {
    ASSET_EXTENSIONS.contains(&ext)
}

#[must_use]
pub fn is_text_extension(ext: &str) -> bool {
    TEXT_EXTENSIONS.contains(&ext)
}

#[must_use]
pub fn is_page_extension(ext: &str) -> bool {
    matches!(ext, "html" | "htm")
}

/// Content type for a lowercased extension, `application/octet-stream` when unknown
#[must_use]
pub fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "html" | "htm" => HTML_CONTENT_TYPE,
        "css" => "text/css; charset=utf-8",
        "js" => "application/javascript; charset=utf-8",
        "svg" => "image/svg+xml",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "eot" => "application/vnd.ms-fontobject",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Whether an upstream `Content-Type` header denotes something the mirror keeps.
///
/// Accepts stylesheets, scripts, images and fonts by media type, and falls back
/// to the extension allow-list for servers that mislabel static files. An HTML
/// response is never accepted, whatever the extension.
#[must_use]
pub fn is_acceptable_content_type(header: Option<&str>, ext: Option<&str>) -> bool {
    let media = header
        .and_then(|h| h.split(';').next())
        .map(|m| m.trim().to_ascii_lowercase())
        .unwrap_or_default();

    let by_media = media == "text/css"
        || media.contains("javascript")
        || media.contains("ecmascript")
        || media.starts_with("image/")
        || media.starts_with("font/")
        || media.starts_with("application/font")
        || media.starts_with("application/x-font")
        || media == "application/vnd.ms-fontobject";

    if media == "text/html" || media == "application/xhtml+xml" {
        return false;
    }

    by_media || ext.is_some_and(is_asset_extension)
}
