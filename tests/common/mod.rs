//! Test utilities and helper functions for the sitecapture test suite

use std::io::Write;

use mockito::{Mock, ServerGuard};
use zip::write::SimpleFileOptions;

/// Creates a test HTML document with the given title and body markup
#[allow(dead_code)]
pub fn create_test_html(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body>
    {body}
</body>
</html>"#
    )
}

/// Builds an in-memory zip archive from `(path, bytes)` entries.
///
/// Paths ending in `/` become directory entries.
#[allow(dead_code)]
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (path, bytes) in entries {
        if path.ends_with('/') {
            writer.add_directory(*path, options).unwrap();
        } else {
            writer.start_file(*path, options).unwrap();
            writer.write_all(bytes).unwrap();
        }
    }

    writer.finish().unwrap().into_inner()
}

/// Creates a mock endpoint that returns HTML content
#[allow(dead_code)]
pub async fn create_html_mock(server: &mut ServerGuard, path: &str, html: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(html)
        .create_async()
        .await
}

/// Creates a mock endpoint that returns a static asset with a content type
#[allow(dead_code)]
pub async fn create_asset_mock(
    server: &mut ServerGuard,
    path: &str,
    content_type: &str,
    body: &[u8],
) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", content_type)
        .with_body(body)
        .create_async()
        .await
}

/// Creates a mock endpoint that returns a redirect
#[allow(dead_code)]
pub async fn create_redirect_mock(server: &mut ServerGuard, from: &str, to: &str) -> Mock {
    server
        .mock("GET", from)
        .with_status(301)
        .with_header("location", to)
        .create_async()
        .await
}

/// Creates a mock endpoint that returns an error
#[allow(dead_code)]
pub async fn create_error_mock(server: &mut ServerGuard, path: &str, status: usize) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_body("error")
        .create_async()
        .await
}

/// Creates a mock endpoint that sends headers at once and the body after `delay`
#[allow(dead_code)]
pub async fn create_slow_mock(
    server: &mut ServerGuard,
    path: &str,
    content_type: &str,
    body: &'static [u8],
    delay: std::time::Duration,
) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", content_type)
        .with_chunked_body(move |w| {
            std::thread::sleep(delay);
            w.write_all(body)
        })
        .create_async()
        .await
}
