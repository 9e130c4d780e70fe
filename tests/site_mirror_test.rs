//! End-to-end mirror runs against mockito servers

mod common;

use std::time::Duration;

use common::{
    create_asset_mock, create_error_mock, create_html_mock, create_redirect_mock, create_slow_mock,
    create_test_html,
};
use sitecapture::config::MirrorConfig;
use sitecapture::content_store::{ContentStore, MemoryContentStore};
use sitecapture::errors::{CaptureError, SkipReason};
use sitecapture::site_mirror::SiteMirror;

fn text(bytes: Option<Vec<u8>>) -> String {
    String::from_utf8(bytes.expect("object missing")).unwrap()
}

#[tokio::test]
async fn test_three_resource_mirror() {
    let mut server = mockito::Server::new_async().await;
    let page = create_test_html(
        "Landing",
        r#"<link rel="stylesheet" href="/styles/main.css">
    <img src="img/logo.png" alt="logo">
    <script src="app.js"></script>"#,
    );
    let _page = create_html_mock(&mut server, "/", &page).await;
    let _css = create_asset_mock(&mut server, "/styles/main.css", "text/css", b"h1{color:red}").await;
    let _png = create_asset_mock(&mut server, "/img/logo.png", "image/png", &[0x89, 0x50]).await;
    let _js = create_asset_mock(&mut server, "/app.js", "application/javascript", b"console.log(1)").await;

    let store = MemoryContentStore::new();
    let mirror = SiteMirror::new(&store, MirrorConfig::default()).unwrap();
    let outcome = mirror.mirror("p1", &format!("{}/", server.url())).await.unwrap();

    assert_eq!(outcome.page.name, "Landing");
    assert_eq!(outcome.page.path, "index.html");
    assert_eq!(
        outcome.asset_keys,
        vec!["p1/img/logo.png", "p1/app.js", "p1/styles/main.css", "p1/index.html"]
    );
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);

    let html = text(store.read("p1/index.html").await.unwrap());
    assert!(html.contains(r#"href="styles/main.css""#), "{html}");
    assert!(html.contains(r#"src="img/logo.png""#));
    assert!(html.contains(r#"src="app.js""#));

    let stored = store.read_with_metadata("p1/styles/main.css").await.unwrap().unwrap();
    assert_eq!(stored.content_type, "text/css; charset=utf-8");
    assert_eq!(stored.bytes, b"h1{color:red}");
}

#[tokio::test]
async fn test_stylesheet_recursion_is_one_hop() {
    let mut server = mockito::Server::new_async().await;
    let page = create_test_html("Deep", r#"<link rel="stylesheet" href="css/main.css">"#);
    let _page = create_html_mock(&mut server, "/", &page).await;
    let _main = create_asset_mock(
        &mut server,
        "/css/main.css",
        "text/css",
        br#"@import "deep.css"; body{background:url('../img/bg.png')}"#,
    )
    .await;
    let _deep = create_asset_mock(
        &mut server,
        "/css/deep.css",
        "text/css",
        b".x{background:url(never.png)}",
    )
    .await;
    let _bg = create_asset_mock(&mut server, "/img/bg.png", "image/png", &[1, 2, 3]).await;
    let never = server
        .mock("GET", "/css/never.png")
        .expect(0)
        .create_async()
        .await;

    let store = MemoryContentStore::new();
    let mirror = SiteMirror::new(&store, MirrorConfig::default()).unwrap();
    let outcome = mirror.mirror("p1", &server.url()).await.unwrap();

    never.assert_async().await;
    assert!(outcome.asset_keys.contains(&"p1/css/deep.css".to_string()));
    assert!(outcome.asset_keys.contains(&"p1/img/bg.png".to_string()));
    assert!(!outcome.asset_keys.contains(&"p1/css/never.png".to_string()));

    let css = text(store.read("p1/css/main.css").await.unwrap());
    assert_eq!(css, r#"@import "deep.css"; body{background:url('../img/bg.png')}"#);
}

#[tokio::test]
async fn test_cross_origin_assets_are_namespaced() {
    let mut site = mockito::Server::new_async().await;
    let mut cdn = mockito::Server::new_async().await;

    let cdn_url = url::Url::parse(&cdn.url()).unwrap();
    let host_dir = format!(
        "{}_{}",
        cdn_url.host_str().unwrap(),
        cdn_url.port().unwrap()
    );

    let page = create_test_html(
        "Cdn",
        &format!(r#"<script src="{}/lib/x.js"></script>"#, cdn.url()),
    );
    let _page = create_html_mock(&mut site, "/", &page).await;
    let _js = create_asset_mock(&mut cdn, "/lib/x.js", "text/javascript", b"x()").await;

    let store = MemoryContentStore::new();
    let mirror = SiteMirror::new(&store, MirrorConfig::default()).unwrap();
    mirror.mirror("p1", &site.url()).await.unwrap();

    let canonical = format!("external/{host_dir}/lib/x.js");
    assert!(store.read(&format!("p1/{canonical}")).await.unwrap().is_some());

    let html = text(store.read("p1/index.html").await.unwrap());
    assert!(html.contains(&format!(r#"src="{canonical}""#)), "{html}");
}

#[tokio::test]
async fn test_count_budget_stops_draining() {
    let mut server = mockito::Server::new_async().await;
    let body: String = ["a", "b", "c", "d", "e"]
        .iter()
        .map(|n| format!(r#"<img src="{n}.png">"#))
        .collect();
    let _page = create_html_mock(&mut server, "/", &create_test_html("Budget", &body)).await;

    let first = create_asset_mock(&mut server, "/a.png", "image/png", &[1]).await;
    let mut rest = Vec::new();
    for name in ["b", "c", "d", "e"] {
        rest.push(
            server
                .mock("GET", format!("/{name}.png").as_str())
                .expect(0)
                .create_async()
                .await,
        );
    }

    let config = MirrorConfig::builder().max_asset_count(1).build().unwrap();
    let store = MemoryContentStore::new();
    let mirror = SiteMirror::new(&store, config).unwrap();
    let outcome = mirror.mirror("p1", &server.url()).await.unwrap();

    first.assert_async().await;
    for mock in rest {
        mock.assert_async().await;
    }

    assert_eq!(outcome.asset_keys, vec!["p1/a.png", "p1/index.html"]);
    let budget_skips = outcome
        .warnings
        .iter()
        .filter(|w| w.reason == SkipReason::CountBudget)
        .count();
    assert_eq!(budget_skips, 4);

    let html = text(store.read("p1/index.html").await.unwrap());
    assert!(html.contains(r#"<img src="a.png">"#));
    assert!(html.contains(r#"<img src="b.png">"#));
}

#[tokio::test]
async fn test_soft_failures_become_warnings() {
    let mut server = mockito::Server::new_async().await;
    let page = create_test_html(
        "Soft",
        r#"<a href="/about">About</a>
    <img src="missing.png">
    <link rel="stylesheet" href="fake.css">
    <img src="ftp://files.test/x.png">
    <img src="ok.gif#frame">"#,
    );
    let _page = create_html_mock(&mut server, "/", &page).await;
    let _missing = create_error_mock(&mut server, "/missing.png", 404).await;
    let _fake = create_html_mock(&mut server, "/fake.css", "<html>not css</html>").await;
    let _ok = create_asset_mock(&mut server, "/ok.gif", "image/gif", b"GIF89a").await;

    let store = MemoryContentStore::new();
    let mirror = SiteMirror::new(&store, MirrorConfig::default()).unwrap();
    let outcome = mirror.mirror("p1", &server.url()).await.unwrap();

    let reason_for = |suffix: &str| {
        outcome
            .warnings
            .iter()
            .find(|w| w.item.ends_with(suffix))
            .map(|w| w.reason.clone())
    };
    assert_eq!(reason_for("/about"), Some(SkipReason::UnsupportedExtension));
    assert_eq!(reason_for("/missing.png"), Some(SkipReason::HttpStatus(404)));
    assert!(matches!(reason_for("/fake.css"), Some(SkipReason::ContentType(_))));
    assert_eq!(reason_for("x.png"), Some(SkipReason::UnsupportedScheme));

    assert_eq!(outcome.asset_keys, vec!["p1/ok.gif", "p1/index.html"]);
    let html = text(store.read("p1/index.html").await.unwrap());
    assert!(html.contains(r##"src="ok.gif#frame""##));
    assert!(html.contains(r#"href="/about""#));
}

#[tokio::test]
async fn test_redirected_seed_sets_origin() {
    let mut server = mockito::Server::new_async().await;
    let _redirect = create_redirect_mock(&mut server, "/", "/home/").await;
    let page = create_test_html("Home", r#"<img src="logo.png">"#);
    let _page = create_html_mock(&mut server, "/home/", &page).await;
    let _logo = create_asset_mock(&mut server, "/home/logo.png", "image/png", &[7]).await;

    let store = MemoryContentStore::new();
    let mirror = SiteMirror::new(&store, MirrorConfig::default()).unwrap();
    let outcome = mirror.mirror("p1", &format!("{}/", server.url())).await.unwrap();

    assert!(outcome.final_url.path().ends_with("/home/"));
    assert_eq!(outcome.asset_keys, vec!["p1/home/logo.png", "p1/index.html"]);
    let html = text(store.read("p1/index.html").await.unwrap());
    assert!(html.contains(r#"src="home/logo.png""#), "{html}");
}

#[tokio::test]
async fn test_seed_failure_is_an_error() {
    let mut server = mockito::Server::new_async().await;
    let _gone = create_error_mock(&mut server, "/gone", 503).await;

    let store = MemoryContentStore::new();
    let mirror = SiteMirror::new(&store, MirrorConfig::default()).unwrap();
    let result = mirror.mirror("p1", &format!("{}/gone", server.url())).await;

    assert!(matches!(
        result,
        Err(CaptureError::Upstream { status: 503, .. })
    ));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_cache_busting_query_is_fetched_verbatim() {
    let mut server = mockito::Server::new_async().await;
    let page = create_test_html(
        "Busted",
        r#"<link rel="stylesheet" href="site.css?v3"><script src="app.js?1700000000"></script>"#,
    );
    let _page = create_html_mock(&mut server, "/", &page).await;
    let css = create_asset_mock(&mut server, "/site.css?v3", "text/css", b"p{}").await;
    let js = create_asset_mock(&mut server, "/app.js?1700000000", "text/javascript", b"go()").await;

    let store = MemoryContentStore::new();
    let mirror = SiteMirror::new(&store, MirrorConfig::default()).unwrap();
    let outcome = mirror.mirror("p1", &server.url()).await.unwrap();

    css.assert_async().await;
    js.assert_async().await;
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    assert_eq!(outcome.asset_keys.len(), 3);

    let css_key = outcome
        .asset_keys
        .iter()
        .find(|k| k.starts_with("p1/site-") && k.ends_with(".css"))
        .expect("stylesheet stored under a hashed path");
    let css_path = css_key.trim_start_matches("p1/");
    let html = text(store.read("p1/index.html").await.unwrap());
    assert!(html.contains(&format!(r#"href="{css_path}""#)), "{html}");
}

#[tokio::test]
async fn test_slow_seed_is_a_timeout_error() {
    let mut server = mockito::Server::new_async().await;
    let _page = create_slow_mock(
        &mut server,
        "/",
        "text/html",
        b"<html><body>late</body></html>",
        Duration::from_millis(600),
    )
    .await;

    let config = MirrorConfig::builder().seed_timeout_ms(100).build().unwrap();
    let store = MemoryContentStore::new();
    let mirror = SiteMirror::new(&store, config).unwrap();
    let result = mirror.mirror("p1", &server.url()).await;

    assert!(
        matches!(result, Err(CaptureError::SeedTimeout { timeout_ms: 100, .. })),
        "{result:?}"
    );
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_slow_asset_is_skipped_with_timeout() {
    let mut server = mockito::Server::new_async().await;
    let page = create_test_html("Slow", r#"<img src="slow.png"><img src="fast.png">"#);
    let _page = create_html_mock(&mut server, "/", &page).await;
    let _slow = create_slow_mock(
        &mut server,
        "/slow.png",
        "image/png",
        &[1, 2, 3],
        Duration::from_millis(600),
    )
    .await;
    let _fast = create_asset_mock(&mut server, "/fast.png", "image/png", &[4]).await;

    let config = MirrorConfig::builder().asset_timeout_ms(150).build().unwrap();
    let store = MemoryContentStore::new();
    let mirror = SiteMirror::new(&store, config).unwrap();
    let outcome = mirror.mirror("p1", &server.url()).await.unwrap();

    assert_eq!(outcome.asset_keys, vec!["p1/fast.png", "p1/index.html"]);
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].item.ends_with("/slow.png"));
    assert_eq!(outcome.warnings[0].reason, SkipReason::Timeout);

    let html = text(store.read("p1/index.html").await.unwrap());
    assert!(html.contains(r#"<img src="slow.png">"#));
}

#[tokio::test]
async fn test_time_budget_stops_draining() {
    let mut server = mockito::Server::new_async().await;
    let page = create_test_html(
        "Budget",
        r#"<img src="a.png"><img src="b.png"><img src="c.png">"#,
    );
    let _page = create_html_mock(&mut server, "/", &page).await;
    let _a = create_slow_mock(
        &mut server,
        "/a.png",
        "image/png",
        &[1],
        Duration::from_millis(400),
    )
    .await;
    let mut rest = Vec::new();
    for name in ["b", "c"] {
        rest.push(
            server
                .mock("GET", format!("/{name}.png").as_str())
                .expect(0)
                .create_async()
                .await,
        );
    }

    let config = MirrorConfig::builder()
        .total_budget_ms(200)
        .asset_timeout_ms(2_000)
        .build()
        .unwrap();
    let store = MemoryContentStore::new();
    let mirror = SiteMirror::new(&store, config).unwrap();
    let outcome = mirror.mirror("p1", &server.url()).await.unwrap();

    for mock in rest {
        mock.assert_async().await;
    }
    assert_eq!(outcome.asset_keys, vec!["p1/a.png", "p1/index.html"]);
    let budget_skips: Vec<&str> = outcome
        .warnings
        .iter()
        .filter(|w| w.reason == SkipReason::TimeBudget)
        .map(|w| w.item.as_str())
        .collect();
    assert_eq!(budget_skips.len(), 2, "{:?}", outcome.warnings);
    assert!(budget_skips[0].ends_with("/b.png"));
    assert!(budget_skips[1].ends_with("/c.png"));
}
