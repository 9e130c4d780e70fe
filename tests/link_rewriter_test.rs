use sitecapture::link_rewriter::{
    LinkRewriter, Replacement, RewriteMode, SkipPolicy, rewrite,
};

#[test]
fn test_reference_free_text_is_identity() {
    let html = "<html><body><p>Plain text with src and href words, url and @import.</p></body></html>";
    let out = rewrite(html, RewriteMode::Html, |_| Some(Replacement::whole("X")));
    assert_eq!(out, html);

    let css = "body { color: red; margin: 0 auto; }";
    let out = rewrite(css, RewriteMode::Css, |_| Some(Replacement::whole("X")));
    assert_eq!(out, css);
}

#[test]
fn test_skippable_references_never_reach_resolver() {
    let html = concat!(
        r##"<a href="#top"></a>"##,
        r#"<img src="data:image/png;base64,AAAA">"#,
        r#"<a href="mailto:a@b.c"></a>"#,
        r#"<a href="tel:+123"></a>"#,
        r#"<a href="javascript:void(0)"></a>"#,
        r#"<img src="">"#,
    );

    let mut offered = Vec::new();
    let out = rewrite(html, RewriteMode::Html, |reference| {
        offered.push(reference.raw.to_string());
        Some(Replacement::whole("X"))
    });

    assert!(offered.is_empty(), "{offered:?}");
    assert_eq!(out, html);
}

#[test]
fn test_serve_policy_passes_absolute_through() {
    let html = r#"<img src="https://cdn.test/a.png"><img src="//cdn.test/b.png"><img src="c.png">"#;
    let rewriter = LinkRewriter::new(RewriteMode::Html).with_policy(SkipPolicy::PassThroughAbsolute);

    let (out, count) = rewriter.rewrite(html, |r| Some(Replacement::whole(format!("/x/{}", r.raw))));
    assert_eq!(count, 1);
    assert_eq!(
        out,
        r#"<img src="https://cdn.test/a.png"><img src="//cdn.test/b.png"><img src="/x/c.png">"#
    );
}

#[test]
fn test_ingest_policy_offers_absolute() {
    let html = r#"<script src="https://cdn.test/app.js"></script>"#;
    let found = LinkRewriter::new(RewriteMode::Html).discover(html);
    assert_eq!(found, vec!["https://cdn.test/app.js"]);
}

#[test]
fn test_stylesheet_grammar() {
    let css = r#"@import "base.css";
@import url(theme.css);
.hero { background: url( "img/hero.jpg" ) no-repeat; }
@font-face { src: url('f.woff2') format('woff2'), url(f.woff) format('woff'); }"#;

    let found = LinkRewriter::new(RewriteMode::Css).discover(css);
    assert_eq!(
        found,
        vec!["base.css", "theme.css", "img/hero.jpg", "f.woff2", "f.woff"]
    );

    let out = rewrite(css, RewriteMode::Css, |r| {
        Some(Replacement::whole(format!("assets/{}", r.raw)))
    });
    assert!(out.contains(r#"@import "assets/base.css";"#));
    assert!(out.contains("url(assets/theme.css)"));
    assert!(out.contains(r#"url( "assets/img/hero.jpg" )"#));
    assert!(out.contains("format('woff2')"));
}

#[test]
fn test_fragment_survives_keep_fragment() {
    let html = r##"<use href="icons.svg?v=2#menu"></use>"##;
    let out = rewrite(html, RewriteMode::Html, |_| {
        Some(Replacement::keep_fragment("icons-1a2b3c4d.svg"))
    });
    assert_eq!(out, r##"<use href="icons-1a2b3c4d.svg#menu"></use>"##);
}

#[test]
fn test_srcset_descriptors_preserved() {
    let html = r#"<img srcset="a.png 1x, b.png 2x" src="a.png">"#;
    let out = rewrite(html, RewriteMode::Html, |r| {
        Some(Replacement::whole(format!("/m/{}", r.raw)))
    });
    assert_eq!(out, r#"<img srcset="/m/a.png 1x, /m/b.png 2x" src="/m/a.png">"#);
}
