//! Property tests for canonical storage paths

use proptest::prelude::*;
use sitecapture::canonical_path::canonicalize_str;

const ORIGIN: &str = "https://site.test";

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,10}"
}

fn asset_path() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(segment(), 0..3),
        segment(),
        prop::sample::select(vec!["css", "js", "png", "woff2"]),
    )
        .prop_map(|(dirs, stem, ext)| {
            let mut path = String::new();
            for dir in dirs {
                path.push('/');
                path.push_str(&dir);
            }
            format!("{path}/{stem}.{ext}")
        })
}

#[test]
fn test_root_maps_to_index() {
    assert_eq!(canonicalize_str("https://site.test/", ORIGIN).unwrap(), "index");
    assert_eq!(canonicalize_str("https://site.test", ORIGIN).unwrap(), "index");
    assert_eq!(
        canonicalize_str("https://site.test/docs/", ORIGIN).unwrap(),
        "docs/index"
    );
}

#[test]
fn test_query_variants_get_distinct_css_paths() {
    let a = canonicalize_str("https://site.test/a.css?x=1", ORIGIN).unwrap();
    let b = canonicalize_str("https://site.test/a.css?x=2", ORIGIN).unwrap();
    assert_ne!(a, b);
    assert!(a.ends_with(".css"), "{a}");
    assert!(b.ends_with(".css"), "{b}");
    assert!(a.starts_with("a-"), "{a}");
}

#[test]
fn test_cross_origin_is_namespaced() {
    assert_eq!(
        canonicalize_str("https://cdn.test/lib/x.js", ORIGIN).unwrap(),
        "external/cdn.test/lib/x.js"
    );
    assert_eq!(
        canonicalize_str("http://cdn.test:8080/x.js", ORIGIN).unwrap(),
        "external/cdn.test_8080/x.js"
    );
}

proptest! {
    #[test]
    fn prop_canonicalize_is_deterministic(path in asset_path(), query in "[a-z0-9=&]{0,12}") {
        let url = if query.is_empty() {
            format!("{ORIGIN}{path}")
        } else {
            format!("{ORIGIN}{path}?{query}")
        };
        let first = canonicalize_str(&url, ORIGIN).unwrap();
        let second = canonicalize_str(&url, ORIGIN).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_distinct_queries_never_collide(path in asset_path(), a in 0u32..10_000, b in 0u32..10_000) {
        prop_assume!(a != b);
        let first = canonicalize_str(&format!("{ORIGIN}{path}?v={a}"), ORIGIN).unwrap();
        let second = canonicalize_str(&format!("{ORIGIN}{path}?v={b}"), ORIGIN).unwrap();
        prop_assert_ne!(&first, &second);

        let ext = path.rsplit('.').next().unwrap();
        let suffix = format!(".{ext}");
        prop_assert!(first.ends_with(&suffix));
    }

    #[test]
    fn prop_distinct_paths_never_collide(a in asset_path(), b in asset_path()) {
        prop_assume!(a != b);
        let first = canonicalize_str(&format!("{ORIGIN}{a}"), ORIGIN).unwrap();
        let second = canonicalize_str(&format!("{ORIGIN}{b}"), ORIGIN).unwrap();
        prop_assert_ne!(first, second);
    }

    #[test]
    fn prop_paths_are_relative(path in asset_path(), host in "[a-z]{1,8}\\.test") {
        let same = canonicalize_str(&format!("{ORIGIN}{path}"), ORIGIN).unwrap();
        let cross = canonicalize_str(&format!("https://{host}{path}"), ORIGIN).unwrap();
        prop_assert!(!same.starts_with('/'));
        prop_assert!(!cross.starts_with('/'));
        prop_assert!(cross.starts_with("external/") || host == "site.test");
    }
}
