//! Canonical storage paths for mirrored resources.
//!
//! Maps a resolved absolute URL to a relative path inside a project namespace.
//! Same-origin resources keep their URL path; everything else lands under
//! `external/{host}/`. Query strings and fragments are folded into a short
//! SHA-1 suffix so that `a.css?v=1` and `a.css?v=2` never share a path.

use sha1::{Digest, Sha1};
use url::Url;

/// Prefix for resources fetched from a different origin than the site
pub const EXTERNAL_PREFIX: &str = "external";

/// Leaf used for directory-style URLs
const INDEX_LEAF: &str = "index";

/// Number of hex characters of the URL digest kept in disambiguated paths
const DIGEST_LEN: usize = 8;

/// Map an absolute resource URL to its canonical relative storage path.
///
/// Deterministic and free of I/O: the same `(absolute_url, site_origin)` pair
/// always yields the same path.
#[must_use]
pub fn canonicalize(absolute_url: &Url, site_origin: &Url) -> String {
    let path = absolute_url.path().trim_start_matches('/');

    let mut relative = if path.is_empty() {
        INDEX_LEAF.to_string()
    } else if path.ends_with('/') {
        format!("{path}{INDEX_LEAF}")
    } else {
        path.to_string()
    };

    if absolute_url.origin() != site_origin.origin() {
        relative = format!("{EXTERNAL_PREFIX}/{}/{relative}", host_segment(absolute_url));
    }

    let has_query = absolute_url.query().is_some_and(|q| !q.is_empty());
    let has_fragment = absolute_url.fragment().is_some_and(|f| !f.is_empty());
    if has_query || has_fragment {
        relative = insert_digest(&relative, &url_digest(absolute_url.as_str()));
    }

    relative
}

/// Convenience wrapper over [`canonicalize`] for string inputs.
///
/// # Errors
///
/// Returns the parse error if either argument is not an absolute URL.
pub fn canonicalize_str(absolute_url: &str, site_origin: &str) -> Result<String, url::ParseError> {
    let absolute = Url::parse(absolute_url)?;
    let origin = Url::parse(site_origin)?;
    Ok(canonicalize(&absolute, &origin))
}

/// Host directory name, `host_port` when the URL carries a non-default port
fn host_segment(url: &Url) -> String {
    let host = url.host_str().unwrap_or("unknown-host");
    match url.port() {
        Some(port) => format!("{host}_{port}"),
        None => host.to_string(),
    }
}

fn url_digest(url: &str) -> String {
    let digest = Sha1::digest(url.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(DIGEST_LEN);
    hex
}

/// Insert `-{digest}` before the extension of the last segment
fn insert_digest(path: &str, digest: &str) -> String {
    let leaf_start = path.rfind('/').map_or(0, |idx| idx + 1);
    let leaf = &path[leaf_start..];

    match leaf.rfind('.') {
        Some(dot) if dot > 0 => {
            let split = leaf_start + dot;
            format!("{}-{digest}{}", &path[..split], &path[split..])
        }
        _ => format!("{path}-{digest}"),
    }
}
