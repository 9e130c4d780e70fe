//! Per-run crawl state
//!
//! One `CrawlContext` is owned by a single `mirror()` call and dropped with it.
//! Nothing here is shared between runs.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::{Duration, Instant};

use url::Url;

use crate::errors::{CaptureWarning, SkipReason};

/// A resource waiting to be fetched
#[derive(Debug, Clone)]
pub struct QueuedAsset {
    pub url: Url,
    /// Discovered inside a stylesheet; such resources are stored but never scanned
    pub from_stylesheet: bool,
}

/// Crawl key for a URL: the URL with any fragment removed
#[must_use]
pub fn crawl_key(url: &Url) -> Url {
    let mut key = url.clone();
    key.set_fragment(None);
    key
}

#[derive(Debug)]
pub struct CrawlContext {
    started: Instant,
    queue: VecDeque<QueuedAsset>,
    visited: HashSet<String>,
    accepted: usize,
    /// Absolute URL (fragment-free) to canonical path
    asset_map: HashMap<String, String>,
    /// Canonical paths already claimed, for collision detection
    claimed_paths: HashSet<String>,
    warnings: Vec<CaptureWarning>,
}

impl CrawlContext {
    #[must_use]
    pub fn new(started: Instant) -> Self {
        Self {
            started,
            queue: VecDeque::new(),
            visited: HashSet::new(),
            accepted: 0,
            asset_map: HashMap::new(),
            claimed_paths: HashSet::new(),
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    #[must_use]
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn enqueue(&mut self, url: &Url, from_stylesheet: bool) {
        self.queue.push_back(QueuedAsset {
            url: crawl_key(url),
            from_stylesheet,
        });
    }

    pub fn pop(&mut self) -> Option<QueuedAsset> {
        self.queue.pop_front()
    }

    /// Record a visit. Returns `false` when the URL was already visited.
    pub fn mark_visited(&mut self, url: &Url) -> bool {
        self.visited.insert(url.as_str().to_string())
    }

    /// Claim a canonical path for `url`. Returns `false` if another URL already owns it.
    pub fn claim_path(&mut self, path: &str) -> bool {
        self.claimed_paths.insert(path.to_string())
    }

    pub fn accept(&mut self, url: &Url, path: String) {
        self.accepted += 1;
        self.asset_map.insert(url.as_str().to_string(), path);
    }

    /// Drop a mapping whose object never made it to storage
    pub fn forget(&mut self, url: &Url) {
        self.asset_map.remove(url.as_str());
    }

    /// Canonical path for a resolved URL, ignoring its fragment
    #[must_use]
    pub fn lookup(&self, url: &Url) -> Option<&str> {
        self.asset_map
            .get(crawl_key(url).as_str())
            .map(String::as_str)
    }

    pub fn warn(&mut self, item: impl Into<String>, reason: SkipReason) {
        let warning = CaptureWarning::new(item, reason);
        log::debug!("Mirror skipped {warning}");
        self.warnings.push(warning);
    }

    /// Report every unvisited queued URL as skipped for `reason` and empty the queue
    pub fn abandon_queue(&mut self, reason: SkipReason) {
        let remaining: Vec<QueuedAsset> = self.queue.drain(..).collect();
        for queued in remaining {
            if self.mark_visited(&queued.url) {
                self.warn(queued.url.as_str(), reason.clone());
            }
        }
    }

    pub fn into_warnings(self) -> Vec<CaptureWarning> {
        self.warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fragments_share_a_crawl_key() {
        let mut ctx = CrawlContext::new(Instant::now());
        let a = Url::parse("https://x.test/icons.svg#home").unwrap();
        let b = Url::parse("https://x.test/icons.svg#menu").unwrap();
        ctx.enqueue(&a, false);
        ctx.enqueue(&b, false);

        let first = ctx.pop().unwrap();
        let second = ctx.pop().unwrap();
        assert!(ctx.mark_visited(&first.url));
        assert!(!ctx.mark_visited(&second.url));

        ctx.accept(&first.url, "icons.svg".to_string());
        assert_eq!(ctx.lookup(&b), Some("icons.svg"));
    }

    #[test]
    fn test_abandon_queue_warns_once_per_url() {
        let mut ctx = CrawlContext::new(Instant::now());
        let a = Url::parse("https://x.test/a.png").unwrap();
        ctx.enqueue(&a, false);
        ctx.enqueue(&a, false);
        ctx.abandon_queue(SkipReason::CountBudget);

        let warnings = ctx.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].reason, SkipReason::CountBudget);
    }
}
