//! Live site mirroring
//!
//! A run moves through five stages:
//!
//! 1. Fetch the seed page, following redirects. The final URL is the effective origin.
//! 2. Discover the page's references and queue them in document order.
//! 3. Drain the queue under the count and time budgets. Stylesheets found from
//!    the page are scanned once more; stylesheets found from stylesheets are not.
//! 4. Rewrite the page and every stylesheet so references point at canonical paths.
//! 5. Store the page at `index.html` and return the inventory.
//!
//! Only a failed seed fetch fails the run. Everything else degrades to a warning.

pub mod context;
pub mod fetch;

use std::time::Instant;

use url::Url;

use crate::archive_ingest::page_title;
use crate::canonical_path::canonicalize;
use crate::config::MirrorConfig;
use crate::content_store::{ContentStore, asset_key};
use crate::errors::{CaptureError, CaptureResult, CaptureWarning, SkipReason};
use crate::link_rewriter::{LinkRewriter, Reference, Replacement, RewriteMode};
use crate::project::Page;
use crate::utils::mime::{
    HTML_CONTENT_TYPE, content_type_for, is_acceptable_content_type, is_asset_extension,
    is_text_extension,
};
use crate::utils::{extension_of, is_fetchable_url, relative_to, resolve_url};

pub use context::{CrawlContext, QueuedAsset, crawl_key};
pub use fetch::{FetchFailure, Fetched, Fetcher};

/// Storage path of the mirrored page within the project
pub const PAGE_PATH: &str = "index.html";

/// Result of one mirror run
#[derive(Debug)]
pub struct MirrorOutcome {
    pub page: Page,
    /// Stored keys in store order, the page last
    pub asset_keys: Vec<String>,
    pub warnings: Vec<CaptureWarning>,
    /// Seed URL after redirects
    pub final_url: Url,
}

/// A fetched stylesheet held back until the asset map is complete
struct PendingStylesheet {
    url: Url,
    /// URL the body was actually served from; nested references resolve against it
    base: Url,
    path: String,
    text: String,
}

/// Mirrors one page and its dependent resources into a content store
pub struct SiteMirror<'a, S: ContentStore> {
    store: &'a S,
    config: MirrorConfig,
    fetcher: Fetcher,
}

impl<'a, S: ContentStore> SiteMirror<'a, S> {
    pub fn new(store: &'a S, config: MirrorConfig) -> anyhow::Result<Self> {
        let fetcher = Fetcher::new(&config)?;
        Ok(Self::with_fetcher(store, config, fetcher))
    }

    /// Reuse an existing client across runs
    pub fn with_fetcher(store: &'a S, config: MirrorConfig, fetcher: Fetcher) -> Self {
        Self {
            store,
            config,
            fetcher,
        }
    }

    /// Mirror `seed` into `project_id`'s namespace.
    ///
    /// # Errors
    ///
    /// - `InvalidUrl` when the seed does not parse or is not http(s)
    /// - `SeedTimeout`, `Upstream` or `Network` when the seed cannot be fetched
    /// - `MalformedInput` when the seed page exceeds the per-resource byte limit
    /// - `Storage` when the page itself cannot be written
    pub async fn mirror(&self, project_id: &str, seed: &str) -> CaptureResult<MirrorOutcome> {
        let seed_url = parse_seed(seed)?;
        let mut ctx = CrawlContext::new(Instant::now());

        log::info!("Mirroring {seed_url} into {project_id}");

        let fetched = self.fetch_seed(&seed_url).await?;
        let origin = fetched.final_url;
        let html = String::from_utf8_lossy(&fetched.bytes).into_owned();
        ctx.mark_visited(&crawl_key(&seed_url));
        ctx.mark_visited(&crawl_key(&origin));

        if origin != seed_url {
            log::debug!("Seed {seed_url} redirected to {origin}");
        }

        let page_rewriter = LinkRewriter::new(RewriteMode::Html);
        for raw in page_rewriter.discover(&html) {
            match resolve_url(&origin, &raw) {
                Ok(url) => ctx.enqueue(&url, false),
                Err(e) => log::debug!("Unresolvable reference '{raw}' on {origin}: {e}"),
            }
        }

        let mut asset_keys = Vec::new();
        let stylesheets = self
            .drain_queue(project_id, &origin, &mut ctx, &mut asset_keys)
            .await;

        self.store_stylesheets(project_id, stylesheets, &mut ctx, &mut asset_keys)
            .await;

        let (rewritten, substitutions) = page_rewriter.rewrite(&html, |reference| {
            map_reference(&ctx, &origin, reference, PAGE_PATH)
        });

        let page_key = asset_key(project_id, PAGE_PATH);
        self.store
            .write(&page_key, rewritten.into_bytes(), HTML_CONTENT_TYPE)
            .await?;
        asset_keys.push(page_key);

        let name = page_title(&html)
            .or_else(|| origin.host_str().map(str::to_string))
            .unwrap_or_else(|| PAGE_PATH.to_string());
        let warnings = ctx.into_warnings();

        log::info!(
            "Mirror of {origin} finished: {} objects stored, {substitutions} references rewritten, {} warnings",
            asset_keys.len(),
            warnings.len()
        );

        Ok(MirrorOutcome {
            page: Page::markup(name, PAGE_PATH),
            asset_keys,
            warnings,
            final_url: origin,
        })
    }

    async fn fetch_seed(&self, seed_url: &Url) -> CaptureResult<Fetched> {
        self.fetcher
            .fetch_page(seed_url, self.config.seed_timeout())
            .await
            .map_err(|failure| match failure {
                FetchFailure::Timeout => CaptureError::SeedTimeout {
                    url: seed_url.to_string(),
                    timeout_ms: self.config.seed_timeout_ms(),
                },
                FetchFailure::Status(status) => CaptureError::Upstream {
                    url: seed_url.to_string(),
                    status,
                },
                FetchFailure::TooLarge(bytes) => CaptureError::MalformedInput(format!(
                    "Seed page {seed_url} is too large ({bytes} bytes)"
                )),
                FetchFailure::Network(message) => CaptureError::Network {
                    url: seed_url.to_string(),
                    message,
                },
            })
    }

    /// Fetch queued resources in FIFO order until the queue or a budget runs out.
    ///
    /// Non-stylesheet assets are written as soon as they arrive. Stylesheets are
    /// returned so they can be rewritten once every canonical path is known.
    async fn drain_queue(
        &self,
        project_id: &str,
        origin: &Url,
        ctx: &mut CrawlContext,
        asset_keys: &mut Vec<String>,
    ) -> Vec<PendingStylesheet> {
        let css_rewriter = LinkRewriter::new(RewriteMode::Css);
        let mut stylesheets = Vec::new();

        while let Some(queued) = ctx.pop() {
            let url = queued.url;
            if !ctx.mark_visited(&url) {
                continue;
            }

            if ctx.accepted() >= self.config.max_asset_count() {
                log::info!("Asset count budget of {} reached", self.config.max_asset_count());
                ctx.warn(url.as_str(), SkipReason::CountBudget);
                ctx.abandon_queue(SkipReason::CountBudget);
                break;
            }
            if ctx.elapsed() > self.config.total_budget() {
                log::info!("Time budget of {} ms exhausted", self.config.total_budget_ms());
                ctx.warn(url.as_str(), SkipReason::TimeBudget);
                ctx.abandon_queue(SkipReason::TimeBudget);
                break;
            }
            if !is_fetchable_url(&url) {
                ctx.warn(url.as_str(), SkipReason::UnsupportedScheme);
                continue;
            }
            let Some(ext) = extension_of(url.path()).filter(|ext| is_asset_extension(ext)) else {
                ctx.warn(url.as_str(), SkipReason::UnsupportedExtension);
                continue;
            };

            let fetched = match self
                .fetcher
                .fetch_asset(&url, self.config.asset_timeout())
                .await
            {
                Ok(fetched) => fetched,
                Err(failure) => {
                    ctx.warn(url.as_str(), failure.into());
                    continue;
                }
            };

            if !is_acceptable_content_type(fetched.content_type.as_deref(), Some(ext.as_str())) {
                let content_type = fetched.content_type.unwrap_or_default();
                ctx.warn(url.as_str(), SkipReason::ContentType(content_type));
                continue;
            }

            let path = canonicalize(&url, origin);
            if !ctx.claim_path(&path) {
                ctx.warn(
                    url.as_str(),
                    SkipReason::Rejected(format!("canonical path '{path}' already taken")),
                );
                continue;
            }

            if ext == "css" {
                let text = String::from_utf8_lossy(&fetched.bytes).into_owned();
                if !queued.from_stylesheet {
                    for raw in css_rewriter.discover(&text) {
                        match resolve_url(&fetched.final_url, &raw) {
                            Ok(nested) => ctx.enqueue(&nested, true),
                            Err(e) => log::debug!("Unresolvable reference '{raw}' in {url}: {e}"),
                        }
                    }
                }
                ctx.accept(&url, path.clone());
                stylesheets.push(PendingStylesheet {
                    url,
                    base: fetched.final_url,
                    path,
                    text,
                });
                continue;
            }

            let bytes = if is_text_extension(&ext) {
                String::from_utf8_lossy(&fetched.bytes).into_owned().into_bytes()
            } else {
                fetched.bytes
            };

            let key = asset_key(project_id, &path);
            match self.store.write(&key, bytes, content_type_for(&ext)).await {
                Ok(()) => {
                    log::trace!("Stored {url} as {key}");
                    ctx.accept(&url, path);
                    asset_keys.push(key);
                }
                Err(e) => ctx.warn(url.as_str(), SkipReason::Storage(e.to_string())),
            }
        }

        stylesheets
    }

    /// Rewrite each held stylesheet relative to its own location and write it
    async fn store_stylesheets(
        &self,
        project_id: &str,
        stylesheets: Vec<PendingStylesheet>,
        ctx: &mut CrawlContext,
        asset_keys: &mut Vec<String>,
    ) {
        let css_rewriter = LinkRewriter::new(RewriteMode::Css);
        let mut failed = Vec::new();

        for sheet in stylesheets {
            let (text, _) = css_rewriter.rewrite(&sheet.text, |reference| {
                map_reference(ctx, &sheet.base, reference, &sheet.path)
            });

            let key = asset_key(project_id, &sheet.path);
            match self
                .store
                .write(&key, text.into_bytes(), content_type_for("css"))
                .await
            {
                Ok(()) => asset_keys.push(key),
                Err(e) => {
                    ctx.warn(sheet.url.as_str(), SkipReason::Storage(e.to_string()));
                    failed.push(sheet.url);
                }
            }
        }

        for url in failed {
            ctx.forget(&url);
        }
    }
}

/// Replacement for a reference found in the file stored at `from_path`.
///
/// Resolves against `base`, looks the result up in the asset map and expresses
/// the canonical path relative to `from_path`. The fragment survives verbatim.
fn map_reference(
    ctx: &CrawlContext,
    base: &Url,
    reference: &Reference<'_>,
    from_path: &str,
) -> Option<Replacement> {
    let url = resolve_url(base, reference.raw).ok()?;
    let path = ctx.lookup(&url)?;
    Some(Replacement::keep_fragment(relative_to(from_path, path)))
}

fn parse_seed(seed: &str) -> CaptureResult<Url> {
    let url = Url::parse(seed.trim()).map_err(|e| CaptureError::invalid_url(seed, e))?;
    if !is_fetchable_url(&url) {
        return Err(CaptureError::invalid_url(seed, "only http and https are supported"));
    }
    if url.host_str().is_none() {
        return Err(CaptureError::invalid_url(seed, "missing host"));
    }
    Ok(url)
}
