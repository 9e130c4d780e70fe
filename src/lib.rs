pub mod archive_ingest;
pub mod canonical_path;
pub mod config;
pub mod content_store;
pub mod errors;
pub mod image_mockups;
pub mod link_rewriter;
pub mod project;
pub mod serve_resolver;
pub mod server;
pub mod site_mirror;
pub mod utils;

pub use archive_ingest::{ArchiveIngester, IngestOutcome};
pub use canonical_path::canonicalize;
pub use config::{IngestConfig, MirrorConfig, MirrorConfigBuilder, ServerConfig};
pub use content_store::{ContentStore, FsContentStore, MemoryContentStore, StoredObject};
pub use errors::{CaptureError, CaptureResult, CaptureWarning, SkipReason, StoreError};
pub use image_mockups::{MockupOutcome, MockupUpload, ingest_images};
pub use link_rewriter::{LinkRewriter, Reference, Replacement, RewriteMode, SkipPolicy};
pub use project::{
    CaptureReport, FsProjectStore, MemoryProjectStore, Page, Project, ProjectDetails, ProjectKind,
    ProjectService, ProjectStatus, ProjectStore, Variant, Viewport,
};
pub use serve_resolver::{AssetLookup, resolve_for_serving, rewrite_for_serving};
pub use site_mirror::{MirrorOutcome, SiteMirror};
