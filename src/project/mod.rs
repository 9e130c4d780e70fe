//! Project metadata, persistence and capture lifecycle

pub mod service;
pub mod store;
pub mod types;

pub use service::{CaptureReport, ProjectService};
pub use store::{FsProjectStore, MemoryProjectStore, ProjectStore};
pub use types::{Page, Project, ProjectDetails, ProjectKind, ProjectStatus, Variant, Viewport};
