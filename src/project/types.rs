//! Project metadata types
//!
//! A project is the unit of capture: one archive upload, one mirrored URL, or one
//! set of image mockups. It is persisted as JSON by a `ProjectStore`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::CaptureWarning;

/// Lifecycle state of a project
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    /// Capture in progress; not listed
    Uploading,
    /// Finalized and listed
    Ready,
}

/// How the project's content was captured
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Archive,
    Mirror,
    Images,
}

/// Viewport an image mockup was designed for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Viewport {
    Desktop,
    Tablet,
    Mobile,
}

impl Viewport {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Viewport::Desktop => "desktop",
            Viewport::Tablet => "tablet",
            Viewport::Mobile => "mobile",
        }
    }
}

impl std::str::FromStr for Viewport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Viewport::Desktop),
            "tablet" => Ok(Viewport::Tablet),
            "mobile" => Ok(Viewport::Mobile),
            other => Err(format!("unknown viewport '{other}'")),
        }
    }
}

/// One image rendition of a mockup page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variant {
    /// Project-relative path of the stored image
    pub path: String,
    /// Original upload filename
    pub filename: String,
}

/// One renderable document
///
/// Markup pages (archive/mirror) have an empty `variants` map; image pages
/// carry at least one variant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub name: String,
    /// Project-relative path
    pub path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub variants: BTreeMap<Viewport, Variant>,
}

impl Page {
    pub fn markup(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            variants: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn is_image_page(&self) -> bool {
        !self.variants.is_empty()
    }
}

/// Caller-supplied descriptive fields
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetails {
    /// Blank names are replaced by the first captured page's name
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub description: String,
}

/// Persistent project record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub client_name: String,
    pub description: String,
    pub kind: ProjectKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub pages: Vec<Page>,
    /// Every stored resource as `{projectId}/{relativePath}`, pages included
    pub asset_keys: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<CaptureWarning>,
}

impl Project {
    /// New project in the `uploading` state with a fresh v4 id
    pub fn new(details: ProjectDetails, kind: ProjectKind) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: details.name,
            client_name: details.client_name,
            description: details.description,
            kind,
            source_url: None,
            status: ProjectStatus::Uploading,
            created_at: now,
            updated_at: now,
            pages: Vec::new(),
            asset_keys: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Append keys not already present, keeping first-seen order
    pub fn merge_asset_keys<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut known: std::collections::HashSet<String> =
            self.asset_keys.iter().cloned().collect();
        for key in keys {
            if known.insert(key.clone()) {
                self.asset_keys.push(key);
            }
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_asset_keys_dedupes_in_order() {
        let mut project = Project::new(ProjectDetails::default(), ProjectKind::Archive);
        project.merge_asset_keys(vec!["p/a".to_string(), "p/b".to_string()]);
        project.merge_asset_keys(vec!["p/b".to_string(), "p/c".to_string()]);
        assert_eq!(project.asset_keys, vec!["p/a", "p/b", "p/c"]);
    }

    #[test]
    fn test_project_serializes_camel_case() {
        let project = Project::new(
            ProjectDetails {
                name: "Site".into(),
                client_name: "Acme".into(),
                description: String::new(),
            },
            ProjectKind::Mirror,
        );
        let json = serde_json::to_value(&project).unwrap();
        assert_eq!(json["clientName"], "Acme");
        assert_eq!(json["status"], "uploading");
        assert_eq!(json["kind"], "mirror");
    }

    #[test]
    fn test_viewport_parse() {
        assert_eq!("Desktop".parse::<Viewport>(), Ok(Viewport::Desktop));
        assert!("watch".parse::<Viewport>().is_err());
    }
}
