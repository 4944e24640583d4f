//! Static mapping from material to upcycling recommendations.
//!
//! Built once at startup and only read afterwards, so a catalog can be
//! shared between threads by reference without locking.

use crate::classifier::MaterialLabel;
use crate::error::{Result, ScanError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

const BUILTIN_CATALOG: &str = include_str!("../assets/catalog.json");

pub const FALLBACK_MESSAGE: &str = "Sorry, we couldn't identify the trash type. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationEntry {
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_link: Option<String>,
}

impl RecommendationEntry {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            reference_link: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.reference_link = Some(link.into());
        self
    }

    /// Shown when the material could not be identified.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_MESSAGE)
    }

    pub fn is_fallback(&self) -> bool {
        self.body == FALLBACK_MESSAGE && self.reference_link.is_none()
    }
}

impl fmt::Display for RecommendationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.reference_link {
            Some(link) => write!(f, "{} {}", self.body, link),
            None => f.write_str(&self.body),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationCatalog {
    entries: BTreeMap<MaterialLabel, Vec<RecommendationEntry>>,
}

impl RecommendationCatalog {
    /// Fails unless every label in [`MaterialLabel::PRIORITY`] has at least
    /// one entry. Entries listed under Unknown are ignored.
    pub fn new(mut entries: BTreeMap<MaterialLabel, Vec<RecommendationEntry>>) -> Result<Self> {
        if entries.remove(&MaterialLabel::Unknown).is_some() {
            warn!("catalog entries for 'unknown' are ignored; the fallback message is fixed");
        }
        let catalog = Self { entries };
        catalog.ensure_covers(&MaterialLabel::PRIORITY)?;
        debug!(
            labels = catalog.entries.len(),
            entries = catalog.entries.values().map(Vec::len).sum::<usize>(),
            "recommendation catalog loaded"
        );
        Ok(catalog)
    }

    /// The catalog compiled into the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json_str(BUILTIN_CATALOG)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let entries: BTreeMap<MaterialLabel, Vec<RecommendationEntry>> = serde_json::from_str(json)
            .map_err(|e| ScanError::configuration(format!("invalid catalog: {}", e)))?;
        Self::new(entries)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks that each label has at least one entry.
    pub fn ensure_covers(&self, labels: &[MaterialLabel]) -> Result<()> {
        let missing: Vec<String> = labels
            .iter()
            .filter(|&&label| label != MaterialLabel::Unknown && self.entries(label).is_empty())
            .map(|label| label.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScanError::configuration(format!(
                "no recommendations for: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn entries(&self, label: MaterialLabel) -> &[RecommendationEntry] {
        self.entries.get(&label).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_map() -> BTreeMap<MaterialLabel, Vec<RecommendationEntry>> {
        MaterialLabel::PRIORITY
            .into_iter()
            .map(|label| (label, vec![RecommendationEntry::new(format!("reuse the {}", label))]))
            .collect()
    }

    #[test]
    fn test_builtin_catalog_covers_every_label() {
        let catalog = RecommendationCatalog::builtin().unwrap();
        for label in MaterialLabel::PRIORITY {
            assert!(!catalog.entries(label).is_empty(), "{} has no entries", label);
        }
        assert!(catalog.entries(MaterialLabel::Unknown).is_empty());
    }

    #[test]
    fn test_builtin_catalog_keeps_paper_link() {
        let catalog = RecommendationCatalog::builtin().unwrap();
        let first = &catalog.entries(MaterialLabel::Paper)[0];
        assert_eq!(
            first.reference_link.as_deref(),
            Some("https://youtu.be/pOq1ZI0dqg4?si=DtKAOkCG7mevN4Ph")
        );
        assert!(first.to_string().ends_with(first.reference_link.as_deref().unwrap()));
    }

    #[test]
    fn test_missing_label_is_configuration_error() {
        let mut map = full_map();
        map.remove(&MaterialLabel::Glass);
        let err = RecommendationCatalog::new(map).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("glass"));
    }

    #[test]
    fn test_empty_group_is_configuration_error() {
        let mut map = full_map();
        map.insert(MaterialLabel::Metal, Vec::new());
        assert!(RecommendationCatalog::new(map).unwrap_err().is_configuration());
    }

    #[test]
    fn test_unknown_entries_are_dropped() {
        let mut map = full_map();
        map.insert(MaterialLabel::Unknown, vec![RecommendationEntry::new("custom")]);
        let catalog = RecommendationCatalog::new(map).unwrap();
        assert!(catalog.entries(MaterialLabel::Unknown).is_empty());
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "plastic": [{"body": "p"}],
            "paper": [{"body": "a", "reference_link": "https://example.com"}],
            "metal": [{"body": "m"}, {"body": "m2"}],
            "glass": [{"body": "g"}],
            "organic": [{"body": "o"}]
        }"#;
        let catalog = RecommendationCatalog::from_json_str(json).unwrap();
        assert_eq!(catalog.entries(MaterialLabel::Metal).len(), 2);
        assert_eq!(
            catalog.entries(MaterialLabel::Paper)[0],
            RecommendationEntry::new("a").with_link("https://example.com")
        );
    }

    #[test]
    fn test_malformed_json_is_configuration_error() {
        let err = RecommendationCatalog::from_json_str("{\"plastic\": 3}").unwrap_err();
        assert!(err.is_configuration());
        let err = RecommendationCatalog::from_json_str("{\"styrofoam\": []}").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_ensure_covers_subset() {
        let mut map = full_map();
        map.remove(&MaterialLabel::Organic);
        let catalog = RecommendationCatalog {
            entries: map,
        };
        assert!(catalog.ensure_covers(&[MaterialLabel::Plastic]).is_ok());
        assert!(catalog.ensure_covers(&[MaterialLabel::Unknown]).is_ok());
        assert!(catalog.ensure_covers(&[MaterialLabel::Organic]).is_err());
    }

    #[test]
    fn test_fallback_entry() {
        let entry = RecommendationEntry::fallback();
        assert!(entry.is_fallback());
        assert_eq!(entry.to_string(), FALLBACK_MESSAGE);
    }
}
