//! Picks one recommendation for a material.

use crate::catalog::{RecommendationCatalog, RecommendationEntry};
use crate::classifier::MaterialLabel;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SelectionPolicy {
    /// Always the first entry; reproducible.
    First,
    /// Uniformly random entry, so repeat visitors see some variety.
    #[default]
    #[value(name = "random")]
    #[serde(alias = "random")]
    UniformRandom,
}

#[derive(Debug, Clone, Copy)]
pub struct RecommendationSelector<'a> {
    catalog: &'a RecommendationCatalog,
}

impl<'a> RecommendationSelector<'a> {
    pub fn new(catalog: &'a RecommendationCatalog) -> Self {
        Self { catalog }
    }

    /// Select using the calling thread's RNG.
    pub fn select(&self, label: MaterialLabel, policy: SelectionPolicy) -> RecommendationEntry {
        self.select_with(label, policy, &mut rand::thread_rng())
    }

    /// Unknown labels and empty groups get the fallback message.
    pub fn select_with<R: Rng + ?Sized>(
        &self,
        label: MaterialLabel,
        policy: SelectionPolicy,
        rng: &mut R,
    ) -> RecommendationEntry {
        let entries = self.catalog.entries(label);

        let picked = match policy {
            SelectionPolicy::First => entries.first(),
            SelectionPolicy::UniformRandom => entries.choose(rng),
        };

        match picked {
            Some(entry) => {
                debug!(%label, ?policy, candidates = entries.len(), "recommendation selected");
                entry.clone()
            }
            None => RecommendationEntry::fallback(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn catalog() -> RecommendationCatalog {
        RecommendationCatalog::builtin().unwrap()
    }

    #[test]
    fn test_first_policy_is_deterministic() {
        let catalog = catalog();
        let selector = RecommendationSelector::new(&catalog);
        let expected = &catalog.entries(MaterialLabel::Plastic)[0];
        for _ in 0..20 {
            assert_eq!(&selector.select(MaterialLabel::Plastic, SelectionPolicy::First), expected);
        }
    }

    #[test]
    fn test_seeded_random_sequence_repeats() {
        let catalog = catalog();
        let selector = RecommendationSelector::new(&catalog);

        let run = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..30)
                .map(|_| selector.select_with(MaterialLabel::Paper, SelectionPolicy::UniformRandom, &mut rng))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(7), run(7));
    }

    #[test]
    fn test_random_picks_come_from_group() {
        let catalog = catalog();
        let selector = RecommendationSelector::new(&catalog);
        let mut rng = StdRng::seed_from_u64(42);
        let group = catalog.entries(MaterialLabel::Plastic);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let entry = selector.select_with(MaterialLabel::Plastic, SelectionPolicy::UniformRandom, &mut rng);
            assert!(group.contains(&entry));
            seen.insert(entry.body);
        }
        // 200 draws over a handful of entries reach all of them
        assert_eq!(seen.len(), group.len());
    }

    #[test]
    fn test_unknown_gets_fallback() {
        let catalog = catalog();
        let selector = RecommendationSelector::new(&catalog);
        for policy in [SelectionPolicy::First, SelectionPolicy::UniformRandom] {
            assert!(selector.select(MaterialLabel::Unknown, policy).is_fallback());
        }
    }

    #[test]
    fn test_policy_names() {
        let policy: SelectionPolicy = serde_json::from_str("\"uniform_random\"").unwrap();
        assert_eq!(policy, SelectionPolicy::UniformRandom);
        let policy: SelectionPolicy = serde_json::from_str("\"random\"").unwrap();
        assert_eq!(policy, SelectionPolicy::UniformRandom);
        let policy: SelectionPolicy = serde_json::from_str("\"first\"").unwrap();
        assert_eq!(policy, SelectionPolicy::First);
    }

    #[test]
    fn test_selector_shared_across_threads() {
        let catalog = catalog();
        let selector = RecommendationSelector::new(&catalog);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let entry = selector.select(MaterialLabel::Glass, SelectionPolicy::UniformRandom);
                    assert!(!entry.is_fallback());
                });
            }
        });
    }
}
