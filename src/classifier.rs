//! Material classification strategies.
//!
//! Every strategy implements [`Classifier`] and is total: evidence it cannot
//! interpret resolves to [`MaterialLabel::Unknown`] instead of an error.
//!
//! | Strategy | Evidence |
//! |---|---|
//! | [`LexicalClassifier`] | filename text |
//! | [`ColorThresholdClassifier`] | [`ColorProfile`] |
//! | [`ShapeAssistedClassifier`] | [`RegionSet`] |
//! | [`ExternalLabelClassifier`] | labels from an outside detector |

use crate::color_profiler::ColorProfile;
use crate::shape_analyzer::RegionSet;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialLabel {
    Plastic,
    Paper,
    Metal,
    Glass,
    Organic,
    Unknown,
}

impl MaterialLabel {
    /// Keyword match order. The first hit wins, so "plastic" shadows "paper".
    pub const PRIORITY: [MaterialLabel; 5] = [
        MaterialLabel::Plastic,
        MaterialLabel::Paper,
        MaterialLabel::Metal,
        MaterialLabel::Glass,
        MaterialLabel::Organic,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            MaterialLabel::Plastic => "plastic",
            MaterialLabel::Paper => "paper",
            MaterialLabel::Metal => "metal",
            MaterialLabel::Glass => "glass",
            MaterialLabel::Organic => "organic",
            MaterialLabel::Unknown => "unknown",
        }
    }

    /// First label in [`Self::PRIORITY`] whose keyword satisfies `matches`.
    fn first_match(mut matches: impl FnMut(&str) -> bool) -> MaterialLabel {
        MaterialLabel::PRIORITY
            .into_iter()
            .find(|label| matches(label.keyword()))
            .unwrap_or(MaterialLabel::Unknown)
    }
}

impl fmt::Display for MaterialLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Evidence<'a> {
    Filename(&'a str),
    Color(&'a ColorProfile),
    Regions(&'a RegionSet),
    Labels(&'a [String]),
}

pub trait Classifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn classify(&self, evidence: &Evidence<'_>) -> MaterialLabel;

    /// Labels this strategy can produce besides Unknown; the catalog must
    /// cover all of them.
    fn emittable_labels(&self) -> Vec<MaterialLabel>;
}

/// Substring match of label keywords against a lower-cased filename.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalClassifier;

impl Classifier for LexicalClassifier {
    fn name(&self) -> &'static str {
        "lexical"
    }

    fn classify(&self, evidence: &Evidence<'_>) -> MaterialLabel {
        let Evidence::Filename(filename) = evidence else {
            return MaterialLabel::Unknown;
        };
        let lower = filename.to_lowercase();
        MaterialLabel::first_match(|keyword| lower.contains(keyword))
    }

    fn emittable_labels(&self) -> Vec<MaterialLabel> {
        MaterialLabel::PRIORITY.to_vec()
    }
}

/// Label for colour profiles that fall through every branch.
pub const COLOR_DEFAULT_LABEL: MaterialLabel = MaterialLabel::Plastic;

/// Decision boundaries for [`ColorThresholdClassifier`], in 8-bit HSV units
/// (hue 0..=179).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorThresholds {
    /// Hue below this is red-ish.
    pub red_hue_low: f64,
    /// Hue above this is red-ish.
    pub red_hue_high: f64,
    pub paper_hue_min: f64,
    pub paper_hue_max: f64,
    pub paper_value_min: f64,
    pub shiny_saturation_min: f64,
    pub shiny_value_min: f64,
    /// Shiny and hue above this is metal, otherwise glass.
    pub metal_hue_min: f64,
    pub organic_value_max: f64,
    pub default_label: MaterialLabel,
}

impl Default for ColorThresholds {
    fn default() -> Self {
        Self {
            red_hue_low: 10.0,
            red_hue_high: 170.0,
            paper_hue_min: 40.0,
            paper_hue_max: 90.0,
            paper_value_min: 100.0,
            shiny_saturation_min: 100.0,
            shiny_value_min: 120.0,
            metal_hue_min: 90.0,
            organic_value_max: 60.0,
            default_label: COLOR_DEFAULT_LABEL,
        }
    }
}

impl ColorThresholds {
    pub const NATIVE_HUE_MAX: f64 = 180.0;

    /// Rescale the hue boundaries for a profile whose hue spans
    /// `0..hue_max` (e.g. 360 for degrees).
    pub fn scaled_for_hue_range(hue_max: f64) -> Self {
        let k = hue_max / Self::NATIVE_HUE_MAX;
        let base = Self::default();
        Self {
            red_hue_low: base.red_hue_low * k,
            red_hue_high: base.red_hue_high * k,
            paper_hue_min: base.paper_hue_min * k,
            paper_hue_max: base.paper_hue_max * k,
            metal_hue_min: base.metal_hue_min * k,
            ..base
        }
    }
}

/// Fixed decision tree over mean hue/saturation/value; first satisfied
/// branch wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorThresholdClassifier {
    pub thresholds: ColorThresholds,
}

impl ColorThresholdClassifier {
    pub fn new(thresholds: ColorThresholds) -> Self {
        Self { thresholds }
    }

    pub fn classify_profile(&self, profile: &ColorProfile) -> MaterialLabel {
        let t = &self.thresholds;
        let (h, s, v) = (profile.mean_hue, profile.mean_saturation, profile.mean_value);

        if h.is_nan() || s.is_nan() || v.is_nan() {
            return MaterialLabel::Unknown;
        }

        if h < t.red_hue_low || h > t.red_hue_high {
            MaterialLabel::Plastic
        } else if (t.paper_hue_min..=t.paper_hue_max).contains(&h) && v > t.paper_value_min {
            MaterialLabel::Paper
        } else if s > t.shiny_saturation_min && v > t.shiny_value_min {
            if h > t.metal_hue_min {
                MaterialLabel::Metal
            } else {
                MaterialLabel::Glass
            }
        } else if v < t.organic_value_max {
            MaterialLabel::Organic
        } else {
            t.default_label
        }
    }
}

impl Classifier for ColorThresholdClassifier {
    fn name(&self) -> &'static str {
        "color"
    }

    fn classify(&self, evidence: &Evidence<'_>) -> MaterialLabel {
        match evidence {
            Evidence::Color(profile) => self.classify_profile(profile),
            _ => MaterialLabel::Unknown,
        }
    }

    fn emittable_labels(&self) -> Vec<MaterialLabel> {
        // Every branch of the tree is reachable, so the default adds nothing
        MaterialLabel::PRIORITY.to_vec()
    }
}

/// Label assigned when foreground objects were found but nothing else is
/// known about them.
pub const SHAPE_DEFAULT_LABEL: MaterialLabel = MaterialLabel::Plastic;

/// Extension point for shape-based discrimination.
///
/// Region geometry does not yet separate materials: any non-empty region
/// set maps to `default_label`, and an empty one (nothing in the foreground)
/// is Unknown. The regions themselves are mainly useful for annotation.
#[derive(Debug, Clone, Copy)]
pub struct ShapeAssistedClassifier {
    pub default_label: MaterialLabel,
}

impl Default for ShapeAssistedClassifier {
    fn default() -> Self {
        Self {
            default_label: SHAPE_DEFAULT_LABEL,
        }
    }
}

impl Classifier for ShapeAssistedClassifier {
    fn name(&self) -> &'static str {
        "shape"
    }

    fn classify(&self, evidence: &Evidence<'_>) -> MaterialLabel {
        match evidence {
            Evidence::Regions(regions) if !regions.is_empty() => self.default_label,
            _ => MaterialLabel::Unknown,
        }
    }

    fn emittable_labels(&self) -> Vec<MaterialLabel> {
        if self.default_label == MaterialLabel::Unknown {
            Vec::new()
        } else {
            vec![self.default_label]
        }
    }
}

/// Keyword match against labels produced by an outside detection service.
/// Never calls that service itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalLabelClassifier;

impl Classifier for ExternalLabelClassifier {
    fn name(&self) -> &'static str {
        "external"
    }

    fn classify(&self, evidence: &Evidence<'_>) -> MaterialLabel {
        let Evidence::Labels(labels) = evidence else {
            return MaterialLabel::Unknown;
        };
        let lowered: Vec<String> = labels.iter().map(|l| l.to_ascii_lowercase()).collect();
        MaterialLabel::first_match(|keyword| lowered.iter().any(|l| l.contains(keyword)))
    }

    fn emittable_labels(&self) -> Vec<MaterialLabel> {
        MaterialLabel::PRIORITY.to_vec()
    }
}

/// Which strategy a scan uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Lexical,
    #[default]
    Color,
    Shape,
    External,
}

impl StrategyKind {
    pub fn build(
        self,
        thresholds: ColorThresholds,
        shape_default: MaterialLabel,
    ) -> Box<dyn Classifier> {
        match self {
            StrategyKind::Lexical => Box::new(LexicalClassifier),
            StrategyKind::Color => Box::new(ColorThresholdClassifier::new(thresholds)),
            StrategyKind::Shape => Box::new(ShapeAssistedClassifier {
                default_label: shape_default,
            }),
            StrategyKind::External => Box::new(ExternalLabelClassifier),
        }
    }
}
