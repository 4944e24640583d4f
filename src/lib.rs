//! upcycler - tell people what to do with a photographed piece of trash
//!
//! Classifies an image of a waste item into a material category and picks an
//! upcycling recommendation for it.
//!
//! ## Pipeline
//!
//! - **Decode** PNG, JPEG or GIF bytes into a 3-channel pixel grid
//! - **Profile** mean hue/saturation/value and per-channel histograms
//! - **Analyze** foreground regions by blur, threshold and contour tracing
//! - **Classify** with one of four interchangeable strategies
//! - **Recommend** an entry from a static catalog, first or at random
//! - **Annotate** detected regions on a copy of the image (optional)
//!
//! ## Example
//!
//! ```rust,no_run
//! use upcycler::{classify_and_recommend, ScanOptions, StrategyKind};
//!
//! let bytes = std::fs::read("bottle_plastic_01.jpg")?;
//! let options = ScanOptions {
//!     strategy: StrategyKind::Lexical,
//!     ..Default::default()
//! };
//! let outcome = classify_and_recommend(&bytes, Some("bottle_plastic_01.jpg"), &options)?;
//! println!("{}: {}", outcome.label, outcome.recommendation);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod annotator;
pub mod catalog;
pub mod classifier;
pub mod color_profiler;
pub mod error;
pub mod image_source;
pub mod selector;
pub mod shape_analyzer;

pub use annotator::{annotate, AnnotationStyle};
pub use catalog::{RecommendationCatalog, RecommendationEntry, FALLBACK_MESSAGE};
pub use classifier::{
    Classifier, ColorThresholdClassifier, ColorThresholds, Evidence, ExternalLabelClassifier,
    LexicalClassifier, MaterialLabel, ShapeAssistedClassifier, StrategyKind,
    COLOR_DEFAULT_LABEL, SHAPE_DEFAULT_LABEL,
};
pub use color_profiler::{profile, ColorProfile};
pub use error::{Result, ScanError};
pub use image_source::{encode_image, load_image, load_image_bytes, ImageData, ImageLimits};
pub use selector::{RecommendationSelector, SelectionPolicy};
pub use shape_analyzer::{analyze, Region, RegionSet, ShapeOptions};

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Options for a scan. Every field has a default, so a partial JSON file is
/// a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    pub strategy: StrategyKind,
    pub policy: SelectionPolicy,
    /// Produce an annotated copy of the input.
    pub annotate: bool,
    pub limits: ImageLimits,
    pub shape: ShapeOptions,
    pub color: ColorThresholds,
    pub shape_default_label: MaterialLabel,
    pub annotation: AnnotationStyle,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            policy: SelectionPolicy::default(),
            annotate: false,
            limits: ImageLimits::default(),
            shape: ShapeOptions::default(),
            color: ColorThresholds::default(),
            shape_default_label: SHAPE_DEFAULT_LABEL,
            annotation: AnnotationStyle::default(),
        }
    }
}

impl ScanOptions {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub label: MaterialLabel,
    pub recommendation: RecommendationEntry,
    /// Encoded annotated image, when annotation was requested.
    pub annotated: Option<Vec<u8>>,
}

/// A configured pipeline. Holds no mutable state and can be shared by
/// concurrent request handlers.
pub struct Scanner {
    catalog: RecommendationCatalog,
    classifier: Box<dyn Classifier>,
    options: ScanOptions,
}

impl Scanner {
    /// Fails with a configuration error if the catalog cannot serve every
    /// label the chosen strategy can emit.
    pub fn new(catalog: RecommendationCatalog, options: ScanOptions) -> Result<Self> {
        let classifier = options
            .strategy
            .build(options.color, options.shape_default_label);
        catalog.ensure_covers(&classifier.emittable_labels())?;
        info!(strategy = classifier.name(), policy = ?options.policy, "scanner ready");

        Ok(Self {
            catalog,
            classifier,
            options,
        })
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn catalog(&self) -> &RecommendationCatalog {
        &self.catalog
    }

    pub fn classify_and_recommend(
        &self,
        image_bytes: &[u8],
        filename_hint: Option<&str>,
        external_labels: Option<&[String]>,
    ) -> Result<ScanOutcome> {
        self.classify_and_recommend_with_rng(
            image_bytes,
            filename_hint,
            external_labels,
            &mut rand::thread_rng(),
        )
    }

    /// Only decoding can fail; once the image decodes, a recommendation is
    /// always produced.
    pub fn classify_and_recommend_with_rng<R: Rng + ?Sized>(
        &self,
        image_bytes: &[u8],
        filename_hint: Option<&str>,
        external_labels: Option<&[String]>,
        rng: &mut R,
    ) -> Result<ScanOutcome> {
        let image_data = load_image_bytes(image_bytes, &self.options.limits)?;

        let mut regions: Option<RegionSet> = None;
        let label = self.classify_image(&image_data, filename_hint, external_labels, &mut regions);

        if label == MaterialLabel::Unknown {
            warn!(strategy = self.classifier.name(), "material not identified");
        } else {
            info!(strategy = self.classifier.name(), %label, "material identified");
        }

        let recommendation =
            RecommendationSelector::new(&self.catalog).select_with(label, self.options.policy, rng);

        let annotated = if self.options.annotate {
            let regions = match regions {
                Some(regions) => regions,
                None => analyze(&image_data, &self.options.shape),
            };
            let marked = annotate(
                &image_data,
                &regions,
                self.options.shape.min_area,
                &self.options.annotation,
            );
            Some(encode_image(&marked)?)
        } else {
            None
        };

        Ok(ScanOutcome {
            label,
            recommendation,
            annotated,
        })
    }

    /// Gathers the evidence the active strategy consumes. Region analysis is
    /// kept in `regions` so annotation can reuse it.
    fn classify_image(
        &self,
        image_data: &ImageData,
        filename_hint: Option<&str>,
        external_labels: Option<&[String]>,
        regions: &mut Option<RegionSet>,
    ) -> MaterialLabel {
        match self.options.strategy {
            StrategyKind::Lexical => match filename_hint {
                Some(name) => self.classifier.classify(&Evidence::Filename(name)),
                None => MaterialLabel::Unknown,
            },
            StrategyKind::Color => {
                let color_profile = profile(image_data);
                self.classifier.classify(&Evidence::Color(&color_profile))
            }
            StrategyKind::Shape => {
                let found = regions.insert(analyze(image_data, &self.options.shape));
                self.classifier.classify(&Evidence::Regions(found))
            }
            StrategyKind::External => match external_labels {
                Some(labels) => self.classifier.classify(&Evidence::Labels(labels)),
                None => MaterialLabel::Unknown,
            },
        }
    }
}

/// One-shot scan against the built-in catalog without external labels.
pub fn classify_and_recommend(
    image_bytes: &[u8],
    filename_hint: Option<&str>,
    options: &ScanOptions,
) -> Result<ScanOutcome> {
    let scanner = Scanner::new(RecommendationCatalog::builtin()?, options.clone())?;
    scanner.classify_and_recommend(image_bytes, filename_hint, None)
}
