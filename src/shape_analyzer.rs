//! Foreground region extraction.
//!
//! Grayscale, Gaussian blur, fixed binary threshold, then external contour
//! tracing. Each outer contour becomes an axis-aligned box with the polygon
//! area of the contour; small regions are dropped as noise.

use crate::image_source::ImageData;
use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::threshold;
use imageproc::filter::gaussian_blur_f32;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_THRESHOLD: u8 = 120;
pub const DEFAULT_MIN_AREA: f64 = 500.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeOptions {
    /// Gaussian sigma; 0 disables blurring.
    pub blur_sigma: f32,
    /// Luma strictly above this is foreground.
    pub threshold: u8,
    /// Regions with contour area not exceeding this are noise.
    pub min_area: f64,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            blur_sigma: 1.1,
            threshold: DEFAULT_THRESHOLD,
            min_area: DEFAULT_MIN_AREA,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Polygon area enclosed by the contour, in pixels².
    pub area: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionSet {
    pub regions: Vec<Region>,
}

impl RegionSet {
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    pub fn above_area(&self, min_area: f64) -> impl Iterator<Item = &Region> {
        self.regions.iter().filter(move |r| r.area > min_area)
    }
}

pub fn analyze(image_data: &ImageData, options: &ShapeOptions) -> RegionSet {
    if image_data.width == 0 || image_data.height == 0 {
        return RegionSet::default();
    }

    let gray = image::imageops::grayscale(&image_data.to_rgb_image());
    let blurred = if options.blur_sigma > 0.0 {
        gaussian_blur_f32(&gray, options.blur_sigma)
    } else {
        gray
    };
    let binary = threshold(&blurred, options.threshold);

    // Objects touching the border are only traced as outer contours when
    // there is background on every side.
    let mut framed = GrayImage::new(binary.width() + 2, binary.height() + 2);
    image::imageops::replace(&mut framed, &binary, 1, 1);

    let contours: Vec<Contour<u32>> = find_contours(&framed);
    let total = contours.len();

    let regions: Vec<Region> = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(region_from_contour)
        .filter(|r| r.area > options.min_area)
        .collect();

    debug!(contours = total, regions = regions.len(), "shape regions extracted");

    RegionSet { regions }
}

/// Maps a contour traced on the framed mask back to image coordinates.
fn region_from_contour(contour: &Contour<u32>) -> Option<Region> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(Region {
        x: min_x.saturating_sub(1),
        y: min_y.saturating_sub(1),
        width: max_x - min_x + 1,
        height: max_y - min_y + 1,
        area: polygon_area(contour),
    })
}

/// Shoelace formula over the traced border points.
fn polygon_area(contour: &Contour<u32>) -> f64 {
    let pts = &contour.points;
    if pts.len() < 3 {
        return 0.0;
    }
    let mut twice_area = 0.0;
    for i in 0..pts.len() {
        let a = pts[i];
        let b = pts[(i + 1) % pts.len()];
        twice_area += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    (twice_area / 2.0).abs()
}
