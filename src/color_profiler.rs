//! Aggregate colour statistics in HSV space.
//!
//! Uses the 8-bit HSV convention: hue in 0..=179 (degrees halved),
//! saturation and value in 0..=255.

use crate::image_source::ImageData;
use rayon::prelude::*;
use rgb::RGB8;
use tracing::debug;

pub const HISTOGRAM_BUCKETS: usize = 256;

const CHUNK_PIXELS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

pub fn rgb_to_hsv(p: RGB8) -> Hsv {
    let r = p.r as f64;
    let g = p.g as f64;
    let b = p.b as f64;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };

    let mut h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    // 359.x degrees rounds up to 180, which wraps back to red
    let h = ((h / 2.0).round() as u16 % 180) as u8;

    Hsv {
        h,
        s: s.round() as u8,
        v: max as u8,
    }
}

impl ImageData {
    pub fn to_hsv(&self) -> Vec<Hsv> {
        self.pixels.par_iter().map(|&p| rgb_to_hsv(p)).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColorProfile {
    pub mean_hue: f64,
    pub mean_saturation: f64,
    pub mean_value: f64,
    /// Min-max normalized: the fullest bucket is 1.0, the emptiest 0.0.
    pub hue_histogram: Vec<f64>,
    pub saturation_histogram: Vec<f64>,
    pub value_histogram: Vec<f64>,
}

impl ColorProfile {
    /// Profile with the given means and empty histograms.
    pub fn from_means(mean_hue: f64, mean_saturation: f64, mean_value: f64) -> Self {
        Self {
            mean_hue,
            mean_saturation,
            mean_value,
            hue_histogram: vec![0.0; HISTOGRAM_BUCKETS],
            saturation_histogram: vec![0.0; HISTOGRAM_BUCKETS],
            value_histogram: vec![0.0; HISTOGRAM_BUCKETS],
        }
    }
}

struct Accumulator {
    counts: [[u64; HISTOGRAM_BUCKETS]; 3],
    sums: [u64; 3],
    n: u64,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            counts: [[0; HISTOGRAM_BUCKETS]; 3],
            sums: [0; 3],
            n: 0,
        }
    }

    fn add(mut self, hsv: Hsv) -> Self {
        for (channel, value) in [hsv.h, hsv.s, hsv.v].into_iter().enumerate() {
            self.counts[channel][value as usize] += 1;
            self.sums[channel] += value as u64;
        }
        self.n += 1;
        self
    }

    fn merge(mut self, other: Self) -> Self {
        for channel in 0..3 {
            for bucket in 0..HISTOGRAM_BUCKETS {
                self.counts[channel][bucket] += other.counts[channel][bucket];
            }
            self.sums[channel] += other.sums[channel];
        }
        self.n += other.n;
        self
    }
}

pub fn profile(image_data: &ImageData) -> ColorProfile {
    let acc = image_data
        .pixels
        .par_chunks(CHUNK_PIXELS)
        .map(|chunk| {
            chunk
                .iter()
                .fold(Accumulator::new(), |acc, &p| acc.add(rgb_to_hsv(p)))
        })
        .reduce(Accumulator::new, Accumulator::merge);

    let mean = |channel: usize| {
        if acc.n == 0 {
            0.0
        } else {
            acc.sums[channel] as f64 / acc.n as f64
        }
    };

    let profile = ColorProfile {
        mean_hue: mean(0),
        mean_saturation: mean(1),
        mean_value: mean(2),
        hue_histogram: normalize_min_max(&acc.counts[0]),
        saturation_histogram: normalize_min_max(&acc.counts[1]),
        value_histogram: normalize_min_max(&acc.counts[2]),
    };

    debug!(
        mean_hue = profile.mean_hue,
        mean_saturation = profile.mean_saturation,
        mean_value = profile.mean_value,
        pixels = acc.n,
        "color profile computed"
    );

    profile
}

/// Scale counts into 0.0..=1.0 by (c - min) / (max - min). A flat histogram
/// has no shape and maps to all zeros.
fn normalize_min_max(counts: &[u64]) -> Vec<f64> {
    let min = counts.iter().copied().min().unwrap_or(0);
    let max = counts.iter().copied().max().unwrap_or(0);
    if max == min {
        return vec![0.0; counts.len()];
    }
    let range = (max - min) as f64;
    counts.iter().map(|&c| (c - min) as f64 / range).collect()
}
