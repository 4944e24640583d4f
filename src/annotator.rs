//! Draws detected regions onto a copy of the input image.

use crate::image_source::ImageData;
use crate::shape_analyzer::RegionSet;
use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    pub color: [u8; 3],
    /// Border width in pixels, drawn inward from the region box.
    pub thickness: u32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: [0, 255, 0],
            thickness: 2,
        }
    }
}

/// Returns a new image with one rectangle per region larger than
/// `min_area`. The input is left untouched.
pub fn annotate(
    image_data: &ImageData,
    regions: &RegionSet,
    min_area: f64,
    style: &AnnotationStyle,
) -> ImageData {
    let mut canvas = image_data.to_rgb_image();
    let color = Rgb(style.color);

    for region in regions.above_area(min_area) {
        for inset in 0..style.thickness {
            let (Some(w), Some(h)) = (
                region.width.checked_sub(2 * inset),
                region.height.checked_sub(2 * inset),
            ) else {
                break;
            };
            if w == 0 || h == 0 {
                break;
            }
            let rect = Rect::at((region.x + inset) as i32, (region.y + inset) as i32).of_size(w, h);
            draw_hollow_rect_mut(&mut canvas, rect, color);
        }
    }

    ImageData::from_rgb_image(&canvas, image_data.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_source::SourceFormat;
    use crate::shape_analyzer::{Region, DEFAULT_MIN_AREA};
    use rgb::RGB8;

    fn blank(width: u32, height: u32) -> ImageData {
        ImageData {
            width,
            height,
            pixels: vec![RGB8::new(10, 10, 10); (width * height) as usize],
            format: SourceFormat::Jpeg,
        }
    }

    fn region(x: u32, y: u32, size: u32, area: f64) -> Region {
        Region { x, y, width: size, height: size, area }
    }

    fn pixel(img: &ImageData, x: u32, y: u32) -> RGB8 {
        img.pixels[(y * img.width + x) as usize]
    }

    #[test]
    fn test_draws_border_of_large_region() {
        let img = blank(50, 50);
        let set = RegionSet { regions: vec![region(10, 10, 30, 841.0)] };
        let out = annotate(&img, &set, DEFAULT_MIN_AREA, &AnnotationStyle::default());

        let green = RGB8::new(0, 255, 0);
        assert_eq!(pixel(&out, 10, 10), green);
        assert_eq!(pixel(&out, 39, 39), green);
        assert_eq!(pixel(&out, 11, 20), green);
        // Third ring and the interior are untouched
        assert_eq!(pixel(&out, 12, 20), RGB8::new(10, 10, 10));
        assert_eq!(pixel(&out, 25, 25), RGB8::new(10, 10, 10));
        assert_eq!(out.format, SourceFormat::Jpeg);
    }

    #[test]
    fn test_skips_small_regions() {
        let img = blank(50, 50);
        let set = RegionSet { regions: vec![region(5, 5, 20, 361.0)] };
        let out = annotate(&img, &set, DEFAULT_MIN_AREA, &AnnotationStyle::default());
        assert_eq!(out.pixels, img.pixels);

        let out = annotate(&img, &set, 300.0, &AnnotationStyle::default());
        assert_ne!(out.pixels, img.pixels);
    }

    #[test]
    fn test_input_not_mutated() {
        let img = blank(40, 40);
        let before = img.pixels.clone();
        let set = RegionSet { regions: vec![region(0, 0, 40, 1521.0)] };
        let out = annotate(&img, &set, DEFAULT_MIN_AREA, &AnnotationStyle::default());
        assert_eq!(img.pixels, before);
        assert_ne!(out.pixels, before);
    }

    #[test]
    fn test_thin_region_does_not_panic() {
        let img = blank(20, 20);
        let set = RegionSet {
            regions: vec![Region { x: 2, y: 2, width: 1, height: 15, area: 600.0 }],
        };
        let style = AnnotationStyle { thickness: 4, ..AnnotationStyle::default() };
        let out = annotate(&img, &set, DEFAULT_MIN_AREA, &style);
        assert_eq!(pixel(&out, 2, 5), RGB8::new(0, 255, 0));
    }
}
