//! Integration tests: cover-fit arithmetic and raster crop (pd-core).
//!
//! Property tests cover the two geometric guarantees the cover flows rely
//! on: the base scale always covers the slot, and at `scale = 1` the pan
//! viewport never leaves the source image.

use pd_core::fit::{compute_cover_fit, fit_image_element, render_cover_crop};
use pd_core::image::{DynamicImage, Rgba, RgbaImage};
use pd_core::{ElementBase, ImagePositionSettings};
use proptest::prelude::*;

const EPS: f64 = 1e-6;

fn dims() -> impl Strategy<Value = u32> {
    1u32..4000
}

fn slot() -> impl Strategy<Value = f64> {
    1.0f64..2000.0
}

proptest! {
    #[test]
    fn base_scale_covers_the_slot(w in dims(), h in dims(), tw in slot(), th in slot()) {
        let fit = compute_cover_fit((w, h), (tw, th), ImagePositionSettings { x: 50.0, y: 50.0, scale: 1.0 }).unwrap();
        prop_assert!(fit.scaled_width + EPS * tw >= tw);
        prop_assert!(fit.scaled_height + EPS * th >= th);
        // One axis matches exactly.
        let matches_w = (fit.scaled_width - tw).abs() <= EPS * tw;
        let matches_h = (fit.scaled_height - th).abs() <= EPS * th;
        prop_assert!(matches_w || matches_h);
    }

    #[test]
    fn zoom_in_never_uncovers(w in dims(), h in dims(), tw in slot(), th in slot(), scale in 1.0f64..4.0) {
        let fit = compute_cover_fit((w, h), (tw, th), ImagePositionSettings { x: 0.0, y: 0.0, scale }).unwrap();
        prop_assert!(fit.offset_x <= EPS && fit.offset_y <= EPS);
        prop_assert!(fit.offset_x + fit.scaled_width + EPS * tw >= tw);
        prop_assert!(fit.offset_y + fit.scaled_height + EPS * th >= th);
    }

    #[test]
    fn pan_viewport_stays_inside_source(
        w in dims(), h in dims(), tw in slot(), th in slot(),
        x in 0.0f64..=100.0, y in 0.0f64..=100.0,
    ) {
        let fit = compute_cover_fit((w, h), (tw, th), ImagePositionSettings { x, y, scale: 1.0 }).unwrap();
        let view = fit.source_viewport();
        let (w, h) = (f64::from(w), f64::from(h));
        prop_assert!(view.x >= -EPS * w);
        prop_assert!(view.y >= -EPS * h);
        prop_assert!(view.x + view.width <= w * (1.0 + EPS));
        prop_assert!(view.y + view.height <= h * (1.0 + EPS));
    }
}

#[test]
fn tall_image_in_wide_slot_pans_vertically() {
    // 100x400 into 200x100: width-bound, base scale 2, 700px of vertical travel.
    let top = compute_cover_fit((100, 400), (200.0, 100.0), ImagePositionSettings { x: 50.0, y: 0.0, scale: 1.0 }).unwrap();
    let bottom = compute_cover_fit((100, 400), (200.0, 100.0), ImagePositionSettings { x: 50.0, y: 100.0, scale: 1.0 }).unwrap();
    assert_eq!(top.base_scale, 2.0);
    assert_eq!(top.offset_x, 0.0);
    assert_eq!(top.offset_y, 0.0);
    assert_eq!(bottom.offset_y, -700.0);
    assert_eq!(bottom.source_viewport().y, 350.0);
}

#[test]
fn crop_output_matches_slot_size() {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(640, 480, Rgba([10, 200, 30, 255])));
    let out = render_cover_crop(&img, (333, 120), ImagePositionSettings::default()).unwrap();
    assert_eq!(out.dimensions(), (333, 120));
}

#[test]
fn fractional_slot_sizes_round_to_pixels() {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(64, 64, Rgba([0, 0, 0, 255])));
    let slot = ElementBase::new("s", "daily cover", 0.0, 0.0, 559.4, 333.6);
    let el = fit_image_element(&slot, &img, ImagePositionSettings::default()).unwrap();
    assert_eq!(el.base.width, 559.4);
    assert_eq!(el.position, Some(ImagePositionSettings::default()));
}
