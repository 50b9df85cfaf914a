//! Cover-fit image cropping for template image slots.
//!
//! The arithmetic is pure and testable without pixels: [`compute_cover_fit`]
//! turns source dimensions, a slot size and an [`ImagePositionSettings`]
//! into a scale and a pan offset. [`render_cover_crop`] then rasterizes the
//! slot-sized viewport, and [`fit_image_element`] wraps the result in a
//! replacement element that keeps the slot's identity.
//!
//! ## Coordinate model
//!
//! The slot spans `[0, target_w] × [0, target_h]`. The scaled image is
//! placed at `(offset_x, offset_y)`; once it covers the slot both offsets
//! are `<= 0`, and `x = 0 / 100` pins the left / right edge.

use crate::error::FitError;
use crate::model::{ElementBase, ImageElement, ImagePositionSettings, ObjectFit};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
use std::io::Cursor;

/// Result of the cover-fit computation, in slot units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoverFit {
    /// Smallest scale at which the source fully covers the slot.
    pub base_scale: f64,
    /// `base_scale * settings.scale`.
    pub final_scale: f64,
    pub scaled_width: f64,
    pub scaled_height: f64,
    /// Where the scaled image's top-left lands relative to the slot.
    pub offset_x: f64,
    pub offset_y: f64,
    pub target_width: f64,
    pub target_height: f64,
}

/// A rectangle in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl CoverFit {
    /// The region of the source image that ends up inside the slot.
    pub fn source_viewport(&self) -> SourceRect {
        SourceRect {
            x: -self.offset_x / self.final_scale,
            y: -self.offset_y / self.final_scale,
            width: self.target_width / self.final_scale,
            height: self.target_height / self.final_scale,
        }
    }
}

/// Compute cover-fit scale and pan for a `source` image in a `target` slot.
///
/// # Errors
/// Returns `FitError` for empty geometry or unusable position settings.
pub fn compute_cover_fit(
    source: (u32, u32),
    target: (f64, f64),
    settings: ImagePositionSettings,
) -> Result<CoverFit, FitError> {
    let (src_w, src_h) = source;
    if src_w == 0 || src_h == 0 {
        return Err(FitError::EmptySource {
            width: src_w,
            height: src_h,
        });
    }
    let (target_w, target_h) = target;
    if !(target_w.is_finite() && target_h.is_finite()) || target_w <= 0.0 || target_h <= 0.0 {
        return Err(FitError::EmptyTarget {
            width: target_w,
            height: target_h,
        });
    }
    let settings = settings.validated()?;

    let (w, h) = (f64::from(src_w), f64::from(src_h));
    let base_scale = (target_w / w).max(target_h / h);
    let final_scale = base_scale * settings.scale;
    let scaled_width = w * final_scale;
    let scaled_height = h * final_scale;

    // Free travel per axis: <= 0 once the image covers the slot.
    let max_offset_x = target_w - scaled_width;
    let max_offset_y = target_h - scaled_height;

    Ok(CoverFit {
        base_scale,
        final_scale,
        scaled_width,
        scaled_height,
        offset_x: settings.x / 100.0 * max_offset_x,
        offset_y: settings.y / 100.0 * max_offset_y,
        target_width: target_w,
        target_height: target_h,
    })
}

/// Rasterize exactly the `target` viewport of the scaled, panned image.
///
/// Areas the image does not reach (only possible with `scale < 1`) stay
/// transparent.
pub fn render_cover_crop(
    image: &DynamicImage,
    target: (u32, u32),
    settings: ImagePositionSettings,
) -> Result<RgbaImage, FitError> {
    let (tw, th) = target;
    let fit = compute_cover_fit(image.dimensions(), (f64::from(tw), f64::from(th)), settings)?;
    let mut canvas = RgbaImage::new(tw, th);

    // Part of the slot covered by the scaled image.
    let dx0 = fit.offset_x.max(0.0);
    let dy0 = fit.offset_y.max(0.0);
    let dx1 = (fit.offset_x + fit.scaled_width).min(f64::from(tw));
    let dy1 = (fit.offset_y + fit.scaled_height).min(f64::from(th));
    if dx1 - dx0 < 0.5 || dy1 - dy0 < 0.5 {
        return Ok(canvas);
    }

    let (src_w, src_h) = image.dimensions();
    let sx = ((dx0 - fit.offset_x) / fit.final_scale).floor().clamp(0.0, f64::from(src_w - 1)) as u32;
    let sy = ((dy0 - fit.offset_y) / fit.final_scale).floor().clamp(0.0, f64::from(src_h - 1)) as u32;
    let sw = ((dx1 - dx0) / fit.final_scale).round().max(1.0).min(f64::from(src_w - sx)) as u32;
    let sh = ((dy1 - dy0) / fit.final_scale).round().max(1.0).min(f64::from(src_h - sy)) as u32;

    let dest_x = dx0.round() as u32;
    let dest_y = dy0.round() as u32;
    let out_w = ((dx1 - dx0).round() as u32).clamp(1, tw - dest_x.min(tw - 1));
    let out_h = ((dy1 - dy0).round() as u32).clamp(1, th - dest_y.min(th - 1));

    let region = imageops::crop_imm(image, sx, sy, sw, sh).to_image();
    let scaled = imageops::resize(&region, out_w, out_h, FilterType::Lanczos3);
    imageops::overlay(&mut canvas, &scaled, i64::from(dest_x), i64::from(dest_y));

    log::trace!(
        "cover crop {}x{} src=({sx},{sy} {sw}x{sh}) -> dest=({dest_x},{dest_y} {out_w}x{out_h})",
        tw,
        th
    );
    Ok(canvas)
}

/// Decode an encoded image (JPEG, PNG or WebP).
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, FitError> {
    Ok(image::load_from_memory(bytes)?)
}

/// Encode a raster as a `data:image/png;base64,...` URL.
pub fn encode_png_data_url(image: &RgbaImage) -> Result<String, FitError> {
    let mut png = Vec::new();
    image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// Pixel size of a slot, rounded to whole pixels.
pub fn slot_pixels(slot: &ElementBase) -> Result<(u32, u32), FitError> {
    let (w, h) = (f64::from(slot.width), f64::from(slot.height));
    if !(w.is_finite() && h.is_finite()) || w.round() < 1.0 || h.round() < 1.0 {
        return Err(FitError::EmptyTarget { width: w, height: h });
    }
    Ok((w.round() as u32, h.round() as u32))
}

/// Build the replacement element for `slot` from an already decoded image.
///
/// The result sits at the slot's coordinates with the slot's size, id,
/// name, opacity and lock state.
pub fn fit_image_element(
    slot: &ElementBase,
    image: &DynamicImage,
    settings: ImagePositionSettings,
) -> Result<ImageElement, FitError> {
    let settings = settings.validated()?;
    let target = slot_pixels(slot)?;
    let raster = render_cover_crop(image, target, settings)?;
    let src = encode_png_data_url(&raster)?;

    let mut base = slot.clone();
    base.rotation = 0.0;
    base.visible = true;
    Ok(ImageElement {
        base,
        src,
        object_fit: ObjectFit::Fill,
        position: Some(settings),
    })
}
