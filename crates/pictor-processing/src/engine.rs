//! Transform pipeline.
//!
//! Operations run in a fixed order: crop, resize, rotate, blur, filters.
//! An operation that fails is logged and skipped; the next one sees the
//! image as it was before the failure.

use image::DynamicImage;
use pictor_core::models::ImageInfo;
use pictor_core::TransformSpec;

use crate::codec;
use crate::{ImageFilters, ImageGeometry, TransformResult};

#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub data: Vec<u8>,
    pub info: ImageInfo,
    /// Operations applied, in order.
    pub applied: Vec<&'static str>,
    /// Operations that failed and were skipped.
    pub skipped: Vec<&'static str>,
}

struct Pipeline {
    img: DynamicImage,
    applied: Vec<&'static str>,
    skipped: Vec<&'static str>,
}

impl Pipeline {
    fn step<F>(&mut self, operation: &'static str, f: F)
    where
        F: FnOnce(&DynamicImage) -> TransformResult<DynamicImage>,
    {
        match f(&self.img) {
            Ok(next) => {
                self.img = next;
                self.applied.push(operation);
            }
            Err(e) => {
                tracing::warn!(operation, error = %e, "Transform operation failed, skipping");
                self.skipped.push(operation);
            }
        }
    }
}

/// Decode `data`, apply `spec` and re-encode in the source format.
///
/// Only undecodable input or an encoder failure is an error; individual
/// operations never abort the transform. Identical inputs always produce
/// identical bytes.
pub fn transform(data: &[u8], spec: &TransformSpec) -> TransformResult<TransformOutput> {
    let (img, source_format) = codec::decode(data)?;
    let mut pipeline = Pipeline {
        img,
        applied: Vec::new(),
        skipped: Vec::new(),
    };

    if let Some(crop) = &spec.crop {
        pipeline.step("crop", |img| ImageGeometry::crop(img, crop));
    }
    if let Some(resize) = &spec.resize {
        pipeline.step("resize", |img| ImageGeometry::resize(img, resize));
    }
    if let Some(rotate) = &spec.rotate {
        pipeline.step("rotate", |img| ImageGeometry::rotate(img, rotate));
    }
    if let Some(sigma) = spec.blur {
        pipeline.step("blur", |img| ImageFilters::apply_blur(img, sigma));
    }
    if let Some(filters) = &spec.filters {
        pipeline.step("filters", |img| Ok(ImageFilters::apply(img, filters)));
    }

    let format = codec::output_format(source_format);
    let (data, info) = codec::encode(pipeline.img, format)?;

    tracing::debug!(
        format = %info.format,
        width = info.width,
        height = info.height,
        applied = ?pipeline.applied,
        skipped = ?pipeline.skipped,
        "Transform complete"
    );

    Ok(TransformOutput {
        data,
        info,
        applied: pipeline.applied,
        skipped: pipeline.skipped,
    })
}
