use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use pictor_core::{Filters, MAX_BLUR_SIGMA};

use crate::{TransformError, TransformResult};

pub struct ImageFilters;

impl ImageFilters {
    /// Gaussian blur with the given sigma. A sigma of zero leaves the image
    /// untouched; sigmas above [`MAX_BLUR_SIGMA`] are refused.
    pub fn apply_blur(img: &DynamicImage, sigma: f32) -> TransformResult<DynamicImage> {
        if !sigma.is_finite() || !(0.0..=MAX_BLUR_SIGMA).contains(&sigma) {
            return Err(TransformError::operation(
                "blur",
                format!("invalid sigma {}", sigma),
            ));
        }
        if sigma == 0.0 {
            return Ok(img.clone());
        }
        Ok(img.blur(sigma))
    }

    /// Apply the colour filter. Grayscale and sepia are exclusive; grayscale
    /// takes precedence when both are requested.
    pub fn apply(img: &DynamicImage, filters: &Filters) -> DynamicImage {
        if filters.grayscale {
            Self::apply_grayscale(img)
        } else if filters.sepia {
            Self::apply_sepia(img)
        } else {
            img.clone()
        }
    }

    pub fn apply_grayscale(img: &DynamicImage) -> DynamicImage {
        img.grayscale()
    }

    /// Apply sepia tone effect
    pub fn apply_sepia(img: &DynamicImage) -> DynamicImage {
        let (width, height) = img.dimensions();
        let rgba8 = img.to_rgba8();
        let mut sepia_img = RgbaImage::new(width, height);

        for (x, y, pixel) in rgba8.enumerate_pixels() {
            let Rgba([r, g, b, a]) = *pixel;
            let (r, g, b) = (r as f32, g as f32, b as f32);

            let tr = (0.393 * r + 0.769 * g + 0.189 * b).min(255.0) as u8;
            let tg = (0.349 * r + 0.686 * g + 0.168 * b).min(255.0) as u8;
            let tb = (0.272 * r + 0.534 * g + 0.131 * b).min(255.0) as u8;

            sepia_img.put_pixel(x, y, Rgba([tr, tg, tb, a]));
        }

        DynamicImage::ImageRgba8(sepia_img)
    }
}
