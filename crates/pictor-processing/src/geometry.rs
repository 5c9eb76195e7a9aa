//! Crop, resize and rotation.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use pictor_core::{Crop, Resize, Rotate};

use crate::{TransformError, TransformResult};

/// Upper bound on output size for operations that allocate a new canvas.
pub const MAX_OUTPUT_PIXELS: u64 = 100_000_000;

fn check_canvas(operation: &'static str, width: u32, height: u32) -> TransformResult<()> {
    if width == 0 || height == 0 {
        return Err(TransformError::operation(operation, "empty output"));
    }
    let pixels = width as u64 * height as u64;
    if pixels > MAX_OUTPUT_PIXELS {
        return Err(TransformError::operation(
            operation,
            format!("{}x{} exceeds the {} pixel limit", width, height, MAX_OUTPUT_PIXELS),
        ));
    }
    Ok(())
}

pub struct ImageGeometry;

impl ImageGeometry {
    /// Extract the `width x height` region whose top-left corner is `(x, y)`.
    /// The region must lie inside the image.
    pub fn crop(img: &DynamicImage, crop: &Crop) -> TransformResult<DynamicImage> {
        let (width, height) = img.dimensions();
        let right = crop.x.checked_add(crop.width);
        let bottom = crop.y.checked_add(crop.height);
        let inside = matches!(right, Some(r) if r <= width) && matches!(bottom, Some(b) if b <= height);

        if crop.width == 0 || crop.height == 0 || !inside {
            return Err(TransformError::operation(
                "crop",
                format!(
                    "region {}x{}+{}+{} is outside the {}x{} image",
                    crop.width, crop.height, crop.x, crop.y, width, height
                ),
            ));
        }

        Ok(img.crop_imm(crop.x, crop.y, crop.width, crop.height))
    }

    /// Scale to cover the `width x height` box keeping the aspect ratio, then
    /// centre-crop to it.
    pub fn resize(img: &DynamicImage, resize: &Resize) -> TransformResult<DynamicImage> {
        check_canvas("resize", resize.width, resize.height)?;

        // The intermediate scaled image can be far larger than the box
        let (width, height) = img.dimensions();
        let ratio = f64::max(
            resize.width as f64 / width as f64,
            resize.height as f64 / height as f64,
        );
        let scaled_width = (width as f64 * ratio).ceil().min(u32::MAX as f64) as u32;
        let scaled_height = (height as f64 * ratio).ceil().min(u32::MAX as f64) as u32;
        check_canvas("resize", scaled_width, scaled_height)?;

        Ok(img.resize_to_fill(resize.width, resize.height, FilterType::Lanczos3))
    }

    /// Rotate clockwise by `angle` degrees.
    ///
    /// Right angles are lossless. Any other angle enlarges the canvas to hold
    /// the whole rotated image and fills the uncovered corners with the
    /// background colour.
    pub fn rotate(img: &DynamicImage, rotate: &Rotate) -> TransformResult<DynamicImage> {
        if !rotate.angle.is_finite() {
            return Err(TransformError::operation("rotate", "angle is not a number"));
        }

        let angle = rotate.angle.rem_euclid(360.0);
        if angle == 0.0 {
            Ok(img.clone())
        } else if angle == 90.0 {
            Ok(img.rotate90())
        } else if angle == 180.0 {
            Ok(img.rotate180())
        } else if angle == 270.0 {
            Ok(img.rotate270())
        } else {
            Self::rotate_free(img, angle, Rgba(rotate.background.to_rgba()))
        }
    }

    fn rotate_free(
        img: &DynamicImage,
        degrees: f32,
        background: Rgba<u8>,
    ) -> TransformResult<DynamicImage> {
        let (width, height) = img.dimensions();
        let theta = degrees.to_radians();
        let (sin, cos) = (theta.sin().abs(), theta.cos().abs());

        let out_width = (width as f32 * cos + height as f32 * sin).ceil() as u32;
        let out_height = (width as f32 * sin + height as f32 * cos).ceil() as u32;
        check_canvas("rotate", out_width, out_height)?;

        // Centre the source on a canvas large enough for both the source and
        // the rotated bounds, rotate in place, then cut the bounds out.
        let canvas_width = width.max(out_width);
        let canvas_height = height.max(out_height);
        check_canvas("rotate", canvas_width, canvas_height)?;

        let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, background);
        imageops::overlay(
            &mut canvas,
            &img.to_rgba8(),
            ((canvas_width - width) / 2) as i64,
            ((canvas_height - height) / 2) as i64,
        );

        let rotated = rotate_about_center(&canvas, theta, Interpolation::Bilinear, background);
        let cropped = imageops::crop_imm(
            &rotated,
            (canvas_width - out_width) / 2,
            (canvas_height - out_height) / 2,
            out_width,
            out_height,
        )
        .to_image();

        Ok(DynamicImage::ImageRgba8(cropped))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pictor_core::Background;

    fn image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 0, 255, 255])))
    }

    fn rotate(angle: f32) -> Rotate {
        Rotate {
            angle,
            background: Background::default(),
        }
    }

    #[test]
    fn test_crop_inside_bounds() {
        let crop = Crop {
            width: 4,
            height: 2,
            x: 6,
            y: 8,
        };
        let cropped = ImageGeometry::crop(&image(10, 10), &crop).unwrap();
        assert_eq!(cropped.dimensions(), (4, 2));
    }

    #[test]
    fn test_crop_outside_bounds_fails() {
        let crop = Crop {
            width: 5,
            height: 5,
            x: 8,
            y: 0,
        };
        let result = ImageGeometry::crop(&image(10, 10), &crop);
        assert!(matches!(
            result,
            Err(TransformError::Operation {
                operation: "crop",
                ..
            })
        ));
    }

    #[test]
    fn test_crop_overflowing_offset_fails() {
        let crop = Crop {
            width: 2,
            height: 2,
            x: u32::MAX,
            y: 0,
        };
        assert!(ImageGeometry::crop(&image(10, 10), &crop).is_err());
    }

    /// 80x20: red, green and blue bands of 20, 40 and 20 columns.
    fn banded() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(80, 20, |x, _| match x {
            0..=19 => Rgba([255, 0, 0, 255]),
            20..=59 => Rgba([0, 255, 0, 255]),
            _ => Rgba([0, 0, 255, 255]),
        }))
    }

    #[test]
    fn test_resize_output_has_requested_dimensions() {
        let resized = ImageGeometry::resize(
            &image(40, 10),
            &Resize {
                width: 7,
                height: 9,
            },
        )
        .unwrap();
        assert_eq!(resized.dimensions(), (7, 9));
    }

    #[test]
    fn test_resize_keeps_aspect_and_crops_centre() {
        let resized = ImageGeometry::resize(
            &banded(),
            &Resize {
                width: 20,
                height: 20,
            },
        )
        .unwrap()
        .to_rgba8();
        assert_eq!(resized.dimensions(), (20, 20));

        // Squashing would put the red band on the left edge; filling keeps
        // only the green middle.
        for x in [0, 10, 19] {
            let Rgba([r, g, b, _]) = *resized.get_pixel(x, 10);
            assert!(g > 200 && r < 50 && b < 50, "pixel {} is {:?}", x, (r, g, b));
        }
    }

    #[test]
    fn test_resize_rejects_huge_intermediate() {
        // 1x1000 scaled to cover 10000x10000 would be 10000x10000000
        let result = ImageGeometry::resize(
            &image(1, 1000),
            &Resize {
                width: 10_000,
                height: 10_000,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_resize_rejects_huge_canvas() {
        let result = ImageGeometry::resize(
            &image(2, 2),
            &Resize {
                width: 100_000,
                height: 100_000,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_right_angle_rotations() {
        let img = image(4, 2);
        assert_eq!(ImageGeometry::rotate(&img, &rotate(90.0)).unwrap().dimensions(), (2, 4));
        assert_eq!(ImageGeometry::rotate(&img, &rotate(180.0)).unwrap().dimensions(), (4, 2));
        assert_eq!(ImageGeometry::rotate(&img, &rotate(-90.0)).unwrap().dimensions(), (2, 4));
        assert_eq!(ImageGeometry::rotate(&img, &rotate(360.0)).unwrap().dimensions(), (4, 2));
    }

    #[test]
    fn test_free_rotation_expands_canvas() {
        let img = image(100, 50);
        let rotated = ImageGeometry::rotate(&img, &rotate(45.0)).unwrap();
        let (width, height) = rotated.dimensions();
        // 100*cos45 + 50*sin45 ~= 106.07
        assert_eq!((width, height), (107, 107));
    }

    #[test]
    fn test_free_rotation_fills_corners_with_background() {
        let img = image(20, 20);
        let spec = Rotate {
            angle: 30.0,
            background: Background {
                r: 255,
                g: 0,
                b: 0,
                alpha: 1.0,
            },
        };
        let rotated = ImageGeometry::rotate(&img, &spec).unwrap().to_rgba8();
        let Rgba([r, _, b, a]) = *rotated.get_pixel(0, 0);
        assert!(r >= 250 && b <= 5 && a >= 250);
    }
}
