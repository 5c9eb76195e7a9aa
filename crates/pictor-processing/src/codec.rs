//! Decoding, encoding and format bookkeeping.

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use pictor_core::models::ImageInfo;
use std::io::Cursor;

use crate::{TransformError, TransformResult};

/// Decode with content sniffing. The detected format is returned alongside
/// the pixels.
pub fn decode(data: &[u8]) -> TransformResult<(DynamicImage, Option<ImageFormat>)> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| TransformError::Decode(e.to_string()))?;
    let format = reader.format();
    let img = reader
        .decode()
        .map_err(|e| TransformError::Decode(e.to_string()))?;
    Ok((img, format))
}

/// Outputs keep the source format when we can write it, PNG otherwise.
pub fn output_format(source: Option<ImageFormat>) -> ImageFormat {
    match source {
        Some(
            format @ (ImageFormat::Jpeg
            | ImageFormat::Png
            | ImageFormat::Gif
            | ImageFormat::WebP
            | ImageFormat::Bmp
            | ImageFormat::Tiff),
        ) => format,
        _ => ImageFormat::Png,
    }
}

pub fn format_name(format: ImageFormat) -> String {
    match format {
        ImageFormat::Jpeg => "jpeg".to_string(),
        ImageFormat::Png => "png".to_string(),
        ImageFormat::Gif => "gif".to_string(),
        ImageFormat::WebP => "webp".to_string(),
        ImageFormat::Bmp => "bmp".to_string(),
        ImageFormat::Tiff => "tiff".to_string(),
        other => format!("{:?}", other).to_lowercase(),
    }
}

/// Convert pixels into a layout the target encoder accepts.
fn prepare(img: DynamicImage, format: ImageFormat) -> DynamicImage {
    match format {
        // JPEG has no alpha channel
        ImageFormat::Jpeg => match img {
            DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
            other if other.color().has_color() => DynamicImage::ImageRgb8(other.to_rgb8()),
            other => DynamicImage::ImageLuma8(other.to_luma8()),
        },
        ImageFormat::Png => match img {
            DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => {
                DynamicImage::ImageRgba8(img.to_rgba8())
            }
            other => other,
        },
        _ => match img {
            DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => img,
            other => DynamicImage::ImageRgba8(other.to_rgba8()),
        },
    }
}

pub fn encode(img: DynamicImage, format: ImageFormat) -> TransformResult<(Vec<u8>, ImageInfo)> {
    let img = prepare(img, format);
    let (width, height) = img.dimensions();

    let mut buffer = Vec::with_capacity((width as usize) * (height as usize) * 3);
    img.write_to(&mut Cursor::new(&mut buffer), format)
        .map_err(|e| TransformError::Encode(e.to_string()))?;

    let info = ImageInfo {
        format: format_name(format),
        width,
        height,
        channels: img.color().channel_count(),
        size: buffer.len(),
    };
    Ok((buffer, info))
}

/// Describe an uploaded file. Fails when the bytes are not a decodable image.
pub fn describe(data: &[u8]) -> TransformResult<ImageInfo> {
    let (img, format) = decode(data)?;
    let (width, height) = img.dimensions();
    Ok(ImageInfo {
        format: format
            .map(format_name)
            .unwrap_or_else(|| "unknown".to_string()),
        width,
        height,
        channels: img.color().channel_count(),
        size: data.len(),
    })
}
