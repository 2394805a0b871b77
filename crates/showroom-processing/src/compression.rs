use anyhow::{anyhow, Result};
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use image::{imageops::FilterType, DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;

use showroom_core::models::{CompressedFile, CompressionTarget, OutputFormat, SourceFile};

/// Progress event emitted once per finished photo, in completion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionProgress {
    pub done: usize,
    pub total: usize,
    pub current_name: String,
}

/// A photo that could not be re-encoded and was forwarded unmodified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassthroughFile {
    pub index: usize,
    pub name: String,
    pub reason: String,
}

/// Result of compressing a batch
#[derive(Debug, Clone)]
pub struct CompressionReport {
    /// One entry per input photo, in input order
    pub files: Vec<CompressedFile>,
    pub passthrough: Vec<PassthroughFile>,
}

/// Single-photo compression service
pub struct ImageCompressor;

impl ImageCompressor {
    /// Scale `(width, height)` down to fit inside the bounds, preserving aspect ratio.
    /// Never upscales.
    pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
        if width == 0 || height == 0 || (width <= max_width && height <= max_height) {
            return (width, height);
        }

        let scale = f64::min(
            max_width as f64 / width as f64,
            max_height as f64 / height as f64,
        );
        let new_width = ((width as f64 * scale).round() as u32).clamp(1, max_width);
        let new_height = ((height as f64 * scale).round() as u32).clamp(1, max_height);
        (new_width, new_height)
    }

    /// Decode, downscale and re-encode one photo
    pub fn compress(file: &SourceFile, target: &CompressionTarget) -> Result<CompressedFile> {
        let reader = ImageReader::new(Cursor::new(&file.data[..])).with_guessed_format()?;
        let img = reader.decode()?;

        let (width, height) = img.dimensions();
        let (new_width, new_height) =
            Self::fit_within(width, height, target.max_width, target.max_height);

        let resized = if (new_width, new_height) != (width, height) {
            img.resize_exact(new_width, new_height, FilterType::Lanczos3)
        } else {
            img
        };

        let data = match target.format {
            OutputFormat::Jpeg => Self::compress_jpeg(&resized, target.quality)?,
            OutputFormat::WebP => Self::compress_webp(&resized, target.quality)?,
        };

        tracing::debug!(
            name = %file.name,
            original_bytes = file.data.len(),
            compressed_bytes = data.len(),
            original_dimensions = ?(width, height),
            dimensions = ?(new_width, new_height),
            "Photo compressed"
        );

        Ok(CompressedFile {
            name: replace_extension(&file.name, target.format.extension()),
            content_type: target.format.to_mime_type().to_string(),
            data,
            width: new_width,
            height: new_height,
            passthrough: false,
        })
    }

    /// Map 0.0..=1.0 quality onto the 0..=100 encoder scale
    pub fn encoder_quality(quality: f32) -> f32 {
        (quality.clamp(0.0, 1.0) * 100.0).round()
    }

    /// Compress to JPEG using mozjpeg
    #[cfg(feature = "mozjpeg")]
    fn compress_jpeg(img: &DynamicImage, quality: f32) -> Result<Bytes> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(Self::encoder_quality(quality));
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let mut comp = comp.start_compress(Vec::new())?;
        comp.write_scanlines(&rgb_img)?;
        let jpeg_data = comp.finish()?;

        Ok(Bytes::from(jpeg_data))
    }

    /// Compress to JPEG with the image crate encoder
    #[cfg(not(feature = "mozjpeg"))]
    fn compress_jpeg(img: &DynamicImage, quality: f32) -> Result<Bytes> {
        let rgb_img = img.to_rgb8();
        let mut buffer = Vec::new();

        let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(
            &mut buffer,
            (Self::encoder_quality(quality) as u8).max(1),
        );
        encoder.encode(
            rgb_img.as_raw(),
            rgb_img.width(),
            rgb_img.height(),
            image::ExtendedColorType::Rgb8,
        )?;

        Ok(Bytes::from(buffer))
    }

    /// Compress to WebP
    fn compress_webp(img: &DynamicImage, quality: f32) -> Result<Bytes> {
        let (width, height) = img.dimensions();

        // Convert to RGBA for WebP encoding
        let rgba_img = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder.encode(Self::encoder_quality(quality));
        if webp_data.is_empty() {
            return Err(anyhow!("WebP encoder produced no output"));
        }

        Ok(Bytes::copy_from_slice(&webp_data))
    }
}

/// Compress a batch with at most `target.concurrency` photos in flight.
///
/// Decoding and encoding run on the blocking pool. A photo that fails to compress
/// is passed through unmodified and listed in [`CompressionReport::passthrough`],
/// so the output always has one entry per input, in input order.
pub async fn compress_batch<F>(
    files: Vec<SourceFile>,
    target: &CompressionTarget,
    mut on_progress: F,
) -> CompressionReport
where
    F: FnMut(&CompressionProgress),
{
    let total = files.len();
    let mut slots: Vec<Option<CompressedFile>> = vec![None; total];
    let mut passthrough = Vec::new();
    let mut done = 0;

    let mut results = stream::iter(files.into_iter().enumerate())
        .map(|(index, file)| {
            let target = target.clone();
            async move {
                let source = file.clone();
                let result =
                    tokio::task::spawn_blocking(move || ImageCompressor::compress(&file, &target))
                        .await
                        .map_err(|e| anyhow!("compression task failed: {}", e))
                        .and_then(|r| r);
                (index, source, result)
            }
        })
        .buffer_unordered(target.concurrency.max(1));

    while let Some((index, source, result)) = results.next().await {
        done += 1;
        let current_name = source.name.clone();

        let compressed = match result {
            Ok(compressed) => compressed,
            Err(e) => {
                tracing::warn!(
                    name = %source.name,
                    error = %e,
                    "Photo could not be compressed, uploading original"
                );
                passthrough.push(PassthroughFile {
                    index,
                    name: source.name.clone(),
                    reason: e.to_string(),
                });
                passthrough_file(source)
            }
        };

        on_progress(&CompressionProgress {
            done,
            total,
            current_name,
        });
        slots[index] = Some(compressed);
    }

    passthrough.sort_by_key(|p| p.index);

    CompressionReport {
        files: slots.into_iter().flatten().collect(),
        passthrough,
    }
}

fn passthrough_file(source: SourceFile) -> CompressedFile {
    CompressedFile {
        name: source.name,
        content_type: source.content_type,
        data: source.data,
        width: 0,
        height: 0,
        passthrough: true,
    }
}

fn replace_extension(name: &str, extension: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{}.{}", stem, extension),
        _ => format!("{}.{}", name, extension),
    }
}
