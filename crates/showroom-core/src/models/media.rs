use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::constants::BYTES_PER_MB;

/// Common view over raw and compressed photos, used by the batch guard
pub trait MediaFile {
    fn name(&self) -> &str;
    fn content_type(&self) -> &str;
    fn size_bytes(&self) -> u64;

    fn size_mb(&self) -> f64 {
        self.size_bytes() as f64 / BYTES_PER_MB
    }
}

/// A photo as selected by the user, before compression
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}

impl MediaFile for SourceFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

/// A re-encoded photo ready for upload
#[derive(Debug, Clone)]
pub struct CompressedFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
    /// True when the source could not be re-encoded and was passed through unmodified
    pub passthrough: bool,
}

impl MediaFile for CompressedFile {
    fn name(&self) -> &str {
        &self.name
    }

    fn content_type(&self) -> &str {
        &self.content_type
    }

    fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }
}

/// Output encoding for compressed photos
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    WebP,
    Jpeg,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "webp" => Some(OutputFormat::WebP),
            "jpeg" | "jpg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }

    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::WebP => "image/webp",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::WebP => "webp",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

/// Target constraints for one compression run
#[derive(Debug, Clone, PartialEq)]
pub struct CompressionTarget {
    pub max_width: u32,
    pub max_height: u32,
    /// Encoder quality in the range 0.0..=1.0
    pub quality: f32,
    /// Maximum number of photos decoded/encoded at once
    pub concurrency: usize,
    pub format: OutputFormat,
}

impl Default for CompressionTarget {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1080,
            quality: 0.8,
            concurrency: 3,
            format: OutputFormat::WebP,
        }
    }
}

/// Hard limits enforced on a batch before and after compression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeLimits {
    pub max_count: usize,
    pub max_single_mb: f64,
    /// Aggregate ceiling; 0 disables the check
    pub max_total_mb: f64,
}
