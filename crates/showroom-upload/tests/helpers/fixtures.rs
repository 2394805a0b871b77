use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};
use showroom_core::models::SourceFile;

/// JPEG photo of the given dimensions with a simple gradient
pub fn jpeg_photo(name: &str, width: u32, height: u32) -> SourceFile {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Jpeg)
        .expect("encode fixture");
    SourceFile::new(name, "image/jpeg", buffer)
}

/// Small JPEG photos named `{name}.jpg`
pub fn photos(names: &[&str]) -> Vec<SourceFile> {
    names
        .iter()
        .map(|name| jpeg_photo(&format!("{}.jpg", name), 64, 48))
        .collect()
}

/// Bytes that claim to be a JPEG but do not decode
pub fn corrupt_photo(name: &str) -> SourceFile {
    SourceFile::new(name, "image/jpeg", b"definitely not a jpeg".to_vec())
}
