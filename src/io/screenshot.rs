use image::{ImageBuffer, Rgba};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("Failed to create output directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Pixel buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    BufferSize {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },
    #[error("Failed to save image to '{path}': {source}")]
    Save {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Writes a top-row-first RGBA8 frame as PNG to `dir/file_name`, creating
/// `dir` if needed.
pub fn save_screenshot<P: AsRef<Path>>(
    dir: P,
    file_name: &str,
    width: usize,
    height: usize,
    rgba: Vec<u8>,
) -> Result<PathBuf, ScreenshotError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| ScreenshotError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let expected = width * height * 4;
    let actual = rgba.len();
    let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_raw(width as u32, height as u32, rgba).ok_or(
            ScreenshotError::BufferSize {
                width,
                height,
                expected,
                actual,
            },
        )?;

    let path = dir.join(file_name);
    img.save(&path).map_err(|source| ScreenshotError::Save {
        path: path.clone(),
        source,
    })?;
    info!("Screenshot saved to {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_the_directory_and_writes_a_png() {
        let dir = std::env::temp_dir().join("refractor-screenshot-test");
        fs::remove_dir_all(&dir).ok();

        let rgba = vec![10, 20, 30, 255, 40, 50, 60, 255];
        let path = save_screenshot(&dir, "frame.png", 2, 1, rgba).unwrap();
        assert_eq!(path, dir.join("frame.png"));

        let loaded = image::open(&path).unwrap().to_rgba8();
        assert_eq!(loaded.get_pixel(1, 0).0, [40, 50, 60, 255]);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn rejects_a_short_buffer() {
        let dir = std::env::temp_dir().join("refractor-screenshot-short");
        let err = save_screenshot(&dir, "bad.png", 4, 4, vec![0; 8]).unwrap_err();
        assert!(matches!(err, ScreenshotError::BufferSize { expected: 64, .. }));
        fs::remove_dir_all(&dir).ok();
    }
}
