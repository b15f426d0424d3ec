// src/image_view.rs
//
// Loading the structure drawing for the image area: decode, resize to the
// fixed display size, hand back straight RGBA bytes.
//

use std::path::Path;

use image::imageops::FilterType;

use crate::error::{PredictError, PredictResult};

/// Decoded image ready to upload as a texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    /// [width, height] in pixels
    pub size: [usize; 2],
    pub rgba: Vec<u8>,
}

/// Load `path` and stretch it to exactly `size` ([width, height]).
pub fn load_display_image(path: &Path, size: [u32; 2]) -> PredictResult<DisplayImage> {
    let img = image::open(path).map_err(|source| PredictError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    let resized = img.resize_exact(size[0], size[1], FilterType::Lanczos3);
    let rgba = resized.to_rgba8();
    Ok(DisplayImage {
        size: [rgba.width() as usize, rgba.height() as usize],
        rgba: rgba.into_raw(),
    })
}
