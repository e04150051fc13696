use async_trait::async_trait;
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat};
use std::io::{Cursor, ErrorKind};
use std::path::{Path, PathBuf};

use super::{ImageRequest, LoadError, Loader};

/// Loads source images from a directory on disk and encodes the result as PNG.
pub struct FileImageLoader {
    root: PathBuf,
}

impl FileImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn source_path(&self, file_name: &str) -> Result<PathBuf, LoadError> {
        if file_name.is_empty() || file_name == "." || file_name == ".." || file_name.contains('/')
        {
            return Err(LoadError::SourceNotFound(file_name.to_string()));
        }
        Ok(self.root.join(file_name))
    }
}

#[async_trait]
impl Loader for FileImageLoader {
    async fn load(&self, request: &ImageRequest) -> Result<Bytes, LoadError> {
        let path = self.source_path(&request.file_name)?;
        let (width, height) = (request.width, request.height);

        tracing::debug!("Reading image from disk: {}", path.display());

        let encoded = tokio::task::spawn_blocking(move || render(&path, width, height))
            .await
            .map_err(|e| LoadError::Decode(format!("image worker failed: {}", e)))??;

        Ok(Bytes::from(encoded))
    }
}

fn render(path: &Path, width: u32, height: u32) -> Result<Vec<u8>, LoadError> {
    let img = image::open(path).map_err(|e| match e {
        ImageError::IoError(io) if io.kind() == ErrorKind::NotFound => {
            LoadError::SourceNotFound(path.display().to_string())
        }
        other => LoadError::Decode(other.to_string()),
    })?;

    let img = if width > 0 || height > 0 {
        resize(img, width, height)
    } else {
        img
    };

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| LoadError::Encode(e.to_string()))?;

    Ok(buf.into_inner())
}

fn resize(img: DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (w, h) = target_dimensions(img.width(), img.height(), width, height);
    img.resize_exact(w, h, FilterType::Triangle)
}

/// A zero target dimension is derived from the other one, keeping the source aspect ratio.
pub(crate) fn target_dimensions(src_w: u32, src_h: u32, width: u32, height: u32) -> (u32, u32) {
    if src_w == 0 || src_h == 0 {
        return (width.max(1), height.max(1));
    }

    let scaled = |num: u32, src_num: u32, src_den: u32| -> u32 {
        let value = (num as f64 * src_num as f64 / src_den as f64).round() as u32;
        value.max(1)
    };

    match (width, height) {
        (0, h) => (scaled(h, src_w, src_h), h),
        (w, 0) => (w, scaled(w, src_h, src_w)),
        (w, h) => (w, h),
    }
}
