//! Height images and the named image library a plate resolves against.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

pub const FALLBACK_WARNING: &str =
    "Can't find image matching object name, defaulting to first image";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("no images are loaded")]
    Empty,
    #[error("image `{0}` has zero width or height")]
    ZeroSize(String),
    #[error("image `{name}` is {width}x{height} but {len} values were supplied")]
    SizeMismatch {
        name: String,
        width: u32,
        height: u32,
        len: usize,
    },
    #[error("failed to read image `{path}`: {source}")]
    Decode {
        path: String,
        #[source]
        source: ::image::ImageError,
    },
}

/// Grey-level samples in `[0, 1]`, row 0 at the top of the picture.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightImage {
    name: String,
    width: u32,
    height: u32,
    samples: Vec<f32>,
}

impl HeightImage {
    pub fn from_intensity(
        name: impl Into<String>,
        width: u32,
        height: u32,
        samples: Vec<f32>,
    ) -> Result<Self, ImageError> {
        let name = name.into();
        if width == 0 || height == 0 {
            return Err(ImageError::ZeroSize(name));
        }
        if samples.len() != width as usize * height as usize {
            return Err(ImageError::SizeMismatch {
                name,
                width,
                height,
                len: samples.len(),
            });
        }
        Ok(Self {
            name,
            width,
            height,
            samples,
        })
    }

    /// RGBA8 pixels; intensity is the mean of the colour channels.
    pub fn from_rgba8(
        name: impl Into<String>,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> Result<Self, ImageError> {
        let name = name.into();
        if rgba.len() != width as usize * height as usize * 4 {
            return Err(ImageError::SizeMismatch {
                name,
                width,
                height,
                len: rgba.len() / 4,
            });
        }
        let samples = rgba
            .chunks_exact(4)
            .map(|px| (f32::from(px[0]) + f32::from(px[1]) + f32::from(px[2])) / (3.0 * 255.0))
            .collect();
        Self::from_intensity(name, width, height, samples)
    }

    /// Decodes an image file; the library name is the file name.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let decoded = ::image::open(path).map_err(|source| ImageError::Decode {
            path: path.display().to_string(),
            source,
        })?;
        let rgba = decoded.to_rgba8();
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self::from_rgba8(name, rgba.width(), rgba.height(), rgba.as_raw())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name without its final extension.
    #[must_use]
    pub fn stem(&self) -> &str {
        match self.name.rfind('.') {
            Some(dot) if dot > 0 => &self.name[..dot],
            _ => &self.name,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel value with edge clamping.
    #[must_use]
    pub fn pixel(&self, x: i64, y: i64) -> f64 {
        let x = x.clamp(0, i64::from(self.width) - 1) as usize;
        let y = y.clamp(0, i64::from(self.height) - 1) as usize;
        f64::from(self.samples[y * self.width as usize + x])
    }

    /// Bilinear sample at texture coordinate `(u, v)`, `v = 0` at the bottom.
    #[must_use]
    pub fn sample_bilinear(&self, u: f64, v: f64) -> f64 {
        let fx = u * f64::from(self.width) - 0.5;
        let fy = (1.0 - v) * f64::from(self.height) - 0.5;
        self.sample_pixel_space(fx, fy)
    }

    /// Mean of bilinear samples over a `filter` pixel wide box.
    #[must_use]
    pub fn sample_box(&self, u: f64, v: f64, filter: f64) -> f64 {
        let taps = filter.ceil().max(1.0) as usize;
        if taps == 1 {
            return self.sample_bilinear(u, v);
        }
        let fx = u * f64::from(self.width) - 0.5;
        let fy = (1.0 - v) * f64::from(self.height) - 0.5;
        let step = filter / taps as f64;
        let start = -0.5 * filter + 0.5 * step;
        let mut sum = 0.0;
        for j in 0..taps {
            for i in 0..taps {
                sum += self.sample_pixel_space(
                    fx + start + i as f64 * step,
                    fy + start + j as f64 * step,
                );
            }
        }
        sum / (taps * taps) as f64
    }

    fn sample_pixel_space(&self, fx: f64, fy: f64) -> f64 {
        let x0 = fx.floor();
        let y0 = fy.floor();
        let tx = fx - x0;
        let ty = fy - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);
        let top = self.pixel(x0, y0) * (1.0 - tx) + self.pixel(x0 + 1, y0) * tx;
        let bottom = self.pixel(x0, y0 + 1) * (1.0 - tx) + self.pixel(x0 + 1, y0 + 1) * tx;
        top * (1.0 - ty) + bottom * ty
    }
}

/// Result of matching a plate to an image.
#[derive(Debug, Clone)]
pub struct ImageMatch {
    pub image: Arc<HeightImage>,
    /// Set when no name matched and the first image was used instead.
    pub warning: Option<String>,
}

/// Loaded images keyed (and ordered) by name.
#[derive(Debug, Clone, Default)]
pub struct ImageLibrary {
    images: BTreeMap<String, Arc<HeightImage>>,
}

impl ImageLibrary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an image by name.
    pub fn insert(&mut self, image: HeightImage) -> Arc<HeightImage> {
        let image = Arc::new(image);
        self.images.insert(image.name().to_owned(), Arc::clone(&image));
        image
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<HeightImage>> {
        self.images.get(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// First image whose stem prefixes `object_name`, else the first image
    /// with a warning.
    pub fn resolve(&self, object_name: &str) -> Result<ImageMatch, ImageError> {
        if let Some(image) = self
            .images
            .values()
            .find(|image| object_name.starts_with(image.stem()))
        {
            return Ok(ImageMatch {
                image: Arc::clone(image),
                warning: None,
            });
        }
        let first = self.images.values().next().ok_or(ImageError::Empty)?;
        log::warn!("{FALLBACK_WARNING} ({object_name} -> {})", first.name());
        Ok(ImageMatch {
            image: Arc::clone(first),
            warning: Some(FALLBACK_WARNING.to_owned()),
        })
    }
}
