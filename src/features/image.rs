//! Chest image feature extraction for the COVID flow.
//!
//! Decode → single-channel grayscale → resample to 28×28 → flatten row-major.
//! Intensities stay in 0..=255; any normalisation belongs to the fitted scaler.
//!
//! Grayscale uses the ITU-R 601-2 integer luma transform
//! (`(R*19595 + G*38470 + B*7471 + 0x8000) >> 16`), matching the imaging
//! library the training pipeline used. 16-bit grayscale clips at 255 as that
//! library does; 16-bit grayscale with alpha is rescaled by 1/257 instead.
//!
//! The resampling filter is configurable and defaults to Catmull-Rom bicubic;
//! a filter that differs from the one used at training time shifts pixel
//! values and may degrade predictions silently.

use std::fmt;
use std::str::FromStr;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GrayImage, Luma};
use serde::{Deserialize, Serialize};

use crate::common::error::{PredictError, PredictResult};

use super::domain::FeatureVector;

/// Side length of the resampled image.
pub const IMAGE_SIDE: u32 = 28;

/// Number of features produced per image.
pub const IMAGE_FEATURES: usize = (IMAGE_SIDE * IMAGE_SIDE) as usize;

/// Resampling filter applied when shrinking or enlarging to 28×28.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    Triangle,
    #[default]
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ResizeFilter {
    fn filter_type(self) -> FilterType {
        match self {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeFilter::Nearest => "nearest",
            ResizeFilter::Triangle => "triangle",
            ResizeFilter::CatmullRom => "catmullrom",
            ResizeFilter::Gaussian => "gaussian",
            ResizeFilter::Lanczos3 => "lanczos3",
        }
    }
}

impl fmt::Display for ResizeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResizeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "nearest" => Ok(ResizeFilter::Nearest),
            "triangle" => Ok(ResizeFilter::Triangle),
            "catmullrom" | "bicubic" => Ok(ResizeFilter::CatmullRom),
            "gaussian" => Ok(ResizeFilter::Gaussian),
            "lanczos3" | "lanczos" => Ok(ResizeFilter::Lanczos3),
            other => Err(format!("unknown resize filter '{other}'")),
        }
    }
}

/// Decode uploaded bytes. Only PNG and JPEG decoders are compiled in.
pub fn decode(bytes: &[u8]) -> PredictResult<DynamicImage> {
    image::load_from_memory(bytes).map_err(PredictError::ImageDecode)
}

/// Single-channel 8-bit grayscale view of any decoded image.
pub fn grayscale(img: &DynamicImage) -> GrayImage {
    match img {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        // 16-bit samples clip at 255 rather than rescale.
        DynamicImage::ImageLuma16(deep) => GrayImage::from_fn(deep.width(), deep.height(), |x, y| {
            Luma([deep.get_pixel(x, y).0[0].min(255) as u8])
        }),
        DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => img.to_luma8(),
        _ => {
            let rgb = img.to_rgb8();
            GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
                let [r, g, b] = rgb.get_pixel(x, y).0;
                let l = (u32::from(r) * 19_595 + u32::from(g) * 38_470 + u32::from(b) * 7_471
                    + 0x8000)
                    >> 16;
                Luma([l as u8])
            })
        }
    }
}

/// Turn a decoded image into the 784-value feature vector.
pub fn extract(img: &DynamicImage, filter: ResizeFilter) -> FeatureVector {
    let gray = grayscale(img);
    let small = imageops::resize(&gray, IMAGE_SIDE, IMAGE_SIDE, filter.filter_type());
    FeatureVector::new(small.into_raw().into_iter().map(f64::from).collect())
}

/// Decode and extract in one step.
pub fn extract_bytes(bytes: &[u8], filter: ResizeFilter) -> PredictResult<FeatureVector> {
    let img = decode(bytes)?;
    Ok(extract(&img, filter))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageBuffer, ImageFormat, Rgb, RgbImage};

    use super::*;

    fn png_bytes(img: &DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn black_image_yields_zero_vector() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(100, 100, Rgb([0, 0, 0])));
        let v = extract_bytes(&png_bytes(&img), ResizeFilter::default()).unwrap();
        assert_eq!(v.len(), IMAGE_FEATURES);
        assert!(v.as_slice().iter().all(|&p| p == 0.0));
    }

    #[test]
    fn luma_transform_matches_reference_weights() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        }));
        let gray = grayscale(&img);
        assert_eq!(gray.get_pixel(0, 0).0, [76]);
        assert_eq!(gray.get_pixel(1, 0).0, [150]);
        assert_eq!(gray.get_pixel(2, 0).0, [29]);
    }

    #[test]
    fn sixteen_bit_gray_clips_instead_of_rescaling() {
        let deep = ImageBuffer::<Luma<u16>, Vec<u16>>::from_fn(3, 1, |x, _| match x {
            0 => Luma([100]),
            1 => Luma([255]),
            _ => Luma([1000]),
        });
        let gray = grayscale(&DynamicImage::ImageLuma16(deep));
        assert_eq!(gray.get_pixel(0, 0).0, [100]);
        assert_eq!(gray.get_pixel(1, 0).0, [255]);
        assert_eq!(gray.get_pixel(2, 0).0, [255]);
    }

    #[test]
    fn flattening_is_row_major() {
        let img = DynamicImage::ImageLuma8(GrayImage::from_fn(IMAGE_SIDE, IMAGE_SIDE, |x, y| {
            Luma([if y == 0 && x == 1 { 200 } else { 0 }])
        }));
        let v = extract(&img, ResizeFilter::Nearest);
        assert_eq!(v.as_slice()[1], 200.0);
        assert_eq!(v.as_slice()[IMAGE_SIDE as usize], 0.0);
    }

    #[test]
    fn white_image_stays_at_full_intensity() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(57, 31, Rgb([255, 255, 255])));
        let v = extract(&img, ResizeFilter::CatmullRom);
        assert!(v.as_slice().iter().all(|&p| p == 255.0));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = extract_bytes(b"definitely not an image", ResizeFilter::default()).unwrap_err();
        assert!(matches!(err, PredictError::ImageDecode(_)));
        assert_eq!(err.code(), crate::common::error::PredictCode::ImageDecode);
    }

    #[test]
    fn filter_names_parse() {
        assert_eq!("CatmullRom".parse::<ResizeFilter>(), Ok(ResizeFilter::CatmullRom));
        assert_eq!("lanczos3".parse::<ResizeFilter>(), Ok(ResizeFilter::Lanczos3));
        assert!("box".parse::<ResizeFilter>().is_err());
        assert_eq!(ResizeFilter::Triangle.to_string(), "triangle");
    }
}
