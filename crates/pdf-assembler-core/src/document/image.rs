//! Decoding of JPEG and PNG inputs into PDF image XObject data.
//!
//! JPEG data is embedded as-is (`DCTDecode`); only the header is used for
//! dimensions and color space, but the full stream is decoded once so that
//! corrupt files are rejected. PNG data is decoded to 8-bit samples with any
//! alpha channel split out into a soft mask.

use std::io::Cursor;

use image::codecs::jpeg::JpegDecoder;
use image::{DynamicImage, ExtendedColorType, ImageDecoder, ImageFormat};

use crate::error::{Error, Result};
use crate::input::ImageKind;

/// PDF device color space of the image samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
}

impl ColorSpace {
    pub const fn pdf_name(self) -> &'static [u8] {
        match self {
            Self::Gray => b"DeviceGray",
            Self::Rgb => b"DeviceRGB",
            Self::Cmyk => b"DeviceCMYK",
        }
    }

    pub const fn components(self) -> usize {
        match self {
            Self::Gray => 1,
            Self::Rgb => 3,
            Self::Cmyk => 4,
        }
    }
}

/// How the sample data is stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Original JPEG stream
    Dct,
    /// Uncompressed 8-bit samples
    Raw,
}

/// An image ready to be embedded in a PDF page
#[derive(Clone)]
pub struct EmbeddedImage {
    width: u32,
    height: u32,
    color_space: ColorSpace,
    encoding: ImageEncoding,
    data: Vec<u8>,
    soft_mask: Option<Vec<u8>>,
    inverted_samples: bool,
}

impl EmbeddedImage {
    /// Decode an image of the given kind.
    pub fn decode(kind: ImageKind, bytes: &[u8]) -> Result<Self> {
        match kind {
            ImageKind::Jpeg => Self::from_jpeg(bytes),
            ImageKind::Png => Self::from_png(bytes),
            ImageKind::Other => Err(Error::UnsupportedImage(
                "only JPEG and PNG images can be embedded".to_string(),
            )),
        }
    }

    pub fn from_jpeg(bytes: &[u8]) -> Result<Self> {
        let decoder = JpegDecoder::new(Cursor::new(bytes))
            .map_err(|e| Error::ImageDecode(format!("invalid JPEG: {e}")))?;

        let (width, height) = decoder.dimensions();
        let color_space = match decoder.original_color_type() {
            ExtendedColorType::L8 => ColorSpace::Gray,
            ExtendedColorType::Cmyk8 => ColorSpace::Cmyk,
            _ => ColorSpace::Rgb,
        };

        DynamicImage::from_decoder(decoder)
            .map_err(|e| Error::ImageDecode(format!("corrupt JPEG data: {e}")))?;

        Self::checked(Self {
            width,
            height,
            color_space,
            encoding: ImageEncoding::Dct,
            data: bytes.to_vec(),
            soft_mask: None,
            inverted_samples: color_space == ColorSpace::Cmyk && has_adobe_marker(bytes),
        })
    }

    pub fn from_png(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory_with_format(bytes, ImageFormat::Png)
            .map_err(|e| Error::ImageDecode(format!("invalid PNG: {e}")))?;

        let color = img.color();
        let (color_space, data) = if color.has_color() {
            (ColorSpace::Rgb, img.to_rgb8().into_raw())
        } else {
            (ColorSpace::Gray, img.to_luma8().into_raw())
        };

        let soft_mask = color.has_alpha().then(|| {
            img.to_rgba8()
                .into_raw()
                .chunks_exact(4)
                .map(|px| px[3])
                .collect()
        });

        Self::checked(Self {
            width: img.width(),
            height: img.height(),
            color_space,
            encoding: ImageEncoding::Raw,
            data,
            soft_mask,
            inverted_samples: false,
        })
    }

    fn checked(image: Self) -> Result<Self> {
        if image.width == 0 || image.height == 0 {
            return Err(Error::ImageDecode(format!(
                "image has empty dimensions {}x{}",
                image.width, image.height
            )));
        }
        Ok(image)
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn color_space(&self) -> ColorSpace {
        self.color_space
    }

    pub const fn encoding(&self) -> ImageEncoding {
        self.encoding
    }

    /// Whether the stored samples are inverted (Photoshop-style CMYK JPEG)
    pub const fn inverted_samples(&self) -> bool {
        self.inverted_samples
    }

    pub fn has_soft_mask(&self) -> bool {
        self.soft_mask.is_some()
    }

    /// Split into sample data and optional soft mask
    pub fn into_parts(self) -> (Vec<u8>, Option<Vec<u8>>) {
        (self.data, self.soft_mask)
    }
}

impl std::fmt::Debug for EmbeddedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("color_space", &self.color_space)
            .field("encoding", &self.encoding)
            .field("data_len", &self.data.len())
            .field("soft_mask", &self.soft_mask.is_some())
            .field("inverted_samples", &self.inverted_samples)
            .finish()
    }
}

/// APP14 segment marker
const APP14: u8 = 0xEE;
/// Start of scan; header segments end here
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

/// Whether the JPEG header carries an Adobe APP14 segment.
///
/// Adobe applications write CMYK JPEGs with inverted samples and mark them
/// with this segment; other CMYK JPEGs store samples as-is.
pub fn has_adobe_marker(bytes: &[u8]) -> bool {
    if !bytes.starts_with(&[0xFF, 0xD8]) {
        return false;
    }

    let mut pos = 2;
    while pos + 4 <= bytes.len() {
        if bytes[pos] != 0xFF {
            return false;
        }
        let marker = bytes[pos + 1];
        // Fill bytes before a marker
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        if marker == SOS || marker == EOI {
            return false;
        }

        let length = usize::from(u16::from_be_bytes([bytes[pos + 2], bytes[pos + 3]]));
        if length < 2 {
            return false;
        }
        let payload_start = pos + 4;
        let payload_end = (pos + 2 + length).min(bytes.len());
        if marker == APP14 && bytes[payload_start..payload_end].starts_with(b"Adobe") {
            return true;
        }
        pos += 2 + length;
    }

    false
}
