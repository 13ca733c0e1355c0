//! Image inspector contract and file-system implementation.
//!
//! Dimensions come from `imagesize`. Channel counts are read from the
//! container header, which `imagesize` does not expose.

use imagesize::ImageType;
use log::debug;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const PNG_COLOR_TYPE_OFFSET: usize = 25;
/// First header read; grown while a JPEG frame header lies beyond it.
const HEADER_PREFIX_BYTES: u64 = 64 * 1024;
const MAX_HEADER_PREFIX_BYTES: u64 = 16 * 1024 * 1024;

pub type InspectResult<T> = Result<T, InspectError>;

/// Pixel geometry of one image file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageShape {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

#[derive(Debug)]
pub enum InspectError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Decode {
        path: PathBuf,
        source: imagesize::ImageError,
    },
    /// Header parsed but its channel layout is unknown or truncated.
    UnsupportedChannels { path: PathBuf, detail: String },
    /// Dimensions do not fit the catalog's integer columns.
    DimensionOverflow { path: PathBuf },
}

impl Display for InspectError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read image `{}`: {source}", path.display())
            }
            Self::Decode { path, source } => {
                write!(f, "failed to decode image `{}`: {source}", path.display())
            }
            Self::UnsupportedChannels { path, detail } => write!(
                f,
                "cannot determine channel count of `{}`: {detail}",
                path.display()
            ),
            Self::DimensionOverflow { path } => {
                write!(f, "image `{}` dimensions exceed u32", path.display())
            }
        }
    }
}

impl Error for InspectError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Decode { source, .. } => Some(source),
            Self::UnsupportedChannels { .. } | Self::DimensionOverflow { .. } => None,
        }
    }
}

/// Supplies image geometry for a path relative to the image mount.
pub trait ImageInspector {
    fn inspect(&self, rel_path: &str) -> InspectResult<ImageShape>;
}

impl<T: ImageInspector + ?Sized> ImageInspector for &T {
    fn inspect(&self, rel_path: &str) -> InspectResult<ImageShape> {
        (**self).inspect(rel_path)
    }
}

/// Reads image headers from a mounted file system.
#[derive(Debug, Clone)]
pub struct FsImageInspector {
    root: PathBuf,
}

impl FsImageInspector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ImageInspector for FsImageInspector {
    fn inspect(&self, rel_path: &str) -> InspectResult<ImageShape> {
        let path = self.root.join(rel_path);
        let decode_err = |source| InspectError::Decode {
            path: path.clone(),
            source,
        };

        let mut limit = HEADER_PREFIX_BYTES;
        let channels = loop {
            let header = read_prefix(&path, limit)?;
            let kind = imagesize::image_type(&header).map_err(decode_err)?;
            match channel_count(kind, &header) {
                Err(_) if header.len() as u64 == limit && limit < MAX_HEADER_PREFIX_BYTES => {
                    limit *= 4;
                }
                result => {
                    break result.map_err(|detail| InspectError::UnsupportedChannels {
                        path: path.clone(),
                        detail,
                    })?;
                }
            }
        };
        let size = imagesize::size(&path).map_err(decode_err)?;

        let (width, height) = match (u32::try_from(size.width), u32::try_from(size.height)) {
            (Ok(width), Ok(height)) => (width, height),
            _ => return Err(InspectError::DimensionOverflow { path }),
        };

        debug!(
            "event=image_inspect module=inspect status=ok width={} height={} channels={}",
            width, height, channels
        );
        Ok(ImageShape {
            width,
            height,
            channels,
        })
    }
}

/// Reads at most `limit` bytes from the start of `path`.
fn read_prefix(path: &Path, limit: u64) -> InspectResult<Vec<u8>> {
    let io_err = |source| InspectError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let mut header = Vec::new();
    file.take(limit).read_to_end(&mut header).map_err(io_err)?;
    Ok(header)
}

/// Reads the channel count from a decoded container header.
pub fn channel_count(kind: ImageType, bytes: &[u8]) -> Result<u32, String> {
    match kind {
        ImageType::Png => png_channels(bytes),
        ImageType::Jpeg => jpeg_channels(bytes),
        other => Err(format!("unsupported image format {other:?}")),
    }
}

fn png_channels(bytes: &[u8]) -> Result<u32, String> {
    let color_type = bytes
        .get(PNG_COLOR_TYPE_OFFSET)
        .ok_or_else(|| "truncated PNG header".to_string())?;
    match color_type {
        0 => Ok(1),
        2 | 3 => Ok(3),
        4 => Ok(2),
        6 => Ok(4),
        other => Err(format!("unknown PNG color type {other}")),
    }
}

fn jpeg_channels(bytes: &[u8]) -> Result<u32, String> {
    // Skip SOI, then walk marker segments until a start-of-frame marker.
    let mut offset = 2;
    while offset + 1 < bytes.len() {
        if bytes[offset] != 0xFF {
            return Err(format!("expected JPEG marker at byte {offset}"));
        }
        let marker = bytes[offset + 1];
        match marker {
            0xFF => {
                offset += 1;
                continue;
            }
            0x01 | 0xD0..=0xD7 => {
                offset += 2;
                continue;
            }
            0xD9 | 0xDA => break,
            _ => {}
        }

        if is_start_of_frame(marker) {
            return bytes
                .get(offset + 9)
                .map(|components| u32::from(*components))
                .ok_or_else(|| "truncated JPEG frame header".to_string());
        }

        let length = match (bytes.get(offset + 2), bytes.get(offset + 3)) {
            (Some(high), Some(low)) => usize::from(u16::from_be_bytes([*high, *low])),
            _ => return Err("truncated JPEG segment".to_string()),
        };
        offset += 2 + length;
    }
    Err("no JPEG frame header found".to_string())
}

fn is_start_of_frame(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}
