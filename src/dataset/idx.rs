//! Reader for the IDX format used by MNIST and Fashion-MNIST.
//!
//! ## Layout
//!
//! ```text
//! +----------------------------+
//! | 0x00 0x00 | dtype | ndims  |  magic (4 bytes, big endian)
//! +----------------------------+
//! | dim 0 (u32 BE)             |
//! | ...                        |
//! | dim ndims-1 (u32 BE)       |
//! +----------------------------+
//! | payload (row-major bytes)  |
//! +----------------------------+
//! ```
//!
//! Image files carry magic 2051 (`u8`, 3 dims), label files magic 2049
//! (`u8`, 1 dim). Only unsigned-byte payloads are supported.

use crate::dataset::{DatasetType, Sample};
use crate::error::{KohonenError, Result};
use log::{info, warn};
use std::path::Path;

/// Magic number of an IDX image file.
pub const IMAGES_MAGIC: u32 = 0x0000_0803;

/// Magic number of an IDX label file.
pub const LABELS_MAGIC: u32 = 0x0000_0801;

const DTYPE_U8: u8 = 0x08;

/// Parsed IDX header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdxHeader {
    /// Raw magic number.
    pub magic: u32,
    /// Dimension sizes, outermost first.
    pub dims: Vec<usize>,
}

impl IdxHeader {
    /// Reads a header from the start of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 {
            return Err(KohonenError::InvalidFormat("IDX header too short".to_string()));
        }
        if bytes[0] != 0 || bytes[1] != 0 {
            return Err(KohonenError::InvalidFormat(
                "Invalid IDX magic number".to_string(),
            ));
        }
        if bytes[2] != DTYPE_U8 {
            return Err(KohonenError::InvalidFormat(format!(
                "Unsupported IDX element type 0x{:02x}",
                bytes[2]
            )));
        }

        let ndims = bytes[3] as usize;
        let header_len = 4 + ndims * 4;
        if bytes.len() < header_len {
            return Err(KohonenError::InvalidFormat(format!(
                "IDX header declares {} dimensions but file is {} bytes",
                ndims,
                bytes.len()
            )));
        }

        let magic = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let dims = (0..ndims)
            .map(|d| {
                let o = 4 + d * 4;
                u32::from_be_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]) as usize
            })
            .collect();

        Ok(Self { magic, dims })
    }

    /// Size of the header in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        4 + self.dims.len() * 4
    }

    /// Always false; a header has at least the magic number.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of payload elements the header declares.
    pub fn payload_len(&self) -> Result<usize> {
        checked_product(&self.dims)
    }

    /// Number of items (the outermost dimension).
    pub fn count(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    /// Number of elements in one item.
    pub fn item_len(&self) -> Result<usize> {
        checked_product(self.dims.get(1..).unwrap_or(&[]))
    }
}

fn checked_product(dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| {
            KohonenError::InvalidFormat(format!("IDX dimensions {:?} overflow", dims))
        })
}

fn check_payload(header: &IdxHeader, bytes: &[u8], count: usize) -> Result<()> {
    let needed = count
        .checked_mul(header.item_len()?)
        .and_then(|n| n.checked_add(header.len()))
        .ok_or_else(|| {
            KohonenError::InvalidFormat(format!("IDX dimensions {:?} overflow", header.dims))
        })?;
    if bytes.len() < needed {
        return Err(KohonenError::InvalidFormat(format!(
            "IDX payload truncated: need {} bytes, have {}",
            needed,
            bytes.len()
        )));
    }
    Ok(())
}

fn clamp_count(available: usize, max_samples: Option<usize>) -> usize {
    match max_samples {
        Some(max) if max < available => max,
        _ => available,
    }
}

/// Parses an IDX image buffer into normalized pixel vectors.
pub fn parse_idx_images(bytes: &[u8], max_samples: Option<usize>) -> Result<Vec<Vec<f32>>> {
    let header = IdxHeader::from_bytes(bytes)?;
    if header.magic != IMAGES_MAGIC {
        return Err(KohonenError::InvalidFormat(format!(
            "Expected image magic {}, found {}",
            IMAGES_MAGIC, header.magic
        )));
    }

    let count = clamp_count(header.count(), max_samples);
    check_payload(&header, bytes, count)?;

    let item_len = header.item_len()?;
    let payload = &bytes[header.len()..];
    let images = payload
        .chunks_exact(item_len.max(1))
        .take(count)
        .map(|chunk| chunk.iter().map(|&p| p as f32 / 255.0).collect())
        .collect();

    Ok(images)
}

/// Parses an IDX label buffer.
pub fn parse_idx_labels(bytes: &[u8], max_samples: Option<usize>) -> Result<Vec<usize>> {
    let header = IdxHeader::from_bytes(bytes)?;
    if header.magic != LABELS_MAGIC {
        return Err(KohonenError::InvalidFormat(format!(
            "Expected label magic {}, found {}",
            LABELS_MAGIC, header.magic
        )));
    }

    let count = clamp_count(header.count(), max_samples);
    check_payload(&header, bytes, count)?;

    Ok(bytes[header.len()..header.len() + count]
        .iter()
        .map(|&l| l as usize)
        .collect())
}

/// Reads an IDX image file into normalized pixel vectors.
pub fn read_idx_images<P: AsRef<Path>>(
    path: P,
    max_samples: Option<usize>,
) -> Result<Vec<Vec<f32>>> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_idx_images(&bytes, max_samples)
}

/// Reads an IDX label file.
pub fn read_idx_labels<P: AsRef<Path>>(path: P, max_samples: Option<usize>) -> Result<Vec<usize>> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_idx_labels(&bytes, max_samples)
}

/// Loads paired image and label files into samples.
///
/// When the two files disagree on the item count, the shorter one wins.
pub fn load_idx_dataset<P: AsRef<Path>, Q: AsRef<Path>>(
    images_path: P,
    labels_path: Q,
    dataset_type: DatasetType,
    max_samples: Option<usize>,
) -> Result<Vec<Sample>> {
    let images = read_idx_images(&images_path, max_samples)?;
    let labels = read_idx_labels(&labels_path, max_samples)?;

    if images.len() != labels.len() {
        warn!(
            "{} has {} images but {} has {} labels; using {}",
            images_path.as_ref().display(),
            images.len(),
            labels_path.as_ref().display(),
            labels.len(),
            images.len().min(labels.len())
        );
    }

    let samples: Vec<Sample> = images
        .into_iter()
        .zip(labels)
        .map(|(features, label)| Sample::new(label, features, dataset_type))
        .collect();

    info!(
        "Loaded {} {} samples from {}",
        samples.len(),
        dataset_type.name(),
        images_path.as_ref().display()
    );
    Ok(samples)
}

/// Encodes items as an IDX `u8` buffer. Used to produce fixtures.
pub fn encode_idx(magic: u32, dims: &[usize], payload: &[u8]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(4 + dims.len() * 4 + payload.len());
    bytes.extend_from_slice(&magic.to_be_bytes());
    for &d in dims {
        bytes.extend_from_slice(&(d as u32).to_be_bytes());
    }
    bytes.extend_from_slice(payload);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header() {
        let bytes = encode_idx(IMAGES_MAGIC, &[2, 3, 3], &[0; 18]);
        let header = IdxHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header.magic, 2051);
        assert_eq!(header.dims, vec![2, 3, 3]);
        assert_eq!(header.len(), 16);
        assert_eq!(header.count(), 2);
        assert_eq!(header.item_len().unwrap(), 9);
        assert_eq!(header.payload_len().unwrap(), 18);
    }

    #[test]
    fn test_parse_images_normalizes() {
        let bytes = encode_idx(IMAGES_MAGIC, &[2, 1, 2], &[0, 255, 51, 102]);
        let images = parse_idx_images(&bytes, None).unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0], vec![0.0, 1.0]);
        assert!((images[1][0] - 0.2).abs() < 1e-6);
        assert!((images[1][1] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_max_samples() {
        let bytes = encode_idx(LABELS_MAGIC, &[4], &[3, 1, 4, 1]);
        assert_eq!(parse_idx_labels(&bytes, Some(2)).unwrap(), vec![3, 1]);
        assert_eq!(parse_idx_labels(&bytes, Some(10)).unwrap().len(), 4);
    }

    #[test]
    fn test_wrong_magic() {
        let bytes = encode_idx(LABELS_MAGIC, &[1], &[0]);
        assert!(matches!(
            parse_idx_images(&bytes, None),
            Err(KohonenError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_unsupported_dtype() {
        let bytes = encode_idx(0x0000_0D03, &[1, 1, 1], &[0, 0, 0, 0]);
        assert!(IdxHeader::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_header_size_overflow() {
        let huge = u32::MAX as usize;
        let bytes = encode_idx(IMAGES_MAGIC, &[huge, huge, huge], &[0; 8]);
        assert!(matches!(
            parse_idx_images(&bytes, None),
            Err(KohonenError::InvalidFormat(_))
        ));
        assert!(IdxHeader::from_bytes(&bytes).unwrap().payload_len().is_err());

        // Item size fits but count * item size does not.
        let bytes = encode_idx(IMAGES_MAGIC, &[huge, 1 << 16, 1 << 16], &[0; 8]);
        assert!(matches!(
            parse_idx_images(&bytes, None),
            Err(KohonenError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let bytes = encode_idx(IMAGES_MAGIC, &[3, 2, 2], &[0; 8]);
        assert!(matches!(
            parse_idx_images(&bytes, None),
            Err(KohonenError::InvalidFormat(_))
        ));
    }
}
