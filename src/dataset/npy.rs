//! Minimal NumPy `.npy` reader.
//!
//! Supports format versions 1 through 3, C-ordered arrays, and the element
//! types `f4`, `f8`, `i4`, `i8` and `u1` in little-endian (or byte-order
//! agnostic) encoding. Every element is widened or narrowed to `f32`.

use crate::dataset::{DatasetType, Sample};
use crate::error::{KohonenError, Result};
use log::{debug, warn};
use std::path::Path;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Element type declared in an NPY header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpyDtype {
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
    /// 32-bit signed integer.
    I32,
    /// 64-bit signed integer.
    I64,
    /// Unsigned byte.
    U8,
}

impl NpyDtype {
    fn parse(descr: &str) -> Result<Self> {
        if descr.starts_with('>') {
            return Err(KohonenError::InvalidFormat(format!(
                "Big-endian NPY data is not supported: {}",
                descr
            )));
        }
        match descr.trim_start_matches(['<', '|', '=']) {
            "f4" => Ok(NpyDtype::F32),
            "f8" => Ok(NpyDtype::F64),
            "i4" => Ok(NpyDtype::I32),
            "i8" => Ok(NpyDtype::I64),
            "u1" => Ok(NpyDtype::U8),
            _ => Err(KohonenError::InvalidFormat(format!(
                "Unsupported NPY dtype: {}",
                descr
            ))),
        }
    }

    /// Size of one element in bytes.
    pub fn size(&self) -> usize {
        match self {
            NpyDtype::F32 | NpyDtype::I32 => 4,
            NpyDtype::F64 | NpyDtype::I64 => 8,
            NpyDtype::U8 => 1,
        }
    }
}

/// An array loaded from an `.npy` file.
#[derive(Debug, Clone, PartialEq)]
pub struct NpyArray {
    /// Elements in C order.
    pub data: Vec<f32>,
    /// Array shape.
    pub shape: Vec<usize>,
    /// Element type the file stored.
    pub dtype: NpyDtype,
}

impl NpyArray {
    /// Loads an array from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let array = Self::from_bytes(&bytes)?;
        debug!(
            "Loaded NPY {}: shape {:?}, dtype {:?}",
            path.as_ref().display(),
            array.shape,
            array.dtype
        );
        Ok(array)
    }

    /// Parses an array from an in-memory `.npy` image.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 10 || &bytes[0..6] != MAGIC {
            return Err(KohonenError::InvalidFormat(
                "Invalid NPY magic string".to_string(),
            ));
        }

        let major = bytes[6];
        let (header_len, header_start) = match major {
            1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
            2 | 3 => {
                if bytes.len() < 12 {
                    return Err(KohonenError::InvalidFormat("NPY header truncated".to_string()));
                }
                (
                    u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize,
                    12,
                )
            }
            v => {
                return Err(KohonenError::InvalidFormat(format!(
                    "Unsupported NPY version {}",
                    v
                )))
            }
        };

        let data_start = header_start + header_len;
        if bytes.len() < data_start {
            return Err(KohonenError::InvalidFormat("NPY header truncated".to_string()));
        }
        let header = std::str::from_utf8(&bytes[header_start..data_start])
            .map_err(|e| KohonenError::InvalidFormat(format!("NPY header is not UTF-8: {}", e)))?;

        let dtype = NpyDtype::parse(quoted(header_value(header, "descr")?)?)?;

        if header_value(header, "fortran_order")?.starts_with("True") {
            return Err(KohonenError::InvalidFormat(
                "Fortran-ordered NPY arrays are not supported".to_string(),
            ));
        }

        let shape = parse_shape(header_value(header, "shape")?)?;
        let needed = checked_product(&shape)?
            .checked_mul(dtype.size())
            .ok_or_else(|| overflow(&shape))?;
        let payload = &bytes[data_start..];
        if payload.len() < needed {
            return Err(KohonenError::InvalidFormat(format!(
                "NPY payload truncated: need {} bytes, have {}",
                needed,
                payload.len()
            )));
        }

        let data = decode(&payload[..needed], dtype);
        Ok(Self { data, shape, dtype })
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of elements in one row along the leading axis.
    pub fn row_len(&self) -> Result<usize> {
        checked_product(self.shape.get(1..).unwrap_or(&[]))
    }
}

fn overflow(shape: &[usize]) -> KohonenError {
    KohonenError::InvalidFormat(format!("NPY shape {:?} overflows", shape))
}

fn checked_product(dims: &[usize]) -> Result<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| overflow(dims))
}

fn decode(payload: &[u8], dtype: NpyDtype) -> Vec<f32> {
    match dtype {
        NpyDtype::F32 => payload
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
        NpyDtype::F64 => payload
            .chunks_exact(8)
            .map(|b| f64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect(),
        NpyDtype::I32 => payload
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]) as f32)
            .collect(),
        NpyDtype::I64 => payload
            .chunks_exact(8)
            .map(|b| i64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]) as f32)
            .collect(),
        NpyDtype::U8 => payload.iter().map(|&b| b as f32).collect(),
    }
}

/// Returns the raw text following `'key':` in a header dictionary.
fn header_value<'a>(header: &'a str, key: &str) -> Result<&'a str> {
    let pattern = format!("'{}':", key);
    let start = header
        .find(&pattern)
        .ok_or_else(|| KohonenError::InvalidFormat(format!("NPY header has no '{}'", key)))?;
    Ok(header[start + pattern.len()..].trim_start())
}

/// Extracts the leading single-quoted string of a header value.
fn quoted(value: &str) -> Result<&str> {
    let rest = value
        .strip_prefix('\'')
        .ok_or_else(|| KohonenError::InvalidFormat(format!("Expected quoted value: {}", value)))?;
    let end = rest
        .find('\'')
        .ok_or_else(|| KohonenError::InvalidFormat("Unterminated NPY string".to_string()))?;
    Ok(&rest[..end])
}

fn parse_shape(value: &str) -> Result<Vec<usize>> {
    let open = value
        .find('(')
        .ok_or_else(|| KohonenError::InvalidFormat("NPY shape is not a tuple".to_string()))?;
    let close = value[open..]
        .find(')')
        .ok_or_else(|| KohonenError::InvalidFormat("NPY shape is not a tuple".to_string()))?;

    value[open + 1..open + close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>().map_err(|_| {
                KohonenError::InvalidFormat(format!("Bad NPY shape dimension: {}", s))
            })
        })
        .collect()
}

/// Pairs an image array with a label array.
///
/// Each row along the leading axis of `images` becomes one sample. Pixel
/// values are divided by 255 when any of them exceeds 1.
pub fn samples_from_npy(
    images: &NpyArray,
    labels: &NpyArray,
    dataset_type: DatasetType,
) -> Result<Vec<Sample>> {
    let rows = images.shape.first().copied().unwrap_or(0);
    let row_len = images.row_len()?;
    if row_len == 0 {
        return Err(KohonenError::Dataset(format!(
            "Image array has degenerate shape {:?}",
            images.shape
        )));
    }
    if labels.len() != rows {
        warn!(
            "NPY image array has {} rows but label array has {} entries",
            rows,
            labels.len()
        );
    }

    let scale = if images.data.iter().any(|&v| v > 1.0) {
        1.0 / 255.0
    } else {
        1.0
    };

    let samples = images
        .data
        .chunks_exact(row_len)
        .zip(labels.data.iter())
        .map(|(row, &label)| {
            if label < 0.0 {
                return Err(KohonenError::Dataset(format!("Negative label {}", label)));
            }
            Ok(Sample::new(
                label as usize,
                row.iter().map(|&v| v * scale).collect(),
                dataset_type,
            ))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(samples)
}

/// Encodes a version 1 `.npy` image. Used to produce fixtures.
pub fn encode_npy_u8(shape: &[usize], data: &[u8]) -> Vec<u8> {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    let shape_str = if dims.len() == 1 {
        format!("({},)", dims[0])
    } else {
        format!("({})", dims.join(", "))
    };
    let mut header = format!(
        "{{'descr': '|u1', 'fortran_order': False, 'shape': {}, }}",
        shape_str
    );
    // Pad so that the data starts on a 64-byte boundary, header ends with '\n'.
    let unpadded = 10 + header.len() + 1;
    header.push_str(&" ".repeat((64 - unpadded % 64) % 64));
    header.push('\n');

    let mut bytes = Vec::with_capacity(10 + header.len() + data.len());
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&[1, 0]);
    bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
    bytes.extend_from_slice(header.as_bytes());
    bytes.extend_from_slice(data);
    bytes
}
