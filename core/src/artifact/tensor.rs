//! Binary container for the frame artifact.
//!
//! Layout: magic `BHTN`, version byte, sample type byte, rank byte (2 or 3),
//! `rank` little-endian `u32` dimensions, then the row-major payload.

use crate::artifact::atomic::write_atomic;
use crate::prelude::{ArtifactError, ArtifactResult, Frame};
use ndarray::{ArrayView, Dimension};
use std::fs;
use std::path::Path;

const MAGIC: &[u8; 4] = b"BHTN";
const VERSION: u8 = 1;
const HEADER_LEN: usize = 7;
const MAX_CHANNELS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleType {
    U8 = 0,
    F32 = 1,
    F64 = 2,
}

impl SampleType {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(SampleType::U8),
            1 => Some(SampleType::F32),
            2 => Some(SampleType::F64),
            _ => None,
        }
    }

    fn width(self) -> usize {
        match self {
            SampleType::U8 => 1,
            SampleType::F32 => 4,
            SampleType::F64 => 8,
        }
    }
}

/// Element types a producer may store in the frame artifact.
pub trait Sample: Copy {
    const TYPE: SampleType;
    fn extend_le(self, out: &mut Vec<u8>);
}

impl Sample for u8 {
    const TYPE: SampleType = SampleType::U8;
    fn extend_le(self, out: &mut Vec<u8>) {
        out.push(self);
    }
}

impl Sample for f32 {
    const TYPE: SampleType = SampleType::F32;
    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

impl Sample for f64 {
    const TYPE: SampleType = SampleType::F64;
    fn extend_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}

/// Serializes a 2-D or 3-D tensor into the artifact layout.
pub fn encode_tensor<T: Sample, D: Dimension>(
    tensor: ArrayView<'_, T, D>,
) -> ArtifactResult<Vec<u8>> {
    let shape = tensor.shape().to_vec();
    if !(2..=3).contains(&shape.len()) || shape.iter().any(|&dim| u32::try_from(dim).is_err()) {
        return Err(ArtifactError::Shape(shape));
    }

    let payload_len = tensor.len() * T::TYPE.width();
    let mut out = Vec::with_capacity(HEADER_LEN + shape.len() * 4 + payload_len);
    out.extend_from_slice(MAGIC);
    out.push(VERSION);
    out.push(T::TYPE as u8);
    out.push(shape.len() as u8);
    for dim in &shape {
        out.extend_from_slice(&(*dim as u32).to_le_bytes());
    }
    // `iter` walks in logical row-major order regardless of memory layout.
    for &value in tensor.iter() {
        value.extend_le(&mut out);
    }
    Ok(out)
}

/// Decodes artifact bytes into an 8-bit frame.
///
/// Float samples are cast with Rust's saturating `as` conversion: values are
/// truncated toward zero, clamped to `0..=255`, and NaN becomes 0.
pub fn decode_frame(bytes: &[u8], path: &Path) -> ArtifactResult<Frame> {
    let malformed = |reason: String| ArtifactError::decode(path, reason);

    if bytes.len() < HEADER_LEN {
        return Err(malformed(format!("truncated header ({} bytes)", bytes.len())));
    }
    if &bytes[..4] != MAGIC {
        return Err(malformed("bad magic".into()));
    }
    if bytes[4] != VERSION {
        return Err(malformed(format!("unsupported version {}", bytes[4])));
    }
    let sample = SampleType::from_tag(bytes[5])
        .ok_or_else(|| malformed(format!("unknown sample type {}", bytes[5])))?;
    let rank = bytes[6] as usize;
    if !(2..=3).contains(&rank) {
        return Err(malformed(format!("unsupported rank {}", rank)));
    }

    let dims_end = HEADER_LEN + rank * 4;
    if bytes.len() < dims_end {
        return Err(malformed("truncated dimensions".into()));
    }
    let dims: Vec<usize> = bytes[HEADER_LEN..dims_end]
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize)
        .collect();

    let (height, width, channels) = match dims.as_slice() {
        [h, w] => (*h, *w, 1),
        [h, w, c] => (*h, *w, *c),
        _ => unreachable!("rank checked above"),
    };
    if height == 0 || width == 0 {
        return Err(malformed(format!("empty frame {:?}", dims)));
    }
    if channels == 0 || channels > MAX_CHANNELS {
        return Err(malformed(format!("unsupported channel count {}", channels)));
    }

    let count = height
        .checked_mul(width)
        .and_then(|n| n.checked_mul(channels))
        .ok_or_else(|| malformed(format!("dimensions overflow {:?}", dims)))?;
    let payload = &bytes[dims_end..];
    let expected = count
        .checked_mul(sample.width())
        .ok_or_else(|| malformed(format!("dimensions overflow {:?}", dims)))?;
    if payload.len() != expected {
        return Err(malformed(format!(
            "payload is {} bytes, expected {}",
            payload.len(),
            expected
        )));
    }

    let samples: Vec<u8> = match sample {
        SampleType::U8 => payload.to_vec(),
        SampleType::F32 => payload
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]) as u8)
            .collect(),
        SampleType::F64 => payload
            .chunks_exact(8)
            .map(|c| f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as u8)
            .collect(),
    };

    Frame::from_shape_vec((height, width, channels), samples)
        .map_err(|err| malformed(format!("shape mismatch: {}", err)))
}

/// Reads and decodes the frame artifact at `path`.
pub fn read_frame_artifact(path: &Path) -> ArtifactResult<Frame> {
    let bytes = fs::read(path).map_err(|err| ArtifactError::from_io(path, err))?;
    decode_frame(&bytes, path)
}

/// Atomically writes `tensor` as the frame artifact at `path`.
pub fn write_frame_artifact<T: Sample, D: Dimension>(
    path: &Path,
    tensor: ArrayView<'_, T, D>,
) -> ArtifactResult<()> {
    let bytes = encode_tensor(tensor)?;
    write_atomic(path, &bytes)
}
