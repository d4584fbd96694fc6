//! XBM packing as expected by `u8g2.drawXBMP()`.
//!
//! Rows are packed top to bottom, each row split into 8-pixel chunks from the
//! left. Within a chunk the leftmost pixel is bit 0 (LSB), so the pixel at
//! column `8k + c` lands in bit `c` of row byte `k`.

use rayon::prelude::*;

use super::PixelGrid;
use crate::schema::Polarity;

/// A packed monochrome bitmap.
///
/// Equality and hashing cover the dimensions and the bytes only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackedFrame {
    width: usize,
    height: usize,
    bytes: Vec<u8>,
}

impl PackedFrame {
    /// Wrap raw bytes, checking the length against `(width/8) * height`.
    pub fn from_bytes(width: usize, height: usize, bytes: Vec<u8>) -> Result<Self, PackError> {
        check_dimensions(width, height)?;
        let expected = packed_len(width, height);
        if bytes.len() != expected {
            return Err(PackError::LengthMismatch {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            width,
            height,
            bytes,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width / 8
    }

    /// Bit for pixel `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn bit(&self, x: usize, y: usize) -> bool {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let byte = self.bytes[y * self.row_bytes() + x / 8];
        byte & (1 << (x % 8)) != 0
    }

    /// Number of set bits.
    pub fn count_on(&self) -> usize {
        self.bytes.iter().map(|b| b.count_ones() as usize).sum()
    }
}

/// Packed size in bytes for a canvas.
#[inline]
pub fn packed_len(width: usize, height: usize) -> usize {
    (width / 8) * height
}

fn check_dimensions(width: usize, height: usize) -> Result<(), PackError> {
    if width == 0 || height == 0 {
        return Err(PackError::EmptyCanvas { width, height });
    }
    if width % 8 != 0 {
        return Err(PackError::Dimension { width });
    }
    Ok(())
}

/// Pack a grid into XBM bytes.
///
/// ```
/// use xbm_anim::bitmap::{pack, PixelGrid};
/// use xbm_anim::schema::Polarity;
///
/// let mut grid = PixelGrid::new(8, 8);
/// grid.set(0, 0, true);
/// let frame = pack(&grid, Polarity::OnIsWhite).unwrap();
/// assert_eq!(frame.bytes()[0], 0x01);
/// ```
pub fn pack(grid: &PixelGrid, polarity: Polarity) -> Result<PackedFrame, PackError> {
    let (width, height) = (grid.width(), grid.height());
    check_dimensions(width, height)?;

    let mut bytes = Vec::with_capacity(packed_len(width, height));
    for y in 0..height {
        for chunk in grid.row(y).chunks_exact(8) {
            let mut byte = 0u8;
            for (bit, &white) in chunk.iter().enumerate() {
                if polarity.bit_for(white) {
                    byte |= 1 << bit;
                }
            }
            bytes.push(byte);
        }
    }

    Ok(PackedFrame {
        width,
        height,
        bytes,
    })
}

/// Decode packed bytes back into a grid (`true` = white).
pub fn unpack(frame: &PackedFrame, polarity: Polarity) -> PixelGrid {
    // A set bit is white under OnIsWhite, black under OnIsBlack.
    PixelGrid::from_fn(frame.width, frame.height, |x, y| {
        polarity.bit_for(frame.bit(x, y))
    })
}

/// Pack many grids in parallel, preserving input order.
///
/// Fails with the error of the first invalid grid in input order.
pub fn pack_batch(grids: &[PixelGrid], polarity: Polarity) -> Result<Vec<PackedFrame>, PackError> {
    grids
        .par_iter()
        .map(|grid| pack(grid, polarity))
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}

/// Packing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    #[error("Canvas width {width} is not a multiple of 8")]
    Dimension { width: usize },
    #[error("Canvas {width}x{height} has no pixels")]
    EmptyCanvas { width: usize, height: usize },
    #[error("Expected {expected} packed bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}
