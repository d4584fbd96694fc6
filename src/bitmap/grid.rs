//! Binarized pixel surface fed to the packer.

/// Row-major boolean pixel grid. `true` is a white source pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: usize,
    height: usize,
    pixels: Vec<bool>,
}

impl PixelGrid {
    /// All-black grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![false; width * height],
        }
    }

    /// Build from a row-major pixel vector.
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<bool>) -> Result<Self, GridError> {
        if pixels.len() != width * height {
            return Err(GridError::LengthMismatch {
                expected: width * height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build by evaluating `f(x, y)` for every pixel.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Threshold an 8-bit luma buffer.
    ///
    /// With `invert` the luma is flipped (`255 - v`) first; afterwards
    /// `v >= threshold` counts as white.
    pub fn from_luma(
        width: usize,
        height: usize,
        luma: &[u8],
        threshold: u8,
        invert: bool,
    ) -> Result<Self, GridError> {
        if luma.len() != width * height {
            return Err(GridError::LengthMismatch {
                expected: width * height,
                actual: luma.len(),
            });
        }
        let pixels = luma
            .iter()
            .map(|&v| {
                let v = if invert { 255 - v } else { v };
                v >= threshold
            })
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Parse text rows, `#` is white and anything else black.
    ///
    /// ```
    /// use xbm_anim::bitmap::PixelGrid;
    ///
    /// let grid = PixelGrid::from_rows(&["#.......", "........"]).unwrap();
    /// assert!(grid.get(0, 0));
    /// assert!(!grid.get(1, 0));
    /// ```
    pub fn from_rows(rows: &[&str]) -> Result<Self, GridError> {
        let width = rows.first().map(|r| r.chars().count()).unwrap_or(0);
        let mut pixels = Vec::with_capacity(width * rows.len());
        for (y, row) in rows.iter().enumerate() {
            let len = row.chars().count();
            if len != width {
                return Err(GridError::RaggedRow {
                    row: y,
                    expected: width,
                    actual: len,
                });
            }
            pixels.extend(row.chars().map(|c| c == '#'));
        }
        Ok(Self {
            width,
            height: rows.len(),
            pixels,
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

    /// Pixel at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.pixels[y * self.width + x]
    }

    /// Set pixel at `(x, y)`. Panics when out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, white: bool) {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        self.pixels[y * self.width + x] = white;
    }

    /// Row `y` as a slice.
    #[inline]
    pub fn row(&self, y: usize) -> &[bool] {
        &self.pixels[y * self.width..(y + 1) * self.width]
    }

    pub fn pixels(&self) -> &[bool] {
        &self.pixels
    }

    /// Number of white pixels.
    pub fn count_white(&self) -> usize {
        self.pixels.iter().filter(|&&p| p).count()
    }
}

/// Grid construction errors.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("Expected {expected} pixels, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Row {row} has {actual} pixels, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
}
