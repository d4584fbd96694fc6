//! Bitmap module - Pixel grids and XBM packing.

mod grid;
mod pack;

pub use grid::*;
pub use pack::*;
