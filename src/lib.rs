//! xbm-anim - XBM bitmap packing and animation tables for small OLEDs.
//!
//! Converts binarized frames into the byte layout `u8g2.drawXBMP()` expects
//! and bundles them into named animation sequences rendered as C source that
//! firmware can step through.
//!
//! # Architecture
//!
//! - `schema`: Configuration and project manifest types
//! - `bitmap`: Pixel grids and XBM packing
//! - `animation`: Frame registry, sequence assembly, playback contract
//! - `emit`: C source generation and C array parsing
//! - `pipeline`: A complete conversion run
//!
//! # Example
//!
//! ```rust
//! use xbm_anim::{
//!     animation::SequenceOptions,
//!     bitmap::PixelGrid,
//!     pipeline::ConversionRun,
//!     schema::ConversionConfig,
//! };
//!
//! let config = ConversionConfig {
//!     default_sequence: Some("idle".to_string()),
//!     ..Default::default()
//! };
//! let mut run = ConversionRun::new(config).unwrap();
//!
//! // Three poses played as a ping-pong loop.
//! let poses: Vec<PixelGrid> = (0..3)
//!     .map(|i| PixelGrid::from_fn(128, 64, |x, y| x / 8 == i && y < 8))
//!     .collect();
//! let frames = vec![
//!     poses[0].clone(),
//!     poses[1].clone(),
//!     poses[2].clone(),
//!     poses[1].clone(),
//! ];
//! run.add_sequence("idle", &frames, SequenceOptions::default()).unwrap();
//!
//! let artifact = run.finish().unwrap();
//! assert!(artifact.source.contains("Animation anim_idle"));
//! ```

pub mod animation;
pub mod bitmap;
pub mod emit;
pub mod pipeline;
pub mod schema;

// Re-export commonly used types
pub use animation::{AnimationTable, FrameRegistry, Sequence};
pub use bitmap::{PackedFrame, PixelGrid, pack, unpack};
pub use pipeline::{Artifact, ConversionRun, convert_project};
pub use schema::{ConversionConfig, Polarity, Project};
