//! Configuration types for a conversion run.

use serde::{Deserialize, Serialize};

/// Default canvas width (SSD1306-class OLED).
pub const DEFAULT_WIDTH: usize = 128;

/// Default canvas height.
pub const DEFAULT_HEIGHT: usize = 64;

/// Which source colour a set bit stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// A white source pixel sets the bit.
    #[default]
    OnIsWhite,
    /// A black source pixel sets the bit.
    OnIsBlack,
}

impl Polarity {
    /// Resolve a source pixel (`true` = white) to its bit value.
    #[inline]
    pub fn bit_for(self, white: bool) -> bool {
        match self {
            Polarity::OnIsWhite => white,
            Polarity::OnIsBlack => !white,
        }
    }

    /// Name used in the emitted polarity record.
    pub fn label(self) -> &'static str {
        match self {
            Polarity::OnIsWhite => "ON_IS_WHITE",
            Polarity::OnIsBlack => "ON_IS_BLACK",
        }
    }
}

/// What happens when a sequence reaches its last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopMode {
    /// Wrap back to the first frame.
    #[default]
    Loop,
    /// Hand control back to the default sequence.
    OneShot,
}

impl LoopMode {
    #[inline]
    pub fn is_loop(self) -> bool {
        matches!(self, LoopMode::Loop)
    }
}

/// How a sequence groups within the generated firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceRole {
    /// Power-on animation, played once.
    Intro,
    /// Background animation picked while nothing else is requested.
    #[default]
    Idle,
    /// Triggered expression.
    Expression,
}

/// Frame advance timing for a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timing {
    /// Every frame is shown for the same number of milliseconds.
    Interval { ms: u16 },
    /// One duration per frame, in milliseconds.
    PerFrame { ms: Vec<u16> },
}

impl Timing {
    /// Duration of the frame at `cursor`, if defined.
    pub fn duration_of(&self, cursor: usize) -> Option<u16> {
        match self {
            Timing::Interval { ms } => Some(*ms),
            Timing::PerFrame { ms } => ms.get(cursor).copied(),
        }
    }
}

/// Fixed canvas negotiated with the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Width in pixels. Must be a multiple of 8.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl CanvasConfig {
    /// Bytes per packed row.
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.width / 8
    }

    /// Bytes per packed frame.
    #[inline]
    pub fn frame_bytes(&self) -> usize {
        self.row_bytes() * self.height
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.width % 8 != 0 {
            return Err(ConfigError::UnalignedWidth(self.width));
        }
        Ok(())
    }
}

/// Options for the generated C source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitOptions {
    /// Prefix for frame byte arrays (`epd_idle_0`).
    pub array_prefix: String,
    /// Prefix for per-sequence frame pointer tables (`ANIM_IDLE`).
    pub table_prefix: String,
    /// Hex literals per line inside a frame array.
    pub bytes_per_line: usize,
    /// Place tables in flash with `PROGMEM`.
    pub progmem: bool,
    /// Value of `MS_DELAY`, used by sequences without explicit timing.
    pub default_interval_ms: u16,
    /// Headers to `#include` at the top of the artifact.
    pub includes: Vec<String>,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            array_prefix: "epd_".to_string(),
            table_prefix: "ANIM_".to_string(),
            bytes_per_line: 16,
            progmem: true,
            default_interval_ms: 10,
            includes: vec!["Arduino.h".to_string(), "U8g2lib.h".to_string()],
        }
    }
}

impl EmitOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bytes_per_line == 0 {
            return Err(ConfigError::InvalidBytesPerLine);
        }
        if self.default_interval_ms == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        for (field, prefix) in [
            ("array_prefix", &self.array_prefix),
            ("table_prefix", &self.table_prefix),
        ] {
            let valid = !prefix.is_empty()
                && prefix
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
                && !prefix.starts_with(|c: char| c.is_ascii_digit());
            if !valid {
                return Err(ConfigError::InvalidPrefix {
                    field,
                    prefix: prefix.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Top-level configuration of a conversion run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionConfig {
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub polarity: Polarity,
    /// Luma threshold applied by frame loaders (`luma >= threshold` is white).
    #[serde(default = "default_threshold")]
    pub threshold: u8,
    /// Invert luma before thresholding.
    #[serde(default)]
    pub invert: bool,
    /// Reuse an already registered frame when the packed bytes are identical.
    #[serde(default)]
    pub dedupe_frames: bool,
    /// Sequence the runtime starts in and falls back to.
    #[serde(default)]
    pub default_sequence: Option<String>,
    #[serde(default)]
    pub emit: EmitOptions,
}

fn default_threshold() -> u8 {
    128
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            polarity: Polarity::default(),
            threshold: default_threshold(),
            invert: false,
            dedupe_frames: false,
            default_sequence: None,
            emit: EmitOptions::default(),
        }
    }
}

impl ConversionConfig {
    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.canvas.validate()?;
        self.emit.validate()?;
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Canvas dimensions must be non-zero")]
    InvalidDimensions,
    #[error("Canvas width {0} is not a multiple of 8")]
    UnalignedWidth(usize),
    #[error("bytes_per_line must be non-zero")]
    InvalidBytesPerLine,
    #[error("Default interval must be positive")]
    InvalidInterval,
    #[error("{field} {prefix:?} is not a non-empty C identifier prefix")]
    InvalidPrefix { field: &'static str, prefix: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = ConversionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.canvas.frame_bytes(), 1024);
        assert_eq!(config.canvas.row_bytes(), 16);
    }

    #[test]
    fn test_unaligned_canvas_rejected() {
        let canvas = CanvasConfig {
            width: 100,
            height: 64,
        };
        assert!(matches!(
            canvas.validate(),
            Err(ConfigError::UnalignedWidth(100))
        ));
    }

    #[test]
    fn test_bad_prefix_rejected() {
        let options = EmitOptions {
            array_prefix: "9bad-".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidPrefix { field: "array_prefix", .. })
        ));

        // Unprefixed symbols would collide with the lookup names.
        let options = EmitOptions {
            table_prefix: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(ConfigError::InvalidPrefix { field: "table_prefix", .. })
        ));
    }

    #[test]
    fn test_polarity_resolution() {
        assert!(Polarity::OnIsWhite.bit_for(true));
        assert!(!Polarity::OnIsWhite.bit_for(false));
        assert!(Polarity::OnIsBlack.bit_for(false));
        assert!(!Polarity::OnIsBlack.bit_for(true));
    }

    #[test]
    fn test_serialization() {
        let json = r#"{"polarity":"on_is_black","canvas":{"width":64,"height":32}}"#;
        let config: ConversionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.polarity, Polarity::OnIsBlack);
        assert_eq!(config.canvas.width, 64);
        assert_eq!(config.threshold, 128);
        assert_eq!(config.emit, EmitOptions::default());

        let timing: Timing = serde_json::from_str(r#"{"per_frame":{"ms":[10,20]}}"#).unwrap();
        assert_eq!(timing.duration_of(1), Some(20));
        assert_eq!(timing.duration_of(2), None);
    }
}
