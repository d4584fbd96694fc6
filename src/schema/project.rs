//! Project manifest describing every sequence of an animation package.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ConfigError, ConversionConfig, LoopMode, SequenceRole, Timing};

/// Idle animations the stock firmware ships with.
pub const BASE_IDLE: [&str; 5] = ["center", "blink", "look_left", "look_right", "look_up"];

/// Expressions the stock firmware ships with.
pub const BASE_EXPRESSIONS: [&str; 6] = ["happy", "sad", "angry", "tired", "heart", "sleeping"];

/// Complete input for one conversion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    #[serde(default)]
    pub config: ConversionConfig,
    pub sequences: Vec<SequenceSpec>,
}

/// One sequence and the frame images it is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceSpec {
    pub name: String,
    #[serde(default)]
    pub role: SequenceRole,
    #[serde(default)]
    pub mode: LoopMode,
    #[serde(default)]
    pub timing: Option<Timing>,
    /// Frame image paths in playback order.
    pub frames: Vec<PathBuf>,
}

impl Project {
    /// Validate the manifest without touching any frame file.
    pub fn validate(&self) -> Result<(), ProjectError> {
        self.config.validate()?;
        if self.sequences.is_empty() {
            return Err(ProjectError::NoSequences);
        }
        if let Some(default) = &self.config.default_sequence {
            if !self.sequences.iter().any(|s| &s.name == default) {
                return Err(ProjectError::UnknownDefault(default.clone()));
            }
        }
        Ok(())
    }

    /// Resolve a frame path relative to the manifest location.
    pub fn resolve_frame(base_dir: &Path, frame: &Path) -> PathBuf {
        if frame.is_absolute() {
            frame.to_path_buf()
        } else {
            base_dir.join(frame)
        }
    }

    /// Manifest covering the stock intro, idle and expression set.
    pub fn example() -> Self {
        let mut sequences = vec![SequenceSpec {
            name: "intro".to_string(),
            role: SequenceRole::Intro,
            mode: LoopMode::OneShot,
            timing: None,
            frames: example_frames("intro", 3),
        }];

        sequences.extend(BASE_IDLE.iter().map(|name| SequenceSpec {
            name: name.to_string(),
            role: SequenceRole::Idle,
            mode: LoopMode::Loop,
            timing: Some(Timing::Interval { ms: 100 }),
            frames: example_frames(name, 2),
        }));

        sequences.extend(BASE_EXPRESSIONS.iter().map(|name| SequenceSpec {
            name: name.to_string(),
            role: SequenceRole::Expression,
            mode: LoopMode::OneShot,
            timing: None,
            frames: example_frames(name, 2),
        }));

        Self {
            config: ConversionConfig {
                default_sequence: Some("center".to_string()),
                ..Default::default()
            },
            sequences,
        }
    }
}

fn example_frames(name: &str, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| PathBuf::from(format!("{name}/frame_{i:04}.png")))
        .collect()
}

/// Manifest validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Project declares no sequences")]
    NoSequences,
    #[error("Default sequence {0:?} is not declared")]
    UnknownDefault(String),
    #[error("Config validation failed: {0}")]
    Config(#[from] ConfigError),
}
