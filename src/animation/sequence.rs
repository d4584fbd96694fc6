//! Named animation sequences over registry frames.

use std::collections::HashMap;

use log::debug;

use super::registry::{FrameRegistry, sanitize_identifier};
use crate::schema::{LoopMode, SequenceRole, Timing};

/// Per-sequence settings besides name and frames.
#[derive(Debug, Clone, Default)]
pub struct SequenceOptions {
    pub role: SequenceRole,
    pub mode: LoopMode,
    /// `None` falls back to the artifact-wide default interval.
    pub timing: Option<Timing>,
}

/// An ordered list of registry indices with playback metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    name: String,
    frames: Vec<usize>,
    role: SequenceRole,
    mode: LoopMode,
    timing: Option<Timing>,
}

impl Sequence {
    /// Sanitized name, also the stem of every emitted symbol.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registry indices in playback order; repeats allowed.
    pub fn frames(&self) -> &[usize] {
        &self.frames
    }

    /// Always equal to `frames().len()`.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn role(&self) -> SequenceRole {
        self.role
    }

    pub fn mode(&self) -> LoopMode {
        self.mode
    }

    pub fn timing(&self) -> Option<&Timing> {
        self.timing.as_ref()
    }
}

/// All sequences of a run plus a name index.
#[derive(Debug, Default)]
pub struct AnimationTable {
    sequences: Vec<Sequence>,
    by_name: HashMap<String, usize>,
    default_sequence: Option<usize>,
}

impl AnimationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and append a sequence.
    ///
    /// The name is sanitized the same way frame labels are; uniqueness is
    /// checked on the sanitized form. The frame list is kept verbatim.
    pub fn build_sequence(
        &mut self,
        registry: &FrameRegistry,
        name: &str,
        frames: Vec<usize>,
        options: SequenceOptions,
    ) -> Result<&Sequence, AssemblyError> {
        let ident = self.check_candidate(name, frames.len(), options.timing.as_ref())?;
        if let Some(&index) = frames.iter().find(|&&i| !registry.contains(i)) {
            return Err(AssemblyError::UnknownFrame {
                sequence: ident,
                index,
            });
        }

        debug!(
            "Sequence {:?}: {} frames, {:?}, {:?}",
            ident,
            frames.len(),
            options.role,
            options.mode
        );

        let position = self.sequences.len();
        self.by_name.insert(ident.clone(), position);
        self.sequences.push(Sequence {
            name: ident,
            frames,
            role: options.role,
            mode: options.mode,
            timing: options.timing,
        });
        Ok(&self.sequences[position])
    }

    /// Run every check of `build_sequence` that does not need the frame
    /// indices. Returns the sanitized name.
    pub fn check_candidate(
        &self,
        name: &str,
        frame_count: usize,
        timing: Option<&Timing>,
    ) -> Result<String, AssemblyError> {
        let ident = sanitize_identifier(name);
        if ident.is_empty() {
            return Err(AssemblyError::InvalidName(name.to_string()));
        }
        if self.by_name.contains_key(&ident) {
            return Err(AssemblyError::DuplicateName(ident));
        }
        if frame_count == 0 {
            return Err(AssemblyError::EmptySequence(ident));
        }
        check_timing(&ident, frame_count, timing)?;
        Ok(ident)
    }

    /// Designate the sequence playback starts in and returns to.
    pub fn set_default(&mut self, name: &str) -> Result<(), AssemblyError> {
        let position = self
            .position(name)
            .ok_or_else(|| AssemblyError::UnknownSequence(name.to_string()))?;
        self.default_sequence = Some(position);
        Ok(())
    }

    /// Position of the default sequence, if one is designated.
    pub fn default_position(&self) -> Option<usize> {
        self.default_sequence
    }

    pub fn default_sequence(&self) -> Option<&Sequence> {
        self.default_sequence.map(|i| &self.sequences[i])
    }

    /// Position of `name` (sanitized before lookup).
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(&sanitize_identifier(name)).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Sequence> {
        self.position(name).map(|i| &self.sequences[i])
    }

    pub fn by_position(&self, position: usize) -> Option<&Sequence> {
        self.sequences.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Re-check that every referenced frame still resolves in `registry`.
    pub fn validate(&self, registry: &FrameRegistry) -> Result<(), AssemblyError> {
        for sequence in &self.sequences {
            if let Some(&index) = sequence.frames.iter().find(|&&i| !registry.contains(i)) {
                return Err(AssemblyError::UnknownFrame {
                    sequence: sequence.name.clone(),
                    index,
                });
            }
        }
        Ok(())
    }
}

fn check_timing(name: &str, frames: usize, timing: Option<&Timing>) -> Result<(), AssemblyError> {
    match timing {
        None => Ok(()),
        Some(Timing::Interval { ms: 0 }) => Err(AssemblyError::ZeroInterval(name.to_string())),
        Some(Timing::Interval { .. }) => Ok(()),
        Some(Timing::PerFrame { ms }) => {
            if ms.len() != frames {
                return Err(AssemblyError::TimingMismatch {
                    sequence: name.to_string(),
                    frames,
                    durations: ms.len(),
                });
            }
            if ms.contains(&0) {
                return Err(AssemblyError::ZeroInterval(name.to_string()));
            }
            Ok(())
        }
    }
}

/// Sequence assembly errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("Sequence {0:?} already exists")]
    DuplicateName(String),
    #[error("Sequence {sequence:?} references unknown frame {index}")]
    UnknownFrame { sequence: String, index: usize },
    #[error("Sequence {0:?} has no frames")]
    EmptySequence(String),
    #[error("Sequence name {0:?} has no identifier characters")]
    InvalidName(String),
    #[error("Sequence {sequence:?} has {frames} frames but {durations} durations")]
    TimingMismatch {
        sequence: String,
        frames: usize,
        durations: usize,
    },
    #[error("Sequence {0:?} has a zero millisecond frame duration")]
    ZeroInterval(String),
    #[error("No sequence named {0:?}")]
    UnknownSequence(String),
}
