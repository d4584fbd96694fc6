//! Playback contract for the emitted table.
//!
//! The firmware runs a small state machine over the table:
//!
//! ```text
//! Idle --start--> Playing(default, 0)
//! Playing(s, i) --tick--> Playing(s, i + 1)
//! Playing(s, last) --tick, Loop--> Playing(s, 0)
//! Playing(s, last) --tick, OneShot--> Transitioning(default) --tick--> Playing(default, 0)
//! any --trigger(x)--> Playing(x, 0)
//! ```
//!
//! `Playback` is a host-side reference implementation used to check that a
//! table carries everything the firmware needs.

use super::registry::FrameRegistry;
use super::sequence::{AnimationTable, AssemblyError, Sequence};

/// Runtime state of the playback machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing on screen yet.
    Idle,
    /// Showing frame `cursor` of the sequence at table position `sequence`.
    Playing { sequence: usize, cursor: usize },
    /// A one-shot sequence finished; the next tick enters `to`.
    Transitioning { to: usize },
}

/// Check that `table` can drive the playback machine.
pub fn validate_contract(
    registry: &FrameRegistry,
    table: &AnimationTable,
) -> Result<(), ContractError> {
    if table.is_empty() {
        return Err(ContractError::NoSequences);
    }
    if table.default_sequence().is_none() {
        return Err(ContractError::NoDefaultSequence);
    }
    table.validate(registry)?;
    for sequence in table.iter() {
        if sequence.frame_count() == 0 {
            return Err(AssemblyError::EmptySequence(sequence.name().to_string()).into());
        }
        if let Some(timing) = sequence.timing() {
            if (0..sequence.frame_count()).any(|i| timing.duration_of(i).is_none()) {
                return Err(ContractError::IncompleteTiming(sequence.name().to_string()));
            }
        }
    }
    Ok(())
}

/// Reference playback machine over an `AnimationTable`.
pub struct Playback<'a> {
    table: &'a AnimationTable,
    default_interval_ms: u16,
    state: PlaybackState,
    /// Time spent on the current frame.
    elapsed_ms: u32,
}

impl<'a> Playback<'a> {
    /// Create a machine in `Idle`.
    ///
    /// Sequences without explicit timing advance every `default_interval_ms`.
    pub fn new(table: &'a AnimationTable, default_interval_ms: u16) -> Self {
        Self {
            table,
            default_interval_ms,
            state: PlaybackState::Idle,
            elapsed_ms: 0,
        }
    }

    /// Enter the default sequence at frame 0.
    pub fn start(&mut self) -> Result<PlaybackState, ContractError> {
        let sequence = self
            .table
            .default_position()
            .ok_or(ContractError::NoDefaultSequence)?;
        self.enter(sequence);
        Ok(self.state)
    }

    /// Pre-empt whatever is playing and start `name` at frame 0.
    pub fn trigger(&mut self, name: &str) -> Result<PlaybackState, ContractError> {
        let sequence = self
            .table
            .position(name)
            .ok_or_else(|| ContractError::UnknownSequence(name.to_string()))?;
        self.enter(sequence);
        Ok(self.state)
    }

    fn enter(&mut self, sequence: usize) {
        self.state = PlaybackState::Playing {
            sequence,
            cursor: 0,
        };
        self.elapsed_ms = 0;
    }

    fn duration(&self, sequence: &Sequence, cursor: usize) -> u32 {
        sequence
            .timing()
            .and_then(|t| t.duration_of(cursor))
            .unwrap_or(self.default_interval_ms)
            .max(1) as u32
    }

    /// Advance the clock by `elapsed_ms`.
    ///
    /// Several frames may pass in one tick. Reaching the end of a one-shot
    /// sequence stops at `Transitioning`; leftover time is dropped.
    pub fn tick(&mut self, elapsed_ms: u32) -> PlaybackState {
        match self.state {
            PlaybackState::Idle => {}
            PlaybackState::Transitioning { to } => self.enter(to),
            PlaybackState::Playing {
                sequence: position,
                mut cursor,
            } => {
                let table = self.table;
                let Some(sequence) = table.by_position(position) else {
                    self.state = PlaybackState::Idle;
                    return self.state;
                };
                self.elapsed_ms = self.elapsed_ms.saturating_add(elapsed_ms);
                if sequence.mode().is_loop() {
                    // Whole cycles return to the same cursor.
                    let cycle: u64 = (0..sequence.frame_count())
                        .map(|i| u64::from(self.duration(sequence, i)))
                        .sum();
                    let elapsed = u64::from(self.elapsed_ms);
                    if elapsed >= cycle {
                        self.elapsed_ms = (elapsed % cycle) as u32;
                    }
                }
                loop {
                    let duration = self.duration(sequence, cursor);
                    if self.elapsed_ms < duration {
                        self.state = PlaybackState::Playing {
                            sequence: position,
                            cursor,
                        };
                        break;
                    }
                    self.elapsed_ms -= duration;

                    if cursor + 1 < sequence.frame_count() {
                        cursor += 1;
                    } else if sequence.mode().is_loop() {
                        cursor = 0;
                    } else {
                        self.elapsed_ms = 0;
                        self.state = match table.default_position() {
                            Some(to) => PlaybackState::Transitioning { to },
                            None => PlaybackState::Idle,
                        };
                        break;
                    }
                }
            }
        }
        self.state
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Sequence currently playing.
    pub fn current_sequence(&self) -> Option<&'a Sequence> {
        match self.state {
            PlaybackState::Playing { sequence, .. } => self.table.by_position(sequence),
            _ => None,
        }
    }

    /// Registry index of the frame on screen.
    pub fn current_frame(&self) -> Option<usize> {
        match self.state {
            PlaybackState::Playing { sequence, cursor } => self
                .table
                .by_position(sequence)
                .and_then(|s| s.frames().get(cursor).copied()),
            _ => None,
        }
    }
}

/// Playback contract violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractError {
    #[error("Animation table has no sequences")]
    NoSequences,
    #[error("No default sequence designated")]
    NoDefaultSequence,
    #[error("No sequence named {0:?}")]
    UnknownSequence(String),
    #[error("Sequence {0:?} lacks a duration for some frames")]
    IncompleteTiming(String),
    #[error("Table validation failed: {0}")]
    Assembly(#[from] AssemblyError),
}
