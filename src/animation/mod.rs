//! Frame registration, sequence assembly and the playback contract.
//!
//! A conversion run owns one `FrameRegistry` and one `AnimationTable`:
//!
//! ```text
//! PackedFrame --register--> FrameRegistry (index 0..n, unique names)
//!                                |
//!              build_sequence(name, [indices], options)
//!                                v
//!                         AnimationTable (sequences, name -> position)
//! ```
//!
//! Indices are dense and never reused; sequences may share and repeat them.

mod playback;
mod registry;
mod sequence;

pub use playback::{ContractError, Playback, PlaybackState, validate_contract};
pub use registry::{FrameRegistry, RegisteredFrame, RegistryError, sanitize_identifier};
pub use sequence::{AnimationTable, AssemblyError, Sequence, SequenceOptions};
