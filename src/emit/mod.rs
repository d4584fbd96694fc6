//! Emit module - Deterministic C source for frames and animation tables.
//!
//! # Artifact layout
//!
//! ```text
//! // header comments (counts, canvas, bit order, polarity)
//! #include ...
//! #define MS_DELAY / FRAME_WIDTH / FRAME_HEIGHT / FRAME_BYTES / BITMAP_ON_IS_WHITE
//! struct Animation { frames; count; delayMs; delays; loop; };
//!
//! const unsigned char epd_<frame>[] PROGMEM = { 0x.., ... };     // registry order
//!
//! const unsigned char* const ANIM_<SEQ>[] PROGMEM = { epd_.., ... };
//! Animation anim_<seq> = { ANIM_<SEQ>, count, delay, delays, loop };  // table order
//!
//! ANIMATIONS[], ANIMATION_NAMES[], ANIMATION_INDEX_<SEQ>, DEFAULT_ANIMATION,
//! <ROLE>_ANIMATION_COUNT, <ROLE>_ANIMATIONS[]
//! ```

mod c_source;
mod parse;

pub use c_source::{EmitError, emit};
pub use parse::{ParseError, parse_c_array, parse_frame};
