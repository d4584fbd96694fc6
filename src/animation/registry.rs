//! Append-only store of packed frames with stable symbolic names.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::bitmap::PackedFrame;
use crate::schema::CanvasConfig;

/// Turn an arbitrary label into a C identifier fragment.
///
/// Trims, lowercases, maps every character outside `[a-z0-9_]` to `_` and
/// prefixes `_` when the result starts with a digit. May return an empty
/// string.
pub fn sanitize_identifier(label: &str) -> String {
    let mut name: String = label
        .trim()
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}

/// A frame owned by the registry.
#[derive(Debug, Clone)]
pub struct RegisteredFrame {
    /// Dense insertion index.
    pub index: usize,
    /// Unique identifier derived from the label.
    pub name: String,
    /// Label as supplied by the caller.
    pub label: Option<String>,
    pub frame: PackedFrame,
}

/// Ordered, append-only mapping from index to packed frame.
#[derive(Debug)]
pub struct FrameRegistry {
    canvas: CanvasConfig,
    frames: Vec<RegisteredFrame>,
    names: HashSet<String>,
    /// First index registered for each distinct frame content.
    by_content: HashMap<PackedFrame, usize>,
}

impl FrameRegistry {
    /// Create an empty registry bound to one canvas.
    pub fn new(canvas: CanvasConfig) -> Self {
        Self {
            canvas,
            frames: Vec::new(),
            names: HashSet::new(),
            by_content: HashMap::new(),
        }
    }

    pub fn canvas(&self) -> CanvasConfig {
        self.canvas
    }

    /// Append a frame and return its index.
    ///
    /// The name is `sanitize_identifier(label)`, or `frame_<index>` when no
    /// usable label is given. A taken name gets `_1`, `_2`, ... appended,
    /// picking the first free one.
    pub fn register(
        &mut self,
        frame: PackedFrame,
        label: Option<&str>,
    ) -> Result<usize, RegistryError> {
        if frame.width() != self.canvas.width || frame.height() != self.canvas.height {
            return Err(RegistryError::CanvasMismatch {
                expected: (self.canvas.width, self.canvas.height),
                actual: (frame.width(), frame.height()),
            });
        }

        let index = self.frames.len();
        let base = label
            .map(sanitize_identifier)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("frame_{index}"));
        let name = self.free_name(&base);

        self.names.insert(name.clone());
        self.by_content.entry(frame.clone()).or_insert(index);
        self.frames.push(RegisteredFrame {
            index,
            name,
            label: label.map(str::to_string),
            frame,
        });

        Ok(index)
    }

    fn free_name(&self, base: &str) -> String {
        if !self.names.contains(base) {
            return base.to_string();
        }
        let mut suffix = 1usize;
        loop {
            let candidate = format!("{base}_{suffix}");
            if !self.names.contains(&candidate) {
                debug!("Frame name {base:?} taken, using {candidate:?}");
                return candidate;
            }
            suffix += 1;
        }
    }

    /// Entry at `index`.
    pub fn lookup(&self, index: usize) -> Result<&RegisteredFrame, RegistryError> {
        self.frames.get(index).ok_or(RegistryError::IndexOutOfRange {
            index,
            len: self.frames.len(),
        })
    }

    /// First index whose packed content equals `frame`.
    pub fn find_identical(&self, frame: &PackedFrame) -> Option<usize> {
        self.by_content.get(frame).copied()
    }

    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        index < self.frames.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredFrame> {
        self.frames.iter()
    }
}

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("Frame index {index} out of range (registry holds {len} frames)")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("Frame is {}x{}, registry canvas is {}x{}", .actual.0, .actual.1, .expected.0, .expected.1)]
    CanvasMismatch {
        expected: (usize, usize),
        actual: (usize, usize),
    },
}
