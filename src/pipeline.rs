//! One conversion run: grids in, C source out.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::animation::{
    AnimationTable, AssemblyError, ContractError, FrameRegistry, RegistryError, Sequence,
    SequenceOptions, validate_contract,
};
use crate::bitmap::{PackError, PixelGrid, pack_batch};
use crate::emit::{EmitError, emit};
use crate::schema::{ConfigError, ConversionConfig, Project, ProjectError};

/// Registry and table of a single run.
///
/// Nothing is shared between runs; independent runs can execute on separate
/// threads.
#[derive(Debug)]
pub struct ConversionRun {
    config: ConversionConfig,
    registry: FrameRegistry,
    table: AnimationTable,
}

impl ConversionRun {
    pub fn new(config: ConversionConfig) -> Result<Self, ConversionError> {
        config.validate()?;
        Ok(Self {
            registry: FrameRegistry::new(config.canvas),
            table: AnimationTable::new(),
            config,
        })
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn registry(&self) -> &FrameRegistry {
        &self.registry
    }

    pub fn table(&self) -> &AnimationTable {
        &self.table
    }

    /// Pack `grids`, register them as `<name>_<i>` and build a sequence.
    ///
    /// Name, emptiness, timing and frame sizes are checked before any frame
    /// is registered, so a rejected sequence leaves the registry untouched.
    /// With `dedupe_frames` a frame identical to an earlier one reuses its
    /// index instead of adding a copy.
    pub fn add_sequence(
        &mut self,
        name: &str,
        grids: &[PixelGrid],
        options: SequenceOptions,
    ) -> Result<&Sequence, ConversionError> {
        let ident = self
            .table
            .check_candidate(name, grids.len(), options.timing.as_ref())?;
        let frames = pack_batch(grids, self.config.polarity)?;
        let expected = (self.config.canvas.width, self.config.canvas.height);
        if let Some(frame) = frames
            .iter()
            .find(|f| (f.width(), f.height()) != expected)
        {
            return Err(RegistryError::CanvasMismatch {
                expected,
                actual: (frame.width(), frame.height()),
            }
            .into());
        }

        let mut indices = Vec::with_capacity(frames.len());
        for (i, frame) in frames.into_iter().enumerate() {
            if self.config.dedupe_frames {
                if let Some(existing) = self.registry.find_identical(&frame) {
                    debug!("{ident} frame {i} duplicates frame {existing}");
                    indices.push(existing);
                    continue;
                }
            }
            let label = format!("{ident}_{i}");
            indices.push(self.registry.register(frame, Some(label.as_str()))?);
        }

        Ok(self
            .table
            .build_sequence(&self.registry, &ident, indices, options)?)
    }

    /// Apply the configured default sequence and check the playback contract.
    fn finalize_table(&mut self) -> Result<(), ConversionError> {
        if let Some(default) = self.config.default_sequence.clone() {
            self.table.set_default(&default)?;
        }
        if self.table.default_sequence().is_some() {
            validate_contract(&self.registry, &self.table)?;
        } else {
            warn!("No default sequence configured; firmware starts at the first sequence");
        }
        Ok(())
    }

    /// Render the artifact without consuming the run.
    pub fn emit(&self) -> Result<String, ConversionError> {
        Ok(emit(
            &self.registry,
            &self.table,
            self.config.polarity,
            &self.config.emit,
        )?)
    }

    /// Finish the run and render the artifact.
    pub fn finish(mut self) -> Result<Artifact, ConversionError> {
        self.finalize_table()?;
        let source = self.emit()?;
        let artifact = Artifact {
            source,
            frame_count: self.registry.len(),
            sequence_count: self.table.len(),
            frame_bytes: self.config.canvas.frame_bytes(),
        };
        info!("{artifact}");
        Ok(artifact)
    }
}

/// Convert a whole project, loading frames through `load`.
///
/// Frame paths are resolved against `base_dir`. The loader receives the
/// resolved path and the run configuration (canvas, threshold, invert).
pub fn convert_project<E, F>(
    project: &Project,
    base_dir: &Path,
    mut load: F,
) -> Result<Artifact, ConversionError>
where
    E: std::fmt::Display,
    F: FnMut(&Path, &ConversionConfig) -> Result<PixelGrid, E>,
{
    project.validate()?;
    let mut run = ConversionRun::new(project.config.clone())?;

    for spec in &project.sequences {
        let mut grids = Vec::with_capacity(spec.frames.len());
        for frame in &spec.frames {
            let path = Project::resolve_frame(base_dir, frame);
            let grid = load(&path, run.config()).map_err(|e| ConversionError::Load {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            grids.push(grid);
        }

        let options = SequenceOptions {
            role: spec.role,
            mode: spec.mode,
            timing: spec.timing.clone(),
        };
        let sequence = run.add_sequence(&spec.name, &grids, options)?;
        debug!(
            "Added sequence {:?} with {} frames",
            sequence.name(),
            sequence.frame_count()
        );
    }

    run.finish()
}

/// Generated source plus a summary.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub source: String,
    pub frame_count: usize,
    pub sequence_count: usize,
    /// Packed size of one frame.
    pub frame_bytes: usize,
}

impl Artifact {
    /// Total bitmap payload in bytes.
    pub fn bitmap_bytes(&self) -> usize {
        self.frame_count * self.frame_bytes
    }

    /// Write the source to `path`.
    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, &self.source)
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} frames in {} sequences, {} bytes of bitmap data",
            self.frame_count,
            self.sequence_count,
            self.bitmap_bytes()
        )
    }
}

/// Errors from a conversion run.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("Invalid project: {0}")]
    Project(#[from] ProjectError),
    #[error("Failed to load frame {path:?}: {reason}")]
    Load { path: PathBuf, reason: String },
    #[error("Packing failed: {0}")]
    Pack(#[from] PackError),
    #[error("Registration failed: {0}")]
    Registry(#[from] RegistryError),
    #[error("Sequence rejected: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("Playback contract violated: {0}")]
    Contract(#[from] ContractError),
    #[error("Emission failed: {0}")]
    Emit(#[from] EmitError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CanvasConfig, LoopMode, SequenceRole, SequenceSpec, Timing};
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn small_config() -> ConversionConfig {
        ConversionConfig {
            canvas: CanvasConfig {
                width: 16,
                height: 4,
            },
            ..Default::default()
        }
    }

    fn dot(x: usize) -> PixelGrid {
        PixelGrid::from_fn(16, 4, |px, py| px == x && py == 0)
    }

    #[test]
    fn test_add_sequence_names_frames() {
        let mut run = ConversionRun::new(small_config()).unwrap();
        run.add_sequence("Blink", &[dot(0), dot(1)], Default::default())
            .unwrap();
        let names: Vec<_> = run.registry().iter().map(|f| f.name.clone()).collect();
        assert_eq!(names, ["blink_0", "blink_1"]);
        assert_eq!(run.table().get("blink").unwrap().frames(), &[0, 1]);
    }

    #[test]
    fn test_rejected_sequence_leaves_registry_untouched() {
        let mut run = ConversionRun::new(small_config()).unwrap();
        run.add_sequence("idle", &[dot(0)], Default::default())
            .unwrap();

        let err = run
            .add_sequence("idle", &[dot(1), dot(2)], Default::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::Assembly(AssemblyError::DuplicateName(_))
        ));

        let err = run
            .add_sequence("blink", &[], Default::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::Assembly(AssemblyError::EmptySequence(_))
        ));

        let err = run
            .add_sequence("wide", &[PixelGrid::new(12, 4)], Default::default())
            .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::Pack(PackError::Dimension { width: 12 })
        ));

        assert_eq!(run.registry().len(), 1);
    }

    #[test]
    fn test_wrong_canvas_registers_nothing() {
        let mut run = ConversionRun::new(small_config()).unwrap();
        let err = run
            .add_sequence(
                "blink",
                &[PixelGrid::new(16, 4), PixelGrid::new(8, 4)],
                Default::default(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ConversionError::Registry(RegistryError::CanvasMismatch {
                expected: (16, 4),
                actual: (8, 4),
            })
        ));
        assert!(run.registry().is_empty());
        assert!(run.table().is_empty());

        // The name stays free for a corrected retry.
        run.add_sequence("blink", &[dot(0)], Default::default())
            .unwrap();
        assert_eq!(run.registry().lookup(0).unwrap().name, "blink_0");
    }

    #[test]
    fn test_dedupe_reuses_frames() {
        let config = ConversionConfig {
            dedupe_frames: true,
            ..small_config()
        };
        let mut run = ConversionRun::new(config).unwrap();
        run.add_sequence("sad", &[dot(0), dot(1), dot(1), dot(1)], Default::default())
            .unwrap();
        run.add_sequence("angry", &[dot(1), dot(2)], Default::default())
            .unwrap();

        assert_eq!(run.registry().len(), 3);
        assert_eq!(run.table().get("sad").unwrap().frames(), &[0, 1, 1, 1]);
        assert_eq!(run.table().get("angry").unwrap().frames(), &[1, 2]);
        assert_eq!(run.registry().lookup(2).unwrap().name, "angry_1");
    }

    #[test]
    fn test_without_dedupe_every_frame_registered() {
        let mut run = ConversionRun::new(small_config()).unwrap();
        run.add_sequence("sad", &[dot(1), dot(1)], Default::default())
            .unwrap();
        assert_eq!(run.registry().len(), 2);
    }

    #[test]
    fn test_finish_applies_default() {
        let config = ConversionConfig {
            default_sequence: Some("center".to_string()),
            ..small_config()
        };
        let mut run = ConversionRun::new(config).unwrap();
        run.add_sequence("intro", &[dot(3)], SequenceOptions {
            role: SequenceRole::Intro,
            mode: LoopMode::OneShot,
            timing: None,
        })
        .unwrap();
        run.add_sequence("center", &[dot(0)], Default::default())
            .unwrap();

        let artifact = run.finish().unwrap();
        assert_eq!(artifact.frame_count, 2);
        assert_eq!(artifact.sequence_count, 2);
        assert_eq!(artifact.bitmap_bytes(), 16);
        assert!(artifact.source.contains("#define DEFAULT_ANIMATION 1"));
    }

    #[test]
    fn test_finish_unknown_default() {
        let config = ConversionConfig {
            default_sequence: Some("missing".to_string()),
            ..small_config()
        };
        let mut run = ConversionRun::new(config).unwrap();
        run.add_sequence("idle", &[dot(0)], Default::default())
            .unwrap();
        assert!(matches!(
            run.finish(),
            Err(ConversionError::Assembly(AssemblyError::UnknownSequence(_)))
        ));
    }

    #[test]
    fn test_convert_project_with_loader() {
        let project = Project {
            config: ConversionConfig {
                default_sequence: Some("idle".to_string()),
                ..small_config()
            },
            sequences: vec![
                SequenceSpec {
                    name: "idle".to_string(),
                    role: SequenceRole::Idle,
                    mode: LoopMode::Loop,
                    timing: Some(Timing::Interval { ms: 120 }),
                    frames: vec!["a.png".into(), "b.png".into(), "a.png".into()],
                },
                SequenceSpec {
                    name: "heart".to_string(),
                    role: SequenceRole::Expression,
                    mode: LoopMode::OneShot,
                    timing: None,
                    frames: vec!["b.png".into()],
                },
            ],
        };

        let base = Path::new("/pkg");
        let images: HashMap<PathBuf, PixelGrid> = [
            (base.join("a.png"), dot(0)),
            (base.join("b.png"), dot(5)),
        ]
        .into_iter()
        .collect();

        let artifact = convert_project(&project, base, |path, _| {
            images.get(path).cloned().ok_or("missing")
        })
        .unwrap();
        assert_eq!(artifact.frame_count, 4);
        assert!(artifact.source.contains("Animation anim_idle = { ANIM_IDLE, 3, 120, nullptr, true };"));
        assert!(artifact.source.contains("epd_heart_0"));
    }

    #[test]
    fn test_convert_project_load_failure() {
        let project = Project {
            config: small_config(),
            sequences: vec![SequenceSpec {
                name: "idle".to_string(),
                role: SequenceRole::Idle,
                mode: LoopMode::Loop,
                timing: None,
                frames: vec!["gone.png".into()],
            }],
        };
        let err = convert_project(&project, Path::new("/pkg"), |_, _| {
            Err::<PixelGrid, _>("not found")
        })
        .unwrap_err();
        match err {
            ConversionError::Load { path, reason } => {
                assert_eq!(path, PathBuf::from("/pkg/gone.png"));
                assert_eq!(reason, "not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_artifact_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("face.h");

        let mut run = ConversionRun::new(small_config()).unwrap();
        run.add_sequence("idle", &[dot(0)], Default::default())
            .unwrap();
        let artifact = run.finish().unwrap();
        artifact.write_to_path(&path).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), artifact.source);
    }
}
