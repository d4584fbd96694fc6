//! C/Arduino source generation.

use std::collections::HashSet;
use std::fmt::Write;

use log::info;

use crate::animation::{AnimationTable, AssemblyError, FrameRegistry, Sequence};
use crate::schema::{ConfigError, EmitOptions, Polarity, SequenceRole, Timing};

/// Frame symbols per line in a sequence pointer table.
const NAMES_PER_LINE: usize = 8;

const ROLES: [(SequenceRole, &str); 3] = [
    (SequenceRole::Intro, "INTRO"),
    (SequenceRole::Idle, "IDLE"),
    (SequenceRole::Expression, "EXPRESSION"),
];

/// Render the registry and table as a C source artifact.
///
/// The whole table is validated first, so either the complete text is
/// returned or nothing is. Output depends only on the inputs. An empty
/// table yields the frame arrays alone with `ANIMATION_COUNT` 0.
pub fn emit(
    registry: &FrameRegistry,
    table: &AnimationTable,
    polarity: Polarity,
    options: &EmitOptions,
) -> Result<String, EmitError> {
    options.validate()?;
    table.validate(registry)?;
    check_symbols(registry, table, options)?;

    let mut out = String::new();
    write_preamble(&mut out, registry, table, polarity, options)?;
    write_frames(&mut out, registry, options)?;
    write_sequences(&mut out, registry, table, options)?;
    write_lookup(&mut out, table)?;

    info!(
        "Emitted {} frames and {} sequences ({} bytes of source)",
        registry.len(),
        table.len(),
        out.len()
    );
    Ok(out)
}

/// Every top-level name the artifact defines must be distinct.
fn check_symbols(
    registry: &FrameRegistry,
    table: &AnimationTable,
    options: &EmitOptions,
) -> Result<(), EmitError> {
    let mut symbols: HashSet<String> = [
        "MS_DELAY",
        "FRAME_WIDTH",
        "FRAME_HEIGHT",
        "FRAME_BYTES",
        "BITMAP_ON_IS_WHITE",
        "Animation",
        "ANIMATION_COUNT",
        "ANIMATIONS",
        "ANIMATION_NAMES",
        "DEFAULT_ANIMATION",
    ]
    .into_iter()
    .map(String::from)
    .collect();
    for (_, prefix) in ROLES {
        symbols.insert(format!("{prefix}_ANIMATION_COUNT"));
        symbols.insert(format!("{prefix}_ANIMATIONS"));
    }

    let frames = registry.iter().map(|entry| frame_symbol(options, &entry.name));
    let sequences = table.iter().flat_map(|sequence| {
        let upper = sequence.name().to_ascii_uppercase();
        let mut names = vec![
            table_symbol(options, sequence),
            format!("anim_{}", sequence.name()),
            format!("ANIMATION_INDEX_{upper}"),
        ];
        if let Some(Timing::PerFrame { .. }) = sequence.timing() {
            names.push(format!("ANIMATION_DELAYS_{upper}"));
        }
        names
    });
    for symbol in frames.chain(sequences) {
        if !symbols.insert(symbol.clone()) {
            return Err(EmitError::SymbolClash(symbol));
        }
    }
    Ok(())
}

fn progmem(options: &EmitOptions) -> &'static str {
    if options.progmem { " PROGMEM" } else { "" }
}

fn frame_symbol(options: &EmitOptions, name: &str) -> String {
    format!("{}{}", options.array_prefix, name)
}

fn table_symbol(options: &EmitOptions, sequence: &Sequence) -> String {
    format!(
        "{}{}",
        options.table_prefix,
        sequence.name().to_ascii_uppercase()
    )
}

fn write_preamble(
    out: &mut String,
    registry: &FrameRegistry,
    table: &AnimationTable,
    polarity: Polarity,
    options: &EmitOptions,
) -> std::fmt::Result {
    let canvas = registry.canvas();
    let on_description = match polarity {
        Polarity::OnIsWhite => "white",
        Polarity::OnIsBlack => "black",
    };

    writeln!(out, "// Generated by xbm-anim")?;
    writeln!(
        out,
        "// Frames: {}, sequences: {}",
        registry.len(),
        table.len()
    )?;
    writeln!(
        out,
        "// Canvas: {}x{}, {} bytes per row, {} bytes per frame",
        canvas.width,
        canvas.height,
        canvas.row_bytes(),
        canvas.frame_bytes()
    )?;
    writeln!(
        out,
        "// Bit order: LSB is the leftmost pixel of each byte (u8g2 drawXBMP)"
    )?;
    writeln!(
        out,
        "// Polarity: {} (a set bit is a {} source pixel)",
        polarity.label(),
        on_description
    )?;
    writeln!(out)?;

    if !options.includes.is_empty() {
        for include in &options.includes {
            writeln!(out, "#include <{include}>")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "#define MS_DELAY {}", options.default_interval_ms)?;
    writeln!(out, "#define FRAME_WIDTH {}", canvas.width)?;
    writeln!(out, "#define FRAME_HEIGHT {}", canvas.height)?;
    writeln!(out, "#define FRAME_BYTES {}", canvas.frame_bytes())?;
    writeln!(
        out,
        "#define BITMAP_ON_IS_WHITE {}",
        u8::from(polarity == Polarity::OnIsWhite)
    )?;
    writeln!(out)?;

    writeln!(out, "struct Animation {{")?;
    writeln!(out, "  const unsigned char* const* frames;")?;
    writeln!(out, "  uint16_t count;")?;
    writeln!(out, "  uint16_t delayMs;")?;
    writeln!(out, "  const uint16_t* delays;")?;
    writeln!(out, "  bool loop;")?;
    writeln!(out, "}};")?;
    writeln!(out)
}

fn write_frames(
    out: &mut String,
    registry: &FrameRegistry,
    options: &EmitOptions,
) -> std::fmt::Result {
    writeln!(out, "// Frames")?;
    for entry in registry.iter() {
        writeln!(out)?;
        writeln!(
            out,
            "const unsigned char {}[]{} = {{",
            frame_symbol(options, &entry.name),
            progmem(options)
        )?;
        for chunk in entry.frame.bytes().chunks(options.bytes_per_line) {
            out.push_str("  ");
            for (i, byte) in chunk.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write!(out, "0x{byte:02X},")?;
            }
            out.push('\n');
        }
        writeln!(out, "}};")?;
    }
    writeln!(out)
}

fn write_sequences(
    out: &mut String,
    registry: &FrameRegistry,
    table: &AnimationTable,
    options: &EmitOptions,
) -> Result<(), EmitError> {
    writeln!(out, "// Sequences")?;
    for sequence in table.iter() {
        let symbol = table_symbol(options, sequence);
        let upper = sequence.name().to_ascii_uppercase();

        writeln!(out)?;
        writeln!(
            out,
            "const unsigned char* const {symbol}[]{} = {{",
            progmem(options)
        )?;
        let names = sequence
            .frames()
            .iter()
            .map(|&i| {
                registry
                    .lookup(i)
                    .map(|entry| frame_symbol(options, &entry.name))
                    .map_err(|_| AssemblyError::UnknownFrame {
                        sequence: sequence.name().to_string(),
                        index: i,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let lines: Vec<String> = names
            .chunks(NAMES_PER_LINE)
            .map(|chunk| format!("  {}", chunk.join(", ")))
            .collect();
        writeln!(out, "{}", lines.join(",\n"))?;
        writeln!(out, "}};")?;

        let (delay, delays) = match sequence.timing() {
            None => ("MS_DELAY".to_string(), "nullptr".to_string()),
            Some(Timing::Interval { ms }) => (ms.to_string(), "nullptr".to_string()),
            Some(Timing::PerFrame { ms }) => {
                let delays = format!("ANIMATION_DELAYS_{upper}");
                let values: Vec<String> = ms.iter().map(u16::to_string).collect();
                writeln!(
                    out,
                    "const uint16_t {delays}[]{} = {{ {} }};",
                    progmem(options),
                    values.join(", ")
                )?;
                ("MS_DELAY".to_string(), delays)
            }
        };

        writeln!(
            out,
            "Animation anim_{} = {{ {symbol}, {}, {delay}, {delays}, {} }};",
            sequence.name(),
            sequence.frame_count(),
            sequence.mode().is_loop()
        )?;
    }
    writeln!(out)?;
    Ok(())
}

fn pointer_list(sequences: &[&Sequence]) -> String {
    sequences
        .iter()
        .map(|s| format!("&anim_{}", s.name()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_lookup(out: &mut String, table: &AnimationTable) -> std::fmt::Result {
    let all: Vec<&Sequence> = table.iter().collect();

    writeln!(out, "// Lookup")?;
    writeln!(out)?;
    writeln!(out, "#define ANIMATION_COUNT {}", all.len())?;
    if !all.is_empty() {
        writeln!(
            out,
            "Animation* const ANIMATIONS[ANIMATION_COUNT] = {{ {} }};",
            pointer_list(&all)
        )?;
        let names: Vec<String> = all.iter().map(|s| format!("\"{}\"", s.name())).collect();
        writeln!(
            out,
            "const char* const ANIMATION_NAMES[ANIMATION_COUNT] = {{ {} }};",
            names.join(", ")
        )?;
    }
    for (position, sequence) in all.iter().enumerate() {
        writeln!(
            out,
            "#define ANIMATION_INDEX_{} {}",
            sequence.name().to_ascii_uppercase(),
            position
        )?;
    }
    // Without a designated default the firmware starts at the first sequence.
    writeln!(
        out,
        "#define DEFAULT_ANIMATION {}",
        table.default_position().unwrap_or(0)
    )?;

    for (role, prefix) in ROLES {
        let members: Vec<&Sequence> = all.iter().copied().filter(|s| s.role() == role).collect();
        writeln!(out)?;
        writeln!(out, "#define {prefix}_ANIMATION_COUNT {}", members.len())?;
        if !members.is_empty() {
            writeln!(
                out,
                "Animation* const {prefix}_ANIMATIONS[{prefix}_ANIMATION_COUNT] = {{ {} }};",
                pointer_list(&members)
            )?;
        }
    }
    Ok(())
}

/// Emission errors.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    #[error("Emitted symbol {0:?} is defined twice")]
    SymbolClash(String),
    #[error("Invalid emit options: {0}")]
    Options(#[from] ConfigError),
    #[error("Table validation failed: {0}")]
    Assembly(#[from] AssemblyError),
    #[error("Formatting failed")]
    Format(#[from] std::fmt::Error),
}
