//! Reading bitmap bytes back out of C array text.

use crate::bitmap::{PackError, PackedFrame};
use crate::schema::CanvasConfig;

/// Extract the byte literals of a pasted C array.
///
/// Only the text between the first `{` and the following `}` is scanned when
/// braces are present. Hex literals (`0x..`) are used when there are any;
/// otherwise decimal literals are taken, truncated to a byte.
pub fn parse_c_array(text: &str, expected_len: usize) -> Result<Vec<u8>, ParseError> {
    let body = match text.find('{') {
        Some(open) => {
            let rest = &text[open + 1..];
            rest.find('}').map_or(rest, |close| &rest[..close])
        }
        None => text,
    };

    let tokens: Vec<&str> = body
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .collect();

    let has_hex = tokens.iter().any(|t| is_hex_token(t));
    let mut data = Vec::with_capacity(expected_len);
    for token in tokens {
        if has_hex {
            if is_hex_token(token) {
                let digits = &token[2..];
                if digits.len() > 2 {
                    return Err(ParseError::InvalidLiteral(token.to_string()));
                }
                let value = u8::from_str_radix(digits, 16)
                    .map_err(|_| ParseError::InvalidLiteral(token.to_string()))?;
                data.push(value);
            }
        } else if token.bytes().all(|b| b.is_ascii_digit()) {
            let value: u64 = token
                .parse()
                .map_err(|_| ParseError::InvalidLiteral(token.to_string()))?;
            data.push((value & 0xFF) as u8);
        }
    }

    if data.len() != expected_len {
        return Err(ParseError::LengthMismatch {
            expected: expected_len,
            actual: data.len(),
        });
    }
    Ok(data)
}

fn is_hex_token(token: &str) -> bool {
    (token.starts_with("0x") || token.starts_with("0X"))
        && token.len() > 2
        && token[2..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Parse a pasted C array as one frame of `canvas`.
pub fn parse_frame(text: &str, canvas: CanvasConfig) -> Result<PackedFrame, ParseError> {
    let bytes = parse_c_array(text, canvas.frame_bytes())?;
    Ok(PackedFrame::from_bytes(canvas.width, canvas.height, bytes)?)
}

/// C array parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Invalid byte literal {0:?}")]
    InvalidLiteral(String),
    #[error("Invalid frame: {0}")]
    Frame(#[from] PackError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationTable, FrameRegistry};
    use crate::bitmap::{PixelGrid, pack, unpack};
    use crate::emit::emit;
    use crate::schema::{EmitOptions, Polarity};

    #[test]
    fn test_hex_array() {
        let text = "const unsigned char epd_bitmap_0 [] PROGMEM = {\n\t0x01, 0xFF, 0x0a,\n};";
        assert_eq!(parse_c_array(text, 3).unwrap(), vec![0x01, 0xFF, 0x0A]);
    }

    #[test]
    fn test_decimal_fallback() {
        let text = "{ 1, 255, 256, 7 }";
        assert_eq!(parse_c_array(text, 4).unwrap(), vec![1, 255, 0, 7]);
    }

    #[test]
    fn test_declaration_digits_ignored() {
        // The `[16]` size and the digits in the name sit outside the braces.
        let text = "const unsigned char epd_idle_3[16] = { 1, 2 };";
        assert_eq!(parse_c_array(text, 2).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_bare_list() {
        assert_eq!(parse_c_array("0x10 0x20", 2).unwrap(), vec![0x10, 0x20]);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            parse_c_array("{ 0x00, 0x01 }", 1024),
            Err(ParseError::LengthMismatch {
                expected: 1024,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_oversized_literal() {
        assert!(matches!(
            parse_c_array("{ 0x100 }", 1),
            Err(ParseError::InvalidLiteral(t)) if t == "0x100"
        ));
    }

    #[test]
    fn test_emitted_frame_decodes_to_source_grid() {
        let canvas = CanvasConfig::default();
        let grid = PixelGrid::from_fn(canvas.width, canvas.height, |x, y| (x * 7 + y * 3) % 5 == 0);
        let mut registry = FrameRegistry::new(canvas);
        registry
            .register(pack(&grid, Polarity::OnIsWhite).unwrap(), Some("pattern"))
            .unwrap();
        let mut table = AnimationTable::new();
        table
            .build_sequence(&registry, "pattern", vec![0], Default::default())
            .unwrap();
        let text = emit(&registry, &table, Polarity::OnIsWhite, &EmitOptions::default()).unwrap();

        let start = text.find("epd_pattern[]").unwrap();
        let frame = parse_frame(&text[start..], canvas).unwrap();
        assert_eq!(unpack(&frame, Polarity::OnIsWhite), grid);
    }
}
