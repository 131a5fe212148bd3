use image::Rgba;

use crate::{CanvasError, Result};

/// What the eraser paints with.
pub const BACKGROUND: Rgba<u8> = Rgba([0xF8, 0xF9, 0xFA, 0xFF]);

/// How much darker a heart's outline is than its fill.
pub const OUTLINE_DELTA: i32 = -20;

/// Parse `#RRGGBB` or `RRGGBB` into an opaque color.
pub fn parse_hex(color: &str) -> Result<Rgba<u8>> {
    let digits = color.strip_prefix('#').unwrap_or(color);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CanvasError::InvalidColor(color.to_string()));
    }

    let value =
        u32::from_str_radix(digits, 16).map_err(|_| CanvasError::InvalidColor(color.to_string()))?;
    Ok(Rgba([
        (value >> 16) as u8,
        (value >> 8) as u8,
        value as u8,
        0xFF,
    ]))
}

/// `RRGGBB` in upper case, no marker.
pub fn to_hex(color: Rgba<u8>) -> String {
    let [r, g, b, _] = color.0;
    format!("{r:02X}{g:02X}{b:02X}")
}

/// Shift every channel by `delta`, clamping to 0..=255. Alpha is untouched.
pub fn shift(color: Rgba<u8>, delta: i32) -> Rgba<u8> {
    let [r, g, b, a] = color.0;
    let ch = |c: u8| (c as i32 + delta).clamp(0, 255) as u8;
    Rgba([ch(r), ch(g), ch(b), a])
}

/// Lighten (positive `delta`) or darken a hex color, keeping the leading
/// `#` if the input had one.
pub fn adjust_color(color: &str, delta: i32) -> Result<String> {
    let shifted = shift(parse_hex(color)?, delta);
    let marker = if color.starts_with('#') { "#" } else { "" };
    Ok(format!("{marker}{}", to_hex(shifted)))
}
